//! Writing fetched patch bytes into the engine's filesystem.

use patchplay_core::{FsError, Result, VirtualFs};
use tracing::trace;

/// Store `data` at `/<name>`, creating intermediate directories as needed.
///
/// Directories that already exist are fine; every other filesystem error is
/// returned. Returns the path written.
pub fn inject_patch<F: VirtualFs + ?Sized>(fs: &mut F, name: &str, data: &[u8]) -> Result<String> {
    let mut components: Vec<&str> = name.split('/').filter(|c| !c.is_empty()).collect();
    let Some(leaf) = components.pop() else {
        return Err(FsError::InvalidPath(name.to_string()).into());
    };

    let mut dir = String::from("/");
    for component in components {
        dir.push_str(component);
        match fs.mkdir(&dir) {
            Ok(()) => trace!("Created {dir}"),
            Err(FsError::AlreadyExists(_)) => {}
            Err(e) => return Err(e.into()),
        }
        dir.push('/');
    }

    let path = format!("{dir}{leaf}");
    fs.write_file(&path, data)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use patchplay_core::Error;
    use patchplay_synth::MemFs;

    #[test]
    fn test_top_level_patch() {
        let mut fs = MemFs::new();
        assert_eq!(inject_patch(&mut fs, "piano.pat", b"abc").unwrap(), "/piano.pat");
        assert_eq!(fs.read_file("/piano.pat"), Some(&b"abc"[..]));
    }

    #[test]
    fn test_nested_directories() {
        let mut fs = MemFs::new();
        let path = inject_patch(&mut fs, "gm/drums/kick.pat", b"k").unwrap();
        assert_eq!(path, "/gm/drums/kick.pat");
        assert!(fs.exists("/gm"));
        assert!(fs.exists("/gm/drums"));
    }

    #[test]
    fn test_shared_directory_either_order() {
        for order in [["instr/1.pat", "instr/2.pat"], ["instr/2.pat", "instr/1.pat"]] {
            let mut fs = MemFs::new();
            for name in order {
                inject_patch(&mut fs, name, name.as_bytes()).unwrap();
            }
            assert_eq!(fs.read_file("/instr/1.pat"), Some(&b"instr/1.pat"[..]));
            assert_eq!(fs.read_file("/instr/2.pat"), Some(&b"instr/2.pat"[..]));
        }
    }

    #[test]
    fn test_reinjecting_replaces_file() {
        let mut fs = MemFs::new();
        inject_patch(&mut fs, "a/b.pat", b"old").unwrap();
        inject_patch(&mut fs, "a/b.pat", b"new").unwrap();
        assert_eq!(fs.read_file("/a/b.pat"), Some(&b"new"[..]));
    }

    #[test]
    fn test_file_in_place_of_directory_fails() {
        let mut fs = MemFs::new();
        inject_patch(&mut fs, "instr", b"not a dir").unwrap();

        let err = inject_patch(&mut fs, "instr/1.pat", b"x").unwrap_err();
        assert!(matches!(err, Error::Fs(FsError::NotADirectory(_))));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let mut fs = MemFs::new();
        let err = inject_patch(&mut fs, "", b"x").unwrap_err();
        assert!(matches!(err, Error::Fs(FsError::InvalidPath(_))));
    }
}
