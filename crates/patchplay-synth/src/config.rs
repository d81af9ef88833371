//! Timidity-style configuration text.
//!
//! ```text
//! # comment
//! dir instruments
//! soundfont GeneralUser.sf2
//! ```

use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthConfig {
    /// Prefix applied to relative soundfont names.
    pub dir: Option<String>,
    /// The last `soundfont` directive wins.
    pub soundfont: Option<String>,
}

impl SynthConfig {
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();

        for (number, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let mut words = line.split_whitespace();
            let directive = words.next().unwrap_or_default();
            let argument = words.next();

            match (directive, argument) {
                ("dir", Some(dir)) => config.dir = Some(dir.trim_matches('/').to_string()),
                ("soundfont", Some(name)) => config.soundfont = Some(name.to_string()),
                ("dir" | "soundfont", None) => {
                    warn!("Config line {}: {directive} needs an argument", number + 1);
                }
                _ => warn!("Config line {}: ignoring {directive}", number + 1),
            }
        }

        config
    }

    /// Resource name of the soundfont, relative to the filesystem root.
    ///
    /// Absolute names ignore `dir`.
    pub fn soundfont_name(&self) -> Option<String> {
        let name = self.soundfont.as_deref()?;
        if let Some(absolute) = name.strip_prefix('/') {
            return Some(absolute.to_string());
        }
        match self.dir.as_deref() {
            Some(dir) if !dir.is_empty() => Some(format!("{dir}/{name}")),
            _ => Some(name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        let config = SynthConfig::parse(
            "# default bank\n\
             dir /sf/\n\
             soundfont  GeneralUser.sf2   # main\n\
             \n\
             bank 0\n",
        );
        assert_eq!(config.dir.as_deref(), Some("sf"));
        assert_eq!(config.soundfont.as_deref(), Some("GeneralUser.sf2"));
        assert_eq!(config.soundfont_name().as_deref(), Some("sf/GeneralUser.sf2"));
    }

    #[test]
    fn test_last_soundfont_wins() {
        let config = SynthConfig::parse("soundfont a.sf2\nsoundfont b.sf2\n");
        assert_eq!(config.soundfont_name().as_deref(), Some("b.sf2"));
    }

    #[test]
    fn test_absolute_name_ignores_dir() {
        let config = SynthConfig::parse("dir patches\nsoundfont /fonts/a.sf2");
        assert_eq!(config.soundfont_name().as_deref(), Some("fonts/a.sf2"));
    }

    #[test]
    fn test_missing_arguments() {
        let config = SynthConfig::parse("soundfont\ndir\n");
        assert_eq!(config, SynthConfig::default());
        assert_eq!(config.soundfont_name(), None);
    }
}
