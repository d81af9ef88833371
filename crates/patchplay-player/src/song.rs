//! Song loading state machine and the render loop.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;
use patchplay_core::{
    Error, ErrorAction, ErrorInfo, EventChannel, PcmSample, Result, SongParams, SynthEngine,
};
use tracing::{debug, error, info, trace, warn};

use crate::player::PlayerShared;

/// Where a song is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No song data has been supplied yet.
    #[default]
    Unattempted,
    /// The engine is building a native handle.
    Constructing,
    /// Waiting for patch transfers before trying again.
    AwaitingResources,
    /// A native handle exists and rendering may start.
    Ready,
    /// The engine rejected the song data.
    Failed,
    /// Resources were released by cleanup or end-of-stream.
    Released,
}

/// Native handle plus the scratch buffer it renders into.
///
/// Kept together so both are released at the same time.
struct LoadedSong<H> {
    handle: H,
    scratch: Vec<u8>,
    bytes_per_sample: usize,
}

enum Attempt<H> {
    Loaded(H),
    Missing(Vec<String>),
    Rejected,
}

struct SongEvents {
    ready: EventChannel<()>,
    error: EventChannel<ErrorInfo>,
    ended: EventChannel<()>,
}

pub(crate) struct SongInner<E: SynthEngine> {
    player: Rc<PlayerShared<E>>,
    params: SongParams,
    state: Cell<LoadState>,
    data: RefCell<Option<Bytes>>,
    /// Patch names still outstanding, in request order.
    missing: RefCell<Vec<String>>,
    loaded: RefCell<Option<LoadedSong<E::Song>>>,
    attempts: Cell<usize>,
    events: SongEvents,
}

/// One playback request.
///
/// Cloning is cheap; clones refer to the same song. Engine resources are
/// released on end-of-stream, on [`Song::cleanup`], or when the last clone
/// and every pending transfer referring to it are gone.
pub struct Song<E: SynthEngine> {
    inner: Rc<SongInner<E>>,
}

impl<E: SynthEngine> Clone for Song<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: SynthEngine> fmt::Debug for Song<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Song")
            .field("params", &self.inner.params)
            .field("state", &self.inner.state.get())
            .field("missing", &self.inner.missing.borrow())
            .finish_non_exhaustive()
    }
}

impl<E: SynthEngine + 'static> Song<E> {
    pub(crate) fn new(player: Rc<PlayerShared<E>>, params: SongParams) -> Self {
        Self {
            inner: Rc::new(SongInner {
                player,
                params: params.normalized(),
                state: Cell::new(LoadState::Unattempted),
                data: RefCell::new(None),
                missing: RefCell::new(Vec::new()),
                loaded: RefCell::new(None),
                attempts: Cell::new(0),
                events: SongEvents {
                    ready: EventChannel::new(),
                    error: EventChannel::new(),
                    ended: EventChannel::new(),
                },
            }),
        }
    }

    /// Subscribe to the song becoming playable.
    pub fn on_ready(&self, handler: impl Fn() + 'static) {
        self.inner.events.ready.subscribe(move |()| handler());
    }

    /// Subscribe to load failures (`midiLoad`, `midiDownload`).
    pub fn on_error(&self, handler: impl Fn(&ErrorInfo) + 'static) {
        self.inner.events.error.subscribe(handler);
    }

    /// Subscribe to end-of-stream.
    pub fn on_ended(&self, handler: impl Fn() + 'static) {
        self.inner.events.ended.subscribe(move |()| handler());
    }

    /// Start loading from song bytes.
    pub fn load_from_buffer(&self, data: impl Into<Bytes>) {
        self.inner.load(data.into());
    }

    /// Download song bytes from `url`, then load them.
    pub fn load_from_url(&self, url: &str) {
        info!("Downloading song from {url}");
        let inner = Rc::clone(&self.inner);
        self.inner.player.fetch(
            url,
            Box::new(move |response| {
                if response.is_success() {
                    inner.load(response.body);
                } else {
                    error!("Song download failed with status {}", response.status);
                    inner.events.error.emit(
                        &ErrorInfo::new(ErrorAction::MidiDownload)
                            .with_code(i32::from(response.status)),
                    );
                }
            }),
        );
    }

    pub fn state(&self) -> LoadState {
        self.inner.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.loaded.borrow().is_some()
    }

    pub fn params(&self) -> &SongParams {
        &self.inner.params
    }

    /// Patch names the song is still waiting for.
    pub fn missing_files(&self) -> Vec<String> {
        self.inner.missing.borrow().clone()
    }

    /// Number of construction attempts made so far.
    pub fn load_attempts(&self) -> usize {
        self.inner.attempts.get()
    }

    /// Begin playback.
    pub fn start(&self) -> Result<()> {
        let mut loaded = self.inner.loaded.borrow_mut();
        let loaded = loaded.as_mut().ok_or(Error::SongNotReady)?;
        self.inner
            .player
            .engine
            .borrow_mut()
            .start_song(&mut loaded.handle);
        Ok(())
    }

    /// Playback position in seconds.
    pub fn time(&self) -> Option<f64> {
        let loaded = self.inner.loaded.borrow();
        let loaded = loaded.as_ref()?;
        let ms = self.inner.player.engine.borrow().song_time(&loaded.handle);
        Some(f64::from(ms) / 1000.0)
    }

    /// Song length in seconds.
    pub fn total_time(&self) -> Option<f64> {
        let loaded = self.inner.loaded.borrow();
        let loaded = loaded.as_ref()?;
        let ms = self
            .inner
            .player
            .engine
            .borrow()
            .song_total_time(&loaded.handle);
        Some(f64::from(ms) / 1000.0)
    }

    /// Render one block into `output`.
    ///
    /// `S` must be the element type of the configured format (`i16` for
    /// `s16`, `u8` for `u8`, ...). Returns the number of frames rendered; the
    /// first `frames * channels` elements of `output` are written. Zero means
    /// end-of-stream: `ended` fires once, resources are released, and later
    /// calls keep returning zero.
    pub fn render<S: PcmSample>(&self, output: &mut [S]) -> Result<usize> {
        let format = self.inner.params.format;
        if !format.accepts::<S>() {
            return Err(Error::FormatMismatch { expected: format });
        }

        let frames = {
            let mut loaded = self.inner.loaded.borrow_mut();
            let Some(loaded) = loaded.as_mut() else {
                return Ok(0);
            };

            let bytes = self
                .inner
                .player
                .engine
                .borrow_mut()
                .read_wave(&mut loaded.handle, &mut loaded.scratch)
                .min(loaded.scratch.len());
            let frames = bytes / loaded.bytes_per_sample;

            if frames > 0 {
                let used = frames * loaded.bytes_per_sample;
                let written = format.decode_into(&loaded.scratch[..used], output)?;
                let wanted = frames * usize::from(self.inner.params.channels);
                if written < wanted {
                    warn!("Output holds {written} of {wanted} rendered samples");
                }
            }
            frames
        };

        if frames == 0 {
            debug!("End of stream");
            self.inner.release();
            self.inner.events.ended.emit(&());
        } else {
            trace!("Rendered {frames} frames");
        }
        Ok(frames)
    }

    /// Release the native handle and scratch buffer. Safe to call repeatedly.
    pub fn cleanup(&self) {
        self.inner.release();
    }
}

impl<E: SynthEngine + 'static> SongInner<E> {
    fn load(self: &Rc<Self>, data: Bytes) {
        if self.state.get() != LoadState::Unattempted {
            warn!("Song already loading; ignoring new data");
            return;
        }

        debug!("Loading song from {} bytes", data.len());
        *self.data.borrow_mut() = Some(data);
        self.try_load();
    }

    fn try_load(self: &Rc<Self>) {
        if !matches!(
            self.state.get(),
            LoadState::Unattempted | LoadState::AwaitingResources
        ) {
            return;
        }
        let Some(data) = self.data.borrow().clone() else {
            return;
        };

        self.state.set(LoadState::Constructing);
        self.attempts.set(self.attempts.get() + 1);

        match self.construct(&data) {
            Attempt::Rejected => {
                self.state.set(LoadState::Failed);
                error!("Engine could not load the song");
                self.events
                    .error
                    .emit(&ErrorInfo::new(ErrorAction::MidiLoad));
            }
            Attempt::Missing(names) => {
                info!("Song needs {} patch file(s)", names.len());
                self.state.set(LoadState::AwaitingResources);
                self.missing.borrow_mut().clone_from(&names);

                for name in names {
                    let song = Rc::clone(self);
                    self.player
                        .request_patch(&name, Box::new(move |name| song.patch_arrived(name)));
                }
            }
            Attempt::Loaded(handle) => {
                let bytes_per_sample = self.params.bytes_per_sample();
                *self.loaded.borrow_mut() = Some(LoadedSong {
                    handle,
                    scratch: vec![0; self.params.buffer_size * bytes_per_sample],
                    bytes_per_sample,
                });
                self.state.set(LoadState::Ready);
                info!("Song ready after {} attempt(s)", self.attempts.get());
                self.events.ready.emit(&());
            }
        }
    }

    /// One full construction attempt.
    ///
    /// The stream and options are released whatever the outcome.
    fn construct(&self, data: &[u8]) -> Attempt<E::Song> {
        let mut engine = self.player.engine.borrow_mut();

        let options = engine.alloc_options(self.params.decode_options());
        let mut stream = engine.open_stream(data);
        let song = engine.load_song(&mut stream, &options);
        engine.close_stream(stream);
        engine.free_options(options);

        let Some(song) = song else {
            return Attempt::Rejected;
        };

        let count = engine.load_request_count(&song);
        if count == 0 {
            return Attempt::Loaded(song);
        }

        let mut names: Vec<String> = Vec::with_capacity(count);
        for index in 0..count {
            match engine.load_request(&song, index) {
                Some(name) if !names.contains(&name) => names.push(name),
                Some(_) => {}
                None => warn!("Engine reported no name for load request {index}"),
            }
        }
        engine.free_song(song);

        if names.is_empty() {
            // Nothing to fetch would retry forever.
            return Attempt::Rejected;
        }
        Attempt::Missing(names)
    }

    fn patch_arrived(self: &Rc<Self>, name: &str) {
        if self.state.get() != LoadState::AwaitingResources {
            debug!("Ignoring patch {name}: song no longer waiting");
            return;
        }

        let all_present = {
            let mut missing = self.missing.borrow_mut();
            let before = missing.len();
            missing.retain(|pending| pending != name);
            if missing.len() == before {
                return;
            }
            missing.is_empty()
        };

        if all_present {
            debug!("All patches present, retrying song construction");
            self.try_load();
        }
    }

    fn release(&self) {
        self.missing.borrow_mut().clear();
        if matches!(
            self.state.get(),
            LoadState::Ready | LoadState::AwaitingResources
        ) {
            self.state.set(LoadState::Released);
        }

        let Some(loaded) = self.loaded.borrow_mut().take() else {
            return;
        };
        match self.player.engine.try_borrow_mut() {
            Ok(mut engine) => {
                engine.free_song(loaded.handle);
                debug!("Released song handle");
            }
            Err(_) => error!("Engine busy; song handle leaked"),
        }
    }
}

impl<E: SynthEngine> Drop for SongInner<E> {
    fn drop(&mut self) {
        if let Some(loaded) = self.loaded.get_mut().take() {
            if let Ok(mut engine) = self.player.engine.try_borrow_mut() {
                engine.free_song(loaded.handle);
            }
        }
    }
}
