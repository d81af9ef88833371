//! The player: engine bootstrap and patch fetching shared by its songs.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;
use patchplay_core::{
    ErrorAction, ErrorInfo, EventChannel, FetchCallback, FetchResponse, Fetcher, PlayerConfig,
    SongParams, SynthEngine, VirtualFs, CONFIG_PATH,
};
use tracing::{debug, error, info, warn};

use crate::inject::inject_patch;
use crate::requests::{PatchRequests, PatchWaiter};
use crate::song::Song;

/// Init status reported when the configuration could not be stored.
const CONFIG_WRITE_FAILED: i32 = -1;

/// `patchDownload` code reported when a fetched patch could not be stored.
pub const PATCH_WRITE_FAILED: i32 = -1;

struct PlayerEvents {
    ready: EventChannel<()>,
    error: EventChannel<ErrorInfo>,
}

/// State shared between a player and its songs.
pub(crate) struct PlayerShared<E: SynthEngine> {
    pub(crate) engine: RefCell<E>,
    fetcher: Rc<dyn Fetcher>,
    config: PlayerConfig,
    /// Set by the first `initialize` call and never cleared.
    init_started: Cell<bool>,
    ready: Cell<bool>,
    requests: PatchRequests,
    events: PlayerEvents,
}

/// Owns one engine instance and loads songs against it.
///
/// Cloning is cheap; clones share the engine and the pending transfers.
pub struct Player<E: SynthEngine> {
    shared: Rc<PlayerShared<E>>,
}

impl<E: SynthEngine> Clone for Player<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<E: SynthEngine> fmt::Debug for Player<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("config", &self.shared.config)
            .field("ready", &self.shared.ready.get())
            .field("requests", &self.shared.requests)
            .finish_non_exhaustive()
    }
}

impl<E: SynthEngine + 'static> Player<E> {
    /// Create a player. Nothing happens until [`Player::initialize`].
    pub fn new(engine: E, fetcher: Rc<dyn Fetcher>, config: PlayerConfig) -> Self {
        Self {
            shared: Rc::new(PlayerShared {
                engine: RefCell::new(engine),
                fetcher,
                config,
                init_started: Cell::new(false),
                ready: Cell::new(false),
                requests: PatchRequests::new(),
                events: PlayerEvents {
                    ready: EventChannel::new(),
                    error: EventChannel::new(),
                },
            }),
        }
    }

    /// Subscribe to the engine becoming usable.
    pub fn on_ready(&self, handler: impl Fn() + 'static) {
        self.shared.events.ready.subscribe(move |()| handler());
    }

    /// Subscribe to player-level failures (`init`, `configDownload`,
    /// `patchDownload`).
    pub fn on_error(&self, handler: impl Fn(&ErrorInfo) + 'static) {
        self.shared.events.error.subscribe(handler);
    }

    /// Bootstrap the engine.
    ///
    /// With `config` the text is used directly; otherwise it is fetched from
    /// the data path. Only the first call does anything.
    pub fn initialize(&self, config: Option<String>) {
        if self.shared.init_started.replace(true) {
            debug!("Player already initialising");
            return;
        }

        match config {
            Some(text) => self.shared.begin(text.as_bytes()),
            None => self.shared.download_configuration(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.shared.ready.get()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    /// Create a song without loading it, so handlers can be attached before
    /// a synchronous load fires them.
    ///
    /// Returns `None` until the player is ready.
    pub fn create_song(&self, params: SongParams) -> Option<Song<E>> {
        if !self.is_ready() {
            warn!("Cannot create song: player not ready");
            return None;
        }
        Some(Song::new(Rc::clone(&self.shared), params))
    }

    /// Load a song from bytes already in memory.
    ///
    /// Returns `None` until the player is ready.
    pub fn load_song_from_buffer(&self, data: impl Into<Bytes>, params: SongParams) -> Option<Song<E>> {
        let song = self.create_song(params)?;
        song.load_from_buffer(data);
        Some(song)
    }

    /// Load a song downloaded from `url`.
    ///
    /// Returns `None` until the player is ready.
    pub fn load_song_from_url(&self, url: &str, params: SongParams) -> Option<Song<E>> {
        let song = self.create_song(params)?;
        song.load_from_url(url);
        Some(song)
    }

    /// Make `name` available in the engine, calling `on_ready` once it is.
    ///
    /// Concurrent requests for one name share a single transfer.
    pub fn request_patch(&self, name: &str, on_ready: impl FnOnce(&str) + 'static) {
        self.shared.request_patch(name, Box::new(on_ready));
    }

    /// Names with a transfer in flight.
    pub fn pending_patches(&self) -> Vec<String> {
        self.shared.requests.names()
    }

    /// Borrow the engine, e.g. to inspect its filesystem.
    pub fn engine(&self) -> Ref<'_, E> {
        self.shared.engine.borrow()
    }
}

impl<E: SynthEngine + 'static> PlayerShared<E> {
    fn download_configuration(self: &Rc<Self>) {
        let location = self.config.config_location();
        info!("Downloading configuration from {location}");

        let shared = Rc::clone(self);
        self.fetcher.fetch(
            &location,
            Box::new(move |response| {
                if response.is_success() {
                    shared.begin(&response.body);
                } else {
                    error!("Configuration download failed with status {}", response.status);
                    shared.emit_error(
                        ErrorInfo::new(ErrorAction::ConfigDownload)
                            .with_code(i32::from(response.status)),
                    );
                }
            }),
        );
    }

    fn begin(&self, config: &[u8]) {
        let status = {
            let mut engine = self.engine.borrow_mut();
            match engine.fs_mut().write_file(CONFIG_PATH, config) {
                Ok(()) => engine.init(),
                Err(e) => {
                    error!("Failed to store configuration: {e}");
                    CONFIG_WRITE_FAILED
                }
            }
        };

        if status == 0 {
            info!("Engine initialised");
            self.ready.set(true);
            self.events.ready.emit(&());
        } else {
            error!("Engine initialisation failed with status {status}");
            self.emit_error(ErrorInfo::new(ErrorAction::Init).with_code(status));
        }
    }

    pub(crate) fn fetch(&self, location: &str, on_complete: FetchCallback) {
        self.fetcher.fetch(location, on_complete);
    }

    pub(crate) fn request_patch(self: &Rc<Self>, name: &str, waiter: PatchWaiter) {
        let location = self.config.resolve(name);
        if !self.requests.enqueue(name, &location, waiter) {
            debug!("Joined pending transfer for {name}");
            return;
        }

        debug!("Requesting patch {name} from {location}");
        let shared = Rc::clone(self);
        let name = name.to_string();
        self.fetcher.fetch(
            &location,
            Box::new(move |response| shared.patch_fetched(&name, response)),
        );
    }

    fn patch_fetched(&self, name: &str, response: FetchResponse) {
        // Drop the record first so waiters re-requesting `name` start afresh.
        let waiters = self.requests.finish(name);

        if !response.is_success() {
            error!("Patch {name} download failed with status {}", response.status);
            self.emit_error(
                ErrorInfo::new(ErrorAction::PatchDownload)
                    .with_code(i32::from(response.status))
                    .with_name(name),
            );
            return;
        }

        let injected = inject_patch(self.engine.borrow_mut().fs_mut(), name, &response.body);
        match injected {
            Ok(path) => debug!("Injected {} bytes at {path}", response.body.len()),
            Err(e) => {
                error!("Failed to inject patch {name}: {e}");
                self.emit_error(
                    ErrorInfo::new(ErrorAction::PatchDownload)
                        .with_code(PATCH_WRITE_FAILED)
                        .with_name(name),
                );
                return;
            }
        }

        debug!("Notifying {} waiter(s) for {name}", waiters.len());
        for waiter in waiters {
            waiter(name);
        }
    }

    fn emit_error(&self, info: ErrorInfo) {
        self.events.error.emit(&info);
    }
}
