//! Looping background music behind a small trait so the scene logic can be
//! exercised without an output device.

use std::path::Path;

pub trait BgmPlayer {
    fn play(&mut self) -> Result<(), String>;
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// Used when no output device or decoder is available. Tracks the toggle
/// state so the HUD stays consistent.
#[derive(Debug, Default)]
pub struct NullPlayer {
    playing: bool,
}

impl BgmPlayer for NullPlayer {
    fn play(&mut self) -> Result<(), String> {
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(feature = "audio")]
pub struct RodioPlayer {
    // Dropping the stream silences the sink.
    _stream: rodio::OutputStream,
    sink: rodio::Sink,
}

#[cfg(feature = "audio")]
impl RodioPlayer {
    pub fn open(path: &Path) -> Result<Self, String> {
        use rodio::Source;
        use std::io::BufReader;

        let (stream, handle) = rodio::OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {e}"))?;
        let sink = rodio::Sink::try_new(&handle)
            .map_err(|e| format!("Failed to create audio sink: {e}"))?;
        let file = std::fs::File::open(path)
            .map_err(|e| format!("Failed to open music {}: {e}", path.display()))?;
        let source = rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| format!("Failed to decode music {}: {e}", path.display()))?;
        sink.pause();
        sink.append(source.repeat_infinite());
        Ok(Self {
            _stream: stream,
            sink,
        })
    }
}

#[cfg(feature = "audio")]
impl BgmPlayer for RodioPlayer {
    fn play(&mut self) -> Result<(), String> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused()
    }
}

/// Open the best available player for `path`. Never fails; without a
/// device the toggle still works but stays silent.
pub fn open_player(path: &Path) -> Box<dyn BgmPlayer> {
    #[cfg(feature = "audio")]
    {
        match RodioPlayer::open(path) {
            Ok(player) => {
                log::info!("Background music ready: {}", path.display());
                return Box::new(player);
            }
            Err(e) => log::warn!("{e}; background music disabled"),
        }
    }
    #[cfg(not(feature = "audio"))]
    log::info!(
        "Built without audio support, {} will not play",
        path.display()
    );
    Box::new(NullPlayer::default())
}

/// Play/pause toggle shared by the HUD button, the audio panel, `M` and the
/// left trigger.
pub struct BgmToggle {
    player: Box<dyn BgmPlayer>,
}

impl BgmToggle {
    pub fn new(player: Box<dyn BgmPlayer>) -> Self {
        Self { player }
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// Flip playback. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        if self.player.is_playing() {
            self.player.pause();
            log::info!("Background music paused");
        } else if let Err(e) = self.player.play() {
            log::warn!("Could not start background music: {e}");
        } else {
            log::info!("Background music playing");
        }
        self.player.is_playing()
    }

    /// Stop on scene teardown.
    pub fn stop(&mut self) {
        if self.player.is_playing() {
            self.player.pause();
        }
    }
}
