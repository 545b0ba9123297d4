use tracing::{debug, warn};

use crate::{config::PlaybackConfig, Result};

/// Backend that actually plays the birthday song.
pub trait PlaybackBackend {
    fn play(&mut self, seek_seconds: f32) -> Result<()>;
    fn pause(&mut self);
    fn set_muted(&mut self, muted: bool);
    /// Length of the loaded track, when known.
    fn duration(&self) -> Option<f32> {
        None
    }
}

/// Backend that plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayback;

impl PlaybackBackend for SilentPlayback {
    fn play(&mut self, _seek_seconds: f32) -> Result<()> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn set_muted(&mut self, _muted: bool) {}
}

/// Drives the birthday song from state machine transitions. Backend errors
/// are logged and swallowed so the visuals never depend on audio.
pub struct BirthdaySong {
    backend: Box<dyn PlaybackBackend>,
    start_offset: f32,
    muted: bool,
    playing: bool,
}

impl BirthdaySong {
    pub fn new(config: &PlaybackConfig, mut backend: Box<dyn PlaybackBackend>) -> Result<Self> {
        config.validate()?;
        backend.set_muted(config.muted);
        Ok(Self {
            backend,
            start_offset: config.start_offset_seconds,
            muted: config.muted,
            playing: false,
        })
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Starts from the configured offset, kept just inside short tracks.
    pub fn start(&mut self) {
        if self.muted {
            debug!("birthday song muted, not starting");
            return;
        }
        let seek = match self.backend.duration() {
            Some(duration) if duration.is_finite() => {
                self.start_offset.min((duration - 0.1).max(0.0))
            }
            _ => self.start_offset,
        };
        match self.backend.play(seek) {
            Ok(()) => self.playing = true,
            Err(err) => warn!(error = %err, "birthday song failed to play"),
        }
    }

    pub fn stop(&mut self) {
        self.backend.pause();
        self.playing = false;
    }

    /// Flips the mute flag. Unmuting while `celebrating` restarts the song.
    pub fn toggle_mute(&mut self, celebrating: bool) -> bool {
        self.muted = !self.muted;
        self.backend.set_muted(self.muted);
        if self.muted {
            self.backend.pause();
            self.playing = false;
        } else if celebrating {
            self.start();
        }
        self.muted
    }
}

impl std::fmt::Debug for BirthdaySong {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BirthdaySong")
            .field("start_offset", &self.start_offset)
            .field("muted", &self.muted)
            .field("playing", &self.playing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::CakeError;

    #[derive(Default)]
    struct Calls {
        log: Vec<String>,
    }

    struct Recording {
        calls: Rc<RefCell<Calls>>,
        duration: Option<f32>,
        reject: bool,
    }

    impl PlaybackBackend for Recording {
        fn play(&mut self, seek_seconds: f32) -> Result<()> {
            self.calls.borrow_mut().log.push(format!("play {seek_seconds}"));
            if self.reject {
                return Err(CakeError::Playback("autoplay rejected".into()));
            }
            Ok(())
        }

        fn pause(&mut self) {
            self.calls.borrow_mut().log.push("pause".into());
        }

        fn set_muted(&mut self, muted: bool) {
            self.calls.borrow_mut().log.push(format!("muted {muted}"));
        }

        fn duration(&self) -> Option<f32> {
            self.duration
        }
    }

    fn song(duration: Option<f32>, reject: bool) -> (BirthdaySong, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let backend = Recording {
            calls: Rc::clone(&calls),
            duration,
            reject,
        };
        let song = BirthdaySong::new(&PlaybackConfig::default(), Box::new(backend)).unwrap();
        (song, calls)
    }

    #[test]
    fn starts_at_offset() {
        let (mut song, calls) = song(None, false);
        song.start();

        assert!(song.is_playing());
        assert_eq!(calls.borrow().log, vec!["muted false", "play 3"]);
    }

    #[test]
    fn short_tracks_clamp_the_offset() {
        let (mut song, calls) = song(Some(2.0), false);
        song.start();

        assert_eq!(calls.borrow().log.last().map(String::as_str), Some("play 1.9"));
    }

    #[test]
    fn playback_failures_are_swallowed() {
        let (mut song, _) = song(None, true);
        song.start();
        assert!(!song.is_playing());
    }

    #[test]
    fn unmuting_mid_celebration_restarts() {
        let (mut song, calls) = song(None, false);

        assert!(song.toggle_mute(true));
        song.start();
        assert!(!song.toggle_mute(true));

        assert_eq!(
            calls.borrow().log,
            vec!["muted false", "muted true", "pause", "muted false", "play 3"]
        );
    }
}
