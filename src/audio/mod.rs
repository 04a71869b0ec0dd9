//! Playback of audio attached to assistant replies.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

const DEFAULT_MIME: &str = "audio/mpeg";

/// Why a clip did not play.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The environment refused to start playback without a user gesture.
    #[error("Autoplay blocked")]
    AutoplayBlocked,

    #[error("Invalid audio payload: {0}")]
    Decode(String),

    #[error("Audio device error: {0}")]
    Device(String),
}

/// Decoded audio ready for a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    /// Decode a bare base64 string or a `data:<mime>;base64,<data>` URL.
    pub fn decode(payload: &str) -> Result<Self, PlaybackError> {
        let payload = payload.trim();
        let (mime_type, data) = match payload.strip_prefix("data:") {
            Some(rest) => {
                let (meta, data) = rest
                    .split_once(',')
                    .ok_or_else(|| PlaybackError::Decode("data URL has no payload".into()))?;
                let mime = meta
                    .strip_suffix(";base64")
                    .ok_or_else(|| PlaybackError::Decode("data URL is not base64".into()))?;
                let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };
                (mime.to_string(), data)
            }
            None => (DEFAULT_MIME.to_string(), payload),
        };
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;
        if bytes.is_empty() {
            return Err(PlaybackError::Decode("empty audio".into()));
        }
        Ok(Self { mime_type, bytes })
    }
}

/// Starts playback of a clip. Must return once playback has started.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError>;
}

/// Player that discards audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlayer;

impl AudioPlayer for NullPlayer {
    fn play(&self, _clip: &AudioClip) -> Result<(), PlaybackError> {
        Ok(())
    }
}

/// Result of a playback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Played,
    Blocked,
    Failed,
}

/// Plays reply audio. Never surfaces an error to the session.
#[derive(Clone)]
pub struct AudioPlaybackController {
    player: Arc<dyn AudioPlayer>,
}

impl std::fmt::Debug for AudioPlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioPlaybackController").finish_non_exhaustive()
    }
}

impl Default for AudioPlaybackController {
    fn default() -> Self {
        Self::new(Arc::new(NullPlayer))
    }
}

impl AudioPlaybackController {
    pub fn new(player: Arc<dyn AudioPlayer>) -> Self {
        Self { player }
    }

    pub fn play(&self, payload: &str) -> PlaybackOutcome {
        let clip = match AudioClip::decode(payload) {
            Ok(clip) => clip,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable reply audio");
                return PlaybackOutcome::Failed;
            }
        };
        match self.player.play(&clip) {
            Ok(()) => PlaybackOutcome::Played,
            Err(PlaybackError::AutoplayBlocked) => {
                tracing::debug!("Autoplay blocked, skipping reply audio");
                PlaybackOutcome::Blocked
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reply audio playback failed");
                PlaybackOutcome::Failed
            }
        }
    }
}
