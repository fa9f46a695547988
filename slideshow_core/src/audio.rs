// Audio collaborator and the ending fade.
// The engine never owns a real audio element; it talks to an AudioSink and treats play() as fallible.

use serde::{Deserialize, Serialize};

use crate::error::SlideshowError;

/// Tolerance for float drift when deciding the last fade step.
const FADE_EPSILON: f32 = 1e-4;

/// Anything that can play the soundtrack.
pub trait AudioSink {
    /// Start or resume playback. Failure is non-fatal to the show.
    fn play(&mut self) -> Result<(), SlideshowError>;
    fn pause(&mut self);
    /// Volume in [0, 1].
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
}

/// Result of one fade tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeStep {
    /// Volume lowered to this value, still audible.
    Lowered(f32),
    /// Volume is 0.0; playback should stop.
    Silenced,
}

/// Linear volume ramp from 1.0 down to silence.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeFade {
    volume: f32,
    step: f32,
}

impl VolumeFade {
    pub fn new(step: f32) -> Self {
        VolumeFade { volume: 1.0, step }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_silent(&self) -> bool {
        self.volume <= 0.0
    }

    /// Lower the volume by one step. Once silent the volume stays at 0.0.
    pub fn step(&mut self) -> FadeStep {
        if self.is_silent() {
            return FadeStep::Silenced;
        }
        if self.volume > self.step + FADE_EPSILON {
            self.volume = (self.volume - self.step).max(0.0);
            FadeStep::Lowered(self.volume)
        } else {
            self.volume = 0.0;
            FadeStep::Silenced
        }
    }
}

/// Instruction for a host-owned audio element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AudioCommand {
    Play,
    Pause,
    SetVolume { volume: f32 },
    SetMuted { muted: bool },
}

/// Sink that records commands for the host to apply (e.g. to an `<audio>` element).
/// Playback failure comes back asynchronously through the engine's failure report.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: Vec<AudioCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn pending(&self) -> &[AudioCommand] {
        &self.commands
    }
}

impl AudioSink for CommandQueue {
    fn play(&mut self) -> Result<(), SlideshowError> {
        self.commands.push(AudioCommand::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.commands.push(AudioCommand::Pause);
    }

    fn set_volume(&mut self, volume: f32) {
        self.commands.push(AudioCommand::SetVolume {
            volume: volume.clamp(0.0, 1.0),
        });
    }

    fn set_muted(&mut self, muted: bool) {
        self.commands.push(AudioCommand::SetMuted { muted });
    }
}
