//! Feedback cues and the input lock held while one plays.

use std::io::Write;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Named sound cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Correct,
    Wrong,
    PartComplete,
    Celebrate,
}

impl Cue {
    pub fn name(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Wrong => "wrong",
            Self::PartComplete => "partComplete",
            Self::Celebrate => "celebrate",
        }
    }

    /// Nominal playback length.
    pub fn duration(self) -> Duration {
        match self {
            Self::Correct => Duration::from_millis(450),
            Self::Wrong => Duration::from_millis(600),
            Self::PartComplete => Duration::from_millis(800),
            Self::Celebrate => Duration::from_millis(2500),
        }
    }
}

#[derive(Debug, Error)]
pub enum CueError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Reported by players that can fail mid-cue; the bell player never does.
    #[allow(dead_code)]
    #[error("cue {0} failed during playback")]
    Playback(&'static str),
}

#[derive(Debug)]
pub enum PlaybackStatus {
    Playing,
    Finished,
    /// See `CueError::Playback`.
    #[allow(dead_code)]
    Failed(CueError),
}

/// Audio side of the gate. One cue at a time.
pub trait CuePlayer {
    fn start(&mut self, cue: Cue, now: Instant) -> Result<(), CueError>;
    fn status(&mut self, now: Instant) -> PlaybackStatus;
}

/// Rings the terminal bell and reports completion once the cue's nominal length has passed.
#[derive(Debug, Default)]
pub struct TerminalCuePlayer {
    mute: bool,
    ends_at: Option<Instant>,
}

impl TerminalCuePlayer {
    pub fn new(mute: bool) -> Self {
        Self { mute, ends_at: None }
    }
}

impl CuePlayer for TerminalCuePlayer {
    fn start(&mut self, cue: Cue, now: Instant) -> Result<(), CueError> {
        if !self.mute && matches!(cue, Cue::Wrong | Cue::Celebrate) {
            let mut out = std::io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        self.ends_at = Some(now + cue.duration());
        Ok(())
    }

    fn status(&mut self, now: Instant) -> PlaybackStatus {
        match self.ends_at {
            Some(t) if now < t => PlaybackStatus::Playing,
            _ => {
                self.ends_at = None;
                PlaybackStatus::Finished
            }
        }
    }
}

/// Why the lock was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Finished,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    cue: Cue,
    started: Instant,
}

/// Locks input from the moment a cue starts until it settles.
#[derive(Debug)]
pub struct FeedbackGate<P> {
    player: P,
    pending: Option<Pending>,
    timeout: Duration,
}

impl<P: CuePlayer> FeedbackGate<P> {
    pub fn new(player: P, timeout: Duration) -> Self {
        Self {
            player,
            pending: None,
            timeout,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    /// Lock, then start `cue`. A start failure unlocks right away.
    pub fn play(&mut self, cue: Cue, now: Instant) {
        debug_assert!(self.pending.is_none(), "cue started while {:?} in flight", self.pending);
        self.pending = Some(Pending { cue, started: now });
        tracing::debug!(cue = cue.name(), "input locked");
        if let Err(e) = self.player.start(cue, now) {
            tracing::warn!(cue = cue.name(), error = %e, "cue failed to start; releasing lock");
            self.pending = None;
        }
    }

    /// Settle the pending cue if it is done, failed, or overdue.
    pub fn poll(&mut self, now: Instant) -> Option<Release> {
        let pending = self.pending?;
        let release = match self.player.status(now) {
            PlaybackStatus::Finished => Release::Finished,
            PlaybackStatus::Failed(e) => {
                tracing::warn!(cue = pending.cue.name(), error = %e, "cue failed; releasing lock");
                Release::Failed
            }
            PlaybackStatus::Playing => {
                if now.saturating_duration_since(pending.started) < self.timeout {
                    return None;
                }
                tracing::warn!(
                    cue = pending.cue.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "cue never completed; releasing lock"
                );
                Release::TimedOut
            }
        };
        self.pending = None;
        tracing::debug!(cue = pending.cue.name(), ?release, "input unlocked");
        Some(release)
    }

    #[cfg(test)]
    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Records started cues; completion is driven by the test.
    #[derive(Debug, Default)]
    pub struct ScriptedPlayer {
        pub started: Vec<Cue>,
        pub fail_start: bool,
        pub next_status: Option<PlaybackStatus>,
    }

    impl ScriptedPlayer {
        pub fn finish(&mut self) {
            self.next_status = Some(PlaybackStatus::Finished);
        }
    }

    impl CuePlayer for ScriptedPlayer {
        fn start(&mut self, cue: Cue, _now: Instant) -> Result<(), CueError> {
            self.started.push(cue);
            if self.fail_start {
                return Err(CueError::Playback(cue.name()));
            }
            Ok(())
        }

        fn status(&mut self, _now: Instant) -> PlaybackStatus {
            self.next_status.take().unwrap_or(PlaybackStatus::Playing)
        }
    }
}
