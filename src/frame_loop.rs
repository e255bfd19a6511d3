//! Cancellable per-frame loop state
//!
//! The host asks for another frame only while `FrameLoop::is_running` holds.
//! Every tick and every deferred callback checks the token first.

use std::cell::Cell;
use std::rc::Rc;

/// Shared one-way cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for something to animate
    Idle,
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct FrameLoop {
    token: CancellationToken,
    state: LoopState,
    ticks: u64,
}

impl FrameLoop {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            state: LoopState::Idle,
            ticks: 0,
        }
    }

    /// No-op once cancelled
    pub fn start(&mut self) {
        if self.token.is_cancelled() {
            self.state = LoopState::Stopped;
        } else if self.state == LoopState::Idle {
            self.state = LoopState::Running;
        }
    }

    pub fn state(&self) -> LoopState {
        if self.token.is_cancelled() {
            LoopState::Stopped
        } else {
            self.state
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// Claim the next frame; false means the caller must not touch the scene
    pub fn begin_tick(&mut self) -> bool {
        if !self.is_running() {
            self.state = self.state();
            return false;
        }
        self.ticks += 1;
        true
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_only_while_running() {
        let token = CancellationToken::new();
        let mut frames = FrameLoop::new(token.clone());

        assert!(!frames.begin_tick());
        frames.start();
        assert!(frames.begin_tick());
        assert!(frames.begin_tick());

        token.cancel();
        for _ in 0..10 {
            assert!(!frames.begin_tick());
        }
        assert_eq!(frames.ticks(), 2);
        assert_eq!(frames.state(), LoopState::Stopped);
    }

    #[test]
    fn test_start_after_cancel_stays_stopped() {
        let token = CancellationToken::new();
        token.cancel();
        let mut frames = FrameLoop::new(token);
        frames.start();
        assert!(!frames.is_running());
        assert!(!frames.begin_tick());
    }
}
