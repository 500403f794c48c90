use std::future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Trailing-edge debounce timer.
///
/// Each `schedule` pushes the deadline out by `delay`; `expired` resolves once
/// the deadline passes without another `schedule`. The timer lives inside the
/// owner, so dropping the owner cancels it.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn schedule(&mut self) {
        let at = Instant::now() + self.delay;
        match self.deadline.as_mut() {
            Some(sleep) => sleep.as_mut().reset(at),
            None => self.deadline = Some(Box::pin(tokio::time::sleep_until(at))),
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the pending deadline fires, then disarms. Never resolves
    /// while nothing is scheduled. Cancel-safe: the deadline survives if this
    /// future is dropped early.
    pub async fn expired(&mut self) {
        match self.deadline.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.deadline = None;
            }
            None => future::pending().await,
        }
    }
}
