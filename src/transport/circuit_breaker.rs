//! Count-based circuit breaker.

use super::config::CircuitBreakerConfig;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{info, warn};

/// Observable state of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow; outcomes are recorded.
    Closed,
    /// Calls are rejected until the wait duration elapses.
    Open,
    /// A limited number of trial calls decide whether to close again.
    HalfOpen,
}

/// Fixed-size window of recent outcomes (`true` = failure).
#[derive(Debug)]
struct Ring {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, failed: bool) {
        if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(failed);
    }

    fn is_full(&self) -> bool {
        self.outcomes.len() >= self.capacity
    }

    fn failure_rate(&self) -> f32 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let failures = self.outcomes.iter().filter(|failed| **failed).count();
        failures as f32 * 100.0 / self.outcomes.len() as f32
    }
}

#[derive(Debug)]
enum State {
    Closed { ring: Ring },
    Open { reopen_at: Instant },
    HalfOpen { admitted: usize, ring: Ring },
}

/// Circuit breaker guarding one external dependency.
///
/// Permission is checked before a call is scheduled with
/// [`try_acquire`](Self::try_acquire); the final outcome of an admitted call
/// is reported with [`on_success`](Self::on_success) or
/// [`on_failure`](Self::on_failure). The breaker is shared between
/// concurrent calls and never blocks beyond a short internal lock.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let ring = Ring::new(config.ring_buffer_size_in_closed_state);
        Self {
            name: name.into(),
            config,
            state: Mutex::new(State::Closed { ring }),
        }
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        match &*self.lock() {
            State::Closed { .. } => CircuitState::Closed,
            State::Open { .. } => CircuitState::Open,
            State::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Ask for permission to make a call.
    ///
    /// Returns `false` while open, and while half-open once all trial calls
    /// have been handed out. An open breaker whose wait has elapsed moves to
    /// half-open and admits the caller as its first trial.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        match &mut *state {
            State::Closed { .. } => true,
            State::Open { reopen_at } => {
                if Instant::now() < *reopen_at {
                    return false;
                }
                *state = State::HalfOpen {
                    admitted: 1,
                    ring: Ring::new(self.config.ring_buffer_size_in_half_open_state),
                };
                #[cfg(feature = "tracing")]
                info!(dependency = %self.name, "circuit breaker half-open");
                true
            }
            State::HalfOpen { admitted, .. } => {
                if *admitted < self.config.ring_buffer_size_in_half_open_state {
                    *admitted += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call.
    pub fn on_success(&self) {
        self.record(false);
    }

    /// Record a failed call.
    pub fn on_failure(&self) {
        self.record(true);
    }

    fn record(&self, failed: bool) {
        let mut state = self.lock();
        let threshold = self.config.failure_rate_threshold;

        let next = match &mut *state {
            State::Closed { ring } => {
                ring.push(failed);
                (ring.is_full() && ring.failure_rate() >= threshold).then(|| self.opened(ring))
            }
            State::HalfOpen { ring, .. } => {
                ring.push(failed);
                if !ring.is_full() {
                    None
                } else if ring.failure_rate() >= threshold {
                    Some(self.opened(ring))
                } else {
                    #[cfg(feature = "tracing")]
                    info!(dependency = %self.name, "circuit breaker closed");
                    Some(State::Closed {
                        ring: Ring::new(self.config.ring_buffer_size_in_closed_state),
                    })
                }
            }
            // Late outcome of a call admitted before the breaker opened.
            State::Open { .. } => None,
        };

        if let Some(next) = next {
            *state = next;
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn opened(&self, ring: &Ring) -> State {
        #[cfg(feature = "tracing")]
        warn!(
            dependency = %self.name,
            failure_rate = ring.failure_rate(),
            reopen_in = ?self.config.wait_duration_in_open_state,
            "circuit breaker opened"
        );
        State::Open {
            reopen_at: Instant::now() + self.config.wait_duration_in_open_state,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
