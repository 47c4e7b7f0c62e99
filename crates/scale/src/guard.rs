//! Lock-protected owner of the simulated instrument.
//!
//! [`Scale`] is shared as `Arc<Scale>` between the TCP sessions and the HTTP
//! control plane. Every operation takes the same mutex, so any two operations
//! are strictly serialized and no caller ever observes a half-applied update.
//! Nothing inside the lock performs I/O.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::state::InstrumentState;

/// Point-in-time copy of the simulator state, as served by `GET /state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub weight: f64,
    pub tare: f64,
    pub stable: bool,
    pub net_weight: f64,
    pub pieces: u64,
    pub last_command: Option<String>,
    pub last_response: Option<String>,
}

/// Most recent command/response pair, kept for diagnostics only.
#[derive(Debug, Default)]
struct LastInteraction {
    command: Option<String>,
    response: Option<String>,
}

#[derive(Debug)]
struct Inner {
    state: InstrumentState,
    last: LastInteraction,
}

/// Thread-safe simulated balance.
#[derive(Debug)]
pub struct Scale {
    inner: Mutex<Inner>,
}

impl Scale {
    /// Create a guard around a fresh state.
    pub fn new(initial_weight: f64, stable: bool) -> Self {
        Self::from_state(InstrumentState::new(initial_weight, stable))
    }

    /// Create a guard around an existing state.
    pub fn from_state(state: InstrumentState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                last: LastInteraction::default(),
            }),
        }
    }

    pub fn set_weight(&self, weight: f64) {
        self.inner.lock().state.set_weight(weight);
    }

    pub fn set_tare(&self, tare: f64) {
        self.inner.lock().state.set_tare(tare);
    }

    pub fn set_stable(&self, stable: bool) {
        self.inner.lock().state.set_stable(stable);
    }

    /// Negative counts are clamped to zero.
    pub fn set_piece_count(&self, count: i64) {
        self.inner.lock().state.set_piece_count(count);
    }

    /// Run one command line through the interpreter and return the raw
    /// response, CRLF included.
    ///
    /// Parsing, mutation and the last-interaction update happen under a single
    /// lock acquisition.
    pub fn handle_command(&self, line: &str) -> String {
        let mut inner = self.inner.lock();
        let response = inner.state.handle_line(line).to_string();
        inner.last = LastInteraction {
            command: Some(line.to_string()),
            response: Some(response.trim().to_string()),
        };
        drop(inner);

        debug!(command = line, response = response.trim_end(), "Command handled");
        response
    }

    /// Copy every observable field under one lock acquisition.
    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.inner.lock();
        StateSnapshot {
            weight: inner.state.weight(),
            tare: inner.state.tare(),
            stable: inner.state.is_stable(),
            net_weight: inner.state.net_weight(),
            pieces: inner.state.piece_count(),
            last_command: inner.last.command.clone(),
            last_response: inner.last.response.clone(),
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::from_state(InstrumentState::default())
    }
}
