//! Errors raised while starting or running the simulator front-ends

use std::io;
use thiserror::Error;

use crate::sics::ConnectionId;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Pre-flight check found the port taken
    #[error("{front_end} port {port} is unavailable: {reason}")]
    PortUnavailable {
        front_end: &'static str,
        port: u16,
        reason: String,
    },

    #[error("{front_end} could not listen on {address}: {source}")]
    Bind {
        front_end: &'static str,
        address: String,
        #[source]
        source: io::Error,
    },

    /// The front-end was started without a port
    #[error("{0} port is not configured")]
    NotConfigured(&'static str),

    #[error("invalid port setup: {0}")]
    PortSetup(String),

    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    /// Read or write failure on one MT-SICS connection
    #[error("MT-SICS session {conn_id} failed: {source}")]
    Session {
        conn_id: ConnectionId,
        #[source]
        source: io::Error,
    },

    #[error("control API stopped serving: {0}")]
    ControlPlane(#[source] io::Error),

    /// A front-end task panicked or was aborted
    #[error("{server} task aborted: {reason}")]
    TaskAborted { server: &'static str, reason: String },
}

impl ServerError {
    pub fn bind(front_end: &'static str, address: impl ToString, source: io::Error) -> Self {
        Self::Bind {
            front_end,
            address: address.to_string(),
            source,
        }
    }

    /// `map_err` adapter for session I/O
    pub fn session(conn_id: ConnectionId) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Session { conn_id, source }
    }
}
