//! Relay tunnel, control plane side
//!
//! Agents running inside a cluster dial the control plane and hold one
//! long-lived stream each. The control plane pushes [`AgentInbound`] frames
//! down that stream and matches the [`AgentOutbound`] answers back to their
//! callers by correlation id. Nothing in here knows what an execution is; the
//! payloads are relayed as they are.
//!
//! [`AgentInbound`]: runway_core::relay::AgentInbound
//! [`AgentOutbound`]: runway_core::relay::AgentOutbound

mod hub;
mod session;

pub use hub::RelayHub;
pub use session::{SessionDriver, SessionHandle};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("agent '{0}' is not connected")]
    AgentNotConnected(String),

    #[error("relay session lost before request {0} was answered, outcome unknown")]
    SessionLost(Uuid),

    #[error("request {0} was not answered in time, outcome unknown")]
    TimedOut(Uuid),

    #[error("relay transport error: {0}")]
    Transport(String),

    #[error("malformed relay frame: {0}")]
    Protocol(String),

    #[error("relay handshake failed: {0}")]
    Handshake(String),
}

impl RelayError {
    /// Errors that end the stream they were observed on
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RelayError::Protocol(_))
    }
}
