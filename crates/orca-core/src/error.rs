//! Request errors
//!
//! Malformed input that is rejected immediately. Expected degradation
//! (unknown route endpoints, missing upstream data) is never reported here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("unknown team type: {0}")]
    UnknownTeamType(String),

    #[error("malformed room reference: {0:?}")]
    MalformedRoom(String),

    #[error("duplicate room name: {0}")]
    DuplicateRoom(String),

    #[error("unknown layout: {0}")]
    UnknownLayout(String),
}
