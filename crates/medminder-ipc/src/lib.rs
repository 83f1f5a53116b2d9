//! IPC layer for medminderd
//!
//! One JSON document per line over a Unix domain socket. Clients send
//! `Request`s and get exactly one `Response` each; subscribed clients also
//! receive `Event`s interleaved with their responses.

mod client;
mod server;

pub use client::*;
pub use server::*;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Unexpected message: {0}")]
    InvalidMessage(String),

    #[error("Service error: {0}")]
    ServerError(String),
}

pub type IpcResult<T> = Result<T, IpcError>;

/// Serialize `value` as a single protocol line, newline included
pub(crate) fn encode_line(value: &impl Serialize) -> IpcResult<String> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}
