//! IPC client implementation

use medminder_api::{Command, Event, Request, Response, ResponseResult};
use std::collections::VecDeque;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use crate::{encode_line, IpcError, IpcResult};

/// One line from the server: either a reply or a pushed event
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Incoming {
    Response(Response),
    Event(Event),
}

/// IPC Client for connecting to medminderd
pub struct IpcClient {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
    next_request_id: u64,
    /// Events that arrived while waiting for a response
    pending_events: VecDeque<Event>,
}

impl IpcClient {
    /// Connect to medminderd
    pub async fn connect(socket_path: impl AsRef<Path>) -> IpcResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
            pending_events: VecDeque::new(),
        })
    }

    /// Send a command and wait for response
    pub async fn send(&mut self, command: Command) -> IpcResult<Response> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let line = encode_line(&Request::new(request_id, command))?;
        self.writer.write_all(line.as_bytes()).await?;

        loop {
            match read_incoming(&mut self.reader).await? {
                Incoming::Response(response) if response.request_id == request_id => {
                    return Ok(response);
                }
                Incoming::Response(response) => {
                    // A reply to a malformed line carries id 0
                    if let ResponseResult::Err(e) = response.result {
                        return Err(IpcError::ServerError(e.message));
                    }
                    return Err(IpcError::InvalidMessage(format!(
                        "response for request {} while waiting for {}",
                        response.request_id, request_id
                    )));
                }
                Incoming::Event(event) => self.pending_events.push_back(event),
            }
        }
    }

    /// Subscribe to events and consume this client to return an event stream
    pub async fn subscribe(mut self) -> IpcResult<EventStream> {
        let response = self.send(Command::SubscribeEvents).await?;

        if let ResponseResult::Err(e) = response.result {
            return Err(IpcError::ServerError(e.message));
        }

        Ok(EventStream {
            reader: self.reader,
            pending: self.pending_events,
        })
    }
}

/// Stream of events from medminderd
pub struct EventStream {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    pending: VecDeque<Event>,
}

impl EventStream {
    /// Wait for the next event
    pub async fn next(&mut self) -> IpcResult<Event> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }

        loop {
            match read_incoming(&mut self.reader).await? {
                Incoming::Event(event) => return Ok(event),
                Incoming::Response(_) => continue,
            }
        }
    }
}

async fn read_incoming(
    reader: &mut BufReader<tokio::net::unix::OwnedReadHalf>,
) -> IpcResult<Incoming> {
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(IpcError::ConnectionClosed);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        return serde_json::from_str(trimmed)
            .map_err(|e| IpcError::InvalidMessage(e.to_string()));
    }
}
