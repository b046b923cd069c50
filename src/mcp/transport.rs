//! MCP transport layer.
//!
//! Newline-delimited JSON-RPC over a pair of byte streams. The stdio
//! transport is the only one the server ships; the stream form exists so the
//! same framing can run over in-memory pipes.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId};

/// A decoded inbound frame.
#[derive(Debug)]
pub enum Message {
    /// A request carrying an id; exactly one response must follow.
    Request(JsonRpcRequest),
    /// A request without an id; never answered.
    Notification(JsonRpcRequest),
    /// A frame the peer sent as a response. The server never issues requests,
    /// so these are dropped.
    Response(Value),
    /// A frame that could not be decoded but whose id was recovered.
    Invalid { id: RequestId, error: Error },
}

/// Transport trait for MCP communication.
#[async_trait]
pub trait Transport: Send {
    /// Start the transport, returning the inbound message stream and the
    /// outbound response sink.
    async fn start(
        &mut self,
    ) -> Result<(mpsc::Receiver<Message>, mpsc::Sender<JsonRpcResponse>)>;

    /// Stop the transport. Waits for queued responses to be flushed once
    /// every sender has been dropped.
    async fn stop(&mut self) -> Result<()>;
}

/// Transport over an arbitrary reader/writer pair.
pub struct StreamTransport<R, W> {
    reader: Option<R>,
    writer: Option<W>,
    writer_task: Option<JoinHandle<()>>,
}

/// Stdio transport for MCP.
pub type StdioTransport = StreamTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    /// Create a new stdio transport.
    pub fn new() -> Self {
        Self::from_streams(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StreamTransport<R, W> {
    /// Create a transport reading frames from `reader` and writing to `writer`.
    pub fn from_streams(reader: R, writer: W) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            writer_task: None,
        }
    }
}

#[async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn start(
        &mut self,
    ) -> Result<(mpsc::Receiver<Message>, mpsc::Sender<JsonRpcResponse>)> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| Error::Internal("Transport already started".to_string()))?;
        let writer = self
            .writer
            .take()
            .ok_or_else(|| Error::Internal("Transport already started".to_string()))?;

        // Channel for incoming messages (from the input stream)
        let (incoming_tx, incoming_rx) = mpsc::channel::<Message>(100);
        // Channel for outgoing responses (to the output stream)
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<JsonRpcResponse>(100);

        tokio::spawn(read_frames(reader, incoming_tx));
        self.writer_task = Some(tokio::spawn(write_frames(writer, outgoing_rx)));

        Ok((incoming_rx, outgoing_tx))
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.writer_task.take() {
            task.await
                .map_err(|e| Error::Internal(format!("Writer task failed: {}", e)))?;
        }
        Ok(())
    }
}

async fn read_frames<R: AsyncRead + Unpin>(reader: R, tx: mpsc::Sender<Message>) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                debug!("EOF on input stream, stopping transport");
                break;
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                trace!("Received: {}", trimmed);

                if let Some(msg) = decode_frame(trimmed) {
                    if tx.send(msg).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                error!("Error reading input stream: {}", e);
                break;
            }
        }
    }
}

async fn write_frames<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut rx: mpsc::Receiver<JsonRpcResponse>,
) {
    while let Some(response) = rx.recv().await {
        let mut frame = match serde_json::to_vec(&response) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Error serializing response {}: {}", response.id, e);
                continue;
            }
        };
        frame.push(b'\n');

        trace!("Sending: {}", String::from_utf8_lossy(&frame).trim_end());
        if let Err(e) = writer.write_all(&frame).await {
            error!("Error writing to output stream: {}", e);
            break;
        }
        if let Err(e) = writer.flush().await {
            error!("Error flushing output stream: {}", e);
            break;
        }
    }
}

/// Decode one line of input.
///
/// Returns `None` for frames that must be dropped silently: malformed JSON
/// with no recoverable id, or anything without an id that is not a
/// well-formed notification.
pub fn decode_frame(line: &str) -> Option<Message> {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return match recover_id(line) {
                Some(id) => {
                    warn!("Malformed JSON for request {}: {}", id, e);
                    Some(Message::Invalid {
                        id,
                        error: Error::Parse(e.to_string()),
                    })
                }
                None => {
                    error!("Failed to parse message, dropping: {}", e);
                    None
                }
            };
        }
    };

    if value.get("method").is_none()
        && (value.get("result").is_some() || value.get("error").is_some())
    {
        return Some(Message::Response(value));
    }

    let id = value
        .get("id")
        .and_then(|v| serde_json::from_value::<RequestId>(v.clone()).ok());

    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(req) if req.is_notification() => Some(Message::Notification(req)),
        Ok(req) => Some(Message::Request(req)),
        Err(e) => match id {
            Some(id) => Some(Message::Invalid {
                id,
                error: Error::InvalidRequest(e.to_string()),
            }),
            None => {
                error!("Dropping message without id: {}", e);
                None
            }
        },
    }
}

/// Best-effort id extraction from text that is not valid JSON.
///
/// Only an `"id"` key of the outermost object counts; ids inside `params`
/// belong to someone else.
fn recover_id(line: &str) -> Option<RequestId> {
    static ID_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = ID_PATTERN
        .get_or_init(|| {
            Regex::new(r#"^"id"\s*:\s*(-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|"(?:[^"\\]|\\.)*")"#).ok()
        })
        .as_ref()?;

    top_level_strings(line).into_iter().find_map(|start| {
        let raw = pattern.captures(&line[start..])?.get(1)?.as_str();
        serde_json::from_str::<RequestId>(raw).ok()
    })
}

/// Byte offsets of string literals that sit directly inside the outermost
/// object. Brackets inside strings are skipped.
fn top_level_strings(line: &str) -> Vec<usize> {
    let bytes = line.as_bytes();
    let mut starts = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            b'"' => {
                if depth == 1 {
                    starts.push(i);
                }
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_decode_request() {
        let msg = decode_frame(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#);
        match msg {
            Some(Message::Request(req)) => {
                assert_eq!(req.id, Some(RequestId::from(1)));
                assert_eq!(req.method, "tools/list");
            }
            other => panic!("Expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_notification() {
        let msg = decode_frame(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        assert!(matches!(msg, Some(Message::Notification(_))));
    }

    #[test]
    fn test_decode_peer_response() {
        let msg = decode_frame(r#"{"jsonrpc":"2.0","id":9,"result":{}}"#);
        assert!(matches!(msg, Some(Message::Response(_))));
    }

    #[test]
    fn test_malformed_json_with_recoverable_id() {
        let msg = decode_frame(r#"{"jsonrpc":"2.0","id":17,"method":"tools/list""#);
        match msg {
            Some(Message::Invalid { id, error }) => {
                assert_eq!(id, RequestId::from(17));
                assert_eq!(error.code(), -32700);
            }
            other => panic!("Expected invalid frame, got {:?}", other),
        }

        let msg = decode_frame(r#"{"id": "abc", "method": tools/list}"#);
        match msg {
            Some(Message::Invalid { id, .. }) => {
                assert_eq!(id, RequestId::String("abc".into()))
            }
            other => panic!("Expected invalid frame, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_ignores_nested_ids() {
        let line = concat!(
            r#"{"jsonrpc":"2.0","method":"tools/call","#,
            r#""params":{"name":"get_random_data","arguments":{"id":5}},"id":9"#
        );
        match decode_frame(line) {
            Some(Message::Invalid { id, .. }) => assert_eq!(id, RequestId::from(9)),
            other => panic!("Expected invalid frame, got {:?}", other),
        }

        // Braces and an "id" inside a string value do not count.
        let line = r#"{"method":"x {\"id\": 3","params":{"id":4},"id":"real""#;
        match decode_frame(line) {
            Some(Message::Invalid { id, .. }) => {
                assert_eq!(id, RequestId::String("real".into()))
            }
            other => panic!("Expected invalid frame, got {:?}", other),
        }

        // Only nested ids: nothing to correlate with.
        assert!(decode_frame(r#"{"method":"x","params":{"id":4}"#).is_none());
    }

    #[test]
    fn test_malformed_json_with_large_or_fractional_id() {
        for raw in ["9223372036854775808", "1.5"] {
            let line = format!(r#"{{"jsonrpc":"2.0","id":{},"method":"ping""#, raw);
            match decode_frame(&line) {
                Some(Message::Invalid { id, .. }) => {
                    assert_eq!(serde_json::to_string(&id).unwrap(), raw)
                }
                other => panic!("Expected invalid frame, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_request_with_large_or_fractional_id() {
        for raw in ["9223372036854775808", "1.5"] {
            let line = format!(r#"{{"jsonrpc":"2.0","id":{},"method":"ping"}}"#, raw);
            match decode_frame(&line) {
                Some(Message::Request(req)) => {
                    assert_eq!(serde_json::to_string(&req.id).unwrap(), raw)
                }
                other => panic!("Expected request, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_null_id_decodes_as_notification() {
        let msg = decode_frame(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#);
        assert!(matches!(msg, Some(Message::Notification(_))));
    }

    #[test]
    fn test_malformed_json_without_id_is_dropped() {
        assert!(decode_frame("this is not json").is_none());
        assert!(decode_frame(r#"{"method": "tools/list""#).is_none());
    }

    #[test]
    fn test_valid_json_that_is_not_a_request() {
        match decode_frame(r#"{"jsonrpc":"2.0","id":5}"#) {
            Some(Message::Invalid { id, error }) => {
                assert_eq!(id, RequestId::from(5));
                assert_eq!(error.code(), -32600);
            }
            other => panic!("Expected invalid frame, got {:?}", other),
        }
        assert!(decode_frame("[1, 2, 3]").is_none());
    }

    #[tokio::test]
    async fn test_stream_transport_reads_split_frames() {
        let (mut client, server_in) = tokio::io::duplex(64);
        let (server_out, _unused) = tokio::io::duplex(64);
        let mut transport = StreamTransport::from_streams(server_in, server_out);
        let (mut incoming, _outgoing) = transport.start().await.unwrap();

        client.write_all(br#"{"jsonrpc":"2.0","id":1,"#).await.unwrap();
        client.write_all(b"\"method\":\"ping\"}\n\n").await.unwrap();
        client.write_all(b"garbage\n").await.unwrap();
        client
            .write_all(br#"{"jsonrpc":"2.0","id":"two","method":"tools/list"}"#)
            .await
            .unwrap();
        client.write_all(b"\n").await.unwrap();
        drop(client);

        let first = incoming.recv().await.unwrap();
        assert!(matches!(first, Message::Request(ref r) if r.method == "ping"));
        let second = incoming.recv().await.unwrap();
        assert!(
            matches!(second, Message::Request(ref r) if r.id == Some(RequestId::String("two".into())))
        );
        assert!(incoming.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_transport_writes_one_line_per_response() {
        let (_client_in, server_in) = tokio::io::duplex(64);
        let (server_out, mut client_out) = tokio::io::duplex(4096);
        let mut transport = StreamTransport::from_streams(server_in, server_out);
        let (_incoming, outgoing) = transport.start().await.unwrap();

        outgoing
            .send(JsonRpcResponse::success(RequestId::from(1), json!({"a": 1})))
            .await
            .unwrap();
        outgoing
            .send(JsonRpcResponse::success(RequestId::from(2), json!({"b": 2})))
            .await
            .unwrap();
        drop(outgoing);
        transport.stop().await.unwrap();

        let mut written = String::new();
        client_out.read_to_string(&mut written).await.unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], json!(1));
        assert_eq!(first["result"]["a"], json!(1));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let (_a, server_in) = tokio::io::duplex(64);
        let (server_out, _b) = tokio::io::duplex(64);
        let mut transport = StreamTransport::from_streams(server_in, server_out);
        let _channels = transport.start().await.unwrap();
        assert!(transport.start().await.is_err());
    }
}
