use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// TCP port the mail service listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 65_111;
pub const MAX_BODY_SIZE: usize = 16_777_216;

/// Header carrying the message recipient, percent-encoded (see [`encode_field`]).
pub const HEADER_TO: &str = "x-mail-to";
/// Header carrying the message sender, percent-encoded.
pub const HEADER_FROM: &str = "x-mail-from";

/// Error types for MailBench operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Failed to connect to {0}: {1}")]
    ConnectionFailed(String, String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("Body exceeds maximum size of {0} bytes")]
    BodyTooLarge(usize),

    #[error("Invalid value for field '{0}'")]
    InvalidField(String),

    #[error("Malformed acknowledgement: {0}")]
    MalformedAck(String),
}

/// A single mail message; the unit of work the benchmark sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub from: String,
    /// Reference-counted so repeated sends of the same message do not copy the payload.
    pub body: Bytes,
}

impl Message {
    pub fn new(to: impl Into<String>, from: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { to: to.into(), from: from.into(), body: body.into() }
    }
}

/// Acknowledgement returned by the service for every accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub to: String,
    pub from: String,
    /// Number of body bytes the service received.
    pub bytes: usize,
    pub message: String,
}

/// Response body of `GET /mail/count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCount {
    pub delivered: u64,
}

/// JSON error envelope returned by the server for all error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for MailBench operations
pub type Result<T> = std::result::Result<T, MailError>;

/// Percent-encode a recipient or sender so any UTF-8 string fits in a header value.
pub fn encode_field(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Reverse [`encode_field`]. Returns `None` when the decoded bytes are not valid UTF-8.
pub fn decode_field(value: &str) -> Option<String> {
    urlencoding::decode(value).ok().map(|s| s.into_owned())
}

/// Normalise a user-supplied server address into `host:port`.
///
/// A bare host or IP gets `default_port`; an address that already names a
/// port is returned unchanged. Bracketed and bare IPv6 literals are accepted.
pub fn resolve_server_addr(input: &str, default_port: u16) -> String {
    let input = input.trim();
    if input.parse::<SocketAddr>().is_ok() {
        return input.to_string();
    }

    let unbracketed = input
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(input);
    if let Ok(ip) = unbracketed.parse::<IpAddr>() {
        return SocketAddr::new(ip, default_port).to_string();
    }

    match input.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => input.to_string(),
        _ => format!("{input}:{default_port}"),
    }
}
