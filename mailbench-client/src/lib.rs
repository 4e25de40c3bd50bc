use bytes::Bytes;
use mailbench_common::{
    encode_field, Ack, DeliveryCount, ErrorResponse, MailError, Message, Result, HEADER_FROM, HEADER_TO,
    MAX_BODY_SIZE,
};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{info, trace};

/// How long `Client::connect` waits for the first round trip before giving up.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// MailBench client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Target service as `host:port`.
    pub server_addr: String,
}

/// A message already validated and encoded for the wire.
///
/// Build once with [`PreparedMessage::new`] and reuse it for every call of a
/// run so per-call work is limited to the round trip itself.
#[derive(Debug, Clone)]
pub struct PreparedMessage {
    to: HeaderValue,
    from: HeaderValue,
    body: Bytes,
}

impl PreparedMessage {
    pub fn new(message: &Message) -> Result<Self> {
        if message.body.len() > MAX_BODY_SIZE {
            return Err(MailError::BodyTooLarge(MAX_BODY_SIZE));
        }
        Ok(Self {
            to: header_value(&message.to, "to")?,
            from: header_value(&message.from, "from")?,
            body: message.body.clone(),
        })
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

/// Percent-encode a name into a header value; the encoded form is always visible ASCII.
fn header_value(value: &str, field: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&encode_field(value)).map_err(|_| MailError::InvalidField(field.to_string()))
}

/// RPC proxy for the mail service.
///
/// The underlying HTTP pool keeps the connection opened by `connect` alive
/// between calls; dropping the client closes it.
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration. No connection is made yet.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client and establish the connection with one round trip.
    /// Any failure here is reported as `ConnectionFailed`.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Self::new(config);
        let addr = client.config.server_addr.clone();

        let delivered = tokio::time::timeout(CONNECT_TIMEOUT, client.delivered())
            .await
            .map_err(|_| MailError::ConnectionFailed(addr.clone(), "timed out".to_string()))?
            .map_err(|e| match e {
                MailError::NetworkError(reason) => MailError::ConnectionFailed(addr.clone(), reason),
                MailError::HttpError(status, msg) => {
                    MailError::ConnectionFailed(addr.clone(), format!("HTTP {status}: {msg}"))
                }
                other => other,
            })?;

        info!(server = %addr, delivered, "connected to mail service");
        Ok(client)
    }

    /// Build the URL for a service path against the configured server.
    pub fn build_url(&self, path: &str) -> String {
        format!("http://{}{}", self.config.server_addr, path)
    }

    /// Send one message and wait for its acknowledgement.
    pub async fn send(&self, message: &Message) -> Result<Ack> {
        self.send_prepared(&PreparedMessage::new(message)?).await
    }

    /// Send a message prepared earlier and wait for its acknowledgement.
    pub async fn send_prepared(&self, message: &PreparedMessage) -> Result<Ack> {
        let response = self
            .http_client
            .post(self.build_url("/mail"))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(HEADER_TO, message.to.clone())
            .header(HEADER_FROM, message.from.clone())
            .body(message.body.clone())
            .send()
            .await
            .map_err(|e| MailError::NetworkError(e.to_string()))?;

        let ack: Ack = read_json(response).await?;
        trace!(bytes = ack.bytes, "message acknowledged");
        Ok(ack)
    }

    /// Number of messages the service has accepted since it started.
    pub async fn delivered(&self) -> Result<u64> {
        let response = self
            .http_client
            .get(self.build_url("/mail/count"))
            .send()
            .await
            .map_err(|e| MailError::NetworkError(e.to_string()))?;

        let count: DeliveryCount = read_json(response).await?;
        Ok(count.delivered)
    }
}

/// Check the status and decode a JSON success body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(parse_error_response(status, response).await);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MailError::NetworkError(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| MailError::MalformedAck(e.to_string()))
}

async fn parse_error_response(status: reqwest::StatusCode, response: reqwest::Response) -> MailError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    MailError::HttpError(status.as_u16(), error_msg)
}
