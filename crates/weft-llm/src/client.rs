use std::time::Duration;

use futures::future::BoxFuture;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use weft_core::config::SparkConfig;
use weft_core::error::{Result, WeftError};
use weft_core::traits::ChatModel;
use weft_core::types::ChatRequest;

use crate::accumulator::ResponseAccumulator;
use crate::auth::{rfc1123_now, sign_url};
use crate::protocol::ChatPayload;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streaming chat client for the Spark service.
///
/// Each call opens one signed WebSocket, sends a single request frame and
/// reads reply frames until the final one. The connection is always closed
/// before the call returns.
pub struct SparkClient {
    config: SparkConfig,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl SparkClient {
    pub fn new(config: SparkConfig) -> Self {
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
        let response_timeout = Duration::from_secs(config.response_timeout_secs);
        Self {
            config,
            connect_timeout,
            response_timeout,
        }
    }

    /// Override both phase budgets.
    pub fn with_timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self
    }

    async fn call(&self, request: ChatRequest) -> Result<String> {
        let date = rfc1123_now();
        let url = sign_url(
            &self.config.api_url,
            &self.config.api_key,
            &self.config.api_secret,
            &date,
        )?;

        info!(
            domain = %request.domain,
            messages = request.messages.len(),
            "Opening chat stream"
        );

        let (mut ws, _) = tokio::time::timeout(
            self.connect_timeout,
            tokio_tungstenite::connect_async(url.as_str()),
        )
        .await
        .map_err(|_| timeout("connect", self.connect_timeout))?
        .map_err(|e| WeftError::LlmConnect(e.to_string()))?;

        let payload = ChatPayload::new(&self.config.app_id, &self.config.uid, request);
        let body = serde_json::to_string(&payload)?;
        debug!(bytes = body.len(), "Sending chat request");

        let result = match ws.send(WsMessage::Text(body.into())).await {
            Ok(()) => tokio::time::timeout(self.response_timeout, read_reply(&mut ws))
                .await
                .unwrap_or_else(|_| Err(timeout("response", self.response_timeout))),
            Err(e) => Err(WeftError::LlmStream(e.to_string())),
        };

        if let Err(e) = ws.close(None).await {
            debug!(error = %e, "Chat stream close");
        }

        match &result {
            Ok(text) => info!(len = text.len(), "Chat stream complete"),
            Err(e) => warn!(error = %e, "Chat stream failed"),
        }
        result
    }
}

impl ChatModel for SparkClient {
    fn name(&self) -> &str {
        &self.config.domain
    }

    fn chat(&self, request: ChatRequest) -> BoxFuture<'_, Result<String>> {
        Box::pin(self.call(request))
    }
}

async fn read_reply(ws: &mut WsStream) -> Result<String> {
    let mut acc = ResponseAccumulator::new();

    while let Some(msg) = ws.next().await {
        let msg = msg.map_err(|e| WeftError::LlmStream(e.to_string()))?;
        let text = match msg {
            WsMessage::Text(t) => t.to_string(),
            WsMessage::Binary(b) => String::from_utf8_lossy(&b).into_owned(),
            WsMessage::Ping(data) => {
                if let Err(e) = ws.send(WsMessage::Pong(data)).await {
                    debug!(error = %e, "Pong send failed");
                }
                continue;
            }
            WsMessage::Close(frame) => {
                debug!(?frame, partial = acc.partial().len(), "Close before final frame");
                return Err(WeftError::IncompleteStream);
            }
            _ => continue,
        };

        if let Some(reply) = acc.feed(&text)? {
            return Ok(reply);
        }
    }

    Err(WeftError::IncompleteStream)
}

fn timeout(phase: &str, budget: Duration) -> WeftError {
    WeftError::Timeout {
        phase: phase.to_string(),
        secs: budget.as_secs(),
    }
}
