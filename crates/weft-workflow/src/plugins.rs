use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use tracing::{debug, info};

use weft_core::config::PluginsConfig;
use weft_core::error::{Result, WeftError};
use weft_core::traits::PluginInvoker;
use weft_core::types::PluginCall;

const EXECUTE_PATH: &str = "/api/tools/execute";
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the AI tools service.
pub struct AiToolsClient {
    http: Client,
    endpoint: String,
}

impl AiToolsClient {
    pub fn new(config: &PluginsConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeftError::Plugin {
                tool: "aitools".into(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: format!("{}{}", config.aitools_url.trim_end_matches('/'), EXECUTE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PluginInvoker for AiToolsClient {
    fn invoke(&self, call: PluginCall) -> BoxFuture<'_, Result<serde_json::Value>> {
        Box::pin(async move {
            info!(tool = %call.tool_id, operation = %call.operation_id, "Calling tool service");
            let plugin_err = |message: String| WeftError::Plugin {
                tool: call.tool_id.clone(),
                message,
            };

            let response = self
                .http
                .post(&self.endpoint)
                .json(&call)
                .send()
                .await
                .map_err(|e| plugin_err(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                return Err(plugin_err(format!("HTTP {}: {}", status, body)));
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| plugin_err(format!("invalid response body: {e}")))?;
            debug!(tool = %call.tool_id, response = %body, "Tool service response");
            Ok(body)
        })
    }
}
