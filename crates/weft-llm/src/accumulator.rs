use tracing::debug;

use weft_core::error::{Result, WeftError};

use crate::protocol::{ResponseFrame, STATUS_FINAL};

/// Collects streamed reply fragments into the final answer.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    text: String,
    frames: usize,
    done: bool,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one inbound text frame.
    ///
    /// Returns `Ok(Some(text))` once the final frame arrives, `Ok(None)` while
    /// more frames are expected. A non-zero application code fails
    /// immediately and nothing from that frame is appended.
    pub fn feed(&mut self, raw: &str) -> Result<Option<String>> {
        let frame: ResponseFrame = serde_json::from_str(raw)
            .map_err(|e| WeftError::LlmStream(format!("malformed frame: {e}")))?;
        self.feed_frame(frame)
    }

    pub fn feed_frame(&mut self, frame: ResponseFrame) -> Result<Option<String>> {
        if self.done {
            return Err(WeftError::LlmStream("frame received after final".into()));
        }
        if frame.header.code != 0 {
            return Err(WeftError::RemoteApi {
                code: frame.header.code,
                message: frame.header.message,
            });
        }

        self.frames += 1;
        for fragment in frame.fragments() {
            self.text.push_str(fragment);
        }
        debug!(
            frame = self.frames,
            status = frame.header.status,
            len = self.text.len(),
            "Reply frame"
        );

        if frame.header.status == STATUS_FINAL {
            self.done = true;
            return Ok(Some(std::mem::take(&mut self.text)));
        }
        Ok(None)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Text accumulated so far.
    pub fn partial(&self) -> &str {
        &self.text
    }
}
