use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::http::{HttpPushClient, HttpPushClientError};

/// Callback invoked when a best-effort send fails.
pub type ErrorHook = Arc<dyn Fn(&HttpPushClientError) + Send + Sync>;

/// Fire-and-forget event sender.
///
/// `send` returns immediately and never fails. Delivery errors go to the
/// error hook if one is installed, otherwise they are logged.
#[derive(Clone)]
pub struct BestEffortSender {
    client: HttpPushClient,
    on_error: Option<ErrorHook>,
}

impl BestEffortSender {
    pub fn new(client: HttpPushClient) -> Self {
        Self {
            client,
            on_error: None,
        }
    }

    pub fn with_error_hook(
        mut self,
        hook: impl Fn(&HttpPushClientError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Send `event` in the background.
    ///
    /// Must be called from within a tokio runtime. The returned handle can be
    /// awaited or dropped; dropping it does not cancel the send.
    pub fn send(&self, event: Value) -> JoinHandle<()> {
        let client = self.client.clone();
        let on_error = self.on_error.clone();

        tokio::spawn(async move {
            if let Err(err) = client.push(&event).await {
                match on_error {
                    Some(hook) => hook(&err),
                    None => warn!(err = ?err, "failed to send analytics event"),
                }
            }
        })
    }
}
