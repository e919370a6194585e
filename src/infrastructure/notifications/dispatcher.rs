use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::application::notify::{NotificationRequest, NotificationSender};

/// A delivery channel (push, SMS, email). Providers are tried in order and
/// failures are logged, never retried here.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    async fn send(&self, request: &NotificationRequest) -> Result<()>;
    fn provider_name(&self) -> &'static str;
}

/// Queue-backed fan-out implementing the fire-and-forget contract: `dispatch`
/// enqueues without blocking and a background task drains to the providers.
pub struct QueuedDispatcher {
    tx: mpsc::Sender<NotificationRequest>,
}

impl QueuedDispatcher {
    pub fn new(providers: Vec<Arc<dyn NotificationProvider>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<NotificationRequest>(256);

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                for provider in &providers {
                    if let Err(error) = provider.send(&request).await {
                        warn!(
                            provider = provider.provider_name(),
                            template_key = request.template_key,
                            error = %error,
                            "notification provider failed"
                        );
                    }
                }
            }
        });

        Self { tx }
    }
}

impl NotificationSender for QueuedDispatcher {
    fn dispatch(&self, request: NotificationRequest) {
        match self.tx.try_send(request) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("notification queue full; dropping request");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("notification queue closed; dropping request");
            }
        }
    }
}

/// Stand-in provider that writes the notification to the logs. Useful in
/// development and as the default until a real channel is configured.
pub struct LogProvider;

#[async_trait]
impl NotificationProvider for LogProvider {
    async fn send(&self, request: &NotificationRequest) -> Result<()> {
        info!(
            recipient = %request.recipient,
            template_key = request.template_key,
            variables = ?request.variables,
            "notification"
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}
