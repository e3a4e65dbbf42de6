use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Message, Messenger, MessagingError};
use crate::badge::BadgeCounter;
use crate::browser::{current_tab_url, TabQuery, UrlFilter};

struct Envelope {
    message: Message,
    reply: oneshot::Sender<Result<Value, MessagingError>>,
}

/// Sending side of the background worker. Cheap to clone.
#[derive(Clone)]
pub struct BackgroundHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

#[async_trait]
impl Messenger for BackgroundHandle {
    async fn send(&self, message: Message) -> Result<Value, MessagingError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { message, reply })
            .map_err(|_| MessagingError::Closed)?;
        rx.await.map_err(|_| MessagingError::Closed)?
    }
}

/// Start the background worker.
///
/// The worker runs until every `BackgroundHandle` is dropped. Each message
/// is handled to completion before the next one is received.
pub fn spawn_background(
    counter: Arc<BadgeCounter>,
    tabs: Arc<dyn TabQuery>,
    filter: UrlFilter,
) -> (BackgroundHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

    let worker = tokio::spawn(async move {
        while let Some(Envelope { message, reply }) = rx.recv().await {
            debug!(action = message.action(), "background message");
            let result = handle(&message, &counter, tabs.as_ref(), &filter).await;
            if let Err(e) = &result {
                warn!(action = message.action(), error = %e, "background handler failed");
            }
            // Caller may have stopped waiting
            let _ = reply.send(result);
        }
        debug!("background worker stopped");
    });

    (BackgroundHandle { tx }, worker)
}

async fn handle(
    message: &Message,
    counter: &BadgeCounter,
    tabs: &dyn TabQuery,
    filter: &UrlFilter,
) -> Result<Value, MessagingError> {
    match message {
        Message::UpdateBadge(_) => {
            counter.refresh_indicator().await?;
            Ok(Value::Null)
        }
        Message::GetCurrentTabUrl => {
            let url = current_tab_url(tabs, filter).await?;
            Ok(url.map(Value::String).unwrap_or(Value::Null))
        }
    }
}
