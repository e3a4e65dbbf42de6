use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use tracing::debug;

use crate::snooze::SnoozeRecord;

/// Priority used for wake-up notifications (host range is -2..=2)
pub const WAKE_PRIORITY: i8 = 2;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to display notification: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Basic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub title: String,
}

/// Everything needed to show one notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub icon: String,
    pub title: String,
    pub message: String,
    pub priority: i8,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a notification and return the id the host assigned to it
    async fn create(&self, id: &str, options: NotificationOptions) -> Result<String, NotifyError>;
}

/// Notification shown when a snooze wakes up
pub fn wake_notification(record: &SnoozeRecord, icon: &str) -> NotificationOptions {
    let title = record
        .extra
        .get("title")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or("Snoozed page is back");

    NotificationOptions {
        kind: NotificationKind::Basic,
        icon: icon.to_string(),
        title: title.to_string(),
        message: record.url.clone(),
        priority: WAKE_PRIORITY,
        actions: vec![
            NotificationAction {
                title: "Open".to_string(),
            },
            NotificationAction {
                title: "Snooze again".to_string(),
            },
        ],
    }
}

/// Show a wake-up notification for every record, returning the notification ids
pub async fn announce(
    notifier: &dyn Notifier,
    records: &[SnoozeRecord],
    icon: &str,
) -> Result<Vec<String>, NotifyError> {
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        let id = notifier
            .create(&record.id, wake_notification(record, icon))
            .await?;
        debug!(id = %id, url = %record.url, "wake notification shown");
        ids.push(id);
    }
    Ok(ids)
}

/// Writes notifications to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier {
    pub use_colors: bool,
}

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn create(&self, id: &str, options: NotificationOptions) -> Result<String, NotifyError> {
        let text = crate::output::format_notification(&options, self.use_colors);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        shown: Mutex<Vec<(String, NotificationOptions)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn create(
            &self,
            id: &str,
            options: NotificationOptions,
        ) -> Result<String, NotifyError> {
            self.shown.lock().unwrap().push((id.to_string(), options));
            Ok(format!("n-{}", id))
        }
    }

    #[test]
    fn test_wake_notification_defaults() {
        let record = SnoozeRecord::new("1", "https://a.com/post", 0);
        let options = wake_notification(&record, "icon.png");

        assert_eq!(options.kind, NotificationKind::Basic);
        assert_eq!(options.title, "Snoozed page is back");
        assert_eq!(options.message, "https://a.com/post");
        assert_eq!(options.priority, WAKE_PRIORITY);
        assert_eq!(options.actions.len(), 2);
    }

    #[test]
    fn test_wake_notification_uses_stored_title() {
        let mut record = SnoozeRecord::new("1", "https://a.com/post", 0);
        record.extra.insert("title".to_string(), json!("Long read"));

        assert_eq!(wake_notification(&record, "i").title, "Long read");
    }

    #[test]
    fn test_options_wire_format() {
        let record = SnoozeRecord::new("1", "https://a.com", 0);
        let value = serde_json::to_value(wake_notification(&record, "i.png")).unwrap();
        assert_eq!(value["type"], json!("basic"));
        assert_eq!(value["actions"][0]["title"], json!("Open"));
    }

    #[tokio::test]
    async fn test_announce_each_record() {
        let notifier = RecordingNotifier::default();
        let records = vec![
            SnoozeRecord::new("1", "https://a.com", 0),
            SnoozeRecord::new("2", "https://b.com", 0),
        ];

        let ids = announce(&notifier, &records, "i.png").await.unwrap();
        assert_eq!(ids, vec!["n-1", "n-2"]);

        let shown = notifier.shown.lock().unwrap();
        assert_eq!(shown[1].1.message, "https://b.com");
    }
}
