use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A deferred reminder for a URL.
///
/// Stored as camelCase JSON. Fields this crate does not know about are kept
/// in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnoozeRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub url: String,
    /// Epoch milliseconds at which the snooze wakes up
    pub notify_at: i64,
    /// Whether this snooze was counted on the badge
    #[serde(default)]
    pub badge_count: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Older lists were written with numeric ids.
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

impl SnoozeRecord {
    pub fn new(id: impl Into<String>, url: impl Into<String>, notify_at: i64) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            notify_at,
            badge_count: false,
            extra: Map::new(),
        }
    }

    pub fn with_badge(mut self, counted: bool) -> Self {
        self.badge_count = counted;
        self
    }

    /// Wake-up time as a UTC timestamp, if `notify_at` is in chrono's range
    pub fn notify_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.notify_at)
    }

    pub fn is_due(&self, now_ms: i64) -> bool {
        self.notify_at <= now_ms
    }

    /// Whether this snooze covers `url` (see [`urls_overlap`])
    pub fn covers(&self, url: &str) -> bool {
        urls_overlap(&self.url, url)
    }

    /// Format the time left until wake-up in human-friendly form
    /// Returns "due" once the wake-up time has passed, "{N}h left" style otherwise
    pub fn format_remaining(&self, now: DateTime<Utc>) -> String {
        let Some(until) = self.notify_at_utc() else {
            return "unknown".to_string();
        };
        if until <= now {
            return "due".to_string();
        }

        let duration = until - now;
        let hours = duration.num_hours();
        let days = duration.num_days();
        let weeks = days / 7;

        if weeks >= 1 {
            format!("{}w left", weeks)
        } else if days >= 1 {
            format!("{}d left", days)
        } else if hours >= 1 {
            format!("{}h left", hours)
        } else {
            let minutes = duration.num_minutes();
            if minutes >= 1 {
                format!("{}m left", minutes)
            } else {
                "<1m left".to_string()
            }
        }
    }
}

/// Sort ascending by wake-up time. Stable, so equal timestamps keep their order.
pub fn sort_by_notify_at(list: &mut [SnoozeRecord]) {
    list.sort_by_key(|record| record.notify_at);
}

/// Check whether two URLs are in a prefix relation.
///
/// The longer URL must start with the shorter one, and the match has to end
/// on a URL boundary: `https://a.com` covers `https://a.com/x` and
/// `https://a.com?q=1` but not `https://a.com123`.
///
/// This is stricter than a plain string prefix test. A bare prefix that
/// stops mid-segment does not count, so `https://a.com/doc` does not cover
/// `https://a.com/docs`.
pub fn urls_overlap(stored: &str, queried: &str) -> bool {
    let (shorter, longer) = if stored.len() > queried.len() {
        (queried, stored)
    } else {
        (stored, queried)
    };

    let Some(rest) = longer.strip_prefix(shorter) else {
        return false;
    };

    const BOUNDARY: [char; 3] = ['/', '?', '#'];
    rest.is_empty() || rest.starts_with(BOUNDARY) || shorter.ends_with(BOUNDARY)
}
