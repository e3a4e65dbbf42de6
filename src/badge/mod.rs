pub mod surface;

pub use surface::{BadgeSurface, TerminalBadge};

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::store::{self, KeyValueStore, StoreError};

/// Key of the counter in the synced store
pub const BADGE_COUNT_KEY: &str = "badgeCount";

/// Default badge background color
pub const DEFAULT_BADGE_COLOR: &str = "#3C5A99";

/// Pending-snooze counter shown on the extension badge.
///
/// The stored value has no floor and may drift below zero; the badge text
/// treats anything at or below zero as empty.
pub struct BadgeCounter {
    store: Arc<dyn KeyValueStore>,
    surface: Arc<dyn BadgeSurface>,
    color: String,
    // serializes read-modify-write on the counter
    lock: Mutex<()>,
}

impl BadgeCounter {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        surface: Arc<dyn BadgeSurface>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            store,
            surface,
            color: color.into(),
            lock: Mutex::new(()),
        }
    }

    /// Current value. An absent counter is created as 0.
    pub async fn read(&self) -> Result<i64, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    async fn read_unlocked(&self) -> Result<i64, StoreError> {
        match store::load::<i64>(self.store.as_ref(), BADGE_COUNT_KEY).await? {
            Some(count) => Ok(count),
            None => {
                store::save(self.store.as_ref(), BADGE_COUNT_KEY, &0i64).await?;
                Ok(0)
            }
        }
    }

    /// Add `delta` (negative to decrement) and return the new value
    pub async fn increment(&self, delta: i64) -> Result<i64, StoreError> {
        let _guard = self.lock.lock().await;
        let count = self.read_unlocked().await? + delta;
        store::save(self.store.as_ref(), BADGE_COUNT_KEY, &count).await?;
        debug!(delta, count, "badge counter updated");
        Ok(count)
    }

    /// Overwrite the counter, used when reconciling against the snooze list
    pub async fn set(&self, count: i64) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        store::save(self.store.as_ref(), BADGE_COUNT_KEY, &count).await
    }

    /// Mirror the stored counter onto the badge surface
    pub async fn refresh_indicator(&self) -> Result<(), StoreError> {
        let count = self.read().await?;
        self.surface.set_background_color(&self.color).await;
        self.surface.set_text(&render_text(count)).await;
        Ok(())
    }
}

/// Badge text for a counter value: empty at or below zero
pub fn render_text(count: i64) -> String {
    if count <= 0 {
        String::new()
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn counter() -> (Arc<MemoryStore>, Arc<TerminalBadge>, BadgeCounter) {
        let store = Arc::new(MemoryStore::new());
        let surface = Arc::new(TerminalBadge::quiet());
        let counter = BadgeCounter::new(store.clone(), surface.clone(), "#112233");
        (store, surface, counter)
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(0), "");
        assert_eq!(render_text(-2), "");
        assert_eq!(render_text(1), "1");
        assert_eq!(render_text(42), "42");
    }

    #[tokio::test]
    async fn test_read_creates_zero() {
        let (store, _, counter) = counter();
        assert_eq!(counter.read().await.unwrap(), 0);

        let stored = store.get(&[BADGE_COUNT_KEY]).await.unwrap();
        assert_eq!(stored[BADGE_COUNT_KEY], json!(0));
    }

    #[tokio::test]
    async fn test_increment_then_decrement() {
        let (_, _, counter) = counter();
        assert_eq!(counter.increment(1).await.unwrap(), 1);
        assert_eq!(counter.increment(-1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_counter_can_go_negative() {
        let (_, _, counter) = counter();
        assert_eq!(counter.increment(-1).await.unwrap(), -1);
        assert_eq!(counter.read().await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let (_, _, counter) = counter();
        let counter = Arc::new(counter);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let counter = counter.clone();
                tokio::spawn(async move { counter.increment(1).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(counter.read().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_refresh_indicator_clamps_at_zero() {
        let (_, surface, counter) = counter();
        counter.set(-3).await.unwrap();

        counter.refresh_indicator().await.unwrap();
        let state = surface.state();
        assert_eq!(state.text, "");
        assert_eq!(state.color, "#112233");
    }

    #[tokio::test]
    async fn test_refresh_indicator_shows_count() {
        let (_, surface, counter) = counter();
        counter.increment(5).await.unwrap();

        counter.refresh_indicator().await.unwrap();
        assert_eq!(surface.state().text, "5");
    }
}
