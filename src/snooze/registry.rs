use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use super::types::{sort_by_notify_at, SnoozeRecord};
use crate::badge::{BadgeCounter, BADGE_COUNT_KEY};
use crate::messaging::{Message, Messenger, MessagingError};
use crate::store::{self, KeyValueStore, StoreError};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error("'{0}' is reserved for the badge counter and cannot be a user id")]
    ReservedUser(String),
}

/// User lists share the sync store with the badge counter
fn check_user(user: &str) -> Result<(), RegistryError> {
    if user == BADGE_COUNT_KEY {
        return Err(RegistryError::ReservedUser(user.to_string()));
    }
    Ok(())
}

/// Per-user snooze lists kept in the synced store.
///
/// Each user's list lives under the user id as a single JSON array. Nothing
/// is cached: every call reads the store fresh. Read-modify-write calls for
/// the same user are serialized within one registry.
pub struct SnoozeRegistry {
    store: Arc<dyn KeyValueStore>,
    counter: Arc<BadgeCounter>,
    messenger: Arc<dyn Messenger>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SnoozeRegistry {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        counter: Arc<BadgeCounter>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            store,
            counter,
            messenger,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn counter(&self) -> &Arc<BadgeCounter> {
        &self.counter
    }

    async fn lock_user(&self, user: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(user.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    async fn read_raw(&self, user: &str) -> Result<Vec<SnoozeRecord>, RegistryError> {
        check_user(user)?;
        Ok(store::load(self.store.as_ref(), user)
            .await?
            .unwrap_or_default())
    }

    /// The user's list sorted by wake-up time; empty if nothing is stored
    pub async fn get_list(&self, user: &str) -> Result<Vec<SnoozeRecord>, RegistryError> {
        let mut list = self.read_raw(user).await?;
        sort_by_notify_at(&mut list);
        Ok(list)
    }

    /// Overwrite the stored list as given, without sorting
    pub async fn set_list(&self, user: &str, list: &[SnoozeRecord]) -> Result<(), RegistryError> {
        check_user(user)?;
        store::save(self.store.as_ref(), user, list).await?;
        Ok(())
    }

    /// Insert a snooze and return the persisted list.
    ///
    /// A record whose id is already present replaces the stored one.
    pub async fn add(
        &self,
        user: &str,
        record: SnoozeRecord,
    ) -> Result<Vec<SnoozeRecord>, RegistryError> {
        let _guard = self.lock_user(user).await;
        let (list, _) = self.insert(user, record).await?;
        Ok(list)
    }

    /// Like [`add`](Self::add), but also moves the badge counter by the
    /// change in `badgeCount` and tells the background process.
    ///
    /// A new counted snooze adds one. Replacing a snooze adds or takes away
    /// one when the flag flips, and nothing when it stays the same.
    pub async fn snooze(
        &self,
        user: &str,
        record: SnoozeRecord,
    ) -> Result<Vec<SnoozeRecord>, RegistryError> {
        let _guard = self.lock_user(user).await;
        let counted = i64::from(record.badge_count);
        let (list, previous) = self.insert(user, record).await?;

        let delta = counted - previous.map_or(0, |r| i64::from(r.badge_count));
        if delta != 0 {
            let count = self.counter.increment(delta).await?;
            self.messenger.send(Message::UpdateBadge(count)).await?;
        }
        Ok(list)
    }

    /// Insert or replace by id and persist. Caller holds the user lock.
    async fn insert(
        &self,
        user: &str,
        record: SnoozeRecord,
    ) -> Result<(Vec<SnoozeRecord>, Option<SnoozeRecord>), RegistryError> {
        let mut list = self.read_raw(user).await?;

        let previous = match list.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                debug!(user, id = %record.id, "replacing snooze with same id");
                Some(std::mem::replace(existing, record))
            }
            None => {
                info!(user, id = %record.id, url = %record.url, "snooze added");
                list.push(record);
                None
            }
        };

        sort_by_notify_at(&mut list);
        store::save(self.store.as_ref(), user, &list).await?;
        Ok((list, previous))
    }

    /// Drop the snooze with `id` and return the list as stored afterwards.
    ///
    /// When the removed snooze was counted on the badge, the counter goes
    /// down and the background process is told the new value.
    pub async fn remove(&self, user: &str, id: &str) -> Result<Vec<SnoozeRecord>, RegistryError> {
        {
            let _guard = self.lock_user(user).await;
            let list = self.read_raw(user).await?;
            let (removed, mut kept): (Vec<_>, Vec<_>) =
                list.into_iter().partition(|r| r.id == id);

            sort_by_notify_at(&mut kept);
            store::save(self.store.as_ref(), user, &kept).await?;

            let counted = removed.iter().filter(|r| r.badge_count).count() as i64;
            if removed.is_empty() {
                debug!(user, id, "remove: no such snooze");
            } else {
                info!(user, id, "snooze removed");
            }
            if counted > 0 {
                let count = self.counter.increment(-counted).await?;
                self.messenger.send(Message::UpdateBadge(count)).await?;
            }
        }
        self.get_list(user).await
    }

    /// Replace the stored snooze with the same id and return the list as
    /// stored afterwards. Unknown ids leave the list as it was.
    pub async fn update(
        &self,
        user: &str,
        record: SnoozeRecord,
    ) -> Result<Vec<SnoozeRecord>, RegistryError> {
        {
            let _guard = self.lock_user(user).await;
            let mut list = self.read_raw(user).await?;

            match list.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => debug!(user, id = %record.id, "update: no such snooze"),
            }

            sort_by_notify_at(&mut list);
            store::save(self.store.as_ref(), user, &list).await?;
        }
        self.get_list(user).await
    }

    /// Whether `url`, or a page above or below it, is already snoozed
    pub async fn is_url_snoozed(&self, user: &str, url: &str) -> Result<bool, RegistryError> {
        let list = self.read_raw(user).await?;
        Ok(list.iter().any(|r| r.covers(url)))
    }

    /// Snoozes whose wake-up time is at or before `now_ms`
    pub async fn due(&self, user: &str, now_ms: i64) -> Result<Vec<SnoozeRecord>, RegistryError> {
        let list = self.get_list(user).await?;
        Ok(list.into_iter().filter(|r| r.is_due(now_ms)).collect())
    }

    /// Reset the badge counter to the number of counted snoozes in the
    /// user's list and tell the background process.
    pub async fn reconcile_badge(&self, user: &str) -> Result<i64, RegistryError> {
        let _guard = self.lock_user(user).await;
        let list = self.read_raw(user).await?;
        let count = list.iter().filter(|r| r.badge_count).count() as i64;

        let before = self.counter.read().await?;
        if before != count {
            info!(user, before, after = count, "badge counter reconciled");
        }
        self.counter.set(count).await?;
        self.messenger.send(Message::UpdateBadge(count)).await?;
        Ok(count)
    }
}
