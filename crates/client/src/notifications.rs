//! Notification feed.
//!
//! Notifications are polled, not pushed. The feed keeps a local copy with
//! optimistic read/unread state: mutations flip local state first, confirm
//! with the server, and roll back when the server call fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use greenbasket_core::{CustomerId, NotificationId};

use crate::api::types::Notification;
use crate::api::{ApiClient, ApiError};

#[derive(Debug, Default, Clone)]
struct FeedState {
    items: Vec<Notification>,
    unread: u32,
}

/// Local view of one customer's notifications.
///
/// Cheaply cloneable via `Arc`; every clone shares the same feed.
#[derive(Clone)]
pub struct NotificationFeed {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    client: ApiClient,
    customer_id: CustomerId,
    state: RwLock<FeedState>,
}

impl NotificationFeed {
    /// Create an empty feed for a customer. Call [`Self::refresh`] (or spawn
    /// a poller) to populate it.
    #[must_use]
    pub fn new(client: ApiClient, customer_id: CustomerId) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                client,
                customer_id,
                state: RwLock::new(FeedState::default()),
            }),
        }
    }

    /// Fetch the current notifications and unread count from the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let page = self
            .inner
            .client
            .customer_notifications(self.inner.customer_id)
            .await?;
        self.apply_page(page);
        Ok(())
    }

    fn apply_page(&self, page: crate::api::types::NotificationPage) {
        if !page.success {
            tracing::warn!("notification fetch reported failure, keeping local state");
            return;
        }
        let mut state = self.write_state();
        state.items = page.data;
        state.unread = page.total;
    }

    /// Snapshot of the current notifications.
    #[must_use]
    pub fn items(&self) -> Vec<Notification> {
        self.read_state().items.clone()
    }

    /// Current unread count.
    #[must_use]
    pub fn unread_count(&self) -> u32 {
        self.read_state().unread
    }

    /// Mark one notification read, optimistically.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the call; local state is rolled
    /// back first.
    pub async fn mark_read(&self, id: NotificationId) -> Result<(), ApiError> {
        let rollback = self.read_state().clone();
        {
            let mut state = self.write_state();
            if let Some(item) = state.items.iter_mut().find(|n| n.id == id)
                && !item.is_read
            {
                item.is_read = true;
                state.unread = state.unread.saturating_sub(1);
            }
        }

        match self.inner.client.mark_notification_read(id).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.restore(rollback);
                Err(e)
            }
        }
    }

    /// Mark every notification read, optimistically.
    ///
    /// Sets each item's read flag and zeroes the unread counter, then
    /// confirms with the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the call; local state is rolled
    /// back first.
    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        let rollback = self.read_state().clone();
        {
            let mut state = self.write_state();
            for item in &mut state.items {
                item.is_read = true;
            }
            state.unread = 0;
        }

        match self
            .inner
            .client
            .mark_all_notifications_read(self.inner.customer_id)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                self.restore(rollback);
                Err(e)
            }
        }
    }

    /// Delete one notification, optimistically.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the call; local state is rolled
    /// back first.
    pub async fn delete(&self, id: NotificationId) -> Result<(), ApiError> {
        let rollback = self.read_state().clone();
        {
            let mut state = self.write_state();
            if let Some(index) = state.items.iter().position(|n| n.id == id) {
                let removed = state.items.remove(index);
                if !removed.is_read {
                    state.unread = state.unread.saturating_sub(1);
                }
            }
        }

        match self.inner.client.delete_notification(id).await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.restore(rollback);
                Err(e)
            }
        }
    }

    /// Delete every notification, optimistically.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the call; local state is rolled
    /// back first.
    pub async fn clear(&self) -> Result<(), ApiError> {
        let rollback = self.read_state().clone();
        {
            let mut state = self.write_state();
            state.items.clear();
            state.unread = 0;
        }

        match self
            .inner
            .client
            .clear_notifications(self.inner.customer_id)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                self.restore(rollback);
                Err(e)
            }
        }
    }

    /// Spawn a background poller refreshing the feed every `interval`.
    ///
    /// Cancellation is advisory: dropping (or cancelling) the returned guard
    /// sets a flag that is checked after each in-flight fetch resolves, so a
    /// response landing after cancellation never mutates the feed. The
    /// request itself is not aborted.
    #[must_use]
    pub fn spawn_poller(&self, interval: Duration) -> PollerGuard {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let feed = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                let result = feed
                    .inner
                    .client
                    .customer_notifications(feed.inner.customer_id)
                    .await;
                // The fetch is not aborted on cancellation; its result is
                // simply not applied once the guard is gone
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                match result {
                    Ok(page) => feed.apply_page(page),
                    Err(e) => tracing::warn!(error = %e, "notification poll failed"),
                }
            }
            tracing::debug!("notification poller stopped");
        });

        PollerGuard { cancelled }
    }

    fn restore(&self, state: FeedState) {
        *self.write_state() = state;
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, FeedState> {
        self.inner.state.read().expect("feed lock poisoned")
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, FeedState> {
        self.inner.state.write().expect("feed lock poisoned")
    }
}

/// Handle for a running notification poller.
///
/// Dropping the guard cancels the poller (advisorily - see
/// [`NotificationFeed::spawn_poller`]).
pub struct PollerGuard {
    cancelled: Arc<AtomicBool>,
}

impl PollerGuard {
    /// Stop the poller at its next wakeup or fetch completion.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}
