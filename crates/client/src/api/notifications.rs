//! Notification endpoints.
//!
//! Raw wrappers over the notification API; local read/unread bookkeeping
//! lives in [`crate::notifications::NotificationFeed`].

use tracing::instrument;

use greenbasket_core::{CustomerId, NotificationId};

use super::{ApiClient, ApiError};
use super::types::{Ack, NotificationPage};

impl ApiClient {
    /// Fetch a customer's notifications with the server's unread count.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn customer_notifications(
        &self,
        customer_id: CustomerId,
    ) -> Result<NotificationPage, ApiError> {
        self.get(&format!("customer-notifications/{customer_id}/"))
            .await
    }

    /// Mark every notification read for a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn mark_all_notifications_read(
        &self,
        customer_id: CustomerId,
    ) -> Result<Ack, ApiError> {
        self.put(&format!("readnotifications/all/{customer_id}/"))
            .await
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<Ack, ApiError> {
        self.put(&format!("readnotifications/{id}/")).await
    }

    /// Delete one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn delete_notification(&self, id: NotificationId) -> Result<Ack, ApiError> {
        self.delete(&format!("notification/{id}/")).await
    }

    /// Delete every notification for a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn clear_notifications(&self, customer_id: CustomerId) -> Result<Ack, ApiError> {
        self.delete(&format!("notifications/clear/{customer_id}/"))
            .await
    }
}
