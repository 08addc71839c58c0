use std::sync::Arc;

use serde::Serialize;

use super::domain::{Notification, NotificationId, ProfileId};
use super::error::PortalError;
use super::repository::{NotificationPublisher, NotificationRepository, RepositoryError};

/// Publish without letting a delivery failure reach the caller.
pub(crate) fn deliver<N>(publisher: &N, notification: Notification)
where
    N: NotificationPublisher + ?Sized,
{
    let recipient = notification.profile_id.clone();
    if let Err(err) = publisher.publish(notification) {
        tracing::warn!(profile = %recipient, "notification not delivered: {err}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationFeed {
    pub unread: usize,
    pub notifications: Vec<Notification>,
}

pub struct NotificationCenter<S> {
    store: Arc<S>,
}

impl<S> NotificationCenter<S>
where
    S: NotificationRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Newest first, with the count of unread entries.
    pub fn feed(&self, profile_id: &ProfileId) -> Result<NotificationFeed, PortalError> {
        let notifications = self.store.notifications_for(profile_id)?;
        let unread = notifications.iter().filter(|item| !item.read).count();
        Ok(NotificationFeed {
            unread,
            notifications,
        })
    }

    pub fn mark_read(&self, id: &NotificationId, profile_id: &ProfileId) -> Result<(), PortalError> {
        match self.store.mark_read(id, profile_id) {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(PortalError::not_found("notification", id)),
            Err(err) => Err(err.into()),
        }
    }
}
