//! Notifications and direct messages.
//!
//! Both live in the partition of the instance they were created in, so an
//! instance switch never shows another instance's inbox. `read` flags only
//! go from false to true.

use super::errors::{Outcome, StoreError, StoreResult};
use super::events::Change;
use super::social_store::SocialStore;
use crate::model::{
    InstanceId, Message, MessageId, NewNotification, Notification, NotificationId, UserId,
};

impl SocialStore {
    /// Add a notification to the active instance
    pub fn add_notification(&mut self, input: NewNotification) -> StoreResult<NotificationId> {
        let instance = self.active_instance_id();
        self.add_notification_in(&instance, input)
    }

    pub fn add_notification_in(
        &mut self,
        instance: &InstanceId,
        input: NewNotification,
    ) -> StoreResult<NotificationId> {
        self.run("add_notification", |store| {
            if input.content.trim().is_empty() {
                return Err(StoreError::Validation("notification content must not be empty".to_string()));
            }
            let partition = store.partition(instance)?;
            if let Some(thread) = input.thread_id {
                partition.thread(thread).ok_or(StoreError::ThreadNotFound(thread))?;
            }
            if let Some(sender) = input.sender_id {
                if !partition.contains_user(sender) {
                    return Err(StoreError::UserNotFound(sender));
                }
            }

            let id = store.allocator.next();
            let notification = Notification::from_input(id, input, store.clock.now());
            store.partition_mut(instance)?.notifications.insert(0, notification);
            store.commit(instance.clone(), Change::NotificationAdded { notification_id: id });
            Ok(id)
        })
    }

    /// Mark a notification of the active instance as read
    pub fn mark_notification_as_read(&mut self, id: NotificationId) -> StoreResult<Outcome> {
        let instance = self.active_instance_id();
        self.mark_notification_as_read_in(&instance, id)
    }

    pub fn mark_notification_as_read_in(
        &mut self,
        instance: &InstanceId,
        id: NotificationId,
    ) -> StoreResult<Outcome> {
        self.run("mark_notification_as_read", |store| {
            let notification = store
                .partition_mut(instance)?
                .notification_mut(id)
                .ok_or(StoreError::NotificationNotFound(id))?;
            if !notification.mark_read() {
                return Ok(Outcome::Unchanged);
            }
            store.commit(instance.clone(), Change::NotificationRead { notification_id: id });
            Ok(Outcome::Applied)
        })
    }

    /// Send a direct message from the signed-in user
    pub fn send_message(&mut self, receiver: UserId, content: &str) -> StoreResult<MessageId> {
        self.run("send_message", |store| {
            let me = store.require_user()?;
            if content.trim().is_empty() {
                return Err(StoreError::Validation("message must not be empty".to_string()));
            }
            if receiver == me {
                return Err(StoreError::Validation("cannot message yourself".to_string()));
            }
            if !store.active_partition().contains_user(receiver) {
                return Err(StoreError::UserNotFound(receiver));
            }

            let id = store.allocator.next();
            let message = Message::new(id, me, receiver, content.to_string(), store.clock.now());
            let instance = store.active_instance_id();
            store.active_partition_mut().messages.push(message);
            store.commit(instance, Change::MessageSent { message_id: id });
            Ok(id)
        })
    }

    /// Mark every unread message from `sender` to the signed-in user as read;
    /// returns how many changed
    pub fn mark_messages_as_read(&mut self, sender: UserId) -> StoreResult<usize> {
        self.run("mark_messages_as_read", |store| {
            let me = store.require_user()?;
            let count = store
                .active_partition_mut()
                .messages
                .iter_mut()
                .filter(|m| m.sender_id == sender && m.receiver_id == me)
                .map(|m| m.mark_read())
                .filter(|changed| *changed)
                .count();
            if count > 0 {
                let instance = store.active_instance_id();
                store.commit(instance, Change::MessagesRead { sender_id: sender, count });
            }
            Ok(count)
        })
    }
}
