use std::sync::Arc;

use crate::auth::Session;
use crate::backend::{Backend, BackendError};
use crate::models::Message;
use crate::realtime::{ChangeEvent, ChangeFilter, ChangeKind, ChannelSpec, Subscription, Table};
use crate::toast::{Notifier, Toast};
use uuid::Uuid;

/// How a pushed message change affects the viewer's unread count
#[derive(Debug, Clone, PartialEq)]
pub enum UnreadTransition {
    NewUnread(Message),
    Read(Message),
}

/// Client mirror of the server-side unread count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnreadCounter {
    count: u64,
}

impl UnreadCounter {
    pub fn new(count: u64) -> Self {
        Self { count }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn reset(&mut self, count: u64) {
        self.count = count;
    }

    /// Classify a change for `viewer` without touching the count.
    ///
    /// Updates only count when the old row carries `is_read`; without it the
    /// direction of the change is unknown.
    pub fn classify(event: &ChangeEvent, viewer: Uuid) -> Option<UnreadTransition> {
        if event.table != Table::Messages {
            return None;
        }

        let message = match event.new_as::<Message>()? {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Skipping undecodable message change: {}", e);
                return None;
            }
        };

        if message.recipient_id != viewer {
            return None;
        }

        match event.kind {
            ChangeKind::Insert if !message.is_read => Some(UnreadTransition::NewUnread(message)),
            ChangeKind::Update => {
                let was_read = event.old.as_ref().and_then(|old| old.get("is_read")).and_then(|v| v.as_bool());
                match (was_read, message.is_read) {
                    (Some(true), false) => Some(UnreadTransition::NewUnread(message)),
                    (Some(false), true) => Some(UnreadTransition::Read(message)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn apply(&mut self, event: &ChangeEvent, viewer: Uuid) -> Option<UnreadTransition> {
        let transition = Self::classify(event, viewer)?;
        match &transition {
            UnreadTransition::NewUnread(_) => self.count += 1,
            UnreadTransition::Read(_) => self.count = self.count.saturating_sub(1),
        }
        Some(transition)
    }
}

type MessageCallback = Box<dyn FnMut(&Message) + Send>;

/// Keeps the viewer's unread count in step with the messages change feed
pub struct UnreadMessagesService {
    backend: Arc<dyn Backend>,
    session: Session,
    notifier: Arc<dyn Notifier>,
    counter: UnreadCounter,
    on_new_unread: MessageCallback,
    on_read: MessageCallback,
    subscription: Option<Subscription>,
}

impl UnreadMessagesService {
    pub fn new(backend: Arc<dyn Backend>, session: Session, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            session,
            notifier,
            counter: UnreadCounter::default(),
            on_new_unread: Box::new(|_| {}),
            on_read: Box::new(|_| {}),
            subscription: None,
        }
    }

    pub fn on_new_unread(mut self, callback: impl FnMut(&Message) + Send + 'static) -> Self {
        self.on_new_unread = Box::new(callback);
        self
    }

    pub fn on_read(mut self, callback: impl FnMut(&Message) + Send + 'static) -> Self {
        self.on_read = Box::new(callback);
        self
    }

    pub fn unread_count(&self) -> u64 {
        self.counter.count()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    fn channel_spec(&self) -> ChannelSpec {
        ChannelSpec::new(format!("unread-messages-{}", self.session.user_id))
            .on(ChangeFilter::on(Table::Messages, ChangeKind::Insert).and_kind(ChangeKind::Update))
    }

    /// Full recount; the counter is left as is when the count fails
    pub async fn resync(&mut self) -> Result<u64, BackendError> {
        match self.backend.count_unread_messages(self.session.user_id).await {
            Ok(count) => {
                self.counter.reset(count);
                tracing::debug!("Unread messages for {}: {}", self.session.user_id, count);
                Ok(count)
            }
            Err(e) => {
                tracing::error!("Failed to count unread messages: {}", e);
                self.notifier.notify(Toast::error("Messages", "Could not load unread messages"));
                Err(e)
            }
        }
    }

    /// Recount, then subscribe to message inserts and updates.
    ///
    /// A message inserted between the recount and the subscription is in
    /// neither and stays uncounted until the next [`restart`](Self::restart).
    /// Subscribing first would instead count a message twice when its insert
    /// lands in both, so the recount goes first.
    pub async fn start(&mut self) -> Result<(), BackendError> {
        self.stop();
        // A failed recount is already reported; keep going with the live feed
        let _ = self.resync().await;

        match self.backend.subscribe(self.channel_spec()).await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to subscribe to messages: {}", e);
                self.notifier.notify(Toast::error("Messages", "Live message updates are unavailable"));
                Err(e)
            }
        }
    }

    /// Resubscribe after the feed dropped or the viewer changed
    pub async fn restart(&mut self) -> Result<(), BackendError> {
        self.start().await
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    pub fn handle_event(&mut self, event: &ChangeEvent) -> Option<UnreadTransition> {
        let transition = self.counter.apply(event, self.session.user_id)?;
        match &transition {
            UnreadTransition::NewUnread(message) => (self.on_new_unread)(message),
            UnreadTransition::Read(message) => (self.on_read)(message),
        }
        Some(transition)
    }

    /// Next message event, `None` once the feed has ended. Cancel safe.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        let event = self.subscription.as_mut()?.next_event().await;
        if event.is_none() {
            tracing::warn!("Message feed ended for {}", self.session.user_id);
            self.subscription = None;
        }
        event
    }

    /// Wait for and process one event. Returns `false` once the feed has ended.
    pub async fn process_next(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(&event);
                true
            }
            None => false,
        }
    }

    pub async fn run(&mut self) {
        while self.process_next().await {}
    }
}

impl Drop for UnreadMessagesService {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_row(recipient: Uuid, is_read: bool) -> serde_json::Value {
        let mut message = Message::new(Uuid::new_v4(), recipient, "hi");
        message.is_read = is_read;
        serde_json::to_value(message).unwrap()
    }

    #[test]
    fn insert_of_unread_message_for_viewer_increments() {
        let viewer = Uuid::new_v4();
        let mut counter = UnreadCounter::new(2);
        let event = ChangeEvent::insert(Table::Messages, message_row(viewer, false));
        assert!(matches!(counter.apply(&event, viewer), Some(UnreadTransition::NewUnread(_))));
        assert_eq!(counter.count(), 3);
    }

    #[test]
    fn messages_for_others_or_already_read_are_ignored() {
        let viewer = Uuid::new_v4();
        let mut counter = UnreadCounter::new(0);
        let other = ChangeEvent::insert(Table::Messages, message_row(Uuid::new_v4(), false));
        let read = ChangeEvent::insert(Table::Messages, message_row(viewer, true));
        assert!(counter.apply(&other, viewer).is_none());
        assert!(counter.apply(&read, viewer).is_none());
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn read_transitions_move_the_count_both_ways() {
        let viewer = Uuid::new_v4();
        let mut counter = UnreadCounter::new(1);
        let unread = message_row(viewer, false);
        let mut read = unread.clone();
        read["is_read"] = json!(true);

        let marked_read = ChangeEvent::update(Table::Messages, unread.clone(), read.clone());
        assert!(matches!(counter.apply(&marked_read, viewer), Some(UnreadTransition::Read(_))));
        assert_eq!(counter.count(), 0);

        let marked_unread = ChangeEvent::update(Table::Messages, read, unread);
        assert!(matches!(counter.apply(&marked_unread, viewer), Some(UnreadTransition::NewUnread(_))));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn update_without_old_read_flag_is_ignored() {
        let viewer = Uuid::new_v4();
        let mut counter = UnreadCounter::new(1);
        let event = ChangeEvent::update(Table::Messages, json!({"id": "x"}), message_row(viewer, true));
        assert!(counter.apply(&event, viewer).is_none());
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn count_never_goes_negative() {
        let viewer = Uuid::new_v4();
        let mut counter = UnreadCounter::new(0);
        let unread = message_row(viewer, false);
        let mut read = unread.clone();
        read["is_read"] = json!(true);
        counter.apply(&ChangeEvent::update(Table::Messages, unread, read), viewer);
        assert_eq!(counter.count(), 0);
    }
}
