use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::{Backend, BackendError};
use crate::models::{Job, Message, Profile, SupportTicket, TicketStatus};
use crate::realtime::{ChangeEvent, ChannelSpec, Subscription, Table};

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    jobs: Vec<Job>,
    messages: Vec<Message>,
    tickets: Vec<SupportTicket>,
}

/// In-process backend with a broadcast change feed.
///
/// Every mutation publishes the same insert/update events the Postgres
/// triggers would. Reads and writes can be made to fail on demand.
pub struct MemoryBackend {
    tables: RwLock<Tables>,
    feed: Mutex<Option<broadcast::Sender<ChangeEvent>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    buffer_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(FEED_CAPACITY);
        Self {
            tables: RwLock::new(Tables::default()),
            feed: Mutex::new(Some(sender)),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            buffer_size: crate::config::config().realtime.buffer_size,
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Drop the change feed; live subscriptions end
    pub fn disconnect(&self) {
        if let Ok(mut feed) = self.feed.lock() {
            feed.take();
        }
    }

    /// Bring the change feed back after [`MemoryBackend::disconnect`]
    pub fn reconnect(&self) {
        if let Ok(mut feed) = self.feed.lock() {
            if feed.is_none() {
                let (sender, _receiver) = broadcast::channel(FEED_CAPACITY);
                *feed = Some(sender);
            }
        }
    }

    fn publish(&self, event: ChangeEvent) {
        if let Ok(feed) = self.feed.lock() {
            if let Some(sender) = feed.as_ref() {
                let _ = sender.send(event);
            }
        }
    }

    fn check_read(&self) -> Result<(), BackendError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("read failed".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), BackendError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("write failed".to_string()));
        }
        Ok(())
    }

    pub async fn insert_profile(&self, profile: Profile) {
        let row = serde_json::to_value(&profile).unwrap_or_default();
        self.tables.write().await.profiles.insert(profile.id, profile);
        self.publish(ChangeEvent::insert(Table::Profiles, row));
    }

    pub async fn insert_job(&self, job: Job) {
        let row = serde_json::to_value(&job).unwrap_or_default();
        self.tables.write().await.jobs.push(job);
        self.publish(ChangeEvent::insert(Table::Jobs, row));
    }

    pub async fn insert_message(&self, message: Message) {
        let row = serde_json::to_value(&message).unwrap_or_default();
        self.tables.write().await.messages.push(message);
        self.publish(ChangeEvent::insert(Table::Messages, row));
    }

    /// Flip `is_read` on a message, publishing the old and new rows
    pub async fn set_message_read(&self, message_id: Uuid, is_read: bool) -> Result<(), BackendError> {
        self.check_write()?;
        let (old, new) = {
            let mut tables = self.tables.write().await;
            let message = tables
                .messages
                .iter_mut()
                .find(|m| m.id == message_id)
                .ok_or_else(|| BackendError::NotFound(format!("message {}", message_id)))?;
            let old = serde_json::to_value(&*message)?;
            message.is_read = is_read;
            (old, serde_json::to_value(&*message)?)
        };
        self.publish(ChangeEvent::update(Table::Messages, old, new));
        Ok(())
    }

    pub async fn insert_ticket(&self, ticket: SupportTicket) {
        let row = serde_json::to_value(&ticket).unwrap_or_default();
        self.tables.write().await.tickets.push(ticket);
        self.publish(ChangeEvent::insert(Table::SupportTickets, row));
    }

    /// Change a ticket's status directly, as another client would
    pub async fn set_ticket_status(&self, ticket_id: Uuid, status: TicketStatus) -> Result<(), BackendError> {
        self.check_write()?;
        let (old, new) = {
            let mut tables = self.tables.write().await;
            let ticket = tables
                .tickets
                .iter_mut()
                .find(|t| t.id == ticket_id)
                .ok_or_else(|| BackendError::NotFound(format!("ticket {}", ticket_id)))?;
            let old = serde_json::to_value(&*ticket)?;
            ticket.status = status;
            ticket.updated_at = Utc::now();
            (old, serde_json::to_value(&*ticket)?)
        };
        self.publish(ChangeEvent::update(Table::SupportTickets, old, new));
        Ok(())
    }

    pub async fn ticket(&self, ticket_id: Uuid) -> Option<SupportTicket> {
        self.tables.read().await.tickets.iter().find(|t| t.id == ticket_id).cloned()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        self.check_read()?;
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, BackendError> {
        self.check_read()?;
        let mut jobs = self.tables.read().await.jobs.clone();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn count_unread_messages(&self, recipient_id: Uuid) -> Result<u64, BackendError> {
        self.check_read()?;
        let tables = self.tables.read().await;
        Ok(tables.messages.iter().filter(|m| m.is_unread_for(recipient_id)).count() as u64)
    }

    async fn fetch_display_name(&self, user_id: Uuid) -> Result<Option<String>, BackendError> {
        self.check_read()?;
        Ok(self
            .tables
            .read()
            .await
            .profiles
            .get(&user_id)
            .and_then(Profile::display_name))
    }

    async fn list_open_tickets(&self) -> Result<Vec<SupportTicket>, BackendError> {
        self.check_read()?;
        let mut tickets: Vec<SupportTicket> = self
            .tables
            .read()
            .await
            .tickets
            .iter()
            .filter(|t| t.is_pending())
            .cloned()
            .collect();
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tickets)
    }

    async fn assign_ticket(&self, ticket_id: Uuid, assignee: Uuid) -> Result<bool, BackendError> {
        self.check_write()?;
        let change = {
            let mut tables = self.tables.write().await;
            match tables.tickets.iter_mut().find(|t| t.id == ticket_id && t.is_pending()) {
                Some(ticket) => {
                    let old = serde_json::to_value(&*ticket)?;
                    ticket.assigned_to = Some(assignee);
                    ticket.status = TicketStatus::InProgress;
                    ticket.updated_at = Utc::now();
                    Some((old, serde_json::to_value(&*ticket)?))
                }
                None => None,
            }
        };

        match change {
            Some((old, new)) => {
                self.publish(ChangeEvent::update(Table::SupportTickets, old, new));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn subscribe(&self, spec: ChannelSpec) -> Result<Subscription, BackendError> {
        let mut feed = {
            let guard = self
                .feed
                .lock()
                .map_err(|_| BackendError::Unavailable("change feed poisoned".to_string()))?;
            guard
                .as_ref()
                .ok_or_else(|| BackendError::Unavailable("change feed disconnected".to_string()))?
                .subscribe()
        };

        let (tx, rx) = Subscription::channel(self.buffer_size);
        let filter = spec.clone();
        let pump = tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(event) => {
                        if filter.matches(&event) && tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Channel '{}' lagged, skipped {} events", filter.name, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::debug!("Change feed for channel '{}' ended", filter.name);
        });

        tracing::debug!("Subscribed to channel '{}'", spec.name);
        Ok(Subscription::new(spec, rx, pump))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketPriority;
    use crate::realtime::{ChangeFilter, ChangeKind};

    #[tokio::test]
    async fn assign_ticket_is_conditional() {
        let backend = MemoryBackend::new();
        let ticket = SupportTicket::open(Uuid::new_v4(), "Printer on fire", TicketPriority::High);
        let id = ticket.id;
        backend.insert_ticket(ticket).await;

        let first = Uuid::new_v4();
        assert!(backend.assign_ticket(id, first).await.unwrap());
        assert!(!backend.assign_ticket(id, Uuid::new_v4()).await.unwrap());

        let stored = backend.ticket(id).await.unwrap();
        assert_eq!(stored.assigned_to, Some(first));
        assert_eq!(stored.status, TicketStatus::InProgress);
        assert!(backend.list_open_tickets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscription_only_sees_matching_events() {
        let backend = MemoryBackend::new();
        let spec = ChannelSpec::new("msgs").on(ChangeFilter::on(Table::Messages, ChangeKind::Insert));
        let mut sub = backend.subscribe(spec).await.unwrap();

        backend
            .insert_ticket(SupportTicket::open(Uuid::new_v4(), "ignored", TicketPriority::Low))
            .await;
        let message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "hello");
        let id = message.id;
        backend.insert_message(message).await;

        let event = sub.next_event().await.unwrap();
        assert_eq!(event.table, Table::Messages);
        let decoded: Message = event.new_as().unwrap().unwrap();
        assert_eq!(decoded.id, id);
    }

    #[tokio::test]
    async fn disconnect_ends_live_subscriptions() {
        let backend = MemoryBackend::new();
        let mut sub = backend
            .subscribe(ChannelSpec::new("all").on(ChangeFilter::new(Table::Jobs)))
            .await
            .unwrap();

        backend.disconnect();
        assert!(sub.next_event().await.is_none());
        assert!(backend.subscribe(ChannelSpec::new("again")).await.is_err());

        backend.reconnect();
        assert!(backend.subscribe(ChannelSpec::new("again")).await.is_ok());
    }

    #[tokio::test]
    async fn failure_injection_hits_reads_and_writes() {
        let backend = MemoryBackend::new();
        backend.fail_reads(true);
        assert!(backend.list_jobs().await.is_err());
        backend.fail_reads(false);
        assert!(backend.list_jobs().await.unwrap().is_empty());

        backend.fail_writes(true);
        assert!(backend.assign_ticket(Uuid::new_v4(), Uuid::new_v4()).await.is_err());
    }
}
