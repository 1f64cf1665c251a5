use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Session;
use crate::backend::{Backend, BackendError};
use crate::models::{SupportTicket, TicketPriority};
use crate::permissions::ViewerPermissions;
use crate::realtime::{ChangeEvent, ChangeFilter, ChangeKind, ChannelSpec, Subscription, Table};
use crate::toast::{Notifier, Toast};

const UNKNOWN_CREATOR: &str = "Unknown user";

/// Open ticket waiting for someone to pick it up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTicket {
    pub id: Uuid,
    pub subject: String,
    pub priority: TicketPriority,
    pub creator_id: Uuid,
    pub creator_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Only admin and support staff can accept tickets")]
    NotPermitted,

    #[error("Ticket {0} is not in the pending queue")]
    NotPending(Uuid),

    #[error("Ticket {0} was already taken")]
    AlreadyAssigned(Uuid),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Pending support ticket queue fed by the tickets change feed
pub struct TicketAlert {
    backend: Arc<dyn Backend>,
    session: Session,
    permissions: ViewerPermissions,
    notifier: Arc<dyn Notifier>,
    pending: Vec<PendingTicket>,
    subscription: Option<Subscription>,
}

impl TicketAlert {
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Session,
        permissions: ViewerPermissions,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            session,
            permissions,
            notifier,
            pending: Vec::new(),
            subscription: None,
        }
    }

    /// Queue in arrival order
    pub fn pending(&self) -> &[PendingTicket] {
        &self.pending
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    fn channel_spec(&self) -> ChannelSpec {
        ChannelSpec::new(format!("ticket-alerts-{}", self.session.user_id))
            .on(ChangeFilter::on(Table::SupportTickets, ChangeKind::Insert).eq("status", "open"))
            .on(ChangeFilter::on(Table::SupportTickets, ChangeKind::Update).and_kind(ChangeKind::Delete))
    }

    /// Seed the queue with tickets already open, then follow the feed.
    /// Viewers who cannot handle tickets get neither.
    pub async fn start(&mut self) -> Result<(), BackendError> {
        self.stop();
        if !self.permissions.can_handle_tickets() {
            tracing::debug!("Role {} does not receive ticket alerts", self.permissions.role);
            return Ok(());
        }

        // Subscribe first so nothing opened while seeding is missed
        let subscription = match self.backend.subscribe(self.channel_spec()).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!("Failed to subscribe to support tickets: {}", e);
                self.notifier.notify(Toast::error("Support", "Live ticket alerts are unavailable"));
                return Err(e);
            }
        };
        self.subscription = Some(subscription);

        match self.backend.list_open_tickets().await {
            Ok(tickets) => {
                for ticket in tickets {
                    self.enqueue(ticket, false).await;
                }
            }
            Err(e) => {
                tracing::error!("Failed to load open tickets: {}", e);
                self.notifier.notify(Toast::error("Support", "Could not load open tickets"));
            }
        }

        tracing::info!("Ticket alerts started with {} pending", self.pending.len());
        Ok(())
    }

    pub async fn restart(&mut self) -> Result<(), BackendError> {
        self.start().await
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    /// Add a ticket unless it is already queued or no longer pending.
    /// Returns whether the queue changed.
    async fn enqueue(&mut self, ticket: SupportTicket, announce: bool) -> bool {
        if !ticket.is_pending() || self.pending.iter().any(|p| p.id == ticket.id) {
            return false;
        }

        let creator_name = match self.backend.fetch_display_name(ticket.creator_id).await {
            Ok(Some(name)) => name,
            Ok(None) => UNKNOWN_CREATOR.to_string(),
            Err(e) => {
                tracing::error!("Failed to look up creator of ticket {}: {}", ticket.id, e);
                self.notifier
                    .notify(Toast::error("Support", format!("Could not load ticket \"{}\"", ticket.subject)));
                return false;
            }
        };

        if announce {
            self.notifier.notify(Toast::info(
                "New support ticket",
                format!("{} opened \"{}\" ({})", creator_name, ticket.subject, ticket.priority),
            ));
        }

        self.pending.push(PendingTicket {
            id: ticket.id,
            subject: ticket.subject,
            priority: ticket.priority,
            creator_id: ticket.creator_id,
            creator_name,
            created_at: ticket.created_at,
        });
        true
    }

    fn remove(&mut self, ticket_id: Uuid) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != ticket_id);
        self.pending.len() != before
    }

    pub async fn handle_event(&mut self, event: &ChangeEvent) {
        if event.table != Table::SupportTickets {
            return;
        }

        match event.kind {
            ChangeKind::Insert => match event.new_as::<SupportTicket>() {
                Some(Ok(ticket)) => {
                    self.enqueue(ticket, true).await;
                }
                Some(Err(e)) => tracing::warn!("Skipping undecodable ticket insert: {}", e),
                None => {}
            },
            ChangeKind::Update => match event.new_as::<SupportTicket>() {
                Some(Ok(ticket)) if !ticket.is_pending() => {
                    if self.remove(ticket.id) {
                        tracing::debug!("Ticket {} left the queue ({})", ticket.id, ticket.status);
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => tracing::warn!("Skipping undecodable ticket update: {}", e),
                None => {}
            },
            ChangeKind::Delete => {
                // Deletes may carry only the primary key of the old row
                let id = event
                    .column("id")
                    .and_then(|v| v.as_str())
                    .and_then(|s| Uuid::parse_str(s).ok());
                if let Some(id) = id {
                    self.remove(id);
                }
            }
        }
    }

    /// Assign the ticket to the viewer. The entry leaves the queue only once
    /// the backend confirms; a failed write leaves the queue untouched.
    pub async fn accept(&mut self, ticket_id: Uuid) -> Result<(), TicketError> {
        if !self.permissions.can_handle_tickets() {
            return Err(TicketError::NotPermitted);
        }
        if !self.pending.iter().any(|p| p.id == ticket_id) {
            return Err(TicketError::NotPending(ticket_id));
        }

        match self.backend.assign_ticket(ticket_id, self.session.user_id).await {
            Ok(true) => {
                self.remove(ticket_id);
                tracing::info!("Ticket {} accepted by {}", ticket_id, self.session.user_id);
                self.notifier.notify(Toast::success("Support", "Ticket accepted"));
                Ok(())
            }
            Ok(false) => {
                // Server says it is no longer open and unassigned
                self.remove(ticket_id);
                tracing::warn!("Ticket {} was already taken", ticket_id);
                self.notifier.notify(Toast::error("Support", "Someone else already took this ticket"));
                Err(TicketError::AlreadyAssigned(ticket_id))
            }
            Err(e) => {
                tracing::error!("Failed to accept ticket {}: {}", ticket_id, e);
                self.notifier.notify(Toast::error("Support", "Could not accept ticket"));
                Err(e.into())
            }
        }
    }

    /// Hide a ticket locally; the server is not touched
    pub fn dismiss(&mut self, ticket_id: Uuid) -> bool {
        self.remove(ticket_id)
    }

    /// Next ticket event, `None` once the feed has ended.
    ///
    /// Cancel safe: dropping the future before it resolves loses no event,
    /// so this is the half to race in `select!`. Pass the result to
    /// [`TicketAlert::handle_event`] outside the race.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        let event = self.subscription.as_mut()?.next_event().await;
        if event.is_none() {
            tracing::warn!("Ticket feed ended for {}", self.session.user_id);
            self.subscription = None;
        }
        event
    }

    /// Wait for and process one event. Returns `false` once the feed has ended.
    pub async fn process_next(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(&event).await;
                true
            }
            None => false,
        }
    }

    pub async fn run(&mut self) {
        while self.process_next().await {}
    }
}

impl Drop for TicketAlert {
    fn drop(&mut self) {
        self.stop();
    }
}
