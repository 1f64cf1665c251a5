use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgListener;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{Backend, BackendError};
use crate::config;
use crate::database::DatabaseManager;
use crate::models::{Job, JobStatus, Motorcycle, Profile, Role, ShopId, SupportTicket, TicketPriority, TicketStatus};
use crate::realtime::{ChangeEvent, ChannelSpec, Subscription};

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    role: Option<String>,
    shop_id: Option<String>,
    full_name: Option<String>,
    email: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            role: row.role.as_deref().map(Role::from_profile).unwrap_or_default(),
            shop_id: row.shop_id.map(ShopId),
            full_name: row.full_name,
            email: row.email,
        }
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    shop_id: String,
    customer_name: String,
    customer_phone: Option<String>,
    motorcycle_make: String,
    motorcycle_model: String,
    motorcycle_year: Option<i32>,
    service_type: String,
    status: String,
    notes: Option<String>,
    photos: Option<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = BackendError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status)
            .ok_or_else(|| BackendError::Rejected(format!("job {} has unknown status '{}'", row.id, row.status)))?;
        Ok(Job {
            id: row.id,
            shop_id: ShopId(row.shop_id),
            customer_name: row.customer_name,
            customer_phone: row.customer_phone,
            motorcycle: Motorcycle {
                make: row.motorcycle_make,
                model: row.motorcycle_model,
                year: row.motorcycle_year,
            },
            service_type: row.service_type,
            status,
            notes: row.notes,
            photos: row.photos.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TicketRow {
    id: Uuid,
    creator_id: Uuid,
    assigned_to: Option<Uuid>,
    subject: String,
    description: Option<String>,
    priority: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TicketRow> for SupportTicket {
    type Error = BackendError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status = TicketStatus::parse(&row.status)
            .ok_or_else(|| BackendError::Rejected(format!("ticket {} has unknown status '{}'", row.id, row.status)))?;
        Ok(SupportTicket {
            id: row.id,
            creator_id: row.creator_id,
            assigned_to: row.assigned_to,
            subject: row.subject,
            description: row.description,
            priority: row.priority.as_deref().and_then(TicketPriority::parse).unwrap_or_default(),
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Backend over the platform's Postgres database, with the change feed
/// delivered through LISTEN/NOTIFY (see `migrations/0001_portal.sql`).
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
    channel: String,
    buffer_size: usize,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        let realtime = &config::config().realtime;
        Self {
            pool,
            channel: realtime.channel.clone(),
            buffer_size: realtime.buffer_size,
        }
    }

    /// Backend on the shared pool from DATABASE_URL
    pub async fn connect() -> Result<Self, BackendError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl Backend for PgBackend {
    async fn fetch_profile(&self, user_id: Uuid) -> Result<Option<Profile>, BackendError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, role, shop_id, full_name, email FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, BackendError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT id, shop_id, customer_name, customer_phone,
                    motorcycle_make, motorcycle_model, motorcycle_year,
                    service_type, status, notes, photos, created_at, updated_at
             FROM jobs
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Job::try_from).collect()
    }

    async fn count_unread_messages(&self, recipient_id: Uuid) -> Result<u64, BackendError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND is_read = false",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn fetch_display_name(&self, user_id: Uuid) -> Result<Option<String>, BackendError> {
        Ok(self.fetch_profile(user_id).await?.and_then(|p| p.display_name()))
    }

    async fn list_open_tickets(&self) -> Result<Vec<SupportTicket>, BackendError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT id, creator_id, assigned_to, subject, description, priority, status, created_at, updated_at
             FROM support_tickets
             WHERE status = 'open' AND assigned_to IS NULL
             ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SupportTicket::try_from).collect()
    }

    async fn assign_ticket(&self, ticket_id: Uuid, assignee: Uuid) -> Result<bool, BackendError> {
        let result = sqlx::query(
            "UPDATE support_tickets
             SET assigned_to = $2, status = 'in_progress', updated_at = now()
             WHERE id = $1 AND status = 'open' AND assigned_to IS NULL",
        )
        .bind(ticket_id)
        .bind(assignee)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn subscribe(&self, spec: ChannelSpec) -> Result<Subscription, BackendError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;

        let (tx, rx) = Subscription::channel(self.buffer_size);
        let filter = spec.clone();
        let channel = self.channel.clone();
        let pump = tokio::spawn(async move {
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => {
                        let event = match ChangeEvent::from_payload(notification.payload()) {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::warn!("Ignoring malformed change on '{}': {}", channel, e);
                                continue;
                            }
                        };
                        if filter.matches(&event) && tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::warn!("Change feed connection lost for channel '{}'", filter.name);
                        break;
                    }
                    Err(e) => {
                        tracing::error!("Change feed error for channel '{}': {}", filter.name, e);
                        break;
                    }
                }
            }
        });

        tracing::info!("Listening on '{}' for channel '{}'", self.channel, spec.name);
        Ok(Subscription::new(spec, rx, pump))
    }
}
