use std::collections::BTreeMap;
use uuid::Uuid;

use crate::auth::Session;
use crate::backend::{Backend, BackendError};
use crate::models::{Job, JobStatus};
use crate::permissions::{load_permissions, PermissionState, ViewerPermissions};

/// A viewer's snapshot of the jobs list
#[derive(Debug, Clone)]
pub struct JobBoard {
    state: PermissionState,
    jobs: Vec<Job>,
}

impl JobBoard {
    /// Board before permissions resolve; shows nothing
    pub fn loading() -> Self {
        Self {
            state: PermissionState::Loading,
            jobs: Vec::new(),
        }
    }

    pub fn with_permissions(permissions: ViewerPermissions, jobs: Vec<Job>) -> Self {
        Self {
            state: PermissionState::Resolved(permissions),
            jobs,
        }
    }

    pub async fn load(backend: &dyn Backend, session: Option<&Session>) -> Result<Self, BackendError> {
        let permissions = load_permissions(backend, session).await;
        let jobs = if session.is_some() { backend.list_jobs().await? } else { Vec::new() };
        tracing::info!(
            "Loaded {} jobs for role {} (shop {:?})",
            jobs.len(),
            permissions.role,
            permissions.shop_id
        );
        Ok(Self::with_permissions(permissions, jobs))
    }

    pub fn permissions(&self) -> Option<&ViewerPermissions> {
        self.state.permissions()
    }

    pub fn visible(&self) -> Vec<Job> {
        self.state.visible_jobs(&self.jobs)
    }

    /// A single job, only when the viewer may see it
    pub fn find(&self, job_id: Uuid) -> Option<&Job> {
        let permissions = self.state.permissions()?;
        self.jobs
            .iter()
            .find(|job| job.id == job_id)
            .filter(|job| permissions.can_see_job(job))
    }

    pub fn count_by_status(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for job in self.visible() {
            *counts.entry(job.status.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn active_count(&self) -> usize {
        self.visible()
            .iter()
            .filter(|job| !matches!(job.status, JobStatus::Delivered | JobStatus::Cancelled))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::models::{Profile, Role, ShopId};

    async fn seeded() -> (MemoryBackend, Uuid, Uuid) {
        let backend = MemoryBackend::new();
        let mechanic = Uuid::new_v4();
        let admin = Uuid::new_v4();
        backend
            .insert_profile(Profile {
                id: mechanic,
                role: Role::Mechanic,
                shop_id: Some(ShopId::new("SHOP-1")),
                full_name: None,
                email: None,
            })
            .await;
        backend
            .insert_profile(Profile { id: admin, role: Role::Admin, shop_id: None, full_name: None, email: None })
            .await;

        let mut done = Job::new("SHOP-1", "Ana", "service");
        done.status = JobStatus::Delivered;
        backend.insert_job(done).await;
        backend.insert_job(Job::new("SHOP-1", "Ben", "tyres")).await;
        backend.insert_job(Job::new("SHOP-2", "Cal", "brakes")).await;
        (backend, mechanic, admin)
    }

    fn session(user_id: Uuid) -> Session {
        Session { user_id, email: None, access_token: String::new() }
    }

    #[tokio::test]
    async fn mechanic_board_only_lists_own_shop() {
        let (backend, mechanic, _) = seeded().await;
        let board = JobBoard::load(&backend, Some(&session(mechanic))).await.unwrap();

        let visible = board.visible();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|j| j.shop_id.as_str() == "SHOP-1"));
        assert_eq!(board.active_count(), 1);
        assert_eq!(board.count_by_status().get("delivered"), Some(&1));

        let foreign = backend.list_jobs().await.unwrap().into_iter().find(|j| j.shop_id.as_str() == "SHOP-2").unwrap();
        assert!(board.find(foreign.id).is_none());
    }

    #[tokio::test]
    async fn admin_board_lists_everything() {
        let (backend, _, admin) = seeded().await;
        let board = JobBoard::load(&backend, Some(&session(admin))).await.unwrap();
        assert_eq!(board.visible().len(), 3);
    }

    #[tokio::test]
    async fn no_session_and_loading_show_nothing() {
        let (backend, _, _) = seeded().await;
        let board = JobBoard::load(&backend, None).await.unwrap();
        assert!(board.visible().is_empty());
        assert!(JobBoard::loading().visible().is_empty());
        assert!(JobBoard::loading().permissions().is_none());
    }
}
