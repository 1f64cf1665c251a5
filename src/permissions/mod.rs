//! Role-based job visibility.
//!
//! Admins and support staff see every job. Mechanics see only jobs of their
//! own shop, and nothing at all when they have no shop affiliation. Until a
//! viewer's permissions have been resolved, nothing is visible.

use serde::Serialize;

use crate::auth::Session;
use crate::backend::Backend;
use crate::models::{Job, Role, ShopId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewerPermissions {
    pub role: Role,
    pub shop_id: Option<ShopId>,
}

impl ViewerPermissions {
    pub fn new(role: Role, shop_id: Option<ShopId>) -> Self {
        Self { role, shop_id }
    }

    pub fn can_see_all_jobs(&self) -> bool {
        match self.role {
            Role::Admin | Role::Support => true,
            Role::Mechanic => false,
        }
    }

    /// Admin and support share ticket handling rights
    pub fn can_handle_tickets(&self) -> bool {
        match self.role {
            Role::Admin | Role::Support => true,
            Role::Mechanic => false,
        }
    }

    pub fn can_see_job(&self, job: &Job) -> bool {
        if self.can_see_all_jobs() {
            return true;
        }
        match &self.shop_id {
            Some(shop_id) => job.shop_id == *shop_id,
            None => false,
        }
    }

    /// Subset of `jobs` visible to this viewer, in input order
    pub fn filter_jobs(&self, jobs: &[Job]) -> Vec<Job> {
        if self.can_see_all_jobs() {
            return jobs.to_vec();
        }
        if self.shop_id.is_none() {
            return Vec::new();
        }
        jobs.iter().filter(|job| self.can_see_job(job)).cloned().collect()
    }
}

/// Permissions as seen by a view: still loading, or resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionState {
    Loading,
    Resolved(ViewerPermissions),
}

impl PermissionState {
    pub fn visible_jobs(&self, jobs: &[Job]) -> Vec<Job> {
        match self {
            PermissionState::Loading => Vec::new(),
            PermissionState::Resolved(permissions) => permissions.filter_jobs(jobs),
        }
    }

    pub fn permissions(&self) -> Option<&ViewerPermissions> {
        match self {
            PermissionState::Loading => None,
            PermissionState::Resolved(permissions) => Some(permissions),
        }
    }
}

/// Resolve the viewer's permissions from their profile.
///
/// No session, no profile or a failed lookup all resolve to a mechanic
/// without a shop, which sees nothing.
pub async fn load_permissions(backend: &dyn Backend, session: Option<&Session>) -> ViewerPermissions {
    let Some(session) = session else {
        tracing::debug!("No session, resolving to empty permissions");
        return ViewerPermissions::default();
    };

    match backend.fetch_profile(session.user_id).await {
        Ok(Some(profile)) => {
            tracing::debug!(
                "Resolved permissions for {}: role={} shop={:?}",
                session.user_id, profile.role, profile.shop_id
            );
            ViewerPermissions::new(profile.role, profile.shop_id)
        }
        Ok(None) => {
            tracing::warn!("No profile for user {}, resolving to empty permissions", session.user_id);
            ViewerPermissions::default()
        }
        Err(e) => {
            tracing::error!("Failed to load profile for {}: {}", session.user_id, e);
            ViewerPermissions::default()
        }
    }
}
