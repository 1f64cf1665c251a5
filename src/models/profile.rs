use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Role, ShopId};

/// Row of the `profiles` table, keyed by the auth user id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Profile {
    /// Name shown next to tickets and messages
    pub fn display_name(&self) -> Option<String> {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or_else(|| self.email.as_deref())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_full_name_then_email() {
        let mut profile = Profile {
            id: Uuid::new_v4(),
            role: Role::Support,
            shop_id: None,
            full_name: Some("  ".to_string()),
            email: Some("desk@example.com".to_string()),
        };
        assert_eq!(profile.display_name().as_deref(), Some("desk@example.com"));

        profile.full_name = Some("Dana Ruiz".to_string());
        assert_eq!(profile.display_name().as_deref(), Some("Dana Ruiz"));

        profile.full_name = None;
        profile.email = None;
        assert_eq!(profile.display_name(), None);
    }
}
