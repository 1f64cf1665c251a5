use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Portal role stored on `profiles.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Support,
    Mechanic,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Support => "support",
            Role::Mechanic => "mechanic",
        }
    }

    /// Parse a stored role string. Anything unrecognised is treated as the
    /// least privileged role.
    pub fn from_profile(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!("Unknown role '{}' on profile, treating as mechanic", value);
            Role::Mechanic
        })
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Mechanic
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "support" => Ok(Role::Support),
            "mechanic" => Ok(Role::Mechanic),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles_case_insensitively() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" support ".parse::<Role>(), Ok(Role::Support));
        assert_eq!("mechanic".parse::<Role>(), Ok(Role::Mechanic));
    }

    #[test]
    fn unknown_profile_role_falls_back_to_mechanic() {
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(Role::from_profile("owner"), Role::Mechanic);
        assert_eq!(Role::default(), Role::Mechanic);
    }
}
