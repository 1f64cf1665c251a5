use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Shop (tenant) identifier as stored in `shop_id` columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopId(pub String);

impl ShopId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShopId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    WaitingParts,
    Completed,
    Delivered,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::WaitingParts => "waiting_parts",
            JobStatus::Completed => "completed",
            JobStatus::Delivered => "delivered",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(JobStatus::Pending),
            "in_progress" => Some(JobStatus::InProgress),
            "waiting_parts" => Some(JobStatus::WaitingParts),
            "completed" => Some(JobStatus::Completed),
            "delivered" => Some(JobStatus::Delivered),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored flat on the job row as `motorcycle_make`, `motorcycle_model`, `motorcycle_year`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Motorcycle {
    #[serde(rename = "motorcycle_make")]
    pub make: String,
    #[serde(rename = "motorcycle_model")]
    pub model: String,
    #[serde(rename = "motorcycle_year", default)]
    pub year: Option<i32>,
}

impl fmt::Display for Motorcycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} {} ({})", self.make, self.model, year),
            None => write!(f, "{} {}", self.make, self.model),
        }
    }
}

/// A service job owned by a shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub shop_id: ShopId,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(flatten)]
    pub motorcycle: Motorcycle,
    pub service_type: String,
    pub status: JobStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Minimal job for a shop, used when seeding fixtures
    pub fn new(shop_id: impl Into<ShopId>, customer_name: impl Into<String>, service_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            shop_id: shop_id.into(),
            customer_name: customer_name.into(),
            customer_phone: None,
            motorcycle: Motorcycle::default(),
            service_type: service_type.into(),
            status: JobStatus::Pending,
            notes: None,
            photos: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_strings() {
        for status in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::WaitingParts,
            JobStatus::Completed,
            JobStatus::Delivered,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("lost"), None);
    }

    #[test]
    fn shop_id_serializes_as_plain_string() {
        let job = Job::new("SHOP-1", "Alex", "oil change");
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["shop_id"], "SHOP-1");
        assert_eq!(value["status"], "pending");
        assert!(value.get("motorcycle_make").is_some());

        let back: Job = serde_json::from_value(value).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn motorcycle_display_includes_year_when_known() {
        let bike = Motorcycle { make: "Ducati".into(), model: "Monster".into(), year: Some(2019) };
        assert_eq!(bike.to_string(), "Ducati Monster (2019)");
    }
}
