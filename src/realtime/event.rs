use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Tables that publish row changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    Jobs,
    Messages,
    SupportTickets,
    Notifications,
    ShopInvitations,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Jobs => "jobs",
            Table::Messages => "messages",
            Table::SupportTickets => "support_tickets",
            Table::Notifications => "notifications",
            Table::ShopInvitations => "shop_invitations",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pushed row change. `new` is absent for deletes, `old` for inserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(rename = "record", default)]
    pub new: Option<Value>,
    #[serde(rename = "old_record", default)]
    pub old: Option<Value>,
    #[serde(default = "Utc::now")]
    pub commit_timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn insert(table: Table, row: Value) -> Self {
        Self {
            table,
            kind: ChangeKind::Insert,
            new: Some(row),
            old: None,
            commit_timestamp: Utc::now(),
        }
    }

    pub fn update(table: Table, old: Value, new: Value) -> Self {
        Self {
            table,
            kind: ChangeKind::Update,
            new: Some(new),
            old: Some(old),
            commit_timestamp: Utc::now(),
        }
    }

    pub fn delete(table: Table, old: Value) -> Self {
        Self {
            table,
            kind: ChangeKind::Delete,
            new: None,
            old: Some(old),
            commit_timestamp: Utc::now(),
        }
    }

    /// Parse the JSON payload published by the row-change trigger
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        let mut event: ChangeEvent = serde_json::from_str(payload)?;
        // row_to_json(NULL) arrives as an explicit null
        if matches!(event.new, Some(Value::Null)) {
            event.new = None;
        }
        if matches!(event.old, Some(Value::Null)) {
            event.old = None;
        }
        Ok(event)
    }

    pub fn new_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.new.as_ref().map(|v| T::deserialize(v))
    }

    /// Column value from the new snapshot, falling back to the old one
    pub fn column(&self, name: &str) -> Option<&Value> {
        self.new
            .as_ref()
            .and_then(|row| row.get(name))
            .or_else(|| self.old.as_ref().and_then(|row| row.get(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_trigger_payload() {
        let payload = r#"{
            "table": "messages",
            "type": "UPDATE",
            "record": {"id": 1, "is_read": true},
            "old_record": {"id": 1, "is_read": false},
            "commit_timestamp": "2024-05-01T10:00:00Z"
        }"#;
        let event = ChangeEvent::from_payload(payload).unwrap();
        assert_eq!(event.table, Table::Messages);
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.new.as_ref().unwrap()["is_read"], json!(true));
        assert_eq!(event.old.as_ref().unwrap()["is_read"], json!(false));
    }

    #[test]
    fn null_snapshots_become_none() {
        let payload = r#"{"table": "support_tickets", "type": "INSERT", "record": {"id": 7}, "old_record": null}"#;
        let event = ChangeEvent::from_payload(payload).unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert!(event.old.is_none());
        assert_eq!(event.column("id"), Some(&json!(7)));
    }

    #[test]
    fn unknown_table_is_rejected() {
        let payload = r#"{"table": "audit_log", "type": "INSERT", "record": {}}"#;
        assert!(ChangeEvent::from_payload(payload).is_err());
    }
}
