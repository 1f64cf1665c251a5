use serde_json::Value;

use super::event::{ChangeEvent, ChangeKind, Table};

/// Which row changes a subscriber wants: one table, a set of change kinds,
/// and an optional `column = value` equality on the row.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeFilter {
    pub table: Table,
    pub kinds: Vec<ChangeKind>,
    pub eq: Option<(String, String)>,
}

impl ChangeFilter {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            kinds: vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete],
            eq: None,
        }
    }

    pub fn on(table: Table, kind: ChangeKind) -> Self {
        Self {
            table,
            kinds: vec![kind],
            eq: None,
        }
    }

    pub fn and_kind(mut self, kind: ChangeKind) -> Self {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.eq = Some((column.into(), value.into()));
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table || !self.kinds.contains(&event.kind) {
            return false;
        }

        let Some((column, expected)) = &self.eq else {
            return true;
        };

        // Deletes only carry the old row; everything else is filtered on the new one
        let row = match event.kind {
            ChangeKind::Delete => event.old.as_ref(),
            _ => event.new.as_ref(),
        };

        match row.and_then(|r| r.get(column)) {
            Some(Value::String(s)) => s == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == *expected,
        }
    }
}

/// A named group of filters delivered through one subscription
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub name: String,
    pub filters: Vec<ChangeFilter>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
        }
    }

    pub fn on(mut self, filter: ChangeFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.filters.iter().any(|f| f.matches(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_by_table_kind_and_column() {
        let filter = ChangeFilter::on(Table::SupportTickets, ChangeKind::Insert).eq("status", "open");

        let open = ChangeEvent::insert(Table::SupportTickets, json!({"status": "open"}));
        let closed = ChangeEvent::insert(Table::SupportTickets, json!({"status": "closed"}));
        let wrong_table = ChangeEvent::insert(Table::Messages, json!({"status": "open"}));
        let wrong_kind = ChangeEvent::update(
            Table::SupportTickets,
            json!({"status": "open"}),
            json!({"status": "open"}),
        );

        assert!(filter.matches(&open));
        assert!(!filter.matches(&closed));
        assert!(!filter.matches(&wrong_table));
        assert!(!filter.matches(&wrong_kind));
    }

    #[test]
    fn non_string_columns_compare_by_json_text() {
        let filter = ChangeFilter::new(Table::Messages).eq("is_read", "false");
        assert!(filter.matches(&ChangeEvent::insert(Table::Messages, json!({"is_read": false}))));
        assert!(!filter.matches(&ChangeEvent::insert(Table::Messages, json!({"is_read": null}))));
    }

    #[test]
    fn channel_matches_any_of_its_filters() {
        let spec = ChannelSpec::new("tickets")
            .on(ChangeFilter::on(Table::SupportTickets, ChangeKind::Insert))
            .on(ChangeFilter::on(Table::Messages, ChangeKind::Update));

        assert!(spec.matches(&ChangeEvent::insert(Table::SupportTickets, json!({}))));
        assert!(spec.matches(&ChangeEvent::update(Table::Messages, json!({}), json!({}))));
        assert!(!spec.matches(&ChangeEvent::delete(Table::Messages, json!({}))));
    }
}
