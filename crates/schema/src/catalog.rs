//! The fixed table catalog for the queue subsystem.
//!
//! Constructed once as static data and never mutated; bootstrap reads it
//! to provision or validate every table, and runtime code resolves tables
//! by name through [`describe`].

use uuid::Uuid;

use crate::descriptor::{ColumnFamilyDescriptor, KeyScheme};
use crate::error::{Result, SchemaError};
use quarry_keys::Tag;

/// Keyspace holding the static (cross-application) message tables.
pub const MESSAGES_KEYSPACE: &str = "quarry_messages";

/// Suffix appended to an application's keyspace for its message tables.
pub const APPLICATION_KEYSPACE_SUFFIX: &str = "_messages";

/// The keyspace name for one application's message tables.
pub fn application_keyspace(application: Uuid) -> String {
    format!(
        "application_{}{}",
        application.as_simple(),
        APPLICATION_KEYSPACE_SUFFIX
    )
}

/// Table name constants, in catalog order.
pub mod tables {
    /// Entity property storage. Shared with the entity-store subsystem,
    /// which owns its provisioning.
    pub const ENTITY_PROPERTIES: &str = "entity_properties";
    pub const QUEUE_PROPERTIES: &str = "queue_properties";
    /// Per-queue inbox, one column per message UUID.
    pub const QUEUE_INBOX: &str = "queue_inbox";
    pub const QUEUE_DICTIONARIES: &str = "queue_dictionaries";
    pub const QUEUE_SUBSCRIBERS: &str = "queue_subscribers";
    pub const QUEUE_SUBSCRIPTIONS: &str = "queue_subscriptions";
    /// Time-ordered list of future message timeouts per consumer; each
    /// column key is a time-UUID pointing back at the original message.
    pub const CONSUMER_TIMEOUTS: &str = "consumer_timeouts";
    pub const CONSUMERS: &str = "consumers";
    pub const CONSUMER_QUEUE_MESSAGES: &str = "consumer_queue_messages";
    /// Monotonic per-queue counters.
    pub const QUEUE_COUNTERS: &str = "queue_counters";
    /// Forward property index, composite-keyed.
    pub const PROPERTY_INDEX: &str = "property_index";
    /// Reverse entries for the property index, composite-keyed.
    pub const PROPERTY_INDEX_ENTRIES: &str = "property_index_entries";
}

static TABLES: [ColumnFamilyDescriptor; 12] = [
    ColumnFamilyDescriptor::new(tables::ENTITY_PROPERTIES, KeyScheme::Bytes).externally_owned(),
    ColumnFamilyDescriptor::new(tables::QUEUE_PROPERTIES, KeyScheme::Bytes),
    ColumnFamilyDescriptor::new(tables::QUEUE_INBOX, KeyScheme::Single(Tag::Uuid)),
    ColumnFamilyDescriptor::new(tables::QUEUE_DICTIONARIES, KeyScheme::Bytes),
    ColumnFamilyDescriptor::new(tables::QUEUE_SUBSCRIBERS, KeyScheme::Bytes),
    ColumnFamilyDescriptor::new(tables::QUEUE_SUBSCRIPTIONS, KeyScheme::Bytes),
    ColumnFamilyDescriptor::new(tables::CONSUMER_TIMEOUTS, KeyScheme::Single(Tag::TimeUuid)),
    ColumnFamilyDescriptor::new(tables::CONSUMERS, KeyScheme::Bytes),
    ColumnFamilyDescriptor::new(tables::CONSUMER_QUEUE_MESSAGES, KeyScheme::Bytes),
    ColumnFamilyDescriptor::new(tables::QUEUE_COUNTERS, KeyScheme::Bytes).with_counter_values(),
    ColumnFamilyDescriptor::new(tables::PROPERTY_INDEX, KeyScheme::Composite),
    ColumnFamilyDescriptor::new(tables::PROPERTY_INDEX_ENTRIES, KeyScheme::Composite),
];

/// Every table in the catalog, in declaration order.
pub fn catalog() -> &'static [ColumnFamilyDescriptor] {
    &TABLES
}

/// Look up one table by name.
pub fn describe(name: &str) -> Result<&'static ColumnFamilyDescriptor> {
    TABLES
        .iter()
        .find(|table| table.name() == name)
        .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let names: HashSet<_> = catalog().iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), catalog().len());
        assert_eq!(catalog().len(), 12);
    }

    #[test]
    fn test_describe_known_table() {
        let inbox = describe(tables::QUEUE_INBOX).unwrap();
        assert_eq!(inbox.key_scheme(), KeyScheme::Single(Tag::Uuid));
        assert!(inbox.auto_create());

        let timeouts = describe(tables::CONSUMER_TIMEOUTS).unwrap();
        assert_eq!(timeouts.key_scheme(), KeyScheme::Single(Tag::TimeUuid));
    }

    #[test]
    fn test_describe_unknown_table() {
        match describe("no_such_table") {
            Err(SchemaError::UnknownTable(name)) => assert_eq!(name, "no_such_table"),
            other => panic!("Expected UnknownTable, got {:?}", other),
        }
    }

    #[test]
    fn test_only_entity_properties_is_externally_owned() {
        for table in catalog() {
            if table.name() == tables::ENTITY_PROPERTIES {
                assert!(!table.auto_create());
            } else {
                assert!(table.auto_create(), "{} should auto-create", table.name());
            }
        }
    }

    #[test]
    fn test_counter_table() {
        let counters = describe(tables::QUEUE_COUNTERS).unwrap();
        assert!(counters.is_counter());
        for table in catalog() {
            if table.name() != tables::QUEUE_COUNTERS {
                assert!(!table.is_counter());
            }
        }
    }

    #[test]
    fn test_property_index_tables_are_composite() {
        assert!(describe(tables::PROPERTY_INDEX).unwrap().is_composite());
        assert!(
            describe(tables::PROPERTY_INDEX_ENTRIES)
                .unwrap()
                .is_composite()
        );
    }

    #[test]
    fn test_application_keyspace_name() {
        let app = Uuid::nil();
        let keyspace = application_keyspace(app);
        assert_eq!(
            keyspace,
            "application_00000000000000000000000000000000_messages"
        );
    }
}
