//! Request shapes handed to the transport and read dispatcher.

use serde::{Deserialize, Serialize};

use crate::Document;

/// Pseudo-collection that commands are issued against when sent as a query.
pub const COMMAND_COLLECTION: &str = "$cmd";

/// Target collection, optionally scoped to an explicit database.
///
/// Without a database the connection's default database is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionRef {
    Name(String),
    Qualified { database: String, collection: String },
}

impl CollectionRef {
    pub fn new(collection: impl Into<String>) -> Self {
        CollectionRef::Name(collection.into())
    }

    pub fn qualified(database: impl Into<String>, collection: impl Into<String>) -> Self {
        CollectionRef::Qualified {
            database: database.into(),
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            CollectionRef::Name(name) => name,
            CollectionRef::Qualified { collection, .. } => collection,
        }
    }

    pub fn database(&self) -> Option<&str> {
        match self {
            CollectionRef::Name(_) => None,
            CollectionRef::Qualified { database, .. } => Some(database),
        }
    }

    /// Full `database.collection` namespace, falling back to `default_db`.
    pub fn namespace(&self, default_db: &str) -> String {
        format!("{}.{}", self.database().unwrap_or(default_db), self.collection())
    }

    /// Same database scope, different collection.
    pub fn sibling(&self, collection: impl Into<String>) -> Self {
        match self.database() {
            Some(database) => CollectionRef::qualified(database, collection),
            None => CollectionRef::new(collection),
        }
    }
}

impl From<&str> for CollectionRef {
    fn from(value: &str) -> Self {
        CollectionRef::new(value)
    }
}

impl From<String> for CollectionRef {
    fn from(value: String) -> Self {
        CollectionRef::Name(value)
    }
}

impl From<(&str, &str)> for CollectionRef {
    fn from((database, collection): (&str, &str)) -> Self {
        CollectionRef::qualified(database, collection)
    }
}

impl From<(String, String)> for CollectionRef {
    fn from((database, collection): (String, String)) -> Self {
        CollectionRef::Qualified { database, collection }
    }
}

impl std::fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionRef::Name(name) => write!(f, "{name}"),
            CollectionRef::Qualified {
                database,
                collection,
            } => write!(f, "{database}.{collection}"),
        }
    }
}

/// Query handed to the read dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub collection: String,
    pub selector: Document,
    #[serde(default)]
    pub projector: Document,
    #[serde(default)]
    pub skip: i32,
    #[serde(default)]
    pub batchsize: i32,
}

impl QueryRequest {
    pub fn new(collection: impl Into<String>, selector: Document) -> Self {
        Self {
            collection: collection.into(),
            selector,
            projector: Document::new(),
            skip: 0,
            batchsize: 0,
        }
    }

    /// A command issued as a single-batch query on the `$cmd` pseudo-collection.
    pub fn command(command: Document) -> Self {
        Self {
            batchsize: -1,
            ..Self::new(COMMAND_COLLECTION, command)
        }
    }

    pub fn is_command(&self) -> bool {
        self.collection == COMMAND_COLLECTION
    }
}

/// Fire-and-forget write understood by pre-command servers.
///
/// These opcodes carry no acknowledgement payload; the transport only reports
/// whether the message was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LegacyOp {
    Insert {
        collection: CollectionRef,
        documents: Vec<Document>,
    },
    Update {
        collection: CollectionRef,
        selector: Document,
        update: Document,
        upsert: bool,
        multi: bool,
    },
    Delete {
        collection: CollectionRef,
        selector: Document,
        single_remove: bool,
    },
}

impl LegacyOp {
    pub fn collection(&self) -> &CollectionRef {
        match self {
            LegacyOp::Insert { collection, .. }
            | LegacyOp::Update { collection, .. }
            | LegacyOp::Delete { collection, .. } => collection,
        }
    }

    /// Short opcode name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            LegacyOp::Insert { .. } => "insert",
            LegacyOp::Update { .. } => "update",
            LegacyOp::Delete { .. } => "delete",
        }
    }
}
