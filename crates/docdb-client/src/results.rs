//! Write result types.

use std::sync::LazyLock;

use docdb_common::{Document, ID_FIELD, Value};

static EMPTY_INFO: LazyLock<Document> = LazyLock::new(Document::new);

/// Outcome of a write or index operation.
///
/// The two protocol generations report very different things, so they are
/// kept apart instead of collapsing into one boolean.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The server replied to a write command.
    Acknowledged { ok: bool, info: Document },
    /// A legacy opcode was handed to the transport.
    ///
    /// `sent: true` only certifies that the message went out. Pre-command
    /// servers cannot report whether the write was applied.
    Unacknowledged { sent: bool },
}

impl WriteOutcome {
    pub(crate) fn acknowledged((ok, info): (bool, Document)) -> Self {
        WriteOutcome::Acknowledged { ok, info }
    }

    pub fn success(&self) -> bool {
        match self {
            WriteOutcome::Acknowledged { ok, .. } => *ok,
            WriteOutcome::Unacknowledged { sent } => *sent,
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self, WriteOutcome::Acknowledged { .. })
    }

    /// Server reply without `ok`; always empty for unacknowledged writes.
    pub fn info(&self) -> &Document {
        match self {
            WriteOutcome::Acknowledged { info, .. } => info,
            WriteOutcome::Unacknowledged { .. } => &*EMPTY_INFO,
        }
    }

    /// Flatten into the `(success, info)` pair.
    pub fn into_parts(self) -> (bool, Document) {
        match self {
            WriteOutcome::Acknowledged { ok, info } => (ok, info),
            WriteOutcome::Unacknowledged { sent } => (sent, Document::new()),
        }
    }

    /// Number of documents the server reports as affected (`n`), if acknowledged.
    pub fn affected(&self) -> Option<i64> {
        self.info().get("n").and_then(Value::as_number).map(|n| n as i64)
    }
}

/// Result of an insert: the outcome plus the documents exactly as sent,
/// including any generated identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertResult {
    pub outcome: WriteOutcome,
    pub documents: Vec<Document>,
}

impl InsertResult {
    pub fn success(&self) -> bool {
        self.outcome.success()
    }

    /// Identifier of every inserted document, in insertion order.
    pub fn inserted_ids(&self) -> Vec<&Value> {
        self.documents
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD))
            .collect()
    }
}
