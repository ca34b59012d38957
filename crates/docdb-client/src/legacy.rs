//! Acknowledgement-free write operations for pre-2.6 servers.
//!
//! Known limitation: these opcodes return nothing. The transport can only
//! say whether the message was sent, so a successful outcome does not mean
//! the server applied the write. Nothing here retries.

use docdb_common::{CollectionRef, DbError, Document, LegacyOp, Result};

use crate::{options::UpdateOptions, results::WriteOutcome};

/// Collection that legacy servers read index descriptions from.
pub const SYSTEM_INDEXES: &str = "system.indexes";

pub fn insert(collection: &CollectionRef, documents: Vec<Document>) -> LegacyOp {
    LegacyOp::Insert {
        collection: collection.clone(),
        documents,
    }
}

pub fn update(
    collection: &CollectionRef,
    selector: Document,
    update: Document,
    options: UpdateOptions,
) -> LegacyOp {
    LegacyOp::Update {
        collection: collection.clone(),
        selector,
        update,
        upsert: options.upsert,
        multi: options.multi,
    }
}

/// The delete opcode only knows "all matches" or "first match", so limits
/// above one cannot be expressed.
pub fn delete(collection: &CollectionRef, selector: Document, limit: u32) -> Result<LegacyOp> {
    let single_remove = match limit {
        0 => false,
        1 => true,
        n => {
            return Err(DbError::Unsupported(format!(
                "legacy delete cannot limit removal to {n} documents; use 0 or 1"
            )));
        }
    };
    Ok(LegacyOp::Delete {
        collection: collection.clone(),
        selector,
        single_remove,
    })
}

/// Index creation on legacy servers: an insert into `<db>.system.indexes`.
pub fn create_index(collection: &CollectionRef, index: Document) -> LegacyOp {
    insert(&collection.sibling(SYSTEM_INDEXES), vec![index])
}

/// Map the transport acknowledgement onto an outcome.
///
/// Sent means success with empty info; not sent, or any transport error,
/// means failure with empty info.
pub fn outcome(op: &LegacyOp, ack: Result<bool>) -> WriteOutcome {
    match ack {
        Ok(sent) => {
            if !sent {
                tracing::warn!("Legacy {} on {} was not sent", op.name(), op.collection());
            }
            WriteOutcome::Unacknowledged { sent }
        }
        Err(e) => {
            tracing::warn!("Legacy {} on {} failed: {e}", op.name(), op.collection());
            WriteOutcome::Unacknowledged { sent: false }
        }
    }
}
