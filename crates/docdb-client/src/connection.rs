//! Boundary to the transport.
//!
//! The socket, wire codec, request serialization and cursor iteration belong
//! to whoever implements these traits. This crate only decides what to send.

use async_trait::async_trait;
use docdb_common::{DbError, Document, LegacyOp, QueryRequest, Result};

/// An established session with a server.
///
/// `database: None` means the connection's default database. Implementations
/// serialize their own requests; timeouts and cancellation are theirs too.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Handle returned for a cursor-backed query, passed through untouched.
    type Cursor: Send;

    /// Database used when an operation names none.
    fn default_database(&self) -> &str;

    /// Run a command and return the raw reply document.
    ///
    /// Defaults to issuing the command as a single-batch query on `$cmd`.
    async fn submit_command(&self, database: Option<&str>, command: Document) -> Result<Document> {
        self.read_one(database, QueryRequest::command(command))
            .await?
            .ok_or_else(|| DbError::Network("Empty reply to command".into()))
    }

    /// Hand a legacy opcode to the transport. `Ok(true)` means sent.
    async fn submit_legacy_op(&self, op: LegacyOp) -> Result<bool>;

    /// Run a query and return its first document, if any.
    async fn read_one(
        &self,
        database: Option<&str>,
        query: QueryRequest,
    ) -> Result<Option<Document>>;

    /// Run a query and return a cursor over its results.
    async fn open_cursor(
        &self,
        database: Option<&str>,
        query: QueryRequest,
    ) -> Result<Self::Cursor>;

    /// Release the session.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Blocking command channel used in-process, e.g. while a connection is
/// still being set up and before it is wrapped in a [`Connection`].
pub trait SyncCommand {
    fn run_command(&mut self, database: &str, command: &Document) -> Result<Document>;
}
