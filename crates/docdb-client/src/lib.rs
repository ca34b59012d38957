//! docdb client operation layer
//!
//! Turns CRUD and command intents into wire-ready requests and interprets the
//! replies. Depending on the configured server version, writes go out either
//! as acknowledged command documents or as legacy fire-and-forget opcodes.
//! The transport itself is supplied by the caller through [`Connection`].
//!
//! # Example
//!
//! ```no_run
//! use docdb_client::{Client, ClientConfig, Connection, UpdateOptions};
//! use docdb_common::doc;
//! # use async_trait::async_trait;
//! # use docdb_common::{Document, LegacyOp, QueryRequest};
//! # struct Session;
//! # impl Session {
//! #     async fn open(_addr: &str) -> docdb_common::Result<Self> { Ok(Session) }
//! # }
//! # #[async_trait]
//! # impl Connection for Session {
//! #     type Cursor = ();
//! #     fn default_database(&self) -> &str { "app" }
//! #     async fn submit_legacy_op(&self, _op: LegacyOp) -> docdb_common::Result<bool> {
//! #         Ok(true)
//! #     }
//! #     async fn read_one(
//! #         &self,
//! #         _database: Option<&str>,
//! #         _query: QueryRequest,
//! #     ) -> docdb_common::Result<Option<Document>> {
//! #         Ok(None)
//! #     }
//! #     async fn open_cursor(
//! #         &self,
//! #         _database: Option<&str>,
//! #         _query: QueryRequest,
//! #     ) -> docdb_common::Result<()> {
//! #         Ok(())
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> docdb_common::Result<()> {
//!     // Any transport implementing `Connection`
//!     let conn = Session::open("localhost:27017").await?;
//!     let client = Client::connect(conn, ClientConfig::load_from_path("docdb.toml")?);
//!
//!     let inserted = client.insert("users", doc! { "name" => "ada" }).await?;
//!     println!("ids: {:?}", inserted.inserted_ids());
//!
//!     client
//!         .update(
//!             "users",
//!             doc! { "name" => "ada" },
//!             doc! { "$set" => doc! { "lang" => "en" } },
//!             UpdateOptions::default(),
//!         )
//!         .await?;
//!
//!     let n = client.count("users", doc! {}, 0).await?;
//!     println!("{n} users");
//!
//!     client.disconnect().await
//! }
//! ```

use std::sync::Arc;

use docdb_common::{CollectionRef, DbError, Document, QueryRequest, Result};
use parking_lot::RwLock;

pub use command::Command;
pub use config::ClientConfig;
pub use connection::{Connection, SyncCommand};
pub use dispatch::{MODERN_PROTOCOL_VERSION, Protocol, ServerVersion};
pub use normalize::{CommandShape, IdGenerator, Input, ObjectIdGenerator};
pub use options::{FindOptions, IndexSpec, UpdateOptions};
pub use results::{InsertResult, WriteOutcome};

pub mod command;
pub mod config;
mod connection;
pub mod dispatch;
pub mod legacy;
pub mod normalize;
mod options;
pub mod reply;
mod results;


/// Entry point for every operation.
///
/// Holds the caller's connection handle, the identifier generator and the
/// client configuration. No other state is kept between calls; each operation
/// reads the configuration once, builds its request and performs a single
/// round trip.
pub struct Client<C: Connection, G: IdGenerator = ObjectIdGenerator> {
    conn: C,
    ids: G,
    config: Arc<RwLock<ClientConfig>>,
}

impl<C: Connection> Client<C> {
    /// Wrap an established connection.
    pub fn connect(conn: C, config: ClientConfig) -> Self {
        Self::with_id_generator(conn, config, ObjectIdGenerator)
    }
}

impl<C: Connection, G: IdGenerator> Client<C, G> {
    /// Wrap an established connection with a custom identifier source.
    pub fn with_id_generator(conn: C, config: ClientConfig, ids: G) -> Self {
        tracing::info!(
            "Client ready on database '{}' (server version {})",
            conn.default_database(),
            config.server_version
        );
        Self {
            conn,
            ids,
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Close the underlying connection.
    pub async fn disconnect(self) -> Result<()> {
        tracing::info!("Closing connection to '{}'", self.conn.default_database());
        self.conn.close().await
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        self.config.read().clone()
    }

    /// Change the server version; takes effect on the next operation.
    pub fn set_server_version(&self, version: ServerVersion) {
        self.config.write().server_version = version;
    }

    /// Protocol for the operation being started.
    pub fn protocol(&self) -> Protocol {
        dispatch::select_protocol(&self.config.read().server_version)
    }

    /// Normalize documents and assign missing identifiers.
    pub fn prepare(&self, input: impl Into<Input>) -> Result<Vec<Document>> {
        normalize::normalize(input, normalize::assign_id(&self.ids))
    }

    /// Insert one or more documents.
    ///
    /// The returned documents are the ones sent, with generated `_id`s.
    pub async fn insert(
        &self,
        collection: impl Into<CollectionRef>,
        documents: impl Into<Input>,
    ) -> Result<InsertResult> {
        self.insert_inner(collection.into(), documents.into(), None)
            .await
    }

    /// Insert with an explicit write concern. Fails under the legacy protocol.
    pub async fn insert_with_concern(
        &self,
        collection: impl Into<CollectionRef>,
        documents: impl Into<Input>,
        write_concern: Document,
    ) -> Result<InsertResult> {
        self.insert_inner(collection.into(), documents.into(), Some(write_concern))
            .await
    }

    async fn insert_inner(
        &self,
        collection: CollectionRef,
        documents: Input,
        write_concern: Option<Document>,
    ) -> Result<InsertResult> {
        let protocol = self.protocol();
        if write_concern.is_some() {
            dispatch::require_write_concern_support(protocol, "insert")?;
        }

        let documents = self.prepare(documents)?;
        if documents.is_empty() {
            return Err(DbError::Shape("insert needs at least one document".into()));
        }

        let outcome = match protocol {
            Protocol::Legacy => {
                self.submit_legacy(legacy::insert(&collection, documents.clone()))
                    .await
            }
            Protocol::Modern => {
                let cmd = command::insert(&collection, documents.clone(), write_concern.as_ref());
                WriteOutcome::acknowledged(self.run_command(cmd).await?)
            }
        };

        Ok(InsertResult { outcome, documents })
    }

    /// Update the documents matching `selector`.
    pub async fn update(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
        update: impl Into<Input>,
        options: UpdateOptions,
    ) -> Result<WriteOutcome> {
        self.update_inner(collection.into(), selector.into(), update.into(), options, None)
            .await
    }

    /// Update with an explicit write concern. Fails under the legacy protocol.
    pub async fn update_with_concern(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
        update: impl Into<Input>,
        options: UpdateOptions,
        write_concern: Document,
    ) -> Result<WriteOutcome> {
        self.update_inner(
            collection.into(),
            selector.into(),
            update.into(),
            options,
            Some(write_concern),
        )
        .await
    }

    async fn update_inner(
        &self,
        collection: CollectionRef,
        selector: Input,
        update: Input,
        options: UpdateOptions,
        write_concern: Option<Document>,
    ) -> Result<WriteOutcome> {
        let protocol = self.protocol();
        if write_concern.is_some() {
            dispatch::require_write_concern_support(protocol, "update")?;
        }

        let selector = normalize::single(selector, "update selector")?;
        let update = normalize::single(update, "update document")?;

        match protocol {
            Protocol::Legacy => Ok(self
                .submit_legacy(legacy::update(&collection, selector, update, options))
                .await),
            Protocol::Modern => {
                let cmd = command::update(
                    &collection,
                    selector,
                    update,
                    options,
                    write_concern.as_ref(),
                );
                Ok(WriteOutcome::acknowledged(self.run_command(cmd).await?))
            }
        }
    }

    /// Delete every document matching `selector`.
    pub async fn delete(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
    ) -> Result<WriteOutcome> {
        self.delete_inner(collection.into(), selector.into(), 0, None)
            .await
    }

    /// Delete at most one document matching `selector`.
    pub async fn delete_one(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
    ) -> Result<WriteOutcome> {
        self.delete_inner(collection.into(), selector.into(), 1, None)
            .await
    }

    /// Delete with an explicit limit: 0 removes every match, 1 at most one.
    pub async fn delete_limit(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
        limit: u32,
    ) -> Result<WriteOutcome> {
        self.delete_inner(collection.into(), selector.into(), limit, None)
            .await
    }

    /// Delete with a limit and a write concern. Fails under the legacy protocol.
    pub async fn delete_limit_with_concern(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
        limit: u32,
        write_concern: Document,
    ) -> Result<WriteOutcome> {
        self.delete_inner(collection.into(), selector.into(), limit, Some(write_concern))
            .await
    }

    async fn delete_inner(
        &self,
        collection: CollectionRef,
        selector: Input,
        limit: u32,
        write_concern: Option<Document>,
    ) -> Result<WriteOutcome> {
        let protocol = self.protocol();
        if write_concern.is_some() {
            dispatch::require_write_concern_support(protocol, "delete")?;
        }

        let selector = normalize::single(selector, "delete selector")?;

        match protocol {
            Protocol::Legacy => {
                let op = legacy::delete(&collection, selector, limit)?;
                Ok(self.submit_legacy(op).await)
            }
            Protocol::Modern => {
                let cmd = command::delete(&collection, selector, limit, write_concern.as_ref());
                Ok(WriteOutcome::acknowledged(self.run_command(cmd).await?))
            }
        }
    }

    /// Return the first document matching `selector`, if any.
    pub async fn find_one(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
        options: FindOptions,
    ) -> Result<Option<Document>> {
        let collection = collection.into();
        let query = Self::query_request(&collection, selector.into(), options)?;
        self.conn.read_one(collection.database(), query).await
    }

    /// Open a cursor over the documents matching `selector`.
    pub async fn find(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
        options: FindOptions,
    ) -> Result<C::Cursor> {
        let collection = collection.into();
        let query = Self::query_request(&collection, selector.into(), options)?;
        self.conn.open_cursor(collection.database(), query).await
    }

    fn query_request(
        collection: &CollectionRef,
        selector: Input,
        options: FindOptions,
    ) -> Result<QueryRequest> {
        let selector = normalize::single(selector, "query selector")?;
        Ok(QueryRequest {
            projector: options.projector,
            skip: options.skip,
            batchsize: options.batchsize,
            ..QueryRequest::new(collection.collection(), selector)
        })
    }

    /// Count matching documents; `limit <= 0` counts all of them.
    pub async fn count(
        &self,
        collection: impl Into<CollectionRef>,
        selector: impl Into<Input>,
        limit: i64,
    ) -> Result<i64> {
        let collection = collection.into();
        let selector = normalize::single(selector, "count selector")?;
        let cmd = command::count(&collection, selector, limit);

        match self.run_command(cmd).await? {
            (true, info) => reply::count_from_reply(&info),
            (false, info) => Err(reply::command_error(&info)),
        }
    }

    /// Create an index unless it already exists.
    pub async fn ensure_index(
        &self,
        collection: impl Into<CollectionRef>,
        index: IndexSpec,
    ) -> Result<WriteOutcome> {
        let collection = collection.into();
        if index.key.is_empty() {
            return Err(DbError::Shape("index key must name at least one field".into()));
        }

        match self.protocol() {
            Protocol::Legacy => {
                let ns = collection.namespace(self.conn.default_database());
                let op = legacy::create_index(&collection, index.to_document(Some(ns)));
                Ok(self.submit_legacy(op).await)
            }
            Protocol::Modern => {
                let cmd = command::create_indexes(&collection, index.to_document(None));
                Ok(WriteOutcome::acknowledged(self.run_command(cmd).await?))
            }
        }
    }

    /// Run a command against the connection's default database.
    pub async fn command(&self, command: impl Into<Input>) -> Result<(bool, Document)> {
        let document = normalize::single(command, "command")?;
        self.run_command(Command::new(None, document)).await
    }

    /// Run a command against an explicit database.
    pub async fn database_command(
        &self,
        database: &str,
        command: impl Into<Input>,
    ) -> Result<(bool, Document)> {
        let document = normalize::single(command, "command")?;
        self.run_command(Command::new(Some(database.to_string()), document))
            .await
    }

    async fn run_command(&self, cmd: Command) -> Result<(bool, Document)> {
        tracing::debug!(
            "Sending '{}' command to {}",
            cmd.name(),
            cmd.database.as_deref().unwrap_or(self.conn.default_database())
        );
        let reply = self
            .conn
            .submit_command(cmd.database.as_deref(), cmd.document.clone())
            .await?;
        Ok(reply::interpret(reply, &cmd.document))
    }

    async fn submit_legacy(&self, op: docdb_common::LegacyOp) -> WriteOutcome {
        tracing::debug!("Sending legacy {} to {}", op.name(), op.collection());
        let ack = self.conn.submit_legacy_op(op.clone()).await;
        legacy::outcome(&op, ack)
    }
}

/// Run a command synchronously over an in-process channel, bypassing the
/// async connection.
pub fn sync_command<S: SyncCommand>(
    socket: &mut S,
    database: &str,
    command: impl Into<Input>,
) -> Result<(bool, Document)> {
    let document = normalize::single(command, "command")?;
    tracing::debug!(
        "Sending '{}' command to {database} (sync)",
        document.first_key().unwrap_or_default()
    );
    let reply = socket.run_command(database, &document)?;
    Ok(reply::interpret(reply, &document))
}
