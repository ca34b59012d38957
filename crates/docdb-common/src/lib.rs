//! Common library for docdb
//!
//! This crate provides the data model shared by every docdb layer: ordered
//! documents, dynamically typed values, generated identifiers, and the request
//! shapes handed to external transports.
//!
//! Modules:
//! * `error`: Defines error types and handling.
//! * `document`: Ordered documents and the `doc!` macro.
//! * `protocol`: Collection references and transport request shapes.
//! * `value`: Field values and `ObjectId`.

pub mod document;
pub mod error;
pub mod protocol;
pub mod value;

// Re-export commonly used types at the base
pub use document::Document;
pub use error::*;
pub use protocol::{CollectionRef, LegacyOp, QueryRequest};
pub use value::{ObjectId, Value};

/// Field holding a document's unique identity.
pub const ID_FIELD: &str = "_id";

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
