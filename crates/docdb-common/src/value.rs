use std::{
    borrow::Cow,
    sync::{OnceLock, atomic::AtomicU32},
};

use rand::{TryRngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::{DbError, Document, Result};

/// A dynamically typed field value exchanged with the server.
///
/// Variants
/// * Primitive types: Null, Bool, Int32, Int64, Float64, String, Binary
/// * Identifiers: ObjectId
/// * Collection types: Array, Document (nested, ordered)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    // Primitive types
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    Binary(Vec<u8>),

    // Identifiers
    ObjectId(ObjectId),

    // Collection types
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Get the type name as a string
    ///
    /// # Example
    /// ```rust
    /// use docdb_common::Value;
    ///
    /// assert_eq!(Value::Int32(42).type_name(), "int32");
    /// assert_eq!(Value::from("hello").type_name(), "string");
    /// ```
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("null"),
            Value::Bool(_) => Cow::Borrowed("bool"),
            Value::Int32(_) => Cow::Borrowed("int32"),
            Value::Int64(_) => Cow::Borrowed("int64"),
            Value::Float64(_) => Cow::Borrowed("float64"),
            Value::String(_) => Cow::Borrowed("string"),
            Value::Binary(_) => Cow::Borrowed("binary"),
            Value::ObjectId(_) => Cow::Borrowed("objectid"),
            Value::Array(_) => Cow::Borrowed("array"),
            Value::Document(_) => Cow::Borrowed("document"),
        }
    }

    /// Render the value as JSON, mainly for diagnostics and logging.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int32(i) => serde_json::Value::from(*i),
            Value::Int64(i) => serde_json::Value::from(*i),
            Value::Float64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Binary(b) => serde_json::Value::String(hex::encode(b)),
            Value::ObjectId(oid) => serde_json::json!({ "$oid": oid.to_hex() }),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Document(doc) => doc.to_json(),
        }
    }

    /// Extract the array from Value::Array, returning None if not an array
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Extract the string from Value::String, returning None if not a string
    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the integer from Value::Int64 or Value::Int32
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            Value::Int32(i) => Some(*i as i64),
            _ => None,
        }
    }

    /// Extract the boolean from Value::Bool, returning None if not a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Widen any numeric variant to f64.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int32(i) => Some(*i as f64),
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract the nested document from Value::Document
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Extract the nested document, consuming the value
    pub fn into_document(self) -> Option<Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Value::ObjectId(oid) => Some(oid),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        if value <= i32::MAX as u32 {
            Value::Int32(value as i32)
        } else {
            Value::Int64(value as i64)
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::ObjectId(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Binary(b) => write!(f, "0x{}", hex::encode(b)),
            Value::ObjectId(oid) => write!(f, "ObjectId(\"{}\")", oid),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Document(doc) => write!(f, "{}", doc),
        }
    }
}

/// 12-byte unique identifier assigned to documents that arrive without one.
///
/// Layout: 4-byte big-endian timestamp (seconds), 3-byte machine hash,
/// 2-byte process id, 3-byte counter seeded from the OS RNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generate a new ObjectId
    ///
    /// Safe to call from many threads at once; the counter is atomic.
    ///
    /// # Example
    /// ```rust
    /// use docdb_common::ObjectId;
    ///
    /// let oid = ObjectId::new().unwrap();
    /// assert_eq!(oid.to_hex().len(), 24);
    /// ```
    pub fn new() -> Result<Self> {
        static MACHINE_BYTES: OnceLock<[u8; 3]> = OnceLock::new();
        static PROCESS_BYTES: OnceLock<[u8; 2]> = OnceLock::new();
        static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

        let mut bytes = [0u8; 12];

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| DbError::Io(format!("System time error: {e}")))?
            .as_secs() as u32;
        bytes[0..4].copy_from_slice(&timestamp.to_be_bytes());

        let machine_bytes = MACHINE_BYTES.get_or_init(|| {
            let mut hasher = Sha1::new();

            if let Ok(hostname) = std::env::var("HOSTNAME") {
                hasher.update(hostname.as_bytes());
            } else if let Ok(hostname) = std::env::var("COMPUTERNAME") {
                hasher.update(hostname.as_bytes());
            } else {
                hasher.update(std::process::id().to_be_bytes());
                hasher.update(b"docdb_fallback_id");
            }

            let hash = hasher.finalize();
            [hash[0], hash[1], hash[2]]
        });
        bytes[4..7].copy_from_slice(machine_bytes);

        let process_bytes = PROCESS_BYTES.get_or_init(|| {
            let pid = std::process::id();
            [((pid >> 8) & 0xFF) as u8, (pid & 0xFF) as u8]
        });
        bytes[7..9].copy_from_slice(process_bytes);

        let counter_atomic = COUNTER.get_or_init(|| {
            let mut rng = OsRng;
            let mut random_bytes = [0u8; 4];

            if rng.try_fill_bytes(&mut random_bytes).is_ok() {
                AtomicU32::new(u32::from_be_bytes(random_bytes) & 0xFFFFFF)
            } else {
                AtomicU32::new((std::process::id() ^ 0xDEADBEEF) & 0xFFFFFF)
            }
        });

        let counter = counter_atomic.fetch_add(1, std::sync::atomic::Ordering::SeqCst) & 0xFFFFFF;
        bytes[9] = ((counter >> 16) & 0xFF) as u8;
        bytes[10] = ((counter >> 8) & 0xFF) as u8;
        bytes[11] = (counter & 0xFF) as u8;

        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Seconds since the Unix epoch at which the identifier was generated.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != 24 {
            return Err(DbError::Parse("Invalid ObjectId hex string".into()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| DbError::Parse("Invalid ObjectId hex string".into()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_is_24_hex_chars() {
        let oid = ObjectId::new().unwrap();
        let hex = oid.to_hex();
        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ObjectId::from_hex(&hex).unwrap(), oid);
    }

    #[test]
    fn test_object_ids_are_unique() {
        let mut ids: Vec<ObjectId> = (0..256).map(|_| ObjectId::new().unwrap()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn test_object_id_timestamp() {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;
        let oid = ObjectId::new().unwrap();
        assert!(oid.timestamp() >= now.saturating_sub(1));
        assert!(oid.timestamp() <= now + 1);
    }

    #[test]
    fn test_object_id_rejects_bad_hex() {
        assert!(ObjectId::from_hex("abc").is_err());
        assert!(ObjectId::from_hex("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(ObjectId::from_hex("0123456789abcdef01234567").is_ok());
    }

    #[test]
    fn test_as_number_widens() {
        assert_eq!(Value::Int32(7).as_number(), Some(7.0));
        assert_eq!(Value::Int64(-3).as_number(), Some(-3.0));
        assert_eq!(Value::Float64(7.9).as_number(), Some(7.9));
        assert_eq!(Value::from("7").as_number(), None);
    }

    #[test]
    fn test_to_json_object_id() {
        let oid = ObjectId::from_hex("0123456789abcdef01234567").unwrap();
        assert_eq!(
            Value::ObjectId(oid).to_json(),
            serde_json::json!({ "$oid": "0123456789abcdef01234567" })
        );
    }
}
