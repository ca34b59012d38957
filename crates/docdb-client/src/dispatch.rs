//! Protocol generation selection.
//!
//! Servers older than 2.6 only understand the acknowledgement-free write
//! opcodes; from 2.6 on, writes are issued as commands that return a reply.

use std::str::FromStr;

use docdb_common::{DbError, Result};
use serde::{Deserialize, Serialize};

/// First server version that accepts write commands.
pub const MODERN_PROTOCOL_VERSION: ServerVersion = ServerVersion::new(2, 6, 0);

/// An ordered `major.minor[.patch]` server version.
///
/// Deserializes from a string (`"2.6.3"`) or a bare number (`2.4`, `3`).
/// A bare float cannot tell `2.10` from `2.1`, so two-digit minors must be
/// quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawVersion", into = "String")]
pub struct ServerVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }
}

impl Default for ServerVersion {
    fn default() -> Self {
        ServerVersion::new(3, 0, 0)
    }
}

impl FromStr for ServerVersion {
    type Err = DbError;

    /// Parse `"2.6"`, `"3.4.1"` or `"4.0.0-rc1"`; pre-release suffixes are ignored.
    fn from_str(s: &str) -> Result<Self> {
        let core = s.trim().split(['-', '+']).next().unwrap_or_default();
        let mut parts = [0u32; 3];
        let mut count = 0;

        for part in core.split('.') {
            if count == parts.len() {
                return Err(DbError::Parse(format!("Invalid server version '{s}'")));
            }
            parts[count] = part
                .parse()
                .map_err(|_| DbError::Parse(format!("Invalid server version '{s}'")))?;
            count += 1;
        }

        if count < 2 {
            return Err(DbError::Parse(format!(
                "Server version '{s}' needs at least major.minor"
            )));
        }

        Ok(ServerVersion::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for ServerVersion {
    type Error = DbError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Spellings accepted in configuration files.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVersion {
    Text(String),
    Major(u32),
    Number(f64),
}

impl TryFrom<RawVersion> for ServerVersion {
    type Error = DbError;

    fn try_from(value: RawVersion) -> Result<Self> {
        match value {
            RawVersion::Text(s) => s.parse(),
            RawVersion::Major(major) => Ok(ServerVersion::new(major, 0, 0)),
            RawVersion::Number(n) if n.is_finite() && n >= 0.0 => {
                let text = n.to_string();
                if text.contains('.') {
                    text.parse()
                } else {
                    format!("{text}.0").parse()
                }
            }
            RawVersion::Number(n) => Err(DbError::Parse(format!("Invalid server version '{n}'"))),
        }
    }
}

impl From<ServerVersion> for String {
    fn from(value: ServerVersion) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Wire protocol generation used for a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Fire-and-forget opcodes, success means "sent".
    Legacy,
    /// Ack-bearing command documents.
    Modern,
}

pub fn use_legacy(version: &ServerVersion) -> bool {
    *version < MODERN_PROTOCOL_VERSION
}

pub fn select_protocol(version: &ServerVersion) -> Protocol {
    if use_legacy(version) {
        Protocol::Legacy
    } else {
        Protocol::Modern
    }
}

/// Reject a write concern that the legacy opcodes have no channel for.
pub fn require_write_concern_support(protocol: Protocol, operation: &str) -> Result<()> {
    match protocol {
        Protocol::Modern => Ok(()),
        Protocol::Legacy => Err(DbError::Unsupported(format!(
            "{operation} with a write concern requires server version {MODERN_PROTOCOL_VERSION} or newer"
        ))),
    }
}
