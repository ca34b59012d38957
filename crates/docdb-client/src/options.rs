//! Per-operation options for updates, reads and index creation.

use docdb_common::{DbError, Document, Result, Value};

/// Flags of a single update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert the update document when nothing matches.
    pub upsert: bool,
    /// Apply to every matching document instead of the first.
    pub multi: bool,
}

impl UpdateOptions {
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }
}

/// Request-shape options for `find` and `find_one`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub projector: Document,
    pub skip: i32,
    pub batchsize: i32,
}

impl FindOptions {
    pub fn projector(mut self, projector: Document) -> Self {
        self.projector = projector;
        self
    }

    pub fn skip(mut self, skip: i32) -> Self {
        self.skip = skip;
        self
    }

    pub fn batchsize(mut self, batchsize: i32) -> Self {
        self.batchsize = batchsize;
        self
    }
}

/// Options given as a map, e.g. `{projector: {...}, skip: 10}`.
impl TryFrom<&Document> for FindOptions {
    type Error = DbError;

    fn try_from(map: &Document) -> Result<Self> {
        let mut options = FindOptions::default();
        for (key, value) in map {
            match key.as_str() {
                "projector" => {
                    options.projector = value
                        .as_document()
                        .cloned()
                        .ok_or_else(|| shape_mismatch("projector", "document", value))?;
                }
                "skip" => options.skip = int_option("skip", value)?,
                "batchsize" => options.batchsize = int_option("batchsize", value)?,
                other => {
                    return Err(DbError::Shape(format!("unknown find option '{other}'")));
                }
            }
        }
        Ok(options)
    }
}

fn int_option(name: &str, value: &Value) -> Result<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| shape_mismatch(name, "32-bit integer", value))
}

fn shape_mismatch(name: &str, expected: &str, value: &Value) -> DbError {
    DbError::Shape(format!(
        "option '{name}' must be a {expected}, got {}",
        value.type_name()
    ))
}

/// Description of an index to create.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// Indexed fields and their direction or type, in order.
    pub key: Document,
    pub name: Option<String>,
    pub unique: bool,
    pub drop_dups: bool,
}

impl IndexSpec {
    pub fn new(key: Document) -> Self {
        Self {
            key,
            name: None,
            unique: false,
            drop_dups: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn drop_dups(mut self, drop_dups: bool) -> Self {
        self.drop_dups = drop_dups;
        self
    }

    /// Explicit name, or `field_direction` pairs joined with `_`
    /// (`{a: 1, b: -1}` becomes `a_1_b_-1`).
    pub fn index_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.key
            .iter()
            .map(|(field, order)| match order {
                Value::String(s) => format!("{field}_{s}"),
                other => format!("{field}_{other}"),
            })
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Wire form of the index description. `namespace` is only set for the
    /// legacy `system.indexes` insert.
    pub fn to_document(&self, namespace: Option<String>) -> Document {
        let mut doc = Document::new();
        doc.insert("key", self.key.clone());
        doc.insert("name", self.index_name());
        if let Some(ns) = namespace {
            doc.insert("ns", ns);
        }
        doc.insert("unique", self.unique);
        if self.drop_dups {
            doc.insert("dropDups", true);
        }
        doc
    }
}

/// Index given as a map with a mandatory `key` document.
impl TryFrom<&Document> for IndexSpec {
    type Error = DbError;

    fn try_from(map: &Document) -> Result<Self> {
        let key = map
            .get_document("key")
            .cloned()
            .ok_or_else(|| DbError::Shape("index spec needs a 'key' document".into()))?;
        if key.is_empty() {
            return Err(DbError::Shape("index key must name at least one field".into()));
        }

        let mut spec = IndexSpec::new(key);
        for (field, value) in map {
            match field.as_str() {
                "key" => {}
                "name" => {
                    spec.name = Some(
                        value
                            .as_string()
                            .cloned()
                            .ok_or_else(|| shape_mismatch("name", "string", value))?,
                    );
                }
                "unique" => {
                    spec.unique = value
                        .as_bool()
                        .ok_or_else(|| shape_mismatch("unique", "bool", value))?;
                }
                "dropDups" => {
                    spec.drop_dups = value
                        .as_bool()
                        .ok_or_else(|| shape_mismatch("dropDups", "bool", value))?;
                }
                other => {
                    return Err(DbError::Shape(format!("unknown index option '{other}'")));
                }
            }
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdb_common::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_options_from_map() {
        let options = FindOptions::try_from(&doc! {
            "projector" => doc! { "name" => 1 },
            "skip" => 10,
            "batchsize" => 100i64,
        })
        .unwrap();
        assert_eq!(
            options,
            FindOptions::default()
                .projector(doc! { "name" => 1 })
                .skip(10)
                .batchsize(100)
        );
    }

    #[test]
    fn test_find_options_reject_bad_shapes() {
        let unknown = FindOptions::try_from(&doc! { "limit" => 1 }).unwrap_err();
        assert_eq!(unknown.kind(), "shape_error");

        let wrong_type = FindOptions::try_from(&doc! { "skip" => "ten" }).unwrap_err();
        assert!(wrong_type.message().contains("skip"));

        let too_big = FindOptions::try_from(&doc! { "batchsize" => i64::MAX }).unwrap_err();
        assert_eq!(too_big.kind(), "shape_error");
    }

    #[test]
    fn test_index_name_generation() {
        let spec = IndexSpec::new(doc! { "a" => 1, "b" => -1 });
        assert_eq!(spec.index_name(), "a_1_b_-1");

        let text = IndexSpec::new(doc! { "body" => "text" });
        assert_eq!(text.index_name(), "body_text");

        let named = IndexSpec::new(doc! { "a" => 1 }).name("by_a");
        assert_eq!(named.index_name(), "by_a");
    }

    #[test]
    fn test_index_document() {
        let spec = IndexSpec::new(doc! { "email" => 1 }).unique(true);
        assert_eq!(
            spec.to_document(None),
            doc! { "key" => doc! { "email" => 1 }, "name" => "email_1", "unique" => true }
        );
        assert_eq!(
            spec.drop_dups(true).to_document(Some("app.users".into())),
            doc! {
                "key" => doc! { "email" => 1 },
                "name" => "email_1",
                "ns" => "app.users",
                "unique" => true,
                "dropDups" => true,
            }
        );
    }

    #[test]
    fn test_index_spec_from_map() {
        let spec = IndexSpec::try_from(&doc! {
            "key" => doc! { "age" => -1 },
            "unique" => true,
        })
        .unwrap();
        assert_eq!(spec, IndexSpec::new(doc! { "age" => -1 }).unique(true));

        assert!(IndexSpec::try_from(&doc! { "name" => "x" }).is_err());
        assert!(IndexSpec::try_from(&doc! { "key" => doc! {} }).is_err());
        assert!(
            IndexSpec::try_from(&doc! { "key" => doc! { "a" => 1 }, "sparse" => true }).is_err()
        );
    }
}
