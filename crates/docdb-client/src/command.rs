//! Command documents for servers that acknowledge writes.
//!
//! Every builder is a pure function of its arguments. Field order is fixed:
//! the directive comes first, `writeConcern` (when given) last.

use docdb_common::{CollectionRef, Document, Value};

use crate::options::UpdateOptions;

/// A command document together with the database it is submitted against.
///
/// `database: None` leaves the choice to the connection's default database.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub database: Option<String>,
    pub document: Document,
}

impl Command {
    pub fn new(database: Option<String>, document: Document) -> Self {
        Self { database, document }
    }

    fn scoped(collection: &CollectionRef, document: Document) -> Self {
        Self::new(collection.database().map(str::to_string), document)
    }

    /// The directive, i.e. the first field name.
    pub fn name(&self) -> &str {
        self.document.first_key().unwrap_or_default()
    }
}

fn with_write_concern(mut document: Document, write_concern: Option<&Document>) -> Document {
    if let Some(wc) = write_concern {
        document.insert("writeConcern", wc.clone());
    }
    document
}

/// `{insert: coll, documents: [...], writeConcern?}`
pub fn insert(
    collection: &CollectionRef,
    documents: Vec<Document>,
    write_concern: Option<&Document>,
) -> Command {
    let mut cmd = Document::new();
    cmd.insert("insert", collection.collection());
    cmd.insert("documents", Value::from(documents));
    Command::scoped(collection, with_write_concern(cmd, write_concern))
}

/// `{update: coll, updates: [{q, u, upsert, multi}], writeConcern?}`
///
/// One selector per call; batching several update specs is not offered.
pub fn update(
    collection: &CollectionRef,
    selector: Document,
    update: Document,
    options: UpdateOptions,
    write_concern: Option<&Document>,
) -> Command {
    let mut spec = Document::new();
    spec.insert("q", selector);
    spec.insert("u", update);
    spec.insert("upsert", options.upsert);
    spec.insert("multi", options.multi);

    let mut cmd = Document::new();
    cmd.insert("update", collection.collection());
    cmd.insert("updates", vec![spec]);
    Command::scoped(collection, with_write_concern(cmd, write_concern))
}

/// `{delete: coll, deletes: [{q, limit}], writeConcern?}`
///
/// `limit` 0 removes every match, 1 at most one.
pub fn delete(
    collection: &CollectionRef,
    selector: Document,
    limit: u32,
    write_concern: Option<&Document>,
) -> Command {
    let mut spec = Document::new();
    spec.insert("q", selector);
    spec.insert("limit", limit);

    let mut cmd = Document::new();
    cmd.insert("delete", collection.collection());
    cmd.insert("deletes", vec![spec]);
    Command::scoped(collection, with_write_concern(cmd, write_concern))
}

/// `{count: coll, query: selector, limit?}`
///
/// A limit of zero or less means unbounded and is left out entirely.
pub fn count(collection: &CollectionRef, selector: Document, limit: i64) -> Command {
    let mut cmd = Document::new();
    cmd.insert("count", collection.collection());
    cmd.insert("query", selector);
    if limit > 0 {
        cmd.insert("limit", limit);
    }
    Command::scoped(collection, cmd)
}

/// `{createIndexes: coll, indexes: [index]}`
pub fn create_indexes(collection: &CollectionRef, index: Document) -> Command {
    let mut cmd = Document::new();
    cmd.insert("createIndexes", collection.collection());
    cmd.insert("indexes", vec![index]);
    Command::scoped(collection, cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdb_common::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_command() {
        let users = CollectionRef::from("users");
        let cmd = insert(&users, vec![doc! { "_id" => 1, "name" => "ada" }], None);
        assert_eq!(cmd.database, None);
        assert_eq!(cmd.name(), "insert");
        assert_eq!(
            cmd.document,
            doc! {
                "insert" => "users",
                "documents" => vec![doc! { "_id" => 1, "name" => "ada" }],
            }
        );
    }

    #[test]
    fn test_write_concern_is_last() {
        let wc = doc! { "w" => "majority", "wtimeout" => 500 };
        let cmd = insert(&CollectionRef::from("users"), vec![doc! { "a" => 1 }], Some(&wc));
        assert_eq!(
            cmd.document.keys().collect::<Vec<_>>(),
            vec!["insert", "documents", "writeConcern"]
        );
        assert_eq!(cmd.document.get_document("writeConcern"), Some(&wc));
    }

    #[test]
    fn test_explicit_database_scopes_command() {
        let cmd = count(&CollectionRef::from(("audit", "events")), doc! {}, 0);
        assert_eq!(cmd.database.as_deref(), Some("audit"));
        assert_eq!(cmd.document.get_str("count"), Some("events"));
    }

    #[test]
    fn test_update_command() {
        let cmd = update(
            &CollectionRef::from("users"),
            doc! { "name" => "ada" },
            doc! { "$set" => doc! { "lang" => "en" } },
            UpdateOptions::default().upsert(true),
            None,
        );
        assert_eq!(
            cmd.document,
            doc! {
                "update" => "users",
                "updates" => vec![doc! {
                    "q" => doc! { "name" => "ada" },
                    "u" => doc! { "$set" => doc! { "lang" => "en" } },
                    "upsert" => true,
                    "multi" => false,
                }],
            }
        );
    }

    #[test]
    fn test_delete_command() {
        let cmd = delete(&CollectionRef::from("users"), doc! { "age" => 30 }, 1, None);
        assert_eq!(
            cmd.document,
            doc! {
                "delete" => "users",
                "deletes" => vec![doc! { "q" => doc! { "age" => 30 }, "limit" => 1 }],
            }
        );
    }

    #[test]
    fn test_count_limit_omitted_when_unbounded() {
        let users = CollectionRef::from("users");
        let unbounded = count(&users, doc! {}, 0);
        assert_eq!(unbounded.document, doc! { "count" => "users", "query" => doc! {} });
        assert!(!count(&users, doc! {}, -3).document.contains_key("limit"));

        let bounded = count(&users, doc! {}, 5);
        assert_eq!(bounded.document.get("limit"), Some(&Value::Int64(5)));
    }

    #[test]
    fn test_builders_are_deterministic() {
        let users = CollectionRef::from("users");
        let a = delete(&users, doc! { "x" => 1 }, 0, Some(&doc! { "w" => 1 }));
        let b = delete(&users, doc! { "x" => 1 }, 0, Some(&doc! { "w" => 1 }));
        assert_eq!(a, b);
        assert_eq!(a.document.to_json(), b.document.to_json());
    }

    #[test]
    fn test_rendered_command_keeps_field_order() {
        let cmd = insert(
            &CollectionRef::from("users"),
            vec![doc! { "name" => "ada", "_id" => 7 }],
            Some(&doc! { "w" => 1 }),
        );
        assert_eq!(
            cmd.document.to_json().to_string(),
            r#"{"insert":"users","documents":[{"name":"ada","_id":7}],"writeConcern":{"w":1}}"#
        );
        assert_ne!(
            cmd.document,
            doc! {
                "documents" => vec![doc! { "name" => "ada", "_id" => 7 }],
                "insert" => "users",
                "writeConcern" => doc! { "w" => 1 },
            }
        );
    }

    #[test]
    fn test_create_indexes_command() {
        let cmd = create_indexes(
            &CollectionRef::from("users"),
            doc! { "key" => doc! { "email" => 1 }, "name" => "email_1" },
        );
        assert_eq!(cmd.name(), "createIndexes");
        assert_eq!(cmd.document.get("indexes").and_then(Value::as_array).map(Vec::len), Some(1));
    }
}
