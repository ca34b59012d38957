//! Interpretation of raw command replies.

use docdb_common::{DbError, Document, Result, Value};

const WRITE_DIRECTIVES: [&str; 3] = ["insert", "update", "delete"];
const WRITE_ERRORS: &str = "writeErrors";
const WRITE_CONCERN_ERROR: &str = "writeConcernError";

/// Split a reply into its success flag and the remaining fields.
///
/// `ok` counts as success when it is `true` or numerically 1; a missing `ok`
/// is a failure. Replies to write commands additionally fail when they report
/// `writeErrors` or a `writeConcernError`, which servers send alongside
/// `ok: 1`.
pub fn interpret(mut reply: Document, command: &Document) -> (bool, Document) {
    let ok = reply.remove("ok").as_ref().is_some_and(ok_flag);

    let write_failed = is_write_command(command)
        && (reply.contains_key(WRITE_ERRORS) || reply.contains_key(WRITE_CONCERN_ERROR));

    (ok && !write_failed, reply)
}

fn ok_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => other.as_number() == Some(1.0),
    }
}

fn is_write_command(command: &Document) -> bool {
    command
        .first_key()
        .is_some_and(|directive| WRITE_DIRECTIVES.contains(&directive))
}

/// Build a [`DbError::Command`] from the info of a failed reply.
///
/// Prefers the top-level `errmsg`/`code`, then the first write error, then the
/// write concern error.
pub fn command_error(info: &Document) -> DbError {
    let source = if info.contains_key("errmsg") {
        Some(info)
    } else {
        info.get(WRITE_ERRORS)
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(Value::as_document)
            .or_else(|| info.get_document(WRITE_CONCERN_ERROR))
    };

    let message = source
        .and_then(|doc| doc.get_str("errmsg"))
        .unwrap_or("command failed without an error message")
        .to_string();
    let code = source
        .and_then(|doc| doc.get("code"))
        .and_then(Value::as_number)
        .map(|n| n as i64)
        .unwrap_or(0);

    DbError::Command { code, message }
}

/// Interpret a reply and turn a failure into an error.
pub fn expect_ok(reply: Document, command: &Document) -> Result<Document> {
    match interpret(reply, command) {
        (true, info) => Ok(info),
        (false, info) => Err(command_error(&info)),
    }
}

/// Read `n` from a count reply, truncating fractional counts toward zero.
pub fn count_from_reply(info: &Document) -> Result<i64> {
    match info.get("n") {
        Some(value) => value
            .as_number()
            .map(|n| n.trunc() as i64)
            .ok_or_else(|| DbError::TypeError {
                expected: "number".into(),
                actual: value.type_name().into(),
            }),
        None => Err(DbError::TypeError {
            expected: "count reply with field 'n'".into(),
            actual: "missing".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docdb_common::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ok_reply() {
        let command = doc! { "insert" => "users", "documents" => Vec::<Value>::new() };
        let (ok, info) = interpret(doc! { "ok" => 1.0, "n" => 2 }, &command);
        assert!(ok);
        assert_eq!(info, doc! { "n" => 2 });
    }

    #[test]
    fn test_ok_flag_forms() {
        let ping = doc! { "ping" => 1 };
        assert!(interpret(doc! { "ok" => 1 }, &ping).0);
        assert!(interpret(doc! { "ok" => 1i64 }, &ping).0);
        assert!(interpret(doc! { "ok" => true }, &ping).0);
        assert!(!interpret(doc! { "ok" => 0 }, &ping).0);
        assert!(!interpret(doc! { "ok" => false }, &ping).0);
        assert!(!interpret(doc! { "ok" => "1" }, &ping).0);
        assert!(!interpret(doc! { "pong" => 1 }, &ping).0);
    }

    #[test]
    fn test_failed_reply_keeps_error_fields() {
        let (ok, info) = interpret(
            doc! { "ok" => 0, "errmsg" => "no such command", "code" => 59 },
            &doc! { "frobnicate" => 1 },
        );
        assert!(!ok);
        assert_eq!(info, doc! { "errmsg" => "no such command", "code" => 59 });
        assert_eq!(
            command_error(&info),
            DbError::Command {
                code: 59,
                message: "no such command".into()
            }
        );
    }

    #[test]
    fn test_write_errors_fail_write_commands() {
        let write_error = doc! { "index" => 0, "code" => 11000, "errmsg" => "duplicate key" };
        let reply = doc! {
            "ok" => 1,
            "n" => 0,
            "writeErrors" => vec![Value::from(write_error)],
        };

        let (ok, info) = interpret(reply.clone(), &doc! { "insert" => "users" });
        assert!(!ok);
        assert_eq!(
            command_error(&info),
            DbError::Command {
                code: 11000,
                message: "duplicate key".into()
            }
        );

        // Same fields on a non-write command carry no special meaning.
        let (ok, _) = interpret(reply, &doc! { "aggregate" => "users" });
        assert!(ok);
    }

    #[test]
    fn test_write_concern_error_fails_write() {
        let reply = doc! {
            "ok" => 1,
            "n" => 1,
            "writeConcernError" => doc! {
                "code" => 64,
                "errmsg" => "waiting for replication timed out",
            },
        };
        let err = expect_ok(reply, &doc! { "delete" => "users" }).unwrap_err();
        assert_eq!(
            err,
            DbError::Command {
                code: 64,
                message: "waiting for replication timed out".into()
            }
        );
    }

    #[test]
    fn test_count_truncates() {
        assert_eq!(count_from_reply(&doc! { "n" => 7.9 }).unwrap(), 7);
        assert_eq!(count_from_reply(&doc! { "n" => 7 }).unwrap(), 7);
        assert_eq!(count_from_reply(&doc! { "n" => 12i64 }).unwrap(), 12);
        assert_eq!(count_from_reply(&doc! { "n" => -0.5 }).unwrap(), 0);
        assert_eq!(
            count_from_reply(&doc! { "n" => "7" }).unwrap_err().kind(),
            "type_error"
        );
        assert!(count_from_reply(&doc! {}).is_err());
    }
}
