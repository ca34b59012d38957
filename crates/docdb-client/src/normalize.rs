//! Input normalization and identity assignment.
//!
//! Callers hand over documents in several shapes. Everything is resolved here
//! into an ordered sequence of canonical documents before any command is
//! built, so builders only ever see `Vec<Document>`.

use docdb_common::{DbError, Document, ID_FIELD, ObjectId, Result, Value};
use indexmap::IndexMap;

/// Source of identifiers for documents inserted without one.
///
/// Implementations are shared between concurrent callers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Result<ObjectId>;
}

/// Default generator backed by [`ObjectId::new`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdGenerator;

impl IdGenerator for ObjectIdGenerator {
    fn next_id(&self) -> Result<ObjectId> {
        ObjectId::new()
    }
}

/// Accepted caller input shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Document(Document),
    /// Ordinary key/value list, converted to a document before classification.
    Pairs(Vec<(String, Value)>),
    /// A sequence of single documents or key/value lists.
    Many(Vec<Input>),
}

impl From<Document> for Input {
    fn from(value: Document) -> Self {
        Input::Document(value)
    }
}

impl From<&Document> for Input {
    fn from(value: &Document) -> Self {
        Input::Document(value.clone())
    }
}

impl From<Vec<Document>> for Input {
    fn from(value: Vec<Document>) -> Self {
        Input::Many(value.into_iter().map(Input::Document).collect())
    }
}

impl From<Vec<Input>> for Input {
    fn from(value: Vec<Input>) -> Self {
        Input::Many(value)
    }
}

impl From<IndexMap<String, Value>> for Input {
    fn from(value: IndexMap<String, Value>) -> Self {
        Input::Document(value.into())
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Input {
    fn from(value: Vec<(K, V)>) -> Self {
        Input::Pairs(value.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Input {
    fn from(value: [(K, V); N]) -> Self {
        Input::Pairs(value.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Classification of a single canonical document.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandShape {
    /// Led by a `$` directive; forwarded untouched.
    RawCommand(Document),
    /// Ordinary fields; eligible for identity assignment.
    DataDocument(Document),
}

impl CommandShape {
    pub fn classify(document: Document) -> Self {
        if is_raw_command(&document) {
            CommandShape::RawCommand(document)
        } else {
            CommandShape::DataDocument(document)
        }
    }
}

/// A lone `$` key, or a `$` directive in first position.
///
/// The first key decides both cases, since a single-key document's only key is
/// also its first.
pub fn is_raw_command(document: &Document) -> bool {
    document.first_key().is_some_and(|key| key.starts_with('$'))
}

/// Resolve `input` into canonical documents, running `assign` on each data
/// document.
///
/// A single input yields a one-element sequence. Raw commands are returned
/// as-is and never reach `assign`.
pub fn normalize<F>(input: impl Into<Input>, mut assign: F) -> Result<Vec<Document>>
where
    F: FnMut(Document) -> Result<Document>,
{
    match input.into() {
        Input::Many(items) => items
            .into_iter()
            .map(|item| normalize_one(item, &mut assign))
            .collect(),
        single => Ok(vec![normalize_one(single, &mut assign)?]),
    }
}

fn normalize_one<F>(input: Input, assign: &mut F) -> Result<Document>
where
    F: FnMut(Document) -> Result<Document>,
{
    let document = match input {
        Input::Document(document) => document,
        Input::Pairs(pairs) => Document::try_from_pairs(pairs)?,
        Input::Many(_) => {
            return Err(DbError::Shape(
                "nested sequences are not documents; flatten the input first".into(),
            ));
        }
    };

    match CommandShape::classify(document) {
        CommandShape::RawCommand(document) => Ok(document),
        CommandShape::DataDocument(document) => assign(document),
    }
}

/// Identity assigner that leaves documents untouched.
pub fn keep(document: Document) -> Result<Document> {
    Ok(document)
}

/// Identity assigner that adds `_id` to documents lacking one.
///
/// The generated id goes in first position; the remaining fields keep their
/// order. Documents that already carry `_id` are returned unchanged, so running
/// it twice never reassigns.
pub fn assign_id<G: IdGenerator + ?Sized>(
    generator: &G,
) -> impl FnMut(Document) -> Result<Document> + '_ {
    move |mut document| {
        if !document.contains_key(ID_FIELD) {
            document.insert_first(ID_FIELD, generator.next_id()?);
        }
        Ok(document)
    }
}

/// Normalize without assignment and require exactly one document.
pub fn single(input: impl Into<Input>, what: &str) -> Result<Document> {
    let mut documents = normalize(input, keep)?;
    match documents.len() {
        1 => Ok(documents.remove(0)),
        n => Err(DbError::Shape(format!("{what} must be a single document, got {n}"))),
    }
}
