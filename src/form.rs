//! Request field maps and their encodings.
//!
//! A [`Fields`] map is what callers hand to the verb helpers, both for query
//! parameters and for request bodies. Every value is classified once, when it
//! is inserted, into a [`FieldValue`]: a primitive, a keyed object, or a
//! file-like value. The encoders below branch on that tag only.

use crate::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// File name given to blob parts, matching what browsers send.
pub const BLOB_FILE_NAME: &str = "blob";

/// A single named file with its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// The file name sent in the part's `Content-Disposition`.
    pub name: String,
    /// The MIME type, if known.
    pub mime: Option<String>,
    /// The file contents.
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Creates a file with no MIME type.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    /// Sets the MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Raw binary data without a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// The MIME type, if known.
    pub mime: Option<String>,
    /// The data.
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Creates a blob with no MIME type.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            mime: None,
            bytes: bytes.into(),
        }
    }

    /// Sets the MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// A value that can only travel as a binary multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLike {
    /// One named file.
    File(FilePart),
    /// Several files under one field name.
    FileList(Vec<FilePart>),
    /// Anonymous binary data.
    Blob(Blob),
}

/// The kind of a request field, decided when the field is created.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A string, number, boolean, null or array.
    Primitive(Value),
    /// A keyed structure. Stringified to JSON before a POST body is sent.
    Object(Map<String, Value>),
    /// A file, file list or blob.
    File(FileLike),
}

impl FieldValue {
    /// Returns `true` if this field forces multipart encoding.
    pub fn is_file(&self) -> bool {
        matches!(self, FieldValue::File(_))
    }

    /// Returns the JSON value of a non-file field.
    pub fn as_json(&self) -> Option<Value> {
        match self {
            FieldValue::Primitive(value) => Some(value.clone()),
            FieldValue::Object(map) => Some(Value::Object(map.clone())),
            FieldValue::File(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => FieldValue::Object(map),
            other => FieldValue::Primitive(other),
        }
    }
}

impl From<Map<String, Value>> for FieldValue {
    fn from(map: Map<String, Value>) -> Self {
        FieldValue::Object(map)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Primitive(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Primitive(Value::String(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Primitive(Value::Bool(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Primitive(Value::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Primitive(Value::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Primitive(Value::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Primitive(Value::from(value))
    }
}

impl From<FileLike> for FieldValue {
    fn from(value: FileLike) -> Self {
        FieldValue::File(value)
    }
}

impl From<FilePart> for FieldValue {
    fn from(value: FilePart) -> Self {
        FieldValue::File(FileLike::File(value))
    }
}

impl From<Vec<FilePart>> for FieldValue {
    fn from(value: Vec<FilePart>) -> Self {
        FieldValue::File(FileLike::FileList(value))
    }
}

impl From<Blob> for FieldValue {
    fn from(value: Blob) -> Self {
        FieldValue::File(FileLike::Blob(value))
    }
}

/// An insertion-ordered map of request fields.
///
/// Order is preserved so that multipart parts go out in the order the
/// caller supplied them.
///
/// # Examples
///
/// ```
/// use todolist_client::{Fields, FilePart};
/// use serde_json::json;
///
/// let fields = Fields::new()
///     .with("title", "groceries")
///     .with("meta", json!({ "color": "red" }))
///     .with("cover", FilePart::new("cover.png", vec![0x89, 0x50]));
///
/// assert_eq!(fields.len(), 3);
/// assert!(fields.has_file());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: IndexMap<String, FieldValue>,
}

impl Fields {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a field map from any serializable struct or map.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not serialize to a JSON object.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self::from(map)),
            Ok(other) => Err(Error::SerializationFailed(format!(
                "expected a JSON object, got {}",
                other
            ))),
            Err(e) => Err(Error::SerializationFailed(e.to_string())),
        }
    }

    /// Adds a field, returning the map for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a field. An existing field with the same key keeps its
    /// position and has its value replaced; the old value is returned.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value of a field.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    /// Iterates over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates mutably over field values in insertion order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut FieldValue> {
        self.entries.values_mut()
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if any field is file-like.
    pub fn has_file(&self) -> bool {
        self.entries.values().any(FieldValue::is_file)
    }

    /// Encodes the fields as a JSON object.
    ///
    /// # Errors
    ///
    /// File-like values have no JSON form and are refused.
    pub fn to_json(&self) -> Result<Value> {
        let mut map = Map::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            let json = value.as_json().ok_or_else(|| {
                Error::SerializationFailed(format!(
                    "field `{}` holds a file; only POST bodies are sent as multipart",
                    key
                ))
            })?;
            map.insert(key.clone(), json);
        }
        Ok(Value::Object(map))
    }

    /// Encodes the fields as query string pairs.
    ///
    /// Nulls are skipped, arrays become repeated `key[]` pairs and objects
    /// are sent as JSON text.
    ///
    /// # Errors
    ///
    /// File-like values cannot be placed in a query string.
    ///
    /// # Examples
    ///
    /// ```
    /// use todolist_client::Fields;
    /// use serde_json::json;
    ///
    /// let params = Fields::new()
    ///     .with("page", 2)
    ///     .with("tags", json!(["a", "b"]))
    ///     .with("deleted", json!(null));
    ///
    /// assert_eq!(
    ///     params.to_query_pairs().unwrap(),
    ///     vec![
    ///         ("page".to_string(), "2".to_string()),
    ///         ("tags[]".to_string(), "a".to_string()),
    ///         ("tags[]".to_string(), "b".to_string()),
    ///     ]
    /// );
    /// ```
    pub fn to_query_pairs(&self) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                FieldValue::Primitive(Value::Null) => {}
                FieldValue::Primitive(Value::Array(items)) => {
                    let array_key = format!("{}[]", key);
                    for item in items.iter().filter(|item| !item.is_null()) {
                        let text = match item {
                            Value::Object(_) | Value::Array(_) => item.to_string(),
                            other => scalar_text(other),
                        };
                        pairs.push((array_key.clone(), text));
                    }
                }
                FieldValue::Primitive(other) => pairs.push((key.clone(), scalar_text(other))),
                FieldValue::Object(map) => {
                    pairs.push((key.clone(), Value::Object(map.clone()).to_string()))
                }
                FieldValue::File(_) => {
                    return Err(Error::SerializationFailed(format!(
                        "field `{}` holds a file and cannot be sent as a query parameter",
                        key
                    )))
                }
            }
        }
        Ok(pairs)
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// A plain text part.
    Text(String),
    /// A binary part carrying file contents.
    Binary {
        /// The file name sent with the part.
        file_name: String,
        /// The MIME type, if known.
        mime: Option<String>,
        /// The contents.
        bytes: Vec<u8>,
    },
}

/// An ordered `multipart/form-data` body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<(String, FormPart)>,
}

impl MultipartForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a part. Repeated names are kept as separate parts.
    pub fn append(&mut self, name: impl Into<String>, part: FormPart) {
        self.parts.push((name.into(), part));
    }

    /// Builds a form with one part per field, or one per file for file lists.
    /// An empty file list still contributes an empty text part.
    ///
    /// Non-file values become text parts the way form encoding renders them:
    /// strings verbatim, other scalars by their display form, arrays joined
    /// with commas and objects as JSON.
    pub fn from_fields(fields: Fields) -> Self {
        let mut form = MultipartForm::new();
        for (name, value) in fields {
            match value {
                FieldValue::Primitive(value) => form.append(name, FormPart::Text(form_text(&value))),
                FieldValue::Object(map) => {
                    form.append(name, FormPart::Text(Value::Object(map).to_string()))
                }
                FieldValue::File(FileLike::File(file)) => form.append(name, binary_part(file)),
                FieldValue::File(FileLike::FileList(files)) if files.is_empty() => {
                    form.append(name, FormPart::Text(String::new()))
                }
                FieldValue::File(FileLike::FileList(files)) => {
                    for file in files {
                        form.append(name.clone(), binary_part(file));
                    }
                }
                FieldValue::File(FileLike::Blob(blob)) => form.append(
                    name,
                    FormPart::Binary {
                        file_name: BLOB_FILE_NAME.to_string(),
                        mime: blob.mime,
                        bytes: blob.bytes,
                    },
                ),
            }
        }
        form
    }

    /// Returns the first part with the given name.
    pub fn get(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Iterates over parts in order.
    pub fn parts(&self) -> impl Iterator<Item = (&str, &FormPart)> {
        self.parts.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// The number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if the form has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Converts the form into a `reqwest` multipart body.
    pub(crate) fn into_reqwest(self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (name, part) in self.parts {
            form = match part {
                FormPart::Text(text) => form.text(name, text),
                FormPart::Binary {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
                    if let Some(mime) = mime {
                        part = part.mime_str(&mime).map_err(|e| {
                            Error::SerializationFailed(format!("Invalid MIME type {}: {}", mime, e))
                        })?;
                    }
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

fn binary_part(file: FilePart) -> FormPart {
    FormPart::Binary {
        file_name: file.name,
        mime: file.mime,
        bytes: file.bytes,
    }
}

/// Text of a scalar in a query string: strings unquoted.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text of a value in a form part.
fn form_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => form_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
