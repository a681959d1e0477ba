//! Payload encoding: JSON document or multipart form.
//!
//! A [`Payload`] is an ordered mapping from field name to [`PayloadValue`].
//! When any top-level value is a file, or a top-level array holds a file,
//! the whole payload goes out as `multipart/form-data`; otherwise it is a
//! JSON document.
//!
//! Only one level is inspected. A file nested inside an array inside an
//! array is not seen by [`Payload::is_multipart`] and the payload is sent as
//! JSON. Callers that know they carry files should build a [`FormBody`]
//! directly (or use [`RequestBody::Form`]) and skip detection entirely.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::Error;

/// Suffix appended to a field name when an array is flattened into a form.
pub const ARRAY_FIELD_SUFFIX: &str = "[]";

/// A binary file-like value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lower-cased extension including the dot, taken after the last `.`.
    ///
    /// A name without a dot yields the whole name, so `"README"` gives
    /// `".readme"` and never matches a real extension.
    pub fn extension(&self) -> String {
        let tail = self
            .file_name
            .rsplit('.')
            .next()
            .unwrap_or(self.file_name.as_str());
        format!(".{}", tail.to_lowercase())
    }
}

/// One value in a [`Payload`].
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    /// String, number or boolean.
    Scalar(Value),
    /// Nested plain object; sent as a JSON string inside a form.
    Object(Map<String, Value>),
    File(FileUpload),
    Array(Vec<PayloadValue>),
}

impl PayloadValue {
    pub fn is_file(&self) -> bool {
        matches!(self, PayloadValue::File(_))
    }

    /// True for a file, or an array directly holding a file.
    fn carries_file(&self) -> bool {
        match self {
            PayloadValue::File(_) => true,
            PayloadValue::Array(items) => items.iter().any(PayloadValue::is_file),
            _ => false,
        }
    }

    /// JSON rendering. Files have no JSON form and become `{}`.
    pub fn to_json(&self) -> Value {
        match self {
            PayloadValue::Null => Value::Null,
            PayloadValue::Scalar(value) => value.clone(),
            PayloadValue::Object(map) => Value::Object(map.clone()),
            PayloadValue::File(_) => Value::Object(Map::new()),
            PayloadValue::Array(items) => {
                Value::Array(items.iter().map(PayloadValue::to_json).collect())
            }
        }
    }

    /// Text used when the value becomes a plain form field.
    fn form_text(&self) -> String {
        match self {
            PayloadValue::Null => "null".to_string(),
            PayloadValue::Scalar(value) => scalar_text(value),
            other => other.to_json().to_string(),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<Value> for PayloadValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PayloadValue::Null,
            Value::Object(map) => PayloadValue::Object(map),
            Value::Array(items) => {
                PayloadValue::Array(items.into_iter().map(PayloadValue::from).collect())
            }
            scalar => PayloadValue::Scalar(scalar),
        }
    }
}

impl From<FileUpload> for PayloadValue {
    fn from(file: FileUpload) -> Self {
        PayloadValue::File(file)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Scalar(Value::String(value.to_string()))
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Scalar(Value::String(value))
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Scalar(Value::Bool(value))
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        PayloadValue::Scalar(Value::from(value))
    }
}

impl From<i32> for PayloadValue {
    fn from(value: i32) -> Self {
        PayloadValue::Scalar(Value::from(value))
    }
}

impl From<u64> for PayloadValue {
    fn from(value: u64) -> Self {
        PayloadValue::Scalar(Value::from(value))
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        PayloadValue::from(Value::from(value))
    }
}

impl<T: Into<PayloadValue>> From<Vec<T>> for PayloadValue {
    fn from(items: Vec<T>) -> Self {
        PayloadValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PayloadValue>> From<Option<T>> for PayloadValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PayloadValue::Null, Into::into)
    }
}

/// Ordered field mapping sent as a request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: IndexMap<String, PayloadValue>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object, keeping its key order.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(Error::decode(format!(
                "payload must be a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PayloadValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PayloadValue> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadValue)> {
        self.fields.iter()
    }

    /// Whether this payload must be sent as multipart.
    pub fn is_multipart(&self) -> bool {
        self.fields.values().any(PayloadValue::carries_file)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Flatten into form fields, in key order.
    ///
    /// Null values are skipped. Arrays become repeated `name[]` fields,
    /// nested objects become JSON strings.
    pub fn to_form_data(&self) -> FormBody {
        let mut form = FormBody::new();
        for (name, value) in &self.fields {
            match value {
                PayloadValue::Null => {}
                PayloadValue::File(file) => form.push_file(name.clone(), file.clone()),
                PayloadValue::Array(items) => {
                    let field = format!("{}{}", name, ARRAY_FIELD_SUFFIX);
                    for item in items {
                        match item {
                            PayloadValue::File(file) => form.push_file(field.clone(), file.clone()),
                            other => form.push_text(field.clone(), other.form_text()),
                        }
                    }
                }
                other => form.push_text(name.clone(), other.form_text()),
            }
        }
        form
    }
}

impl<K: Into<String>, V: Into<PayloadValue>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Payload::new();
        for (name, value) in iter {
            payload.insert(name, value);
        }
        payload
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text(String),
    File(FileUpload),
}

impl FormField {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormField::Text(text) => Some(text),
            FormField::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileUpload> {
        match self {
            FormField::File(file) => Some(file),
            FormField::Text(_) => None,
        }
    }
}

/// A pre-built multipart form. Field names may repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormBody {
    fields: Vec<(String, FormField)>,
}

impl FormBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_text(name, value);
        self
    }

    pub fn file(mut self, name: impl Into<String>, file: FileUpload) -> Self {
        self.push_file(name, file);
        self
    }

    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), FormField::Text(value.into())));
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: FileUpload) {
        self.fields.push((name.into(), FormField::File(file)));
    }

    /// All values bound to `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&FormField> {
        self.fields
            .iter()
            .filter(|(field, _)| field == name)
            .map(|(_, value)| value)
            .collect()
    }

    pub fn fields(&self) -> &[(String, FormField)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert to a reqwest form. The transport sets the boundary header.
    pub fn to_multipart(&self) -> Result<reqwest::multipart::Form, Error> {
        let mut form = reqwest::multipart::Form::new();
        for (name, field) in &self.fields {
            form = match field {
                FormField::Text(text) => form.text(name.clone(), text.clone()),
                FormField::File(file) => {
                    let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                        .file_name(file.file_name.clone())
                        .mime_str(&file.mime_type)
                        .map_err(|_| Error::InvalidMimeType {
                            file_name: file.file_name.clone(),
                            mime: file.mime_type.clone(),
                        })?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

/// What a caller hands to the executor as a body.
///
/// `Payload` is inspected to pick an encoding; `Json` and `Form` state
/// the encoding up front.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Payload(Payload),
    Json(Value),
    Form(FormBody),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        match self {
            RequestBody::Form(_) => true,
            RequestBody::Payload(payload) => payload.is_multipart(),
            RequestBody::Json(_) => false,
        }
    }

    /// Resolve to the wire encoding.
    pub fn into_wire(self) -> crate::types::WireBody {
        use crate::types::WireBody;

        match self {
            RequestBody::Form(form) => WireBody::Form(form),
            RequestBody::Json(value) => WireBody::Json(value),
            RequestBody::Payload(payload) if payload.is_multipart() => {
                WireBody::Form(payload.to_form_data())
            }
            RequestBody::Payload(payload) => WireBody::Json(payload.to_json()),
        }
    }
}

impl From<Payload> for RequestBody {
    fn from(payload: Payload) -> Self {
        RequestBody::Payload(payload)
    }
}

impl From<FormBody> for RequestBody {
    fn from(form: FormBody) -> Self {
        RequestBody::Form(form)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Whether a body will be sent as multipart.
pub fn is_multipart(body: &RequestBody) -> bool {
    body.is_multipart()
}
