/// One form field value of a registration or upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Written as the same field name once per value.
    Multi(Vec<String>),
    File { filename: String, content: Vec<u8> },
}

/// Ordered form fields. Order is preserved on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: Vec<(String, FieldValue)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .push((key.to_string(), FieldValue::Text(value.into())));
        self
    }

    pub fn multi(mut self, key: &str, values: Vec<String>) -> Self {
        self.fields.push((key.to_string(), FieldValue::Multi(values)));
        self
    }

    pub fn file(mut self, key: &str, filename: impl Into<String>, content: Vec<u8>) -> Self {
        self.fields.push((
            key.to_string(),
            FieldValue::File {
                filename: filename.into(),
                content,
            },
        ));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Scalar value of `key`, if it is a text field.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// The `:action` field.
    pub fn action(&self) -> Option<&str> {
        self.get_text(":action")
    }
}
