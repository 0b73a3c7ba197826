use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column name to value map of a single record.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Bring-your-own-token mode for insert and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenMode {
    #[default]
    Disable,
    Enable,
    EnableStrict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedactionType {
    #[default]
    Default,
    PlainText,
    Masked,
    Redacted,
}

impl RedactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            RedactionType::Default => "DEFAULT",
            RedactionType::PlainText => "PLAIN_TEXT",
            RedactionType::Masked => "MASKED",
            RedactionType::Redacted => "REDACTED",
        }
    }
}

/// One row to insert, with its target table and optional BYOT tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRecord {
    pub table: String,
    pub fields: Fields,
    pub tokens: Option<Fields>,
}

impl InsertRecord {
    pub fn new(table: impl Into<String>, fields: Fields) -> Self {
        Self {
            table: table.into(),
            fields,
            tokens: None,
        }
    }

    pub fn tokens(mut self, tokens: Fields) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsertRequest {
    pub records: Vec<InsertRecord>,
    /// One batch call with per-row results instead of one all-or-nothing call per table.
    pub continue_on_error: bool,
    pub return_tokens: bool,
    pub upsert: Option<String>,
    pub token_mode: TokenMode,
}

impl InsertRequest {
    /// All rows target the same table.
    pub fn new(table: impl Into<String>, values: Vec<Fields>) -> Self {
        let table = table.into();
        Self::from_records(
            values
                .into_iter()
                .map(|fields| InsertRecord::new(table.clone(), fields))
                .collect(),
        )
    }

    pub fn from_records(records: Vec<InsertRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn return_tokens(mut self, return_tokens: bool) -> Self {
        self.return_tokens = return_tokens;
        self
    }

    pub fn upsert(mut self, column: impl Into<String>) -> Self {
        self.upsert = Some(column.into());
        self
    }

    pub fn token_mode(mut self, mode: TokenMode) -> Self {
        self.token_mode = mode;
        self
    }
}

/// A successfully processed row, correlated to its input position.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    pub request_index: usize,
    pub table: Option<String>,
    pub fields: Fields,
}

impl RecordResult {
    pub fn skyflow_id(&self) -> Option<&str> {
        self.fields.get("skyflow_id").and_then(|v| v.as_str())
    }
}

/// A failed row. Row errors never abort the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub request_index: usize,
    pub table: Option<String>,
    pub code: u16,
    pub description: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertResponse {
    pub records: Vec<RecordResult>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Default)]
pub struct GetRequest {
    pub table: String,
    pub ids: Vec<String>,
    pub column_name: Option<String>,
    pub column_values: Vec<String>,
    pub return_tokens: bool,
    pub redaction_type: Option<RedactionType>,
    pub fields: Vec<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
    pub download_url: bool,
}

impl GetRequest {
    pub fn by_ids<I, S>(table: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn by_column<I, S>(table: impl Into<String>, column_name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            column_name: Some(column_name.into()),
            column_values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn redaction(mut self, redaction: RedactionType) -> Self {
        self.redaction_type = Some(redaction);
        self
    }

    pub fn return_tokens(mut self, return_tokens: bool) -> Self {
        self.return_tokens = return_tokens;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetResponse {
    pub records: Vec<Fields>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub table: String,
    pub skyflow_id: String,
    pub fields: Fields,
    pub tokens: Option<Fields>,
    pub return_tokens: bool,
    pub token_mode: TokenMode,
}

impl UpdateRequest {
    pub fn new(table: impl Into<String>, skyflow_id: impl Into<String>, fields: Fields) -> Self {
        Self {
            table: table.into(),
            skyflow_id: skyflow_id.into(),
            fields,
            ..Self::default()
        }
    }

    pub fn tokens(mut self, tokens: Fields) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn return_tokens(mut self, return_tokens: bool) -> Self {
        self.return_tokens = return_tokens;
        self
    }

    pub fn token_mode(mut self, mode: TokenMode) -> Self {
        self.token_mode = mode;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResponse {
    pub skyflow_id: String,
    pub tokens: Option<Fields>,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    pub table: String,
    pub ids: Vec<String>,
}

impl DeleteRequest {
    pub fn new<I, S>(table: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteResponse {
    pub deleted_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnValue {
    pub value: String,
    pub column_group: String,
}

impl ColumnValue {
    pub fn new(value: impl Into<String>, column_group: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            column_group: column_group.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenizeRequest {
    pub values: Vec<ColumnValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizeResponse {
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetokenizeToken {
    pub token: String,
    pub redaction_type: RedactionType,
}

impl DetokenizeToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            redaction_type: RedactionType::PlainText,
        }
    }

    pub fn redaction(mut self, redaction: RedactionType) -> Self {
        self.redaction_type = redaction;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DetokenizeRequest {
    pub tokens: Vec<DetokenizeToken>,
    pub continue_on_error: bool,
    pub download_url: bool,
}

impl DetokenizeRequest {
    pub fn new(tokens: Vec<DetokenizeToken>) -> Self {
        Self {
            tokens,
            continue_on_error: true,
            download_url: false,
        }
    }

    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetokenizedField {
    pub request_index: usize,
    pub token: String,
    pub value: serde_json::Value,
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetokenizeResponse {
    pub records: Vec<DetokenizedField>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone)]
pub struct InvokeConnectionRequest {
    pub method: Method,
    pub path_params: BTreeMap<String, String>,
    pub query_params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl Default for InvokeConnectionRequest {
    fn default() -> Self {
        Self {
            method: Method::POST,
            path_params: BTreeMap::new(),
            query_params: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvokeConnectionResponse {
    pub data: serde_json::Value,
    pub request_id: Option<String>,
}
