//! Request and response bodies exchanged with the vault API.

use crate::models::{Fields, RedactionType, TokenMode};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct BatchInsertRequest<'a> {
    pub records: Vec<BatchInsertRecord<'a>>,
    #[serde(rename = "continueOnError")]
    pub continue_on_error: bool,
    pub byot: TokenMode,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchInsertRecord<'a> {
    pub table_name: &'a str,
    pub fields: &'a Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<&'a Fields>,
    pub method: &'static str,
    pub quorum: bool,
    pub tokenization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<&'a str>,
}

#[derive(Serialize)]
pub(crate) struct BulkInsertRequest<'a> {
    pub quorum: bool,
    pub records: Vec<BulkInsertRecord<'a>>,
    pub tokenization: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<&'a str>,
    pub byot: TokenMode,
}

#[derive(Serialize)]
pub(crate) struct BulkInsertRecord<'a> {
    pub fields: &'a Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<&'a Fields>,
    pub request_index: usize,
}

/// `error` arrives either as a bare message or as an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireError {
    Message(String),
    Detailed {
        #[serde(default)]
        message: String,
        #[serde(default)]
        http_code: Option<u16>,
    },
}

impl WireError {
    pub fn message(&self) -> &str {
        match self {
            WireError::Message(m) => m,
            WireError::Detailed { message, .. } => message,
        }
    }

    pub fn http_code(&self) -> Option<u16> {
        match self {
            WireError::Message(_) => None,
            WireError::Detailed { http_code, .. } => *http_code,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InsertedRecord {
    #[serde(default)]
    pub skyflow_id: Option<String>,
    #[serde(default)]
    pub tokens: Option<Fields>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BatchInsertResponse {
    #[serde(default)]
    pub responses: Vec<BatchEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BatchEntry {
    #[serde(rename = "Body", default)]
    pub body: BatchBody,
    #[serde(rename = "Status", default)]
    pub status: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BatchBody {
    #[serde(default)]
    pub records: Vec<InsertedRecord>,
    #[serde(default)]
    pub error: Option<WireError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BulkInsertResponse {
    #[serde(default)]
    pub records: Vec<InsertedRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetResponseBody {
    #[serde(default)]
    pub records: Vec<FetchedRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FetchedRecord {
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Serialize)]
pub(crate) struct UpdateRequestBody<'a> {
    pub record: UpdateRecord<'a>,
    pub tokenization: bool,
    pub byot: TokenMode,
}

#[derive(Serialize)]
pub(crate) struct UpdateRecord<'a> {
    pub fields: &'a Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<&'a Fields>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UpdateResponseBody {
    pub skyflow_id: String,
    #[serde(default)]
    pub tokens: Option<Fields>,
}

#[derive(Serialize)]
pub(crate) struct DeleteRequestBody<'a> {
    pub skyflow_ids: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeleteResponseBody {
    #[serde(rename = "RecordIDResponse", default)]
    pub record_ids: Vec<String>,
}

#[derive(Serialize)]
pub(crate) struct TokenizeRequestBody<'a> {
    #[serde(rename = "tokenizationParameters")]
    pub parameters: Vec<TokenizeParameter<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenizeParameter<'a> {
    pub value: &'a str,
    pub column_group: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenizeResponseBody {
    #[serde(default)]
    pub records: Vec<TokenRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenRecord {
    pub token: String,
}

#[derive(Serialize)]
pub(crate) struct DetokenizeRequestBody<'a> {
    #[serde(rename = "detokenizationParameters")]
    pub parameters: Vec<DetokenizeParameter<'a>>,
    #[serde(rename = "downloadURL")]
    pub download_url: bool,
    #[serde(rename = "continueOnError")]
    pub continue_on_error: bool,
}

#[derive(Serialize)]
pub(crate) struct DetokenizeParameter<'a> {
    pub token: &'a str,
    pub redaction: RedactionType,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DetokenizeResponseBody {
    #[serde(default)]
    pub records: Vec<DetokenizedRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetokenizedRecord {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<WireError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_request_shape() {
        let mut fields = Fields::new();
        fields.insert("card".to_string(), serde_json::json!("4111"));
        let req = BatchInsertRequest {
            records: vec![BatchInsertRecord {
                table_name: "cards",
                fields: &fields,
                tokens: None,
                method: "POST",
                quorum: true,
                tokenization: true,
                upsert: None,
            }],
            continue_on_error: true,
            byot: TokenMode::EnableStrict,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "records": [{
                    "tableName": "cards",
                    "fields": {"card": "4111"},
                    "method": "POST",
                    "quorum": true,
                    "tokenization": true
                }],
                "continueOnError": true,
                "byot": "ENABLE_STRICT"
            })
        );
    }

    #[test]
    fn test_batch_response_with_mixed_entries() {
        let json = serde_json::json!({
            "vaultID": "v1",
            "responses": [
                {"Body": {"records": [{"skyflow_id": "id-1", "tokens": {"card": "tok"}}]}, "Status": 200},
                {"Body": {"error": "Invalid field"}, "Status": 400},
                {"Body": {"error": {"message": "conflict", "http_code": 409}}, "Status": 409}
            ]
        });
        let resp: BatchInsertResponse = serde_json::from_value(json).unwrap();

        assert_eq!(resp.responses.len(), 3);
        assert_eq!(resp.responses[0].body.records[0].skyflow_id.as_deref(), Some("id-1"));
        assert_eq!(resp.responses[1].body.error.as_ref().unwrap().message(), "Invalid field");
        assert_eq!(resp.responses[2].body.error.as_ref().unwrap().http_code(), Some(409));
    }

    #[test]
    fn test_detokenize_request_shape() {
        let req = DetokenizeRequestBody {
            parameters: vec![DetokenizeParameter {
                token: "tok-1",
                redaction: RedactionType::Masked,
            }],
            download_url: false,
            continue_on_error: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["detokenizationParameters"][0]["redaction"], "MASKED");
        assert_eq!(json["continueOnError"], true);
    }

    #[test]
    fn test_delete_response_shape() {
        let resp: DeleteResponseBody =
            serde_json::from_value(serde_json::json!({"RecordIDResponse": ["a", "b"]})).unwrap();
        assert_eq!(resp.record_ids, vec!["a", "b"]);
    }
}
