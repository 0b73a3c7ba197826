use crate::config::VaultConfig;
use crate::models::{
    DeleteRequest, DeleteResponse, DetokenizeRequest, DetokenizeResponse, GetRequest, GetResponse,
    InsertRequest, InsertResponse, RedactionType, TokenizeRequest, TokenizeResponse,
    UpdateRequest, UpdateResponse,
};
use crate::reconcile::{GroupOutcome, group_by_table, reconcile_batch, reconcile_bulk, reconcile_detokenize};
use crate::transport::{ApiRequest, Transport};
use crate::validation;
use crate::wire::{
    BatchInsertRecord, BatchInsertRequest, BatchInsertResponse, BulkInsertRecord,
    BulkInsertRequest, BulkInsertResponse, DeleteRequestBody, DeleteResponseBody,
    DetokenizeParameter, DetokenizeRequestBody, DetokenizeResponseBody, GetResponseBody,
    TokenizeParameter, TokenizeRequestBody, TokenizeResponseBody, UpdateRecord,
    UpdateRequestBody, UpdateResponseBody,
};
use crate::SkyflowError;
use futures::future::join_all;
use reqwest::{Method, Url};
use service_auth::{AuthError, CredentialResolver, Credentials};
use std::sync::Arc;

const AUTHORIZATION_HEADER: &str = "Authorization";
const INSERT_QUORUM: bool = true;

#[derive(Debug, Clone, Copy)]
enum Stage {
    Validating,
    ClientReady,
    Executing,
    Reconciling,
    Done,
    Failed,
}

/// Data-plane operations against one vault.
///
/// Each call validates its request before resolving credentials, and
/// resolves credentials before any network traffic. The bearer token is
/// cached per controller; concurrent calls share it and refresh it at most
/// once at a time.
pub struct VaultController {
    config: VaultConfig,
    credentials: Option<Credentials>,
    resolver: CredentialResolver,
    transport: Arc<dyn Transport>,
}

impl VaultController {
    pub(crate) fn new(
        config: VaultConfig,
        credentials: Option<Credentials>,
        resolver: CredentialResolver,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            credentials,
            resolver,
            transport,
        }
    }

    pub fn vault_id(&self) -> &str {
        &self.config.vault_id
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// `{vault_url}/v1/vaults/{vault_id}/{segments..}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<String, SkyflowError> {
        let base = self.config.vault_url();
        let invalid = || SkyflowError::Validation(format!("invalid vault url: {}", base));
        let mut url = Url::parse(&base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["v1", "vaults", self.config.vault_id.as_str()])
            .extend(segments);
        Ok(url.into())
    }

    fn stage(&self, operation: &'static str, stage: Stage) {
        tracing::debug!(vault_id = %self.config.vault_id, operation, stage = ?stage, "Vault operation stage");
    }

    fn finish<T>(
        &self,
        operation: &'static str,
        result: Result<T, SkyflowError>,
    ) -> Result<T, SkyflowError> {
        match &result {
            Ok(_) => self.stage(operation, Stage::Done),
            Err(e) => tracing::warn!(
                vault_id = %self.config.vault_id,
                operation,
                stage = ?Stage::Failed,
                code = e.code(),
                error = %e,
                "Vault operation failed"
            ),
        }
        result
    }

    /// Resolves the `Authorization` header value for this vault.
    async fn authorization(&self, operation: &'static str) -> Result<String, SkyflowError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AuthError::InvalidCredentials(format!(
                "no credentials configured for vault {}",
                self.config.vault_id
            ))
        })?;
        let resolved = self.resolver.resolve(credentials).await?;
        self.stage(operation, Stage::ClientReady);
        Ok(resolved.authorization())
    }

    fn request(&self, method: Method, url: String, authorization: &str) -> ApiRequest {
        ApiRequest::new(method, url).header(AUTHORIZATION_HEADER, authorization)
    }

    pub async fn insert(&self, request: &InsertRequest) -> Result<InsertResponse, SkyflowError> {
        let result = self.run_insert(request).await;
        self.finish("insert", result)
    }

    async fn run_insert(&self, request: &InsertRequest) -> Result<InsertResponse, SkyflowError> {
        self.stage("insert", Stage::Validating);
        validation::validate_insert(request)?;
        let authorization = self.authorization("insert").await?;

        let response = if request.continue_on_error {
            self.insert_batch(request, &authorization).await?
        } else {
            self.insert_bulk(request, &authorization).await
        };

        if !response.errors.is_empty() {
            tracing::warn!(
                vault_id = %self.config.vault_id,
                inserted = response.records.len(),
                failed = response.errors.len(),
                "Insert completed with row errors"
            );
        }
        Ok(response)
    }

    /// One call for all rows; per-row results come back in input order.
    async fn insert_batch(
        &self,
        request: &InsertRequest,
        authorization: &str,
    ) -> Result<InsertResponse, SkyflowError> {
        let body = BatchInsertRequest {
            records: request
                .records
                .iter()
                .map(|record| BatchInsertRecord {
                    table_name: &record.table,
                    fields: &record.fields,
                    tokens: record.tokens.as_ref(),
                    method: "POST",
                    quorum: INSERT_QUORUM,
                    tokenization: request.return_tokens,
                    upsert: request.upsert.as_deref(),
                })
                .collect(),
            continue_on_error: true,
            byot: request.token_mode,
        };
        let api_request = self
            .request(Method::POST, self.endpoint(&[])?, authorization)
            .json(serde_json::to_value(&body)?);

        self.stage("insert", Stage::Executing);
        tracing::debug!(vault_id = %self.config.vault_id, rows = request.records.len(), "Sending batch insert");
        let response = self.transport.execute(api_request).await?;
        let request_id = response.request_id.clone();
        let batch: BatchInsertResponse = response.decode()?;

        self.stage("insert", Stage::Reconciling);
        Ok(reconcile_batch(
            &request.records,
            batch,
            request_id,
            request.return_tokens,
        ))
    }

    /// One concurrent call per table. A failing table only fails its own rows.
    async fn insert_bulk(&self, request: &InsertRequest, authorization: &str) -> InsertResponse {
        let groups = group_by_table(&request.records);
        tracing::debug!(
            vault_id = %self.config.vault_id,
            rows = request.records.len(),
            groups = groups.len(),
            "Sending bulk insert per table"
        );

        self.stage("insert", Stage::Executing);
        let calls = groups.into_iter().map(|group| {
            let body = BulkInsertRequest {
                quorum: INSERT_QUORUM,
                records: group
                    .indices
                    .iter()
                    .map(|&index| BulkInsertRecord {
                        fields: &request.records[index].fields,
                        tokens: request.records[index].tokens.as_ref(),
                        request_index: index,
                    })
                    .collect(),
                tokenization: request.return_tokens,
                upsert: request.upsert.as_deref(),
                byot: request.token_mode,
            };
            let api_request = self.endpoint(&[group.table.as_str()]).and_then(|url| {
                Ok(self
                    .request(Method::POST, url, authorization)
                    .json(serde_json::to_value(&body)?))
            });

            async move {
                let result = match api_request {
                    Ok(api_request) => self.send_bulk(api_request).await,
                    Err(e) => Err(e),
                };
                GroupOutcome { group, result }
            }
        });
        let outcomes = join_all(calls).await;

        self.stage("insert", Stage::Reconciling);
        reconcile_bulk(outcomes, request.return_tokens)
    }

    async fn send_bulk(
        &self,
        api_request: ApiRequest,
    ) -> Result<(BulkInsertResponse, Option<String>), SkyflowError> {
        let response = self.transport.execute(api_request).await?;
        let request_id = response.request_id.clone();
        Ok((response.decode()?, request_id))
    }

    pub async fn get(&self, request: &GetRequest) -> Result<GetResponse, SkyflowError> {
        let result = self.run_get(request).await;
        self.finish("get", result)
    }

    async fn run_get(&self, request: &GetRequest) -> Result<GetResponse, SkyflowError> {
        self.stage("get", Stage::Validating);
        validation::validate_get(request)?;
        let authorization = self.authorization("get").await?;

        let mut api_request =
            self.request(Method::GET, self.endpoint(&[request.table.as_str()])?, &authorization);
        for id in &request.ids {
            api_request = api_request.query("skyflow_ids", id);
        }
        if let Some(column) = &request.column_name {
            api_request = api_request.query("column_name", column);
            for value in &request.column_values {
                api_request = api_request.query("column_values", value);
            }
        }
        if request.return_tokens {
            api_request = api_request.query("tokenization", "true");
        } else {
            let redaction = request.redaction_type.unwrap_or(RedactionType::Default);
            api_request = api_request.query("redaction", redaction.as_str());
        }
        for field in &request.fields {
            api_request = api_request.query("fields", field);
        }
        if let Some(offset) = &request.offset {
            api_request = api_request.query("offset", offset);
        }
        if let Some(limit) = &request.limit {
            api_request = api_request.query("limit", limit);
        }
        if request.download_url {
            api_request = api_request.query("downloadURL", "true");
        }

        self.stage("get", Stage::Executing);
        let body: GetResponseBody = self.transport.execute(api_request).await?.decode()?;

        self.stage("get", Stage::Reconciling);
        Ok(GetResponse {
            records: body.records.into_iter().map(|r| r.fields).collect(),
        })
    }

    pub async fn update(&self, request: &UpdateRequest) -> Result<UpdateResponse, SkyflowError> {
        let result = self.run_update(request).await;
        self.finish("update", result)
    }

    async fn run_update(&self, request: &UpdateRequest) -> Result<UpdateResponse, SkyflowError> {
        self.stage("update", Stage::Validating);
        validation::validate_update(request)?;
        let authorization = self.authorization("update").await?;

        let body = UpdateRequestBody {
            record: UpdateRecord {
                fields: &request.fields,
                tokens: request.tokens.as_ref(),
            },
            tokenization: request.return_tokens,
            byot: request.token_mode,
        };
        let url = self.endpoint(&[request.table.as_str(), request.skyflow_id.as_str()])?;
        let api_request = self
            .request(Method::PUT, url, &authorization)
            .json(serde_json::to_value(&body)?);

        self.stage("update", Stage::Executing);
        let body: UpdateResponseBody = self.transport.execute(api_request).await?.decode()?;

        self.stage("update", Stage::Reconciling);
        Ok(UpdateResponse {
            skyflow_id: body.skyflow_id,
            tokens: body.tokens.filter(|_| request.return_tokens),
        })
    }

    pub async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse, SkyflowError> {
        let result = self.run_delete(request).await;
        self.finish("delete", result)
    }

    async fn run_delete(&self, request: &DeleteRequest) -> Result<DeleteResponse, SkyflowError> {
        self.stage("delete", Stage::Validating);
        validation::validate_delete(request)?;
        let authorization = self.authorization("delete").await?;

        let body = DeleteRequestBody {
            skyflow_ids: &request.ids,
        };
        let api_request = self
            .request(Method::DELETE, self.endpoint(&[request.table.as_str()])?, &authorization)
            .json(serde_json::to_value(&body)?);

        self.stage("delete", Stage::Executing);
        let body: DeleteResponseBody = self.transport.execute(api_request).await?.decode()?;

        self.stage("delete", Stage::Reconciling);
        Ok(DeleteResponse {
            deleted_ids: body.record_ids,
        })
    }

    pub async fn tokenize(&self, request: &TokenizeRequest) -> Result<TokenizeResponse, SkyflowError> {
        let result = self.run_tokenize(request).await;
        self.finish("tokenize", result)
    }

    async fn run_tokenize(&self, request: &TokenizeRequest) -> Result<TokenizeResponse, SkyflowError> {
        self.stage("tokenize", Stage::Validating);
        validation::validate_tokenize(request)?;
        let authorization = self.authorization("tokenize").await?;

        let body = TokenizeRequestBody {
            parameters: request
                .values
                .iter()
                .map(|v| TokenizeParameter {
                    value: &v.value,
                    column_group: &v.column_group,
                })
                .collect(),
        };
        let url = self.endpoint(&["tokenize"])?;
        let api_request = self
            .request(Method::POST, url, &authorization)
            .json(serde_json::to_value(&body)?);

        self.stage("tokenize", Stage::Executing);
        let body: TokenizeResponseBody = self.transport.execute(api_request).await?.decode()?;

        self.stage("tokenize", Stage::Reconciling);
        Ok(TokenizeResponse {
            tokens: body.records.into_iter().map(|r| r.token).collect(),
        })
    }

    pub async fn detokenize(
        &self,
        request: &DetokenizeRequest,
    ) -> Result<DetokenizeResponse, SkyflowError> {
        let result = self.run_detokenize(request).await;
        self.finish("detokenize", result)
    }

    async fn run_detokenize(
        &self,
        request: &DetokenizeRequest,
    ) -> Result<DetokenizeResponse, SkyflowError> {
        self.stage("detokenize", Stage::Validating);
        validation::validate_detokenize(request)?;
        let authorization = self.authorization("detokenize").await?;

        let body = DetokenizeRequestBody {
            parameters: request
                .tokens
                .iter()
                .map(|t| DetokenizeParameter {
                    token: &t.token,
                    redaction: t.redaction_type,
                })
                .collect(),
            download_url: request.download_url,
            continue_on_error: request.continue_on_error,
        };
        let url = self.endpoint(&["detokenize"])?;
        let api_request = self
            .request(Method::POST, url, &authorization)
            .json(serde_json::to_value(&body)?);

        self.stage("detokenize", Stage::Executing);
        let response = self.transport.execute(api_request).await?;
        let request_id = response.request_id.clone();
        let body: DetokenizeResponseBody = response.decode()?;

        self.stage("detokenize", Stage::Reconciling);
        let out = reconcile_detokenize(&request.tokens, body, request_id);
        if !out.errors.is_empty() {
            tracing::warn!(
                vault_id = %self.config.vault_id,
                failed = out.errors.len(),
                "Detokenize completed with row errors"
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fields, InsertRecord};
    use crate::transport::ApiResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers per URL suffix and records every request.
    struct ScriptedTransport {
        requests: Mutex<Vec<ApiRequest>>,
        failing_table: Option<&'static str>,
    }

    impl ScriptedTransport {
        fn new(failing_table: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                failing_table,
            })
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, SkyflowError> {
            self.requests.lock().unwrap().push(request.clone());

            if let Some(table) = self.failing_table {
                if request.url.ends_with(&format!("/{table}")) {
                    return Err(SkyflowError::Api {
                        status: 500,
                        message: "internal error".to_string(),
                        request_id: Some("req-fail".to_string()),
                        details: None,
                    });
                }
            }

            let rows = request
                .body
                .as_ref()
                .and_then(|b| b["records"].as_array())
                .map(|r| r.len())
                .unwrap_or(0);
            let records: Vec<_> = (0..rows)
                .map(|i| serde_json::json!({"skyflow_id": format!("id-{i}")}))
                .collect();
            Ok(ApiResponse {
                status: 200,
                request_id: Some("req-ok".to_string()),
                body: serde_json::json!({ "records": records }),
            })
        }
    }

    fn controller(transport: Arc<ScriptedTransport>, credentials: Option<Credentials>) -> VaultController {
        VaultController::new(
            VaultConfig::new("vault1", "").base_url("http://vault.test"),
            credentials,
            CredentialResolver::default(),
            transport,
        )
    }

    fn fields(value: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("value".to_string(), serde_json::json!(value));
        fields
    }

    #[tokio::test]
    async fn test_bulk_insert_one_call_per_table() {
        let transport = ScriptedTransport::new(Some("ids"));
        let vault = controller(transport.clone(), Some(Credentials::api_key("sky-test")));

        let request = InsertRequest::from_records(vec![
            InsertRecord::new("cards", fields("a")),
            InsertRecord::new("ids", fields("b")),
            InsertRecord::new("cards", fields("c")),
        ]);
        let response = vault.insert(&request).await.unwrap();

        assert_eq!(transport.requests().len(), 2);
        assert_eq!(response.records.len(), 2);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].request_index, 1);
        assert_eq!(response.errors[0].table.as_deref(), Some("ids"));
        assert_eq!(response.errors[0].request_id.as_deref(), Some("req-fail"));
    }

    #[tokio::test]
    async fn test_bulk_body_carries_request_index() {
        let transport = ScriptedTransport::new(None);
        let vault = controller(transport.clone(), Some(Credentials::api_key("sky-test")));

        let request = InsertRequest::from_records(vec![
            InsertRecord::new("cards", fields("a")),
            InsertRecord::new("ids", fields("b")),
            InsertRecord::new("cards", fields("c")),
        ]);
        vault.insert(&request).await.unwrap();

        let cards = transport
            .requests()
            .into_iter()
            .find(|r| r.url.ends_with("/cards"))
            .unwrap();
        let body = cards.body.unwrap();
        assert_eq!(body["records"][0]["request_index"], 0);
        assert_eq!(body["records"][1]["request_index"], 2);
        assert_eq!(
            cards.headers,
            vec![("Authorization".to_string(), "Bearer sky-test".to_string())]
        );
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let transport = ScriptedTransport::new(None);
        let vault = controller(transport.clone(), Some(Credentials::api_key("sky-test")));

        let err = vault
            .insert(&InsertRequest::new("", vec![fields("a")]))
            .await
            .unwrap_err();

        assert!(matches!(err, SkyflowError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let transport = ScriptedTransport::new(None);
        let vault = controller(transport.clone(), None);

        let err = vault
            .insert(&InsertRequest::new("cards", vec![fields("a")]))
            .await
            .unwrap_err();

        assert!(matches!(err, SkyflowError::Auth(AuthError::InvalidCredentials(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_builds_query() {
        let transport = ScriptedTransport::new(None);
        let vault = controller(transport.clone(), Some(Credentials::api_key("sky-test")));

        let request = GetRequest::by_ids("cards", ["id-1", "id-2"])
            .redaction(RedactionType::Masked)
            .fields(["card"]);
        vault.get(&request).await.unwrap();

        let sent = transport.requests().remove(0);
        assert_eq!(sent.method, Method::GET);
        assert_eq!(sent.url, "http://vault.test/v1/vaults/vault1/cards");
        assert_eq!(
            sent.query,
            vec![
                ("skyflow_ids".to_string(), "id-1".to_string()),
                ("skyflow_ids".to_string(), "id-2".to_string()),
                ("redaction".to_string(), "MASKED".to_string()),
                ("fields".to_string(), "card".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_reserved_characters_stay_in_path_segment() {
        let transport = ScriptedTransport::new(None);
        let vault = controller(transport.clone(), Some(Credentials::api_key("sky-test")));

        vault
            .insert(&InsertRequest::new("cards?x=1#frag", vec![fields("a")]))
            .await
            .unwrap();
        let _ = vault
            .update(&UpdateRequest::new("cards", "a/b", fields("b")))
            .await;

        let urls: Vec<_> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://vault.test/v1/vaults/vault1/cards%3Fx=1%23frag".to_string(),
                "http://vault.test/v1/vaults/vault1/cards/a%2Fb".to_string(),
            ]
        );
    }
}
