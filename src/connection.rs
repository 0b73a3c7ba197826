use crate::SkyflowError;
use crate::config::ConnectionConfig;
use crate::models::{InvokeConnectionRequest, InvokeConnectionResponse};
use crate::transport::{ApiRequest, Transport};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use service_auth::{AuthError, CredentialResolver, Credentials};
use std::sync::Arc;

pub const CONNECTION_AUTH_HEADER: &str = "x-skyflow-authorization";
const CONTENT_TYPE: &str = "content-type";

/// Invokes a configured outbound connection with a vault bearer token.
pub struct ConnectionController {
    config: ConnectionConfig,
    credentials: Option<Credentials>,
    resolver: CredentialResolver,
    transport: Arc<dyn Transport>,
}

impl ConnectionController {
    pub(crate) fn new(
        config: ConnectionConfig,
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

    pub fn connection_id(&self) -> &str {
        &self.config.connection_id
    }

    pub async fn invoke(
        &self,
        request: &InvokeConnectionRequest,
    ) -> Result<InvokeConnectionResponse, SkyflowError> {
        let url = substitute_path_params(&self.config.connection_url, request)?;

        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AuthError::InvalidCredentials(format!(
                "no credentials configured for connection {}",
                self.config.connection_id
            ))
        })?;
        let resolved = self.resolver.resolve(credentials).await?;

        let mut api_request = ApiRequest::new(request.method.clone(), url);
        for (name, value) in &request.query_params {
            api_request = api_request.query(name, value);
        }
        if !request
            .headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case(CONTENT_TYPE))
        {
            api_request = api_request.header(CONTENT_TYPE, "application/json");
        }
        for (name, value) in &request.headers {
            api_request = api_request.header(name, value);
        }
        api_request = api_request.header(CONNECTION_AUTH_HEADER, resolved.value());
        if let Some(body) = &request.body {
            api_request = api_request.json(body.clone());
        }

        tracing::debug!(
            connection_id = %self.config.connection_id,
            method = %request.method,
            "Invoking connection"
        );
        let response = self.transport.execute(api_request).await.inspect_err(|e| {
            tracing::warn!(
                connection_id = %self.config.connection_id,
                code = e.code(),
                error = %e,
                "Connection invocation failed"
            );
        })?;

        Ok(InvokeConnectionResponse {
            data: response.body,
            request_id: response.request_id,
        })
    }
}

lazy_static! {
    static ref PATH_PARAM: Regex = Regex::new(r"\{([^{}/]+)\}").unwrap();
}

/// Replaces every `{name}` in the URL. Unknown or unfilled placeholders are rejected.
fn substitute_path_params(
    template: &str,
    request: &InvokeConnectionRequest,
) -> Result<String, SkyflowError> {
    for name in request.path_params.keys() {
        if !PATH_PARAM.captures_iter(template).any(|c| &c[1] == name.as_str()) {
            return Err(SkyflowError::Validation(format!(
                "path param '{}' has no placeholder in the connection url",
                name
            )));
        }
    }

    let mut missing = None;
    let url = PATH_PARAM.replace_all(template, |caps: &Captures| {
        match request.path_params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| caps[0].to_string());
                caps[0].to_string()
            }
        }
    });

    if let Some(placeholder) = missing {
        return Err(SkyflowError::Validation(format!(
            "missing value for path param {}",
            placeholder
        )));
    }
    Ok(url.into_owned())
}
