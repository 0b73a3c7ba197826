use crate::SkyflowError;
use crate::models::{
    DeleteRequest, DetokenizeRequest, Fields, GetRequest, InsertRequest, TokenMode,
    TokenizeRequest, UpdateRequest,
};

fn invalid(message: impl Into<String>) -> SkyflowError {
    SkyflowError::Validation(message.into())
}

// `.` and `..` would be resolved away as URL path segments.
fn is_dot_segment(value: &str) -> bool {
    matches!(value, "." | "..")
}

fn require_table(table: &str) -> Result<(), SkyflowError> {
    if table.trim().is_empty() {
        return Err(invalid("table name is required"));
    }
    if is_dot_segment(table) {
        return Err(invalid(format!("invalid table name '{}'", table)));
    }
    Ok(())
}

fn require_fields(fields: &Fields, position: &str) -> Result<(), SkyflowError> {
    if fields.is_empty() {
        return Err(invalid(format!("{} has no fields", position)));
    }
    if fields.keys().any(|k| k.trim().is_empty()) {
        return Err(invalid(format!("{} has an empty field name", position)));
    }
    Ok(())
}

/// BYOT consistency of one row under the active token mode.
fn check_tokens(
    mode: TokenMode,
    fields: &Fields,
    tokens: Option<&Fields>,
    position: &str,
) -> Result<(), SkyflowError> {
    match (mode, tokens) {
        (TokenMode::Disable, Some(_)) => Err(invalid(format!(
            "{} passes tokens while token mode is DISABLE",
            position
        ))),
        (TokenMode::Disable, None) | (TokenMode::Enable, None) => Ok(()),
        (TokenMode::EnableStrict, None) => Err(invalid(format!(
            "{} has no tokens, required by token mode ENABLE_STRICT",
            position
        ))),
        (mode, Some(tokens)) => {
            if tokens.is_empty() {
                return Err(invalid(format!("{} has empty tokens", position)));
            }
            if let Some(key) = tokens.keys().find(|k| !fields.contains_key(*k)) {
                return Err(invalid(format!(
                    "{} has a token for '{}' which is not one of its fields",
                    position, key
                )));
            }
            if mode == TokenMode::EnableStrict && tokens.len() != fields.len() {
                return Err(invalid(format!(
                    "{} must carry a token for every field under token mode ENABLE_STRICT",
                    position
                )));
            }
            Ok(())
        }
    }
}

pub(crate) fn validate_insert(request: &InsertRequest) -> Result<(), SkyflowError> {
    if request.records.is_empty() {
        return Err(invalid("insert requires at least one record"));
    }
    if let Some(upsert) = &request.upsert {
        if upsert.trim().is_empty() {
            return Err(invalid("upsert column must not be empty"));
        }
    }

    for (index, record) in request.records.iter().enumerate() {
        let position = format!("record {}", index);
        require_table(&record.table)?;
        require_fields(&record.fields, &position)?;
        check_tokens(
            request.token_mode,
            &record.fields,
            record.tokens.as_ref(),
            &position,
        )?;
    }

    if request.token_mode == TokenMode::Enable && request.records.iter().all(|r| r.tokens.is_none()) {
        return Err(invalid("token mode ENABLE requires tokens"));
    }
    Ok(())
}

pub(crate) fn validate_get(request: &GetRequest) -> Result<(), SkyflowError> {
    require_table(&request.table)?;

    let by_column = request.column_name.is_some() || !request.column_values.is_empty();
    match (request.ids.is_empty(), by_column) {
        (true, false) => return Err(invalid("get requires skyflow ids or a column lookup")),
        (false, true) => return Err(invalid("skyflow ids and column lookup are mutually exclusive")),
        _ => {}
    }

    if request.ids.iter().any(|id| id.trim().is_empty()) {
        return Err(invalid("skyflow ids must not be empty"));
    }
    if by_column {
        match &request.column_name {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(invalid("column name is required for a column lookup")),
        }
        if request.column_values.is_empty() {
            return Err(invalid("column values are required for a column lookup"));
        }
    }
    if request.return_tokens && request.redaction_type.is_some() {
        return Err(invalid("redaction type is not allowed when returning tokens"));
    }
    if request.return_tokens && by_column {
        return Err(invalid("tokens can't be returned for a column lookup"));
    }
    Ok(())
}

pub(crate) fn validate_update(request: &UpdateRequest) -> Result<(), SkyflowError> {
    require_table(&request.table)?;
    if request.skyflow_id.trim().is_empty() {
        return Err(invalid("skyflow id is required"));
    }
    if is_dot_segment(&request.skyflow_id) {
        return Err(invalid(format!("invalid skyflow id '{}'", request.skyflow_id)));
    }
    require_fields(&request.fields, "update")?;
    check_tokens(
        request.token_mode,
        &request.fields,
        request.tokens.as_ref(),
        "update",
    )?;
    if request.token_mode == TokenMode::Enable && request.tokens.is_none() {
        return Err(invalid("token mode ENABLE requires tokens"));
    }
    Ok(())
}

pub(crate) fn validate_delete(request: &DeleteRequest) -> Result<(), SkyflowError> {
    require_table(&request.table)?;
    if request.ids.is_empty() {
        return Err(invalid("delete requires at least one skyflow id"));
    }
    if request.ids.iter().any(|id| id.trim().is_empty()) {
        return Err(invalid("skyflow ids must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_tokenize(request: &TokenizeRequest) -> Result<(), SkyflowError> {
    if request.values.is_empty() {
        return Err(invalid("tokenize requires at least one value"));
    }
    for (index, value) in request.values.iter().enumerate() {
        if value.value.is_empty() {
            return Err(invalid(format!("value {} is empty", index)));
        }
        if value.column_group.trim().is_empty() {
            return Err(invalid(format!("value {} has no column group", index)));
        }
    }
    Ok(())
}

pub(crate) fn validate_detokenize(request: &DetokenizeRequest) -> Result<(), SkyflowError> {
    if request.tokens.is_empty() {
        return Err(invalid("detokenize requires at least one token"));
    }
    if let Some(index) = request.tokens.iter().position(|t| t.token.trim().is_empty()) {
        return Err(invalid(format!("token {} is empty", index)));
    }
    Ok(())
}
