//! Turns raw vault responses into per-row results and errors.
//!
//! Every input row ends up in exactly one of `records` or `errors`, tagged
//! with its original `request_index`.

use crate::SkyflowError;
use crate::models::{
    DetokenizeResponse, DetokenizedField, DetokenizeToken, Fields, InsertRecord, InsertResponse,
    RecordResult, RowError,
};
use crate::wire::{BatchInsertResponse, BulkInsertResponse, DetokenizeResponseBody, InsertedRecord};

const MISSING_RESPONSE: &str = "no response returned for record";
const MISSING_RESPONSE_CODE: u16 = 500;

/// Rows of one table, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableGroup {
    pub table: String,
    pub indices: Vec<usize>,
}

/// Groups rows by table, ordered by each table's first appearance.
pub(crate) fn group_by_table(records: &[InsertRecord]) -> Vec<TableGroup> {
    let mut groups: Vec<TableGroup> = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match groups.iter_mut().find(|g| g.table == record.table) {
            Some(group) => group.indices.push(index),
            None => groups.push(TableGroup {
                table: record.table.clone(),
                indices: vec![index],
            }),
        }
    }
    groups
}

/// Result of one per-table bulk call, always produced exactly once per group.
#[derive(Debug)]
pub(crate) struct GroupOutcome {
    pub group: TableGroup,
    pub result: Result<(BulkInsertResponse, Option<String>), SkyflowError>,
}

fn merge_record(inserted: &InsertedRecord, return_tokens: bool) -> Option<Fields> {
    let skyflow_id = inserted.skyflow_id.as_ref()?;
    let mut fields = Fields::new();
    fields.insert(
        "skyflow_id".to_string(),
        serde_json::Value::String(skyflow_id.clone()),
    );
    if return_tokens {
        if let Some(tokens) = &inserted.tokens {
            for (column, token) in tokens {
                fields.insert(column.clone(), token.clone());
            }
        }
    }
    Some(fields)
}

fn missing(request_index: usize, table: Option<String>, request_id: Option<String>) -> RowError {
    RowError {
        request_index,
        table,
        code: MISSING_RESPONSE_CODE,
        description: MISSING_RESPONSE.to_string(),
        request_id,
    }
}

/// Batch entries are positional: entry `i` answers row `i`.
pub(crate) fn reconcile_batch(
    records: &[InsertRecord],
    response: BatchInsertResponse,
    request_id: Option<String>,
    return_tokens: bool,
) -> InsertResponse {
    let mut out = InsertResponse::default();
    let mut entries = response.responses.into_iter();

    for (index, record) in records.iter().enumerate() {
        let table = Some(record.table.clone());
        let Some(entry) = entries.next() else {
            out.errors.push(missing(index, table, request_id.clone()));
            continue;
        };

        if let Some(error) = &entry.body.error {
            let code = match entry.status {
                0 => error.http_code().unwrap_or(MISSING_RESPONSE_CODE),
                status => status,
            };
            out.errors.push(RowError {
                request_index: index,
                table,
                code,
                description: error.message().to_string(),
                request_id: request_id.clone(),
            });
            continue;
        }

        match entry.body.records.first().and_then(|r| merge_record(r, return_tokens)) {
            Some(fields) => out.records.push(RecordResult {
                request_index: index,
                table,
                fields,
            }),
            None => out.errors.push(missing(index, table, request_id.clone())),
        }
    }

    out
}

/// Merges per-table outcomes. A failed group turns all of its rows into errors.
pub(crate) fn reconcile_bulk(outcomes: Vec<GroupOutcome>, return_tokens: bool) -> InsertResponse {
    let mut out = InsertResponse::default();

    for GroupOutcome { group, result } in outcomes {
        match result {
            Ok((response, request_id)) => {
                for (position, &index) in group.indices.iter().enumerate() {
                    let fields = response
                        .records
                        .get(position)
                        .and_then(|r| merge_record(r, return_tokens));
                    match fields {
                        Some(fields) => out.records.push(RecordResult {
                            request_index: index,
                            table: Some(group.table.clone()),
                            fields,
                        }),
                        None => out.errors.push(missing(
                            index,
                            Some(group.table.clone()),
                            request_id.clone(),
                        )),
                    }
                }
            }
            Err(err) => {
                tracing::warn!(
                    table = %group.table,
                    rows = group.indices.len(),
                    code = err.code(),
                    "Insert failed for table group"
                );
                let description = err.description();
                let request_id = err.request_id().map(str::to_string);
                out.errors
                    .extend(group.indices.iter().map(|&index| RowError {
                        request_index: index,
                        table: Some(group.table.clone()),
                        code: err.code(),
                        description: description.clone(),
                        request_id: request_id.clone(),
                    }));
            }
        }
    }

    out
}

pub(crate) fn reconcile_detokenize(
    tokens: &[DetokenizeToken],
    response: DetokenizeResponseBody,
    request_id: Option<String>,
) -> DetokenizeResponse {
    let mut out = DetokenizeResponse::default();
    let mut entries = response.records.into_iter();

    for (index, requested) in tokens.iter().enumerate() {
        let Some(entry) = entries.next() else {
            out.errors.push(missing(index, None, request_id.clone()));
            continue;
        };

        match entry.error {
            Some(error) => out.errors.push(RowError {
                request_index: index,
                table: None,
                code: error.http_code().unwrap_or(400),
                description: error.message().to_string(),
                request_id: request_id.clone(),
            }),
            None => out.records.push(DetokenizedField {
                request_index: index,
                token: if entry.token.is_empty() {
                    requested.token.clone()
                } else {
                    entry.token
                },
                value: entry.value.unwrap_or(serde_json::Value::Null),
                value_type: entry.value_type,
            }),
        }
    }

    out
}
