// GET handlers: version, schema, directory/date listings, tables and CSV export

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::converter::Preference;
use crate::error::SarError;
use crate::models::Domain;
use crate::service::{LoadedTable, ServiceError, Source, TableRequest};
use crate::version::{NAME, VERSION};

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::InvalidName(_) | ServiceError::UnknownDomain(_) => StatusCode::BAD_REQUEST,
            ServiceError::UnknownDir(_)
            | ServiceError::UnknownDate { .. }
            | ServiceError::Sar(SarError::MissingBundleFile { .. }) => StatusCode::NOT_FOUND,
            ServiceError::Sar(SarError::MalformedInput { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Sar(
                SarError::ExternalToolFailure { .. } | SarError::ForcedFormatUnavailable { .. },
            ) => StatusCode::BAD_GATEWAY,
            ServiceError::Sar(SarError::Io(_)) | ServiceError::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

fn parse_domain(raw: &str) -> Result<Domain, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::UnknownDomain(raw.to_string()))
}

#[derive(Debug, Deserialize)]
pub(super) struct SourceQuery {
    #[serde(default)]
    source: Source,
}

#[derive(Debug, Deserialize)]
pub(super) struct TableQuery {
    #[serde(default)]
    source: Source,
    prefer: Option<Preference>,
    /// Comma-separated dimension keys, e.g. `all,0,1`.
    keys: Option<String>,
}

impl TableQuery {
    fn into_request(self, dir: String, date: String, domain: Domain) -> TableRequest {
        let keys = self
            .keys
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        TableRequest {
            dir,
            date,
            domain,
            source: self.source,
            preference: self.prefer,
            keys,
        }
    }
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/schema/{domain}: the column contract of one domain.
pub(super) async fn schema_handler(Path(domain): Path<String>) -> Result<Response, ServiceError> {
    let domain = parse_domain(&domain)?;
    Ok(Json(domain.schema()).into_response())
}

pub(super) async fn dirs_handler(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
) -> Result<Json<Vec<String>>, ServiceError> {
    state.service.list_dirs(query.source).await.map(Json)
}

pub(super) async fn dates_handler(
    State(state): State<AppState>,
    Path(dir): Path<String>,
    Query(query): Query<SourceQuery>,
) -> Result<Json<Vec<String>>, ServiceError> {
    state.service.list_dates(&dir, query.source).await.map(Json)
}

async fn load(
    state: &AppState,
    (dir, date, domain): (String, String, String),
    query: TableQuery,
) -> Result<LoadedTable, ServiceError> {
    let domain = parse_domain(&domain)?;
    state
        .service
        .load_table(query.into_request(dir, date, domain))
        .await
}

/// GET /api/dirs/{dir}/dates/{date}/{domain}: one normalized table as JSON records.
pub(super) async fn table_handler(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String)>,
    Query(query): Query<TableQuery>,
) -> Result<Response, ServiceError> {
    let LoadedTable { table, format } = load(&state, path, query).await?;
    Ok(Json(serde_json::json!({
        "domain": table.domain(),
        "format": format,
        "columns": table.columns(),
        "keys": table.keys(),
        "rows": table.to_records(),
    }))
    .into_response())
}

/// GET .../{domain}/export: the same table as a CSV attachment in bundle form.
pub(super) async fn export_handler(
    State(state): State<AppState>,
    Path(path): Path<(String, String, String)>,
    Query(query): Query<TableQuery>,
) -> Result<Response, ServiceError> {
    let LoadedTable { table, .. } = load(&state, path, query).await?;
    let body = table.to_csv()?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        table.domain().bundle_file()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
