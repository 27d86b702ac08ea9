//! API request handlers
//!
//! Every report endpoint takes workbook paths on the server's filesystem and
//! runs the same pipeline as the CLI. Failures come back as
//! `{ "success": false, "error": ... }` instead of tearing down the server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::config::ReportConfig;
use crate::core::visits::{LogFilter, VisitFilter};
use crate::core::SortOrder;
use crate::error::TallyResult;
use crate::excel::ReportExporter;
use crate::reports::{self, ItemsReport, LedgerReport, VisitReport, VisitRequest};

use super::server::AppState;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }

    fn from_result(result: TallyResult<T>, endpoint: &str) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                warn!(endpoint, error = %e, "report request failed");
                Self::err(e.to_string())
            }
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Tally API Server".to_string(),
        version: state.version.clone(),
        description: "HTTP API for spreadsheet classification and sales reports".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint("/api/v1/items", "POST", "Classify items and pivot yearly totals"),
            endpoint("/api/v1/ledger", "POST", "Compare two customer ledgers"),
            endpoint("/api/v1/visits", "POST", "Summarize visit sheets and the operation log"),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec!["items".to_string(), "ledger".to_string(), "visits".to_string()],
    }))
}

fn load_config(config_path: Option<&str>) -> TallyResult<ReportConfig> {
    ReportConfig::load_or_default(config_path.map(Path::new))
}

/// Items request
#[derive(Debug, Deserialize)]
pub struct ItemsRequest {
    pub rules_path: String,
    pub data_path: String,
    #[serde(default)]
    pub config_path: Option<String>,
    /// Also write the pivot to this .xlsx path
    #[serde(default)]
    pub output_path: Option<String>,
}

fn items_report(req: &ItemsRequest) -> TallyResult<ItemsReport> {
    let config = load_config(req.config_path.as_deref())?;
    let report = reports::run_items_report(
        &PathBuf::from(&req.rules_path),
        &PathBuf::from(&req.data_path),
        &config,
    )?;
    if let Some(output) = &req.output_path {
        ReportExporter::new(report.export_sheets(&config.items)).export(Path::new(output))?;
    }
    Ok(report)
}

/// POST /api/v1/items - Item classification and yearly pivot
pub async fn items(Json(req): Json<ItemsRequest>) -> Json<ApiResponse<ItemsReport>> {
    Json(ApiResponse::from_result(items_report(&req), "items"))
}

/// Ledger request
#[derive(Debug, Deserialize)]
pub struct LedgerRequest {
    pub prior_path: String,
    pub current_path: String,
    pub helper_path: String,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub config_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
}

fn ledger_report(req: &LedgerRequest) -> TallyResult<LedgerReport> {
    let config = load_config(req.config_path.as_deref())?;
    let report = reports::run_ledger_report(
        &PathBuf::from(&req.prior_path),
        &PathBuf::from(&req.current_path),
        &PathBuf::from(&req.helper_path),
        req.sort,
        &config,
    )?;
    if let Some(output) = &req.output_path {
        ReportExporter::new(report.export_sheets(&config)).export(Path::new(output))?;
    }
    Ok(report)
}

/// POST /api/v1/ledger - Two-period customer comparison
pub async fn ledger(Json(req): Json<LedgerRequest>) -> Json<ApiResponse<LedgerReport>> {
    Json(ApiResponse::from_result(ledger_report(&req), "ledger"))
}

/// Visits request
#[derive(Debug, Deserialize)]
pub struct VisitsRequest {
    pub report_path: String,
    #[serde(default)]
    pub visits: VisitFilter,
    #[serde(default)]
    pub log: LogFilter,
    #[serde(default)]
    pub config_path: Option<String>,
}

fn visit_report(req: VisitsRequest) -> TallyResult<VisitReport> {
    let config = load_config(req.config_path.as_deref())?;
    let request = VisitRequest {
        visits: req.visits,
        log: req.log,
    };
    reports::run_visit_report(&PathBuf::from(&req.report_path), &request, &config.visits)
}

/// POST /api/v1/visits - Visit summary and operation log analysis
pub async fn visits(Json(req): Json<VisitsRequest>) -> Json<ApiResponse<VisitReport>> {
    Json(ApiResponse::from_result(visit_report(req), "visits"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;

    #[test]
    fn test_api_response_ok_creates_success_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test data".to_string());

        assert!(response.success);
        assert_eq!(response.data, Some("test data".to_string()));
        assert!(response.error.is_none());
        // UUID v4, 8-4-4-4-12
        assert_eq!(response.request_id.len(), 36);
    }

    #[test]
    fn test_api_response_err_skips_data() {
        let response: ApiResponse<String> = ApiResponse::err("Something went wrong");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Something went wrong");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_api_response_from_result() {
        let failed: ApiResponse<String> =
            ApiResponse::from_result(Err(TallyError::NoTimeSeriesData), "items");
        assert!(!failed.success);
        assert!(failed.error.unwrap().contains("No yearly"));

        let ok: ApiResponse<u32> = ApiResponse::from_result(Ok(3), "items");
        assert_eq!(ok.data, Some(3));
    }

    #[test]
    fn test_ledger_request_defaults() {
        let req: LedgerRequest = serde_json::from_str(
            r#"{"prior_path": "a.xlsx", "current_path": "b.xlsx", "helper_path": "c.xlsx"}"#,
        )
        .unwrap();
        assert_eq!(req.sort, SortOrder::Current);
        assert!(req.config_path.is_none());

        let req: LedgerRequest = serde_json::from_str(
            r#"{"prior_path": "a", "current_path": "b", "helper_path": "c", "sort": "worst"}"#,
        )
        .unwrap();
        assert_eq!(req.sort, SortOrder::Worst);
    }

    #[test]
    fn test_visits_request_filters() {
        let req: VisitsRequest = serde_json::from_str(
            r#"{"report_path": "r.xlsx", "visits": {"persons": ["田中"], "date_from": "2024-04-01"}}"#,
        )
        .unwrap();
        assert_eq!(req.visits.persons, Some(vec!["田中".to_string()]));
        assert!(req.visits.date_from.is_some());
        assert!(req.log.sheets.is_none());
    }

    #[test]
    fn test_missing_workbook_is_reported_not_panicked() {
        let req = ItemsRequest {
            rules_path: "/nonexistent/rules.xlsx".to_string(),
            data_path: "/nonexistent/data.xlsx".to_string(),
            config_path: None,
            output_path: None,
        };
        let response = ApiResponse::from_result(items_report(&req), "items");
        assert!(!response.success);
        assert!(response.error.unwrap().contains("Workbook error"));
    }
}
