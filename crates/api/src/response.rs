//! Shared response envelope types for macro handlers.
//!
//! Every successful response carries `"success": true` alongside its
//! payload, mirroring the `{ "success": false, ... }` shape of
//! [`AppError`](crate::error::AppError).

use serde::Serialize;
use zoneops_pipeline::MacroReport;

/// Result of a mutating macro.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroResponse {
    pub success: bool,
    pub message: String,
    /// Widgets the macro applied to.
    pub count: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// Id tagging this invocation's events on the progress stream.
    pub operation_id: String,
}

impl MacroResponse {
    pub fn new(report: MacroReport, operation_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: report.message,
            count: report.count,
            failed: report.failed,
            unresolved: report.unresolved,
            record_id: report.record_id,
            operation_id: operation_id.into(),
        }
    }
}

/// `{ "success": true, ...payload }` envelope for read endpoints.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
