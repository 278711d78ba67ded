//! Handlers for the `/macros` resource.
//!
//! Every mutating macro runs to completion inside the request and answers
//! with a [`MacroResponse`]. Progress is published on the event bus under
//! the response's `operationId` while the macro runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use zoneops_core::widget::{WidgetType, Zone};
use zoneops_events::BusProgress;
use zoneops_ledger::LedgerEntry;

use crate::error::{AppError, AppResult};
use crate::response::{MacroResponse, SuccessResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `move` and `copy`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ZonePairRequest {
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub source_zone_id: Option<String>,
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub target_zone_id: Option<String>,
}

/// Body of the single-zone macros.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRequest {
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub zone_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UndeleteRequest {
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub record_id: Option<String>,
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub target_zone_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GroupColorRequest {
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub zone_id: Option<String>,
    /// Percentage of the maximum RGB distance.
    #[validate(
        required(message = "is required"),
        range(min = 0.0, max = 100.0, message = "must be between 0 and 100")
    )]
    pub tolerance: Option<f64>,
}

/// Query parameters for the record details endpoint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub record_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Zone as listed to operators.
#[derive(Debug, Serialize)]
pub struct ZoneView {
    pub id: String,
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl From<Zone> for ZoneView {
    fn from(zone: Zone) -> Self {
        Self {
            id: zone.id,
            name: zone.anchor_name,
            x: zone.location.x,
            y: zone.location.y,
            width: zone.size.width,
            height: zone.size.height,
            scale: zone.scale.unwrap_or(1.0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ZoneList {
    pub zones: Vec<ZoneView>,
}

#[derive(Debug, Serialize)]
pub struct RecordList {
    pub records: Vec<LedgerEntry>,
}

#[derive(Debug, Serialize)]
pub struct RecordDetails {
    pub count: usize,
    pub types: BTreeMap<WidgetType, usize>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// GET /macros/zones
///
/// List the canvas anchors usable as source or target zones.
pub async fn list_zones(State(state): State<AppState>) -> AppResult<Json<SuccessResponse<ZoneList>>> {
    let zones = state.engine.list_zones().await?;
    Ok(Json(SuccessResponse::new(ZoneList {
        zones: zones.into_iter().map(ZoneView::from).collect(),
    })))
}

// ---------------------------------------------------------------------------
// Move / copy / delete / undelete
// ---------------------------------------------------------------------------

/// POST /macros/move
pub async fn move_zone(
    State(state): State<AppState>,
    payload: Result<Json<ZonePairRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let progress = progress_sink(&state, "move");
    let report = state
        .engine
        .move_zone(&field(body.source_zone_id), &field(body.target_zone_id), &progress)
        .await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

/// POST /macros/copy
pub async fn copy_zone(
    State(state): State<AppState>,
    payload: Result<Json<ZonePairRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let progress = progress_sink(&state, "copy");
    let report = state
        .engine
        .copy_zone(&field(body.source_zone_id), &field(body.target_zone_id), &progress)
        .await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

/// POST /macros/delete
///
/// Snapshots the zone into the deletion ledger before deleting; the
/// response carries the new `recordId`.
pub async fn delete_zone(
    State(state): State<AppState>,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let progress = progress_sink(&state, "delete");
    let report = state.engine.delete_zone(&field(body.zone_id), &progress).await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

/// POST /macros/undelete
pub async fn undelete(
    State(state): State<AppState>,
    payload: Result<Json<UndeleteRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let progress = progress_sink(&state, "undelete");
    let report = state
        .engine
        .undelete(&field(body.record_id), &field(body.target_zone_id), &progress)
        .await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

// ---------------------------------------------------------------------------
// Deletion ledger
// ---------------------------------------------------------------------------

/// GET /macros/deleted-records
///
/// Ledger entries, newest first.
pub async fn deleted_records(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<RecordList>>> {
    let records = state.engine.deleted_records().await?;
    Ok(Json(SuccessResponse::new(RecordList { records })))
}

/// GET /macros/deleted-details?recordId=
pub async fn deleted_details(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<SuccessResponse<RecordDetails>>> {
    query.validate()?;
    let summary = state.engine.deleted_details(&field(query.record_id)).await?;
    Ok(Json(SuccessResponse::new(RecordDetails {
        count: summary.count,
        types: summary.types,
    })))
}

/// DELETE /macros/deleted-records/{record_id}
pub async fn prune_record(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> AppResult<Json<SuccessResponse<Message>>> {
    state.engine.prune_record(&record_id).await?;
    Ok(Json(SuccessResponse::new(Message {
        message: format!("Deleted record {record_id} removed"),
    })))
}

// ---------------------------------------------------------------------------
// Layout and pinning
// ---------------------------------------------------------------------------

/// POST /macros/auto-grid
pub async fn auto_grid(
    State(state): State<AppState>,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let progress = progress_sink(&state, "auto-grid");
    let report = state.engine.auto_grid(&field(body.zone_id), &progress).await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

/// POST /macros/group-color
pub async fn group_color(
    State(state): State<AppState>,
    payload: Result<Json<GroupColorRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let tolerance = body.tolerance.unwrap_or_default();
    let progress = progress_sink(&state, "group-color");
    let report = state
        .engine
        .group_by_color(&field(body.zone_id), tolerance, &progress)
        .await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

/// POST /macros/group-title
pub async fn group_title(
    State(state): State<AppState>,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let progress = progress_sink(&state, "group-title");
    let report = state.engine.group_by_title(&field(body.zone_id), &progress).await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

/// POST /macros/pin-all
pub async fn pin_all(
    State(state): State<AppState>,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    set_pinned(state, payload, true).await
}

/// POST /macros/unpin-all
pub async fn unpin_all(
    State(state): State<AppState>,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
) -> AppResult<Json<MacroResponse>> {
    set_pinned(state, payload, false).await
}

async fn set_pinned(
    state: AppState,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
    pinned: bool,
) -> AppResult<Json<MacroResponse>> {
    let body = validated(payload)?;
    let progress = progress_sink(&state, if pinned { "pin-all" } else { "unpin-all" });
    let report = state
        .engine
        .set_pinned(&field(body.zone_id), pinned, &progress)
        .await?;
    Ok(Json(MacroResponse::new(report, progress.operation_id())))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Unwrap a JSON body and run its validation rules.
fn validated<T: Validate>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    let Json(body) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    body.validate()?;
    Ok(body)
}

/// A validated required field. Validation already rejected `None`.
fn field(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn progress_sink(state: &AppState, macro_name: &str) -> BusProgress {
    BusProgress::new(
        Arc::clone(&state.event_bus),
        uuid::Uuid::new_v4().to_string(),
        macro_name,
    )
}
