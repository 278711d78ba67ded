//! Route definitions for the `/macros` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{events, macros};
use crate::state::AppState;

/// Routes mounted at `/macros`.
///
/// ```text
/// GET    /zones                          -> list_zones
/// POST   /move                           -> move_zone
/// POST   /copy                           -> copy_zone
/// POST   /delete                         -> delete_zone
/// POST   /undelete                       -> undelete
/// GET    /deleted-records                -> deleted_records
/// DELETE /deleted-records/{record_id}    -> prune_record
/// GET    /deleted-details                -> deleted_details (?recordId=)
/// POST   /auto-grid                      -> auto_grid
/// POST   /group-color                    -> group_color
/// POST   /group-title                    -> group_title
/// POST   /pin-all                        -> pin_all
/// POST   /unpin-all                      -> unpin_all
/// GET    /events                         -> stream_events (SSE)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/zones", get(macros::list_zones))
        .route("/move", post(macros::move_zone))
        .route("/copy", post(macros::copy_zone))
        .route("/delete", post(macros::delete_zone))
        .route("/undelete", post(macros::undelete))
        .route("/deleted-records", get(macros::deleted_records))
        .route("/deleted-records/{record_id}", delete(macros::prune_record))
        .route("/deleted-details", get(macros::deleted_details))
        .route("/auto-grid", post(macros::auto_grid))
        .route("/group-color", post(macros::group_color))
        .route("/group-title", post(macros::group_title))
        .route("/pin-all", post(macros::pin_all))
        .route("/unpin-all", post(macros::unpin_all))
        .route("/events", get(events::stream_events))
}
