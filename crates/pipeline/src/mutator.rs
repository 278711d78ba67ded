//! Dependency-ordered bulk mutation.
//!
//! Creates are resolved by repeated sweeps over the pending widgets. In each
//! sweep every widget whose dependencies already have new ids is submitted,
//! using the id map as it stood when the sweep began, so two widgets created
//! in the same sweep never observe each other. A child waits for its parent
//! (when the parent is part of the batch) and a connector waits for both of
//! its endpoints. Widgets that can never become ready (a cycle, a missing or
//! failed dependency) are reported as unresolved.
//!
//! Patches and deletes carry no identity remapping: patches are issued
//! independently, deletes run connectors first and then children before
//! their parents.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::pin;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use zoneops_canvas::{with_retry, CanvasApi, CanvasError, RetryPolicy};
use zoneops_core::types::WidgetId;
use zoneops_core::widget::{Widget, WidgetType};
use zoneops_events::{ProgressSink, ProgressUpdate};

/// Upper bound on dependency sweeps for one batch.
pub const MAX_SWEEPS: usize = 1000;

/// Concurrent remote calls within one batch or sweep.
pub const MAX_IN_FLIGHT: usize = 8;

/// Result of one bulk operation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BulkOutcome {
    /// Widgets whose operation succeeded.
    pub succeeded: usize,
    /// Original ids of widgets whose operation failed after retries.
    pub failed: Vec<WidgetId>,
    /// Original ids of widgets never submitted because a dependency could
    /// not be satisfied.
    pub unresolved: Vec<WidgetId>,
    /// Old id to new id, for create-type operations.
    pub id_map: HashMap<WidgetId, WidgetId>,
}

impl BulkOutcome {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed.len() + self.unresolved.len()
    }
}

/// Partial update of a single widget.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub widget_type: WidgetType,
    pub widget_id: WidgetId,
    pub fields: Value,
}

impl Patch {
    pub fn new(widget_type: WidgetType, widget_id: impl Into<WidgetId>, fields: Value) -> Self {
        Self {
            widget_type,
            widget_id: widget_id.into(),
            fields,
        }
    }
}

/// Whether `widget` may be created given the ids resolved so far.
pub fn can_process(
    widget: &Widget,
    candidates: &HashSet<WidgetId>,
    resolved: &HashMap<WidgetId, WidgetId>,
) -> bool {
    if widget.is_connector() {
        return widget.endpoint_ids().is_some_and(|(src, dst)| {
            candidates.contains(src)
                && candidates.contains(dst)
                && resolved.contains_key(src)
                && resolved.contains_key(dst)
        });
    }

    match widget.parent_id.as_deref() {
        None => true,
        Some(parent) => !candidates.contains(parent) || resolved.contains_key(parent),
    }
}

/// Create payload for `widget` with its references rewritten to new ids.
///
/// A parent outside the batch is dropped; connector endpoints are pointed at
/// the resolved copies.
pub fn remap_references(
    widget: &Widget,
    candidates: &HashSet<WidgetId>,
    resolved: &HashMap<WidgetId, WidgetId>,
) -> Widget {
    let mut payload = widget.to_create_payload();
    payload.parent_id = widget
        .parent_id
        .as_ref()
        .filter(|parent| candidates.contains(*parent))
        .and_then(|parent| resolved.get(parent).cloned());

    for endpoint in [payload.src.as_mut(), payload.dst.as_mut()].into_iter().flatten() {
        if let Some(new_id) = resolved.get(&endpoint.id) {
            endpoint.id = new_id.clone();
        }
    }
    payload
}

/// Group widgets into delete phases: connectors first, then non-connectors
/// from the deepest parent chain up to the roots.
pub fn deletion_phases(widgets: &[Widget]) -> Vec<Vec<&Widget>> {
    let by_id: HashMap<&str, &Widget> = widgets
        .iter()
        .filter_map(|w| Some((w.id()?, w)))
        .collect();

    let depth_of = |widget: &Widget| {
        let mut depth = 0;
        let mut parent = widget.parent_id.as_deref();
        while let Some(p) = parent {
            let Some(next) = by_id.get(p) else { break };
            depth += 1;
            if depth > widgets.len() {
                break;
            }
            parent = next.parent_id.as_deref();
        }
        depth
    };

    let connectors: Vec<&Widget> = widgets.iter().filter(|w| w.is_connector()).collect();
    let mut layered: Vec<(usize, &Widget)> = widgets
        .iter()
        .filter(|w| !w.is_connector())
        .map(|w| (depth_of(w), w))
        .collect();
    layered.sort_by(|a, b| b.0.cmp(&a.0));

    let mut phases: Vec<Vec<&Widget>> = Vec::new();
    if !connectors.is_empty() {
        phases.push(connectors);
    }
    let mut current_depth = None;
    for (depth, widget) in layered {
        if current_depth != Some(depth) {
            phases.push(Vec::new());
            current_depth = Some(depth);
        }
        if let Some(phase) = phases.last_mut() {
            phase.push(widget);
        }
    }
    phases
}

/// Executes bulk widget operations against a [`CanvasApi`].
pub struct BulkMutator<'a> {
    api: &'a dyn CanvasApi,
    retry: RetryPolicy,
    progress: &'a dyn ProgressSink,
}

impl<'a> BulkMutator<'a> {
    pub fn new(api: &'a dyn CanvasApi, retry: RetryPolicy, progress: &'a dyn ProgressSink) -> Self {
        Self {
            api,
            retry,
            progress,
        }
    }

    /// Create copies of `widgets` in dependency order.
    ///
    /// `widgets` keep their original ids, which key the returned id map.
    /// `existing_ids` are ids present on the canvas before the batch; they
    /// are never taken as the identity of a new copy when a create response
    /// omits the id.
    pub async fn create_ordered(
        &self,
        widgets: Vec<Widget>,
        existing_ids: &HashSet<WidgetId>,
    ) -> BulkOutcome {
        let mut pending: Vec<Widget> = Vec::with_capacity(widgets.len());
        for widget in widgets {
            if widget.id.is_some() {
                pending.push(widget);
            } else {
                tracing::warn!(widget_type = %widget.widget_type, "Skipping widget without id");
            }
        }

        let total = pending.len();
        let candidates: HashSet<WidgetId> = pending.iter().filter_map(|w| w.id.clone()).collect();
        let mut claimed: HashSet<WidgetId> = existing_ids.union(&candidates).cloned().collect();
        let mut outcome = BulkOutcome::default();
        let mut done = 0;

        for sweep in 1..=MAX_SWEEPS {
            if pending.is_empty() {
                break;
            }

            let (ready, blocked): (Vec<Widget>, Vec<Widget>) = pending
                .into_iter()
                .partition(|w| can_process(w, &candidates, &outcome.id_map));
            pending = blocked;
            if ready.is_empty() {
                tracing::warn!(
                    sweep,
                    remaining = pending.len(),
                    "No pending widget has its dependencies resolved",
                );
                break;
            }

            let payloads: Vec<(WidgetId, Widget)> = ready
                .iter()
                .filter_map(|w| {
                    let old_id = w.id.clone()?;
                    Some((old_id, remap_references(w, &candidates, &outcome.id_map)))
                })
                .collect();

            let creates: Vec<_> = payloads
                .iter()
                .map(|(_, payload)| self.create_one(payload))
                .collect();
            let results: Vec<Result<Option<WidgetId>, CanvasError>> =
                stream::iter(creates)
                    .buffered(MAX_IN_FLIGHT)
                    .collect()
                    .await;

            // Id recovery runs one widget at a time so that two same-sweep
            // copies with equal title and text cannot claim the same id.
            for ((old_id, payload), result) in payloads.iter().zip(results) {
                let created = match result {
                    Ok(Some(new_id)) => Ok(new_id),
                    Ok(None) => self.recover_id(payload, &claimed).await,
                    Err(e) => Err(e),
                };
                match created {
                    Ok(new_id) => {
                        tracing::debug!(old_id = %old_id, new_id = %new_id, "Widget created");
                        claimed.insert(new_id.clone());
                        outcome.id_map.insert(old_id.clone(), new_id);
                        outcome.succeeded += 1;
                    }
                    Err(e) => {
                        tracing::warn!(widget_id = %old_id, error = %e, "Failed to create widget");
                        outcome.failed.push(old_id.clone());
                    }
                }
            }

            done += payloads.len();
            self.progress.report(ProgressUpdate::Progress { done, total });
        }

        if !pending.is_empty() {
            outcome.unresolved = pending.iter().filter_map(|w| w.id.clone()).collect();
            tracing::warn!(
                unresolved = ?outcome.unresolved,
                "Widgets left unresolved after dependency sweeps",
            );
        }
        outcome
    }

    /// Apply independent patches.
    pub async fn patch_all(&self, patches: Vec<Patch>) -> BulkOutcome {
        let total = patches.len();
        let mut outcome = BulkOutcome::default();
        let mut done = 0;

        let operations = patches.iter().map(|patch| async move {
            let result = with_retry(&self.retry, "update_widget", || {
                self.api
                    .update_widget(patch.widget_type, &patch.widget_id, &patch.fields)
            })
            .await;
            (patch.widget_id.clone(), result)
        }).collect::<Vec<_>>();
        self.drive(operations, total, &mut done, &mut outcome).await;
        outcome
    }

    /// Delete widgets best-effort, connectors first and children before
    /// their parents.
    pub async fn delete_all(&self, widgets: &[Widget]) -> BulkOutcome {
        let phases = deletion_phases(widgets);
        let total = phases.iter().map(Vec::len).sum();
        let mut outcome = BulkOutcome::default();
        let mut done = 0;

        for phase in phases {
            let operations = phase.into_iter().filter_map(|widget| {
                let id = widget.id.clone()?;
                let widget_type = widget.widget_type;
                Some(async move {
                    let result = with_retry(&self.retry, "delete_widget", || {
                        self.api.delete_widget(widget_type, &id)
                    })
                    .await;
                    (id, result)
                })
            }).collect::<Vec<_>>();
            self.drive(operations, total, &mut done, &mut outcome).await;
        }
        outcome
    }

    // ---- private helpers ----

    async fn create_one(&self, payload: &Widget) -> Result<Option<WidgetId>, CanvasError> {
        with_retry(&self.retry, "create_widget", || self.api.create_widget(payload)).await
    }

    /// Find the id of a just-created widget by `(title, text)` equality,
    /// skipping ids that existed before or were already claimed. Among the
    /// remaining matches, one placed at the payload's location wins;
    /// otherwise the oldest listed match is taken.
    async fn recover_id(
        &self,
        payload: &Widget,
        claimed: &HashSet<WidgetId>,
    ) -> Result<WidgetId, CanvasError> {
        let widget_type = payload.widget_type;
        let listing = with_retry(&self.retry, "list_collection", || {
            self.api.list_collection(widget_type)
        })
        .await?;

        let matches: Vec<Widget> = listing
            .into_iter()
            .filter(|w| w.title == payload.title && w.text == payload.text)
            .filter(|w| w.id.as_ref().is_some_and(|id| !claimed.contains(id)))
            .collect();

        let placed = matches
            .iter()
            .position(|w| payload.location.is_some() && w.location == payload.location)
            .unwrap_or(0);
        matches
            .into_iter()
            .nth(placed)
            .and_then(|w| w.id)
            .ok_or(CanvasError::MissingId { widget_type })
    }

    /// Run unit operations with bounded concurrency, tallying the results.
    async fn drive<I, F>(&self, operations: I, total: usize, done: &mut usize, outcome: &mut BulkOutcome)
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = (WidgetId, Result<(), CanvasError>)>,
    {
        let mut results = pin!(stream::iter(operations).buffered(MAX_IN_FLIGHT));
        while let Some((widget_id, result)) = results.next().await {
            *done += 1;
            match result {
                Ok(()) => outcome.succeeded += 1,
                Err(e) => {
                    tracing::warn!(widget_id = %widget_id, error = %e, "Widget operation failed");
                    outcome.failed.push(widget_id);
                }
            }
            self.progress.report(ProgressUpdate::Progress { done: *done, total });
        }
    }
}
