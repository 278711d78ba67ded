//! Operator macros over zones.
//!
//! Every macro follows the same shape: validate input, resolve zone
//! geometry and the current widget listing (any failure here aborts the
//! macro with nothing mutated), select the zone's members, then hand the
//! per-widget work to a [`BulkMutator`]. Per-widget failures only show up
//! in the returned [`MacroReport`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use zoneops_canvas::{with_retry, CanvasApi, RetryPolicy};
use zoneops_core::geometry::{select_positioned, select_zone_members, BoundingBox};
use zoneops_core::layout::{self, ColumnSettings, GridSettings, Placement};
use zoneops_core::transform::transform;
use zoneops_core::types::WidgetId;
use zoneops_core::widget::{Widget, WidgetType, Zone};
use zoneops_events::{ProgressSink, ProgressUpdate};
use zoneops_ledger::{DeletionLedger, DeletionRecord, LedgerEntry, RecordSummary};

use crate::error::MacroError;
use crate::mutator::{BulkMutator, BulkOutcome, Patch};

/// Tunables shared by all macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroSettings {
    /// Inward margin applied to zone edges when testing membership.
    pub zone_margin: f64,
    pub retry: RetryPolicy,
    pub grid: GridSettings,
    pub columns: ColumnSettings,
}

/// Outcome of one macro invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroReport {
    pub message: String,
    /// Widgets the macro applied to successfully.
    pub count: usize,
    pub failed: usize,
    /// Original ids that could not be processed because a dependency was
    /// never satisfied.
    pub unresolved: Vec<WidgetId>,
    /// Ledger record written by a delete.
    pub record_id: Option<String>,
}

impl MacroReport {
    fn from_outcome(verb: &str, outcome: &BulkOutcome) -> Self {
        let attempted = outcome.attempted();
        let mut message = if attempted == outcome.succeeded {
            format!("{verb} {}", widgets(outcome.succeeded))
        } else {
            format!("{verb} {} of {}", outcome.succeeded, widgets(attempted))
        };
        if !outcome.failed.is_empty() {
            message.push_str(&format!(", {} failed", outcome.failed.len()));
        }
        if !outcome.unresolved.is_empty() {
            message.push_str(&format!(", {} unresolved", outcome.unresolved.len()));
        }

        Self {
            message,
            count: outcome.succeeded,
            failed: outcome.failed.len(),
            unresolved: outcome.unresolved.clone(),
            record_id: None,
        }
    }
}

fn widgets(n: usize) -> String {
    if n == 1 {
        "1 widget".to_string()
    } else {
        format!("{n} widgets")
    }
}

/// Runs operator macros against one canvas.
pub struct MacroEngine {
    api: Arc<dyn CanvasApi>,
    ledger: Arc<DeletionLedger>,
    settings: MacroSettings,
}

impl MacroEngine {
    pub fn new(api: Arc<dyn CanvasApi>, ledger: Arc<DeletionLedger>, settings: MacroSettings) -> Self {
        Self {
            api,
            ledger,
            settings,
        }
    }

    pub fn settings(&self) -> &MacroSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &DeletionLedger {
        &self.ledger
    }

    // ---- zones ----

    pub async fn list_zones(&self) -> Result<Vec<Zone>, MacroError> {
        let zones = with_retry(&self.settings.retry, "list_zones", || self.api.list_zones()).await?;
        Ok(zones)
    }

    /// Move every widget of the source zone into the target zone, rescaled
    /// by the ratio of the zone widths. Ids are stable, so each widget is
    /// patched independently; connectors follow their endpoints.
    pub async fn move_zone(
        &self,
        source_zone_id: &str,
        target_zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        let result = self.run_move(source_zone_id, target_zone_id, progress).await;
        finish(progress, result)
    }

    /// Copy every widget of the source zone, connectors included, into the
    /// target zone.
    pub async fn copy_zone(
        &self,
        source_zone_id: &str,
        target_zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        let result = self.run_copy(source_zone_id, target_zone_id, progress).await;
        finish(progress, result)
    }

    /// Snapshot the zone's widgets into the ledger, then delete them.
    pub async fn delete_zone(
        &self,
        zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        let result = self.run_delete(zone_id, progress).await;
        finish(progress, result)
    }

    /// Recreate a deleted batch inside the target zone, using the zone it
    /// was deleted from as the source frame.
    pub async fn undelete(
        &self,
        record_id: &str,
        target_zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        let result = self.run_undelete(record_id, target_zone_id, progress).await;
        finish(progress, result)
    }

    // ---- ledger ----

    /// Ledger entries, newest first.
    pub async fn deleted_records(&self) -> Result<Vec<LedgerEntry>, MacroError> {
        Ok(self.ledger.list().await?)
    }

    pub async fn deleted_details(&self, record_id: &str) -> Result<RecordSummary, MacroError> {
        require_id("recordId", record_id)?;
        Ok(self.find_record(record_id).await?.summarize())
    }

    pub async fn prune_record(&self, record_id: &str) -> Result<(), MacroError> {
        require_id("recordId", record_id)?;
        if !self.ledger.remove(record_id).await? {
            return Err(MacroError::RecordNotFound(record_id.to_string()));
        }
        Ok(())
    }

    // ---- layout ----

    pub async fn auto_grid(&self, zone_id: &str, progress: &dyn ProgressSink) -> Result<MacroReport, MacroError> {
        let grid = self.settings.grid;
        let result = self
            .arrange(zone_id, progress, |members, bbox| layout::auto_grid(members, bbox, &grid))
            .await;
        finish(progress, result)
    }

    /// Arrange the zone in one column per color cluster. `tolerance` is a
    /// percentage in `0..=100`.
    pub async fn group_by_color(
        &self,
        zone_id: &str,
        tolerance: f64,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        let result = self.run_group_by_color(zone_id, tolerance, progress).await;
        finish(progress, result)
    }

    pub async fn group_by_title(&self, zone_id: &str, progress: &dyn ProgressSink) -> Result<MacroReport, MacroError> {
        let columns = self.settings.columns;
        let result = self
            .arrange(zone_id, progress, |members, bbox| {
                layout::layout_columns(&layout::group_by_title(members), bbox, &columns)
            })
            .await;
        finish(progress, result)
    }

    /// Pin or unpin every positioned widget in the zone.
    pub async fn set_pinned(
        &self,
        zone_id: &str,
        pinned: bool,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        let result = self.run_set_pinned(zone_id, pinned, progress).await;
        finish(progress, result)
    }

    // ---- private helpers ----

    async fn run_move(
        &self,
        source_zone_id: &str,
        target_zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        require_id("sourceZoneId", source_zone_id)?;
        require_id("targetZoneId", target_zone_id)?;

        let source = self.zone_box(source_zone_id).await?;
        let target = self.zone_box(target_zone_id).await?;
        let members = select_positioned(&self.fetch_widgets().await?, &source, self.settings.zone_margin);

        let patches: Vec<Patch> = members
            .iter()
            .filter_map(|widget| {
                let moved = transform(widget, &source, &target);
                Some(Patch::new(
                    widget.widget_type,
                    widget.id.clone()?,
                    json!({ "location": moved.location?, "scale": moved.scale }),
                ))
            })
            .collect();

        tracing::info!(
            source_zone_id,
            target_zone_id,
            widgets = patches.len(),
            "Moving zone contents",
        );
        progress.report(ProgressUpdate::Started { total: patches.len() });
        let outcome = self.mutator(progress).patch_all(patches).await;
        Ok(MacroReport::from_outcome("Moved", &outcome))
    }

    async fn run_copy(
        &self,
        source_zone_id: &str,
        target_zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        require_id("sourceZoneId", source_zone_id)?;
        require_id("targetZoneId", target_zone_id)?;

        let source = self.zone_box(source_zone_id).await?;
        let target = self.zone_box(target_zone_id).await?;
        let all = self.fetch_widgets().await?;
        let members = select_zone_members(&all, &source, self.settings.zone_margin);
        let copies: Vec<Widget> = members.iter().map(|w| transform(w, &source, &target)).collect();

        tracing::info!(
            source_zone_id,
            target_zone_id,
            widgets = copies.len(),
            "Copying zone contents",
        );
        progress.report(ProgressUpdate::Started { total: copies.len() });
        let outcome = self
            .mutator(progress)
            .create_ordered(copies, &existing_ids(&all))
            .await;
        Ok(MacroReport::from_outcome("Copied", &outcome))
    }

    async fn run_delete(
        &self,
        zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        require_id("zoneId", zone_id)?;

        let bbox = self.zone_box(zone_id).await?;
        let members = select_zone_members(&self.fetch_widgets().await?, &bbox, self.settings.zone_margin);

        let record = DeletionRecord::new(zone_id, bbox, members.clone());
        let record_id = record.record_id.clone();
        self.ledger.append(record).await?;

        tracing::info!(zone_id, record_id = %record_id, widgets = members.len(), "Deleting zone contents");
        progress.report(ProgressUpdate::Started { total: members.len() });
        let outcome = self.mutator(progress).delete_all(&members).await;

        let mut report = MacroReport::from_outcome("Deleted", &outcome);
        report.record_id = Some(record_id);
        Ok(report)
    }

    async fn run_undelete(
        &self,
        record_id: &str,
        target_zone_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        require_id("recordId", record_id)?;
        require_id("targetZoneId", target_zone_id)?;

        let record = self.find_record(record_id).await?;
        let target = self.zone_box(target_zone_id).await?;
        let existing = existing_ids(&self.fetch_widgets().await?);
        let restored: Vec<Widget> = record
            .widgets
            .iter()
            .map(|w| transform(w, &record.zone_bounding_box, &target))
            .collect();

        tracing::info!(record_id, target_zone_id, widgets = restored.len(), "Restoring deleted widgets");
        progress.report(ProgressUpdate::Started { total: restored.len() });
        let outcome = self.mutator(progress).create_ordered(restored, &existing).await;
        Ok(MacroReport::from_outcome("Restored", &outcome))
    }

    async fn run_group_by_color(
        &self,
        zone_id: &str,
        tolerance: f64,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        if !(0.0..=100.0).contains(&tolerance) {
            return Err(MacroError::Validation(format!(
                "tolerance must be between 0 and 100, got {tolerance}"
            )));
        }
        let columns = self.settings.columns;
        self.arrange(zone_id, progress, |members, bbox| {
            layout::layout_columns(&layout::group_by_color(members, tolerance), bbox, &columns)
        })
        .await
    }

    async fn run_set_pinned(
        &self,
        zone_id: &str,
        pinned: bool,
        progress: &dyn ProgressSink,
    ) -> Result<MacroReport, MacroError> {
        require_id("zoneId", zone_id)?;
        let bbox = self.zone_box(zone_id).await?;
        let members = select_positioned(&self.fetch_widgets().await?, &bbox, self.settings.zone_margin);

        let patches: Vec<Patch> = members
            .iter()
            .filter_map(|w| Some(Patch::new(w.widget_type, w.id.clone()?, json!({ "pinned": pinned }))))
            .collect();

        progress.report(ProgressUpdate::Started { total: patches.len() });
        let outcome = self.mutator(progress).patch_all(patches).await;
        Ok(MacroReport::from_outcome(if pinned { "Pinned" } else { "Unpinned" }, &outcome))
    }

    fn mutator<'a>(&'a self, progress: &'a dyn ProgressSink) -> BulkMutator<'a> {
        BulkMutator::new(self.api.as_ref(), self.settings.retry, progress)
    }

    async fn zone_box(&self, zone_id: &str) -> Result<BoundingBox, MacroError> {
        let zone = with_retry(&self.settings.retry, "get_zone", || self.api.get_zone(zone_id)).await?;
        Ok(BoundingBox::of_zone(&zone)?)
    }

    async fn fetch_widgets(&self) -> Result<Vec<Widget>, MacroError> {
        let widgets = with_retry(&self.settings.retry, "list_widgets", || self.api.list_widgets()).await?;
        Ok(widgets)
    }

    async fn find_record(&self, record_id: &str) -> Result<DeletionRecord, MacroError> {
        self.ledger
            .find(record_id)
            .await?
            .ok_or_else(|| MacroError::RecordNotFound(record_id.to_string()))
    }

    /// Apply a layout computed over the zone's positioned widgets.
    async fn arrange<F>(&self, zone_id: &str, progress: &dyn ProgressSink, compute: F) -> Result<MacroReport, MacroError>
    where
        F: FnOnce(&[Widget], &BoundingBox) -> Vec<Placement>,
    {
        require_id("zoneId", zone_id)?;
        let bbox = self.zone_box(zone_id).await?;
        let members = select_positioned(&self.fetch_widgets().await?, &bbox, self.settings.zone_margin);

        let types: HashMap<&str, WidgetType> = members
            .iter()
            .filter_map(|w| Some((w.id()?, w.widget_type)))
            .collect();
        let patches: Vec<Patch> = compute(&members, &bbox)
            .into_iter()
            .filter_map(|p| {
                let widget_type = *types.get(p.widget_id.as_str())?;
                Some(Patch::new(
                    widget_type,
                    p.widget_id,
                    json!({ "location": p.location, "scale": p.scale }),
                ))
            })
            .collect();

        tracing::info!(zone_id, widgets = patches.len(), "Arranging zone");
        progress.report(ProgressUpdate::Started { total: patches.len() });
        let outcome = self.mutator(progress).patch_all(patches).await;
        Ok(MacroReport::from_outcome("Arranged", &outcome))
    }
}

fn require_id(field: &str, value: &str) -> Result<(), MacroError> {
    if value.trim().is_empty() {
        return Err(MacroError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn existing_ids(widgets: &[Widget]) -> HashSet<WidgetId> {
    widgets.iter().filter_map(|w| w.id.clone()).collect()
}

/// Report the terminal progress update for a macro result.
fn finish(progress: &dyn ProgressSink, result: Result<MacroReport, MacroError>) -> Result<MacroReport, MacroError> {
    match &result {
        Ok(report) => progress.report(ProgressUpdate::Completed {
            succeeded: report.count,
            failed: report.failed,
            unresolved: report.unresolved.len(),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Macro aborted");
            progress.report(ProgressUpdate::Failed { error: e.to_string() });
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_message_for_full_success() {
        let outcome = BulkOutcome {
            succeeded: 3,
            ..Default::default()
        };
        assert_eq!(MacroReport::from_outcome("Moved", &outcome).message, "Moved 3 widgets");
    }

    #[test]
    fn report_message_counts_failures_and_unresolved() {
        let outcome = BulkOutcome {
            succeeded: 1,
            failed: vec!["a".into()],
            unresolved: vec!["b".into(), "c".into()],
            ..Default::default()
        };
        let report = MacroReport::from_outcome("Copied", &outcome);
        assert_eq!(report.message, "Copied 1 of 4 widgets, 1 failed, 2 unresolved");
        assert_eq!(report.count, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.unresolved, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn report_message_singular() {
        let outcome = BulkOutcome {
            succeeded: 1,
            ..Default::default()
        };
        assert_eq!(MacroReport::from_outcome("Deleted", &outcome).message, "Deleted 1 widget");
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(require_id("zoneId", "  ").is_err());
        assert!(require_id("zoneId", "z1").is_ok());
    }
}
