use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use zoneops_core::geometry::BoundingBox;
use zoneops_core::types::Timestamp;
use zoneops_core::widget::{Widget, WidgetType};

/// One delete macro invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRecord {
    pub record_id: String,
    pub timestamp: Timestamp,
    pub zone_id: String,
    /// Zone geometry at the time of deletion; the source frame on restore.
    pub zone_bounding_box: BoundingBox,
    pub widgets: Vec<Widget>,
}

/// Listing row for a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub record_id: String,
    pub timestamp: Timestamp,
    pub zone_id: String,
    pub count: usize,
}

/// Widget count of a record, broken down by type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    pub count: usize,
    pub types: BTreeMap<WidgetType, usize>,
}

impl DeletionRecord {
    /// Snapshot a batch of widgets under a fresh record id.
    pub fn new(zone_id: impl Into<String>, zone_bounding_box: BoundingBox, widgets: Vec<Widget>) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            zone_id: zone_id.into(),
            zone_bounding_box,
            widgets,
        }
    }

    pub fn summarize(&self) -> RecordSummary {
        let mut types = BTreeMap::new();
        for widget in &self.widgets {
            *types.entry(widget.widget_type).or_insert(0) += 1;
        }
        RecordSummary {
            count: self.widgets.len(),
            types,
        }
    }

    pub fn entry(&self) -> LedgerEntry {
        LedgerEntry {
            record_id: self.record_id.clone(),
            timestamp: self.timestamp,
            zone_id: self.zone_id.clone(),
            count: self.widgets.len(),
        }
    }
}
