/// Opaque widget identifier assigned by the remote canvas service.
pub type WidgetId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
