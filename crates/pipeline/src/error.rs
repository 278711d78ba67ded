use zoneops_canvas::CanvasError;
use zoneops_core::error::CoreError;
use zoneops_ledger::LedgerError;

/// Errors that abort a whole macro.
///
/// Failures of individual widget operations never surface here; they are
/// counted in the macro's report instead.
#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    /// Input rejected before any remote call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A zone or widget lookup against the canvas failed.
    #[error("Remote canvas lookup failed: {0}")]
    Remote(#[from] CanvasError),

    #[error("Deletion record {0} not found")]
    RecordNotFound(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
