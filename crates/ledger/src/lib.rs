//! Deletion ledger: an append-mostly log of deleted-widget snapshots.
//!
//! Every delete macro writes one [`DeletionRecord`] holding the full widget
//! records and the geometry of the zone they were deleted from, so that the
//! batch can later be restored into any zone. The ledger keeps at most
//! `retention` records and evicts the oldest first.

pub mod record;
pub mod store;

pub use record::{DeletionRecord, LedgerEntry, RecordSummary};
pub use store::{DeletionLedger, LedgerError, DEFAULT_RETENTION};
