//! Core library functions for festival contacts

pub mod sorting;
pub mod sync;

pub use sorting::{BookingRow, SortLib};
pub use sync::{SyncError, SyncService};
