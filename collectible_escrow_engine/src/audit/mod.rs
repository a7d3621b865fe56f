//! # Order audit log
//!
//! The tracking page shows one timeline per order, stitched together from two records that evolve independently:
//!
//! * chain-derived entries, built from the delivery-tracking contract's event log. These are authoritative.
//! * local-derived entries, synthesised from the mirror's lifecycle timestamps. These are always available.
//!
//! [`merge_audit_logs`] decides precedence, and [`Reconciler`] fetches chain data with a uniform fallback: whenever the
//! chain cannot be read, the timeline is built from local entries alone.
mod entries;
mod merge;
mod reconciler;

pub use entries::{chain_entry, local_entries, AuditLogEntry, AuditStatus, SortKey};
pub use merge::{compare_entries, merge_audit_logs, sort_audit_log};
pub use reconciler::{AuditLog, AuditSource, Reconciler, TransactionDetails, TxStatus, DEFAULT_CHAIN_TIMEOUT};
