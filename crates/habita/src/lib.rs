//! Core library for the Habita advisor reputation ledger.
//!
//! The marketplace converts discrete business events (closed sales, reviews,
//! no-shows, policy violations) into a durable per-advisor point score and a
//! derived reputation tier. This crate owns that subsystem end to end: the
//! event taxonomy, the append-only ledger, the versioned aggregate, and the
//! engine that commits both with exactly-once semantics.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
