// Prospect log: the append-only table of generation results, one per session.
// Mirrored to a CSV snapshot when PROSPECT_SNAPSHOT_DIR is configured.

pub mod annotate;
pub mod handlers;
pub mod log;
pub mod models;
pub mod sessions;
pub mod snapshot;
