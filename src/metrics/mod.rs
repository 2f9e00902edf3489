//! # Observabilidad
//! src/metrics/mod.rs
//!
//! Los dos colaboradores que el núcleo del servidor alimenta:
//! - `stats`: contadores atómicos de requests, bytes y tiempos
//! - `event_log`: tabla de estados por entidad (aceptador y workers)

pub mod event_log;
pub mod stats;

pub use event_log::{Entity, EventLog};
pub use stats::{ServerStats, StatsFormat, StatsSnapshot};
