// src/infrastructure/metrics/mod.rs
pub mod noop;
pub mod prometheus;

// Selected at startup by ADMIN_METRICS_TYPE
pub use noop::create as create_noop_metrics;
pub use prometheus::create as create_prom_metrics;
