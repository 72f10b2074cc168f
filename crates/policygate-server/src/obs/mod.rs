//! Lightweight in-process metrics.
//!
//! Decision counters, error counters and latency histograms stored as atomics
//! and rendered by the `/metrics` handler in Prometheus text format.

pub mod metrics;

pub use metrics::EvaluatorMetrics;
