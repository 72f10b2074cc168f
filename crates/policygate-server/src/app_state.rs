//! Shared application state for the decision service.

use std::sync::Arc;

use policygate_core::error::Result;

use crate::config::ServerConfig;
use crate::evaluator::{self, InstrumentedEvaluator, PolicyEvaluator};
use crate::obs::EvaluatorMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    evaluator: InstrumentedEvaluator,
    metrics: Arc<EvaluatorMetrics>,
}

impl AppState {
    /// Build the configured evaluator and wrap it with metrics.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let backend = evaluator::from_config(&cfg.evaluator)?;
        Ok(Self::with_evaluator(cfg, backend))
    }

    /// Serve a caller-supplied evaluator (tests, embedding).
    pub fn with_evaluator(cfg: ServerConfig, backend: Arc<dyn PolicyEvaluator>) -> Self {
        let metrics = Arc::new(EvaluatorMetrics::default());
        tracing::info!(backend = backend.backend(), "policy evaluator ready");
        let evaluator = InstrumentedEvaluator::new(backend, Arc::clone(&metrics));
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                evaluator,
                metrics,
            }),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn evaluator(&self) -> &dyn PolicyEvaluator {
        &self.inner.evaluator
    }

    pub fn metrics(&self) -> &EvaluatorMetrics {
        &self.inner.metrics
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }
}
