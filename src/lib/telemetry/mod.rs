pub mod events;
pub mod instrument;
pub mod logging;
pub mod metrics;

pub use instrument::panic_message;
pub use logging::init_logging;
pub use metrics::{HttpLabels, RequestTypeLabels, TodoMetrics};

use std::sync::Arc;
use std::time::Duration;

use prometheus_client::registry::Registry;

pub const SERVICE_NAME: &str = "todo_telemetry";

/// Process-scoped telemetry handle. Cheap to clone; every clone shares the
/// same registry and instruments, which are safe for concurrent updates.
#[derive(Clone)]
pub struct Telemetry {
    inner: Arc<TelemetryInner>,
}

struct TelemetryInner {
    registry: Registry,
    metrics: TodoMetrics,
}

impl Telemetry {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix(SERVICE_NAME);
        let metrics = TodoMetrics::new(&mut registry);
        Self {
            inner: Arc::new(TelemetryInner { registry, metrics }),
        }
    }

    pub fn metrics(&self) -> &TodoMetrics {
        &self.inner.metrics
    }

    pub fn todo_created(&self) {
        self.inner.metrics.items_created.inc();
    }

    pub fn todo_completed(&self) {
        self.inner.metrics.items_completed.inc();
    }

    pub fn record_request_duration(&self, request_type: &str, elapsed: Duration) {
        self.inner
            .metrics
            .request_duration_ms
            .get_or_create(&RequestTypeLabels {
                request_type: request_type.to_string(),
            })
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        self.inner
            .metrics
            .http_request_duration_ms
            .get_or_create(&HttpLabels {
                method: method.to_string(),
                path: path.to_string(),
                status: status.to_string(),
            })
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    /// OpenMetrics text exposition of every registered instrument.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &self.inner.registry)?;
        Ok(buffer)
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}
