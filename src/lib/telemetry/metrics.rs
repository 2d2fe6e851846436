use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

const DURATION_BUCKETS_MS: [f64; 12] = [
    1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
];

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestTypeLabels {
    /// Operation name, e.g. "CreateTodo".
    pub request_type: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct HttpLabels {
    pub method: String,
    /// Matched route template, not the raw URI.
    pub path: String,
    pub status: String,
}

/// Instruments owned by the process-wide [`super::Telemetry`] handle.
pub struct TodoMetrics {
    pub items_created: Counter,
    pub items_completed: Counter,
    pub request_duration_ms: Family<RequestTypeLabels, Histogram>,
    pub http_request_duration_ms: Family<HttpLabels, Histogram>,
}

impl TodoMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let items_created = Counter::default();
        registry.register(
            "todo_items_created",
            "Number of todo items created",
            items_created.clone(),
        );

        let items_completed = Counter::default();
        registry.register(
            "todo_items_completed",
            "Number of todo items marked as completed",
            items_completed.clone(),
        );

        let request_duration_ms = Family::<RequestTypeLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(DURATION_BUCKETS_MS.iter().copied())
        });
        registry.register(
            "request_duration_ms",
            "Duration of command and query handling in milliseconds",
            request_duration_ms.clone(),
        );

        let http_request_duration_ms = Family::<HttpLabels, Histogram>::new_with_constructor(|| {
            Histogram::new(DURATION_BUCKETS_MS.iter().copied())
        });
        registry.register(
            "http_request_duration_ms",
            "Duration of HTTP requests in milliseconds",
            http_request_duration_ms.clone(),
        );

        Self {
            items_created,
            items_completed,
            request_duration_ms,
            http_request_duration_ms,
        }
    }
}
