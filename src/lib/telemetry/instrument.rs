//! Cross-cutting wrapper applied to every command and query invocation.
//!
//! Opens a span named after the operation, times the call, records the
//! duration into the shared `request_duration_ms` histogram and tags the span
//! with the outcome. Faults are tagged with their message and kind and then
//! handed back to the caller unchanged. A panicking call is timed and tagged
//! with kind `Panic` before the unwind continues.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use futures::FutureExt;
use tracing::{Instrument, field};

use crate::core::{AppError, Outcome};

use super::Telemetry;

impl Telemetry {
    pub async fn instrumented<T, F>(&self, operation: &'static str, call: F) -> Result<Outcome<T>, AppError>
    where
        F: Future<Output = Result<Outcome<T>, AppError>>,
    {
        let span = tracing::info_span!(
            "handle_request",
            otel.name = %format!("Handle{operation}"),
            request_type = operation,
            request.success = field::Empty,
            error.message = field::Empty,
            error.kind = field::Empty,
        );
        let started = Instant::now();
        let caught = AssertUnwindSafe(call.instrument(span.clone())).catch_unwind().await;
        self.record_request_duration(operation, started.elapsed());

        let result = match caught {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                span.record("request.success", false);
                span.record("error.message", message);
                span.record("error.kind", "Panic");
                span.in_scope(|| tracing::error!(panic = message, "request panicked"));
                panic::resume_unwind(payload);
            }
        };

        match &result {
            Ok(outcome) => {
                span.record("request.success", outcome.is_success());
            }
            Err(err) => {
                span.record("request.success", false);
                span.record("error.message", field::display(err));
                span.record("error.kind", err.kind());
                span.in_scope(|| tracing::debug!(error = %err, kind = err.kind(), "request failed"));
            }
        }
        result
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
}
