//! Structured lifecycle events for apply requests and discovery calls.
//!
//! Every event carries an `event` field so log pipelines can filter on it:
//! `apply.started`, `apply.stage`, `apply.finished`, `apply.failed`,
//! `labels.skipped`, `discovery.category_failed`.

use tracing::{info, warn};

/// Request-scoped span for one apply request.
///
/// Attach it with `tracing::Instrument` so it stays correct across awaits.
pub fn apply_span(request_id: &str, repository: &str) -> tracing::Span {
    tracing::info_span!("specflow.apply", request_id = %request_id, repository = %repository)
}

pub fn emit_apply_started(request_id: &str, repository: &str, spec_path: &str) {
    info!(
        event = "apply.started",
        request_id = %request_id,
        repository = %repository,
        spec_path = %spec_path,
    );
}

/// Emit event: the pipeline entered `stage`.
pub fn emit_apply_stage(request_id: &str, stage: &str) {
    info!(event = "apply.stage", request_id = %request_id, stage = %stage);
}

pub fn emit_apply_finished(
    request_id: &str,
    duration_ms: u64,
    branch: &str,
    pr_number: u64,
    warnings: usize,
    labels_applied: bool,
) {
    info!(
        event = "apply.finished",
        request_id = %request_id,
        duration_ms = duration_ms,
        branch = %branch,
        pr_number = pr_number,
        warnings = warnings,
        labels_applied = labels_applied,
        success = true,
    );
}

/// Emit event: the pipeline stopped at `stage` (warning level).
pub fn emit_apply_failed(
    request_id: &str,
    duration_ms: u64,
    stage: &str,
    category: &str,
    error: &dyn std::fmt::Display,
) {
    warn!(
        event = "apply.failed",
        request_id = %request_id,
        duration_ms = duration_ms,
        stage = %stage,
        error_category = %category,
        error = %error,
        success = false,
    );
}

pub fn emit_labels_skipped(request_id: &str, pr_number: u64) {
    warn!(event = "labels.skipped", request_id = %request_id, pr_number = pr_number);
}

/// Emit event: one discovery category degraded to an empty list.
pub fn emit_discovery_category_failed(category: &str, code: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "discovery.category_failed",
        category = %category,
        error_code = %code,
        error = %error,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_span_enters() {
        let _guard = apply_span("req-1", "acme/infra").entered();
        emit_apply_stage("req-1", "validating");
    }
}
