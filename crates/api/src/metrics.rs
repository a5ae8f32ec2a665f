// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros,
//! a [`MeteredModel`] wrapper timing every language model call, and an
//! Axum-compatible metrics handler.

use std::{sync::LazyLock, time::Instant};

use agents::{ModerationDecision, PriceDecision};
use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use llm_client::{LanguageModel, LlmError, LlmResult};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};
use tracing::error;

/// Price suggestions served, labeled by source and fraud flag.
pub static PRICE_SUGGESTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "marketplace_price_suggestions_total",
        "Total number of price suggestions, labeled by source and fraud_flag",
        &["source", "fraud_flag"]
    )
    .expect("Failed to create marketplace_price_suggestions_total counter vec")
});

/// Moderation verdicts served, labeled by status and source.
pub static MODERATION_RESULTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "marketplace_moderation_results_total",
        "Total number of moderated messages, labeled by status and source",
        &["status", "source"]
    )
    .expect("Failed to create marketplace_moderation_results_total counter vec")
});

/// Recommendation lookups, labeled by result.
pub static RECOMMENDATION_LOOKUPS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "marketplace_recommendation_lookups_total",
        "Total number of recommendation lookups, labeled by result",
        &["result"]
    )
    .expect("Failed to create marketplace_recommendation_lookups_total counter vec")
});

/// Histogram for language model request durations in seconds.
pub static LLM_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "marketplace_llm_request_duration",
        "Language model request durations in seconds",
        &["provider", "result"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 30.0]
    )
    .expect("Failed to create language model request duration histogram")
});

/// Count a price suggestion
pub fn record_price_decision(decision: &PriceDecision) {
    PRICE_SUGGESTIONS
        .with_label_values(&[
            decision.source.as_str(),
            decision.suggestion.fraud_flag.as_str(),
        ])
        .inc();
}

/// Count a moderation verdict
pub fn record_moderation_decision(decision: &ModerationDecision) {
    MODERATION_RESULTS
        .with_label_values(&[decision.result.status.as_str(), decision.source.as_str()])
        .inc();
}

/// Count a recommendation lookup
///
/// # Arguments
/// * `result` - `found` or `not_found`
pub fn record_recommendation_lookup(result: &str) {
    RECOMMENDATION_LOOKUPS.with_label_values(&[result]).inc();
}

/// Observe the duration of a language model request
///
/// # Arguments
/// * `provider` - The provider name
/// * `result` - `success`, `disabled` or `error`
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_llm_duration(provider: &str, result: &str, duration_secs: f64) {
    LLM_REQUEST_DURATION
        .with_label_values(&[provider, result])
        .observe(duration_secs);
}

/// Language model wrapper recording [`LLM_REQUEST_DURATION`]
#[derive(Debug, Clone)]
pub struct MeteredModel<M> {
    inner: M,
}

impl<M> MeteredModel<M> {
    /// Wrap a model
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M: LanguageModel> LanguageModel for MeteredModel<M> {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let start = Instant::now();
        let result = self.inner.generate(prompt).await;

        let label = match &result {
            Ok(_) => "success",
            Err(LlmError::Disabled) => "disabled",
            Err(_) => "error",
        };
        observe_llm_duration(self.inner.name(), label, start.elapsed().as_secs_f64());

        result
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    match String::from_utf8(buffer) {
        Ok(body) => ([(header::CONTENT_TYPE, encoder.format_type())], body).into_response(),
        Err(e) => {
            error!(error = %e, "Metrics buffer is not valid UTF-8");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use llm_client::LlmBackend;

    use super::*;

    #[derive(Debug, Default)]
    struct CountingModel {
        calls: Arc<AtomicUsize>,
    }

    impl LanguageModel for CountingModel {
        async fn generate(&self, _prompt: &str) -> LlmResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("{}".to_string())
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn metered_model_delegates_and_observes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = MeteredModel::new(CountingModel {
            calls: Arc::clone(&calls),
        });
        let before = LLM_REQUEST_DURATION
            .with_label_values(&["counting", "success"])
            .get_sample_count();

        assert_eq!(model.generate("hi").await.unwrap(), "{}");
        assert_eq!(model.name(), "counting");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let after = LLM_REQUEST_DURATION
            .with_label_values(&["counting", "success"])
            .get_sample_count();
        assert_eq!(after, before + 1);
    }

    #[tokio::test]
    async fn disabled_backend_is_labeled() {
        let model = MeteredModel::new(LlmBackend::Disabled);
        let before = LLM_REQUEST_DURATION
            .with_label_values(&["disabled", "disabled"])
            .get_sample_count();

        let err = model.generate("hi").await.unwrap_err();
        assert!(matches!(err, LlmError::Disabled));

        let after = LLM_REQUEST_DURATION
            .with_label_values(&["disabled", "disabled"])
            .get_sample_count();
        assert_eq!(after, before + 1);
    }

    #[tokio::test]
    async fn handler_exports_text_format() {
        record_recommendation_lookup("found");

        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("marketplace_recommendation_lookups_total"));
    }
}
