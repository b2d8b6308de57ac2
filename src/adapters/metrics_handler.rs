use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

pub struct MetricsCollector {
    registry: Registry,

    // Request metrics
    pub requests_total: CounterVec,
    pub request_duration: HistogramVec,

    // Resolution metrics
    pub field_errors: IntCounter,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("graphql_mock_requests_total", "Total number of GraphQL requests"),
            &["operation", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "graphql_mock_request_duration_seconds",
                "GraphQL request duration in seconds",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let field_errors = IntCounter::new(
            "graphql_mock_field_errors_total",
            "Field errors reported in responses",
        )?;
        registry.register(Box::new(field_errors.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            field_errors,
        })
    }

    /// Records one finished GraphQL request.
    pub fn observe_request(&self, operation: &str, status: u16, seconds: f64, field_errors: usize) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[operation, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[operation])
            .observe(seconds);
        self.field_errors.inc_by(field_errors as u64);
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct MetricsHandler {
    collector: Arc<MetricsCollector>,
}

impl MetricsHandler {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }

    pub fn collector(&self) -> &Arc<MetricsCollector> {
        &self.collector
    }

    pub async fn metrics(&self) -> String {
        self.collector.encode().unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            String::from("# Error encoding metrics\n")
        })
    }
}
