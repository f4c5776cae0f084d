use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub records_created_total: IntCounterVec,
    pub records_deleted_total: IntCounterVec,
    pub relationship_repair_failures_total: IntCounterVec,
    pub relationship_op_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let records_created_total = IntCounterVec::new(
            Opts::new("records_created_total", "Records created by entity"),
            &["entity"],
        )
        .expect("valid records_created_total metric");

        let records_deleted_total = IntCounterVec::new(
            Opts::new("records_deleted_total", "Records deleted by entity"),
            &["entity"],
        )
        .expect("valid records_deleted_total metric");

        let relationship_repair_failures_total = IntCounterVec::new(
            Opts::new(
                "relationship_repair_failures_total",
                "Second-step driver/package reference writes that failed",
            ),
            &["operation"],
        )
        .expect("valid relationship_repair_failures_total metric");

        let relationship_op_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "relationship_op_latency_seconds",
                "Latency of relationship-maintaining operations in seconds",
            ),
            &["operation"],
        )
        .expect("valid relationship_op_latency_seconds metric");

        registry
            .register(Box::new(records_created_total.clone()))
            .expect("register records_created_total");
        registry
            .register(Box::new(records_deleted_total.clone()))
            .expect("register records_deleted_total");
        registry
            .register(Box::new(relationship_repair_failures_total.clone()))
            .expect("register relationship_repair_failures_total");
        registry
            .register(Box::new(relationship_op_latency_seconds.clone()))
            .expect("register relationship_op_latency_seconds");

        Self {
            registry,
            records_created_total,
            records_deleted_total,
            relationship_repair_failures_total,
            relationship_op_latency_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
