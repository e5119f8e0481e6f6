use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub backend_requests_total: IntCounterVec,
    pub backend_request_latency_seconds: HistogramVec,
    pub active_sessions: IntGauge,
    pub live_map_subscribers: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let backend_requests_total = IntCounterVec::new(
            Opts::new(
                "backend_requests_total",
                "Backend API calls by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )
        .expect("valid backend_requests_total metric");

        let backend_request_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "backend_request_latency_seconds",
                "Latency of backend API calls in seconds",
            ),
            &["endpoint"],
        )
        .expect("valid backend_request_latency_seconds metric");

        let active_sessions = IntGauge::new("active_sessions", "Signed-in dashboard sessions")
            .expect("valid active_sessions metric");

        let live_map_subscribers =
            IntGauge::new("live_map_subscribers", "Open live map websocket connections")
                .expect("valid live_map_subscribers metric");

        registry
            .register(Box::new(backend_requests_total.clone()))
            .expect("register backend_requests_total");
        registry
            .register(Box::new(backend_request_latency_seconds.clone()))
            .expect("register backend_request_latency_seconds");
        registry
            .register(Box::new(active_sessions.clone()))
            .expect("register active_sessions");
        registry
            .register(Box::new(live_map_subscribers.clone()))
            .expect("register live_map_subscribers");

        Self {
            registry,
            backend_requests_total,
            backend_request_latency_seconds,
            active_sessions,
            live_map_subscribers,
        }
    }

    pub fn observe_backend_call(&self, endpoint: &str, outcome: &str, elapsed_secs: f64) {
        self.backend_requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
        self.backend_request_latency_seconds
            .with_label_values(&[endpoint])
            .observe(elapsed_secs);
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
