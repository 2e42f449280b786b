//! Prometheus metrics shared by passes, workers and the HTTP server

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub passes_total: IntCounterVec,
    pub signals_generated_total: IntCounterVec,
    pub signal_transitions_total: IntCounterVec,
    pub symbols_skipped_total: IntCounterVec,
    pub external_call_duration_seconds: Histogram,
    pub database_connected: Gauge,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("candlescope".to_string()), None)?;

        let passes_total = IntCounterVec::new(
            Opts::new("passes_total", "Completed passes by kind"),
            &["kind"],
        )?;
        let signals_generated_total = IntCounterVec::new(
            Opts::new("signals_generated_total", "Daily signals persisted by action"),
            &["action"],
        )?;
        let signal_transitions_total = IntCounterVec::new(
            Opts::new("signal_transitions_total", "Monitor transitions by new status"),
            &["status"],
        )?;
        let symbols_skipped_total = IntCounterVec::new(
            Opts::new("symbols_skipped_total", "Symbols skipped during a pass"),
            &["pass", "reason"],
        )?;
        let external_call_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "external_call_duration_seconds",
                "Latency of market-data and narrative calls",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        let database_connected =
            Gauge::with_opts(Opts::new("database_connected", "1 when the signal store is reachable"))?;
        let http_requests_total =
            IntCounter::with_opts(Opts::new("http_requests_total", "HTTP requests served"))?;
        let http_requests_in_flight =
            IntGauge::with_opts(Opts::new("http_requests_in_flight", "HTTP requests in flight"))?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;

        registry.register(Box::new(passes_total.clone()))?;
        registry.register(Box::new(signals_generated_total.clone()))?;
        registry.register(Box::new(signal_transitions_total.clone()))?;
        registry.register(Box::new(symbols_skipped_total.clone()))?;
        registry.register(Box::new(external_call_duration_seconds.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            passes_total,
            signals_generated_total,
            signal_transitions_total,
            symbols_skipped_total,
            external_call_duration_seconds,
            database_connected,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
        })
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn record_skip(&self, pass: &str, reason: &str) {
        self.symbols_skipped_total
            .with_label_values(&[pass, reason])
            .inc();
    }
}
