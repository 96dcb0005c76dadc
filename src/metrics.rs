//! Metrics collection and export module

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Global metrics registry
pub struct Metrics {
    registry: Registry,

    // Fetch counters
    pub fetches_issued: IntCounter,
    pub fetches_applied: IntCounter,
    pub fetches_stale: IntCounter,
    pub fetches_failed: IntCounter,

    // Telemetry counters
    pub telemetry_sent: IntCounter,
    pub telemetry_dropped: IntCounter,

    // Derivation counters
    pub derivations_computed: IntCounter,
    pub derivation_cache_hits: IntCounter,

    pub exports_total: IntCounter,

    // Gauges
    pub fetches_in_flight: IntGauge,
    pub visible_leads: IntGauge,

    // Histograms
    pub fetch_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let fetches_issued = IntCounter::with_opts(Opts::new(
            "lead_fetches_issued_total",
            "Number of lead fetches issued",
        ))?;

        let fetches_applied = IntCounter::with_opts(Opts::new(
            "lead_fetches_applied_total",
            "Number of lead responses applied to the visible collection",
        ))?;

        let fetches_stale = IntCounter::with_opts(Opts::new(
            "lead_fetches_stale_total",
            "Number of superseded lead responses discarded",
        ))?;

        let fetches_failed = IntCounter::with_opts(Opts::new(
            "lead_fetches_failed_total",
            "Number of lead fetches that failed",
        ))?;

        let telemetry_sent = IntCounter::with_opts(Opts::new(
            "telemetry_events_sent_total",
            "Number of telemetry events accepted by the sink",
        ))?;

        let telemetry_dropped = IntCounter::with_opts(Opts::new(
            "telemetry_events_dropped_total",
            "Number of telemetry events dropped after a failed send",
        ))?;

        let derivations_computed = IntCounter::with_opts(Opts::new(
            "view_derivations_total",
            "Number of derived views recomputed",
        ))?;

        let derivation_cache_hits = IntCounter::with_opts(Opts::new(
            "view_derivation_cache_hits_total",
            "Number of derivations served from the memo cache",
        ))?;

        let exports_total =
            IntCounter::with_opts(Opts::new("exports_total", "Number of CSV exports"))?;

        let fetches_in_flight = IntGauge::with_opts(Opts::new(
            "lead_fetches_in_flight",
            "Number of lead fetches awaiting a response",
        ))?;

        let visible_leads = IntGauge::with_opts(Opts::new(
            "visible_leads",
            "Number of leads in the last derived view",
        ))?;

        let fetch_latency = Histogram::with_opts(
            HistogramOpts::new("lead_fetch_latency_seconds", "Lead fetch latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(fetches_issued.clone()))?;
        registry.register(Box::new(fetches_applied.clone()))?;
        registry.register(Box::new(fetches_stale.clone()))?;
        registry.register(Box::new(fetches_failed.clone()))?;
        registry.register(Box::new(telemetry_sent.clone()))?;
        registry.register(Box::new(telemetry_dropped.clone()))?;
        registry.register(Box::new(derivations_computed.clone()))?;
        registry.register(Box::new(derivation_cache_hits.clone()))?;
        registry.register(Box::new(exports_total.clone()))?;
        registry.register(Box::new(fetches_in_flight.clone()))?;
        registry.register(Box::new(visible_leads.clone()))?;
        registry.register(Box::new(fetch_latency.clone()))?;

        Ok(Self {
            registry,
            fetches_issued,
            fetches_applied,
            fetches_stale,
            fetches_failed,
            telemetry_sent,
            telemetry_dropped,
            derivations_computed,
            derivation_cache_hits,
            exports_total,
            fetches_in_flight,
            visible_leads,
            fetch_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.start.elapsed().as_secs_f64());
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
