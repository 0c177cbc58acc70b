//! Metrics registry for the gateway.
//!
//! Counter/gauge/histogram types with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors to keep deterministic ordering.
//! Every update is a single atomic op on a shard entry, so concurrent requests
//! never lose increments. Histograms store integer observations in a fixed
//! base unit and are rendered in the exposition unit via `scale`.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// `{k="v",...}` or empty when there are no labels at all.
fn fmt_labels(key: &[(String, String)], le: Option<&str>) -> String {
    let mut parts: Vec<String> = key
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    if let Some(le) = le {
        parts.push(format!("le=\"{}\"", le));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", parts.join(","))
    }
}

fn write_header(out: &mut String, name: &str, help: &str, ty: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, ty);
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self.map.entry(label_key(labels)).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value (0 when the label set was never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "counter");
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{} {}", name, fmt_labels(r.key(), None), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self.map.entry(label_key(labels)).or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "gauge");
        if self.map.is_empty() {
            // Unlabeled gauges are always exposed, even before first use.
            let _ = writeln!(out, "{} 0", name);
            return;
        }
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{} {}", name, fmt_labels(r.key(), None), val);
        }
    }
}

/// Base-unit scale for duration histograms (microseconds -> seconds).
pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Request latency buckets in microseconds: 5ms .. 10s.
pub const HTTP_DURATION_BUCKETS_MICROS: &[u64] = &[
    5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000,
    5_000_000, 10_000_000,
];

/// LLM round-trip buckets in microseconds: 100ms .. 60s.
pub const CHAT_DURATION_BUCKETS_MICROS: &[u64] = &[
    100_000, 250_000, 500_000, 1_000_000, 2_500_000, 5_000_000, 10_000_000, 30_000_000,
    60_000_000,
];

/// Response size buckets in tokens.
pub const RESPONSE_TOKEN_BUCKETS: &[u64] = &[10, 50, 100, 250, 500, 1_000, 2_000, 4_000, 8_000];

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: Vec<AtomicU64>,
}

impl AtomicHistogram {
    fn new(n: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            buckets: (0..n).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

pub struct HistogramVec {
    bounds: &'static [u64],
    /// Base units per exposition unit (1 for plain counts).
    scale: u64,
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    pub fn new(bounds: &'static [u64], scale: u64) -> Self {
        Self { bounds, scale: scale.max(1), map: DashMap::new() }
    }

    /// Duration histogram rendered in seconds.
    pub fn seconds(bounds_micros: &'static [u64]) -> Self {
        Self::new(bounds_micros, MICROS_PER_SECOND)
    }

    /// Observe a duration (stored as microseconds).
    pub fn observe_duration(&self, labels: &[(&str, &str)], duration: Duration) {
        self.observe(labels, duration.as_micros() as u64);
    }

    /// Observe a raw value in base units and increment cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], value: u64) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicHistogram::new(self.bounds.len()));

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(value, Ordering::Relaxed);

        // Cumulative buckets: every bound >= value gets the hit.
        for (i, &b) in self.bounds.iter().enumerate() {
            if value <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Number of observations for a label set.
    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn fmt_value(&self, v: u64) -> String {
        if self.scale == 1 {
            v.to_string()
        } else {
            (v as f64 / self.scale as f64).to_string()
        }
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        write_header(out, name, help, "histogram");
        for r in self.map.iter() {
            let key = r.key();
            let hist = r.value();

            // Read count first so no bucket can exceed +Inf under concurrent writes.
            let count = hist.count.load(Ordering::Relaxed);
            // Buckets are read one by one while writers run; carry a running
            // max so the rendered series stays cumulative.
            let mut floor = 0;
            for (i, &le) in self.bounds.iter().enumerate() {
                let n = hist.buckets[i].load(Ordering::Relaxed).max(floor).min(count);
                floor = n;
                let le = self.fmt_value(le);
                let _ = writeln!(out, "{}_bucket{} {}", name, fmt_labels(key, Some(&le)), n);
            }
            let _ = writeln!(out, "{}_bucket{} {}", name, fmt_labels(key, Some("+Inf")), count);

            let sum = self.fmt_value(hist.sum.load(Ordering::Relaxed));
            let _ = writeln!(out, "{}_sum{} {}", name, fmt_labels(key, None), sum);
            let _ = writeln!(out, "{}_count{} {}", name, fmt_labels(key, None), count);
        }
    }
}

/// Process-wide registry. Built once in `AppState::new` and shared by the
/// instrumentation middleware, the chat service and `/metrics`.
pub struct GatewayMetrics {
    pub http_requests: CounterVec,
    pub http_request_duration: HistogramVec,
    pub http_in_flight: GaugeVec,
    pub chat_requests: CounterVec,
    pub chat_duration: HistogramVec,
    pub chat_response_tokens: HistogramVec,
    pub errors: CounterVec,
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self {
            http_requests: CounterVec::default(),
            http_request_duration: HistogramVec::seconds(HTTP_DURATION_BUCKETS_MICROS),
            http_in_flight: GaugeVec::default(),
            chat_requests: CounterVec::default(),
            chat_duration: HistogramVec::seconds(CHAT_DURATION_BUCKETS_MICROS),
            chat_response_tokens: HistogramVec::new(RESPONSE_TOKEN_BUCKETS, 1),
            errors: CounterVec::default(),
        }
    }

    /// Enter the in-flight gauge. The returned guard leaves it on drop, so the
    /// gauge is restored on every exit path (including panics and cancelled
    /// futures).
    pub fn track_in_flight(self: &Arc<Self>) -> InFlightGuard {
        self.http_in_flight.inc(&[]);
        InFlightGuard { metrics: Arc::clone(self) }
    }

    pub fn in_flight(&self) -> i64 {
        self.http_in_flight.get(&[])
    }

    pub fn record_error(&self, kind: &str) {
        self.errors.inc(&[("error_type", kind)]);
    }

    /// Render all registered metrics. Read-only; safe to call while requests
    /// are updating the same registry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.http_requests.render(
            "agon_http_requests_total",
            "Total HTTP requests by method, endpoint and status.",
            &mut out,
        );
        self.http_request_duration.render(
            "agon_http_request_duration_seconds",
            "HTTP request latency in seconds.",
            &mut out,
        );
        self.http_in_flight.render(
            "agon_http_requests_in_progress",
            "HTTP requests currently being processed.",
            &mut out,
        );
        self.chat_requests.render(
            "agon_chat_requests_total",
            "Chat completions by outcome.",
            &mut out,
        );
        self.chat_duration.render(
            "agon_chat_duration_seconds",
            "LLM round-trip time for successful chat requests.",
            &mut out,
        );
        self.chat_response_tokens.render(
            "agon_chat_response_tokens",
            "Size of generated replies in tokens (character count when the provider reports none).",
            &mut out,
        );
        self.errors.render(
            "agon_errors_total",
            "Failures by error type.",
            &mut out,
        );
        out
    }
}

/// Scoped in-flight registration; see [`GatewayMetrics::track_in_flight`].
pub struct InFlightGuard {
    metrics: Arc<GatewayMetrics>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.metrics.http_in_flight.dec(&[]);
    }
}
