//! Metrics infrastructure for the Groduino controller.
//!
//! Every metric emitted by the link and the router is declared here as a
//! [`Metric`] constant, so names are never spelled twice. The `metrics` crate
//! is re-exported; when no recorder is installed every call is a no-op.
//!
//! ```rust
//! use groduino_metrics::{metric_defs::LINK_FRAMES_SENT, metrics};
//!
//! metrics::counter!(LINK_FRAMES_SENT.name).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// How a metric is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic count of events.
    Counter,
    /// Value that can go up and down.
    Gauge,
    /// Distribution of observed values.
    Histogram,
}

/// Name and metadata of one metric.
///
/// Declared as constants so every call site records under the same name:
///
/// ```rust
/// use groduino_metrics::{Metric, MetricKind};
/// use groduino_metrics::metrics::Unit;
///
/// const REJECTS: Metric = Metric::counter("groduino.demo.rejects", "Rejected frames")
///     .unit(Unit::Count)
///     .labels(&["reason"]);
///
/// assert_eq!(REJECTS.kind, MetricKind::Counter);
/// assert_eq!(REJECTS.labels, &["reason"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    /// Dotted metric name, e.g. `groduino.link.frames_sent`.
    pub name: &'static str,
    /// How the metric is recorded.
    pub kind: MetricKind,
    /// One-line help text exported alongside the metric.
    pub help: &'static str,
    /// Unit reported to the exporter, if any.
    pub unit: Option<Unit>,
    /// Label keys the metric is always recorded with.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn declare(kind: MetricKind, name: &'static str, help: &'static str) -> Self {
        Metric {
            name,
            kind,
            help,
            unit: None,
            labels: &[],
        }
    }

    /// Declare a counter.
    pub const fn counter(name: &'static str, help: &'static str) -> Self {
        Self::declare(MetricKind::Counter, name, help)
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str, help: &'static str) -> Self {
        Self::declare(MetricKind::Gauge, name, help)
    }

    /// Declare a histogram.
    pub const fn histogram(name: &'static str, help: &'static str) -> Self {
        Self::declare(MetricKind::Histogram, name, help)
    }

    pub const fn unit(self, unit: Unit) -> Self {
        Metric {
            unit: Some(unit),
            ..self
        }
    }

    pub const fn labels(self, labels: &'static [&'static str]) -> Self {
        Metric { labels, ..self }
    }

    /// Hand the help text and unit to the installed recorder.
    pub fn describe(&self) {
        let (name, help) = (self.name, self.help);
        match (self.kind, self.unit) {
            (MetricKind::Counter, None) => describe_counter!(name, help),
            (MetricKind::Counter, Some(unit)) => describe_counter!(name, unit, help),
            (MetricKind::Gauge, None) => describe_gauge!(name, help),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(name, unit, help),
            (MetricKind::Histogram, None) => describe_histogram!(name, help),
            (MetricKind::Histogram, Some(unit)) => describe_histogram!(name, unit, help),
        }
    }
}

/// Every metric the link and the router record.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Link Layer
    // ========================================================================

    /// Label `outcome`: `established` or `timeout`.
    pub const LINK_HANDSHAKES: Metric =
        Metric::counter("groduino.link.handshakes", "Handshake attempts by outcome")
            .unit(Unit::Count)
            .labels(&["outcome"]);

    /// 1 while framed, 0 in unframed fallback.
    pub const LINK_ESTABLISHED: Metric = Metric::gauge(
        "groduino.link.established",
        "Whether the link completed its handshake",
    );

    pub const LINK_FRAMES_SENT: Metric =
        Metric::counter("groduino.link.frames_sent", "Framed messages written to the host")
            .unit(Unit::Count);

    pub const LINK_LINES_SENT: Metric =
        Metric::counter("groduino.link.lines_sent", "Unframed lines written to the host")
            .unit(Unit::Count);

    pub const LINK_PAYLOADS_RECEIVED: Metric = Metric::counter(
        "groduino.link.payloads_received",
        "Messages received and accepted",
    )
    .unit(Unit::Count);

    /// Label `reason`: the failing validation stage.
    pub const LINK_DECODE_FAILURES: Metric = Metric::counter(
        "groduino.link.decode_failures",
        "Received frames rejected by validation",
    )
    .unit(Unit::Count)
    .labels(&["reason"]);

    pub const LINK_RECEIVE_TIMEOUTS: Metric =
        Metric::counter("groduino.link.receive_timeouts", "Receive attempts that timed out")
            .unit(Unit::Count);

    // ========================================================================
    // Instruction Router
    // ========================================================================

    /// Label `outcome`: `routed` or `invalid`.
    pub const ROUTER_INSTRUCTIONS: Metric = Metric::counter(
        "groduino.router.instructions",
        "Instruction lines handled by outcome",
    )
    .unit(Unit::Count)
    .labels(&["outcome"]);

    /// Label `code`: the instruction's module code.
    pub const ROUTER_MODULE_RESPONSES: Metric = Metric::counter(
        "groduino.router.module_responses",
        "Non-empty module answers to instructions",
    )
    .unit(Unit::Count)
    .labels(&["code"]);

    pub const ROUTER_TELEMETRY_PASSES: Metric =
        Metric::counter("groduino.router.telemetry_passes", "Telemetry passes over all modules")
            .unit(Unit::Count);

    pub const ROUTER_TELEMETRY_BYTES: Metric = Metric::histogram(
        "groduino.router.telemetry_bytes",
        "Size of assembled telemetry fragments",
    )
    .unit(Unit::Bytes);

    pub const ALL: &[Metric] = &[
        LINK_HANDSHAKES,
        LINK_ESTABLISHED,
        LINK_FRAMES_SENT,
        LINK_LINES_SENT,
        LINK_PAYLOADS_RECEIVED,
        LINK_DECODE_FAILURES,
        LINK_RECEIVE_TIMEOUTS,
        ROUTER_INSTRUCTIONS,
        ROUTER_MODULE_RESPONSES,
        ROUTER_TELEMETRY_PASSES,
        ROUTER_TELEMETRY_BYTES,
    ];
}

/// Describe everything in [`metric_defs::ALL`]. Call after installing a recorder.
pub fn describe_metrics() {
    metric_defs::ALL.iter().for_each(Metric::describe);
}

/// Installs a Prometheus recorder serving `/metrics` on `addr`.
#[cfg(feature = "prometheus")]
pub fn install_prometheus(
    addr: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    describe_metrics();
    Ok(())
}
