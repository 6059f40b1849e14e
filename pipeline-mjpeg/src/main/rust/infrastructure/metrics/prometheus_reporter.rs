use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::entities::{EndReason, StreamSession};
use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::SourceKind;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "mjpeg_active_sessions",
        "Number of feed sessions currently producing frames"
    ).expect("metric can be created");

    // Labelled by source kind (live / finite)
    pub static ref SESSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("mjpeg_sessions_total", "Feed sessions started since server start"),
        &["kind"]
    ).expect("metric can be created");

    pub static ref SESSIONS_ENDED: IntCounterVec = IntCounterVec::new(
        Opts::new("mjpeg_sessions_ended_total", "Feed sessions ended, by reason"),
        &["reason"]
    ).expect("metric can be created");

    pub static ref OPEN_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("mjpeg_source_open_failures_total", "Sources that could not be opened"),
        &["kind"]
    ).expect("metric can be created");

    pub static ref CHUNKS_SENT: IntCounter = IntCounter::new(
        "mjpeg_chunks_sent_total",
        "Total multipart chunks handed to viewers"
    ).expect("metric can be created");

    pub static ref BYTES_SENT: IntCounter = IntCounter::new(
        "mjpeg_bytes_sent_total",
        "Total bytes handed to viewers"
    ).expect("metric can be created");

    pub static ref FRAMES_SKIPPED: IntCounter = IntCounter::new(
        "mjpeg_frames_skipped_total",
        "Decoded frames dropped because they failed to encode"
    ).expect("metric can be created");

    pub static ref SOURCE_REWINDS: IntCounter = IntCounter::new(
        "mjpeg_source_rewinds_total",
        "Times a finite source was looped back to its first frame"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(ACTIVE_SESSIONS.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_TOTAL.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_ENDED.clone()))?;
        REGISTRY.register(Box::new(OPEN_FAILURES.clone()))?;
        REGISTRY.register(Box::new(CHUNKS_SENT.clone()))?;
        REGISTRY.register(Box::new(BYTES_SENT.clone()))?;
        REGISTRY.register(Box::new(FRAMES_SKIPPED.clone()))?;
        REGISTRY.register(Box::new(SOURCE_REWINDS.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_session_started(&self, session: &StreamSession) {
        ACTIVE_SESSIONS.inc();
        SESSIONS_TOTAL.with_label_values(&[session.kind().as_str()]).inc();
    }

    fn report_session_ended(&self, _session: &StreamSession, reason: EndReason) {
        ACTIVE_SESSIONS.dec();
        SESSIONS_ENDED.with_label_values(&[reason.as_str()]).inc();
    }

    fn report_open_failed(&self, kind: SourceKind) {
        OPEN_FAILURES.with_label_values(&[kind.as_str()]).inc();
        SESSIONS_ENDED
            .with_label_values(&[EndReason::SourceUnavailable.as_str()])
            .inc();
    }

    fn report_chunk_sent(&self, bytes: usize) {
        CHUNKS_SENT.inc();
        BYTES_SENT.inc_by(bytes as u64);
    }

    fn report_frame_skipped(&self) {
        FRAMES_SKIPPED.inc();
    }

    fn report_source_rewound(&self) {
        SOURCE_REWINDS.inc();
    }
}
