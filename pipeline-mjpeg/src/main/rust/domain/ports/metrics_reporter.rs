use crate::domain::entities::{EndReason, StreamSession};
use crate::domain::value_objects::SourceKind;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_session_started(&self, session: &StreamSession);
    fn report_session_ended(&self, session: &StreamSession, reason: EndReason);
    fn report_open_failed(&self, kind: SourceKind);
    fn report_chunk_sent(&self, bytes: usize);
    fn report_frame_skipped(&self);
    fn report_source_rewound(&self);
}
