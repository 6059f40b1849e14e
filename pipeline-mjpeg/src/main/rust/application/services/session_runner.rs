use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::SourceHandle;
use crate::domain::entities::{EndReason, StreamSession};
use crate::domain::errors::DomainError;
use crate::domain::ports::{ChunkSink, FrameEncoder, MetricsReporter};
use crate::domain::value_objects::{EncodedChunk, SourceKind};

/// Drives one session's pull-decode-encode-yield loop.
///
/// Blocking; each session runs it on its own blocking thread.
pub struct SessionRunner {
    encoder: Arc<dyn FrameEncoder>,
    metrics: Arc<dyn MetricsReporter>,
}

impl SessionRunner {
    pub fn new(encoder: Arc<dyn FrameEncoder>, metrics: Arc<dyn MetricsReporter>) -> Self {
        Self { encoder, metrics }
    }

    /// Produce chunks until the viewer leaves or the source gives out.
    ///
    /// The decoder is released before this returns, whatever the exit path.
    pub fn run<S: ChunkSink>(
        &self,
        session: &mut StreamSession,
        mut source: SourceHandle,
        sink: &mut S,
        running: &AtomicBool,
    ) -> EndReason {
        session.activate();
        let kind = session.kind();
        // Set after a rewind, cleared by the next decoded frame.
        let mut just_rewound = false;

        let reason = loop {
            if !running.load(Ordering::SeqCst) || sink.is_closed() {
                break EndReason::ConsumerClosed;
            }

            match source.read_frame(running) {
                Ok(Some(frame)) => {
                    just_rewound = false;
                    session.record_frame_decoded();

                    let jpeg = match self.encoder.encode(&frame) {
                        Ok(jpeg) => jpeg,
                        Err(e) => {
                            tracing::debug!(
                                session_id = %session.id(),
                                frame = session.frames_decoded(),
                                "Skipping frame: {}",
                                e
                            );
                            session.record_frame_skipped();
                            self.metrics.report_frame_skipped();
                            continue;
                        }
                    };

                    let chunk = EncodedChunk::wrap(&jpeg);
                    let len = chunk.len();
                    if sink.send(chunk).is_err() {
                        break EndReason::ConsumerClosed;
                    }
                    session.record_chunk_sent(len);
                    self.metrics.report_chunk_sent(len);
                }
                Ok(None) => {
                    if !running.load(Ordering::SeqCst) {
                        break EndReason::ConsumerClosed;
                    }

                    match kind {
                        SourceKind::Live => {
                            tracing::info!(session_id = %session.id(), "Live source ended");
                            break EndReason::StreamEnded;
                        }
                        SourceKind::Finite if just_rewound => {
                            tracing::warn!(
                                session_id = %session.id(),
                                locator = %session.locator(),
                                "Source produced no frames after rewind"
                            );
                            break EndReason::DecoderFailed;
                        }
                        SourceKind::Finite => {
                            if let Err(e) = source.rewind() {
                                tracing::warn!(
                                    session_id = %session.id(),
                                    "Failed to rewind source: {}",
                                    e
                                );
                                break EndReason::DecoderFailed;
                            }
                            just_rewound = true;
                            session.record_rewind();
                            self.metrics.report_source_rewound();
                            tracing::debug!(
                                session_id = %session.id(),
                                loops = session.rewinds(),
                                "Rewound finite source"
                            );
                        }
                    }
                }
                Err(DomainError::SourceStalled(timeout)) => {
                    tracing::warn!(
                        session_id = %session.id(),
                        "No frame within {:?}, ending session",
                        timeout
                    );
                    break EndReason::Stalled;
                }
                Err(e) => {
                    tracing::error!(session_id = %session.id(), "Decoder error: {}", e);
                    break EndReason::DecoderFailed;
                }
            }
        };

        source.release();
        session.end(reason);
        reason
    }
}
