use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use super::{SessionRunner, SourceHandle};
use crate::domain::entities::{EndReason, StreamSession};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{ChunkSink, FrameEncoder, MetricsReporter, SourceOpener};
use crate::domain::value_objects::{EncodedChunk, SourceLocator, StreamConfig};

/// Application service turning feed requests into running stream sessions
pub struct StreamingService {
    opener: Arc<dyn SourceOpener>,
    runner: Arc<SessionRunner>,
    metrics: Arc<dyn MetricsReporter>,
    config: StreamConfig,
    shutdown: watch::Sender<bool>,
}

impl StreamingService {
    pub fn new(
        opener: Arc<dyn SourceOpener>,
        encoder: Arc<dyn FrameEncoder>,
        metrics: Arc<dyn MetricsReporter>,
        config: StreamConfig,
    ) -> Self {
        Self {
            opener,
            runner: Arc::new(SessionRunner::new(encoder, metrics.clone())),
            metrics,
            config,
            shutdown: watch::channel(false).0,
        }
    }

    /// Stop every running session and refuse new ones.
    ///
    /// Finite feeds never end on their own; a graceful drain waits on them
    /// until this is called.
    pub fn shutdown(&self) {
        if !self.shutdown.send_replace(true) {
            tracing::info!("Stopping all stream sessions");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Open a feed for `requested`, falling back to the sample clip when blank.
    ///
    /// The decoder is opened before this returns so that an unreachable source
    /// surfaces as `DomainError::SourceUnavailable` instead of an empty feed.
    pub async fn open_feed(&self, requested: Option<&str>) -> Result<FeedStream> {
        if self.is_shutting_down() {
            return Err(DomainError::ShuttingDown);
        }

        let locator = SourceLocator::resolve(requested, self.config.fallback());
        let mut session = StreamSession::new(locator.clone());

        tracing::info!(
            session_id = %session.id(),
            locator = %locator,
            kind = %session.kind(),
            "Opening stream session"
        );

        let opener = self.opener.clone();
        let open_locator = locator.clone();
        let opened = tokio::task::spawn_blocking(move || opener.open(&open_locator))
            .await
            .map_err(|e| DomainError::source_unavailable(locator.as_str(), e))
            .and_then(|result| result);

        let source = match opened {
            Ok(source) => SourceHandle::new(source),
            Err(e) => {
                session.end(EndReason::SourceUnavailable);
                self.metrics.report_open_failed(session.kind());
                tracing::warn!(
                    session_id = %session.id(),
                    locator = %locator,
                    "Unable to open source: {}",
                    e
                );
                return Err(match e {
                    e @ DomainError::SourceUnavailable { .. } => e,
                    other => DomainError::source_unavailable(locator.as_str(), other),
                });
            }
        };

        let (tx, rx) = mpsc::channel(self.config.chunk_buffer());
        let running = Arc::new(AtomicBool::new(true));

        self.metrics.report_session_started(&session);

        // Clears `running` on shutdown; exits quietly once the session is over.
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let mut shutdown = self.shutdown.subscribe();
        let shutdown_running = running.clone();
        tokio::spawn(async move {
            let stopping = async move { shutdown.wait_for(|stopping| *stopping).await.is_ok() };
            tokio::select! {
                true = stopping => shutdown_running.store(false, Ordering::SeqCst),
                _ = done_rx => {}
            }
        });

        let runner = self.runner.clone();
        let metrics = self.metrics.clone();
        let session_running = running.clone();
        tokio::task::spawn_blocking(move || {
            let _done = done_tx;
            let mut sink = ChannelSink::new(tx);
            let reason = runner.run(&mut session, source, &mut sink, &session_running);

            metrics.report_session_ended(&session, reason);
            tracing::info!(
                session_id = %session.id(),
                reason = %reason,
                chunks = session.chunks_sent(),
                skipped = session.frames_skipped(),
                loops = session.rewinds(),
                uptime_secs = session.uptime().as_secs_f64(),
                "Stream session ended"
            );
        });

        Ok(FeedStream::new(rx, running))
    }
}

/// Bounded hand-off from a session thread to the HTTP body.
pub struct ChannelSink {
    tx: mpsc::Sender<EncodedChunk>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<EncodedChunk>) -> Self {
        Self { tx }
    }
}

impl ChunkSink for ChannelSink {
    fn send(&mut self, chunk: EncodedChunk) -> Result<()> {
        self.tx
            .blocking_send(chunk)
            .map_err(|_| DomainError::ConsumerGone)
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Chunks of one session, in decode order.
///
/// Dropping the stream (viewer disconnect) signals the session to stop.
pub struct FeedStream {
    chunks: ReceiverStream<EncodedChunk>,
    running: Arc<AtomicBool>,
}

impl FeedStream {
    pub fn new(rx: mpsc::Receiver<EncodedChunk>, running: Arc<AtomicBool>) -> Self {
        Self {
            chunks: ReceiverStream::new(rx),
            running,
        }
    }
}

impl Stream for FeedStream {
    type Item = EncodedChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.chunks).poll_next(cx)
    }
}

impl Drop for FeedStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
