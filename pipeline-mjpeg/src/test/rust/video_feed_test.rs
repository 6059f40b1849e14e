use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gstreamer::prelude::*;
use tokio_stream::StreamExt;
use warp::http::StatusCode;

use pipeline_mjpeg::application::services::{SessionRunner, SourceHandle};
use pipeline_mjpeg::domain::ports::ChunkSink;
use pipeline_mjpeg::infrastructure::gstreamer::FRAME_SINK_NAME;
use pipeline_mjpeg::{
    routes, DomainError, EncodedChunk, EndReason, Frame, FrameEncoder, FrameSource,
    GStreamerSourceOpener, InMemoryOverlayStore, JpegFrameEncoder, MetricsReporter,
    OverlayService, PipelineBuilder, Result, ServerConfig, SourceKind, SourceLocator,
    SourceOpener, StreamConfig, StreamSession, StreamingService,
};

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

/// Frame whose single marker byte is echoed by `MarkerEncoder`.
fn marked(marker: u8) -> Frame {
    Frame::new(1, 1, vec![marker; 3])
}

/// What a scripted source does once its frames run out.
#[derive(Clone, Copy)]
enum Exhausted {
    NoFrame,
    Stall,
    Fail,
}

#[derive(Default)]
struct SourceProbe {
    releases: AtomicUsize,
    rewinds: AtomicUsize,
    reads: AtomicUsize,
}

struct ScriptedSource {
    frames: Vec<Frame>,
    position: usize,
    exhausted: Exhausted,
    probe: Arc<SourceProbe>,
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self, _running: &AtomicBool) -> Result<Option<Frame>> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(frame) = self.frames.get(self.position) {
            self.position += 1;
            return Ok(Some(frame.clone()));
        }
        match self.exhausted {
            Exhausted::NoFrame => Ok(None),
            Exhausted::Stall => Err(DomainError::SourceStalled(Duration::from_millis(5))),
            Exhausted::Fail => Err(DomainError::DecoderFailed("bitstream corrupt".to_string())),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.probe.rewinds.fetch_add(1, Ordering::SeqCst);
        self.position = 0;
        Ok(())
    }

    fn release(&mut self) {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Opens scripted sources; locators containing "missing" fail to open.
struct ScriptedOpener {
    frames: Vec<Frame>,
    exhausted: Exhausted,
    probe: Arc<SourceProbe>,
    opened: Mutex<Vec<SourceLocator>>,
}

impl ScriptedOpener {
    fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            exhausted: Exhausted::NoFrame,
            probe: Arc::new(SourceProbe::default()),
            opened: Mutex::new(Vec::new()),
        }
    }

    fn exhausting_with(mut self, exhausted: Exhausted) -> Self {
        self.exhausted = exhausted;
        self
    }

    fn opened(&self) -> Vec<SourceLocator> {
        self.opened.lock().unwrap().clone()
    }

    fn source(&self) -> ScriptedSource {
        ScriptedSource {
            frames: self.frames.clone(),
            position: 0,
            exhausted: self.exhausted,
            probe: self.probe.clone(),
        }
    }
}

impl SourceOpener for ScriptedOpener {
    fn open(&self, locator: &SourceLocator) -> Result<Box<dyn FrameSource>> {
        self.opened.lock().unwrap().push(locator.clone());
        if locator.as_str().contains("missing") {
            return Err(DomainError::source_unavailable(
                locator.as_str(),
                "no such stream",
            ));
        }
        Ok(Box::new(self.source()))
    }
}

/// Emits the frame's first byte; marker 0 cannot be encoded.
struct MarkerEncoder;

impl FrameEncoder for MarkerEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>> {
        match frame.data().first() {
            Some(0) | None => Err(DomainError::EncodeFailed("unencodable frame".to_string())),
            Some(marker) => Ok(vec![0xFF, 0xD8, *marker, 0xFF, 0xD9]),
        }
    }
}

#[derive(Default)]
struct RecordingMetrics {
    started: AtomicUsize,
    ended: Mutex<Vec<EndReason>>,
    open_failures: AtomicUsize,
    skipped: AtomicUsize,
}

impl MetricsReporter for RecordingMetrics {
    fn report_session_started(&self, _session: &StreamSession) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn report_session_ended(&self, _session: &StreamSession, reason: EndReason) {
        self.ended.lock().unwrap().push(reason);
    }

    fn report_open_failed(&self, _kind: SourceKind) {
        self.open_failures.fetch_add(1, Ordering::SeqCst);
    }

    fn report_chunk_sent(&self, _bytes: usize) {}

    fn report_frame_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    fn report_source_rewound(&self) {}
}

#[derive(Default)]
struct VecSink {
    chunks: Vec<EncodedChunk>,
}

impl ChunkSink for VecSink {
    fn send(&mut self, chunk: EncodedChunk) -> Result<()> {
        self.chunks.push(chunk);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

fn service(
    opener: Arc<ScriptedOpener>,
    metrics: Arc<RecordingMetrics>,
    fallback: &str,
) -> StreamingService {
    let config = StreamConfig::new(SourceLocator::new(fallback)).unwrap();
    StreamingService::new(opener, Arc::new(MarkerEncoder), metrics, config)
}

fn payload_marker(chunk: &EncodedChunk) -> u8 {
    chunk.payload()[2]
}

async fn wait_for_releases(probe: &SourceProbe, expected: usize) {
    for _ in 0..200 {
        if probe.releases.load(Ordering::SeqCst) >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(probe.releases.load(Ordering::SeqCst), expected);
}

#[tokio::test]
async fn test_finite_source_loops_with_frame_count_period() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1), marked(2), marked(3)]));
    let metrics = Arc::new(RecordingMetrics::default());
    let streaming = service(opener.clone(), metrics.clone(), "/clips/fallback.mp4");

    let mut feed = streaming.open_feed(Some("/clips/loop.mp4")).await.unwrap();

    let mut markers = Vec::new();
    for _ in 0..10 {
        let chunk = feed.next().await.expect("finite feeds never end on their own");
        markers.push(payload_marker(&chunk));
    }
    assert_eq!(markers, vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 1]);
    assert!(opener.probe.rewinds.load(Ordering::SeqCst) >= 3);

    drop(feed);
    wait_for_releases(&opener.probe, 1).await;
    assert_eq!(metrics.started.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_live_source_ends_without_seeking() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(7), marked(8), marked(9)]));
    let metrics = Arc::new(RecordingMetrics::default());
    let streaming = service(opener.clone(), metrics.clone(), "/clips/fallback.mp4");

    let feed = streaming.open_feed(Some("rtsp://cam.local/1")).await.unwrap();
    let chunks: Vec<EncodedChunk> = feed.collect().await;

    let markers: Vec<u8> = chunks.iter().map(payload_marker).collect();
    assert_eq!(markers, vec![7, 8, 9]);
    assert_eq!(opener.probe.rewinds.load(Ordering::SeqCst), 0);
    wait_for_releases(&opener.probe, 1).await;
    assert_eq!(
        metrics.ended.lock().unwrap().as_slice(),
        &[EndReason::StreamEnded]
    );
}

#[tokio::test]
async fn test_every_chunk_has_exact_framing() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1), marked(2)]));
    let streaming = service(
        opener.clone(),
        Arc::new(RecordingMetrics::default()),
        "/clips/fallback.mp4",
    );

    let feed = streaming.open_feed(Some("udp://239.0.0.1:5000")).await.unwrap();
    let chunks: Vec<EncodedChunk> = feed.collect().await;

    assert_eq!(chunks.len(), 2);
    for chunk in &chunks {
        let bytes = chunk.as_bytes();
        assert!(bytes.starts_with(PART_HEADER));
        assert!(bytes.ends_with(b"\r\n"));
        assert_eq!(
            &bytes[PART_HEADER.len()..bytes.len() - 2],
            chunk.payload()
        );
    }
}

#[tokio::test]
async fn test_unencodable_frames_are_skipped() {
    let opener = Arc::new(ScriptedOpener::new(vec![
        marked(1),
        marked(0),
        marked(2),
        marked(0),
    ]));
    let metrics = Arc::new(RecordingMetrics::default());
    let streaming = service(opener.clone(), metrics.clone(), "/clips/fallback.mp4");

    let feed = streaming.open_feed(Some("rtmp://live.local/app")).await.unwrap();
    let chunks: Vec<EncodedChunk> = feed.collect().await;

    let markers: Vec<u8> = chunks.iter().map(payload_marker).collect();
    assert_eq!(markers, vec![1, 2]);
    assert_eq!(metrics.skipped.load(Ordering::SeqCst), 2);
    assert!(chunks.len() <= opener.probe.reads.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_blank_url_engages_fallback() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(5)]));
    let streaming = service(
        opener.clone(),
        Arc::new(RecordingMetrics::default()),
        "rtsp://fallback.local/cam",
    );

    let feed = streaming.open_feed(Some("   ")).await.unwrap();
    let chunks: Vec<EncodedChunk> = feed.collect().await;

    assert_eq!(chunks.len(), 1);
    let opened = opener.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].as_str(), "rtsp://fallback.local/cam");
    assert_eq!(opened[0].kind(), SourceKind::Live);
}

#[tokio::test]
async fn test_missing_url_engages_fallback() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(5)]));
    let streaming = service(
        opener.clone(),
        Arc::new(RecordingMetrics::default()),
        "srt://fallback.local:9000",
    );

    let feed = streaming.open_feed(None).await.unwrap();
    let chunks: Vec<EncodedChunk> = feed.collect().await;

    assert_eq!(chunks.len(), 1);
    assert_eq!(opener.opened()[0].as_str(), "srt://fallback.local:9000");
}

#[tokio::test]
async fn test_open_failure_is_source_unavailable() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1)]));
    let metrics = Arc::new(RecordingMetrics::default());
    let streaming = service(opener.clone(), metrics.clone(), "/clips/fallback.mp4");

    let result = streaming.open_feed(Some("rtsp://missing.local/cam")).await;

    assert!(matches!(
        result,
        Err(DomainError::SourceUnavailable { .. })
    ));
    assert_eq!(metrics.open_failures.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.started.load(Ordering::SeqCst), 0);
    assert_eq!(opener.probe.releases.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_decoder_error_releases_once() {
    let opener =
        Arc::new(ScriptedOpener::new(vec![marked(1)]).exhausting_with(Exhausted::Fail));
    let metrics = Arc::new(RecordingMetrics::default());
    let streaming = service(opener.clone(), metrics.clone(), "/clips/fallback.mp4");

    let feed = streaming.open_feed(Some("/clips/broken.mp4")).await.unwrap();
    let chunks: Vec<EncodedChunk> = feed.collect().await;

    assert_eq!(chunks.len(), 1);
    wait_for_releases(&opener.probe, 1).await;
    assert_eq!(
        metrics.ended.lock().unwrap().as_slice(),
        &[EndReason::DecoderFailed]
    );
}

#[test]
fn test_runner_stops_when_finite_source_is_empty_after_rewind() {
    let opener = ScriptedOpener::new(vec![marked(1), marked(2)]);
    let probe = opener.probe.clone();
    let runner = SessionRunner::new(
        Arc::new(MarkerEncoder),
        Arc::new(RecordingMetrics::default()),
    );
    let mut session = StreamSession::new(SourceLocator::new("/clips/empty.mp4"));
    let mut sink = VecSink::default();
    let running = AtomicBool::new(true);

    // A source that never yields anything: rewind brings nothing back.
    let empty = ScriptedSource {
        frames: Vec::new(),
        position: 0,
        exhausted: Exhausted::NoFrame,
        probe: probe.clone(),
    };
    let reason = runner.run(
        &mut session,
        SourceHandle::new(Box::new(empty)),
        &mut sink,
        &running,
    );

    assert_eq!(reason, EndReason::DecoderFailed);
    assert!(sink.chunks.is_empty());
    assert_eq!(probe.rewinds.load(Ordering::SeqCst), 1);
    assert_eq!(probe.releases.load(Ordering::SeqCst), 1);
    assert_eq!(session.end_reason(), Some(EndReason::DecoderFailed));
}

#[test]
fn test_runner_ends_stalled_session() {
    let opener = ScriptedOpener::new(vec![marked(4)]).exhausting_with(Exhausted::Stall);
    let runner = SessionRunner::new(
        Arc::new(MarkerEncoder),
        Arc::new(RecordingMetrics::default()),
    );
    let mut session = StreamSession::new(SourceLocator::new("rtsp://cam.local/idle"));
    let mut sink = VecSink::default();
    let running = AtomicBool::new(true);

    let reason = runner.run(
        &mut session,
        SourceHandle::new(Box::new(opener.source())),
        &mut sink,
        &running,
    );

    assert_eq!(reason, EndReason::Stalled);
    assert_eq!(sink.chunks.len(), 1);
    assert_eq!(session.chunks_sent(), 1);
    assert_eq!(opener.probe.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn test_runner_honours_cleared_running_flag() {
    let opener = ScriptedOpener::new(vec![marked(1)]);
    let runner = SessionRunner::new(
        Arc::new(MarkerEncoder),
        Arc::new(RecordingMetrics::default()),
    );
    let mut session = StreamSession::new(SourceLocator::new("/clips/loop.mp4"));
    let mut sink = VecSink::default();
    let running = AtomicBool::new(false);

    let reason = runner.run(
        &mut session,
        SourceHandle::new(Box::new(opener.source())),
        &mut sink,
        &running,
    );

    assert_eq!(reason, EndReason::ConsumerClosed);
    assert_eq!(opener.probe.reads.load(Ordering::SeqCst), 0);
    assert_eq!(opener.probe.releases.load(Ordering::SeqCst), 1);
}

fn http_api(opener: Arc<ScriptedOpener>) -> Arc<StreamingService> {
    Arc::new(service(
        opener,
        Arc::new(RecordingMetrics::default()),
        "rtsp://fallback.local/cam",
    ))
}

#[tokio::test]
async fn test_http_feed_streams_multipart_body() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1), marked(2), marked(3)]));
    let api = routes(
        http_api(opener.clone()),
        Arc::new(OverlayService::new(Arc::new(InMemoryOverlayStore::new()))),
        &ServerConfig::new(5000).unwrap(),
    );

    let res = warp::test::request()
        .method("GET")
        .path("/video_feed?url=rtsp://cam.local/1")
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let mut expected = Vec::new();
    for marker in [1u8, 2, 3] {
        let chunk = EncodedChunk::wrap(&[0xFF, 0xD8, marker, 0xFF, 0xD9]);
        expected.extend_from_slice(chunk.as_bytes());
    }
    assert_eq!(res.body().as_ref(), expected.as_slice());
    wait_for_releases(&opener.probe, 1).await;
}

#[tokio::test]
async fn test_http_feed_without_url_uses_fallback() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(6)]));
    let api = routes(
        http_api(opener.clone()),
        Arc::new(OverlayService::new(Arc::new(InMemoryOverlayStore::new()))),
        &ServerConfig::new(5000).unwrap(),
    );

    let res = warp::test::request()
        .method("GET")
        .path("/video_feed")
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.body().starts_with(PART_HEADER));
    assert_eq!(opener.opened()[0].as_str(), "rtsp://fallback.local/cam");
}

#[tokio::test]
async fn test_http_feed_unavailable_source_is_bad_gateway() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1)]));
    let api = routes(
        http_api(opener),
        Arc::new(OverlayService::new(Arc::new(InMemoryOverlayStore::new()))),
        &ServerConfig::new(5000).unwrap(),
    );

    let res = warp::test::request()
        .method("GET")
        .path("/video_feed?url=rtsp://missing.local/cam")
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["code"], "SOURCE_UNAVAILABLE");
}

#[tokio::test]
async fn test_http_feed_allows_any_origin() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1)]));
    let api = routes(
        http_api(opener),
        Arc::new(OverlayService::new(Arc::new(InMemoryOverlayStore::new()))),
        &ServerConfig::new(5000).unwrap(),
    );

    let res = warp::test::request()
        .method("GET")
        .path("/video_feed?url=rtsp://cam.local/1")
        .header("origin", "http://dashboard.example")
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("access-control-allow-origin"));
}

#[test]
fn test_gstreamer_pipeline_parsing() {
    gstreamer::init().unwrap();

    // Skip test if the decode plugins aren't installed
    for factory in ["uridecodebin", "videoconvert", "appsink"] {
        if gstreamer::ElementFactory::find(factory).is_none() {
            eprintln!("Skipping test: {} plugin not available", factory);
            return;
        }
    }

    let launch =
        PipelineBuilder::build_launch_string("file:///test/video.mp4", SourceKind::Finite);
    let pipeline = gstreamer::parse::launch(&launch);

    assert!(
        pipeline.is_ok(),
        "Pipeline should parse successfully: {:?}",
        pipeline.err()
    );

    let pipeline = pipeline
        .unwrap()
        .downcast::<gstreamer::Pipeline>()
        .unwrap();
    assert!(pipeline.by_name(FRAME_SINK_NAME).is_some());
}

#[tokio::test]
async fn test_shutdown_ends_looping_feed() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1), marked(2)]));
    let metrics = Arc::new(RecordingMetrics::default());
    let streaming = service(opener.clone(), metrics.clone(), "/clips/fallback.mp4");

    let mut feed = streaming.open_feed(Some("/clips/loop.mp4")).await.unwrap();
    assert!(feed.next().await.is_some());

    streaming.shutdown();
    assert!(streaming.is_shutting_down());

    let rest = tokio::time::timeout(Duration::from_secs(5), feed.collect::<Vec<EncodedChunk>>())
        .await
        .expect("feed should end after shutdown");
    assert!(rest.len() <= 2 + 2 * 3);

    wait_for_releases(&opener.probe, 1).await;
    assert_eq!(
        metrics.ended.lock().unwrap().as_slice(),
        &[EndReason::ConsumerClosed]
    );
}

#[tokio::test]
async fn test_feeds_refused_after_shutdown() {
    let opener = Arc::new(ScriptedOpener::new(vec![marked(1)]));
    let streaming = http_api(opener.clone());
    let api = routes(
        streaming.clone(),
        Arc::new(OverlayService::new(Arc::new(InMemoryOverlayStore::new()))),
        &ServerConfig::new(5000).unwrap(),
    );

    streaming.shutdown();

    let direct = streaming.open_feed(Some("/clips/loop.mp4")).await;
    assert!(matches!(direct, Err(DomainError::ShuttingDown)));

    let res = warp::test::request()
        .method("GET")
        .path("/video_feed?url=/clips/loop.mp4")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(opener.opened().is_empty());
}

const CLIP_WIDTH: u32 = 62;
const CLIP_HEIGHT: u32 = 30;
const CLIP_FRAMES: u32 = 5;

/// Elements needed to write and decode the MJPEG/AVI test clip.
const CLIP_ELEMENTS: &[&str] = &[
    "videotestsrc",
    "jpegenc",
    "avimux",
    "filesink",
    "uridecodebin",
    "avidemux",
    "jpegdec",
    "videoconvert",
    "appsink",
];

fn clip_plugins_available() -> bool {
    gstreamer::init().unwrap();
    for factory in CLIP_ELEMENTS {
        if gstreamer::ElementFactory::find(factory).is_none() {
            eprintln!("Skipping test: {} plugin not available", factory);
            return false;
        }
    }
    true
}

/// Encode a short clip whose RGB rows (62 * 3 bytes) need stride padding.
fn write_test_clip(path: &Path) {
    let launch = format!(
        "videotestsrc num-buffers={} ! video/x-raw,width={},height={},framerate=30/1 ! \
         jpegenc ! avimux ! filesink location=\"{}\"",
        CLIP_FRAMES,
        CLIP_WIDTH,
        CLIP_HEIGHT,
        path.display()
    );
    let pipeline = gstreamer::parse::launch(&launch).unwrap();
    pipeline.set_state(gstreamer::State::Playing).unwrap();

    let bus = pipeline.bus().unwrap();
    for msg in bus.iter_timed(gstreamer::ClockTime::from_seconds(10)) {
        match msg.view() {
            gstreamer::MessageView::Eos(..) => break,
            gstreamer::MessageView::Error(err) => {
                panic!("Failed to write test clip: {}", err.error())
            }
            _ => {}
        }
    }
    pipeline.set_state(gstreamer::State::Null).unwrap();
}

fn read_until_end(source: &mut dyn FrameSource, running: &AtomicBool) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Some(frame) = source.read_frame(running).unwrap() {
        frames.push(frame);
        assert!(frames.len() <= CLIP_FRAMES as usize * 2, "clip never reached EOS");
    }
    frames
}

#[test]
fn test_gstreamer_source_loops_real_clip() {
    if !clip_plugins_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.avi");
    write_test_clip(&clip);

    let opener = GStreamerSourceOpener::new(Duration::from_secs(5), Duration::from_secs(5));
    let locator = SourceLocator::new(clip.to_string_lossy());
    assert_eq!(locator.kind(), SourceKind::Finite);

    let mut source = opener.open(&locator).unwrap();
    let running = AtomicBool::new(true);

    for period in 0..3 {
        let frames = read_until_end(source.as_mut(), &running);
        assert_eq!(frames.len(), CLIP_FRAMES as usize, "period {}", period);
        for frame in &frames {
            assert_eq!((frame.width(), frame.height()), (CLIP_WIDTH, CLIP_HEIGHT));
            assert!(frame.is_well_formed());
        }
        source.rewind().unwrap();
    }

    source.release();
    source.release();
}

#[test]
fn test_gstreamer_source_stops_when_running_cleared() {
    if !clip_plugins_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.avi");
    write_test_clip(&clip);

    let opener = GStreamerSourceOpener::new(Duration::from_secs(5), Duration::from_secs(5));
    let mut source = opener.open(&SourceLocator::new(clip.to_string_lossy())).unwrap();

    let stopped = AtomicBool::new(false);
    assert!(source.read_frame(&stopped).unwrap().is_none());
    source.release();
}

#[test]
fn test_gstreamer_open_missing_file_is_unavailable() {
    if !clip_plugins_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let opener = GStreamerSourceOpener::new(Duration::from_secs(5), Duration::from_secs(5));
    let missing = SourceLocator::new(dir.path().join("absent.avi").to_string_lossy());

    let result = opener.open(&missing);
    assert!(matches!(result, Err(DomainError::SourceUnavailable { .. })));
}

#[tokio::test]
async fn test_real_clip_feed_loops_and_releases() {
    if !clip_plugins_available() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("clip.avi");
    write_test_clip(&clip);

    let metrics = Arc::new(RecordingMetrics::default());
    let config = StreamConfig::new(SourceLocator::new(clip.to_string_lossy()))
        .unwrap()
        .with_read_timeout(Duration::from_secs(5));
    let streaming = StreamingService::new(
        Arc::new(GStreamerSourceOpener::from_config(&config)),
        Arc::new(JpegFrameEncoder::default()),
        metrics.clone(),
        config,
    );

    let mut feed = streaming.open_feed(None).await.unwrap();
    let periods = 2;
    for _ in 0..(CLIP_FRAMES as usize * periods + 1) {
        let chunk = tokio::time::timeout(Duration::from_secs(10), feed.next())
            .await
            .expect("frame within timeout")
            .expect("finite feeds never end on their own");
        assert!(chunk.as_bytes().starts_with(PART_HEADER));
        assert!(chunk.payload().starts_with(&[0xFF, 0xD8]));
        assert!(chunk.payload().ends_with(&[0xFF, 0xD9]));
    }
    drop(feed);

    for _ in 0..200 {
        if !metrics.ended.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(
        metrics.ended.lock().unwrap().as_slice(),
        &[EndReason::ConsumerClosed]
    );
}
