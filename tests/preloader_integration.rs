use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use image::RgbaImage;
use scroll_sequence::events::{FrameResolved, PreloadStatus, Readiness};
use scroll_sequence::frames::{FramePattern, FrameSequence};
use scroll_sequence::tasks::preloader::{self, FrameFetcher, PreloadOutputs};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const FRAMES: usize = 40;
const TIMEOUT: Duration = Duration::from_millis(3000);

/// Resolves immediately; fails for locators containing "(13)".
struct MissingThirteenth;

impl FrameFetcher for MissingThirteenth {
    async fn fetch(&self, locator: PathBuf) -> Result<RgbaImage> {
        if locator.to_string_lossy().contains("(13)") {
            return Err(anyhow!("404 for {}", locator.display()));
        }
        Ok(RgbaImage::new(4, 3))
    }
}

struct AlwaysOk;

impl FrameFetcher for AlwaysOk {
    async fn fetch(&self, _locator: PathBuf) -> Result<RgbaImage> {
        Ok(RgbaImage::new(2, 2))
    }
}

/// Never resolves, like a request stuck on a dead network.
struct Stalled;

impl FrameFetcher for Stalled {
    async fn fetch(&self, _locator: PathBuf) -> Result<RgbaImage> {
        std::future::pending().await
    }
}

/// Takes a while and records how many fetches overlap.
#[derive(Default)]
struct Slow {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FrameFetcher for Slow {
    async fn fetch(&self, _locator: PathBuf) -> Result<RgbaImage> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(RgbaImage::new(1, 1))
    }
}

struct Harness {
    frames_rx: mpsc::Receiver<FrameResolved>,
    progress_rx: watch::Receiver<PreloadStatus>,
    ready_rx: oneshot::Receiver<Readiness>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<Result<()>>,
}

fn spawn<F: FrameFetcher>(fetcher: Arc<F>, max_in_flight: usize) -> Harness {
    let seq = FrameSequence::new(FRAMES, &FramePattern::default());
    let (frames_tx, frames_rx) = mpsc::channel(FRAMES);
    let (progress_tx, progress_rx) = watch::channel(PreloadStatus::new(FRAMES));
    let (ready_tx, ready_rx) = oneshot::channel();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(preloader::run(
        preloader::requests_for(&seq),
        fetcher,
        TIMEOUT,
        max_in_flight,
        PreloadOutputs {
            frames: frames_tx,
            progress: progress_tx,
            ready: ready_tx,
        },
        cancel.clone(),
    ));
    Harness {
        frames_rx,
        progress_rx,
        ready_rx,
        cancel,
        handle,
    }
}

#[tokio::test(start_paused = true)]
async fn all_successes_settle_before_timeout() {
    let start = Instant::now();
    let mut h = spawn(Arc::new(AlwaysOk), FRAMES);

    let readiness = h.ready_rx.await.expect("readiness dropped");
    assert!(start.elapsed() < TIMEOUT);
    let Readiness::Settled(status) = readiness else {
        panic!("expected settled readiness, got {readiness:?}");
    };
    assert_eq!(status.loaded, FRAMES);
    assert_eq!(status.percent(), 100.0);

    h.handle.await.unwrap().unwrap();
    assert_eq!(h.progress_rx.borrow().percent(), 100.0);

    let mut loaded = 0;
    while let Ok(event) = h.frames_rx.try_recv() {
        assert!(matches!(event, FrameResolved::Loaded { .. }));
        loaded += 1;
    }
    assert_eq!(loaded, FRAMES);
}

#[tokio::test(start_paused = true)]
async fn stalled_fetches_force_readiness_at_timeout() {
    let start = Instant::now();
    let h = spawn(Arc::new(Stalled), 8);

    let readiness = h.ready_rx.await.expect("readiness dropped");
    let elapsed = start.elapsed();
    assert!(elapsed >= TIMEOUT, "fired early after {elapsed:?}");
    assert!(elapsed < TIMEOUT + Duration::from_millis(5), "fired late after {elapsed:?}");
    assert_eq!(readiness, Readiness::TimedOut(PreloadStatus::new(FRAMES)));
    assert_eq!(h.progress_rx.borrow().percent(), 0.0);

    h.cancel.cancel();
    h.handle.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn missing_frames_count_toward_completion() {
    let mut h = spawn(Arc::new(MissingThirteenth), 4);

    let readiness = h.ready_rx.await.expect("readiness dropped");
    assert_eq!(
        readiness,
        Readiness::Settled(PreloadStatus {
            total: FRAMES,
            loaded: FRAMES - 1,
            failed: 1,
        })
    );
    h.handle.await.unwrap().unwrap();

    let mut failed = Vec::new();
    while let Ok(event) = h.frames_rx.try_recv() {
        if let FrameResolved::Failed { index } = event {
            failed.push(index);
        }
    }
    assert_eq!(failed, vec![12]);
}

#[tokio::test(start_paused = true)]
async fn concurrency_cap_is_respected() {
    let fetcher = Arc::new(Slow::default());
    let h = spawn(Arc::clone(&fetcher), 5);

    let readiness = h.ready_rx.await.expect("readiness dropped");
    // 40 frames, 5 at a time, 100ms each.
    assert!(matches!(readiness, Readiness::Settled(_)));
    h.handle.await.unwrap().unwrap();
    assert_eq!(fetcher.peak.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn fetches_finishing_after_timeout_still_arrive() {
    struct Late;
    impl FrameFetcher for Late {
        async fn fetch(&self, _locator: PathBuf) -> Result<RgbaImage> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(RgbaImage::new(1, 1))
        }
    }

    let mut h = spawn(Arc::new(Late), FRAMES);
    let readiness = h.ready_rx.await.expect("readiness dropped");
    assert!(matches!(readiness, Readiness::TimedOut(_)));

    h.handle.await.unwrap().unwrap();
    assert!(h.progress_rx.borrow().is_settled());
    let mut count = 0;
    while h.frames_rx.try_recv().is_ok() {
        count += 1;
    }
    assert_eq!(count, FRAMES);
}

#[tokio::test(start_paused = true)]
async fn panicking_fetch_resolves_its_frame_as_failed() {
    struct PanicsOnSecond;
    impl FrameFetcher for PanicsOnSecond {
        async fn fetch(&self, locator: PathBuf) -> Result<RgbaImage> {
            if locator.to_string_lossy().contains("(2)") {
                panic!("decoder blew up on {}", locator.display());
            }
            Ok(RgbaImage::new(1, 1))
        }
    }

    let mut h = spawn(Arc::new(PanicsOnSecond), 8);
    let readiness = h.ready_rx.await.expect("readiness dropped");
    assert_eq!(
        readiness,
        Readiness::Settled(PreloadStatus {
            total: FRAMES,
            loaded: FRAMES - 1,
            failed: 1,
        })
    );
    h.handle.await.unwrap().unwrap();

    let mut store = FrameSequence::new(FRAMES, &FramePattern::default());
    while let Ok(event) = h.frames_rx.try_recv() {
        match event {
            FrameResolved::Loaded { index, image } => store.mark_loaded(index, image).unwrap(),
            FrameResolved::Failed { index } => store.mark_failed(index).unwrap(),
        }
    }
    assert!(store.is_settled());
    let second = store.get(1).unwrap();
    assert!(second.is_resolved());
    assert!(!second.is_loaded());
}

#[tokio::test(start_paused = true)]
async fn stops_fetching_once_frame_store_is_gone() {
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }
    impl FrameFetcher for Counting {
        async fn fetch(&self, _locator: PathBuf) -> Result<RgbaImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RgbaImage::new(1, 1))
        }
    }

    let fetcher = Arc::new(Counting::default());
    let Harness {
        frames_rx, handle, ..
    } = spawn(Arc::clone(&fetcher), 1);
    drop(frames_rx);

    handle.await.unwrap().unwrap();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}
