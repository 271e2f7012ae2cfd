//! Fetches every frame once, reports progress, and signals readiness.
//!
//! Readiness fires when all fetches resolved or when the timeout elapses,
//! whichever comes first. Fetches still in flight after a timeout keep
//! running and their results are delivered as usual.
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use image::RgbaImage;
use tokio::select;
use tokio::sync::{mpsc::Sender, oneshot, watch};
use tokio::task::{Id, JoinSet};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{FrameResolved, LoadFrame, PreloadStatus, Readiness};
use crate::frames::FrameSequence;

/// Single-resolution image fetch for one frame locator.
pub trait FrameFetcher: Send + Sync + 'static {
    fn fetch(&self, locator: PathBuf) -> impl Future<Output = Result<RgbaImage>> + Send;
}

/// Decodes frames from the local filesystem on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFetcher;

impl FrameFetcher for DiskFetcher {
    async fn fetch(&self, locator: PathBuf) -> Result<RgbaImage> {
        tokio::task::spawn_blocking(move || decode_rgba8(&locator))
            .await
            .context("decode task failed")?
    }
}

fn decode_rgba8(path: &Path) -> Result<RgbaImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// One load request per frame, in sequence order.
pub fn requests_for(frames: &FrameSequence) -> Vec<LoadFrame> {
    frames
        .iter()
        .enumerate()
        .map(|(index, frame)| LoadFrame {
            index,
            locator: frame.locator().to_path_buf(),
        })
        .collect()
}

/// Where the preloader reports.
pub struct PreloadOutputs {
    pub frames: Sender<FrameResolved>,
    pub progress: watch::Sender<PreloadStatus>,
    pub ready: oneshot::Sender<Readiness>,
}

pub async fn run<F: FrameFetcher>(
    requests: Vec<LoadFrame>,
    fetcher: Arc<F>,
    timeout: Duration,
    max_in_flight: usize,
    outputs: PreloadOutputs,
    cancel: CancellationToken,
) -> Result<()> {
    let PreloadOutputs {
        frames: to_viewer,
        progress,
        ready,
    } = outputs;
    let mut ready = Some(ready);
    let mut status = PreloadStatus::new(requests.len());
    let mut queue: VecDeque<LoadFrame> = requests.into();
    let mut tasks: JoinSet<Result<RgbaImage>> = JoinSet::new();
    let mut in_flight: HashMap<Id, LoadFrame> = HashMap::new();
    let max_in_flight = max_in_flight.max(1);

    info!(total = status.total, timeout = ?timeout, "preloading frames");
    progress.send_replace(status);
    if status.is_settled() {
        signal_ready(&mut ready, Readiness::Settled(status));
    }

    let deadline = sleep(timeout);
    tokio::pin!(deadline);

    loop {
        while tasks.len() < max_in_flight {
            let Some(request) = queue.pop_front() else {
                break;
            };
            let fetcher = Arc::clone(&fetcher);
            let locator = request.locator.clone();
            let handle = tasks.spawn(async move { fetcher.fetch(locator).await });
            in_flight.insert(handle.id(), request);
        }

        if tasks.is_empty() {
            break;
        }

        select! {
            _ = cancel.cancelled() => break,

            Some(joined) = tasks.join_next_with_id() => {
                let (id, outcome) = match joined {
                    Ok((id, result)) => (id, result),
                    Err(err) => {
                        let id = err.id();
                        (id, Err(anyhow::anyhow!("fetch task aborted: {err}")))
                    }
                };
                let Some(request) = in_flight.remove(&id) else {
                    continue;
                };
                let event = match outcome {
                    Ok(image) => {
                        debug!(frame = request.index + 1, "loaded {}", request.locator.display());
                        status.loaded += 1;
                        FrameResolved::Loaded { index: request.index, image: Arc::new(image) }
                    }
                    Err(err) => {
                        warn!("frame {} missing, skipping: {err:#}", request.index + 1);
                        status.failed += 1;
                        FrameResolved::Failed { index: request.index }
                    }
                };
                if to_viewer.send(event).await.is_err() {
                    debug!("frame store gone; stopping preload");
                    break;
                }
                progress.send_replace(status);
                if status.is_settled() {
                    signal_ready(&mut ready, Readiness::Settled(status));
                }
            }

            _ = &mut deadline, if ready.is_some() => {
                warn!(
                    resolved = status.resolved(),
                    total = status.total,
                    "preload timed out; force starting animation"
                );
                signal_ready(&mut ready, Readiness::TimedOut(status));
            }
        }
    }

    debug!(
        loaded = status.loaded,
        failed = status.failed,
        "preloader finished"
    );
    Ok(())
}

fn signal_ready(ready: &mut Option<oneshot::Sender<Readiness>>, readiness: Readiness) {
    if let Some(tx) = ready.take() {
        info!(?readiness, "frames ready");
        let _ = tx.send(readiness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FramePattern;
    use image::Rgba;

    #[test]
    fn requests_cover_every_frame() {
        let seq = FrameSequence::new(3, &FramePattern::new("f/{index}.jpg").unwrap());
        let requests = requests_for(&seq);
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].index, 2);
        assert_eq!(requests[2].locator, PathBuf::from("f/3.jpg"));
    }

    #[tokio::test]
    async fn disk_fetcher_decodes_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame (1).png");
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let img = DiskFetcher.fetch(path).await.unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);

        let missing = DiskFetcher.fetch(dir.path().join("frame (2).png")).await;
        assert!(missing.is_err());
    }
}
