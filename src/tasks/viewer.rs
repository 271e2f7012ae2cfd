//! Single owner of the frame store, motion state and output handles.
//!
//! Every input (frame resolutions, preload progress, readiness, page events,
//! display ticks) is handled on one task, so none of the state needs locking.
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::{mpsc::Receiver, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{FrameResolved, PageEvent, PreloadStatus, Readiness};
use crate::frames::FrameSequence;
use crate::host::PageHost;
use crate::motion::{MotionController, MotionMode, Update};
use crate::overlay::OverlayPresenter;
use crate::progress::raw_offset_to_progress;
use crate::render::renderer::{FrameRenderer, Viewport};
use crate::render::surface::DrawSurface;

pub struct Viewer<S, H> {
    frames: FrameSequence,
    renderer: FrameRenderer,
    motion: MotionController,
    presenter: OverlayPresenter,
    surface: S,
    host: H,
    started: bool,
    renders: u64,
}

impl<S: DrawSurface, H: PageHost> Viewer<S, H> {
    pub fn new(
        frames: FrameSequence,
        viewport: Viewport,
        mode: MotionMode,
        mut surface: S,
        host: H,
    ) -> Self {
        surface.resize(viewport.width, viewport.height);
        let motion = MotionController::new(mode, frames.len());
        Self {
            frames,
            renderer: FrameRenderer::new(viewport),
            motion,
            presenter: OverlayPresenter,
            surface,
            host,
            started: false,
            renders: 0,
        }
    }

    pub fn frames(&self) -> &FrameSequence {
        &self.frames
    }

    pub fn motion(&self) -> &MotionController {
        &self.motion
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_parts(self) -> (S, H) {
        (self.surface, self.host)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of draws issued to the surface so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn on_frame_resolved(&mut self, event: FrameResolved) {
        let index = event.index();
        let result = match event {
            FrameResolved::Loaded { index, image } => self
                .frames
                .mark_loaded(index, image)
                .map(|()| self.motion.on_frame_loaded(index)),
            FrameResolved::Failed { index } => self.frames.mark_failed(index).map(|()| None),
        };
        match result {
            Ok(update) => self.apply(update),
            Err(err) => warn!(index, "ignoring frame update: {err}"),
        }
    }

    pub fn on_preload_progress(&mut self, status: PreloadStatus) {
        self.host.set_loading_progress(status.percent());
    }

    /// Hides the loader and begins animating. Later calls are ignored.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.host.hide_loader();
        info!(frames = %self.frames, mode = ?self.motion.mode(), "animation started");
        let update = self.motion.start();
        self.apply(update);
    }

    pub fn on_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Scrolled {
                scroll_top,
                scrollable_height,
            } => {
                let progress = raw_offset_to_progress(scroll_top, scrollable_height);
                let update = self.motion.on_scroll(progress);
                self.apply(update);
            }
            PageEvent::Resized { width, height } => {
                self.renderer.resize(Viewport::new(width, height));
                self.surface.resize(width, height);
                let update = self.motion.on_resize();
                self.apply(update);
            }
        }
    }

    pub fn on_tick(&mut self) {
        let update = self.motion.tick();
        self.apply(update);
    }

    fn wants_ticks(&self) -> bool {
        self.started && matches!(self.motion.mode(), MotionMode::Continuous { .. })
    }

    fn apply(&mut self, update: Option<Update>) {
        let Some(update) = update else {
            return;
        };
        if !self.started {
            return;
        }
        if update.redraw {
            self.renderer.draw(
                &mut self.surface,
                &self.frames,
                update.progress,
                self.motion.mode().render_mode(),
            );
            self.renders += 1;
        }
        self.presenter.present(&mut self.host, update.progress);
    }
}

pub struct ViewerInputs {
    pub frames: Receiver<FrameResolved>,
    pub progress: watch::Receiver<PreloadStatus>,
    pub ready: oneshot::Receiver<Readiness>,
    pub page: Receiver<PageEvent>,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewerTiming {
    /// Delay between every frame resolving and the first render.
    pub settle_delay: Duration,
    pub tick_interval: Duration,
}

/// Drives `viewer` until cancelled and hands it back for inspection.
pub async fn run<S: DrawSurface, H: PageHost>(
    mut viewer: Viewer<S, H>,
    inputs: ViewerInputs,
    timing: ViewerTiming,
    cancel: CancellationToken,
) -> Result<Viewer<S, H>> {
    let ViewerInputs {
        frames: mut frames_rx,
        progress: mut progress_rx,
        ready: mut ready_rx,
        page: mut page_rx,
    } = inputs;
    let mut awaiting_ready = true;
    let mut progress_open = true;
    let mut start_at: Option<Instant> = None;
    let mut ticker = interval(timing.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let start_deadline = start_at.unwrap_or_else(Instant::now);
        // Frames queued ahead of readiness must land before the first render.
        select! {
            biased;

            _ = cancel.cancelled() => break,

            Some(event) = frames_rx.recv() => viewer.on_frame_resolved(event),

            changed = progress_rx.changed(), if progress_open => {
                match changed {
                    Ok(()) => {
                        let status = *progress_rx.borrow_and_update();
                        viewer.on_preload_progress(status);
                    }
                    Err(_) => progress_open = false,
                }
            }

            readiness = &mut ready_rx, if awaiting_ready => {
                awaiting_ready = false;
                match readiness {
                    Ok(Readiness::Settled(status)) => {
                        debug!(?status, delay = ?timing.settle_delay, "all frames resolved; settling");
                        start_at = Some(Instant::now() + timing.settle_delay);
                    }
                    Ok(Readiness::TimedOut(status)) => {
                        info!(resolved = status.resolved(), total = status.total, "force starting animation");
                        drain_frames(&mut viewer, &mut frames_rx);
                        viewer.start();
                    }
                    Err(_) => {
                        warn!("preloader went away before readiness; starting anyway");
                        drain_frames(&mut viewer, &mut frames_rx);
                        viewer.start();
                    }
                }
            }

            _ = sleep_until(start_deadline), if start_at.is_some() => {
                start_at = None;
                drain_frames(&mut viewer, &mut frames_rx);
                viewer.start();
            }

            Some(event) = page_rx.recv() => viewer.on_page_event(event),

            _ = ticker.tick(), if viewer.wants_ticks() => viewer.on_tick(),
        }
    }

    debug!(renders = viewer.render_count(), "viewer stopped");
    Ok(viewer)
}

fn drain_frames<S: DrawSurface, H: PageHost>(
    viewer: &mut Viewer<S, H>,
    frames_rx: &mut Receiver<FrameResolved>,
) {
    while let Ok(event) = frames_rx.try_recv() {
        viewer.on_frame_resolved(event);
    }
}
