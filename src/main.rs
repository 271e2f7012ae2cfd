//! Binary entrypoint: renders a scripted scroll session headlessly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use scroll_sequence::config::Configuration;
use scroll_sequence::events::{FrameResolved, PageEvent, PreloadStatus};
use scroll_sequence::host::TracingHost;
use scroll_sequence::overlay::{Overlay, lighting_for, overlay_flags_for};
use scroll_sequence::progress::{continuous_blend, discrete_index};
use scroll_sequence::render::canvas::RgbaCanvas;
use scroll_sequence::render::renderer::RenderMode;
use scroll_sequence::tasks::preloader::{self, DiskFetcher, PreloadOutputs};
use scroll_sequence::tasks::viewer::{self, Viewer, ViewerInputs, ViewerTiming};
use scroll_sequence::tasks::scroll;

#[derive(Debug, Parser)]
#[command(
    name = "scroll-sequence",
    version,
    about = "Scroll-driven image sequence renderer"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Override the configured animation strategy
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Write the final canvas to this PNG file
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
    /// Print the progress mapping for evenly spaced samples without loading frames
    #[arg(long = "dry-run", value_name = "SAMPLES")]
    dry_run: Option<usize>,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Discrete,
    Continuous,
}

impl From<ModeArg> for RenderMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Discrete => RenderMode::Discrete,
            ModeArg::Continuous => RenderMode::Continuous,
        }
    }
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("scroll_sequence={level}").parse()?);
    fmt().with_env_filter(filter).with_target(false).compact().init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        mode,
        output,
        dry_run,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let mut cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    if let Some(mode) = mode {
        cfg.motion.mode = mode.into();
    }
    info!(
        frames = cfg.frames.count,
        mode = ?cfg.motion.mode,
        timeout = %humantime::format_duration(cfg.preload.timeout),
        "loaded configuration from {}",
        config.display()
    );

    if let Some(samples) = dry_run {
        run_dry_run(&cfg, samples);
        return Ok(());
    }

    let frames = cfg.frame_sequence()?;
    let requests = preloader::requests_for(&frames);

    // Channels (small/bounded)
    let (frames_tx, frames_rx) = mpsc::channel::<FrameResolved>(cfg.frames.count); // Preloader -> Viewer
    let (progress_tx, progress_rx) = watch::channel(PreloadStatus::new(cfg.frames.count)); // Preloader -> Viewer
    let (ready_tx, ready_rx) = oneshot::channel(); // Preloader -> Viewer
    let (page_tx, page_rx) = mpsc::channel::<PageEvent>(16); // Script -> Viewer

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // Preloader
    tasks.spawn({
        let cancel = cancel.clone();
        let outputs = PreloadOutputs {
            frames: frames_tx,
            progress: progress_tx,
            ready: ready_tx,
        };
        let timeout = cfg.preload.timeout;
        let max_in_flight = cfg.preload.max_concurrent_fetches;
        async move {
            preloader::run(
                requests,
                Arc::new(DiskFetcher),
                timeout,
                max_in_flight,
                outputs,
                cancel,
            )
            .await
            .context("preloader task failed")
        }
    });

    // Scroll script, then stop once the animation had time to catch up
    tasks.spawn({
        let cancel = cancel.clone();
        let script = cfg.scroll_script.clone();
        let content_height = cfg.page.scroll_height;
        let viewport_height = cfg.viewport.height;
        let preload_timeout = cfg.preload.timeout;
        let wind_down = cfg.preload.settle_delay + cfg.linger;
        let mut preload = progress_rx.clone();
        async move {
            scroll::run(script, content_height, viewport_height, page_tx, cancel.clone())
                .await
                .context("scroll script failed")?;
            let _ = timeout(preload_timeout, preload.wait_for(|s| s.is_settled())).await;
            select! {
                _ = cancel.cancelled() => {}
                _ = sleep(wind_down) => {
                    info!("scroll script finished; stopping");
                    cancel.cancel();
                }
            }
            Ok(())
        }
    });

    let viewer = Viewer::new(
        frames,
        cfg.viewport(),
        cfg.motion_mode(),
        RgbaCanvas::new(cfg.viewport.width, cfg.viewport.height),
        TracingHost::new(),
    );
    let inputs = ViewerInputs {
        frames: frames_rx,
        progress: progress_rx,
        ready: ready_rx,
        page: page_rx,
    };
    let timing = ViewerTiming {
        settle_delay: cfg.preload.settle_delay,
        tick_interval: cfg.motion.tick_interval,
    };
    let viewer = viewer::run(viewer, inputs, timing, cancel.clone())
        .await
        .context("viewer failed")?;
    // Ensure other tasks are asked to stop
    cancel.cancel();

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    info!(
        renders = viewer.render_count(),
        frames = %viewer.frames(),
        "session finished"
    );

    if let Some(path) = output {
        let (canvas, _host) = viewer.into_parts();
        canvas
            .save_png(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote final canvas to {}", path.display());
    }

    Ok(())
}

fn run_dry_run(cfg: &Configuration, samples: usize) {
    let count = cfg.frames.count;
    println!(
        "# mapping dry run\n# frames: {}\n# pattern: {}\n# samples: {}\n",
        count, cfg.frames.pattern, samples
    );
    println!(
        "# {:>8} {:>8} {:>16} {:>8} {:>6}  overlays",
        "progress", "discrete", "continuous", "opacity", "scale"
    );
    let steps = samples.saturating_sub(1).max(1);
    for i in 0..samples {
        let progress = i as f64 / steps as f64;
        let blend = continuous_blend(progress, count);
        let light = lighting_for(progress);
        let flags = overlay_flags_for(progress);
        let active: Vec<&str> = Overlay::ALL
            .iter()
            .filter(|o| flags.get(**o))
            .map(|o| o.element_id())
            .collect();
        println!(
            "  {:>8.4} {:>8} {:>16} {:>8.4} {:>6.3}  {}",
            progress,
            discrete_index(progress, count),
            format!("{}->{} @{:.3}", blend.lower, blend.upper, blend.weight),
            light.opacity,
            light.scale,
            if active.is_empty() {
                "-".to_string()
            } else {
                active.join(",")
            }
        );
    }
}
