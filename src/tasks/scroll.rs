//! Replays a scripted sequence of page scrolls and viewport resizes.
use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ScriptStep;
use crate::events::PageEvent;
use crate::progress::scrollable_height;

/// Returns once every step has been delivered, or on cancellation.
pub async fn run(
    script: Vec<ScriptStep>,
    content_height: f64,
    mut viewport_height: u32,
    to_viewer: Sender<PageEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    for step in script {
        select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = sleep(step.after()) => {}
        }
        let event = match step {
            ScriptStep::Scroll { to, .. } => PageEvent::Scrolled {
                scroll_top: to,
                scrollable_height: scrollable_height(content_height, f64::from(viewport_height)),
            },
            ScriptStep::Resize { width, height, .. } => {
                viewport_height = height;
                PageEvent::Resized { width, height }
            }
        };
        debug!(?event, "page input");
        if to_viewer.send(event).await.is_err() {
            break;
        }
    }
    Ok(())
}
