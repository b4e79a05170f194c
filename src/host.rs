//! Async host loop.
//!
//! Drives a [`PreviewSession`] from three sources: host events (edits,
//! refresh, reset), compile results, and the session's own timers (debounce
//! and guard cooldowns). All session calls happen on this one task.

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::files::FileSet;
use crate::renderer::PreviewSurface;
use crate::session::PreviewSession;
use crate::worker::{CompileDispatch, CompileResponse};

#[derive(Debug)]
pub enum HostEvent {
    /// The file store has a new snapshot.
    FilesChanged(FileSet),
    /// Schedule a compile without an edit, e.g. on startup.
    RequestCompile { force: bool },
    /// Re-inject the current artifact.
    Refresh,
    Reset,
    Shutdown,
}

/// Run until [`HostEvent::Shutdown`] or until the event sender is dropped,
/// then hand the session back.
pub async fn run<D, S>(
    mut session: PreviewSession<D, S>,
    mut events: mpsc::Receiver<HostEvent>,
    mut results: mpsc::UnboundedReceiver<CompileResponse>,
) -> PreviewSession<D, S>
where
    D: CompileDispatch,
    S: PreviewSurface,
{
    info!("preview host loop started");

    loop {
        let deadline = session.next_deadline();

        tokio::select! {
            event = events.recv() => {
                let now = Instant::now();
                match event {
                    Some(HostEvent::FilesChanged(files)) => session.files_changed(files, now),
                    Some(HostEvent::RequestCompile { force }) => session.request_compile(force, now),
                    Some(HostEvent::Refresh) => session.refresh(now),
                    Some(HostEvent::Reset) => session.reset(now),
                    Some(HostEvent::Shutdown) | None => break,
                }
            }
            Some(response) = results.recv() => {
                debug!(sequence = response.sequence, "compile result received");
                session.apply_result(response, Instant::now());
            }
            _ = wait_for(deadline) => {
                session.poll_timers(Instant::now());
            }
        }
    }

    info!("preview host loop stopped");
    session
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
