//! Compile Unit
//!
//! The transform runs on its own thread, owning its [`ModuleTransformer`] and
//! therefore its cache. The main context talks to it only through messages:
//! one [`CompileRequest`] in, exactly one [`CompileResponse`] out.

use serde::{Deserialize, Serialize};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;
use crate::error::{CompileError, DispatchError};
use crate::files::FileSet;
use crate::transform::ModuleTransformer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    /// Monotonic per session; echoed back in the response.
    pub sequence: u64,
    pub files: FileSet,
}

/// `{ "code": … }` or `{ "error": … }` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompileOutcome {
    Code { code: String },
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    pub sequence: u64,
    #[serde(flatten)]
    pub outcome: CompileOutcome,
}

/// Sending side of the compile unit's mailbox.
pub trait CompileDispatch {
    fn is_ready(&self) -> bool;
    fn dispatch(&mut self, request: CompileRequest) -> Result<(), DispatchError>;
}

/// Compile one request. Never panics; every failure becomes an error outcome.
pub fn handle_request(transformer: &mut ModuleTransformer, request: CompileRequest) -> CompileResponse {
    let CompileRequest { sequence, files } = request;

    let result = if files.is_empty() {
        Err(CompileError::InvalidRequest("empty file set".to_string()))
    } else {
        transformer.compile(&files)
    };

    let outcome = match result {
        Ok(code) => CompileOutcome::Code { code },
        Err(err) => {
            let marker = &transformer.config().in_memory_marker;
            let error = if err.to_string().contains(marker.as_str()) {
                "could not find an in-memory file reference, check the import statements and file references"
                    .to_string()
            } else {
                err.to_string()
            };
            warn!(sequence, %error, "compile job failed");
            CompileOutcome::Error { error }
        }
    };

    CompileResponse { sequence, outcome }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKER THREAD
// ═══════════════════════════════════════════════════════════════════════════════

pub struct CompileWorker {
    requests: mpsc::UnboundedSender<CompileRequest>,
    thread: Option<JoinHandle<()>>,
}

impl CompileWorker {
    /// Start the compile thread. Responses arrive on the returned receiver.
    pub fn spawn(
        config: PreviewConfig,
    ) -> std::io::Result<(Self, mpsc::UnboundedReceiver<CompileResponse>)> {
        Self::spawn_with(ModuleTransformer::new(config))
    }

    pub fn spawn_with(
        mut transformer: ModuleTransformer,
    ) -> std::io::Result<(Self, mpsc::UnboundedReceiver<CompileResponse>)> {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<CompileRequest>();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        let thread = std::thread::Builder::new()
            .name("preview-compiler".to_string())
            .spawn(move || {
                info!("compile unit started");
                while let Some(request) = request_rx.blocking_recv() {
                    debug!(
                        sequence = request.sequence,
                        files = request.files.len(),
                        "compile request received"
                    );
                    let response = handle_request(&mut transformer, request);
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
                info!("compile unit stopped");
            })?;

        Ok((
            Self {
                requests: request_tx,
                thread: Some(thread),
            },
            response_rx,
        ))
    }

    /// Close the mailbox and wait for the in-flight job, if any.
    pub fn shutdown(mut self) {
        let thread = self.thread.take();
        drop(self);
        if let Some(thread) = thread {
            if thread.join().is_err() {
                warn!("compile unit panicked");
            }
        }
    }
}

impl CompileDispatch for CompileWorker {
    fn is_ready(&self) -> bool {
        !self.requests.is_closed()
    }

    fn dispatch(&mut self, request: CompileRequest) -> Result<(), DispatchError> {
        self.requests.send(request).map_err(|_| DispatchError::Closed)
    }
}
