//! Background push worker.
//!
//! Remote writes are queued on a single task so they reach the remote store
//! in the order they were issued. Failed pushes are logged and dropped; the
//! local cache already holds the data and the next save of the same document
//! carries it again.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, error, info_span, trace};

use crate::remote::RemoteStore;

/// Commands processed by the push worker, in order.
pub(crate) enum PushCommand {
    /// Merge-write a document.
    Push { path: String, doc: Value },
    /// Delete a document.
    Delete { path: String },
    /// Respond once every earlier command has been handled.
    Flush { response: oneshot::Sender<()> },
}

impl std::fmt::Debug for PushCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push { path, .. } => f.debug_struct("Push").field("path", path).finish(),
            Self::Delete { path } => f.debug_struct("Delete").field("path", path).finish(),
            Self::Flush { .. } => write!(f, "Flush"),
        }
    }
}

pub(crate) struct PushWorker {
    remote: Arc<dyn RemoteStore>,
    command_rx: mpsc::UnboundedReceiver<PushCommand>,
}

impl PushWorker {
    /// Spawn the worker on the current runtime and return its command sender.
    ///
    /// The worker exits once every sender is dropped.
    pub(crate) fn start(remote: Arc<dyn RemoteStore>) -> mpsc::UnboundedSender<PushCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Self {
            remote,
            command_rx: rx,
        };
        tokio::spawn(worker.run().instrument(info_span!("push_worker")));
        tx
    }

    async fn run(mut self) {
        debug!("Push worker started");
        while let Some(cmd) = self.command_rx.recv().await {
            self.handle(cmd).await;
        }
        debug!("Push worker stopped");
    }

    async fn handle(&self, cmd: PushCommand) {
        match cmd {
            PushCommand::Push { path, doc } => {
                match self.remote.set_document_merge(&path, doc).await {
                    Ok(()) => trace!(path, "Pushed document"),
                    Err(e) => error!(path, error = %e, "Remote push failed"),
                }
            }
            PushCommand::Delete { path } => match self.remote.delete_document(&path).await {
                Ok(()) => trace!(path, "Deleted remote document"),
                Err(e) => error!(path, error = %e, "Remote delete failed"),
            },
            PushCommand::Flush { response } => {
                let _ = response.send(());
            }
        }
    }
}
