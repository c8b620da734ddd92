//! One streaming session: list, select, fetch, emit.
//!
//! The session walks the listing page by page and hands each file to its
//! selector. Accepted files are downloaded and sent before the next file is
//! looked at, through a channel of capacity one, so at most one event is in
//! flight. Every network call and every send is raced against the receiver
//! going away and against server shutdown; either stops the session at the
//! next await.

use crate::encode::encode_data_uri;
use crate::error::{Result, SessionError};
use crate::event::StreamEvent;
use crate::selector::{Decision, TimeWindowSelector};
use bridge_traits::storage::{ListQuery, RemoteFile, StorageProvider};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The requested number of files was sent.
    Completed,
    /// A file beyond the horizon was reached.
    HorizonReached,
    /// The listing ran out.
    Exhausted,
    /// The client went away or the server is shutting down.
    Cancelled,
    /// Listing or fetching failed; an error event was sent.
    Failed,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SessionOutcome::Completed => "completed",
            SessionOutcome::HorizonReached => "horizon reached",
            SessionOutcome::Exhausted => "listing exhausted",
            SessionOutcome::Cancelled => "cancelled",
            SessionOutcome::Failed => "failed",
        };
        f.write_str(text)
    }
}

pub struct StreamSession {
    provider: Arc<dyn StorageProvider>,
    query: ListQuery,
    selector: TimeWindowSelector,
    shutdown: CancellationToken,
}

impl StreamSession {
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        query: ListQuery,
        selector: TimeWindowSelector,
    ) -> Self {
        Self {
            provider,
            query,
            selector,
            shutdown: CancellationToken::new(),
        }
    }

    /// Stop the session when `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run on a new task and return the receiving end of its events.
    ///
    /// The channel closes when the session ends; dropping the receiver
    /// cancels the session.
    pub fn start(self) -> (mpsc::Receiver<StreamEvent>, JoinHandle<SessionOutcome>) {
        let (sender, receiver) = mpsc::channel(1);
        let task = tokio::spawn(self.run(sender));
        (receiver, task)
    }

    /// Drive the session to completion, sending events to `sender`.
    #[instrument(skip_all, fields(max_files = self.selector.config().max_files))]
    pub async fn run(mut self, sender: mpsc::Sender<StreamEvent>) -> SessionOutcome {
        let outcome = match self.drive(&sender).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Stream session failed");
                // The client may already be gone; nothing else to do then.
                let _ = sender.send(StreamEvent::error()).await;
                SessionOutcome::Failed
            }
        };

        info!(
            outcome = %outcome,
            accepted = self.selector.cursor().accepted_count,
            "Stream session finished"
        );
        outcome
    }

    async fn drive(&mut self, sender: &mpsc::Sender<StreamEvent>) -> Result<SessionOutcome> {
        let mut page_token: Option<String> = None;

        loop {
            if self.selector.is_satisfied() {
                return Ok(SessionOutcome::Completed);
            }

            let query = self.query.continue_from(page_token.take());
            let page = tokio::select! {
                biased;
                _ = self.interrupted(sender) => return Ok(SessionOutcome::Cancelled),
                page = self.provider.list_page(&query) => {
                    page.map_err(|e| SessionError::RemoteList(e.to_string()))?
                }
            };
            debug!(files = page.files.len(), has_more = page.has_more(), "Listed page");

            for file in &page.files {
                match self.selector.evaluate(file) {
                    Decision::Skip(reason) => {
                        debug!(file = %file.name, reason = %reason, "Skipped");
                    }
                    Decision::Halt => {
                        debug!(file = %file.name, "Beyond horizon");
                        return Ok(SessionOutcome::HorizonReached);
                    }
                    Decision::Accept(_) => {
                        let Some(bytes) = self.fetch(file, sender).await? else {
                            return Ok(SessionOutcome::Cancelled);
                        };
                        let event =
                            StreamEvent::file(file.name.clone(), encode_data_uri(file.mime_type.as_deref(), &bytes));
                        drop(bytes);

                        let sent = tokio::select! {
                            biased;
                            _ = self.shutdown.cancelled() => false,
                            sent = sender.send(event) => sent.is_ok(),
                        };
                        if !sent {
                            return Ok(SessionOutcome::Cancelled);
                        }
                        debug!(file_id = %file.id, file = %file.name, "Sent file");

                        if self.selector.is_satisfied() {
                            return Ok(SessionOutcome::Completed);
                        }
                    }
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => return Ok(SessionOutcome::Exhausted),
            }
        }
    }

    /// Resolves once the client is gone or shutdown has begun.
    async fn interrupted(&self, sender: &mpsc::Sender<StreamEvent>) {
        tokio::select! {
            _ = sender.closed() => {}
            _ = self.shutdown.cancelled() => {}
        }
    }

    /// Download `file`, or `None` if the session was interrupted first.
    async fn fetch(
        &self,
        file: &RemoteFile,
        sender: &mpsc::Sender<StreamEvent>,
    ) -> Result<Option<Bytes>> {
        tokio::select! {
            biased;
            _ = self.interrupted(sender) => Ok(None),
            bytes = self.provider.download(&file.id) => {
                bytes.map(Some).map_err(|e| SessionError::Fetch {
                    file_id: file.id.clone(),
                    file_name: file.name.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
