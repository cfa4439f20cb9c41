use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ollama::{GenerateError, TokenStream};

/// One event pulled from a live stream session.
#[derive(Debug)]
pub enum SessionEvent {
    Token(String),
    Done,
    Failed(GenerateError),
}

/// The live state for one in-flight generate request: a pump task that
/// forwards the upstream token stream into a channel. Cancelling (or
/// dropping) the session aborts the task, which drops the stream and
/// releases the upstream connection mid-read if necessary.
pub struct StreamSession {
    rx: mpsc::UnboundedReceiver<SessionEvent>,
    task: JoinHandle<()>,
    cancelled: bool,
}

impl StreamSession {
    pub fn spawn(mut stream: TokenStream) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                // Checked every iteration so an abandoned session stops
                // consuming upstream promptly
                if tx.is_closed() {
                    return;
                }
                match item {
                    Ok(token) => {
                        if tx.send(SessionEvent::Token(token)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(SessionEvent::Failed(err));
                        return;
                    }
                }
            }
            let _ = tx.send(SessionEvent::Done);
        });

        Self {
            rx,
            task,
            cancelled: false,
        }
    }

    /// Receive the next event. Reports `Done` if the session was cancelled
    /// or the pump task is gone. Events already forwarded into the channel
    /// before cancellation are discarded, never delivered.
    pub async fn next_event(&mut self) -> SessionEvent {
        if self.cancelled {
            return SessionEvent::Done;
        }
        self.rx.recv().await.unwrap_or(SessionEvent::Done)
    }

    /// Stop the session immediately. Idempotent.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.task.abort();
        self.rx.close();
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}
