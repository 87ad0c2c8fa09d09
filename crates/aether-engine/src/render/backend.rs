use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use super::DrawPass;

/// Outcome of an executed draw pass.
pub type PassResult = Result<(), PassError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PassError {
    /// The backend dropped the pass without executing it.
    #[error("draw pass was dropped before completion")]
    Cancelled,
    /// The device rejected or failed the pass.
    #[error("device error: {0}")]
    Device(String),
    /// The pass uses something the backend cannot execute.
    #[error("unsupported draw pass: {0}")]
    Unsupported(String),
}

/// Draw-submission collaborator.
///
/// Submission is asynchronous: `submit` records/queues the pass and returns
/// immediately. Failures are reported only through the returned completion;
/// backends do not retry.
pub trait RenderBackend {
    fn submit(&mut self, pass: DrawPass) -> PassCompletion;
}

/// Future resolving when a submitted pass has finished executing.
///
/// Resolves to `Err(PassError::Cancelled)` if the backend drops the pass.
#[derive(Debug)]
pub struct PassCompletion {
    rx: oneshot::Receiver<PassResult>,
}

/// Sending half of a [`PassCompletion`], held by the backend.
///
/// `Send`, so it can be moved into device callbacks.
#[derive(Debug)]
pub struct PassSignal {
    tx: oneshot::Sender<PassResult>,
}

impl PassCompletion {
    pub fn channel() -> (PassSignal, PassCompletion) {
        let (tx, rx) = oneshot::channel();
        (PassSignal { tx }, PassCompletion { rx })
    }

    /// A completion that is already resolved.
    pub fn ready(result: PassResult) -> Self {
        let (signal, completion) = Self::channel();
        signal.complete(result);
        completion
    }

    /// Non-blocking check; `None` while the pass is still in flight.
    pub fn try_result(&mut self) -> Option<PassResult> {
        match self.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::Canceled) => Some(Err(PassError::Cancelled)),
        }
    }
}

impl Future for PassCompletion {
    type Output = PassResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<PassResult> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(PassError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl PassSignal {
    pub fn complete(self, result: PassResult) {
        // Receiver gone: nobody is waiting, nothing to do.
        let _ = self.tx.send(result);
    }
}
