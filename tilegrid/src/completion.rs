use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::{Error, Result};

/// A completion signal for work scheduled on a [`crate::GridView`] or a [`crate::DataSource`].
///
/// The engine is single-threaded and cooperative: a completion only makes progress while the
/// host drives `GridView::run_pass` (or `settle`). It can be inspected without blocking with
/// [`Completion::is_done`] / [`Completion::result`], or awaited as a `Future`.
///
/// If the producing [`Resolver`] is dropped unresolved, the completion fails with
/// [`Error::Disposed`].
pub struct Completion<T> {
    receiver: Option<oneshot::Receiver<Result<T>>>,
    outcome: Option<Result<T>>,
}

/// The producing half of a [`Completion`].
pub struct Resolver<T> {
    sender: oneshot::Sender<Result<T>>,
}

// Only the receiver is ever polled; `T` is never pinned.
impl<T> Unpin for Completion<T> {}

impl<T> Completion<T> {
    /// A completion that resolves when `Resolver::resolve` is called.
    pub fn pending() -> (Self, Resolver<T>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                receiver: Some(receiver),
                outcome: None,
            },
            Resolver { sender },
        )
    }

    /// A completion that is already resolved.
    pub fn resolved(result: Result<T>) -> Self {
        Self {
            receiver: None,
            outcome: Some(result),
        }
    }

    pub fn is_done(&mut self) -> bool {
        self.try_settle();
        self.receiver.is_none()
    }

    /// Returns a copy of the outcome, or `None` while pending (or after it was awaited).
    pub fn result(&mut self) -> Option<Result<T>>
    where
        T: Clone,
    {
        self.try_settle();
        self.outcome.clone()
    }

    /// Moves the outcome out, if it arrived.
    pub fn take_result(&mut self) -> Option<Result<T>> {
        self.try_settle();
        self.outcome.take()
    }

    pub fn is_ok(&mut self) -> bool {
        self.try_settle();
        matches!(self.outcome, Some(Ok(_)))
    }

    fn try_settle(&mut self) {
        let Some(receiver) = self.receiver.as_mut() else {
            return;
        };
        let outcome = match receiver.try_recv() {
            Ok(Some(result)) => result,
            Ok(None) => return,
            Err(oneshot::Canceled) => Err(Error::Disposed),
        };
        self.receiver = None;
        self.outcome = Some(outcome);
    }
}

impl<T> core::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Completion")
            .field("done", &self.receiver.is_none())
            .finish_non_exhaustive()
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        if let Some(outcome) = this.outcome.take() {
            return Poll::Ready(outcome);
        }
        let Some(receiver) = this.receiver.as_mut() else {
            return Poll::Pending;
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(received) => {
                this.receiver = None;
                Poll::Ready(received.unwrap_or(Err(Error::Disposed)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Resolver<T> {
    pub fn resolve(self, result: Result<T>) {
        // A dropped completion is not interested in the outcome.
        let _ = self.sender.send(result);
    }
}

impl<T> core::fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Resolver")
            .field("canceled", &self.sender.is_canceled())
            .finish()
    }
}
