use super::{
    errors::TaskError,
    model::JoinOrdering,
    result::TaskResult,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use futures::{
    future,
    stream::{FuturesUnordered, StreamExt},
};
use tokio::{
    sync::oneshot::{self, error::TryRecvError},
    time::Duration,
};
use tokio_util::sync::CancellationToken;


/// Type-erased unit of work. Invoking it runs the user closure and
/// publishes the outcome into the matching [`ResultHandle`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;


/// Handle на результат задачи: write-once на стороне воркера, read-once на стороне вызывающего
pub struct ResultHandle<T> {
    cancel_token: CancellationToken,
    receiver: oneshot::Receiver<TaskResult<T>>,
}

impl<T> ResultHandle<T> {

    pub(crate) fn new
    (
        cancel_token: CancellationToken,
        receiver: oneshot::Receiver<TaskResult<T>>,
    ) -> Self {
        Self {
            cancel_token,
            receiver
        }
    }

    /// Skips the task if no worker has started it yet.
    #[inline]
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Blocks the current thread until the task finishes.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async runtime; `.await` the handle there instead.
    pub fn get(self) -> TaskResult<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(TaskError::Abandoned))
    }

    /// Returns the outcome if it is already available, otherwise hands the handle back.
    pub fn try_get(mut self) -> Result<TaskResult<T>, Self> {
        match self.receiver.try_recv() {
            Ok(result) => Ok(result),
            Err(TryRecvError::Closed) => Ok(Err(TaskError::Abandoned)),
            Err(TryRecvError::Empty) => Err(self),
        }
    }

    pub async fn await_timeout(self, timeout: Duration) -> TaskResult<T> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TaskError::Abandoned),
            Err(_) => Err(TaskError::Timeout),
        }
    }
}

impl<T> Future for ResultHandle<T> {
    type Output = TaskResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(res) => Poll::Ready(res.unwrap_or(Err(TaskError::Abandoned))),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Awaits every handle, in submission order or as they complete.
pub async fn join_handles<T>(handles: Vec<ResultHandle<T>>, ordering: JoinOrdering) -> Vec<TaskResult<T>> {
    if handles.is_empty() {
        return Vec::new();
    }

    match ordering {
        JoinOrdering::Ordered => future::join_all(handles).await,
        JoinOrdering::UnOrdered => {
            let len = handles.len();
            let mut pending = FuturesUnordered::from_iter(handles);
            let mut results = Vec::with_capacity(len);
            while let Some(result) = pending.next().await {
                results.push(result);
            }
            results
        }
    }
}
