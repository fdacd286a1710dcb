//! The seam between the scheduler and the remote service.
//!
//! An [`Operation`] is a cloneable, zero-argument fallible call. Each call is one attempt; its
//! error is resolved into a [`Classification`] exactly once, when the attempt completes.
use pin_project::pin_project;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;
use tickburst_core::Classification;
use tokio::time::Instant;

/// Errors that can tell whether they were a rate-limit rejection.
///
/// Remote error types implement this once, usually through [`Classification::from_code`].
pub trait Classify {
    fn classify(&self) -> Classification;
}

impl Classify for Classification {
    fn classify(&self) -> Classification {
        self.clone()
    }
}

pub(crate) type BoxedAttempt = Pin<Box<dyn Future<Output = Classification> + Send>>;

/// Type-erased remote operation.
#[derive(Clone)]
pub struct Operation {
    func: Arc<dyn Fn() -> BoxedAttempt + Send + Sync>,
}

impl Operation {
    /// Wrap a fallible async call.
    ///
    /// # Example
    /// ```no_run
    /// use tickburst::{Classification, Operation};
    ///
    /// let op = Operation::new(|| async { Ok::<_, Classification>(()) });
    /// ```
    pub fn new<T, F, R, E>(func: T) -> Self
    where
        T: Fn() -> F + Send + Sync + 'static,
        F: Future<Output = Result<R, E>> + Send + 'static,
        E: Classify,
    {
        Self {
            func: Arc::new(move || -> BoxedAttempt {
                let fut = func();
                Box::pin(async move {
                    match fut.await {
                        Ok(_) => Classification::Success,
                        Err(err) => err.classify(),
                    }
                })
            }),
        }
    }

    pub(crate) fn attempt(&self) -> BoxedAttempt {
        (self.func)()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Timing {
    pub start: Instant,
    pub end: Instant,
    pub started_at: SystemTime,
}

/// Records when the wrapped future is first polled and when it resolves.
#[pin_project]
pub(crate) struct Timed<F> {
    #[pin]
    inner: F,
    start: Option<(Instant, SystemTime)>,
}

impl<F> Timed<F> {
    pub fn new(inner: F) -> Self {
        Self { inner, start: None }
    }
}

impl<F: Future> Future for Timed<F> {
    type Output = (F::Output, Timing);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let (start, started_at) = *this
            .start
            .get_or_insert_with(|| (Instant::now(), SystemTime::now()));

        match this.inner.poll(cx) {
            Poll::Ready(output) => Poll::Ready((
                output,
                Timing {
                    start,
                    end: Instant::now(),
                    started_at,
                },
            )),
            Poll::Pending => Poll::Pending,
        }
    }
}
