use crate::{error::ResourceError, key::ResourceKey, producer::ResourceReqs};
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, Waker},
};
use tokio::runtime::Handle;

type BoxedOperation<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// Externally visible state of a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceStatus {
    Pending,
    Resolved,
    Rejected,
}

/// Outcome of a non-blocking read.
#[derive(Debug)]
pub enum Read<T> {
    /// Not settled yet. The caller should yield and read again once notified.
    Pending,
    Ready(Arc<T>),
    Failed(ResourceError),
}

impl<T> Read<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Read::Pending)
    }

    pub fn into_poll(self) -> Poll<Result<Arc<T>, ResourceError>> {
        match self {
            Read::Pending => Poll::Pending,
            Read::Ready(value) => Poll::Ready(Ok(value)),
            Read::Failed(err) => Poll::Ready(Err(err)),
        }
    }
}

enum Phase<T> {
    // Operation created but not started
    Idle(BoxedOperation<T>),
    Running,
    Resolved(Arc<T>),
    Rejected(ResourceError),
}

struct State<T> {
    phase: Phase<T>,
    // Tasks to wake once the operation settles
    wakers: Vec<Waker>,
}

/// One asynchronous operation and its eventual outcome.
///
/// The operation is started by the first read, and settles exactly once; after
/// that every read observes the same value or the same failure.
pub struct LazyResource<T: ResourceReqs> {
    key: ResourceKey,
    state: Mutex<State<T>>,
    runtime: Handle,
    debug_name: &'static str,
}

impl<T: ResourceReqs> LazyResource<T> {
    pub fn new(
        key: impl Into<ResourceKey>,
        operation: impl Future<Output = Result<T>> + Send + 'static,
        runtime: Handle,
    ) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            state: Mutex::new(State {
                phase: Phase::Idle(Box::pin(operation)),
                wakers: Vec::new(),
            }),
            runtime,
            debug_name: std::any::type_name::<T>(),
        })
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Name of the value type, for diagnostics.
    pub fn debug_name(&self) -> &'static str {
        self.debug_name
    }

    /// Current state. Does not start the operation.
    pub fn status(&self) -> ResourceStatus {
        match self.state.lock().phase {
            Phase::Idle(_) | Phase::Running => ResourceStatus::Pending,
            Phase::Resolved(_) => ResourceStatus::Resolved,
            Phase::Rejected(_) => ResourceStatus::Rejected,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status() != ResourceStatus::Pending
    }

    /// Reads the outcome without blocking, starting the operation on first use.
    pub fn read(self: &Arc<Self>) -> Read<T> {
        let (read, operation) = Self::read_locked(&mut self.state.lock());
        self.start(operation);
        read
    }

    /// Like [`read`](Self::read), but registers the task so it is woken when
    /// the resource settles.
    pub fn poll_read(self: &Arc<Self>, cx: &mut Context<'_>) -> Poll<Result<Arc<T>, ResourceError>> {
        let (read, operation) = {
            let mut state = self.state.lock();
            let (read, operation) = Self::read_locked(&mut state);

            if read.is_pending() && !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                state.wakers.push(cx.waker().clone());
            }

            (read, operation)
        };

        self.start(operation);
        read.into_poll()
    }

    /// Waits for the outcome, starting the operation if nobody has yet.
    pub async fn settled(self: &Arc<Self>) -> Result<Arc<T>, ResourceError> {
        std::future::poll_fn(|cx| self.poll_read(cx)).await
    }

    // Hands out the operation if this read is the one that starts it. Spawning
    // happens after the state lock is released, since a runtime that is shut
    // down drops the task (and settles the resource) synchronously.
    fn read_locked(state: &mut State<T>) -> (Read<T>, Option<BoxedOperation<T>>) {
        match &state.phase {
            Phase::Resolved(value) => return (Read::Ready(value.clone()), None),
            Phase::Rejected(err) => return (Read::Failed(err.clone()), None),
            Phase::Running => return (Read::Pending, None),
            Phase::Idle(_) => {}
        }

        match std::mem::replace(&mut state.phase, Phase::Running) {
            Phase::Idle(operation) => (Read::Pending, Some(operation)),
            _ => (Read::Pending, None),
        }
    }

    fn start(self: &Arc<Self>, operation: Option<BoxedOperation<T>>) {
        let operation = match operation {
            Some(operation) => operation,
            None => return,
        };

        log::info!("Loading {} for `{}`", self.debug_name, self.key);

        // The task keeps the resource alive, so the outcome is recorded even
        // if every reader has gone away. If the task is dropped unfinished,
        // the guard records a failure instead.
        let guard = SettleGuard {
            resource: Some(self.clone()),
        };
        let key = self.key.clone();
        let runtime = self.runtime.clone();

        self.runtime.spawn(async move {
            let outcome = match runtime.spawn(operation).await {
                Ok(result) => result
                    .map(Arc::new)
                    .map_err(|err| ResourceError::operation_failed(&key, err)),
                Err(join_err) => Err(ResourceError::operation_failed(
                    &key,
                    anyhow!("operation did not complete: {}", join_err),
                )),
            };

            guard.settle(outcome);
        });
    }

    fn settle(&self, outcome: std::result::Result<Arc<T>, ResourceError>) {
        let wakers = {
            let mut state = self.state.lock();

            if !matches!(state.phase, Phase::Running) {
                log::warn!("Ignoring a second outcome for `{}`", self.key);
                return;
            }

            state.phase = match outcome {
                Ok(value) => {
                    log::debug!("Resolved `{}`", self.key);
                    Phase::Resolved(value)
                }
                Err(err) => {
                    log::warn!("{}", err);
                    Phase::Rejected(err)
                }
            };

            std::mem::take(&mut state.wakers)
        };

        for waker in wakers {
            waker.wake();
        }
    }
}

impl<T: ResourceReqs> fmt::Debug for LazyResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyResource")
            .field("key", &self.key)
            .field("type", &self.debug_name)
            .field("status", &self.status())
            .finish()
    }
}

// Settles its resource exactly once: with the task's outcome, or with a
// failure if the task is dropped first (e.g. its runtime shut down).
struct SettleGuard<T: ResourceReqs> {
    resource: Option<Arc<LazyResource<T>>>,
}

impl<T: ResourceReqs> SettleGuard<T> {
    fn settle(mut self, outcome: std::result::Result<Arc<T>, ResourceError>) {
        if let Some(resource) = self.resource.take() {
            resource.settle(outcome);
        }
    }
}

impl<T: ResourceReqs> Drop for SettleGuard<T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            let err = ResourceError::operation_failed(
                &resource.key,
                anyhow!("runtime shut down before `{}` settled", resource.key),
            );
            resource.settle(Err(err));
        }
    }
}
