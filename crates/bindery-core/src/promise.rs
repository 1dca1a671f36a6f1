#![forbid(unsafe_code)]

//! Future-backed observables.
//!
//! A future-backed [`Data`] starts its work only when it gains its first
//! subscriber, then stores the resolved value with [`Data::set`]. The work is
//! started at most once: later create/destroy cycles reuse whatever value
//! arrived.
//!
//! Futures are driven by the host's async primitive, abstracted as
//! [`Spawner`]. The single-threaded [`LocalSpawner`] from `futures` is the
//! stock implementation.
//!
//! # Failure Modes
//!
//! - **Spawn rejected** (executor shut down): logged, the value stays
//!   undefined.
//! - **Fallible future resolves to `Err`**: logged, the value stays
//!   undefined. Nothing is retried.
//! - **All subscribers gone before resolution**: the value is still stored,
//!   nobody is notified. There is no cancellation.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, SpawnError};

use crate::observable::{Data, Source};

/// Host capability for running `!Send` futures to completion.
pub trait Spawner {
    /// Schedule `task` on the host executor.
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), SpawnError>;
}

impl Spawner for LocalSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), SpawnError> {
        self.spawn_local_obj(task.into())
    }
}

enum Work<T> {
    Future(LocalBoxFuture<'static, Option<T>>),
    Factory(Box<dyn FnOnce() -> LocalBoxFuture<'static, Option<T>>>),
    Started,
}

struct PromiseSource<T> {
    spawner: Rc<dyn Spawner>,
    work: Work<T>,
}

impl<T: Clone + PartialEq + 'static> Source<T> for PromiseSource<T> {
    fn create(&mut self, target: &Data<T>) {
        let future = match std::mem::replace(&mut self.work, Work::Started) {
            Work::Started => return,
            Work::Future(future) => future,
            Work::Factory(factory) => factory(),
        };
        let target = target.clone();
        let task = async move {
            if let Some(value) = future.await {
                target.set(value);
            }
        };
        if let Err(err) = self.spawner.spawn_task(task.boxed_local()) {
            tracing::warn!(error = %err, "failed to spawn observable work; value stays undefined");
        }
    }

    fn destroy(&mut self, _target: &Data<T>) {}
}

impl<T: Clone + PartialEq + 'static> Data<T> {
    fn from_work(spawner: Rc<dyn Spawner>, work: Work<T>) -> Self {
        Self::with_source(None, Some(Box::new(PromiseSource { spawner, work })))
    }

    /// Observable resolved by an already-created future.
    ///
    /// Prefer [`Data::lazy`]: a future created up front may already be
    /// holding resources before anyone observes the value. The future itself
    /// is still not polled until the first subscriber arrives.
    pub fn from_future(
        spawner: Rc<dyn Spawner>,
        future: impl Future<Output = T> + 'static,
    ) -> Self {
        Self::from_work(spawner, Work::Future(future.map(Some).boxed_local()))
    }

    /// Observable resolved by a future that `factory` creates on first
    /// subscription.
    pub fn lazy<F, Fut>(spawner: Rc<dyn Spawner>, factory: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = T> + 'static,
    {
        Self::from_work(
            spawner,
            Work::Factory(Box::new(move || factory().map(Some).boxed_local())),
        )
    }

    /// Like [`Data::lazy`] for fallible work: an `Err` is logged and the
    /// value stays undefined.
    pub fn lazy_fallible<F, Fut, E>(spawner: Rc<dyn Spawner>, factory: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: fmt::Display + 'static,
    {
        Self::from_work(
            spawner,
            Work::Factory(Box::new(move || {
                factory()
                    .map(|outcome| match outcome {
                        Ok(value) => Some(value),
                        Err(err) => {
                            tracing::warn!(error = %err, "observable work failed");
                            None
                        }
                    })
                    .boxed_local()
            })),
        )
    }
}
