//! Cancellable periodic tasks.

use futures::future::LocalBoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type SpawnFn = dyn Fn(LocalBoxFuture<'static, ()>) + Send + Sync;
type SleepFn = dyn Fn(u32) -> LocalBoxFuture<'static, ()> + Send + Sync;

/// Where background work runs: a spawner for local futures and a timer.
///
/// Stores default to the browser runtime; tests swap in [`testing`] to step
/// spawned work and timers by hand.
#[derive(Clone)]
pub struct TaskRuntime {
    spawn: Arc<SpawnFn>,
    sleep: Arc<SleepFn>,
}

impl TaskRuntime {
    pub fn new(
        spawn: impl Fn(LocalBoxFuture<'static, ()>) + Send + Sync + 'static,
        sleep: impl Fn(u32) -> LocalBoxFuture<'static, ()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            spawn: Arc::new(spawn),
            sleep: Arc::new(sleep),
        }
    }

    /// `spawn_local` plus `setTimeout`.
    pub fn browser() -> Self {
        Self::new(|task| leptos::task::spawn_local(task), |ms| {
            Box::pin(gloo_timers::future::TimeoutFuture::new(ms))
        })
    }

    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        (self.spawn)(Box::pin(task));
    }

    pub fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        (self.sleep)(ms)
    }
}

impl Default for TaskRuntime {
    fn default() -> Self {
        Self::browser()
    }
}

/// Handle to a task that runs `tick` every `period_ms` on the local executor.
///
/// The loop checks the handle before each tick and exits once the handle is
/// cancelled or dropped. A tick already in flight is allowed to finish.
#[derive(Debug)]
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
}

impl ScheduledTask {
    pub fn every<F, Fut>(period_ms: u32, tick: F) -> Self
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        Self::every_on(&TaskRuntime::browser(), period_ms, tick)
    }

    pub fn every_on<F, Fut>(runtime: &TaskRuntime, period_ms: u32, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let timer = runtime.clone();
        runtime.spawn(async move {
            loop {
                timer.sleep(period_ms).await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                tick().await;
            }
        });
        Self { cancelled }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
