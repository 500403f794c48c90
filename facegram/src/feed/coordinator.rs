//! Infinite-scroll coordinator.
//!
//! One tokio task owns the [`Pager`], the debounce timer and the single
//! in-flight fetch. The host talks to it through a [`FeedHandle`]: commands go
//! in over an mpsc channel, state comes out over a watch channel, and notable
//! outcomes (including every failure) are reported on an event channel.

use super::debounce::Debouncer;
use super::liveness::{Liveness, LivenessGuard};
use super::pager::{PageOutcome, PageRequest, PageSizePolicy, Pager};
use super::{FetchError, PageSource};
use futures_util::future::BoxFuture;
use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub page_sizes: PageSizePolicy,
    pub debounce: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_sizes: PageSizePolicy::default(),
            debounce: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    PageLoaded { page: u32, count: usize },
    Exhausted { page: u32 },
    FetchFailed { page: u32, error: FetchError },
}

#[derive(Debug, Clone, Copy)]
enum FeedCommand {
    Initialize,
    ScrollProximity(bool),
}

type Completion<T> = (PageRequest, Result<Vec<T>, FetchError>);

/// Host-side handle. Dropping it tears the coordinator down.
pub struct FeedHandle<T> {
    cmd_tx: mpsc::UnboundedSender<FeedCommand>,
    state_rx: watch::Receiver<Pager<T>>,
    guard: LivenessGuard,
    task: JoinHandle<()>,
}

impl<T: Clone> FeedHandle<T> {
    /// Reset to page 0 and fetch it right away.
    pub fn initialize(&self) {
        self.send(FeedCommand::Initialize);
    }

    pub fn on_scroll_proximity(&self, is_near_bottom: bool) {
        self.send(FeedCommand::ScrollProximity(is_near_bottom));
    }

    /// True while the coordinator task is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    fn send(&self, cmd: FeedCommand) {
        if let Err(e) = self.cmd_tx.send(cmd) {
            tracing::warn!(command = ?e.0, "feed coordinator has stopped, command dropped");
        }
    }

    pub fn items(&self) -> Vec<T> {
        self.state_rx.borrow().items().to_vec()
    }

    /// Run `f` against the current items without copying them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(self.state_rx.borrow().items())
    }

    pub fn len(&self) -> usize {
        self.state_rx.borrow().items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.state_rx.borrow().is_in_flight()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state_rx.borrow().is_exhausted()
    }

    pub fn cursor(&self) -> u32 {
        self.state_rx.borrow().cursor()
    }

    /// Receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<Pager<T>> {
        self.state_rx.clone()
    }

    /// Revoke liveness, stop the task, and wait for it to finish.
    pub async fn shutdown(self) {
        let FeedHandle {
            cmd_tx,
            guard,
            task,
            ..
        } = self;
        guard.revoke();
        drop(cmd_tx);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "feed task ended abnormally");
        }
    }
}

/// Start a coordinator over `source`. Nothing is fetched until `initialize`.
pub fn spawn_feed<S>(
    source: Arc<S>,
    settings: FeedSettings,
) -> (FeedHandle<S::Item>, mpsc::UnboundedReceiver<FeedEvent>)
where
    S: PageSource + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(Pager::new(settings.page_sizes));
    let (guard, liveness) = Liveness::new();

    let coordinator = Coordinator {
        source,
        state_tx,
        event_tx,
        cmd_rx,
        debounce: Debouncer::new(settings.debounce),
        in_flight: None,
        liveness,
    };
    let task = tokio::spawn(coordinator.run());

    (
        FeedHandle {
            cmd_tx,
            state_rx,
            guard,
            task,
        },
        event_rx,
    )
}

struct Coordinator<S: PageSource> {
    source: Arc<S>,
    state_tx: watch::Sender<Pager<S::Item>>,
    event_tx: mpsc::UnboundedSender<FeedEvent>,
    cmd_rx: mpsc::UnboundedReceiver<FeedCommand>,
    debounce: Debouncer,
    in_flight: Option<BoxFuture<'static, Completion<S::Item>>>,
    liveness: Liveness,
}

impl<S: PageSource + 'static> Coordinator<S> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(FeedCommand::Initialize) => self.initialize(),
                    Some(FeedCommand::ScrollProximity(near)) => self.on_scroll_proximity(near),
                    None => break,
                },
                () = self.debounce.expired(), if self.debounce.is_pending() => {
                    self.start_fetch();
                }
                (request, result) = next_completion(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.finish(request, result);
                }
            }
            if !self.liveness.is_live() {
                break;
            }
        }
        tracing::debug!("feed coordinator stopped");
    }

    fn initialize(&mut self) {
        self.debounce.cancel();
        self.in_flight = None;
        self.state_tx.send_modify(|pager| pager.reset());
        self.start_fetch();
    }

    fn on_scroll_proximity(&mut self, near_bottom: bool) {
        if !near_bottom {
            return;
        }
        if !self.state_tx.borrow().can_fetch() {
            tracing::trace!("proximity signal dropped: fetch in flight or feed exhausted");
            return;
        }
        self.debounce.schedule();
    }

    fn start_fetch(&mut self) {
        let mut request = None;
        self.state_tx.send_if_modified(|pager| {
            request = pager.begin_fetch();
            request.is_some()
        });
        let Some(request) = request else { return };

        tracing::debug!(page = request.page, size = request.size, "fetching page");
        let source = Arc::clone(&self.source);
        self.in_flight = Some(Box::pin(async move {
            let result = source.fetch_page(request.page, request.size).await;
            (request, result)
        }));
    }

    fn finish(&mut self, request: PageRequest, result: Result<Vec<S::Item>, FetchError>) {
        if !self.liveness.is_live() {
            tracing::debug!(page = request.page, "view gone, discarding page");
            return;
        }

        let mut outcome = None;
        self.state_tx.send_if_modified(|pager| {
            let applied = pager.complete(request, result);
            let modified = !matches!(applied, PageOutcome::Stale { .. });
            outcome = Some(applied);
            modified
        });

        let event = match outcome {
            Some(PageOutcome::Appended { page, count }) => {
                tracing::debug!(page, count, "page appended");
                FeedEvent::PageLoaded { page, count }
            }
            Some(PageOutcome::Exhausted { page }) => {
                tracing::debug!(page, "feed exhausted");
                FeedEvent::Exhausted { page }
            }
            Some(PageOutcome::Failed { page, error }) => {
                tracing::warn!(page, error = %error, "page fetch failed");
                FeedEvent::FetchFailed { page, error }
            }
            Some(PageOutcome::Stale { page }) => {
                tracing::debug!(page, "stale page result dropped");
                return;
            }
            None => return,
        };
        let _ = self.event_tx.send(event);
    }
}

async fn next_completion<F>(slot: &mut Option<F>) -> F::Output
where
    F: Future + Unpin,
{
    match slot.as_mut() {
        Some(fut) => fut.await,
        None => future::pending().await,
    }
}
