//! # Lavado Runtime
//!
//! The [`Store`] owns feature state, runs the reducer for every action and
//! executes the effects it returns. Actions produced by effects are fed back
//! into the store, closing the loop:
//!
//! ```text
//! Action → Reducer → (State', Effects) → Effect Execution → More Actions
//! ```
//!
//! Reducer calls are serialized behind a write lock, so a single state value is
//! never reduced concurrently. Effects run on spawned tasks.
//!
//! ## Example
//!
//! ```ignore
//! use lavado_runtime::Store;
//!
//! let store = Store::new(AuthState::default(), AuthReducer::new(), env);
//! store.send(AuthAction::SubmitRegistration { form }).await?;
//! store.settle(Duration::from_secs(5)).await?;
//! let phase = store.state(|s| s.registration.phase.clone()).await;
//! ```

use futures::future::BoxFuture;
use lavado_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, RwLock, broadcast};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Timeout waiting for a terminal action or for effects to settle
        #[error("Timeout waiting for store")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Decrements the pending-effect counter on drop and wakes `settle` waiters
/// when the last effect finishes, even if the effect task panicked.
struct PendingGuard {
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// The Store - runtime coordinator for a reducer
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    idle: Arc<Notify>,
    /// Every action produced by an effect is broadcast here after it has been
    /// reduced, so observers always see state that already reflects it.
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            idle: Arc::clone(&self.idle),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Clone + Send + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    ///
    /// The action broadcast channel holds 16 actions; use
    /// [`Store::with_broadcast_capacity`] for chattier features.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
    }

    /// Create a new store with a custom action broadcast capacity
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity.max(1));

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
            action_broadcast,
        }
    }

    /// Send an action to the store
    ///
    /// Runs the reducer under the state write lock, then starts every returned
    /// effect. Returns once the reducer has run; effects keep executing in the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`Store::shutdown`].
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.commands.total").increment(1);

        let effects = {
            let mut state = self.state.write().await;

            let start = Instant::now();
            let effects = self.reducer.reduce(&mut *state, action, &*self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            effects
        };

        tracing::trace!("Reducer returned {} effects", effects.len());
        for effect in effects {
            self.execute_effect(effect);
        }

        Ok(())
    }

    /// Send an action and wait for a matching action produced by its effects
    ///
    /// Subscribes before sending so no result can be missed. The returned
    /// action has already been reduced.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action before `timeout`
    /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
    /// - [`StoreError::ShutdownInProgress`]: the store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.action_broadcast.subscribe();
        self.send(action).await?;

        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(candidate) if predicate(&candidate) => return Ok(candidate),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged, continuing");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to actions produced by effects
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read current state via a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&state)
    }

    /// Number of effects currently executing
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.pending_effects.load(Ordering::SeqCst)
    }

    /// Wait until every effect, including effects started by fed-back
    /// actions, has finished
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running after
    /// `timeout`.
    pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
        let wait = async {
            loop {
                let notified = self.idle.notified();
                if self.pending_effects.load(Ordering::SeqCst) == 0 {
                    return;
                }
                notified.await;
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| StoreError::Timeout)
    }

    /// Stop accepting actions and wait for running effects to finish
    ///
    /// Actions fed back by still-running effects are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running after
    /// `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("Store shutdown initiated");
        self.shutdown.store(true, Ordering::Release);
        self.settle(timeout).await
    }

    fn execute_effect(&self, effect: Effect<A>) {
        if effect.is_none() {
            metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            return;
        }

        self.pending_effects.fetch_add(1, Ordering::SeqCst);
        let guard = PendingGuard {
            pending: Arc::clone(&self.pending_effects),
            idle: Arc::clone(&self.idle),
        };

        let task = self.run_effect(effect);
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    fn run_effect(&self, effect: Effect<A>) -> BoxFuture<'static, ()> {
        let store = self.clone();

        Box::pin(async move {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    if let Some(action) = fut.await {
                        store.feed_back(action).await;
                    } else {
                        tracing::trace!("Effect::Future completed with no action");
                    }
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    futures::future::join_all(effects.into_iter().map(|e| store.run_effect(e)))
                        .await;
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    for effect in effects {
                        store.run_effect(effect).await;
                    }
                },
            }
        })
    }

    async fn feed_back(&self, action: A) {
        if let Err(error) = self.send(action.clone()).await {
            tracing::warn!(%error, "Dropped action produced by effect");
            return;
        }
        // No receivers is normal when nobody is waiting on a result
        let _ = self.action_broadcast.send(action);
    }
}
