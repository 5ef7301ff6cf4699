//! In-process effect execution for reducer flow tests.
//!
//! [`drive`] reduces an action, awaits every effect it returns and reduces
//! whatever they produce, until the flow goes quiet. Effects run in the
//! calling task; `Parallel` branches are joined concurrently, `Sequential`
//! branches run in order, mirroring the `Store` runtime.

use futures::future::BoxFuture;
use lavado_core::{effect::Effect, reducer::Reducer};

/// Upper bound on fed-back actions before [`drive`] gives up.
pub const MAX_STEPS: usize = 256;

/// Execute effects and collect the actions they produce, in completion order
/// for `Parallel` and declaration order otherwise.
pub async fn run_effects<A, I>(effects: I) -> Vec<A>
where
    A: Send + 'static,
    I: IntoIterator<Item = Effect<A>>,
{
    let mut produced = Vec::new();
    for effect in effects {
        produced.extend(run_effect(effect).await);
    }
    produced
}

fn run_effect<A: Send + 'static>(effect: Effect<A>) -> BoxFuture<'static, Vec<A>> {
    Box::pin(async move {
        match effect {
            Effect::None => Vec::new(),
            Effect::Future(fut) => fut.await.into_iter().collect(),
            Effect::Parallel(effects) => {
                futures::future::join_all(effects.into_iter().map(run_effect))
                    .await
                    .into_iter()
                    .flatten()
                    .collect()
            },
            Effect::Sequential(effects) => {
                let mut produced = Vec::new();
                for effect in effects {
                    produced.extend(run_effect(effect).await);
                }
                produced
            },
        }
    })
}

/// Reduce `action` and every action its effects feed back until none remain
///
/// Returns the trace of fed-back actions (excluding `action` itself) in the
/// order they were reduced.
///
/// # Panics
///
/// Panics when more than [`MAX_STEPS`] actions are fed back, which means the
/// reducer loops.
#[allow(clippy::panic)]
pub async fn drive<R>(
    reducer: &R,
    state: &mut R::State,
    action: R::Action,
    env: &R::Environment,
) -> Vec<R::Action>
where
    R: Reducer,
    R::Action: Clone + Send + 'static,
{
    let mut trace = Vec::new();
    let mut queue = std::collections::VecDeque::from([action]);
    let mut first = true;

    while let Some(next) = queue.pop_front() {
        if !first {
            trace.push(next.clone());
            assert!(trace.len() <= MAX_STEPS, "reducer did not settle after {MAX_STEPS} steps");
        }
        first = false;

        let effects = reducer.reduce(state, next, env);
        queue.extend(run_effects(effects).await);
    }

    trace
}
