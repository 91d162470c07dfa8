//! Pool of reusable recognition engines.
//!
//! Loading models is expensive, so engines are created lazily up to the
//! pool capacity and handed out through [`PooledEngine`] guards. A guard
//! puts its engine back when dropped, whichever way the holder exits.

use std::ops::Deref;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use super::RecognizerFactory;
use crate::error::OcrError;

struct PoolState<E> {
    idle: Vec<E>,
    /// Engines created and not destroyed, idle or checked out.
    live: usize,
}

/// A bounded pool of recognizers built by `F`.
pub struct EnginePool<F: RecognizerFactory> {
    factory: F,
    capacity: usize,
    state: Mutex<PoolState<F::Recognizer>>,
    returned: Condvar,
}

impl<F: RecognizerFactory> EnginePool<F> {
    /// Create an empty pool holding at most `capacity` engines.
    pub fn new(factory: F, capacity: usize) -> Self {
        Self {
            factory,
            capacity: capacity.max(1),
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                live: 0,
            }),
            returned: Condvar::new(),
        }
    }

    /// Maximum number of engines.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of engines created so far and still alive.
    pub fn live(&self) -> usize {
        self.lock().live
    }

    /// Number of engines waiting in the pool.
    pub fn idle(&self) -> usize {
        self.lock().idle.len()
    }

    /// Check out an engine, creating one if the pool is below capacity and
    /// waiting for a release otherwise.
    pub fn acquire(&self) -> Result<PooledEngine<'_, F>, OcrError> {
        let mut state = self.lock();
        loop {
            if let Some(engine) = state.idle.pop() {
                trace!("Reusing pooled engine");
                return Ok(PooledEngine {
                    pool: self,
                    engine: Some(engine),
                });
            }

            if state.live < self.capacity {
                state.live += 1;
                let slot = state.live;
                drop(state);

                debug!("Creating engine {}/{}", slot, self.capacity);
                return match self.factory.create() {
                    Ok(engine) => Ok(PooledEngine {
                        pool: self,
                        engine: Some(engine),
                    }),
                    Err(e) => {
                        self.lock().live -= 1;
                        self.returned.notify_one();
                        Err(e)
                    }
                };
            }

            state = self
                .returned
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn release(&self, engine: F::Recognizer) {
        self.lock().idle.push(engine);
        self.returned.notify_one();
    }

    fn forget(&self) {
        self.lock().live -= 1;
        self.returned.notify_one();
    }

    // The state is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, PoolState<F::Recognizer>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An engine checked out of an [`EnginePool`].
pub struct PooledEngine<'a, F: RecognizerFactory> {
    pool: &'a EnginePool<F>,
    engine: Option<F::Recognizer>,
}

impl<F: RecognizerFactory> PooledEngine<'_, F> {
    /// Destroy the engine instead of returning it, freeing its slot for a
    /// fresh one.
    pub fn discard(mut self) {
        if self.engine.take().is_some() {
            debug!("Discarding pooled engine");
            self.pool.forget();
        }
    }
}

impl<F: RecognizerFactory> Deref for PooledEngine<'_, F> {
    type Target = F::Recognizer;

    fn deref(&self) -> &Self::Target {
        match self.engine.as_ref() {
            Some(engine) => engine,
            None => unreachable!("engine is only taken when the guard is consumed"),
        }
    }
}

impl<F: RecognizerFactory> Drop for PooledEngine<'_, F> {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            self.pool.release(engine);
        }
    }
}
