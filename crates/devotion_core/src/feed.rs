//! In-process change feed with explicit subscription handles.
//!
//! # Responsibility
//! - Keep a registry of listeners for one kind of snapshot.
//! - Hand out `Subscription` values that own their cancellation.
//!
//! # Invariants
//! - Listeners run outside the registry lock; a listener may cancel itself
//!   or subscribe others while being notified.
//! - Snapshots are delivered in `publish` call order, without dedup.
//! - `publish_latest` never delivers a snapshot older than one already
//!   delivered, and its deliveries do not interleave.
//! - Cancelling a subscription more than once is a no-op.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

/// Shared listener callback.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T: ?Sized> {
    next_id: u64,
    listeners: BTreeMap<u64, Listener<T>>,
}

/// Orders `publish_latest` calls across threads.
#[derive(Default)]
struct Sequencer {
    issued: AtomicU64,
    state: Mutex<DeliveryState>,
    idle: Condvar,
}

#[derive(Default)]
struct DeliveryState {
    delivered: u64,
    /// Thread currently loading or delivering for `publish_latest`.
    owner: Option<ThreadId>,
    /// Set when a listener asked for another round mid-delivery.
    rerun: bool,
}

/// Releases the delivery turn, also when a listener panics.
struct DeliveryTurn<'a> {
    sequencer: &'a Sequencer,
}

impl Drop for DeliveryTurn<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.sequencer.state);
        state.owner = None;
        state.rerun = false;
        drop(state);
        self.sequencer.idle.notify_all();
    }
}

/// Clonable handle to one listener registry.
///
/// Clones share the registry, so repositories opened over the same store
/// can publish to the same set of subscribers.
pub struct ChangeFeed<T: ?Sized> {
    registry: Arc<Mutex<Registry<T>>>,
    sequencer: Arc<Sequencer>,
}

impl<T: ?Sized> Clone for ChangeFeed<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            sequencer: Arc::clone(&self.sequencer),
        }
    }
}

impl<T: ?Sized> Default for ChangeFeed<T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: BTreeMap::new(),
            })),
            sequencer: Arc::default(),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for ChangeFeed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeFeed")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T: ?Sized + 'static> ChangeFeed<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for every future `publish`.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(Arc::new(listener))
    }

    /// Delivers `initial` to `listener` only, then registers it.
    pub fn subscribe_with_initial<F>(&self, initial: &T, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(listener);
        listener(initial);
        self.register(listener)
    }

    /// Notifies every registered listener with `snapshot`.
    pub fn publish(&self, snapshot: &T) {
        let listeners: Vec<Listener<T>> =
            lock(&self.registry).listeners.values().cloned().collect();
        for listener in listeners {
            listener(snapshot);
        }
    }

    /// Loads a snapshot and publishes it unless a newer one already went out.
    ///
    /// Call after the change is committed. Loads and deliveries run one at a
    /// time across clones, so listeners never see an older snapshot after a
    /// newer one. Returns `Ok(false)` when a load that started after this
    /// call already covered it. A call made by a listener during delivery is
    /// deferred: the running delivery reloads and publishes again once its
    /// listeners return.
    pub fn publish_latest<S, E, L>(&self, load: L) -> Result<bool, E>
    where
        L: Fn() -> Result<S, E>,
        S: Borrow<T>,
    {
        let sequencer: &Sequencer = &self.sequencer;
        let ticket = sequencer.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let current = thread::current().id();

        let mut state = lock(&sequencer.state);
        if state.owner == Some(current) {
            state.rerun = true;
            return Ok(true);
        }
        while state.owner.is_some() {
            state = sequencer
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if ticket <= state.delivered {
            return Ok(false);
        }
        state.owner = Some(current);
        drop(state);

        let _turn = DeliveryTurn { sequencer };
        loop {
            let mark = sequencer.issued.load(Ordering::SeqCst);
            let snapshot = load()?;
            {
                let mut state = lock(&sequencer.state);
                state.delivered = state.delivered.max(mark);
            }
            self.publish(snapshot.borrow());

            if !std::mem::take(&mut lock(&sequencer.state).rerun) {
                return Ok(true);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry).listeners.len()
    }

    pub fn has_listeners(&self) -> bool {
        self.listener_count() > 0
    }

    fn register(&self, listener: Listener<T>) -> Subscription {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, listener);
            id
        };

        let weak: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = weak.upgrade() {
                lock(&registry).listeners.remove(&id);
            }
        })
    }
}

/// Live registration owning exactly one cancellation handle.
///
/// Dropping the value cancels it.
pub struct Subscription {
    cancel: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// A subscription with nothing to cancel; starts inactive.
    pub fn inert() -> Self {
        Self {
            cancel: Mutex::new(None),
        }
    }

    /// Stops delivery and releases the listener. Safe to call repeatedly.
    pub fn unsubscribe(&self) {
        let cancel = lock(&self.cancel).take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        lock(&self.cancel).is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
