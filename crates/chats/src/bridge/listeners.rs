//! Listener registration table with ordered, re-entrancy safe delivery.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use crate::entities::ChatSnapshot;

/// Callback invoked with every snapshot emitted while it is registered.
pub type StateListener = Arc<dyn Fn(&Arc<ChatSnapshot>) + Send + Sync>;

/// Handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    live: Arc<AtomicBool>,
    /// Held for the duration of every call to `listener`
    in_call: Arc<Mutex<()>>,
    listener: StateListener,
}

/// Fan-out table shared by chat clients and bridges.
///
/// Delivery guarantees:
/// - each listener sees snapshots in the order they were passed to
///   [`ListenerTable::notify`], none skipped;
/// - a listener removed before its turn is never called again, even for a
///   snapshot whose delivery already started;
/// - [`ListenerTable::remove`] called from another thread while the listener
///   is running waits for that call to return, so nothing is delivered after
///   it returns;
/// - listeners may register, remove or emit from inside a callback. A nested
///   emission is queued and delivered once the current one finishes.
pub struct ListenerTable {
    next_id: AtomicU64,
    entries: Mutex<Vec<Registration>>,
    pending: Mutex<VecDeque<Arc<ChatSnapshot>>>,
    delivering: AtomicBool,
    /// Thread running the delivery loop, if any
    deliverer: Mutex<Option<ThreadId>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            delivering: AtomicBool::new(false),
            deliverer: Mutex::new(None),
        }
    }

    pub fn insert(&self, listener: StateListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.entries).push(Registration {
            id,
            live: Arc::new(AtomicBool::new(true)),
            in_call: Arc::new(Mutex::new(())),
            listener,
        });
        id
    }

    /// Remove a registration. Returns `false` if it was already gone.
    ///
    /// From inside a callback the removal only takes effect for later turns;
    /// from any other thread it also waits out a call already in progress.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = {
            let mut entries = lock(&self.entries);
            match entries.iter().position(|entry| entry.id == id) {
                Some(index) => entries.remove(index),
                None => return false,
            }
        };
        removed.live.store(false, Ordering::Release);

        if !self.is_delivering_thread() {
            drop(lock(&removed.in_call));
        }
        true
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        lock(&self.entries).iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Deliver `snapshot` to every live listener.
    pub fn notify(&self, snapshot: Arc<ChatSnapshot>) {
        self.enqueue(snapshot);
        self.deliver_pending();
    }

    /// Queue `snapshot` without delivering it.
    ///
    /// Producers that build snapshots under their own lock enqueue while
    /// holding it, so queue order matches production order, and call
    /// [`ListenerTable::deliver_pending`] after releasing it.
    pub fn enqueue(&self, snapshot: Arc<ChatSnapshot>) {
        lock(&self.pending).push_back(snapshot);
    }

    /// Drain the queue, unless a delivery loop is already doing so.
    pub fn deliver_pending(&self) {
        // A delivery loop further up the stack (or on another thread) drains
        // the queue in order.
        if !self.claim_delivery() {
            return;
        }
        let _guard = DeliveryGuard(self);

        loop {
            let next = lock(&self.pending).pop_front();
            let Some(snapshot) = next else {
                self.release_delivery();
                if lock(&self.pending).is_empty() || !self.claim_delivery() {
                    return;
                }
                continue;
            };

            let registrations = lock(&self.entries).clone();
            for registration in registrations {
                let _in_call = lock(&registration.in_call);
                if registration.live.load(Ordering::Acquire) {
                    (registration.listener)(&snapshot);
                }
            }
        }
    }

    fn claim_delivery(&self) -> bool {
        if self.delivering.swap(true, Ordering::AcqRel) {
            return false;
        }
        *lock(&self.deliverer) = Some(thread::current().id());
        true
    }

    fn release_delivery(&self) {
        *lock(&self.deliverer) = None;
        self.delivering.store(false, Ordering::Release);
    }

    fn is_delivering_thread(&self) -> bool {
        *lock(&self.deliverer) == Some(thread::current().id())
    }
}

impl Default for ListenerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the delivering flag if a listener panics mid-delivery.
struct DeliveryGuard<'a>(&'a ListenerTable);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.release_delivery();
        }
    }
}

/// Scoped registration: dropping it removes the listener.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    table: Weak<ListenerTable>,
    id: ListenerId,
}

impl Subscription {
    pub(crate) fn new(table: &Arc<ListenerTable>, id: ListenerId) -> Self {
        Self {
            table: Arc::downgrade(table),
            id,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Unsubscribe now instead of at end of scope.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.remove(self.id);
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
