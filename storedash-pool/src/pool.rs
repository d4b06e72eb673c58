//! The per-tenant connection pool.
//!
//! One entry per tenant key, each either `Connecting` (a single shared
//! in-flight factory call) or `Live` (a handle plus a rearmed idle timer).
//! All map mutations happen inside short lock sections with no await in
//! between, so no two callers for the same uncached key can both reach the
//! create-a-new-entry branch.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::factory::ConnectionFactory;

/// The in-flight creation future shared by all concurrent waiters for a key.
type SharedConnect<H> = Shared<BoxFuture<'static, PoolResult<Arc<H>>>>;

enum EntryState<H> {
    /// Creation in progress; all callers await the same attempt.
    Connecting(SharedConnect<H>),
    /// A usable handle, owned by the pool and lent to callers.
    Live(Arc<H>),
}

struct Entry<H> {
    /// Unique per installed entry. Guards stale timers and stale
    /// connect-completions against an entry that has since been replaced.
    id: u64,
    /// Bumped on every successful acquisition; the idle timer captures it
    /// at arm time.
    epoch: u64,
    last_used: Instant,
    timer: Option<JoinHandle<()>>,
    state: EntryState<H>,
}

struct PoolInner<F: ConnectionFactory> {
    factory: F,
    config: PoolConfig,
    next_id: AtomicU64,
    entries: Mutex<HashMap<F::Key, Entry<F::Handle>>>,
}

/// A keyed pool of lazily created, lazily expired tenant connections.
///
/// Cloning is cheap and shares the underlying pool.
pub struct TenantPool<F: ConnectionFactory> {
    inner: Arc<PoolInner<F>>,
}

impl<F: ConnectionFactory> Clone for TenantPool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ConnectionFactory> TenantPool<F> {
    /// Create a pool backed by the given connection factory.
    pub fn new(factory: F, config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                factory,
                config,
                next_id: AtomicU64::new(0),
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Get a live handle for a tenant, connecting if necessary.
    ///
    /// A cached handle is returned immediately (its idle timer is rearmed);
    /// an in-flight creation is awaited alongside every other caller for the
    /// key; otherwise a new creation is started. On creation failure the
    /// entry is removed so the next call retries from scratch, and the error
    /// propagates to every waiter of that attempt.
    pub async fn acquire(&self, key: &F::Key) -> PoolResult<Arc<F::Handle>> {
        let pending = {
            let mut entries = self.inner.entries.lock();
            match entries.get_mut(key) {
                Some(entry) => match &entry.state {
                    EntryState::Live(handle) => {
                        let handle = Arc::clone(handle);
                        self.inner.touch(entry, key);
                        debug!(tenant = %key, "reusing pooled connection");
                        return Ok(handle);
                    }
                    EntryState::Connecting(pending) => {
                        debug!(tenant = %key, "waiting for pending connection");
                        pending.clone()
                    }
                },
                None => {
                    // Install the placeholder before any await so a second
                    // caller for this key attaches to this attempt instead
                    // of starting its own.
                    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
                    let pending = self.inner.begin_connect(key.clone(), id);
                    entries.insert(
                        key.clone(),
                        Entry {
                            id,
                            epoch: 0,
                            last_used: Instant::now(),
                            timer: None,
                            state: EntryState::Connecting(pending.clone()),
                        },
                    );
                    pending
                }
            }
        };
        pending.await
    }

    /// Forcibly release a tenant's entry: cancel its timer, drop the handle
    /// if present, remove the entry. A no-op for an unknown key.
    ///
    /// Returns `true` if an entry was removed.
    pub fn evict(&self, key: &F::Key) -> bool {
        let removed = self.inner.entries.lock().remove(key);
        match removed {
            Some(mut entry) => {
                if let Some(timer) = entry.timer.take() {
                    timer.abort();
                }
                debug!(tenant = %key, "connection evicted");
                true
            }
            None => false,
        }
    }

    /// Release every entry. Extension point for graceful shutdown.
    pub fn clear(&self) {
        let mut entries = self.inner.entries.lock();
        for (_, mut entry) in entries.drain() {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
        }
    }

    /// Number of entries (live or connecting).
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Check if the pool has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a tenant currently has an entry.
    pub fn contains(&self, key: &F::Key) -> bool {
        self.inner.entries.lock().contains_key(key)
    }

    /// The pool configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

impl<F: ConnectionFactory> PoolInner<F> {
    /// Record a successful acquisition: refresh `last_used`, bump the epoch
    /// and rearm the idle timer. Runs inside the entries lock; the timer
    /// swap is part of the same critical section as the state update, so a
    /// cancellation cannot be lost.
    fn touch(self: &Arc<Self>, entry: &mut Entry<F::Handle>, key: &F::Key) {
        entry.last_used = Instant::now();
        entry.epoch += 1;
        if let Some(timer) = entry.timer.take() {
            timer.abort();
        }

        let idle = self.config.idle_timeout;
        let (id, epoch) = (entry.id, entry.epoch);
        let inner = Arc::clone(self);
        let key = key.clone();
        entry.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            inner.evict_idle(&key, id, epoch);
        }));
    }

    /// Idle-timer callback. No-ops unless the installed entry is still the
    /// exact one the timer was armed against, untouched since arm time.
    fn evict_idle(&self, key: &F::Key, id: u64, epoch: u64) {
        let removed = {
            let mut entries = self.entries.lock();
            match entries.get(key) {
                Some(entry) if entry.id == id && entry.epoch == epoch => entries.remove(key),
                _ => None,
            }
        };
        if removed.is_some() {
            // Dropping the entry drops the handle, which closes it.
            debug!(
                tenant = %key,
                idle_secs = self.config.idle_timeout.as_secs(),
                "closing idle connection"
            );
        }
    }

    /// Start a creation attempt on a detached task and hand back a shared
    /// future over its outcome.
    ///
    /// The task runs to completion even if every waiter abandons the
    /// acquire: the map transition (install the handle, or remove the failed
    /// entry) must happen regardless of who is still listening.
    fn begin_connect(self: &Arc<Self>, key: F::Key, entry_id: u64) -> SharedConnect<F::Handle> {
        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let started = Instant::now();
            let result = inner.factory.connect(&key).await.map(Arc::new);
            let result = {
                let mut entries = inner.entries.lock();
                match result {
                    Ok(handle) => {
                        match entries.get_mut(&key) {
                            Some(entry) if entry.id == entry_id => {
                                entry.state = EntryState::Live(Arc::clone(&handle));
                                inner.touch(entry, &key);
                                debug!(
                                    tenant = %key,
                                    elapsed_ms = started.elapsed().as_millis() as u64,
                                    "connected"
                                );
                            }
                            _ => {
                                // The entry was evicted while connecting.
                                // Hand the handle to the waiters without
                                // pooling it; it closes when the last one
                                // drops it.
                                debug!(tenant = %key, "entry replaced mid-connect, handle not pooled");
                            }
                        }
                        Ok(handle)
                    }
                    Err(err) => {
                        if entries.get(&key).is_some_and(|entry| entry.id == entry_id) {
                            entries.remove(&key);
                        }
                        warn!(tenant = %key, error = %err, "connection attempt failed");
                        Err(err)
                    }
                }
            };
            let _ = tx.send(result);
        });

        async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(PoolError::internal(
                    "connection task dropped before completing",
                )),
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;

    struct MockConn {
        closed: Arc<AtomicUsize>,
    }

    impl Drop for MockConn {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Clone)]
    struct MockFactory {
        connects: Arc<AtomicUsize>,
        /// Number of upcoming connect calls that should fail.
        failures: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl MockFactory {
        fn new() -> Self {
            Self {
                connects: Arc::new(AtomicUsize::new(0)),
                failures: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(AtomicUsize::new(0)),
                delay: Duration::from_millis(10),
            }
        }

        fn fail_next(&self, count: usize) {
            self.failures.store(count, Ordering::SeqCst);
        }

        fn connect_count(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }

        fn closed_count(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConnectionFactory for MockFactory {
        type Key = u32;
        type Handle = MockConn;

        async fn connect(&self, key: &u32) -> PoolResult<MockConn> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(PoolError::connect_failed(key, "connection refused"));
            }
            Ok(MockConn {
                closed: Arc::clone(&self.closed),
            })
        }
    }

    fn pool_with(factory: &MockFactory, idle: Duration) -> TenantPool<MockFactory> {
        TenantPool::new(
            factory.clone(),
            PoolConfig::builder().idle_timeout(idle).build(),
        )
    }

    const IDLE: Duration = Duration::from_secs(180);

    #[tokio::test(start_paused = true)]
    async fn acquire_connects_once_and_reuses() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        let first = pool.acquire(&5).await.unwrap();
        let second = pool.acquire(&5).await.unwrap();

        assert_eq!(factory.connect_count(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_share_one_attempt() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        let (a, b) = tokio::join!(pool.acquire(&7), pool.acquire(&7));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(factory.connect_count(), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_for_distinct_keys_connect_separately() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        let (a, b) = tokio::join!(pool.acquire(&1), pool.acquire(&2));
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(factory.connect_count(), 2);
        assert_eq!(pool.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_propagates_to_all_waiters_and_clears_entry() {
        let factory = MockFactory::new();
        factory.fail_next(1);
        let pool = pool_with(&factory, IDLE);

        let (a, b) = tokio::join!(pool.acquire(&3), pool.acquire(&3));
        assert!(matches!(a, Err(PoolError::ConnectFailed { .. })));
        assert!(matches!(b, Err(PoolError::ConnectFailed { .. })));
        assert_eq!(factory.connect_count(), 1);
        assert!(!pool.contains(&3));

        // The failed entry is gone; the next acquire retries cleanly.
        let handle = pool.acquire(&3).await;
        assert!(handle.is_ok());
        assert_eq!(factory.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_entry_is_evicted_and_reconnects() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        // t=0: first acquire connects.
        drop(pool.acquire(&5).await.unwrap());
        assert_eq!(factory.connect_count(), 1);

        // t=1min: reuse, deadline moves to t=4min.
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(pool.acquire(&5).await.unwrap());
        assert_eq!(factory.connect_count(), 1);

        // t=4min30s: idle window elapsed, entry evicted and handle closed.
        tokio::time::sleep(Duration::from_secs(210)).await;
        assert!(!pool.contains(&5));
        assert_eq!(factory.closed_count(), 1);

        // t=5min: fresh connection.
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(pool.acquire(&5).await.unwrap());
        assert_eq!(factory.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn frequent_access_never_evicts() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        drop(pool.acquire(&9).await.unwrap());
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_secs(120)).await;
            drop(pool.acquire(&9).await.unwrap());
        }

        assert_eq!(factory.connect_count(), 1);
        assert!(pool.contains(&9));
        assert_eq!(factory.closed_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_evict_is_idempotent() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        drop(pool.acquire(&4).await.unwrap());
        assert!(pool.evict(&4));
        assert!(!pool.contains(&4));
        assert_eq!(factory.closed_count(), 1);

        // Unknown key is a no-op.
        assert!(!pool.evict(&4));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_does_not_evict_replacement_entry() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        // Entry A armed with a deadline at t=3min.
        drop(pool.acquire(&8).await.unwrap());

        // t=1min: evict A, reconnect as entry B (deadline t=4min).
        tokio::time::sleep(Duration::from_secs(60)).await;
        pool.evict(&8);
        drop(pool.acquire(&8).await.unwrap());
        assert_eq!(factory.connect_count(), 2);

        // t=3min20s: past A's original deadline; B must survive.
        tokio::time::sleep(Duration::from_secs(140)).await;
        assert!(pool.contains(&8));
    }

    #[tokio::test(start_paused = true)]
    async fn evict_during_connect_leaves_no_entry() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        let acquire = pool.acquire(&6);
        tokio::pin!(acquire);

        // Drive the acquire far enough to install the placeholder.
        assert!(
            futures::poll!(acquire.as_mut()).is_pending(),
            "connect should still be in flight"
        );
        assert!(pool.contains(&6));

        pool.evict(&6);
        assert!(!pool.contains(&6));

        // The in-flight attempt still resolves for its waiter, but the
        // handle is not pooled.
        let handle = acquire.await.unwrap();
        assert!(!pool.contains(&6));
        drop(handle);
        assert_eq!(factory.closed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_releases_all_handles() {
        let factory = MockFactory::new();
        let pool = pool_with(&factory, IDLE);

        drop(pool.acquire(&1).await.unwrap());
        drop(pool.acquire(&2).await.unwrap());
        assert_eq!(pool.len(), 2);

        pool.clear();
        assert!(pool.is_empty());
        assert_eq!(factory.closed_count(), 2);
    }
}
