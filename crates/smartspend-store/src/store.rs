//! Persistent store
//!
//! Owns the in-memory state for one storage key and keeps the stored
//! envelope in step with it.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use smartspend_storage::KeyValueStorage;

use crate::envelope::{encode, StoredEnvelope};
use crate::error::StoreError;
use crate::slice::{Record, Slice, StoreState};
use crate::Result;

/// Called with every failed background write.
pub type ErrorHook = Arc<dyn Fn(&StoreError) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Storage key holding the envelope
    pub key: String,
    /// Current schema version; older envelopes are reset to seed data
    pub version: u32,
}

impl StoreOptions {
    pub fn new(key: impl Into<String>, version: u32) -> Self {
        Self {
            key: key.into(),
            version,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePhase {
    /// Not rehydrated yet, all slices empty
    Idle,
    Rehydrating,
    /// Rehydrated with empty slices; the seeding task has not run yet
    AwaitingSeed,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehydrationSource {
    /// Nothing usable was stored under the key
    Missing,
    Stored,
    /// A stale envelope was replaced with seed data
    Migrated { from: u32 },
}

/// Outcome of [`PersistentStore::rehydrate`].
pub struct Rehydration {
    source: RehydrationSource,
    seed_task: Option<SeedTask>,
}

impl Rehydration {
    pub fn source(&self) -> RehydrationSource {
        self.source
    }

    pub fn seed_pending(&self) -> bool {
        self.seed_task.is_some()
    }

    pub fn into_seed_task(self) -> Option<SeedTask> {
        self.seed_task
    }

    /// Wait for the seeding pass, if one was scheduled.
    pub async fn finish(self) -> Result<Vec<&'static str>> {
        match self.seed_task {
            Some(task) => task.wait().await,
            None => Ok(Vec::new()),
        }
    }
}

/// Deferred seeding pass. Dropping it leaves the task running.
pub struct SeedTask {
    handle: JoinHandle<Result<Vec<&'static str>>>,
}

impl SeedTask {
    /// Names of the slices that were seeded once the pass has persisted.
    pub async fn wait(self) -> Result<Vec<&'static str>> {
        self.handle.await?
    }
}

/// Background envelope write. Dropping it detaches the write; failures are
/// still logged and passed to the error hook.
pub struct PersistHandle {
    handle: JoinHandle<Result<()>>,
}

impl PersistHandle {
    pub async fn wait(self) -> Result<()> {
        self.handle.await?
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

pub struct PersistentStore<S> {
    /// In-memory state, replaced wholesale on rehydration
    state: Arc<RwLock<S>>,
    phase: Arc<RwLock<StorePhase>>,
    storage: Arc<dyn KeyValueStorage>,
    options: Arc<StoreOptions>,
    /// Version stamped on written envelopes, never below what was loaded
    envelope_version: Arc<AtomicU32>,
    error_hook: Option<ErrorHook>,
}

/// Puts the phase back to `Idle` if rehydration is abandoned mid-read.
struct RehydrateGuard<'a> {
    phase: &'a RwLock<StorePhase>,
    armed: bool,
}

impl RehydrateGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RehydrateGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut phase = self.phase.write();
            if *phase == StorePhase::Rehydrating {
                *phase = StorePhase::Idle;
            }
        }
    }
}

impl<S: StoreState> PersistentStore<S> {
    pub fn new(storage: Arc<dyn KeyValueStorage>, options: StoreOptions) -> Self {
        Self {
            state: Arc::new(RwLock::new(S::default())),
            phase: Arc::new(RwLock::new(StorePhase::Idle)),
            storage,
            envelope_version: Arc::new(AtomicU32::new(options.version)),
            options: Arc::new(options),
            error_hook: None,
        }
    }

    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&StoreError) + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    pub fn key(&self) -> &str {
        &self.options.key
    }

    pub fn version(&self) -> u32 {
        self.options.version
    }

    pub fn phase(&self) -> StorePhase {
        *self.phase.read()
    }

    /// Version written into envelopes: the current version, or the stored
    /// one if it was newer.
    pub fn envelope_version(&self) -> u32 {
        self.envelope_version.load(Ordering::SeqCst)
    }

    /// Load the stored envelope into memory. Allowed once per store.
    ///
    /// Slices left empty are seeded by a task spawned here that runs after
    /// the caller resumes, so state read straight after this returns may
    /// still be empty.
    ///
    /// Dropping the returned future before the read completes leaves the
    /// store `Idle`, so rehydration can be retried.
    pub async fn rehydrate(&self) -> Result<Rehydration> {
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        {
            let mut phase = self.phase.write();
            if *phase != StorePhase::Idle {
                return Err(StoreError::AlreadyRehydrated);
            }
            *phase = StorePhase::Rehydrating;
        }
        let guard = RehydrateGuard {
            phase: &self.phase,
            armed: true,
        };

        let (state, source) = self.load().await;
        *self.state.write() = state.clone();

        let empty = state.empty_slices();
        let seed_task = if empty.is_empty() {
            *self.phase.write() = StorePhase::Ready;
            None
        } else {
            *self.phase.write() = StorePhase::AwaitingSeed;
            tracing::debug!(key = %self.options.key, slices = ?empty, "Scheduling seed pass");

            let store = self.clone();
            Some(SeedTask {
                handle: runtime.spawn(async move { store.seed().await }),
            })
        };
        guard.disarm();

        if let RehydrationSource::Migrated { from } = source {
            match self.persist_snapshot(&state).await {
                Ok(()) => tracing::info!(
                    key = %self.options.key,
                    from,
                    to = self.options.version,
                    "Wrote migrated state"
                ),
                Err(e) => self.report(&e),
            }
        }

        tracing::info!(
            key = %self.options.key,
            source = ?source,
            version = self.options.version,
            "Rehydrated store"
        );

        Ok(Rehydration { source, seed_task })
    }

    async fn load(&self) -> (S, RehydrationSource) {
        let key = &self.options.key;
        let current = self.options.version;

        let Some(raw) = self.storage.get_item(key).await else {
            tracing::info!(key = %key, "No persisted state");
            return (S::default(), RehydrationSource::Missing);
        };

        let stored = match StoredEnvelope::parse(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable envelope");
                return (S::default(), RehydrationSource::Missing);
            }
        };

        if stored.version < current {
            tracing::info!(
                key = %key,
                from = stored.version,
                to = current,
                "Stale envelope, resetting to seed data"
            );
            return (
                S::seed(),
                RehydrationSource::Migrated {
                    from: stored.version,
                },
            );
        }

        if stored.version > current {
            tracing::warn!(
                key = %key,
                stored = stored.version,
                current,
                "Envelope is newer than this build"
            );
            self.envelope_version.fetch_max(stored.version, Ordering::SeqCst);
        }

        match stored.into_state::<S>() {
            Ok(state) => (state, RehydrationSource::Stored),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding envelope with invalid state");
                (S::default(), RehydrationSource::Missing)
            }
        }
    }

    /// Fill whatever is still empty now, then persist.
    async fn seed(&self) -> Result<Vec<&'static str>> {
        let seeded = {
            let mut state = self.state.write();
            let seeded = state.seed_empty();
            (!seeded.is_empty()).then(|| (seeded, state.clone()))
        };
        *self.phase.write() = StorePhase::Ready;

        let Some((seeded, state)) = seeded else {
            return Ok(Vec::new());
        };

        tracing::info!(key = %self.options.key, slices = ?seeded, "Seeded empty slices");

        match self.persist_snapshot(&state).await {
            Ok(()) => Ok(seeded),
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    async fn persist_snapshot(&self, state: &S) -> Result<()> {
        let json = encode(self.envelope_version(), state)?;
        self.storage.set_item(&self.options.key, json).await?;
        Ok(())
    }

    fn report(&self, error: &StoreError) {
        tracing::error!(key = %self.options.key, error = %error, "Failed to persist store state");
        if let Some(hook) = &self.error_hook {
            hook(error);
        }
    }

    // === Reads ===

    pub fn snapshot(&self) -> S {
        self.state.read().clone()
    }

    pub fn slice<T: Record>(&self, slice: &Slice<S, T>) -> Vec<T> {
        slice.records(&self.state.read()).to_vec()
    }

    pub fn get_by_id<T: Record>(&self, slice: &Slice<S, T>, id: &str) -> Option<T> {
        slice.find(&self.state.read(), id).cloned()
    }

    // === Writes ===

    /// Mutate the state and persist the whole envelope in the background.
    pub fn update<F>(&self, f: F) -> Result<PersistHandle>
    where
        F: FnOnce(&mut S),
    {
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        let phase = self.phase();
        if matches!(phase, StorePhase::Idle | StorePhase::Rehydrating) {
            tracing::warn!(
                key = %self.options.key,
                phase = ?phase,
                "Writing before rehydration has finished"
            );
        }

        let json = {
            let mut state = self.state.write();
            f(&mut state);
            encode(self.envelope_version(), &*state)?
        };

        let store = self.clone();
        let handle = runtime.spawn(async move {
            let result = store
                .storage
                .set_item(&store.options.key, json)
                .await
                .map_err(StoreError::from);
            if let Err(e) = &result {
                store.report(e);
            }
            result
        });

        Ok(PersistHandle { handle })
    }

    /// Replace one slice.
    pub fn set_slice<T: Record>(&self, slice: &Slice<S, T>, records: Vec<T>) -> Result<PersistHandle> {
        tracing::debug!(slice = slice.name(), count = records.len(), "Replacing slice");
        self.update(|state| *slice.records_mut(state) = records)
    }

    /// Remove the stored envelope. In-memory state is left as is.
    pub async fn clear_persisted(&self) -> Result<()> {
        self.storage.remove_item(&self.options.key).await?;
        tracing::info!(key = %self.options.key, "Cleared persisted state");
        Ok(())
    }
}

impl<S> Clone for PersistentStore<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            phase: Arc::clone(&self.phase),
            storage: Arc::clone(&self.storage),
            options: Arc::clone(&self.options),
            envelope_version: Arc::clone(&self.envelope_version),
            error_hook: self.error_hook.clone(),
        }
    }
}
