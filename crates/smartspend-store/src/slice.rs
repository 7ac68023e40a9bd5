//! Slices and the state they live in

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record held in a slice. Identifiers are unique within their slice.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// The full state managed by one persistent store.
///
/// `Default` is the pre-rehydration state: every slice empty.
pub trait StoreState: Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Default dataset for every slice.
    fn seed() -> Self;

    /// Name and length of every slice, in declaration order.
    fn slice_lengths(&self) -> Vec<(&'static str, usize)>;

    /// Replace each empty slice with its default dataset.
    /// Returns the names of the slices that were filled.
    fn seed_empty(&mut self) -> Vec<&'static str>;

    fn empty_slices(&self) -> Vec<&'static str> {
        self.slice_lengths()
            .into_iter()
            .filter(|(_, len)| *len == 0)
            .map(|(name, _)| name)
            .collect()
    }
}

/// Fill `slice` from `seed` when it holds no records.
pub fn fill_if_empty<T>(slice: &mut Vec<T>, seed: impl FnOnce() -> Vec<T>) -> bool {
    if !slice.is_empty() {
        return false;
    }
    *slice = seed();
    true
}

/// Named, typed handle to one slice of `S`.
pub struct Slice<S, T> {
    name: &'static str,
    get: fn(&S) -> &Vec<T>,
    get_mut: fn(&mut S) -> &mut Vec<T>,
}

impl<S, T> Slice<S, T> {
    pub const fn new(
        name: &'static str,
        get: fn(&S) -> &Vec<T>,
        get_mut: fn(&mut S) -> &mut Vec<T>,
    ) -> Self {
        Self { name, get, get_mut }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn records<'a>(&self, state: &'a S) -> &'a [T] {
        (self.get)(state)
    }

    pub fn records_mut<'a>(&self, state: &'a mut S) -> &'a mut Vec<T> {
        (self.get_mut)(state)
    }
}

impl<S, T: Record> Slice<S, T> {
    pub fn find<'a>(&self, state: &'a S, id: &str) -> Option<&'a T> {
        self.records(state).iter().find(|r| r.id() == id)
    }
}
