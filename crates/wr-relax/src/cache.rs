//! Memoized partition solves.

use core::fmt;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use sha2::{Digest, Sha256};
use wr_core::PartitionId;
use wr_fem::{BoundaryWaveforms, State, StateTrace, Waveform, WaveformKey};

/// SHA-256 content hash of a partition's solve inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hash of the start-of-window state, the step grid and every incoming
    /// waveform sample, in key order. Floats are hashed by bit pattern.
    pub fn of(start: &State, grid: &[f64], incoming: &BoundaryWaveforms) -> Self {
        let mut hasher = Sha256::new();
        let mut floats = |values: &mut dyn Iterator<Item = f64>| {
            for v in values {
                hasher.update(v.to_bits().to_le_bytes());
            }
        };
        floats(&mut start.u.iter().copied());
        floats(&mut start.v.iter().copied());
        floats(&mut start.a.iter().copied());
        floats(&mut grid.iter().copied());
        for (key, waveform) in incoming {
            hasher.update(key.edge.index().to_le_bytes());
            hasher.update(key.sender.index().to_le_bytes());
            hasher.update((waveform.len() as u64).to_le_bytes());
            for (t, value) in waveform.times().iter().zip(waveform.values()) {
                hasher.update(t.to_bits().to_le_bytes());
                for v in value.iter() {
                    hasher.update(v.to_bits().to_le_bytes());
                }
            }
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_string()[..12])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub partition: PartitionId,
    pub window: usize,
    pub fingerprint: Fingerprint,
}

/// A partition's result for one window: its trace on the local grid and
/// the waveforms it sends to each neighbour.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedSolve {
    pub trace: StateTrace,
    pub outgoing: BTreeMap<WaveformKey, Waveform>,
}

/// Run-lifetime cache of partition solves.
///
/// Reads are concurrent and writes exclusive; writers racing on the same key
/// store identical values, so the last one wins. Nothing is evicted.
#[derive(Debug, Default)]
pub struct SolveCache {
    entries: RwLock<HashMap<CacheKey, Arc<CachedSolve>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl SolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, counting the hit or miss.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CachedSolve>> {
        let found = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn put(&self, key: CacheKey, value: CachedSolve) -> Arc<CachedSolve> {
        let value = Arc::new(value);
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, Arc::clone(&value));
        value
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner()).clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
