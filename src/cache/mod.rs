use crate::config::ValidatorConfig;
use crate::dns::{Name, RRset, RecordClass, RecordType};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rustc_hash::FxHasher;
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub name: Name,
    pub rtype: RecordType,
    pub class: RecordClass,
    /// Pre-computed hash for faster lookups
    hash: u64,
}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl CacheKey {
    pub fn new(name: Name, rtype: RecordType, class: RecordClass) -> Self {
        let mut hasher = FxHasher::default();
        name.hash(&mut hasher);
        rtype.hash(&mut hasher);
        class.hash(&mut hasher);
        let hash = hasher.finish();

        Self {
            name,
            rtype,
            class,
            hash,
        }
    }

    pub fn for_rrset(rrset: &RRset) -> Self {
        Self::new(rrset.name.clone(), rrset.rtype, rrset.class)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.rtype, self.class)
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub rrset: RRset,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn new(rrset: RRset, ttl: u32) -> Self {
        Self {
            rrset,
            expires_at: Instant::now() + Duration::from_secs(ttl as u64),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn remaining_ttl(&self) -> u32 {
        self.expires_at
            .checked_duration_since(Instant::now())
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0)
    }

    /// The stored RRset with its TTL counted down
    pub fn rrset(&self) -> RRset {
        let mut rrset = self.rrset.clone();
        rrset.ttl = self.remaining_ttl();
        rrset
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    pub kept: AtomicU64,
    pub replaced: AtomicU64,
    pub evictions: AtomicU64,
    pub expired_evictions: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_kept(&self) {
        self.kept.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replaced(&self) {
        self.replaced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_expired_evictions(&self, count: u64) {
        self.expired_evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            kept: self.kept.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired_evictions: self.expired_evictions.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub kept: u64,
    pub replaced: u64,
    pub evictions: u64,
    pub expired_evictions: u64,
}

impl CacheStatsSnapshot {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Store of previously seen RRsets, one entry per (name, type, class).
///
/// When the same key is stowed twice the more credible copy wins; on equal
/// credibility the copy from the earlier message section wins, and an exact
/// tie keeps what is already there. The merge runs under the entry lock.
pub struct RrsetCache {
    entries: DashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
    max_entries: usize,
    min_ttl: u32,
    max_ttl: u32,
}

impl Default for RrsetCache {
    fn default() -> Self {
        Self::from_config(&ValidatorConfig::default())
    }
}

impl RrsetCache {
    pub fn new(max_entries: usize, min_ttl: u32, max_ttl: u32) -> Self {
        Self {
            entries: DashMap::new(),
            stats: CacheStats::new(),
            max_entries,
            min_ttl,
            max_ttl,
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(
            config.cache_max_entries,
            config.cache_min_ttl,
            config.cache_max_ttl,
        )
    }

    pub fn get(&self, name: &Name, rtype: RecordType, class: RecordClass) -> Option<RRset> {
        let key = CacheKey::new(name.clone(), rtype, class);
        let Some(entry) = self.entries.get(&key) else {
            self.stats.record_miss();
            trace!("Cache miss for {}", key);
            return None;
        };

        if entry.is_expired() {
            drop(entry);
            self.entries.remove_if(&key, |_, e| e.is_expired());
            self.stats.record_expired_evictions(1);
            self.stats.record_miss();
            trace!("Cache entry for {} expired", key);
            return None;
        }

        self.stats.record_hit();
        trace!("Cache hit for {}", key);
        Some(entry.rrset())
    }

    /// Insert an RRset, merging with any existing copy by credibility
    pub fn stow(&self, mut rrset: RRset) {
        rrset.canonicalize();
        let ttl = rrset.ttl.clamp(self.min_ttl, self.max_ttl.max(self.min_ttl));
        let key = CacheKey::for_rrset(&rrset);

        if !self.entries.contains_key(&key) {
            self.evict_if_needed();
        }

        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                trace!("Caching {}", slot.key());
                slot.insert(CacheEntry::new(rrset, ttl));
                self.stats.record_insert();
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get();
                let old = &existing.rrset;
                let keep = !existing.is_expired()
                    && (old.cred < rrset.cred
                        || (old.cred == rrset.cred && old.section <= rrset.section));

                if keep {
                    trace!("Keeping cached {} ({:?})", slot.key(), old.cred);
                    self.stats.record_kept();
                } else {
                    trace!("Replacing cached {} with {:?} copy", slot.key(), rrset.cred);
                    let entry = slot.get_mut();
                    entry.rrset.data = rrset.data;
                    entry.rrset.sigs = rrset.sigs;
                    entry.rrset.cred = rrset.cred;
                    entry.rrset.section = rrset.section;
                    entry.rrset.ans_kind = rrset.ans_kind;
                    entry.rrset.ttl = ttl;
                    entry.expires_at = Instant::now() + Duration::from_secs(ttl as u64);
                    self.stats.record_replaced();
                }
            }
        }
    }

    pub fn stow_all(&self, rrsets: impl IntoIterator<Item = RRset>) {
        for rrset in rrsets {
            self.stow(rrset);
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut expired = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired() {
                expired += 1;
                false
            } else {
                true
            }
        });

        if expired > 0 {
            self.stats.record_expired_evictions(expired as u64);
            debug!("Evicted {} expired RRsets", expired);
        }
        expired
    }

    fn evict_if_needed(&self) {
        if self.entries.len() < self.max_entries {
            return;
        }
        self.purge_expired();

        let excess = (self.entries.len() + 1).saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }
        let victims: Vec<CacheKey> = self
            .entries
            .iter()
            .take(excess)
            .map(|entry| entry.key().clone())
            .collect();
        for key in &victims {
            self.entries.remove(key);
        }
        self.stats.record_evictions(victims.len() as u64);
        debug!("Evicted {} RRsets due to cache size limit", victims.len());
    }

    pub fn clear(&self) {
        let size = self.entries.len();
        self.entries.clear();
        debug!("Cleared {} RRsets from cache", size);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }
}
