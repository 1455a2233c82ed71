//! Name to start-index table for compiled patterns.
//!
//! Entries live in one array partitioned into hash buckets: bucket `h`
//! occupies `entries[index_table[h]..index_table[h + 1]]`, the last bucket
//! running to the end of the array. A lookup hashes the name and scans one
//! bucket.

use thiserror::Error;

const INITIAL_BUCKETS: usize = 8;

/// Polynomial hash over the name's bytes, case sensitive.
pub fn hash_name(name: &str) -> u64 {
    name.bytes()
        .fold(0u64, |hash, byte| hash.wrapping_mul(31).wrapping_add(u64::from(byte)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternEntry {
    pub name: String,
    pub start_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{name}` is already registered at {start_index}")]
pub struct AlreadyRegistered {
    pub name: String,
    pub start_index: usize,
}

#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<PatternEntry>,
    index_table: Vec<usize>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_buckets(INITIAL_BUCKETS)
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_buckets(buckets: usize) -> Self {
        Self {
            entries: Vec::new(),
            index_table: vec![0; buckets.max(1)],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.index_table.len()
    }

    fn bucket_of(&self, name: &str) -> usize {
        (hash_name(name) % self.index_table.len() as u64) as usize
    }

    fn bucket_range(&self, bucket: usize) -> std::ops::Range<usize> {
        let start = self.index_table[bucket];
        let end = self
            .index_table
            .get(bucket + 1)
            .copied()
            .unwrap_or(self.entries.len());
        start..end
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        let range = self.bucket_range(self.bucket_of(name));
        self.entries[range]
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.start_index)
    }

    /// Register `name` at `start_index`. The first registration of a name
    /// wins; later ones are rejected.
    pub fn register(&mut self, name: &str, start_index: usize) -> Result<(), AlreadyRegistered> {
        if let Some(existing) = self.lookup(name) {
            return Err(AlreadyRegistered {
                name: name.to_string(),
                start_index: existing,
            });
        }

        let bucket = self.bucket_of(name);
        let at = self.bucket_range(bucket).end;
        self.entries.insert(
            at,
            PatternEntry {
                name: name.to_string(),
                start_index,
            },
        );
        for start in &mut self.index_table[bucket + 1..] {
            *start += 1;
        }

        if self.entries.len() > 2 * self.index_table.len() {
            self.rebuild(self.index_table.len() * 2);
        }
        Ok(())
    }

    /// Redistribute every entry over `buckets` buckets, keeping each
    /// bucket's entries in insertion order.
    fn rebuild(&mut self, buckets: usize) {
        let entries = std::mem::take(&mut self.entries);
        *self = Self::with_buckets(buckets);

        let mut counts = vec![0usize; buckets];
        let bucket_ids: Vec<usize> = entries.iter().map(|e| self.bucket_of(&e.name)).collect();
        for &bucket in &bucket_ids {
            counts[bucket] += 1;
        }
        let mut next = 0;
        for (bucket, count) in counts.iter().enumerate() {
            self.index_table[bucket] = next;
            next += count;
        }

        let mut slots: Vec<Option<PatternEntry>> = vec![None; entries.len()];
        let mut cursor = self.index_table.clone();
        for (entry, bucket) in entries.into_iter().zip(bucket_ids) {
            slots[cursor[bucket]] = Some(entry);
            cursor[bucket] += 1;
        }
        self.entries = slots.into_iter().flatten().collect();
    }

    /// Registered entries ordered by start index.
    pub fn entries(&self) -> Vec<&PatternEntry> {
        let mut sorted: Vec<&PatternEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.start_index);
        sorted
    }

    /// Registered names ordered by start index.
    pub fn names(&self) -> Vec<&str> {
        self.entries()
            .into_iter()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Name of the pattern whose body starts at `start_index`.
    pub fn name_at(&self, start_index: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.start_index == start_index)
            .map(|entry| entry.name.as_str())
    }
}
