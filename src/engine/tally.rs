use std::collections::HashMap;
use std::hash::Hash;

/// Map that remembers first-insertion order.
///
/// Every ranking in the engine sorts with a stable sort, so entries with equal
/// scores come out in the order they were first seen.
pub(crate) struct Tally<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> Default for Tally<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Clone + Eq + Hash, V: Default> Tally<K, V> {
    pub(crate) fn slot(&mut self, key: K) -> &mut V {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(key.clone(), i);
                self.entries.push((key, V::default()));
                i
            }
        };
        &mut self.entries[i].1
    }

    pub(crate) fn into_entries(self) -> Vec<(K, V)> {
        self.entries
    }
}

impl<K: Clone + Eq + Hash> Tally<K, usize> {
    pub(crate) fn add(&mut self, key: K, n: usize) {
        *self.slot(key) += n;
    }

    /// Entries by descending count.
    pub(crate) fn into_ranked(self) -> Vec<(K, usize)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}
