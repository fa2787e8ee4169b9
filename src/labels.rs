use std::collections::HashMap;

use crate::track::TrackKey;

/// Global identity per per-camera track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalLabelMap {
    labels: HashMap<TrackKey, u32>,
    n_identities: u32,
}

impl GlobalLabelMap {
    /// Ids start at 1 and follow the order of `groups`; `groups` holds
    /// indices into `keys`.
    pub fn from_clusters(groups: &[Vec<usize>], keys: &[TrackKey]) -> Self {
        let mut labels = HashMap::with_capacity(keys.len());

        for (cluster, members) in groups.iter().enumerate() {
            let id = cluster as u32 + 1;
            for &idx in members {
                labels.insert(keys[idx], id);
            }
        }

        Self {
            labels,
            n_identities: groups.len() as u32,
        }
    }

    #[inline]
    pub fn get(&self, key: &TrackKey) -> Option<u32> {
        self.labels.get(key).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn n_identities(&self) -> u32 {
        self.n_identities
    }

    /// Keys carrying `id`, in no particular order.
    pub fn members(&self, id: u32) -> Vec<TrackKey> {
        self.labels
            .iter()
            .filter(|(_, l)| **l == id)
            .map(|(k, _)| *k)
            .collect()
    }
}
