//! Agglomerative clustering over a precomputed distance matrix.
//!
//! Clusters are merged bottom-up, closest pair first, until the closest pair
//! is at least `distance_threshold` apart. The inter-cluster distance follows
//! the chosen [`Linkage`] and is kept current with Lance-Williams updates.

use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Minimum pairwise distance between members.
    Single,
    /// Maximum pairwise distance between members.
    #[default]
    Complete,
    /// Mean pairwise distance between members.
    Average,
}

impl Linkage {
    #[inline]
    fn merge(&self, d_ik: f32, d_jk: f32, n_i: usize, n_j: usize) -> f32 {
        match self {
            Linkage::Single => d_ik.min(d_jk),
            Linkage::Complete => d_ik.max(d_jk),
            Linkage::Average => {
                (d_ik * n_i as f32 + d_jk * n_j as f32) / (n_i + n_j) as f32
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AgglomerativeClustering {
    pub distance_threshold: f32,
    pub linkage: Linkage,
}

/// Flat clustering result. Labels are numbered in order of first appearance
/// over the sample indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    pub labels: Vec<usize>,
    pub n_clusters: usize,
}

impl Clustering {
    /// Sample indices grouped by label, in label order.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_clusters];
        for (idx, &label) in self.labels.iter().enumerate() {
            groups[label].push(idx);
        }

        groups
    }
}

impl AgglomerativeClustering {
    pub fn new(distance_threshold: f32, linkage: Linkage) -> Self {
        Self {
            distance_threshold,
            linkage,
        }
    }

    pub fn fit_predict(&self, dist: ArrayView2<'_, f32>) -> Result<Clustering> {
        let n = dist.nrows();
        if dist.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: dist.ncols(),
            });
        }

        let mut d = dist.to_owned();
        let mut active = vec![true; n];
        let mut sizes = vec![1usize; n];
        // parent[j] = i once j has been merged into i
        let mut parent: Vec<usize> = (0..n).collect();

        loop {
            let mut best: Option<(usize, usize, f32)> = None;
            for i in (0..n).filter(|&i| active[i]) {
                for j in (i + 1..n).filter(|&j| active[j]) {
                    let dij = d[[i, j]];
                    if best.map_or(true, |(_, _, b)| dij < b) {
                        best = Some((i, j, dij));
                    }
                }
            }

            let (i, j) = match best {
                Some((i, j, dij)) if dij < self.distance_threshold => (i, j),
                _ => break,
            };

            for k in (0..n).filter(|&k| active[k] && k != i && k != j) {
                let (a, b) = (k.min(i), k.max(i));
                let (c, e) = (k.min(j), k.max(j));
                let merged = self.linkage.merge(d[[a, b]], d[[c, e]], sizes[i], sizes[j]);
                d[[a, b]] = merged;
                d[[b, a]] = merged;
            }

            sizes[i] += sizes[j];
            active[j] = false;
            parent[j] = i;
        }

        let mut labels = vec![usize::MAX; n];
        let mut root_label = vec![usize::MAX; n];
        let mut n_clusters = 0;

        for idx in 0..n {
            let mut root = idx;
            while parent[root] != root {
                root = parent[root];
            }

            if root_label[root] == usize::MAX {
                root_label[root] = n_clusters;
                n_clusters += 1;
            }
            labels[idx] = root_label[root];
        }

        Ok(Clustering { labels, n_clusters })
    }
}
