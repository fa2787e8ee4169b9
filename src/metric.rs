use std::fmt;
use std::str::FromStr;

use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};

const NORM_EPS: f32 = 1e-12;

/// Pairwise metric between two sets of feature rows.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared L2 distance, larger is less alike.
    Euclidean,
    /// Cosine similarity in [-1, 1], 1 is the same direction.
    Cosine,
}

impl DistanceMetric {
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Cosine => "cosine",
        }
    }

    /// Returns the m x n matrix between the rows of `x` (m x d) and `y` (n x d).
    pub fn compute(&self, x: ArrayView2<'_, f32>, y: ArrayView2<'_, f32>) -> Result<Array2<f32>> {
        if x.ncols() != y.ncols() {
            return Err(Error::DimensionMismatch {
                expected: x.ncols(),
                got: y.ncols(),
            });
        }

        log::debug!("using {} as distance function", self.name());

        Ok(match self {
            DistanceMetric::Euclidean => euclidean_distance(x, y),
            DistanceMetric::Cosine => cosine_similarity(x, y),
        })
    }
}

impl FromStr for DistanceMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "cosine" => Ok(DistanceMetric::Cosine),
            _ => Err(Error::UnsupportedMetric(s.to_string())),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `|x|^2 + |y|^2 - 2 x.y` for every row pair.
pub fn euclidean_distance(x: ArrayView2<'_, f32>, y: ArrayView2<'_, f32>) -> Array2<f32> {
    let xx = x.map_axis(Axis(1), |row| row.dot(&row));
    let yy = y.map_axis(Axis(1), |row| row.dot(&row));

    let mut dist = x.dot(&y.t()) * -2.0;
    dist += &xx.insert_axis(Axis(1));
    dist += &yy.insert_axis(Axis(0));

    dist
}

pub fn cosine_similarity(x: ArrayView2<'_, f32>, y: ArrayView2<'_, f32>) -> Array2<f32> {
    let x = normalize_rows(x);
    let y = normalize_rows(y);

    x.dot(&y.t())
}

fn normalize_rows(a: ArrayView2<'_, f32>) -> Array2<f32> {
    let norms = a.map_axis(Axis(1), |row| row.dot(&row).sqrt().max(NORM_EPS));

    &a / &norms.insert_axis(Axis(1))
}
