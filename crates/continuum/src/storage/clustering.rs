//! K-means clustering over fixed-dimension embeddings
//!
//! Used by consolidation to group low-retention records. Centroids are
//! seeded by sampling member vectors with replacement, so the random source
//! is injectable for reproducible runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::memory::scoring::euclidean_distance;

/// One group produced by clustering
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    /// Mean of the member vectors
    pub centroid: Vec<f32>,
    /// Ids of the points assigned to this group
    pub members: Vec<Uuid>,
}

/// Iterative centroid refinement with an early stop on convergence
#[derive(Debug, Clone)]
pub struct KMeans {
    max_iterations: usize,
    tolerance: f64,
    rng: StdRng,
}

impl KMeans {
    pub fn new(max_iterations: usize, tolerance: f64, rng: StdRng) -> Self {
        Self {
            max_iterations,
            tolerance,
            rng,
        }
    }

    /// Clusterer with a fixed seed, for reproducible output
    pub fn seeded(max_iterations: usize, tolerance: f64, seed: u64) -> Self {
        Self::new(max_iterations, tolerance, StdRng::seed_from_u64(seed))
    }

    /// Clusterer seeded from the operating system
    pub fn from_entropy(max_iterations: usize, tolerance: f64) -> Self {
        Self::new(max_iterations, tolerance, StdRng::from_os_rng())
    }

    /// Partition `points` into at most `k` non-empty groups.
    ///
    /// All vectors must share one dimension. Every point lands in exactly one
    /// group; `k` is clamped to `[1, points.len()]`.
    pub fn cluster(&mut self, points: &[(Uuid, &[f32])], k: usize) -> Vec<ClusterAssignment> {
        if points.is_empty() {
            return Vec::new();
        }

        let k = k.clamp(1, points.len());
        let mut centroids: Vec<Vec<f32>> = (0..k)
            .map(|_| points[self.rng.random_range(0..points.len())].1.to_vec())
            .collect();
        let mut assignments = vec![0usize; points.len()];

        for iteration in 0..self.max_iterations.max(1) {
            for (slot, (_, vector)) in assignments.iter_mut().zip(points) {
                *slot = nearest(&centroids, vector);
            }

            let mut converged = true;
            for (index, centroid) in centroids.iter_mut().enumerate() {
                let members = assignments
                    .iter()
                    .zip(points)
                    .filter(|(slot, _)| **slot == index)
                    .map(|(_, (_, vector))| *vector);

                if let Some(updated) = mean(members, centroid.len()) {
                    if euclidean_distance(&updated, centroid) >= self.tolerance {
                        converged = false;
                    }
                    *centroid = updated;
                }
            }

            if converged {
                tracing::debug!(iterations = iteration + 1, k, "K-means converged");
                break;
            }
        }

        let mut groups: Vec<ClusterAssignment> = centroids
            .into_iter()
            .map(|centroid| ClusterAssignment {
                centroid,
                members: Vec::new(),
            })
            .collect();
        for (slot, (id, _)) in assignments.iter().zip(points) {
            groups[*slot].members.push(*id);
        }

        groups.retain(|group| !group.members.is_empty());
        groups
    }
}

/// Index of the closest centroid; the first minimum wins ties
fn nearest(centroids: &[Vec<f32>], vector: &[f32]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = euclidean_distance(vector, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}

/// Arithmetic mean of the vectors, or `None` when there are none
fn mean<'a>(vectors: impl Iterator<Item = &'a [f32]>, dimension: usize) -> Option<Vec<f32>> {
    let mut sum = vec![0.0f64; dimension];
    let mut count = 0usize;
    for vector in vectors {
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += *value as f64;
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }
    Some(sum.into_iter().map(|v| (v / count as f64) as f32).collect())
}
