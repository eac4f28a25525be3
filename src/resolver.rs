//! Post-batch duplicate elimination.
//!
//! Finished assets are grouped by image hash in job order. The first asset
//! of each group stays; every later one is rebuilt in place with its next
//! attempt number, which gives it a fresh random stream. Passes repeat until
//! one finds no duplicates or the ceiling is hit.

use std::collections::HashSet;

use crate::asset::{AssetFactory, GeneratedAsset};
use crate::config::DEFAULT_COLLISION_PASSES;
use crate::error::{GenerateError, GenerateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResolver {
    max_passes: usize,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self::new(DEFAULT_COLLISION_PASSES)
    }
}

impl CollisionResolver {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// Regenerates duplicates in `assets` until every image hash is unique.
    ///
    /// Returns the number of regeneration passes used. A regeneration that
    /// fails keeps the previous asset and is retried on the next pass.
    pub fn resolve<F>(&self, factory: &F, assets: &mut [GeneratedAsset]) -> GenerateResult<usize>
    where
        F: AssetFactory + ?Sized,
    {
        let mut passes = 0;
        loop {
            let collisions = find_collisions(assets);
            if collisions.is_empty() {
                if passes > 0 {
                    tracing::info!(passes, "duplicates resolved");
                }
                return Ok(passes);
            }
            if passes >= self.max_passes {
                tracing::warn!(passes, remaining = collisions.len(), "giving up on duplicates");
                return Err(GenerateError::CollisionUnresolved {
                    passes,
                    remaining: collisions.len(),
                });
            }

            passes += 1;
            tracing::debug!(pass = passes, duplicates = collisions.len(), "regenerating");
            for index in collisions {
                let asset = &mut assets[index];
                let attempt = asset.attempt + 1;
                match factory.build(asset.job, attempt) {
                    Ok(fresh) => *asset = fresh,
                    Err(error) => {
                        tracing::warn!(job = asset.job, %error, "regeneration failed; keeping previous asset");
                        asset.attempt = attempt;
                    }
                }
            }
        }
    }
}

/// Positions of every asset whose image hash already appeared earlier.
pub fn find_collisions(assets: &[GeneratedAsset]) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(assets.len());
    assets
        .iter()
        .enumerate()
        .filter(|(_, asset)| !seen.insert(asset.hash))
        .map(|(index, _)| index)
        .collect()
}
