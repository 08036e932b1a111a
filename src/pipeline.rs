//! Hybrid planning pipeline.
//!
//! One forward pass per invocation:
//! build grid → sample → search (external) → optimize per pass (external) →
//! assemble result. Sampling and per-pass optimization fan out across
//! worker threads; the search runs only once every candidate set exists.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionChecker;
use crate::grid::{build_sampler_grid, SamplingPolicy};
use crate::kinematics::{JointConfiguration, KinematicsProvider};
use crate::optimize::{JointPass, OptimizationConfig, OptimizationSubproblem, TrajectoryOptimizer};
use crate::path::ToolPath;
use crate::sampler::{CandidateSet, PositionSampler};
use crate::{Error, Result};

/// One joint pass per tool pass; flattened shape matches the path.
pub type SeedTrajectory = Vec<JointPass>;

/// External graph-search boundary. Consumes one candidate set per pose in
/// path order (intra-pose order is the samplers' enumeration order and is
/// the tie-break order for equal-cost edges). Returns one configuration per
/// pose, or `None` when no path bridges all pose layers.
pub trait SeedSearch: Sync {
    fn search(&self, candidates: &[CandidateSet]) -> Option<Vec<JointConfiguration>>;
}

/// Sampling outcome for a single pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleReport {
    pub pass: usize,
    pub pose: usize,
    pub candidates: usize,
    pub found: bool,
}

/// Optimization outcome for a single pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeReport {
    pub pass: usize,
    /// Solver failure message; `None` on success
    pub error: Option<String>,
}

/// What a pipeline invocation produced. Always distinguishes "nothing
/// found" (both trajectories absent) from "feasible but unrefined" (seed
/// present, some optimized passes absent) from full success.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// True only if every attempted stage succeeded for every pass
    pub succeeded: bool,
    pub seed: Option<SeedTrajectory>,
    /// One entry per pass; `None` where the solver failed or was never
    /// reached
    pub optimized: Vec<Option<JointPass>>,
    pub sampling: Vec<SampleReport>,
    /// Empty when the optimization stage was never attempted
    pub optimization: Vec<OptimizeReport>,
}

/// Drives the sampling → search → optimization pipeline. Holds the
/// collaborators for a run; no state survives across `plan` calls.
pub struct HybridPlanner {
    kinematics: Arc<dyn KinematicsProvider>,
    policy: SamplingPolicy,
    search: Box<dyn SeedSearch>,
    optimizer: Box<dyn TrajectoryOptimizer>,
    optimization: OptimizationConfig,
}

impl HybridPlanner {
    pub fn new(
        kinematics: Arc<dyn KinematicsProvider>,
        policy: SamplingPolicy,
        search: Box<dyn SeedSearch>,
        optimizer: Box<dyn TrajectoryOptimizer>,
        optimization: OptimizationConfig,
    ) -> Self {
        Self {
            kinematics,
            policy,
            search,
            optimizer,
            optimization,
        }
    }

    /// Run the full pipeline for `path` against the scene bound to
    /// `template`. The template checker is only cloned, never queried.
    pub fn plan(
        &self,
        path: &ToolPath,
        template: &dyn CollisionChecker,
    ) -> Result<PipelineResult> {
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        let pass_count = path.pass_count();

        log::info!(
            "Stage 1: building sampler grid ({} passes, {} poses)",
            pass_count,
            path.pose_count()
        );
        let grid = build_sampler_grid(path, Arc::clone(&self.kinematics), self.policy, template)?;

        log::info!("Stage 2: sampling {} poses", grid.cell_count());
        let (layers, sampling) = self.sample_grid(grid.into_rows())?;

        let failed_poses = sampling.iter().filter(|r| !r.found).count();
        if failed_poses > 0 {
            log::warn!("{failed_poses} poses produced no collision-free candidates");
        }

        log::info!("Stage 3: searching for a seed trajectory");
        let flat_seed = match self.search.search(&layers) {
            Some(seed) => seed,
            None => {
                log::warn!("search found no feasible path through the candidate sets");
                return Ok(PipelineResult {
                    succeeded: false,
                    seed: None,
                    optimized: vec![None; pass_count],
                    sampling,
                    optimization: Vec::new(),
                });
            }
        };
        if flat_seed.len() != path.pose_count() {
            return Err(Error::Config(format!(
                "search returned {} configurations for {} poses",
                flat_seed.len(),
                path.pose_count()
            )));
        }
        let seed = partition_seed(flat_seed, &path.pass_lengths());

        log::info!("Stage 4: optimizing {pass_count} passes");
        let outcomes: Vec<(Option<JointPass>, OptimizeReport)> = (0..pass_count)
            .into_par_iter()
            .map(|p| {
                let problem = OptimizationSubproblem::new(
                    path.passes[p].clone(),
                    seed[p].clone(),
                    self.optimization.clone(),
                );
                match self.optimizer.solve(&problem) {
                    Ok(trajectory) => (
                        Some(trajectory),
                        OptimizeReport {
                            pass: p,
                            error: None,
                        },
                    ),
                    Err(e) => (
                        None,
                        OptimizeReport {
                            pass: p,
                            error: Some(e.to_string()),
                        },
                    ),
                }
            })
            .collect();

        let mut optimized = Vec::with_capacity(pass_count);
        let mut optimization = Vec::with_capacity(pass_count);
        for (trajectory, report) in outcomes {
            if let Some(err) = &report.error {
                log::warn!("pass {} optimization failed: {err}", report.pass);
            }
            optimized.push(trajectory);
            optimization.push(report);
        }

        // A failed pass never discards the seed; it only degrades the result
        let succeeded = optimized.iter().all(|t| t.is_some());
        log::info!(
            "Stage 5: done (succeeded={succeeded}, {} of {pass_count} passes optimized)",
            optimized.iter().filter(|t| t.is_some()).count()
        );

        Ok(PipelineResult {
            succeeded,
            seed: Some(seed),
            optimized,
            sampling,
            optimization,
        })
    }

    /// Sample every cell, in parallel across poses. Each sampler owns its
    /// collision clone, so no locking is needed on the query path. Returns
    /// candidate sets in path order plus per-pose reports.
    fn sample_grid(
        &self,
        rows: Vec<Vec<Box<dyn PositionSampler>>>,
    ) -> Result<(Vec<CandidateSet>, Vec<SampleReport>)> {
        let cells: Vec<(usize, usize, Box<dyn PositionSampler>)> = rows
            .into_iter()
            .enumerate()
            .flat_map(|(pass, row)| {
                row.into_iter()
                    .enumerate()
                    .map(move |(pose, sampler)| (pass, pose, sampler))
            })
            .collect();

        // DOF mismatches surface here as hard errors; an empty set is a
        // normal per-pose outcome
        let sampled: Vec<(usize, usize, bool, CandidateSet)> = cells
            .into_par_iter()
            .map(|(pass, pose, mut sampler)| {
                let mut set = CandidateSet::new();
                let found = sampler.sample(&mut set)?;
                Ok((pass, pose, found, set))
            })
            .collect::<Result<_>>()?;

        let mut layers = Vec::with_capacity(sampled.len());
        let mut reports = Vec::with_capacity(sampled.len());
        for (pass, pose, found, set) in sampled {
            reports.push(SampleReport {
                pass,
                pose,
                candidates: set.len(),
                found,
            });
            layers.push(set);
        }
        Ok((layers, reports))
    }
}

/// Split a flat, path-ordered seed into per-pass slices.
fn partition_seed(flat: Vec<JointConfiguration>, pass_lengths: &[usize]) -> SeedTrajectory {
    let mut seed = Vec::with_capacity(pass_lengths.len());
    let mut rest = flat;
    for &len in pass_lengths {
        let tail = rest.split_off(len);
        seed.push(rest);
        rest = tail;
    }
    seed
}
