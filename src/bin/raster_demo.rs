// Demo entry point: plans a raster sanding path over an arched surface with
// stub collaborators standing in for the real IK, collision, search, and
// optimization engines.

use std::f64::consts::PI;
use std::sync::Arc;

use nalgebra::{Translation3, UnitQuaternion, Vector3};

use hybrid_planner::collision::validate_dof;
use hybrid_planner::optimize::{JointPass, OptimizationSubproblem};
use hybrid_planner::sampler::CandidateSet;
use hybrid_planner::{
    CollisionChecker, HybridPlanner, JointConfiguration, KinematicsProvider, OptimizationConfig,
    Pose, SamplingPolicy, SeedSearch, ToolPass, ToolPath, TrajectoryOptimizer,
};

/// Raster path over a sine arc: several parallel passes, odd passes reversed
/// (and yawed 180 degrees so X stays along the travel direction) to avoid a
/// carriage return between passes.
fn make_path() -> ToolPath {
    let origin = Translation3::new(0.5, 0.0, 0.55);
    let flip = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI);

    let n_passes = 5;
    let mut passes = Vec::with_capacity(n_passes);

    for r in 0..n_passes {
        let mut pass: ToolPass = Vec::new();
        for i in -10i32..=10 {
            let percent = (10 + i) as f64 / 20.0;
            let arc_height = (PI * percent).sin() * 0.5;
            let offset = Translation3::new(r as f64 * 0.1, i as f64 * 0.05, arc_height);
            // +Z points into the part
            pass.push(Pose::from_parts(origin, UnitQuaternion::identity()) * offset * flip);
        }

        if r % 2 != 0 {
            pass.reverse();
            let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI);
            for p in &mut pass {
                *p = *p * yaw;
            }
        }

        passes.push(pass);
    }

    ToolPath::new(passes)
}

/// Gantry-style stand-in kinematics: joints are (x, y, z, c) with c the
/// rotation about the tool axis. One solution per pose inside the work
/// volume, none outside.
struct GantryKinematics {
    volume_min: Vector3<f64>,
    volume_max: Vector3<f64>,
}

impl KinematicsProvider for GantryKinematics {
    fn dof(&self) -> usize {
        4
    }

    fn solve(&self, pose: &Pose) -> Vec<JointConfiguration> {
        let t = pose.translation.vector;
        let inside = (0..3).all(|i| t[i] >= self.volume_min[i] && t[i] <= self.volume_max[i]);
        if !inside {
            return vec![];
        }
        let x_axis = pose.rotation * Vector3::x();
        let c = x_axis.y.atan2(x_axis.x);
        vec![JointConfiguration::from_vec(vec![t.x, t.y, t.z, c])]
    }
}

/// Joint-space keep-out box standing in for a real collision scene.
struct KeepOutBox {
    min: Vector3<f64>,
    max: Vector3<f64>,
}

impl CollisionChecker for KeepOutBox {
    fn dof(&self) -> usize {
        4
    }

    fn check(&mut self, q: &JointConfiguration) -> hybrid_planner::Result<bool> {
        validate_dof(self.dof(), q)?;
        let inside = (0..3).all(|i| q[i] >= self.min[i] && q[i] <= self.max[i]);
        Ok(!inside)
    }

    fn try_clone(&self) -> hybrid_planner::Result<Box<dyn CollisionChecker>> {
        Ok(Box::new(KeepOutBox {
            min: self.min,
            max: self.max,
        }))
    }
}

/// Minimum-cost ladder search over the candidate layers: dynamic programming
/// with squared joint distance as the edge cost. Ties keep the earlier
/// candidate, which is why intra-layer order matters.
struct MinCostLadderSearch;

impl SeedSearch for MinCostLadderSearch {
    fn search(&self, candidates: &[CandidateSet]) -> Option<Vec<JointConfiguration>> {
        if candidates.iter().any(|layer| layer.is_empty()) {
            return None;
        }

        // cost[i][j]: best cost to reach candidate j of layer i
        let mut cost: Vec<Vec<f64>> = vec![vec![0.0; candidates[0].len()]];
        let mut back: Vec<Vec<usize>> = Vec::new();

        for window in candidates.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            let prev_cost = cost.last().expect("seeded with layer 0");
            let mut layer_cost = Vec::with_capacity(next.len());
            let mut layer_back = Vec::with_capacity(next.len());

            for q in next {
                let (j, c) = prev
                    .iter()
                    .enumerate()
                    .map(|(j, p)| (j, prev_cost[j] + (q - p).norm_squared()))
                    .min_by(|a, b| a.1.total_cmp(&b.1))?;
                layer_back.push(j);
                layer_cost.push(c);
            }

            cost.push(layer_cost);
            back.push(layer_back);
        }

        let mut idx = cost
            .last()?
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))?
            .0;
        let mut chosen = vec![idx; candidates.len()];
        for (i, layer_back) in back.iter().enumerate().rev() {
            idx = layer_back[idx];
            chosen[i] = idx;
        }

        Some(
            candidates
                .iter()
                .zip(chosen)
                .map(|(layer, j)| layer[j].clone())
                .collect(),
        )
    }
}

/// Smoothing stand-in for the nonlinear solver: endpoint-preserving moving
/// average over the seed.
struct MovingAverageOptimizer;

impl TrajectoryOptimizer for MovingAverageOptimizer {
    fn solve(&self, problem: &OptimizationSubproblem) -> hybrid_planner::Result<JointPass> {
        let seed = &problem.seed;
        if seed.len() < 3 {
            return Ok(seed.clone());
        }
        let mut smoothed = seed.clone();
        for i in 1..seed.len() - 1 {
            smoothed[i] = (&seed[i - 1] + &seed[i] * 2.0 + &seed[i + 1]) / 4.0;
        }
        Ok(smoothed)
    }
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let path = make_path();
    log::info!(
        "planning {} passes, {} poses",
        path.pass_count(),
        path.pose_count()
    );

    let kinematics = Arc::new(GantryKinematics {
        volume_min: Vector3::new(0.0, -0.6, 0.0),
        volume_max: Vector3::new(1.2, 0.6, 1.2),
    });
    let template = KeepOutBox {
        min: Vector3::new(0.55, -0.1, 0.0),
        max: Vector3::new(0.65, 0.1, 0.4),
    };

    let planner = HybridPlanner::new(
        kinematics,
        SamplingPolicy::AxialSymmetric { resolution: PI / 4.0 },
        Box::new(MinCostLadderSearch),
        Box::new(MovingAverageOptimizer),
        OptimizationConfig::default(),
    );

    match planner.plan(&path, &template) {
        Ok(result) => {
            for report in result.sampling.iter().filter(|r| !r.found) {
                log::warn!("pass {} pose {}: no feasible samples", report.pass, report.pose);
            }
            match (&result.seed, result.succeeded) {
                (None, _) => println!("no feasible motion found"),
                (Some(seed), false) => {
                    let done = result.optimized.iter().filter(|t| t.is_some()).count();
                    println!(
                        "seed trajectory found ({} passes); optimization finished {}/{} passes",
                        seed.len(),
                        done,
                        result.optimized.len()
                    );
                }
                (Some(seed), true) => {
                    println!("motion plan complete: {} optimized passes", seed.len());
                }
            }
        }
        Err(e) => {
            log::error!("planning failed: {e}");
            std::process::exit(1);
        }
    }
}
