//! Per-pass trajectory optimization boundary.
//!
//! The nonlinear solver lives outside this crate. The planner's job is to
//! assemble one well-formed subproblem per pass: the pass's poses, the seed
//! slice chosen by the search, and the cost/constraint configuration.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::kinematics::JointConfiguration;
use crate::path::ToolPass;
use crate::Result;

/// One joint configuration per waypoint of a single pass.
pub type JointPass = Vec<JointConfiguration>;

/// Per-joint weighting for a smoothness cost term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JointWeights {
    /// Same weight for every joint.
    Uniform(f64),
    /// One weight per joint; length must equal the run's DOF.
    PerJoint(Vec<f64>),
}

impl JointWeights {
    /// Expand to one coefficient per joint.
    pub fn resolve(&self, dof: usize) -> Vec<f64> {
        match self {
            JointWeights::Uniform(w) => vec![*w; dof],
            JointWeights::PerJoint(weights) => weights.clone(),
        }
    }
}

/// A named exception to the default collision-safety distance between two
/// specific geometry groups. Lets a tool-contact part approach the workpiece
/// more closely than the default margin while stricter parts keep theirs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginOverride {
    pub first: String,
    pub second: String,
    /// Signed distance in meters; negative permits shallow penetration
    /// (tool pressed into the part).
    pub margin: f64,
    pub weight: f64,
}

/// Collision-margin cost applied across a whole subproblem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionCostConfig {
    /// Default safety distance in meters
    pub margin: f64,
    /// Penalty weight for margin violations
    pub weight: f64,
    /// Pair-specific exceptions to the default margin
    pub overrides: Vec<MarginOverride>,
}

impl Default for CollisionCostConfig {
    fn default() -> Self {
        Self {
            margin: 0.025,
            weight: 20.0,
            overrides: Vec::new(),
        }
    }
}

/// Cost and constraint configuration for every pass subproblem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Joint-velocity smoothness weights
    pub velocity_weights: JointWeights,
    /// Joint-acceleration smoothness weights
    pub acceleration_weights: JointWeights,
    pub collision: CollisionCostConfig,
    /// Per-axis weights pinning waypoint translation. Kept high: the tool
    /// must stay on the path.
    pub position_coeffs: Vector3<f64>,
    /// Per-axis weights on waypoint rotation error. The Z component is the
    /// rotation about the tool approach axis; zero leaves it unconstrained,
    /// mirroring the redundancy the axial sampler exploits.
    pub rotation_coeffs: Vector3<f64>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            velocity_weights: JointWeights::Uniform(2.5),
            acceleration_weights: JointWeights::Uniform(5.0),
            collision: CollisionCostConfig::default(),
            position_coeffs: Vector3::new(10.0, 10.0, 10.0),
            rotation_coeffs: Vector3::new(10.0, 10.0, 0.0),
        }
    }
}

/// Everything the external solver needs for one pass: one decision variable
/// per waypoint, seeded from the search result. Consumed exactly once.
#[derive(Debug, Clone)]
pub struct OptimizationSubproblem {
    pub pass: ToolPass,
    pub seed: JointPass,
    pub config: OptimizationConfig,
}

impl OptimizationSubproblem {
    pub fn new(pass: ToolPass, seed: JointPass, config: OptimizationConfig) -> Self {
        debug_assert_eq!(pass.len(), seed.len(), "one seed configuration per waypoint");
        Self { pass, seed, config }
    }

    pub fn waypoint_count(&self) -> usize {
        self.pass.len()
    }

    pub fn dof(&self) -> usize {
        self.seed.first().map_or(0, |q| q.len())
    }
}

/// External nonlinear solver boundary. Implementations must not mutate the
/// subproblem; passes may be solved concurrently.
pub trait TrajectoryOptimizer: Sync {
    fn solve(&self, problem: &OptimizationSubproblem) -> Result<JointPass>;
}
