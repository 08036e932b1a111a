// Core modules for hybrid sampling + optimization motion planning
pub mod collision;
pub mod grid;
pub mod kinematics;
pub mod optimize;
pub mod path;
pub mod pipeline;
pub mod sampler;

// Re-export commonly used types
pub use collision::CollisionChecker;
pub use grid::{build_sampler_grid, SamplerGrid, SamplingPolicy};
pub use kinematics::{JointConfiguration, KinematicsProvider, RailConfig, RailMounted};
pub use optimize::{
    JointPass, JointWeights, MarginOverride, OptimizationConfig, OptimizationSubproblem,
    TrajectoryOptimizer,
};
pub use path::{Pose, ToolPass, ToolPath};
pub use pipeline::{
    HybridPlanner, OptimizeReport, PipelineResult, SampleReport, SeedSearch, SeedTrajectory,
};
pub use sampler::{AxialSymmetricSampler, CandidateSet, ExactPoseSampler, PositionSampler};

/// Main result type for the planner
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the planner
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("joint configuration has {got} values, collision scene expects {expected}")]
    DofMismatch { expected: usize, got: usize },

    #[error("failed to clone collision checker: {0}")]
    CloneFailed(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("tool path contains no poses")]
    EmptyPath,

    #[error("trajectory optimization failed: {0}")]
    Optimization(String),
}
