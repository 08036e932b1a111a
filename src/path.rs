use nalgebra::Isometry3;
use serde::{Deserialize, Serialize};

/// A rigid 3D transform the tool must achieve. The pose's local +Z is the
/// tool approach axis.
pub type Pose = Isometry3<f64>;

/// One continuous motion segment: an ordered sequence of poses. Order is the
/// direction of travel.
pub type ToolPass = Vec<Pose>;

/// An ordered sequence of passes over a part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolPath {
    pub passes: Vec<ToolPass>,
}

impl ToolPath {
    pub fn new(passes: Vec<ToolPass>) -> Self {
        Self { passes }
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Total number of poses across all passes.
    pub fn pose_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.len()).sum()
    }

    /// Number of poses in each pass, in pass order. Used to partition
    /// flattened per-pose data back into passes.
    pub fn pass_lengths(&self) -> Vec<usize> {
        self.passes.iter().map(|pass| pass.len()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pose_count() == 0
    }

    /// Iterate poses in pass-major, pose-minor order.
    pub fn iter_poses(&self) -> impl Iterator<Item = &Pose> {
        self.passes.iter().flat_map(|pass| pass.iter())
    }

    /// Flatten to a single pose sequence, pass-major.
    pub fn flatten(&self) -> Vec<Pose> {
        self.iter_poses().copied().collect()
    }
}

impl From<Vec<ToolPass>> for ToolPath {
    fn from(passes: Vec<ToolPass>) -> Self {
        Self { passes }
    }
}
