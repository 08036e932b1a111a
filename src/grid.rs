//! Sampler grid construction.
//!
//! A grid mirrors a tool path cell for cell: one sampler per pose, each
//! bound to its own collision-checker clone. Building the grid performs no
//! sampling; it only clones and wires.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::collision::CollisionChecker;
use crate::kinematics::KinematicsProvider;
use crate::path::ToolPath;
use crate::sampler::{AxialSymmetricSampler, ExactPoseSampler, PositionSampler};
use crate::{Error, Result};

/// Which sampler variant to bind at every pose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SamplingPolicy {
    /// Solve kinematics exactly at each pose.
    Exact,
    /// Sweep rotations about the tool approach axis at the given angular
    /// step in radians.
    AxialSymmetric { resolution: f64 },
}

/// One boxed sampler per pose, shaped exactly like the path it was built
/// from (pass-major, pose-minor).
pub struct SamplerGrid {
    rows: Vec<Vec<Box<dyn PositionSampler>>>,
}

impl SamplerGrid {
    pub fn pass_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of cells in each row, matching the source path's pass lengths.
    pub fn pose_counts(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.len()).collect()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }

    /// Consume the grid, yielding rows of samplers for the sampling stage.
    pub fn into_rows(self) -> Vec<Vec<Box<dyn PositionSampler>>> {
        self.rows
    }
}

/// Build a sampler grid for `path`: clone the template checker once per pose
/// and bind the policy-selected sampler to that clone and pose.
///
/// Fails only if the policy is malformed or a clone operation fails; both
/// are fatal for the whole build.
pub fn build_sampler_grid(
    path: &ToolPath,
    kinematics: Arc<dyn KinematicsProvider>,
    policy: SamplingPolicy,
    template: &dyn CollisionChecker,
) -> Result<SamplerGrid> {
    if let SamplingPolicy::AxialSymmetric { resolution } = policy {
        if !(resolution > 0.0) {
            return Err(Error::Config(format!(
                "axial sampling resolution must be positive, got {resolution}"
            )));
        }
    }

    let mut rows = Vec::with_capacity(path.pass_count());

    for pass in &path.passes {
        let mut row: Vec<Box<dyn PositionSampler>> = Vec::with_capacity(pass.len());
        for pose in pass {
            let clone = template.try_clone()?;
            let sampler: Box<dyn PositionSampler> = match policy {
                SamplingPolicy::Exact => {
                    Box::new(ExactPoseSampler::new(*pose, Arc::clone(&kinematics), clone))
                }
                SamplingPolicy::AxialSymmetric { resolution } => Box::new(
                    AxialSymmetricSampler::new(*pose, Arc::clone(&kinematics), resolution, clone),
                ),
            };
            row.push(sampler);
        }
        rows.push(row);
    }

    Ok(SamplerGrid { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::testing::{ThresholdChecker, YawEncodingKinematics};
    use crate::path::Pose;
    use nalgebra::{Translation3, UnitQuaternion};
    use std::f64::consts::PI;
    use std::sync::atomic::Ordering;

    fn pose_at(x: f64) -> Pose {
        Pose::from_parts(Translation3::new(x, 0.0, 0.0), UnitQuaternion::identity())
    }

    fn test_path() -> ToolPath {
        ToolPath::new(vec![
            vec![pose_at(0.0), pose_at(0.1), pose_at(0.2)],
            vec![pose_at(0.3), pose_at(0.4)],
        ])
    }

    #[test]
    fn test_grid_shape_matches_path() {
        let template = ThresholdChecker::new(2, f64::MAX);
        let grid = build_sampler_grid(
            &test_path(),
            Arc::new(YawEncodingKinematics { max_reach: 1.0 }),
            SamplingPolicy::Exact,
            &template,
        )
        .unwrap();

        assert_eq!(grid.pass_count(), 2);
        assert_eq!(grid.pose_counts(), vec![3, 2]);
        assert_eq!(grid.cell_count(), 5);
    }

    #[test]
    fn test_one_clone_per_pose() {
        let template = ThresholdChecker::new(2, f64::MAX);
        let clones = Arc::clone(&template.clones);

        let _grid = build_sampler_grid(
            &test_path(),
            Arc::new(YawEncodingKinematics { max_reach: 1.0 }),
            SamplingPolicy::AxialSymmetric { resolution: PI },
            &template,
        )
        .unwrap();

        assert_eq!(clones.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_build_performs_no_sampling() {
        let template = ThresholdChecker::new(2, f64::MAX);
        let queries = Arc::clone(&template.queries);

        let _grid = build_sampler_grid(
            &test_path(),
            Arc::new(YawEncodingKinematics { max_reach: 1.0 }),
            SamplingPolicy::Exact,
            &template,
        )
        .unwrap();

        assert_eq!(queries.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_clone_failure_aborts_build() {
        struct FailingClone;

        impl CollisionChecker for FailingClone {
            fn dof(&self) -> usize {
                2
            }
            fn check(&mut self, _q: &crate::JointConfiguration) -> Result<bool> {
                Ok(true)
            }
            fn try_clone(&self) -> Result<Box<dyn CollisionChecker>> {
                Err(Error::CloneFailed("out of contact managers".to_string()))
            }
        }

        let result = build_sampler_grid(
            &test_path(),
            Arc::new(YawEncodingKinematics { max_reach: 1.0 }),
            SamplingPolicy::Exact,
            &FailingClone,
        );
        assert!(matches!(result, Err(Error::CloneFailed(_))));
    }

    #[test]
    fn test_rejects_nonpositive_resolution() {
        let template = ThresholdChecker::new(2, f64::MAX);
        let result = build_sampler_grid(
            &test_path(),
            Arc::new(YawEncodingKinematics { max_reach: 1.0 }),
            SamplingPolicy::AxialSymmetric { resolution: 0.0 },
            &template,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
