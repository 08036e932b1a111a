//! Per-pose joint-configuration sampling.
//!
//! A sampler is bound at construction to one target pose, a kinematics
//! provider, and an exclusively-owned collision checker clone. `sample`
//! appends every collision-free solution it finds to the caller's set and
//! reports whether it appended anything.

use std::f64::consts::TAU;
use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};

use crate::collision::CollisionChecker;
use crate::kinematics::{JointConfiguration, KinematicsProvider};
use crate::path::Pose;
use crate::Result;

/// Collision-free joint configurations found feasible for one pose.
pub type CandidateSet = Vec<JointConfiguration>;

/// One-pose sampling capability.
pub trait PositionSampler: Send {
    /// Append all collision-free joint configurations for the bound pose to
    /// `out`. Append-only: prior contents are never cleared. Returns true
    /// iff at least one configuration was appended this call.
    fn sample(&mut self, out: &mut CandidateSet) -> Result<bool>;
}

/// Samples the kinematics exactly at the bound pose.
pub struct ExactPoseSampler {
    pose: Pose,
    kinematics: Arc<dyn KinematicsProvider>,
    collision: Box<dyn CollisionChecker>,
}

impl ExactPoseSampler {
    pub fn new(
        pose: Pose,
        kinematics: Arc<dyn KinematicsProvider>,
        collision: Box<dyn CollisionChecker>,
    ) -> Self {
        Self {
            pose,
            kinematics,
            collision,
        }
    }
}

impl PositionSampler for ExactPoseSampler {
    fn sample(&mut self, out: &mut CandidateSet) -> Result<bool> {
        let before = out.len();
        for q in self.kinematics.solve(&self.pose) {
            if self.collision.check(&q)? {
                out.push(q);
            }
        }
        Ok(out.len() > before)
    }
}

/// Samples a sweep of rotations about the tool approach axis (the pose's
/// local +Z), exploiting a free rotational degree of freedom of the process.
///
/// Offsets are enumerated in increasing order `0, Δθ, 2Δθ, …` with
/// `ceil(2π/Δθ)` entries. Downstream graph construction relies on this order
/// for tie-breaking, so it is preserved exactly.
pub struct AxialSymmetricSampler {
    pose: Pose,
    kinematics: Arc<dyn KinematicsProvider>,
    collision: Box<dyn CollisionChecker>,
    resolution: f64,
}

impl AxialSymmetricSampler {
    /// `resolution` is the angular step Δθ in radians, must be positive.
    /// `Δθ ≥ 2π` degenerates to a single offset of 0.
    pub fn new(
        pose: Pose,
        kinematics: Arc<dyn KinematicsProvider>,
        resolution: f64,
        collision: Box<dyn CollisionChecker>,
    ) -> Self {
        debug_assert!(resolution > 0.0, "angular resolution must be positive");
        Self {
            pose,
            kinematics,
            collision,
            resolution,
        }
    }

    /// Number of discrete rotation offsets explored per `sample` call.
    pub fn offset_count(&self) -> usize {
        offset_count(self.resolution)
    }
}

/// `ceil(2π / Δθ)`, never less than 1.
pub(crate) fn offset_count(resolution: f64) -> usize {
    ((TAU / resolution).ceil() as usize).max(1)
}

impl PositionSampler for AxialSymmetricSampler {
    fn sample(&mut self, out: &mut CandidateSet) -> Result<bool> {
        let before = out.len();

        for i in 0..offset_count(self.resolution) {
            let theta = i as f64 * self.resolution;
            // Rotate about the tool's own Z axis, not the world Z
            let rotated =
                self.pose * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta);

            for q in self.kinematics.solve(&rotated) {
                if self.collision.check(&q)? {
                    out.push(q);
                }
            }
        }

        Ok(out.len() > before)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{ThresholdChecker, YawEncodingKinematics};
    use super::*;
    use nalgebra::Translation3;
    use std::f64::consts::PI;

    fn pose_at(x: f64) -> Pose {
        Pose::from_parts(Translation3::new(x, 0.0, 0.0), UnitQuaternion::identity())
    }

    fn kin(max_reach: f64) -> Arc<dyn KinematicsProvider> {
        Arc::new(YawEncodingKinematics { max_reach })
    }

    #[test]
    fn test_exact_sampler_finds_free_solution() {
        let checker = Box::new(ThresholdChecker::new(2, f64::MAX));
        let mut sampler = ExactPoseSampler::new(pose_at(0.5), kin(1.0), checker);

        let mut out = CandidateSet::new();
        assert!(sampler.sample(&mut out).unwrap());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 2);
    }

    #[test]
    fn test_exact_sampler_unreachable_pose() {
        let checker = Box::new(ThresholdChecker::new(2, f64::MAX));
        let mut sampler = ExactPoseSampler::new(pose_at(5.0), kin(1.0), checker);

        let mut out = CandidateSet::new();
        assert!(!sampler.sample(&mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_exact_sampler_all_solutions_collide() {
        // Solution's first value is the pose x; block everything above -1
        let checker = Box::new(ThresholdChecker::new(2, -1.0));
        let mut sampler = ExactPoseSampler::new(pose_at(0.5), kin(1.0), checker);

        let mut out = CandidateSet::new();
        assert!(!sampler.sample(&mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_sample_is_append_only() {
        let checker = Box::new(ThresholdChecker::new(2, f64::MAX));
        let mut sampler = ExactPoseSampler::new(pose_at(0.5), kin(1.0), checker);

        let sentinel = JointConfiguration::from_vec(vec![9.0, 9.0]);
        let mut out = vec![sentinel.clone()];
        assert!(sampler.sample(&mut out).unwrap());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], sentinel);
    }

    #[test]
    fn test_offset_count_formula() {
        assert_eq!(offset_count(PI / 4.0), 8);
        assert_eq!(offset_count(PI), 2);
        assert_eq!(offset_count(2.0 * PI), 1);
        assert_eq!(offset_count(10.0), 1);
        // Just under a full turn still needs two offsets
        assert_eq!(offset_count(2.0 * PI - 1e-6), 2);
    }

    #[test]
    fn test_axial_sweep_order_and_count() {
        let checker = Box::new(ThresholdChecker::new(2, f64::MAX));
        let mut sampler =
            AxialSymmetricSampler::new(pose_at(0.5), kin(1.0), PI / 4.0, checker);
        assert_eq!(sampler.offset_count(), 8);

        let mut out = CandidateSet::new();
        assert!(sampler.sample(&mut out).unwrap());
        assert_eq!(out.len(), 8);

        // The scripted kinematics encodes the rotated pose's yaw in joint 1;
        // offsets must appear in strictly increasing order starting at 0.
        for (i, q) in out.iter().enumerate() {
            let expected = i as f64 * PI / 4.0;
            let diff = (q[1] - expected).rem_euclid(2.0 * PI);
            assert!(
                diff < 1e-9 || (2.0 * PI - diff) < 1e-9,
                "offset {i}: got yaw {}, expected {expected}",
                q[1]
            );
        }
    }

    #[test]
    fn test_full_turn_resolution_matches_exact_sampler() {
        let mut exact_out = CandidateSet::new();
        ExactPoseSampler::new(
            pose_at(0.5),
            kin(1.0),
            Box::new(ThresholdChecker::new(2, f64::MAX)),
        )
        .sample(&mut exact_out)
        .unwrap();

        let mut axial_out = CandidateSet::new();
        AxialSymmetricSampler::new(
            pose_at(0.5),
            kin(1.0),
            2.0 * PI,
            Box::new(ThresholdChecker::new(2, f64::MAX)),
        )
        .sample(&mut axial_out)
        .unwrap();

        assert_eq!(axial_out, exact_out);
    }

    #[test]
    fn test_unreachable_offsets_contribute_nothing() {
        // Reachable pose but collision blocks everything: found = false even
        // though every offset produced a kinematic solution.
        let checker = Box::new(ThresholdChecker::new(2, -1.0));
        let mut sampler =
            AxialSymmetricSampler::new(pose_at(0.5), kin(1.0), PI / 2.0, checker);

        let mut out = CandidateSet::new();
        assert!(!sampler.sample(&mut out).unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_wrong_dof_propagates_as_error() {
        // Checker bound to a 3-DOF scene while kinematics emits 2-DOF
        // configurations: a contract breach, not a sampling failure.
        let checker = Box::new(ThresholdChecker::new(3, f64::MAX));
        let mut sampler = ExactPoseSampler::new(pose_at(0.5), kin(1.0), checker);

        let mut out = CandidateSet::new();
        assert!(sampler.sample(&mut out).is_err());
    }
}
