//! Inverse kinematics boundary.
//!
//! The planner never solves kinematics itself; it consumes a
//! [`KinematicsProvider`] bound once per run. The provider's DOF is constant
//! for the whole run and every joint configuration it returns has exactly
//! that length.

use nalgebra::{DVector, Translation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::path::Pose;
use crate::{Error, Result};

/// A joint-space configuration: one value per degree of freedom.
pub type JointConfiguration = DVector<f64>;

/// Inverse kinematics capability. Implementations are shared across sampling
/// tasks, so they must be stateless with respect to `solve`.
pub trait KinematicsProvider: Send + Sync {
    /// Number of degrees of freedom in every returned configuration.
    fn dof(&self) -> usize;

    /// All joint solutions reaching `pose`, possibly none. An empty result
    /// is a normal outcome, not an error.
    fn solve(&self, pose: &Pose) -> Vec<JointConfiguration>;
}

/// Linear-stage discretization for a rail-mounted robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailConfig {
    /// Rail travel limits in meters, (min, max)
    pub travel: (f64, f64),
    /// Discretization step along the rail, meters
    pub step: f64,
    /// Rail direction in the world frame
    pub axis: Vector3<f64>,
}

impl Default for RailConfig {
    fn default() -> Self {
        Self {
            travel: (0.0, 2.0),
            step: 0.25,
            axis: Vector3::x(),
        }
    }
}

/// Wraps a fixed-base provider and exposes one extra linear degree of
/// freedom: the rail position, prepended to every solution.
///
/// For each discrete rail position the target pose is expressed in the
/// displaced base frame and handed to the inner provider. Samplers and the
/// pipeline are indifferent to whether this adapter is bound, as long as the
/// DOF stays consistent across a run.
pub struct RailMounted<K> {
    inner: K,
    travel: (f64, f64),
    step: f64,
    axis: Unit<Vector3<f64>>,
}

impl<K: KinematicsProvider> RailMounted<K> {
    pub fn new(inner: K, config: RailConfig) -> Result<Self> {
        if !(config.step > 0.0) {
            return Err(Error::Config(format!(
                "rail step must be positive, got {}",
                config.step
            )));
        }
        if config.travel.1 < config.travel.0 {
            return Err(Error::Config(format!(
                "rail travel range is inverted: ({}, {})",
                config.travel.0, config.travel.1
            )));
        }
        let axis = Unit::try_new(config.axis, 1e-12)
            .ok_or_else(|| Error::Config("rail axis has zero length".to_string()))?;

        Ok(Self {
            inner,
            travel: config.travel,
            step: config.step,
            axis,
        })
    }

    fn rail_positions(&self) -> Vec<f64> {
        let mut positions = Vec::new();
        let mut d = self.travel.0;
        // Tolerance keeps the last position when travel is an exact multiple
        // of the step.
        while d <= self.travel.1 + 1e-9 {
            positions.push(d);
            d += self.step;
        }
        positions
    }
}

impl<K: KinematicsProvider> KinematicsProvider for RailMounted<K> {
    fn dof(&self) -> usize {
        self.inner.dof() + 1
    }

    fn solve(&self, pose: &Pose) -> Vec<JointConfiguration> {
        let mut solutions = Vec::new();

        for d in self.rail_positions() {
            // Target pose as seen from the base displaced along the rail
            let shift = Translation3::from(self.axis.into_inner() * -d);
            let local_pose = shift * pose;

            for q in self.inner.solve(&local_pose) {
                let mut railed = JointConfiguration::zeros(q.len() + 1);
                railed[0] = d;
                railed.rows_mut(1, q.len()).copy_from(&q);
                solutions.push(railed);
            }
        }

        solutions
    }
}
