//! Collision feasibility boundary.
//!
//! The collision engine itself lives outside this crate; the planner only
//! requires a checker it can query and clone. Query evaluation is defined as
//! safe only under exclusive access (the underlying scene mutates per query),
//! so parallel sampling binds every sampler to its own clone instead of
//! locking a shared checker.

use crate::kinematics::JointConfiguration;
use crate::{Error, Result};

/// Feasibility oracle for one joint configuration against a static scene.
pub trait CollisionChecker: Send {
    /// Degrees of freedom the bound scene expects in every query.
    fn dof(&self) -> usize;

    /// True if the configuration is collision-free. A configuration of the
    /// wrong dimensionality is a contract breach, reported as
    /// [`Error::DofMismatch`], never as "in collision".
    fn check(&mut self, q: &JointConfiguration) -> Result<bool>;

    /// Duplicate all scene state needed for feasibility queries. The clone
    /// is independent of the source: subsequent mutations of either never
    /// influence the other's verdicts.
    fn try_clone(&self) -> Result<Box<dyn CollisionChecker>>;
}

/// Dimensionality precondition shared by checker implementations.
pub fn validate_dof(expected: usize, q: &JointConfiguration) -> Result<()> {
    if q.len() != expected {
        return Err(Error::DofMismatch {
            expected,
            got: q.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scene stub whose "geometry" is a list of blocked joint-space points.
    struct PointScene {
        dof: usize,
        blocked: Vec<JointConfiguration>,
    }

    impl CollisionChecker for PointScene {
        fn dof(&self) -> usize {
            self.dof
        }

        fn check(&mut self, q: &JointConfiguration) -> Result<bool> {
            validate_dof(self.dof, q)?;
            let hit = self.blocked.iter().any(|b| (b - q).norm() < 1e-9);
            Ok(!hit)
        }

        fn try_clone(&self) -> Result<Box<dyn CollisionChecker>> {
            Ok(Box::new(PointScene {
                dof: self.dof,
                blocked: self.blocked.clone(),
            }))
        }
    }

    fn q(values: &[f64]) -> JointConfiguration {
        JointConfiguration::from_vec(values.to_vec())
    }

    #[test]
    fn test_check_free_and_blocked() {
        let mut scene = PointScene {
            dof: 2,
            blocked: vec![q(&[1.0, 1.0])],
        };
        assert!(scene.check(&q(&[0.0, 0.0])).unwrap());
        assert!(!scene.check(&q(&[1.0, 1.0])).unwrap());
    }

    #[test]
    fn test_wrong_dof_is_contract_breach() {
        let mut scene = PointScene {
            dof: 2,
            blocked: vec![],
        };
        let err = scene.check(&q(&[0.0, 0.0, 0.0])).unwrap_err();
        match err {
            Error::DofMismatch { expected, got } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
            }
            other => panic!("expected DofMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let mut scene = PointScene {
            dof: 2,
            blocked: vec![],
        };
        let mut clone_a = scene.try_clone().unwrap();
        let mut clone_b = scene.try_clone().unwrap();

        // Mark a previously feasible configuration as colliding in the
        // source scene; sibling clones must keep their old verdict.
        scene.blocked.push(q(&[0.5, 0.5]));
        assert!(!scene.check(&q(&[0.5, 0.5])).unwrap());
        assert!(clone_a.check(&q(&[0.5, 0.5])).unwrap());
        assert!(clone_b.check(&q(&[0.5, 0.5])).unwrap());
    }
}
