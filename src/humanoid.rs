//! Humanoid specific end-effectors and balance quantities on top of a [DynamicRobot].

extern crate nalgebra as na;

use float_cmp::{ApproxEq, F64Margin};
use log::{debug, warn};
use na::{Point3, Vector3};

use crate::{dynamics::robot::DynamicRobot, model_elements::joint::JointID, Error};

#[cfg(test)]
#[path = "humanoid_tests.rs"]
mod humanoid_tests;

/// A ray defined by an origin and a direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GazeRay {
    /// The point the ray starts at.
    pub origin: Vector3<f64>,

    /// The direction of the ray.
    pub direction: Vector3<f64>,
}

/// A dynamic robot with the joints that act as hands, feet and eyes of a humanoid.
///
/// The end-effectors are references to joints of the robot. Setting an end-effector replaces the
/// previous one.
pub struct HumanoidRobot {
    robot: DynamicRobot,

    left_hand: Option<JointID>,
    right_hand: Option<JointID>,
    left_foot: Option<JointID>,
    right_foot: Option<JointID>,

    gaze_joint: Option<JointID>,

    /// The gaze in the frame of the gaze joint.
    gaze: Option<GazeRay>,

    zero_momentum_point: Option<Vector3<f64>>,
}

impl HumanoidRobot {
    /// Computes the zero momentum point on the ground plane z = 0.
    ///
    /// This is the point where the moment of the ground reaction force around the horizontal
    /// axes is zero. It is computed from the center of mass, the derivatives of the linear
    /// momentum and of the angular momentum around the center of mass, the total mass and the
    /// gravity. If [crate::dynamics::options::ModelOptions::compute_zmp] is disabled nothing is
    /// computed and the previous zero momentum point is discarded.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the center of mass dynamics were never computed.
    /// * [Error::StaleDependency] - Returned when the state changed after the center of mass dynamics.
    /// * [Error::DegenerateZeroMomentumPoint] - Returned when the vertical ground reaction force is
    ///   zero, e.g. when the robot is in free fall.
    pub fn compute_zero_momentum_point(&mut self) -> Result<(), Error> {
        let options = self.robot.options();
        if !options.compute_zmp {
            self.zero_momentum_point = None;
            return Ok(());
        }

        let gravity = options.gravity;
        let dynamics = self.robot.fresh_center_of_mass_dynamics()?;
        let center_of_mass = dynamics.position();
        let momentum_derivative = dynamics.linear_momentum_derivative();
        let angular_momentum_derivative = dynamics.angular_momentum_derivative();

        let vertical_force = momentum_derivative.z + self.robot.mass() * gravity;
        if vertical_force.approx_eq(0.0, F64Margin { ulps: 4, epsilon: 1e-9 }) {
            warn!("The vertical ground reaction force is zero. There is no zero momentum point");
            return Err(Error::DegenerateZeroMomentumPoint);
        }

        let x = center_of_mass.x
            - (center_of_mass.z * momentum_derivative.x + angular_momentum_derivative.y)
                / vertical_force;
        let y = center_of_mass.y
            - (center_of_mass.z * momentum_derivative.y - angular_momentum_derivative.x)
                / vertical_force;

        let result = Vector3::new(x, y, 0.0);
        debug!("Computed the zero momentum point {:?}", result);
        self.zero_momentum_point = Some(result);
        Ok(())
    }

    /// Returns the dynamic model of the robot.
    pub fn dynamics(&self) -> &DynamicRobot {
        &self.robot
    }

    /// Returns the dynamic model of the robot for changing the state and computing.
    pub fn dynamics_mut(&mut self) -> &mut DynamicRobot {
        &mut self.robot
    }

    /// Returns the gaze ray in the frame of the gaze joint.
    pub fn gaze(&self) -> Option<&GazeRay> {
        self.gaze.as_ref()
    }

    /// Returns the gaze ray in the world frame, using the last computed pose of the gaze joint.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when there is no gaze joint, no gaze ray or the
    ///   forward kinematics were never computed.
    pub fn gaze_in_world(&self) -> Result<GazeRay, Error> {
        let joint = self.gaze_joint.as_ref().ok_or(Error::MissingDependency {
            quantity: "gaze joint",
        })?;
        let gaze = self.gaze.as_ref().ok_or(Error::MissingDependency {
            quantity: "gaze ray",
        })?;

        let transform = self.robot.joint_kinematics(joint)?.transform();
        Ok(GazeRay {
            origin: (transform * Point3::from(gaze.origin)).coords,
            direction: transform * gaze.direction,
        })
    }

    /// Returns the joint that carries the eyes of the robot.
    pub fn gaze_joint(&self) -> Option<&JointID> {
        self.gaze_joint.as_ref()
    }

    /// Returns the joint that acts as the left foot.
    pub fn left_foot(&self) -> Option<&JointID> {
        self.left_foot.as_ref()
    }

    /// Returns the joint that acts as the left hand.
    pub fn left_hand(&self) -> Option<&JointID> {
        self.left_hand.as_ref()
    }

    /// Creates a new humanoid without end-effectors.
    pub fn new(robot: DynamicRobot) -> Self {
        Self {
            robot,
            left_hand: None,
            right_hand: None,
            left_foot: None,
            right_foot: None,
            gaze_joint: None,
            gaze: None,
            zero_momentum_point: None,
        }
    }

    /// Returns the joint that acts as the right foot.
    pub fn right_foot(&self) -> Option<&JointID> {
        self.right_foot.as_ref()
    }

    /// Returns the joint that acts as the right hand.
    pub fn right_hand(&self) -> Option<&JointID> {
        self.right_hand.as_ref()
    }

    fn validated(&self, id: &JointID) -> Result<JointID, Error> {
        self.robot.chain().joint(id)?;
        Ok(*id)
    }

    /// Sets the gaze ray in the frame of the gaze joint.
    pub fn set_gaze(&mut self, origin: Vector3<f64>, direction: Vector3<f64>) {
        self.gaze = Some(GazeRay { origin, direction });
    }

    /// Sets the joint that carries the eyes of the robot.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the robot.
    pub fn set_gaze_joint(&mut self, id: &JointID) -> Result<(), Error> {
        self.gaze_joint = Some(self.validated(id)?);
        Ok(())
    }

    /// Sets the joint that acts as the left foot.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the robot.
    pub fn set_left_foot(&mut self, id: &JointID) -> Result<(), Error> {
        self.left_foot = Some(self.validated(id)?);
        Ok(())
    }

    /// Sets the joint that acts as the left hand.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the robot.
    pub fn set_left_hand(&mut self, id: &JointID) -> Result<(), Error> {
        self.left_hand = Some(self.validated(id)?);
        Ok(())
    }

    /// Sets the joint that acts as the right foot.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the robot.
    pub fn set_right_foot(&mut self, id: &JointID) -> Result<(), Error> {
        self.right_foot = Some(self.validated(id)?);
        Ok(())
    }

    /// Sets the joint that acts as the right hand.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the robot.
    pub fn set_right_hand(&mut self, id: &JointID) -> Result<(), Error> {
        self.right_hand = Some(self.validated(id)?);
        Ok(())
    }

    /// Returns the last computed zero momentum point.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the zero momentum point was never computed.
    pub fn zero_momentum_point(&self) -> Result<&Vector3<f64>, Error> {
        self.zero_momentum_point
            .as_ref()
            .ok_or(Error::MissingDependency {
                quantity: "zero momentum point",
            })
    }
}
