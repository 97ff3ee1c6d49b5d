extern crate nalgebra as na;

use log::{debug, trace, warn};
use na::{DVector, Isometry3, UnitQuaternion, Vector3};

use crate::{
    model_elements::{
        chain::KinematicChain,
        joint::{JointID, UnitTwist},
    },
    Error,
};

use super::{configuration::ConfigurationState, options::ModelOptions};

#[cfg(test)]
#[path = "forward_kinematics_tests.rs"]
mod forward_kinematics_tests;

/// Stores the world frame motion of a single joint and its body.
///
/// Velocities and accelerations of the joint are those of the origin of the joint frame.
/// The anchor of the joint is the origin of its actuated frame, the point around which a
/// revolute joint rotates.
#[derive(Clone, Debug, PartialEq)]
pub struct JointKinematics {
    transform: Isometry3<f64>,
    anchor: Vector3<f64>,
    dof_twists: Vec<UnitTwist>,

    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    linear_acceleration: Vector3<f64>,
    angular_acceleration: Vector3<f64>,

    center_of_mass: Vector3<f64>,
    center_of_mass_velocity: Vector3<f64>,
    center_of_mass_acceleration: Vector3<f64>,
}

impl JointKinematics {
    /// Returns the world position of the joint anchor.
    pub fn anchor(&self) -> &Vector3<f64> {
        &self.anchor
    }

    /// Returns the angular acceleration of the joint in the world frame.
    pub fn angular_acceleration(&self) -> &Vector3<f64> {
        &self.angular_acceleration
    }

    /// Returns the angular velocity of the joint in the world frame.
    pub fn angular_velocity(&self) -> &Vector3<f64> {
        &self.angular_velocity
    }

    /// Returns the world position of the center of mass of the body attached to the joint.
    pub fn center_of_mass(&self) -> &Vector3<f64> {
        &self.center_of_mass
    }

    /// Returns the world acceleration of the center of mass of the body.
    pub fn center_of_mass_acceleration(&self) -> &Vector3<f64> {
        &self.center_of_mass_acceleration
    }

    /// Returns the world velocity of the center of mass of the body.
    pub fn center_of_mass_velocity(&self) -> &Vector3<f64> {
        &self.center_of_mass_velocity
    }

    /// Returns the world frame unit twists of the degrees of freedom of the joint.
    pub fn dof_twists(&self) -> &[UnitTwist] {
        &self.dof_twists
    }

    /// Returns the linear acceleration of the joint origin in the world frame.
    pub fn linear_acceleration(&self) -> &Vector3<f64> {
        &self.linear_acceleration
    }

    /// Returns the linear velocity of the joint origin in the world frame.
    pub fn linear_velocity(&self) -> &Vector3<f64> {
        &self.linear_velocity
    }

    /// Returns the world position of the joint origin.
    pub fn position(&self) -> Vector3<f64> {
        self.transform.translation.vector
    }

    /// Returns the world orientation of the joint frame.
    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.transform.rotation
    }

    /// Returns the transform from the joint frame to the world frame.
    pub fn transform(&self) -> &Isometry3<f64> {
        &self.transform
    }

    /// Returns the velocity of a point that is rigidly attached to the joint, given in world
    /// coordinates.
    pub fn velocity_of_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        self.linear_velocity + self.angular_velocity.cross(&(point - self.position()))
    }
}

/// The result of a forward kinematics pass.
#[derive(Clone, Debug, PartialEq)]
pub struct KinematicState {
    /// The kinematics of each joint, indexed by joint ID. Joints that are not reachable from
    /// the root have no kinematics.
    joints: Vec<Option<JointKinematics>>,

    /// The revision of the configuration state the pass was computed for.
    computed_at: u64,
}

impl KinematicState {
    /// Returns the revision of the configuration state the kinematics were computed for.
    pub fn computed_at(&self) -> u64 {
        self.computed_at
    }

    /// Returns the kinematics of the given joint.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint was not part of the pass.
    pub fn joint(&self, id: &JointID) -> Result<&JointKinematics, Error> {
        match self.joints.get(id.index()) {
            Some(Some(k)) => Ok(k),
            _ => Err(Error::MissingJoint { id: *id }),
        }
    }
}

/// The motion of the frame a joint moves relative to. The world frame does not move.
struct ParentMotion {
    transform: Isometry3<f64>,
    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    linear_acceleration: Vector3<f64>,
    angular_acceleration: Vector3<f64>,
}

impl ParentMotion {
    fn world() -> Self {
        Self {
            transform: Isometry3::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            linear_acceleration: Vector3::zeros(),
            angular_acceleration: Vector3::zeros(),
        }
    }

    fn of(kinematics: &JointKinematics) -> Self {
        Self {
            transform: kinematics.transform,
            linear_velocity: kinematics.linear_velocity,
            angular_velocity: kinematics.angular_velocity,
            linear_acceleration: kinematics.linear_acceleration,
            angular_acceleration: kinematics.angular_acceleration,
        }
    }
}

/// Sums the unit twists weighted by the given joint rates into the angular and linear parts.
fn weighted_twist(twists: &[UnitTwist], rates: &[f64]) -> (Vector3<f64>, Vector3<f64>) {
    twists.iter().zip(rates.iter()).fold(
        (Vector3::zeros(), Vector3::zeros()),
        |(angular, linear), (twist, rate)| {
            (angular + twist.angular * *rate, linear + twist.linear * *rate)
        },
    )
}

/// Computes the world pose, velocity and acceleration of every joint reachable from the root.
///
/// The chain is traversed once from the root with every parent visited before its children.
/// The motion of each joint is the motion of its parent plus the motion of its own degrees of
/// freedom, including the Coriolis and centripetal terms caused by the parent's rotation.
///
/// ## Parameters
///
/// * 'chain' - The initialized kinematic chain
/// * 'state' - The configuration, velocity and acceleration of the robot
/// * 'options' - Determines if velocities and accelerations are propagated. Skipped values are zero.
///
/// ## Errors
///
/// * [Error::NotInitialized] - Returned when the chain has not been initialized.
/// * [Error::DimensionMismatch] - Returned when the state does not match the number of degrees of
///   freedom of the chain.
pub fn compute_forward_kinematics(
    chain: &KinematicChain,
    state: &ConfigurationState,
    options: &ModelOptions,
) -> Result<KinematicState, Error> {
    if !chain.is_initialized() {
        return Err(Error::NotInitialized);
    }

    if state.number_dof() != chain.number_dof() {
        warn!(
            "Cannot compute the forward kinematics for a state with {} degrees of freedom on a chain with {}",
            state.number_dof(),
            chain.number_dof()
        );
        return Err(Error::DimensionMismatch {
            expected: chain.number_dof(),
            actual: state.number_dof(),
        });
    }

    let zeros = DVector::zeros(chain.number_dof());
    let q = state.configuration();
    let dq = if options.compute_velocity {
        state.velocity()
    } else {
        &zeros
    };
    let ddq = if options.compute_acceleration {
        state.acceleration()
    } else {
        &zeros
    };

    let mut joints: Vec<Option<JointKinematics>> = vec![None; chain.number_of_joints()];
    for id in chain.traversal_order() {
        let parent = match chain.parent_unchecked(id) {
            Some(p) => match &joints[p.index()] {
                Some(k) => ParentMotion::of(k),
                None => ParentMotion::world(),
            },
            None => ParentMotion::world(),
        };

        let joint = chain.joint_unchecked(id);
        let kind = joint.kind();
        let start = chain.rank_unchecked(id).unwrap_or(0);
        let range = start..start + joint.number_dof();

        let actuated_frame = parent.transform * kind.local_transform(&q.as_slice()[range.clone()]);
        let transform = actuated_frame * joint.placement();
        let anchor = actuated_frame.translation.vector;
        let position = transform.translation.vector;

        let dof_twists: Vec<UnitTwist> = (0..joint.number_dof())
            .map(|dof| kind.unit_twist(dof, &parent.transform.rotation))
            .collect();

        let (w, u) = weighted_twist(&dof_twists, &dq.as_slice()[range.clone()]);
        let (dw, du) = weighted_twist(&dof_twists, &ddq.as_slice()[range]);

        let parent_position = parent.transform.translation.vector;
        let parent_to_anchor = anchor - parent_position;
        let anchor_to_joint = position - anchor;

        let omega_p = parent.angular_velocity;
        let angular_velocity = omega_p + w;
        let anchor_velocity = parent.linear_velocity + omega_p.cross(&parent_to_anchor) + u;
        let linear_velocity = anchor_velocity + angular_velocity.cross(&anchor_to_joint);

        let alpha_p = parent.angular_acceleration;
        let angular_acceleration = alpha_p + dw + omega_p.cross(&w);
        let anchor_acceleration = parent.linear_acceleration
            + alpha_p.cross(&parent_to_anchor)
            + omega_p.cross(&omega_p.cross(&parent_to_anchor))
            + 2.0 * omega_p.cross(&u)
            + du;
        let linear_acceleration = anchor_acceleration
            + angular_acceleration.cross(&anchor_to_joint)
            + angular_velocity.cross(&angular_velocity.cross(&anchor_to_joint));

        let com_offset = transform.rotation * joint.body().center_of_mass();
        let center_of_mass = position + com_offset;
        let center_of_mass_velocity = linear_velocity + angular_velocity.cross(&com_offset);
        let center_of_mass_acceleration = linear_acceleration
            + angular_acceleration.cross(&com_offset)
            + angular_velocity.cross(&angular_velocity.cross(&com_offset));

        trace!("Joint {} at {:?}", joint.name(), position);

        joints[id.index()] = Some(JointKinematics {
            transform,
            anchor,
            dof_twists,
            linear_velocity,
            angular_velocity,
            linear_acceleration,
            angular_acceleration,
            center_of_mass,
            center_of_mass_velocity,
            center_of_mass_acceleration,
        });
    }

    debug!(
        "Computed the forward kinematics for {} joints at state revision {}",
        chain.traversal_order().len(),
        state.revision()
    );

    Ok(KinematicState {
        joints,
        computed_at: state.revision(),
    })
}
