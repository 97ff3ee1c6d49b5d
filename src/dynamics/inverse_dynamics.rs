extern crate nalgebra as na;

use log::debug;
use na::{DVector, Matrix3xX, Vector3};

use crate::{model_elements::chain::KinematicChain, Error};

use super::forward_kinematics::KinematicState;

#[cfg(test)]
#[path = "inverse_dynamics_tests.rs"]
mod inverse_dynamics_tests;

/// The forces and torques that produce the current motion of the robot.
#[derive(Clone, Debug, PartialEq)]
pub struct InverseDynamics {
    /// The force transmitted from the parent to each joint, one column per joint in
    /// configuration order.
    forces: Matrix3xX<f64>,

    /// The torque around the joint anchor transmitted from the parent to each joint, one
    /// column per joint in configuration order.
    torques: Matrix3xX<f64>,

    /// The generalized force for each degree of freedom.
    joint_torques: DVector<f64>,

    computed_at: u64,
}

impl InverseDynamics {
    /// Returns the revision of the configuration state the values were computed for.
    pub fn computed_at(&self) -> u64 {
        self.computed_at
    }

    /// Returns the forces transmitted to each joint, one column per joint in configuration order.
    pub fn forces(&self) -> &Matrix3xX<f64> {
        &self.forces
    }

    /// Returns the generalized force for each degree of freedom.
    pub fn joint_torques(&self) -> &DVector<f64> {
        &self.joint_torques
    }

    /// Returns the torques around the joint anchors transmitted to each joint, one column
    /// per joint in configuration order.
    pub fn torques(&self) -> &Matrix3xX<f64> {
        &self.torques
    }
}

/// Computes the joint forces and torques with the recursive Newton-Euler algorithm in the
/// world frame.
///
/// The forward kinematics provide the accelerations of all bodies. The wrench each body needs
/// to follow its motion against gravity is accumulated from the leaves towards the root. The
/// wrench a joint transmits is the sum of the wrenches of all bodies it carries. Projecting that
/// wrench on the unit twists of the joint gives the generalized forces.
///
/// ## Parameters
///
/// * 'chain' - The initialized kinematic chain
/// * 'kinematics' - The forward kinematics of the chain, including accelerations
/// * 'gravity' - The magnitude of the gravitational acceleration along the negative Z-axis
pub fn compute_inverse_dynamics(
    chain: &KinematicChain,
    kinematics: &KinematicState,
    gravity: f64,
) -> Result<InverseDynamics, Error> {
    let gravity_vector = Vector3::new(0.0, 0.0, -gravity);

    // Force and torque around the joint anchor, indexed by joint ID
    let mut wrenches: Vec<(Vector3<f64>, Vector3<f64>)> =
        vec![(Vector3::zeros(), Vector3::zeros()); chain.number_of_joints()];

    for id in chain.traversal_order().iter().rev() {
        let body = chain.joint(id)?.body();
        let k = kinematics.joint(id)?;

        let inertia = body.rotated_moment_of_inertia(k.rotation());
        let omega = k.angular_velocity();
        let force = (k.center_of_mass_acceleration() - gravity_vector) * body.mass_in_kg();
        let moment = inertia * k.angular_acceleration() + omega.cross(&(inertia * omega));

        let (children_force, children_torque) = wrenches[id.index()];
        let total_force = children_force + force;
        let total_torque =
            children_torque + moment + (k.center_of_mass() - k.anchor()).cross(&force);
        wrenches[id.index()] = (total_force, total_torque);

        if let Some(parent) = chain.parent_unchecked(id) {
            let parent_anchor = kinematics.joint(&parent)?.anchor();
            let lever = k.anchor() - parent_anchor;
            let (parent_force, parent_torque) = wrenches[parent.index()];
            wrenches[parent.index()] = (
                parent_force + total_force,
                parent_torque + total_torque + lever.cross(&total_force),
            );
        }
    }

    let flattened = chain.flattened_joints();
    let mut forces = Matrix3xX::zeros(flattened.len());
    let mut torques = Matrix3xX::zeros(flattened.len());
    let mut joint_torques = DVector::zeros(chain.number_dof());
    for (column, id) in flattened.iter().enumerate() {
        let (force, torque) = wrenches[id.index()];
        forces.set_column(column, &force);
        torques.set_column(column, &torque);

        let rank = chain.rank_in_configuration(id)?;
        for (dof, twist) in kinematics.joint(id)?.dof_twists().iter().enumerate() {
            joint_torques[rank + dof] = twist.angular.dot(&torque) + twist.linear.dot(&force);
        }
    }

    debug!(
        "Computed the inverse dynamics at state revision {}",
        kinematics.computed_at()
    );

    Ok(InverseDynamics {
        forces,
        torques,
        joint_torques,
        computed_at: kinematics.computed_at(),
    })
}
