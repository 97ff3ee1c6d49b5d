extern crate nalgebra as na;

use log::debug;
use na::Vector3;

use crate::{model_elements::chain::KinematicChain, Error};

use super::forward_kinematics::KinematicState;

#[cfg(test)]
#[path = "center_of_mass_tests.rs"]
mod center_of_mass_tests;

/// The whole robot center of mass and momenta, all expressed in the world frame.
///
/// The angular momentum is taken about the center of mass of the robot.
#[derive(Clone, Debug, PartialEq)]
pub struct CenterOfMassDynamics {
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    acceleration: Vector3<f64>,

    linear_momentum: Vector3<f64>,
    linear_momentum_derivative: Vector3<f64>,
    angular_momentum: Vector3<f64>,
    angular_momentum_derivative: Vector3<f64>,

    computed_at: u64,
}

impl CenterOfMassDynamics {
    /// Returns the acceleration of the center of mass.
    pub fn acceleration(&self) -> &Vector3<f64> {
        &self.acceleration
    }

    /// Returns the angular momentum about the center of mass.
    pub fn angular_momentum(&self) -> &Vector3<f64> {
        &self.angular_momentum
    }

    /// Returns the time derivative of the angular momentum about the center of mass.
    pub fn angular_momentum_derivative(&self) -> &Vector3<f64> {
        &self.angular_momentum_derivative
    }

    /// Returns the revision of the configuration state the values were computed for.
    pub fn computed_at(&self) -> u64 {
        self.computed_at
    }

    /// Returns the linear momentum of the robot.
    pub fn linear_momentum(&self) -> &Vector3<f64> {
        &self.linear_momentum
    }

    /// Returns the time derivative of the linear momentum of the robot.
    pub fn linear_momentum_derivative(&self) -> &Vector3<f64> {
        &self.linear_momentum_derivative
    }

    /// Returns the position of the center of mass.
    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    /// Returns the velocity of the center of mass.
    pub fn velocity(&self) -> &Vector3<f64> {
        &self.velocity
    }
}

/// Aggregates the bodies of all joints reachable from the root into the center of mass of the
/// robot and its momenta.
///
/// A robot without mass has its center of mass at the origin of the world.
///
/// ## Parameters
///
/// * 'chain' - The initialized kinematic chain
/// * 'kinematics' - The forward kinematics of the chain
/// * 'compute_momentum' - If false the momenta are left at zero
pub fn compute_center_of_mass_dynamics(
    chain: &KinematicChain,
    kinematics: &KinematicState,
    compute_momentum: bool,
) -> Result<CenterOfMassDynamics, Error> {
    let total_mass = chain.mass();

    let mut weighted_position = Vector3::zeros();
    let mut weighted_velocity = Vector3::zeros();
    let mut weighted_acceleration = Vector3::zeros();
    for id in chain.traversal_order() {
        let mass = chain.joint(id)?.body().mass_in_kg();
        let k = kinematics.joint(id)?;
        weighted_position += k.center_of_mass() * mass;
        weighted_velocity += k.center_of_mass_velocity() * mass;
        weighted_acceleration += k.center_of_mass_acceleration() * mass;
    }

    let (position, velocity, acceleration) = if total_mass > 0.0 {
        (
            weighted_position / total_mass,
            weighted_velocity / total_mass,
            weighted_acceleration / total_mass,
        )
    } else {
        (Vector3::zeros(), Vector3::zeros(), Vector3::zeros())
    };

    let mut result = CenterOfMassDynamics {
        position,
        velocity,
        acceleration,
        linear_momentum: Vector3::zeros(),
        linear_momentum_derivative: Vector3::zeros(),
        angular_momentum: Vector3::zeros(),
        angular_momentum_derivative: Vector3::zeros(),
        computed_at: kinematics.computed_at(),
    };

    if !compute_momentum {
        return Ok(result);
    }

    result.linear_momentum = velocity * total_mass;
    result.linear_momentum_derivative = acceleration * total_mass;

    for id in chain.traversal_order() {
        let body = chain.joint(id)?.body();
        let k = kinematics.joint(id)?;

        let offset = k.center_of_mass() - position;
        let inertia = body.rotated_moment_of_inertia(k.rotation());
        let omega = k.angular_velocity();
        let spin = inertia * omega;

        result.angular_momentum +=
            offset.cross(&(k.center_of_mass_velocity() * body.mass_in_kg())) + spin;
        result.angular_momentum_derivative += offset
            .cross(&(k.center_of_mass_acceleration() * body.mass_in_kg()))
            + inertia * k.angular_acceleration()
            + omega.cross(&spin);
    }

    debug!(
        "Computed the center of mass at {:?} for state revision {}",
        result.position, result.computed_at
    );

    Ok(result)
}
