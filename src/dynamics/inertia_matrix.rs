extern crate nalgebra as na;

use log::debug;
use na::DMatrix;

use crate::{model_elements::chain::KinematicChain, Error};

use super::{forward_kinematics::KinematicState, jacobian::body_columns};

#[cfg(test)]
#[path = "inertia_matrix_tests.rs"]
mod inertia_matrix_tests;

/// Computes the n x n joint space inertia matrix of the robot, with n the number of degrees of
/// freedom.
///
/// Each body contributes `J^T * diag(m * I, I_world) * J` where `J` is the Jacobian of the
/// center of mass of the body with respect to the full configuration vector. Only the columns of
/// the joint and its ancestors are non-zero, so only those pairs are visited. The upper triangle
/// is accumulated and then mirrored which makes the result exactly symmetric.
///
/// ## Parameters
///
/// * 'chain' - The initialized kinematic chain
/// * 'kinematics' - The forward kinematics of the chain
pub fn compute_inertia_matrix(
    chain: &KinematicChain,
    kinematics: &KinematicState,
) -> Result<DMatrix<f64>, Error> {
    let n = chain.number_dof();
    let mut result = DMatrix::zeros(n, n);

    for id in chain.traversal_order() {
        let body = chain.joint(id)?.body();
        let k = kinematics.joint(id)?;
        let mass = body.mass_in_kg();
        let inertia = body.rotated_moment_of_inertia(k.rotation());

        let columns = body_columns(chain, kinematics, id, k.center_of_mass())?;
        for first in columns.iter() {
            let spin = inertia * first.angular;
            for second in columns.iter() {
                if second.column < first.column {
                    continue;
                }

                result[(first.column, second.column)] +=
                    mass * first.linear.dot(&second.linear) + spin.dot(&second.angular);
            }
        }
    }

    for row in 0..n {
        for column in 0..row {
            result[(row, column)] = result[(column, row)];
        }
    }

    debug!(
        "Computed the {}x{} inertia matrix at state revision {}",
        n,
        n,
        kinematics.computed_at()
    );

    Ok(result)
}
