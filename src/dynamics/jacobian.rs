//! Jacobians map the velocity of the degrees of freedom of a robot to the linear and angular
//! velocity of a point on the robot.
//!
//! ## Column layout
//!
//! The columns of a Jacobian between two joints follow the configuration vector, except for the
//! degrees of freedom of a free-flyer root. Those never move one joint relative to another, so
//! they are left out. Optionally six leading columns describe a virtual free-flyer placed at the
//! start joint, three translations followed by three rotations around the world axes.
//!
//! For a robot with a free-flyer root and the virtual free-flyer included the Jacobian has
//! exactly one column per degree of freedom.
//!
//! ## Rows
//!
//! A full Jacobian has six rows. The first three rows map to the linear velocity of the point,
//! the last three rows map to the angular velocity of the end joint.

extern crate nalgebra as na;

use log::warn;
use na::{DMatrix, Matrix3xX, Vector3};

use crate::{
    model_elements::{
        chain::KinematicChain,
        joint::{JointID, FREE_FLYER_DOF},
    },
    Error,
};

use super::forward_kinematics::KinematicState;

#[cfg(test)]
#[path = "jacobian_tests.rs"]
mod jacobian_tests;

/// Selects the rows of a Jacobian that are computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JacobianRows {
    /// Three rows for the linear velocity followed by three rows for the angular velocity.
    Full,

    /// Three rows for the linear velocity.
    Position,

    /// Three rows for the angular velocity.
    Orientation,
}

impl JacobianRows {
    /// Returns the number of rows.
    pub fn count(&self) -> usize {
        match self {
            JacobianRows::Full => 6,
            JacobianRows::Position | JacobianRows::Orientation => 3,
        }
    }
}

/// A single column of a Jacobian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct JacobianColumn {
    pub column: usize,
    pub angular: Vector3<f64>,
    pub linear: Vector3<f64>,
}

/// Returns the column for the degree of freedom with the given rank, not counting a virtual
/// free-flyer or an offset.
pub(crate) fn column_of_rank(chain: &KinematicChain, rank: usize) -> usize {
    match chain.root_free_flyer_ranks() {
        Some(ranks) if rank >= ranks.end => rank - FREE_FLYER_DOF,
        _ => rank,
    }
}

/// Returns the number of columns of a Jacobian between two joints.
///
/// ## Parameters
///
/// * 'chain' - The initialized kinematic chain
/// * 'include_free_flyer' - Indicates if the six columns of a virtual free-flyer are included
pub fn jacobian_width(chain: &KinematicChain, include_free_flyer: bool) -> usize {
    let root_dof = match chain.root_free_flyer_ranks() {
        Some(_) => FREE_FLYER_DOF,
        None => 0,
    };
    let virtual_dof = if include_free_flyer { FREE_FLYER_DOF } else { 0 };

    chain.number_dof() - root_dof + virtual_dof
}

/// Returns the columns for a point attached to the end joint, for the joints on the path from
/// the start joint to the end joint.
///
/// Joints between the start joint and the common ancestor move the start joint and contribute
/// negatively. The degrees of freedom of the common ancestor move both ends and do not contribute.
pub(crate) fn path_columns(
    chain: &KinematicChain,
    kinematics: &KinematicState,
    start: &JointID,
    end: &JointID,
    point: &Vector3<f64>,
) -> Result<Vec<JacobianColumn>, Error> {
    let path = chain.path_between(start, end)?;

    let signed_joints = path
        .start_side
        .iter()
        .map(|id| (id, -1.0))
        .chain(path.end_side.iter().map(|id| (id, 1.0)));

    let mut result = Vec::new();
    for (id, sign) in signed_joints {
        let k = kinematics.joint(id)?;
        let rank = chain.rank_in_configuration(id)?;
        let lever = point - k.anchor();
        for (dof, twist) in k.dof_twists().iter().enumerate() {
            result.push(JacobianColumn {
                column: column_of_rank(chain, rank + dof),
                angular: twist.angular * sign,
                linear: (twist.linear + twist.angular.cross(&lever)) * sign,
            });
        }
    }

    Ok(result)
}

/// Returns the columns with respect to the full configuration vector for a point attached to
/// the given joint, i.e. the columns of the joint and all its ancestors. The column of each
/// degree of freedom is its rank.
pub(crate) fn body_columns(
    chain: &KinematicChain,
    kinematics: &KinematicState,
    body: &JointID,
    point: &Vector3<f64>,
) -> Result<Vec<JacobianColumn>, Error> {
    let mut result = Vec::new();
    let mut current = Some(*body);
    while let Some(id) = current {
        let k = kinematics.joint(&id)?;
        let rank = chain.rank_in_configuration(&id)?;
        let lever = point - k.anchor();
        for (dof, twist) in k.dof_twists().iter().enumerate() {
            result.push(JacobianColumn {
                column: rank + dof,
                angular: twist.angular,
                linear: twist.linear + twist.angular.cross(&lever),
            });
        }

        current = chain.parent_unchecked(&id);
    }

    Ok(result)
}

/// Returns the columns of a virtual free-flyer at the given position for the given point.
fn free_flyer_columns(origin: &Vector3<f64>, point: &Vector3<f64>) -> Vec<JacobianColumn> {
    let lever = point - origin;
    (0..FREE_FLYER_DOF)
        .map(|dof| {
            if dof < 3 {
                JacobianColumn {
                    column: dof,
                    angular: Vector3::zeros(),
                    linear: Vector3::ith(dof, 1.0),
                }
            } else {
                let axis = Vector3::ith(dof - 3, 1.0);
                JacobianColumn {
                    column: dof,
                    angular: axis,
                    linear: axis.cross(&lever),
                }
            }
        })
        .collect()
}

fn check_output_size(output: &DMatrix<f64>, rows: usize, columns: usize) -> Result<(), Error> {
    if output.nrows() < rows || output.ncols() < columns {
        warn!(
            "Jacobian output of {}x{} is smaller than the required {}x{}",
            output.nrows(),
            output.ncols(),
            rows,
            columns
        );
        return Err(Error::MatrixTooSmall {
            rows,
            columns,
            actual_rows: output.nrows(),
            actual_columns: output.ncols(),
        });
    }

    Ok(())
}

/// Clears the output block and adds the columns to it.
///
/// Columns of the path are shifted by the virtual free-flyer when it is included.
fn write_columns(
    output: &mut DMatrix<f64>,
    rows: JacobianRows,
    offset: usize,
    width: usize,
    free_flyer: &[JacobianColumn],
    path: &[(JacobianColumn, f64)],
) {
    output.view_mut((0, offset), (rows.count(), width)).fill(0.0);

    let shift = free_flyer.len();
    let all = free_flyer
        .iter()
        .map(|c| (c.column, c, 1.0))
        .chain(path.iter().map(|(c, weight)| (c.column + shift, c, *weight)));

    for (column, c, weight) in all {
        let column = offset + column;
        let (linear_row, angular_row) = match rows {
            JacobianRows::Full => (Some(0), Some(3)),
            JacobianRows::Position => (Some(0), None),
            JacobianRows::Orientation => (None, Some(0)),
        };

        for axis in 0..3 {
            if let Some(row) = linear_row {
                output[(row + axis, column)] += c.linear[axis] * weight;
            }
            if let Some(row) = angular_row {
                output[(row + axis, column)] += c.angular[axis] * weight;
            }
        }
    }
}

/// Computes the Jacobian of a point attached to the end joint relative to the start joint.
///
/// The Jacobian maps the velocity of the degrees of freedom to the linear velocity of the
/// point and the angular velocity of the end joint relative to the start joint, expressed in
/// the world frame. The columns are written starting at the given column offset. Columns of
/// degrees of freedom that are not on the path are set to zero.
///
/// ## Parameters
///
/// * 'chain' - The initialized kinematic chain
/// * 'kinematics' - The forward kinematics of the chain
/// * 'start' - The joint the velocity is measured relative to
/// * 'end' - The joint the point is attached to
/// * 'local_point' - The point in the frame of the end joint
/// * 'output' - The matrix the Jacobian is written to
/// * 'offset' - The first column that is written
/// * 'include_free_flyer' - Indicates if six leading columns for a virtual free-flyer at the
///   start joint are written
/// * 'rows' - Selects the rows that are written
///
/// ## Errors
///
/// * [Error::MissingJoint] - Returned when either joint is not part of the kinematics.
/// * [Error::NotConnected] - Returned when the joints are not connected.
/// * [Error::MatrixTooSmall] - Returned when the output matrix cannot hold the result. Nothing
///   is written to the matrix.
#[allow(clippy::too_many_arguments)]
pub fn compute_jacobian(
    chain: &KinematicChain,
    kinematics: &KinematicState,
    start: &JointID,
    end: &JointID,
    local_point: &Vector3<f64>,
    output: &mut DMatrix<f64>,
    offset: usize,
    include_free_flyer: bool,
    rows: JacobianRows,
) -> Result<(), Error> {
    let start_kinematics = kinematics.joint(start)?;
    let point = kinematics.joint(end)?.transform() * na::Point3::from(*local_point);

    let path: Vec<(JacobianColumn, f64)> =
        path_columns(chain, kinematics, start, end, &point.coords)?
            .into_iter()
            .map(|c| (c, 1.0))
            .collect();
    let free_flyer = if include_free_flyer {
        free_flyer_columns(&start_kinematics.position(), &point.coords)
    } else {
        Vec::new()
    };

    let width = jacobian_width(chain, include_free_flyer);
    check_output_size(output, rows.count(), offset + width)?;
    write_columns(output, rows, offset, width, &free_flyer, &path);

    Ok(())
}

/// Computes the position Jacobian of the center of mass of the robot relative to the start
/// joint.
///
/// The Jacobian is the mass weighted sum of the position Jacobians of the center of mass of each
/// body. It has three rows and the same column layout as [compute_jacobian()].
///
/// ## Errors
///
/// * [Error::MissingJoint] - Returned when the start joint is not part of the kinematics.
/// * [Error::MatrixTooSmall] - Returned when the output matrix cannot hold the result. Nothing
///   is written to the matrix.
pub fn compute_center_of_mass_jacobian_between(
    chain: &KinematicChain,
    kinematics: &KinematicState,
    start: &JointID,
    output: &mut DMatrix<f64>,
    offset: usize,
    include_free_flyer: bool,
) -> Result<(), Error> {
    let start_kinematics = kinematics.joint(start)?;
    let total_mass = chain.mass();

    let mut center_of_mass = Vector3::zeros();
    let mut path = Vec::new();
    for id in chain.traversal_order() {
        let mass = chain.joint(id)?.body().mass_in_kg();
        if mass <= 0.0 {
            continue;
        }

        let body_com = kinematics.joint(id)?.center_of_mass();
        center_of_mass += body_com * (mass / total_mass);
        for column in path_columns(chain, kinematics, start, id, body_com)? {
            path.push((column, mass / total_mass));
        }
    }

    let free_flyer = if include_free_flyer {
        free_flyer_columns(&start_kinematics.position(), &center_of_mass)
    } else {
        Vec::new()
    };

    let width = jacobian_width(chain, include_free_flyer);
    check_output_size(output, 3, offset + width)?;
    write_columns(
        output,
        JacobianRows::Position,
        offset,
        width,
        &free_flyer,
        &path,
    );

    Ok(())
}

/// Computes the 3 x n position Jacobian of the center of mass of the robot with respect to the
/// full configuration vector.
///
/// Unlike [compute_jacobian()] the columns of a free-flyer root are included, so the Jacobian
/// times the velocity vector is the velocity of the center of mass.
pub fn compute_center_of_mass_jacobian(
    chain: &KinematicChain,
    kinematics: &KinematicState,
) -> Result<Matrix3xX<f64>, Error> {
    let mut result = Matrix3xX::zeros(chain.number_dof());
    let total_mass = chain.mass();
    if total_mass <= 0.0 {
        return Ok(result);
    }

    for id in chain.traversal_order() {
        let mass = chain.joint(id)?.body().mass_in_kg();
        if mass <= 0.0 {
            continue;
        }

        let body_com = kinematics.joint(id)?.center_of_mass();
        for c in body_columns(chain, kinematics, id, body_com)? {
            let mut column = result.column_mut(c.column);
            column += c.linear * (mass / total_mass);
        }
    }

    Ok(result)
}
