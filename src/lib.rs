#![warn(missing_docs)]

//! Kinematic and dynamic model of a humanoid (or any tree structured) robot.
//!
//! Provides a model of the jointed rigid-body chain of a robot aimed at calculating the
//! forward kinematics, the center of mass dynamics, the Jacobians and the joint-space inertia
//! matrix of the robot for purposes of whole body control. On top of the generic robot model
//! the [humanoid::HumanoidRobot] adds references to the hands, feet and gaze of a humanoid robot
//! and computes the Zero Momentum Point.
//!
//! The expected order of use is
//!
//! 1. Build a [model_elements::chain::KinematicChain], wrap it in a
//!    [dynamics::robot::DynamicRobot] and call `initialize()`
//! 2. Set the configuration, velocity and acceleration vectors
//! 3. Compute the forward kinematics
//! 4. Compute the quantities that depend on the forward kinematics, e.g. the center of mass
//!    dynamics, Jacobians or the inertia matrix
//! 5. Compute the Zero Momentum Point

use thiserror::Error;

use model_elements::joint::JointID;

/// Defines the ways a degree of freedom can be bounded.
pub mod dof_space;

/// Defines the elements that are used to create a robot model.
pub mod model_elements;

/// Defines the dynamic robot model and the computations on it.
pub mod dynamics;

/// Defines the humanoid specialization of the robot model.
pub mod humanoid;

#[cfg(test)]
mod test_models;

/// Defines the different errors for the humanoid dynamics crate.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a joint with the given ID is not part of the kinematic chain.
    #[error("The joint with ID {id} is not part of the kinematic chain.")]
    MissingJoint {
        /// The ID of the joint that could not be found.
        id: JointID,
    },

    /// Indicates that the joint already has a parent joint.
    #[error("The joint with ID {id} already exists in the kinematic chain.")]
    JointAlreadyExists {
        /// The ID of the joint.
        id: JointID,
    },

    /// Indicates that linking two joints would create a loop in the kinematic chain.
    #[error("Linking the joint with ID {id} would create a cycle in the kinematic chain.")]
    CyclicChain {
        /// The ID of the joint that is an ancestor of the requested parent.
        id: JointID,
    },

    /// Indicates that a joint with a parent was used as the root of the robot.
    #[error("The joint with ID {id} has a parent and cannot be the root of the robot.")]
    InvalidRoot {
        /// The ID of the joint.
        id: JointID,
    },

    /// Indicates that no root joint was set on the kinematic chain.
    #[error("The kinematic chain does not have a root joint.")]
    MissingRoot,

    /// Indicates that there is no path between two joints.
    #[error("There is no path between the joint with ID {from} and the joint with ID {to}.")]
    NotConnected {
        /// The ID of the start joint.
        from: JointID,
        /// The ID of the end joint.
        to: JointID,
    },

    /// Indicates that an index was outside the range of available items.
    #[error("The index {index} is out of range. There are {count} items.")]
    OutOfRange {
        /// The index that was requested.
        index: usize,
        /// The number of items available.
        count: usize,
    },

    /// Indicates that a vector did not have the expected number of elements.
    #[error("Expected a vector with {expected} elements but got {actual} elements.")]
    DimensionMismatch {
        /// The expected number of elements.
        expected: usize,
        /// The actual number of elements.
        actual: usize,
    },

    /// Indicates that an output matrix is too small to store the result.
    #[error("Expected a matrix of at least {rows}x{columns} but got a {actual_rows}x{actual_columns} matrix.")]
    MatrixTooSmall {
        /// The minimum number of rows.
        rows: usize,
        /// The minimum number of columns.
        columns: usize,
        /// The number of rows of the provided matrix.
        actual_rows: usize,
        /// The number of columns of the provided matrix.
        actual_columns: usize,
    },

    /// Indicates that the model must be initialized before the operation can be executed.
    #[error("The model has not been initialized.")]
    NotInitialized,

    /// Indicates that the structure of the model cannot be changed after initialization.
    #[error("The model has already been initialized. The structure can no longer be changed.")]
    AlreadyInitialized,

    /// Indicates that a provided joint order does not contain each joint of the chain exactly once.
    #[error("The joint order is invalid. The joint with ID {id} is missing, duplicated or not part of the chain.")]
    InvalidJointOrder {
        /// The ID of the offending joint.
        id: JointID,
    },

    /// Indicates that a rank in the configuration vector is invalid.
    #[error("The rank {rank} is not a valid rank in a configuration vector with {number_dof} degrees of freedom.")]
    InvalidRank {
        /// The invalid rank.
        rank: usize,
        /// The number of degrees of freedom of the robot.
        number_dof: usize,
    },

    /// Indicates that a quantity was requested before the quantity it depends on was computed.
    #[error("The {quantity} has not been computed.")]
    MissingDependency {
        /// The name of the missing quantity.
        quantity: &'static str,
    },

    /// Indicates that a quantity depends on a computation that is out of date.
    #[error("The {quantity} is out of date with the current state of the robot.")]
    StaleDependency {
        /// The name of the stale quantity.
        quantity: &'static str,
    },

    /// Indicates that the property with the given name is not supported.
    #[error("The property {name} is not supported.")]
    UnsupportedProperty {
        /// The name of the property.
        name: String,
    },

    /// Indicates that the value for a property could not be parsed.
    #[error("The value '{value}' is not valid for the property {name}.")]
    InvalidPropertyValue {
        /// The name of the property.
        name: String,
        /// The value that could not be parsed.
        value: String,
    },

    /// Indicates that the limits of a degree of freedom are not an ordered pair of numbers.
    #[error("The limits [{lower}, {upper}] are invalid. The lower limit must not exceed the upper limit and neither may be NaN.")]
    InvalidDofLimits {
        /// The lower limit.
        lower: f64,
        /// The upper limit.
        upper: f64,
    },

    /// Indicates that the Zero Momentum Point does not exist, e.g. when the robot is in free fall.
    #[error("The Zero Momentum Point is undefined because the vertical ground reaction force is zero.")]
    DegenerateZeroMomentumPoint,
}
