//! Computes the kinematic and dynamic quantities of a robot described by a
//! [KinematicChain](crate::model_elements::chain::KinematicChain).
//!
//! The [DynamicRobot](robot::DynamicRobot) stores the configuration, velocity and acceleration
//! of the robot and the results of the different computations. The computations depend on
//! each other. The forward kinematics need to be computed after each change of the state, and
//! before any of the center of mass dynamics, Jacobians, inertia matrix or inverse dynamics
//! can be computed.

/// Defines the typed options that enable or disable parts of the computations.
pub mod options;

/// Stores the configuration, velocity and acceleration vectors of a robot.
pub mod configuration;

/// Propagates the state of the robot down the kinematic chain.
pub mod forward_kinematics;

/// Aggregates the bodies of the robot into the center of mass and the momenta.
pub mod center_of_mass;

/// Computes the Jacobians between joints and for the center of mass.
pub mod jacobian;

/// Computes the joint space inertia matrix.
pub mod inertia_matrix;

/// Computes the joint forces and torques for the current motion.
pub mod inverse_dynamics;

/// Defines the robot model that ties the computations together.
pub mod robot;
