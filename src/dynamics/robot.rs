extern crate nalgebra as na;

use log::{debug, info, warn};
use na::{DMatrix, DVector, Matrix3xX, Vector3};

use crate::{
    model_elements::{chain::KinematicChain, fixed_joints::FixedJointSet, joint::JointID},
    Error,
};

use super::{
    center_of_mass::{compute_center_of_mass_dynamics, CenterOfMassDynamics},
    configuration::ConfigurationState,
    forward_kinematics::{compute_forward_kinematics, JointKinematics, KinematicState},
    inertia_matrix::compute_inertia_matrix,
    inverse_dynamics::{compute_inverse_dynamics, InverseDynamics},
    jacobian::{
        compute_center_of_mass_jacobian, compute_center_of_mass_jacobian_between,
        compute_jacobian, JacobianRows,
    },
    options::ModelOptions,
};

#[cfg(test)]
#[path = "robot_tests.rs"]
mod robot_tests;

const FORWARD_KINEMATICS: &str = "forward kinematics";
const CENTER_OF_MASS_DYNAMICS: &str = "center of mass dynamics";
const CENTER_OF_MASS_JACOBIAN: &str = "center of mass Jacobian";
const INERTIA_MATRIX: &str = "inertia matrix";
const INVERSE_DYNAMICS: &str = "inverse dynamics";

/// A computed value together with the state revision it was computed for.
#[derive(Clone, Debug, PartialEq)]
struct Computed<T> {
    value: T,
    computed_at: u64,
}

/// Defines the kinematic and dynamic model of a robot.
///
/// The robot owns its [KinematicChain], the current configuration, velocity and acceleration,
/// and the results of the computations on them. The computations need to be triggered in
/// dependency order
///
/// 1. [DynamicRobot::compute_forward_kinematics()] after each change of the state
/// 2. [DynamicRobot::compute_center_of_mass_dynamics()], [DynamicRobot::compute_jacobian_center_of_mass()],
///    [DynamicRobot::compute_inertia_matrix()] and [DynamicRobot::compute_inverse_dynamics()],
///    as well as the Jacobian queries, in any order
///
/// Computations that depend on the forward kinematics fail with [Error::MissingDependency]
/// if the forward kinematics were never computed, and with [Error::StaleDependency] if the
/// state changed since. The query methods return the last computed values.
pub struct DynamicRobot {
    chain: KinematicChain,
    options: ModelOptions,
    state: ConfigurationState,
    fixed_joints: FixedJointSet,

    /// The actuated ranks provided by the user, validated during initialization.
    requested_actuated_joints: Option<Vec<usize>>,
    actuated_joints: Vec<usize>,
    is_initialized: bool,

    kinematics: Option<KinematicState>,
    center_of_mass: Option<CenterOfMassDynamics>,
    center_of_mass_jacobian: Option<Computed<Matrix3xX<f64>>>,
    inertia_matrix: Option<Computed<DMatrix<f64>>>,
    inverse_dynamics: Option<InverseDynamics>,
}

impl DynamicRobot {
    /// Returns the acceleration vector.
    pub fn acceleration(&self) -> &DVector<f64> {
        self.state.acceleration()
    }

    /// Returns the ranks of the degrees of freedom that are actuated.
    pub fn actuated_joints(&self) -> &[usize] {
        &self.actuated_joints
    }

    /// Marks the joint as fixed to the world. Marking a fixed joint again has no effect.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the chain.
    pub fn add_fixed_joint(&mut self, id: &JointID) -> Result<(), Error> {
        self.chain.joint(id)?;
        self.fixed_joints.add(*id);
        Ok(())
    }

    /// Returns the angular momentum about the center of mass.
    pub fn angular_momentum(&self) -> Result<&Vector3<f64>, Error> {
        Ok(self.center_of_mass_dynamics()?.angular_momentum())
    }

    /// Returns the time derivative of the angular momentum about the center of mass.
    pub fn angular_momentum_derivative(&self) -> Result<&Vector3<f64>, Error> {
        Ok(self.center_of_mass_dynamics()?.angular_momentum_derivative())
    }

    /// Returns the position of the center of mass in the world frame.
    pub fn center_of_mass(&self) -> Result<&Vector3<f64>, Error> {
        Ok(self.center_of_mass_dynamics()?.position())
    }

    /// Returns the acceleration of the center of mass in the world frame.
    pub fn center_of_mass_acceleration(&self) -> Result<&Vector3<f64>, Error> {
        Ok(self.center_of_mass_dynamics()?.acceleration())
    }

    /// Returns the last computed center of mass dynamics.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the center of mass dynamics were never computed.
    pub fn center_of_mass_dynamics(&self) -> Result<&CenterOfMassDynamics, Error> {
        self.center_of_mass.as_ref().ok_or(Error::MissingDependency {
            quantity: CENTER_OF_MASS_DYNAMICS,
        })
    }

    /// Returns the velocity of the center of mass in the world frame.
    pub fn center_of_mass_velocity(&self) -> Result<&Vector3<f64>, Error> {
        Ok(self.center_of_mass_dynamics()?.velocity())
    }

    /// Returns the kinematic chain of the robot.
    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    /// Removes all joints from the set of fixed joints.
    pub fn clear_fixed_joints(&mut self) {
        self.fixed_joints.clear();
    }

    /// Computes the center of mass of the robot, its velocity and acceleration and the linear
    /// and angular momenta with their derivatives.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the forward kinematics were never computed.
    /// * [Error::StaleDependency] - Returned when the state changed after the forward kinematics.
    pub fn compute_center_of_mass_dynamics(&mut self) -> Result<(), Error> {
        let kinematics = self.fresh_kinematics()?;
        let result =
            compute_center_of_mass_dynamics(&self.chain, kinematics, self.options.compute_momentum)?;
        self.center_of_mass = Some(result);
        Ok(())
    }

    /// Computes the joint space inertia matrix.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the forward kinematics were never computed.
    /// * [Error::StaleDependency] - Returned when the state changed after the forward kinematics.
    pub fn compute_inertia_matrix(&mut self) -> Result<(), Error> {
        let kinematics = self.fresh_kinematics()?;
        let value = compute_inertia_matrix(&self.chain, kinematics)?;
        self.inertia_matrix = Some(Computed {
            value,
            computed_at: kinematics.computed_at(),
        });
        Ok(())
    }

    /// Computes the forces and torques in the joints that produce the current acceleration,
    /// including gravity.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the forward kinematics were never computed.
    /// * [Error::StaleDependency] - Returned when the state changed after the forward kinematics.
    pub fn compute_inverse_dynamics(&mut self) -> Result<(), Error> {
        let kinematics = self.fresh_kinematics()?;
        let result = compute_inverse_dynamics(&self.chain, kinematics, self.options.gravity)?;
        self.inverse_dynamics = Some(result);
        Ok(())
    }

    /// Computes the forward kinematics for the current state.
    ///
    /// On failure the previously computed kinematics are kept.
    ///
    /// ## Errors
    ///
    /// * [Error::NotInitialized] - Returned when the robot has not been initialized.
    pub fn compute_forward_kinematics(&mut self) -> Result<(), Error> {
        self.ensure_initialized()?;
        let kinematics = compute_forward_kinematics(&self.chain, &self.state, &self.options)?;
        self.kinematics = Some(kinematics);
        Ok(())
    }

    /// Computes the 3 x n Jacobian of the center of mass with respect to the full configuration
    /// vector.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the forward kinematics were never computed.
    /// * [Error::StaleDependency] - Returned when the state changed after the forward kinematics.
    pub fn compute_jacobian_center_of_mass(&mut self) -> Result<(), Error> {
        let kinematics = self.fresh_kinematics()?;
        let value = compute_center_of_mass_jacobian(&self.chain, kinematics)?;
        self.center_of_mass_jacobian = Some(Computed {
            value,
            computed_at: kinematics.computed_at(),
        });
        Ok(())
    }

    /// Returns the configuration vector.
    pub fn configuration(&self) -> &DVector<f64> {
        self.state.configuration()
    }

    /// Returns the number of fixed joints.
    pub fn count_fixed_joints(&self) -> usize {
        self.fixed_joints.count()
    }

    /// Returns the forces transmitted to each joint, one column per joint in configuration order.
    pub fn current_forces(&self) -> Result<&Matrix3xX<f64>, Error> {
        Ok(self.last_inverse_dynamics()?.forces())
    }

    /// Returns the torques around the joint anchors transmitted to each joint, one column per
    /// joint in configuration order.
    pub fn current_torques(&self) -> Result<&Matrix3xX<f64>, Error> {
        Ok(self.last_inverse_dynamics()?.torques())
    }

    /// Returns the (lower, upper) bounds of the degree of freedom at the given rank.
    pub fn dof_bounds(&self, rank: usize) -> Result<(f64, f64), Error> {
        self.chain.dof_bounds(rank)
    }

    /// Returns the (lower, upper) bounds of the degree of freedom at the given rank relative to
    /// a reference configuration. See [KinematicChain::dof_bounds_with_reference()].
    pub fn dof_bounds_with_reference(
        &self,
        rank: usize,
        reference: &DVector<f64>,
    ) -> Result<(f64, f64), Error> {
        self.chain.dof_bounds_with_reference(rank, reference)
    }

    fn ensure_initialized(&self) -> Result<(), Error> {
        if !self.is_initialized {
            return Err(Error::NotInitialized);
        }

        Ok(())
    }

    fn ensure_not_initialized(&self) -> Result<(), Error> {
        if self.is_initialized {
            return Err(Error::AlreadyInitialized);
        }

        Ok(())
    }

    /// Returns the fixed joint at the given position in the set of fixed joints.
    ///
    /// ## Errors
    ///
    /// * [Error::OutOfRange] - Returned when the rank is not smaller than [DynamicRobot::count_fixed_joints()].
    pub fn fixed_joint(&self, rank: usize) -> Result<&JointID, Error> {
        self.fixed_joints.at(rank)
    }

    /// Returns the set of fixed joints.
    pub fn fixed_joints(&self) -> &FixedJointSet {
        &self.fixed_joints
    }

    /// Returns the forward kinematics if they were computed for the current state.
    pub(crate) fn fresh_kinematics(&self) -> Result<&KinematicState, Error> {
        match &self.kinematics {
            None => Err(Error::MissingDependency {
                quantity: FORWARD_KINEMATICS,
            }),
            Some(k) if k.computed_at() != self.state.revision() => Err(Error::StaleDependency {
                quantity: FORWARD_KINEMATICS,
            }),
            Some(k) => Ok(k),
        }
    }

    /// Returns the center of mass dynamics if they were computed for the current state.
    pub(crate) fn fresh_center_of_mass_dynamics(&self) -> Result<&CenterOfMassDynamics, Error> {
        let result = self.center_of_mass_dynamics()?;
        if result.computed_at() != self.state.revision() {
            return Err(Error::StaleDependency {
                quantity: CENTER_OF_MASS_DYNAMICS,
            });
        }

        Ok(result)
    }

    /// Returns the last computed joint space inertia matrix.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the inertia matrix was never computed.
    pub fn inertia_matrix(&self) -> Result<&DMatrix<f64>, Error> {
        match &self.inertia_matrix {
            Some(c) => Ok(&c.value),
            None => Err(Error::MissingDependency {
                quantity: INERTIA_MATRIX,
            }),
        }
    }

    /// Finalizes the structure of the robot.
    ///
    /// Initializes the kinematic chain, sizes the state vectors to the number of degrees of
    /// freedom and resolves the actuated joints. Without an explicit list of actuated ranks
    /// the degrees of freedom of all joints flagged as actuated are used. Calling this method
    /// on an initialized robot has no effect.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingRoot] - Returned when the chain has no root joint.
    /// * [Error::InvalidJointOrder] - Returned when the configured joint order is invalid.
    /// * [Error::InvalidRank] - Returned when an actuated rank is not a valid rank or is listed
    ///   more than once.
    pub fn initialize(&mut self) -> Result<(), Error> {
        if self.is_initialized {
            return Ok(());
        }

        // A failure must leave the chain open for structural changes.
        let mut chain = self.chain.clone();
        chain.initialize()?;
        let number_dof = chain.number_dof();

        let actuated_joints = match &self.requested_actuated_joints {
            Some(ranks) => {
                for (index, rank) in ranks.iter().enumerate() {
                    if *rank >= number_dof || ranks[..index].contains(rank) {
                        warn!(
                            "Rejecting actuated rank {} for a robot with {} degrees of freedom",
                            rank, number_dof
                        );
                        return Err(Error::InvalidRank {
                            rank: *rank,
                            number_dof,
                        });
                    }
                }
                ranks.clone()
            }
            None => {
                let mut ranks = Vec::new();
                for id in chain.flattened_joints() {
                    let joint = chain.joint(id)?;
                    if joint.is_actuated() {
                        let start = chain.rank_in_configuration(id)?;
                        ranks.extend(start..start + joint.number_dof());
                    }
                }
                ranks
            }
        };

        self.chain = chain;
        self.state = ConfigurationState::new(number_dof);
        self.actuated_joints = actuated_joints;
        self.is_initialized = true;

        self.log_summary();
        Ok(())
    }

    /// Returns a value indicating whether the robot has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Returns a value indicating whether the property with the given name is supported.
    /// See [ModelOptions::is_supported()].
    pub fn is_supported(&self, name: &str) -> bool {
        self.options.is_supported(name)
    }

    /// Writes the Jacobian of a point attached to the end joint relative to the start joint
    /// into the output matrix. See [compute_jacobian()] for the layout.
    ///
    /// ## Parameters
    ///
    /// * 'start' - The joint the velocity is measured relative to
    /// * 'end' - The joint the point is attached to
    /// * 'local_point' - The point in the frame of the end joint
    /// * 'output' - The matrix the Jacobian is written to. It needs at least 6 rows.
    /// * 'offset' - The first column that is written
    /// * 'include_free_flyer' - Indicates if six leading columns for a virtual free-flyer at the
    ///   start joint are written
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the forward kinematics were never computed.
    /// * [Error::StaleDependency] - Returned when the state changed after the forward kinematics.
    /// * [Error::NotConnected] - Returned when the joints are not connected.
    /// * [Error::MatrixTooSmall] - Returned when the output matrix cannot hold the result.
    pub fn jacobian(
        &self,
        start: &JointID,
        end: &JointID,
        local_point: &Vector3<f64>,
        output: &mut DMatrix<f64>,
        offset: usize,
        include_free_flyer: bool,
    ) -> Result<(), Error> {
        compute_jacobian(
            &self.chain,
            self.fresh_kinematics()?,
            start,
            end,
            local_point,
            output,
            offset,
            include_free_flyer,
            JacobianRows::Full,
        )
    }

    /// Returns the last computed 3 x n Jacobian of the center of mass.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the Jacobian was never computed.
    pub fn jacobian_center_of_mass(&self) -> Result<&Matrix3xX<f64>, Error> {
        match &self.center_of_mass_jacobian {
            Some(c) => Ok(&c.value),
            None => Err(Error::MissingDependency {
                quantity: CENTER_OF_MASS_JACOBIAN,
            }),
        }
    }

    /// Writes the position Jacobian of the center of mass relative to the start joint into the
    /// output matrix. The output needs at least 3 rows.
    pub fn jacobian_center_of_mass_between(
        &self,
        start: &JointID,
        output: &mut DMatrix<f64>,
        offset: usize,
        include_free_flyer: bool,
    ) -> Result<(), Error> {
        compute_center_of_mass_jacobian_between(
            &self.chain,
            self.fresh_kinematics()?,
            start,
            output,
            offset,
            include_free_flyer,
        )
    }

    /// Returns the last computed kinematics of the given joint.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingDependency] - Returned when the forward kinematics were never computed.
    /// * [Error::MissingJoint] - Returned when the joint is not reachable from the root.
    pub fn joint_kinematics(&self, id: &JointID) -> Result<&JointKinematics, Error> {
        match &self.kinematics {
            Some(k) => k.joint(id),
            None => Err(Error::MissingDependency {
                quantity: FORWARD_KINEMATICS,
            }),
        }
    }

    /// Returns the generalized forces for each degree of freedom.
    pub fn joint_torques(&self) -> Result<&DVector<f64>, Error> {
        Ok(self.last_inverse_dynamics()?.joint_torques())
    }

    /// Returns all joints of the robot in configuration order.
    pub fn joint_vector(&self) -> &[JointID] {
        self.chain.flattened_joints()
    }

    /// Returns the joints on the path from the start joint to the end joint.
    pub fn joints_between(&self, start: &JointID, end: &JointID) -> Result<Vec<JointID>, Error> {
        self.chain.joints_between(start, end)
    }

    fn last_inverse_dynamics(&self) -> Result<&InverseDynamics, Error> {
        self.inverse_dynamics
            .as_ref()
            .ok_or(Error::MissingDependency {
                quantity: INVERSE_DYNAMICS,
            })
    }

    /// Returns the linear momentum of the robot.
    pub fn linear_momentum(&self) -> Result<&Vector3<f64>, Error> {
        Ok(self.center_of_mass_dynamics()?.linear_momentum())
    }

    /// Returns the time derivative of the linear momentum of the robot.
    pub fn linear_momentum_derivative(&self) -> Result<&Vector3<f64>, Error> {
        Ok(self.center_of_mass_dynamics()?.linear_momentum_derivative())
    }

    #[cfg_attr(test, mutants::skip)] // Only writes to the log
    fn log_summary(&self) {
        info!(
            "Initialized robot with {} joints and {} degrees of freedom",
            self.chain.flattened_joints().len(),
            self.chain.number_dof()
        );
        debug!(
            "Actuated ranks {:?}, total mass {} kg",
            self.actuated_joints,
            self.chain.mass()
        );
    }

    /// Returns the total mass of the robot in kg.
    pub fn mass(&self) -> f64 {
        self.chain.mass()
    }

    /// Creates a new robot for the given chain with the default options.
    pub fn new(chain: KinematicChain) -> Self {
        Self::with_options(chain, ModelOptions::default())
    }

    /// Returns the number of degrees of freedom of the robot.
    pub fn number_dof(&self) -> usize {
        self.chain.number_dof()
    }

    /// Returns the options of the robot.
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Writes the orientation Jacobian of the end joint relative to the start joint into the
    /// output matrix. The output needs at least 3 rows.
    pub fn orientation_jacobian(
        &self,
        start: &JointID,
        end: &JointID,
        output: &mut DMatrix<f64>,
        offset: usize,
        include_free_flyer: bool,
    ) -> Result<(), Error> {
        compute_jacobian(
            &self.chain,
            self.fresh_kinematics()?,
            start,
            end,
            &Vector3::zeros(),
            output,
            offset,
            include_free_flyer,
            JacobianRows::Orientation,
        )
    }

    /// Writes the position Jacobian of a point attached to the end joint relative to the start
    /// joint into the output matrix. The output needs at least 3 rows.
    pub fn position_jacobian(
        &self,
        start: &JointID,
        end: &JointID,
        local_point: &Vector3<f64>,
        output: &mut DMatrix<f64>,
        offset: usize,
        include_free_flyer: bool,
    ) -> Result<(), Error> {
        compute_jacobian(
            &self.chain,
            self.fresh_kinematics()?,
            start,
            end,
            local_point,
            output,
            offset,
            include_free_flyer,
            JacobianRows::Position,
        )
    }

    /// Returns the value of the property with the given name. See [ModelOptions::property()].
    pub fn property(&self, name: &str) -> Option<String> {
        self.options.property(name)
    }

    /// Removes the joint from the set of fixed joints. Removing a joint that is not fixed has
    /// no effect.
    pub fn remove_fixed_joint(&mut self, id: &JointID) {
        self.fixed_joints.remove(id);
    }

    /// Returns the root joint of the robot.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingRoot] - Returned when no root joint was set.
    pub fn root_joint(&self) -> Result<&JointID, Error> {
        self.chain.root().ok_or(Error::MissingRoot)
    }

    /// Sets the acceleration vector.
    ///
    /// ## Errors
    ///
    /// * [Error::NotInitialized] - Returned when the robot has not been initialized.
    /// * [Error::DimensionMismatch] - Returned when the vector does not have
    ///   [DynamicRobot::number_dof()] elements.
    pub fn set_acceleration(&mut self, acceleration: &DVector<f64>) -> Result<(), Error> {
        self.ensure_initialized()?;
        self.state.set_acceleration(acceleration)
    }

    /// Sets the ranks of the actuated degrees of freedom.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the robot has been initialized.
    pub fn set_actuated_joints(&mut self, ranks: Vec<usize>) -> Result<(), Error> {
        self.ensure_not_initialized()?;
        self.requested_actuated_joints = Some(ranks);
        Ok(())
    }

    /// Sets the configuration vector.
    ///
    /// ## Errors
    ///
    /// * [Error::NotInitialized] - Returned when the robot has not been initialized.
    /// * [Error::DimensionMismatch] - Returned when the vector does not have
    ///   [DynamicRobot::number_dof()] elements.
    pub fn set_configuration(&mut self, configuration: &DVector<f64>) -> Result<(), Error> {
        self.ensure_initialized()?;
        self.state.set_configuration(configuration)
    }

    /// Sets the order of the joints in the configuration vector.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the robot has been initialized.
    pub fn set_joint_order_in_config(&mut self, order: Vec<JointID>) -> Result<(), Error> {
        self.ensure_not_initialized()?;
        self.chain.set_joint_order_in_config(order)
    }

    /// Replaces the options of the robot. The new options apply to the next computations, so
    /// all previously computed quantities become out of date.
    pub fn set_options(&mut self, options: ModelOptions) {
        self.options = options;
        self.state.invalidate();
    }

    /// Sets the property with the given name. See [ModelOptions::set_property()]. On success all
    /// previously computed quantities become out of date.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.options.set_property(name, value)?;
        self.state.invalidate();
        Ok(())
    }

    /// Sets the root joint of the robot.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the robot has been initialized.
    /// * [Error::MissingJoint] - Returned when the joint is not part of the chain.
    /// * [Error::InvalidRoot] - Returned when the joint has a parent.
    pub fn set_root(&mut self, id: &JointID) -> Result<(), Error> {
        self.ensure_not_initialized()?;
        self.chain.set_root(id)
    }

    /// Sets the velocity vector.
    ///
    /// ## Errors
    ///
    /// * [Error::NotInitialized] - Returned when the robot has not been initialized.
    /// * [Error::DimensionMismatch] - Returned when the vector does not have
    ///   [DynamicRobot::number_dof()] elements.
    pub fn set_velocity(&mut self, velocity: &DVector<f64>) -> Result<(), Error> {
        self.ensure_initialized()?;
        self.state.set_velocity(velocity)
    }

    /// Returns the velocity vector.
    pub fn velocity(&self) -> &DVector<f64> {
        self.state.velocity()
    }

    /// Creates a new robot for the given chain with the given options.
    pub fn with_options(chain: KinematicChain, options: ModelOptions) -> Self {
        Self {
            chain,
            options,
            state: ConfigurationState::new(0),
            fixed_joints: FixedJointSet::new(),
            requested_actuated_joints: None,
            actuated_joints: Vec::new(),
            is_initialized: false,
            kinematics: None,
            center_of_mass: None,
            center_of_mass_jacobian: None,
            inertia_matrix: None,
            inverse_dynamics: None,
        }
    }
}
