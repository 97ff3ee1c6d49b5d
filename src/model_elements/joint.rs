//! Defines the joints and rigid bodies that are used to create a robot model

extern crate nalgebra as na;

use std::fmt::Display;

use log::warn;
use na::{Isometry3, Matrix3, Matrix6, Translation3, Unit, UnitQuaternion, Vector3};

use crate::{
    dof_space::{to_dof_space, DofSpaceType, DofValueSpace},
    Error,
};

#[cfg(test)]
#[path = "joint_tests.rs"]
mod joint_tests;

/// The number of degrees of freedom of a free-flyer joint, 3 translations and 3 rotations.
pub const FREE_FLYER_DOF: usize = 6;

/// Defines the kind of motion a joint allows relative to its parent.
///
/// The motion of a joint is expressed in the frame of the parent joint, at the origin of the
/// parent joint. When the joint is at zero displacement this 'actuated' frame coincides with
/// the parent frame. The fixed placement of the joint is applied on top of the actuated frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointKind {
    /// The joint is rigidly attached to its parent. Has no degrees of freedom.
    Anchor,

    /// The joint rotates around the given axis, expressed in the parent frame.
    Revolute {
        /// The axis of rotation
        axis: Unit<Vector3<f64>>,
    },

    /// The joint translates along the given axis, expressed in the parent frame.
    Prismatic {
        /// The axis of translation
        axis: Unit<Vector3<f64>>,
    },

    /// The joint moves freely relative to its parent.
    ///
    /// The configuration of a free-flyer is `(x, y, z, roll, pitch, yaw)` with the rotation defined
    /// as `Rz(yaw) * Ry(pitch) * Rx(roll)`. The velocity and acceleration entries are the linear
    /// and angular velocity (or acceleration) of the joint relative to its parent, expressed in
    /// the world frame.
    FreeFlyer,
}

/// Defines the instantaneous motion of the actuated frame of a joint caused by a unit velocity of
/// one of its degrees of freedom, expressed in the world frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitTwist {
    /// The angular velocity.
    pub angular: Vector3<f64>,

    /// The linear velocity of the origin of the actuated frame.
    pub linear: Vector3<f64>,
}

impl JointKind {
    /// Creates a revolute joint kind around the given axis. The axis is normalized.
    pub fn revolute(axis: Vector3<f64>) -> Self {
        JointKind::Revolute {
            axis: Unit::new_normalize(axis),
        }
    }

    /// Creates a revolute joint kind around the X-axis.
    pub fn revolute_x() -> Self {
        JointKind::Revolute {
            axis: Vector3::x_axis(),
        }
    }

    /// Creates a revolute joint kind around the Y-axis.
    pub fn revolute_y() -> Self {
        JointKind::Revolute {
            axis: Vector3::y_axis(),
        }
    }

    /// Creates a revolute joint kind around the Z-axis.
    pub fn revolute_z() -> Self {
        JointKind::Revolute {
            axis: Vector3::z_axis(),
        }
    }

    /// Creates a prismatic joint kind along the given axis. The axis is normalized.
    pub fn prismatic(axis: Vector3<f64>) -> Self {
        JointKind::Prismatic {
            axis: Unit::new_normalize(axis),
        }
    }

    /// Creates a prismatic joint kind along the X-axis.
    pub fn prismatic_x() -> Self {
        JointKind::Prismatic {
            axis: Vector3::x_axis(),
        }
    }

    /// Creates a prismatic joint kind along the Y-axis.
    pub fn prismatic_y() -> Self {
        JointKind::Prismatic {
            axis: Vector3::y_axis(),
        }
    }

    /// Creates a prismatic joint kind along the Z-axis.
    pub fn prismatic_z() -> Self {
        JointKind::Prismatic {
            axis: Vector3::z_axis(),
        }
    }

    /// Returns a value indicating if the joint kind is a free-flyer.
    pub fn is_free_flyer(&self) -> bool {
        matches!(self, JointKind::FreeFlyer)
    }

    /// Returns the number of degrees of freedom for the joint kind.
    pub fn number_dof(&self) -> usize {
        match self {
            JointKind::Anchor => 0,
            JointKind::Revolute { .. } | JointKind::Prismatic { .. } => 1,
            JointKind::FreeFlyer => FREE_FLYER_DOF,
        }
    }

    /// Returns the default value spaces for the degrees of freedom of the joint kind.
    ///
    /// Rotations are periodic in [-PI, PI), translations are unlimited.
    pub fn default_dof_spaces(&self) -> Vec<DofSpaceType> {
        let angular = DofSpaceType::AngularPeriodic {
            start_angle_in_radians: -std::f64::consts::PI,
        };
        match self {
            JointKind::Anchor => vec![],
            JointKind::Revolute { .. } => vec![angular],
            JointKind::Prismatic { .. } => vec![DofSpaceType::LinearUnlimited],
            JointKind::FreeFlyer => vec![
                DofSpaceType::LinearUnlimited,
                DofSpaceType::LinearUnlimited,
                DofSpaceType::LinearUnlimited,
                angular,
                angular,
                angular,
            ],
        }
    }

    /// Returns the transform of the actuated frame relative to the parent frame.
    ///
    /// ## Parameters
    ///
    /// * 'dof_values' - The values of the degrees of freedom of the joint. It is assumed that
    ///   the slice contains [JointKind::number_dof()] values.
    pub fn local_transform(&self, dof_values: &[f64]) -> Isometry3<f64> {
        match self {
            JointKind::Anchor => Isometry3::identity(),
            JointKind::Revolute { axis } => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, dof_values[0]),
            ),
            JointKind::Prismatic { axis } => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * dof_values[0]),
                UnitQuaternion::identity(),
            ),
            JointKind::FreeFlyer => Isometry3::from_parts(
                Translation3::new(dof_values[0], dof_values[1], dof_values[2]),
                UnitQuaternion::from_euler_angles(dof_values[3], dof_values[4], dof_values[5]),
            ),
        }
    }

    /// Returns the world frame motion caused by a unit velocity of the given degree of freedom.
    ///
    /// ## Parameters
    ///
    /// * 'dof' - The index of the degree of freedom within the joint
    /// * 'parent_rotation' - The world orientation of the parent frame, in which the joint axes
    ///   are expressed
    pub fn unit_twist(&self, dof: usize, parent_rotation: &UnitQuaternion<f64>) -> UnitTwist {
        match self {
            JointKind::Anchor => UnitTwist {
                angular: Vector3::zeros(),
                linear: Vector3::zeros(),
            },
            JointKind::Revolute { axis } => UnitTwist {
                angular: parent_rotation * axis.into_inner(),
                linear: Vector3::zeros(),
            },
            JointKind::Prismatic { axis } => UnitTwist {
                angular: Vector3::zeros(),
                linear: parent_rotation * axis.into_inner(),
            },
            JointKind::FreeFlyer => {
                if dof < 3 {
                    UnitTwist {
                        angular: Vector3::zeros(),
                        linear: Vector3::ith(dof, 1.0),
                    }
                } else {
                    UnitTwist {
                        angular: Vector3::ith(dof - 3, 1.0),
                        linear: Vector3::zeros(),
                    }
                }
            }
        }
    }
}

/// Defines a unique ID for a [Joint] inside a kinematic chain.
///
/// The ID is the index of the joint in the joint arena of the chain. It is only valid for the
/// chain that created it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JointID {
    /// The index of the joint in the chain.
    index: usize,
}

impl JointID {
    /// Returns the index of the joint in the chain that owns it.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Creates a new ID for the joint at the given index.
    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Display for JointID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JointID [{}]", self.index)
    }
}

/// Defines the rigid body that is attached to a [Joint].
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    /// Defines the mass of the body in kg.
    mass_in_kg: f64,

    /// Stores the location of the center of mass of the body, relative to the
    /// joint coordinate frame.
    center_of_mass: Vector3<f64>,

    /// Stores the moments of inertia for the body, around the center of mass and
    /// expressed in the joint coordinate frame.
    moment_of_inertia: Matrix3<f64>,
}

impl RigidBody {
    /// Returns the location of the center of mass of the body, relative to the
    /// joint coordinate frame.
    pub fn center_of_mass(&self) -> &Vector3<f64> {
        &self.center_of_mass
    }

    /// Returns the mass of the body in kg.
    pub fn mass_in_kg(&self) -> f64 {
        self.mass_in_kg
    }

    /// Returns the moments of inertia for the body around the center of mass, expressed
    /// in the joint coordinate frame.
    pub fn moment_of_inertia(&self) -> &Matrix3<f64> {
        &self.moment_of_inertia
    }

    /// Returns a body without mass.
    pub fn massless() -> Self {
        Self::new(0.0, Vector3::zeros(), Matrix3::zeros())
    }

    /// Creates a new RigidBody.
    ///
    /// ## Parameters
    ///
    /// * 'mass' - The mass in kg of the body
    /// * 'center_of_mass' - The location of the center of mass for the body relative to the
    ///   joint reference frame
    /// * 'moment_of_inertia' - The moment of inertia for the body, around the center of mass
    ///   and expressed in the joint reference frame.
    pub fn new(mass: f64, center_of_mass: Vector3<f64>, moment_of_inertia: Matrix3<f64>) -> Self {
        Self {
            mass_in_kg: mass,
            center_of_mass,
            moment_of_inertia,
        }
    }

    /// Returns the spatial inertia of the body around its center of mass, expressed in the
    /// joint reference frame. The upper left block is the mass, the lower right block the
    /// moment of inertia.
    pub fn spatial_inertia(&self) -> Matrix6<f64> {
        let mut result = Matrix6::zeros();
        result
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(Matrix3::identity() * self.mass_in_kg));
        result
            .fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&self.moment_of_inertia);
        result
    }

    /// Returns the moment of inertia around the center of mass expressed in a frame with the
    /// given orientation, i.e. `R * I * R^T`.
    pub fn rotated_moment_of_inertia(&self, rotation: &UnitQuaternion<f64>) -> Matrix3<f64> {
        let r = rotation.to_rotation_matrix();
        r.matrix() * self.moment_of_inertia * r.matrix().transpose()
    }
}

/// Defines a single joint of a robot model together with the body attached to it.
///
/// The joint frame is a cartesian right-handed coordinate system. Its pose relative to the
/// parent is `local_transform(q) * placement`, i.e. the joint motion happens in the parent frame
/// and the fixed placement is applied on top of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// The human readable name for the joint.
    name: String,

    /// Defines the kind of motion for the joint.
    kind: JointKind,

    /// The transform from the joint frame to the actuated frame.
    placement: Isometry3<f64>,

    /// The body attached to the joint.
    body: RigidBody,

    /// The value space of each degree of freedom.
    dof_spaces: Vec<DofSpaceType>,

    is_actuated: bool,
}

impl Joint {
    /// Returns the rigid body attached to the joint.
    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    /// Returns the value space for the given degree of freedom of the joint.
    ///
    /// Returns `None` if the joint has fewer degrees of freedom.
    pub fn dof_space(&self, dof: usize) -> Option<Box<dyn DofValueSpace>> {
        self.dof_spaces.get(dof).map(|t| to_dof_space(*t))
    }

    /// Returns a value indicating whether the joint is actuated or not.
    pub fn is_actuated(&self) -> bool {
        self.is_actuated
    }

    /// Returns the kind of motion of the joint.
    pub fn kind(&self) -> JointKind {
        self.kind
    }

    /// Returns the name of the joint.
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Creates a new Joint.
    ///
    /// Revolute and prismatic joints are actuated by default. Anchor and free-flyer
    /// joints are not.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the joint
    /// * 'kind' - The kind of motion the joint allows
    /// * 'placement' - The transform from the joint frame to the actuated frame, i.e. the pose
    ///   of the joint relative to the parent at zero displacement
    /// * 'body' - The rigid body attached to the joint
    pub fn new(name: String, kind: JointKind, placement: Isometry3<f64>, body: RigidBody) -> Self {
        let is_actuated = matches!(
            kind,
            JointKind::Revolute { .. } | JointKind::Prismatic { .. }
        );
        Self {
            name,
            kind,
            placement,
            body,
            dof_spaces: kind.default_dof_spaces(),
            is_actuated,
        }
    }

    /// Returns the number of degrees of freedom of the joint.
    pub fn number_dof(&self) -> usize {
        self.kind.number_dof()
    }

    /// Returns the pose of the joint relative to the actuated frame.
    pub fn placement(&self) -> &Isometry3<f64> {
        &self.placement
    }

    /// Returns the joint with its actuation flag set to the given value.
    pub fn with_actuation(mut self, is_actuated: bool) -> Self {
        self.is_actuated = is_actuated;
        self
    }

    /// Returns the joint with the value spaces for its degrees of freedom replaced.
    ///
    /// Spaces beyond the number of degrees of freedom are ignored. Missing spaces keep
    /// their default.
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidDofLimits] - Returned when a limited space has a NaN limit or a lower
    ///   limit above its upper limit.
    pub fn with_dof_spaces(mut self, spaces: Vec<DofSpaceType>) -> Result<Self, Error> {
        for space in spaces.iter().take(self.dof_spaces.len()) {
            if let DofSpaceType::LinearLimited { lower, upper } = *space {
                if lower.is_nan() || upper.is_nan() || lower > upper {
                    warn!(
                        "Rejecting limits [{}, {}] for joint {}",
                        lower, upper, self.name
                    );
                    return Err(Error::InvalidDofLimits { lower, upper });
                }
            }
        }

        for (current, space) in self.dof_spaces.iter_mut().zip(spaces) {
            *current = space;
        }
        Ok(self)
    }

    /// Returns the joint with all its degrees of freedom limited to [lower, upper].
    ///
    /// ## Errors
    ///
    /// * [Error::InvalidDofLimits] - Returned when either limit is NaN or lower exceeds upper.
    pub fn with_limits(self, lower: f64, upper: f64) -> Result<Self, Error> {
        let count = self.number_dof();
        self.with_dof_spaces(vec![DofSpaceType::LinearLimited { lower, upper }; count])
    }
}
