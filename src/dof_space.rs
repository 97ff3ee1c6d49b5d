//! Defines the spaces in which the value of a single degree of freedom lives and how these spaces
//! behave at their boundaries.
//!
//! A prismatic joint with end stops lives in a bounded linear space, i.e. the value of the degree
//! of freedom can never pass the lower or upper limit. A free-flyer translation lives in a linear
//! unbounded space with boundaries at -infinity and +infinity. A continuous revolute joint lives
//! in a periodic space that wraps around every 2 * [Pi](core::f64::consts::PI), i.e. in order to
//! go from one angle to another you can rotate either way.
//!
//! The [to_dof_space()] function is used to create the [DofValueSpace] for a given
//! [DofSpaceType].
//!
//! ## Bounds relative to a reference configuration
//!
//! [DofValueSpace::bounds_around()] returns the bounds of a degree of freedom given a reference
//! value for that degree of freedom. Bounded linear spaces ignore the reference. Periodic spaces
//! return the one period window centered on the reference, so that every angle is represented
//! exactly once and moving from the reference to any value inside the window follows the
//! shortest arc. There is no coupling between different degrees of freedom.

use std::f64::consts::PI;

#[cfg(test)]
#[path = "dof_space_tests.rs"]
mod dof_space_tests;

/// Defines the different kinds of degree of freedom spaces available.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DofSpaceType {
    /// Indicates that the degree of freedom lives in a linear space where numbers sequentially
    /// increase from -infinity to +infinity.
    LinearUnlimited,

    /// Indicates that the degree of freedom lives in a linear space that is limited to the
    /// range [lower, upper].
    LinearLimited {
        /// The lowest value the degree of freedom can take
        lower: f64,
        /// The highest value the degree of freedom can take
        upper: f64,
    },

    /// Indicates that the degree of freedom lives in an angular space where numbers sequentially
    /// increase from the start angle to the start angle + 2 PI and then wrap around.
    AngularPeriodic {
        /// The starting angle in radians
        start_angle_in_radians: f64,
    },
}

/// Defines an abstraction over the value space of a degree of freedom
pub trait DofValueSpace {
    /// Returns the static (lower, upper) bounds of the space.
    ///
    /// Unlimited and periodic spaces return (-infinity, +infinity) because a periodic degree
    /// of freedom can take any value, it just wraps around.
    ///
    /// ## Example
    ///
    /// ```
    /// use humanoid_dynamics::dof_space::{ DofSpaceType, to_dof_space };
    ///
    /// let space = to_dof_space(DofSpaceType::LinearLimited { lower: -1.0, upper: 2.0 });
    /// assert_eq!((-1.0, 2.0), space.bounds());
    /// ```
    fn bounds(&self) -> (f64, f64);

    /// Returns the (lower, upper) bounds of the space around the given reference value.
    ///
    /// ## Parameters
    ///
    /// * `reference` - The current value of the degree of freedom
    ///
    /// ## Example
    ///
    /// ```
    /// use core::f64::consts::PI;
    /// use humanoid_dynamics::dof_space::{ DofSpaceType, to_dof_space };
    ///
    /// let space = to_dof_space(DofSpaceType::AngularPeriodic { start_angle_in_radians: 0.0 });
    /// assert_eq!((0.0, 2.0 * PI), space.bounds_around(PI));
    /// ```
    fn bounds_around(&self, reference: f64) -> (f64, f64);

    /// Returns all possible distances between two values in the space.
    ///
    /// For linear spaces there will only be one distance, but for periodic spaces
    /// there are two distances, one going in the positive direction and one going in the
    /// negative direction.
    ///
    /// ## Parameters
    ///
    /// * `start` - The starting value
    /// * `end` - The ending value
    fn distance_between_values(&self, start: f64, end: f64) -> Vec<f64>;

    /// Returns the value in the space that is closest to the target value
    ///
    /// ## Parameters
    ///
    /// * `value` - The value that should be normalized.
    ///
    /// ## Example
    ///
    /// ```
    /// use core::f64::consts::PI;
    /// use humanoid_dynamics::dof_space::{ DofSpaceType, to_dof_space };
    ///
    /// // Values outside a limited space are clamped
    /// let space = to_dof_space(DofSpaceType::LinearLimited { lower: -1.0, upper: 1.0 });
    /// assert_eq!(1.0, space.normalize_value(5.0));
    ///
    /// // Create a periodic space that starts at 0.0 and runs to 2 * PI
    /// let space = to_dof_space(DofSpaceType::AngularPeriodic { start_angle_in_radians: 0.0 });
    /// let value = space.normalize_value(5.0 * PI);
    /// assert!((PI - value).abs() < 1e-12);
    /// ```
    fn normalize_value(&self, value: f64) -> f64;

    /// Returns the smallest signed distance between two values in the space.
    ///
    /// ## Parameters
    ///
    /// * `start` - The starting value.
    /// * `end` - The ending value
    fn smallest_distance_between_values(&self, start: f64, end: f64) -> f64;
}

/// Defines a linear space with optional limits.
///
/// The unlimited space is what we normally think of as a set of numbers, ranging from
/// -infinity to +infinity.
pub(crate) struct LinearSpace {
    lower: f64,
    upper: f64,
}

impl LinearSpace {
    /// Creates a space limited to [lower, upper]. The limits are swapped if they are given in
    /// the wrong order and a NaN limit leaves that side unlimited.
    pub fn new_limited(lower: f64, upper: f64) -> LinearSpace {
        let lower = if lower.is_nan() { f64::NEG_INFINITY } else { lower };
        let upper = if upper.is_nan() { f64::INFINITY } else { upper };
        LinearSpace {
            lower: lower.min(upper),
            upper: lower.max(upper),
        }
    }

    pub fn new_unlimited() -> LinearSpace {
        LinearSpace {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }
}

impl DofValueSpace for LinearSpace {
    fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    fn bounds_around(&self, _reference: f64) -> (f64, f64) {
        self.bounds()
    }

    fn distance_between_values(&self, start: f64, end: f64) -> Vec<f64> {
        vec![end - start]
    }

    fn normalize_value(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    fn smallest_distance_between_values(&self, start: f64, end: f64) -> f64 {
        end - start
    }
}

/// Defines a periodic space that wraps around at the period.
///
/// Values are normalized into the half-open range [start, start + period).
pub(crate) struct PeriodicAngularSpace {
    range_start_in_radians: f64,
    range_size: f64,
}

impl PeriodicAngularSpace {
    pub fn new_with_two_pi_range(start_angle_in_radians: f64) -> PeriodicAngularSpace {
        PeriodicAngularSpace {
            range_start_in_radians: start_angle_in_radians,
            range_size: 2.0 * PI,
        }
    }

    /// Returns the distance from start to end, reduced to [0, range_size).
    fn positive_distance(&self, start: f64, end: f64) -> f64 {
        (end - start).rem_euclid(self.range_size)
    }
}

impl DofValueSpace for PeriodicAngularSpace {
    fn bounds(&self) -> (f64, f64) {
        (f64::NEG_INFINITY, f64::INFINITY)
    }

    fn bounds_around(&self, reference: f64) -> (f64, f64) {
        let half_range = 0.5 * self.range_size;
        (reference - half_range, reference + half_range)
    }

    fn distance_between_values(&self, start: f64, end: f64) -> Vec<f64> {
        let diff = self.positive_distance(start, end);
        vec![diff, diff - self.range_size]
    }

    fn normalize_value(&self, value: f64) -> f64 {
        self.range_start_in_radians + self.positive_distance(self.range_start_in_radians, value)
    }

    fn smallest_distance_between_values(&self, start: f64, end: f64) -> f64 {
        let diff = self.positive_distance(start, end);
        if diff > 0.5 * self.range_size {
            diff - self.range_size
        } else {
            diff
        }
    }
}

/// Returns a [DofValueSpace] instance for the given space type.
///
/// ```
/// use core::f64::consts::PI;
/// use humanoid_dynamics::dof_space::{ DofSpaceType, to_dof_space };
///
/// // Create a linear space
/// let space = to_dof_space(DofSpaceType::LinearUnlimited);
/// let linear_distances = space.distance_between_values(1.0, 2.0);
/// assert!(linear_distances.len() == 1);
/// assert_eq!(1.0, linear_distances[0]);
///
/// // Create a periodic space that starts at 0.0 and runs to 2 * PI
/// let space = to_dof_space(DofSpaceType::AngularPeriodic { start_angle_in_radians: 0.0 });
/// let angular_distances = space.distance_between_values(0.0, PI);
/// assert!(angular_distances.len() == 2);
/// assert_eq!(PI, angular_distances[0]);
/// assert_eq!(-PI, angular_distances[1]);
/// ```
pub fn to_dof_space(dof_space_type: DofSpaceType) -> Box<dyn DofValueSpace> {
    match dof_space_type {
        DofSpaceType::LinearUnlimited => Box::new(LinearSpace::new_unlimited()),
        DofSpaceType::LinearLimited { lower, upper } => {
            Box::new(LinearSpace::new_limited(lower, upper))
        }
        DofSpaceType::AngularPeriodic {
            start_angle_in_radians,
        } => Box::new(PeriodicAngularSpace::new_with_two_pi_range(
            start_angle_in_radians,
        )),
    }
}
