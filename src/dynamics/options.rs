use crate::Error;

#[cfg(test)]
#[path = "options_tests.rs"]
mod options_tests;

/// The standard gravitational acceleration in m/s^2.
pub const STANDARD_GRAVITY: f64 = 9.81;

const COMPUTE_VELOCITY: &str = "ComputeVelocity";
const COMPUTE_ACCELERATION: &str = "ComputeAcceleration";
const COMPUTE_MOMENTUM: &str = "ComputeMomentum";
const COMPUTE_ZMP: &str = "ComputeZMP";
const GRAVITY: &str = "Gravity";

/// Defines the options that control which quantities are computed by a robot model.
///
/// All computations are enabled by default. Disabled quantities are stored as zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelOptions {
    /// Propagate the velocities during the forward kinematics.
    pub compute_velocity: bool,

    /// Propagate the accelerations during the forward kinematics.
    pub compute_acceleration: bool,

    /// Compute the linear and angular momentum during the center of mass dynamics.
    pub compute_momentum: bool,

    /// Compute the Zero Momentum Point.
    pub compute_zmp: bool,

    /// The magnitude of the gravitational acceleration in m/s^2. Gravity points along the
    /// negative Z-axis of the world frame.
    pub gravity: f64,
}

impl ModelOptions {
    /// Returns a value indicating whether the property with the given name is known.
    ///
    /// ## Example
    ///
    /// ```
    /// use humanoid_dynamics::dynamics::options::ModelOptions;
    ///
    /// let options = ModelOptions::default();
    /// assert!(options.is_supported("ComputeMomentum"));
    /// assert!(!options.is_supported("ComputeCollisions"));
    /// ```
    pub fn is_supported(&self, name: &str) -> bool {
        matches!(
            name,
            COMPUTE_VELOCITY | COMPUTE_ACCELERATION | COMPUTE_MOMENTUM | COMPUTE_ZMP | GRAVITY
        )
    }

    /// Returns the value of the property with the given name as a string, or `None` if the
    /// property is not known.
    ///
    /// Flags are returned as `true` or `false`.
    pub fn property(&self, name: &str) -> Option<String> {
        match name {
            COMPUTE_VELOCITY => Some(self.compute_velocity.to_string()),
            COMPUTE_ACCELERATION => Some(self.compute_acceleration.to_string()),
            COMPUTE_MOMENTUM => Some(self.compute_momentum.to_string()),
            COMPUTE_ZMP => Some(self.compute_zmp.to_string()),
            GRAVITY => Some(self.gravity.to_string()),
            _ => None,
        }
    }

    /// Sets the property with the given name from its string value.
    ///
    /// ## Errors
    ///
    /// * [Error::UnsupportedProperty] - Returned when the property is not known.
    /// * [Error::InvalidPropertyValue] - Returned when the value cannot be parsed for the property.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<(), Error> {
        match name {
            COMPUTE_VELOCITY => self.compute_velocity = parse_flag(name, value)?,
            COMPUTE_ACCELERATION => self.compute_acceleration = parse_flag(name, value)?,
            COMPUTE_MOMENTUM => self.compute_momentum = parse_flag(name, value)?,
            COMPUTE_ZMP => self.compute_zmp = parse_flag(name, value)?,
            GRAVITY => {
                let gravity = value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|g| g.is_finite())
                    .ok_or_else(|| invalid_value(name, value))?;
                self.gravity = gravity;
            }
            _ => {
                return Err(Error::UnsupportedProperty {
                    name: name.to_string(),
                })
            }
        }

        Ok(())
    }
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            compute_velocity: true,
            compute_acceleration: true,
            compute_momentum: true,
            compute_zmp: true,
            gravity: STANDARD_GRAVITY,
        }
    }
}

fn invalid_value(name: &str, value: &str) -> Error {
    Error::InvalidPropertyValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(invalid_value(name, value)),
    }
}
