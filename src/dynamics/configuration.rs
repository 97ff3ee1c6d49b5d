extern crate nalgebra as na;

use log::warn;
use na::DVector;

use crate::Error;

#[cfg(test)]
#[path = "configuration_tests.rs"]
mod configuration_tests;

/// Stores the configuration, velocity and acceleration vectors of a robot.
///
/// Each successful change increments the revision of the state. Computed quantities remember
/// the revision they were computed at, which allows detecting that they are out of date.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigurationState {
    configuration: DVector<f64>,
    velocity: DVector<f64>,
    acceleration: DVector<f64>,
    revision: u64,
}

impl ConfigurationState {
    /// Returns the acceleration vector.
    pub fn acceleration(&self) -> &DVector<f64> {
        &self.acceleration
    }

    fn check_length(&self, name: &str, values: &DVector<f64>) -> Result<(), Error> {
        if values.len() != self.number_dof() {
            warn!(
                "Rejecting {} vector with {} elements, expected {}",
                name,
                values.len(),
                self.number_dof()
            );
            return Err(Error::DimensionMismatch {
                expected: self.number_dof(),
                actual: values.len(),
            });
        }

        Ok(())
    }

    /// Returns the configuration vector.
    pub fn configuration(&self) -> &DVector<f64> {
        &self.configuration
    }

    /// Increments the revision without changing the vectors. Quantities computed before this
    /// call are reported as out of date.
    pub fn invalidate(&mut self) {
        self.revision += 1;
    }

    /// Creates a new state with all vectors set to zero.
    ///
    /// ## Parameters
    ///
    /// * 'number_dof' - The number of degrees of freedom of the robot
    pub fn new(number_dof: usize) -> Self {
        Self {
            configuration: DVector::zeros(number_dof),
            velocity: DVector::zeros(number_dof),
            acceleration: DVector::zeros(number_dof),
            revision: 0,
        }
    }

    /// Returns the number of degrees of freedom, i.e. the length of each vector.
    pub fn number_dof(&self) -> usize {
        self.configuration.len()
    }

    /// Returns the revision of the state. The revision changes with every successful change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sets the acceleration vector.
    ///
    /// ## Errors
    ///
    /// * [Error::DimensionMismatch] - Returned when the vector does not have
    ///   [ConfigurationState::number_dof()] elements. The stored vector is not changed.
    pub fn set_acceleration(&mut self, acceleration: &DVector<f64>) -> Result<(), Error> {
        self.check_length("acceleration", acceleration)?;
        self.acceleration.copy_from(acceleration);
        self.revision += 1;
        Ok(())
    }

    /// Sets the configuration vector.
    ///
    /// ## Errors
    ///
    /// * [Error::DimensionMismatch] - Returned when the vector does not have
    ///   [ConfigurationState::number_dof()] elements. The stored vector is not changed.
    pub fn set_configuration(&mut self, configuration: &DVector<f64>) -> Result<(), Error> {
        self.check_length("configuration", configuration)?;
        self.configuration.copy_from(configuration);
        self.revision += 1;
        Ok(())
    }

    /// Sets the velocity vector.
    ///
    /// ## Errors
    ///
    /// * [Error::DimensionMismatch] - Returned when the vector does not have
    ///   [ConfigurationState::number_dof()] elements. The stored vector is not changed.
    pub fn set_velocity(&mut self, velocity: &DVector<f64>) -> Result<(), Error> {
        self.check_length("velocity", velocity)?;
        self.velocity.copy_from(velocity);
        self.revision += 1;
        Ok(())
    }

    /// Returns the velocity vector.
    pub fn velocity(&self) -> &DVector<f64> {
        &self.velocity
    }
}
