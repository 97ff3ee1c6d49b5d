use crate::Error;

use super::joint::JointID;

#[cfg(test)]
#[path = "fixed_joints_tests.rs"]
mod fixed_joints_tests;

/// Stores the joints that are currently fixed to the world, e.g. the foot a humanoid is
/// standing on.
///
/// Fixed joints do not change the kinematic chain or any of the computations on it. They are
/// markers for the code that decides which joint supports the robot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedJointSet {
    joints: Vec<JointID>,
}

impl FixedJointSet {
    /// Adds the joint to the set. Adding a joint that is already fixed has no effect.
    pub fn add(&mut self, id: JointID) {
        if !self.contains(&id) {
            self.joints.push(id);
        }
    }

    /// Returns the fixed joint at the given position in the set.
    ///
    /// ## Errors
    ///
    /// * [Error::OutOfRange] - Returned when the rank is not smaller than [FixedJointSet::count()].
    pub fn at(&self, rank: usize) -> Result<&JointID, Error> {
        self.joints.get(rank).ok_or(Error::OutOfRange {
            index: rank,
            count: self.joints.len(),
        })
    }

    /// Removes all joints from the set.
    pub fn clear(&mut self) {
        self.joints.clear();
    }

    /// Returns a value indicating whether the given joint is fixed.
    pub fn contains(&self, id: &JointID) -> bool {
        self.joints.contains(id)
    }

    /// Returns the number of fixed joints.
    pub fn count(&self) -> usize {
        self.joints.len()
    }

    /// Returns an iterator over the fixed joints in the order in which they were added.
    pub fn iter(&self) -> impl Iterator<Item = &JointID> {
        self.joints.iter()
    }

    /// Creates a new, empty set.
    pub fn new() -> Self {
        Self { joints: Vec::new() }
    }

    /// Removes the joint from the set. Removing a joint that is not fixed has no effect.
    pub fn remove(&mut self, id: &JointID) {
        self.joints.retain(|j| j != id);
    }
}
