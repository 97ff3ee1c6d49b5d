/// Defines the joints and rigid bodies that make up a robot model
pub mod joint;

/// Defines the kinematic tree of a robot.
pub mod chain;

/// Defines the set of joints that are temporarily fixed to the world.
pub mod fixed_joints;
