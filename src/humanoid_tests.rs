use float_cmp::{ApproxEq, F64Margin};
use nalgebra::{DVector, Vector3};

use crate::{
    dynamics::{options::ModelOptions, robot::DynamicRobot},
    test_models::{humanoid, HumanoidModel},
    Error,
};

use super::*;

fn assert_close(expected: f64, actual: f64, epsilon: f64) {
    assert!(
        expected.approx_eq(actual, F64Margin { ulps: 4, epsilon }),
        "Expected {} and {} to be equal within {}",
        expected,
        actual,
        epsilon
    );
}

fn humanoid_robot(options: ModelOptions) -> (HumanoidRobot, HumanoidModel) {
    let _ = env_logger::builder().is_test(true).try_init();

    let model = humanoid();
    let mut robot = DynamicRobot::with_options(model.chain.clone(), options);
    robot.initialize().unwrap();
    (HumanoidRobot::new(robot), model)
}

fn standing_configuration() -> DVector<f64> {
    let mut q = DVector::from_fn(18, |i, _| 0.03 * (i as f64) - 0.15);
    q[0] = 0.2;
    q[1] = -0.1;
    q[2] = 0.9;
    q
}

#[test]
fn when_creating_a_humanoid_it_should_have_no_end_effectors() {
    let (robot, _) = humanoid_robot(ModelOptions::default());
    assert_eq!(None, robot.left_hand());
    assert_eq!(None, robot.right_hand());
    assert_eq!(None, robot.left_foot());
    assert_eq!(None, robot.right_foot());
    assert_eq!(None, robot.gaze_joint());
    assert_eq!(None, robot.gaze());
    assert!(matches!(
        robot.zero_momentum_point(),
        Err(Error::MissingDependency { .. })
    ));
}

#[test]
fn when_setting_end_effectors_it_should_replace_the_previous_ones() {
    let (mut robot, model) = humanoid_robot(ModelOptions::default());

    robot.set_left_hand(&model.left_elbow).unwrap();
    robot.set_left_hand(&model.left_hand).unwrap();
    robot.set_right_hand(&model.right_hand).unwrap();
    robot.set_left_foot(&model.left_foot).unwrap();
    robot.set_right_foot(&model.right_foot).unwrap();
    robot.set_gaze_joint(&model.head).unwrap();

    assert_eq!(Some(&model.left_hand), robot.left_hand());
    assert_eq!(Some(&model.right_hand), robot.right_hand());
    assert_eq!(Some(&model.left_foot), robot.left_foot());
    assert_eq!(Some(&model.right_foot), robot.right_foot());
    assert_eq!(Some(&model.head), robot.gaze_joint());
}

#[test]
fn when_setting_an_unknown_end_effector_it_should_fail_and_keep_the_previous_one() {
    let (mut robot, model) = humanoid_robot(ModelOptions::default());
    robot.set_right_foot(&model.right_foot).unwrap();

    let unknown = JointID::new(42);
    assert_eq!(
        Err(Error::MissingJoint { id: unknown }),
        robot.set_right_foot(&unknown)
    );
    assert_eq!(Some(&model.right_foot), robot.right_foot());
    assert!(robot.set_gaze_joint(&unknown).is_err());
    assert_eq!(None, robot.gaze_joint());
}

#[test]
fn when_setting_the_gaze_it_should_return_the_local_ray() {
    let (mut robot, model) = humanoid_robot(ModelOptions::default());
    robot.set_gaze_joint(&model.head).unwrap();
    robot.set_gaze(Vector3::new(0.05, 0.0, 0.1), Vector3::new(1.0, 0.0, 0.0));

    assert_eq!(
        Some(&GazeRay {
            origin: Vector3::new(0.05, 0.0, 0.1),
            direction: Vector3::new(1.0, 0.0, 0.0),
        }),
        robot.gaze()
    );

    // The world frame gaze needs the pose of the head
    assert!(matches!(
        robot.gaze_in_world(),
        Err(Error::MissingDependency { .. })
    ));

    robot.dynamics_mut().compute_forward_kinematics().unwrap();
    let gaze = robot.gaze_in_world().unwrap();
    let head = robot
        .dynamics()
        .joint_kinematics(&model.head)
        .unwrap()
        .position();

    // At the zero configuration all frames are aligned with the world
    assert_close(head.x + 0.05, gaze.origin.x, 1e-12);
    assert_close(head.z + 0.1, gaze.origin.z, 1e-12);
    assert_close(1.0, gaze.direction.x, 1e-12);
    assert_close(0.0, gaze.direction.y, 1e-12);
}

#[test]
fn when_the_humanoid_is_at_rest_the_zero_momentum_point_should_be_below_the_center_of_mass() {
    let (mut robot, _) = humanoid_robot(ModelOptions::default());
    robot
        .dynamics_mut()
        .set_configuration(&standing_configuration())
        .unwrap();
    robot.dynamics_mut().compute_forward_kinematics().unwrap();
    robot.dynamics_mut().compute_center_of_mass_dynamics().unwrap();
    robot.compute_zero_momentum_point().unwrap();

    let center_of_mass = *robot.dynamics().center_of_mass().unwrap();
    let zmp = robot.zero_momentum_point().unwrap();
    assert_close(center_of_mass.x, zmp.x, 1e-12);
    assert_close(center_of_mass.y, zmp.y, 1e-12);
    assert_eq!(0.0, zmp.z);
}

#[test]
fn when_the_humanoid_accelerates_forward_the_zero_momentum_point_should_move_back() {
    let (mut robot, _) = humanoid_robot(ModelOptions::default());
    let mut acceleration = DVector::zeros(18);
    acceleration[0] = 1.0;

    let dynamics = robot.dynamics_mut();
    dynamics
        .set_configuration(&standing_configuration())
        .unwrap();
    dynamics.set_acceleration(&acceleration).unwrap();
    dynamics.compute_forward_kinematics().unwrap();
    dynamics.compute_center_of_mass_dynamics().unwrap();
    robot.compute_zero_momentum_point().unwrap();

    // All bodies share the same translational acceleration, so there is no change of angular
    // momentum around the center of mass.
    let center_of_mass = *robot.dynamics().center_of_mass().unwrap();
    let zmp = robot.zero_momentum_point().unwrap();
    assert_close(center_of_mass.x - center_of_mass.z / 9.81, zmp.x, 1e-10);
    assert_close(center_of_mass.y, zmp.y, 1e-10);
}

#[test]
fn when_the_humanoid_is_in_free_fall_the_zero_momentum_point_should_be_degenerate() {
    let options = ModelOptions {
        gravity: 0.0,
        ..ModelOptions::default()
    };
    let (mut robot, _) = humanoid_robot(options);
    robot.dynamics_mut().compute_forward_kinematics().unwrap();
    robot.dynamics_mut().compute_center_of_mass_dynamics().unwrap();

    assert_eq!(
        Err(Error::DegenerateZeroMomentumPoint),
        robot.compute_zero_momentum_point()
    );
    assert!(robot.zero_momentum_point().is_err());
}

#[test]
fn when_the_center_of_mass_dynamics_are_missing_or_stale_it_should_not_compute() {
    let (mut robot, _) = humanoid_robot(ModelOptions::default());
    assert_eq!(
        Err(Error::MissingDependency {
            quantity: "center of mass dynamics"
        }),
        robot.compute_zero_momentum_point()
    );

    robot.dynamics_mut().compute_forward_kinematics().unwrap();
    robot.dynamics_mut().compute_center_of_mass_dynamics().unwrap();
    robot
        .dynamics_mut()
        .set_velocity(&DVector::from_element(18, 0.1))
        .unwrap();
    assert_eq!(
        Err(Error::StaleDependency {
            quantity: "center of mass dynamics"
        }),
        robot.compute_zero_momentum_point()
    );
}

#[test]
fn when_the_zero_momentum_point_is_disabled_computing_it_should_do_nothing() {
    let options = ModelOptions {
        compute_zmp: false,
        ..ModelOptions::default()
    };
    let (mut robot, _) = humanoid_robot(options);

    assert_eq!(Ok(()), robot.compute_zero_momentum_point());
    assert!(robot.zero_momentum_point().is_err());
}

#[test]
fn when_the_zero_momentum_point_gets_disabled_it_should_discard_the_previous_one() {
    let (mut robot, _) = humanoid_robot(ModelOptions::default());
    robot
        .dynamics_mut()
        .set_configuration(&standing_configuration())
        .unwrap();
    robot.dynamics_mut().compute_forward_kinematics().unwrap();
    robot.dynamics_mut().compute_center_of_mass_dynamics().unwrap();
    robot.compute_zero_momentum_point().unwrap();
    assert!(robot.zero_momentum_point().is_ok());

    robot
        .dynamics_mut()
        .set_property("ComputeZMP", "false")
        .unwrap();
    assert_eq!(Ok(()), robot.compute_zero_momentum_point());
    assert_eq!(
        Err(Error::MissingDependency {
            quantity: "zero momentum point"
        }),
        robot.zero_momentum_point()
    );
}
