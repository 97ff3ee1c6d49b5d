use float_cmp::{ApproxEq, F64Margin};
use nalgebra::{DVector, Isometry3, Vector3};

use crate::{
    dynamics::{
        configuration::ConfigurationState,
        forward_kinematics::{compute_forward_kinematics, KinematicState},
        options::ModelOptions,
    },
    model_elements::{
        chain::KinematicChain,
        joint::{Joint, JointKind, RigidBody},
    },
    test_models::{arm, two_joint_chain},
};

use super::*;

fn assert_vector_close(expected: &Vector3<f64>, actual: &Vector3<f64>, epsilon: f64) {
    for (a, b) in expected.iter().zip(actual.iter()) {
        assert!(
            (*a).approx_eq(*b, F64Margin { ulps: 4, epsilon }),
            "Expected {} and {} to be equal within {}",
            expected,
            actual,
            epsilon
        );
    }
}

fn kinematics_for(
    chain: &KinematicChain,
    q: &DVector<f64>,
    dq: &DVector<f64>,
    ddq: &DVector<f64>,
) -> KinematicState {
    let mut state = ConfigurationState::new(chain.number_dof());
    state.set_configuration(q).unwrap();
    state.set_velocity(dq).unwrap();
    state.set_acceleration(ddq).unwrap();
    compute_forward_kinematics(chain, &state, &ModelOptions::default()).unwrap()
}

fn initialized_arm() -> KinematicChain {
    let mut chain = arm().chain;
    chain.initialize().unwrap();
    chain
}

#[test]
fn when_computing_the_center_of_mass_it_should_weigh_the_bodies_by_mass() {
    let mut chain = two_joint_chain().chain;
    chain.initialize().unwrap();

    let zero = DVector::zeros(1);
    let kinematics = kinematics_for(&chain, &zero, &zero, &zero);
    let result = compute_center_of_mass_dynamics(&chain, &kinematics, true).unwrap();

    // Root body of 2 kg at the origin, child body of 1 kg at (1.5, 0, 0)
    assert_vector_close(&Vector3::new(0.5, 0.0, 0.0), result.position(), 1e-12);
    assert_vector_close(&Vector3::zeros(), result.velocity(), 1e-12);
    assert_vector_close(&Vector3::zeros(), result.linear_momentum(), 1e-12);
    assert_vector_close(&Vector3::zeros(), result.angular_momentum(), 1e-12);
    assert_eq!(kinematics.computed_at(), result.computed_at());
}

#[test]
fn when_a_single_body_spins_the_angular_momentum_should_include_the_orbit_and_the_spin() {
    let mut chain = two_joint_chain().chain;
    chain.initialize().unwrap();

    let zero = DVector::zeros(1);
    let velocity = DVector::from_vec(vec![1.0]);
    let kinematics = kinematics_for(&chain, &zero, &velocity, &zero);
    let result = compute_center_of_mass_dynamics(&chain, &kinematics, true).unwrap();

    // The child body circles the origin with radius 1.5 m, the COM is at 0.5 m. The root
    // body is at rest at the origin.
    //   orbit: child (1.0 * (1.5 - 0.5) * 1.5) + root (2.0 * 0.5 * 0.0) = 1.5
    //   spin: 0.015 * 1.0 kg m^2
    assert_vector_close(&Vector3::new(0.0, 0.5, 0.0), result.velocity(), 1e-12);
    assert_vector_close(&Vector3::new(0.0, 1.5, 0.0), result.linear_momentum(), 1e-12);
    assert_vector_close(
        &Vector3::new(0.0, 0.0, 1.5 + 0.015),
        result.angular_momentum(),
        1e-12,
    );

    // Uniform rotation: the COM accelerates towards the axis, the angular momentum is constant
    assert_vector_close(&Vector3::new(-0.5, 0.0, 0.0), result.acceleration(), 1e-12);
    assert_vector_close(
        &Vector3::new(-1.5, 0.0, 0.0),
        result.linear_momentum_derivative(),
        1e-12,
    );
    assert_vector_close(
        &Vector3::zeros(),
        result.angular_momentum_derivative(),
        1e-12,
    );
}

#[test]
fn when_computing_the_momenta_they_should_match_the_change_over_time() {
    let chain = initialized_arm();
    let q = DVector::from_vec(vec![0.3, -0.4, 0.15, 0.7]);
    let dq = DVector::from_vec(vec![0.5, 0.8, -0.2, 1.1]);
    let ddq = DVector::from_vec(vec![-0.6, 0.4, 0.9, 0.2]);
    let h = 1e-6;

    let current = compute_center_of_mass_dynamics(
        &chain,
        &kinematics_for(&chain, &q, &dq, &ddq),
        true,
    )
    .unwrap();
    let forward = compute_center_of_mass_dynamics(
        &chain,
        &kinematics_for(
            &chain,
            &(&q + &dq * h + &ddq * (0.5 * h * h)),
            &(&dq + &ddq * h),
            &ddq,
        ),
        true,
    )
    .unwrap();
    let backward = compute_center_of_mass_dynamics(
        &chain,
        &kinematics_for(
            &chain,
            &(&q - &dq * h + &ddq * (0.5 * h * h)),
            &(&dq - &ddq * h),
            &ddq,
        ),
        true,
    )
    .unwrap();

    let expected = (forward.position() - backward.position()) / (2.0 * h);
    assert_vector_close(&expected, current.velocity(), 1e-6);

    assert_vector_close(
        &(current.velocity() * chain.mass()),
        current.linear_momentum(),
        1e-12,
    );

    let expected = (forward.linear_momentum() - backward.linear_momentum()) / (2.0 * h);
    assert_vector_close(&expected, current.linear_momentum_derivative(), 1e-5);

    let expected = (forward.angular_momentum() - backward.angular_momentum()) / (2.0 * h);
    assert_vector_close(&expected, current.angular_momentum_derivative(), 1e-5);
}

#[test]
fn when_momentum_is_disabled_it_should_be_zero() {
    let chain = initialized_arm();
    let q = DVector::from_vec(vec![0.3, -0.4, 0.15, 0.7]);
    let dq = DVector::from_vec(vec![0.5, 0.8, -0.2, 1.1]);
    let kinematics = kinematics_for(&chain, &q, &dq, &DVector::zeros(4));

    let result = compute_center_of_mass_dynamics(&chain, &kinematics, false).unwrap();

    assert_eq!(&Vector3::zeros(), result.linear_momentum());
    assert_eq!(&Vector3::zeros(), result.angular_momentum());
    assert_eq!(&Vector3::zeros(), result.linear_momentum_derivative());
    assert_eq!(&Vector3::zeros(), result.angular_momentum_derivative());
    assert_ne!(&Vector3::zeros(), result.velocity());
}

#[test]
fn when_the_robot_has_no_mass_the_center_of_mass_should_be_the_origin() {
    let mut chain = KinematicChain::new();
    let root = chain
        .add_joint(Joint::new(
            "root".to_string(),
            JointKind::Anchor,
            Isometry3::translation(1.0, 2.0, 3.0),
            RigidBody::massless(),
        ))
        .unwrap();
    chain.set_root(&root).unwrap();
    chain.initialize().unwrap();

    let zero = DVector::zeros(0);
    let kinematics = kinematics_for(&chain, &zero, &zero, &zero);
    let result = compute_center_of_mass_dynamics(&chain, &kinematics, true).unwrap();

    assert_eq!(&Vector3::zeros(), result.position());
}
