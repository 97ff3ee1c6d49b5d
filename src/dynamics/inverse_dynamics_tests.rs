use float_cmp::{ApproxEq, F64Margin};
use nalgebra::{DVector, Isometry3, Matrix3, Vector3};

use crate::{
    dynamics::{
        configuration::ConfigurationState,
        forward_kinematics::{compute_forward_kinematics, KinematicState},
        inertia_matrix::compute_inertia_matrix,
        options::ModelOptions,
    },
    model_elements::{
        chain::KinematicChain,
        joint::{Joint, JointKind, RigidBody},
    },
    test_models::{arm, humanoid},
};

use super::*;

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

fn assert_close(expected: f64, actual: f64, epsilon: f64) {
    assert!(
        expected.approx_eq(actual, F64Margin { ulps: 4, epsilon }),
        "Expected {} and {} to be equal within {}",
        expected,
        actual,
        epsilon
    );
}

fn assert_torques_match_inertia(chain: &KinematicChain, q: DVector<f64>, ddq: DVector<f64>) {
    let kinematics = kinematics_for(chain, &q, &DVector::zeros(chain.number_dof()), &ddq);

    let dynamics = compute_inverse_dynamics(chain, &kinematics, 0.0).unwrap();
    let inertia = compute_inertia_matrix(chain, &kinematics).unwrap();
    let expected = &inertia * &ddq;

    for (e, a) in expected.iter().zip(dynamics.joint_torques().iter()) {
        assert_close(*e, *a, 1e-10);
    }
}

#[test]
fn when_there_is_no_velocity_or_gravity_the_torques_should_be_inertia_times_acceleration() {
    let mut chain = arm().chain;
    chain.initialize().unwrap();
    assert_torques_match_inertia(
        &chain,
        DVector::from_vec(vec![0.3, -0.4, 0.15, 0.7]),
        DVector::from_vec(vec![-0.6, 0.4, 0.9, 0.2]),
    );

    let mut chain = humanoid().chain;
    chain.initialize().unwrap();
    let n = chain.number_dof();
    assert_torques_match_inertia(
        &chain,
        DVector::from_fn(n, |i, _| 0.05 * (i as f64) - 0.3),
        DVector::from_fn(n, |i, _| 0.2 - 0.03 * (i as f64)),
    );
}

#[test]
fn when_holding_a_horizontal_link_against_gravity_it_should_need_the_static_torque() {
    let mut chain = KinematicChain::new();
    let base = chain
        .add_joint(Joint::new(
            "base".to_string(),
            JointKind::Anchor,
            Isometry3::identity(),
            RigidBody::massless(),
        ))
        .unwrap();
    chain
        .attach_joint(
            Joint::new(
                "link".to_string(),
                JointKind::revolute_y(),
                Isometry3::translation(1.0, 0.0, 0.0),
                RigidBody::new(1.0, Vector3::new(0.5, 0.0, 0.0), Matrix3::identity()),
            ),
            &base,
        )
        .unwrap();
    chain.set_root(&base).unwrap();
    chain.initialize().unwrap();

    let zero = DVector::zeros(1);
    let kinematics = kinematics_for(&chain, &zero, &zero, &zero);
    let dynamics = compute_inverse_dynamics(&chain, &kinematics, 9.81).unwrap();

    // The center of mass is 1.5 m from the axis. Gravity rotates the link around +Y, so the
    // joint has to push back.
    assert_close(-1.5 * 9.81, dynamics.joint_torques()[0], 1e-12);
    assert_close(9.81, dynamics.forces()[(2, 1)], 1e-12);
    assert_close(9.81, dynamics.forces()[(2, 0)], 1e-12);
    assert_close(-1.5 * 9.81, dynamics.torques()[(1, 0)], 1e-12);
}

#[test]
fn when_a_free_floating_robot_is_at_rest_the_root_should_carry_its_weight() {
    let model = humanoid();
    let mut chain = model.chain;
    chain.initialize().unwrap();

    let n = chain.number_dof();
    let mut q = DVector::zeros(n);
    q[2] = 1.0;
    let kinematics = kinematics_for(&chain, &q, &DVector::zeros(n), &DVector::zeros(n));

    let dynamics = compute_inverse_dynamics(&chain, &kinematics, 9.81).unwrap();

    assert_eq!(chain.flattened_joints().len(), dynamics.forces().ncols());
    assert_eq!(n, dynamics.joint_torques().len());

    let weight = chain.mass() * 9.81;
    assert_close(0.0, dynamics.forces()[(0, 0)], 1e-12);
    assert_close(0.0, dynamics.forces()[(1, 0)], 1e-12);
    assert_close(weight, dynamics.forces()[(2, 0)], 1e-10);
    assert_close(weight, dynamics.joint_torques()[2], 1e-10);
    assert_eq!(kinematics.computed_at(), dynamics.computed_at());
}
