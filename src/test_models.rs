//! Robot models shared by the unit tests.

use nalgebra::{Isometry3, Matrix3, Vector3};

use crate::model_elements::{
    chain::KinematicChain,
    joint::{Joint, JointID, JointKind, RigidBody},
};

pub(crate) fn body(mass: f64, center_of_mass: Vector3<f64>) -> RigidBody {
    RigidBody::new(
        mass,
        center_of_mass,
        Matrix3::from_diagonal(&Vector3::new(0.01 * mass, 0.02 * mass, 0.015 * mass)),
    )
}

fn joint(name: &str, kind: JointKind, x: f64, y: f64, z: f64, body: RigidBody) -> Joint {
    Joint::new(
        name.to_string(),
        kind,
        Isometry3::translation(x, y, z),
        body,
    )
}

pub(crate) struct TwoJointModel {
    pub chain: KinematicChain,
    pub root: JointID,
    pub child: JointID,
}

/// A fixed root with a single revolute child that rotates around Z and is placed 1 m along X.
pub(crate) fn two_joint_chain() -> TwoJointModel {
    let mut chain = KinematicChain::new();
    let root = chain
        .add_joint(joint(
            "root",
            JointKind::Anchor,
            0.0,
            0.0,
            0.0,
            body(2.0, Vector3::zeros()),
        ))
        .unwrap();
    let child = chain
        .attach_joint(
            joint(
                "child",
                JointKind::revolute_z(),
                1.0,
                0.0,
                0.0,
                body(1.0, Vector3::new(0.5, 0.0, 0.0)),
            ),
            &root,
        )
        .unwrap();
    chain.set_root(&root).unwrap();

    TwoJointModel { chain, root, child }
}

pub(crate) struct ArmModel {
    pub chain: KinematicChain,
    pub base: JointID,
    pub shoulder: JointID,
    pub elbow: JointID,
    pub slider: JointID,
    pub wrist: JointID,
    pub tool: JointID,
}

/// A fixed base arm with four degrees of freedom around different axes and an anchored tool.
pub(crate) fn arm() -> ArmModel {
    let mut chain = KinematicChain::new();
    let base = chain
        .add_joint(joint(
            "base",
            JointKind::Anchor,
            0.0,
            0.0,
            0.0,
            body(5.0, Vector3::new(0.0, 0.0, 0.1)),
        ))
        .unwrap();
    let shoulder = chain
        .attach_joint(
            joint(
                "shoulder",
                JointKind::revolute_z(),
                0.0,
                0.0,
                0.5,
                body(2.0, Vector3::new(0.25, 0.0, 0.0)),
            ),
            &base,
        )
        .unwrap();
    let elbow = chain
        .attach_joint(
            joint(
                "elbow",
                JointKind::revolute_y(),
                0.5,
                0.0,
                0.0,
                body(1.5, Vector3::new(0.2, 0.0, 0.05)),
            ),
            &shoulder,
        )
        .unwrap();
    let slider = chain
        .attach_joint(
            joint(
                "slider",
                JointKind::prismatic_x(),
                0.4,
                0.0,
                0.0,
                body(0.5, Vector3::new(0.1, 0.02, 0.0)),
            ),
            &elbow,
        )
        .unwrap();
    let wrist = chain
        .attach_joint(
            joint(
                "wrist",
                JointKind::revolute(Vector3::new(1.0, 1.0, 0.0)),
                0.2,
                0.0,
                0.0,
                body(0.3, Vector3::new(0.05, 0.0, 0.01)),
            ),
            &slider,
        )
        .unwrap();
    let tool = chain
        .attach_joint(
            joint(
                "tool",
                JointKind::Anchor,
                0.1,
                0.0,
                0.0,
                body(0.2, Vector3::new(0.02, 0.0, 0.0)),
            ),
            &wrist,
        )
        .unwrap();
    chain.set_root(&base).unwrap();

    ArmModel {
        chain,
        base,
        shoulder,
        elbow,
        slider,
        wrist,
        tool,
    }
}

pub(crate) struct HumanoidModel {
    pub chain: KinematicChain,
    pub waist: JointID,
    pub chest: JointID,
    pub head: JointID,
    pub left_elbow: JointID,
    pub left_hand: JointID,
    pub right_hand: JointID,
    pub left_knee: JointID,
    pub left_foot: JointID,
    pub right_foot: JointID,
}

fn add_arm(chain: &mut KinematicChain, chest: &JointID, side: &str, y: f64) -> (JointID, JointID) {
    let shoulder = chain
        .attach_joint(
            joint(
                &format!("{}_shoulder", side),
                JointKind::revolute_y(),
                0.0,
                y,
                0.25,
                body(1.5, Vector3::new(0.0, 0.0, -0.12)),
            ),
            chest,
        )
        .unwrap();
    let elbow = chain
        .attach_joint(
            joint(
                &format!("{}_elbow", side),
                JointKind::revolute_y(),
                0.0,
                0.0,
                -0.25,
                body(1.0, Vector3::new(0.0, 0.0, -0.1)),
            ),
            &shoulder,
        )
        .unwrap();
    let hand = chain
        .attach_joint(
            joint(
                &format!("{}_hand", side),
                JointKind::Anchor,
                0.0,
                0.0,
                -0.25,
                body(0.4, Vector3::new(0.0, 0.0, -0.05)),
            ),
            &elbow,
        )
        .unwrap();

    (elbow, hand)
}

fn add_leg(chain: &mut KinematicChain, waist: &JointID, side: &str, y: f64) -> (JointID, JointID) {
    let hip = chain
        .attach_joint(
            joint(
                &format!("{}_hip", side),
                JointKind::revolute_x(),
                0.0,
                y,
                -0.1,
                body(2.5, Vector3::new(0.0, 0.0, -0.2)),
            ),
            waist,
        )
        .unwrap();
    let knee = chain
        .attach_joint(
            joint(
                &format!("{}_knee", side),
                JointKind::revolute_y(),
                0.0,
                0.0,
                -0.4,
                body(2.0, Vector3::new(0.0, 0.0, -0.2)),
            ),
            &hip,
        )
        .unwrap();
    let ankle = chain
        .attach_joint(
            joint(
                &format!("{}_ankle", side),
                JointKind::revolute_y(),
                0.0,
                0.0,
                -0.4,
                body(0.8, Vector3::new(0.02, 0.0, -0.03)),
            ),
            &knee,
        )
        .unwrap();
    let foot = chain
        .attach_joint(
            joint(
                &format!("{}_foot", side),
                JointKind::Anchor,
                0.0,
                0.0,
                -0.05,
                body(0.2, Vector3::new(0.05, 0.0, 0.0)),
            ),
            &ankle,
        )
        .unwrap();

    (knee, foot)
}

/// A humanoid with a free-flyer waist, a chest, a head, two arms and two legs. It has 18
/// degrees of freedom.
pub(crate) fn humanoid() -> HumanoidModel {
    let mut chain = KinematicChain::new();
    let waist = chain
        .add_joint(joint(
            "waist",
            JointKind::FreeFlyer,
            0.0,
            0.0,
            0.0,
            body(10.0, Vector3::new(0.0, 0.0, 0.05)),
        ))
        .unwrap();
    let chest = chain
        .attach_joint(
            joint(
                "chest",
                JointKind::revolute_z(),
                0.0,
                0.0,
                0.3,
                body(12.0, Vector3::new(0.0, 0.0, 0.15)),
            ),
            &waist,
        )
        .unwrap();
    let head = chain
        .attach_joint(
            joint(
                "head",
                JointKind::revolute_y(),
                0.0,
                0.0,
                0.35,
                body(3.0, Vector3::new(0.02, 0.0, 0.1)),
            ),
            &chest,
        )
        .unwrap();

    let (left_elbow, left_hand) = add_arm(&mut chain, &chest, "left", 0.2);
    let (_, right_hand) = add_arm(&mut chain, &chest, "right", -0.2);
    let (left_knee, left_foot) = add_leg(&mut chain, &waist, "left", 0.1);
    let (_, right_foot) = add_leg(&mut chain, &waist, "right", -0.1);

    chain.set_root(&waist).unwrap();

    HumanoidModel {
        chain,
        waist,
        chest,
        head,
        left_elbow,
        left_hand,
        right_hand,
        left_knee,
        left_foot,
        right_foot,
    }
}
