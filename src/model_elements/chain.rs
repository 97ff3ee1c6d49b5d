extern crate nalgebra as na;

use log::{debug, warn};
use na::DVector;

use crate::Error;

use super::joint::{Joint, JointID, FREE_FLYER_DOF};

#[cfg(test)]
#[path = "chain_tests.rs"]
mod chain_tests;

/// The path between two joints in a [KinematicChain].
///
/// The path runs from the start joint up to the lowest common ancestor of both joints and
/// then down to the end joint.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ChainPath {
    /// The joints from the start joint up to, but not including, the common ancestor.
    pub start_side: Vec<JointID>,

    /// The lowest common ancestor of the start and end joints.
    pub common_ancestor: JointID,

    /// The joints from the child of the common ancestor down to the end joint.
    pub end_side: Vec<JointID>,
}

/// Defines the kinematic tree of a robot.
///
/// Joints are stored in an arena and referred to by their [JointID]. Each joint has at most one
/// parent joint. Joints are added without a parent and linked to their parent afterwards, so
/// the arena can temporarily hold multiple separate trees. The tree of the robot is the one
/// containing the root joint.
///
/// Once the chain is initialized the structure is frozen. Initialization flattens the tree
/// into the order used for the configuration vector and assigns each joint the range of ranks
/// of its degrees of freedom. Without an explicit order the joints are flattened depth-first,
/// parents before children, with the children visited in the order in which they were linked.
#[derive(Clone, Debug)]
pub struct KinematicChain {
    /// The joints in the chain, indexed by [JointID].
    joints: Vec<Joint>,

    /// The parent of each joint.
    parent_of: Vec<Option<JointID>>,

    /// The direct children of each joint, in the order in which they were linked.
    children_of: Vec<Vec<JointID>>,

    /// The root joint of the robot.
    root: Option<JointID>,

    /// The order of the joints in the configuration vector, if provided by the user.
    joint_order: Option<Vec<JointID>>,

    /// The joints reachable from the root in configuration order.
    flattened: Vec<JointID>,

    /// The joints reachable from the root with every parent visited before its children.
    traversal: Vec<JointID>,

    /// The rank of the first degree of freedom of each joint. Joints that are not reachable
    /// from the root have no rank.
    rank_of: Vec<Option<usize>>,

    /// The joint and the local degree of freedom for each rank in the configuration vector.
    owner_of_rank: Vec<(JointID, usize)>,

    /// The total mass of the joints reachable from the root.
    mass: f64,

    is_initialized: bool,
}

impl KinematicChain {
    /// Adds a new joint without a parent to the chain.
    ///
    /// ## Parameters
    ///
    /// * 'joint' - The joint that should be stored.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the chain has been initialized.
    pub fn add_joint(&mut self, joint: Joint) -> Result<JointID, Error> {
        if self.is_initialized {
            return Err(Error::AlreadyInitialized);
        }

        let id = JointID::new(self.joints.len());
        self.joints.push(joint);
        self.parent_of.push(None);
        self.children_of.push(Vec::new());
        self.rank_of.push(None);

        Ok(id)
    }

    /// Links the child joint to the parent joint.
    ///
    /// ## Parameters
    ///
    /// * 'parent' - The ID of the parent joint.
    /// * 'child' - The ID of the child joint.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the chain has been initialized.
    /// * [Error::MissingJoint] - Returned when either joint is not part of the chain.
    /// * [Error::JointAlreadyExists] - Returned when the child already has a parent.
    /// * [Error::CyclicChain] - Returned when the child is an ancestor of the parent.
    /// * [Error::InvalidRoot] - Returned when the child is the root of the chain.
    pub fn add_child(&mut self, parent: &JointID, child: &JointID) -> Result<(), Error> {
        if self.is_initialized {
            return Err(Error::AlreadyInitialized);
        }

        self.ensure_joint(parent)?;
        self.ensure_joint(child)?;

        if self.root == Some(*child) {
            return Err(Error::InvalidRoot { id: *child });
        }

        if self.parent_of[child.index()].is_some() {
            return Err(Error::JointAlreadyExists { id: *child });
        }

        if self.ancestors_of(parent).any(|id| id == *child) {
            return Err(Error::CyclicChain { id: *child });
        }

        self.parent_of[child.index()] = Some(*parent);
        self.children_of[parent.index()].push(*child);
        Ok(())
    }

    /// Adds a new joint to the chain and links it to the given parent.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the chain has been initialized.
    /// * [Error::MissingJoint] - Returned when the parent is not part of the chain.
    pub fn attach_joint(&mut self, joint: Joint, parent: &JointID) -> Result<JointID, Error> {
        self.ensure_joint(parent)?;
        let id = self.add_joint(joint)?;
        self.add_child(parent, &id)?;
        Ok(id)
    }

    /// Returns an iterator over the joint and all its ancestors, starting at the joint.
    fn ancestors_of<'a>(&'a self, id: &JointID) -> impl Iterator<Item = JointID> + 'a {
        std::iter::successors(Some(*id), move |current| self.parent_of[current.index()])
    }

    /// Returns the direct children of the given joint.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the chain.
    pub fn children(&self, id: &JointID) -> Result<&[JointID], Error> {
        self.ensure_joint(id)?;
        Ok(&self.children_of[id.index()])
    }

    /// Returns the (lower, upper) bounds for the degree of freedom at the given rank.
    ///
    /// ## Errors
    ///
    /// * [Error::NotInitialized] - Returned when the chain has not been initialized.
    /// * [Error::InvalidRank] - Returned when the rank is not smaller than [KinematicChain::number_dof()].
    pub fn dof_bounds(&self, rank: usize) -> Result<(f64, f64), Error> {
        let (joint, dof) = self.owner_of(rank)?;
        match self.joints[joint.index()].dof_space(dof) {
            Some(space) => Ok(space.bounds()),
            None => Err(Error::InvalidRank {
                rank,
                number_dof: self.number_dof(),
            }),
        }
    }

    /// Returns the (lower, upper) bounds for the degree of freedom at the given rank, given
    /// a reference configuration.
    ///
    /// Only the entry of the reference at the given rank is used. Limited degrees of freedom
    /// ignore the reference. Periodic degrees of freedom return the one period window centered
    /// on the reference value.
    ///
    /// ## Errors
    ///
    /// * [Error::NotInitialized] - Returned when the chain has not been initialized.
    /// * [Error::InvalidRank] - Returned when the rank is not smaller than [KinematicChain::number_dof()].
    /// * [Error::DimensionMismatch] - Returned when the reference does not have [KinematicChain::number_dof()] elements.
    pub fn dof_bounds_with_reference(
        &self,
        rank: usize,
        reference: &DVector<f64>,
    ) -> Result<(f64, f64), Error> {
        let (joint, dof) = self.owner_of(rank)?;
        if reference.len() != self.number_dof() {
            return Err(Error::DimensionMismatch {
                expected: self.number_dof(),
                actual: reference.len(),
            });
        }

        match self.joints[joint.index()].dof_space(dof) {
            Some(space) => Ok(space.bounds_around(reference[rank])),
            None => Err(Error::InvalidRank {
                rank,
                number_dof: self.number_dof(),
            }),
        }
    }

    fn ensure_joint(&self, id: &JointID) -> Result<(), Error> {
        if id.index() >= self.joints.len() {
            return Err(Error::MissingJoint { id: *id });
        }

        Ok(())
    }

    /// Returns the joints reachable from the root in configuration order.
    ///
    /// The collection is empty until the chain is initialized.
    pub fn flattened_joints(&self) -> &[JointID] {
        &self.flattened
    }

    /// Returns a value indicating whether the chain contains a joint with the given ID.
    pub fn has_joint(&self, id: &JointID) -> bool {
        id.index() < self.joints.len()
    }

    /// Finalizes the structure of the chain.
    ///
    /// Flattens the tree into the configuration order, assigns the ranks of the degrees of
    /// freedom of each joint and computes the total mass. Calling this method on an initialized
    /// chain has no effect.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingRoot] - Returned when no root joint was set.
    /// * [Error::InvalidJointOrder] - Returned when the joint order provided with
    ///   [KinematicChain::set_joint_order_in_config()] does not contain each joint of the
    ///   robot exactly once.
    pub fn initialize(&mut self) -> Result<(), Error> {
        if self.is_initialized {
            return Ok(());
        }

        let root = match self.root {
            Some(r) => r,
            None => return Err(Error::MissingRoot),
        };

        let traversal = self.depth_first_from(&root);

        let flattened = match &self.joint_order {
            None => traversal.clone(),
            Some(order) => {
                let mut seen = vec![false; self.joints.len()];
                for id in traversal.iter() {
                    seen[id.index()] = true;
                }

                for id in order.iter() {
                    let is_reachable = self.has_joint(id) && seen[id.index()];
                    if !is_reachable {
                        warn!(
                            "Rejecting joint order: {} appears twice or is not reachable from the root",
                            id
                        );
                        return Err(Error::InvalidJointOrder { id: *id });
                    }
                    seen[id.index()] = false;
                }

                if let Some(missing) = traversal.iter().find(|id| seen[id.index()]) {
                    warn!("Rejecting joint order: {} is missing", missing);
                    return Err(Error::InvalidJointOrder { id: *missing });
                }

                order.clone()
            }
        };

        let mut rank = 0;
        let mut owner_of_rank = Vec::new();
        for id in flattened.iter() {
            let joint = &self.joints[id.index()];
            self.rank_of[id.index()] = Some(rank);
            for dof in 0..joint.number_dof() {
                owner_of_rank.push((*id, dof));
            }
            rank += joint.number_dof();
        }

        self.mass = flattened
            .iter()
            .map(|id| self.joints[id.index()].body().mass_in_kg())
            .sum();
        self.owner_of_rank = owner_of_rank;
        self.flattened = flattened;
        self.traversal = traversal;
        self.is_initialized = true;

        debug!(
            "Initialized kinematic chain with {} joints, {} degrees of freedom and a mass of {} kg",
            self.flattened.len(),
            rank,
            self.mass
        );

        Ok(())
    }

    /// Returns a value indicating whether the chain has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Returns the joints between the start and end joints, ordered from the start joint
    /// via the lowest common ancestor to the end joint.
    ///
    /// The path from a joint to itself contains only the joint.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when either joint is not part of the chain.
    /// * [Error::NotConnected] - Returned when the joints are not in the same tree.
    pub fn joints_between(&self, start: &JointID, end: &JointID) -> Result<Vec<JointID>, Error> {
        let path = self.path_between(start, end)?;

        let mut result = path.start_side;
        result.push(path.common_ancestor);
        result.extend(path.end_side);
        Ok(result)
    }

    /// Returns the joint with the given ID.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the chain.
    pub fn joint(&self, id: &JointID) -> Result<&Joint, Error> {
        self.ensure_joint(id)?;
        Ok(&self.joints[id.index()])
    }

    /// Returns the joint for the given ID without checking that the joint exists.
    ///
    /// This function will panic if there is no [Joint] with the given ID.
    pub(crate) fn joint_unchecked(&self, id: &JointID) -> &Joint {
        &self.joints[id.index()]
    }

    /// Returns the total mass of the robot in kg.
    ///
    /// The mass is computed during initialization and is zero before.
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Creates a new, empty [KinematicChain]
    pub fn new() -> Self {
        Self {
            joints: Vec::new(),
            parent_of: Vec::new(),
            children_of: Vec::new(),
            root: None,
            joint_order: None,
            flattened: Vec::new(),
            traversal: Vec::new(),
            rank_of: Vec::new(),
            owner_of_rank: Vec::new(),
            mass: 0.0,
            is_initialized: false,
        }
    }

    /// Returns the number of degrees of freedom of the robot, which equals the length of the
    /// configuration vector.
    ///
    /// Returns zero before the chain is initialized.
    pub fn number_dof(&self) -> usize {
        self.owner_of_rank.len()
    }

    /// Returns the number of joints stored in the chain, including joints that are not
    /// reachable from the root.
    pub fn number_of_joints(&self) -> usize {
        self.joints.len()
    }

    fn owner_of(&self, rank: usize) -> Result<(JointID, usize), Error> {
        if !self.is_initialized {
            return Err(Error::NotInitialized);
        }

        match self.owner_of_rank.get(rank) {
            Some(owner) => Ok(*owner),
            None => Err(Error::InvalidRank {
                rank,
                number_dof: self.number_dof(),
            }),
        }
    }

    /// Returns the parent of the given joint, or `None` for the root of a tree.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the chain.
    pub fn parent(&self, id: &JointID) -> Result<Option<&JointID>, Error> {
        self.ensure_joint(id)?;
        Ok(self.parent_of[id.index()].as_ref())
    }

    /// Returns the parent of the given joint without checking that the joint exists.
    pub(crate) fn parent_unchecked(&self, id: &JointID) -> Option<JointID> {
        self.parent_of[id.index()]
    }

    /// Returns the path between the start and end joints split at the lowest common ancestor.
    pub(crate) fn path_between(&self, start: &JointID, end: &JointID) -> Result<ChainPath, Error> {
        self.ensure_joint(start)?;
        self.ensure_joint(end)?;

        let end_ancestors: Vec<JointID> = self.ancestors_of(end).collect();

        let mut start_side = Vec::new();
        for id in self.ancestors_of(start) {
            if let Some(position) = end_ancestors.iter().position(|a| *a == id) {
                let mut end_side = end_ancestors[..position].to_vec();
                end_side.reverse();
                return Ok(ChainPath {
                    start_side,
                    common_ancestor: id,
                    end_side,
                });
            }

            start_side.push(id);
        }

        Err(Error::NotConnected {
            from: *start,
            to: *end,
        })
    }

    /// Returns the rank of the first degree of freedom of the joint in the configuration vector.
    ///
    /// ## Errors
    ///
    /// * [Error::MissingJoint] - Returned when the joint is not part of the chain.
    /// * [Error::NotInitialized] - Returned when the chain has not been initialized.
    /// * [Error::NotConnected] - Returned when the joint is not reachable from the root.
    pub fn rank_in_configuration(&self, id: &JointID) -> Result<usize, Error> {
        self.ensure_joint(id)?;
        if !self.is_initialized {
            return Err(Error::NotInitialized);
        }

        match self.rank_of[id.index()] {
            Some(rank) => Ok(rank),
            None => Err(Error::NotConnected {
                from: self.root.unwrap_or(*id),
                to: *id,
            }),
        }
    }

    /// Returns the rank of the first degree of freedom of the joint without checks. Joints
    /// that are not reachable from the root return `None`.
    pub(crate) fn rank_unchecked(&self, id: &JointID) -> Option<usize> {
        self.rank_of[id.index()]
    }

    /// Returns the ranks occupied by the root joint if the root is a free-flyer.
    pub(crate) fn root_free_flyer_ranks(&self) -> Option<std::ops::Range<usize>> {
        let root = self.root?;
        if !self.joints[root.index()].kind().is_free_flyer() {
            return None;
        }

        let start = self.rank_of[root.index()]?;
        Some(start..start + FREE_FLYER_DOF)
    }

    /// Returns the ID of the root joint, if one was set.
    pub fn root(&self) -> Option<&JointID> {
        self.root.as_ref()
    }

    /// Sets the order of the joints in the configuration vector.
    ///
    /// The order is validated when the chain is initialized. It should contain each joint
    /// reachable from the root exactly once.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the chain has been initialized.
    pub fn set_joint_order_in_config(&mut self, order: Vec<JointID>) -> Result<(), Error> {
        if self.is_initialized {
            return Err(Error::AlreadyInitialized);
        }

        self.joint_order = Some(order);
        Ok(())
    }

    /// Sets the root joint of the robot.
    ///
    /// ## Errors
    ///
    /// * [Error::AlreadyInitialized] - Returned when the chain has been initialized.
    /// * [Error::MissingJoint] - Returned when the joint is not part of the chain.
    /// * [Error::InvalidRoot] - Returned when the joint has a parent.
    pub fn set_root(&mut self, id: &JointID) -> Result<(), Error> {
        if self.is_initialized {
            return Err(Error::AlreadyInitialized);
        }

        self.ensure_joint(id)?;
        if self.parent_of[id.index()].is_some() {
            return Err(Error::InvalidRoot { id: *id });
        }

        self.root = Some(*id);
        Ok(())
    }

    /// Returns the joints reachable from the root, each parent before its children.
    pub(crate) fn traversal_order(&self) -> &[JointID] {
        &self.traversal
    }

    fn depth_first_from(&self, root: &JointID) -> Vec<JointID> {
        let mut result = Vec::with_capacity(self.joints.len());
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.children_of[id.index()].iter().rev());
        }

        result
    }
}

impl Default for KinematicChain {
    fn default() -> Self {
        Self::new()
    }
}
