//! Node storage queried by elements

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};
use crate::math::{Vec3, Vec6};

/// A node with six degrees of freedom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub tag: usize,
    /// Coordinates [X, Y, Z]
    pub crd: Vec3,
    /// Trial displacement [DX, DY, DZ, RX, RY, RZ]
    pub disp_trial: Vec6,
    /// Last converged displacement
    pub disp_commit: Vec6,
    /// Trial velocity
    pub vel_trial: Vec6,
    /// Displacement sensitivity per gradient index
    #[serde(default)]
    pub disp_sensitivity: Vec<Vec6>,
    /// Coordinate sensitivity for the active shape parameter
    #[serde(default)]
    pub crd_sensitivity: Vec3,
}

impl Node {
    /// Create a node at rest
    pub fn new(tag: usize, x: f64, y: f64, z: f64) -> Self {
        Self {
            tag,
            crd: Vec3::new(x, y, z),
            disp_trial: Vec6::zeros(),
            disp_commit: Vec6::zeros(),
            vel_trial: Vec6::zeros(),
            disp_sensitivity: Vec::new(),
            crd_sensitivity: Vec3::zeros(),
        }
    }

    /// Displacement sensitivity for `grad`, zero if none was set
    pub fn displacement_sensitivity(&self, grad: usize) -> Vec6 {
        self.disp_sensitivity.get(grad).copied().unwrap_or_else(Vec6::zeros)
    }
}

/// Container for the nodes elements connect to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Domain {
    nodes: BTreeMap<usize, Node>,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; tags must be unique
    pub fn add_node(&mut self, node: Node) -> FrameResult<()> {
        if self.nodes.contains_key(&node.tag) {
            return Err(FrameError::InvalidConfiguration(format!(
                "node {} already exists",
                node.tag
            )));
        }
        self.nodes.insert(node.tag, node);
        Ok(())
    }

    pub fn node(&self, tag: usize) -> FrameResult<&Node> {
        self.nodes.get(&tag).ok_or(FrameError::NodeNotFound(tag))
    }

    pub fn node_mut(&mut self, tag: usize) -> FrameResult<&mut Node> {
        self.nodes.get_mut(&tag).ok_or(FrameError::NodeNotFound(tag))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn set_trial_displacement(&mut self, tag: usize, disp: Vec6) -> FrameResult<()> {
        self.node_mut(tag)?.disp_trial = disp;
        Ok(())
    }

    pub fn set_trial_velocity(&mut self, tag: usize, vel: Vec6) -> FrameResult<()> {
        self.node_mut(tag)?.vel_trial = vel;
        Ok(())
    }

    /// Accept the trial displacements of every node
    pub fn commit(&mut self) {
        for node in self.nodes.values_mut() {
            node.disp_commit = node.disp_trial;
        }
    }

    /// Restore trial displacements to the last commit
    pub fn revert(&mut self) {
        for node in self.nodes.values_mut() {
            node.disp_trial = node.disp_commit;
        }
    }

    pub fn set_displacement_sensitivity(
        &mut self,
        tag: usize,
        grad: usize,
        sensitivity: Vec6,
    ) -> FrameResult<()> {
        let node = self.node_mut(tag)?;
        if node.disp_sensitivity.len() <= grad {
            node.disp_sensitivity.resize(grad + 1, Vec6::zeros());
        }
        node.disp_sensitivity[grad] = sensitivity;
        Ok(())
    }

    /// Make coordinate `dof` (0 = X, 1 = Y, 2 = Z) of node `tag` the active shape parameter
    pub fn activate_coordinate_parameter(&mut self, tag: usize, dof: usize) -> FrameResult<()> {
        if dof > 2 {
            return Err(FrameError::UnknownParameter(format!(
                "coordinate {} of node {}",
                dof, tag
            )));
        }
        self.node(tag)?;
        self.clear_coordinate_parameter();
        self.node_mut(tag)?.crd_sensitivity[dof] = 1.0;
        Ok(())
    }

    pub fn clear_coordinate_parameter(&mut self) {
        for node in self.nodes.values_mut() {
            node.crd_sensitivity = Vec3::zeros();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_and_missing_nodes() {
        let mut domain = Domain::new();
        domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        assert!(domain.add_node(Node::new(1, 1.0, 0.0, 0.0)).is_err());
        assert!(matches!(domain.node(2), Err(FrameError::NodeNotFound(2))));
    }

    #[test]
    fn test_commit_and_revert() {
        let mut domain = Domain::new();
        domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        let d = Vec6::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        domain.set_trial_displacement(1, d).unwrap();
        domain.commit();
        domain.set_trial_displacement(1, d * 2.0).unwrap();
        domain.revert();
        assert_eq!(domain.node(1).unwrap().disp_trial, d);
    }

    #[test]
    fn test_coordinate_parameter() {
        let mut domain = Domain::new();
        domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        domain.add_node(Node::new(2, 1.0, 0.0, 0.0)).unwrap();
        domain.activate_coordinate_parameter(2, 0).unwrap();
        domain.activate_coordinate_parameter(1, 1).unwrap();

        assert_eq!(domain.node(1).unwrap().crd_sensitivity, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(domain.node(2).unwrap().crd_sensitivity, Vec3::zeros());
        assert!(domain.activate_coordinate_parameter(1, 3).is_err());
    }

    #[test]
    fn test_sensitivity_slots() {
        let mut domain = Domain::new();
        domain.add_node(Node::new(4, 0.0, 0.0, 0.0)).unwrap();
        domain
            .set_displacement_sensitivity(4, 2, Vec6::repeat(1.0))
            .unwrap();
        let node = domain.node(4).unwrap();
        assert_eq!(node.displacement_sensitivity(2), Vec6::repeat(1.0));
        assert_eq!(node.displacement_sensitivity(0), Vec6::zeros());
        assert_eq!(node.displacement_sensitivity(7), Vec6::zeros());
    }
}
