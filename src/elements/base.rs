//! State shared by all two-node frame elements

use crate::config::{FrameOptions, Release};
use crate::domain::Domain;
use crate::error::{FrameError, FrameResult};
use crate::math::{Mat12, Mat6, Vec12, Vec6};
use crate::transform::FrameTransform;

/// Id of the mass density parameter owned by the element base
pub(crate) const PARAM_RHO: u32 = 1;

/// Position in the commit/revert cycle
///
/// `Committed(n)` holds after n commits with no pending trial; `Trial(n)`
/// holds once a trial state has been set on top of commit n.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatePhase {
    Committed(u64),
    Trial(u64),
}

impl StatePhase {
    /// Number of commits since the start
    pub fn commits(self) -> u64 {
        match self {
            StatePhase::Committed(n) | StatePhase::Trial(n) => n,
        }
    }
}

/// Connectivity, options and transformation of a frame element
#[derive(Debug, Clone)]
pub struct FrameBase {
    pub(crate) tag: usize,
    pub(crate) db_tag: usize,
    pub(crate) nodes: [usize; 2],
    pub(crate) transform: Box<dyn FrameTransform>,
    pub(crate) options: FrameOptions,
    pub(crate) bound: bool,
    pub(crate) phase: StatePhase,
    pub(crate) committed_stiffness: Mat12,
}

impl FrameBase {
    pub fn new(
        tag: usize,
        nodes: [usize; 2],
        transform: Box<dyn FrameTransform>,
        options: FrameOptions,
    ) -> Self {
        Self {
            tag,
            db_tag: 0,
            nodes,
            transform,
            options,
            bound: false,
            phase: StatePhase::Committed(0),
            committed_stiffness: Mat12::zeros(),
        }
    }

    pub fn tag(&self) -> usize {
        self.tag
    }

    pub fn db_tag(&self) -> usize {
        self.db_tag
    }

    /// Database tag used by channels; zero until one is assigned
    pub fn set_db_tag(&mut self, tag: usize) {
        self.db_tag = tag;
    }

    pub fn nodes(&self) -> [usize; 2] {
        self.nodes
    }

    pub fn options(&self) -> &FrameOptions {
        &self.options
    }

    pub fn transform(&self) -> &dyn FrameTransform {
        self.transform.as_ref()
    }

    pub fn phase(&self) -> StatePhase {
        self.phase
    }

    /// True once node coordinates have been read
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn length(&self) -> f64 {
        self.transform.initial_length()
    }

    pub(crate) fn require_bound(&self) -> FrameResult<()> {
        if !self.bound {
            return Err(FrameError::NotReady(format!(
                "element {} has not been connected to its nodes",
                self.tag
            )));
        }
        Ok(())
    }

    /// Initialize the transformation from the node coordinates, returning the length
    ///
    /// Does not mark the element as bound; the caller does once its own
    /// geometry-dependent data is ready.
    pub(crate) fn initialize_geometry(&mut self, domain: &Domain) -> FrameResult<f64> {
        let xi = domain.node(self.nodes[0])?.crd;
        let xj = domain.node(self.nodes[1])?.crd;
        self.transform.initialize(&xi, &xj)?;
        let length = self.transform.initial_length();
        if !(length > 0.0) {
            return Err(FrameError::InvalidConfiguration(format!(
                "element {} has zero length",
                self.tag
            )));
        }
        Ok(length)
    }

    /// Push the trial node displacements into the transformation
    pub(crate) fn update_transform(&mut self, domain: &Domain) -> FrameResult<()> {
        self.require_bound()?;
        let ui = domain.node(self.nodes[0])?.disp_trial;
        let uj = domain.node(self.nodes[1])?.disp_trial;
        self.transform.update(&ui, &uj)?;
        self.phase = StatePhase::Trial(self.phase.commits());
        Ok(())
    }

    pub(crate) fn mark_committed(&mut self) {
        let n = self.phase.commits() + 1;
        log::debug!("element {} committed state {}", self.tag, n);
        self.phase = StatePhase::Committed(n);
    }

    pub(crate) fn mark_reverted(&mut self) {
        self.phase = StatePhase::Committed(self.phase.commits());
    }

    pub(crate) fn mark_reset(&mut self) {
        self.phase = StatePhase::Committed(0);
        self.committed_stiffness = Mat12::zeros();
    }

    /// Pass the coordinate sensitivity of the active shape parameter to the transformation
    pub(crate) fn load_coordinate_sensitivity(&mut self, domain: &Domain) -> FrameResult<()> {
        let dxi = domain.node(self.nodes[0])?.crd_sensitivity;
        let dxj = domain.node(self.nodes[1])?.crd_sensitivity;
        self.transform.set_coordinate_sensitivity(&dxi, &dxj);
        Ok(())
    }

    pub(crate) fn displacement_sensitivity(
        &self,
        domain: &Domain,
        grad: usize,
    ) -> FrameResult<(Vec6, Vec6)> {
        Ok((
            domain.node(self.nodes[0])?.displacement_sensitivity(grad),
            domain.node(self.nodes[1])?.displacement_sensitivity(grad),
        ))
    }

    pub(crate) fn node_velocities(&self, domain: &Domain) -> FrameResult<Vec12> {
        let vi = domain.node(self.nodes[0])?.vel_trial;
        let vj = domain.node(self.nodes[1])?.vel_trial;
        let mut v = Vec12::zeros();
        v.fixed_rows_mut::<6>(0).copy_from(&vi);
        v.fixed_rows_mut::<6>(6).copy_from(&vj);
        Ok(v)
    }

    /// Basic mass: axial term ρL only
    pub(crate) fn basic_mass(&self) -> Mat6 {
        let mut m = Mat6::zeros();
        m[(0, 0)] = self.options.mass.density * self.length();
        m
    }

    /// Global mass matrix, lumped or consistent
    pub(crate) fn mass_matrix(&self) -> FrameResult<Mat12> {
        self.require_bound()?;
        let rho = self.options.mass.density;
        if rho == 0.0 {
            return Ok(Mat12::zeros());
        }
        if self.options.mass.consistent {
            return Ok(self.transform.global_consistent_mass(rho));
        }
        let m = 0.5 * rho * self.length();
        let mut mass = Mat12::zeros();
        for dof in [0, 1, 2, 6, 7, 8] {
            mass[(dof, dof)] = m;
        }
        Ok(mass)
    }

    /// Header slots shared by both element kinds: αM, βK, βK0, βKc, releaseZ, releaseY
    pub(crate) fn option_slots(&self) -> [f64; 6] {
        let r = &self.options.rayleigh;
        [
            r.alpha_m,
            r.beta_k,
            r.beta_k0,
            r.beta_kc,
            self.options.releases.z.code(),
            self.options.releases.y.code(),
        ]
    }

    pub(crate) fn read_option_slots(&mut self, slots: &[f64]) -> FrameResult<()> {
        let r = &mut self.options.rayleigh;
        r.alpha_m = slots[0];
        r.beta_k = slots[1];
        r.beta_k0 = slots[2];
        r.beta_kc = slots[3];
        self.options.releases.z = Release::from_code(slots[4])?;
        self.options.releases.y = Release::from_code(slots[5])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Node;
    use crate::math::Vec3;
    use crate::transform::LinearTransform;
    use approx::assert_relative_eq;

    fn base(options: FrameOptions) -> (FrameBase, Domain) {
        let mut domain = Domain::new();
        domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        domain.add_node(Node::new(2, 2.0, 0.0, 0.0)).unwrap();
        let t = Box::new(LinearTransform::new(Vec3::new(0.0, 0.0, 1.0)));
        (FrameBase::new(7, [1, 2], t, options), domain)
    }

    #[test]
    fn test_lumped_mass() {
        let (mut b, domain) = base(FrameOptions::default().with_density(3.0));
        assert!(matches!(b.mass_matrix(), Err(FrameError::NotReady(_))));
        b.initialize_geometry(&domain).unwrap();
        b.bound = true;

        let m = b.mass_matrix().unwrap();
        assert_relative_eq!(m[(0, 0)], 3.0);
        assert_relative_eq!(m[(8, 8)], 3.0);
        assert_relative_eq!(m[(3, 3)], 0.0);
        assert_relative_eq!(b.basic_mass()[(0, 0)], 6.0);
    }

    #[test]
    fn test_phase_transitions() {
        let (mut b, mut domain) = base(FrameOptions::default());
        assert!(b.update_transform(&domain).is_err());
        b.initialize_geometry(&domain).unwrap();
        b.bound = true;

        domain
            .set_trial_displacement(2, Vec6::new(0.1, 0.0, 0.0, 0.0, 0.0, 0.0))
            .unwrap();
        b.update_transform(&domain).unwrap();
        assert_eq!(b.phase(), StatePhase::Trial(0));
        b.mark_committed();
        assert_eq!(b.phase(), StatePhase::Committed(1));
        b.update_transform(&domain).unwrap();
        b.mark_reverted();
        assert_eq!(b.phase(), StatePhase::Committed(1));
        b.mark_reset();
        assert_eq!(b.phase(), StatePhase::Committed(0));
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut domain = Domain::new();
        domain.add_node(Node::new(1, 1.0, 1.0, 1.0)).unwrap();
        domain.add_node(Node::new(2, 1.0, 1.0, 1.0)).unwrap();
        let t = Box::new(LinearTransform::new(Vec3::new(0.0, 0.0, 1.0)));
        let mut b = FrameBase::new(1, [1, 2], t, FrameOptions::default());
        assert!(matches!(
            b.initialize_geometry(&domain),
            Err(FrameError::InvalidConfiguration(_))
        ));
    }
}
