//! Closed-form prismatic frame element

use serde::{Deserialize, Serialize};

use super::base::{FrameBase, PARAM_RHO};
use super::{parse_common_response, FrameElement, TangentRate, TangentState};
use crate::config::{FrameOptions, GeometryLevel, Release};
use crate::domain::Domain;
use crate::error::{FrameError, FrameResult};
use crate::math::{basic_elastic_stiffness, stability_block, Mat6, Vec12, Vec5, Vec6};
use crate::parameter::ParameterHandle;
use crate::response::{ElementResponse, Response, ResponseValue};
use crate::sections::{FrameSection, SectionCode};
use crate::serialization::{class_tags, Channel, ObjectBroker};
use crate::transform::{FrameTransform, LinearTransform};

const HEADER_LEN: usize = 20;

const PARAM_E: u32 = 11;
const PARAM_A: u32 = 12;
const PARAM_IZ: u32 = 13;
const PARAM_IY: u32 = 14;
const PARAM_G: u32 = 15;
const PARAM_J: u32 = 16;

/// Torsional constant used when a section carries no torsion
const RIGID_TORSION: f64 = 1.0e10;

/// Elastic properties of a prismatic member
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrismaticProperties {
    /// Cross-sectional area
    pub area: f64,
    /// Modulus of elasticity
    pub e: f64,
    /// Shear modulus
    pub g: f64,
    /// Torsional constant
    pub jx: f64,
    /// Moment of inertia about local y
    pub iy: f64,
    /// Moment of inertia about local z
    pub iz: f64,
}

impl PrismaticProperties {
    pub fn new(area: f64, e: f64, g: f64, jx: f64, iy: f64, iz: f64) -> Self {
        Self {
            area,
            e,
            g,
            jx,
            iy,
            iz,
        }
    }

    /// Read rigidities from the initial tangent of a section
    ///
    /// Moduli are set to one so the section's EA, EI and GJ land in the
    /// geometric slots. A section without torsion gets a large GJ.
    pub fn from_section(section: &dyn FrameSection) -> Self {
        let k = section.initial_tangent();
        let mut props = Self::new(0.0, 1.0, 1.0, 0.0, 0.0, 0.0);
        for (i, code) in section.codes().iter().enumerate() {
            match code {
                SectionCode::P => props.area = k[(i, i)],
                SectionCode::Mz => props.iz = k[(i, i)],
                SectionCode::My => props.iy = k[(i, i)],
                SectionCode::T => props.jx = k[(i, i)],
                SectionCode::Vy | SectionCode::Vz => {}
            }
        }
        if props.jx == 0.0 {
            log::warn!(
                "section {} has no torsion, setting GJ = {:e}",
                section.tag(),
                RIGID_TORSION
            );
            props.jx = RIGID_TORSION;
        }
        props
    }

    fn basic_stiffness(&self, length: f64, z: Release, y: Release) -> Mat6 {
        basic_elastic_stiffness(self.e, self.g, self.area, self.jx, self.iy, self.iz, length, z, y)
    }

    /// Derivative of the linear basic stiffness with respect to one property
    fn basic_stiffness_sensitivity(&self, id: u32, length: f64, z: Release, y: Release) -> Mat6 {
        let p = self;
        // The stiffness is linear in each factor of EA, EI and GJ
        let (e, g, a, jx, iy, iz) = match id {
            PARAM_E => (1.0, 0.0, p.area, 0.0, p.iy, p.iz),
            PARAM_G => (0.0, 1.0, 0.0, p.jx, 0.0, 0.0),
            PARAM_A => (p.e, 0.0, 1.0, 0.0, 0.0, 0.0),
            PARAM_IZ => (p.e, 0.0, 0.0, 0.0, 0.0, 1.0),
            PARAM_IY => (p.e, 0.0, 0.0, 0.0, 1.0, 0.0),
            PARAM_J => (0.0, p.g, 0.0, 1.0, 0.0, 0.0),
            _ => return Mat6::zeros(),
        };
        basic_elastic_stiffness(e, g, a, jx, iy, iz, length, z, y)
    }
}

/// Elastic frame element with closed-form basic stiffness
///
/// The geometry level adds a linearized P-Delta correction or replaces the
/// bending blocks with exact stability functions.
#[derive(Debug, Clone)]
pub struct PrismaticFrame {
    base: FrameBase,
    props: PrismaticProperties,
    geometry: GeometryLevel,
    /// Linear material stiffness
    km: Mat6,
    /// Current basic stiffness
    kb: Mat6,
    q: Vec6,
    kb_commit: Mat6,
    q_commit: Vec6,
    parameter_id: u32,
}

impl PrismaticFrame {
    pub fn new(
        tag: usize,
        nodes: [usize; 2],
        props: PrismaticProperties,
        geometry: GeometryLevel,
        transform: Box<dyn FrameTransform>,
        options: FrameOptions,
    ) -> Self {
        Self {
            base: FrameBase::new(tag, nodes, transform, options),
            props,
            geometry,
            km: Mat6::zeros(),
            kb: Mat6::zeros(),
            q: Vec6::zeros(),
            kb_commit: Mat6::zeros(),
            q_commit: Vec6::zeros(),
            parameter_id: 0,
        }
    }

    /// Create from the initial tangent of a section prototype
    pub fn from_section(
        tag: usize,
        nodes: [usize; 2],
        section: &dyn FrameSection,
        geometry: GeometryLevel,
        transform: Box<dyn FrameTransform>,
        options: FrameOptions,
    ) -> Self {
        let props = PrismaticProperties::from_section(section);
        Self::new(tag, nodes, props, geometry, transform, options)
    }

    /// Empty element to be filled by [`FrameElement::recv_self`]
    pub fn blank() -> Self {
        Self::new(
            0,
            [0, 0],
            PrismaticProperties::default(),
            GeometryLevel::Linear,
            Box::new(LinearTransform::default()),
            FrameOptions::default(),
        )
    }

    pub fn properties(&self) -> &PrismaticProperties {
        &self.props
    }

    pub fn geometry(&self) -> GeometryLevel {
        self.geometry
    }

    fn form_material_stiffness(&mut self) {
        let r = self.base.options.releases;
        self.km = self.props.basic_stiffness(self.base.length(), r.z, r.y);
    }

    /// Basic stiffness and force for the transformation's trial deformation
    fn form_state(&mut self) {
        let v = self.base.transform.basic_trial_disp();
        let length = self.base.length();
        let n = self.km[(0, 0)] * v[0];
        let releases = self.base.options.releases;

        let mut kb = self.km;
        match self.geometry {
            GeometryLevel::Linear => {}
            GeometryLevel::PDelta => {
                kb[(1, 1)] += 4.0 * n / length;
                kb[(2, 2)] += 4.0 * n / length;
                kb[(1, 2)] -= n / length;
                kb[(2, 1)] -= n / length;
            }
            GeometryLevel::Exact => {
                let planes = [
                    (1, self.props.iz, releases.z),
                    (3, self.props.iy, releases.y),
                ];
                // A released plane keeps its condensed linear block from km,
                // an unreleased one is rebuilt from km on every call
                for (offset, inertia, release) in planes {
                    if release != Release::None {
                        continue;
                    }
                    if let Some((kii, kij)) = stability_block(self.props.e * inertia, n, length) {
                        kb[(offset, offset)] = kii;
                        kb[(offset + 1, offset + 1)] = kii;
                        kb[(offset, offset + 1)] = kij;
                        kb[(offset + 1, offset)] = kij;
                    }
                }
            }
        }

        self.q = kb * v;
        self.kb = kb;
    }

    /// Internal forces [N, Mz, Vy, My, Vz, T] at relative position `x_rel`
    fn forces_at(&self, x_rel: f64) -> Vec6 {
        let x = x_rel.clamp(0.0, 1.0);
        let q = &self.q;
        let one_over_l = 1.0 / self.base.length();
        Vec6::new(
            q[0],
            q[1] * (x - 1.0) + q[2] * x,
            (q[1] + q[2]) * one_over_l,
            q[3] * (x - 1.0) + q[4] * x,
            (q[3] + q[4]) * one_over_l,
            q[5],
        )
    }

    fn require_linear_geometry(&self) -> FrameResult<()> {
        if self.geometry != GeometryLevel::Linear {
            return Err(FrameError::InvalidConfiguration(format!(
                "sensitivity of element {} is only available for linear geometry",
                self.base.tag
            )));
        }
        Ok(())
    }
}

impl FrameElement for PrismaticFrame {
    fn base(&self) -> &FrameBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FrameBase {
        &mut self.base
    }

    fn class_tag(&self) -> usize {
        class_tags::ELEMENT_PRISMATIC_FRAME
    }

    fn clone_box(&self) -> Box<dyn FrameElement> {
        Box::new(self.clone())
    }

    fn set_nodes(&mut self, domain: &Domain) -> FrameResult<()> {
        self.base.bound = false;
        self.base.initialize_geometry(domain)?;
        self.form_material_stiffness();
        // Nodal displacements are first read by update
        self.kb = self.km;
        self.q = Vec6::zeros();
        self.kb_commit = self.kb;
        self.q_commit = self.q;
        self.base.bound = true;
        Ok(())
    }

    fn update(&mut self, domain: &Domain) -> FrameResult<()> {
        self.base.update_transform(domain)?;
        self.form_state();
        Ok(())
    }

    fn basic_force(&self) -> FrameResult<Vec6> {
        self.base.require_bound()?;
        Ok(self.q)
    }

    fn basic_tangent(&self, state: TangentState, rate: TangentRate) -> FrameResult<Mat6> {
        self.base.require_bound()?;
        Ok(match (rate, state) {
            (TangentRate::Mass, _) => self.base.basic_mass(),
            (TangentRate::Stiffness, TangentState::Initial) => self.km,
            (TangentRate::Stiffness, TangentState::Current) => self.kb,
        })
    }

    fn commit_state(&mut self) -> FrameResult<()> {
        self.base.transform.commit_state().map_err(|err| {
            log::warn!("element {}: transformation commit failed: {}", self.base.tag, err);
            FrameError::CommitFailed { failed: 1 }
        })?;
        self.kb_commit = self.kb;
        self.q_commit = self.q;
        if self.base.options.rayleigh.beta_kc != 0.0 {
            self.base.committed_stiffness = self.tangent_stiff()?;
        }
        self.base.mark_committed();
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FrameResult<()> {
        self.base.transform.revert_to_last_commit()?;
        self.kb = self.kb_commit;
        self.q = self.q_commit;
        self.base.mark_reverted();
        Ok(())
    }

    fn revert_to_start(&mut self) -> FrameResult<()> {
        self.base.transform.revert_to_start()?;
        self.kb = self.km;
        self.q = Vec6::zeros();
        self.kb_commit = self.km;
        self.q_commit = Vec6::zeros();
        self.base.mark_reset();
        Ok(())
    }

    fn resisting_force_sensitivity(&mut self, _grad: usize, domain: &Domain) -> FrameResult<Vec12> {
        self.base.require_bound()?;
        self.require_linear_geometry()?;
        self.base.load_coordinate_sensitivity(domain)?;

        let transform = &self.base.transform;
        let length = transform.initial_length();
        let releases = self.base.options.releases;
        let v = transform.basic_trial_disp();
        let p0 = Vec5::zeros();

        let mut dqdh = self
            .props
            .basic_stiffness_sensitivity(self.parameter_id, length, releases.z, releases.y)
            * v;

        let mut p = Vec12::zeros();
        if transform.is_shape_sensitivity() {
            let k_tilde = self.km * length;
            dqdh += k_tilde * v * transform.d1_over_l_dh();
            dqdh += k_tilde * transform.basic_trial_disp_shape_sensitivity() / length;
            p += transform.global_resisting_force_shape_sensitivity(&self.q, &p0);
        }

        p += transform.global_resisting_force(&dqdh, &p0);
        Ok(p)
    }

    fn commit_sensitivity(
        &mut self,
        _grad: usize,
        _num_grads: usize,
        _domain: &Domain,
    ) -> FrameResult<()> {
        self.base.require_bound()?;
        self.require_linear_geometry()
    }

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        if self.base.db_tag == 0 {
            self.base.db_tag = channel.next_db_tag();
        }
        if self.base.transform.db_tag() == 0 {
            self.base.transform.set_db_tag(channel.next_db_tag());
        }

        let p = &self.props;
        let [n1, n2] = self.base.nodes;
        let mut header = vec![
            p.area,
            p.e,
            p.g,
            p.jx,
            p.iy,
            p.iz,
            self.base.options.mass.density,
            if self.base.options.mass.consistent { 1.0 } else { 0.0 },
            self.base.tag as f64,
            n1 as f64,
            n2 as f64,
            self.base.transform.class_tag() as f64,
            self.base.transform.db_tag() as f64,
        ];
        header.extend(self.base.option_slots());
        header.push(self.geometry.code());
        debug_assert_eq!(header.len(), HEADER_LEN);

        channel.send_vector(self.base.db_tag, commit_tag, &header)?;
        self.base.transform.send_self(commit_tag, channel)?;
        log::debug!("sent element {} at commit {}", self.base.tag, commit_tag);
        Ok(())
    }

    fn recv_self(
        &mut self,
        commit_tag: usize,
        channel: &mut dyn Channel,
        broker: &ObjectBroker,
    ) -> FrameResult<()> {
        let header = channel.recv_vector(self.base.db_tag, commit_tag, HEADER_LEN)?;

        self.props = PrismaticProperties::new(
            header[0], header[1], header[2], header[3], header[4], header[5],
        );
        self.base.options.mass.density = header[6];
        self.base.options.mass.consistent = header[7] == 1.0;
        self.base.tag = header[8] as usize;
        self.base.nodes = [header[9] as usize, header[10] as usize];

        let transform_class = header[11] as usize;
        if self.base.transform.class_tag() != transform_class {
            self.base.transform = broker.new_transform(transform_class)?;
        }
        self.base.transform.set_db_tag(header[12] as usize);
        self.base.read_option_slots(&header[13..19])?;
        self.geometry = GeometryLevel::from_code(header[19])?;

        self.base.transform.recv_self(commit_tag, channel)?;
        self.base.bound = false;
        log::debug!("received element {} at commit {}", self.base.tag, commit_tag);
        Ok(())
    }

    fn set_parameter(&mut self, tokens: &[&str]) -> Option<ParameterHandle> {
        let id = match *tokens.first()? {
            "rho" => PARAM_RHO,
            "E" => PARAM_E,
            "A" => PARAM_A,
            "Iz" => PARAM_IZ,
            "Iy" => PARAM_IY,
            "G" => PARAM_G,
            "J" => PARAM_J,
            _ => return None,
        };
        Some(ParameterHandle::element(id))
    }

    fn update_parameter(&mut self, handle: &ParameterHandle, value: f64) -> FrameResult<()> {
        let Some(id) = handle.element else {
            return Err(FrameError::UnknownParameter(format!(
                "element {} owns no sections or integration rule",
                self.base.tag
            )));
        };
        match id {
            PARAM_RHO => self.base.options.mass.density = value,
            PARAM_E => self.props.e = value,
            PARAM_A => self.props.area = value,
            PARAM_IZ => self.props.iz = value,
            PARAM_IY => self.props.iy = value,
            PARAM_G => self.props.g = value,
            PARAM_J => self.props.jx = value,
            _ => {
                return Err(FrameError::UnknownParameter(format!(
                    "element parameter id {}",
                    id
                )))
            }
        }
        if self.base.bound && id != PARAM_RHO {
            self.form_material_stiffness();
            self.form_state();
        }
        Ok(())
    }

    fn activate_parameter(&mut self, handle: Option<&ParameterHandle>) {
        self.parameter_id = handle.and_then(|h| h.element).unwrap_or(0);
    }

    fn set_response(&self, tokens: &[&str]) -> Option<Response> {
        let first = *tokens.first()?;
        if let Some(r) = parse_common_response(first) {
            return Some(Response::Element(r));
        }
        if first == "sectionX" && tokens.len() > 2 && tokens[2] == "forces" {
            let x: f64 = tokens[1].parse().ok()?;
            return Some(Response::Element(ElementResponse::ForcesAt(x.clamp(0.0, 1.0))));
        }
        self.base.transform.set_response(tokens).map(Response::Transform)
    }

    fn get_response(&self, response: &Response, domain: &Domain) -> FrameResult<ResponseValue> {
        match response {
            Response::Element(r) => {
                if let Some(value) = self.common_response(*r, domain) {
                    return value;
                }
                self.base.require_bound()?;
                match r {
                    ElementResponse::ForcesAt(x) => {
                        Ok(ResponseValue::Vector(self.forces_at(*x).as_slice().to_vec()))
                    }
                    ElementResponse::Energy => {
                        let v = self.base.transform.basic_trial_disp();
                        Ok(ResponseValue::Scalar(0.5 * self.q.dot(&v)))
                    }
                    other => Err(FrameError::InvalidConfiguration(format!(
                        "response {:?} is not available for PrismaticFrame",
                        other
                    ))),
                }
            }
            Response::Transform(r) => Ok(self.base.transform.get_response(*r)),
            other => Err(FrameError::InvalidConfiguration(format!(
                "PrismaticFrame has no sections to answer {:?}",
                other
            ))),
        }
    }

    fn describe(&self) -> String {
        let [n1, n2] = self.base.nodes;
        let p = &self.props;
        format!(
            "PrismaticFrame {}: nodes {} {}, A={} E={} G={} J={} Iy={} Iz={}, {:?}, {}",
            self.base.tag,
            n1,
            n2,
            p.area,
            p.e,
            p.g,
            p.jx,
            p.iy,
            p.iz,
            self.geometry,
            self.base.transform.describe()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Releases;
    use crate::domain::Node;
    use crate::math::Vec3;
    use crate::sections::{ElasticShearSection, ElasticTubeSection};
    use approx::assert_relative_eq;

    fn domain(uj: Vec6) -> Domain {
        let mut d = Domain::new();
        d.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        d.add_node(Node::new(2, 4.0, 0.0, 0.0)).unwrap();
        d.set_trial_displacement(2, uj).unwrap();
        d
    }

    fn element(geometry: GeometryLevel, options: FrameOptions) -> PrismaticFrame {
        PrismaticFrame::new(
            1,
            [1, 2],
            PrismaticProperties::new(0.01, 200000.0, 80000.0, 1e-4, 6e-5, 8e-5),
            geometry,
            Box::new(LinearTransform::new(Vec3::new(0.0, 0.0, 1.0))),
            options,
        )
    }

    #[test]
    fn test_from_section_reads_rigidities() {
        let s = ElasticShearSection::new(5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0);
        let p = PrismaticProperties::from_section(&s);
        assert_eq!((p.e, p.g), (1.0, 1.0));
        assert_eq!(p.area, 6.0);
        assert_eq!(p.iz, 8.0);
        assert_eq!(p.iy, 10.0);
        assert_eq!(p.jx, 42.0);

        // A tube carries torsion; zeroing G leaves none
        let t = ElasticTubeSection::new(6, 1.0, 1.0, 0.1, 0.0);
        assert_eq!(PrismaticProperties::from_section(&t).jx, RIGID_TORSION);
    }

    #[test]
    fn test_released_plane() {
        let opts = FrameOptions::default().with_releases(Releases::new(Release::J, Release::I));
        let mut e = element(GeometryLevel::Linear, opts);
        e.set_nodes(&domain(Vec6::zeros())).unwrap();
        let kb = e
            .basic_tangent(TangentState::Current, TangentRate::Stiffness)
            .unwrap();
        assert_relative_eq!(kb[(1, 1)], 3.0 * 200000.0 * 8e-5 / 4.0);
        assert_eq!(kb[(2, 2)], 0.0);
        assert_eq!(kb[(3, 3)], 0.0);
        assert_relative_eq!(kb[(4, 4)], 3.0 * 200000.0 * 6e-5 / 4.0);
    }

    #[test]
    fn test_p_delta_terms() {
        let uj = Vec6::new(-0.001, 0.0, 0.0, 0.0, 0.0, 0.0);
        let mut e = element(GeometryLevel::PDelta, FrameOptions::default());
        let d = domain(uj);
        e.set_nodes(&d).unwrap();
        e.update(&d).unwrap();

        let n = 200000.0 * 0.01 / 4.0 * -0.001;
        let kb = e
            .basic_tangent(TangentState::Current, TangentRate::Stiffness)
            .unwrap();
        let km = e
            .basic_tangent(TangentState::Initial, TangentRate::Stiffness)
            .unwrap();
        assert_relative_eq!(kb[(1, 1)] - km[(1, 1)], 4.0 * n / 4.0, epsilon = 1e-12);
        assert_relative_eq!(kb[(1, 2)] - km[(1, 2)], -n / 4.0, epsilon = 1e-12);
        assert_eq!(kb[(3, 3)], km[(3, 3)]);
    }

    #[test]
    fn test_exact_compression_softens() {
        let uj = Vec6::new(-0.001, 0.0, 0.0, 0.0, 0.0, 0.0);
        let mut e = element(GeometryLevel::Exact, FrameOptions::default());
        let d = domain(uj);
        e.set_nodes(&d).unwrap();
        e.update(&d).unwrap();
        let kb = e
            .basic_tangent(TangentState::Current, TangentRate::Stiffness)
            .unwrap();
        let km = e
            .basic_tangent(TangentState::Initial, TangentRate::Stiffness)
            .unwrap();
        // Only the bending blocks change
        assert!((kb[(1, 1)] - km[(1, 1)]).abs() > 0.0);
        assert!((kb[(3, 3)] - km[(3, 3)]).abs() > 0.0);
        assert_eq!(kb[(0, 0)], km[(0, 0)]);
    }

    #[test]
    fn test_exact_with_roundoff_axial_force() {
        // Rotations only on a skew chord leave v0 at roundoff level
        let mut d = Domain::new();
        d.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
        d.add_node(Node::new(2, 3.0, 4.0, 0.0)).unwrap();
        d.set_trial_displacement(2, Vec6::new(0.0, 0.0, 0.0, 0.01, -0.02, 0.03))
            .unwrap();

        let mut e = element(GeometryLevel::Exact, FrameOptions::default());
        e.set_nodes(&d).unwrap();
        e.update(&d).unwrap();
        let kb = e
            .basic_tangent(TangentState::Current, TangentRate::Stiffness)
            .unwrap();
        let km = e
            .basic_tangent(TangentState::Initial, TangentRate::Stiffness)
            .unwrap();
        assert_relative_eq!(kb, km, max_relative = 1e-9);
    }

    #[test]
    fn test_sections_x_forces() {
        let uj = Vec6::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.01);
        let mut e = element(GeometryLevel::Linear, FrameOptions::default());
        let d = domain(uj);
        e.set_nodes(&d).unwrap();
        e.update(&d).unwrap();

        let r = e.set_response(&["sectionX", "0.5", "forces"]).unwrap();
        let s = e.get_response(&r, &d).unwrap().as_vector();
        let q = e.basic_force().unwrap();
        assert_relative_eq!(s[1], 0.5 * (q[2] - q[1]), epsilon = 1e-12);
        assert_relative_eq!(s[2], (q[1] + q[2]) / 4.0, epsilon = 1e-12);

        assert!(e.set_response(&["section", "1", "force"]).is_none());
    }

    #[test]
    fn test_parameter_update_reforms_stiffness() {
        let mut e = element(GeometryLevel::Linear, FrameOptions::default());
        e.set_nodes(&domain(Vec6::zeros())).unwrap();
        let h = e.set_parameter(&["A"]).unwrap();
        e.update_parameter(&h, 0.02).unwrap();
        let kb = e
            .basic_tangent(TangentState::Initial, TangentRate::Stiffness)
            .unwrap();
        assert_relative_eq!(kb[(0, 0)], 200000.0 * 0.02 / 4.0);
        assert!(e.set_parameter(&["fy"]).is_none());
    }

    #[test]
    fn test_sensitivity_requires_linear_geometry() {
        let mut e = element(GeometryLevel::PDelta, FrameOptions::default());
        let d = domain(Vec6::zeros());
        e.set_nodes(&d).unwrap();
        assert!(matches!(
            e.resisting_force_sensitivity(0, &d),
            Err(FrameError::InvalidConfiguration(_))
        ));
    }
}
