//! Displacement-based frame element with section integration

use nalgebra::DMatrix;

use super::base::{FrameBase, PARAM_RHO};
use super::cubic::{add_force, add_stiffness, section_strain};
use super::{parse_common_response, FrameElement, TangentRate, TangentState};
use crate::config::FrameOptions;
use crate::domain::Domain;
use crate::error::{FrameError, FrameResult};
use crate::integration::{IntegrationRule, LegendreRule};
use crate::math::{Mat6, Vec12, Vec5, Vec6};
use crate::parameter::{nearest_point, parse_index, ParameterHandle};
use crate::response::{ElementResponse, Response, ResponseValue, SectionResponse};
use crate::sections::FrameSection;
use crate::serialization::{class_tags, Channel, ObjectBroker};
use crate::transform::{FrameTransform, LinearTransform};

const HEADER_LEN: usize = 16;

/// Frame element integrating section response along its length
///
/// Basic deformations are interpolated to section strains with cubic
/// Hermite functions, so the element is exact for linear elastic prismatic
/// members without span loads.
#[derive(Debug, Clone)]
pub struct DistributedFrame {
    base: FrameBase,
    sections: Vec<Box<dyn FrameSection>>,
    rule: Box<dyn IntegrationRule>,
    xi: Vec<f64>,
    wt: Vec<f64>,
    parameter_id: u32,
}

impl DistributedFrame {
    /// Create an element owning the given sections, rule and transformation
    pub fn new(
        tag: usize,
        nodes: [usize; 2],
        sections: Vec<Box<dyn FrameSection>>,
        rule: Box<dyn IntegrationRule>,
        transform: Box<dyn FrameTransform>,
        options: FrameOptions,
    ) -> FrameResult<Self> {
        if sections.is_empty() {
            return Err(FrameError::InvalidConfiguration(format!(
                "element {} needs at least one section",
                tag
            )));
        }
        Ok(Self {
            base: FrameBase::new(tag, nodes, transform, options),
            sections,
            rule,
            xi: Vec::new(),
            wt: Vec::new(),
            parameter_id: 0,
        })
    }

    /// Empty element to be filled by [`FrameElement::recv_self`]
    pub fn blank() -> Self {
        Self {
            base: FrameBase::new(
                0,
                [0, 0],
                Box::new(LinearTransform::default()),
                FrameOptions::default(),
            ),
            sections: Vec::new(),
            rule: Box::new(LegendreRule::new()),
            xi: Vec::new(),
            wt: Vec::new(),
            parameter_id: 0,
        }
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn sections(&self) -> &[Box<dyn FrameSection>] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&dyn FrameSection> {
        self.sections.get(index).map(|s| s.as_ref())
    }

    pub fn rule(&self) -> &dyn IntegrationRule {
        self.rule.as_ref()
    }

    /// Normalized integration points, empty before [`FrameElement::set_nodes`]
    pub fn locations(&self) -> &[f64] {
        &self.xi
    }

    pub fn weights(&self) -> &[f64] {
        &self.wt
    }

    fn refresh_quadrature(&mut self) -> FrameResult<()> {
        let n = self.sections.len();
        let length = self.base.length();
        self.xi = self.rule.locations(n, length)?;
        self.wt = self.rule.weights(n, length)?;
        if self.xi.len() != n || self.wt.len() != n {
            return Err(FrameError::InvalidConfiguration(format!(
                "integration rule returned {} points for {} sections",
                self.xi.len(),
                n
            )));
        }
        Ok(())
    }

    /// kb = Σ Bᵀ·ks·B·wt, without the 1/L factor
    fn integrate_stiffness(&self, state: TangentState) -> Mat6 {
        let mut kb = Mat6::zeros();
        for (i, section) in self.sections.iter().enumerate() {
            let ks = match state {
                TangentState::Initial => section.initial_tangent(),
                TangentState::Current => section.tangent(),
            };
            add_stiffness(&mut kb, section.codes(), self.xi[i], &ks, self.wt[i]);
        }
        kb
    }

    fn energy(&self) -> f64 {
        let length = self.base.length();
        self.sections
            .iter()
            .zip(&self.wt)
            .map(|(s, wt)| s.energy() * wt * length)
            .sum()
    }

    /// Basic deformation not recovered elastically: v - kb0⁻¹·q
    fn plastic_deformation(&self) -> FrameResult<Vec6> {
        let kb0 = self.basic_tangent(TangentState::Initial, TangentRate::Stiffness)?;
        let q = self.basic_force()?;
        let ve = kb0.lu().solve(&q).ok_or_else(|| {
            FrameError::InvalidConfiguration(format!(
                "initial basic stiffness of element {} is singular",
                self.base.tag
            ))
        })?;
        Ok(self.base.transform.basic_trial_disp() - ve)
    }

    fn assign_db_tags(&mut self, channel: &mut dyn Channel) {
        if self.base.db_tag == 0 {
            self.base.db_tag = channel.next_db_tag();
        }
        if self.base.transform.db_tag() == 0 {
            self.base.transform.set_db_tag(channel.next_db_tag());
        }
        if self.rule.db_tag() == 0 {
            self.rule.set_db_tag(channel.next_db_tag());
        }
        for section in self.sections.iter_mut() {
            if section.db_tag() == 0 {
                section.set_db_tag(channel.next_db_tag());
            }
        }
    }

    fn section_response(&self, index: usize, response: SectionResponse) -> FrameResult<ResponseValue> {
        let section = self.sections.get(index).ok_or_else(|| {
            FrameError::InvalidConfiguration(format!(
                "element {} has no section {}",
                self.base.tag,
                index + 1
            ))
        })?;
        section.get_response(response)
    }
}

impl FrameElement for DistributedFrame {
    fn base(&self) -> &FrameBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FrameBase {
        &mut self.base
    }

    fn class_tag(&self) -> usize {
        class_tags::ELEMENT_DISTRIBUTED_FRAME
    }

    fn clone_box(&self) -> Box<dyn FrameElement> {
        Box::new(self.clone())
    }

    fn set_nodes(&mut self, domain: &Domain) -> FrameResult<()> {
        self.base.bound = false;
        self.base.initialize_geometry(domain)?;
        self.refresh_quadrature()?;
        self.base.bound = true;
        Ok(())
    }

    fn update(&mut self, domain: &Domain) -> FrameResult<()> {
        self.base.update_transform(domain)?;

        let v = self.base.transform.basic_trial_disp();
        let one_over_l = 1.0 / self.base.length();

        let total = self.sections.len();
        let mut failed = 0;
        for (i, section) in self.sections.iter_mut().enumerate() {
            let e = section_strain(section.codes(), self.xi[i], &v, one_over_l);
            if let Err(err) = section.set_trial_state(&e) {
                log::warn!(
                    "element {}: section {} rejected trial strain: {}",
                    self.base.tag,
                    i + 1,
                    err
                );
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(FrameError::RejectedTrial { failed, total });
        }
        Ok(())
    }

    fn basic_force(&self) -> FrameResult<Vec6> {
        self.base.require_bound()?;
        let mut q = Vec6::zeros();
        for (i, section) in self.sections.iter().enumerate() {
            add_force(&mut q, section.codes(), self.xi[i], &section.resultant(), self.wt[i]);
        }
        Ok(q)
    }

    fn basic_tangent(&self, state: TangentState, rate: TangentRate) -> FrameResult<Mat6> {
        self.base.require_bound()?;
        match rate {
            TangentRate::Mass => Ok(self.base.basic_mass()),
            TangentRate::Stiffness => Ok(self.integrate_stiffness(state) / self.base.length()),
        }
    }

    fn commit_state(&mut self) -> FrameResult<()> {
        let mut failed = 0;
        for section in self.sections.iter_mut() {
            if let Err(err) = section.commit_state() {
                log::warn!("element {}: section commit failed: {}", self.base.tag, err);
                failed += 1;
            }
        }
        if let Err(err) = self.base.transform.commit_state() {
            log::warn!("element {}: transformation commit failed: {}", self.base.tag, err);
            failed += 1;
        }
        if failed > 0 {
            return Err(FrameError::CommitFailed { failed });
        }

        if self.base.options.rayleigh.beta_kc != 0.0 {
            self.base.committed_stiffness = self.tangent_stiff()?;
        }
        self.base.mark_committed();
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FrameResult<()> {
        for section in self.sections.iter_mut() {
            section.revert_to_last_commit()?;
        }
        self.base.transform.revert_to_last_commit()?;
        self.base.mark_reverted();
        Ok(())
    }

    fn revert_to_start(&mut self) -> FrameResult<()> {
        for section in self.sections.iter_mut() {
            section.revert_to_start()?;
        }
        self.base.transform.revert_to_start()?;
        self.base.mark_reset();
        Ok(())
    }

    fn resisting_force_sensitivity(&mut self, grad: usize, domain: &Domain) -> FrameResult<Vec12> {
        self.base.require_bound()?;
        self.base.load_coordinate_sensitivity(domain)?;

        let length = self.base.length();
        let mut dqdh = Vec6::zeros();
        for (i, section) in self.sections.iter().enumerate() {
            let dsdh = section.resultant_sensitivity(grad, true);
            add_force(&mut dqdh, section.codes(), self.xi[i], &dsdh, self.wt[i]);
        }

        let p0 = Vec5::zeros();
        let transform = &self.base.transform;
        let mut p = Vec12::zeros();

        if transform.is_shape_sensitivity() {
            // Change of section strain through L and the chord at fixed displacements
            let kb = self.integrate_stiffness(TangentState::Current);
            let q = self.basic_force()?;
            let v = transform.basic_trial_disp();
            dqdh += kb * v * transform.d1_over_l_dh();
            dqdh += kb * transform.basic_trial_disp_shape_sensitivity() / length;
            p += transform.global_resisting_force_shape_sensitivity(&q, &p0);
        }

        p += transform.global_resisting_force(&dqdh, &p0);
        Ok(p)
    }

    fn commit_sensitivity(
        &mut self,
        grad: usize,
        num_grads: usize,
        domain: &Domain,
    ) -> FrameResult<()> {
        self.base.require_bound()?;
        self.base.load_coordinate_sensitivity(domain)?;

        let (dui, duj) = self.base.displacement_sensitivity(domain, grad)?;
        let transform = &self.base.transform;
        let v = transform.basic_trial_disp();
        let dvdh = transform.basic_displ_sensitivity(&dui, &duj);
        // de = B·(dv/L + v·d(1/L))
        let rate = dvdh / transform.initial_length() + v * transform.d1_over_l_dh();

        for (i, section) in self.sections.iter_mut().enumerate() {
            let de = section_strain(section.codes(), self.xi[i], &rate, 1.0);
            section.commit_sensitivity(&de, grad, num_grads)?;
        }
        Ok(())
    }

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        self.assign_db_tags(channel);

        let [n1, n2] = self.base.nodes;
        let mut header = vec![
            self.base.tag as f64,
            n1 as f64,
            n2 as f64,
            self.sections.len() as f64,
            self.base.transform.class_tag() as f64,
            self.base.transform.db_tag() as f64,
            self.rule.class_tag() as f64,
            self.rule.db_tag() as f64,
            self.base.options.mass.density,
            if self.base.options.mass.consistent { 1.0 } else { 0.0 },
        ];
        header.extend(self.base.option_slots());
        debug_assert_eq!(header.len(), HEADER_LEN);

        let db_tag = self.base.db_tag;
        channel.send_vector(db_tag, commit_tag, &header)?;
        self.base.transform.send_self(commit_tag, channel)?;
        self.rule.send_self(commit_tag, channel)?;

        let ids: Vec<i64> = self
            .sections
            .iter()
            .flat_map(|s| [s.class_tag() as i64, s.db_tag() as i64])
            .collect();
        channel.send_id(db_tag, commit_tag, &ids)?;
        for section in self.sections.iter_mut() {
            section.send_self(commit_tag, channel)?;
        }

        log::debug!(
            "sent element {} with {} sections at commit {}",
            self.base.tag,
            self.sections.len(),
            commit_tag
        );
        Ok(())
    }

    fn recv_self(
        &mut self,
        commit_tag: usize,
        channel: &mut dyn Channel,
        broker: &ObjectBroker,
    ) -> FrameResult<()> {
        let db_tag = self.base.db_tag;
        let header = channel.recv_vector(db_tag, commit_tag, HEADER_LEN)?;

        self.base.tag = header[0] as usize;
        self.base.nodes = [header[1] as usize, header[2] as usize];
        let num_sections = header[3] as usize;

        let transform_class = header[4] as usize;
        if self.base.transform.class_tag() != transform_class {
            self.base.transform = broker.new_transform(transform_class)?;
        }
        self.base.transform.set_db_tag(header[5] as usize);

        let rule_class = header[6] as usize;
        if self.rule.class_tag() != rule_class {
            self.rule = broker.new_rule(rule_class)?;
        }
        self.rule.set_db_tag(header[7] as usize);

        self.base.options.mass.density = header[8];
        self.base.options.mass.consistent = header[9] == 1.0;
        self.base.read_option_slots(&header[10..16])?;

        self.base.transform.recv_self(commit_tag, channel)?;
        self.rule.recv_self(commit_tag, channel)?;

        let ids = channel.recv_id(db_tag, commit_tag, 2 * num_sections)?;
        if self.sections.len() != num_sections {
            self.sections.clear();
            for pair in ids.chunks(2) {
                self.sections.push(broker.new_section(pair[0] as usize)?);
            }
        }
        for (section, pair) in self.sections.iter_mut().zip(ids.chunks(2)) {
            let class_tag = pair[0] as usize;
            if section.class_tag() != class_tag {
                *section = broker.new_section(class_tag)?;
            }
            section.set_db_tag(pair[1] as usize);
            section.recv_self(commit_tag, channel)?;
        }

        self.base.bound = false;
        self.xi.clear();
        self.wt.clear();
        log::debug!(
            "received element {} with {} sections at commit {}",
            self.base.tag,
            num_sections,
            commit_tag
        );
        Ok(())
    }

    fn set_parameter(&mut self, tokens: &[&str]) -> Option<ParameterHandle> {
        let first = *tokens.first()?;
        let mut handle = ParameterHandle::default();

        match first {
            "rho" => return Some(ParameterHandle::element(PARAM_RHO)),
            "sectionX" if tokens.len() > 2 => {
                if !self.base.bound {
                    return None;
                }
                let x: f64 = tokens[1].parse().ok()?;
                let i = nearest_point(&self.xi, self.base.length(), x)?;
                let id = self.sections[i].set_parameter(&tokens[2..])?;
                handle.sections.push((i, id));
            }
            "section" if tokens.len() > 2 => {
                let k = parse_index(tokens[1])?;
                if k == 0 {
                    for (i, section) in self.sections.iter_mut().enumerate() {
                        if let Some(id) = section.set_parameter(&tokens[2..]) {
                            handle.sections.push((i, id));
                        }
                    }
                } else {
                    let section = self.sections.get_mut(k - 1)?;
                    let id = section.set_parameter(&tokens[2..])?;
                    handle.sections.push((k - 1, id));
                }
            }
            "integration" if tokens.len() > 1 => {
                handle.integration = Some(self.rule.set_parameter(&tokens[1..])?);
            }
            _ => {
                for (i, section) in self.sections.iter_mut().enumerate() {
                    if let Some(id) = section.set_parameter(tokens) {
                        handle.sections.push((i, id));
                    }
                }
                handle.integration = self.rule.set_parameter(tokens);
            }
        }

        handle.non_empty()
    }

    fn update_parameter(&mut self, handle: &ParameterHandle, value: f64) -> FrameResult<()> {
        if let Some(id) = handle.element {
            if id != PARAM_RHO {
                return Err(FrameError::UnknownParameter(format!(
                    "element parameter id {}",
                    id
                )));
            }
            self.base.options.mass.density = value;
        }
        for &(i, id) in &handle.sections {
            let section = self.sections.get_mut(i).ok_or_else(|| {
                FrameError::UnknownParameter(format!("section {} of element {}", i + 1, self.base.tag))
            })?;
            section.update_parameter(id, value)?;
        }
        if let Some(id) = handle.integration {
            self.rule.update_parameter(id, value)?;
            if self.base.bound {
                self.refresh_quadrature()?;
            }
        }
        Ok(())
    }

    fn activate_parameter(&mut self, handle: Option<&ParameterHandle>) {
        for section in self.sections.iter_mut() {
            section.activate_parameter(0);
        }
        self.parameter_id = 0;
        if let Some(handle) = handle {
            self.parameter_id = handle.element.unwrap_or(0);
            for &(i, id) in &handle.sections {
                if let Some(section) = self.sections.get_mut(i) {
                    section.activate_parameter(id);
                }
            }
        }
    }

    fn set_response(&self, tokens: &[&str]) -> Option<Response> {
        let first = *tokens.first()?;
        if let Some(r) = parse_common_response(first) {
            return Some(Response::Element(r));
        }

        let element = |r| Some(Response::Element(r));
        match first {
            "plasticDeformation" | "plasticRotation" => element(ElementResponse::PlasticDeformation),
            "integrationPoints" => element(ElementResponse::IntegrationPoints),
            "integrationWeights" => element(ElementResponse::IntegrationWeights),
            "sectionTags" => element(ElementResponse::SectionTags),
            "sectionX" if tokens.len() > 2 => {
                if !self.base.bound {
                    return None;
                }
                let x: f64 = tokens[1].parse().ok()?;
                let index = nearest_point(&self.xi, self.base.length(), x)?;
                let response = SectionResponse::parse(tokens[2])?;
                Some(Response::Section { index, response })
            }
            "section" if tokens.len() > 2 => {
                let k = parse_index(tokens[1])?;
                let response = SectionResponse::parse(tokens[2])?;
                if k == 0 {
                    Some(Response::AllSections(response))
                } else if k <= self.sections.len() {
                    Some(Response::Section {
                        index: k - 1,
                        response,
                    })
                } else {
                    None
                }
            }
            _ => self.base.transform.set_response(tokens).map(Response::Transform),
        }
    }

    fn get_response(&self, response: &Response, domain: &Domain) -> FrameResult<ResponseValue> {
        match response {
            Response::Element(r) => {
                if let Some(value) = self.common_response(*r, domain) {
                    return value;
                }
                self.base.require_bound()?;
                let length = self.base.length();
                match r {
                    ElementResponse::PlasticDeformation => {
                        Ok(ResponseValue::Vector(self.plastic_deformation()?.as_slice().to_vec()))
                    }
                    ElementResponse::IntegrationPoints => {
                        Ok(ResponseValue::Vector(self.xi.iter().map(|x| x * length).collect()))
                    }
                    ElementResponse::IntegrationWeights => {
                        Ok(ResponseValue::Vector(self.wt.iter().map(|w| w * length).collect()))
                    }
                    ElementResponse::SectionTags => Ok(ResponseValue::Tags(
                        self.sections.iter().map(|s| s.tag()).collect(),
                    )),
                    ElementResponse::Energy => Ok(ResponseValue::Scalar(self.energy())),
                    other => Err(FrameError::InvalidConfiguration(format!(
                        "response {:?} is not available for DistributedFrame",
                        other
                    ))),
                }
            }
            Response::Section { index, response } => self.section_response(*index, *response),
            Response::AllSections(response) => Ok(ResponseValue::List(
                (0..self.sections.len())
                    .map(|i| self.section_response(i, *response))
                    .collect::<FrameResult<Vec<_>>>()?,
            )),
            Response::Transform(r) => Ok(self.base.transform.get_response(*r)),
        }
    }

    fn describe(&self) -> String {
        let [n1, n2] = self.base.nodes;
        let mut out = format!(
            "DistributedFrame {}: nodes {} {}, {} sections, rule {}, {}",
            self.base.tag,
            n1,
            n2,
            self.sections.len(),
            self.rule.describe(),
            self.base.transform.describe()
        );
        for section in &self.sections {
            out.push_str("\n  ");
            out.push_str(&section.describe());
        }
        out
    }
}
