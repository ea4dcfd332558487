//! Elastic circular tube section

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};

use super::{diagonal_flexibility, FrameSection, SectionCode, StrainHistory};
use crate::error::{FrameError, FrameResult};
use crate::serialization::{class_tags, Channel};

const CODES: [SectionCode; 4] = [SectionCode::P, SectionCode::Mz, SectionCode::My, SectionCode::T];

const PARAM_E: u32 = 1;
const PARAM_D: u32 = 2;
const PARAM_TW: u32 = 3;
const PARAM_G: u32 = 4;

/// Elastic thin or thick walled circular tube
///
/// Properties follow from the outer diameter and wall thickness, so the
/// geometric parameters have analytic sensitivities.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticTubeSection {
    tag: usize,
    db_tag: usize,
    /// Modulus of elasticity
    pub e: f64,
    /// Outer diameter
    pub d: f64,
    /// Wall thickness
    pub tw: f64,
    /// Shear modulus
    pub g: f64,
    strain: StrainHistory,
    parameter_id: u32,
}

impl Default for ElasticTubeSection {
    fn default() -> Self {
        Self::new(0, 0.0, 0.0, 0.0, 0.0)
    }
}

impl ElasticTubeSection {
    pub fn new(tag: usize, e: f64, d: f64, tw: f64, g: f64) -> Self {
        Self {
            tag,
            db_tag: 0,
            e,
            d,
            tw,
            g,
            strain: StrainHistory::new(CODES.len()),
            parameter_id: 0,
        }
    }

    fn inner_diameter(&self) -> f64 {
        self.d - 2.0 * self.tw
    }

    /// Cross-sectional area
    pub fn area(&self) -> f64 {
        let di = self.inner_diameter();
        PI / 4.0 * (self.d * self.d - di * di)
    }

    /// Moment of inertia (same about both axes)
    pub fn inertia(&self) -> f64 {
        let di = self.inner_diameter();
        PI / 64.0 * (self.d.powi(4) - di.powi(4))
    }

    /// Polar moment of inertia
    pub fn polar_inertia(&self) -> f64 {
        2.0 * self.inertia()
    }

    fn rigidities(&self) -> [f64; 4] {
        let i = self.inertia();
        [self.e * self.area(), self.e * i, self.e * i, self.g * 2.0 * i]
    }

    fn rigidity_sensitivity(&self) -> [f64; 4] {
        let di = self.inner_diameter();
        let (da, di_dh) = match self.parameter_id {
            PARAM_E => {
                let i = self.inertia();
                return [self.area(), i, i, 0.0];
            }
            PARAM_G => return [0.0, 0.0, 0.0, self.polar_inertia()],
            PARAM_D => (PI * self.tw, PI / 16.0 * (self.d.powi(3) - di.powi(3))),
            PARAM_TW => (PI * di, PI / 8.0 * di.powi(3)),
            _ => return [0.0; 4],
        };
        [self.e * da, self.e * di_dh, self.e * di_dh, self.g * 2.0 * di_dh]
    }

    fn diagonal(values: [f64; 4]) -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_row_slice(&values))
    }
}

impl FrameSection for ElasticTubeSection {
    fn tag(&self) -> usize {
        self.tag
    }

    fn class_tag(&self) -> usize {
        class_tags::SECTION_ELASTIC_TUBE
    }

    fn db_tag(&self) -> usize {
        self.db_tag
    }

    fn set_db_tag(&mut self, tag: usize) {
        self.db_tag = tag;
    }

    fn codes(&self) -> &[SectionCode] {
        &CODES
    }

    fn set_trial_state(&mut self, strain: &DVector<f64>) -> FrameResult<()> {
        self.strain.set_trial(strain)
    }

    fn deformation(&self) -> DVector<f64> {
        self.strain.trial.clone()
    }

    fn resultant(&self) -> DVector<f64> {
        let k = self.rigidities();
        DVector::from_iterator(4, self.strain.trial.iter().zip(k).map(|(e, k)| k * e))
    }

    fn tangent(&self) -> DMatrix<f64> {
        Self::diagonal(self.rigidities())
    }

    fn initial_tangent(&self) -> DMatrix<f64> {
        Self::diagonal(self.rigidities())
    }

    fn flexibility(&self) -> FrameResult<DMatrix<f64>> {
        diagonal_flexibility(&self.rigidities())
    }

    fn initial_flexibility(&self) -> FrameResult<DMatrix<f64>> {
        diagonal_flexibility(&self.rigidities())
    }

    fn commit_state(&mut self) -> FrameResult<()> {
        self.strain.commit();
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FrameResult<()> {
        self.strain.revert();
        Ok(())
    }

    fn revert_to_start(&mut self) -> FrameResult<()> {
        self.strain.reset();
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn FrameSection> {
        Box::new(self.clone())
    }

    fn resultant_sensitivity(&self, _grad: usize, _conditional: bool) -> DVector<f64> {
        let dk = self.rigidity_sensitivity();
        DVector::from_iterator(4, self.strain.trial.iter().zip(dk).map(|(e, dk)| dk * e))
    }

    fn tangent_sensitivity(&self, _grad: usize) -> DMatrix<f64> {
        Self::diagonal(self.rigidity_sensitivity())
    }

    fn initial_tangent_sensitivity(&self, _grad: usize) -> DMatrix<f64> {
        Self::diagonal(self.rigidity_sensitivity())
    }

    fn commit_sensitivity(
        &mut self,
        strain_sensitivity: &DVector<f64>,
        grad: usize,
        num_grads: usize,
    ) -> FrameResult<()> {
        self.strain.store_sensitivity(strain_sensitivity, grad, num_grads)
    }

    fn committed_strain_sensitivity(&self, grad: usize) -> Option<DVector<f64>> {
        self.strain.stored_sensitivity(grad)
    }

    fn set_parameter(&mut self, tokens: &[&str]) -> Option<u32> {
        match *tokens.first()? {
            "E" => Some(PARAM_E),
            "d" => Some(PARAM_D),
            "tw" => Some(PARAM_TW),
            "G" => Some(PARAM_G),
            _ => None,
        }
    }

    fn update_parameter(&mut self, id: u32, value: f64) -> FrameResult<()> {
        match id {
            PARAM_E => self.e = value,
            PARAM_D => self.d = value,
            PARAM_TW => self.tw = value,
            PARAM_G => self.g = value,
            _ => {
                return Err(FrameError::UnknownParameter(format!(
                    "elastic tube section parameter id {}",
                    id
                )))
            }
        }
        Ok(())
    }

    fn activate_parameter(&mut self, id: u32) {
        self.parameter_id = id;
    }

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        let mut data = vec![self.tag as f64, self.e, self.d, self.tw, self.g];
        data.extend(self.strain.committed.iter());
        channel.send_vector(self.db_tag, commit_tag, &data)
    }

    fn recv_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        let data = channel.recv_vector(self.db_tag, commit_tag, 9)?;
        self.tag = data[0] as usize;
        self.e = data[1];
        self.d = data[2];
        self.tw = data[3];
        self.g = data[4];
        self.strain = StrainHistory::new(CODES.len());
        self.strain.committed.copy_from_slice(&data[5..9]);
        self.strain.revert();
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "ElasticTubeSection {}: E={} d={} tw={} G={}",
            self.tag, self.e, self.d, self.tw, self.g
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tube_properties() {
        // Solid bar when the wall reaches the centre
        let s = ElasticTubeSection::new(1, 1.0, 2.0, 1.0, 1.0);
        assert_relative_eq!(s.area(), PI, epsilon = 1e-12);
        assert_relative_eq!(s.inertia(), PI / 4.0, epsilon = 1e-12);
        assert_relative_eq!(s.polar_inertia(), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flexibility_is_inverse() {
        let s = ElasticTubeSection::new(2, 200.0, 0.3, 0.02, 80.0);
        let id = s.tangent() * s.flexibility().unwrap();
        assert_relative_eq!(id, DMatrix::identity(4, 4), epsilon = 1e-12);
        assert_relative_eq!(s.flexibility().unwrap()[(3, 3)], 1.0 / (80.0 * s.polar_inertia()));

        let shell = ElasticTubeSection::new(3, 200.0, 0.3, 0.0, 80.0);
        assert!(matches!(shell.initial_flexibility(), Err(FrameError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_geometric_sensitivities() {
        let e = DVector::from_row_slice(&[0.01, 0.02, -0.03, 0.04]);
        for (name, id) in [("E", PARAM_E), ("d", PARAM_D), ("tw", PARAM_TW), ("G", PARAM_G)] {
            let mut s = ElasticTubeSection::new(3, 200.0, 0.3, 0.02, 80.0);
            s.set_trial_state(&e).unwrap();
            assert_eq!(s.set_parameter(&[name]), Some(id));
            s.activate_parameter(id);

            let base = match id {
                PARAM_E => s.e,
                PARAM_D => s.d,
                PARAM_TW => s.tw,
                _ => s.g,
            };
            let h = 1e-6 * base;
            let mut plus = s.clone();
            plus.update_parameter(id, base + h).unwrap();
            let mut minus = s.clone();
            minus.update_parameter(id, base - h).unwrap();

            let fd = (plus.resultant() - minus.resultant()) / (2.0 * h);
            let ds = s.resultant_sensitivity(0, true);
            for k in 0..4 {
                assert_relative_eq!(ds[k], fd[k], epsilon = 1e-9, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_inactive_parameter_gives_zero() {
        let mut s = ElasticTubeSection::new(3, 200.0, 0.3, 0.02, 80.0);
        s.set_trial_state(&DVector::from_element(4, 1.0)).unwrap();
        assert_eq!(s.resultant_sensitivity(0, false), DVector::zeros(4));
    }
}
