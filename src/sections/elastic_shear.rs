//! Elastic section with axial, biaxial bending, torsion and shear terms

use nalgebra::{DMatrix, DVector};

use super::{diagonal_flexibility, FrameSection, SectionCode, StrainHistory};
use crate::error::{FrameError, FrameResult};
use crate::serialization::{class_tags, Channel};

const CODES: [SectionCode; 6] = [
    SectionCode::P,
    SectionCode::Mz,
    SectionCode::Vy,
    SectionCode::My,
    SectionCode::Vz,
    SectionCode::T,
];

const PARAM_E: u32 = 1;
const PARAM_A: u32 = 2;
const PARAM_IZ: u32 = 3;
const PARAM_IY: u32 = 4;
const PARAM_G: u32 = 5;
const PARAM_J: u32 = 6;
const PARAM_ALPHA_Y: u32 = 7;
const PARAM_ALPHA_Z: u32 = 8;

/// Linear elastic section including shear deformation
///
/// Strain ordering is `[P, Mz, Vy, My, Vz, T]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticShearSection {
    tag: usize,
    db_tag: usize,
    /// Modulus of elasticity
    pub e: f64,
    /// Cross-sectional area
    pub a: f64,
    /// Moment of inertia about local z
    pub iz: f64,
    /// Moment of inertia about local y
    pub iy: f64,
    /// Shear modulus
    pub g: f64,
    /// Torsional constant
    pub j: f64,
    /// Shear shape factor along y
    pub alpha_y: f64,
    /// Shear shape factor along z
    pub alpha_z: f64,
    strain: StrainHistory,
    parameter_id: u32,
}

impl Default for ElasticShearSection {
    fn default() -> Self {
        Self::new(0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }
}

impl ElasticShearSection {
    /// Create a section with unit shear factors
    pub fn new(tag: usize, e: f64, a: f64, iz: f64, iy: f64, g: f64, j: f64) -> Self {
        Self {
            tag,
            db_tag: 0,
            e,
            a,
            iz,
            iy,
            g,
            j,
            alpha_y: 1.0,
            alpha_z: 1.0,
            strain: StrainHistory::new(CODES.len()),
            parameter_id: 0,
        }
    }

    /// Set the shear shape factors
    pub fn with_shear_factors(mut self, alpha_y: f64, alpha_z: f64) -> Self {
        self.alpha_y = alpha_y;
        self.alpha_z = alpha_z;
        self
    }

    fn rigidities(&self) -> [f64; 6] {
        let ga = self.g * self.a;
        [
            self.e * self.a,
            self.e * self.iz,
            self.alpha_y * ga,
            self.e * self.iy,
            self.alpha_z * ga,
            self.g * self.j,
        ]
    }

    fn rigidity_sensitivity(&self) -> [f64; 6] {
        match self.parameter_id {
            PARAM_E => [self.a, self.iz, 0.0, self.iy, 0.0, 0.0],
            PARAM_A => [self.e, 0.0, self.alpha_y * self.g, 0.0, self.alpha_z * self.g, 0.0],
            PARAM_IZ => [0.0, self.e, 0.0, 0.0, 0.0, 0.0],
            PARAM_IY => [0.0, 0.0, 0.0, self.e, 0.0, 0.0],
            PARAM_G => [0.0, 0.0, self.alpha_y * self.a, 0.0, self.alpha_z * self.a, self.j],
            PARAM_J => [0.0, 0.0, 0.0, 0.0, 0.0, self.g],
            PARAM_ALPHA_Y => [0.0, 0.0, self.g * self.a, 0.0, 0.0, 0.0],
            PARAM_ALPHA_Z => [0.0, 0.0, 0.0, 0.0, self.g * self.a, 0.0],
            _ => [0.0; 6],
        }
    }

    fn diagonal(values: [f64; 6]) -> DMatrix<f64> {
        DMatrix::from_diagonal(&DVector::from_row_slice(&values))
    }
}

impl FrameSection for ElasticShearSection {
    fn tag(&self) -> usize {
        self.tag
    }

    fn class_tag(&self) -> usize {
        class_tags::SECTION_ELASTIC_SHEAR
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
        DVector::from_iterator(6, self.strain.trial.iter().zip(k).map(|(e, k)| k * e))
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
        DVector::from_iterator(6, self.strain.trial.iter().zip(dk).map(|(e, dk)| dk * e))
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
            "A" => Some(PARAM_A),
            "I" | "Iz" => Some(PARAM_IZ),
            "Iy" => Some(PARAM_IY),
            "G" => Some(PARAM_G),
            "J" => Some(PARAM_J),
            "alpha" | "alphaY" => Some(PARAM_ALPHA_Y),
            "alphaZ" => Some(PARAM_ALPHA_Z),
            _ => None,
        }
    }

    fn update_parameter(&mut self, id: u32, value: f64) -> FrameResult<()> {
        match id {
            PARAM_E => self.e = value,
            PARAM_A => self.a = value,
            PARAM_IZ => self.iz = value,
            PARAM_IY => self.iy = value,
            PARAM_G => self.g = value,
            PARAM_J => self.j = value,
            PARAM_ALPHA_Y => self.alpha_y = value,
            PARAM_ALPHA_Z => self.alpha_z = value,
            _ => {
                return Err(FrameError::UnknownParameter(format!(
                    "elastic shear section parameter id {}",
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
        let mut data = vec![
            self.tag as f64,
            self.e,
            self.a,
            self.iz,
            self.iy,
            self.g,
            self.j,
            self.alpha_y,
            self.alpha_z,
        ];
        data.extend(self.strain.committed.iter());
        channel.send_vector(self.db_tag, commit_tag, &data)
    }

    fn recv_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        let data = channel.recv_vector(self.db_tag, commit_tag, 15)?;
        self.tag = data[0] as usize;
        self.e = data[1];
        self.a = data[2];
        self.iz = data[3];
        self.iy = data[4];
        self.g = data[5];
        self.j = data[6];
        self.alpha_y = data[7];
        self.alpha_z = data[8];
        self.strain = StrainHistory::new(CODES.len());
        self.strain.committed.copy_from_slice(&data[9..15]);
        self.strain.revert();
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "ElasticShearSection {}: E={} A={} Iz={} Iy={} G={} J={} alphaY={} alphaZ={}",
            self.tag, self.e, self.a, self.iz, self.iy, self.g, self.j, self.alpha_y, self.alpha_z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::StreamChannel;
    use approx::assert_relative_eq;

    fn section() -> ElasticShearSection {
        ElasticShearSection::new(1, 200.0, 0.5, 0.02, 0.01, 80.0, 0.03).with_shear_factors(0.8, 0.9)
    }

    #[test]
    fn test_resultant_follows_code_order() {
        let mut s = section();
        let e = DVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        s.set_trial_state(&e).unwrap();
        let r = s.resultant();

        assert_relative_eq!(r[0], 200.0 * 0.5 * 1.0);
        assert_relative_eq!(r[1], 200.0 * 0.02 * 2.0);
        assert_relative_eq!(r[2], 0.8 * 80.0 * 0.5 * 3.0);
        assert_relative_eq!(r[3], 200.0 * 0.01 * 4.0);
        assert_relative_eq!(r[4], 0.9 * 80.0 * 0.5 * 5.0);
        assert_relative_eq!(r[5], 80.0 * 0.03 * 6.0);
    }

    #[test]
    fn test_flexibility_is_inverse() {
        let s = section();
        let f = s.flexibility().unwrap();
        let id = s.tangent() * f;
        for i in 0..6 {
            for j in 0..6 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(id[(i, j)], expected, epsilon = 1e-12);
            }
        }
        assert_relative_eq!(s.flexibility().unwrap()[(2, 2)], 1.0 / (0.8 * 80.0 * 0.5));
        assert_eq!(s.initial_flexibility().unwrap(), s.flexibility().unwrap());
    }

    #[test]
    fn test_flexibility_of_zero_rigidity() {
        // No torsional constant
        let s = ElasticShearSection::new(1, 200.0, 0.5, 0.02, 0.01, 80.0, 0.0);
        assert!(matches!(s.flexibility(), Err(FrameError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_parameter_sensitivity_matches_difference() {
        let e = DVector::from_row_slice(&[0.1, -0.2, 0.3, 0.4, -0.5, 0.6]);
        for name in ["E", "A", "Iz", "Iy", "G", "J", "alphaY", "alphaZ"] {
            let mut s = section();
            s.set_trial_state(&e).unwrap();
            let id = s.set_parameter(&[name]).unwrap();
            s.activate_parameter(id);
            let ds = s.resultant_sensitivity(0, true);

            let base = match name {
                "E" => s.e,
                "A" => s.a,
                "Iz" => s.iz,
                "Iy" => s.iy,
                "G" => s.g,
                "J" => s.j,
                "alphaY" => s.alpha_y,
                _ => s.alpha_z,
            };
            let h = 1e-6 * base;
            let mut plus = s.clone();
            plus.update_parameter(id, base + h).unwrap();
            let mut minus = s.clone();
            minus.update_parameter(id, base - h).unwrap();
            let fd = (plus.resultant() - minus.resultant()) / (2.0 * h);

            for k in 0..6 {
                assert_relative_eq!(ds[k], fd[k], epsilon = 1e-6, max_relative = 1e-6);
            }
        }
    }

    #[test]
    fn test_send_recv_restores_committed_state() {
        let mut s = section();
        s.set_trial_state(&DVector::from_row_slice(&[1.0, 0.0, 0.0, 0.0, 0.0, 2.0]))
            .unwrap();
        s.commit_state().unwrap();

        let mut ch = StreamChannel::new();
        s.send_self(0, &mut ch).unwrap();
        let mut r = ElasticShearSection::default();
        r.recv_self(0, &mut ch).unwrap();

        assert_eq!(r.tag(), 1);
        assert_eq!(r.resultant(), s.resultant());
        assert_eq!(r.alpha_z, 0.9);
    }

    #[test]
    fn test_unknown_parameter() {
        let mut s = section();
        assert_eq!(s.set_parameter(&["fy"]), None);
        assert!(s.update_parameter(42, 1.0).is_err());
    }
}
