//! Cross-section constitutive models
//!
//! A section maps a generalized strain, ordered by its response codes, to a
//! stress resultant and tangent. Every integration point of an element owns
//! its own section with independent history.

mod elastic_shear;
mod elastic_tube;

pub use elastic_shear::ElasticShearSection;
pub use elastic_tube::ElasticTubeSection;

use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};
use crate::response::{ResponseValue, SectionResponse};
use crate::serialization::Channel;

/// Component of a section's generalized strain/resultant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionCode {
    /// Axial force
    P,
    /// Bending moment about local z
    Mz,
    /// Bending moment about local y
    My,
    /// Torsion
    T,
    /// Shear along local y
    Vy,
    /// Shear along local z
    Vz,
}

/// Constitutive contract of a frame cross-section
pub trait FrameSection: fmt::Debug {
    fn tag(&self) -> usize;

    fn class_tag(&self) -> usize;

    fn db_tag(&self) -> usize;

    fn set_db_tag(&mut self, tag: usize);

    /// Ordering of strain and resultant components
    fn codes(&self) -> &[SectionCode];

    fn order(&self) -> usize {
        self.codes().len()
    }

    /// Set the trial strain
    fn set_trial_state(&mut self, strain: &DVector<f64>) -> FrameResult<()>;

    /// Trial strain
    fn deformation(&self) -> DVector<f64>;

    /// Stress resultant at the trial strain
    fn resultant(&self) -> DVector<f64>;

    /// Tangent at the trial strain
    fn tangent(&self) -> DMatrix<f64>;

    fn initial_tangent(&self) -> DMatrix<f64>;

    /// Inverse of the trial tangent, formed directly by the section
    fn flexibility(&self) -> FrameResult<DMatrix<f64>>;

    fn initial_flexibility(&self) -> FrameResult<DMatrix<f64>>;

    fn commit_state(&mut self) -> FrameResult<()>;

    fn revert_to_last_commit(&mut self) -> FrameResult<()>;

    fn revert_to_start(&mut self) -> FrameResult<()>;

    /// Deep copy with independent history
    fn clone_box(&self) -> Box<dyn FrameSection>;

    /// Derivative of the resultant with respect to the active parameter
    ///
    /// With `conditional` the strain is held fixed.
    fn resultant_sensitivity(&self, grad: usize, conditional: bool) -> DVector<f64>;

    fn tangent_sensitivity(&self, grad: usize) -> DMatrix<f64>;

    fn initial_tangent_sensitivity(&self, grad: usize) -> DMatrix<f64>;

    /// dF/dh = -F·(dk/dh)·F
    fn flexibility_sensitivity(&self, grad: usize) -> FrameResult<DMatrix<f64>> {
        let f = self.flexibility()?;
        Ok(-(&f * self.tangent_sensitivity(grad) * &f))
    }

    /// Store the converged strain sensitivity for gradient `grad`
    fn commit_sensitivity(
        &mut self,
        strain_sensitivity: &DVector<f64>,
        grad: usize,
        num_grads: usize,
    ) -> FrameResult<()>;

    /// Strain sensitivity stored by the last [`FrameSection::commit_sensitivity`]
    fn committed_strain_sensitivity(&self, _grad: usize) -> Option<DVector<f64>> {
        None
    }

    /// Resolve a named parameter, returning its id
    fn set_parameter(&mut self, tokens: &[&str]) -> Option<u32>;

    fn update_parameter(&mut self, id: u32, value: f64) -> FrameResult<()>;

    /// Select the parameter sensitivities refer to (0 deactivates)
    fn activate_parameter(&mut self, id: u32);

    /// Strain energy density 0.5·e·s
    fn energy(&self) -> f64 {
        0.5 * self.deformation().dot(&self.resultant())
    }

    fn get_response(&self, response: SectionResponse) -> FrameResult<ResponseValue> {
        Ok(match response {
            SectionResponse::Force => ResponseValue::Vector(self.resultant().as_slice().to_vec()),
            SectionResponse::Deformation => {
                ResponseValue::Vector(self.deformation().as_slice().to_vec())
            }
            SectionResponse::Stiffness => ResponseValue::Matrix(self.tangent()),
            SectionResponse::Flexibility => ResponseValue::Matrix(self.flexibility()?),
        })
    }

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()>;

    fn recv_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()>;

    fn describe(&self) -> String;
}

impl Clone for Box<dyn FrameSection> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Diagonal flexibility from uncoupled rigidities
pub(crate) fn diagonal_flexibility(rigidities: &[f64]) -> FrameResult<DMatrix<f64>> {
    let mut f = DMatrix::zeros(rigidities.len(), rigidities.len());
    for (i, &k) in rigidities.iter().enumerate() {
        if k == 0.0 || !k.is_finite() {
            return Err(FrameError::InvalidConfiguration(format!(
                "section rigidity {} is {}, flexibility is undefined",
                i, k
            )));
        }
        f[(i, i)] = 1.0 / k;
    }
    Ok(f)
}

/// Trial/committed strain with stored strain sensitivities
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StrainHistory {
    pub trial: DVector<f64>,
    pub committed: DVector<f64>,
    pub sensitivity: Vec<DVector<f64>>,
}

impl StrainHistory {
    pub fn new(order: usize) -> Self {
        Self {
            trial: DVector::zeros(order),
            committed: DVector::zeros(order),
            sensitivity: Vec::new(),
        }
    }

    pub fn set_trial(&mut self, strain: &DVector<f64>) -> FrameResult<()> {
        if strain.len() != self.trial.len() {
            return Err(FrameError::InvalidConfiguration(format!(
                "strain of size {} given to a section of order {}",
                strain.len(),
                self.trial.len()
            )));
        }
        self.trial.copy_from(strain);
        Ok(())
    }

    pub fn commit(&mut self) {
        self.committed.copy_from(&self.trial);
    }

    pub fn revert(&mut self) {
        self.trial.copy_from(&self.committed);
    }

    pub fn reset(&mut self) {
        self.trial.fill(0.0);
        self.committed.fill(0.0);
        self.sensitivity.clear();
    }

    pub fn store_sensitivity(
        &mut self,
        de: &DVector<f64>,
        grad: usize,
        num_grads: usize,
    ) -> FrameResult<()> {
        if grad >= num_grads {
            return Err(FrameError::InvalidConfiguration(format!(
                "gradient index {} out of range for {} gradients",
                grad, num_grads
            )));
        }
        let order = self.trial.len();
        if self.sensitivity.len() != num_grads {
            self.sensitivity.resize(num_grads, DVector::zeros(order));
        }
        self.sensitivity[grad] = de.clone();
        Ok(())
    }

    pub fn stored_sensitivity(&self, grad: usize) -> Option<DVector<f64>> {
        self.sensitivity.get(grad).cloned()
    }
}
