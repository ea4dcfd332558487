//! Element options: mass, damping, releases and geometric nonlinearity

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// End release for bending in one plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Release {
    /// Both ends continuous
    #[default]
    None,
    /// Moment released at end I
    I,
    /// Moment released at end J
    J,
}

impl Release {
    /// Numeric code used on the wire
    pub fn code(self) -> f64 {
        match self {
            Release::None => 0.0,
            Release::I => 1.0,
            Release::J => 2.0,
        }
    }

    pub fn from_code(code: f64) -> FrameResult<Self> {
        match code.round() as i64 {
            0 => Ok(Release::None),
            1 => Ok(Release::I),
            2 => Ok(Release::J),
            other => Err(FrameError::SerializationMismatch(format!(
                "invalid release code {}",
                other
            ))),
        }
    }
}

/// Moment releases for bending about local z and local y
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Releases {
    pub z: Release,
    pub y: Release,
}

impl Releases {
    /// Create a release set
    pub fn new(z: Release, y: Release) -> Self {
        Self { z, y }
    }
}

/// Geometric nonlinearity of the closed-form element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryLevel {
    /// Small-displacement linear stiffness
    #[default]
    Linear,
    /// Linearized P-Delta correction
    PDelta,
    /// Exact stability functions
    Exact,
}

impl GeometryLevel {
    pub fn code(self) -> f64 {
        match self {
            GeometryLevel::Linear => 0.0,
            GeometryLevel::PDelta => 1.0,
            GeometryLevel::Exact => 2.0,
        }
    }

    pub fn from_code(code: f64) -> FrameResult<Self> {
        match code.round() as i64 {
            0 => Ok(GeometryLevel::Linear),
            1 => Ok(GeometryLevel::PDelta),
            2 => Ok(GeometryLevel::Exact),
            other => Err(FrameError::SerializationMismatch(format!(
                "invalid geometry level {}",
                other
            ))),
        }
    }
}

/// Mass options
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MassOptions {
    /// Mass per unit length
    pub density: f64,
    /// Use the consistent mass matrix instead of lumped
    pub consistent: bool,
}

/// Rayleigh damping coefficients
///
/// C = αM·M + βK·K_current + βK0·K_initial + βKc·K_committed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RayleighDamping {
    pub alpha_m: f64,
    pub beta_k: f64,
    pub beta_k0: f64,
    pub beta_kc: f64,
}

impl RayleighDamping {
    pub fn new(alpha_m: f64, beta_k: f64, beta_k0: f64, beta_kc: f64) -> Self {
        Self {
            alpha_m,
            beta_k,
            beta_k0,
            beta_kc,
        }
    }

    /// True when every coefficient is zero
    pub fn is_zero(&self) -> bool {
        self.alpha_m == 0.0 && self.beta_k == 0.0 && self.beta_k0 == 0.0 && self.beta_kc == 0.0
    }
}

/// Options shared by every frame element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameOptions {
    #[serde(default)]
    pub mass: MassOptions,
    #[serde(default)]
    pub rayleigh: RayleighDamping,
    #[serde(default)]
    pub releases: Releases,
}

impl FrameOptions {
    /// Set the mass per unit length
    pub fn with_density(mut self, density: f64) -> Self {
        self.mass.density = density;
        self
    }

    /// Use the consistent mass matrix
    pub fn with_consistent_mass(mut self) -> Self {
        self.mass.consistent = true;
        self
    }

    /// Set Rayleigh damping coefficients
    pub fn with_rayleigh(mut self, rayleigh: RayleighDamping) -> Self {
        self.rayleigh = rayleigh;
        self
    }

    /// Set moment releases
    pub fn with_releases(mut self, releases: Releases) -> Self {
        self.releases = releases;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_codes() {
        for r in [Release::None, Release::I, Release::J] {
            assert_eq!(Release::from_code(r.code()).unwrap(), r);
        }
        assert!(Release::from_code(3.0).is_err());
    }

    #[test]
    fn test_options_builders() {
        let opts = FrameOptions::default()
            .with_density(2.5)
            .with_consistent_mass()
            .with_releases(Releases::new(Release::I, Release::None));

        assert_eq!(opts.mass.density, 2.5);
        assert!(opts.mass.consistent);
        assert_eq!(opts.releases.z, Release::I);
        assert!(opts.rayleigh.is_zero());
    }

    #[test]
    fn test_options_from_json() {
        let opts: FrameOptions =
            serde_json::from_str(r#"{"mass":{"density":1.0,"consistent":false}}"#).unwrap();
        assert_eq!(opts.mass.density, 1.0);
        assert_eq!(opts.releases, Releases::default());
    }
}
