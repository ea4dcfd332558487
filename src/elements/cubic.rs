//! Cubic Hermite interpolation of basic deformations to section strains
//!
//! Curvature at normalized location ξ is `((6ξ-4)·θ1 + (6ξ-2)·θ2) / L`,
//! axial strain and twist are constant along the element.
//!
//! Each section code touches at most two basic components, so B(ξ) is
//! never formed; products are accumulated straight into the 6-component
//! basic quantities.

use nalgebra::{DMatrix, DVector};

use crate::math::{Mat6, Vec6};
use crate::sections::SectionCode;

/// Nonzero entries (basic index, value) of the B(ξ) row for `code`
///
/// Shear codes have an empty row.
fn row(code: SectionCode, xi: f64) -> [(usize, f64); 2] {
    let a = 6.0 * xi - 4.0;
    let b = 6.0 * xi - 2.0;
    match code {
        SectionCode::P => [(0, 1.0), (0, 0.0)],
        SectionCode::Mz => [(1, a), (2, b)],
        SectionCode::My => [(3, a), (4, b)],
        SectionCode::T => [(5, 1.0), (5, 0.0)],
        SectionCode::Vy | SectionCode::Vz => [(0, 0.0), (0, 0.0)],
    }
}

/// e = B(ξ)·v·scale
pub fn section_strain(codes: &[SectionCode], xi: f64, v: &Vec6, scale: f64) -> DVector<f64> {
    DVector::from_iterator(
        codes.len(),
        codes
            .iter()
            .map(|&code| row(code, xi).iter().map(|&(k, b)| b * v[k]).sum::<f64>() * scale),
    )
}

/// q += B(ξ)ᵀ·s·weight
pub fn add_force(q: &mut Vec6, codes: &[SectionCode], xi: f64, s: &DVector<f64>, weight: f64) {
    for (i, &code) in codes.iter().enumerate() {
        let si = s[i] * weight;
        for (k, b) in row(code, xi) {
            q[k] += b * si;
        }
    }
}

/// kb += B(ξ)ᵀ·ks·B(ξ)·weight
pub fn add_stiffness(
    kb: &mut Mat6,
    codes: &[SectionCode],
    xi: f64,
    ks: &DMatrix<f64>,
    weight: f64,
) {
    for (i, &ci) in codes.iter().enumerate() {
        let ri = row(ci, xi);
        for (j, &cj) in codes.iter().enumerate() {
            let kij = ks[(i, j)] * weight;
            if kij == 0.0 {
                continue;
            }
            let rj = row(cj, xi);
            for &(p, bp) in &ri {
                for &(r, br) in &rj {
                    kb[(p, r)] += bp * kij * br;
                }
            }
        }
    }
}
