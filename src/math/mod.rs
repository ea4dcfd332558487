//! Mathematical utilities for frame element calculations

use nalgebra::{Matrix3, Matrix6, SMatrix, SVector, Vector3, Vector6};

use crate::config::Release;
use crate::error::{FrameError, FrameResult};

pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// 6x6 matrix in the basic system
pub type Mat6 = Matrix6<f64>;
/// Basic deformations/forces [N, Mz_1, Mz_2, My_1, My_2, T]
pub type Vec6 = Vector6<f64>;
/// Basic-to-local compatibility matrix
pub type Mat6x12 = SMatrix<f64, 6, 12>;
/// 12x12 matrix for element stiffness/mass
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for element forces/displacements
pub type Vec12 = SVector<f64, 12>;
/// Fixed-end reactions in the basic system [Px, Vy_1, Vy_2, Vz_1, Vz_2]
pub type Vec5 = SVector<f64, 5>;

/// Threshold on the stability parameter below which the linear block is used
pub const STABILITY_THRESHOLD: f64 = 1e-12;

/// Below this stability parameter the stability functions use their series
pub const STABILITY_SERIES_LIMIT: f64 = 0.1;

/// Compute the local axes of a frame element
///
/// # Arguments
/// * `i_node` - Start node coordinates
/// * `j_node` - End node coordinates
/// * `vecxz` - A vector lying in the local x-z plane
///
/// # Returns
/// Length and the 3x3 rotation matrix whose rows are the local x, y, z axes
pub fn local_axes(i_node: &Vec3, j_node: &Vec3, vecxz: &Vec3) -> FrameResult<(f64, Mat3)> {
    let dx = j_node - i_node;
    let length = dx.norm();

    if length < 1e-10 {
        return Err(FrameError::InvalidConfiguration(
            "element has zero length".to_string(),
        ));
    }

    let x = dx / length;
    let w = vecxz.cross(&x);
    let w_len = w.norm();
    if w_len < 1e-10 {
        return Err(FrameError::InvalidConfiguration(format!(
            "orientation vector {:?} is parallel to the element axis",
            vecxz.as_slice()
        )));
    }
    let y = w / w_len;
    let z = x.cross(&y);

    let r = Mat3::new(
        x[0], x[1], x[2],
        y[0], y[1], y[2],
        z[0], z[1], z[2],
    );
    Ok((length, r))
}

/// Derivative of the local axes with respect to a perturbation of the chord
///
/// # Arguments
/// * `r` - Rotation matrix from [`local_axes`]
/// * `length` - Element length
/// * `vecxz` - The orientation vector used to build `r`
/// * `d_chord` - Derivative of (j_node - i_node)
///
/// # Returns
/// Derivative of the length and of the rotation matrix
pub fn local_axes_sensitivity(r: &Mat3, length: f64, vecxz: &Vec3, d_chord: &Vec3) -> (f64, Mat3) {
    let x: Vec3 = r.row(0).transpose();
    let y: Vec3 = r.row(1).transpose();

    let dl = x.dot(d_chord);
    let dx = (d_chord - x * dl) / length;

    let w = vecxz.cross(&x);
    let w_len = w.norm();
    let dw = vecxz.cross(&dx);
    let dy = (dw - y * y.dot(&dw)) / w_len;
    let dz = dx.cross(&y) + x.cross(&dy);

    let dr = Mat3::new(
        dx[0], dx[1], dx[2],
        dy[0], dy[1], dy[2],
        dz[0], dz[1], dz[2],
    );
    (dl, dr)
}

/// Build the 12x12 block-diagonal rotation from a 3x3 rotation
pub fn rotation_blocks(r: &Mat3) -> Mat12 {
    let mut t = Mat12::zeros();

    for i in 0..4 {
        let offset = i * 3;
        for row in 0..3 {
            for col in 0..3 {
                t[(offset + row, offset + col)] = r[(row, col)];
            }
        }
    }

    t
}

/// Compatibility matrix mapping local end displacements to basic deformations
pub fn basic_compatibility(length: f64) -> Mat6x12 {
    let l = 1.0 / length;

    #[rustfmt::skip]
    let data = [
        // N: axial elongation
        -1.0, 0.0,  0.0, 0.0,  0.0, 0.0,  1.0, 0.0,  0.0, 0.0, 0.0, 0.0,
        // theta_z at i
        0.0,  l,    0.0, 0.0,  0.0, 1.0,  0.0, -l,   0.0, 0.0, 0.0, 0.0,
        // theta_z at j
        0.0,  l,    0.0, 0.0,  0.0, 0.0,  0.0, -l,   0.0, 0.0, 0.0, 1.0,
        // theta_y at i
        0.0,  0.0,  -l,  0.0,  1.0, 0.0,  0.0, 0.0,  l,   0.0, 0.0, 0.0,
        // theta_y at j
        0.0,  0.0,  -l,  0.0,  0.0, 0.0,  0.0, 0.0,  l,   0.0, 1.0, 0.0,
        // twist
        0.0,  0.0,  0.0, -1.0, 0.0, 0.0,  0.0, 0.0,  0.0, 1.0, 0.0, 0.0,
    ];

    Mat6x12::from_row_slice(&data)
}

/// Derivative of [`basic_compatibility`] for a given d(1/L)/dh
pub fn basic_compatibility_sensitivity(d_one_over_l: f64) -> Mat6x12 {
    let dl = d_one_over_l;
    let mut a = Mat6x12::zeros();
    for row in [1, 2] {
        a[(row, 1)] = dl;
        a[(row, 7)] = -dl;
    }
    for row in [3, 4] {
        a[(row, 2)] = -dl;
        a[(row, 8)] = dl;
    }
    a
}

/// Local end forces from basic forces and fixed-end reactions
///
/// Returns [N_1, Vy_1, Vz_1, T_1, My_1, Mz_1, N_2, Vy_2, Vz_2, T_2, My_2, Mz_2]
pub fn basic_to_local_force(q: &Vec6, p0: &Vec5, length: f64) -> Vec12 {
    let one_over_l = 1.0 / length;
    let mut pl = Vec12::zeros();

    // Axial
    pl[0] = -q[0] + p0[0];
    pl[6] = q[0];

    // Moments about z and shears along y
    let v = (q[1] + q[2]) * one_over_l;
    pl[1] = v + p0[1];
    pl[7] = -v + p0[2];
    pl[5] = q[1];
    pl[11] = q[2];

    // Moments about y and shears along z
    let v = (q[3] + q[4]) * one_over_l;
    pl[2] = -v + p0[3];
    pl[8] = v + p0[4];
    pl[4] = q[3];
    pl[10] = q[4];

    // Torsion
    pl[3] = -q[5];
    pl[9] = q[5];

    pl
}

/// Compute the closed-form elastic stiffness in the basic system
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `g` - Shear modulus
/// * `a` - Cross-sectional area
/// * `jx` - Torsional constant
/// * `iy` - Moment of inertia about local y-axis
/// * `iz` - Moment of inertia about local z-axis
/// * `length` - Element length
/// * `release_z`, `release_y` - Moment releases for bending about z and y
#[allow(clippy::too_many_arguments)]
pub fn basic_elastic_stiffness(
    e: f64,
    g: f64,
    a: f64,
    jx: f64,
    iy: f64,
    iz: f64,
    length: f64,
    release_z: Release,
    release_y: Release,
) -> Mat6 {
    let one_over_l = 1.0 / length;
    let e_over_l = e * one_over_l;

    let mut kb = Mat6::zeros();
    kb[(0, 0)] = a * e_over_l;
    kb[(5, 5)] = g * jx * one_over_l;

    bending_block(&mut kb, 1, iz * e_over_l, release_z);
    bending_block(&mut kb, 3, iy * e_over_l, release_y);

    kb
}

/// Fill the 2x2 bending block starting at `offset` for a flexural rigidity EI/L
fn bending_block(kb: &mut Mat6, offset: usize, ei_over_l: f64, release: Release) {
    let (i, j) = (offset, offset + 1);
    match release {
        Release::None => {
            kb[(i, i)] = 4.0 * ei_over_l;
            kb[(j, j)] = 4.0 * ei_over_l;
            kb[(i, j)] = 2.0 * ei_over_l;
            kb[(j, i)] = 2.0 * ei_over_l;
        }
        // Released at end 1: only the end 2 rotation carries moment
        Release::I => kb[(j, j)] = 3.0 * ei_over_l,
        // Released at end 2
        Release::J => kb[(i, i)] = 3.0 * ei_over_l,
    }
}

/// Bending block from the exact stability functions
///
/// # Arguments
/// * `ei` - Flexural rigidity
/// * `n` - Axial force
/// * `length` - Element length
///
/// # Returns
/// `Some((k_ii, k_ij))`, or `None` when the axial force is too small for the
/// closed form to be evaluated and the linear block must be used instead
pub fn stability_block(ei: f64, n: f64, length: f64) -> Option<(f64, f64)> {
    let psi = length * (n.abs() / ei).sqrt();
    if !(psi > STABILITY_THRESHOLD) {
        return None;
    }

    let ei_over_l = ei / length;
    if psi < STABILITY_SERIES_LIMIT {
        // The closed form cancels catastrophically near ψ = 0
        let p2 = psi * psi;
        let p4 = p2 * p2;
        return Some((
            ei_over_l * (4.0 - 2.0 * p2 / 15.0 - 11.0 * p4 / 6300.0),
            ei_over_l * (2.0 + p2 / 30.0 + 13.0 * p4 / 12600.0),
        ));
    }

    let cs = psi.cos();
    let sn = psi.sin();
    let c = ei_over_l / (2.0 - 2.0 * cs - psi * sn);
    Some((c * psi * (sn - psi * cs), c * psi * (psi - sn)))
}

/// Compute the consistent (translational) mass matrix in local coordinates
///
/// # Arguments
/// * `rho` - Mass per unit length
/// * `length` - Element length
pub fn local_consistent_mass(rho: f64, length: f64) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let m = rho * l / 420.0;

    let mut ml = Mat12::zeros();

    // Axial
    ml[(0, 0)] = 140.0 * m;
    ml[(6, 6)] = 140.0 * m;
    ml[(0, 6)] = 70.0 * m;
    ml[(6, 0)] = 70.0 * m;

    // Transverse y with rotation about z
    #[rustfmt::skip]
    let by = [
        156.0,      22.0 * l,   54.0,       -13.0 * l,
        22.0 * l,   4.0 * l2,   13.0 * l,   -3.0 * l2,
        54.0,       13.0 * l,   156.0,      -22.0 * l,
        -13.0 * l,  -3.0 * l2,  -22.0 * l,  4.0 * l2,
    ];
    // Transverse z with rotation about y
    #[rustfmt::skip]
    let bz = [
        156.0,      -22.0 * l,  54.0,       13.0 * l,
        -22.0 * l,  4.0 * l2,   -13.0 * l,  -3.0 * l2,
        54.0,       -13.0 * l,  156.0,      22.0 * l,
        13.0 * l,   -3.0 * l2,  22.0 * l,   4.0 * l2,
    ];

    let dofs_y = [1, 5, 7, 11];
    let dofs_z = [2, 4, 8, 10];
    for a in 0..4 {
        for b in 0..4 {
            ml[(dofs_y[a], dofs_y[b])] = by[a * 4 + b] * m;
            ml[(dofs_z[a], dofs_z[b])] = bz[a * 4 + b] * m;
        }
    }

    ml
}
