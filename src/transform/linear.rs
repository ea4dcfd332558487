use super::FrameTransform;
use crate::error::{FrameError, FrameResult};
use crate::math::{
    self, basic_compatibility, basic_compatibility_sensitivity, basic_to_local_force,
    rotation_blocks, Mat12, Mat3, Mat6, Mat6x12, Vec12, Vec3, Vec5, Vec6,
};
use crate::serialization::{class_tags, Channel};

/// Small-displacement transformation
///
/// The local y axis is `vecxz × x`, so `vecxz` must lie in the local x-z
/// plane and cannot be parallel to the element.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTransform {
    db_tag: usize,
    vecxz: Vec3,
    xi: Vec3,
    xj: Vec3,
    length: f64,
    r: Mat3,
    u_trial: Vec12,
    u_commit: Vec12,
    dxi: Vec3,
    dxj: Vec3,
}

impl Default for LinearTransform {
    fn default() -> Self {
        Self::new(Vec3::zeros())
    }
}

impl LinearTransform {
    /// Create a transformation from the orientation vector
    pub fn new(vecxz: Vec3) -> Self {
        Self {
            db_tag: 0,
            vecxz,
            xi: Vec3::zeros(),
            xj: Vec3::zeros(),
            length: 0.0,
            r: Mat3::identity(),
            u_trial: Vec12::zeros(),
            u_commit: Vec12::zeros(),
            dxi: Vec3::zeros(),
            dxj: Vec3::zeros(),
        }
    }

    /// Orientation vector in the local x-z plane
    pub fn vecxz(&self) -> Vec3 {
        self.vecxz
    }

    /// Basic deformations from global displacements
    fn global_compatibility(&self) -> Mat6x12 {
        basic_compatibility(self.length) * rotation_blocks(&self.r)
    }

    /// d(length), d(1/L) and d(global compatibility) for the active shape parameter
    fn compatibility_sensitivity(&self) -> (f64, f64, Mat3, Mat6x12) {
        let d_chord = self.dxj - self.dxi;
        let (dl, dr) = math::local_axes_sensitivity(&self.r, self.length, &self.vecxz, &d_chord);
        let d1ol = -dl / (self.length * self.length);
        let da = basic_compatibility_sensitivity(d1ol) * rotation_blocks(&self.r)
            + basic_compatibility(self.length) * rotation_blocks(&dr);
        (dl, d1ol, dr, da)
    }
}

fn node_pair(ui: &Vec6, uj: &Vec6) -> Vec12 {
    let mut u = Vec12::zeros();
    u.fixed_rows_mut::<6>(0).copy_from(ui);
    u.fixed_rows_mut::<6>(6).copy_from(uj);
    u
}

impl FrameTransform for LinearTransform {
    fn class_tag(&self) -> usize {
        class_tags::TRANSFORM_LINEAR
    }

    fn db_tag(&self) -> usize {
        self.db_tag
    }

    fn set_db_tag(&mut self, tag: usize) {
        self.db_tag = tag;
    }

    fn clone_box(&self) -> Box<dyn FrameTransform> {
        Box::new(self.clone())
    }

    fn initialize(&mut self, xi: &Vec3, xj: &Vec3) -> FrameResult<()> {
        let (length, r) = math::local_axes(xi, xj, &self.vecxz)?;
        self.xi = *xi;
        self.xj = *xj;
        self.length = length;
        self.r = r;
        Ok(())
    }

    fn update(&mut self, ui: &Vec6, uj: &Vec6) -> FrameResult<()> {
        if self.length <= 0.0 {
            return Err(FrameError::NotReady(
                "transformation has not been initialized".to_string(),
            ));
        }
        self.u_trial = node_pair(ui, uj);
        Ok(())
    }

    fn initial_length(&self) -> f64 {
        self.length
    }

    fn deformed_length(&self) -> f64 {
        let di = self.u_trial.fixed_rows::<3>(0);
        let dj = self.u_trial.fixed_rows::<3>(6);
        (self.xj + dj - self.xi - di).norm()
    }

    fn local_axes(&self) -> Mat3 {
        self.r
    }

    fn basic_trial_disp(&self) -> Vec6 {
        self.global_compatibility() * self.u_trial
    }

    fn global_resisting_force(&self, q: &Vec6, p0: &Vec5) -> Vec12 {
        let pl = basic_to_local_force(q, p0, self.length);
        rotation_blocks(&self.r).transpose() * pl
    }

    fn global_stiff_matrix(&self, kb: &Mat6, _q: &Vec6) -> Mat12 {
        let a = self.global_compatibility();
        a.transpose() * kb * a
    }

    fn initial_global_stiff_matrix(&self, kb: &Mat6) -> Mat12 {
        let a = self.global_compatibility();
        a.transpose() * kb * a
    }

    fn global_consistent_mass(&self, rho: f64) -> Mat12 {
        let t = rotation_blocks(&self.r);
        t.transpose() * math::local_consistent_mass(rho, self.length) * t
    }

    fn commit_state(&mut self) -> FrameResult<()> {
        self.u_commit = self.u_trial;
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FrameResult<()> {
        self.u_trial = self.u_commit;
        Ok(())
    }

    fn revert_to_start(&mut self) -> FrameResult<()> {
        self.u_trial = Vec12::zeros();
        self.u_commit = Vec12::zeros();
        Ok(())
    }

    fn basic_displ_sensitivity(&self, dui: &Vec6, duj: &Vec6) -> Vec6 {
        let mut dv = self.global_compatibility() * node_pair(dui, duj);
        if self.is_shape_sensitivity() {
            dv += self.basic_trial_disp_shape_sensitivity();
        }
        dv
    }

    fn set_coordinate_sensitivity(&mut self, dxi: &Vec3, dxj: &Vec3) {
        self.dxi = *dxi;
        self.dxj = *dxj;
    }

    fn is_shape_sensitivity(&self) -> bool {
        self.dxi != Vec3::zeros() || self.dxj != Vec3::zeros()
    }

    fn dl_dh(&self) -> f64 {
        if !self.is_shape_sensitivity() {
            return 0.0;
        }
        let x: Vec3 = self.r.row(0).transpose();
        x.dot(&(self.dxj - self.dxi))
    }

    fn basic_trial_disp_shape_sensitivity(&self) -> Vec6 {
        if !self.is_shape_sensitivity() {
            return Vec6::zeros();
        }
        let (_, _, _, da) = self.compatibility_sensitivity();
        da * self.u_trial
    }

    fn global_resisting_force_shape_sensitivity(&self, q: &Vec6, p0: &Vec5) -> Vec12 {
        if !self.is_shape_sensitivity() {
            return Vec12::zeros();
        }
        let (_, d1ol, dr, _) = self.compatibility_sensitivity();
        let pl = basic_to_local_force(q, p0, self.length);
        let dpl = basic_compatibility_sensitivity(d1ol).transpose() * q;
        rotation_blocks(&dr).transpose() * pl + rotation_blocks(&self.r).transpose() * dpl
    }

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        let mut data = Vec::with_capacity(21);
        data.extend(self.vecxz.iter());
        data.extend(self.xi.iter());
        data.extend(self.xj.iter());
        data.extend(self.u_commit.iter());
        channel.send_vector(self.db_tag, commit_tag, &data)
    }

    fn recv_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        let data = channel.recv_vector(self.db_tag, commit_tag, 21)?;
        self.vecxz = Vec3::from_column_slice(&data[0..3]);
        let xi = Vec3::from_column_slice(&data[3..6]);
        let xj = Vec3::from_column_slice(&data[6..9]);
        if xj == xi {
            // Sent before its element was connected to nodes
            self.xi = xi;
            self.xj = xj;
            self.length = 0.0;
            self.r = Mat3::identity();
        } else {
            self.initialize(&xi, &xj)?;
        }
        self.u_commit = Vec12::from_column_slice(&data[9..21]);
        self.u_trial = self.u_commit;
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "LinearTransform: vecxz=({}, {}, {}) L={}",
            self.vecxz[0], self.vecxz[1], self.vecxz[2], self.length
        )
    }
}
