//! Coordinate transformations between global, local and basic systems

mod linear;

pub use linear::LinearTransform;

use std::fmt;

use crate::error::FrameResult;
use crate::math::{Mat12, Mat3, Mat6, Vec12, Vec3, Vec5, Vec6};
use crate::response::{ResponseValue, TransformResponse};
use crate::serialization::Channel;

/// Kinematics of a two-node frame element
///
/// Node displacement vectors are global `[ux, uy, uz, rx, ry, rz]`. Basic
/// quantities follow `[N, θz1, θz2, θy1, θy2, T]`.
pub trait FrameTransform: fmt::Debug {
    fn class_tag(&self) -> usize;

    fn db_tag(&self) -> usize;

    fn set_db_tag(&mut self, tag: usize);

    fn clone_box(&self) -> Box<dyn FrameTransform>;

    /// Compute geometry from the node coordinates
    fn initialize(&mut self, xi: &Vec3, xj: &Vec3) -> FrameResult<()>;

    /// Set trial node displacements
    fn update(&mut self, ui: &Vec6, uj: &Vec6) -> FrameResult<()>;

    fn initial_length(&self) -> f64;

    fn deformed_length(&self) -> f64;

    /// Rows are the local x, y, z axes
    fn local_axes(&self) -> Mat3;

    fn basic_trial_disp(&self) -> Vec6;

    /// Global end forces from basic forces and fixed-end reactions
    fn global_resisting_force(&self, q: &Vec6, p0: &Vec5) -> Vec12;

    fn global_stiff_matrix(&self, kb: &Mat6, q: &Vec6) -> Mat12;

    fn initial_global_stiff_matrix(&self, kb: &Mat6) -> Mat12;

    /// Consistent mass for a mass per unit length `rho`
    fn global_consistent_mass(&self, rho: f64) -> Mat12;

    fn commit_state(&mut self) -> FrameResult<()>;

    fn revert_to_last_commit(&mut self) -> FrameResult<()>;

    fn revert_to_start(&mut self) -> FrameResult<()>;

    /// Total derivative of the basic deformation for given node displacement sensitivities
    fn basic_displ_sensitivity(&self, dui: &Vec6, duj: &Vec6) -> Vec6;

    /// Node coordinate sensitivities for the active shape parameter
    fn set_coordinate_sensitivity(&mut self, dxi: &Vec3, dxj: &Vec3);

    fn is_shape_sensitivity(&self) -> bool;

    fn dl_dh(&self) -> f64;

    fn d1_over_l_dh(&self) -> f64 {
        let l = self.initial_length();
        -self.dl_dh() / (l * l)
    }

    /// Basic deformation derivative at fixed node displacements
    fn basic_trial_disp_shape_sensitivity(&self) -> Vec6;

    /// Global force derivative at fixed basic forces
    fn global_resisting_force_shape_sensitivity(&self, q: &Vec6, p0: &Vec5) -> Vec12;

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()>;

    fn recv_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()>;

    fn set_response(&self, tokens: &[&str]) -> Option<TransformResponse> {
        TransformResponse::parse(tokens.first()?)
    }

    fn get_response(&self, response: TransformResponse) -> ResponseValue {
        let r = self.local_axes();
        let row = |i: usize| ResponseValue::Vector(r.row(i).iter().copied().collect());
        match response {
            TransformResponse::InitialLength => ResponseValue::Scalar(self.initial_length()),
            TransformResponse::DeformedLength => ResponseValue::Scalar(self.deformed_length()),
            TransformResponse::XAxis => row(0),
            TransformResponse::YAxis => row(1),
            TransformResponse::ZAxis => row(2),
        }
    }

    fn describe(&self) -> String;
}

impl Clone for Box<dyn FrameTransform> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
