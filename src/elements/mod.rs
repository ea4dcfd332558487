//! Frame (beam-column) elements
//!
//! Elements work in the basic system `[N, θz1, θz2, θy1, θy2, T]`; the
//! coordinate transformation maps to and from global end forces and
//! displacements. A driver connects an element once with
//! [`FrameElement::set_nodes`], then per iteration calls
//! [`FrameElement::update`] followed by force and tangent queries, and
//! finally commits or reverts.

mod base;
pub mod cubic;
mod distributed;
mod prismatic;

pub use base::{FrameBase, StatePhase};
pub use distributed::DistributedFrame;
pub use prismatic::{PrismaticFrame, PrismaticProperties};

pub(crate) use base::PARAM_RHO;

use std::fmt;

use crate::domain::Domain;
use crate::error::FrameResult;
use crate::math::{basic_to_local_force, Mat12, Mat6, Vec12, Vec5, Vec6};
use crate::parameter::ParameterHandle;
use crate::response::{ElementResponse, Response, ResponseValue};
use crate::serialization::{Channel, ObjectBroker};

/// Which tangent to form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TangentState {
    Initial,
    Current,
}

/// Stiffness or mass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TangentRate {
    Stiffness,
    Mass,
}

/// Contract between a frame element and the global solution driver
pub trait FrameElement: fmt::Debug {
    fn base(&self) -> &FrameBase;

    fn base_mut(&mut self) -> &mut FrameBase;

    fn class_tag(&self) -> usize;

    fn clone_box(&self) -> Box<dyn FrameElement>;

    /// Read node coordinates and prepare length-dependent data
    fn set_nodes(&mut self, domain: &Domain) -> FrameResult<()>;

    /// Set the trial state from the trial node displacements
    fn update(&mut self, domain: &Domain) -> FrameResult<()>;

    /// Basic force for the trial state
    fn basic_force(&self) -> FrameResult<Vec6>;

    fn basic_tangent(&self, state: TangentState, rate: TangentRate) -> FrameResult<Mat6>;

    fn commit_state(&mut self) -> FrameResult<()>;

    fn revert_to_last_commit(&mut self) -> FrameResult<()>;

    fn revert_to_start(&mut self) -> FrameResult<()>;

    /// Derivative of the global resisting force at fixed node displacements
    fn resisting_force_sensitivity(&mut self, grad: usize, domain: &Domain) -> FrameResult<Vec12>;

    /// Push converged strain sensitivities into the sub-objects
    fn commit_sensitivity(&mut self, grad: usize, num_grads: usize, domain: &Domain)
        -> FrameResult<()>;

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()>;

    fn recv_self(
        &mut self,
        commit_tag: usize,
        channel: &mut dyn Channel,
        broker: &ObjectBroker,
    ) -> FrameResult<()>;

    fn set_parameter(&mut self, tokens: &[&str]) -> Option<ParameterHandle>;

    fn update_parameter(&mut self, handle: &ParameterHandle, value: f64) -> FrameResult<()>;

    /// Select the parameter sensitivities refer to; `None` deactivates all
    fn activate_parameter(&mut self, handle: Option<&ParameterHandle>);

    fn set_response(&self, tokens: &[&str]) -> Option<Response>;

    fn get_response(&self, response: &Response, domain: &Domain) -> FrameResult<ResponseValue>;

    fn describe(&self) -> String;

    fn tag(&self) -> usize {
        self.base().tag()
    }

    fn external_nodes(&self) -> [usize; 2] {
        self.base().nodes()
    }

    /// Global resisting force
    fn resisting_force(&self) -> FrameResult<Vec12> {
        let q = self.basic_force()?;
        Ok(self.base().transform.global_resisting_force(&q, &Vec5::zeros()))
    }

    /// Global tangent stiffness
    fn tangent_stiff(&self) -> FrameResult<Mat12> {
        let kb = self.basic_tangent(TangentState::Current, TangentRate::Stiffness)?;
        let q = self.basic_force()?;
        Ok(self.base().transform.global_stiff_matrix(&kb, &q))
    }

    fn initial_stiff(&self) -> FrameResult<Mat12> {
        let kb = self.basic_tangent(TangentState::Initial, TangentRate::Stiffness)?;
        Ok(self.base().transform.initial_global_stiff_matrix(&kb))
    }

    fn mass(&self) -> FrameResult<Mat12> {
        self.base().mass_matrix()
    }

    /// Rayleigh damping matrix
    fn damp(&self) -> FrameResult<Mat12> {
        let r = self.base().options.rayleigh;
        let mut c = Mat12::zeros();
        if r.alpha_m != 0.0 {
            c += self.mass()? * r.alpha_m;
        }
        if r.beta_k != 0.0 {
            c += self.tangent_stiff()? * r.beta_k;
        }
        if r.beta_k0 != 0.0 {
            c += self.initial_stiff()? * r.beta_k0;
        }
        if r.beta_kc != 0.0 {
            c += self.base().committed_stiffness * r.beta_kc;
        }
        Ok(c)
    }

    fn rayleigh_damping_forces(&self, domain: &Domain) -> FrameResult<Vec12> {
        let v = self.base().node_velocities(domain)?;
        Ok(self.damp()? * v)
    }

    /// Responses every frame element answers the same way
    fn common_response(&self, response: ElementResponse, domain: &Domain) -> Option<FrameResult<ResponseValue>> {
        let vector = |v: &[f64]| ResponseValue::Vector(v.to_vec());
        let value = match response {
            ElementResponse::GlobalForce => self.resisting_force().map(|p| vector(p.as_slice())),
            ElementResponse::LocalForce => self.basic_force().map(|q| {
                let pl = basic_to_local_force(&q, &Vec5::zeros(), self.base().length());
                vector(pl.as_slice())
            }),
            ElementResponse::BasicForce => self.basic_force().map(|q| vector(q.as_slice())),
            ElementResponse::BasicDeformation => self
                .base()
                .require_bound()
                .map(|_| vector(self.base().transform.basic_trial_disp().as_slice())),
            ElementResponse::RayleighForces => self
                .rayleigh_damping_forces(domain)
                .map(|f| vector(f.as_slice())),
            ElementResponse::Stiffness => self
                .tangent_stiff()
                .map(|k| ResponseValue::Matrix(nalgebra::DMatrix::from_column_slice(12, 12, k.as_slice()))),
            _ => return None,
        };
        Some(value)
    }
}

impl Clone for Box<dyn FrameElement> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Parse an element-level response name shared by all frame elements
pub(crate) fn parse_common_response(token: &str) -> Option<ElementResponse> {
    match token {
        "force" | "forces" | "globalForce" | "globalForces" => Some(ElementResponse::GlobalForce),
        "localForce" | "localForces" => Some(ElementResponse::LocalForce),
        "basicForce" | "basicForces" => Some(ElementResponse::BasicForce),
        "basicDeformation" | "basicDeformations" | "chordRotation" | "chordDeformation"
        | "deformations" => Some(ElementResponse::BasicDeformation),
        "rayleighForces" | "RayleighForces" => Some(ElementResponse::RayleighForces),
        "stiffness" => Some(ElementResponse::Stiffness),
        "energy" => Some(ElementResponse::Energy),
        _ => None,
    }
}
