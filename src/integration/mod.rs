//! Quadrature rules along the element axis
//!
//! Locations are normalized to (0, 1) and weights sum to 1, so the physical
//! integral of f along an element of length L is `Σ wt[i]·f(xi[i])·L`.

mod legendre;
mod midpoint;
mod user_defined;

pub use legendre::LegendreRule;
pub use midpoint::MidpointRule;
pub use user_defined::UserDefinedRule;

use std::fmt;

use crate::error::{FrameError, FrameResult};
use crate::serialization::Channel;

/// Integration rule shared by all sections of one element
pub trait IntegrationRule: fmt::Debug {
    fn class_tag(&self) -> usize;

    fn db_tag(&self) -> usize;

    fn set_db_tag(&mut self, tag: usize);

    /// Normalized point locations, strictly increasing in (0, 1)
    fn locations(&self, num_points: usize, length: f64) -> FrameResult<Vec<f64>>;

    /// Normalized weights summing to 1
    fn weights(&self, num_points: usize, length: f64) -> FrameResult<Vec<f64>>;

    fn clone_box(&self) -> Box<dyn IntegrationRule>;

    fn send_self(&mut self, _commit_tag: usize, _channel: &mut dyn Channel) -> FrameResult<()> {
        Ok(())
    }

    fn recv_self(&mut self, _commit_tag: usize, _channel: &mut dyn Channel) -> FrameResult<()> {
        Ok(())
    }

    fn set_parameter(&mut self, _tokens: &[&str]) -> Option<u32> {
        None
    }

    fn update_parameter(&mut self, id: u32, _value: f64) -> FrameResult<()> {
        Err(FrameError::UnknownParameter(format!(
            "integration parameter id {}",
            id
        )))
    }

    fn describe(&self) -> String;
}

impl Clone for Box<dyn IntegrationRule> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

fn require_points(num_points: usize) -> FrameResult<()> {
    if num_points == 0 {
        return Err(FrameError::InvalidConfiguration(
            "integration rule needs at least one point".to_string(),
        ));
    }
    Ok(())
}
