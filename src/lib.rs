//! Frame Elements - Beam-column finite elements for 3D structural analysis
//!
//! This library provides two-node frame elements for a host solver:
//! - `DistributedFrame`: numerically integrated cross sections along the member
//! - `PrismaticFrame`: closed-form elastic stiffness with optional P-Delta or
//!   exact stability functions
//! - Direct-differentiation sensitivity of resisting forces to material and
//!   nodal coordinate parameters
//! - Checkpoint/restart and transfer through numeric channels
//!
//! ## Example
//! ```rust
//! use frame_elements::prelude::*;
//!
//! let mut domain = Domain::new();
//! domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
//! domain.add_node(Node::new(2, 4.0, 0.0, 0.0)).unwrap();
//!
//! let section = ElasticShearSection::new(1, 200000.0, 0.01, 8e-5, 8e-5, 80000.0, 1e-4);
//! let sections: Vec<Box<dyn FrameSection>> = (0..5).map(|_| section.clone_box()).collect();
//! let mut element = DistributedFrame::new(
//!     1,
//!     [1, 2],
//!     sections,
//!     Box::new(LegendreRule::new()),
//!     Box::new(LinearTransform::new(Vec3::new(0.0, 0.0, 1.0))),
//!     FrameOptions::default(),
//! )
//! .unwrap();
//!
//! element.set_nodes(&domain).unwrap();
//! domain
//!     .set_trial_displacement(2, Vec6::new(0.001, 0.0, 0.0, 0.0, 0.0, 0.0))
//!     .unwrap();
//! element.update(&domain).unwrap();
//! let q = element.basic_force().unwrap();
//! assert!((q[0] - 0.5).abs() < 1e-9);
//! ```

pub mod builder;
pub mod config;
pub mod domain;
pub mod elements;
pub mod error;
pub mod integration;
pub mod math;
pub mod parameter;
pub mod response;
pub mod sections;
pub mod serialization;
pub mod transform;

/// Re-exports for convenient use
pub mod prelude {
    pub use crate::builder::{ElementKind, ElementSpec, FrameBuilder, ModelSpec, RuleSpec, SectionSpec};
    pub use crate::config::{
        FrameOptions, GeometryLevel, MassOptions, RayleighDamping, Release, Releases,
    };
    pub use crate::domain::{Domain, Node};
    pub use crate::elements::{
        DistributedFrame, FrameElement, PrismaticFrame, PrismaticProperties, StatePhase,
        TangentRate, TangentState,
    };
    pub use crate::error::{FrameError, FrameResult};
    pub use crate::integration::{IntegrationRule, LegendreRule, MidpointRule, UserDefinedRule};
    pub use crate::parameter::ParameterHandle;
    pub use crate::response::{ElementResponse, Response, ResponseValue};
    pub use crate::sections::{ElasticShearSection, ElasticTubeSection, FrameSection, SectionCode};
    pub use crate::serialization::{
        recv_elements, send_elements, Channel, DatabaseChannel, ObjectBroker, StreamChannel,
    };
    pub use crate::transform::{FrameTransform, LinearTransform};
    pub use crate::math::{Mat12, Mat6, Vec12, Vec3, Vec6};
}
