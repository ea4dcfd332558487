//! Response handles and values for element recorders

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Value returned by a response query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Matrix(DMatrix<f64>),
    Tags(Vec<usize>),
    /// One value per sub-object
    List(Vec<ResponseValue>),
}

impl ResponseValue {
    /// Flatten to a vector of numbers
    pub fn as_vector(&self) -> Vec<f64> {
        match self {
            ResponseValue::Scalar(v) => vec![*v],
            ResponseValue::Vector(v) => v.clone(),
            ResponseValue::Matrix(m) => m.iter().copied().collect(),
            ResponseValue::Tags(t) => t.iter().map(|&t| t as f64).collect(),
            ResponseValue::List(items) => items.iter().flat_map(|v| v.as_vector()).collect(),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ResponseValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}

/// Quantities answered by a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionResponse {
    Force,
    Deformation,
    Stiffness,
    Flexibility,
}

impl SectionResponse {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "force" | "forces" => Some(Self::Force),
            "deformation" | "deformations" => Some(Self::Deformation),
            "stiffness" => Some(Self::Stiffness),
            "flexibility" => Some(Self::Flexibility),
            _ => None,
        }
    }
}

/// Quantities answered by a coordinate transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformResponse {
    InitialLength,
    DeformedLength,
    XAxis,
    YAxis,
    ZAxis,
}

impl TransformResponse {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "length" | "initialLength" => Some(Self::InitialLength),
            "deformedLength" => Some(Self::DeformedLength),
            "xaxis" => Some(Self::XAxis),
            "yaxis" => Some(Self::YAxis),
            "zaxis" => Some(Self::ZAxis),
            _ => None,
        }
    }
}

/// Quantities answered by the element itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ElementResponse {
    GlobalForce,
    LocalForce,
    BasicForce,
    BasicDeformation,
    PlasticDeformation,
    IntegrationPoints,
    IntegrationWeights,
    SectionTags,
    Energy,
    RayleighForces,
    Stiffness,
    /// Internal forces at a relative position along the element
    ForcesAt(f64),
}

/// A resolved response, reused for repeated queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Element(ElementResponse),
    Section {
        index: usize,
        response: SectionResponse,
    },
    /// The same query on every section
    AllSections(SectionResponse),
    Transform(TransformResponse),
}
