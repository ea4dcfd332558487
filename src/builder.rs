//! Element construction from named section prototypes
//!
//! Elements never share sub-objects: every integration point gets its own
//! clone of the prototype section, and every element its own rule and
//! transformation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{FrameOptions, GeometryLevel};
use crate::elements::{DistributedFrame, FrameElement, PrismaticFrame};
use crate::error::{FrameError, FrameResult};
use crate::integration::{IntegrationRule, LegendreRule, MidpointRule, UserDefinedRule};
use crate::math::Vec3;
use crate::sections::{ElasticShearSection, ElasticTubeSection, FrameSection};
use crate::transform::LinearTransform;

/// Section prototype description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SectionSpec {
    ElasticShear {
        tag: usize,
        e: f64,
        a: f64,
        iz: f64,
        iy: f64,
        g: f64,
        j: f64,
        #[serde(default = "unit")]
        alpha_y: f64,
        #[serde(default = "unit")]
        alpha_z: f64,
    },
    ElasticTube {
        tag: usize,
        e: f64,
        d: f64,
        tw: f64,
        g: f64,
    },
}

fn unit() -> f64 {
    1.0
}

impl SectionSpec {
    pub fn build(&self) -> Box<dyn FrameSection> {
        match *self {
            SectionSpec::ElasticShear {
                tag,
                e,
                a,
                iz,
                iy,
                g,
                j,
                alpha_y,
                alpha_z,
            } => Box::new(
                ElasticShearSection::new(tag, e, a, iz, iy, g, j).with_shear_factors(alpha_y, alpha_z),
            ),
            SectionSpec::ElasticTube { tag, e, d, tw, g } => {
                Box::new(ElasticTubeSection::new(tag, e, d, tw, g))
            }
        }
    }
}

/// Integration rule description
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RuleSpec {
    #[default]
    Legendre,
    Midpoint,
    UserDefined { points: Vec<f64>, weights: Vec<f64> },
}

impl RuleSpec {
    pub fn build(&self) -> FrameResult<Box<dyn IntegrationRule>> {
        Ok(match self {
            RuleSpec::Legendre => Box::new(LegendreRule::new()),
            RuleSpec::Midpoint => Box::new(MidpointRule::new()),
            RuleSpec::UserDefined { points, weights } => {
                Box::new(UserDefinedRule::new(points.clone(), weights.clone())?)
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Distributed,
    Prismatic,
}

fn default_points() -> usize {
    5
}

fn default_vecxz() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

/// Element description, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub kind: ElementKind,
    pub tag: usize,
    pub nodes: [usize; 2],
    /// Name of the section prototype
    pub section: String,
    /// Integration points of a distributed element
    #[serde(default = "default_points")]
    pub num_points: usize,
    #[serde(default)]
    pub rule: RuleSpec,
    /// Vector in the local x-z plane
    #[serde(default = "default_vecxz")]
    pub vecxz: [f64; 3],
    #[serde(default)]
    pub options: FrameOptions,
    #[serde(default)]
    pub geometry: GeometryLevel,
}

/// Sections and elements of a model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default)]
    pub sections: HashMap<String, SectionSpec>,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

/// Library of named section prototypes
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    sections: HashMap<String, Box<dyn FrameSection>>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a section prototype under a unique name
    pub fn add_section(&mut self, name: &str, section: Box<dyn FrameSection>) -> FrameResult<()> {
        if self.sections.contains_key(name) {
            return Err(FrameError::InvalidConfiguration(format!(
                "section '{}' already exists",
                name
            )));
        }
        self.sections.insert(name.to_string(), section);
        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&dyn FrameSection> {
        self.sections.get(name).map(|s| s.as_ref())
    }

    fn prototype(&self, name: &str) -> FrameResult<&dyn FrameSection> {
        self.section(name).ok_or_else(|| {
            FrameError::AllocationFailure(format!("no section prototype named '{}'", name))
        })
    }

    /// Build one element, cloning every sub-object it owns
    pub fn build(&self, spec: &ElementSpec) -> FrameResult<Box<dyn FrameElement>> {
        let prototype = self.prototype(&spec.section)?;
        let [x, y, z] = spec.vecxz;
        let transform = Box::new(LinearTransform::new(Vec3::new(x, y, z)));

        let element: Box<dyn FrameElement> = match spec.kind {
            ElementKind::Distributed => {
                if spec.num_points == 0 {
                    return Err(FrameError::InvalidConfiguration(format!(
                        "element {} needs at least one integration point",
                        spec.tag
                    )));
                }
                let sections = (0..spec.num_points).map(|_| prototype.clone_box()).collect();
                Box::new(DistributedFrame::new(
                    spec.tag,
                    spec.nodes,
                    sections,
                    spec.rule.build()?,
                    transform,
                    spec.options,
                )?)
            }
            ElementKind::Prismatic => Box::new(PrismaticFrame::from_section(
                spec.tag,
                spec.nodes,
                prototype,
                spec.geometry,
                transform,
                spec.options,
            )),
        };
        log::debug!("built {}", element.describe());
        Ok(element)
    }

    /// Build every element of a JSON model description
    pub fn from_json(json: &str) -> FrameResult<(Self, Vec<Box<dyn FrameElement>>)> {
        let model: ModelSpec = serde_json::from_str(json)?;
        let mut builder = Self::new();
        for (name, spec) in &model.sections {
            builder.add_section(name, spec.build())?;
        }
        let elements = model
            .elements
            .iter()
            .map(|spec| builder.build(spec))
            .collect::<FrameResult<Vec<_>>>()?;
        log::info!(
            "built {} elements from {} section prototypes",
            elements.len(),
            builder.sections.len()
        );
        Ok((builder, elements))
    }
}
