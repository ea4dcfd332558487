//! Construction of blank objects from class tags

use std::collections::HashMap;

use super::class_tags;
use crate::elements::{DistributedFrame, FrameElement, PrismaticFrame};
use crate::error::{FrameError, FrameResult};
use crate::integration::{IntegrationRule, LegendreRule, MidpointRule, UserDefinedRule};
use crate::sections::{ElasticShearSection, ElasticTubeSection, FrameSection};
use crate::transform::{FrameTransform, LinearTransform};

type SectionFactory = fn() -> Box<dyn FrameSection>;
type RuleFactory = fn() -> Box<dyn IntegrationRule>;
type TransformFactory = fn() -> Box<dyn FrameTransform>;
type ElementFactory = fn() -> Box<dyn FrameElement>;

/// Registry of blank-object constructors keyed by class tag
///
/// [`ObjectBroker::default`] knows every type in this crate; callers add
/// their own sections, rules or transformations with the `register_*`
/// methods.
#[derive(Debug, Clone)]
pub struct ObjectBroker {
    sections: HashMap<usize, SectionFactory>,
    rules: HashMap<usize, RuleFactory>,
    transforms: HashMap<usize, TransformFactory>,
    elements: HashMap<usize, ElementFactory>,
}

impl ObjectBroker {
    /// Broker with no registered classes
    pub fn empty() -> Self {
        Self {
            sections: HashMap::new(),
            rules: HashMap::new(),
            transforms: HashMap::new(),
            elements: HashMap::new(),
        }
    }

    pub fn register_section(&mut self, class_tag: usize, factory: SectionFactory) {
        self.sections.insert(class_tag, factory);
    }

    pub fn register_rule(&mut self, class_tag: usize, factory: RuleFactory) {
        self.rules.insert(class_tag, factory);
    }

    pub fn register_transform(&mut self, class_tag: usize, factory: TransformFactory) {
        self.transforms.insert(class_tag, factory);
    }

    pub fn register_element(&mut self, class_tag: usize, factory: ElementFactory) {
        self.elements.insert(class_tag, factory);
    }

    pub fn new_section(&self, class_tag: usize) -> FrameResult<Box<dyn FrameSection>> {
        lookup(&self.sections, "section", class_tag)
    }

    pub fn new_rule(&self, class_tag: usize) -> FrameResult<Box<dyn IntegrationRule>> {
        lookup(&self.rules, "integration rule", class_tag)
    }

    pub fn new_transform(&self, class_tag: usize) -> FrameResult<Box<dyn FrameTransform>> {
        lookup(&self.transforms, "transformation", class_tag)
    }

    pub fn new_element(&self, class_tag: usize) -> FrameResult<Box<dyn FrameElement>> {
        lookup(&self.elements, "element", class_tag)
    }
}

fn lookup<T: ?Sized>(
    table: &HashMap<usize, fn() -> Box<T>>,
    kind: &'static str,
    class_tag: usize,
) -> FrameResult<Box<T>> {
    match table.get(&class_tag) {
        Some(factory) => Ok(factory()),
        None => Err(FrameError::UnknownClassTag {
            kind,
            tag: class_tag,
        }),
    }
}

impl Default for ObjectBroker {
    fn default() -> Self {
        let mut broker = Self::empty();
        broker.register_section(class_tags::SECTION_ELASTIC_SHEAR, || {
            Box::new(ElasticShearSection::default())
        });
        broker.register_section(class_tags::SECTION_ELASTIC_TUBE, || {
            Box::new(ElasticTubeSection::default())
        });
        broker.register_rule(class_tags::RULE_LEGENDRE, || Box::new(LegendreRule::default()));
        broker.register_rule(class_tags::RULE_MIDPOINT, || Box::new(MidpointRule::default()));
        broker.register_rule(class_tags::RULE_USER_DEFINED, || {
            Box::new(UserDefinedRule::default())
        });
        broker.register_transform(class_tags::TRANSFORM_LINEAR, || {
            Box::new(LinearTransform::default())
        });
        broker.register_element(class_tags::ELEMENT_DISTRIBUTED_FRAME, || {
            Box::new(DistributedFrame::blank())
        });
        broker.register_element(class_tags::ELEMENT_PRISMATIC_FRAME, || {
            Box::new(PrismaticFrame::blank())
        });
        broker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_knows_builtin_classes() {
        let broker = ObjectBroker::default();
        let s = broker.new_section(class_tags::SECTION_ELASTIC_TUBE).unwrap();
        assert_eq!(s.class_tag(), class_tags::SECTION_ELASTIC_TUBE);
        let e = broker.new_element(class_tags::ELEMENT_PRISMATIC_FRAME).unwrap();
        assert_eq!(e.class_tag(), class_tags::ELEMENT_PRISMATIC_FRAME);
        let r = broker.new_rule(class_tags::RULE_USER_DEFINED).unwrap();
        assert_eq!(r.class_tag(), class_tags::RULE_USER_DEFINED);
    }

    #[test]
    fn test_unknown_tag() {
        let broker = ObjectBroker::empty();
        assert!(matches!(
            broker.new_transform(99),
            Err(FrameError::UnknownClassTag { tag: 99, .. })
        ));
    }
}
