use super::{require_points, IntegrationRule};
use crate::error::FrameResult;
use crate::serialization::class_tags;

/// Composite midpoint rule with equal weights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MidpointRule {
    db_tag: usize,
}

impl MidpointRule {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IntegrationRule for MidpointRule {
    fn class_tag(&self) -> usize {
        class_tags::RULE_MIDPOINT
    }

    fn db_tag(&self) -> usize {
        self.db_tag
    }

    fn set_db_tag(&mut self, tag: usize) {
        self.db_tag = tag;
    }

    fn locations(&self, num_points: usize, _length: f64) -> FrameResult<Vec<f64>> {
        require_points(num_points)?;
        let n = num_points as f64;
        Ok((0..num_points).map(|i| (i as f64 + 0.5) / n).collect())
    }

    fn weights(&self, num_points: usize, _length: f64) -> FrameResult<Vec<f64>> {
        require_points(num_points)?;
        Ok(vec![1.0 / num_points as f64; num_points])
    }

    fn clone_box(&self) -> Box<dyn IntegrationRule> {
        Box::new(self.clone())
    }

    fn describe(&self) -> String {
        "Midpoint".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_points() {
        let xi = MidpointRule::new().locations(4, 2.0).unwrap();
        assert_eq!(xi, vec![0.125, 0.375, 0.625, 0.875]);
    }
}
