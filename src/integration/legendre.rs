use gauss_quad::GaussLegendre;

use super::{require_points, IntegrationRule};
use crate::error::{FrameError, FrameResult};
use crate::serialization::class_tags;

/// Gauss-Legendre quadrature, exact for polynomials of degree 2n-1
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegendreRule {
    db_tag: usize,
}

impl LegendreRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points and weights mapped from [-1, 1] to (0, 1), ascending
    fn rule(num_points: usize) -> FrameResult<Vec<(f64, f64)>> {
        require_points(num_points)?;
        if num_points == 1 {
            return Ok(vec![(0.5, 1.0)]);
        }

        let gl = GaussLegendre::new(num_points).map_err(|e| {
            FrameError::InvalidConfiguration(format!("Gauss-Legendre rule: {:?}", e))
        })?;
        let mut pairs: Vec<(f64, f64)> = gl
            .into_node_weight_pairs()
            .into_iter()
            .map(|(x, w)| (0.5 * (1.0 + x), 0.5 * w))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(pairs)
    }
}

impl IntegrationRule for LegendreRule {
    fn class_tag(&self) -> usize {
        class_tags::RULE_LEGENDRE
    }

    fn db_tag(&self) -> usize {
        self.db_tag
    }

    fn set_db_tag(&mut self, tag: usize) {
        self.db_tag = tag;
    }

    fn locations(&self, num_points: usize, _length: f64) -> FrameResult<Vec<f64>> {
        Ok(Self::rule(num_points)?.into_iter().map(|(x, _)| x).collect())
    }

    fn weights(&self, num_points: usize, _length: f64) -> FrameResult<Vec<f64>> {
        Ok(Self::rule(num_points)?.into_iter().map(|(_, w)| w).collect())
    }

    fn clone_box(&self) -> Box<dyn IntegrationRule> {
        Box::new(self.clone())
    }

    fn describe(&self) -> String {
        "Legendre".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_point_rule() {
        let rule = LegendreRule::new();
        let xi = rule.locations(2, 1.0).unwrap();
        let wt = rule.weights(2, 1.0).unwrap();

        let off = 0.5 / 3f64.sqrt();
        assert_relative_eq!(xi[0], 0.5 - off, epsilon = 1e-12);
        assert_relative_eq!(xi[1], 0.5 + off, epsilon = 1e-12);
        assert_relative_eq!(wt[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_exact_for_cubic() {
        // ∫0^1 x^3 dx = 1/4
        let rule = LegendreRule::new();
        let xi = rule.locations(2, 1.0).unwrap();
        let wt = rule.weights(2, 1.0).unwrap();
        let integral: f64 = xi.iter().zip(&wt).map(|(x, w)| w * x.powi(3)).sum();
        assert_relative_eq!(integral, 0.25, epsilon = 1e-12);
    }
}
