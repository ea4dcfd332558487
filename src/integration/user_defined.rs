use super::IntegrationRule;
use crate::error::{FrameError, FrameResult};
use crate::parameter::parse_index;
use crate::serialization::{class_tags, Channel};

/// Explicit points and weights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDefinedRule {
    db_tag: usize,
    points: Vec<f64>,
    weights: Vec<f64>,
}

impl UserDefinedRule {
    /// Create a rule from normalized points and weights
    ///
    /// Points must be strictly increasing in (0, 1) and weights must sum to 1.
    pub fn new(points: Vec<f64>, weights: Vec<f64>) -> FrameResult<Self> {
        validate(&points, &weights)?;
        Ok(Self {
            db_tag: 0,
            points,
            weights,
        })
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    fn check_count(&self, num_points: usize) -> FrameResult<()> {
        if num_points != self.points.len() {
            return Err(FrameError::InvalidConfiguration(format!(
                "user-defined rule has {} points, {} requested",
                self.points.len(),
                num_points
            )));
        }
        Ok(())
    }
}

fn validate(points: &[f64], weights: &[f64]) -> FrameResult<()> {
    if points.is_empty() || points.len() != weights.len() {
        return Err(FrameError::InvalidConfiguration(format!(
            "user-defined rule with {} points and {} weights",
            points.len(),
            weights.len()
        )));
    }
    if points.iter().any(|&x| !(x > 0.0 && x < 1.0)) || points.windows(2).any(|w| w[0] >= w[1]) {
        return Err(FrameError::InvalidConfiguration(
            "integration points must be strictly increasing in (0, 1)".to_string(),
        ));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > 1e-10 {
        return Err(FrameError::InvalidConfiguration(format!(
            "integration weights sum to {}",
            sum
        )));
    }
    Ok(())
}

impl IntegrationRule for UserDefinedRule {
    fn class_tag(&self) -> usize {
        class_tags::RULE_USER_DEFINED
    }

    fn db_tag(&self) -> usize {
        self.db_tag
    }

    fn set_db_tag(&mut self, tag: usize) {
        self.db_tag = tag;
    }

    fn locations(&self, num_points: usize, _length: f64) -> FrameResult<Vec<f64>> {
        self.check_count(num_points)?;
        Ok(self.points.clone())
    }

    fn weights(&self, num_points: usize, _length: f64) -> FrameResult<Vec<f64>> {
        self.check_count(num_points)?;
        Ok(self.weights.clone())
    }

    fn clone_box(&self) -> Box<dyn IntegrationRule> {
        Box::new(self.clone())
    }

    fn send_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        channel.send_id(self.db_tag, commit_tag, &[self.points.len() as i64])?;
        let mut data = self.points.clone();
        data.extend_from_slice(&self.weights);
        channel.send_vector(self.db_tag, commit_tag, &data)
    }

    fn recv_self(&mut self, commit_tag: usize, channel: &mut dyn Channel) -> FrameResult<()> {
        let n = channel.recv_id(self.db_tag, commit_tag, 1)?[0];
        if n <= 0 {
            return Err(FrameError::SerializationMismatch(format!(
                "user-defined rule with {} points",
                n
            )));
        }
        let n = n as usize;
        let data = channel.recv_vector(self.db_tag, commit_tag, 2 * n)?;
        let (points, weights) = data.split_at(n);
        validate(points, weights)?;
        self.points = points.to_vec();
        self.weights = weights.to_vec();
        Ok(())
    }

    /// `xi k` addresses the k-th point (1-based)
    fn set_parameter(&mut self, tokens: &[&str]) -> Option<u32> {
        if tokens.len() < 2 || tokens[0] != "xi" {
            return None;
        }
        let k = parse_index(tokens[1])?;
        if k == 0 || k > self.points.len() {
            return None;
        }
        Some(k as u32)
    }

    fn update_parameter(&mut self, id: u32, value: f64) -> FrameResult<()> {
        let k = id as usize;
        if k == 0 || k > self.points.len() {
            return Err(FrameError::UnknownParameter(format!(
                "integration point {}",
                id
            )));
        }
        let mut points = self.points.clone();
        points[k - 1] = value;
        validate(&points, &self.weights)?;
        self.points = points;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("UserDefined ({} points)", self.points.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::DatabaseChannel;

    #[test]
    fn test_validation() {
        assert!(UserDefinedRule::new(vec![0.2, 0.8], vec![0.5, 0.5]).is_ok());
        assert!(UserDefinedRule::new(vec![0.8, 0.2], vec![0.5, 0.5]).is_err());
        assert!(UserDefinedRule::new(vec![0.0, 0.8], vec![0.5, 0.5]).is_err());
        assert!(UserDefinedRule::new(vec![0.2, 0.8], vec![0.5, 0.6]).is_err());
        assert!(UserDefinedRule::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_count_mismatch() {
        let rule = UserDefinedRule::new(vec![0.25, 0.75], vec![0.5, 0.5]).unwrap();
        assert!(rule.locations(3, 1.0).is_err());
        assert_eq!(rule.weights(2, 1.0).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_point_parameter() {
        let mut rule = UserDefinedRule::new(vec![0.25, 0.75], vec![0.5, 0.5]).unwrap();
        let id = rule.set_parameter(&["xi", "2"]).unwrap();
        rule.update_parameter(id, 0.7).unwrap();
        assert_eq!(rule.locations(2, 1.0).unwrap(), vec![0.25, 0.7]);
        assert!(rule.update_parameter(id, 0.1).is_err());
        assert_eq!(rule.set_parameter(&["xi", "3"]), None);
    }

    #[test]
    fn test_round_trip() {
        let mut rule = UserDefinedRule::new(vec![0.1, 0.5, 0.9], vec![0.25, 0.5, 0.25]).unwrap();
        rule.set_db_tag(4);
        let mut db = DatabaseChannel::new();
        rule.send_self(1, &mut db).unwrap();

        let mut other = UserDefinedRule::default();
        other.set_db_tag(4);
        other.recv_self(1, &mut db).unwrap();
        assert_eq!(other.locations(3, 1.0).unwrap(), vec![0.1, 0.5, 0.9]);
    }
}
