//! Handles for named parameters addressed by token paths

use serde::{Deserialize, Serialize};

/// Where a parameter landed after resolving a token path
///
/// Each entry is the id the receiving object handed back. Section entries
/// carry the section index within the element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterHandle {
    pub element: Option<u32>,
    pub sections: Vec<(usize, u32)>,
    pub integration: Option<u32>,
}

impl ParameterHandle {
    /// Handle for a parameter owned by the element itself
    pub fn element(id: u32) -> Self {
        Self {
            element: Some(id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.element.is_none() && self.sections.is_empty() && self.integration.is_none()
    }

    /// Some(self) when anything was resolved
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// Parse a numeric token
pub fn parse_index(token: &str) -> Option<usize> {
    token.trim().parse().ok()
}

/// Index of the point closest to `x`, measured along an element of length `length`
pub fn nearest_point(xi: &[f64], length: f64, x: f64) -> Option<usize> {
    xi.iter()
        .enumerate()
        .map(|(i, &p)| (i, (p * length - x).abs()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_point() {
        let xi = [0.1, 0.5, 0.9];
        assert_eq!(nearest_point(&xi, 10.0, 0.0), Some(0));
        assert_eq!(nearest_point(&xi, 10.0, 6.0), Some(1));
        assert_eq!(nearest_point(&xi, 10.0, 12.0), Some(2));
        assert_eq!(nearest_point(&[], 10.0, 1.0), None);
    }

    #[test]
    fn test_handle_empty() {
        assert!(ParameterHandle::default().non_empty().is_none());
        assert_eq!(ParameterHandle::element(3).element, Some(3));
        assert_eq!(parse_index(" 2"), Some(2));
        assert_eq!(parse_index("x"), None);
    }
}
