use std::fmt;
use std::time::Duration;

/// Detailed match report returned by
/// [`RuleTree::match_detailed()`](super::RuleTree::match_detailed).
///
/// Contains the matched outcomes, how much of the tree was walked, and the
/// wall-clock duration of the match.
#[derive(Debug, Clone)]
#[must_use]
pub struct MatchReport<'t, T> {
    outcomes: Vec<&'t T>,
    nodes_visited: usize,
    edges_followed: usize,
    duration: Duration,
}

impl<'t, T> MatchReport<'t, T> {
    pub(crate) fn new(
        outcomes: Vec<&'t T>,
        nodes_visited: usize,
        edges_followed: usize,
        duration: Duration,
    ) -> Self {
        Self {
            outcomes,
            nodes_visited,
            edges_followed,
            duration,
        }
    }

    /// The matched outcomes, same as [`RuleTree::match_record()`](super::RuleTree::match_record).
    #[must_use]
    pub fn outcomes(&self) -> &[&'t T] {
        &self.outcomes
    }

    #[must_use]
    pub fn into_outcomes(self) -> Vec<&'t T> {
        self.outcomes
    }

    /// Number of tree nodes visited, including the root.
    #[must_use]
    pub fn nodes_visited(&self) -> usize {
        self.nodes_visited
    }

    /// Number of (property, value) edges followed.
    #[must_use]
    pub fn edges_followed(&self) -> usize {
        self.edges_followed
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl<T> fmt::Display for MatchReport<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matched: {}", self.outcomes.len())?;
        write!(
            f,
            ", visited: {} nodes, {} edges",
            self.nodes_visited, self.edges_followed
        )?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accessors() {
        let a = "orange";
        let report = MatchReport::new(vec![&a], 3, 2, Duration::from_nanos(500));

        assert_eq!(report.outcomes(), &[&"orange"]);
        assert_eq!(report.nodes_visited(), 3);
        assert_eq!(report.edges_followed(), 2);
        assert_eq!(report.duration(), Duration::from_nanos(500));
        assert_eq!(report.into_outcomes(), vec![&"orange"]);
    }

    #[test]
    fn report_display() {
        let report: MatchReport<'_, ()> = MatchReport::new(vec![], 1, 0, Duration::from_nanos(100));
        let s = report.to_string();
        assert!(s.contains("matched: 0"));
        assert!(s.contains("visited: 1 nodes, 0 edges"));
    }
}
