use std::fmt;

/// How the compiler picks the property to branch on at each node.
///
/// The choice changes only the shape of the tree. Every strategy produces a
/// tree that returns the same set of outcomes for every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GroupingStrategy {
    /// The property referenced by the most pending rules. Ties go to the
    /// property registered first.
    #[default]
    MostShared,
    /// The property registered first: rule order, then property name order
    /// within a rule.
    FirstSeen,
    /// The lexicographically smallest property name.
    Lexicographic,
}

impl GroupingStrategy {
    pub const ALL: [GroupingStrategy; 3] = [
        GroupingStrategy::MostShared,
        GroupingStrategy::FirstSeen,
        GroupingStrategy::Lexicographic,
    ];
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupingStrategy::MostShared => "most-shared",
            GroupingStrategy::FirstSeen => "first-seen",
            GroupingStrategy::Lexicographic => "lexicographic",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_most_shared() {
        assert_eq!(GroupingStrategy::default(), GroupingStrategy::MostShared);
    }

    #[test]
    fn display() {
        assert_eq!(GroupingStrategy::FirstSeen.to_string(), "first-seen");
        assert_eq!(GroupingStrategy::Lexicographic.to_string(), "lexicographic");
    }
}
