use std::collections::HashMap;

use super::value::Scalar;

/// One node of the discrimination tree, stored in the tree's arena.
///
/// `outcomes` holds indices of rules whose every condition is satisfied by the
/// path leading here. Each branch is checked independently during matching.
#[derive(Debug, Clone, Default)]
pub(crate) struct Node {
    pub(crate) outcomes: Vec<usize>,
    pub(crate) branches: Vec<Branch>,
}

/// Children of a node keyed by the value of one property.
#[derive(Debug, Clone)]
pub(crate) struct Branch {
    pub(crate) property: usize,
    pub(crate) edges: Edges,
}

/// Value-to-child map for one branch, split by kind so that lookups never
/// compare across kinds and string lookups borrow instead of allocating.
#[derive(Debug, Clone, Default)]
pub(crate) struct Edges {
    null: Option<usize>,
    bools: [Option<usize>; 2],
    ints: HashMap<i64, usize>,
    strings: HashMap<String, usize>,
}

impl Edges {
    pub(crate) fn insert(&mut self, key: Scalar<'_>, child: usize) {
        match key {
            Scalar::Null => self.null = Some(child),
            Scalar::Bool(b) => self.bools[usize::from(b)] = Some(child),
            Scalar::Int(i) => {
                self.ints.insert(i, child);
            }
            Scalar::Str(s) => {
                self.strings.insert(s.to_owned(), child);
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: Scalar<'_>) -> Option<usize> {
        match key {
            Scalar::Null => self.null,
            Scalar::Bool(b) => self.bools[usize::from(b)],
            Scalar::Int(i) => self.ints.get(&i).copied(),
            Scalar::Str(s) => self.strings.get(s).copied(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        usize::from(self.null.is_some())
            + self.bools.iter().filter(|b| b.is_some()).count()
            + self.ints.len()
            + self.strings.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All edges, sorted by key.
    pub(crate) fn entries(&self) -> Vec<(Scalar<'_>, usize)> {
        let mut entries: Vec<(Scalar<'_>, usize)> = Vec::with_capacity(self.len());
        entries.extend(self.null.map(|child| (Scalar::Null, child)));
        for (b, slot) in [false, true].into_iter().zip(self.bools) {
            entries.extend(slot.map(|child| (Scalar::Bool(b), child)));
        }
        entries.extend(self.ints.iter().map(|(&i, &child)| (Scalar::Int(i), child)));
        entries.extend(
            self.strings
                .iter()
                .map(|(s, &child)| (Scalar::Str(s.as_str()), child)),
        );
        entries.sort_unstable();
        entries
    }
}
