use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::types::{Branch, Edges, Node, PropertyRegistry};
use crate::{CompileError, GroupingStrategy, Rule, Scalar};

/// Tree shape produced by [`compile`]. Outcomes stay with the caller; nodes
/// refer to rules by their position in the input slice.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub(crate) nodes: Vec<Node>,
    pub(crate) properties: PropertyRegistry,
}

pub(crate) fn compile<T>(
    rules: &[Rule<T>],
    strategy: GroupingStrategy,
) -> Result<Compiled, CompileError> {
    let mut properties = PropertyRegistry::new();
    let lowered = rules
        .iter()
        .enumerate()
        .map(|(index, rule)| lower_rule(index, rule, &mut properties))
        .collect::<Result<Vec<_>, _>>()?;

    let pending: Vec<Pending<'_>> = lowered
        .iter()
        .enumerate()
        .map(|(rule, conditions)| Pending {
            rule,
            conditions: conditions
                .iter()
                .map(|(property, values)| (*property, values.as_slice()))
                .collect(),
        })
        .collect();

    let mut builder = TreeBuilder {
        nodes: Vec::new(),
        properties: &properties,
        strategy,
    };
    builder.build(pending);
    let nodes = builder.nodes;

    debug!(
        rules = rules.len(),
        nodes = nodes.len(),
        properties = properties.len(),
        %strategy,
        "compiled rule tree"
    );

    Ok(Compiled { nodes, properties })
}

/// Validate every condition value of a rule and resolve property names to
/// registry indices. Values within one condition-set are sorted and deduplicated.
fn lower_rule<'a, T>(
    index: usize,
    rule: &'a Rule<T>,
    properties: &mut PropertyRegistry,
) -> Result<Vec<(usize, Vec<Scalar<'a>>)>, CompileError> {
    let mut lowered = Vec::with_capacity(rule.conditions.len());
    for (name, conditions) in &rule.conditions {
        let mut values = conditions
            .any
            .iter()
            .map(|value| {
                value.as_scalar().map_err(|kind| {
                    debug!(rule = index, property = %name, %kind, "rejected condition value");
                    CompileError::InvalidValueKind {
                        rule: index,
                        property: name.clone(),
                        kind,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        values.sort_unstable();
        values.dedup();
        lowered.push((properties.register(name), values));
    }
    Ok(lowered)
}

/// A rule still being placed, with the conditions not yet consumed by the
/// path above the node under construction.
#[derive(Debug, Clone)]
struct Pending<'a> {
    rule: usize,
    conditions: Vec<(usize, &'a [Scalar<'a>])>,
}

struct TreeBuilder<'r> {
    nodes: Vec<Node>,
    properties: &'r PropertyRegistry,
    strategy: GroupingStrategy,
}

impl TreeBuilder<'_> {
    /// Build the tree for `pending` with an explicit work stack, so path
    /// length is not bounded by the thread stack. A node is allocated when
    /// its parent's edge is created, so children always follow their parent.
    fn build<'a>(&mut self, pending: Vec<Pending<'a>>) {
        self.nodes.push(Node::default());
        let mut work = vec![(0_usize, pending)];
        while let Some((id, pending)) = work.pop() {
            self.fill_node(id, pending, &mut work);
        }
    }

    /// Set the outcomes and branches of node `id`, allocating its children
    /// and queueing their pending rules on `work`.
    fn fill_node<'a>(
        &mut self,
        id: usize,
        pending: Vec<Pending<'a>>,
        work: &mut Vec<(usize, Vec<Pending<'a>>)>,
    ) {
        let (unconditional, mut conditional): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|p| p.conditions.is_empty());
        let outcomes: Vec<usize> = unconditional.into_iter().map(|p| p.rule).collect();

        let mut branches = Vec::new();
        while let Some(property) = self.choose_property(&conditional) {
            trace!(
                node = id,
                property = self.properties.name(property).unwrap_or_default(),
                pending = conditional.len(),
                "grouping"
            );

            let mut buckets: BTreeMap<Scalar<'a>, Vec<Pending<'a>>> = BTreeMap::new();
            let mut deferred = Vec::new();
            for mut p in conditional {
                let Some(pos) = p.conditions.iter().position(|(prop, _)| *prop == property)
                else {
                    deferred.push(p);
                    continue;
                };
                let (_, values) = p.conditions.remove(pos);
                for &value in values {
                    buckets.entry(value).or_default().push(p.clone());
                }
            }
            conditional = deferred;

            // Rules with an empty condition-set leave no edges behind.
            if buckets.is_empty() {
                continue;
            }
            let mut edges = Edges::default();
            for (value, group) in buckets {
                let child = self.nodes.len();
                self.nodes.push(Node::default());
                edges.insert(value, child);
                work.push((child, group));
            }
            branches.push(Branch { property, edges });
        }

        let node = &mut self.nodes[id];
        node.outcomes = outcomes;
        node.branches = branches;
    }

    fn choose_property(&self, pending: &[Pending<'_>]) -> Option<usize> {
        let referenced = || pending.iter().flat_map(|p| p.conditions.iter().map(|(prop, _)| *prop));
        match self.strategy {
            GroupingStrategy::FirstSeen => referenced().min(),
            GroupingStrategy::Lexicographic => {
                referenced().min_by_key(|&prop| (self.properties.name(prop), prop))
            }
            GroupingStrategy::MostShared => {
                let mut counts = vec![0_usize; self.properties.len()];
                for prop in referenced() {
                    counts[prop] += 1;
                }
                counts
                    .iter()
                    .enumerate()
                    .filter(|(_, &count)| count > 0)
                    // max_by_key keeps the last maximum; reverse to prefer the lowest index
                    .rev()
                    .max_by_key(|(_, &count)| count)
                    .map(|(prop, _)| prop)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{compile, Compiled};
    use crate::{CompileError, GroupingStrategy, Rule, Scalar, Value, ValueKind};

    fn colormix() -> Vec<Rule<&'static str>> {
        vec![
            Rule::new("orange").eq("color-a", "red").eq("color-b", "yellow"),
            Rule::new("orange")
                .eq("color-a", "yellow")
                .any("color-b", ["red", "orange"]),
            Rule::new("dark").any("color-a", ["black", "eternal darkness"]),
        ]
    }

    #[test]
    fn empty_rule_list_is_single_leaf() {
        let compiled = compile::<()>(&[], GroupingStrategy::default()).unwrap();
        assert_eq!(compiled.nodes.len(), 1);
        assert!(compiled.nodes[0].outcomes.is_empty());
        assert!(compiled.nodes[0].branches.is_empty());
    }

    #[test]
    fn unconditional_rules_land_on_root() {
        let rules = vec![Rule::new("a"), Rule::new("b").eq("x", 1_i64), Rule::new("c")];
        let compiled = compile(&rules, GroupingStrategy::default()).unwrap();
        assert_eq!(compiled.nodes[0].outcomes, vec![0, 2]);
        assert_eq!(compiled.nodes[0].branches.len(), 1);
    }

    #[test]
    fn or_expansion_replicates_rule_per_value() {
        let rules = vec![Rule::new("dark").any("color-a", ["black", "eternal darkness"])];
        let compiled = compile(&rules, GroupingStrategy::default()).unwrap();
        let root = &compiled.nodes[0];
        assert_eq!(root.branches.len(), 1);
        let edges = &root.branches[0].edges;
        assert_eq!(edges.len(), 2);
        for (_, child) in edges.entries() {
            assert_eq!(compiled.nodes[child].outcomes, vec![0]);
        }
    }

    #[test]
    fn duplicate_values_collapse() {
        let rules = vec![Rule::new("r").any("x", [1_i64, 1, 1])];
        let compiled = compile(&rules, GroupingStrategy::default()).unwrap();
        let edges = &compiled.nodes[0].branches[0].edges;
        assert_eq!(edges.len(), 1);
        let child = edges.get(Scalar::Int(1)).unwrap();
        assert_eq!(compiled.nodes[child].outcomes, vec![0]);
    }

    #[test]
    fn empty_condition_set_leaves_no_branch() {
        let rules = vec![Rule::new("never").any("x", Vec::<Value>::new())];
        let compiled = compile(&rules, GroupingStrategy::default()).unwrap();
        assert_eq!(compiled.nodes.len(), 1);
        assert!(compiled.nodes[0].branches.is_empty());
        assert!(compiled.nodes[0].outcomes.is_empty());
    }

    #[test]
    fn independent_properties_branch_as_siblings() {
        let rules = vec![Rule::new("a").eq("x", 1_i64), Rule::new("b").eq("y", 2_i64)];
        let compiled = compile(&rules, GroupingStrategy::default()).unwrap();
        let props: Vec<usize> = compiled.nodes[0]
            .branches
            .iter()
            .map(|b| b.property)
            .collect();
        assert_eq!(props.len(), 2);
        assert_ne!(props[0], props[1]);
    }

    #[test]
    fn children_follow_parents_in_arena() {
        let compiled = compile(&colormix(), GroupingStrategy::default()).unwrap();
        for (id, node) in compiled.nodes.iter().enumerate() {
            for branch in &node.branches {
                for (_, child) in branch.edges.entries() {
                    assert!(child > id);
                }
            }
        }
    }

    #[test]
    fn most_shared_groups_on_common_property() {
        // "shared" appears in all three rules, "a" in only one and registered first.
        let rules = vec![
            Rule::new(1).eq("a", 1_i64).eq("shared", 1_i64),
            Rule::new(2).eq("shared", 2_i64),
            Rule::new(3).eq("shared", 3_i64),
        ];
        let compiled = compile(&rules, GroupingStrategy::MostShared).unwrap();
        let root = &compiled.nodes[0];
        assert_eq!(root.branches.len(), 1);
        assert_eq!(
            compiled.properties.name(root.branches[0].property),
            Some("shared")
        );
    }

    #[test]
    fn first_seen_groups_on_earliest_property() {
        let rules = vec![
            Rule::new(1).eq("a", 1_i64).eq("shared", 1_i64),
            Rule::new(2).eq("shared", 2_i64),
        ];
        let compiled = compile(&rules, GroupingStrategy::FirstSeen).unwrap();
        let root = &compiled.nodes[0];
        assert_eq!(compiled.properties.name(root.branches[0].property), Some("a"));
    }

    #[test]
    fn lexicographic_groups_on_smallest_name() {
        let rules = vec![Rule::new(1).eq("zeta", 1_i64), Rule::new(2).eq("alpha", 1_i64)];
        let compiled = compile(&rules, GroupingStrategy::Lexicographic).unwrap();
        let root = &compiled.nodes[0];
        assert_eq!(
            compiled.properties.name(root.branches[0].property),
            Some("alpha")
        );
    }

    #[test]
    fn invalid_kind_aborts_compilation() {
        let rules = vec![
            Rule::new("ok").eq("a", "x"),
            Rule::new("bad").any("b", [Value::Int(1), Value::List(vec![])]),
        ];
        match compile(&rules, GroupingStrategy::default()) {
            Err(CompileError::InvalidValueKind {
                rule,
                property,
                kind,
            }) => {
                assert_eq!(rule, 1);
                assert_eq!(property, "b");
                assert_eq!(kind, ValueKind::List);
            }
            other => panic!("expected InvalidValueKind, got {other:?}"),
        }
    }

    #[test]
    fn float_condition_rejected() {
        let rules = vec![Rule::new("r").eq("size", 1.5_f64)];
        assert!(matches!(
            compile(&rules, GroupingStrategy::default()),
            Err(CompileError::InvalidValueKind {
                kind: ValueKind::Float,
                ..
            })
        ));
    }

    #[test]
    fn input_rules_untouched() {
        let rules = colormix();
        let before = rules.clone();
        compile(&rules, GroupingStrategy::default()).unwrap();
        assert_eq!(rules, before);
    }

    fn nodes_holding(compiled: &Compiled, rule: usize) -> usize {
        compiled
            .nodes
            .iter()
            .filter(|node| node.outcomes.contains(&rule))
            .count()
    }

    #[test]
    fn long_conjunction_compiles_to_chain() {
        let mut rule = Rule::new(());
        for i in 0..5000_i64 {
            rule = rule.eq(&format!("p{i}"), i);
        }
        let compiled = compile(&[rule], GroupingStrategy::default()).unwrap();
        assert_eq!(compiled.nodes.len(), 5001);
        assert_eq!(nodes_holding(&compiled, 0), 1);
    }

    proptest! {
        /// A rule is stored on exactly one node per combination of its
        /// distinct condition values, and nowhere if any set is empty.
        #[test]
        fn one_node_per_value_combination(
            conditions in prop::collection::vec(
                prop::collection::btree_map("[a-d]", prop::collection::vec(-2_i64..=2, 0..4), 0..=3),
                1..8,
            ),
        ) {
            let rules: Vec<Rule<usize>> = conditions
                .iter()
                .enumerate()
                .map(|(i, sets)| {
                    sets.iter().fold(Rule::new(i), |rule, (name, values)| {
                        rule.any(name, values.iter().copied())
                    })
                })
                .collect();

            for strategy in GroupingStrategy::ALL {
                let compiled = compile(&rules, strategy).unwrap();
                for (i, sets) in conditions.iter().enumerate() {
                    let expected: usize = sets
                        .values()
                        .map(|values| {
                            let mut distinct = values.clone();
                            distinct.sort_unstable();
                            distinct.dedup();
                            distinct.len()
                        })
                        .product();
                    prop_assert_eq!(
                        nodes_holding(&compiled, i),
                        expected,
                        "rule {} with {} grouping",
                        i,
                        strategy
                    );
                }
            }
        }
    }
}
