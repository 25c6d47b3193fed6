
use propmatch::{GroupingStrategy, Record, Rule, RuleTree, RuleTreeBuilder};
use proptest::prelude::*;
use strategies::{arb_record, arb_rules, linear_match, sorted, PROPERTIES};

fn build(rules: &[Rule<usize>], strategy: GroupingStrategy) -> RuleTree<usize> {
    RuleTreeBuilder::new()
        .add_rules(rules.iter().cloned())
        .grouping(strategy)
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Invariant 1: Agreement with a linear scan
//
// The tree returns exactly the rules a rule-by-rule check would, whatever
// grouping strategy built it.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn agrees_with_linear_scan(rules in arb_rules(), record in arb_record()) {
        let expected = linear_match(&rules, &record);
        for strategy in GroupingStrategy::ALL {
            let tree = build(&rules, strategy);
            let got = sorted(tree.match_record(&record).unwrap());
            prop_assert_eq!(&got, &expected, "mismatch with {} grouping", strategy);
        }
    }

    #[test]
    fn indexed_agrees_with_record(rules in arb_rules(), record in arb_record()) {
        let tree = build(&rules, GroupingStrategy::default());
        let mut builder = tree.record_builder();
        for (property, value) in record.iter() {
            builder = builder.set(property, value.clone());
        }
        let indexed = builder.build();
        prop_assert_eq!(
            sorted(tree.match_indexed(&indexed).unwrap()),
            sorted(tree.match_record(&record).unwrap())
        );
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Determinism
//
// Matching the same record twice, or against a recompiled tree, gives the
// same outcomes.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn determinism_repeated_match(rules in arb_rules(), record in arb_record()) {
        let tree = build(&rules, GroupingStrategy::default());
        let first = sorted(tree.match_record(&record).unwrap());
        for _ in 0..5 {
            let again = sorted(tree.match_record(&record).unwrap());
            prop_assert_eq!(&first, &again);
        }
    }

    #[test]
    fn determinism_recompile(rules in arb_rules(), record in arb_record()) {
        let a = build(&rules, GroupingStrategy::default());
        let b = build(&rules, GroupingStrategy::default());
        prop_assert_eq!(a.node_count(), b.node_count());
        prop_assert_eq!(
            sorted(a.match_record(&record).unwrap()),
            sorted(b.match_record(&record).unwrap())
        );
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Rule order does not change the matched set
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn rule_order_irrelevant(rules in arb_rules(), record in arb_record()) {
        let forward = build(&rules, GroupingStrategy::default());
        let mut reversed_rules = rules.clone();
        reversed_rules.reverse();
        let reversed = build(&reversed_rules, GroupingStrategy::default());
        prop_assert_eq!(
            sorted(forward.match_record(&record).unwrap()),
            sorted(reversed.match_record(&record).unwrap())
        );
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Tree shape
//
// A property is tested at most once on any root-to-leaf path, and every
// walk is a tree walk: one edge per visited child.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn depth_bounded_by_property_count(rules in arb_rules()) {
        for strategy in GroupingStrategy::ALL {
            let tree = build(&rules, strategy);
            prop_assert!(tree.depth() <= tree.properties().len() + 1);
            prop_assert!(tree.properties().len() <= PROPERTIES.len());
        }
    }

    #[test]
    fn each_value_combination_matches_once(rules in arb_rules()) {
        let tree = build(&rules, GroupingStrategy::default());
        for rule in rules.iter().filter(|r| r.conditions.values().all(|c| !c.any.is_empty())) {
            // Every record built from one value per condition reaches the
            // rule's outcome exactly once.
            let mut records = vec![Record::new()];
            for (property, cond) in &rule.conditions {
                records = records
                    .into_iter()
                    .flat_map(|record| {
                        cond.any
                            .iter()
                            .map(move |value| record.clone().set(property, value.clone()))
                    })
                    .collect();
            }
            for record in &records {
                let hits = tree
                    .match_record(record)
                    .unwrap()
                    .into_iter()
                    .filter(|&&outcome| outcome == rule.outcome)
                    .count();
                prop_assert_eq!(hits, 1);
            }
        }
    }

    #[test]
    fn report_counts_are_consistent(rules in arb_rules(), record in arb_record()) {
        let tree = build(&rules, GroupingStrategy::default());
        let report = tree.match_detailed(&record).unwrap();
        prop_assert!(report.nodes_visited() >= 1);
        prop_assert_eq!(report.edges_followed() + 1, report.nodes_visited());
        prop_assert_eq!(
            sorted(report.into_outcomes()),
            linear_match(&rules, &record)
        );
    }
}
