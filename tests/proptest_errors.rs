
use propmatch::{CompileError, MatchError, Rule, RuleTreeBuilder};
use proptest::prelude::*;
use strategies::{arb_invalid_value, arb_mixed_record, arb_rules, linear_match, sorted, PROPERTIES};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Matching never panics. An error always names a property whose record
    /// value is unmatchable; success always agrees with a linear scan.
    #[test]
    fn mixed_records_error_or_agree(rules in arb_rules(), record in arb_mixed_record()) {
        let tree = RuleTreeBuilder::new().add_rules(rules.clone()).build().unwrap();
        match tree.match_record(&record) {
            Ok(outcomes) => {
                prop_assert_eq!(sorted(outcomes), linear_match(&rules, &record));
            }
            Err(MatchError::InvalidValueKind { property, kind }) => {
                let value = record.get(&property);
                prop_assert!(value.is_some(), "error names absent property {}", property);
                let value = value.unwrap();
                prop_assert!(!value.is_matchable());
                prop_assert_eq!(value.kind(), kind);
            }
        }
    }

    /// A rule holding an unmatchable value anywhere fails the whole build.
    #[test]
    fn invalid_condition_value_fails_build(
        mut rules in arb_rules(),
        bad in arb_invalid_value(),
        property in prop::sample::select(PROPERTIES),
    ) {
        let kind = bad.kind();
        let position = rules.len();
        rules.push(Rule::new(position).any(property, [bad]));
        match RuleTreeBuilder::new().add_rules(rules).build() {
            Err(CompileError::InvalidValueKind { rule, property: p, kind: k }) => {
                prop_assert_eq!(rule, position);
                prop_assert_eq!(p, property);
                prop_assert_eq!(k, kind);
            }
            Ok(_) => prop_assert!(false, "build accepted a {} condition", kind),
        }
    }
}
