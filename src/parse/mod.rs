mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::{ParsedRule, ParsedRules};

/// Parse rule definitions written in the text DSL into a [`ParsedRules`].
///
/// ```text
/// # comment
/// rule orange: color-a in ["red"] and color-b in ["yellow"]
/// rule dark: color-a in ["black", "eternal darkness"]
/// rule "fallback"
/// ```
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid DSL syntax or a rule
/// names the same property twice.
pub fn parse(input: &str) -> Result<ParsedRules, ParseError> {
    use winnow::Parser;
    let rules = grammar::parse_rules
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))?;
    ParsedRules::from_parsed(rules)
}
