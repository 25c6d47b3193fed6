use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use super::error::{CompileError, MatchError};
use super::grouping::GroupingStrategy;
use super::indexed_record::{IndexedRecord, RecordBuilder};
use super::match_report::MatchReport;
use super::node::Node;
use super::property_registry::PropertyRegistry;
use super::record::Record;
use super::rule::{Conditions, Rule};
use super::value::Value;

/// Builder for constructing a [`RuleTree`].
///
/// Rules accumulate in declaration order and are compiled into an immutable,
/// thread-safe discrimination tree by [`build()`](Self::build).
///
/// # Example
///
/// ```
/// use propmatch::{Record, RuleTreeBuilder};
///
/// let tree = RuleTreeBuilder::new()
///     .rule("orange", |r| r.eq("color-a", "red").eq("color-b", "yellow"))
///     .rule("dark", |r| r.any("color-a", ["black", "eternal darkness"]))
///     .build()
///     .unwrap();
///
/// let record = Record::new().set("color-a", "black");
/// assert_eq!(tree.match_record(&record).unwrap(), vec![&"dark"]);
/// ```
#[derive(Debug)]
pub struct RuleTreeBuilder<T> {
    rules: Vec<Rule<T>>,
    strategy: GroupingStrategy,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    conditions: BTreeMap<String, Conditions>,
}

impl<T> Default for RuleTreeBuilder<T> {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            strategy: GroupingStrategy::default(),
        }
    }
}

impl<T> RuleTreeBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule producing `outcome`. The closure adds its conditions; a
    /// closure that adds none defines an unconditional rule.
    #[must_use]
    pub fn rule(mut self, outcome: T, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::default());
        self.rules.push(Rule {
            conditions: builder.conditions,
            outcome,
        });
        self
    }

    #[must_use]
    pub fn add_rule(mut self, rule: Rule<T>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append rules after those already added.
    #[must_use]
    pub fn add_rules(mut self, rules: impl IntoIterator<Item = Rule<T>>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Select how the compiler picks grouping properties.
    #[must_use]
    pub fn grouping(mut self, strategy: GroupingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Compile the rules into an immutable `RuleTree`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if any condition holds a value that cannot be
    /// matched. No tree is produced in that case.
    pub fn build(self) -> Result<RuleTree<T>, CompileError> {
        let compiled = crate::compile::compile(&self.rules, self.strategy)?;
        Ok(RuleTree {
            nodes: compiled.nodes,
            outcomes: self.rules.into_iter().map(|r| r.outcome).collect(),
            properties: compiled.properties,
            strategy: self.strategy,
        })
    }
}

impl RuleBuilder {
    /// Require `property` to equal any of `values`. Replaces an earlier
    /// condition on the same property.
    #[must_use]
    pub fn any<I, V>(mut self, property: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.conditions
            .insert(property.to_owned(), Conditions::any(values));
        self
    }

    /// Require `property` to equal `value`.
    #[must_use]
    pub fn eq(self, property: &str, value: impl Into<Value>) -> Self {
        self.any(property, [value.into()])
    }
}

/// A compiled, immutable discrimination tree. Thread-safe and designed to
/// live behind `Arc`.
#[derive(Debug)]
pub struct RuleTree<T> {
    pub(crate) nodes: Vec<Node>,
    /// Outcome of every compiled rule, by rule position.
    pub(crate) outcomes: Vec<T>,
    pub(crate) properties: PropertyRegistry,
    pub(crate) strategy: GroupingStrategy,
}

impl<T: Clone> RuleTree<T> {
    /// Compile borrowed rules, cloning their outcomes into the tree.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] if any condition holds a value that cannot be
    /// matched.
    pub fn compile(rules: &[Rule<T>]) -> Result<Self, CompileError> {
        RuleTreeBuilder::new().add_rules(rules.iter().cloned()).build()
    }
}

impl<T> RuleTree<T> {
    /// Match a record against the tree.
    ///
    /// Returns the outcome of every rule whose conditions the record
    /// satisfies. Order is unspecified; an empty vector means nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError`] if the record holds an unmatchable value for a
    /// property the walk needs to compare. No outcomes are returned then.
    pub fn match_record(&self, record: &Record) -> Result<Vec<&T>, MatchError> {
        self.walk_record(record).map(|walk| walk.outcomes)
    }

    /// Create a record builder for this tree. The builder uses the property
    /// registry to place values at pre-resolved indices.
    #[must_use]
    pub fn record_builder(&self) -> RecordBuilder<'_> {
        RecordBuilder::new(&self.properties)
    }

    /// Match a pre-indexed record. No property-name lookups happen here.
    ///
    /// # Errors
    ///
    /// Same as [`match_record()`](Self::match_record).
    pub fn match_indexed(&self, record: &IndexedRecord) -> Result<Vec<&T>, MatchError> {
        crate::matcher::walk(&self.nodes, &self.outcomes, &self.properties, |p| {
            record.get(p)
        })
        .map(|walk| walk.outcomes)
    }

    /// Match with diagnostics.
    ///
    /// # Errors
    ///
    /// Same as [`match_record()`](Self::match_record).
    pub fn match_detailed(&self, record: &Record) -> Result<MatchReport<'_, T>, MatchError> {
        let start = Instant::now();
        let walk = self.walk_record(record)?;
        Ok(MatchReport::new(
            walk.outcomes,
            walk.nodes_visited,
            walk.edges_followed,
            start.elapsed(),
        ))
    }

    fn walk_record(&self, record: &Record) -> Result<crate::matcher::Walk<'_, T>, MatchError> {
        let properties = &self.properties;
        crate::matcher::walk(&self.nodes, &self.outcomes, properties, |p| {
            properties.name(p).and_then(|name| record.get(name))
        })
    }

    /// Number of nodes in the tree, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of compiled rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        // Children are stored after their parents, so a reverse sweep sees
        // every child before its parent.
        let mut depths = vec![1_usize; self.nodes.len()];
        for id in (0..self.nodes.len()).rev() {
            let deepest_child = self.nodes[id]
                .branches
                .iter()
                .flat_map(|b| b.edges.entries())
                .map(|(_, child)| depths[child])
                .max()
                .unwrap_or(0);
            depths[id] = 1 + deepest_child;
        }
        depths.first().copied().unwrap_or(0)
    }

    /// Properties referenced by the compiled rules.
    #[must_use]
    pub fn properties(&self) -> &PropertyRegistry {
        &self.properties
    }

    #[must_use]
    pub fn grouping(&self) -> GroupingStrategy {
        self.strategy
    }

    /// Outcomes of all compiled rules in declaration order.
    #[must_use]
    pub fn outcomes(&self) -> &[T] {
        &self.outcomes
    }
}

impl RuleTree<String> {
    /// Parse a DSL string and compile it into a `RuleTree`.
    ///
    /// # Errors
    ///
    /// Returns [`PropmatchError`](crate::PropmatchError) on parse or compile failure.
    pub fn from_dsl(input: &str) -> Result<Self, crate::PropmatchError> {
        let parsed = crate::parse::parse(input)?;
        let tree = RuleTreeBuilder::new().add_rules(parsed.rules).build()?;
        Ok(tree)
    }

    /// Read a DSL file and compile it into a `RuleTree`.
    ///
    /// # Errors
    ///
    /// Returns [`PropmatchError`](crate::PropmatchError) on I/O, parse, or compile failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::PropmatchError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }
}

#[cfg(feature = "binary-cache")]
impl<T: serde::Serialize> RuleTree<T> {
    /// Serialize this compiled tree to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata so callers can detect a stale cache.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Serialize this compiled tree and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(feature = "binary-cache")]
impl<T: serde::de::DeserializeOwned> RuleTree<T> {
    /// Deserialize a compiled tree produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Read a file and deserialize the compiled tree it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl<T> fmt::Display for RuleTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleTree({} rules, {} nodes, {} properties, depth {})",
            self.rule_count(),
            self.node_count(),
            self.properties.len(),
            self.depth(),
        )
    }
}
