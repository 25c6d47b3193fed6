//! Mix two colours and print what each mix turns into.
//!
//! Run with `RUST_LOG=propmatch=trace cargo run --example colormix` to see
//! how the tree is built.

use propmatch::{PropmatchError, Record, Rule, RuleTreeBuilder};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), PropmatchError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let tree = RuleTreeBuilder::new()
        .add_rules([
            Rule::new("orange")
                .any("color-a", ["red"])
                .any("color-b", ["yellow"]),
            Rule::new("orange")
                .any("color-a", ["yellow"])
                .any("color-b", ["red", "orange"]),
            Rule::new("dark").any("color-a", ["black", "eternal darkness"]),
            Rule::new("gray")
                .any("color-a", ["black"])
                .any("color-b", ["white"]),
            Rule::new("rainbow").any("special-sauce", ["unicorn sparkles", "magic"]),
        ])
        .build()?;

    println!("{tree}");

    let records = [
        Record::new().set("color-a", "red").set("color-b", "yellow"),
        Record::new().set("color-a", "yellow").set("color-b", "red"),
        Record::new().set("color-a", "black").set("color-b", "red"),
        Record::new()
            .set("color-a", "black")
            .set("color-b", "red")
            .set("special-sauce", "unicorn sparkles"),
        Record::new().set("color-a", "black").set("color-b", "white"),
        Record::new().set("color-a", "eternal darkness"),
    ];

    for record in &records {
        let mut fields: Vec<String> = record.iter().map(|(k, v)| format!("{k}={v}")).collect();
        fields.sort();
        let outcomes = tree.match_record(record)?;
        println!("{{{}}} => {outcomes:?}", fields.join(" "));
    }

    Ok(())
}
