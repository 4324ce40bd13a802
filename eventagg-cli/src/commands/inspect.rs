use anyhow::{Context, Result};
use eventagg::{Aggregation, ResultValue};
use std::io::{self, Read};
use std::path::Path;

/// Print a summary of an XML aggregation result
pub fn run_inspect(input: &Path) -> Result<()> {
    let xml = if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {:?}", input))?
    };

    let aggregation = Aggregation::from_xml(&xml)
        .with_context(|| format!("Invalid aggregation in {:?}", input))?;

    let groups: usize = aggregation.entries().map(|(_, groups)| groups.len()).sum();

    println!();
    println!("================================================================================");
    println!(
        "Aggregation: {} intervals, {} groups",
        aggregation.len(), groups
    );
    println!("================================================================================");

    for result in aggregation.iter() {
        println!();
        println!("{}", result.interval_name());
        println!("{}", "-".repeat(80));
        for (group, value) in &result {
            match value {
                ResultValue::Frequencies(table) => {
                    println!("  {:<30} {}", group, value.kind_name());
                    for (identifier, count) in table {
                        println!("    {:<28} {:>12}", identifier, count);
                    }
                }
                other => {
                    let text = other.to_string();
                    println!("  {:<30} {:>12}  ({})", group, text, other.kind_name());
                }
            }
        }
    }
    println!();

    Ok(())
}
