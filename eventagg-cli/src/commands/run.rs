use super::InputArgs;
use anyhow::{Context, Result};
use eventagg::result::to_xml;
use eventagg::{AggregationCommand, EngineConfig, MemoryEventSource};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

/// Load the dump, run the command and write the XML result.
pub fn run_aggregation(
    command: &AggregationCommand,
    input: &InputArgs,
    config: &EngineConfig,
) -> Result<()> {
    let source = load_events(&input.events)?;
    tracing::info!(
        events = source.len(),
        source = %input.events.display(),
        "Loaded event dump"
    );

    let aggregation = command
        .run(&source, config)
        .with_context(|| format!("Aggregation failed for {:?}", input.events))?;

    let indent = if input.compact { 0 } else { config.xml.indent };
    let xml = to_xml(&aggregation, indent)?;

    match &input.output {
        Some(path) => {
            std::fs::write(path, &xml).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!(
                intervals = aggregation.len(),
                output = %path.display(),
                "Wrote aggregation"
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(xml.as_bytes())?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

pub fn load_events(path: &Path) -> Result<MemoryEventSource> {
    if path == Path::new("-") {
        return Ok(MemoryEventSource::from_json_lines(io::stdin().lock())?);
    }
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    MemoryEventSource::from_json_lines(BufReader::new(file))
        .with_context(|| format!("Failed to parse events in {:?}", path))
}
