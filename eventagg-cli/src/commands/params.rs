use anyhow::Result;
use eventagg::AggregationCommand;

/// Print the query-parameter encoding of a command
pub fn run_params(command: &AggregationCommand, query_string: bool) -> Result<()> {
    if query_string {
        println!("{}", command.to_query_string());
    } else {
        let params = command.to_query_parameters();
        println!("{}", serde_json::to_string_pretty(&params)?);
    }
    Ok(())
}
