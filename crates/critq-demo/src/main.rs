//! critq command-line explorer
//!
//! Compiles a person search into a query plan, runs it against the sample
//! data set and prints the matches, the count or the plan itself.

mod formatter;

use anyhow::Context;
use clap::Parser;
use critq_core::proto::{SortDirection, SortInfo};
use critq_demo::{PersonCriteria, PersonDirectory, PersonQuery, PersonSort};
use formatter::OutputFormat;
use tracing_subscriber::EnvFilter;

/// critq person search
#[derive(Parser, Debug)]
#[command(name = "critq")]
#[command(version, about = "Compile and run criteria queries over the sample people")]
pub struct Args {
    /// Print the number of matches instead of the matching rows
    #[arg(long)]
    pub count: bool,

    /// Sort key as NAME or NAME:desc, primary first (repeatable)
    #[arg(short, long = "sort", value_parser = parse_sort)]
    pub sorts: Vec<SortInfo<PersonSort>>,

    /// Criteria as a JSON object, e.g. '{"lastName":{"op":"EQ","value":"Smith"}}'
    #[arg(short, long)]
    pub criteria: Option<String>,

    /// Print the compiled plan instead of running it
    #[arg(long)]
    pub explain: bool,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,
}

fn parse_sort(arg: &str) -> Result<SortInfo<PersonSort>, String> {
    let (name, direction) = match arg.rsplit_once(':') {
        Some((name, "asc")) => (name, SortDirection::Asc),
        Some((name, "desc")) => (name, SortDirection::Desc),
        Some((_, other)) => return Err(format!("unknown sort direction '{}'", other)),
        None => (arg, SortDirection::Asc),
    };
    Ok(SortInfo::new(name.parse()?, direction))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let criteria = match &args.criteria {
        Some(json) => serde_json::from_str::<PersonCriteria>(json).context("invalid criteria")?,
        None => PersonCriteria::default(),
    };
    let mut definition = PersonQuery::new(criteria);
    definition.sorts = args.sorts;

    let directory = PersonDirectory::new()?;
    let formatter = formatter::create_formatter(args.format);

    let output = match (args.explain, args.count) {
        (true, true) => formatter.format_plan(&directory.count_plan(&definition)?.to_string()),
        (true, false) => formatter.format_plan(&directory.entity_plan(&definition)?.to_string()),
        (false, true) => formatter.format_count(directory.count(&definition)?),
        (false, false) => formatter.format_rows(&directory.search(&definition)?),
    };
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_direction() {
        assert_eq!(
            parse_sort("first-name:desc"),
            Ok(SortInfo::desc(PersonSort::FirstName))
        );
        assert_eq!(
            parse_sort("BUSINESS_NAME"),
            Ok(SortInfo::asc(PersonSort::BusinessName))
        );
        assert!(parse_sort("first-name:sideways").is_err());
        assert!(parse_sort("shoe-size").is_err());
    }

    #[test]
    fn test_args_collect_sorts_in_order() {
        let args = Args::try_parse_from([
            "critq",
            "--count",
            "--sort",
            "business-name",
            "-s",
            "last-name:desc",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(args.count);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(
            args.sorts,
            vec![
                SortInfo::asc(PersonSort::BusinessName),
                SortInfo::desc(PersonSort::LastName)
            ]
        );
    }
}
