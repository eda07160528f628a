//! # coexpr - Conserved Co-expression Clique Discovery
//!
//! Command-line driver for coexpressolog discovery across species.
//!
//! ## Usage
//!
//! ```bash
//! # All tissues, default settings
//! coexpr -e expression.tsv -r orthologs.tsv -o results/
//!
//! # One tissue, Pearson correlation, denser networks
//! coexpr -e expression.tsv -r orthologs.tsv --tissue leaf -m pearson -d 0.05
//!
//! # Only two species pairs, signed analysis only
//! coexpr -e expression.tsv -r orthologs.tsv --species-pair Zmays,Sbicolor \
//!     --species-pair Zmays,Osativa --signed-only
//! ```
//!
//! ## Options
//!
//! - `-e, --expression <FILE>`: Long-format expression table
//! - `-r, --orthologs <FILE>`: Ortholog (HOG) table
//! - `-o, --outdir <DIR>`: Output directory (default: coexpr_results)
//! - `-m, --method <METHOD>`: spearman or pearson (default: spearman)
//! - `-d, --density <FRACTION>`: Network edge density (default: 0.03)
//! - `--fdr <Q>`: FDR threshold for conserved edges (default: 0.05)
//! - `-k, --min-clique <SIZE>`: Smallest reported clique (default: 3)
//! - `--percentile <P>`: Polarity divergence percentile (default: 75)
//! - `--min-samples <N>`: Fewest samples per network (default: 3)
//! - `--signed-only`: Skip the unsigned variant and polarity analysis
//! - `--core-only`: Use only core HOG members
//! - `--species-pair <A,B>`: Species pair to test (repeatable)
//! - `--max-search-steps <N>`: Clique search budget per HOG (0 = unbounded)
//! - `--search-time-limit <SECS>`: Wall-clock clique search limit per HOG
//! - `--tissue <NAME>`: Analyse one tissue only
//! - `-t, --threads <N>`: Worker threads (default: all cores)
//! - `-q, --quiet`: Suppress progress messages
//!
//! Log verbosity can be overridden with `RUST_LOG`.

use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use coexpr_core::config::{CoexprConfig, CorrelationMethod, SearchBudget};
use coexpr_core::output::write_tissue_outputs;
use coexpr_core::results::UnitStatus;
use coexpr_core::types::SpeciesPair;
use coexpr_core::*;
use log::{info, warn};

fn cli() -> Command {
    Command::new("coexpr")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Conserved co-expression clique discovery across species")
        .arg(
            Arg::new("expression")
                .short('e')
                .long("expression")
                .value_name("FILE")
                .required(true)
                .help("Expression table (species, tissue, gene_id, sample_id, value, life_habit)"),
        )
        .arg(
            Arg::new("orthologs")
                .short('r')
                .long("orthologs")
                .value_name("FILE")
                .required(true)
                .help("Ortholog table (hog_id, og_id, species, gene_id, life_habit, core)"),
        )
        .arg(
            Arg::new("outdir")
                .short('o')
                .long("outdir")
                .value_name("DIR")
                .help("Output directory")
                .default_value("coexpr_results"),
        )
        .arg(
            Arg::new("method")
                .short('m')
                .long("method")
                .value_name("METHOD")
                .help("Correlation method: spearman or pearson")
                .default_value("spearman"),
        )
        .arg(
            Arg::new("density")
                .short('d')
                .long("density")
                .value_name("FRACTION")
                .value_parser(value_parser!(f64))
                .help("Fraction of gene pairs kept as network edges")
                .default_value("0.03"),
        )
        .arg(
            Arg::new("fdr")
                .long("fdr")
                .value_name("Q")
                .value_parser(value_parser!(f64))
                .help("Adjusted p-value threshold for conserved edges")
                .default_value("0.05"),
        )
        .arg(
            Arg::new("min-clique")
                .short('k')
                .long("min-clique")
                .value_name("SIZE")
                .value_parser(value_parser!(usize))
                .help("Smallest reported clique")
                .default_value("3"),
        )
        .arg(
            Arg::new("percentile")
                .long("percentile")
                .value_name("P")
                .value_parser(value_parser!(f64))
                .help("Unsigned-score percentile for polarity divergence")
                .default_value("75"),
        )
        .arg(
            Arg::new("min-samples")
                .long("min-samples")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Fewest samples a network may be built from")
                .default_value("3"),
        )
        .arg(
            Arg::new("signed-only")
                .long("signed-only")
                .action(ArgAction::SetTrue)
                .help("Skip the unsigned variant and polarity analysis"),
        )
        .arg(
            Arg::new("core-only")
                .long("core-only")
                .action(ArgAction::SetTrue)
                .help("Use only core HOG members"),
        )
        .arg(
            Arg::new("species-pair")
                .long("species-pair")
                .value_name("A,B")
                .action(ArgAction::Append)
                .help("Species pair to test (repeatable; default: all pairs)"),
        )
        .arg(
            Arg::new("max-search-steps")
                .long("max-search-steps")
                .value_name("N")
                .value_parser(value_parser!(u64))
                .help("Clique search steps per HOG, 0 for unbounded (default: 1000000)"),
        )
        .arg(
            Arg::new("search-time-limit")
                .long("search-time-limit")
                .value_name("SECS")
                .value_parser(value_parser!(f64))
                .help("Wall-clock clique search limit per HOG"),
        )
        .arg(
            Arg::new("tissue")
                .long("tissue")
                .value_name("NAME")
                .help("Analyse one tissue only"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Worker threads"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Quiet mode"),
        )
}

fn parse_species_pair(value: &str) -> Result<SpeciesPair, String> {
    match value.split_once(',') {
        Some((first, second)) if !first.trim().is_empty() && !second.trim().is_empty() => {
            Ok(SpeciesPair::new(first.trim(), second.trim()))
        }
        _ => Err(format!("Invalid species pair '{value}', expected A,B")),
    }
}

fn build_config(matches: &ArgMatches) -> Result<CoexprConfig, Box<dyn std::error::Error>> {
    let mut search_budget = SearchBudget::default();
    if let Some(&steps) = matches.get_one::<u64>("max-search-steps") {
        search_budget.max_steps = (steps > 0).then_some(steps);
    }
    if let Some(&seconds) = matches.get_one::<f64>("search-time-limit") {
        let limit = Duration::try_from_secs_f64(seconds)
            .map_err(|_| format!("Invalid search time limit '{seconds}'"))?;
        search_budget.time_limit = Some(limit);
    }

    let species_pairs = matches
        .get_many::<String>("species-pair")
        .map(|values| {
            values
                .map(|value| parse_species_pair(value))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let method = matches
        .get_one::<String>("method")
        .map(|method| method.parse::<CorrelationMethod>())
        .transpose()?
        .unwrap_or_default();

    let config = CoexprConfig {
        correlation_method: method,
        density: matches.get_one::<f64>("density").copied().unwrap_or(0.03),
        fdr_threshold: matches.get_one::<f64>("fdr").copied().unwrap_or(0.05),
        min_clique_size: matches.get_one::<usize>("min-clique").copied().unwrap_or(3),
        polarity_percentile: matches.get_one::<f64>("percentile").copied().unwrap_or(75.0),
        min_samples: matches.get_one::<usize>("min-samples").copied().unwrap_or(3),
        unsigned: !matches.get_flag("signed-only"),
        core_only: matches.get_flag("core-only"),
        species_pairs,
        search_budget,
        num_threads: matches.get_one::<usize>("threads").copied(),
        quiet: matches.get_flag("quiet"),
    };
    config.validate()?;
    Ok(config)
}

/// Main entry point for the coexpr CLI.
///
/// Parses arguments, runs discovery for each tissue and writes the tables of
/// every tissue into the output directory.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let default_level = if matches.get_flag("quiet") { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = build_config(&matches)?;
    let quiet = config.quiet;
    let (Some(expression), Some(orthologs), Some(outdir)) = (
        matches.get_one::<String>("expression"),
        matches.get_one::<String>("orthologs"),
        matches.get_one::<String>("outdir"),
    ) else {
        return Err("Expression table, ortholog table and output directory are required".into());
    };

    let analyzer = CoexprAnalyzer::new(config)?;
    let tissue = matches.get_one::<String>("tissue").map(String::as_str);
    let analyses = analyzer.analyze_files(expression, orthologs, tissue)?;

    let mut total_cliques = 0;
    let mut failed_units = 0;
    for analysis in &analyses {
        let written = write_tissue_outputs(outdir, analysis)?;
        info!("{}: wrote {} files to {outdir}", analysis.tissue, written.len());

        for unit in analysis.manifest.failed() {
            warn!(
                "{}: {} {} ({}) failed: {}",
                analysis.tissue, unit.kind, unit.unit_id, unit.mode, unit.reason
            );
        }
        total_cliques += analysis.signed.strata.all.len();
        failed_units += analysis.manifest.count(UnitStatus::Failed);
    }

    if !quiet {
        eprintln!(
            "Analysis complete! Found {} signed cliques in {} tissues ({} failed units).",
            total_cliques,
            analyses.len(),
            failed_units
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_parse_species_pair() {
        assert_eq!(
            parse_species_pair("Zmays, Sbicolor").unwrap(),
            SpeciesPair::new("Zmays", "Sbicolor")
        );
        assert!(parse_species_pair("Zmays").is_err());
        assert!(parse_species_pair(",Sbicolor").is_err());
    }

    #[test]
    fn test_build_config_defaults() {
        let matches = cli().get_matches_from(["coexpr", "-e", "x.tsv", "-r", "y.tsv"]);
        let config = build_config(&matches).unwrap();
        assert_eq!(config.density, 0.03);
        assert!(config.unsigned);
        assert!(config.species_pairs.is_none());
        assert_eq!(config.search_budget, SearchBudget::default());
    }

    #[test]
    fn test_build_config_flags() {
        let matches = cli().get_matches_from([
            "coexpr",
            "-e",
            "x.tsv",
            "-r",
            "y.tsv",
            "-m",
            "pearson",
            "--signed-only",
            "--species-pair",
            "A,B",
            "--species-pair",
            "A,C",
            "--max-search-steps",
            "0",
            "-k",
            "2",
        ]);
        let config = build_config(&matches).unwrap();
        assert_eq!(config.correlation_method, CorrelationMethod::Pearson);
        assert!(!config.unsigned);
        assert_eq!(config.species_pairs.unwrap().len(), 2);
        assert!(config.search_budget.max_steps.is_none());
        assert_eq!(config.min_clique_size, 2);
    }

    #[test]
    fn test_build_config_rejects_bad_values() {
        let matches =
            cli().get_matches_from(["coexpr", "-e", "x.tsv", "-r", "y.tsv", "-d", "1.5"]);
        assert!(build_config(&matches).is_err());

        let matches =
            cli().get_matches_from(["coexpr", "-e", "x.tsv", "-r", "y.tsv", "-m", "kendall"]);
        assert!(build_config(&matches).is_err());
    }
}
