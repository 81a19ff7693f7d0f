//! presetdb query CLI - match tags and search presets from the command line
//!
//! Usage:
//!     presetdb-query --dir data match --geometry point --tag amenity=cafe
//!     presetdb-query --dir data search "bakery" --geometry area --lat 48.85 --lon 2.35
//!     presetdb-query --dir data --language de show amenity/cafe
//!
//! Set `RUST_LOG=presetdb_core=debug` to see load and admission logs.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use presetdb_core::{
    value::parse_document, BoundaryTable, DatabaseConfig, FeatureDefinition, GeometryKind, LatLon,
    PresetError, PresetsDatabase, Result, Tags,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "presetdb-query")]
#[command(about = "Match tags against and search a presets database")]
#[command(version)]
struct Args {
    /// Directory holding presets.json and the other documents
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// JSON file with a database configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Language code, overrides the configuration
    #[arg(short, long)]
    language: Option<String>,

    /// geoJSON FeatureCollection of country boundaries
    #[arg(long)]
    boundaries: Option<PathBuf>,

    /// Do not load the supplementary catalogue and regions
    #[arg(long)]
    base_only: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the preset that best describes a tag set
    Match {
        #[arg(short, long, default_value = "point")]
        geometry: GeometryKind,

        /// Tag as key=value, repeatable
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        /// Fall back to the generic preset of the geometry
        #[arg(long)]
        fallback: bool,
    },
    /// Search presets by text, geometry and location
    Search {
        query: Option<String>,

        #[arg(short, long, default_value = "point")]
        geometry: GeometryKind,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lon: f64,

        /// Maximum number of results
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one preset with its inherited fields
    Show { id: String },
}

fn parse_tag(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[derive(Serialize)]
struct FeatureOutput<'a> {
    id: &'a str,
    name: Option<&'a str>,
    tags: &'a Tags,
    geometry: &'a [GeometryKind],
    supplementary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<String>>,
}

impl<'a> FeatureOutput<'a> {
    fn new(feature: &'a FeatureDefinition) -> Self {
        Self {
            id: &feature.id,
            name: feature.name.as_deref(),
            tags: &feature.tags,
            geometry: &feature.geometry,
            supplementary: feature.is_supplementary,
            score: None,
            fields: None,
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "presetdb_core=debug" } else { "presetdb_core=warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let json = args.json;
    if let Err(e) = run(args) {
        if json {
            println!("{}", render_error(&e, true));
        } else {
            eprintln!("{}", render_error(&e, false));
        }
        process::exit(1);
    }
}

/// Error text for the chosen output mode; JSON mode emits an `ErrorResponse`
fn render_error(err: &PresetError, json: bool) -> String {
    if json {
        if let Ok(rendered) = serde_json::to_string_pretty(&err.to_error_response()) {
            return rendered;
        }
    }
    format!("Error: {err}")
}

fn load_config(args: &Args) -> Result<DatabaseConfig> {
    let config = match &args.config {
        Some(path) => DatabaseConfig::from_json_file(path)?,
        None => DatabaseConfig::default(),
    };
    Ok(match &args.language {
        Some(language) => config.with_language(language.clone()),
        None => config,
    })
}

fn open(args: &Args) -> Result<PresetsDatabase> {
    let mut db = PresetsDatabase::open_dir(&args.dir, load_config(args)?)?;

    if let Some(path) = &args.boundaries {
        let bytes = std::fs::read(path)?;
        let document = parse_document(&path.display().to_string(), &bytes)?;
        db = db.with_boundaries(Arc::new(BoundaryTable::from_feature_collection(&document)?));
    }

    if !args.base_only {
        let outcome = db.augment_now();
        if args.verbose {
            eprintln!(
                "Supplementary: {}, regions: {}",
                if outcome.supplementary.is_ok() { "loaded" } else { "unavailable" },
                if outcome.regions.is_ok() { "loaded" } else { "unavailable" },
            );
        }
    }
    Ok(db)
}

fn run(args: Args) -> Result<()> {
    let db = open(&args)?;
    let include_supplementary = !args.base_only;

    match &args.command {
        Command::Match {
            geometry,
            tags,
            fallback,
        } => {
            let tags: Tags = tags.iter().cloned().collect();
            let found = if *fallback {
                db.match_or_fallback(&tags, *geometry, include_supplementary)
                    .map(|feature| (feature, None))
            } else {
                db.match_with_score(&tags, *geometry, include_supplementary)
                    .map(|found| (found.feature, Some(found.score.total())))
            };

            match found {
                Some((feature, score)) => {
                    let output = FeatureOutput {
                        score,
                        ..FeatureOutput::new(&feature)
                    };
                    print_feature(&output, args.json)?;
                }
                None if args.json => println!("null"),
                None => println!("No matching preset"),
            }
        }
        Command::Search {
            query,
            geometry,
            lat,
            lon,
            limit,
        } => {
            let hits = db.search(query.as_deref(), *geometry, LatLon::new(*lat, *lon));
            let outputs: Vec<FeatureOutput<'_>> = hits
                .iter()
                .take(*limit)
                .map(|hit| FeatureOutput {
                    score: Some(f64::from(hit.score)),
                    ..FeatureOutput::new(&hit.feature)
                })
                .collect();

            if args.json {
                println!("{}", serde_json::to_string_pretty(&outputs)?);
            } else {
                for output in &outputs {
                    println!(
                        "{:>4}  {}  ({})",
                        output.score.unwrap_or_default(),
                        output.id,
                        output.name.unwrap_or("-")
                    );
                }
                println!();
                println!("Total: {} of {} results", outputs.len(), hits.len());
            }
        }
        Command::Show { id } => {
            let feature = db.require_feature(id)?;
            let output = FeatureOutput {
                fields: db.inherited_fields(id),
                ..FeatureOutput::new(&feature)
            };
            print_feature(&output, args.json)?;
        }
    }

    Ok(())
}

fn print_feature(output: &FeatureOutput<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    println!("{} ({})", output.id, output.name.unwrap_or("-"));
    let geometry: Vec<&str> = output.geometry.iter().map(GeometryKind::as_str).collect();
    println!("  geometry: {}", geometry.join(", "));
    for (key, value) in output.tags {
        println!("  {key}={value}");
    }
    if let Some(score) = output.score {
        println!("  score: {score:.2}");
    }
    if let Some(fields) = &output.fields {
        println!("  fields: {}", fields.join(", "));
    }
    if output.supplementary {
        println!("  (supplementary)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use presetdb_core::ErrorResponse;

    #[test]
    fn test_render_error_json() {
        let err = PresetError::MissingAsset {
            name: "presets.json".to_string(),
            reason: "no such file".to_string(),
        };
        let parsed: ErrorResponse = serde_json::from_str(&render_error(&err, true)).unwrap();
        assert_eq!(parsed.error.code, "MISSING_ASSET");
        assert!(!parsed.error.recoverable);
        assert!(parsed.error.message.contains("presets.json"));

        assert_eq!(
            render_error(&err, false),
            "Error: Asset not found: 'presets.json': no such file"
        );
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("amenity=cafe").unwrap(), ("amenity".to_string(), "cafe".to_string()));
        assert!(parse_tag("amenity").is_err());
        assert!(parse_tag("=cafe").is_err());
    }
}
