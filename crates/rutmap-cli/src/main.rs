//! Command-line driver for the rutmap analysis core.
//!
//! Reads tile, rule, context and config JSON, runs the pipeline and writes
//! the extracted features as a GeoJSON-like FeatureCollection.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rutmap_core::synthetic::SyntheticTile;
use rutmap_core::{
    AnalysisConfig, AnalysisContext, BeddingSiteScorer, LatLon, RuleSet, Season, TileAnalyzer, TileInput,
};

#[derive(Parser, Debug)]
#[command(name = "rutmap", about = "Terrain-driven deer movement suitability")]
struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one tile and write corridors, zones and bedding sites.
    Analyze {
        /// Tile JSON: bounds, rows, cols, elevation, vegetation, auxiliary.
        #[arg(long)]
        tile: PathBuf,

        /// Rule set JSON; the built-in rules when omitted.
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Analysis context JSON (time, season, conditions, weather).
        #[arg(long)]
        context: Option<PathBuf>,

        /// Analysis config JSON; defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bedding sweep center as LAT,LON. No sweep without it.
        #[arg(long, allow_hyphen_values = true)]
        center: Option<LatLon>,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze a generated tile with the built-in rules.
    Demo {
        #[arg(long, default_value_t = 42)]
        seed: u32,

        /// Cells per side.
        #[arg(long, default_value_t = 64)]
        size: usize,

        /// early_season, rut, late_season or any.
        #[arg(long, default_value = "rut", value_parser = parse_season)]
        season: Season,

        /// Tile center as LAT,LON.
        #[arg(long, default_value = "44.5,-89.5", allow_hyphen_values = true)]
        origin: LatLon,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a single bedding site and print the assessment.
    ScoreSite {
        /// Downhill bearing, degrees.
        #[arg(long)]
        aspect: f64,

        /// Bearing the wind blows from, degrees.
        #[arg(long)]
        wind_dir: f64,

        /// mph.
        #[arg(long)]
        wind_speed: f64,

        /// °F.
        #[arg(long)]
        temperature: f64,

        /// Degrees.
        #[arg(long)]
        slope: f64,
    },
}

fn parse_season(s: &str) -> std::result::Result<Season, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown season '{s}'"))
}

fn read_json<T>(path: &Path, parse: impl FnOnce(&str) -> rutmap_core::Result<T>) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn analyze(
    tile: &Path,
    rules: Option<&Path>,
    context: Option<&Path>,
    config: Option<&Path>,
    center: Option<LatLon>,
    output: Option<&Path>,
) -> Result<()> {
    let input = read_json(tile, TileInput::from_json)?;
    let rules = match rules {
        Some(p) => read_json(p, RuleSet::from_json)?,
        None => RuleSet::builtin().context("loading built-in rules")?,
    };
    let ctx = match context {
        Some(p) => read_json(p, AnalysisContext::from_json)?,
        None => AnalysisContext::default(),
    };
    let config = match config {
        Some(p) => read_json(p, AnalysisConfig::from_json)?,
        None => AnalysisConfig::default(),
    };

    info!("analyzing {} ({}x{}, {} rules)", tile.display(), input.rows, input.cols, rules.len());
    let analysis = TileAnalyzer::new(config)
        .analyze(&input, &rules, &ctx, center)
        .context("analysis failed")?;
    let text = analysis.to_feature_collection().to_json_pretty()?;
    write_output(&text, output)
}

fn demo(seed: u32, size: usize, season: Season, origin: LatLon, output: Option<&Path>) -> Result<()> {
    let input = SyntheticTile::new(seed, size).generate(origin);
    let rules = RuleSet::builtin().context("loading built-in rules")?;
    let ctx = AnalysisContext { season, ..AnalysisContext::default() }.with_weather(35.0, 315.0, 12.0);

    info!("demo tile seed {seed}, {size}x{size} around {},{}", origin.lat, origin.lon);
    let analysis = TileAnalyzer::default()
        .analyze(&input, &rules, &ctx, Some(input.bounds.center()))
        .context("analysis failed")?;
    let text = analysis.to_feature_collection().to_json_pretty()?;
    write_output(&text, output)
}

fn score_site(aspect: f64, wind_dir: f64, wind_speed: f64, temperature: f64, slope: f64) -> Result<()> {
    let assessment = BeddingSiteScorer::new().score(aspect, wind_dir, wind_speed, temperature, slope);
    println!("{}", serde_json::to_string_pretty(&assessment)?);
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Analyze { tile, rules, context, config, center, output } => analyze(
            &tile,
            rules.as_deref(),
            context.as_deref(),
            config.as_deref(),
            center,
            output.as_deref(),
        ),
        Command::Demo { seed, size, season, origin, output } => demo(seed, size, season, origin, output.as_deref()),
        Command::ScoreSite { aspect, wind_dir, wind_speed, temperature, slope } => {
            score_site(aspect, wind_dir, wind_speed, temperature, slope)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_analyze_with_center() {
        let cli = Cli::try_parse_from(["rutmap", "-v", "analyze", "--tile", "t.json", "--center", "45.1,-90.2"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Analyze { center: Some(c), rules: None, .. } => {
                assert_eq!(c, LatLon::new(45.1, -90.2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn season_names_match_serde() {
        assert_eq!(parse_season("late_season").unwrap(), Season::LateSeason);
        assert!(parse_season("summer").is_err());
    }
}
