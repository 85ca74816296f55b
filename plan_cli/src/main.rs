//! # Floor Plan CLI
//!
//! Generates a design from command-line choices, prints a summary, and
//! writes one blueprint per floor.
//!
//! ```text
//! plan_cli --land 1200 --facing east --bhk 3BHK --floors 2 --out-dir plans
//! plan_cli --land 2000 --facing sw --bhk 4 --staircase L --format both --json
//! ```
//!
//! Logging goes to stderr and honors `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use plan_core::document::DesignDocument;
use plan_core::file_io::{save_design, FileLock};
use plan_core::program::RoomOptions;
use plan_core::units::{Feet, Inches, SqFt};
use plan_core::{
    generate, render_design, BedroomConfig, BudgetRange, BuildingType, Design, DesignInput, Direction, OutputFormat,
    PlanError, PlanResult, RenderConfig, RuleTables, StaircaseType,
};

/// Rule-driven floor plan generator
#[derive(Parser, Debug)]
#[command(name = "plan_cli", version)]
#[command(about = "Generate floor plans and blueprints from plot and program choices")]
struct Args {
    /// Land area in square feet
    #[arg(long, allow_hyphen_values = true)]
    land: f64,

    /// Road-facing direction (N, NE, East, south-west, ...)
    #[arg(long, value_parser = parse_direction)]
    facing: Direction,

    /// Building type (house, row, duplex, villa, apartment)
    #[arg(long = "type", default_value = "house", value_parser = parse_building)]
    building_type: BuildingType,

    /// Bedroom configuration, e.g. 3BHK or 3
    #[arg(long, default_value = "3BHK", value_parser = parse_bhk)]
    bhk: BedroomConfig,

    /// Number of floors
    #[arg(long, default_value_t = 1)]
    floors: u32,

    /// Staircase type for multi-floor designs (straight, L, U, spiral, winder)
    #[arg(long, value_parser = parse_staircase)]
    staircase: Option<StaircaseType>,

    /// Budget range (economy, standard, premium, luxury)
    #[arg(long, default_value = "standard", value_parser = parse_budget)]
    budget: BudgetRange,

    /// Leave out the dining room
    #[arg(long)]
    no_dining: bool,

    /// Leave out the pooja room
    #[arg(long)]
    no_pooja: bool,

    /// Leave out the utility room
    #[arg(long)]
    no_utility: bool,

    /// Directory for the floor drawings
    #[arg(long, default_value = "plans")]
    out_dir: PathBuf,

    /// Drawing format
    #[arg(long, value_enum, default_value_t = FormatChoice::Svg)]
    format: FormatChoice,

    /// Drawing scale denominator (50 means 1:50)
    #[arg(long, default_value_t = 50.0)]
    scale: f64,

    /// Output resolution
    #[arg(long, default_value_t = 150.0)]
    dpi: f64,

    /// Omit the 1 ft / 5 ft background grid
    #[arg(long)]
    no_grid: bool,

    /// Omit room dimension lines
    #[arg(long)]
    no_dimensions: bool,

    /// Rule tables TOML (defaults to the built-in tables)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Save the design document to this path
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print the full design as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatChoice {
    Svg,
    Png,
    Both,
}

impl FormatChoice {
    fn formats(self) -> Vec<OutputFormat> {
        match self {
            FormatChoice::Svg => vec![OutputFormat::Svg],
            FormatChoice::Png => vec![OutputFormat::Png],
            FormatChoice::Both => OutputFormat::ALL.to_vec(),
        }
    }
}

fn parse_direction(s: &str) -> Result<Direction, String> {
    Direction::from_str_flexible(s).map_err(|e| e.to_string())
}

fn parse_building(s: &str) -> Result<BuildingType, String> {
    BuildingType::from_str_flexible(s).map_err(|e| e.to_string())
}

fn parse_bhk(s: &str) -> Result<BedroomConfig, String> {
    let s = s.trim();
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        return BedroomConfig::parse(&format!("{}BHK", s)).map_err(|e| e.to_string());
    }
    BedroomConfig::parse(s).map_err(|e| e.to_string())
}

fn parse_staircase(s: &str) -> Result<StaircaseType, String> {
    StaircaseType::from_str_flexible(s).map_err(|e| e.to_string())
}

fn parse_budget(s: &str) -> Result<BudgetRange, String> {
    BudgetRange::from_str_flexible(s).map_err(|e| e.to_string())
}

impl Args {
    fn design_input(&self) -> DesignInput {
        let mut input = DesignInput::new(self.land, self.facing, self.building_type, self.bhk, self.floors)
            .with_budget(self.budget);
        if let Some(staircase) = self.staircase {
            input = input.with_staircase(staircase);
        }
        input.options = RoomOptions {
            dining: !self.no_dining,
            pooja: !self.no_pooja,
            utility: !self.no_utility,
        };
        input
    }

    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            scale: self.scale,
            dpi: self.dpi,
            show_dimensions: !self.no_dimensions,
            show_grid: !self.no_grid,
            ..RenderConfig::default()
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> PlanResult<()> {
    let rules = match &args.rules {
        Some(path) => RuleTables::load(path)?,
        None => RuleTables::builtin()?,
    };
    let config = args.render_config();
    config.validate()?;

    let design = generate(&args.design_input(), &rules)?;
    let paths = render_design(&design, &config, &args.out_dir, &args.format.formats())?;

    if let Some(path) = &args.save {
        let title = format!(
            "{} {} on {:.0} sq ft",
            design.input.bedroom_config, design.input.building_type, design.input.land_size
        );
        let _lock = FileLock::acquire(path, whoami())?;
        save_design(&DesignDocument::new(title, design.clone()), path)?;
    }

    if args.json {
        let json = serde_json::to_string_pretty(&design).map_err(|e| PlanError::serialization(e.to_string()))?;
        println!("{}", json);
    } else {
        print_summary(&design, &config);
        println!("Drawings:");
        for path in &paths {
            println!("  {}", path.display());
        }
        if let Some(path) = &args.save {
            println!("Saved:    {}", path.display());
        }
    }
    Ok(())
}

fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "plan_cli".to_string())
}

fn print_summary(design: &Design, config: &RenderConfig) {
    let input = &design.input;
    let regulation = &design.regulation;

    println!("═══════════════════════════════════════");
    println!("  FLOOR PLAN DESIGN");
    println!("═══════════════════════════════════════");
    println!();
    println!("Input:");
    println!("  Land:      {} ({})", SqFt(input.land_size), regulation.bracket);
    println!("  Facing:    {}", input.facing);
    println!("  Building:  {}", input.building_type);
    println!("  Program:   {} on {} floor(s)", input.bedroom_config, input.floors);
    println!("  Budget:    {}", input.budget_range.display_name());
    println!();
    println!("Regulation:");
    println!(
        "  Setbacks:  front {:.1}', rear {:.1}', sides {:.1}'",
        regulation.setbacks.front_ft, regulation.setbacks.rear_ft, regulation.setbacks.side_ft
    );
    println!("  Coverage:  {:.0}%   FAR {:.2}", regulation.coverage * 100.0, regulation.max_far);
    println!(
        "  Envelope:  {} x {} ({} per floor)",
        Feet(regulation.envelope.width_ft),
        Feet(regulation.envelope.depth_ft),
        SqFt(regulation.per_floor_area)
    );
    if let Some(stair) = design.floors.first().and_then(|f| f.staircase()) {
        println!(
            "  Staircase: {} risers of {}, {} treads",
            stair.risers,
            Inches::from(Feet(stair.riser_height_ft)),
            Inches::from(Feet(stair.tread_run_ft))
        );
    }
    println!();
    for floor in &design.floors {
        println!("{} ({:?}):", floor.label(), floor.role());
        for room in floor.rooms() {
            println!(
                "  {:<16} {:>5.1}' x {:>5.1}'  {:>6.1} sq ft",
                room.label,
                room.footprint.width,
                room.footprint.depth,
                room.area()
            );
        }
        println!();
    }
    println!("Totals:");
    println!("  Built:      {:.1} sq ft", design.summary.total_built_area);
    println!("  Carpet:     {:.1} sq ft", design.summary.carpet_area);
    println!("  Efficiency: {:.1}%", design.summary.efficiency_ratio * 100.0);
    println!(
        "  Cost:       {} {:.0} ({:.0}/sq ft)",
        design.cost.currency, design.cost.total, design.cost.rate_per_sqft
    );
    println!("  Timeline:   {}", design.timeline.label);
    println!(
        "  Score:      {:.0}/100 (grade {})",
        design.analysis.utilization_score, design.analysis.grade
    );
    println!("  Scale:      1:{:.0} at {:.0} DPI", config.scale, config.dpi);

    if !design.warnings.is_empty() || !design.analysis.recommendations.is_empty() {
        println!();
        println!("Notes:");
        for warning in &design.warnings {
            println!("  [WARN] {}", warning);
        }
        for tip in &design.analysis.recommendations {
            println!("  [TIP]  {}", tip);
        }
    }

    println!();
    println!("═══════════════════════════════════════");
    println!(
        "  RESULT: {} floor(s), {} rooms",
        design.floors.len(),
        design.summary.room_count
    );
    println!("═══════════════════════════════════════");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["plan_cli", "--land", "1200", "--facing", "east"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = args(&[]);
        let input = args.design_input();
        assert_eq!(input.facing, Direction::East);
        assert_eq!(input.building_type, BuildingType::IndependentHouse);
        assert_eq!(input.bedroom_config, BedroomConfig::new(3));
        assert_eq!(input.floors, 1);
        assert!(input.staircase_type.is_none());
        assert_eq!(args.render_config(), RenderConfig::default());
        assert_eq!(args.format.formats(), vec![OutputFormat::Svg]);
    }

    #[test]
    fn test_full_flags() {
        let args = args(&[
            "--type", "villa", "--bhk", "4", "--floors", "2", "--staircase", "L", "--budget", "premium",
            "--no-pooja", "--format", "both", "--no-grid",
        ]);
        let input = args.design_input();
        assert_eq!(input.building_type, BuildingType::Villa);
        assert_eq!(input.bedroom_config, BedroomConfig::new(4));
        assert_eq!(input.staircase_type, Some(StaircaseType::LShaped));
        assert_eq!(input.budget_range, BudgetRange::Premium);
        assert!(!input.options.pooja && input.options.dining);
        assert!(!args.render_config().show_grid);
        assert_eq!(args.format.formats().len(), 2);
    }

    #[test]
    fn test_negative_land_reaches_core() {
        let args = Args::try_parse_from(["plan_cli", "--land", "-5", "--facing", "n"]).unwrap();
        assert_eq!(args.land, -5.0);
    }

    #[test]
    fn test_bad_direction_rejected() {
        assert!(Args::try_parse_from(["plan_cli", "--land", "1200", "--facing", "up"]).is_err());
    }
}
