use clap::{Parser, Subcommand};
use oz_app::{
    AppError, AppResult, SampleOutcome, compute_samples, load_protocol, plan_dispense,
    preview_dispense, protocol_service, run_calibration, setup_deck,
};
use oz_chem::{ChemError, search_catalog};
use oz_core::units::{in_g, in_ul};
use oz_labware::{Action, LabwareError, SimulatedHandler};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "oz")]
#[command(about = "Ouzo lab CLI - sample composition and plate dispensing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate protocol file syntax and structure
    Validate {
        /// Path to the protocol YAML file
        protocol_path: PathBuf,
    },
    /// Compute the masses (and volumes) of every sample in a protocol
    Samples {
        /// Path to the protocol YAML file
        protocol_path: PathBuf,
    },
    /// Print the dispensing plan without running it
    Plan {
        /// Path to the protocol YAML file
        protocol_path: PathBuf,
        /// Print only the first N actions
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Run the dispensing plan on the simulated robot
    Run {
        /// Path to the protocol YAML file
        protocol_path: PathBuf,
        /// Print the volume delivered to every well
        #[arg(long)]
        wells: bool,
    },
    /// Run the pipette speed calibration on the simulated robot
    Calibrate {
        /// Path to the protocol YAML file
        protocol_path: PathBuf,
    },
    /// Search the built-in component catalog
    Catalog {
        /// Name, id or alias fragment; lists everything when omitted
        query: Option<String>,
    },
}

fn main() -> AppResult<()> {
    // RUST_LOG filters output through the env-filter feature
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { protocol_path } => cmd_validate(&protocol_path),
        Commands::Samples { protocol_path } => cmd_samples(&protocol_path),
        Commands::Plan {
            protocol_path,
            limit,
        } => cmd_plan(&protocol_path, limit),
        Commands::Run {
            protocol_path,
            wells,
        } => cmd_run(&protocol_path, wells),
        Commands::Calibrate { protocol_path } => cmd_calibrate(&protocol_path),
        Commands::Catalog { query } => cmd_catalog(query.as_deref()),
    };
    result.inspect_err(print_hint)
}

fn cmd_validate(protocol_path: &Path) -> AppResult<()> {
    println!("Validating protocol: {}", protocol_path.display());
    let protocol = load_protocol(protocol_path)?;
    protocol_service::validate_protocol(&protocol)?;
    let summary = protocol_service::summarize(&protocol);

    println!("✓ Protocol is valid: {} (v{})", summary.name, summary.version);
    println!(
        "  {} components, {} stocks, {} samples",
        summary.component_count, summary.stock_count, summary.sample_count
    );
    println!(
        "  {} labware, {} pipettes",
        summary.labware_count, summary.pipette_count
    );
    if let Some(wells) = summary.dispense_wells {
        println!("  Dispense: {wells} wells");
    }
    if let Some(rates) = summary.calibration_rates {
        println!("  Calibration: {rates} flow rates");
    }
    Ok(())
}

fn cmd_samples(protocol_path: &Path) -> AppResult<()> {
    let protocol = load_protocol(protocol_path)?;
    let outcomes = compute_samples(&protocol)?;

    if outcomes.is_empty() {
        println!("No samples found in protocol");
        return Ok(());
    }

    let mut failed = 0;
    for outcome in &outcomes {
        match outcome {
            SampleOutcome::Computed(report) => {
                println!(
                    "{} ({:.4} g)",
                    report.id,
                    in_g(report.sample.total_mass())
                );
                for role in report.sample.roles() {
                    println!(
                        "  {:<16} {:<20} wtf {:.4}  target {:.4} g",
                        role.role.key(),
                        role.component.name(),
                        role.weight_fraction,
                        in_g(role.target_mass)
                    );
                }
                match &report.volumes {
                    Some(volumes) => {
                        for (line, volume) in volumes {
                            println!(
                                "  dispense {:<28} {:>10.4} g {:>10.1} uL",
                                line.source.to_string(),
                                in_g(line.mass),
                                in_ul(*volume)
                            );
                        }
                    }
                    None => {
                        for line in report.sample.dispense_lines() {
                            println!(
                                "  dispense {:<28} {:>10.4} g",
                                line.source.to_string(),
                                in_g(line.mass)
                            );
                        }
                    }
                }
            }
            SampleOutcome::Failed { id, error } => {
                failed += 1;
                println!("✗ {id}: {error}");
                print_hint(error);
            }
        }
    }

    println!(
        "✓ {} of {} samples computed",
        outcomes.len() - failed,
        outcomes.len()
    );
    Ok(())
}

fn cmd_plan(protocol_path: &Path, limit: Option<usize>) -> AppResult<()> {
    let protocol = load_protocol(protocol_path)?;
    let deck = setup_deck(&protocol, &mut SimulatedHandler::new())?;
    let plan = plan_dispense(&protocol, &deck)?;

    println!(
        "Plan: {} wells (trials {}..{}), {} transfers, {:.1} uL total",
        plan.wells_used,
        plan.start_index,
        plan.next_index,
        plan.transfer_count(),
        plan.total_volume_ul()
    );
    let shown = limit.unwrap_or(plan.actions.len());
    for (i, action) in plan.actions.iter().take(shown).enumerate() {
        println!("  {:>5}  {action}", i + 1);
    }
    if shown < plan.actions.len() {
        println!("  ... {} more actions", plan.actions.len() - shown);
    }
    println!("  Next free trial index: {}", plan.next_index);
    Ok(())
}

fn cmd_run(protocol_path: &Path, show_wells: bool) -> AppResult<()> {
    let protocol = load_protocol(protocol_path)?;
    println!("Running dispense on simulated robot: {}", protocol.name);

    let (outcome, handler) = preview_dispense(&protocol)?;
    println!(
        "✓ Run completed: {} actions, {} transfers, {:.1} uL dispensed",
        outcome.report.actions_completed,
        outcome.report.transfers,
        outcome.report.volume_dispensed_ul
    );
    let tips: usize = outcome
        .plan
        .actions
        .iter()
        .filter(|a| matches!(a, Action::PickUpTip { .. }))
        .count();
    println!("  Tips used: {tips}");
    println!("  Next free trial index: {}", outcome.plan.next_index);

    if show_wells {
        for (well, volume) in handler.deliveries() {
            println!("  {well}: {volume:.2} uL");
        }
    }
    Ok(())
}

fn cmd_calibrate(protocol_path: &Path) -> AppResult<()> {
    let protocol = load_protocol(protocol_path)?;
    println!("Running speed calibration on simulated robot: {}", protocol.name);

    let mut handler = SimulatedHandler::new();
    let report = run_calibration(&protocol, &mut handler)?;
    println!(
        "✓ Calibration completed: {} actions, {:.1} uL dispensed",
        report.actions_completed, report.volume_dispensed_ul
    );
    for (well, volume) in handler.deliveries() {
        println!("  {well}: {volume:.1} uL");
    }
    Ok(())
}

fn cmd_catalog(query: Option<&str>) -> AppResult<()> {
    let entries = search_catalog(query.unwrap_or(""));
    if entries.is_empty() {
        println!("No catalog entries match");
        return Ok(());
    }
    for entry in entries {
        let mw = entry
            .molecular_weight
            .map(|mw| format!("{mw:.3} g/mol"))
            .unwrap_or_else(|| "-".to_string());
        let aliases = if entry.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aka {})", entry.aliases.join(", "))
        };
        println!("  {:<20} {:<20} {mw}{aliases}", entry.id, entry.display_name);
    }
    Ok(())
}

/// Plain-language follow-up for the errors a bench user can act on.
fn print_hint(err: &AppError) {
    let chem = match err {
        AppError::Sample { source, .. } | AppError::Chem(source) => Some(source),
        _ => None,
    };
    if let Some(ChemError::InfeasibleComposition {
        role,
        budget_g,
        contributed_g,
    }) = chem
    {
        eprintln!(
            "  hint: stocks carry {contributed_g:.4} g of {role} but the sample only allows \
             {budget_g:.4} g; use more concentrated stocks or raise the {role} fraction"
        );
    }

    let mut labware = match err {
        AppError::Labware(e) => Some(e),
        _ => None,
    };
    while let Some(LabwareError::Aborted { source, .. }) = labware {
        labware = Some(source.as_ref());
    }
    match labware {
        Some(LabwareError::InsufficientWells { needed, available }) => eprintln!(
            "  hint: {needed} empty wells are needed but only {available} remain; \
             add well plates or start a new run from a lower trial index"
        ),
        Some(LabwareError::Capacity { plates, .. }) => eprintln!(
            "  hint: ran past the last of {plates} well plates; add plates to the deck"
        ),
        _ => {}
    }
}
