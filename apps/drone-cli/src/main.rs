use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use command_parser::{create_parser, CommandContext, ParsedIntent};
use confidence_guard::{create_default_evaluator, CommandSuggestion, ConfidenceEvaluation};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

mod actuator;
mod config;
mod pipeline;

use actuator::SimulatedDrone;
use config::Config;
use pipeline::{Outcome, Pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "dronectl",
    version,
    about = "Japanese drone command interpreter with confidence gating",
    disable_help_subcommand = true
)]
struct Cli {
    /// JSON config file (created with defaults if missing)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the general confidence threshold
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Drone addressed when the command names none
    #[arg(long, global = true)]
    drone: Option<String>,

    /// Print machine-readable JSON on stdout
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    json: bool,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a command into an intent
    Parse { text: String },
    /// Parse and evaluate a command, reporting whether it may execute
    Evaluate { text: String },
    /// Suggest corrections for a command
    Suggest { text: String },
    /// Parse, evaluate and execute on the simulator when the gate passes
    Run { text: String },
    /// Read commands from stdin, one per line, against one simulator
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.guard.confidence_threshold = threshold;
    }

    let mut context = CommandContext::new();
    if let Some(drone_id) = cli.drone.clone().or(config.default_drone_id.clone()) {
        context.insert("drone_id".to_string(), serde_json::Value::from(drone_id));
    }

    let parser = create_parser().context("building command parser")?;
    let evaluator = create_default_evaluator(&config.guard).context("building evaluator")?;
    let pipeline = Pipeline::new(parser, evaluator)?;

    match cli.command {
        Commands::Parse { text } => {
            match pipeline.parser().parse_command(&text, Some(&context)).await {
                Ok(intent) => print_intent(&intent, cli.json)?,
                Err(e) => {
                    error!("{}", e);
                    print_suggestions(&pipeline.suggest(&text), cli.json)?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Evaluate { text } => {
            let outcome = pipeline.process(&text, Some(&context)).await?;
            print_outcome(&outcome, cli.json)?;
            if !outcome.is_approved() {
                std::process::exit(1);
            }
        }
        Commands::Suggest { text } => {
            print_suggestions(&pipeline.suggest(&text), cli.json)?;
        }
        Commands::Run { text } => {
            let pipeline = pipeline.with_actuator(Arc::new(SimulatedDrone::new()));
            let outcome = pipeline.process(&text, Some(&context)).await?;
            print_outcome(&outcome, cli.json)?;
            if !outcome.is_approved() {
                std::process::exit(1);
            }
        }
        Commands::Repl => {
            let drone = Arc::new(SimulatedDrone::new());
            let pipeline = pipeline.with_actuator(drone.clone());
            repl(&pipeline, &drone, &context, cli.json).await?;
        }
    }

    Ok(())
}

async fn repl(
    pipeline: &Pipeline,
    drone: &SimulatedDrone,
    context: &CommandContext,
    json: bool,
) -> Result<()> {
    info!(
        threshold = pipeline.evaluator().confidence_threshold(),
        "interactive mode; 'quit' to exit, ':threshold <n>' to tune, ':state' for the simulator"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let command = line.trim();

        if command.eq_ignore_ascii_case("quit") || command.eq_ignore_ascii_case("exit") {
            break;
        }
        if let Some(value) = command.strip_prefix(":threshold") {
            match value.trim().parse::<f32>() {
                Ok(value) => {
                    let applied = pipeline.evaluator().set_confidence_threshold(value);
                    println!("threshold = {:.2}", applied);
                }
                Err(_) => println!(
                    "threshold = {:.2}",
                    pipeline.evaluator().confidence_threshold()
                ),
            }
            continue;
        }
        if command == ":state" {
            print_json(&drone.state().await)?;
            continue;
        }
        if command.is_empty() {
            continue;
        }

        let outcome = pipeline.process(command, Some(context)).await?;
        print_outcome(&outcome, json)?;
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_intent(intent: &ParsedIntent, json: bool) -> Result<()> {
    if json {
        return print_json(intent);
    }
    println!("intent     {} ({})", intent.id(), intent.parsed_at().format(&Rfc3339)?);
    println!("action     {} (confidence {:.2})", intent.action, intent.confidence);
    let mut names: Vec<_> = intent.parameters.keys().collect();
    names.sort();
    for name in names {
        println!("  {:<10} {}", name, intent.parameters[name]);
    }
    Ok(())
}

fn print_evaluation(evaluation: &ConfidenceEvaluation) {
    println!(
        "confidence overall {:.2} / action {:.2} / parameters {:.2} / completeness {:.2}",
        evaluation.overall_confidence,
        evaluation.action_confidence,
        evaluation.parameter_confidence,
        evaluation.completeness_score
    );
    for risk in &evaluation.risk_factors {
        println!("  risk     {}", risk);
    }
    for suggestion in &evaluation.suggestions {
        println!("  hint     {} ({})", suggestion.suggestion, suggestion.reason);
    }
}

fn print_suggestions(suggestions: &[CommandSuggestion], json: bool) -> Result<()> {
    if json {
        return print_json(&suggestions);
    }
    if suggestions.is_empty() {
        println!("no corrections needed");
    }
    for suggestion in suggestions {
        println!(
            "[{:.2}] {} ({})",
            suggestion.confidence, suggestion.suggestion, suggestion.reason
        );
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        return print_json(outcome);
    }
    match outcome {
        Outcome::Unparseable { error, suggestions } => {
            println!("unparseable: {}", error);
            print_suggestions(suggestions, false)?;
        }
        Outcome::Refused {
            intent,
            evaluation,
            refusals,
        } => {
            print_intent(intent, false)?;
            print_evaluation(evaluation);
            let reasons: Vec<String> = refusals.iter().map(|r| r.to_string()).collect();
            println!("refused: {}", reasons.join(", "));
        }
        Outcome::Approved {
            intent,
            evaluation,
            report,
        } => {
            print_intent(intent, false)?;
            print_evaluation(evaluation);
            match report {
                Some(report) if report.success => println!("executed: {}", report.message),
                Some(report) => println!("failed: {}", report.message),
                None => println!("executable"),
            }
        }
    }
    Ok(())
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
