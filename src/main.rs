use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use env_logger::Env;
use log::{debug, error, warn};

use plotcore::{evaluate, PartialInput, Plot, RawInput, Response, Settings};

/// Classify an expression and sample it for plotting
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Expression to evaluate, e.g. `x^2`, `r=1+cos(theta)`, `x+y>0`
    expression: Option<String>,

    /// Interpretation hint; only `parametric` changes the outcome
    #[clap(long)]
    mode: Option<String>,

    /// Lower end of the sampling domain
    #[clap(long, env = "PLOTCORE_XMIN", allow_negative_numbers = true)]
    xmin: Option<f64>,

    /// Upper end of the sampling domain
    #[clap(long, env = "PLOTCORE_XMAX", allow_negative_numbers = true)]
    xmax: Option<f64>,

    /// Number of samples (grids use floor(sqrt(points)) per axis)
    #[clap(long, env = "PLOTCORE_POINTS")]
    points: Option<usize>,

    /// Largest accepted `points`
    #[clap(long, env = "PLOTCORE_MAX_POINTS")]
    max_points: Option<usize>,

    /// JSON request document (`-` reads stdin)
    #[clap(long, value_name = "FILE|-")]
    request: Option<PathBuf>,

    /// JSON file with default domain settings
    #[clap(long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON response
    #[clap(long)]
    pretty: bool,

    /// Print a coloured summary instead of JSON
    #[clap(long, conflicts_with = "pretty")]
    summary: bool,
}

fn read_request(path: &Path) -> Result<PartialInput> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading request from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading request {}", path.display()))?
    };
    PartialInput::from_json(&text).context("parsing request document")
}

fn build_input(args: &Args, settings: &Settings) -> Result<RawInput> {
    let flags = PartialInput {
        expression: args.expression.clone(),
        xmin: args.xmin,
        xmax: args.xmax,
        points: args.points,
        mode: args.mode.as_deref().and_then(|m| match m.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!("ignoring --mode: {e}");
                None
            }
        }),
    };
    let request = match &args.request {
        Some(path) => read_request(path)?,
        None => PartialInput::default(),
    };
    Ok(settings.resolve(flags.or(request)))
}

fn print_summary(input: &RawInput, response: &Response) {
    println!("{}{}", "Input:  ".cyan().bold(), input.expression.cyan());
    match response {
        Response::Error(e) => {
            println!("{}{}", "Error:  ".red().bold(), e.error.red());
        }
        Response::Plot(plot) => {
            println!("{}{}", "Mode:   ".green(), plot.mode().to_string().green());
            match plot {
                Plot::Curve { y, roots, .. } => {
                    let nulls = y.iter().filter(|v| v.is_none()).count();
                    let samples = format!("{} ({} not real)", y.len(), nulls);
                    println!(
                        "{}{}",
                        "Samples: ".green(),
                        if nulls == 0 { samples.green() } else { samples.yellow() }
                    );
                    if let Some(roots) = roots {
                        let listed: Vec<String> = roots
                            .iter()
                            .map(|r| r.map_or_else(|| "complex".to_string(), |v| format!("{v}")))
                            .collect();
                        println!("{}{}", "Roots:  ".green(), format!("[{}]", listed.join(", ")).cyan());
                    }
                }
                Plot::Grid { x, op, .. } => {
                    let side = x.len();
                    println!("{}{}", "Grid:   ".green(), format!("{side}x{side}").green());
                    if let Some(op) = op {
                        println!("{}{}", "Op:     ".dimmed(), op.dimmed());
                    }
                }
            }
        }
    }
    println!("{}", "-".repeat(40));
}

fn run(args: Args) -> Result<ExitCode> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(max) = args.max_points {
        settings.max_points = max;
    }

    let input = build_input(&args, &settings)?;
    settings.check(&input)?;
    debug!("request: {input:?}");

    let response = evaluate(&input);
    if args.summary {
        print_summary(&input, &response);
    } else {
        println!("{}", response.to_json(args.pretty)?);
    }

    Ok(if response.is_error() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
