mod driver;
mod render;

use clap::{Parser, Subcommand, ValueEnum};
use driver::{Driver, DriverOptions, Outcome};
use hiit_core::cue::{LogCues, SilentCues};
use hiit_core::*;
use render::{Renderer, TerminalBell};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hiit")]
#[command(about = "Interval workout timer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Length of one timer tick in milliseconds
    #[arg(long, global = true)]
    tick_ms: Option<u64>,

    /// Complete manual sets automatically instead of waiting for Enter
    #[arg(long, global = true)]
    auto_advance: bool,

    /// Only print the final summary
    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a program file
    Run {
        /// Program definition (TOML, or JSON with a .json extension)
        program: PathBuf,
    },

    /// Play a single exercise built from the configured defaults
    Exercise {
        /// Exercise name shown during playback
        #[arg(long, default_value = "Quick exercise")]
        name: String,

        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Prepare time in seconds
        #[arg(long)]
        prepare: Option<u32>,

        /// Work time in seconds (timed mode)
        #[arg(long)]
        work: Option<u32>,

        /// Rest between rounds in seconds
        #[arg(long)]
        rest: Option<u32>,

        #[arg(long)]
        rounds: Option<u32>,

        #[arg(long)]
        cycles: Option<u32>,

        /// Rest between cycles in seconds
        #[arg(long)]
        cycle_rest: Option<u32>,

        /// Target repetitions (manual mode)
        #[arg(long)]
        reps: Option<u32>,

        /// Load in kg (manual mode)
        #[arg(long)]
        load: Option<f64>,

        /// Play only one cycle
        #[arg(long)]
        single_cycle: bool,
    },

    /// Show a program outline and its estimated duration
    Plan {
        program: PathBuf,

        /// Print the outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Timed,
    Manual,
}

fn main() -> ExitCode {
    hiit_core::logging::init_with_level("warn");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_config_path);
    let config = load_config(&config_path)?;

    let options = DriverOptions {
        tick: Duration::from_millis(cli.tick_ms.unwrap_or(config.playback.tick_millis).max(1)),
        auto_advance: cli.auto_advance || config.playback.auto_advance_manual,
    };

    match cli.command {
        Commands::Run { program } => {
            let program = Program::load_from(&program)?;
            play(program, &config, options, cli.quiet)
        }
        Commands::Exercise {
            name,
            mode,
            prepare,
            work,
            rest,
            rounds,
            cycles,
            cycle_rest,
            reps,
            load,
            single_cycle,
        } => {
            let mut exercise = Exercise::from_defaults(name, &config.exercise);
            let spec = &mut exercise.spec;
            if let Some(mode) = mode {
                spec.mode = match mode {
                    ModeArg::Timed => ExerciseMode::Timed,
                    ModeArg::Manual => ExerciseMode::Manual,
                };
            }
            spec.prepare_time = prepare.unwrap_or(spec.prepare_time);
            spec.work_time = work.or(spec.work_time);
            spec.rest_time = rest.unwrap_or(spec.rest_time);
            spec.rounds = rounds.unwrap_or(spec.rounds);
            spec.cycles = cycles.unwrap_or(spec.cycles);
            spec.rest_between_cycles = cycle_rest.unwrap_or(spec.rest_between_cycles);
            spec.repetitions = reps.or(spec.repetitions);
            spec.load = load.or(spec.load);
            if single_cycle {
                *spec = spec.single_cycle();
            }

            let name = exercise.name.clone();
            let program = Program::new(name, vec![ProgramItem::standalone(exercise, 1)]);
            play(program, &config, options, cli.quiet)
        }
        Commands::Plan { program, json } => cmd_plan(&program, json),
        Commands::Config { init } => cmd_config(&config_path, &config, init),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load_from(path)
    } else {
        tracing::info!("No config file found at {:?}, using defaults", path);
        Ok(Config::default())
    }
}

fn play(program: Program, config: &Config, options: DriverOptions, quiet: bool) -> Result<()> {
    let cues: Arc<dyn CuePlayer> = if !config.cues.enabled {
        Arc::new(SilentCues)
    } else if config.cues.terminal_bell && !quiet {
        Arc::new(TerminalBell)
    } else {
        Arc::new(LogCues)
    };

    let renderer = Renderer::new(quiet);
    let mut driver = Driver::new(Runtime::system(cues), renderer, options);

    finish(driver.run(program)?)
}

fn finish(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Completed => Ok(()),
        Outcome::Quit => {
            println!("\nStopped.");
            Ok(())
        }
        Outcome::Halted(reason) => Err(Error::Halted(reason)),
    }
}

fn cmd_plan(path: &Path, json: bool) -> Result<()> {
    let program = Program::load_from(path)?;
    program.validate()?;
    let estimate = program.estimated_ticks();

    if json {
        let items: Vec<_> = program
            .items
            .iter()
            .map(|item| {
                let exercises: Vec<_> = item
                    .exercises()
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "name": e.name,
                            "summary": e.spec.summary(),
                            "estimated_seconds": e.spec.estimated_ticks(),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "kind": if item.is_group() { "group" } else { "standalone" },
                    "rounds": item.rounds(),
                    "exercises": exercises,
                })
            })
            .collect();

        let outline = serde_json::json!({
            "name": program.name,
            "items": items,
            "exercise_count": program.exercise_count(),
            "rest_between_items": program.rest_between_items,
            "estimated_seconds": estimate,
        });
        println!("{}", serde_json::to_string_pretty(&outline)?);
        return Ok(());
    }

    render::print_plan(&program, estimate);
    Ok(())
}

fn cmd_config(path: &Path, config: &Config, init: bool) -> Result<()> {
    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            Config::default().save_to(path)?;
            println!("✓ Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}
