//! Terminal output for playback and plans.

use hiit_core::engine::EngineEvent;
use hiit_core::scheduler::RestSnapshot;
use hiit_core::*;
use std::io::{self, IsTerminal, Write};

/// Writes playback events and the live status line to stdout
pub struct Renderer {
    quiet: bool,
    /// Live status line, only redrawn on a terminal
    live: bool,
    status_width: usize,
}

impl Renderer {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            live: !quiet && io::stdout().is_terminal(),
            status_width: 0,
        }
    }

    pub fn show_help(&mut self, auto_advance: bool) {
        if self.quiet || !self.live {
            return;
        }
        let enter = if auto_advance {
            "skip phase"
        } else {
            "set done / skip phase"
        };
        self.line(&format!(
            "Keys: Enter = {}, p = pause/resume, s = skip rest, q = quit",
            enter
        ));
    }

    pub fn event(&mut self, event: &ProgramEvent, scheduler: &ProgramScheduler) {
        match event {
            ProgramEvent::ProgramCompleted {
                started_at,
                finished_at,
            } => {
                let seconds = (*finished_at - *started_at).num_seconds().max(0) as u64;
                self.line(&format!("✓ Program complete in {}", format_clock(seconds)));
                return;
            }
            ProgramEvent::Halted { reason } => {
                // Reported by the caller as an error
                self.clear_status();
                tracing::debug!("Rendering halt: {}", reason);
                return;
            }
            _ => {}
        }
        if self.quiet {
            return;
        }

        match event {
            ProgramEvent::ProgramStarted { items } => {
                let name = scheduler.program().map(|p| p.name.as_str()).unwrap_or("");
                self.line(&format!("▶ {} ({} item(s))", name, items));
            }
            ProgramEvent::ExerciseStarted {
                item_index,
                item_round,
                name,
                ..
            } => {
                let snap = scheduler.snapshot();
                let summary = scheduler
                    .current_exercise()
                    .map(|e| e.spec.summary())
                    .unwrap_or_default();
                self.line("");
                self.line(&format!(
                    "── {} ── item {}/{}, round {}/{}",
                    name,
                    item_index + 1,
                    snap.item_count,
                    item_round,
                    snap.item_rounds
                ));
                if !summary.is_empty() {
                    self.line(&format!("   {}", summary));
                }
            }
            ProgramEvent::Exercise(EngineEvent::PhaseChanged {
                to, round, cycle, ..
            }) => {
                if *to == Phase::Finished {
                    return;
                }
                let manual = scheduler.awaiting_manual_completion();
                let detail = match scheduler.current_exercise() {
                    Some(e) if manual => {
                        let reps = e.spec.repetitions.unwrap_or(0);
                        match e.spec.load.filter(|l| *l > 0.0) {
                            Some(load) => format!("{} reps @ {}kg, Enter when done", reps, load),
                            None => format!("{} reps, Enter when done", reps),
                        }
                    }
                    _ => format!("round {}, cycle {}", round, cycle),
                };
                self.line(&format!("   {}: {}", to.label(), detail));
            }
            ProgramEvent::Exercise(EngineEvent::SetCompleted {
                round, duration, ..
            }) => {
                self.line(&format!(
                    "   ✓ Set {} done in {}",
                    round,
                    format_clock(duration.as_secs())
                ));
            }
            ProgramEvent::RestStarted { kind, seconds } => {
                let what = match kind {
                    RestKind::BetweenExercises => "Rest",
                    RestKind::BetweenItems => "Rest before next item",
                };
                self.line(&format!("   {} {}s", what, seconds));
            }
            ProgramEvent::ItemSkipped { item_index } => {
                self.line(&format!("   (item {} is empty, skipped)", item_index + 1));
            }
            _ => {}
        }
    }

    pub fn paused(&mut self, paused: bool) {
        if !self.quiet {
            self.line(if paused { "⏸ Paused" } else { "▶ Resumed" });
        }
    }

    /// Redraw the single-line status display
    pub fn status(&mut self, snap: &ProgramSnapshot) {
        if !self.live {
            return;
        }
        let text = match (&snap.exercise, &snap.rest) {
            (Some(ex), _) if ex.manual_work => format!(
                "{:<8} set time {}",
                ex.label,
                format_clock(ex.exercise_duration)
            ),
            (Some(ex), _) => format!(
                "{:<8} {}  round {}/{}  cycle {}/{}",
                ex.label,
                format_clock(u64::from(ex.time_remaining)),
                ex.current_round,
                ex.total_rounds,
                ex.current_cycle,
                ex.total_cycles
            ),
            (None, Some(RestSnapshot {
                remaining, up_next, ..
            })) => format!(
                "{:<8} {}  up next: {}",
                "Rest",
                format_clock(u64::from(*remaining)),
                up_next.as_deref().unwrap_or("-")
            ),
            (None, None) => return,
        };
        let text = if snap.paused {
            format!("{} [paused]", text)
        } else {
            text
        };

        let width = self.status_width.max(text.chars().count());
        print!("\r{:<width$}", text, width = width);
        let _ = io::stdout().flush();
        self.status_width = text.chars().count();
    }

    fn clear_status(&mut self) {
        if self.status_width > 0 {
            print!("\r{:width$}\r", "", width = self.status_width);
            self.status_width = 0;
        }
    }

    fn line(&mut self, text: &str) {
        self.clear_status();
        println!("{}", text);
    }
}

/// Rings the terminal bell on stderr
#[derive(Debug, Default)]
pub struct TerminalBell;

impl CuePlayer for TerminalBell {
    fn play(&self, cue: Cue) -> Result<()> {
        let rings = match cue {
            Cue::Countdown | Cue::WorkEnd => 1,
            Cue::Go => 2,
            Cue::Finish => 3,
        };
        let mut err = io::stderr();
        err.write_all("\x07".repeat(rings).as_bytes())
            .and_then(|_| err.flush())
            .map_err(|e| Error::Cue(e.to_string()))
    }
}

/// Print a human-readable program outline
pub fn print_plan(program: &Program, estimate: Option<u64>) {
    println!("{}", program.name);
    println!();

    for (i, item) in program.items.iter().enumerate() {
        match item {
            ProgramItem::Standalone { exercise, rounds } => {
                println!(
                    "  {}. {} ×{}  ({})",
                    i + 1,
                    exercise.name,
                    rounds,
                    exercise.spec.summary()
                );
            }
            ProgramItem::Group(group) => {
                println!(
                    "  {}. Group ×{}, {}s rest between exercises",
                    i + 1,
                    group.rounds,
                    group.rest_between_exercises
                );
                for exercise in &group.exercises {
                    println!("       - {}  ({})", exercise.name, exercise.spec.summary());
                }
            }
        }
    }

    println!();
    if program.rest_between_items > 0 {
        println!("Rest between items: {}s", program.rest_between_items);
    }
    println!("Exercises: {}", program.exercise_count());
    match estimate {
        Some(seconds) => println!("Estimated duration: {}", format_clock(seconds)),
        None => println!("Estimated duration: depends on manual sets"),
    }
}
