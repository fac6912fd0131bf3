//! Terminal playback loop.
//!
//! The driver owns the scheduler and is its only caller. Ticks are delivered
//! through tickets armed with a deadline; keyboard commands arriving before
//! the deadline disarm the pending ticket so it can never fire late.

use crate::render::Renderer;
use hiit_core::{Program, ProgramEvent, ProgramScheduler, Result, Runtime, TickTicket};
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub struct DriverOptions {
    pub tick: Duration,
    pub auto_advance: bool,
}

/// A line of keyboard input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// Enter: complete the manual set or skip the phase
    Advance,
    TogglePause,
    SkipRest,
    Quit,
}

impl Key {
    fn parse(line: &str) -> Option<Key> {
        match line.trim().to_lowercase().as_str() {
            "" => Some(Key::Advance),
            "p" => Some(Key::TogglePause),
            "s" => Some(Key::SkipRest),
            "q" => Some(Key::Quit),
            _ => None,
        }
    }
}

/// How a playback run ended
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Quit,
    Halted(String),
}

pub struct Driver {
    scheduler: ProgramScheduler,
    renderer: Renderer,
    options: DriverOptions,
}

impl Driver {
    pub fn new(runtime: Runtime, renderer: Renderer, options: DriverOptions) -> Self {
        Self {
            scheduler: ProgramScheduler::new(runtime),
            renderer,
            options,
        }
    }

    /// Play `program` until it completes, the user quits, or playback halts
    pub fn run(&mut self, program: Program) -> Result<Outcome> {
        let keys = spawn_stdin_reader();
        self.run_with(program, Some(keys))
    }

    fn run_with(&mut self, program: Program, mut keys: Option<Receiver<Key>>) -> Result<Outcome> {
        let events = self.scheduler.start_program(program)?;
        self.renderer.show_help(self.options.auto_advance);
        if let Some(outcome) = self.handle(&events) {
            return Ok(outcome);
        }

        let mut pending: Option<(TickTicket, Instant)> = None;
        loop {
            if self.options.auto_advance
                && !self.scheduler.is_paused()
                && self.scheduler.awaiting_manual_completion()
            {
                pending = None;
                let events = self.scheduler.advance_exercise();
                if let Some(outcome) = self.handle(&events) {
                    return Ok(outcome);
                }
                continue;
            }

            let (ticket, deadline) = *pending
                .get_or_insert_with(|| (self.scheduler.ticket(), Instant::now() + self.options.tick));
            let wait = deadline.saturating_duration_since(Instant::now());

            let key = match keys.as_ref() {
                Some(rx) => match rx.recv_timeout(wait) {
                    Ok(key) => Some(key),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("Input closed; playback continues without keys");
                        keys = None;
                        continue;
                    }
                },
                None => {
                    thread::sleep(wait);
                    None
                }
            };

            let events = match key {
                None => {
                    pending = None;
                    self.scheduler.on_tick(ticket)
                }
                Some(Key::Quit) => {
                    self.scheduler.cancel();
                    return Ok(Outcome::Quit);
                }
                Some(key) => {
                    pending = None;
                    self.command(key)
                }
            };

            if let Some(outcome) = self.handle(&events) {
                return Ok(outcome);
            }
            self.renderer.status(&self.scheduler.snapshot());
        }
    }

    fn command(&mut self, key: Key) -> Vec<ProgramEvent> {
        match key {
            Key::Advance => self.scheduler.advance_exercise(),
            Key::SkipRest => self.scheduler.skip_rest(),
            Key::TogglePause => {
                let changed = if self.scheduler.is_paused() {
                    self.scheduler.resume_program()
                } else {
                    self.scheduler.pause_program()
                };
                if changed {
                    self.renderer.paused(self.scheduler.is_paused());
                }
                Vec::new()
            }
            Key::Quit => Vec::new(),
        }
    }

    /// Render events and report whether playback is over
    fn handle(&mut self, events: &[ProgramEvent]) -> Option<Outcome> {
        for event in events {
            self.renderer.event(event, &self.scheduler);
            match event {
                ProgramEvent::ProgramCompleted { .. } => return Some(Outcome::Completed),
                ProgramEvent::Halted { reason } => return Some(Outcome::Halted(reason.clone())),
                _ => {}
            }
        }
        None
    }
}

/// Forward stdin lines as keys. The channel closes at end of input.
fn spawn_stdin_reader() -> Receiver<Key> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(key) = Key::parse(&line) {
                if tx.send(key).is_err() {
                    break;
                }
            }
        }
    });
    rx
}
