//! Terminal host: a single-threaded event loop around the rest timer.
//!
//! The stdin reader thread and the Ctrl-C handler only forward [`Input`]
//! over a channel. Everything else, timer dispatch and prompts included,
//! runs on the thread that owns the [`Session`].

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use effort_timer::config::Config;
use effort_timer::duration::{format_duration, format_remaining, parse_duration};
use effort_timer::{
    EffortGate, Entry, GateOutcome, Notifier, Outline, Prompt, RestTimer, Scheduler,
};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum Input {
    Line(String),
    Interrupt,
    Closed,
}

pub struct Terminal {
    rx: Receiver<Input>,
    interrupted: bool,
}

impl Terminal {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let interrupt_tx = tx.clone();
        ctrlc::set_handler(move || {
            let _ = interrupt_tx.send(Input::Interrupt);
        })
        .context("Error setting Ctrl-C handler")?;

        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(Input::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!("stdin read failed: {}", err);
                        break;
                    }
                }
            }
            let _ = tx.send(Input::Closed);
        });

        Ok(Self::from_receiver(rx))
    }

    /// Terminal reading from an existing input channel.
    pub fn from_receiver(rx: Receiver<Input>) -> Self {
        Self {
            rx,
            interrupted: false,
        }
    }

    /// Wait for input. `None` means the timeout passed first.
    pub fn next_input(&mut self, timeout: Option<Duration>) -> Option<Input> {
        let input = match timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(input) => input,
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => Input::Closed,
            },
            None => self.rx.recv().unwrap_or(Input::Closed),
        };
        if matches!(input, Input::Interrupt) {
            self.interrupted = true;
        }
        Some(input)
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        print!("{question}");
        let _ = io::stdout().flush();
        match self.next_input(None) {
            Some(Input::Line(line)) => Some(line),
            _ => {
                println!();
                None
            }
        }
    }
}

impl Prompt for Terminal {
    fn message(&mut self, text: &str) {
        println!("{text}");
    }

    fn confirm(&mut self, question: &str) -> bool {
        loop {
            let Some(answer) = self.ask(&format!("{question} (y/n) ")) else {
                return false;
            };
            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" | "" => return false,
                _ => println!("Please answer y or n."),
            }
        }
    }

    fn choose(&mut self, question: &str, choices: &[String]) -> Option<String> {
        if !choices.is_empty() {
            let menu: Vec<String> = choices
                .iter()
                .enumerate()
                .map(|(i, choice)| format!("#{}) {}", i + 1, choice))
                .collect();
            println!("{}  (type a value or #N)", menu.join("  "));
        }
        self.ask(question).map(|answer| resolve_choice(&answer, choices))
    }
}

/// `#N` picks the Nth choice; anything else is taken as typed.
fn resolve_choice(answer: &str, choices: &[String]) -> String {
    let picked = answer
        .trim()
        .strip_prefix('#')
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| choices.get(i));
    match picked {
        Some(choice) => choice.clone(),
        None => answer.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Session<S: Scheduler> {
    timer: RestTimer<S>,
    config: Config,
    config_path: PathBuf,
    entry: Entry,
}

impl<S: Scheduler> Session<S> {
    pub fn new(timer: RestTimer<S>, config: Config, config_path: PathBuf) -> Self {
        Self {
            timer,
            config,
            config_path,
            entry: Entry::new("Untitled"),
        }
    }

    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entry = entry;
        self
    }

    /// Interactive loop. Returns on `quit`, Ctrl-C or end of input.
    pub fn run(&mut self, term: &mut Terminal) -> Result<()> {
        println!("effort-timer: type 'help' for commands");
        loop {
            match term.next_input(self.timer.time_left()) {
                None => {
                    self.timer.dispatch_due(&self.config, term);
                }
                Some(Input::Line(line)) => {
                    if self.handle_line(&line, term)? == Flow::Quit {
                        break;
                    }
                }
                Some(Input::Interrupt) => break,
                // Piped input ran out: let an armed timer finish.
                Some(Input::Closed) => {
                    self.wait(term);
                    break;
                }
            }
            if term.interrupted() {
                break;
            }
        }
        self.shutdown(term);
        Ok(())
    }

    /// Block until the armed timer fires, drawing a countdown.
    pub fn wait(&mut self, term: &mut Terminal) {
        let Some(total) = self.timer.time_left() else {
            return;
        };
        while let Some(left) = self.timer.time_left() {
            render_progress(left, total);
            match term.next_input(Some(left.min(TICK))) {
                None => {
                    if self.timer.time_left().is_some_and(|l| l.is_zero()) {
                        render_progress(Duration::ZERO, total);
                        println!();
                        self.timer.dispatch_due(&self.config, term);
                    }
                }
                Some(Input::Interrupt) => {
                    println!("\n🛑 Interrupted!");
                    break;
                }
                // Without an interactive session, typed lines are ignored.
                Some(Input::Line(_)) | Some(Input::Closed) => {}
            }
        }
        self.shutdown(term);
    }

    pub fn start(&mut self, minutes: Option<u32>, term: &mut dyn Prompt) {
        self.timer.start(minutes, &self.config, term);
    }

    pub fn clock_in(&mut self, effort: Option<&str>, term: &mut dyn Prompt) -> GateOutcome {
        if let Some(effort) = effort {
            self.entry.set_attribute(&self.config.effort_property, effort);
        }
        let outcome =
            EffortGate::before_clock_in(&mut self.entry, &mut self.timer, &self.config, term);
        match &outcome {
            GateOutcome::BelowThreshold { effort } => term.message(&format!(
                "Effort of {} is within the {} minute threshold, no rest timer",
                format_duration(effort.as_secs()),
                self.config.threshold
            )),
            GateOutcome::NoEffort => term.message("No effort set, no rest timer"),
            GateOutcome::Armed(_) => {}
        }
        outcome
    }

    fn shutdown(&mut self, term: &mut dyn Prompt) {
        if self.timer.is_armed() {
            self.timer.cancel(term);
        }
    }

    fn handle_line(&mut self, line: &str, term: &mut dyn Prompt) -> Result<Flow> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        debug!(command, rest, "session command");

        match command {
            "" => {}
            "start" => {
                if rest.is_empty() {
                    self.start(None, term);
                } else {
                    match parse_duration(rest) {
                        Ok(duration) => self.start(Some(whole_minutes(duration)), term),
                        Err(err) => term.message(&format!("Error: {err}")),
                    }
                }
            }
            "cancel" => {
                self.timer.cancel(term);
            }
            "remaining" | "left" => {
                self.timer.remaining(term);
            }
            "clock-in" => {
                let effort = (!rest.is_empty()).then_some(rest);
                self.clock_in(effort, term);
            }
            "entry" => {
                let heading = if rest.is_empty() { "Untitled" } else { rest };
                self.entry = Entry::new(heading);
                term.message(&format!("Current entry: {heading}"));
            }
            "show" => self.show(term),
            "set" => self.set(rest, term)?,
            "help" => term.message(HELP),
            "quit" | "exit" => return Ok(Flow::Quit),
            other => term.message(&format!("Unknown command '{other}', type 'help'")),
        }
        Ok(Flow::Continue)
    }

    fn show(&self, term: &mut dyn Prompt) {
        term.message(&format!("Entry: {}", self.entry.heading));
        for (name, value) in self.entry.properties() {
            term.message(&format!("  :{name}: {value}"));
        }
        match self.timer.time_left() {
            Some(left) => term.message(&format!("Rest timer: {}", format_remaining(left))),
            None => term.message("Rest timer: idle"),
        }
    }

    fn set(&mut self, args: &str, term: &mut dyn Prompt) -> Result<()> {
        let Some((key, value)) = args.split_once(char::is_whitespace) else {
            term.message("Usage: set <key> <value>");
            return Ok(());
        };
        if let Err(err) = self.config.set(key, value) {
            term.message(&format!("Error: {err}"));
            return Ok(());
        }
        if key.starts_with("notifier") {
            self.timer
                .set_notifier(Notifier::from_config(&self.config.notifier));
        }
        self.config
            .save(&self.config_path)
            .with_context(|| format!("saving {}", self.config_path.display()))?;
        term.message(&format!("{key} updated"));
        Ok(())
    }
}

const HELP: &str = "\
Commands:
  start [duration]     arm the rest timer (default duration from config)
  cancel               disarm the rest timer
  remaining            show time left
  clock-in [effort]    run the effort gate on the current entry
  entry <heading>      switch to a new entry
  show                 show the current entry and timer
  set <key> <value>    change a preference (threshold, default_duration, message,
                       presets, effort_property, notifier.mode)
  quit";

/// Round up to whole minutes, at least one.
pub fn whole_minutes(duration: Duration) -> u32 {
    let minutes = duration.as_secs().div_ceil(60).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

fn render_progress(left: Duration, total: Duration) {
    let minutes = left.as_secs() / 60;
    let seconds = left.as_secs() % 60;

    let progress_ratio = if total.is_zero() {
        1.0
    } else {
        1.0 - left.as_secs_f64() / total.as_secs_f64()
    };
    let percentage = (progress_ratio * 100.0) as u8;

    let bar_width = 20;
    let filled_blocks = ((progress_ratio * bar_width as f64) as usize).min(bar_width);
    let progress_bar = format!(
        "{}{}",
        "█".repeat(filled_blocks),
        "░".repeat(bar_width - filled_blocks)
    );

    print!(
        "\r⏱️  {:02}:{:02} remaining [{}] {}%",
        minutes, seconds, progress_bar, percentage
    );
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use effort_timer::Alert;
    use effort_timer::config::NotifierMode;
    use effort_timer::error::NotifyError;
    use effort_timer::notify::FallbackDisplay;
    use effort_timer::prompt::ScriptedPrompt;
    use effort_timer::scheduler::{DeferredQueue, ManualClock};
    use std::sync::mpsc::Sender;
    use tempfile::{TempDir, tempdir};

    struct Quiet;

    impl Alert for Quiet {
        fn alert(&mut self, _message: &str) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    fn test_session(dir: &TempDir) -> (Session<DeferredQueue<ManualClock>>, ManualClock) {
        let clock = ManualClock::new();
        let notifier = Notifier::External {
            alert: Box::new(Quiet),
            fallback: FallbackDisplay::new(Box::new(io::sink()), Duration::ZERO),
        };
        let timer = RestTimer::new(DeferredQueue::with_clock(clock.clone()), notifier);
        let session = Session::new(timer, Config::default(), dir.path().join("config.json"));
        (session, clock)
    }

    fn scripted_terminal(inputs: Vec<Input>) -> (Terminal, Sender<Input>) {
        let (tx, rx) = mpsc::channel();
        for input in inputs {
            tx.send(input).unwrap();
        }
        (Terminal::from_receiver(rx), tx)
    }

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test]
    fn interrupt_cancels_armed_timer_and_exits() {
        let dir = tempdir().unwrap();
        let (mut session, _clock) = test_session(&dir);
        let (mut term, _tx) = scripted_terminal(vec![
            Input::Line("start 25m".to_string()),
            Input::Line("show".to_string()),
            Input::Interrupt,
            Input::Line("start 5".to_string()),
        ]);

        session.run(&mut term).unwrap();

        assert!(term.interrupted());
        assert!(!session.timer.is_armed());
        assert_eq!(session.timer.scheduler().pending_count(), 0);
        // Input after the interrupt is never read.
        assert!(matches!(term.next_input(Some(Duration::ZERO)), Some(Input::Line(_))));
    }

    #[test]
    fn interrupt_while_waiting_cancels() {
        let dir = tempdir().unwrap();
        let (mut session, _clock) = test_session(&dir);
        let (mut term, _tx) = scripted_terminal(vec![Input::Interrupt]);
        let mut prompt = ScriptedPrompt::default();

        session.start(Some(10), &mut prompt);
        assert!(session.timer.is_armed());
        session.wait(&mut term);

        assert!(!session.timer.is_armed());
        assert_eq!(session.timer.scheduler().pending_count(), 0);
    }

    #[test]
    fn quit_ends_the_loop() {
        let dir = tempdir().unwrap();
        let (mut session, _clock) = test_session(&dir);
        let (mut term, _tx) = scripted_terminal(vec![Input::Line("quit".to_string())]);

        session.run(&mut term).unwrap();
        assert!(!term.interrupted());
    }

    #[test]
    fn set_notifier_mode_swaps_notifier_and_saves() {
        let dir = tempdir().unwrap();
        let (mut session, _clock) = test_session(&dir);
        let mut prompt = ScriptedPrompt::default();
        assert!(matches!(session.timer.notifier(), Notifier::External { .. }));

        let flow = session
            .handle_line("set notifier.mode fallback", &mut prompt)
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert!(matches!(session.timer.notifier(), Notifier::Fallback(_)));
        assert_eq!(prompt.last_message(), Some("notifier.mode updated"));
        let saved = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(saved.notifier.mode, NotifierMode::Fallback);
    }

    #[test]
    fn set_with_bad_value_reports_and_does_not_save() {
        let dir = tempdir().unwrap();
        let (mut session, _clock) = test_session(&dir);
        let mut prompt = ScriptedPrompt::default();

        session.handle_line("set threshold soon", &mut prompt).unwrap();

        assert!(prompt.last_message().unwrap().starts_with("Error:"));
        assert_eq!(session.config.threshold, 49);
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn start_command_parses_durations() {
        let dir = tempdir().unwrap();
        let (mut session, _clock) = test_session(&dir);
        let mut prompt = ScriptedPrompt::default();

        session.handle_line("start 25m", &mut prompt).unwrap();
        assert_eq!(session.timer.time_left(), Some(minutes(25)));

        session.handle_line("start soon", &mut prompt).unwrap();
        assert!(prompt.last_message().unwrap().starts_with("Error:"));
        assert!(prompt.questions.is_empty());
        assert_eq!(session.timer.time_left(), Some(minutes(25)));
    }

    #[test]
    fn clock_in_with_long_effort_arms_at_threshold() {
        let dir = tempdir().unwrap();
        let (mut session, _clock) = test_session(&dir);
        let mut prompt = ScriptedPrompt::default();

        session.handle_line("clock-in 60", &mut prompt).unwrap();

        assert_eq!(session.entry.get_attribute("Effort").as_deref(), Some("60"));
        assert_eq!(session.timer.active().map(|a| a.minutes), Some(49));
        assert_eq!(session.timer.time_left(), Some(minutes(49)));
    }

    #[test]
    fn numbered_choice_picks_preset() {
        let presets: Vec<String> = ["5", "10", "25"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_choice("#2", &presets), "10");
        assert_eq!(resolve_choice(" #3 ", &presets), "25");
        assert_eq!(resolve_choice("2", &presets), "2");
        assert_eq!(resolve_choice("#9", &presets), "#9");
        assert_eq!(resolve_choice("#0", &presets), "#0");
        assert_eq!(resolve_choice("1:30", &presets), "1:30");
    }

    #[test]
    fn terminal_choose_resolves_numbered_answer() {
        let presets: Vec<String> = ["5", "10", "25"].iter().map(|s| s.to_string()).collect();
        let (mut term, _tx) = scripted_terminal(vec![Input::Line("#3".to_string())]);
        assert_eq!(term.choose("Effort: ", &presets), Some("25".to_string()));
    }

    #[test]
    fn whole_minutes_rounds_up() {
        assert_eq!(whole_minutes(Duration::from_secs(30)), 1);
        assert_eq!(whole_minutes(Duration::from_secs(60)), 1);
        assert_eq!(whole_minutes(Duration::from_secs(90)), 2);
        assert_eq!(whole_minutes(Duration::from_secs(25 * 60)), 25);
    }
}
