//! Completion notifications.
//!
//! [`Notifier`] is picked once from configuration. The external variant runs a
//! desktop notification command and drops to the full-screen
//! [`FallbackDisplay`] when that command is missing or fails.

use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::{NotifierConfig, NotifierMode};
use crate::error::NotifyError;

const TITLE: &str = "effort-timer";

pub trait Alert {
    fn alert(&mut self, message: &str) -> Result<(), NotifyError>;
}

/// Runs `program args... message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAlert {
    program: String,
    args: Vec<String>,
}

impl CommandAlert {
    pub fn new(command: &[String]) -> Result<Self, NotifyError> {
        let (program, args) = command.split_first().ok_or(NotifyError::NoCommand)?;
        if program.trim().is_empty() {
            return Err(NotifyError::NoCommand);
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn platform_default() -> Self {
        let command: Vec<String> = if cfg!(target_os = "macos") {
            vec![
                "osascript".into(),
                "-e".into(),
                "on run argv".into(),
                "-e".into(),
                format!("display notification (item 1 of argv) with title \"{TITLE}\""),
                "-e".into(),
                "end run".into(),
            ]
        } else {
            vec!["notify-send".into(), TITLE.into()]
        };
        Self {
            program: command[0].clone(),
            args: command[1..].to_vec(),
        }
    }
}

impl Alert for CommandAlert {
    fn alert(&mut self, message: &str) -> Result<(), NotifyError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(message)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| NotifyError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(NotifyError::Exit {
                program: self.program.clone(),
                status,
            })
        }
    }
}

/// Clears the terminal and types the message out in the middle of the screen.
pub struct FallbackDisplay {
    out: Box<dyn Write>,
    frame_delay: Duration,
    width: usize,
    height: usize,
}

impl FallbackDisplay {
    pub fn new(out: Box<dyn Write>, frame_delay: Duration) -> Self {
        Self {
            out,
            frame_delay,
            width: terminal_dimension("COLUMNS", 80),
            height: terminal_dimension("LINES", 24),
        }
    }

    pub fn stdout(frame_delay: Duration) -> Self {
        Self::new(Box::new(io::stdout()), frame_delay)
    }

    fn pause(&self, rng: &mut impl Rng) {
        if self.frame_delay.is_zero() {
            return;
        }
        thread::sleep(self.frame_delay.mul_f64(rng.gen_range(0.5..1.5)));
    }
}

impl Alert for FallbackDisplay {
    fn alert(&mut self, message: &str) -> Result<(), NotifyError> {
        let mut rng = rand::thread_rng();
        let len = message.chars().count();
        let row = self.height / 2;
        let col = self.width.saturating_sub(len) / 2 + 1;

        write!(self.out, "\x1b[2J\x1b[{row};{col}H")?;
        for ch in message.chars() {
            write!(self.out, "{ch}")?;
            self.out.flush()?;
            self.pause(&mut rng);
        }
        // ASCII bell, then leave the cursor below the message.
        write!(self.out, "\x07\x1b[{};1H\n", row + 2)?;
        self.out.flush()?;
        Ok(())
    }
}

fn terminal_dimension(var: &str, default: usize) -> usize {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(default)
}

/// How a completion message reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    External,
    Fallback,
    Dropped,
}

pub enum Notifier {
    External {
        alert: Box<dyn Alert>,
        fallback: FallbackDisplay,
    },
    Fallback(FallbackDisplay),
}

impl Notifier {
    pub fn from_config(config: &NotifierConfig) -> Self {
        let fallback = FallbackDisplay::stdout(Duration::from_millis(config.frame_delay_ms));
        match config.mode {
            NotifierMode::Fallback => Notifier::Fallback(fallback),
            NotifierMode::External => {
                let alert = match config.command.as_deref() {
                    Some(command) => match CommandAlert::new(command) {
                        Ok(alert) => alert,
                        Err(err) => {
                            warn!("{}, using fallback display", err);
                            return Notifier::Fallback(fallback);
                        }
                    },
                    None => CommandAlert::platform_default(),
                };
                Notifier::External {
                    alert: Box::new(alert),
                    fallback,
                }
            }
        }
    }

    pub fn deliver(&mut self, message: &str) -> Delivery {
        let fallback = match self {
            Notifier::External { alert, fallback } => match alert.alert(message) {
                Ok(()) => {
                    debug!("delivered external alert");
                    return Delivery::External;
                }
                Err(err) => {
                    warn!("{}, using fallback display", err);
                    fallback
                }
            },
            Notifier::Fallback(fallback) => fallback,
        };

        match fallback.alert(message) {
            Ok(()) => Delivery::Fallback,
            Err(err) => {
                warn!("{}", err);
                Delivery::Dropped
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Writer whose contents stay readable after being boxed.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(pub Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub(crate) struct Recording {
        pub sent: Rc<RefCell<Vec<String>>>,
        pub fail: bool,
    }

    impl Alert for Recording {
        fn alert(&mut self, message: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::NoCommand);
            }
            self.sent.borrow_mut().push(message.to_string());
            Ok(())
        }
    }

    pub(crate) fn quiet_display(buf: &SharedBuf) -> FallbackDisplay {
        FallbackDisplay::new(Box::new(buf.clone()), Duration::ZERO)
    }

    #[test]
    fn external_success_skips_fallback() {
        let buf = SharedBuf::default();
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = Notifier::External {
            alert: Box::new(Recording { sent: sent.clone(), fail: false }),
            fallback: quiet_display(&buf),
        };

        assert_eq!(notifier.deliver("done"), Delivery::External);
        assert_eq!(*sent.borrow(), vec!["done".to_string()]);
        assert!(buf.contents().is_empty());
    }

    #[test]
    fn external_failure_uses_fallback() {
        let buf = SharedBuf::default();
        let mut notifier = Notifier::External {
            alert: Box::new(Recording { sent: Rc::default(), fail: true }),
            fallback: quiet_display(&buf),
        };

        assert_eq!(notifier.deliver("done"), Delivery::Fallback);
        assert!(buf.contents().contains("done"));
        assert!(buf.contents().contains('\x07'));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let command = vec!["effort-timer-no-such-program".to_string()];
        let mut alert = CommandAlert::new(&command).unwrap();
        assert!(matches!(alert.alert("x"), Err(NotifyError::Spawn { .. })));
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(CommandAlert::new(&[]), Err(NotifyError::NoCommand)));
        assert!(matches!(
            CommandAlert::new(&[" ".to_string()]),
            Err(NotifyError::NoCommand)
        ));
    }

    #[test]
    fn fallback_mode_from_config() {
        let config = NotifierConfig {
            mode: NotifierMode::Fallback,
            ..NotifierConfig::default()
        };
        assert!(matches!(Notifier::from_config(&config), Notifier::Fallback(_)));

        let config = NotifierConfig {
            command: Some(vec![String::new()]),
            ..NotifierConfig::default()
        };
        assert!(matches!(Notifier::from_config(&config), Notifier::Fallback(_)));
    }
}
