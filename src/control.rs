//! Remote control via Unix socket
//!
//! Accepts one command per line, e.g. `size 80`, `angle -300`,
//! `center 320 240`, `outline toggle`, or a JSON parameter patch.

use crate::settings::ParamPatch;
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, info, warn};

const SOCKET_PATH: &str = "/tmp/kaleidoscope.sock";

/// Commands that can be sent over the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(ParamPatch),
    ToggleOutline,
    ToggleFeedback,
    Reset,
    Save,
    Load,
    Quit,
}

/// Controller that listens for commands on a Unix socket
pub struct Controller {
    receiver: Receiver<Command>,
    _listener_thread: thread::JoinHandle<()>,
}

impl Controller {
    /// Create a new controller listening on the Unix socket
    pub fn new() -> Result<Self> {
        // Remove existing socket if present
        let _ = std::fs::remove_file(SOCKET_PATH);

        let listener = UnixListener::bind(SOCKET_PATH)
            .with_context(|| format!("failed to bind {}", SOCKET_PATH))?;

        // Set non-blocking so we can check for new connections
        listener
            .set_nonblocking(true)
            .context("failed to set control socket non-blocking")?;

        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::listener_loop(listener, sender);
        });

        info!(path = SOCKET_PATH, "control socket listening");

        Ok(Self {
            receiver,
            _listener_thread: handle,
        })
    }

    fn listener_loop(listener: UnixListener, sender: Sender<Command>) {
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    debug!("control client connected");
                    let sender = sender.clone();
                    thread::spawn(move || {
                        Self::handle_client(stream, sender);
                    });
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No connection ready, sleep briefly
                    thread::sleep(std::time::Duration::from_millis(50));
                },
                Err(e) => {
                    warn!("control socket closed: {}", e);
                    break;
                },
            }
        }
    }

    fn handle_client(stream: UnixStream, sender: Sender<Command>) {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(Result::ok) {
            match parse_command(&line) {
                Some(cmd) => {
                    debug!(?cmd, "control command");
                    if sender.send(cmd).is_err() {
                        break;
                    }
                },
                None if line.trim().is_empty() => {},
                None => warn!(line = %line.trim(), "unknown control command"),
            }
        }
    }

    /// Get any pending commands (non-blocking)
    pub fn poll(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(cmd) = self.receiver.try_recv() {
            commands.push(cmd);
        }
        commands
    }

    /// Get the socket path
    pub fn socket_path() -> &'static str {
        SOCKET_PATH
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        // Clean up the socket file
        let _ = std::fs::remove_file(SOCKET_PATH);
    }
}

/// Parse one command line
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.starts_with('{') {
        return serde_json::from_str::<ParamPatch>(line)
            .ok()
            .filter(|patch| !patch.is_empty())
            .map(Command::Set);
    }

    let line = line.to_lowercase();
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let args: Vec<&str> = words.collect();
    let int = |i: usize| args.get(i).and_then(|s| s.parse::<i32>().ok());

    let patch = match (head, args.len()) {
        ("q" | "quit" | "exit", 0) => return Some(Command::Quit),
        ("s" | "save", 0) => return Some(Command::Save),
        ("l" | "load", 0) => return Some(Command::Load),
        ("r" | "reset", 0) => return Some(Command::Reset),
        ("b" | "feedback", 0) => return Some(Command::ToggleFeedback),
        ("t" | "outline", 0) => return Some(Command::ToggleOutline),
        ("outline", 1) => match args[0] {
            "toggle" => return Some(Command::ToggleOutline),
            "on" | "1" | "true" => ParamPatch {
                show_triangle: Some(true),
                ..ParamPatch::default()
            },
            "off" | "0" | "false" => ParamPatch {
                show_triangle: Some(false),
                ..ParamPatch::default()
            },
            _ => return None,
        },
        ("x", 1) => ParamPatch {
            x: Some(int(0)?),
            ..ParamPatch::default()
        },
        ("y", 1) => ParamPatch {
            y: Some(int(0)?),
            ..ParamPatch::default()
        },
        ("size", 1) => ParamPatch {
            size: Some(int(0)?),
            ..ParamPatch::default()
        },
        ("angle", 1) => ParamPatch {
            angle: Some(int(0)?),
            ..ParamPatch::default()
        },
        ("center", 2) => ParamPatch {
            x: Some(int(0)?),
            y: Some(int(1)?),
            ..ParamPatch::default()
        },
        _ => return None,
    };
    Some(Command::Set(patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track_commands() {
        assert_eq!(
            parse_command("size 80"),
            Some(Command::Set(ParamPatch {
                size: Some(80),
                ..ParamPatch::default()
            }))
        );
        assert_eq!(
            parse_command("  ANGLE -300 "),
            Some(Command::Set(ParamPatch {
                angle: Some(-300),
                ..ParamPatch::default()
            }))
        );
        assert_eq!(
            parse_command("center 320 240"),
            Some(Command::Set(ParamPatch {
                x: Some(320),
                y: Some(240),
                ..ParamPatch::default()
            }))
        );
    }

    #[test]
    fn test_parse_toggles() {
        assert_eq!(parse_command("outline toggle"), Some(Command::ToggleOutline));
        assert_eq!(parse_command("t"), Some(Command::ToggleOutline));
        assert_eq!(parse_command("feedback"), Some(Command::ToggleFeedback));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(
            parse_command("outline off"),
            Some(Command::Set(ParamPatch {
                show_triangle: Some(false),
                ..ParamPatch::default()
            }))
        );
    }

    #[test]
    fn test_parse_json_patch() {
        assert_eq!(
            parse_command(r#"{"x": 10, "show_triangle": true}"#),
            Some(Command::Set(ParamPatch {
                x: Some(10),
                show_triangle: Some(true),
                ..ParamPatch::default()
            }))
        );
        assert_eq!(parse_command("{}"), None);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("size big"), None);
        assert_eq!(parse_command("center 10"), None);
        assert_eq!(parse_command("explode"), None);
    }
}
