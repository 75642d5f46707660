use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("no clipboard command found (tried pbcopy, clip.exe, wl-copy, xsel, xclip, termux-clipboard-set)")]
    Unavailable,

    #[error("{command} failed: {reason}")]
    CommandFailed { command: &'static str, reason: String },

    #[error("I/O error talking to the clipboard: {0}")]
    Io(#[from] io::Error),
}

/// System commands that accept clipboard content on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    MacOS,
    Windows,
    Wayland,
    Xsel,
    Xclip,
    Termux,
}

impl Provider {
    const ALL: [Provider; 6] = [
        Provider::MacOS,
        Provider::Windows,
        Provider::Wayland,
        Provider::Xsel,
        Provider::Xclip,
        Provider::Termux,
    ];

    fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Provider::MacOS => ("pbcopy", &[]),
            Provider::Windows => ("clip.exe", &[]),
            Provider::Wayland => ("wl-copy", &[]),
            Provider::Xsel => ("xsel", &["-b", "-i"]),
            Provider::Xclip => ("xclip", &["-selection", "clipboard", "-in"]),
            Provider::Termux => ("termux-clipboard-set", &[]),
        }
    }

    /// Wayland needs a running compositor; X11 tools need a display.
    fn usable(self) -> bool {
        let display_ok = match self {
            Provider::Wayland => env::var_os("WAYLAND_DISPLAY").is_some(),
            Provider::Xsel | Provider::Xclip => env::var_os("DISPLAY").is_some(),
            _ => true,
        };
        display_ok && command_exists(self.command().0)
    }

    fn copy(self, text: &str) -> Result<(), ClipboardError> {
        let (command, args) = self.command();
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        child
            .stdin
            .take()
            .ok_or_else(|| ClipboardError::CommandFailed {
                command,
                reason: "could not open stdin".to_string(),
            })?
            .write_all(text.as_bytes())?;

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                command,
                reason: format!("exited with {}", status),
            })
        }
    }
}

/// Whether `command` is an executable file somewhere on `PATH`.
pub fn command_exists(command: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| dir.join(command).is_file())
}

/// Copies `text` with the first usable provider.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    let provider = Provider::ALL
        .into_iter()
        .find(|p| p.usable())
        .ok_or(ClipboardError::Unavailable)?;
    log::debug!("Copying to clipboard with {}", provider.command().0);
    provider.copy(text)
}
