//! What the shell loop needs from a terminal.

/// One read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D, or no more input
    Eof,
}

/// How a message is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Command output, printed as is.
    Plain,
    Error,
    /// Banner, farewells and hints.
    Notice,
}

/// What the prompt shows before each read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptState {
    pub locators: usize,
    pub current: Option<String>,
}

/// Why the shell stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit`.
    UserExit,
    Eof,
}

#[derive(Debug, thiserror::Error)]
#[error("terminal I/O failed: {0}")]
pub struct IoError(pub String);

/// A line-oriented terminal the shell reads commands from and writes to.
pub trait IoHost {
    /// Show `prompt` and block until the user enters a line or a signal.
    fn read(&mut self, prompt: &PromptState) -> Result<Input, IoError>;

    fn write(&mut self, tone: Tone, text: &str) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
