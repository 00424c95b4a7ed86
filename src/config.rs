use crate::command::ExitCode;

/// Immutable presentation settings of the shell.
///
/// Built once at startup and owned by the [`Interpreter`](crate::Interpreter);
/// nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Shell name, used as the prompt opening and as the diagnostic prefix.
    pub name: String,
    /// Marker rendered after the name (and status) in the prompt.
    pub prompt_closing: String,
    /// Banner printed once before the first prompt.
    pub init_message: String,
    /// Banner printed by `exit` right before terminating.
    pub exit_message: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            name: "myshell".to_string(),
            prompt_closing: " -> ".to_string(),
            init_message: "Welcome to MyShell!".to_string(),
            exit_message: "Exiting MyShell...".to_string(),
        }
    }
}

impl ShellConfig {
    /// Renders the prompt shown before reading a line.
    ///
    /// The previous status is annotated in brackets only when it is non-zero:
    /// `myshell -> ` or `myshell[2] -> `.
    pub fn prompt(&self, last_status: ExitCode) -> String {
        if last_status != 0 {
            format!("{}[{}]{}", self.name, last_status, self.prompt_closing)
        } else {
            format!("{}{}", self.name, self.prompt_closing)
        }
    }

    /// Prefix for diagnostics written to standard error.
    pub fn prefix(&self) -> &str {
        &self.name
    }
}
