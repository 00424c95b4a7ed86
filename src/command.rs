/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// `-1` is reserved for "the program never ran" (fork or wait failure).
pub type ExitCode = i32;

/// Status returned by the launcher when the child process could not be created
/// or reaped.
pub const LAUNCH_FAILURE: ExitCode = -1;

/// One tokenized input line.
///
/// Index 0 is the command name, the rest are its arguments. An empty line is
/// represented by an input with no tokens rather than by a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    arguments: Vec<String>,
}

impl ParsedInput {
    pub fn new(arguments: Vec<String>) -> Self {
        Self { arguments }
    }

    /// Number of tokens, command name included.
    pub fn count(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// The command name, if the line had any tokens.
    pub fn command(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }

    /// Arguments following the command name.
    pub fn arguments(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or(&[])
    }

    /// The full argument vector, command name included.
    pub fn argv(&self) -> &[String] {
        &self.arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_command() {
        let input = ParsedInput::default();
        assert!(input.is_empty());
        assert_eq!(input.count(), 0);
        assert_eq!(input.command(), None);
        assert!(input.arguments().is_empty());
    }

    #[test]
    fn test_command_and_arguments_are_split() {
        let input = ParsedInput::new(vec!["cd".into(), "/tmp".into()]);
        assert_eq!(input.command(), Some("cd"));
        assert_eq!(input.arguments(), &["/tmp".to_string()]);
        assert_eq!(input.argv().len(), 2);
    }
}
