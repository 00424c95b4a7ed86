use crate::builtin::{self, BuiltinContext};
use crate::command::{ExitCode, ParsedInput};
use crate::config::ShellConfig;
use crate::external::{Launcher, default_launcher};
use crate::lexer;
use crate::signals;
use log::{debug, error};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, IsTerminal, Write};

/// A minimal interactive shell that can execute built-in and external commands.
///
/// Each line is tokenized, then either handed to the matching built-in or run
/// as an external program through the configured [`Launcher`]. Exactly one of
/// these paths runs per line.
///
/// Example
/// ```
/// use myshell::Interpreter;
/// let sh = Interpreter::default();
/// assert_eq!(sh.process_line("   "), 0);
/// ```
pub struct Interpreter {
    config: ShellConfig,
    launcher: Box<dyn Launcher>,
}

impl Interpreter {
    /// Create a new interpreter with a custom configuration and launcher.
    pub fn new(config: ShellConfig, launcher: Box<dyn Launcher>) -> Self {
        Self { config, launcher }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Tokenizes and runs one input line, returning its status.
    pub fn process_line(&self, line: &str) -> ExitCode {
        self.dispatch(lexer::split_into_tokens(line))
    }

    /// Runs one parsed line with the process' standard streams.
    pub fn dispatch(&self, input: ParsedInput) -> ExitCode {
        self.dispatch_with_output(input, &mut io::stdout(), &mut io::stderr())
    }

    /// Runs one parsed line, sending built-in and diagnostic output to the given
    /// writers. External programs always inherit the real standard streams.
    pub fn dispatch_with_output(
        &self,
        input: ParsedInput,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> ExitCode {
        let Some(name) = input.command() else {
            let _ = stdout.flush();
            return 0;
        };

        let mut ctx = BuiltinContext {
            config: &self.config,
            stdout,
            stderr,
        };
        if let Some(code) = builtin::dispatch(name, input.arguments(), &mut ctx) {
            return code;
        }

        debug!("launching external command {:?}", input.argv());
        match self.launcher.launch(input.argv()) {
            Ok(code) => code,
            Err(e) => {
                let _ = writeln!(ctx.stderr, "{}: {}", self.config.prefix(), e);
                e.status()
            }
        }
    }

    /// Read-Eval-Print Loop.
    ///
    /// Returns only when input ends (status 0) or cannot be read (status 1);
    /// the `exit` built-in terminates the process directly. Ctrl+C at the
    /// prompt discards the pending line and shows a fresh prompt.
    pub fn repl(&self) -> ExitCode {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(err) => {
                error!("can't initialise line editor: {}", err);
                let _ = writeln!(io::stderr(), "{}: {}", self.config.prefix(), err);
                return 1;
            }
        };
        // rustyline only renders the prompt on a terminal.
        let interactive = io::stdin().is_terminal();

        let mut last_status = 0;
        loop {
            if signals::take_interrupt() {
                debug!("interrupt received while a command was running");
            }

            let prompt = self.config.prompt(last_status);
            let read = if interactive {
                rl.readline(&prompt)
            } else {
                let mut stdout = io::stdout();
                let _ = write!(stdout, "{}", prompt);
                let _ = stdout.flush();
                rl.readline("")
            };

            match self.handle_read(read) {
                ReadOutcome::Continue(status) => last_status = status,
                ReadOutcome::Exit(code) => return code,
            }
        }
    }

    /// Turns one read attempt into the loop's next step.
    ///
    /// A line is dispatched; an interrupted read dispatches nothing and
    /// clears the status shown in the prompt.
    fn handle_read(&self, read: rustyline::Result<String>) -> ReadOutcome {
        match read {
            Ok(line) => ReadOutcome::Continue(self.process_line(&line)),
            Err(ReadlineError::Interrupted) => {
                debug!("read interrupted");
                ReadOutcome::Continue(0)
            }
            Err(ReadlineError::Eof) => ReadOutcome::Exit(0),
            Err(err) => {
                let _ = writeln!(io::stderr(), "{}: readline: {}", self.config.prefix(), err);
                ReadOutcome::Exit(1)
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ReadOutcome {
    /// Keep looping; the status feeds the next prompt.
    Continue(ExitCode),
    /// Leave the loop with this process status.
    Exit(ExitCode),
}

impl Default for Interpreter {
    /// Default configuration with the platform's default launcher.
    fn default() -> Self {
        let config = ShellConfig::default();
        let launcher = default_launcher(config.prefix());
        Self::new(config, launcher)
    }
}
