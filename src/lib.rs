//! A small interactive command interpreter.
//!
//! Each input line is split on spaces, then either handed to one of the
//! built-in commands (`exit`, `cd`, `help`) or run as an external program
//! found through `PATH`. The status of the last command is shown in the
//! next prompt.
//!
//! The main entry point is [`Interpreter`]. The public modules expose the
//! tokenizer, the built-in table and the [`Launcher`](external::Launcher)
//! capability used to run external programs.

pub mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod path;
pub mod signals;

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
