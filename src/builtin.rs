use crate::command::ExitCode;
use crate::config::ShellConfig;
use crate::env;
use crate::path::WorkingPath;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use log::debug;
use std::io::Write;
use thiserror::Error;

/// Output streams and configuration handed to a built-in for one invocation.
pub struct BuiltinContext<'a> {
    pub config: &'a ShellConfig,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "exit" or "cd".
    const NAME: &'static str;

    /// One-line description listed by `help`.
    const HELP: &'static str;

    /// When set, every argument is positional, even one starting with `-`
    /// (`exit -1`, `cd -x`), and `--help` is not recognized.
    const POSITIONAL_ONLY: bool = false;

    /// Executes the command.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    /// An `Err` is reported by the registry and turned into status 1.
    fn execute(self, ctx: &mut BuiltinContext<'_>) -> Result<ExitCode>;
}

/// Failures of built-ins that are caused by how they were invoked.
#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("HOME not set")]
    HomeNotSet,
    #[error("too many arguments")]
    TooManyArguments,
}

type Handler = fn(&mut BuiltinContext<'_>, &[&str]) -> ExitCode;

/// Entry of the built-in table: name, handler and short help text.
pub struct BuiltinDescriptor {
    pub name: &'static str,
    pub help: &'static str,
    handler: Handler,
}

impl BuiltinDescriptor {
    const fn of<T: BuiltinCommand>() -> Self {
        Self {
            name: T::NAME,
            help: T::HELP,
            handler: run::<T>,
        }
    }

    /// Runs the built-in with `args` (command name excluded).
    pub fn execute(&self, ctx: &mut BuiltinContext<'_>, args: &[String]) -> ExitCode {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        (self.handler)(ctx, &args)
    }
}

static BUILTINS: [BuiltinDescriptor; 3] = [
    BuiltinDescriptor::of::<Exit>(),
    BuiltinDescriptor::of::<Cd>(),
    BuiltinDescriptor::of::<Help>(),
];

/// All built-ins, in registration order.
pub fn registry() -> &'static [BuiltinDescriptor] {
    &BUILTINS
}

/// Looks a built-in up by exact, case-sensitive name.
pub fn find(name: &str) -> Option<&'static BuiltinDescriptor> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

pub fn exists(name: &str) -> bool {
    find(name).is_some()
}

/// Runs the built-in called `name`.
///
/// Returns `None` without doing anything when no such built-in exists.
pub fn dispatch(name: &str, args: &[String], ctx: &mut BuiltinContext<'_>) -> Option<ExitCode> {
    let builtin = find(name)?;
    debug!("running builtin {} with {:?}", name, args);
    Some(builtin.execute(ctx, args))
}

fn run<T: BuiltinCommand>(ctx: &mut BuiltinContext<'_>, args: &[&str]) -> ExitCode {
    let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 1);
    if T::POSITIONAL_ONLY {
        argv.push("--");
    }
    argv.extend_from_slice(args);

    let cmd = match T::from_args(&[T::NAME], &argv) {
        Ok(cmd) => cmd,
        Err(EarlyExit { output, status }) => {
            return match status {
                Ok(()) => {
                    let _ = writeln!(ctx.stdout, "{}", output.trim_end());
                    0
                }
                Err(()) => {
                    let _ = writeln!(
                        ctx.stderr,
                        "{}: {}: {}",
                        ctx.config.prefix(),
                        T::NAME,
                        output.trim_end()
                    );
                    1
                }
            };
        }
    };

    match cmd.execute(ctx) {
        Ok(code) => code,
        Err(e) => {
            let _ = writeln!(ctx.stderr, "{}: {}: {:#}", ctx.config.prefix(), T::NAME, e);
            1
        }
    }
}

/// Lenient exit status parsing: anything that is not an integer means 0.
fn parse_exit_code(arg: &str) -> ExitCode {
    arg.trim().parse().unwrap_or(0)
}

#[derive(FromArgs)]
/// Exit the shell with the given status (0 by default).
pub struct Exit {
    #[argh(positional, greedy)]
    /// exit status; non-numeric values mean 0 and extra values are ignored.
    pub code: Vec<String>,
}

impl BuiltinCommand for Exit {
    const NAME: &'static str = "exit";
    const HELP: &'static str = "Exit the shell";
    const POSITIONAL_ONLY: bool = true;

    fn execute(self, ctx: &mut BuiltinContext<'_>) -> Result<ExitCode> {
        let code = self.code.first().map_or(0, |arg| parse_exit_code(arg));
        let _ = writeln!(ctx.stdout, "{}", ctx.config.exit_message);
        let _ = ctx.stdout.flush();
        debug!("exiting with status {}", code);
        std::process::exit(code)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to, used verbatim. Defaults to $HOME when omitted.
    pub targets: Vec<String>,
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = "cd";
    const HELP: &'static str = "Change directory";
    const POSITIONAL_ONLY: bool = true;

    fn execute(self, _ctx: &mut BuiltinContext<'_>) -> Result<ExitCode> {
        let target = match self.targets.as_slice() {
            [] => env::var("HOME").ok_or(BuiltinError::HomeNotSet)?,
            [target] => target.clone(),
            _ => return Err(BuiltinError::TooManyArguments.into()),
        };

        std::env::set_current_dir(&target).with_context(|| target.clone())?;

        let cwd = WorkingPath::from_cwd()?;
        env::set_var("PWD", cwd.raw()).context("updating PWD")?;
        debug!("changed directory to {}", cwd.pretty());
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the built-in commands.
pub struct Help {}

impl BuiltinCommand for Help {
    const NAME: &'static str = "help";
    const HELP: &'static str = "Show help about available commands";

    fn execute(self, ctx: &mut BuiltinContext<'_>) -> Result<ExitCode> {
        writeln!(ctx.stdout, "Commands available:")?;
        for builtin in registry() {
            writeln!(ctx.stdout, " - {}    {}", builtin.name, builtin.help)?;
        }
        Ok(0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::env as stdenv;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Serializes tests that touch the working directory or `HOME`/`PWD`.
    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("myshell_test_cd_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    struct Captured {
        code: Option<ExitCode>,
        stdout: String,
        stderr: String,
    }

    fn run_builtin(name: &str, args: &[&str]) -> Captured {
        let config = ShellConfig::default();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let code = {
            let mut ctx = BuiltinContext {
                config: &config,
                stdout: &mut stdout,
                stderr: &mut stderr,
            };
            dispatch(name, &args, &mut ctx)
        };
        Captured {
            code,
            stdout: String::from_utf8(stdout).unwrap(),
            stderr: String::from_utf8(stderr).unwrap(),
        }
    }

    #[test]
    fn test_exists() {
        assert!(exists("cd"));
        assert!(exists("exit"));
        assert!(exists("help"));
        assert!(!exists("doesnotexist"));
        assert!(!exists("CD"));
        assert!(!exists(""));
    }

    #[test]
    fn test_registry_order() {
        let names: Vec<&str> = registry().iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["exit", "cd", "help"]);
    }

    #[test]
    fn test_dispatch_unknown_is_none() {
        let res = run_builtin("doesnotexist", &[]);
        assert_eq!(res.code, None);
        assert!(res.stdout.is_empty());
        assert!(res.stderr.is_empty());
    }

    #[test]
    fn test_help_lists_every_builtin() {
        let res = run_builtin("help", &[]);
        assert_eq!(res.code, Some(0));
        assert_eq!(
            res.stdout,
            "Commands available:\n \
             - exit    Exit the shell\n \
             - cd    Change directory\n \
             - help    Show help about available commands\n"
        );
    }

    #[test]
    fn test_builtin_help_flag() {
        let res = run_builtin("help", &["--help"]);
        assert_eq!(res.code, Some(0));
        assert!(res.stdout.contains("Usage: help"));
    }

    #[test]
    fn test_unknown_flag_is_reported() {
        let res = run_builtin("help", &["--bogus"]);
        assert_eq!(res.code, Some(1));
        assert!(res.stderr.starts_with("myshell: help: "));
    }

    #[test]
    fn test_parse_exit_code() {
        assert_eq!(parse_exit_code("5"), 5);
        assert_eq!(parse_exit_code("0"), 0);
        assert_eq!(parse_exit_code("-1"), -1);
        assert_eq!(parse_exit_code("abc"), 0);
        assert_eq!(parse_exit_code(""), 0);
    }

    #[test]
    fn test_cd_to_home_when_no_args() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");

        let orig = stdenv::current_dir().unwrap();
        let orig_home = stdenv::var("HOME").ok();

        env::set_var("HOME", &canonical_temp.to_string_lossy()).unwrap();
        let res = run_builtin("cd", &[]);

        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        let pwd = stdenv::var("PWD").unwrap();

        stdenv::set_current_dir(&orig).expect("failed to restore cwd");
        if let Some(home) = orig_home {
            env::set_var("HOME", &home).unwrap();
        }
        let _ = fs::remove_dir_all(&temp);

        assert_eq!(res.code, Some(0), "stderr: {}", res.stderr);
        assert_eq!(new_cwd, canonical_temp);
        assert_eq!(PathBuf::from(pwd), canonical_temp);
    }

    #[test]
    fn test_cd_to_absolute_path_sets_pwd() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        let orig = stdenv::current_dir().unwrap();

        let target = canonical_temp.to_string_lossy().to_string();
        let res = run_builtin("cd", &[target.as_str()]);

        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();
        let pwd = stdenv::var("PWD").unwrap();

        stdenv::set_current_dir(&orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);

        assert_eq!(res.code, Some(0));
        assert_eq!(new_cwd, canonical_temp);
        assert_eq!(PathBuf::from(pwd), canonical_temp);
    }

    #[test]
    fn test_cd_too_many_arguments() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let res = run_builtin("cd", &["a", "b"]);

        assert_eq!(res.code, Some(1));
        assert_eq!(res.stderr, "myshell: cd: too many arguments\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let name = format!("nonexistent_dir_for_myshell_test_{}", std::process::id());
        let res = run_builtin("cd", &[name.as_str()]);

        assert_eq!(res.code, Some(1));
        assert!(res.stderr.starts_with(&format!("myshell: cd: {}: ", name)));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_without_home_fails() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let orig_home = stdenv::var("HOME").ok();

        // SAFETY: serialized by the lock above.
        unsafe { stdenv::remove_var("HOME") };
        let res = run_builtin("cd", &[]);
        if let Some(home) = orig_home {
            env::set_var("HOME", &home).unwrap();
        }

        assert_eq!(res.code, Some(1));
        assert_eq!(res.stderr, "myshell: cd: HOME not set\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_target_starting_with_dash_is_verbatim() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let canonical_temp = fs::canonicalize(&temp).expect("canonicalize failed");
        fs::create_dir(canonical_temp.join("-x")).expect("create -x dir");
        let orig = stdenv::current_dir().unwrap();

        stdenv::set_current_dir(&canonical_temp).expect("enter temp dir");
        let res = run_builtin("cd", &["-x"]);
        let new_cwd = fs::canonicalize(stdenv::current_dir().unwrap()).unwrap();

        stdenv::set_current_dir(&orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);

        assert_eq!(res.code, Some(0), "stderr: {}", res.stderr);
        assert_eq!(new_cwd, canonical_temp.join("-x"));
    }

    #[test]
    fn test_cd_help_is_a_directory_name() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let res = run_builtin("cd", &["--help"]);

        assert_eq!(res.code, Some(1));
        assert!(res.stdout.is_empty());
        assert!(res.stderr.starts_with("myshell: cd: --help: "));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }
}
