//! Launching of external programs.
//!
//! Every launch creates exactly one child process and reaps it before
//! returning, so no zombie outlives a call. A child that exits normally
//! yields its own exit code; a child killed by a signal yields
//! [`SIGNALED_STATUS`].

use crate::command::{ExitCode, LAUNCH_FAILURE};
use crate::env;
use log::debug;
use std::borrow::Cow;
use std::ffi::{NulError, OsStr};
use std::io::{self, Write};
use std::path::{Component, Path};
use thiserror::Error;

/// Status reported for a child terminated by an uncaught signal.
pub const SIGNALED_STATUS: ExitCode = 1;

/// Status of a child that could not replace its image with the program.
pub const EXEC_FAILURE: ExitCode = 1;

/// Why a program could not be run (as opposed to running and failing).
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("empty command")]
    EmptyCommand,
    #[error("argument contains a NUL byte")]
    InvalidArgument(#[from] NulError),
    #[error("{0}: command not found")]
    NotFound(String),
    #[cfg(unix)]
    #[error("fork failed: {0}")]
    Fork(nix::errno::Errno),
    #[cfg(unix)]
    #[error("waitpid failed: {0}")]
    Wait(nix::errno::Errno),
    #[error("{program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("wait failed: {0}")]
    WaitChild(io::Error),
}

impl LaunchError {
    /// Shell status reported for this failure.
    ///
    /// A program that cannot be found fails like a child whose exec failed;
    /// everything else means the process never ran.
    pub fn status(&self) -> ExitCode {
        match self {
            LaunchError::NotFound(_) => EXEC_FAILURE,
            _ => LAUNCH_FAILURE,
        }
    }
}

/// Capability to run an external program to completion.
///
/// `argv[0]` is the program name, resolved through `PATH` unless it contains a
/// path separator; the whole vector is passed to the program unmodified and the
/// program inherits the shell's environment and working directory.
pub trait Launcher {
    fn launch(&self, argv: &[String]) -> Result<ExitCode, LaunchError>;
}

/// The launcher used by default on this platform.
pub fn default_launcher(prefix: &str) -> Box<dyn Launcher> {
    #[cfg(unix)]
    {
        Box::new(ForkExecLauncher::new(prefix))
    }
    #[cfg(not(unix))]
    {
        let _ = prefix;
        Box::new(SpawnLauncher)
    }
}

#[cfg(unix)]
pub use self::unix::ForkExecLauncher;

#[cfg(unix)]
mod unix {
    use super::{EXEC_FAILURE, LaunchError, Launcher, SIGNALED_STATUS};
    use crate::command::ExitCode;
    use log::{debug, warn};
    use nix::errno::Errno;
    use nix::sys::wait::{WaitStatus, waitpid};
    use nix::unistd::{ForkResult, Pid, execvp, fork, write};
    use std::ffi::CString;
    use std::io::{self, Write};
    use std::os::fd::AsFd;

    /// Runs programs with `fork`, `execvp` and `waitpid`.
    #[derive(Debug, Clone)]
    pub struct ForkExecLauncher {
        prefix: String,
    }

    impl ForkExecLauncher {
        /// `prefix` starts the message the child prints when `execvp` fails.
        pub fn new(prefix: impl Into<String>) -> Self {
            Self {
                prefix: prefix.into(),
            }
        }
    }

    impl Launcher for ForkExecLauncher {
        fn launch(&self, argv: &[String]) -> Result<ExitCode, LaunchError> {
            let program = argv.first().ok_or(LaunchError::EmptyCommand)?;
            let args = argv
                .iter()
                .map(|arg| CString::new(arg.as_bytes()))
                .collect::<Result<Vec<_>, _>>()?;
            // The child must not allocate, so its diagnostic is prepared here.
            let diagnostic = format!("{}: {}: ", self.prefix, program);

            let _ = io::stdout().flush();

            // SAFETY: between fork and exec the child only calls
            // async-signal-safe functions (execvp, write, _exit).
            let child = match unsafe { fork() } {
                Ok(ForkResult::Parent { child }) => child,
                Ok(ForkResult::Child) => exec_child(&args, diagnostic.as_bytes()),
                Err(errno) => return Err(LaunchError::Fork(errno)),
            };
            debug!("started {} as pid {}", program, child);

            wait_for(child)
        }
    }

    fn exec_child(args: &[CString], diagnostic: &[u8]) -> ! {
        let errno = match execvp(args[0].as_c_str(), args) {
            Ok(never) => match never {},
            Err(errno) => errno,
        };
        let stderr = io::stderr();
        let _ = write(stderr.as_fd(), diagnostic);
        let _ = write(stderr.as_fd(), errno.desc().as_bytes());
        let _ = write(stderr.as_fd(), b"\n");
        // SAFETY: `_exit` is async-signal-safe and skips the parent's atexit
        // handlers and buffered stdio, which the child must not run.
        unsafe { nix::libc::_exit(EXEC_FAILURE) }
    }

    fn wait_for(child: Pid) -> Result<ExitCode, LaunchError> {
        loop {
            match waitpid(child, None) {
                Ok(WaitStatus::Exited(_, code)) => {
                    debug!("pid {} exited with {}", child, code);
                    return Ok(code);
                }
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    debug!("pid {} killed by {:?}", child, signal);
                    return Ok(SIGNALED_STATUS);
                }
                Ok(status) => debug!("pid {} still running: {:?}", child, status),
                Err(Errno::EINTR) => warn!("waitpid for {} interrupted, retrying", child),
                Err(errno) => return Err(LaunchError::Wait(errno)),
            }
        }
    }
}

/// Runs programs through [`std::process::Command`].
///
/// Usable on platforms without `fork`; the program is resolved with
/// [`find_command_path`] before spawning.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnLauncher;

impl Launcher for SpawnLauncher {
    fn launch(&self, argv: &[String]) -> Result<ExitCode, LaunchError> {
        let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;
        let search_paths = env::var("PATH").unwrap_or_default();
        let executable = find_command_path(OsStr::new(&search_paths), Path::new(program))
            .ok_or_else(|| LaunchError::NotFound(program.clone()))?;

        let _ = io::stdout().flush();
        let mut child = std::process::Command::new(executable.as_ref())
            .args(args)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.clone(),
                source,
            })?;
        debug!("started {} as pid {}", program, child.id());

        let exit_status = child.wait().map_err(LaunchError::WaitChild)?;
        Ok(exit_status.code().unwrap_or(SIGNALED_STATUS))
    }
}

/// Resolves the program named by `argv[0]` to a file to spawn.
///
/// - A name with a separator (`/bin/ls`, `bin/ls`, `./ls`) is used as given
///   and must exist.
/// - A bare name is looked up in each directory of `search_paths`, first
///   match wins. On non-Unix platforms the current directory is tried first.
/// - An empty name resolves to nothing.
pub fn find_command_path<'a>(search_paths: &OsStr, program: &'a Path) -> Option<Cow<'a, Path>> {
    let mut components = program.components();
    let bare = match (components.next(), components.next()) {
        (None, _) => return None,
        (Some(Component::Normal(name)), None) => name,
        _ => return program.exists().then_some(Cow::Borrowed(program)),
    };

    if cfg!(not(unix)) && program.is_file() {
        return Some(Cow::Borrowed(program));
    }
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(bare))
        .find(|candidate| candidate.is_file())
        .map(Cow::Owned)
}
