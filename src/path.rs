use anyhow::{Context, Result};
use std::env;

/// Owned string form of a filesystem location.
///
/// Only used to re-derive the working directory string after `cd`; the raw and
/// pretty forms are currently the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingPath {
    raw: String,
}

impl WorkingPath {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Captures the absolute current working directory.
    pub fn from_cwd() -> Result<Self> {
        Ok(Self::new(current_dir_string()?))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn pretty(&self) -> &str {
        &self.raw
    }

    pub fn set(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    /// Replaces the stored string with the current working directory.
    pub fn update_cwd(&mut self) -> Result<()> {
        self.raw = current_dir_string()?;
        Ok(())
    }
}

fn current_dir_string() -> Result<String> {
    let cwd = env::current_dir().context("can't get current directory")?;
    Ok(cwd.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_and_pretty_match() {
        let path = WorkingPath::new("/usr/local");
        assert_eq!(path.raw(), "/usr/local");
        assert_eq!(path.pretty(), path.raw());
    }

    #[test]
    fn test_set_replaces_contents() {
        let mut path = WorkingPath::new("/");
        path.set("/var/tmp");
        assert_eq!(path.raw(), "/var/tmp");
    }

    #[test]
    fn test_from_cwd_is_absolute() {
        let path = WorkingPath::from_cwd().unwrap();
        assert!(std::path::Path::new(path.raw()).is_absolute());

        let mut other = WorkingPath::new("/");
        other.update_cwd().unwrap();
        assert!(std::path::Path::new(other.raw()).is_absolute());
    }
}
