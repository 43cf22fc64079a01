//! Host collaborator interface
//!
//! The terminal host owns the active macro set and creates sessions. The
//! loaders only talk to it through [`MacroStore`] and [`SessionLauncher`].
//!
//! Two hosts ship with the crate:
//!
//! - [`ProcessHost`]: launches sessions as detached child processes and keeps
//!   the active macro set in memory
//! - [`DryRunHost`]: writes a line per host call and performs nothing

use std::io::{self, Write};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::info;

use crate::macros::MacroSet;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Cannot start a session with an empty argument list")]
    EmptyCommand,

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Host rejected request: {0}")]
    Rejected(String),

    #[error("Failed to write host output: {0}")]
    Output(#[from] io::Error),
}

/// Holds the host's active macro set
pub trait MacroStore {
    /// Replace the active macro set with `set` in one step
    fn install_macros(&mut self, set: MacroSet) -> Result<(), HostError>;
}

/// Creates sessions from argument lists
pub trait SessionLauncher {
    /// Request a new session. Returns once the request is issued, not when
    /// the session ends.
    fn launch(&mut self, args: &[String]) -> Result<(), HostError>;
}

/// Macro store that keeps the active set in memory
#[derive(Debug, Default)]
pub struct MemoryMacroStore {
    current: Option<MacroSet>,
    installs: usize,
}

impl MemoryMacroStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&MacroSet> {
        self.current.as_ref()
    }

    /// Number of sets installed so far
    pub fn installs(&self) -> usize {
        self.installs
    }
}

impl MacroStore for MemoryMacroStore {
    fn install_macros(&mut self, set: MacroSet) -> Result<(), HostError> {
        info!("Installing macro set with {} macros", set.len());
        self.current = Some(set);
        self.installs += 1;
        Ok(())
    }
}

/// Launches each session as a detached child process
#[derive(Debug, Default)]
pub struct ProcessLauncher {
    launched: Vec<u32>,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process ids of sessions started so far
    pub fn launched(&self) -> &[u32] {
        &self.launched
    }
}

impl SessionLauncher for ProcessLauncher {
    fn launch(&mut self, args: &[String]) -> Result<(), HostError> {
        let (program, rest) = args.split_first().ok_or(HostError::EmptyCommand)?;

        // The child is not waited on; dropping the handle leaves it running
        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| HostError::Spawn {
                program: program.clone(),
                source,
            })?;

        info!("Started session {:?} (pid {})", args, child.id());
        self.launched.push(child.id());
        Ok(())
    }
}

/// Real host: child-process sessions and an in-memory macro set
#[derive(Debug, Default)]
pub struct ProcessHost {
    pub sessions: ProcessLauncher,
    pub macros: MemoryMacroStore,
}

impl ProcessHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MacroStore for ProcessHost {
    fn install_macros(&mut self, set: MacroSet) -> Result<(), HostError> {
        self.macros.install_macros(set)
    }
}

impl SessionLauncher for ProcessHost {
    fn launch(&mut self, args: &[String]) -> Result<(), HostError> {
        self.sessions.launch(args)
    }
}

/// Host that describes each call on a writer instead of performing it
#[derive(Debug)]
pub struct DryRunHost<W: Write> {
    out: W,
}

impl<W: Write> DryRunHost<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MacroStore for DryRunHost<W> {
    fn install_macros(&mut self, set: MacroSet) -> Result<(), HostError> {
        writeln!(self.out, "install macro set ({} macros)", set.len())?;
        for slot in set.iter() {
            writeln!(self.out, "  {:>3} {:?} = {:?}", slot.index, slot.name, slot.contents)?;
        }
        Ok(())
    }
}

impl<W: Write> SessionLauncher for DryRunHost<W> {
    fn launch(&mut self, args: &[String]) -> Result<(), HostError> {
        if args.is_empty() {
            return Err(HostError::EmptyCommand);
        }
        writeln!(self.out, "start session {:?}", args)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_replaces_set() {
        let mut store = MemoryMacroStore::new();
        assert!(store.current().is_none());

        let mut first = MacroSet::new();
        first.define(1, "Macro 1", "a");
        first.define(2, "Macro 2", "b");
        store.install_macros(first).unwrap();

        let mut second = MacroSet::new();
        second.define(5, "Macro 5", "c");
        store.install_macros(second.clone()).unwrap();

        assert_eq!(store.current(), Some(&second));
        assert_eq!(store.installs(), 2);
    }

    #[test]
    fn test_process_launcher_empty_args() {
        let mut launcher = ProcessLauncher::new();
        assert!(matches!(launcher.launch(&[]), Err(HostError::EmptyCommand)));
        assert!(launcher.launched().is_empty());
    }

    #[test]
    fn test_process_launcher_missing_program() {
        let mut launcher = ProcessLauncher::new();
        let args = vec!["/nonexistent/termfiles-test-program".to_string()];
        match launcher.launch(&args) {
            Err(HostError::Spawn { program, .. }) => assert_eq!(program, args[0]),
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[test]
    fn test_dry_run_output() {
        let mut host = DryRunHost::new(Vec::new());
        let mut set = MacroSet::new();
        set.define(1, "Macro 1", "ls");
        host.install_macros(set).unwrap();
        host.launch(&["ls".to_string(), "-la".to_string()]).unwrap();

        let text = String::from_utf8(host.into_inner()).unwrap();
        assert!(text.contains("install macro set (1 macros)"));
        assert!(text.contains("\"Macro 1\" = \"ls\""));
        assert!(text.contains("start session [\"ls\", \"-la\"]"));
    }
}
