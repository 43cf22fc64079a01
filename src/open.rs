//! Routines to open the file types the host understands
//!
//! - `.macros`: replace the active macro set from a key-value file
//! - `.session`: start a session described by a key-value file
//! - anything else: run the file itself as a session

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{OpenError, Result};
use crate::host::{MacroStore, SessionLauncher};
use crate::kvp::{Grammar, KeyValueMap, ParseError, Parser};
use crate::macros::{build_macro_set, has_macro_keys, KeyPolicy, MacroNaming, MacroSet};

/// Key that holds the command line of a session file
pub const COMMAND_KEY: &str = "command";

/// File types recognized by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Macros,
    Session,
    Script,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("macros") => FileKind::Macros,
            Some(ext) if ext.eq_ignore_ascii_case("session") => FileKind::Session,
            _ => FileKind::Script,
        }
    }
}

/// Parsed contents of a `.session` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    /// Argument list for the new session
    pub command: Vec<String>,
    /// Keys not applied to the host (title, terminal size, ...)
    pub reserved: Vec<(String, String)>,
}

impl SessionDescriptor {
    /// Extract the command from parsed pairs. `None` when there is no
    /// `command` key or it holds no words.
    pub fn from_map(defs: &KeyValueMap) -> Option<Self> {
        let command: Vec<String> = defs
            .get(COMMAND_KEY)?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if command.is_empty() {
            return None;
        }
        let reserved = defs
            .iter()
            .filter(|(k, _)| *k != COMMAND_KEY)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some(Self { command, reserved })
    }
}

/// What a single open did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    Macros(MacroSet),
    Script(PathBuf),
    Session(SessionDescriptor),
}

/// Opens macro, script and session files against a host
#[derive(Debug, Clone, Default)]
pub struct FileOpener {
    parser: Parser,
    policy: KeyPolicy,
    naming: MacroNaming,
}

impl FileOpener {
    pub fn new(grammar: Grammar, policy: KeyPolicy, naming: MacroNaming) -> Self {
        Self {
            parser: Parser::new(grammar),
            policy,
            naming,
        }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// Dispatch on the file extension
    pub fn open<H>(&self, path: &Path, host: &mut H) -> Result<Opened>
    where
        H: MacroStore + SessionLauncher,
    {
        match FileKind::from_path(path) {
            FileKind::Macros => self.load_macros(path, host).map(Opened::Macros),
            FileKind::Session => self.load_session(path, host).map(Opened::Session),
            FileKind::Script => {
                self.load_script(path, host)?;
                Ok(Opened::Script(path.to_path_buf()))
            }
        }
    }

    /// Replace the host's macro set with the macros defined in `path`.
    ///
    /// The set is built completely before it is installed, so a failure at
    /// any key leaves the host's current set untouched.
    pub fn load_macros<S: MacroStore + ?Sized>(&self, path: &Path, store: &mut S) -> Result<MacroSet> {
        let defs = self.parse(path)?;
        if !has_macro_keys(&defs) {
            return Err(OpenError::NoMacrosFound(path.to_path_buf()));
        }
        let set = build_macro_set(&defs, self.policy, &self.naming)?;
        if set.is_empty() {
            return Err(OpenError::NoMacrosFound(path.to_path_buf()));
        }
        info!("Loaded {} macros from {}", set.len(), path.display());
        store.install_macros(set.clone())?;
        Ok(set)
    }

    /// Run `path` itself as the only argument of a new session
    pub fn load_script<L: SessionLauncher + ?Sized>(&self, path: &Path, launcher: &mut L) -> Result<()> {
        let args = vec![path.to_string_lossy().into_owned()];
        debug!("Starting script session {}", path.display());
        launcher.launch(&args)?;
        Ok(())
    }

    /// Start the session described by `path`
    pub fn load_session<L: SessionLauncher + ?Sized>(
        &self,
        path: &Path,
        launcher: &mut L,
    ) -> Result<SessionDescriptor> {
        let defs = self.parse(path)?;
        let descriptor = SessionDescriptor::from_map(&defs)
            .ok_or_else(|| OpenError::MissingCommand(path.to_path_buf()))?;
        for (key, _) in &descriptor.reserved {
            debug!("Ignoring session setting {:?} in {}", key, path.display());
        }
        launcher.launch(&descriptor.command)?;
        Ok(descriptor)
    }

    fn parse(&self, path: &Path) -> Result<KeyValueMap> {
        self.parser.parse_file(path).map_err(|e| match e {
            ParseError::Io(source) => OpenError::Io {
                path: path.to_path_buf(),
                source,
            },
            ParseError::Format(e) => OpenError::Format(e),
        })
    }
}
