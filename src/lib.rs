//! termfiles - open macro, script and session files into a terminal host
//!
//! A terminal host hands files to this crate by type:
//!
//! - **`.macros`**: `key = value` pairs whose keys name macro slots
//!   (`f1`..`f12` are one-based, `m0`, `m1`, ... are zero-based). The whole
//!   set is built first and installed with a single host call.
//! - **`.session`**: `key = value` pairs; `command` is split on whitespace and
//!   started as a new session.
//! - **anything else**: run as a script session.
//!
//! # Architecture
//!
//! ```text
//! FileOpener
//! ├── kvp::Parser (pluggable line Grammar)
//! ├── macros (MacroKey decode, KeyPolicy, MacroSet)
//! └── host (MacroStore + SessionLauncher, owned by the caller)
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod kvp;
pub mod macros;
pub mod open;

pub use error::{FormatError, OpenError};
pub use host::{HostError, MacroStore, SessionLauncher};
pub use kvp::{Grammar, KeyValueMap, Parser};
pub use macros::{KeyPolicy, MacroKey, MacroNaming, MacroSet, MacroSlot};
pub use open::{FileKind, FileOpener, Opened, SessionDescriptor};
