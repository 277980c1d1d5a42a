//! Shared decision logic for the githost gatekeeper utilities.
//!
//! Everything security-critical lives here: the command tokenizer, the
//! repository path sandbox, the authorized_keys line matcher, and the
//! group-scoped key scan. The binaries in `githost` and `githost-keys`
//! are thin CLI shells over these modules.

pub mod authorized_keys;
pub mod command;
pub mod config;
pub mod keyscan;
pub mod logging;
pub mod repopath;
pub mod types;

pub use authorized_keys::{LineVerdict, match_line};
pub use command::{TokenizeError, tokenize};
pub use config::{Config, ConfigError};
pub use keyscan::{AUTHORIZED_BY_ENV, Candidate, ScanError, authorized_key_line};
pub use logging::{LogConfig, init_logging};
pub use repopath::{AccessMode, PathError, RepositoryPath};
pub use types::KeyType;
