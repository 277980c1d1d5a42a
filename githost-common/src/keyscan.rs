//! Group-scoped authorized key scan.
//!
//! Resolves a group name against the system group database, then walks
//! the group's members in list order looking for the first member whose
//! `~/.ssh/authorized_keys` (or configured equivalent) contains an entry
//! matching the presented key. A member without a readable key file
//! simply contributes no matches; only a fault in the group lookup
//! itself is an error.

use crate::authorized_keys::{LineVerdict, match_line};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable carrying the forwarded identity into the
/// dispatcher's session, via the `environment=` key option.
pub const AUTHORIZED_BY_ENV: &str = "SSH_AUTHORIZED_BY";

/// A group member eligible to authorize the presented key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub home: PathBuf,
}

/// Errors from the group-database side of the scan.
///
/// "Group absent" and "lookup fault" are distinct: operators need to
/// tell an expected miss from a broken name service.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The group name does not exist in the group database.
    #[error("no group named '{group}' in the group database")]
    GroupNotFound { group: String },

    /// The group database lookup itself failed.
    #[cfg(unix)]
    #[error("group database lookup for '{group}' failed: {source}")]
    GroupLookup {
        group: String,
        #[source]
        source: nix::errno::Errno,
    },
}

impl ScanError {
    /// Whether this is a system fault rather than an expected miss.
    pub fn is_fault(&self) -> bool {
        match self {
            Self::GroupNotFound { .. } => false,
            #[cfg(unix)]
            Self::GroupLookup { .. } => true,
        }
    }
}

/// Resolve a group to its member names, in the database's list order.
#[cfg(unix)]
pub fn group_members(group: &str) -> Result<Vec<String>, ScanError> {
    match nix::unistd::Group::from_name(group) {
        Ok(Some(gr)) => Ok(gr.mem),
        Ok(None) => Err(ScanError::GroupNotFound {
            group: group.to_string(),
        }),
        Err(source) => Err(ScanError::GroupLookup {
            group: group.to_string(),
            source,
        }),
    }
}

/// Resolve member names to candidates via the user database.
///
/// A member that cannot be resolved is logged and skipped; one stale
/// group entry must not block the rest of the scan.
#[cfg(unix)]
pub fn resolve_candidates(members: &[String]) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(members.len());
    for name in members {
        match nix::unistd::User::from_name(name) {
            Ok(Some(user)) => candidates.push(Candidate {
                name: user.name,
                home: user.dir,
            }),
            Ok(None) => debug!(user = %name, "group member absent from user database"),
            Err(err) => warn!(user = %name, error = %err, "user database lookup failed"),
        }
    }
    candidates
}

/// Scan one candidate's key list for the presented key.
///
/// Missing or unreadable files yield no matches. Malformed lines are
/// skipped, not fatal; the rest of the file is still evaluated.
fn candidate_matches(candidate: &Candidate, keys_file: &str, key_type: &str, key: &str) -> bool {
    let path = candidate.home.join(keys_file);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "no readable key list");
            return false;
        }
    };

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "key list read failed mid-file");
                return false;
            }
        };
        match match_line(&line, key_type, key) {
            LineVerdict::Match => return true,
            LineVerdict::NoMatch => {}
            LineVerdict::Malformed => {
                warn!(path = %path.display(), "skipping malformed authorized_keys entry");
            }
        }
    }

    false
}

/// Find the first candidate whose key list authorizes the presented key.
pub fn find_authorized(
    candidates: &[Candidate],
    keys_file: &str,
    key_type: &str,
    key: &str,
) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| candidate_matches(candidate, keys_file, key_type, key))
        .map(|candidate| candidate.name.clone())
}

/// Full scan: group lookup, member resolution, first matching member.
///
/// `Ok(None)` is the informational "no matching user" outcome; `Err` is
/// reserved for database faults and the absent group.
#[cfg(unix)]
pub fn authorize(
    group: &str,
    keys_file: &str,
    key_type: &str,
    key: &str,
) -> Result<Option<String>, ScanError> {
    let members = group_members(group)?;
    let candidates = resolve_candidates(&members);
    Ok(find_authorized(&candidates, keys_file, key_type, key))
}

/// The authorized-key line handed back to sshd on success.
///
/// The `environment=` option pins the authorizing identity so the later
/// session command can read it from the process environment.
pub fn authorized_key_line(user: &str, key_type: &str, key: &str) -> String {
    format!(r#"environment="{AUTHORIZED_BY_ENV}={user}" {key_type} {key}"#)
}
