//! Repository path normalization and sandbox validation.
//!
//! Every path argument a client sends crosses the trust boundary here.
//! Normalization is a pure function over an explicit component sequence;
//! validation then enforces the sandbox shape: exactly one owner
//! directory and one repository directory below the configured root,
//! nothing hidden, and write access only into the authorized owner's
//! directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Access class of the verb asking for the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Fetch-class verbs; no owner check.
    Read,
    /// Create/push-class verbs; owner must equal the forwarded identity.
    Write,
}

/// Errors from [`normalize`] and [`RepositoryPath::resolve`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Empty input, or a path that resolved to nothing (`a/..`).
    #[error("invalid repository path: empty after normalization")]
    Empty,

    /// A `..` component would climb above the repository root.
    #[error("invalid repository path '{raw}': escapes the repository root")]
    AscendsPastRoot { raw: String },

    /// Not of the form `<owner>/<repository>`.
    #[error("invalid repository path '{path}': expected <owner>/<repository>")]
    NotOwnerScoped { path: String },

    /// A component starts with `.`; hidden entries are never repositories.
    #[error("invalid repository path '{path}': hidden component")]
    HiddenComponent { path: String },

    /// A write-class verb ran without a forwarded identity.
    #[error("missing authorization for write access")]
    MissingAuthorization,

    /// The owner component does not match the forwarded identity.
    #[error("not authorized to write to '{owner}'")]
    OwnerMismatch { owner: String },
}

/// Normalize a slash-separated path.
///
/// Redundant separators and `.` components are dropped; `..` pops the
/// preceding component. A `..` with nothing left to pop fails rather
/// than clamping: a request that tries to climb out of the sandbox is
/// rejected outright, not quietly retargeted at the root.
pub fn normalize(raw: &str) -> Result<String, PathError> {
    let mut components: Vec<&str> = Vec::new();

    for component in raw.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(PathError::AscendsPastRoot {
                        raw: raw.to_string(),
                    });
                }
            }
            name => components.push(name),
        }
    }

    if components.is_empty() {
        return Err(PathError::Empty);
    }

    Ok(components.join("/"))
}

/// A validated repository location, `<owner>/<repository>` under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPath {
    normalized: String,
    split: usize,
}

impl RepositoryPath {
    /// Normalize and validate `raw` for the given access mode.
    ///
    /// `authorized_by` is the forwarded identity from the ssh layer; it
    /// is required for [`AccessMode::Write`] and must equal the owner
    /// component byte-for-byte. Read access ignores it.
    pub fn resolve(
        raw: &str,
        mode: AccessMode,
        authorized_by: Option<&str>,
    ) -> Result<Self, PathError> {
        let normalized = normalize(raw)?;

        // Exactly one level of nesting: <owner>/<repository>.
        let Some(split) = normalized.find('/') else {
            return Err(PathError::NotOwnerScoped { path: normalized });
        };
        let (owner, repository) = (&normalized[..split], &normalized[split + 1..]);
        if repository.contains('/') {
            return Err(PathError::NotOwnerScoped { path: normalized });
        }
        if owner.starts_with('.') || repository.starts_with('.') {
            return Err(PathError::HiddenComponent { path: normalized });
        }

        if mode == AccessMode::Write {
            let authorized = authorized_by.ok_or(PathError::MissingAuthorization)?;
            if authorized.is_empty() {
                return Err(PathError::MissingAuthorization);
            }
            if owner != authorized {
                return Err(PathError::OwnerMismatch {
                    owner: owner.to_string(),
                });
            }
        }

        Ok(Self { normalized, split })
    }

    /// The normalized `<owner>/<repository>` form.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// The owner component.
    pub fn owner(&self) -> &str {
        &self.normalized[..self.split]
    }

    /// The repository component.
    pub fn repository(&self) -> &str {
        &self.normalized[self.split + 1..]
    }

    /// The final filesystem location under the repository root.
    pub fn join_under(&self, root: &Path) -> PathBuf {
        root.join(&self.normalized)
    }
}
