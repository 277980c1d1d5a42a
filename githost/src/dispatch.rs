//! Command dispatch: parse, resolve, exec.
//!
//! Three stages, all fail-closed. PARSE tokenizes the ssh command
//! string; RESOLVE maps the verb through a fixed table and validates
//! its repository path; EXEC replaces this process with the matching
//! git program. Exec is terminal: it returns only on failure, and
//! nothing here ever runs a command the resolver did not produce.

use githost_common::{AccessMode, Config, PathError, RepositoryPath, TokenizeError, tokenize};
use std::fs;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, error, info};

/// Exit status for a verb outside the table, per shell convention.
pub const EXIT_UNKNOWN_COMMAND: u8 = 127;

/// Errors terminating a dispatch. Every variant is fatal; nothing is
/// retried or partially executed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    /// The first token names no permitted action.
    #[error("invalid command '{verb}'")]
    UnknownCommand { verb: String },

    /// Wrong argument shape for an otherwise valid verb.
    #[error("usage: {verb} <repository>")]
    WrongArguments { verb: &'static str },

    #[error(transparent)]
    Path(#[from] PathError),

    /// The exec call itself failed; the process image was not replaced.
    #[error("exec {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A `dir` target could not be read.
    #[error("list {directory}: {source}")]
    List {
        directory: String,
        #[source]
        source: std::io::Error,
    },

    /// One or more `dir` arguments failed to validate or list.
    #[error("{failures} of {total} directory arguments failed")]
    ListFailures { failures: usize, total: usize },
}

impl DispatchError {
    /// Process exit status for this failure.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::UnknownCommand { .. } => EXIT_UNKNOWN_COMMAND,
            _ => 1,
        }
    }
}

/// The fixed set of permitted actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    /// `new` / `init`: create a bare repository.
    Create,
    /// `git-receive-pack`: push.
    ReceivePack,
    /// `git-upload-pack`: fetch.
    UploadPack,
    /// `git-upload-archive`: archive fetch.
    UploadArchive,
    /// `dir`: enumerate repository directories.
    List,
}

impl Verb {
    fn lookup(token: &str) -> Option<Self> {
        match token {
            "new" | "init" => Some(Self::Create),
            "git-receive-pack" => Some(Self::ReceivePack),
            "git-upload-pack" => Some(Self::UploadPack),
            "git-upload-archive" => Some(Self::UploadArchive),
            "dir" => Some(Self::List),
            _ => None,
        }
    }

    /// Canonical program/usage name for this verb.
    fn name(&self) -> &'static str {
        match self {
            Self::Create => "git-init",
            Self::ReceivePack => "git-receive-pack",
            Self::UploadPack => "git-upload-pack",
            Self::UploadArchive => "git-upload-archive",
            Self::List => "dir",
        }
    }

    fn mode(&self) -> AccessMode {
        match self {
            Self::Create | Self::ReceivePack => AccessMode::Write,
            Self::UploadPack | Self::UploadArchive | Self::List => AccessMode::Read,
        }
    }
}

/// Dispatch one ssh command string.
///
/// `authorized_by` is the identity sshd forwarded into the session
/// environment, if any. On success for exec-class verbs this function
/// does not return; an `Ok(())` comes back only from `dir`.
pub fn run(
    config: &Config,
    command: &str,
    authorized_by: Option<&str>,
) -> Result<(), DispatchError> {
    let arguments = tokenize(command)?;
    let verb = Verb::lookup(&arguments[0]).ok_or_else(|| DispatchError::UnknownCommand {
        verb: arguments[0].clone(),
    })?;
    debug!(verb = verb.name(), args = arguments.len() - 1, "dispatching");

    match verb {
        Verb::List => list_directories(config, &arguments[1..], authorized_by),
        _ => {
            let [_, repository] = arguments.as_slice() else {
                return Err(DispatchError::WrongArguments { verb: verb.name() });
            };
            let path = RepositoryPath::resolve(repository, verb.mode(), authorized_by)?;
            let location = path.join_under(&config.repositories_root);
            info!(
                verb = verb.name(),
                repository = path.as_str(),
                "resolved repository path"
            );

            // Validate-then-exec with nothing in between: the resolved
            // location goes straight into the program's argument vector.
            let program_dir = config.effective_git_exec_path();
            match verb {
                Verb::Create => exec_git(
                    &program_dir,
                    "git-init",
                    &["--quiet", "--bare", "--"],
                    &location,
                ),
                _ => exec_git(&program_dir, verb.name(), &[], &location),
            }
        }
    }
}

/// Replace this process with a git program. Never returns on success.
fn exec_git(
    program_dir: &Path,
    program: &str,
    options: &[&str],
    repository: &Path,
) -> Result<(), DispatchError> {
    let path = program_dir.join(program);
    let source = Command::new(&path)
        .args(options)
        .arg(repository)
        .exec();

    // exec only comes back when the image replacement failed.
    Err(DispatchError::Exec {
        program: path.display().to_string(),
        source,
    })
}

/// `dir`: list repository directory entries.
///
/// With no arguments, every non-hidden owner directory under the root
/// is listed. Each argument validates and lists independently; a bad
/// argument is reported and skipped, and the overall dispatch fails
/// only after every argument had its chance.
fn list_directories(
    config: &Config,
    arguments: &[String],
    authorized_by: Option<&str>,
) -> Result<(), DispatchError> {
    let root = &config.repositories_root;

    if arguments.is_empty() {
        let mut owners = read_visible_entries(root).map_err(|source| DispatchError::List {
            directory: root.display().to_string(),
            source,
        })?;
        owners.sort();
        for owner in owners {
            // Top-level entries are owner directories, listed wholesale.
            if let Ok(mut repositories) = read_visible_entries(&root.join(&owner)) {
                repositories.sort();
                print_listing(&owner, &repositories);
            }
        }
        return Ok(());
    }

    let mut failures = 0;
    for argument in arguments {
        match list_one(root, argument, authorized_by) {
            Ok(()) => {}
            Err(err) => {
                error!(argument = %argument, error = %err, "directory listing failed");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(DispatchError::ListFailures {
            failures,
            total: arguments.len(),
        });
    }
    Ok(())
}

fn list_one(
    root: &Path,
    argument: &str,
    authorized_by: Option<&str>,
) -> Result<(), DispatchError> {
    let path = RepositoryPath::resolve(argument, AccessMode::Read, authorized_by)?;
    let mut entries = read_visible_entries(&path.join_under(root)).map_err(|source| {
        DispatchError::List {
            directory: path.as_str().to_string(),
            source,
        }
    })?;
    entries.sort();
    print_listing(path.as_str(), &entries);
    Ok(())
}

/// Non-hidden entry names of a directory.
fn read_visible_entries(directory: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(directory)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    Ok(names)
}

fn print_listing(directory: &str, entries: &[String]) {
    println!("{directory}:");
    for entry in entries {
        println!("\t{directory}/{entry}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use githost_common::Config;
    use std::fs;
    use tempfile::TempDir;

    fn test_config(root: &TempDir) -> Config {
        let mut config = Config::default();
        config.repositories_root = root.path().to_path_buf();
        config
    }

    #[test]
    fn unknown_verb_is_rejected_with_127() {
        let root = TempDir::new().unwrap();
        let err = run(&test_config(&root), "rm -rf /", None).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand { ref verb } if verb == "rm"));
        assert_eq!(err.exit_status(), EXIT_UNKNOWN_COMMAND);
    }

    #[test]
    fn empty_command_is_rejected() {
        let root = TempDir::new().unwrap();
        let err = run(&test_config(&root), "   ", None).unwrap_err();
        assert!(matches!(err, DispatchError::Tokenize(TokenizeError::EmptyCommand)));
        assert_eq!(err.exit_status(), 1);
    }

    #[test]
    fn unclosed_quote_is_rejected() {
        let root = TempDir::new().unwrap();
        let err = run(&test_config(&root), "git-upload-pack 'alice/repo", None).unwrap_err();
        assert!(matches!(err, DispatchError::Tokenize(TokenizeError::UnclosedQuote)));
    }

    #[test]
    fn create_without_identity_is_rejected_before_exec() {
        let root = TempDir::new().unwrap();
        let err = run(&test_config(&root), "new alice/repo1", None).unwrap_err();
        assert!(matches!(err, DispatchError::Path(PathError::MissingAuthorization)));
    }

    #[test]
    fn create_with_mismatched_identity_is_rejected_before_exec() {
        let root = TempDir::new().unwrap();
        let err = run(&test_config(&root), "new alice/repo1", Some("bob")).unwrap_err();
        assert!(matches!(err, DispatchError::Path(PathError::OwnerMismatch { .. })));
    }

    #[test]
    fn push_path_arguments_are_required() {
        let root = TempDir::new().unwrap();
        let err = run(&test_config(&root), "git-receive-pack", Some("alice")).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::WrongArguments { verb: "git-receive-pack" }
        ));

        let err = run(&test_config(&root), "git-receive-pack a/b c/d", Some("alice")).unwrap_err();
        assert!(matches!(err, DispatchError::WrongArguments { .. }));
    }

    #[test]
    fn traversal_in_a_fetch_path_is_rejected() {
        let root = TempDir::new().unwrap();
        let err = run(&test_config(&root), "git-upload-pack ../../etc/passwd", None).unwrap_err();
        assert!(matches!(err, DispatchError::Path(PathError::AscendsPastRoot { .. })));
    }

    #[test]
    fn dir_lists_valid_arguments_and_reports_invalid_ones() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("alice/repo1/refs")).unwrap();

        // The valid argument lists; the traversal argument fails; the
        // overall dispatch reports one failure out of two.
        let err = run(&test_config(&root), "dir alice/repo1 ../escape/x", None).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::ListFailures { failures: 1, total: 2 }
        ));
    }

    #[test]
    fn dir_with_valid_arguments_succeeds() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("alice/repo1/refs")).unwrap();
        fs::create_dir_all(root.path().join("bob/repo2/refs")).unwrap();

        run(&test_config(&root), "dir alice/repo1 bob/repo2", None).unwrap();
    }

    #[test]
    fn dir_without_arguments_enumerates_the_root() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("alice/repo1")).unwrap();
        fs::create_dir_all(root.path().join(".hidden/repo")).unwrap();

        run(&test_config(&root), "dir", None).unwrap();
    }

    #[test]
    fn exec_failure_reports_the_program() {
        let root = TempDir::new().unwrap();
        let mut config = test_config(&root);
        config.git_exec_path = root.path().join("no-such-dir");
        fs::create_dir_all(root.path().join("alice/repo1")).unwrap();

        // GIT_EXEC_PATH may leak in from the environment; the fallback
        // only applies when it is unset, so resolve explicitly here.
        let program_dir = config.git_exec_path.clone();
        let err = exec_git(
            &program_dir,
            "git-upload-pack",
            &[],
            &root.path().join("alice/repo1"),
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::Exec { .. }));
        assert_eq!(err.exit_status(), 1);
    }
}
