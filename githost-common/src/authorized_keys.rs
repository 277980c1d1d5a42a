//! Single-line authorized_keys matching.
//!
//! Each line of a user's key list is an optional comma-separated option
//! clause followed by a key type and the key material. The scan only
//! ever needs a yes/no per line, so the parser produces a verdict rather
//! than a parsed entry: [`LineVerdict::Match`] when type and material
//! both equal the presented key, [`LineVerdict::NoMatch`] for comments
//! and non-matching entries, and [`LineVerdict::Malformed`] for a
//! structurally broken option clause. Callers treat `Malformed` as a
//! skip; one bad entry never blocks the rest of a file.

/// Verdict for one authorized_keys line against a presented key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineVerdict {
    /// Key type and material both match.
    Match,
    /// Comment, blank line, or an entry for some other key.
    NoMatch,
    /// The option clause is structurally broken; skip the line.
    Malformed,
}

/// The three shapes an authorized_keys option can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionKind {
    /// Bare keyword, no argument.
    Simple,
    /// Keyword optionally prefixed with `no-`, no argument.
    AllowNo,
    /// `keyword="value"` with backslash-escaped quotes in the value.
    WithArgs,
}

/// Options sshd recognizes, per sshd(8) AUTHORIZED_KEYS FILE FORMAT.
const OPTIONS: &[(&str, OptionKind)] = &[
    ("restrict", OptionKind::Simple),
    ("cert-authority", OptionKind::Simple),
    ("port-forwarding", OptionKind::AllowNo),
    ("agent-forwarding", OptionKind::AllowNo),
    ("x11-forwarding", OptionKind::AllowNo),
    ("touch-required", OptionKind::AllowNo),
    ("verify-required", OptionKind::AllowNo),
    ("pty", OptionKind::AllowNo),
    ("user-rc", OptionKind::AllowNo),
    ("command", OptionKind::WithArgs),
    ("principals", OptionKind::WithArgs),
    ("from", OptionKind::WithArgs),
    ("expiry-time", OptionKind::WithArgs),
    ("environment", OptionKind::WithArgs),
    ("permitopen", OptionKind::WithArgs),
    ("permitlisten", OptionKind::WithArgs),
    ("tunnel", OptionKind::WithArgs),
];

/// Outcome of scanning the leading option clause.
enum Clause<'a> {
    /// No option syntax at the start of the line; the whole line is the
    /// type and key fields.
    Absent,
    /// Clause consumed; the rest of the line follows.
    Parsed(&'a str),
    /// Structurally broken clause.
    Malformed,
}

/// Case-insensitive ASCII prefix test, returning the remainder on match.
fn strip_prefix_ignore_case<'a>(entry: &'a str, prefix: &str) -> Option<&'a str> {
    let n = prefix.len();
    if entry.len() >= n && entry.as_bytes()[..n].eq_ignore_ascii_case(prefix.as_bytes()) {
        Some(&entry[n..])
    } else {
        None
    }
}

/// Consume one `keyword="value"` argument, quotes included.
///
/// `rest` starts just after the keyword. Returns the remainder after the
/// closing quote, or `None` when the `="` syntax is missing or the value
/// is unterminated.
fn consume_quoted_argument(rest: &str) -> Option<&str> {
    let rest = rest.strip_prefix("=\"")?;
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] != b'"' {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'"') {
            i += 1;
        }
        i += 1;
    }
    if i == bytes.len() {
        return None;
    }
    Some(&rest[i + 1..])
}

/// Try to match one option token at the start of `entry`.
///
/// `Ok(Some(rest))` on a consumed option, `Ok(None)` when no option
/// keyword matches here, `Err(())` when a matched with-args option has
/// broken `="..."` syntax.
fn consume_option(entry: &str) -> Result<Option<&str>, ()> {
    for (name, kind) in OPTIONS {
        match kind {
            OptionKind::Simple => {
                if let Some(rest) = strip_prefix_ignore_case(entry, name) {
                    return Ok(Some(rest));
                }
            }
            OptionKind::AllowNo => {
                let after_no = strip_prefix_ignore_case(entry, "no-").unwrap_or(entry);
                if let Some(rest) = strip_prefix_ignore_case(after_no, name) {
                    return Ok(Some(rest));
                }
            }
            OptionKind::WithArgs => {
                if let Some(rest) = strip_prefix_ignore_case(entry, name) {
                    match consume_quoted_argument(rest) {
                        Some(rest) => return Ok(Some(rest)),
                        None => return Err(()),
                    }
                }
            }
        }
    }
    Ok(None)
}

/// Scan the comma-separated option clause at the start of a line.
fn skip_option_clause(entry: &str) -> Clause<'_> {
    let mut rest = entry;
    let mut consumed_any = false;

    loop {
        rest = match consume_option(rest) {
            Err(()) => return Clause::Malformed,
            Ok(None) if !consumed_any => return Clause::Absent,
            Ok(None) => return Clause::Malformed,
            Ok(Some(rest)) => rest,
        };
        consumed_any = true;

        match rest.as_bytes().first() {
            None | Some(b' ') | Some(b'\t') => return Clause::Parsed(rest),
            Some(b',') => {
                rest = &rest[1..];
                if rest.is_empty() {
                    return Clause::Malformed;
                }
            }
            // Leftover text glued to an option token, e.g. "restrictx".
            Some(_) => return Clause::Malformed,
        }
    }
}

fn skip_blanks(s: &str) -> &str {
    s.trim_start_matches([' ', '\t'])
}

/// Match `field` at the start of `entry`, requiring a field boundary after.
///
/// The key material may end the line; the key type must be followed by
/// whitespace (the material field is still to come).
fn field_matches<'a>(entry: &'a str, field: &str, allow_eol: bool) -> Option<&'a str> {
    let rest = entry.strip_prefix(field)?;
    match rest.as_bytes().first() {
        None => allow_eol.then_some(rest),
        Some(b' ') | Some(b'\t') => Some(rest),
        Some(_) => None,
    }
}

/// Decide whether one authorized_keys line authorizes the presented key.
///
/// `line` carries no trailing newline. A mismatched type or material is
/// [`LineVerdict::NoMatch`], never fatal; only a broken option clause is
/// [`LineVerdict::Malformed`].
pub fn match_line(line: &str, key_type: &str, key_material: &str) -> LineVerdict {
    if line.is_empty() || line.starts_with('#') {
        return LineVerdict::NoMatch;
    }

    let fields = match skip_option_clause(line) {
        Clause::Absent => line,
        Clause::Parsed(rest) => rest,
        Clause::Malformed => return LineVerdict::Malformed,
    };

    let fields = skip_blanks(fields);
    let Some(rest) = field_matches(fields, key_type, false) else {
        return LineVerdict::NoMatch;
    };

    let rest = skip_blanks(rest);
    if field_matches(rest, key_material, true).is_none() {
        return LineVerdict::NoMatch;
    }

    LineVerdict::Match
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPE: &str = "ssh-rsa";
    const KEY: &str = "AAAAB3NzaC1yc2EAAAADAQAB";

    #[test]
    fn bare_entry_matches() {
        assert_eq!(
            match_line("ssh-rsa AAAAB3NzaC1yc2EAAAADAQAB", TYPE, KEY),
            LineVerdict::Match
        );
    }

    #[test]
    fn entry_with_comment_field_matches() {
        assert_eq!(
            match_line("ssh-rsa AAAAB3NzaC1yc2EAAAADAQAB user@host", TYPE, KEY),
            LineVerdict::Match
        );
    }

    #[test]
    fn comments_and_blanks_never_match() {
        assert_eq!(match_line("", TYPE, KEY), LineVerdict::NoMatch);
        assert_eq!(match_line("# a comment", TYPE, KEY), LineVerdict::NoMatch);
    }

    #[test]
    fn wrong_type_is_no_match() {
        assert_eq!(
            match_line("ssh-rsa AAAAB3NzaC1yc2EAAAADAQAB", "ssh-ed25519", KEY),
            LineVerdict::NoMatch
        );
    }

    #[test]
    fn wrong_material_is_no_match() {
        assert_eq!(
            match_line("ssh-rsa AAAAother", TYPE, KEY),
            LineVerdict::NoMatch
        );
    }

    #[test]
    fn material_prefix_is_not_a_match() {
        // Presented key is a strict prefix of the entry's key.
        assert_eq!(
            match_line("ssh-rsa AAAAB3NzaC1yc2EAAAADAQABextra", TYPE, KEY),
            LineVerdict::NoMatch
        );
    }

    #[test]
    fn command_option_is_skipped() {
        assert_eq!(
            match_line(r#"command="echo hi" ssh-rsa AAAA"#, "ssh-rsa", "AAAA"),
            LineVerdict::Match
        );
        assert_eq!(
            match_line(r#"command="echo hi" ssh-rsa AAAA"#, "ssh-ed25519", "AAAA"),
            LineVerdict::NoMatch
        );
    }

    #[test]
    fn option_list_is_skipped() {
        let line = r#"restrict,no-pty,command="uptime",from="*.example.net" ssh-rsa AAAA"#;
        assert_eq!(match_line(line, "ssh-rsa", "AAAA"), LineVerdict::Match);
    }

    #[test]
    fn options_match_case_insensitively() {
        let line = r#"Restrict,No-Pty ssh-rsa AAAA"#;
        assert_eq!(match_line(line, "ssh-rsa", "AAAA"), LineVerdict::Match);
    }

    #[test]
    fn escaped_quote_inside_option_value() {
        let line = r#"command="echo \"hi\"" ssh-rsa AAAA"#;
        assert_eq!(match_line(line, "ssh-rsa", "AAAA"), LineVerdict::Match);
    }

    #[test]
    fn unterminated_option_value_is_malformed() {
        assert_eq!(
            match_line(r#"command="unterminated"#, "ssh-rsa", "AAAA"),
            LineVerdict::Malformed
        );
    }

    #[test]
    fn missing_equals_on_with_args_option_is_malformed() {
        assert_eq!(
            match_line(r#"command ssh-rsa AAAA"#, "ssh-rsa", "AAAA"),
            LineVerdict::Malformed
        );
    }

    #[test]
    fn unknown_token_after_an_option_is_malformed() {
        assert_eq!(
            match_line("restrict,bogus ssh-rsa AAAA", "ssh-rsa", "AAAA"),
            LineVerdict::Malformed
        );
    }

    #[test]
    fn trailing_comma_is_malformed() {
        assert_eq!(
            match_line("restrict, ", "ssh-rsa", "AAAA"),
            LineVerdict::Malformed
        );
    }

    #[test]
    fn absent_clause_means_fields_start_the_line() {
        // "bogus" matches no option keyword at all, so the whole line is
        // treated as type/key fields and simply fails to match.
        assert_eq!(
            match_line("bogus ssh-rsa AAAA", "ssh-rsa", "AAAA"),
            LineVerdict::NoMatch
        );
    }

    #[test]
    fn leading_whitespace_before_fields_is_tolerated() {
        assert_eq!(
            match_line("restrict \t ssh-rsa AAAA", "ssh-rsa", "AAAA"),
            LineVerdict::Match
        );
    }
}
