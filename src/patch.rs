//! Replaying an edit script against a base sequence.

use thiserror::Error;

use crate::script::Command;
use crate::script::Script;
use crate::script::ScriptError;

/// A script that cannot be applied to the given base.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The script text fails the wire grammar.
    #[error(transparent)]
    Malformed(#[from] ScriptError),
    /// A command addresses lines outside the current working copy.
    #[error("command {header:?} addresses lines outside the working copy of {len} lines")]
    OutOfRange { header: String, len: usize },
    /// The command list is not strictly descending by start line.
    #[error("command {header:?} does not descend; commands must address strictly decreasing lines")]
    OrderingViolation { header: String },
}

/// Apply `script` to `base`, producing the patched line sequence.
///
/// The commands must be in strictly descending start-line order. That
/// order is the precondition that lets a single working copy absorb
/// every command without renumbering: each command only touches lines
/// at or above everything still pending. It is checked up front, so a
/// misordered script is rejected before anything is mutated.
///
/// Ranges are bounds-checked against the working copy as it stands
/// when each command runs, and a violation aborts with
/// [`PatchError::OutOfRange`].
pub fn apply<'a>(base: &[&'a str], script: &Script<'a>) -> Result<Vec<&'a str>, PatchError> {
    let mut previous: Option<usize> = None;
    for command in &script.commands {
        let start = command.start_line();
        if let Some(previous) = previous {
            if start >= previous {
                return Err(PatchError::OrderingViolation {
                    header: header_of(command),
                });
            }
        }
        previous = Some(start);
    }

    let mut working: Vec<&'a str> = base.to_vec();
    for command in &script.commands {
        match command {
            Command::Delete { start, end } => {
                check_range(*start, *end, working.len(), command)?;
                working.drain(*start - 1..*end);
            }
            Command::Change { start, end, lines } => {
                check_range(*start, *end, working.len(), command)?;
                working.splice(*start - 1..*end, lines.iter().copied());
            }
            Command::Append { after, lines } => {
                if *after > working.len() {
                    return Err(PatchError::OutOfRange {
                        header: header_of(command),
                        len: working.len(),
                    });
                }
                working.splice(*after..*after, lines.iter().copied());
            }
        }
    }
    return Ok(working);
}

/// An inclusive 1-based range is applicable when it lies inside the
/// working copy. A backward range can only come from a hand-built
/// command (the parser rejects them); it addresses nothing valid, so
/// it is out of range too.
fn check_range(
    start: usize,
    end: usize,
    len: usize,
    command: &Command<'_>,
) -> Result<(), PatchError> {
    if start >= 1 && start <= end && end <= len {
        return Ok(());
    }
    return Err(PatchError::OutOfRange {
        header: header_of(command),
        len,
    });
}

fn header_of(command: &Command<'_>) -> String {
    return command
        .to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_text(base: &[&str], text: &str) -> Result<Vec<String>, PatchError> {
        let script = Script::parse(text)?;
        let patched = apply(base, &script)?;
        return Ok(patched.iter().map(|line| line.to_string()).collect());
    }

    #[test]
    fn empty_script_is_identity() {
        let base = vec!["a", "b", "c"];
        assert_eq!(apply_text(&base, "").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn delete_removes_inclusive_range() {
        let base = vec!["a", "b", "c", "d"];
        assert_eq!(apply_text(&base, "2,3d").unwrap(), vec!["a", "d"]);
        assert_eq!(apply_text(&base, "4d").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn change_replaces_range_with_block() {
        let base = vec!["a", "b", "c", "d"];
        assert_eq!(
            apply_text(&base, "2,3c\nx\n.").unwrap(),
            vec!["a", "x", "d"],
        );
        assert_eq!(
            apply_text(&base, "1c\nx\ny\n.").unwrap(),
            vec!["x", "y", "b", "c", "d"],
        );
    }

    #[test]
    fn append_inserts_after_line() {
        let base = vec!["a", "b"];
        assert_eq!(apply_text(&base, "1a\nx\n.").unwrap(), vec!["a", "x", "b"]);
        assert_eq!(apply_text(&base, "2a\nx\n.").unwrap(), vec!["a", "b", "x"]);
    }

    #[test]
    fn append_after_zero_prepends() {
        let base = vec!["a"];
        assert_eq!(apply_text(&base, "0a\nx\n.").unwrap(), vec!["x", "a"]);
    }

    #[test]
    fn commands_address_the_original_numbering() {
        // The second command's line numbers are unaffected by the
        // first command's deletion above it.
        let base = vec!["a", "b", "c", "d", "e"];
        assert_eq!(
            apply_text(&base, "4,5d\n2c\nx\n.").unwrap(),
            vec!["a", "x", "c"],
        );
    }

    #[test]
    fn rejects_out_of_range_commands() {
        let base = vec!["a", "b"];
        assert!(matches!(
            apply_text(&base, "3d"),
            Err(PatchError::OutOfRange { len: 2, .. }),
        ));
        assert!(matches!(
            apply_text(&base, "1,3d"),
            Err(PatchError::OutOfRange { len: 2, .. }),
        ));
        assert!(matches!(
            apply_text(&base, "0d"),
            Err(PatchError::OutOfRange { len: 2, .. }),
        ));
        assert!(matches!(
            apply_text(&base, "3a\nx\n."),
            Err(PatchError::OutOfRange { len: 2, .. }),
        ));
    }

    #[test]
    fn range_checks_track_the_mutated_copy() {
        // "2d" is valid against the original three lines, but the
        // preceding delete shrank the copy to two.
        let base = vec!["a", "b", "c"];
        assert!(matches!(
            apply_text(&base, "3d\n2,3d"),
            Err(PatchError::OutOfRange { len: 2, .. }),
        ));
    }

    #[test]
    fn rejects_misordered_scripts() {
        let base = vec!["a", "b", "c"];
        assert!(matches!(
            apply_text(&base, "1d\n3d"),
            Err(PatchError::OrderingViolation { .. }),
        ));
        // Equal start lines are a violation too.
        assert!(matches!(
            apply_text(&base, "2d\n2d"),
            Err(PatchError::OrderingViolation { .. }),
        ));
    }

    #[test]
    fn rejects_backward_hand_built_range() {
        let script = Script {
            commands: vec![Command::Delete { start: 3, end: 1 }],
        };
        let base = vec!["a", "b", "c"];
        assert!(matches!(
            apply(&base, &script),
            Err(PatchError::OutOfRange { .. }),
        ));
    }

    #[test]
    fn malformed_script_surfaces_parse_error() {
        let base = vec!["a"];
        assert!(matches!(
            apply_text(&base, "1c\nx"),
            Err(PatchError::Malformed(ScriptError::MissingTerminator { line: 1 })),
        ));
    }
}
