//! Edit scripts: building them from a common subsequence and moving
//! them through the ed-style text format.
//!
//! A script is an ordered list of commands addressed against the
//! *original* base sequence, 1-based:
//!
//! ```text
//! script  := command*
//! command := header ( block )?
//! header  := range opcode           opcode := "a" | "c" | "d"
//! range   := NUMBER | NUMBER "," NUMBER
//! block   := line* "."              only after "a" and "c"
//! ```
//!
//! `Na` appends the block after line N (N = 0 prepends), `N,Mc`
//! replaces the inclusive range with the block, `N,Md` deletes it.
//! Commands appear in strictly descending order of start line, which is
//! what lets the applier replay them against a single live copy without
//! renumbering: every command only touches lines at or above everything
//! still pending. The builder produces this order by construction,
//! walking the document bottom to top.

use rustc_hash::FxHashMap;
use std::ops::Range;
use thiserror::Error;

use crate::line::Line;
use crate::line::split_lines;

/// A script that fails the wire grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The header does not end in `a`, `c`, or `d`.
    #[error("script line {line}: bad opcode in header {header:?}")]
    BadOpcode { line: usize, header: String },
    /// The header's range is empty or not numeric.
    #[error("script line {line}: bad range in header {header:?}")]
    BadRange { line: usize, header: String },
    /// The header's range starts after it ends.
    #[error("script line {line}: range starts after it ends in header {header:?}")]
    BackwardRange { line: usize, header: String },
    /// An `a` or `c` block ran off the end of the script without its
    /// terminating `.` line.
    #[error("script line {line}: block is missing its terminating \".\"")]
    MissingTerminator { line: usize },
}

/// One edit command. Line numbers are 1-based and inclusive, addressed
/// against the unedited base sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Insert `lines` after line `after`; 0 prepends.
    Append { after: usize, lines: Vec<&'a str> },
    /// Replace lines `start..=end` with `lines`.
    Change {
        start: usize,
        end: usize,
        lines: Vec<&'a str>,
    },
    /// Remove lines `start..=end`.
    Delete { start: usize, end: usize },
}

impl Command<'_> {
    /// The line number this command is ordered by: the leading number
    /// of its header.
    pub fn start_line(&self) -> usize {
        return match self {
            Command::Append { after, .. } => *after,
            Command::Change { start, .. } => *start,
            Command::Delete { start, .. } => *start,
        };
    }
}

impl std::fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Append { after, lines } => {
                writeln!(f, "{after}a")?;
                for line in lines {
                    writeln!(f, "{line}")?;
                }
                return write!(f, ".");
            }
            Command::Change { start, end, lines } => {
                if start == end {
                    writeln!(f, "{start}c")?;
                } else {
                    writeln!(f, "{start},{end}c")?;
                }
                for line in lines {
                    writeln!(f, "{line}")?;
                }
                return write!(f, ".");
            }
            Command::Delete { start, end } => {
                if start == end {
                    return write!(f, "{start}d");
                }
                return write!(f, "{start},{end}d");
            }
        }
    }
}

/// An ordered edit script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script<'a> {
    pub commands: Vec<Command<'a>>,
}

impl<'a> Script<'a> {
    /// Create an empty script.
    pub fn new() -> Script<'a> {
        return Script {
            commands: Vec::new(),
        };
    }

    /// Return true if the script has no commands.
    pub fn is_empty(&self) -> bool {
        return self.commands.is_empty();
    }

    /// Build the script that rewrites `first` into `second`, given a
    /// common subsequence of the two.
    ///
    /// The walk runs over `common` in reverse. Each matched value is
    /// pinned to its nearest unconsumed occurrence below the cursor in
    /// both sequences independently, which keeps duplicate lines
    /// elsewhere in the documents from stealing the match. The gap
    /// between consecutive matches becomes exactly one command, and a
    /// final gap covers everything before the first match, so the walk
    /// reaches line 0.
    ///
    /// Every line of `common` must occur in both sequences; passing
    /// anything other than a subsequence of both is a bug in the
    /// caller.
    pub fn build(
        first: &[Line<'_>],
        second: &[Line<'a>],
        common: &[Line<'_>],
    ) -> Script<'a> {
        let mut first_occurrences = Occurrences::new(first);
        let mut second_occurrences = Occurrences::new(second);
        let mut script = Script::new();
        let mut remove_end = first.len();
        let mut insert_end = second.len();
        for line in common.iter().rev() {
            let remove_start = first_occurrences.rewind(line.digest, remove_end);
            let insert_start = second_occurrences.rewind(line.digest, insert_end);
            script.push_gap(remove_start + 1..remove_end, second, insert_start + 1..insert_end);
            remove_end = remove_start;
            insert_end = insert_start;
        }
        script.push_gap(0..remove_end, second, 0..insert_end);
        return script;
    }

    /// Emit the command for one gap: `remove` is the 0-based range of
    /// unmatched lines in the old sequence, `insert` the range of
    /// replacement lines in `second`. Adjacent matches (both ranges
    /// empty) emit nothing.
    fn push_gap(&mut self, remove: Range<usize>, second: &[Line<'a>], insert: Range<usize>) {
        if !insert.is_empty() {
            let lines: Vec<&'a str> = second[insert].iter().map(|line| line.text).collect();
            if remove.is_empty() {
                self.commands.push(Command::Append {
                    after: remove.start,
                    lines,
                });
            } else {
                self.commands.push(Command::Change {
                    start: remove.start + 1,
                    end: remove.end,
                    lines,
                });
            }
        } else if !remove.is_empty() {
            self.commands.push(Command::Delete {
                start: remove.start + 1,
                end: remove.end,
            });
        }
    }

    /// Parse a script from its textual form, validating eagerly: a bad
    /// header or an unterminated block is rejected before anything is
    /// applied. Block lines borrow from `text`.
    pub fn parse(text: &'a str) -> Result<Script<'a>, ScriptError> {
        let lines = split_lines(text);
        let mut commands = Vec::new();
        let mut index = 0;
        while index < lines.len() {
            let line_number = index + 1;
            let (start, end, opcode) = parse_header(lines[index], line_number)?;
            index += 1;
            if opcode == b'd' {
                commands.push(Command::Delete { start, end });
                continue;
            }
            let mut block = Vec::new();
            loop {
                match lines.get(index) {
                    None => {
                        return Err(ScriptError::MissingTerminator { line: line_number });
                    }
                    Some(&".") => {
                        index += 1;
                        break;
                    }
                    Some(&line) => {
                        block.push(line);
                        index += 1;
                    }
                }
            }
            if opcode == b'a' {
                commands.push(Command::Append {
                    after: start,
                    lines: block,
                });
            } else {
                commands.push(Command::Change {
                    start,
                    end,
                    lines: block,
                });
            }
        }
        return Ok(Script { commands });
    }
}

impl std::fmt::Display for Script<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, command) in self.commands.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{command}")?;
        }
        return Ok(());
    }
}

/// Parse one header line into `(start, end, opcode)`. A single-number
/// range reads as `start == end`. The second number of an append range
/// is grammatical but carries no meaning, matching the applier, which
/// only reads an append's leading number.
fn parse_header(header: &str, line: usize) -> Result<(usize, usize, u8), ScriptError> {
    let opcode = match header.bytes().last() {
        Some(op @ (b'a' | b'c' | b'd')) => op,
        _ => {
            return Err(ScriptError::BadOpcode {
                line,
                header: header.to_string(),
            });
        }
    };
    let range = &header[..header.len() - 1];
    let (start_text, end_text) = match range.split_once(',') {
        Some((start_text, end_text)) => (start_text, Some(end_text)),
        None => (range, None),
    };
    let bad_range = || ScriptError::BadRange {
        line,
        header: header.to_string(),
    };
    let start: usize = start_text.parse().map_err(|_| bad_range())?;
    let end: usize = match end_text {
        Some(text) => text.parse().map_err(|_| bad_range())?,
        None => start,
    };
    if end < start {
        return Err(ScriptError::BackwardRange {
            line,
            header: header.to_string(),
        });
    }
    return Ok((start, end, opcode));
}

/// Positions of every distinct fingerprint in a sequence, consumed
/// back to front.
///
/// The builder's cursors only ever move toward the start of the
/// document, so each lookup pops positions at or above the cursor and
/// takes the first one below it. That is the same "nearest unconsumed
/// occurrence" a backward rescan would find, in amortized constant
/// time instead of a scan that goes quadratic on repetitive documents.
struct Occurrences {
    positions: FxHashMap<u64, Vec<usize>>,
}

impl Occurrences {
    fn new(lines: &[Line<'_>]) -> Occurrences {
        let mut positions: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
        for (index, line) in lines.iter().enumerate() {
            positions.entry(line.digest).or_default().push(index);
        }
        return Occurrences { positions };
    }

    /// The nearest unconsumed occurrence of `digest` strictly below
    /// `bound`. The occurrence is consumed.
    fn rewind(&mut self, digest: u64, bound: usize) -> usize {
        let positions = self
            .positions
            .get_mut(&digest)
            .expect("common line does not occur in the sequence");
        while let Some(position) = positions.pop() {
            if position < bound {
                return position;
            }
        }
        panic!("common line has no occurrence below the cursor");
    }
}
