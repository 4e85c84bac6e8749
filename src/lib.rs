//! Mend - line-level diffing and patching with ed-style edit scripts.
//!
//! `make_diff` computes a compact, editable script that rewrites one
//! text into another; `apply_patch` replays such a script. The script
//! is plain text, one command per line, addressed against the original
//! base text in strictly descending order.
//!
//! # Quick Start
//!
//! ```
//! let old = "alpha\nbeta\n";
//! let new = "alpha\ngamma\n";
//!
//! // A script that rewrites `old` into `new`.
//! let diff = mend::make_diff(old, new);
//! assert_eq!(diff, "2c\ngamma\n.");
//!
//! // Replaying the script reconstructs `new` exactly.
//! let patched = mend::apply_patch(old, &diff).unwrap();
//! assert_eq!(patched, new);
//! ```

pub mod lcs;
pub mod line;
pub mod patch;
pub mod script;

pub use lcs::DiffOptions;
pub use lcs::common_subsequence;
pub use lcs::common_subsequence_with;
pub use line::Line;
pub use line::fingerprint;
pub use line::fingerprint_lines;
pub use line::join_lines;
pub use line::split_lines;
pub use patch::PatchError;
pub use patch::apply;
pub use script::Command;
pub use script::Script;
pub use script::ScriptError;

/// Compute the edit script that rewrites `old` into `new`, as ed-style
/// script text. Identical inputs produce the empty string.
pub fn make_diff(old: &str, new: &str) -> String {
    return make_diff_with(old, new, &DiffOptions::default());
}

/// Compute an edit script with explicit options.
pub fn make_diff_with(old: &str, new: &str, options: &DiffOptions) -> String {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let first = fingerprint_lines(&old_lines);
    let second = fingerprint_lines(&new_lines);
    let common = lcs::common_subsequence_with(&first, &second, options);
    let script = Script::build(&first, &second, &common);
    return script.to_string();
}

/// Apply ed-style script text to `base`, producing the patched text.
/// Every line of the result is newline-terminated.
pub fn apply_patch(base: &str, diff: &str) -> Result<String, PatchError> {
    let base_lines = split_lines(base);
    let script = Script::parse(diff)?;
    let patched = patch::apply(&base_lines, &script)?;
    return Ok(join_lines(&patched));
}
