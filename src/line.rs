//! Line sequences and line fingerprints.
//!
//! A document is diffed as an ordered sequence of lines. Each line is
//! paired with a 64-bit blake3 fingerprint so the search loop can test
//! equality without touching the text. Two distinct lines with the same
//! fingerprint are treated as equal by default; see [`Line::matches`]
//! for the stricter mode.

/// A borrowed line of text together with its fingerprint.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// The line's text, without a trailing newline.
    pub text: &'a str,
    /// 64-bit fingerprint of the text.
    pub digest: u64,
}

impl<'a> Line<'a> {
    /// Wrap a line of text, computing its fingerprint.
    pub fn new(text: &'a str) -> Line<'a> {
        return Line {
            text,
            digest: fingerprint(text),
        };
    }

    /// Test two lines for equality by fingerprint.
    ///
    /// With `verify` set, digest-equal lines are also compared by text,
    /// so a fingerprint collision cannot produce a false match. The
    /// default search path passes `verify = false` and accepts the
    /// collision risk.
    pub fn matches(&self, other: &Line<'_>, verify: bool) -> bool {
        if self.digest != other.digest {
            return false;
        }
        return !verify || self.text == other.text;
    }
}

impl std::fmt::Debug for Line<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Line({:?}, {:016x})", self.text, self.digest);
    }
}

/// Fingerprint a line: the first 8 bytes of its blake3 digest, read
/// little-endian.
pub fn fingerprint(line: &str) -> u64 {
    let digest = blake3::hash(line.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    return u64::from_le_bytes(bytes);
}

/// Fingerprint every line of a split document.
pub fn fingerprint_lines<'a>(lines: &[&'a str]) -> Vec<Line<'a>> {
    return lines.iter().map(|text| Line::new(text)).collect();
}

/// Split a document into lines on `\n`.
///
/// A trailing newline does not produce a trailing empty line, so
/// `split_lines` of the empty string is empty. Interior empty lines
/// are kept, and `\r` is not treated specially, so a split/join round
/// trip is byte-exact for any text ending in a newline.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    return lines;
}

/// Join lines back into a document, terminating every line with `\n`.
/// Inverse of [`split_lines`] for newline-terminated text.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    return text;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_empty_is_empty() {
        assert_eq!(split_lines(""), Vec::<&str>::new());
    }

    #[test]
    fn split_drops_trailing_newline_only() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn join_terminates_every_line() {
        assert_eq!(join_lines(&["a", "b"]), "a\nb\n");
        assert_eq!(join_lines::<&str>(&[]), "");
    }

    #[test]
    fn split_join_round_trip() {
        let text = "alpha\n\nbeta\ngamma\n";
        assert_eq!(join_lines(&split_lines(text)), text);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        assert_eq!(fingerprint("hello"), fingerprint("hello"));
    }

    #[test]
    fn fingerprint_differs_for_different_lines() {
        assert_ne!(fingerprint("hello"), fingerprint("hello!"));
    }

    #[test]
    fn matches_by_digest() {
        let a = Line::new("same");
        let b = Line::new("same");
        let c = Line::new("other");
        assert!(a.matches(&b, false));
        assert!(a.matches(&b, true));
        assert!(!a.matches(&c, false));
    }

    #[test]
    fn verified_match_compares_text() {
        // Digests can't be forced to collide here, so fake one.
        let a = Line { text: "one", digest: 7 };
        let b = Line { text: "two", digest: 7 };
        assert!(a.matches(&b, false));
        assert!(!a.matches(&b, true));
    }
}
