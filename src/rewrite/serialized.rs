// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Length-prefixed string rewriting
//!
//! Serialized values are stored inside SQL strings, so their quotes are
//! escaped: a string field looks like `;s:10:\"/old/path/\";`. The number is
//! the byte length of the content and has to follow every substitution.
//!
//! Dumps may hold binary data, so lines are handled as bytes.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;

/// Any string token, used to check declared lengths
static STRING_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"s:([0-9]+):\\"((?s-u:.)*?)\\";"#).unwrap());

/// Rewrites string tokens starting with one value so they start with another.
#[derive(Debug, Clone)]
pub struct SerializedRewriter {
    pattern: Regex,
    current_len: usize,
    new: Vec<u8>,
}

/// `None` when the digits do not fit a `usize`
fn declared_length(digits: &[u8]) -> Option<usize> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

impl SerializedRewriter {
    pub fn new(current: &str, new: &str) -> Result<Self, regex::Error> {
        // The rest of the content may hold any byte
        let pattern = Regex::new(&format!(
            r#"(\}}|;)s:([0-9]+):\\"{}((?s-u:.)*?)\\";"#,
            regex::escape(current)
        ))?;
        Ok(SerializedRewriter {
            pattern,
            current_len: current.len(),
            new: new.as_bytes().to_vec(),
        })
    }

    /// Rewrite every matching token in `line`, left to right, until no token
    /// is left. Tokens that do not start with the current value, and the text
    /// between tokens, are not touched.
    pub fn rewrite<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
        let mut line = Cow::Borrowed(line);
        let mut cursor = 0;
        while let Some((range, replacement)) = self.next_token(&line, cursor) {
            // The closing `;` doubles as the delimiter of the next token
            cursor = range.start + replacement.len() - 1;
            if line[range.clone()] != replacement[..] {
                line.to_mut().splice(range, replacement);
            }
        }
        line
    }

    /// Find the next token at or after `cursor` and build its replacement
    fn next_token(&self, line: &[u8], cursor: usize) -> Option<(Range<usize>, Vec<u8>)> {
        let caps = self.pattern.captures_at(line, cursor)?;
        let token = caps.get(0)?;
        let replacement = self.replacement(&caps);
        debug!(
            "rewriting {} as {}",
            String::from_utf8_lossy(token.as_bytes()),
            String::from_utf8_lossy(&replacement)
        );
        Some((token.range(), replacement))
    }

    /// The declared length is recomputed from the new content, so a stale
    /// length in the input comes out right.
    fn replacement(&self, caps: &Captures) -> Vec<u8> {
        let rest = &caps[3];
        if declared_length(&caps[2]) != Some(self.current_len + rest.len()) {
            warn!(
                "serialized string {} declares a wrong length",
                String::from_utf8_lossy(&caps[0])
            );
        }
        let length = self.new.len() + rest.len();
        let mut out = Vec::with_capacity(caps[0].len() + self.new.len());
        out.extend_from_slice(&caps[1]);
        out.extend_from_slice(b"s:");
        out.extend_from_slice(length.to_string().as_bytes());
        out.extend_from_slice(b":\\\"");
        out.extend_from_slice(&self.new);
        out.extend_from_slice(rest);
        out.extend_from_slice(b"\\\";");
        out
    }
}

/// Replace `current` with `new` at the start of every length-prefixed string
/// in `line`, fixing up the declared lengths.
pub fn rewrite_serialized<'a>(
    line: &'a [u8],
    current: &str,
    new: &str,
) -> Result<Cow<'a, [u8]>, regex::Error> {
    Ok(SerializedRewriter::new(current, new)?.rewrite(line))
}

/// Number of string tokens in `line` whose declared length differs from the
/// byte length of their content.
pub fn inconsistent_lengths(line: &[u8]) -> usize {
    STRING_TOKEN
        .captures_iter(line)
        .filter(|caps| declared_length(&caps[1]) != Some(caps[2].len()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(line: &str, current: &str, new: &str) -> String {
        let out = rewrite_serialized(line.as_bytes(), current, new).unwrap();
        String::from_utf8(out.into_owned()).unwrap()
    }

    fn inconsistent(line: &str) -> usize {
        inconsistent_lengths(line.as_bytes())
    }

    #[test]
    fn rewrites_a_path_and_its_length() {
        let line = r#"INSERT INTO `exp_sites` VALUES (1,'a:1:{s:9:\"site_path\";s:10:\"/old/path/\";}');"#;
        let out = rewrite(line, "/old/path/", "/new/longer/path/");
        assert_eq!(
            out,
            r#"INSERT INTO `exp_sites` VALUES (1,'a:1:{s:9:\"site_path\";s:17:\"/new/longer/path/\";}');"#
        );
        assert_eq!(inconsistent(&out), 0);
    }

    #[test]
    fn keeps_the_rest_of_the_string() {
        let line = r#"a:1:{s:3:\"url\";s:25:\"/old/path/images/logo.png\";}"#;
        let out = rewrite(line, "/old/path/", "/n/");
        assert_eq!(out, r#"a:1:{s:3:\"url\";s:18:\"/n/images/logo.png\";}"#);
        assert_eq!(inconsistent(&out), 0);
    }

    #[test]
    fn rewrites_every_occurrence() {
        let line = r#"a:3:{i:0;s:7:\"/old/a/\";i:1;s:7:\"/old/b/\";i:2;s:7:\"/old/a/\";}"#;
        let out = rewrite(line, "/old/", "/brand-new/");
        assert_eq!(
            out,
            r#"a:3:{i:0;s:13:\"/brand-new/a/\";i:1;s:13:\"/brand-new/b/\";i:2;s:13:\"/brand-new/a/\";}"#
        );
        assert_eq!(inconsistent(&out), 0);
    }

    #[test]
    fn adjacent_tokens_share_a_delimiter() {
        let line = r#"a:1:{s:1:\"k\";s:5:\"/old/\";s:5:\"/old/\";}"#;
        let out = rewrite(line, "/old/", "/x/");
        assert_eq!(out, r#"a:1:{s:1:\"k\";s:3:\"/x/\";s:3:\"/x/\";}"#);
    }

    #[test]
    fn brace_delimits_a_token() {
        let line = r#"a:1:{i:0;a:0:{}s:5:\"/old/\";}"#;
        let out = rewrite(line, "/old/", "/new!/");
        assert_eq!(out, r#"a:1:{i:0;a:0:{}s:6:\"/new!/\";}"#);
    }

    #[test]
    fn opening_brace_is_not_a_delimiter() {
        let line = r#"a:1:{s:5:\"/old/\";s:1:\"v\";}"#;
        assert_eq!(rewrite(line, "/old/", "/new/"), line);
    }

    #[test]
    fn leaves_other_tokens_alone() {
        let line = r#"a:1:{s:4:\"path\";s:9:\"/another/\";}"#;
        assert_eq!(rewrite(line, "/old/", "/new/"), line);
        let borrowed = rewrite_serialized(line.as_bytes(), "/old/", "/new/").unwrap();
        assert!(matches!(borrowed, Cow::Borrowed(_)));
    }

    #[test]
    fn only_matches_at_the_start_of_the_content() {
        let line = r#"a:1:{s:1:\"k\";s:14:\"/var/old/path/\";}"#;
        assert_eq!(rewrite(line, "/old/", "/new/"), line);
    }

    #[test]
    fn current_value_is_matched_literally() {
        let line = r#"a:1:{s:1:\"k\";s:22:\"http://oldXexampleXcom\";}"#;
        assert_eq!(rewrite(line, "http://old.example.com", "http://new"), line);

        let line = r#"a:1:{s:1:\"k\";s:27:\"http://old.example.com/blog\";}"#;
        assert_eq!(
            rewrite(line, "http://old.example.com", "http://new.example.org"),
            r#"a:1:{s:1:\"k\";s:27:\"http://new.example.org/blog\";}"#
        );
    }

    #[test]
    fn lengths_can_shrink_to_zero() {
        let line = r#"a:1:{s:1:\"k\";s:5:\"/old/\";}"#;
        assert_eq!(rewrite(line, "/old/", ""), r#"a:1:{s:1:\"k\";s:0:\"\";}"#);
    }

    #[test]
    fn terminates_when_new_value_starts_with_current() {
        let line = r#"a:2:{s:1:\"k\";s:5:\"/old/\";s:6:\"/old/x\";}"#;
        let out = rewrite(line, "/old/", "/old/sub/");
        assert_eq!(
            out,
            r#"a:2:{s:1:\"k\";s:9:\"/old/sub/\";s:10:\"/old/sub/x\";}"#
        );
        assert_eq!(inconsistent(&out), 0);
    }

    #[test]
    fn lengths_count_bytes() {
        let line = r#"a:1:{s:1:\"k\";s:11:\"/old/café/\";}"#;
        let out = rewrite(line, "/old/", "/ñ/");
        assert_eq!(out, r#"a:1:{s:1:\"k\";s:10:\"/ñ/café/\";}"#);
        assert_eq!(inconsistent(&out), 0);
    }

    #[test]
    fn stale_lengths_are_recomputed() {
        let line = r#"INSERT INTO `exp_sites` VALUES (1,'a:1:{s:9:\"site_path\";s:11:\"/old/path/\";}');"#;
        let out = rewrite(line, "/old/path/", "/new/longer/path/");
        assert_eq!(
            out,
            r#"INSERT INTO `exp_sites` VALUES (1,'a:1:{s:9:\"site_path\";s:17:\"/new/longer/path/\";}');"#
        );
        assert_eq!(inconsistent(&out), 0);
    }

    #[test]
    fn oversized_declared_lengths_do_not_overflow() {
        let line = r#"a:1:{s:1:\"k\";s:18446744073709551615:\"/old/\";}"#;
        assert_eq!(
            rewrite(line, "/old/", "/newer/"),
            r#"a:1:{s:1:\"k\";s:7:\"/newer/\";}"#
        );
        let line = r#"a:1:{s:1:\"k\";s:99999999999999999999999:\"/old/\";}"#;
        assert_eq!(rewrite(line, "/old/", "/n/"), r#"a:1:{s:1:\"k\";s:3:\"/n/\";}"#);
    }

    #[test]
    fn binary_content_is_kept() {
        let mut line = br#"a:1:{s:1:\"k\";s:8:\"/old/"#.to_vec();
        line.extend_from_slice(&[0xff, 0x00, b'\n']);
        line.extend_from_slice(br#"\";}"#);
        let out = rewrite_serialized(&line, "/old/", "/new/path/").unwrap();
        let mut expected = br#"a:1:{s:1:\"k\";s:13:\"/new/path/"#.to_vec();
        expected.extend_from_slice(&[0xff, 0x00, b'\n']);
        expected.extend_from_slice(br#"\";}"#);
        assert_eq!(out.into_owned(), expected);
    }

    #[test]
    fn counts_inconsistent_lengths() {
        assert_eq!(inconsistent(r#"a:1:{s:3:\"abc\";}"#), 0);
        assert_eq!(inconsistent(r#"a:2:{s:4:\"abc\";s:1:\"ab\";}"#), 2);
        assert_eq!(inconsistent(r#"s:99999999999999999999999:\"abc\";"#), 1);
        assert_eq!(inconsistent("no tokens here"), 0);
    }
}
