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

use regex::bytes::{NoExpand, Regex};
use std::borrow::Cow;

/// Replaces every literal occurrence of one value with another.
#[derive(Debug, Clone)]
pub struct PlainRewriter {
    /// `None` for an empty current value, which never matches
    pattern: Option<Regex>,
    new: Vec<u8>,
}

impl PlainRewriter {
    pub fn new(current: &str, new: &str) -> Result<Self, regex::Error> {
        let pattern = if current.is_empty() {
            None
        } else {
            Some(Regex::new(&regex::escape(current))?)
        };
        Ok(PlainRewriter {
            pattern,
            new: new.as_bytes().to_vec(),
        })
    }

    pub fn rewrite<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
        match self.pattern {
            Some(ref pattern) => pattern.replace_all(line, NoExpand(&self.new)),
            None => Cow::Borrowed(line),
        }
    }
}

/// Replace every literal occurrence of `current` in `line` with `new`.
pub fn rewrite_plain<'a>(
    line: &'a [u8],
    current: &str,
    new: &str,
) -> Result<Cow<'a, [u8]>, regex::Error> {
    Ok(PlainRewriter::new(current, new)?.rewrite(line))
}
