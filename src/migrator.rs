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

//! Dump migration driver
//!
//! Lines are read, filtered, rewritten and written one at a time, in order.

use log::{debug, info, warn};
use std::borrow::Cow;
use std::io::{BufRead, Write};

use crate::config::RewriteParams;
use crate::error::{ConfigError, Result};
use crate::rewrite::{inconsistent_lengths, PlainRewriter, SerializedRewriter};
use crate::tables::{classify, should_exclude, LineKind};

/// Inside serialized strings the domain is only rewritten after this scheme.
const SERIALIZED_DOMAIN_SCHEME: &str = "http://";

/// What happened during a run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    /// Lines read
    pub lines: usize,
    /// Lines left out of the output
    pub dropped: usize,
    /// Lines written with changes
    pub rewritten: usize,
}

#[derive(Debug)]
pub struct Migrator {
    params: RewriteParams,
    // Path first, then domain, for both kinds of rows
    serialized: Vec<SerializedRewriter>,
    plain: Vec<PlainRewriter>,
}

impl Migrator {
    /// Fails when the parameters would not change anything.
    pub fn new(params: RewriteParams) -> Result<Self> {
        if !params.has_changes() {
            return Err(ConfigError::NothingToChange.into());
        }
        let mut serialized = vec![];
        let mut plain = vec![];
        if let Some(path) = params.path_change() {
            serialized.push(SerializedRewriter::new(&path.current, &path.new)?);
            plain.push(PlainRewriter::new(&path.current, &path.new)?);
        }
        if let Some(domain) = params.domain_change() {
            serialized.push(SerializedRewriter::new(
                &format!("{}{}", SERIALIZED_DOMAIN_SCHEME, domain.current),
                &format!("{}{}", SERIALIZED_DOMAIN_SCHEME, domain.new),
            )?);
            plain.push(PlainRewriter::new(&domain.current, &domain.new)?);
        }
        Ok(Migrator {
            params,
            serialized,
            plain,
        })
    }

    pub fn params(&self) -> &RewriteParams {
        &self.params
    }

    /// The migrated line, or `None` when the line has to be left out. Lines
    /// are raw bytes, dumps may hold binary column data.
    pub fn process_line<'a>(&self, line: &'a [u8]) -> Option<Cow<'a, [u8]>> {
        let prefix = &self.params.table_prefix;
        if should_exclude(line, prefix, self.params.all_data) {
            return None;
        }
        let kind = classify(line, prefix);
        debug!("{:?} {:.60}", kind, String::from_utf8_lossy(line));
        let line = match kind {
            LineKind::Passthrough => Cow::Borrowed(line),
            LineKind::Serialized => self.rewrite_serialized(line),
            LineKind::Plain => self.rewrite_plain(line),
        };
        Some(line)
    }

    fn rewrite_serialized<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
        let stale = inconsistent_lengths(line);
        if stale > 0 {
            warn!(
                "{} serialized string(s) with a wrong length in {:.60}",
                stale,
                String::from_utf8_lossy(line)
            );
        }
        let mut line = Cow::Borrowed(line);
        for rewriter in &self.serialized {
            let rewritten = match rewriter.rewrite(&line) {
                Cow::Owned(rewritten) => rewritten,
                Cow::Borrowed(_) => continue,
            };
            line = Cow::Owned(rewritten);
        }
        line
    }

    fn rewrite_plain<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
        let mut line = Cow::Borrowed(line);
        for rewriter in &self.plain {
            let rewritten = match rewriter.rewrite(&line) {
                Cow::Owned(rewritten) => rewritten,
                Cow::Borrowed(_) => continue,
            };
            line = Cow::Owned(rewritten);
        }
        line
    }

    /// Migrate every line of `reader` into `writer`. Line terminators are
    /// kept as they are.
    pub fn run<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<Stats> {
        let mut stats = Stats::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            stats.lines += 1;
            match self.process_line(&buf) {
                None => stats.dropped += 1,
                Some(line) => {
                    if let Cow::Owned(_) = line {
                        stats.rewritten += 1;
                    }
                    writer.write_all(&line)?;
                }
            }
        }
        writer.flush()?;
        info!(
            "{} lines read, {} dropped, {} rewritten",
            stats.lines, stats.dropped, stats.rewritten
        );
        Ok(stats)
    }
}
