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

//! ExpressionEngine mysqldump migrator
//!
//! Moves an ExpressionEngine site to a new domain and/or filesystem path by
//! rewriting its mysqldump line by line. Rows of transient tables (sessions,
//! logs, caches...) are left out, and values stored in PHP serialized strings
//! get their length prefixes fixed after the substitution.
//!
//! ```rust,no_run
//! use ee_dump_migrator::{Migrator, RewriteParams};
//! # use std::fs::File;
//! # use std::io::{self, BufReader};
//! # fn main() -> ee_dump_migrator::Result<()> {
//!
//! let params = RewriteParams::new("exp")
//!     .with_domain("old.example.com", "new.example.org")
//!     .with_path("/var/www/old/", "/srv/www/new/");
//!
//! let stats = Migrator::new(params)?.run(
//!     BufReader::new(File::open("dump.sql")?),
//!     io::stdout(),
//! )?;
//! eprintln!("{} lines dropped", stats.dropped);
//! # Ok(())
//! # }
//! ```
//!

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod migrator;
mod parser;
mod rewrite;
mod tables;
mod tokenizer;

pub use config::{Options, Replacement, RewriteParams, DEFAULT_TABLE_PREFIX};
pub use error::{ConfigError, ConfigErrors, Error, Result};
pub use migrator::{Migrator, Stats};
pub use parser::{parse_insert_table, ObjectName};
pub use rewrite::{
    inconsistent_lengths, rewrite_plain, rewrite_serialized, PlainRewriter, SerializedRewriter,
};
pub use tables::{
    classify, should_exclude, LineKind, TableCategory, TableName, EXCLUDED_TABLES,
    SERIALIZED_TABLES,
};
pub use tokenizer::Word;
