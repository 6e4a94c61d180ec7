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

//! Table policy: which rows are dropped and which carry serialized data.

use log::debug;

use crate::parser::parse_insert_table;

/// A table name relative to the table prefix: a stem plus the suffixes of the
/// variants that share it (`""` is the stem itself).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableName {
    pub stem: &'static str,
    pub variants: &'static [&'static str],
}

impl TableName {
    const fn plain(stem: &'static str) -> Self {
        TableName {
            stem,
            variants: &[""],
        }
    }

    const fn with_variants(stem: &'static str, variants: &'static [&'static str]) -> Self {
        TableName { stem, variants }
    }

    /// Whether `name` (already stripped of the prefix) is this table or one
    /// of its variants.
    pub fn matches(&self, name: &str) -> bool {
        name.strip_prefix(self.stem)
            .map_or(false, |rest| self.variants.iter().any(|v| *v == rest))
    }
}

/// Tables holding transient or personal data. Their rows are left out of the
/// migrated dump unless all data is kept.
pub const EXCLUDED_TABLES: &[TableName] = &[
    TableName::plain("captcha"),
    TableName::plain("cp_log"),
    TableName::with_variants("email_cache", &["", "_mg", "_ml"]),
    TableName::plain("email_console_cache"),
    TableName::plain("email_tracker"),
    TableName::plain("freeform_entries"),
    TableName::plain("freeform_params"),
    TableName::plain("mailing_list"),
    TableName::plain("mailing_list_queue"),
    TableName::plain("message_attachments"),
    TableName::plain("message_copies"),
    TableName::plain("message_data"),
    TableName::plain("message_listed"),
    TableName::plain("password_lockout"),
    TableName::plain("referrers"),
    TableName::plain("reset_password"),
    TableName::plain("search"),
    TableName::plain("search_log"),
    TableName::plain("security_hashes"),
    TableName::plain("sessions"),
    TableName::plain("throttle"),
    TableName::plain("trackbacks"),
];

/// Tables whose rows store length-prefixed serialized payloads.
pub const SERIALIZED_TABLES: &[TableName] = &[
    TableName::plain("extensions"),
    TableName::plain("relationships"),
    TableName::plain("sites"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableCategory {
    /// Dropped unless all data is kept
    Excluded,
    /// Holds serialized payloads
    Serialized,
    /// Any other table under the prefix
    Plain,
    /// A table that does not carry the prefix
    Unclassified,
}

impl TableCategory {
    pub fn of(table: &str, table_prefix: &str) -> Self {
        let name = match strip_table_prefix(table, table_prefix) {
            Some(name) => name,
            None => return TableCategory::Unclassified,
        };
        if EXCLUDED_TABLES.iter().any(|t| t.matches(name)) {
            TableCategory::Excluded
        } else if SERIALIZED_TABLES.iter().any(|t| t.matches(name)) {
            TableCategory::Serialized
        } else {
            TableCategory::Plain
        }
    }
}

/// `exp_sites` -> `sites` for prefix `exp`
fn strip_table_prefix<'a>(table: &'a str, table_prefix: &str) -> Option<&'a str> {
    table.strip_prefix(table_prefix)?.strip_prefix('_')
}

/// How a line has to be rewritten
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind {
    /// Insert into a table with serialized payloads
    Serialized,
    /// Any other insert
    Plain,
    /// Not a row insertion
    Passthrough,
}

fn insert_category(line: &[u8], table_prefix: &str) -> Option<TableCategory> {
    parse_insert_table(line).map(|name| TableCategory::of(name.table(), table_prefix))
}

/// Whether the line is a row insertion into one of the [`EXCLUDED_TABLES`].
/// Always `false` when all data is kept.
pub fn should_exclude(line: &[u8], table_prefix: &str, all_data: bool) -> bool {
    if all_data {
        return false;
    }
    let excluded = insert_category(line, table_prefix) == Some(TableCategory::Excluded);
    if excluded {
        debug!("excluding {:.60}", String::from_utf8_lossy(line));
    }
    excluded
}

pub fn classify(line: &[u8], table_prefix: &str) -> LineKind {
    match insert_category(line, table_prefix) {
        None => LineKind::Passthrough,
        Some(TableCategory::Serialized) => LineKind::Serialized,
        Some(_) => LineKind::Plain,
    }
}
