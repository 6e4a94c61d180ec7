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

//! Migration options and their validation

use log::debug;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigErrors};

pub const DEFAULT_TABLE_PREFIX: &str = "exp";

/// A value as it is in the current site and as it must be in the new one
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub current: String,
    pub new: String,
}

impl Replacement {
    pub fn new(current: impl Into<String>, new: impl Into<String>) -> Self {
        Replacement {
            current: current.into(),
            new: new.into(),
        }
    }

    pub fn is_change(&self) -> bool {
        self.current != self.new
    }
}

/// Everything the rewriters need, fixed for the whole run
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteParams {
    pub table_prefix: String,
    pub all_data: bool,
    pub domain: Option<Replacement>,
    pub path: Option<Replacement>,
}

impl RewriteParams {
    /// Parameters with no replacements. A trailing `_` on the prefix is
    /// dropped.
    pub fn new(table_prefix: &str) -> Self {
        RewriteParams {
            table_prefix: strip_separator(table_prefix).to_string(),
            all_data: false,
            domain: None,
            path: None,
        }
    }

    pub fn with_domain(mut self, current: &str, new: &str) -> Self {
        self.domain = Some(Replacement::new(current, new));
        self
    }

    pub fn with_path(mut self, current: &str, new: &str) -> Self {
        self.path = Some(Replacement::new(current, new));
        self
    }

    pub fn with_all_data(mut self, all_data: bool) -> Self {
        self.all_data = all_data;
        self
    }

    /// The domain replacement, if it changes anything
    pub fn domain_change(&self) -> Option<&Replacement> {
        self.domain.as_ref().filter(|r| r.is_change())
    }

    /// The path replacement, if it changes anything
    pub fn path_change(&self) -> Option<&Replacement> {
        self.path.as_ref().filter(|r| r.is_change())
    }

    pub fn has_changes(&self) -> bool {
        self.domain_change().is_some() || self.path_change().is_some()
    }
}

fn strip_separator(table_prefix: &str) -> &str {
    table_prefix.strip_suffix('_').unwrap_or(table_prefix)
}

/// Raw migration options, as given on the command line
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub table_prefix: String,
    pub all_data: bool,
    pub current_domain: Option<String>,
    pub new_domain: Option<String>,
    pub current_path: Option<String>,
    pub new_path: Option<String>,
    pub file: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
            all_data: false,
            current_domain: None,
            new_domain: None,
            current_path: None,
            new_path: None,
            file: None,
        }
    }
}

/// Empty values count as not given
fn specified(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn pair(current: Option<&str>, new: Option<&str>) -> Result<Option<Replacement>, ()> {
    match (current, new) {
        (Some(current), Some(new)) => Ok(Some(Replacement::new(current, new))),
        (None, None) => Ok(None),
        _ => Err(()),
    }
}

/// Site paths must be absolute and are stored with a trailing slash
fn site_path(option: &'static str, value: Option<&str>) -> Result<String, ConfigError> {
    let value = value.ok_or(ConfigError::PathMissing(option))?;
    if !value.starts_with('/') {
        return Err(ConfigError::LeadingSlash(option));
    }
    if value.ends_with('/') {
        Ok(value.to_string())
    } else {
        Ok(format!("{}/", value))
    }
}

impl Options {
    /// Validate the options into rewrite parameters. All problems with the
    /// option values are reported together.
    pub fn rewrite_params(&self) -> Result<RewriteParams, ConfigErrors> {
        let mut errors = vec![];

        let domain = pair(specified(&self.current_domain), specified(&self.new_domain))
            .unwrap_or_else(|_| {
                errors.push(ConfigError::DomainPair);
                None
            });
        let paths_paired = pair(specified(&self.current_path), specified(&self.new_path)).is_ok();
        if !paths_paired {
            errors.push(ConfigError::PathPair);
        }
        let table_prefix = strip_separator(&self.table_prefix);
        if table_prefix.is_empty() {
            errors.push(ConfigError::TablePrefix);
        }

        let current_path = site_path("current_path", specified(&self.current_path));
        let new_path = site_path("new_path", specified(&self.new_path));
        let path = match (current_path, new_path) {
            (Ok(current), Ok(new)) => Some(Replacement::new(current, new)),
            (current, new) => {
                errors.extend(current.err());
                errors.extend(new.err());
                None
            }
        };

        if !errors.is_empty() {
            return Err(ConfigErrors(errors));
        }

        let params = RewriteParams {
            table_prefix: table_prefix.to_string(),
            all_data: self.all_data,
            domain,
            path,
        };
        if !params.has_changes() {
            return Err(ConfigError::NothingToChange.into());
        }
        debug!("rewrite parameters {:?}", params);
        Ok(params)
    }

    /// The dump to migrate, which must exist
    pub fn input_file(&self) -> Result<&Path, ConfigError> {
        let file = self.file.as_deref().ok_or(ConfigError::NoFile)?;
        if !file.exists() {
            return Err(ConfigError::FileNotFound(file.to_path_buf()));
        }
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matches::assert_matches;

    fn options() -> Options {
        Options {
            current_path: Some("/var/www/old".to_string()),
            new_path: Some("/srv/new/".to_string()),
            ..Options::default()
        }
    }

    #[test]
    fn normalises_paths_and_prefix() {
        let params = Options {
            table_prefix: "ee_".to_string(),
            ..options()
        }
        .rewrite_params()
        .unwrap();
        assert_eq!(params.table_prefix, "ee");
        assert_eq!(
            params.path,
            Some(Replacement::new("/var/www/old/", "/srv/new/"))
        );
        assert_eq!(params.domain, None);
        assert!(!params.all_data);
    }

    #[test]
    fn domains_come_in_pairs() {
        let errors = Options {
            current_domain: Some("old.example.com".to_string()),
            ..options()
        }
        .rewrite_params()
        .unwrap_err();
        assert_eq!(errors, ConfigErrors(vec![ConfigError::DomainPair]));

        let params = Options {
            current_domain: Some("old.example.com".to_string()),
            new_domain: Some("new.example.org".to_string()),
            ..options()
        }
        .rewrite_params()
        .unwrap();
        assert_eq!(
            params.domain,
            Some(Replacement::new("old.example.com", "new.example.org"))
        );
    }

    #[test]
    fn empty_values_are_not_given() {
        let errors = Options {
            current_domain: Some("old.example.com".to_string()),
            new_domain: Some("".to_string()),
            ..options()
        }
        .rewrite_params()
        .unwrap_err();
        assert_eq!(errors.0, vec![ConfigError::DomainPair]);
    }

    #[test]
    fn paths_are_required_and_absolute() {
        let errors = Options::default().rewrite_params().unwrap_err();
        assert_eq!(
            errors.0,
            vec![
                ConfigError::PathMissing("current_path"),
                ConfigError::PathMissing("new_path"),
            ]
        );

        let errors = Options {
            current_path: Some("var/www".to_string()),
            new_path: None,
            ..Options::default()
        }
        .rewrite_params()
        .unwrap_err();
        assert_eq!(
            errors.0,
            vec![
                ConfigError::PathPair,
                ConfigError::LeadingSlash("current_path"),
                ConfigError::PathMissing("new_path"),
            ]
        );
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let errors = Options {
            table_prefix: "_".to_string(),
            ..options()
        }
        .rewrite_params()
        .unwrap_err();
        assert_eq!(errors.0, vec![ConfigError::TablePrefix]);
    }

    #[test]
    fn something_must_change() {
        let errors = Options {
            current_path: Some("/same".to_string()),
            new_path: Some("/same/".to_string()),
            current_domain: Some("example.com".to_string()),
            new_domain: Some("example.com".to_string()),
            ..Options::default()
        }
        .rewrite_params()
        .unwrap_err();
        assert_eq!(errors.0, vec![ConfigError::NothingToChange]);

        let params = Options {
            current_path: Some("/same".to_string()),
            new_path: Some("/same".to_string()),
            current_domain: Some("old.example.com".to_string()),
            new_domain: Some("new.example.com".to_string()),
            ..Options::default()
        }
        .rewrite_params()
        .unwrap();
        assert_eq!(params.path_change(), None);
        assert!(params.domain_change().is_some());
    }

    #[test]
    fn input_file_must_exist() {
        assert_matches!(options().input_file(), Err(ConfigError::NoFile));

        let missing = Options {
            file: Some(PathBuf::from("/definitely/not/here.sql")),
            ..options()
        };
        assert_matches!(missing.input_file(), Err(ConfigError::FileNotFound(_)));

        let present = Options {
            file: Some(PathBuf::from(file!())),
            ..options()
        };
        assert_matches!(present.input_file(), Ok(_));
    }

    #[test]
    fn errors_are_reported_one_per_line() {
        let errors = ConfigErrors(vec![
            ConfigError::DomainPair,
            ConfigError::LeadingSlash("new_path"),
        ]);
        assert_eq!(
            errors.to_string(),
            "You must specify either both domains or none\nThe option --new_path must have a leading slash"
        );
    }

    #[test]
    fn builder_strips_prefix_separator() {
        let params = RewriteParams::new("exp_")
            .with_domain("a", "b")
            .with_all_data(true);
        assert_eq!(params.table_prefix, "exp");
        assert!(params.all_data);
        assert!(params.has_changes());
        assert!(!RewriteParams::new("exp").with_path("/a/", "/a/").has_changes());
    }
}
