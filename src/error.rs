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

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// An invalid combination of options
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("You must specify either both domains or none")]
    DomainPair,
    #[error("You must specify either both paths or none")]
    PathPair,
    #[error("Required option --table_prefix missing")]
    TablePrefix,
    #[error("Required option --{0} missing")]
    PathMissing(&'static str),
    #[error("The option --{0} must have a leading slash")]
    LeadingSlash(&'static str),
    #[error("The domain or web path must be updated")]
    NothingToChange,
    #[error("You must specify a file")]
    NoFile,
    #[error("The file {} does not exist", .0.display())]
    FileNotFound(PathBuf),
}

/// Every problem found while validating the options, in the order checked
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", join_lines(.0))]
pub struct ConfigErrors(pub Vec<ConfigError>);

fn join_lines(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<ConfigError> for ConfigErrors {
    fn from(e: ConfigError) -> Self {
        ConfigErrors(vec![e])
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigErrors),
    #[error("invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
