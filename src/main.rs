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

use clap::Parser;
use ee_dump_migrator::{Migrator, Options, DEFAULT_TABLE_PREFIX};
use log::info;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process;

/// Migrates an ExpressionEngine mysqldump to a new domain and site path.
/// The migrated dump is written to standard output.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Keep all data in the transformation
    #[arg(short = 'a', long = "all_data")]
    all_data: bool,

    /// Database table prefix
    #[arg(
        short = 't',
        long = "table_prefix",
        value_name = "PREFIX",
        num_args = 0..=1,
        default_value = DEFAULT_TABLE_PREFIX,
        default_missing_value = DEFAULT_TABLE_PREFIX
    )]
    table_prefix: String,

    /// Domain name of the current site
    #[arg(short = 'c', long = "current_domain", value_name = "DOMAIN NAME")]
    current_domain: Option<String>,

    /// Domain name of the new site
    #[arg(short = 'n', long = "new_domain", value_name = "DOMAIN NAME")]
    new_domain: Option<String>,

    /// File system path to the current site
    #[arg(short = 's', long = "current_path", value_name = "CURRENT SITE PATH")]
    current_path: Option<String>,

    /// File system path to the new site
    #[arg(short = 'p', long = "new_path", value_name = "NEW SITE PATH")]
    new_path: Option<String>,

    /// mysqldump file to migrate
    file: Option<PathBuf>,
}

impl From<Cli> for Options {
    fn from(cli: Cli) -> Self {
        Options {
            table_prefix: cli.table_prefix,
            all_data: cli.all_data,
            current_domain: cli.current_domain,
            new_domain: cli.new_domain,
            current_path: cli.current_path,
            new_path: cli.new_path,
            file: cli.file,
        }
    }
}

fn run(options: Options) -> ee_dump_migrator::Result<()> {
    let params = options.rewrite_params()?;
    let file = options.input_file()?;

    let migrator = Migrator::new(params)?;
    info!(
        "migrating {} with table prefix {}",
        file.display(),
        migrator.params().table_prefix
    );
    let reader = BufReader::new(File::open(file)?);
    let stdout = io::stdout();
    let writer = BufWriter::new(stdout.lock());
    migrator.run(reader, writer)?;
    Ok(())
}

fn main() {
    env_logger::init();

    let options = Options::from(Cli::parse());
    if let Err(e) = run(options) {
        eprintln!("{}", e);
        process::exit(1);
    }
}
