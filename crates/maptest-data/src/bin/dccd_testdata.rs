//! Generate DCCD test datasets with one random WGS84 point location.
//!
//! # Examples
//! ```sh
//! cargo run -p maptest-data --bin dccd-testdata -- --dry-run --seed 7
//! ```

use std::process::ExitCode;

use maptest_data::DatasetVariant;
use maptest_data::cli;

fn main() -> ExitCode {
    cli::run(DatasetVariant::Dccd)
}
