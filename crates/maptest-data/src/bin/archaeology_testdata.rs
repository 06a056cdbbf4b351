//! Generate archaeology test datasets with random RD points and boxes.
//!
//! Argument handling and the run itself live in `maptest_data::cli`, so this
//! binary only selects the dataset variant.
//!
//! # Examples
//! ```sh
//! cargo run -p maptest-data --bin archaeology-testdata -- -n 5 -a "$DATAVERSE_API_TOKEN"
//! ```

use std::process::ExitCode;

use maptest_data::DatasetVariant;
use maptest_data::cli;

fn main() -> ExitCode {
    cli::run(DatasetVariant::Archaeology)
}
