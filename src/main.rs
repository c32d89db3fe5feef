use clap::Parser;
use statcan::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    if let Err(error) = commands::run(args) {
        eprintln!("{}", commands::error_report(&error));
        process::exit(1);
    }
}
