//! Binary entry point for `walbatch`.

use std::process;

fn main() {
    if let Err(e) = walbatch::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
