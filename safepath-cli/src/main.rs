//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = safepath_cli::run() {
        eprintln!("safepath: {err}");
        std::process::exit(1);
    }
}
