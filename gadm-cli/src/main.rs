//! Entry point for the `gadm` command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = gadm_cli::run() {
        eprintln!("gadm: {err}");
        std::process::exit(1);
    }
}
