#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = treedit_cli::run_from_env() {
        eprintln!("treedit: {error}");
        std::process::exit(error.exit_code());
    }
}
