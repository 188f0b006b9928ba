#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = ucs_game::run_from_env() {
        eprintln!("ucs-demo: {error}");
        std::process::exit(error.exit_code());
    }
}
