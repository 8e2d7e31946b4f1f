use std::process;

fn main() {
    process::exit(netwalkrs::cli::run_cli());
}
