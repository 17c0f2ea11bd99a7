use std::process::ExitCode;

fn main() -> ExitCode {
    flightbook_cli::run()
}
