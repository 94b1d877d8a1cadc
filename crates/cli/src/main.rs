use std::process::ExitCode;

fn main() -> ExitCode {
    recal_cli::run()
}
