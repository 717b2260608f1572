use std::process::ExitCode;

fn main() -> ExitCode {
    estately_cli::run()
}
