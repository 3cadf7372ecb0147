use std::process::ExitCode;

fn main() -> ExitCode {
    quickgpt::cli::main()
}
