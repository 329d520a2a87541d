use std::process::ExitCode;

fn main() -> ExitCode {
    fengshui_cli::run()
}
