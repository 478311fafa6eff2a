use std::process::ExitCode;

fn main() -> ExitCode {
    cre_recovery::logging::init();

    let Err(err) = cre_recovery::app::run() else {
        return ExitCode::SUCCESS;
    };
    tracing::debug!(exit_code = err.exit_code(), "run failed");
    eprintln!("{err}");
    ExitCode::from(err.exit_code())
}
