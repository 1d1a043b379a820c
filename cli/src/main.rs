use clap::Parser;
use scm_cli::Cli;

/// Exit status for failures before the shell starts (bad settings, credentials, auth).
const EXIT_STARTUP_FAILED: i32 = 2;

fn main() {
    let cli = Cli::parse();
    let code = match scm_cli::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            EXIT_STARTUP_FAILED
        }
    };
    std::process::exit(code);
}
