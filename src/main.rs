use tracing::error;
use wakalog::cli::{exit_code, run_cli};

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        error!("Error running cli {e:?}");
        let (message, code) = exit_code(&e);
        eprintln!("{message}");
        std::process::exit(code);
    }
}
