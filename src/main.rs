use colored::Colorize;
use json_dbgen::cli::CommandLineInterface;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let report = CommandLineInterface::load().run()?;
    if !report.failures.is_empty() {
        eprintln!(
            "{} {} generated, {} failed",
            "done".yellow().bold(),
            report.generated.len(),
            report.failures.len()
        );
    }
    Ok(())
}
