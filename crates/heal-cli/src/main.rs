mod output;

use anyhow::Context;
use clap::Parser;
use heal_core::config::{Config, KEY_ENV, URL_ENV};
use heal_core::event::HealEvent;
use heal_core::heal::Healer;
use heal_core::store::RestStore;

#[derive(Parser)]
#[command(
    name = "test-and-heal",
    about = "Test the submission approval flow and surface schema fixes for known failures",
    version
)]
struct Cli {
    /// Store base URL
    #[arg(long, env = URL_ENV, hide = true)]
    url: Option<String>,

    /// Service credential for the store
    #[arg(long, env = KEY_ENV, hide = true)]
    service_key: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

/// Returns whether the approval flow ended up working.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = Config::new(cli.url.as_deref(), cli.service_key.as_deref())?;
    let store = RestStore::new(&config).context("failed to build HTTP client")?;

    let mut render = |event: &HealEvent| {
        for line in output::format_event(event) {
            println!("{line}");
        }
    };
    let report = Healer::new(&config, &store).run(&mut render);
    tracing::debug!(outcome = %report.outcome, invocations = report.invocations(), "run finished");

    Ok(report.outcome.is_success())
}
