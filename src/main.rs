use clap::Parser;
use formscope::cli::commands::{cmd_detect, cmd_fill};
use formscope::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Detect {
            html,
            container,
            test_mode,
            format,
        } => {
            cmd_detect(&html, container.as_deref(), test_mode, &format, config)?;
        }
        Commands::Fill {
            html,
            values,
            trace,
            output,
        } => {
            let all_applied = cmd_fill(&html, &values, trace.as_deref(), output.as_deref(), config).await?;
            if !all_applied {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
