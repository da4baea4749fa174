use clap::Parser;
use job_tracker::cli::commands::{cmd_classify, cmd_extract, cmd_run, cmd_snapshots};
use job_tracker::cli::config::{Cli, Commands, load_config, resolve_settings};
use job_tracker::logging::init_logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // CLI > config file > defaults
    let config = load_config(cli.config.as_deref());
    let settings = resolve_settings(&cli, &config);

    match &cli.command {
        Commands::Classify { page, form } => {
            cmd_classify(page, form.as_deref())?;
        }
        Commands::Extract {
            page,
            form,
            date_format,
            send,
        } => {
            cmd_extract(page, form.as_deref(), date_format.as_deref(), *send, &settings)?;
        }
        Commands::Run {
            script,
            format,
            output,
        } => {
            let all_passed = cmd_run(script, format, output.as_deref(), &settings)?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Snapshots { action } => {
            cmd_snapshots(action, &settings)?;
        }
    }

    Ok(())
}
