use clap::Parser;
use focus_fill::cli::commands::{CommandContext, FillArgs, cmd_answer, cmd_fill, cmd_scan};
use focus_fill::cli::config::{Cli, Commands, init_logging, load_config, logs_dir};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    // Resolve Ollama settings: CLI > config > defaults
    let ctx = CommandContext {
        config: &config,
        logs_dir: logs_dir(&config, cli.out_dir.as_deref()),
        headless: cli.headless,
        ollama_endpoint: cli
            .ollama_endpoint
            .as_deref()
            .or(config.ollama.endpoint.as_deref()),
        ollama_model: cli
            .ollama_model
            .as_deref()
            .or(config.ollama.model.as_deref()),
    };

    match &cli.command {
        Commands::Scan { target } => {
            cmd_scan(&ctx, target)?;
        }
        Commands::Fill {
            target,
            fields_yaml,
            answers_yaml,
            profile_yaml,
            max_tabs,
            loop_detect_threshold,
            screenshot_name,
            trace,
        } => {
            cmd_fill(
                &ctx,
                &FillArgs {
                    target,
                    fields_yaml: fields_yaml.as_deref(),
                    answers_yaml: answers_yaml.as_deref(),
                    profile_yaml: profile_yaml.as_deref(),
                    max_tabs: *max_tabs,
                    loop_detect_threshold: *loop_detect_threshold,
                    screenshot_name: screenshot_name.as_deref(),
                    trace: trace.as_deref(),
                },
            )?;
        }
        Commands::Answer {
            fields_yaml,
            profile_yaml,
            answers_yaml,
            backend,
        } => {
            cmd_answer(&ctx, fields_yaml, profile_yaml, answers_yaml.as_deref(), backend)?;
        }
    }

    Ok(())
}
