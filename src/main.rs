use anyhow::Context;
use clap::Parser;
use syncplan::config::{Cli, Command, FileConfig};
use syncplan::editor::EditorSelector;
use syncplan::logging::init_logging;
use syncplan::{commands, ExecuteRequest, GenerateRequest};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let file_config = FileConfig::discover(cli.config.as_deref(), &cwd)?;

    let log_level = cli.log_level.as_deref().or(file_config.log_level.as_deref());
    let log_format = cli.log_format.or(file_config.log_format).unwrap_or_default();
    init_logging(log_level, cli.verbose, log_format)?;
    tracing::debug!(version = syncplan::VERSION, "starting");

    match &cli.command {
        Command::Plan(args) => {
            let request = GenerateRequest::from_cli(args, &file_config)?;
            let editor = args
                .edit
                .then(|| EditorSelector::from_env(args.editor.clone()));
            commands::plan::run(&request, editor)
                .with_context(|| format!("plan generation failed for {}", request.source.display()))?;
        }
        Command::Apply(args) => {
            let request = ExecuteRequest::from_cli(args, &file_config);
            commands::apply::run(&request)
                .with_context(|| format!("applying {} failed", request.plan.display()))?;
        }
    }

    Ok(())
}
