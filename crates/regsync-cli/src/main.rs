use add::add;
use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use regsync_config::config::{config_path, Config};
use regsync_operations::{RegsyncContext, Result, Settings, SyncOptions};
use sync::sync_catalog;
use tracing::debug;
use utils::disable_color;
use validate::validate;
use verify::{verify_key, VerifyRequest};

mod add;
mod cli;
mod logging;
mod sync;
mod utils;
mod validate;
mod verify;

async fn handle_cli() -> Result<bool> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        disable_color();
    }

    let config = Config::load(args.config.as_deref())?;
    debug!(path = %config_path(args.config.as_deref()).display(), "loaded config");

    match args.command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(true)
        }
        Commands::Add { command } => {
            let ctx = RegsyncContext::from_config(&config)?;
            let (kind, repository, output) = command.into_parts();
            add(&ctx, kind, &repository, output, args.json).await
        }
        Commands::Sync { filter } => {
            let ctx = RegsyncContext::from_config(&config)?;
            sync_catalog(&ctx, &filter.into(), args.json).await
        }
        Commands::VerifyKey {
            namespace,
            provider,
            key_files,
            username,
            output,
        } => {
            let ctx = RegsyncContext::from_config(&config)?;
            let request = VerifyRequest {
                namespace,
                provider,
                key_files,
                username,
                output,
            };
            verify_key(&ctx, request, args.json).await
        }
        Commands::Validate { filter } => {
            validate(&Settings::from_config(&config), &filter.into(), args.json)
        }
    }
}

#[tokio::main]
async fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    match handle_cli().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(1);
        }
    }
}
