//! CLI entry point - the composition root.
//!
//! Parses arguments, bootstraps the context and dispatches to handlers.
//! Errors are printed and mapped to exit codes.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use folio_cli::handlers::fetch::FetchArgs;
use folio_cli::{Cli, CliConfig, CliContext, CliError, Commands, bootstrap, handlers};

fn init_logging(verbose: bool) {
    let default = if verbose { "folio=debug" } else { "folio=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig::from_env().with_data_dir(cli.data_dir);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Paths => handlers::paths::execute(&config.settings),
        command => {
            let ctx = bootstrap(config).await?;
            dispatch(&ctx, command).await
        }
    }
}

async fn dispatch(ctx: &CliContext, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Paths => handlers::paths::execute(&ctx.settings),
        Commands::Scrub { minimal, json } => handlers::scrub::execute(ctx, minimal, json).await,
        Commands::Fetch {
            base_url,
            folder,
            high,
            names,
        } => {
            let args = FetchArgs {
                base_url: &base_url,
                folder: &folder,
                high,
                names: &names,
            };
            handlers::fetch::execute(ctx, args).await
        }
        Commands::Evict { names } => handlers::evict::execute(ctx, &names).await.map(|_| ()),
        Commands::Daemon => handlers::daemon::execute(ctx).await,
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables before settings read them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
