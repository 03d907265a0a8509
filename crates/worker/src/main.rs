use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod stages;

#[derive(Debug, Parser)]
#[command(name = "sampro_worker", about = "Daily YouTube stock-pick digest")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Force debug-level logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Plan and log slides and email without touching Google Slides or Gmail.
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Search the tracked channels and save recent videos.
    Discover,
    /// Analyze saved videos and save recommendations.
    Extract,
    /// Render saved recommendations into the deck.
    Slides,
    /// Email the deck link.
    Email,
    /// All stages in order.
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let settings = sampro_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let ctx = stages::Ctx::new(settings, args.dry_run);
    let result = match args.command {
        Command::Discover => stages::discover(&ctx).await,
        Command::Extract => stages::extract(&ctx).await.map(|_| ()),
        Command::Slides => stages::slides(&ctx, None).await,
        Command::Email => stages::email(&ctx).await,
        Command::Run => stages::run_all(&ctx).await,
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        let chain = format!("{err:#}");
        tracing::error!(command = ?args.command, error = %chain, "stage failed");
    }
    result
}

fn init_sentry(settings: &sampro_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_accepted_after_subcommand() {
        let args = Args::try_parse_from(["sampro_worker", "slides", "--dry-run", "--debug"]).unwrap();
        assert!(matches!(args.command, Command::Slides));
        assert!(args.dry_run);
        assert!(args.debug);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["sampro_worker"]).is_err());
    }
}
