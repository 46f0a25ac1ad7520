mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    approval::ApprovalSubcommand, config::ConfigSubcommand, content::ContentSubcommand,
    engine::EngineSubcommand, job::JobSubcommand, keyword::KeywordSubcommand,
    schedule::ScheduleSubcommand,
};
use pressroom_core::{access::Actor, types::Role};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pressroom",
    about = "Human-gated publishing orchestrator — manage content, schedules, jobs, and approvals",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root (default: auto-detect from .pressroom/ or .git/)
    #[arg(long, global = true, env = "PRESSROOM_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Acting identity recorded on mutations
    #[arg(long, global = true, env = "PRESSROOM_ACTOR", default_value = "operator")]
    actor: String,

    /// Role of the acting identity: super, admin, editor, or viewer
    #[arg(long, global = true, env = "PRESSROOM_ROLE", default_value = "super")]
    role: String,

    /// Brand scope of the acting identity (required for brand-scoped roles)
    #[arg(long, global = true, env = "PRESSROOM_BRAND")]
    brand: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the pressroom data directory
    Init,

    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "4100")]
        port: u16,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Manage content entities
    Content {
        #[command(subcommand)]
        subcommand: ContentSubcommand,
    },

    /// Manage production schedules
    Schedule {
        #[command(subcommand)]
        subcommand: ScheduleSubcommand,
    },

    /// Manage a schedule's keyword queue
    Keyword {
        #[command(subcommand)]
        subcommand: KeywordSubcommand,
    },

    /// Manage scheduler jobs
    Job {
        #[command(subcommand)]
        subcommand: JobSubcommand,
    },

    /// Request, review, and execute action approvals
    Approval {
        #[command(subcommand)]
        subcommand: ApprovalSubcommand,
    },

    /// Engine liveness, pause flag, and heartbeats
    Engine {
        #[command(subcommand)]
        subcommand: EngineSubcommand,
    },

    /// Show the audit trail
    Audit {
        /// Restrict to one entity id
        #[arg(long)]
        entity: Option<String>,

        /// Maximum entries to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let root = root::resolve_root(cli.root.as_deref());

    let role: Role = cli.role.parse()?;
    let actor = match &cli.brand {
        Some(brand) => Actor::with_brand(cli.actor.as_str(), role, brand.as_str()),
        None => Actor::new(cli.actor.as_str(), role),
    };

    match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Content { subcommand } => cmd::content::run(&root, &actor, subcommand, cli.json),
        Commands::Schedule { subcommand } => {
            cmd::schedule::run(&root, &actor, subcommand, cli.json)
        }
        Commands::Keyword { subcommand } => cmd::keyword::run(&root, &actor, subcommand, cli.json),
        Commands::Job { subcommand } => cmd::job::run(&root, &actor, subcommand, cli.json),
        Commands::Approval { subcommand } => cmd::approval::run(&root, &actor, subcommand, cli.json),
        Commands::Engine { subcommand } => cmd::engine::run(&root, &actor, subcommand, cli.json),
        Commands::Audit { entity, limit } => {
            cmd::audit::run(&root, entity.as_deref(), limit, cli.json)
        }
    }
}
