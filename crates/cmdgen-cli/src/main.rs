mod args;
mod cmd;
mod output;
mod project;
mod root;

use args::FormArgs;
use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, draft::DraftSubcommand, history::HistorySubcommand,
    workflow::WorkflowSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cmdgen",
    about = "Fill in command templates for AI coding assistants and track workflow progress",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .cmdgen/ or .git/)
    #[arg(long, global = true, env = "CMDGEN_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize cmdgen in the current project
    Init,

    /// List catalog commands
    Commands {
        /// Only commands of this stage
        #[arg(long)]
        stage: Option<String>,
    },

    /// List workflows and their steps
    Workflows,

    /// Preview a command without recording it
    Render(FormArgs),

    /// Render a command and record it in history and guidance
    Generate {
        #[command(flatten)]
        form: FormArgs,

        /// Workflow id or title used for the next-step recommendation
        #[arg(long)]
        workflow: Option<String>,

        /// Refuse to generate while required fields are empty
        #[arg(long)]
        strict: bool,
    },

    /// Recommend the next command
    Next {
        /// Workflow id or title to tailor the recommendation
        #[arg(long)]
        workflow: Option<String>,
    },

    /// Show stage progress
    Status {
        /// Forget all recorded progress
        #[arg(long)]
        reset: bool,
    },

    /// Check required fields and prompt quality for a command
    Check(FormArgs),

    /// Run workflows
    Workflow {
        #[command(subcommand)]
        subcommand: WorkflowSubcommand,
    },

    /// Browse and prune generated commands
    History {
        #[command(subcommand)]
        subcommand: HistorySubcommand,
    },

    /// Export a history entry as markdown, text or JSON
    Export {
        /// History entry id
        id: String,

        /// md, txt or json
        #[arg(long, default_value = "md")]
        format: String,

        /// Directory to write into (default: project root)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the payload instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Inspect or discard the saved draft
    Draft {
        #[command(subcommand)]
        subcommand: DraftSubcommand,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let json = cli.json;

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Commands { stage } => cmd::commands::run(&root, stage.as_deref(), json),
        Commands::Workflows => cmd::workflows::run(&root, json),
        Commands::Render(form) => cmd::render::run(&root, &form, json),
        Commands::Generate {
            form,
            workflow,
            strict,
        } => cmd::generate::run(&root, &form, workflow.as_deref(), strict, json),
        Commands::Next { workflow } => cmd::next::run(&root, workflow.as_deref(), json),
        Commands::Status { reset } => cmd::status::run(&root, reset, json),
        Commands::Check(form) => cmd::check::run(&root, &form, json),
        Commands::Workflow { subcommand } => cmd::workflow::run(&root, subcommand, json),
        Commands::History { subcommand } => cmd::history::run(&root, subcommand, json),
        Commands::Export {
            id,
            format,
            out,
            stdout,
        } => cmd::export::run(&root, &id, &format, out, stdout, json),
        Commands::Draft { subcommand } => cmd::draft::run(&root, subcommand, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
