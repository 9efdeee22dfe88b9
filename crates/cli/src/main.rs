use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pure_ide_protocol::DiagramInfo;
use pure_ide_session::{
    ExecutionOutcome, HttpSessionClient, IdeSession, SessionClient, SessionConfig,
};
use pure_ide_tree::{LogNotifier, Notifier, TreeEngine, TreeSource};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod render;

#[derive(Parser)]
#[command(name = "pure-ide")]
#[command(about = "Headless client for the Pure IDE server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// IDE server URL (overrides config and PURE_IDE_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the workspace and run go()
    ExecuteGo {
        /// Files to open before executing
        #[arg(long = "open", value_name = "FILE")]
        open: Vec<String>,
    },

    /// Run the tests under a package path
    Test {
        /// Package path, `::` for everything
        path: String,

        /// Only run tests affected by recent changes
        #[arg(long)]
        relevant_only: bool,
    },

    /// Print the directory or concept tree
    Tree {
        #[arg(value_enum)]
        kind: TreeKind,

        /// Node ids to expand, in order
        #[arg(long = "expand", value_name = "ID")]
        expand: Vec<String>,
    },

    /// Rebuild a diagram payload offline and print it in grammar form
    Diagram {
        /// JSON diagram payload as served by the IDE
        payload: PathBuf,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum TreeKind {
    Directory,
    Concept,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Diagram { ref payload } => run_diagram(payload.clone()),
        Commands::ExecuteGo { ref open } => {
            let session = connect(&cli).await?;
            run_execute_go(&session, open).await
        }
        Commands::Test {
            ref path,
            relevant_only,
        } => {
            let session = connect(&cli).await?;
            run_tests(&session, path, relevant_only).await
        }
        Commands::Tree { kind, ref expand } => {
            let session = connect(&cli).await?;
            match kind {
                TreeKind::Directory => print_tree(session.directory_tree(), expand).await,
                TreeKind::Concept => print_tree(session.concept_tree(), expand).await,
            }
        }
    }
}

async fn connect(cli: &Cli) -> Result<IdeSession> {
    let mut config =
        SessionConfig::load(cli.config.as_deref()).context("Failed to load session config")?;
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    let client: Arc<dyn SessionClient> =
        Arc::new(HttpSessionClient::new(&config).context("Failed to create session client")?);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let session = IdeSession::new(client, notifier, config);
    session
        .initialize(false)
        .await
        .context("Failed to initialize IDE session")?;
    if let Some(error) = session.session_error().await {
        bail!("Session corrupted: {error}");
    }
    Ok(session)
}

async fn run_execute_go(session: &IdeSession, open: &[String]) -> Result<()> {
    for path in open {
        session
            .load_file(path, None)
            .await
            .with_context(|| format!("Failed to open {path}"))?;
    }
    let outcome = session.execute_go().await.context("Execution failed")?;
    print!("{}", render::console(&session.console_text().await));
    match outcome {
        ExecutionOutcome::Completed(result) if result.is_failure() => {
            bail!("Execution failed")
        }
        ExecutionOutcome::Completed(_) => Ok(()),
        ExecutionOutcome::Rejected => bail!("Execution was rejected"),
        ExecutionOutcome::SessionCorrupted(error) => bail!("Session corrupted: {error}"),
    }
}

async fn run_tests(session: &IdeSession, path: &str, relevant_only: bool) -> Result<()> {
    let outcome = session
        .execute_tests(path, relevant_only)
        .await
        .context("Test run failed")?;
    if let ExecutionOutcome::SessionCorrupted(error) = outcome {
        bail!("Session corrupted: {error}");
    }
    let Some(runner) = session.test_runner().await else {
        print!("{}", render::console(&session.console_text().await));
        bail!("Tests did not start");
    };
    let summary = runner.summary().await;
    print!("{}", render::test_summary(&summary));
    if summary.failed + summary.errors > 0 {
        bail!("{} test(s) did not pass", summary.failed + summary.errors);
    }
    Ok(())
}

async fn print_tree<S: TreeSource>(tree: &TreeEngine<S>, expand: &[String]) -> Result<()> {
    for id in expand {
        tree.expand_node(id)
            .await
            .with_context(|| format!("Failed to expand {id}"))?;
    }
    print!("{}", render::tree(tree.snapshot().as_ref()));
    Ok(())
}

fn run_diagram(payload: PathBuf) -> Result<()> {
    let text = fs::read_to_string(&payload)
        .with_context(|| format!("Failed to read {}", payload.display()))?;
    let info: DiagramInfo = serde_json::from_str(&text).context("Invalid diagram payload")?;
    let (diagram, graph, stubs) = pure_ide_graph::build(&info).context("Invalid diagram")?;
    log::info!(
        "Rebuilt {} with {} element(s) and {} stub class(es)",
        diagram.path,
        graph.node_count(),
        stubs.stubbed_paths().len()
    );
    for path in stubs.stubbed_paths() {
        log::warn!("Stub class {path}");
    }
    println!("{}", pure_ide_graph::serialize_diagram(&diagram));
    Ok(())
}
