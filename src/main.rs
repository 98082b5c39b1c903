//! codenav-engine CLI entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use codenav_engine::cli::{Cli, Commands, OutputFormat};
use codenav_engine::engine::{CodeNavEngine, HierarchyRequest, RootTarget};
use codenav_engine::error::CodeNavError;
use codenav_engine::index::StaticIndex;
use codenav_engine::mcp_server::formatting::format_envelope;
use codenav_engine::mcp_server::CodeNavServer;
use codenav_engine::EngineConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if matches!(cli.command, Commands::Serve) {
        return serve(cli);
    }

    match run(cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            for hint in e.recovery_hints() {
                eprintln!("  hint: {}", hint);
            }
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> codenav_engine::Result<String> {
    let config = load_config(&cli)?;
    let engine = build_engine(&cli, config)?;
    let format = match cli.format {
        OutputFormat::Json => Some("json"),
        OutputFormat::Text => None,
    };
    let cancel = CancellationToken::new();

    let envelope = match cli.command {
        Commands::Callers(args) => {
            let request = HierarchyRequest {
                depth: Some(args.depth),
                direction: args.direction.to_direction(),
                max_results: args.limit,
                include_external: args.include_external,
            };
            engine.call_hierarchy(&RootTarget::Name(args.symbol), &request, &cancel)?
        }
        Commands::Overrides(args) => {
            let request = HierarchyRequest {
                depth: Some(args.depth),
                direction: args.direction.to_direction(),
                max_results: args.limit,
                include_external: false,
            };
            engine.override_hierarchy(&RootTarget::Name(args.symbol), &request, &cancel)?
        }
        Commands::References(args) => {
            engine.find_references(&RootTarget::Name(args.symbol), args.limit, &cancel)?
        }
        Commands::Diagnostics(args) => engine.diagnostics(
            args.file.as_deref(),
            args.severity.map(|s| s.to_severity()),
            args.limit,
            &cancel,
        )?,
        Commands::Rename(args) => engine.plan_rename(
            &RootTarget::Name(args.symbol),
            &args.new_name,
            args.limit,
            &cancel,
        )?,
        Commands::Summary => engine.index_summary(),
        Commands::Serve => unreachable!("serve is dispatched before run"),
    };

    Ok(format_envelope(&envelope, format))
}

fn serve(cli: Cli) -> ExitCode {
    match try_serve(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_serve(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let engine = build_engine(&cli, config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        use rmcp::{transport::stdio, ServiceExt};

        tracing::info!(
            "Starting codenav-engine MCP server v{}",
            env!("CARGO_PKG_VERSION")
        );

        let server = CodeNavServer::new(engine);
        let service = server.serve(stdio()).await?;

        tracing::info!("MCP server initialized, waiting for requests...");
        service.waiting().await?;

        tracing::info!("MCP server shutting down");
        Ok(())
    })
}

fn load_config(cli: &Cli) -> codenav_engine::Result<EngineConfig> {
    match &cli.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn build_engine(cli: &Cli, config: EngineConfig) -> codenav_engine::Result<CodeNavEngine<StaticIndex>> {
    let path: &PathBuf = cli.index.as_ref().ok_or_else(|| CodeNavError::SnapshotFailure {
        message: "no index snapshot provided (use --index or CODENAV_INDEX)".to_string(),
    })?;
    let index = StaticIndex::from_json_file(path)?;
    tracing::debug!(snapshot = %path.display(), "index snapshot loaded");
    Ok(CodeNavEngine::new(index, config))
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "codenav_engine=debug"
    } else {
        "codenav_engine=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // stdout must stay clean: serve mode speaks JSON-RPC on it, query mode
    // prints the result alone.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
