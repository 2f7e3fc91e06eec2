//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::app::AppContext;
use crate::config::Config;
use crate::{http, telemetry};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "todocache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Path to a TOML config file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Use in-process cache and store instead of Redis and the database"
    )]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "serve", about = "Run the HTTP service")]
    Serve,

    #[command(name = "list", about = "List all records through the cache")]
    List(ListArgs),

    #[command(name = "create", about = "Create a record and invalidate the cached listing")]
    Create(CreateArgs),

    #[command(name = "invalidate", about = "Drop the cached collection snapshot")]
    Invalidate,

    #[command(name = "status", about = "Probe cache and store health")]
    Status(StatusArgs),
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    #[arg(short, long, help = "Output in JSON format")]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    #[arg(help = "Task text")]
    pub task: String,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[arg(short, long, help = "Output in JSON format")]
    pub json: bool,
}

mod records;
mod status;

pub async fn run() -> Result<()> {
    execute(Cli::parse()).await
}

/// 加载配置并初始化日志后执行子命令
///
/// 所有子命令共用同一套日志输出
pub async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let provider = telemetry::init_tracing(&config.telemetry);

    let result = dispatch(&cli, config).await;

    telemetry::shutdown(provider);
    result
}

async fn dispatch(cli: &Cli, config: Config) -> Result<()> {
    let memory = cli.memory;
    match &cli.command {
        Commands::Serve => http::serve(connect(config, memory).await?).await,
        Commands::List(args) => records::list(connect(config, memory).await?, args).await,
        Commands::Create(args) => records::create(connect(config, memory).await?, args).await,
        Commands::Invalidate => records::invalidate(connect(config, memory).await?).await,
        Commands::Status(args) => status::execute(connect(config, memory).await?, args).await,
    }
}

async fn connect(config: Config, memory: bool) -> Result<AppContext> {
    if memory {
        return Ok(AppContext::in_memory(config));
    }
    AppContext::init(config)
        .await
        .context("Failed to initialize application")
}
