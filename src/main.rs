//! Weaver 命令行入口
//!
//! 子命令：run（执行一个任务）、autopilot（批量发帖回帖）、tools（列出已注册工具）。

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use weaver::config::load_config;
use weaver::core::EngineBuilder;
use weaver::observability;
use weaver::tools::Tool;

#[derive(Debug, Parser)]
#[command(name = "weaver", about = "论坛内容生成编排器")]
struct Cli {
    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 编译并执行一个任务，输出结果 JSON
    Run {
        #[arg(value_name = "TASK")]
        task: String,
        /// 合并进每个步骤的参数（JSON 对象）
        #[arg(long)]
        params: Option<String>,
    },
    /// 批量发帖与回帖
    Autopilot {
        #[arg(long)]
        posts: Option<usize>,
        #[arg(long)]
        replies: Option<usize>,
    },
    /// 列出已注册的工具
    Tools,
}

fn parse_params(raw: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).context("--params is not valid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("--params must be a JSON object"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.clone()).context("Failed to load config")?;
    let engine = EngineBuilder::new(config.clone())
        .build()
        .context("Failed to build engine")?;

    match cli.command {
        Command::Run { task, params } => {
            let extra = params.as_deref().map(parse_params).transpose()?;
            let outcome = engine.scheduler.run(&task, extra.as_ref()).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Autopilot { posts, replies } => {
            let report = engine
                .autopilot
                .run_with(
                    posts.unwrap_or(config.autopilot.posts_per_run),
                    replies.unwrap_or(config.autopilot.replies_per_run),
                )
                .await
                .context("Autopilot run failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Tools => {
            for tool in engine.tools.list() {
                println!("{}\t{}", tool.name(), tool.description());
            }
        }
    }

    Ok(())
}
