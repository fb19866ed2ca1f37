use clap::{Parser, Subcommand};
use parley::config::StoreConfig;
use parley::error::Result;
use parley::memory::{ConversationStore, SearchCache};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Inspect and maintain the bot's conversation history and search cache")]
struct Cli {
    /// YAML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 覆盖配置中的数据目录
    #[arg(long, global = true, env = "PARLEY_DATA_DIR")]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 会话历史
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// 搜索结果缓存
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// 列出所有会话及消息条数
    List,
    /// 打印某个会话的全部消息
    Show { identity: String },
    /// 删除某个会话并立即落盘
    Clear { identity: String },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// 按查询读取缓存（过期条目会被淘汰）
    Get { query: String },
    /// 清理全部过期条目
    Purge,
    /// 显示缓存文件路径、条目数与 TTL
    Stats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "parley=info".into()))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::History { command } => {
            let history: ConversationStore = ConversationStore::open(config.conversations_path());
            match command {
                HistoryCommand::List => {
                    for identity in history.identities().await {
                        let turns = history.get(&identity).await.unwrap_or_default();
                        println!("{identity}\t{}", turns.len());
                    }
                }
                HistoryCommand::Show { identity } => match history.get(&identity).await {
                    Some(turns) => {
                        for turn in turns {
                            println!("[{}] {}", turn.role, turn.content);
                        }
                    }
                    None => println!("(no history for {identity})"),
                },
                HistoryCommand::Clear { identity } => {
                    if history.delete(&identity).await {
                        history.save().await?;
                        println!("cleared {identity}");
                    } else {
                        println!("nothing to clear for {identity}");
                    }
                }
            }
        }
        Commands::Cache { command } => {
            let cache = SearchCache::open(config.search_cache_path(), config.search_cache_ttl_secs);
            match command {
                CacheCommand::Get { query } => match cache.get(&query).await {
                    Some(data) => println!("{}", serde_json::to_string_pretty(&data)?),
                    None => println!("(miss)"),
                },
                CacheCommand::Purge => {
                    let purged = cache.purge_expired().await;
                    println!("purged {purged} expired entries");
                }
                CacheCommand::Stats => {
                    let ttl = match cache.ttl() {
                        Some(ttl) => format!("{}s", ttl.as_secs()),
                        None => "never expires".to_string(),
                    };
                    println!("path: {}", config.search_cache_path().display());
                    println!("entries: {}", cache.len().await);
                    println!("ttl: {ttl}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_every_subcommand_has_help_text() {
        let cli = Cli::command();
        cli.clone().debug_assert();
        for group in cli.get_subcommands() {
            assert!(group.get_about().is_some(), "{} 缺少说明", group.get_name());
            for sub in group.get_subcommands() {
                assert!(
                    sub.get_about().is_some(),
                    "{} {} 缺少说明",
                    group.get_name(),
                    sub.get_name()
                );
            }
        }
    }
}
