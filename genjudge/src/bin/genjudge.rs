use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use genjudge::{
    cfg::Config,
    debug::DebugReader,
    display::{ScoreTier, clamp_text, short_address},
    gallery::GalleryReader,
    pipeline::SubmissionPipeline,
    rpc::RpcConnector,
    session::SessionCache,
    types::{GalleryEntry, JudgeRequest, Mode},
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// TOML configuration. When omitted, the configuration is read from the environment.
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(long, default_value = "false")]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit content for judging and wait for the verdict.
    Submit {
        #[clap(long)]
        account: String,
        /// One of genlayer, startup, article, meme or general. Unrecognised modes are judged as general.
        #[clap(long, default_value = "general")]
        mode: String,
        #[clap(long, default_value = "")]
        title: String,
        #[clap(long, default_value = "")]
        url: String,
        #[clap(long)]
        content_file: PathBuf,
    },
    /// Print the public gallery, highest score first.
    Gallery {
        #[clap(long)]
        account: String,
    },
    /// Print the diagnostics of the account's last judging call.
    Debug {
        #[clap(long)]
        account: String,
    },
}

#[derive(Serialize)]
struct GalleryRow {
    tier: ScoreTier,
    short_author: String,
    summary: String,
    #[serde(flatten)]
    entry: GalleryEntry,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::from_env());
    };
    let config = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_line_number(true)
        .with_ansi(false);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = load_config(args.config.as_ref())?;
    config.validate()?;
    info!(endpoint = %config.endpoint, network = %config.network.name, "loaded configuration");

    let sessions = Arc::new(SessionCache::new(config, RpcConnector));

    match args.command {
        Command::Submit {
            account,
            mode,
            title,
            url,
            content_file,
        } => {
            let content = tokio::fs::read_to_string(&content_file)
                .await
                .with_context(|| format!("failed to read {}", content_file.display()))?;
            let request = JudgeRequest::new(Mode::parse_lenient(&mode), title, url, content)?;
            let result = SubmissionPipeline::new(sessions)
                .submit(&account, &request)
                .await?;
            info!(tier = %ScoreTier::from_total(result.total), "verdict");
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Gallery { account } => {
            let rows: Vec<_> = GalleryReader::new(sessions)
                .list(&account)
                .await
                .into_iter()
                .map(|entry| GalleryRow {
                    tier: ScoreTier::from_total(entry.total),
                    short_author: short_address(&entry.author),
                    summary: clamp_text(&entry.feedback, 120),
                    entry,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Debug { account } => {
            let info = DebugReader::new(sessions).get(&account).await;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
