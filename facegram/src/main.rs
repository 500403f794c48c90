use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegram::api::types::RegisterRequest;
use facegram::api::{ApiError, FacegramRest};
use facegram::compose::NewPostDraft;
use facegram::config::{self, Config};
use facegram::feed::{posts::HomeFeed, spawn_feed};
use facegram::session::Session;
use facegram::tui;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facegram", about = "Terminal client for Facegram")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Browse the home feed (default)
    Feed,
    /// Create a new account
    Register,
    /// Publish a post with image attachments
    Post {
        #[arg(long)]
        caption: String,
        /// Image files to attach
        files: Vec<PathBuf>,
        /// Leave out the attachment at INDEX (0-based, counted after non-images are skipped)
        #[arg(long = "drop", value_name = "INDEX")]
        drop: Vec<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = std::fs::File::create("facegram.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("facegram=info")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();

    let config = Config::load(&cli.config)?;
    Config::load_env_file();

    let rest = Arc::new(FacegramRest::new(
        &config.api.base_url,
        config.api.request_timeout(),
    )?);

    match cli.command.unwrap_or(Command::Feed) {
        Command::Feed => browse(rest, &config).await,
        Command::Register => register(&rest).await,
        Command::Post {
            caption,
            files,
            drop,
        } => publish(&rest, caption, files, &drop).await,
    }
}

async fn login(rest: &FacegramRest) -> Result<Session> {
    let username = Config::username()?;
    let password = Config::password()?;
    rest.login(&username, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e.user_message()))
}

async fn logout(rest: &FacegramRest, session: Session) {
    if let Err(e) = rest.logout(session).await {
        tracing::warn!(error = %e, "logout failed");
    }
}

async fn browse(rest: Arc<FacegramRest>, config: &Config) -> Result<()> {
    let session = login(&rest).await?;

    let source = Arc::new(HomeFeed::new(Arc::clone(&rest), session.clone()));
    let (feed, mut events) = spawn_feed(source, config.feed.settings());
    feed.initialize();

    let result = tui::run_tui(
        tui::Screen {
            rest: &rest,
            session: &session,
            feed: &feed,
            proximity_threshold: config.feed.proximity_threshold,
        },
        &mut events,
    )
    .await;

    feed.shutdown().await;
    logout(&rest, session).await;
    tracing::debug!("shutting down");
    result
}

async fn register(rest: &FacegramRest) -> Result<()> {
    println!();
    println!("  Create a Facegram account");
    println!();
    let request = RegisterRequest {
        full_name: config::prompt("Full name")?,
        username: config::prompt("Username")?,
        password: config::prompt("Password")?,
        bio: config::prompt_optional("Bio (optional)")?,
        is_private: u8::from(
            config::prompt_optional("Private account? [y/N]")?.eq_ignore_ascii_case("y"),
        ),
    };

    match rest.register(&request).await {
        Ok(()) => {
            println!("  Account created. Run `facegram feed` to log in.");
            Ok(())
        }
        Err(e) => Err(report(e)).context("registration failed"),
    }
}

async fn publish(
    rest: &FacegramRest,
    caption: String,
    files: Vec<PathBuf>,
    drop: &[usize],
) -> Result<()> {
    let mut draft = NewPostDraft::new(caption);
    for file in files {
        if !draft.add_file(&file) {
            println!("  Skipping {}: not an image", file.display());
        }
    }
    for index in draft.remove_attachments(drop) {
        println!("  No attachment at index {}", index);
    }
    println!(
        "  Posting \"{}\" with {} attachment(s)",
        draft.caption(),
        draft.attachments().len()
    );
    let upload = draft.into_upload().await?;

    let session = login(rest).await?;
    let result = rest.create_post(&session, upload).await;
    logout(rest, session).await;

    match result {
        Ok(()) => {
            println!("  Post published.");
            Ok(())
        }
        Err(e) => Err(report(e)).context("could not publish post"),
    }
}

/// Print the user-facing text of an API error and hand the error back.
fn report(err: ApiError) -> ApiError {
    for line in err.user_message().lines() {
        eprintln!("  {}", line);
    }
    err
}
