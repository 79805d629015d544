mod view;

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use docsearch_client_core::{
    ClientConfig, ClientController, ForumSubmission, HttpDocumentService, Intent, Outcome,
    PageRef, PdfResult, RetryPolicy, SocketIoChannel, UploadFile, DEFAULT_BASE_URL,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::view::TerminalView;

#[derive(Parser)]
#[command(name = "docsearch", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Document service base URL
    #[arg(long, env = "DOCSEARCH_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Timeout for search, removal, and forum requests, in seconds
    #[arg(long, env = "DOCSEARCH_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Timeout for uploads, in seconds
    #[arg(long, env = "DOCSEARCH_UPLOAD_TIMEOUT_SECS", default_value = "600")]
    upload_timeout_secs: u64,

    /// Attempts for search and table-of-contents requests (1 disables retries)
    #[arg(long, env = "DOCSEARCH_ATTEMPTS", default_value = "3")]
    attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[arg(long, env = "DOCSEARCH_BACKOFF_MS", default_value = "500")]
    backoff_ms: u64,

    /// Skip the realtime channel; title refreshes and chat are unavailable.
    #[arg(long, default_value_t = false)]
    offline: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a PDF to be indexed.
    Upload {
        #[arg(long)]
        file: PathBuf,
    },
    /// Search the forum and the indexed PDFs.
    Search {
        /// Comma separated keywords.
        #[arg(long)]
        keywords: String,
        /// Restrict PDF hits to one title.
        #[arg(long, default_value = "")]
        pdf_title: String,
    },
    /// Remove an indexed PDF.
    Remove {
        #[arg(long)]
        file_name: String,
        /// Do not ask for confirmation.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Chat with the assistant; one message per line.
    Chat,
    /// Print server pushes (progress, title list) until the channel closes.
    Watch,
    /// Print the viewer link for a PDF page.
    Open {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "1")]
        page: u64,
    },
    /// Print the forum link.
    Forum,
    /// Submit a problem and its solution to the forum.
    SubmitProblem {
        #[arg(long)]
        name: String,
        #[arg(long)]
        problem: String,
        #[arg(long)]
        solution: String,
        #[arg(long)]
        chapter_name: String,
        #[arg(long)]
        chapter_page: String,
    },
    /// Show the table of contents of the current PDF.
    Toc,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = ClientConfig {
        request_timeout: Duration::from_secs(cli.timeout_secs),
        upload_timeout: Duration::from_secs(cli.upload_timeout_secs),
        retry: RetryPolicy {
            max_attempts: cli.attempts.max(1),
            backoff: Duration::from_millis(cli.backoff_ms),
        },
        ..ClientConfig::with_base_url(&cli.base_url)?
    };
    info!(
        version = app_version,
        base_url = %config.base_url,
        started_at = %Utc::now().to_rfc3339(),
        "docsearch boot"
    );

    let needs_channel = matches!(
        cli.command,
        Command::Remove { .. } | Command::Chat | Command::Watch | Command::Upload { .. }
    );
    let (channel, events) = if needs_channel && !cli.offline {
        match SocketIoChannel::connect(&config).await {
            Ok(connected) => connected,
            Err(error) => {
                warn!(%error, "realtime channel unavailable");
                SocketIoChannel::detached()
            }
        }
    } else {
        SocketIoChannel::detached()
    };

    let assume_yes = matches!(cli.command, Command::Remove { yes: true, .. });
    let view = TerminalView::new(config.base_url.clone(), assume_yes);
    let service = HttpDocumentService::new(config.clone())?;
    let mut controller = ClientController::new(service, channel, view, config.base_url.clone());
    controller.attach_events(events);

    let outcome = match cli.command {
        Command::Upload { file } => {
            controller
                .dispatch(Intent::ChooseFile(UploadFile::new(file)))
                .await;
            controller.dispatch(Intent::Upload).await
        }
        Command::Search {
            keywords,
            pdf_title,
        } => {
            controller
                .dispatch(Intent::FilteredSearch {
                    keywords,
                    pdf_title,
                })
                .await
        }
        Command::Remove { file_name, .. } => {
            controller.dispatch(Intent::RemoveFile(file_name)).await
        }
        Command::Chat => {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    line = lines.next_line() => match line? {
                        Some(line) => {
                            controller.dispatch(Intent::SendChat(line)).await;
                        }
                        None => break,
                    },
                    event = controller.next_event() => match event {
                        Some(event) => controller.handle_event(event),
                        None => {
                            warn!("realtime channel closed");
                            break;
                        }
                    },
                }
            }
            Outcome::Done
        }
        Command::Watch => {
            while let Some(event) = controller.next_event().await {
                controller.handle_event(event);
            }
            Outcome::Done
        }
        Command::Open { title, page } => {
            controller
                .dispatch(Intent::OpenPdf(PdfResult {
                    keyword: None,
                    sentence: String::new(),
                    title,
                    page_number: PageRef::Number(page),
                }))
                .await
        }
        Command::Forum => controller.dispatch(Intent::OpenForum).await,
        Command::SubmitProblem {
            name,
            problem,
            solution,
            chapter_name,
            chapter_page,
        } => {
            controller
                .dispatch(Intent::SubmitForumEntry(ForumSubmission {
                    name,
                    problem_description: problem,
                    solution,
                    chapter_name,
                    chapter_page,
                }))
                .await
        }
        Command::Toc => controller.dispatch(Intent::LoadTableOfContents).await,
    };

    if outcome != Outcome::Done {
        anyhow::bail!("request did not complete ({outcome:?})");
    }
    Ok(())
}
