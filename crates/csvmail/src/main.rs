use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::error;

use csvmail::config::load_dotenv;
use csvmail::config::schema::{DEFAULT_INCOMING_DIR, DEFAULT_PROCESSED_DIR, DEFAULT_STORE_CONFIG};
use csvmail::pipeline::prepare_directories;
use csvmail::{
    fetch_csv_attachments, load_store_config, upload_directory, ImapConnector, MailConfig,
    MessageFilters, Paths, Pipeline, S3Store, StoreConfig, UploadTarget,
};

#[derive(Parser, Debug)]
#[command(
    name = "csvmail",
    version,
    about = "Download CSV attachments from an IMAP inbox and upload them to S3",
    long_about = "Downloads CSV attachments from unseen messages into an incoming directory, \
                  then uploads every incoming file to an S3 bucket and moves it to a processed \
                  directory.\n\n\
                  Mail credentials come from EMAIL_USER and EMAIL_PASS (or EMAIL_PASS_FILE), \
                  read from the environment or a .env file; \
                  IMAP_SERVER defaults to imap.gmail.com."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory attachments are downloaded into
    #[arg(long, global = true, default_value = DEFAULT_INCOMING_DIR)]
    incoming: PathBuf,

    /// Directory uploaded files are moved into
    #[arg(long, global = true, default_value = DEFAULT_PROCESSED_DIR)]
    processed: PathBuf,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download attachments, then upload (default)
    Run {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Only download attachments
    Fetch {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Only upload the incoming directory
    Upload {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Only messages from this sender
    #[arg(long, env = "CSVMAIL_SENDER")]
    sender: Option<String>,

    /// Only messages whose subject contains this text
    #[arg(long, env = "CSVMAIL_SUBJECT")]
    subject: Option<String>,
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// JSON file with S3 credentials, bucket and key prefix
    #[arg(long, env = "CSVMAIL_STORE_CONFIG", default_value = DEFAULT_STORE_CONFIG)]
    store_config: PathBuf,
}

impl Default for StoreArgs {
    fn default() -> Self {
        Self {
            store_config: PathBuf::from(DEFAULT_STORE_CONFIG),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so .env also feeds the CLI's env-backed options and RUST_LOG
    load_dotenv();
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns an error only for fatal configuration problems. Run-time failures
/// are logged by the stages and reported in their output.
async fn execute(cli: Cli) -> anyhow::Result<()> {
    let paths = Paths {
        incoming: cli.incoming,
        processed: cli.processed,
    };

    match cli.command.unwrap_or(Command::Run {
        filters: FilterArgs::default(),
        store: StoreArgs::default(),
    }) {
        Command::Run { filters, store } => {
            let mail = MailConfig::from_env(&paths.incoming)?;
            let store_config = load_store(&store)?;
            prepare_directories(&paths)?;

            let connector = ImapConnector;
            let s3 = S3Store::new(&store_config);
            let summary = Pipeline::new(&connector, &s3)
                .run(
                    &mail,
                    &MessageFilters::new(filters.sender, filters.subject),
                    &UploadTarget::from(&store_config),
                    &paths,
                )
                .await;

            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Fetch { filters } => {
            let mail = MailConfig::from_env(&paths.incoming)?;
            let filters = MessageFilters::new(filters.sender, filters.subject);

            match fetch_csv_attachments(&ImapConnector, &mail, &filters).await {
                Ok(report) => println!(
                    "{} CSV attachments downloaded from {} messages ({} marked read)",
                    report.downloaded,
                    report.messages.len(),
                    report.marked_read()
                ),
                Err(e) => error!("Download aborted: {}", e),
            }
        }
        Command::Upload { store } => {
            let store_config = load_store(&store)?;
            prepare_directories(&paths)?;

            let s3 = S3Store::new(&store_config);
            match upload_directory(
                &s3,
                &UploadTarget::from(&store_config),
                &paths.incoming,
                &paths.processed,
            )
            .await
            {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(e) => error!("Upload aborted: {}", e),
            }
        }
    }

    Ok(())
}

fn load_store(args: &StoreArgs) -> csvmail::Result<StoreConfig> {
    Ok(load_store_config(&args.store_config)?)
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Logs go to stderr so stdout stays clean for the JSON report
    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
