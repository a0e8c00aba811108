use clap::Parser; // for cli
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bucket_share::ShareError;
use bucket_share::commands;
use bucket_share::config::{Args, Command};
use bucket_share::state::AppState;

// runs one command and returns what goes to stdout
async fn run(args: Args) -> anyhow::Result<String> {
    let mut state = AppState::from_args(&args)?;

    let out = match &args.command {
        Command::DownloadUrl { key, hours } => {
            commands::download_url(&mut state, key, hours.as_deref())
                .await?
                .to_string()
        }
        Command::UploadUrl { filename, max_mb } => {
            commands::upload_url(&mut state, filename.as_deref(), max_mb.as_deref())
                .await?
                .to_string()
        }
        Command::UploadPage { max_mb } => {
            commands::upload_page(&mut state, max_mb.as_deref())
                .await?
                .to_string()
        }
        Command::Upload {
            file,
            key,
            attachment,
        } => commands::upload(&mut state, file, key.as_deref(), *attachment)
            .await?
            .to_string(),
    };
    Ok(out)
}

#[tokio::main]
async fn main() -> ExitCode {
    // logs go to stderr, stdout is for the result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bucket_share=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(err) => {
            if let Some(ShareError::Collaborator(cause)) = err.downcast_ref::<ShareError>() {
                tracing::debug!("cause: {}", cause);
            }
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
