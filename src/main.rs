use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use code_judge::{CheckerRegistry, Judge, LanguageRegistry};

/// Worker entry point: one JSON execution request per line on stdin,
/// one JSON response per line on stdout. The surrounding API layer owns
/// transport, auth, and persistence.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("code_judge=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let languages = match std::env::var("LANGUAGES_CONFIG") {
        Ok(path) => {
            let content = tokio::fs::read_to_string(&path).await?;
            info!("Loaded language configurations from {}", path);
            LanguageRegistry::from_toml_str(&content)?
        }
        Err(_) => LanguageRegistry::builtin()?,
    };

    let mut supported = languages.supported_languages();
    supported.sort();
    info!("Supported languages: {}", supported.join(", "));

    let judge = Judge::new(languages, CheckerRegistry::with_builtins());

    info!("Waiting for requests on stdin...");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = judge.run_json(&line).await;
        stdout.write_all(response.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
