use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Operator CLI for the TTS relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Shared secret sent as x-proxy-secret.
    #[arg(short, long)]
    secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the relay's /health report
    Health,
    /// Synthesize text and stream the audio to a file
    Speak {
        #[arg(long)]
        text: String,
        #[arg(long)]
        voice_id: String,
        #[arg(long)]
        model_id: Option<String>,
        #[arg(long)]
        language_code: Option<String>,
        #[arg(short, long, default_value = "out.mp3")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(secret) = &cli.secret {
        headers.insert("x-proxy-secret", HeaderValue::from_str(secret)?);
    }

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Speak {
            text,
            voice_id,
            model_id,
            language_code,
            out,
        } => {
            let mut body = json!({ "text": text, "voiceId": voice_id });
            if let Some(model_id) = model_id {
                body["modelId"] = json!(model_id);
            }
            if let Some(language_code) = language_code {
                body["languageCode"] = json!(language_code);
            }

            let res = client
                .post(format!("{}/eleven/tts", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?;

            if !res.status().is_success() {
                eprintln!("Error: relay returned status {}", res.status());
                print_json(res).await?;
                return Ok(());
            }

            let mut file = tokio::fs::File::create(&out).await?;
            let mut written = 0usize;
            let mut chunks = Box::pin(res.bytes_stream());
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len();
            }
            file.flush().await?;
            println!("Wrote {} bytes to {}", written, out.display());
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
