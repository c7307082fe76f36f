use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Client CLI for the HTTP to HTTPS relay", long_about = None)]
struct Cli {
    /// Base URL of the relay.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Header the relay reads the target from.
    #[arg(long, default_value = "X-Target-URL")]
    target_header: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check relay health and the configured allow-list
    Health,
    /// Show relay usage information
    Info,
    /// Send a request through the relay
    Send {
        /// Full https:// URL to relay to
        target: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,

        /// Extra header, `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Info => {
            let res = client.get(format!("{}/", cli.url)).send().await?;
            print_json(res).await?;
        }
        Commands::Send {
            target,
            method,
            data,
            headers,
        } => {
            let mut map = HeaderMap::new();
            for raw in &headers {
                let (name, value) = raw
                    .split_once(':')
                    .ok_or_else(|| format!("header {raw:?} is not `Name: value`"))?;
                map.append(
                    HeaderName::from_bytes(name.trim().as_bytes())?,
                    HeaderValue::from_str(value.trim())?,
                );
            }
            map.insert(
                HeaderName::from_bytes(cli.target_header.as_bytes())?,
                HeaderValue::from_str(&target)?,
            );

            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let mut req = client
                .request(method, format!("{}/relay", cli.url))
                .headers(map);
            if let Some(body) = data {
                req = req.body(body);
            }

            print_raw(req.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn print_raw(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    println!("HTTP {}", res.status());
    for (name, value) in res.headers() {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    println!("{}", res.text().await?);
    Ok(())
}
