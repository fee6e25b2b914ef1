use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "breaker-cli")]
#[command(about = "Management CLI for gateway circuit breakers", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "BREAKER_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary of breaker health
    Status,
    /// List every breaker snapshot
    List,
    /// Show one breaker
    Show { name: String },
    /// Reset one breaker to closed
    Reset { name: String },
    /// Reset every breaker to closed
    ResetAll,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let (method, path) = match &cli.command {
        Commands::Status => (Method::GET, "/admin/status".to_string()),
        Commands::List => (Method::GET, "/admin/breakers".to_string()),
        Commands::Show { name } => (Method::GET, format!("/admin/breakers/{}", name)),
        Commands::Reset { name } => (Method::POST, format!("/admin/breakers/{}/reset", name)),
        Commands::ResetAll => (Method::POST, "/admin/reset".to_string()),
    };

    let res = client
        .request(method, format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
