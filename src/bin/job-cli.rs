use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use job_wrapper::datamodel::convert_to_yaml;
use job_wrapper::manifest::load_manifest;

#[derive(Parser)]
#[command(name = "job-cli")]
#[command(about = "Management CLI for wrapped jobs", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:7000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the main action with a JSON payload
    Perform {
        /// JSON body, e.g. '{"x": 40, "y": 2}'
        #[arg(default_value = "{}")]
        payload: String,
    },
    /// Call an auxiliary endpoint
    Call {
        /// Endpoint path, e.g. /random
        path: String,
        /// JSON body; sends a POST when given, a GET otherwise
        #[arg(short, long)]
        payload: Option<String>,
    },
    /// Check liveness
    Live,
    /// Check readiness
    Ready,
    /// Show job health summary
    Health,
    /// List mounted endpoints
    Endpoints,
    /// Parse a local manifest and print it normalized
    ValidateManifest {
        #[arg(default_value = "job.yaml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let api = format!("{}/api/v1", cli.url.trim_end_matches('/'));

    match cli.command {
        Commands::Perform { payload } => {
            let body: Value = serde_json::from_str(&payload)?;
            let res = client.post(format!("{}/perform", api)).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::Call { path, payload } => {
            let url = format!("{}/{}", api, path.trim_start_matches('/'));
            let res = match payload {
                Some(payload) => {
                    let body: Value = serde_json::from_str(&payload)?;
                    client.post(url).json(&body).send().await?
                }
                None => client.get(url).send().await?,
            };
            print_response(res).await?;
        }
        Commands::Live => {
            let res = client.get(format!("{}/live", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Ready => {
            let res = client.get(format!("{}/ready", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Endpoints => {
            let res = client.get(format!("{}/endpoints", api)).send().await?;
            print_response(res).await?;
        }
        Commands::ValidateManifest { path } => match load_manifest(&path)? {
            Some(manifest) => {
                println!("Manifest is valid, job type: {}", manifest.get_jobtype().unwrap_or("-"));
                print!("{}", convert_to_yaml(&manifest)?);
            }
            None => println!("No manifest found at {}", path.display()),
        },
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: job returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
