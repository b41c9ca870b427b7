use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use attribute_routing::config::{load_config, RoutingConfig};
use attribute_routing::lifecycle::{bootstrap, load_catalog};

#[derive(Parser)]
#[command(name = "routing-cli")]
#[command(about = "Inspect compiled attribute routes and exercise the gateway", long_about = None)]
struct Cli {
    /// Routing configuration file; defaults apply when it does not exist.
    #[arg(short, long, default_value = "routing.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile routes locally and print the table
    Routes {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Resolve a gateway action locally
    Resolve {
        #[arg(short, long)]
        action: String,
        #[arg(short, long)]
        version: Option<String>,
    },
    /// POST an action to a running gateway
    Call {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
        #[arg(short, long)]
        action: String,
        #[arg(short, long)]
        version: Option<String>,
        /// Extra input as a JSON object
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Routes { json } => {
            let app = bootstrap_from(&cli.config)?;
            let table = app.table.read();
            if json {
                println!("{}", serde_json::to_string_pretty(table.routes())?);
            } else {
                for route in table.routes() {
                    let verbs = route.verbs.iter().map(ToString::to_string).collect::<Vec<_>>().join("|");
                    println!(
                        "{:<24} {:<40} {:<32} {}",
                        verbs,
                        route.path(),
                        route.name.as_deref().unwrap_or("-"),
                        route.action
                    );
                }
            }
        }
        Commands::Resolve { action, version } => {
            let app = bootstrap_from(&cli.config)?;
            let resolution = app.resolver.resolve(Some(&action), version.as_deref());
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
        Commands::Call { url, action, version, data } => {
            let mut body = match data.as_deref().map(serde_json::from_str::<Value>).transpose()? {
                Some(Value::Object(fields)) => fields,
                Some(_) => return Err("--data must be a JSON object".into()),
                None => Map::new(),
            };
            body.insert("action".into(), Value::String(action));
            if let Some(version) = version {
                body.insert("version".into(), Value::String(version));
            }

            let config = load_or_default(&cli.config)?;
            let res = reqwest::Client::new()
                .post(format!("{}/{}", url.trim_end_matches('/'), config.gateway.endpoint))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn load_or_default(path: &Path) -> Result<RoutingConfig, Box<dyn std::error::Error>> {
    if path.exists() {
        Ok(load_config(path)?)
    } else {
        Ok(RoutingConfig::default())
    }
}

fn bootstrap_from(path: &Path) -> Result<attribute_routing::Application, Box<dyn std::error::Error>> {
    let config = load_or_default(path)?;
    let catalog = load_catalog(&config)?;
    Ok(bootstrap(config, catalog))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
