use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "dashboard-cli")]
#[command(about = "Query a running sheet dashboard", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status
    Health,
    /// List monthly tabs
    Months {
        /// asc or desc
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Earliest month, YYYY-MM
        #[arg(long)]
        from: Option<String>,
        /// Latest month, YYYY-MM
        #[arg(long)]
        to: Option<String>,
    },
    /// Fetch the rows of one month
    Rows {
        /// YYYY-MM
        month: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::Months { order, limit, from, to } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(order) = order {
                query.push(("order", order));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            if let Some(from) = from {
                query.push(("from", from));
            }
            if let Some(to) = to {
                query.push(("to", to));
            }
            client.get(format!("{base}/api/months")).query(&query).send().await?
        }
        Commands::Rows { month } => {
            client.get(format!("{base}/api/months/{month}/rows")).send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let elapsed = res
        .headers()
        .get("x-response-time-ms")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match elapsed {
        Some(ms) => eprintln!("{status} ({ms}ms)"),
        None => eprintln!("{status}"),
    }

    let body: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
