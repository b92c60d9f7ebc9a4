use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "metrics-cli")]
#[command(about = "Scrape an activity worker's metrics endpoint", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9090/metrics")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full exposition
    Scrape,
    /// Print only samples whose metric name starts with PREFIX
    Grep {
        prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let body = fetch(&cli.url).await?;

    match cli.command {
        Commands::Scrape => print!("{}", body),
        Commands::Grep { prefix } => {
            for line in samples_with_prefix(&body, &prefix) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

async fn fetch(url: &str) -> Result<String, Box<dyn std::error::Error>> {
    let res = reqwest::get(url).await?;
    let status = res.status();
    if !status.is_success() {
        return Err(format!("metrics endpoint returned status {}", status).into());
    }
    Ok(res.text().await?)
}

/// Sample lines (not `# HELP`/`# TYPE`) whose metric name starts with `prefix`.
fn samples_with_prefix<'a>(body: &'a str, prefix: &'a str) -> impl Iterator<Item = &'a str> {
    body.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(move |line| line.starts_with(prefix))
}
