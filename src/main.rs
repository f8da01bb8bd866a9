use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conversation-md")]
#[command(about = "Decorate conversation lists in a Markdown file and print the token stream")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output file for the token listing (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (defaults to conversation.toml in the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from("conversation.toml"));
    let config = match conversation_md::Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Read input file
    let markdown = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    let tokens = conversation_md::markdown_to_tokens_with_config(&markdown, &config);
    let listing = conversation_md::dump(&tokens);

    match cli.output {
        Some(output) => {
            if let Err(e) = fs::write(&output, listing) {
                eprintln!("Error writing {}: {}", output.display(), e);
                std::process::exit(1);
            }
            println!("Created {}", output.display());
        }
        None => print!("{}", listing),
    }
}
