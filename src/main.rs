use clap::Parser;
use std::path::PathBuf;

/// Local bridge for the select-to-webhook note clipper: per-page notes and
/// templated webhook forwarding for the browser-side glue.
#[derive(Parser)]
#[command(name = "clipnote", version)]
struct Cli {
    /// Port for the loopback bridge server
    #[arg(long, default_value_t = 8737)]
    port: u16,

    /// Directory holding storage.json (defaults to ~/.clipnote)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    clipnote::run(cli.port, &data_dir).await
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .ok_or_else(|| anyhow::anyhow!("HOME is not set; pass --data-dir"))?;
    Ok(PathBuf::from(home).join(".clipnote"))
}
