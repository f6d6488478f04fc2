use clap::Parser;
use dirindex::cache::StatCache;
use dirindex::config::Config;
use dirindex::handler::{self, Request};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dirindex")]
#[command(about = "Render an HTML index of a directory")]
#[command(long_about = "\
Render an HTML index of a directory

Runs the full listing pipeline (config resolution, index-file check,
scan, sort, render) for one local directory and writes the resulting
document to stdout or a file.

Without --config, a built-in configuration with listings activated is
used. A config file follows the same shape the library consumes:

  server_tag = \"dirindex/0.3\"
  index_files = [\"index.html\"]

  [listing]
  activate = true
  show_readme = \"README.txt\"
  exclude = [\"~$\"]

  [[rule]]
  prefix = \"/private/\"
  [rule.listing]
  activate = false")]
#[command(version)]
struct Cli {
    /// Directory to list
    dir: PathBuf,

    /// URL path the listing claims to live at
    #[arg(long, default_value = "/")]
    url_path: String,

    /// Query string seeding the client-side sort (e.g. "C=M&O=D")
    #[arg(long, default_value = "")]
    query: String,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("dirindex: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        // No file: defaults, with listings switched on for the CLI.
        None => Config::from_str("[listing]\nactivate = true\n")?,
    };

    let mut url_path = cli.url_path.clone();
    if !url_path.ends_with('/') {
        url_path.push('/');
    }

    let req = Request {
        url_path,
        query: cli.query.clone(),
        fs_path: cli.dir.clone(),
    };

    let mut cache = StatCache::new();
    let Some(mut resp) = handler::handle(&config, &mut cache, &req)? else {
        eprintln!("dirindex: listing not enabled for {}", req.url_path);
        return Ok(ExitCode::from(2));
    };

    log::debug!("content type: {}", resp.content_type);

    match &cli.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            resp.body.write_to(&mut writer)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            resp.body.write_to(&mut writer)?;
            writer.flush()?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
