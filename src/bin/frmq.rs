use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use log::{debug, info};

use fast_rmq::command::CommandStream;
use fast_rmq::config::RmqConfig;
use fast_rmq::options::Options;
use fast_rmq::runner::Runner;

const DEFAULT_CONFIG: &str = "frmq.toml";

fn main() -> Result<()> {
    if std::env::var("FRMQ_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("FRMQ_LOG")
            .write_style("FRMQ_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = Options::parse_from_args(&args).unwrap_or_else(|e| e.exit());
    debug!("frmq options: {:?}", options);

    let config_path = options.config.as_deref().unwrap_or(DEFAULT_CONFIG);
    let mut config = RmqConfig::load_from_file(config_path)?;
    options.apply(&mut config);
    debug!("frmq config: {:?}", config);

    let stream = match &options.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {path}"))?;
            CommandStream::read_from(io::BufReader::new(file))
        }
        None => CommandStream::read_from(io::stdin().lock()),
    }
    .context("Malformed command stream")?;
    info!(
        "decoded {} commands ({} marks)",
        stream.commands.len(),
        stream.mark_count()
    );

    let mut runner = Runner::new(&config);
    let answers = runner.run(&stream)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for answer in &answers {
        writeln!(out, "{answer}")?;
    }
    out.flush()?;

    if let Some(path) = &options.dump {
        let json = serde_json::to_string_pretty(&runner.rmq().snapshot())?;
        fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
        info!("snapshot written to {path}");
    }

    let report = runner.report();
    info!("{}", report);
    if options.report {
        eprintln!("{report}");
    }
    Ok(())
}
