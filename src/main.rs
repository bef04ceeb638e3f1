use anyhow::Result;
use etlflow::{fetch, AuditLog, Config, Pipeline};
use reqwest::blocking::Client;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

const CONFIG_PATH: &str = "etl.yaml";

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) configure dirs ───────────────────────────────────────────
    let config = Config::load_or_default(CONFIG_PATH)?;
    config.prepare_dirs()?;
    let audit = AuditLog::open(config.log_path())?;

    // ─── 3) fetch & unpack the source archive ────────────────────────
    let client = Client::new();
    let zip_path = fetch::download_zip(&client, &config.source_url, &config.download_dir)?;
    audit.record(format!("Downloaded {}.", zip_path.display()));
    let unpacked = fetch::unpack_zip(&zip_path, &config.unzip_dir)?;
    info!(files = unpacked, dir = %config.unzip_dir.display(), "unpacked");

    // ─── 4) run the pipeline ─────────────────────────────────────────
    let files = fetch::list_input_files(&config.unzip_dir)?;
    let pipeline = Pipeline::new(&audit, config.output_path());
    let report = pipeline.run(&files);

    if report.is_clean() {
        info!(
            rows = report.rows_written,
            output = %pipeline.output_path().display(),
            "all done"
        );
    } else {
        warn!(
            rows = report.rows_written,
            log = %audit.path().display(),
            "finished with absorbed failures; see the audit log"
        );
    }
    Ok(())
}
