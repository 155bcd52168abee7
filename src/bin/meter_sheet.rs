use anyhow::Context;
use anyhow::Result;
use meter_sheet::normalize_file;
use meter_sheet::Options;
use std::process::ExitCode;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn run() -> Result<()> {
    let path = std::env::args().nth(1).context("usage: meter_sheet <FILE>")?;
    let options = Options::default();
    let normalized = normalize_file(&path, &options).with_context(|| format!("failed to normalize {}", path))?;
    for warning in &normalized.warnings {
        warn!("{}", warning);
    }
    info!(
        header_row = normalized.report.header_row,
        date = %normalized.report.date_column,
        consumption = %normalized.report.consumption_column,
        unit = %normalized.report.unit,
        "inferred layout"
    );

    let mut writer = csv::Writer::from_writer(std::io::stdout().lock());
    writer.write_record(normalized.table.column_names())?;
    for index in 0..normalized.table.height() {
        let row = normalized.table.row(index).unwrap_or_default();
        writer.write_record(row.iter().map(|value| value.to_string()))?;
    }
    writer.flush().context("failed to write output")?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
