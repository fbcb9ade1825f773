mod bootstrap;

use anyhow::{Context, Result};
use budget_core::settings::Settings;
use budget_data::decumulator::Decumulator;
use budget_data::loader::{collect_input_files, load_snapshots};
use budget_data::writer::write_table;

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("openbudget v{} starting", env!("CARGO_PKG_VERSION"));

    let schema = settings.schema()?;
    tracing::info!(
        "Item type: {}, year: {}, vanished keys: {}",
        schema.item_type,
        settings.year,
        settings.vanished_keys
    );

    let files = collect_input_files(&settings.inputs).context("collecting snapshot files")?;
    let snapshots = load_snapshots(&files, schema).context("loading snapshots")?;

    let table = Decumulator::new(schema)
        .with_vanished_keys(settings.vanished_key_policy())
        .run(&snapshots, &settings.year)
        .context("de-cumulating snapshots")?;

    write_table(&table, settings.output.as_deref(), settings.output_format())
        .context("writing output table")?;

    Ok(())
}
