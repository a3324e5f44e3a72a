use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::filter::FilteredView;

/// Write the visible records as CSV: the source header, then each record's
/// source cells, in dataset order.
pub fn write_csv<W: Write>(view: &FilteredView<'_>, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    let headers = &view.dataset().headers;
    if !headers.is_empty() {
        writer.write_record(headers).context("writing CSV header")?;
    }
    for (n, rec) in view.records().enumerate() {
        writer
            .write_record(&rec.cells)
            .with_context(|| format!("writing CSV row {n}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Export to a file, replacing it if present.
pub fn export_to_file(view: &FilteredView<'_>, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(view, std::io::BufWriter::new(file))?;
    log::info!("Exported {} rows to {}", view.len(), path.display());
    Ok(())
}
