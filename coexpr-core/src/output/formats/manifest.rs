use std::io::Write;

use crate::results::RunManifest;
use crate::types::CoexprError;

pub const MANIFEST_HEADER: &str = "unit_kind\tunit_id\tmode\tstatus\treason";

/// Write one line per work unit with its completion status
pub fn write_manifest<W: Write>(
    writer: &mut W,
    manifest: &RunManifest,
) -> Result<(), CoexprError> {
    writeln!(writer, "{MANIFEST_HEADER}")?;
    for unit in &manifest.units {
        // Reasons are free text; keep the table rectangular
        let reason = unit.reason.replace(['\t', '\n'], " ");
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            unit.kind, unit.unit_id, unit.mode, unit.status, reason
        )?;
    }
    Ok(())
}
