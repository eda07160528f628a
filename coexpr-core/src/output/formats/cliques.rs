use std::io::Write;

use crate::annotation::AnnotatedClique;
use crate::types::CoexprError;

pub const CLIQUE_TABLE_HEADER: &str = "clique_id\thog_id\tsize\tmembers\tspecies\tlife_habit\tannual_species\tperennial_species\ttotal_species\tmean_p_value\tmedian_p_value\tmean_effect_size\tedge_count";

/// Write one stratum's cliques as a tab-separated table with header
pub fn write_clique_table<W: Write>(
    writer: &mut W,
    cliques: &[AnnotatedClique],
) -> Result<(), CoexprError> {
    writeln!(writer, "{CLIQUE_TABLE_HEADER}")?;
    for clique in cliques {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.3e}\t{:.3e}\t{:.3}\t{}",
            clique.clique_id,
            clique.hog,
            clique.size(),
            clique.members.join(","),
            clique.species.join(","),
            clique.life_habit,
            clique.annual_species,
            clique.perennial_species,
            clique.total_species(),
            clique.mean_p_value,
            clique.median_p_value,
            clique.mean_effect_size,
            clique.edge_count
        )?;
    }
    Ok(())
}
