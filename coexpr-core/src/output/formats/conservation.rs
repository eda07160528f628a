use std::io::Write;

use crate::correction::AdjustedConservationRecord;
use crate::types::CoexprError;

pub const CONSERVATION_TABLE_HEADER: &str = "hog_id\tspecies_pair\tgene_a\tgene_b\tneighborhood_a\tneighborhood_b\toverlap_forward\toverlap_reverse\tp_forward\tp_reverse\tp_value\tadjusted_p\teffect_size\tconcordance";

/// Write every tested ortholog pair of one mode with raw and adjusted
/// p-values
pub fn write_conservation_table<W: Write>(
    writer: &mut W,
    records: &[AdjustedConservationRecord],
) -> Result<(), CoexprError> {
    writeln!(writer, "{CONSERVATION_TABLE_HEADER}")?;
    for adjusted in records {
        let record = &adjusted.record;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.3e}\t{:.3e}\t{:.3e}\t{:.3e}\t{:.3}\t{:.3}",
            record.hog,
            record.species_pair,
            record.gene_a,
            record.gene_b,
            record.neighborhood_a,
            record.neighborhood_b,
            record.forward.overlap,
            record.reverse.overlap,
            record.forward.p_value,
            record.reverse.p_value,
            record.p_value,
            adjusted.adjusted_p,
            record.effect_size,
            record.concordance
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conservation::{ConservationRecord, DirectionalTest};
    use crate::types::SpeciesPair;

    #[test]
    fn test_write_conservation_table() {
        let forward = DirectionalTest {
            population: 12,
            successes: 2,
            draws: 2,
            overlap: 2,
            p_value: 1.0 / 66.0,
        };
        let adjusted = AdjustedConservationRecord {
            record: ConservationRecord {
                hog: "HOG1".to_string(),
                species_pair: SpeciesPair::new("Zm", "Sb"),
                gene_a: "zm1".to_string(),
                gene_b: "sb1".to_string(),
                neighborhood_a: 2,
                neighborhood_b: 2,
                forward,
                reverse: forward,
                p_value: 1.0 / 66.0,
                effect_size: 6.0,
                concordance: 1.0,
            },
            adjusted_p: 0.03,
        };

        let mut buffer = Vec::new();
        write_conservation_table(&mut buffer, &[adjusted]).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CONSERVATION_TABLE_HEADER);
        assert_eq!(
            lines[1],
            "HOG1\tZm_vs_Sb\tzm1\tsb1\t2\t2\t2\t2\t1.515e-2\t1.515e-2\t1.515e-2\t3.000e-2\t6.000\t1.000"
        );
    }
}
