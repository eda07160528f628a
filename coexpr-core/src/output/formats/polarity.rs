use std::io::Write;

use crate::polarity::PolarityRecord;
use crate::types::CoexprError;

pub const POLARITY_TABLE_HEADER: &str =
    "tissue\tspecies_pair\tgene_1\tgene_2\tsigned_score\tunsigned_score\tdivergent";

/// Write the polarity-divergence table of one tissue
pub fn write_polarity_table<W: Write>(
    writer: &mut W,
    records: &[PolarityRecord],
) -> Result<(), CoexprError> {
    writeln!(writer, "{POLARITY_TABLE_HEADER}")?;
    for record in records {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.4}\t{:.4}\t{}",
            record.tissue,
            record.species_pair,
            record.gene_1,
            record.gene_2,
            record.signed_score,
            record.unsigned_score,
            record.divergent
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polarity::Polarity;
    use crate::types::SpeciesPair;
    use insta::assert_snapshot;

    #[test]
    fn test_write_polarity_table() {
        let records = vec![
            PolarityRecord {
                tissue: "leaf".to_string(),
                species_pair: SpeciesPair::new("Zm", "Pt"),
                gene_1: "zm1".to_string(),
                gene_2: "pt1".to_string(),
                signed_score: -9.0,
                unsigned_score: 9.0,
                polarity: Polarity::Discordant,
                divergent: true,
            },
            PolarityRecord {
                tissue: "leaf".to_string(),
                species_pair: SpeciesPair::new("Zm", "Pt"),
                gene_1: "zm2".to_string(),
                gene_2: "pt2".to_string(),
                signed_score: 1.5,
                unsigned_score: 2.25,
                polarity: Polarity::Concordant,
                divergent: false,
            },
        ];

        let mut buffer = Vec::new();
        write_polarity_table(&mut buffer, &records).unwrap();
        let output = String::from_utf8(buffer).unwrap();

        assert_snapshot!(output.replace('\t', " | "), @r"
        tissue | species_pair | gene_1 | gene_2 | signed_score | unsigned_score | divergent
        leaf | Zm_vs_Pt | zm1 | pt1 | -9.0000 | 9.0000 | true
        leaf | Zm_vs_Pt | zm2 | pt2 | 1.5000 | 2.2500 | false
        ");
    }
}
