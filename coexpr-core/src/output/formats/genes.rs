use std::io::Write;

use crate::types::CoexprError;

/// Write one gene ID per line, for enrichment tools
pub fn write_gene_list<W: Write>(writer: &mut W, genes: &[&str]) -> Result<(), CoexprError> {
    for gene in genes {
        writeln!(writer, "{gene}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_gene_list() {
        let mut buffer = Vec::new();
        write_gene_list(&mut buffer, &["zm1", "zm2"]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "zm1\nzm2\n");
    }

    #[test]
    fn test_empty_gene_list() {
        let mut buffer = Vec::new();
        write_gene_list(&mut buffer, &[]).unwrap();
        assert!(buffer.is_empty());
    }
}
