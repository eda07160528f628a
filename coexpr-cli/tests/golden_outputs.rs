mod common;

use std::fs;

use assert_cmd::Command;
use insta::assert_snapshot;
use tempfile::tempdir;

use crate::common::{run_coexpr, write_module_dataset};

#[test]
fn cli_requires_inputs() {
    let mut cmd = Command::cargo_bin("coexpr").unwrap();
    let output = cmd.assert().failure().get_output().stderr.clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("--expression"));
    assert!(text.contains("--orthologs"));
}

// Pairwise cliques between two annual species cover every gene
#[test]
fn annual_gene_list_snapshot() {
    let dir = tempdir().unwrap();
    let dataset =
        write_module_dataset(dir.path(), &[("Zm", "annual"), ("Sb", "annual")], &["leaf"]);
    let outdir = dir.path().join("results");

    run_coexpr(&dataset, &outdir, &["-k", "2", "--signed-only", "-q"]).unwrap();

    let genes = fs::read_to_string(outdir.join("leaf.signed.annual.genes.txt")).unwrap();
    assert_snapshot!(genes, @r"
    sb1
    sb10
    sb11
    sb12
    sb2
    sb3
    sb4
    sb5
    sb6
    sb7
    sb8
    sb9
    zm1
    zm10
    zm11
    zm12
    zm2
    zm3
    zm4
    zm5
    zm6
    zm7
    zm8
    zm9
    ");
}

#[test]
fn manifest_network_rows_snapshot() {
    let dir = tempdir().unwrap();
    let dataset =
        write_module_dataset(dir.path(), &[("Zm", "annual"), ("Sb", "annual")], &["leaf"]);
    let outdir = dir.path().join("results");

    run_coexpr(&dataset, &outdir, &["-k", "2", "--signed-only", "-q"]).unwrap();

    let manifest = fs::read_to_string(outdir.join("leaf.manifest.tsv")).unwrap();
    let mut network_rows: Vec<String> = manifest
        .lines()
        .filter(|line| line.starts_with("network\t"))
        .map(|line| line.replace('\t', " | "))
        .collect();
    network_rows.sort();
    assert_snapshot!(network_rows.join("\n"), @r"
    network | Sb | signed | completed | 12 genes, 12 edges
    network | Zm | signed | completed | 12 genes, 12 edges
    ");

    assert!(
        manifest
            .lines()
            .any(|line| line.starts_with("species_pair\tSb_vs_Zm\tsigned\tcompleted\t"))
    );
}
