#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Sample profiles of four co-expression modules. Module 3 mirrors module 2,
/// so unsigned networks tie the two and drop module 4 at the edge budget.
const MODULE_PROFILES: [[f64; 8]; 4] = [
    [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
    [3.0, 8.0, 1.0, 6.0, 2.0, 7.0, 4.0, 5.0],
    [6.0, 1.0, 8.0, 3.0, 7.0, 2.0, 5.0, 4.0],
    [2.0, 5.0, 7.0, 1.0, 8.0, 4.0, 3.0, 6.0],
];

/// Density at which each module network keeps exactly its 12 within-module
/// edges
pub const MODULE_DENSITY: &str = "0.19";

/// Paths of a synthetic dataset written by [`write_module_dataset`]
pub struct Dataset {
    pub expression: PathBuf,
    pub orthologs: PathBuf,
}

/// Write an expression table and an ortholog table for the given
/// `(species, life habit)` list in every tissue.
///
/// Each species has twelve genes `<species lowercase><k>` in four modules of
/// three, and `HOG<k>` holds gene k of every species. HOGs 10 to 12 are not
/// core members.
pub fn write_module_dataset(dir: &Path, species: &[(&str, &str)], tissues: &[&str]) -> Dataset {
    let mut expression = String::from("species\ttissue\tgene_id\tsample_id\tvalue\tlife_habit\n");
    for tissue in tissues {
        for (name, habit) in species {
            for (module, profile) in MODULE_PROFILES.iter().enumerate() {
                for member in 0..3 {
                    let k = module * 3 + member + 1;
                    let scale = 1.0 + 0.5 * member as f64;
                    for (sample, value) in profile.iter().enumerate() {
                        expression.push_str(&format!(
                            "{name}\t{tissue}\t{}{k}\t{name}_{tissue}_s{}\t{}\t{habit}\n",
                            name.to_ascii_lowercase(),
                            sample + 1,
                            value * scale + 2.0 * member as f64
                        ));
                    }
                }
            }
        }
    }

    let mut orthologs = String::from("hog_id\tog_id\tspecies\tgene_id\tlife_habit\tcore\n");
    for k in 1..=12 {
        for (name, habit) in species {
            orthologs.push_str(&format!(
                "HOG{k:02}\tOG{k:02}\t{name}\t{}{k}\t{habit}\t{}\n",
                name.to_ascii_lowercase(),
                k <= 9
            ));
        }
    }

    let dataset = Dataset {
        expression: dir.join("expression.tsv"),
        orthologs: dir.join("orthologs.tsv"),
    };
    fs::write(&dataset.expression, expression).unwrap();
    fs::write(&dataset.orthologs, orthologs).unwrap();
    dataset
}

/// The coexpr binary preloaded with a dataset, an output directory and the
/// module density
pub fn coexpr_command(dataset: &Dataset, outdir: &Path) -> Command {
    coexpr_command_with_density(dataset, outdir, MODULE_DENSITY)
}

/// Like [`coexpr_command`] with an explicit `--density`
pub fn coexpr_command_with_density(dataset: &Dataset, outdir: &Path, density: &str) -> Command {
    let mut cmd = Command::cargo_bin("coexpr").unwrap();
    cmd.arg("-e")
        .arg(&dataset.expression)
        .arg("-r")
        .arg(&dataset.orthologs)
        .arg("-o")
        .arg(outdir)
        .arg("-d")
        .arg(density)
        .arg("-t")
        .arg("2");
    cmd
}

/// Runs the coexpr CLI and asserts success
pub fn run_coexpr(
    dataset: &Dataset,
    outdir: &Path,
    extra_args: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = coexpr_command(dataset, outdir);
    cmd.args(extra_args);
    cmd.assert().success();
    Ok(())
}

/// Data rows of a written table (header dropped)
pub fn table_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}
