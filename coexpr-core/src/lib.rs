//! # Coexpressolog Discovery
//!
//! Finds gene modules whose co-expression is conserved across species.
//!
//! ## Overview
//!
//! For every tissue, each species' expression matrix becomes a sparse
//! co-expression network (mutual-rank edges at a fixed density). Ortholog
//! pairs across two species are then tested for conserved network
//! neighbourhoods with bidirectional hypergeometric tests, the p-values of a
//! tissue are pooled and Benjamini–Hochberg corrected, and the significant
//! pairs of each hierarchical ortholog group (HOG) form a graph whose maximal
//! cliques are the reported modules. Cliques are annotated with their species
//! composition and life-habit class (annual / perennial / mixed).
//!
//! The whole pipeline runs twice per tissue, once on signed correlations and
//! once on absolute correlations; comparing the two flags ortholog pairs
//! whose conserved co-expression changes sign.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coexpr_core::{CoexprAnalyzer, config::CoexprConfig};
//! use coexpr_core::output::write_tissue_outputs;
//!
//! let analyzer = CoexprAnalyzer::new(CoexprConfig::default())?;
//! let analyses = analyzer.analyze_files("expression.tsv", "orthologs.tsv", None)?;
//!
//! for analysis in &analyses {
//!     println!("{}: {} cliques", analysis.tissue, analysis.signed.strata.all.len());
//!     write_tissue_outputs("results", analysis)?;
//! }
//! # Ok::<(), coexpr_core::types::CoexprError>(())
//! ```
//!
//! ## Architecture
//!
//! The per-tissue engine uses a type-state pattern so conservation cannot be
//! tested before the networks exist:
//!
//! ```rust
//! use coexpr_core::config::{CoexprConfig, ScoringMode};
//! use coexpr_core::engine::PendingEngine;
//! use coexpr_core::expression::ExpressionMatrix;
//! use coexpr_core::orthology::OrthologTable;
//!
//! let config = CoexprConfig { density: 0.5, ..Default::default() };
//! let orthologs = OrthologTable::default();
//! let matrix = ExpressionMatrix::new(
//!     "Zmays",
//!     "leaf",
//!     vec!["G1".into(), "G2".into(), "G3".into()],
//!     vec!["s1".into(), "s2".into(), "s3".into()],
//!     vec![1.0, 2.0, 3.0, 1.1, 2.1, 2.9, 3.0, 1.0, 2.0],
//! )?;
//!
//! let engine = PendingEngine::new(&config, &orthologs, "leaf").build_networks(&[&matrix]);
//! assert!(engine.network("Zmays", ScoringMode::Signed).is_some());
//!
//! let analysis = engine.discover();
//! assert_eq!(analysis.tissue, "leaf");
//! # Ok::<(), coexpr_core::types::CoexprError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: Run configuration and scoring modes
//! - [`expression`], [`orthology`], [`io`]: Input tables
//! - [`network`]: Correlation and mutual-rank networks
//! - [`conservation`]: Bidirectional neighbourhood conservation tests
//! - [`correction`]: Benjamini–Hochberg FDR correction
//! - [`graph`]: Per-HOG conserved graphs and maximal cliques
//! - [`annotation`]: Clique composition, statistics and strata
//! - [`polarity`]: Signed vs. unsigned divergence
//! - [`engine`]: Pipeline orchestration
//! - [`results`]: Per-tissue results and the run manifest
//! - [`output`]: Tab-separated writers
//! - [`bitset`]: Node sets for the clique search
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, CoexprError>`](types::CoexprError).
//! Failures of a single species, species pair or HOG do not abort a run;
//! they are listed in the tissue's [`results::RunManifest`].

pub mod annotation;
pub mod bitset;
pub mod config;
pub mod conservation;
pub mod constants;
pub mod correction;
pub mod engine;
pub mod expression;
pub mod graph;
pub mod io;
pub mod network;
pub mod orthology;
pub mod output;
pub mod polarity;
pub mod results;
pub mod types;

pub use engine::CoexprAnalyzer;
pub use types::CoexprError;
