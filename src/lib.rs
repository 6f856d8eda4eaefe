//! # LCT Annotator
//!
//! A desktop tool for analyzing text along the Semantics dimension of
//! Legitimation Code Theory. A paragraph is wrapped into justified lines, split
//! into clauses and super-clauses with draggable separators, and each clause is
//! tagged with a composite descriptor such as `SD+;SG--`.
//!
//! ## Layers
//! - [`text_flow`] turns text into a grid of gaps between words
//! - [`separator`] keeps clause boundaries snapped to that grid
//! - [`overlay`] keeps the colored spans and descriptor badges in step with the separators
//! - [`classifier`] ties them together and is the only thing the UI talks to
//! - [`lct`] reads and writes `.lct` analysis files

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod error;
pub mod lct;
pub mod metrics;
pub mod overlay;
pub mod relayout;
pub mod separator;
pub mod text_flow;
pub mod tree;
pub mod types;
mod ui;

// Re-export public types and functions
pub use classifier::{Classifier, RenderItem, TreeUpload};
pub use config::AnnotatorConfig;
pub use error::{ConfigError, LctError};
pub use lct::LctDocument;
pub use metrics::{FontMetrics, FontSpec, MonospaceMetrics};
pub use tree::{Clause, ClauseTree, SuperClause};
pub use types::*;
pub use ui::{AnnotatorApp, CanvasMetrics, EguiMetrics};

/// Runs the annotator with default window settings.
///
/// Stored preferences are restored from eframe's persistence storage.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use lct_annotator::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "LCT Annotator",
        options,
        Box::new(|cc| Ok(Box::new(AnnotatorApp::new(cc)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_classifier_from_default_config() {
        let classifier =
            Classifier::new(&AnnotatorConfig::default(), 400.0, &MonospaceMetrics::default()).unwrap();
        assert_eq!(classifier.group_count(), 1);
        assert!(classifier.analyzed_tree().is_empty());
    }
}
