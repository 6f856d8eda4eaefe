//! File operations for saving and loading `.lct` analyses.
//!
//! Dialogs and disk access run on tokio tasks; their results come back over the
//! [`FileOperationResult`] channel and are applied on the UI thread.

use super::state::{AnnotatorApp, FileOperationResult, PendingLoadOperation, PendingSaveOperation};
use crate::error::LctError;
use crate::lct::LctDocument;
use eframe::egui;
use std::path::Path;

const LCT_FILTER_NAME: &str = "LCT analysis";
const LCT_EXTENSION: &str = "lct";
const DEFAULT_FILE_NAME: &str = "analysis.lct";

impl AnnotatorApp {
    /// Handles pending file operations.
    ///
    /// This method processes completed async file operations and initiates new ones.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        // First, process any completed file operations from the channel
        let mut results = Vec::new();
        if let Some(receiver) = &self.file.file_operation_receiver {
            while let Ok(result) = receiver.try_recv() {
                results.push(result);
            }
        }
        for result in results {
            self.apply_file_result(ctx, result);
        }

        if let Some(save_op) = self.file.pending_save_operation.take() {
            self.start_save(ctx, save_op);
        }

        if let Some(PendingLoadOperation::Load) = self.file.pending_load_operation.take() {
            let ctx = ctx.clone();
            let sender = self.file.file_operation_sender.clone();
            tokio::spawn(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter(LCT_FILTER_NAME, &[LCT_EXTENSION])
                    .pick_file()
                    .await
                {
                    let path = handle.path();
                    let result = match LctDocument::read(path) {
                        Ok(document) => FileOperationResult::LoadCompleted(path.display().to_string(), document),
                        Err(e) => FileOperationResult::OperationFailed(format!("Failed to read {}: {e}", path.display())),
                    };
                    if let Some(tx) = sender {
                        let _ = tx.send(result);
                    }
                } else {
                    log::debug!("open dialog cancelled");
                }
                ctx.request_repaint();
            });
        }
    }

    fn start_save(&mut self, ctx: &egui::Context, save_op: PendingSaveOperation) {
        let document = match self.analysis_document() {
            Ok(document) => document,
            Err(e) => {
                log::error!("failed to encode analysis: {e}");
                self.status = Some(format!("Cannot save: {e}"));
                return;
            }
        };
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();

        match (save_op, self.file.current_path.clone()) {
            (PendingSaveOperation::Save, Some(path)) => {
                tokio::spawn(async move {
                    let result = match document.write(Path::new(&path)) {
                        Ok(()) => FileOperationResult::SaveCompleted(path),
                        Err(e) => FileOperationResult::OperationFailed(format!("Failed to save file: {e}")),
                    };
                    if let Some(tx) = sender {
                        let _ = tx.send(result);
                    }
                    ctx.request_repaint();
                });
            }
            _ => {
                tokio::spawn(async move {
                    if let Some(handle) = rfd::AsyncFileDialog::new()
                        .add_filter(LCT_FILTER_NAME, &[LCT_EXTENSION])
                        .set_file_name(DEFAULT_FILE_NAME)
                        .save_file()
                        .await
                    {
                        let path = handle.path();
                        let result = match document.write(path) {
                            Ok(()) => FileOperationResult::SaveCompleted(path.display().to_string()),
                            Err(e) => FileOperationResult::OperationFailed(format!("Failed to save file: {e}")),
                        };
                        if let Some(tx) = sender {
                            let _ = tx.send(result);
                        }
                    }
                    ctx.request_repaint();
                });
            }
        }
    }

    /// Applies the outcome of a finished file operation.
    pub fn apply_file_result(&mut self, ctx: &egui::Context, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path) => {
                if let Some(classifier) = self.classifier.as_mut() {
                    classifier.mark_saved();
                }
                log::info!("saved analysis to {path}");
                self.status = Some(format!("Saved {path}"));
                self.file.current_path = Some(path);
            }
            FileOperationResult::LoadCompleted(path, document) => match self.load_document(ctx, document) {
                Ok(()) => {
                    log::info!("loaded analysis from {path}");
                    self.status = Some(format!("Opened {path}"));
                    self.file.current_path = Some(path);
                }
                Err(e) => {
                    log::warn!("failed to load {path}: {e}");
                    self.status = Some(format!("Cannot open {path}: {e}"));
                }
            },
            FileOperationResult::OperationFailed(error) => {
                log::error!("file operation failed: {error}");
                self.status = Some(error);
            }
        }
    }

    /// Encodes the current analysis as an `.lct` document.
    pub fn analysis_document(&self) -> Result<LctDocument, LctError> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or_else(|| LctError::Structure("no analysis to save".to_string()))?;
        LctDocument::from_tree(&classifier.analyzed_tree(), &self.config.dimension, classifier.config())
    }

    /// Replaces the current analysis with the one in `document`.
    pub fn load_document(&mut self, ctx: &egui::Context, document: LctDocument) -> Result<(), LctError> {
        let metrics = self.canvas_metrics(ctx);
        let classifier = self
            .classifier
            .as_mut()
            .ok_or_else(|| LctError::Structure("annotator is not configured".to_string()))?;
        let tree = document.to_tree(classifier.config())?;
        let upload = classifier.set_analyzed_tree(&tree, &metrics);
        if !upload.valid {
            return Err(LctError::Structure(
                "clauses do not match the descriptor template".to_string(),
            ));
        }
        if !upload.complete {
            log::info!("loaded analysis has untagged clauses");
        }
        if !document.dimension.is_empty() {
            self.config.dimension = document.dimension;
        }
        self.interaction = Default::default();
        self.text_editor.draft = classifier.text().to_string();
        Ok(())
    }

    /// Opens a file dialog to save the analysis with a new name.
    pub fn save_as_analysis(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
    }

    /// Saves to the current file path, or triggers "Save As" if no path is set.
    pub fn save_analysis(&mut self) {
        if self.file.current_path.is_some() {
            self.file.pending_save_operation = Some(PendingSaveOperation::Save);
        } else {
            self.save_as_analysis();
        }
    }

    /// Opens a file dialog to load an analysis.
    pub fn open_analysis(&mut self) {
        self.file.pending_load_operation = Some(PendingLoadOperation::Load);
    }

    /// Starts over with empty text.
    pub fn new_analysis(&mut self, ctx: &egui::Context) {
        let metrics = self.canvas_metrics(ctx);
        if let Some(classifier) = self.classifier.as_mut() {
            classifier.set_text("", &metrics);
            classifier.mark_saved();
        }
        self.file.current_path = None;
        self.interaction = Default::default();
        self.context_menu = Default::default();
        self.text_editor.draft.clear();
        self.status = None;
    }
}
