//! Application state management structures.
//!
//! This module contains the state structures that track the shell's UI state:
//! canvas placement, pointer interactions, the context menu, open windows and
//! file operations.

use crate::classifier::Classifier;
use crate::config::AnnotatorConfig;
use crate::lct::LctDocument;
use crate::metrics::MonospaceMetrics;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Placement of the annotation scene on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasState {
    /// Screen position of the scene origin, captured every frame
    pub origin: egui::Pos2,
    /// Width the scene was last allocated with
    pub width: f32,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            origin: egui::Pos2::ZERO,
            width: 0.0,
        }
    }
}

/// State of pointer interactions with separators and badges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    /// Separator index being dragged
    pub dragging_separator: Option<usize>,
    /// Group whose descriptor editor is open
    pub editing_group: Option<usize>,
    /// Group under the pointer
    pub hovered_group: Option<usize>,
}

/// Right-click menu over the text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextMenuState {
    /// Whether the menu is visible
    pub show: bool,
    /// Screen position of the menu
    pub screen_pos: (f32, f32),
    /// Scene position the menu actions apply to
    pub scene_pos: (f32, f32),
    /// Keeps the opening click from closing the menu
    pub just_opened: bool,
}

/// Actions offered by the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Insert a separator at the gap under the pointer
    Split,
    /// Remove the separator under the pointer
    Join,
    /// Make the separator under the pointer a super-clause boundary
    Promote,
    /// Turn a super-clause boundary back into a clause boundary
    Demote,
}

/// Draft of the text being annotated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextEditorState {
    /// Whether the window is open
    pub open: bool,
    /// Text being edited
    pub draft: String,
}

/// Drafts of the descriptor settings window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsState {
    /// Whether the window is open
    pub open: bool,
    /// Template text
    pub template: String,
    /// Comma-separated allowed values
    pub values: String,
    /// Comma-separated dimension labels
    pub labels: String,
    /// Reason the last apply was refused
    pub error: Option<String>,
}

/// State related to file operations and persistence.
///
/// Manages the current path and the async file operations.
pub struct FileState {
    /// Current file path for save/load operations
    pub current_path: Option<String>,
    /// Pending save operation
    pub pending_save_operation: Option<PendingSaveOperation>,
    /// Pending load operation
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Channel for receiving file operation results from async contexts
    pub file_operation_sender: Option<Sender<FileOperationResult>>,
    /// Receiving end of [`Self::file_operation_sender`]
    pub file_operation_receiver: Option<Receiver<FileOperationResult>>,
    /// Whether to show an unsaved-changes confirmation dialog
    pub show_unsaved_dialog: bool,
    /// The action the user attempted that requires confirmation
    pub pending_confirm_action: Option<PendingConfirmAction>,
    /// One-shot flag to allow the next close request to proceed after user confirmation
    pub allow_close_on_next_request: bool,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            pending_save_operation: None,
            pending_load_operation: None,
            file_operation_sender: Some(sender),
            file_operation_receiver: Some(receiver),
            show_unsaved_dialog: false,
            pending_confirm_action: None,
            allow_close_on_next_request: false,
        }
    }
}

/// Represents a pending save operation type.
#[derive(Debug)]
pub enum PendingSaveOperation {
    /// Save with a new file path (show file picker)
    SaveAs,
    /// Save to the existing file path
    Save,
}

/// Represents a pending load operation type.
#[derive(Debug)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker)
    Load,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(String),
    /// Load operation completed successfully with path and parsed document
    LoadCompleted(String, LctDocument),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// Pending confirmation actions that may require user approval due to unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmAction {
    /// User is attempting to start a new analysis
    New,
    /// User is attempting to open a file
    Open,
    /// User is attempting to quit the application
    Quit,
}

/// The annotator application.
///
/// Only the configuration and UI preferences are persisted; the analysis
/// itself lives in `.lct` files.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorApp {
    /// Descriptor, palette and font settings
    pub config: AnnotatorConfig,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Persisted last known window inner size in logical points
    pub window_inner_size: Option<(f32, f32)>,
    /// The annotation model, built on the first frame
    #[serde(skip)]
    pub classifier: Option<Classifier>,
    /// Why the classifier could not be built
    #[serde(skip)]
    pub config_error: Option<String>,
    /// Deterministic metrics used instead of egui fonts, for headless runs
    #[serde(skip)]
    pub headless_metrics: Option<MonospaceMetrics>,
    /// Canvas placement
    #[serde(skip)]
    pub canvas: CanvasState,
    /// Pointer interaction state
    #[serde(skip)]
    pub interaction: InteractionState,
    /// Context menu state
    #[serde(skip)]
    pub context_menu: ContextMenuState,
    /// Text editor window
    #[serde(skip)]
    pub text_editor: TextEditorState,
    /// Descriptor settings window
    #[serde(skip)]
    pub settings: SettingsState,
    /// File operations state
    #[serde(skip)]
    pub file: FileState,
    /// Last status line message
    #[serde(skip)]
    pub status: Option<String>,
    /// Whether we've already applied the stored window geometry this session
    #[serde(skip)]
    pub applied_viewport_restore: bool,
}

impl Default for AnnotatorApp {
    fn default() -> Self {
        Self {
            config: AnnotatorConfig::default(),
            dark_mode: true,
            window_inner_size: None,
            classifier: None,
            config_error: None,
            headless_metrics: None,
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            context_menu: ContextMenuState::default(),
            text_editor: TextEditorState::default(),
            settings: SettingsState::default(),
            file: FileState::default(),
            status: None,
            applied_viewport_restore: false,
        }
    }
}

impl AnnotatorApp {
    /// Serializes the persisted preferences to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restores persisted preferences from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether the analysis has changes that are not in a file.
    pub fn has_unsaved_changes(&self) -> bool {
        self.classifier.as_ref().is_some_and(Classifier::is_changed)
    }
}
