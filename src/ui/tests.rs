use super::state::{FileOperationResult, MenuAction, PendingConfirmAction};
use super::*;
use crate::lct::LctDocument;
use crate::metrics::MonospaceMetrics;
use crate::types::GridPos;
use eframe::egui;

fn headless_app() -> AnnotatorApp {
    AnnotatorApp {
        headless_metrics: Some(MonospaceMetrics::default()),
        ..Default::default()
    }
}

/// Run a single headless frame that draws the canvas with the given input events.
fn run_canvas_frame(ctx: &egui::Context, app: &mut AnnotatorApp, events: Vec<egui::Event>) {
    let mut raw = egui::RawInput::default();
    raw.screen_rect = Some(egui::Rect::from_min_size(
        egui::Pos2::ZERO,
        egui::vec2(1200.0, 800.0),
    ));
    raw.events = events;
    let _ = ctx.run(raw, |ctx| {
        ctx.set_visuals(egui::Visuals::dark());
        egui::CentralPanel::default().show(ctx, |ui| {
            app.draw_canvas(ui);
        });
    });
}

fn press(pos: egui::Pos2, pressed: bool) -> egui::Event {
    egui::Event::PointerButton {
        pos,
        button: egui::PointerButton::Primary,
        pressed,
        modifiers: egui::Modifiers::NONE,
    }
}

/// App with "A B C D" on one line, after one frame.
fn app_with_text(ctx: &egui::Context) -> AnnotatorApp {
    let mut app = headless_app();
    run_canvas_frame(ctx, &mut app, vec![]);
    app.apply_text(ctx, "A B C D");
    app
}

fn gap_on_screen(app: &AnnotatorApp, pos: GridPos) -> egui::Pos2 {
    let classifier = app.classifier.as_ref().unwrap();
    let (x, y) = classifier.grid().point(pos);
    app.scene_to_screen(x, y)
}

#[test]
fn test_first_frame_builds_classifier() {
    let ctx = egui::Context::default();
    let mut app = headless_app();
    assert!(app.classifier.is_none());

    run_canvas_frame(&ctx, &mut app, vec![]);

    let classifier = app.classifier.as_ref().expect("classifier should exist after a frame");
    assert_eq!(classifier.group_count(), 1);
    assert!(app.config_error.is_none());
    assert!(app.canvas.width > 0.0);
}

#[test]
fn test_invalid_stored_config_is_reported_not_fatal() {
    let ctx = egui::Context::default();
    let mut app = headless_app();
    app.config.colors.pop();

    run_canvas_frame(&ctx, &mut app, vec![]);

    assert!(app.classifier.is_none());
    assert!(app.config_error.is_some());
}

#[test]
fn test_context_menu_split_promote_and_join() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);

    let gap = gap_on_screen(&app, GridPos::new(0, 2));
    app.open_context_menu(gap);
    assert!(app.context_menu.show);
    assert!(app.menu_action_enabled(MenuAction::Split));
    assert!(!app.menu_action_enabled(MenuAction::Join));
    assert!(app.apply_menu_action(MenuAction::Split));
    assert!(!app.context_menu.show);
    assert_eq!(app.classifier.as_ref().unwrap().group_count(), 2);

    app.open_context_menu(gap);
    assert!(!app.menu_action_enabled(MenuAction::Split));
    assert!(app.menu_action_enabled(MenuAction::Join));
    assert!(app.menu_action_enabled(MenuAction::Promote));
    assert!(!app.menu_action_enabled(MenuAction::Demote));
    assert!(app.apply_menu_action(MenuAction::Promote));
    assert!(app.classifier.as_ref().unwrap().separators()[1].is_super);

    app.open_context_menu(gap);
    assert!(app.apply_menu_action(MenuAction::Join));
    assert_eq!(app.classifier.as_ref().unwrap().group_count(), 1);
}

#[test]
fn test_dragging_separator_moves_it() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);
    app.open_context_menu(gap_on_screen(&app, GridPos::new(0, 2)));
    assert!(app.apply_menu_action(MenuAction::Split));

    let start = gap_on_screen(&app, GridPos::new(0, 2));
    let target = gap_on_screen(&app, GridPos::new(0, 3));

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(start), press(start, true)]);
    assert_eq!(app.interaction.dragging_separator, Some(1));

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(target)]);
    let classifier = app.classifier.as_ref().unwrap();
    assert_eq!(classifier.separators()[1].position, GridPos::new(0, 3));
    assert_eq!(classifier.spans().spans().len(), 2);

    run_canvas_frame(&ctx, &mut app, vec![press(target, false)]);
    assert_eq!(app.interaction.dragging_separator, None);
}

#[test]
fn test_clicking_badge_opens_descriptor_editor() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);

    let metrics = app.canvas_metrics(&ctx);
    let classifier = app.classifier.as_ref().unwrap();
    let badge = &classifier.descriptors().descriptors()[0];
    let rect = classifier.badge_rect(badge, &metrics);
    let center = app.scene_to_screen(rect.center_x(), rect.y + rect.height / 2.0);

    run_canvas_frame(&ctx, &mut app, vec![egui::Event::PointerMoved(center), press(center, true)]);
    run_canvas_frame(&ctx, &mut app, vec![press(center, false)]);

    assert_eq!(app.interaction.editing_group, Some(0));
    assert!(app.classifier.as_ref().unwrap().descriptors().descriptors()[0].highlighted);
}

#[test]
fn test_unsaved_changes_ask_before_starting_over() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);
    assert!(app.has_unsaved_changes());

    app.request_action(&ctx, PendingConfirmAction::New);
    assert!(app.file.show_unsaved_dialog);
    assert_eq!(app.file.pending_confirm_action, Some(PendingConfirmAction::New));
    assert_eq!(app.classifier.as_ref().unwrap().text(), "A B C D");

    app.file.show_unsaved_dialog = false;
    app.classifier.as_mut().unwrap().mark_saved();
    app.request_action(&ctx, PendingConfirmAction::New);
    assert!(!app.file.show_unsaved_dialog);
    assert_eq!(app.classifier.as_ref().unwrap().text(), "");
}

#[test]
fn test_analysis_survives_save_and_open() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);
    app.open_context_menu(gap_on_screen(&app, GridPos::new(0, 2)));
    assert!(app.apply_menu_action(MenuAction::Split));
    let values = vec!["+".to_string(), "--".to_string()];
    assert!(app.classifier.as_mut().unwrap().set_descriptor_values(1, values.clone()));

    let document = app.analysis_document().unwrap();
    app.apply_file_result(&ctx, FileOperationResult::SaveCompleted("a.lct".to_string()));
    assert!(!app.has_unsaved_changes());
    assert_eq!(app.file.current_path.as_deref(), Some("a.lct"));

    let mut other = headless_app();
    run_canvas_frame(&ctx, &mut other, vec![]);
    other.apply_file_result(&ctx, FileOperationResult::LoadCompleted("a.lct".to_string(), document));

    let classifier = other.classifier.as_ref().unwrap();
    assert_eq!(classifier.text(), "A B C D");
    assert_eq!(classifier.group_count(), 2);
    assert_eq!(classifier.descriptors().group_descriptor(1).unwrap().editable, values);
    assert!(!other.has_unsaved_changes());
    assert_eq!(other.file.current_path.as_deref(), Some("a.lct"));
}

#[test]
fn test_empty_analysis_survives_save_and_open() {
    let ctx = egui::Context::default();
    let mut app = headless_app();
    run_canvas_frame(&ctx, &mut app, vec![]);
    assert!(app.classifier.as_ref().unwrap().analyzed_tree().is_empty());

    let xml = app.analysis_document().unwrap().to_xml().unwrap();
    let reopened = LctDocument::from_xml(&xml).unwrap();
    assert!(reopened.analysis.is_empty());

    let mut other = app_with_text(&ctx);
    other.apply_file_result(&ctx, FileOperationResult::LoadCompleted("empty.lct".to_string(), reopened));

    let classifier = other.classifier.as_ref().unwrap();
    assert_eq!(classifier.text(), "");
    assert_eq!(classifier.group_count(), 1);
    assert!(!other.has_unsaved_changes());
    assert_eq!(other.file.current_path.as_deref(), Some("empty.lct"));
}

#[test]
fn test_loading_mismatched_document_keeps_current_analysis() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);
    let xml = r#"<lct version="1.0"><analysis><superClause value="99"><clause value="99">x</clause></superClause></analysis></lct>"#;
    let document = LctDocument::from_xml(xml).unwrap();

    app.apply_file_result(&ctx, FileOperationResult::LoadCompleted("b.lct".to_string(), document));

    assert_eq!(app.classifier.as_ref().unwrap().text(), "A B C D");
    assert!(app.file.current_path.is_none());
    assert!(app.status.as_deref().unwrap_or_default().contains("b.lct"));
}

#[test]
fn test_font_size_change_keeps_clauses() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);
    app.open_context_menu(gap_on_screen(&app, GridPos::new(0, 2)));
    assert!(app.apply_menu_action(MenuAction::Split));

    app.apply_font_size(&ctx, 24.0);

    let classifier = app.classifier.as_ref().unwrap();
    assert_eq!(app.config.font_size, 24.0);
    assert_eq!(classifier.font().size, 24.0);
    assert_eq!(classifier.group_count(), 2);
    let tree = classifier.analyzed_tree();
    let texts: Vec<&str> = tree.clauses().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["A B", "C D"]);
}

#[test]
fn test_descriptor_settings_are_validated() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);

    app.settings.template = "no placeholder".to_string();
    app.settings.values = "+, -".to_string();
    assert!(!app.apply_settings(&ctx));
    assert!(app.settings.error.is_some());
    assert_eq!(app.config.template, "SD~;SG~");

    app.settings.template = "SD~".to_string();
    app.settings.labels = "SD".to_string();
    assert!(app.apply_settings(&ctx));
    assert_eq!(app.config.colors.len(), 3);
    let classifier = app.classifier.as_ref().unwrap();
    assert_eq!(classifier.config().template.segment_count(), 1);
    assert_eq!(classifier.text(), "A B C D");
}

#[test]
fn test_oversized_template_is_refused_in_settings() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);

    app.settings.template = "~".repeat(40);
    app.settings.values = "++, +, -, --".to_string();
    app.settings.labels = String::new();
    assert!(!app.apply_settings(&ctx));

    assert!(app.settings.error.as_deref().unwrap_or_default().contains("combinations"));
    assert_eq!(app.config.template, "SD~;SG~");
    assert_eq!(app.config.colors.len(), 17);
    assert_eq!(app.classifier.as_ref().unwrap().text(), "A B C D");
}

#[test]
fn test_persisted_state_excludes_the_analysis() {
    let ctx = egui::Context::default();
    let mut app = app_with_text(&ctx);
    app.dark_mode = false;
    app.config.font_size = 22.0;

    let json = app.to_json().unwrap();
    let restored = AnnotatorApp::from_json(&json).unwrap();

    assert!(restored.classifier.is_none());
    assert!(!restored.dark_mode);
    assert_eq!(restored.config, app.config);
}
