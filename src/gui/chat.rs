use egui::{Color32, Margin, RichText, Stroke, Visuals};
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};
use rust_i18n::t;

use crate::{
    common::{EntryKind, TranscriptEntry},
    gui::State,
};

// --- Main Entry Point ---

pub fn ui_chat(ctx: &egui::Context, state: &mut State) {
    egui::CentralPanel::default()
    .show(ctx, |ui| {
        if state.is_modal_open {
            ui.disable();
        }
        egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .id_salt("chat_scroll_main")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            render_transcript(ui, state, ui.available_width());
        });
    });
}

/// Frame color for each entry style.
pub fn entry_color(visuals: &Visuals, kind: EntryKind) -> Color32 {
    match kind {
        EntryKind::User => visuals.strong_text_color(),
        EntryKind::Assistant => visuals.hyperlink_color,
        EntryKind::Error => visuals.error_fg_color,
        EntryKind::Info => visuals.weak_text_color(),
    }
}

fn entry_label(kind: EntryKind) -> String {
    match kind {
        EntryKind::User => t!("label_user").to_string(),
        EntryKind::Assistant => t!("label_assistant").to_string(),
        EntryKind::Error => t!("label_error").to_string(),
        EntryKind::Info => t!("label_info").to_string(),
    }
}

// --- Entry Rendering ---

fn render_transcript(ui: &mut egui::Ui, state: &mut State, total_width: f32) {
    let cache = &mut state.common_mark_cache;
    let transcript = state.conversation.transcript();

    let max_w = (total_width - 30.0).clamp(300.0, 900.0);

    // startup notices stay below the welcome frame until the first prompt
    if transcript.awaiting_first_prompt() {
        egui::Frame::default()
        .stroke(Stroke {
            width: 1.0,
            color: ui.visuals().hyperlink_color,
        })
        .outer_margin(Margin {
            top: 0,
            right: 5,
            bottom: 10,
            left: 5,
        })
        .inner_margin(10.0)
        .corner_radius(5.0)
        .fill(ui.visuals().faint_bg_color)
        .show(ui, |ui| {
            ui.heading(t!("welcome"));
        });
    }

    for (ind, entry) in transcript.entries().iter().enumerate() {
        match entry.kind {
            EntryKind::User => render_user_entry(ui, entry, max_w),
            EntryKind::Assistant => render_assistant_entry(ui, cache, entry,
                max_w, ind),
            EntryKind::Error | EntryKind::Info => render_notice(ui, entry),
        }
    }
}

fn render_user_entry(ui: &mut egui::Ui, entry: &TranscriptEntry, max_w: f32) {
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.set_max_width(max_w);

            egui::Frame::default()
            .stroke(Stroke::new(1.0, entry_color(ui.visuals(), entry.kind)))
            .outer_margin(Margin {
                top: 0,
                right: 0,
                bottom: 10,
                left: 60,
            })
            .inner_margin(10.0)
            .corner_radius(5.0)
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                render_entry_header(ui, entry);
                ui.label(RichText::new(&entry.text).strong());
            });
        });
        ui.allocate_space(egui::vec2(ui.available_width(), 0.0));
    });
}

fn render_assistant_entry(
    ui: &mut egui::Ui,
    cache: &mut CommonMarkCache,
    entry: &TranscriptEntry,
    max_w: f32,
    ind: usize,
) {
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.set_max_width(max_w);

            egui::Frame::default()
            .stroke(Stroke::new(1.0, entry_color(ui.visuals(), entry.kind)))
            .outer_margin(Margin {
                top: 0,
                right: 0,
                bottom: 15,
                left: 0,
            })
            .inner_margin(10.0)
            .corner_radius(5.0)
            .fill(ui.visuals().faint_bg_color)
            .show(ui, |ui| {
                render_entry_header(ui, entry);
                ui.push_id(ind, |ui| {
                    CommonMarkViewer::new()
                    .max_image_width(Some((max_w - 20.0) as usize))
                    .show(ui, cache, &entry.text);
                });
            });
        });
        ui.allocate_space(egui::vec2(ui.available_width(), 0.0));
    });
}

// error and info entries: one line, no bubble
fn render_notice(ui: &mut egui::Ui, entry: &TranscriptEntry) {
    let color = entry_color(ui.visuals(), entry.kind);
    egui::Frame::default()
    .stroke(Stroke::new(1.0, color))
    .inner_margin(Margin::symmetric(8, 4))
    .outer_margin(Margin { top: 0, right: 0, bottom: 10, left: 0 })
    .corner_radius(3.0)
    .show(ui, |ui| {
        ui.horizontal_wrapped(|ui| {
            let mut text = RichText::new(&entry.text).color(color);
            if entry.kind == EntryKind::Info {
                text = text.italics();
            } else {
                ui.label(RichText::new(format!("{}:", entry_label(entry.kind)))
                    .color(color).strong());
            }
            ui.label(text);
        });
    });
}

fn render_entry_header(ui: &mut egui::Ui, entry: &TranscriptEntry) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(format!("{}:", entry_label(entry.kind)))
            .color(entry_color(ui.visuals(), entry.kind))
            .strong());

        ui.with_layout(
            egui::Layout::right_to_left(egui::Align::Center),
            |ui| {
                ui.label(RichText::new(entry.at.format("%H:%M:%S").to_string())
                    .small().weak());
            },
        );
    });
}
