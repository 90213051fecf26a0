use egui::{Color32, RichText};
use rust_i18n::t;

use crate::{common::SessionState, gui::State, mybtn};

pub fn ui_top_panel(ctx: &egui::Context, state: &mut State) {
    egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
        if state.is_modal_open {
            ui.disable();
        }
        egui::MenuBar::new().ui(ui, |ui| {
            let app_language = state.perma.app_language.lock()
                .map(|lang| lang.clone())
                .unwrap_or_else(|_| "en".to_string());
            let (lang_label, target_lang) = if app_language == "ru" {
                ("ru", "en")
            } else {
                ("en", "ru")
            };
            if ui.button(lang_label)
                .on_hover_text(egui::RichText::new(
                    "Switch Language / Переключить язык")
                    .strong()
                    .heading()
                )
                .clicked()
            {
                if let Ok(mut lang) = state.perma.app_language.lock() {
                    *lang = target_lang.to_string();
                }
                rust_i18n::set_locale(target_lang);
            }
            ui.separator();

            if mybtn!(ui, "menu_dark_theme_btn") {
                ctx.set_theme(egui::Theme::Dark);
                remember_theme(state, true);
            }

            if mybtn!(ui, "menu_light_theme_btn") {
                ctx.set_theme(egui::Theme::Light);
                remember_theme(state, false);
            }

            ui.colored_label(ui.visuals().code_bg_color, "|");

            match state.conversation.model() {
                Some(model) => {
                    ui.label(RichText::new("🔑")
                        .color(Color32::from_rgb(0, 220, 0)).strong())
                        .on_hover_text(t!("key_loaded_tooltip"));
                    ui.label(RichText::new(model)
                        .color(ui.visuals().hyperlink_color));
                }
                None => {
                    ui.colored_label(ui.visuals().error_fg_color, "🔑")
                        .on_hover_text(t!("key_missing_tooltip",
                            var = state.perma.config.key_var.as_str()));
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center),
                    |ui| {
                let status = match state.conversation.state() {
                    SessionState::Uninitialized => t!("status_disabled"),
                    SessionState::Ready => t!("status_ready"),
                    SessionState::AwaitingResponse => t!("status_sending"),
                };
                ui.label(RichText::new(status).weak());
            });
        });
    });
}

fn remember_theme(state: &State, dark: bool) {
    if let Ok(mut theme) = state.perma.dark_theme.lock() {
        *theme = Some(dark);
    }
}
