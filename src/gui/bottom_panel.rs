use egui::{Key, Ui};
use rust_i18n::t;

use crate::{common::SessionState, gui::State};

pub struct BottomPanelState {
    pub prompt_edited: String,
    pub send_btn_width: f32,
    // set after a submit so the text box grabs focus again
    pub refocus: bool,
}

impl Default for BottomPanelState {
    fn default() -> Self {
        Self {
            prompt_edited: String::new(),
            send_btn_width: 80.0,
            refocus: true,
        }
    }
}

pub fn ui_bottom_panel(ctx: &egui::Context, state: &mut State) {
    egui::TopBottomPanel::bottom("chat_input_panel")
        .resizable(false)
        .show(ctx, |ui| {
            if state.is_modal_open {
                ui.disable();
            }
            ui.add_space(6.0);

            if state.conversation.state() == SessionState::AwaitingResponse {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(egui::RichText::new(t!("assistant_typing"))
                        .italics().weak());
                });
            }

            ui.horizontal(|ui| {
                render_prompt_row(ui, state, ctx);
            });
            ui.add_space(6.0);
        });
}

fn render_prompt_row(ui: &mut Ui, state: &mut State, ctx: &egui::Context) {
    let enabled = state.conversation.input_enabled();
    let btn_width = state.bottom_panel_state.send_btn_width;

    let hint = if state.conversation.state() == SessionState::Uninitialized {
        t!("input_disabled_hint")
    } else {
        t!("enter_prompt_here")
    };

    let edit_width = (ui.available_width() - btn_width - 8.0).max(100.0);
    let response = ui.add_enabled(enabled,
        egui::TextEdit::singleline(&mut state.bottom_panel_state.prompt_edited)
            .desired_width(edit_width)
            .hint_text(hint)
    );

    if enabled && state.bottom_panel_state.refocus {
        response.request_focus();
        state.bottom_panel_state.refocus = false;
    }

    // Enter in a single line edit drops focus, that is our submit signal
    let enter_pressed = response.lost_focus()
        && ui.input(|i| i.key_pressed(Key::Enter));

    let has_text = !state.bottom_panel_state.prompt_edited.trim().is_empty();
    let send_clicked = ui.add_enabled(enabled && has_text,
        egui::Button::new(t!("send_prompt_btn"))
            .min_size(egui::vec2(btn_width, 0.0)))
        .clicked();

    if enter_pressed || send_clicked {
        submit_prompt(state, ctx);
    }
}

fn submit_prompt(state: &mut State, ctx: &egui::Context) {
    let prompt_text = state.bottom_panel_state.prompt_edited.clone();

    // blank input and busy sessions are refused by the conversation itself
    if state.conversation.submit(&prompt_text, ctx) {
        state.bottom_panel_state.prompt_edited.clear();
        state.bottom_panel_state.refocus = true;
    }
}
