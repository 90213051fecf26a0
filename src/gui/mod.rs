use std::sync::{Arc, Mutex};
use eframe::egui::{self};
use egui_commonmark::CommonMarkCache;
use rust_i18n::t;
use tokio::runtime::Handle;
use crate::common::{ChatConfig, ChatError};
use crate::conversation::Conversation;
use crate::credential::load_credential;
use crate::gui::bottom_panel::{BottomPanelState, ui_bottom_panel};
use crate::gui::chat::ui_chat;
use crate::gui::top_panel::ui_top_panel;
use crate::openai::{ChatBackend, OpenAiClient};

mod top_panel;
mod bottom_panel;
mod chat;

pub struct MyAppPermanent {
    pub rt: Handle,
    pub config: ChatConfig,
    pub app_language: Mutex<String>,
    pub dark_theme: Mutex<Option<bool>>,
}

pub struct State {
    perma: Arc<MyAppPermanent>,
    conversation: Conversation,
    common_mark_cache: CommonMarkCache,
    // blocking notification content, shown once for fatal errors
    error_msg: Option<String>,
    is_modal_open: bool,
    bottom_panel_state: BottomPanelState,
}

impl State {
    pub fn new(permanent: Arc<MyAppPermanent>) -> Self {
        let session = open_session(&permanent.config);
        let conversation = Conversation::new(permanent.rt.clone(), session);

        let error_msg = conversation.fatal_error()
                .filter(|err| err.is_fatal()).map(|err| {
            format!("{}\n\n{}", err, t!("error_restart_required"))
        });

        Self {
            perma: permanent,
            conversation,
            common_mark_cache: CommonMarkCache::default(),
            is_modal_open: error_msg.is_some(),
            error_msg,
            bottom_panel_state: BottomPanelState::default(),
        }
    }
}

/// Loads the key and builds the client the conversation will use.
fn open_session(config: &ChatConfig) -> Result<Arc<dyn ChatBackend>, ChatError> {
    let api_key = load_credential(&config.key_var)?;
    Ok(Arc::new(OpenAiClient::new(api_key, config)))
}

pub struct MyApp {
    perma: Arc<MyAppPermanent>,
    state: State,
}

impl MyApp {
    pub fn new(_cc: &eframe::CreationContext<'_>,
            permanent: MyAppPermanent) -> Self {
        let perma_arc = Arc::new(permanent);
        let state_perma = perma_arc.clone();

        Self {
            perma: perma_arc,
            state: State::new(state_perma),
        }
    }
}

impl eframe::App for MyApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, "app_language", &self.perma.app_language);
        eframe::set_value(storage, "dark_theme", &self.perma.dark_theme);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = &mut self.state;

        // replies from worker tasks are applied here and nowhere else
        state.conversation.poll();

        ui_top_panel(ctx, state);

        ui_bottom_panel(ctx, state);

        ui_chat(ctx, state);

        // Draw the Modal (Foreground)
        if let Some(msg) = &state.error_msg {
            let msg_text = msg.clone();
            let mut open = true;

            egui::Window::new(t!("error_window_title"))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.set_min_width(300.0);

                    ui.vertical_centered(|ui| {
                        ui.add_space(10.0);
                        ui.colored_label(ui.visuals().error_fg_color, &msg_text);
                        ui.add_space(20.0);

                        if ui.button(t!("ok_btn")).clicked() {
                            state.error_msg = None;
                            state.is_modal_open = false;
                        }
                    });
                });

            // Handle the "X" button on the window frame
            if !open {
                state.error_msg = None;
                state.is_modal_open = false;
            }
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // any request still in flight is abandoned with the runtime
        log::info!("exiting");
    }
}

#[macro_export]
macro_rules! mybtn {
    // Matches: mybtn!(ui, "label_key") with a "label_key_tooltip" entry
    ($ui:expr, $key:literal) => {
        $ui.button(rust_i18n::t!($key))
            .on_hover_text(
                ::egui::RichText::new(
                    rust_i18n::t!(concat!($key, "_tooltip"))
                )
                .strong()
                .heading()
            )
            .clicked()
    };
}
