#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Mutex;

use clap::Parser;
use dotenv::dotenv;
use egui::ViewportBuilder;
use tokio::runtime::Runtime;

use crate::common::{ChatConfig, DEFAULT_BASE_URL, DEFAULT_KEY_VAR, DEFAULT_MODEL};
use crate::gui::MyAppPermanent;

rust_i18n::i18n!("locales", fallback = "en");

mod common;
mod conversation;
mod credential;
mod openai;
mod gui;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Chat model identifier sent with every request
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Fixed system message placed before every prompt
    #[arg(long, env = "OPENAI_SYSTEM_PROMPT")]
    system_prompt: Option<String>,
    /// Environment variable holding the API key
    #[arg(long, default_value = DEFAULT_KEY_VAR)]
    key_var: String,
    #[arg(long)]
    // Set the application theme (e.g., "light", "dark")
    theme: Option<String>,
    #[arg(long)]
    la: Option<String>,
}

impl Args {
    fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            system_prompt: self.system_prompt.clone()
                .filter(|s| !s.trim().is_empty()),
            key_var: self.key_var.clone(),
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    // .env has to be loaded before clap reads env fallbacks
    dotenv().ok();
    let args = Args::parse();
    let config = args.chat_config();
    log::debug!("config: model={} base_url={}", config.model, config.base_url);

    // create the tokio runtime
    let rt = Runtime::new().expect("Unable to create Runtime");

    // enter the runtime context
    // this variable must live as long as the app runs!
    let _enter = rt.enter();

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([720.0, 840.0])
            .with_min_inner_size([360.0, 300.0]),
        ..Default::default()
    };

    let rt_handle = rt.handle().clone();

    eframe::run_native(
        "promptbox",
        native_options,
        Box::new(move |cc| {
            // language setting persistence and overriding
            let mut app_language = "en".to_string();
            let mut dark_theme: Option<bool> = None;
            if let Some(storage) = cc.storage {
                if let Some(saved_lang) = eframe::get_value::<String>(
                        storage, "app_language") {
                    app_language = saved_lang;
                }
                if let Some(saved_theme) = eframe::get_value::<Option<bool>>(
                        storage, "dark_theme") {
                    dark_theme = saved_theme;
                }
            }
            if let Some(la) = args.la {
                match la.as_str() {
                    "ru" | "en" => app_language = la,
                    _ => {
                        log::warn!("Unsupported language '{}'. \
                            Supported: 'en', 'ru'.", la);
                    }
                }
            }
            rust_i18n::set_locale(&app_language);

            // command line wins over the stored theme
            match args.theme.as_deref() {
                Some("light") => dark_theme = Some(false),
                Some("dark") => dark_theme = Some(true),
                Some(other) => log::warn!("Unknown theme '{}'", other),
                None => {}
            }
            match dark_theme {
                Some(true) => cc.egui_ctx.set_theme(egui::Theme::Dark),
                Some(false) => cc.egui_ctx.set_theme(egui::Theme::Light),
                None => {}
            }

            cc.egui_ctx.style_mut(|style| {
                // Show the url of a hyperlink on hover
                style.url_in_tooltip = true;
            });

            Ok(Box::new(gui::MyApp::new(cc, MyAppPermanent {
                rt: rt_handle,
                config,
                app_language: Mutex::new(app_language),
                dark_theme: Mutex::new(dark_theme),
            })))
        }),
    )
}
