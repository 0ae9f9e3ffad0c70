mod app;
mod chat;
mod client;
mod config;
mod error;
mod event;
mod ontology;
mod theme;
mod ui;

use app::BellaApp;
use client::BellaClient;
use config::AppConfig;
use event::EventSink;
use std::sync::mpsc;
use tracing_subscriber::EnvFilter;

type AppInitError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    tracing::info!(api = %config.api_base_url, "starting Bella");

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("bella-runtime")
        .build()?;
    let runtime_handle = runtime.handle().clone();
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Bella Chat")
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bella",
        native_options,
        Box::new(
            move |creation_context: &eframe::CreationContext<'_>| -> Result<Box<dyn eframe::App>, AppInitError> {
                let ctx = creation_context.egui_ctx.clone();
                let sink = EventSink::new(tx, ctx.clone());
                let client = BellaClient::new(&config, sink, runtime_handle)?;
                Ok(Box::new(BellaApp::new(&ctx, rx, client, config)))
            },
        ),
    )?;

    Ok(())
}
