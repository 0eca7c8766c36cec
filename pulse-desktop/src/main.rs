//! NetPulse desktop dashboard
//!
//! A live view of the packets a capture backend pushes over its WebSocket
//! channel, with session control over HTTP. Run with the `simulate` setting
//! to drive the dashboard from an in-process backend instead.

mod app;
mod error;
mod http_api;
mod packet_view;
mod pipeline;
mod settings;
mod ws_transport;

use app::NetPulseApp;
use eframe::NativeOptions;
use settings::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "netpulse=info,pulse_desktop=info,pulse_engine=info,pulse_protocol=info,pulse_sim=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting NetPulse");

    let settings = Settings::load();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("netpulse-worker")
        .build()
        .map_err(|e| {
            tracing::error!("Failed to create async runtime: {}", e);
            eframe::Error::AppCreation(Box::new(e))
        })?;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("NetPulse - Packet Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "NetPulse",
        options,
        Box::new(move |cc| Ok(Box::new(NetPulseApp::new(cc, runtime, settings)))),
    )
}
