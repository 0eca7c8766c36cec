//! Main application state and UI
//!
//! This module contains the core `NetPulseApp` struct and is organized into submodules:
//! - `status`: Status messaging and dashboard input helpers
//! - `events`: Dashboard event processing and notification toasts
//! - `ui_panels`: UI panel drawing methods

mod events;
mod status;
mod ui_panels;

use std::time::{Duration, Instant};

use eframe::CreationContext;
use pulse_engine::DashboardView;

use crate::packet_view::{PacketAction, PacketTable};
use crate::pipeline::{self, Pipeline};
use crate::settings::Settings;

use events::Toast;

/// Repaint interval while the dashboard is live
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Main application state
pub struct NetPulseApp {
    /// Settings
    pub(super) settings: Settings,
    /// Status message
    pub(super) status_message: Option<(String, Instant)>,
    /// Show settings panel
    pub(super) show_settings: bool,
    /// Show the charts panel
    pub(super) show_charts: bool,
    /// Channels to the running dashboard, if it started
    pub(super) pipeline: Option<Pipeline>,
    /// Why the dashboard did not start
    pub(super) startup_error: Option<String>,
    /// Latest published dashboard view
    pub(super) view: Option<DashboardView>,
    /// Notifications currently on screen
    pub(super) toasts: Vec<Toast>,
    /// Address filter text being edited
    pub(super) address_filter: String,
    /// Name for the next manually created session
    pub(super) new_session_name: String,
    /// Packet list
    pub(super) packet_table: PacketTable,
    /// Tokio runtime (must be kept alive for async tasks)
    _runtime: Option<tokio::runtime::Runtime>,
}

impl NetPulseApp {
    /// Create a new application
    pub fn new(
        _cc: &CreationContext<'_>,
        runtime: tokio::runtime::Runtime,
        settings: Settings,
    ) -> Self {
        let rt_handle = runtime.handle().clone();

        let mut app = Self {
            settings,
            status_message: None,
            show_settings: false,
            show_charts: true,
            pipeline: None,
            startup_error: None,
            view: None,
            toasts: Vec::new(),
            address_filter: String::new(),
            new_session_name: String::new(),
            packet_table: PacketTable::new(),
            _runtime: Some(runtime),
        };

        match pipeline::launch(&rt_handle, &app.settings) {
            Ok(pipeline) => {
                app.view = Some(pipeline.view_rx.borrow().clone());
                app.pipeline = Some(pipeline);
            }
            Err(e) => {
                app.report_err("Startup", e.to_string());
                app.startup_error = Some(e.to_string());
            }
        }

        app
    }

    /// Pull the latest view if the actor published a new one
    fn refresh_view(&mut self) {
        let Some(pipeline) = &mut self.pipeline else {
            return;
        };
        if pipeline.view_rx.has_changed().unwrap_or(false) {
            self.view = Some(pipeline.view_rx.borrow_and_update().clone());
        }
    }

    fn draw_main(&mut self, ui: &mut egui::Ui) {
        let Some(view) = self.view.clone() else {
            ui.centered_and_justified(|ui| {
                let message = self
                    .startup_error
                    .as_deref()
                    .unwrap_or("Dashboard is starting");
                ui.label(egui::RichText::new(message).color(egui::Color32::GRAY));
            });
            return;
        };

        self.draw_headline(ui, &view);
        ui.add_space(8.0);
        self.draw_filter_bar(ui, &view);
        ui.separator();

        if let Some(detail) = &view.detail {
            egui::TopBottomPanel::bottom("packet_detail")
                .resizable(true)
                .default_height(220.0)
                .show_inside(ui, |ui| {
                    if crate::packet_view::draw_packet_detail(ui, detail) {
                        self.send_user_action(
                            pulse_engine::UserAction::SelectPacket(None),
                            "SelectPacket",
                        );
                    }
                });
        }

        if let Some(action) = self.packet_table.draw(ui, &view.rows) {
            let id = match action {
                PacketAction::Select(id) => Some(id),
                PacketAction::Deselect => None,
            };
            self.send_user_action(pulse_engine::UserAction::SelectPacket(id), "SelectPacket");
        }
    }
}

impl eframe::App for NetPulseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process dashboard output (non-blocking)
        self.process_events();
        self.refresh_view();

        // Clear old status messages
        if let Some((_, when)) = &self.status_message {
            if when.elapsed().as_secs() > 5 {
                self.status_message = None;
            }
        }

        // Top panel - toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        // Bottom panel - status line
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        // Settings panel (side panel)
        if self.show_settings {
            egui::SidePanel::right("settings")
                .default_width(320.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.heading("Session");
                        ui.separator();
                        self.draw_session_panel(ui);

                        ui.add_space(16.0);
                        ui.heading("Settings");
                        ui.separator();
                        if let Some(error) = self.settings.draw(ui) {
                            self.handle_save_error(error);
                        }

                        ui.add_space(16.0);
                        ui.separator();
                        if ui.button("Close").clicked() {
                            self.show_settings = false;
                        }
                    });
                });
        }

        // Charts panel
        if self.show_charts {
            if let Some(view) = self.view.clone() {
                egui::SidePanel::left("charts")
                    .default_width(280.0)
                    .min_width(220.0)
                    .show(ctx, |ui| {
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            self.draw_charts(ui, &view);
                        });
                    });
            }
        }

        // Central panel - headline, filters, packet list and detail
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_main(ui);
        });

        self.draw_toasts(ctx);

        // Packets and ticks arrive asynchronously
        if self.pipeline.is_some() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }
    }
}
