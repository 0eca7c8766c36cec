//! UI panel drawing methods

use egui::{Color32, RichText, Ui};
use pulse_engine::{
    Chart, DashboardView, NotificationKind, PacketFilter, ProtocolFilter, UserAction,
};
use pulse_protocol::display::group_thousands;

use crate::packet_view::protocol_color;
use crate::pipeline::startup_session_name;

use super::NetPulseApp;

/// Height of the traffic history strip
const TRAFFIC_HEIGHT: f32 = 64.0;

/// Label for the unfiltered protocol choice
const ALL_PROTOCOLS: &str = "All Protocols";

impl NetPulseApp {
    /// Draw the toolbar
    pub(super) fn draw_toolbar(&mut self, ui: &mut Ui) {
        let view = self.view.clone();

        ui.horizontal(|ui| {
            if let Some(view) = &view {
                if ui
                    .add_enabled(view.can_start, egui::Button::new("Start Capture"))
                    .clicked()
                {
                    self.send_user_action(UserAction::StartCapture, "StartCapture");
                }
                if ui
                    .add_enabled(view.can_stop, egui::Button::new("Stop Capture"))
                    .clicked()
                {
                    self.send_user_action(UserAction::StopCapture, "StopCapture");
                }

                ui.add_enabled_ui(view.can_export, |ui| {
                    ui.menu_button("Export", |ui| {
                        self.draw_export_menu(ui, view);
                    });
                });

                if ui.button("Clear").clicked() {
                    self.send_user_action(UserAction::ClearData, "ClearData");
                }

                ui.separator();
            }

            if ui.button("Charts").clicked() {
                self.show_charts = !self.show_charts;
            }
            if ui.button("Settings").clicked() {
                self.show_settings = !self.show_settings;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let Some(view) = &view else {
                    return;
                };

                // Channel indicator
                if view.connected {
                    ui.label(RichText::new("*").color(Color32::GREEN).size(16.0));
                    ui.label("Connected");
                } else {
                    ui.label(RichText::new("o").color(Color32::RED).size(16.0));
                    ui.label(RichText::new("Disconnected").color(Color32::RED));
                }

                ui.separator();

                ui.label(RichText::new(&view.elapsed).monospace().size(16.0));

                let state_color = if view.capture_state.can_stop() {
                    Color32::GREEN
                } else {
                    Color32::GRAY
                };
                ui.label(RichText::new(view.capture_state.label()).color(state_color));

                ui.separator();

                match &view.session {
                    Some(session) => {
                        ui.label(RichText::new(&session.name).strong())
                            .on_hover_text(format!("Session {}", session.id));
                    }
                    None => {
                        ui.label(RichText::new("No session").color(Color32::GRAY));
                    }
                }
            });
        });
    }

    fn draw_export_menu(&mut self, ui: &mut Ui, view: &DashboardView) {
        let Some(session) = &view.session else {
            return;
        };

        if ui.button("Save As...").clicked() {
            ui.close();
            let picked = rfd::FileDialog::new()
                .set_directory(self.settings.export_dir())
                .set_file_name(format!("session-{}.json", session.id))
                .add_filter("JSON", &["json"])
                .save_file();
            if let Some(path) = picked {
                self.send_user_action(
                    UserAction::ExportSession {
                        destination: Some(path),
                    },
                    "ExportSession",
                );
            }
        }

        let quick = format!("Save to {}", self.settings.export_dir().display());
        if ui.button(quick).clicked() {
            ui.close();
            self.send_user_action(
                UserAction::ExportSession { destination: None },
                "ExportSession",
            );
        }
    }

    /// Draw the status line
    pub(super) fn draw_status_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if let Some((message, _)) = &self.status_message {
                ui.label(message);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(view) = &self.view {
                    ui.label(
                        RichText::new(format!(
                            "{} shown / {} buffered",
                            view.rows.len(),
                            view.buffered
                        ))
                        .small()
                        .color(Color32::GRAY),
                    );
                }
                let origin = if self.settings.simulate {
                    "simulated backend".to_string()
                } else {
                    self.settings.effective_origin()
                };
                ui.label(RichText::new(origin).small().color(Color32::GRAY));
            });
        });
    }

    /// Draw the new-session controls
    pub(super) fn draw_session_panel(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("Name:");
            ui.add(
                egui::TextEdit::singleline(&mut self.new_session_name)
                    .hint_text("Session <date>")
                    .desired_width(180.0),
            );
        });

        if ui.button("New Session").clicked() {
            let name = match self.new_session_name.trim() {
                "" => startup_session_name(),
                name => name.to_string(),
            };
            self.new_session_name.clear();
            self.send_user_action(UserAction::CreateSession { name }, "CreateSession");
        }
    }

    /// Draw the headline counters
    pub(super) fn draw_headline(&self, ui: &mut Ui, view: &DashboardView) {
        let headline = &view.headline;
        let cards = [
            ("Total Packets", headline.total_packets.as_str(), None),
            ("Packets/sec", headline.packets_per_second.as_str(), None),
            (
                "Anomalies",
                headline.anomalies.as_str(),
                Some(Color32::from_rgb(255, 80, 80)),
            ),
            ("Data Volume", headline.data_volume.as_str(), None),
            ("Unique IPs", headline.unique_ips.as_str(), None),
        ];

        ui.horizontal(|ui| {
            for (title, value, color) in cards {
                ui.group(|ui| {
                    ui.set_min_width(120.0);
                    ui.vertical(|ui| {
                        ui.label(RichText::new(title).small().color(Color32::GRAY));
                        let text = RichText::new(value).size(20.0).strong();
                        ui.label(match color {
                            Some(color) => text.color(color),
                            None => text,
                        });
                    });
                });
            }
        });
    }

    /// Draw the protocol and address filters
    pub(super) fn draw_filter_bar(&mut self, ui: &mut Ui, view: &DashboardView) {
        let current = view.filter.protocol.clone();
        let mut choice: Option<ProtocolFilter> = None;

        ui.horizontal(|ui| {
            ui.label("Protocol:");
            let selected_text = match &current {
                ProtocolFilter::All => ALL_PROTOCOLS.to_string(),
                ProtocolFilter::Exact(tag) => tag.clone(),
            };
            egui::ComboBox::from_id_salt("protocol_filter")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_label(current == ProtocolFilter::All, ALL_PROTOCOLS)
                        .clicked()
                    {
                        choice = Some(ProtocolFilter::All);
                    }
                    for protocol in &view.known_protocols {
                        let option = protocol_option(protocol);
                        if ui
                            .selectable_label(current == option, protocol.as_str())
                            .clicked()
                        {
                            choice = Some(option);
                        }
                    }
                });

            ui.separator();

            ui.label("Address:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.address_filter)
                    .hint_text("e.g. 192.168.")
                    .desired_width(200.0),
            );
            if response.changed() {
                let address = self.address_filter.clone();
                self.send_user_action(UserAction::SetAddressFilter(address), "SetAddressFilter");
            }
            if !self.address_filter.is_empty() && ui.small_button("x").clicked() {
                self.address_filter.clear();
                self.send_user_action(
                    UserAction::SetAddressFilter(String::new()),
                    "SetAddressFilter",
                );
            }

            if !view.filter.is_identity() && ui.button("Clear filters").clicked() {
                self.address_filter.clear();
                for action in clear_filter_actions(&view.filter) {
                    self.send_user_action(action, "ClearFilters");
                }
                choice = None;
            }
        });

        if let Some(protocol) = choice.filter(|p| *p != current) {
            self.send_user_action(UserAction::SetProtocolFilter(protocol), "SetProtocolFilter");
        }
    }

    /// Draw protocol distribution, top sources and traffic history
    pub(super) fn draw_charts(&self, ui: &mut Ui, view: &DashboardView) {
        ui.heading("Protocols");
        ui.separator();
        match &view.protocol_chart {
            Chart::NoData => no_data(ui),
            Chart::Rows(shares) => {
                for share in shares {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new(&share.protocol)
                                .monospace()
                                .color(protocol_color(&share.protocol.to_lowercase())),
                        );
                        ui.add(
                            egui::ProgressBar::new((share.percent / 100.0) as f32)
                                .text(format!("{}%", share.rounded))
                                .desired_width(ui.available_width()),
                        )
                        .on_hover_text(format!("{} packets", share.count));
                    });
                }
            }
        }

        ui.add_space(16.0);
        ui.heading("Top Sources");
        ui.separator();
        match &view.top_sources {
            Chart::NoData => no_data(ui),
            Chart::Rows(sources) => {
                egui::Grid::new("top_sources")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        for source in sources {
                            ui.label(RichText::new(&source.ip).monospace());
                            ui.label(source_count_label(source.count));
                            ui.end_row();
                        }
                    });
            }
        }

        ui.add_space(16.0);
        ui.heading("Traffic");
        ui.separator();
        self.draw_traffic(ui, view);
    }

    fn draw_traffic(&self, ui: &mut Ui, view: &DashboardView) {
        let width = ui.available_width();
        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(width, TRAFFIC_HEIGHT), egui::Sense::hover());
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 2.0, Color32::from_rgb(20, 20, 20));

        let count = view.traffic.len().max(1) as f32;
        let slot = rect.width() / count;
        for (i, bar) in view.traffic.iter().enumerate() {
            let height = rect.height() * (bar.height_percent / 100.0) as f32;
            let left = rect.left() + slot * i as f32 + 1.0;
            let bar_rect = egui::Rect::from_min_max(
                egui::pos2(left, rect.bottom() - height),
                egui::pos2(left + (slot - 2.0).max(1.0), rect.bottom()),
            );
            painter.rect_filled(bar_rect, 1.0, Color32::from_rgb(100, 180, 255));
        }

        if let Some(latest) = view.traffic.last() {
            response.on_hover_text(format!("{:.1} packets/s", latest.value));
        }
    }

    /// Draw notification toasts in the top-right corner
    pub(super) fn draw_toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 48.0))
            .show(ctx, |ui| {
                for toast in self.toasts.iter().rev() {
                    let (fill, accent) = match toast.notification.kind {
                        NotificationKind::Success => {
                            (Color32::from_rgb(30, 50, 30), Color32::GREEN)
                        }
                        NotificationKind::Error => {
                            (Color32::from_rgb(60, 25, 25), Color32::from_rgb(255, 80, 80))
                        }
                    };
                    egui::Frame::popup(ui.style()).fill(fill).show(ui, |ui| {
                        ui.set_max_width(280.0);
                        ui.label(RichText::new(&toast.notification.title).strong().color(accent));
                        ui.label(&toast.notification.description);
                    });
                    ui.add_space(6.0);
                }
            });
    }
}

/// Combo box entry for an observed tag, matched literally
fn protocol_option(tag: &str) -> ProtocolFilter {
    ProtocolFilter::Exact(tag.to_string())
}

/// Actions that return `filter` to showing everything
fn clear_filter_actions(filter: &PacketFilter) -> Vec<UserAction> {
    let mut actions = Vec::new();
    if filter.protocol != ProtocolFilter::All {
        actions.push(UserAction::SetProtocolFilter(ProtocolFilter::All));
    }
    if !filter.address.is_empty() {
        actions.push(UserAction::SetAddressFilter(String::new()));
    }
    actions
}

fn source_count_label(count: u64) -> String {
    format!("{} pkts", group_thousands(count))
}

fn no_data(ui: &mut Ui) {
    ui.label(RichText::new("No data available").italics().color(Color32::GRAY));
}
