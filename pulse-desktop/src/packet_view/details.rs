//! Detail pane for the selected packet

use egui::{Color32, RichText, Ui};
use pulse_engine::PacketDetail;

use super::severity_color;

/// Draw `detail`; returns true when the user closed the pane
pub fn draw_packet_detail(ui: &mut Ui, detail: &PacketDetail) -> bool {
    let mut closed = false;

    ui.horizontal(|ui| {
        ui.heading(format!("Packet {}", detail.id));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Close").clicked() {
                closed = true;
            }
        });
    });

    if let Some(alert) = &detail.alert {
        let color = severity_color(alert.severity).unwrap_or(Color32::GRAY);
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.0, color))
            .show(ui, |ui| {
                ui.label(RichText::new(alert.title).strong().color(color));
                ui.label(alert.message);
            });
    }

    egui::ScrollArea::vertical()
        .id_salt("packet_detail_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.columns(2, |columns| {
                egui::Grid::new("packet_summary")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(&mut columns[0], |ui| {
                        field(ui, "Time", &detail.timestamp);
                        field(ui, "Source", &detail.source);
                        field(ui, "Destination", &detail.destination);
                        field(ui, "Protocol", &detail.protocol);
                        field(ui, "Length", &detail.length);
                        field(ui, "Info", detail.info.as_deref().unwrap_or("-"));
                    });

                egui::Grid::new("packet_analysis")
                    .num_columns(2)
                    .spacing([12.0, 4.0])
                    .show(&mut columns[1], |ui| {
                        field(ui, "Anomaly Score", &detail.score);
                        field(ui, "Detection", detail.detection);
                        field(ui, "Confidence", &detail.confidence);
                    });
            });

            if !detail.headers.is_empty() {
                ui.add_space(8.0);
                ui.label(RichText::new("Headers").strong());
                egui::Grid::new("packet_headers")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        for (name, value) in &detail.headers {
                            field(ui, name, value);
                        }
                    });
            }

            if let Some(payload) = &detail.payload {
                ui.add_space(8.0);
                ui.label(RichText::new("Payload").strong());
                egui::Frame::new()
                    .fill(Color32::from_rgb(20, 20, 20))
                    .inner_margin(6.0)
                    .show(ui, |ui| {
                        ui.label(RichText::new(payload).monospace());
                    });
            }
        });

    closed
}

fn field(ui: &mut Ui, name: &str, value: &str) {
    ui.label(RichText::new(name).color(Color32::GRAY));
    ui.label(RichText::new(value).monospace());
    ui.end_row();
}
