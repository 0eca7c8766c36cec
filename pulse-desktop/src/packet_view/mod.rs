//! Packet list and detail pane

mod details;

use egui::{Color32, RichText, Ui};
use pulse_engine::PacketRow;
use pulse_protocol::{PacketId, Severity};

pub use details::draw_packet_detail;

/// Column widths, in points, for the fixed-width columns
const COLUMNS: [(&str, f32); 7] = [
    ("#", 48.0),
    ("Time", 96.0),
    ("Source", 130.0),
    ("Destination", 130.0),
    ("Protocol", 70.0),
    ("Size", 64.0),
    ("Score", 48.0),
];

/// What the user did in the packet list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketAction {
    /// Show this packet's details
    Select(PacketId),
    /// Hide the details
    Deselect,
}

/// Colour for a lowercase protocol class
pub fn protocol_color(class: &str) -> Color32 {
    match class {
        "tcp" => Color32::from_rgb(100, 180, 255), // Blue
        "udp" => Color32::from_rgb(180, 255, 100), // Lime
        "http" => Color32::from_rgb(255, 180, 100), // Orange
        "https" => Color32::from_rgb(180, 100, 255), // Purple
        "dns" => Color32::from_rgb(100, 220, 220), // Cyan
        "icmp" => Color32::from_rgb(255, 150, 255), // Magenta
        _ => Color32::GRAY,
    }
}

/// Row tint for an anomaly severity
pub fn severity_color(severity: Severity) -> Option<Color32> {
    severity.is_anomalous().then(|| match severity {
        Severity::High => Color32::from_rgb(255, 80, 80),
        _ => Color32::from_rgb(255, 200, 0),
    })
}

/// Clicking a row toggles its selection
fn action_for_click(row: &PacketRow) -> PacketAction {
    if row.selected {
        PacketAction::Deselect
    } else {
        PacketAction::Select(row.id.clone())
    }
}

/// Virtualized, newest-first packet list
pub struct PacketTable {
    /// Keep the newest packet in view
    follow_newest: bool,
}

impl Default for PacketTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketTable {
    pub fn new() -> Self {
        Self {
            follow_newest: true,
        }
    }

    /// Draw `rows`; returns the user's selection change, if any
    pub fn draw(&mut self, ui: &mut Ui, rows: &[PacketRow]) -> Option<PacketAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.checkbox(&mut self.follow_newest, "Follow newest");
            if rows.is_empty() {
                ui.label(RichText::new("No packets").italics().color(Color32::GRAY));
            }
        });

        ui.horizontal(|ui| {
            for (title, width) in COLUMNS {
                ui.add_sized([width, 18.0], egui::Label::new(RichText::new(title).strong()));
            }
            ui.label(RichText::new("Info").strong());
        });
        ui.separator();

        let text_style = egui::TextStyle::Monospace;
        let row_height = ui.text_style_height(&text_style) + 4.0;

        let mut area = egui::ScrollArea::both().auto_shrink([false, false]);
        if self.follow_newest {
            area = area.vertical_scroll_offset(0.0);
        }

        area.show_rows(ui, row_height, rows.len(), |ui, row_range| {
            for i in row_range {
                if let Some(row) = rows.get(i) {
                    if draw_row(ui, row, row_height) {
                        action = Some(action_for_click(row));
                    }
                }
            }
        });

        action
    }
}

/// Draw one row; returns true when it was clicked
fn draw_row(ui: &mut Ui, row: &PacketRow, row_height: f32) -> bool {
    let tint = severity_color(row.severity);
    let cells = [
        row.position.to_string(),
        row.time.clone(),
        row.source.clone(),
        row.destination.clone(),
        row.protocol.clone(),
        row.size.clone(),
        row.score.clone(),
    ];

    let inner = ui.horizontal(|ui| {
        for (i, (text, (_, width))) in cells.into_iter().zip(COLUMNS).enumerate() {
            let mut text = RichText::new(text).monospace();
            text = match (i, tint) {
                (4, _) => text.color(protocol_color(&row.protocol_class)),
                (_, Some(color)) => text.color(color),
                _ => text,
            };
            ui.add_sized(
                [width, row_height],
                egui::Label::new(text).truncate().selectable(false),
            );
        }
        let info = RichText::new(&row.info).monospace();
        ui.add(
            egui::Label::new(match tint {
                Some(color) => info.color(color),
                None => info,
            })
            .truncate()
            .selectable(false),
        );
    });

    let response = ui.interact(
        inner.response.rect,
        ui.id().with(("packet_row", row.id.as_str())),
        egui::Sense::click(),
    );

    if row.selected {
        ui.painter().rect_filled(
            inner.response.rect,
            2.0,
            Color32::from_rgba_unmultiplied(100, 140, 220, 40),
        );
    } else if response.hovered() {
        ui.painter().rect_filled(
            inner.response.rect,
            2.0,
            Color32::from_rgba_unmultiplied(255, 255, 255, 12),
        );
    }

    response.clicked()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_protocol::PacketRecord;

    fn row(selected: bool) -> PacketRow {
        let record = PacketRecord::new("42", Utc::now(), "10.0.0.1", "10.0.0.2", "TCP", 1514)
            .with_anomaly_score(0.9);
        PacketRow::new(1, &record, selected)
    }

    #[test]
    fn test_click_toggles_selection() {
        assert_eq!(
            action_for_click(&row(false)),
            PacketAction::Select(PacketId::new("42"))
        );
        assert_eq!(action_for_click(&row(true)), PacketAction::Deselect);
    }

    #[test]
    fn test_severity_colors() {
        assert_eq!(row(false).severity, Severity::High);
        assert!(severity_color(Severity::High).is_some());
        assert!(severity_color(Severity::Medium).is_some());
        assert!(severity_color(Severity::Low).is_none());
        assert_ne!(
            severity_color(Severity::High),
            severity_color(Severity::Medium)
        );
    }

    #[test]
    fn test_unknown_protocol_is_gray() {
        assert_eq!(protocol_color("sctp"), Color32::GRAY);
        assert_ne!(protocol_color("tcp"), protocol_color("udp"));
    }
}
