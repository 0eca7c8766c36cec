//! Application settings

use std::path::PathBuf;
use std::time::Duration;

use egui::Ui;
use pulse_engine::{Backoff, DashboardConfig, DEFAULT_CAPACITY};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured server origin
pub const ORIGIN_ENV: &str = "NETPULSE_ORIGIN";

fn default_origin() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_buffer_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_simulated_rate() -> f64 {
    20.0
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Backend origin, e.g. `http://127.0.0.1:5000`
    #[serde(default = "default_origin")]
    pub server_origin: String,
    /// Use the in-process simulated backend instead of a server
    #[serde(default)]
    pub simulate: bool,
    /// Delay policy for push-channel reconnects
    #[serde(default)]
    pub reconnect: Backoff,
    /// Session-control request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Packets kept in the live buffer
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Where exports go when no file is picked; `None` uses the download directory
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// Packets per second in simulation mode
    #[serde(default = "default_simulated_rate")]
    pub simulated_rate: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_origin: default_origin(),
            simulate: false,
            reconnect: Backoff::default(),
            request_timeout_ms: default_request_timeout_ms(),
            buffer_capacity: default_buffer_capacity(),
            export_dir: None,
            simulated_rate: default_simulated_rate(),
        }
    }
}

/// Pick the origin to connect to, preferring a non-blank override
fn resolve_origin(configured: &str, env_override: Option<String>) -> String {
    env_override
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| configured.trim().to_string())
}

impl Settings {
    /// Get the XDG config directory for netpulse
    /// Uses $XDG_CONFIG_HOME/netpulse on Linux/macOS, falls back to ~/.config/netpulse
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("netpulse"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("netpulse"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<(), String> {
        let path =
            Self::settings_path().ok_or_else(|| "Could not determine settings path".to_string())?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(&path, json).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }

    /// Origin in effect, honouring `NETPULSE_ORIGIN`
    pub fn effective_origin(&self) -> String {
        resolve_origin(&self.server_origin, std::env::var(ORIGIN_ENV).ok())
    }

    /// Session-control request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    /// Export directory in effect
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Engine configuration derived from these settings
    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            buffer_capacity: self.buffer_capacity,
            export_dir: self.export_dir(),
        }
    }

    /// Check if settings have changed and auto-save if so
    /// Returns any error message for display
    fn auto_save_if_changed(&self, previous: &Settings) -> Option<String> {
        if self != previous {
            if let Err(e) = self.save() {
                return Some(e);
            }
        }
        None
    }

    /// Draw settings UI (auto-saves on change)
    /// Returns an error message if save failed
    pub fn draw(&mut self, ui: &mut Ui) -> Option<String> {
        let previous = self.clone();

        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label("Server origin:");
                ui.text_edit_singleline(&mut self.server_origin);
                ui.end_row();

                ui.label("Simulated backend:");
                ui.checkbox(&mut self.simulate, "");
                ui.end_row();

                if self.simulate {
                    ui.label("Simulated rate (pkt/s):");
                    ui.add(
                        egui::DragValue::new(&mut self.simulated_rate)
                            .range(0.1..=500.0)
                            .speed(0.5),
                    );
                    ui.end_row();
                }

                ui.label("Request timeout (ms):");
                ui.add(egui::DragValue::new(&mut self.request_timeout_ms).range(500..=60_000));
                ui.end_row();

                ui.label("Buffer capacity:");
                ui.add(egui::DragValue::new(&mut self.buffer_capacity).range(10..=100_000));
                ui.end_row();
            });

        ui.add_space(16.0);

        ui.heading("Reconnect");
        self.draw_backoff(ui);

        ui.add_space(16.0);

        ui.heading("Export");
        ui.horizontal(|ui| {
            ui.label(self.export_dir().display().to_string());
            if ui.button("Browse...").clicked() {
                if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                    self.export_dir = Some(dir);
                }
            }
            if self.export_dir.is_some() && ui.button("Reset").clicked() {
                self.export_dir = None;
            }
        });

        ui.add_space(16.0);

        ui.label(
            egui::RichText::new("Connection and buffer changes apply on next start")
                .small()
                .italics(),
        );

        // Show config file location
        if let Some(path) = Self::settings_path() {
            ui.label(
                egui::RichText::new(format!("Config: {}", path.display()))
                    .small()
                    .color(egui::Color32::GRAY),
            );
        }

        // Auto-save when settings change
        self.auto_save_if_changed(&previous)
    }

    fn draw_backoff(&mut self, ui: &mut Ui) {
        let mut exponential = matches!(self.reconnect, Backoff::Exponential { .. });
        ui.horizontal(|ui| {
            ui.radio_value(&mut exponential, false, "Fixed");
            ui.radio_value(&mut exponential, true, "Exponential");
        });

        self.reconnect = match (self.reconnect, exponential) {
            (Backoff::Fixed { delay_ms }, true) => Backoff::Exponential {
                initial_ms: delay_ms,
                max_ms: delay_ms.saturating_mul(10),
            },
            (Backoff::Exponential { initial_ms, .. }, false) => Backoff::Fixed {
                delay_ms: initial_ms,
            },
            (unchanged, _) => unchanged,
        };

        match &mut self.reconnect {
            Backoff::Fixed { delay_ms } => {
                ui.horizontal(|ui| {
                    ui.label("Delay (ms):");
                    ui.add(egui::DragValue::new(delay_ms).range(100..=60_000));
                });
            }
            Backoff::Exponential { initial_ms, max_ms } => {
                ui.horizontal(|ui| {
                    ui.label("Initial (ms):");
                    ui.add(egui::DragValue::new(initial_ms).range(100..=60_000));
                });
                ui.horizontal(|ui| {
                    ui.label("Max (ms):");
                    ui.add(egui::DragValue::new(max_ms).range(100..=600_000));
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server_origin, "http://127.0.0.1:5000");
        assert!(!settings.simulate);
        assert_eq!(settings.reconnect, Backoff::Fixed { delay_ms: 3000 });
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.buffer_capacity, 1000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"server_origin": "https://capture.lan", "simulate": true}"#)
                .unwrap();
        assert_eq!(settings.server_origin, "https://capture.lan");
        assert!(settings.simulate);
        assert_eq!(settings.buffer_capacity, 1000);
        assert_eq!(settings.simulated_rate, 20.0);
        assert!(settings.export_dir.is_none());
    }

    #[test]
    fn test_backoff_round_trips_through_json() {
        let settings = Settings {
            reconnect: Backoff::Exponential {
                initial_ms: 500,
                max_ms: 8000,
            },
            ..Settings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains(r#""kind":"exponential""#));
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_origin_override() {
        assert_eq!(
            resolve_origin("http://127.0.0.1:5000", None),
            "http://127.0.0.1:5000"
        );
        assert_eq!(
            resolve_origin("http://127.0.0.1:5000", Some(" https://probe:8443 ".into())),
            "https://probe:8443"
        );
        // Blank overrides are ignored
        assert_eq!(
            resolve_origin("http://127.0.0.1:5000", Some("   ".into())),
            "http://127.0.0.1:5000"
        );
    }

    #[test]
    fn test_explicit_export_dir_wins() {
        let settings = Settings {
            export_dir: Some(PathBuf::from("/data/exports")),
            buffer_capacity: 250,
            ..Settings::default()
        };
        let config = settings.dashboard_config();
        assert_eq!(config.export_dir, PathBuf::from("/data/exports"));
        assert_eq!(config.buffer_capacity, 250);
    }

    proptest::proptest! {
        #[test]
        fn prop_override_wins_unless_blank(
            configured in "https?://[a-z]{1,8}:[0-9]{2,4}",
            env in proptest::option::of("[ a-z:/0-9]{0,12}"),
        ) {
            let resolved = resolve_origin(&configured, env.clone());
            match env.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
                Some(e) => proptest::prop_assert_eq!(resolved, e),
                None => proptest::prop_assert_eq!(resolved, configured),
            }
        }
    }
}
