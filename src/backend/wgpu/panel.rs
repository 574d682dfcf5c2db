//! egui settings panel.

use crate::core::config::PanelConfig;
use crate::core::settings::{SettingChange, SettingsParams};
use crate::core::types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneTab {
    Case,
    Background,
}

/// Floating window with the scene colors, the wireframe switch and the
/// current time.
pub struct SettingsPanel {
    title: String,
    wireframe_toggle: bool,
    tab: SceneTab,
}

impl SettingsPanel {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            title: config.title.clone(),
            wireframe_toggle: config.wireframe_toggle,
            tab: SceneTab::Case,
        }
    }

    /// Draw the panel for `params` and return the edits made this frame.
    pub fn show(&mut self, ctx: &egui::Context, params: &SettingsParams) -> Vec<SettingChange> {
        let mut changes = Vec::new();
        let tab = &mut self.tab;
        let wireframe_toggle = self.wireframe_toggle;

        egui::Window::new(self.title.as_str())
            .resizable(false)
            .default_pos([12.0, 12.0])
            .show(ctx, |ui| {
                egui::CollapsingHeader::new("Scene")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.selectable_value(tab, SceneTab::Case, "Case");
                            ui.selectable_value(tab, SceneTab::Background, "Background");
                        });
                        match *tab {
                            SceneTab::Case => {
                                if let Some(hex) = color_row(ui, "Color", &params.case_color) {
                                    changes.push(SettingChange::CaseColor(hex));
                                }
                            }
                            SceneTab::Background => {
                                if let Some(hex) = color_row(ui, "Color", &params.background) {
                                    changes.push(SettingChange::Background(hex));
                                }
                            }
                        }
                        if wireframe_toggle {
                            let mut wireframe = params.wireframe;
                            if ui.checkbox(&mut wireframe, "Wireframe").changed() {
                                changes.push(SettingChange::Wireframe(wireframe));
                            }
                        }
                    });
                egui::CollapsingHeader::new("Time")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.monospace(params.time.as_str());
                    });
            });

        changes
    }
}

/// A labelled color button. Returns the new hex string when edited.
fn color_row(ui: &mut egui::Ui, label: &str, hex: &str) -> Option<String> {
    let mut rgb = Color::from_hex(hex).map(|c| c.to_rgb8()).unwrap_or([0, 0, 0]);
    let mut edited = None;
    ui.horizontal(|ui| {
        ui.label(label);
        if egui::color_picker::color_edit_button_srgb(ui, &mut rgb).changed() {
            edited = Some(Color::from_rgb8(rgb[0], rgb[1], rgb[2]).to_hex());
        }
        ui.monospace(hex);
    });
    edited
}
