use super::state::{Outcome, UploadStatus};
use super::SheetUploader;
use crate::upload::SelectedFile;
use crate::utils::file_size::FileSizeUtils;
use eframe::egui::{self, Color32, RichText};
use rfd::FileDialog;

const ACCENT: Color32 = Color32::from_rgb(161, 89, 225);
const ERROR_RED: Color32 = Color32::from_rgb(220, 50, 50);
const SUCCESS_GREEN: Color32 = Color32::from_rgb(0, 180, 0);

impl SheetUploader {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Update Dashboard Data");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Upload a spreadsheet and notify the automation pipeline")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_client_selector(ui);

                ui.add_space(20.0);
                self.render_file_picker(ui, ctx);

                ui.add_space(20.0);
                self.render_submit(ui);

                ui.add_space(20.0);
                self.render_banner(ui);
            });
        });
    }

    fn render_client_selector(&mut self, ui: &mut egui::Ui) {
        let busy = self.controller.state().is_busy();
        let active = self.controller.active_client().clone();
        let mut chosen = None;

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Client");
                ui.add_enabled_ui(!busy, |ui| {
                    egui::ComboBox::from_id_source("client_selector")
                        .selected_text(active.label.as_str())
                        .show_ui(ui, |ui| {
                            for client in self.controller.clients() {
                                if ui
                                    .selectable_label(client.id == active.id, client.label.as_str())
                                    .clicked()
                                {
                                    chosen = Some(client.id.clone());
                                }
                            }
                        });
                });
            });

            ui.add_space(4.0);
            match self.controller.destination() {
                Ok(url) => {
                    ui.horizontal(|ui| {
                        ui.label("✅");
                        ui.label(RichText::new(url.as_str()).monospace().small());
                    });
                }
                Err(e) => {
                    ui.horizontal(|ui| {
                        ui.label("❌");
                        ui.colored_label(ERROR_RED, e.to_string());
                    });
                }
            }
        });

        if let Some(id) = chosen {
            if id != active.id {
                self.controller.select_destination(&id);
            }
        }
    }

    fn render_file_picker(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let busy = self.controller.state().is_busy();
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());

        let stroke = if hovering {
            egui::Stroke::new(2.0, ACCENT)
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke
        };

        egui::Frame::group(ui.style()).stroke(stroke).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label("Drop a .xlsx or .csv file here, or");
                ui.add_space(4.0);
                ui.add_enabled_ui(!busy, |ui| {
                    if ui.button("📁 Select File").clicked() {
                        if let Some(path) = FileDialog::new()
                            .add_filter("Spreadsheets", &["xlsx", "csv"])
                            .pick_file()
                        {
                            match SelectedFile::from_path(&path) {
                                Ok(file) => self.controller.select_file(file),
                                Err(e) => self.controller.reject_file(e),
                            }
                        }
                    }
                });

                if let Some(file) = &self.controller.state().selected_file {
                    ui.add_space(8.0);
                    ui.label(RichText::new(&file.name).strong());
                    ui.label(FileSizeUtils::format_size(file.size));
                }
            });
        });
    }

    fn render_submit(&mut self, ui: &mut egui::Ui) {
        let state = self.controller.state();
        let label = state.button_label();
        let show_progress = state.is_busy();
        let progress = state.get_progress_fraction();
        let can_upload = self.controller.can_upload();

        ui.vertical_centered(|ui| {
            if self.controller.state().selected_file.is_some() || show_progress {
                ui.add_enabled_ui(can_upload, |ui| {
                    let button = egui::Button::new(label).min_size(egui::vec2(200.0, 40.0));
                    if ui.add(button).clicked() {
                        self.controller.upload();
                    }
                });
            }

            if show_progress {
                ui.add_space(10.0);
                let progress_bar = egui::ProgressBar::new(progress)
                    .show_percentage()
                    .animate(false)
                    .fill(ACCENT);
                ui.add(progress_bar);
            }
        });
    }

    fn render_banner(&self, ui: &mut egui::Ui) {
        let state = self.controller.state();
        match (&state.status, &state.outcome) {
            (UploadStatus::Success, Some(Outcome::Success { message, receipt })) => {
                ui.vertical_centered(|ui| {
                    ui.colored_label(SUCCESS_GREEN, message.as_str());
                    ui.label(RichText::new(receipt.key.as_str()).monospace().small());
                    if ui
                        .add(
                            egui::Label::new(RichText::new("Open uploaded file").color(ACCENT))
                                .sense(egui::Sense::click()),
                        )
                        .clicked()
                    {
                        if let Err(e) = open::that(receipt.public_url.as_str()) {
                            tracing::warn!(error = %e, "could not open browser");
                        }
                    }
                });
            }
            (UploadStatus::Error, _) => {
                if let Some(message) = state.message() {
                    ui.vertical_centered(|ui| {
                        ui.colored_label(ERROR_RED, message);
                    });
                }
            }
            _ => {}
        }
    }
}
