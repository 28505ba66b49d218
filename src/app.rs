use egui::ComboBox;
use poll_promise::Promise;

use crate::fetch::{self, ClientError};
use crate::form::{FormState, InputMode};
use crate::options::OptionSet;
use crate::request::{DownloadResponse, QUARTER_VALUES};

const FIELD_WIDTH: f32 = 140.0;

/// Main application state
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ExportApp {
    form: FormState,
    #[serde(skip)]
    api_base: String,
    #[serde(skip)]
    options_promise: Option<Promise<Result<OptionSet, ClientError>>>,
    #[serde(skip)]
    download_promise: Option<Promise<Result<DownloadResponse, ClientError>>>,
}

impl Default for ExportApp {
    fn default() -> Self {
        Self {
            form: FormState::default(),
            api_base: Self::DEFAULT_API_BASE.to_owned(),
            options_promise: None,
            download_promise: None,
        }
    }
}

impl ExportApp {
    /// Azure Functions local host; the deployed app serves the API from its
    /// own origin.
    pub const DEFAULT_API_BASE: &'static str = "http://127.0.0.1:7071/api";

    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, api_base: String) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        app.api_base = api_base;
        // Same as loading the page: fetch the options right away.
        app.reload_options(&cc.egui_ctx);
        app
    }

    /// Starts (or restarts) the options fetch. A reload while one is still in
    /// flight just replaces the promise; the last result to land wins.
    fn reload_options(&mut self, ctx: &egui::Context) {
        let url = format!("{}/list", self.api_base);
        log::info!("Loading options from {url}");
        self.options_promise = Some(fetch::fetch_json(ctx, url));
    }

    /// Validates the form and, if it passes, issues the download request. On
    /// validation failure no request is made and the button stays enabled.
    fn submit_download(&mut self, ctx: &egui::Context) {
        self.form.begin_download();
        let request = match self.form.build_request() {
            Ok(request) => request,
            Err(err) => {
                self.form.set_error(err.to_string());
                return;
            }
        };
        let url = request.url(&self.api_base);
        log::info!("Requesting export: {url}");
        self.download_promise = Some(fetch::fetch_json(ctx, url));
    }
}

impl eframe::App for ExportApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- Handle Promise Resolution ---
        let mut options_finished = false;
        if let Some(promise) = &self.options_promise {
            if let Some(result) = promise.ready() {
                match result {
                    Ok(options) => self.form.apply_options(options.clone()),
                    Err(err) => self.form.options_failed(err),
                }
                options_finished = true;
            }
        }
        if options_finished {
            self.options_promise = None;
        }

        let mut download_finished = false;
        if let Some(promise) = &self.download_promise {
            if let Some(result) = promise.ready() {
                self.form.finish_download(result.as_ref());
                download_finished = true;
            }
        }
        if download_finished {
            self.download_promise = None;
        }
        // --- End Handle Promise Resolution ---

        let is_loading_options = self.options_promise.is_some();
        let is_downloading = self.download_promise.is_some();

        // --- Top Panel ---
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.heading("T-100 Segment Export");
            });
        });

        // --- Bottom Panel (footer) ---
        egui::TopBottomPanel::bottom("footer_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add_space(10.0);
                    egui::widgets::global_theme_preference_buttons(ui);
                    let is_web = cfg!(target_arch = "wasm32");
                    if !is_web {
                        if ui.button("Quit").clicked() {
                            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    }
                });
            });
        });

        // --- Central Panel (the form) ---
        egui::CentralPanel::default().show(ctx, |ui| {
            // Input mode selector + options reload
            ui.horizontal(|ui| {
                ui.label("Input mode:");
                let mut mode = self.form.mode;
                ui.radio_value(&mut mode, InputMode::Dropdown, InputMode::Dropdown.to_string());
                ui.radio_value(
                    &mut mode,
                    InputMode::Typeahead,
                    InputMode::Typeahead.to_string(),
                );
                if mode != self.form.mode {
                    self.form.set_mode(mode);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if is_loading_options {
                        ui.add(egui::Spinner::new().size(14.0));
                    } else if ui
                        .button("⟳ Reload options")
                        .on_hover_text("Fetch the year/origin lists again")
                        .clicked()
                    {
                        self.reload_options(ctx);
                    }
                });
            });

            ui.add_space(8.0);

            // Year and origin fields: one row per value, the visible widget
            // chosen by the input mode. The hidden family keeps its value.
            egui::Grid::new("form_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Year from:");
                    match self.form.mode {
                        InputMode::Dropdown => option_combo(
                            ui,
                            "year_from_select",
                            &mut self.form.year_from_select,
                            &self.form.options.years,
                        ),
                        InputMode::Typeahead => typeahead_field(
                            ui,
                            "year_from_input",
                            &mut self.form.year_from_input,
                            &self.form.options.years,
                        ),
                    }
                    ui.end_row();

                    ui.label("Year to:");
                    match self.form.mode {
                        InputMode::Dropdown => option_combo(
                            ui,
                            "year_to_select",
                            &mut self.form.year_to_select,
                            &self.form.options.years,
                        ),
                        InputMode::Typeahead => typeahead_field(
                            ui,
                            "year_to_input",
                            &mut self.form.year_to_input,
                            &self.form.options.years,
                        ),
                    }
                    ui.end_row();

                    ui.label("Origin:");
                    match self.form.mode {
                        InputMode::Dropdown => option_combo(
                            ui,
                            "origin_select",
                            &mut self.form.origin_select,
                            &self.form.options.origins,
                        ),
                        InputMode::Typeahead => typeahead_field(
                            ui,
                            "origin_input",
                            &mut self.form.origin_input,
                            &self.form.options.origins,
                        ),
                    }
                    ui.end_row();

                    ui.label("Quarters:");
                    ui.horizontal(|ui| {
                        for (i, value) in QUARTER_VALUES.iter().enumerate() {
                            let offered =
                                self.form.options.quarters.iter().any(|q| q == value);
                            ui.add_enabled(
                                offered,
                                egui::Checkbox::new(
                                    &mut self.form.quarters_checked[i],
                                    format!("Q{value}"),
                                ),
                            );
                        }
                    });
                    ui.end_row();
                });

            ui.add_space(12.0);

            // Trigger button, disabled while a build is in flight
            ui.horizontal(|ui| {
                let build_button =
                    egui::Button::new("Build file").min_size(egui::vec2(100.0, 28.0));
                if ui.add_enabled(!is_downloading, build_button).clicked() {
                    self.submit_download(ctx);
                }
                if is_downloading {
                    ui.add(egui::Spinner::new().size(16.0));
                    ui.label("Building your file…");
                }
            });

            ui.add_space(8.0);

            // Status line and, once ready, the download link
            if !self.form.status.is_empty() {
                if self.form.status_is_error {
                    ui.colored_label(egui::Color32::RED, &self.form.status);
                } else {
                    ui.label(&self.form.status);
                }
            }
            if let Some(link) = &self.form.link {
                ui.hyperlink_to(&link.label, &link.url);
            }
        });
    }
}

/// Select-style widget: one entry per option value, in source order.
fn option_combo(ui: &mut egui::Ui, id: &str, selected: &mut String, values: &[String]) {
    ComboBox::from_id_salt(id)
        .selected_text(selected.clone())
        .width(FIELD_WIDTH)
        .show_ui(ui, |ui| {
            for value in values {
                ui.selectable_value(selected, value.clone(), value);
            }
        });
}

/// Free-text field with a datalist-style suggestion popup: entries containing
/// the typed text (case-insensitive), clicking one fills the field.
fn typeahead_field(ui: &mut egui::Ui, id: &str, text: &mut String, values: &[String]) {
    let response = ui.add(egui::TextEdit::singleline(text).desired_width(FIELD_WIDTH));

    let popup_id = ui.make_persistent_id(id);
    if response.gained_focus() || response.changed() {
        ui.memory_mut(|mem| mem.open_popup(popup_id));
    }

    let needle = text.trim().to_uppercase();
    let matches: Vec<String> = values
        .iter()
        .filter(|value| needle.is_empty() || value.to_uppercase().contains(&needle))
        .cloned()
        .collect();

    if !matches.is_empty() {
        egui::popup_below_widget(
            ui,
            popup_id,
            &response,
            egui::PopupCloseBehavior::CloseOnClick,
            |ui| {
                ui.set_min_width(FIELD_WIDTH);
                egui::ScrollArea::vertical().max_height(140.0).show(ui, |ui| {
                    for value in &matches {
                        if ui.selectable_label(false, value).clicked() {
                            *text = value.clone();
                        }
                    }
                });
            },
        );
    }
}
