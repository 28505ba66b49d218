use std::fmt;

use crate::fetch::ClientError;
use crate::options::OptionSet;
use crate::request::{DownloadRequest, DownloadResponse, FormError, QUARTER_VALUES};

/// Which widget family is visible and authoritative for reading a value.
#[derive(Debug, PartialEq, Eq, Copy, Clone, serde::Deserialize, serde::Serialize)]
pub enum InputMode {
    Dropdown,
    Typeahead,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Dropdown => write!(f, "Dropdowns"),
            InputMode::Typeahead => write!(f, "Type-ahead"),
        }
    }
}

/// A resolved download link, shown once a build finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub label: String,
}

/// The form controller state: the last-fetched options, one value per widget
/// (both families keep their values across mode switches), and the status
/// line. All mutation goes through the event methods below; rendering only
/// reads.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct FormState {
    pub mode: InputMode,

    // dropdown family
    pub year_from_select: String,
    pub year_to_select: String,
    pub origin_select: String,

    // type-ahead family
    pub year_from_input: String,
    pub year_to_input: String,
    pub origin_input: String,

    /// Checked state for Q1..Q4, in [`QUARTER_VALUES`] order.
    pub quarters_checked: [bool; 4],

    #[serde(skip)]
    pub options: OptionSet,
    #[serde(skip)]
    pub status: String,
    #[serde(skip)]
    pub status_is_error: bool,
    #[serde(skip)]
    pub link: Option<DownloadLink>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            mode: InputMode::Dropdown,
            year_from_select: String::new(),
            year_to_select: String::new(),
            origin_select: String::new(),
            year_from_input: String::new(),
            year_to_input: String::new(),
            origin_input: String::new(),
            // all quarters selected out of the box
            quarters_checked: [true; 4],
            options: OptionSet::default(),
            status: String::new(),
            status_is_error: false,
            link: None,
        }
    }
}

impl FormState {
    /// Switches the visible widget family. The now-hidden family keeps its
    /// values; switching back restores whatever was last entered there.
    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    /// Replaces the option set and reseeds both widget families: year-from =
    /// first year, year-to = last year, origin = first origin. Clears the
    /// status line.
    pub fn apply_options(&mut self, options: OptionSet) {
        if let (Some(first), Some(last)) = (options.years.first(), options.years.last()) {
            self.year_from_select = first.clone();
            self.year_to_select = last.clone();
            self.year_from_input = first.clone();
            self.year_to_input = last.clone();
        }
        if let Some(first) = options.origins.first() {
            self.origin_select = first.clone();
            self.origin_input = first.clone();
        }
        self.options = options;
        self.status.clear();
        self.status_is_error = false;
    }

    /// A failed options fetch keeps the previous option set; the user can
    /// simply reload again.
    pub fn options_failed(&mut self, err: &ClientError) {
        log::error!("Failed to load options: {err}");
        self.set_error("Failed to load options.".to_owned());
    }

    fn resolve(&self, select: &str, input: &str) -> String {
        let raw = match self.mode {
            InputMode::Dropdown => select,
            InputMode::Typeahead => input,
        };
        raw.trim().to_owned()
    }

    pub fn year_from(&self) -> String {
        self.resolve(&self.year_from_select, &self.year_from_input)
    }

    pub fn year_to(&self) -> String {
        self.resolve(&self.year_to_select, &self.year_to_input)
    }

    pub fn origin(&self) -> String {
        self.resolve(&self.origin_select, &self.origin_input)
    }

    /// Checked quarters in checkbox order (document order, not click order).
    pub fn selected_quarters(&self) -> Vec<&'static str> {
        QUARTER_VALUES
            .iter()
            .zip(self.quarters_checked)
            .filter_map(|(value, checked)| checked.then_some(*value))
            .collect()
    }

    /// Resolves and validates the current form values into a request.
    pub fn build_request(&self) -> Result<DownloadRequest, FormError> {
        DownloadRequest::build(
            &self.year_from(),
            &self.year_to(),
            &self.origin(),
            &self.selected_quarters(),
        )
    }

    /// First step of a submission: hide the previous link, clear the status.
    pub fn begin_download(&mut self) {
        self.link = None;
        self.status.clear();
        self.status_is_error = false;
    }

    pub fn set_error(&mut self, message: String) {
        self.status = message;
        self.status_is_error = true;
    }

    /// Applies the outcome of the download request to the status line and
    /// link.
    pub fn finish_download(&mut self, result: Result<&DownloadResponse, &ClientError>) {
        match result {
            Ok(response) => {
                self.status = response.status_line().to_owned();
                self.status_is_error = false;
                self.link = Some(DownloadLink {
                    url: response.download_url.clone(),
                    label: response.link_label(),
                });
            }
            Err(err) => {
                log::error!("Download failed: {err}");
                self.set_error(format!("Error: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(json: &str) -> OptionSet {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn apply_options_seeds_both_widget_families() {
        let mut form = FormState::default();
        form.apply_options(options(r#"{"years":["2020","2021","2022"]}"#));

        assert_eq!(form.year_from_select, "2020");
        assert_eq!(form.year_to_select, "2022");
        assert_eq!(form.year_from_input, "2020");
        assert_eq!(form.year_to_input, "2022");
        assert_eq!(form.origin_select, "ALL");
        assert_eq!(form.origin_input, "ALL");
        assert!(form.status.is_empty());
    }

    #[test]
    fn apply_options_with_no_years_leaves_fields_alone() {
        let mut form = FormState::default();
        form.year_from_input = "1999".to_owned();
        form.apply_options(options(r#"{"years":[],"origins":[]}"#));
        assert_eq!(form.year_from_input, "1999");
        assert_eq!(form.origin_select, "");
    }

    #[test]
    fn options_failure_keeps_previous_options() {
        let mut form = FormState::default();
        form.apply_options(options(r#"{"years":["2020"]}"#));
        form.options_failed(&ClientError::Transport("boom".to_owned()));
        assert_eq!(form.options.years, ["2020"]);
        assert_eq!(form.status, "Failed to load options.");
        assert!(form.status_is_error);
    }

    #[test]
    fn mode_switch_preserves_both_families() {
        let mut form = FormState::default();
        form.year_from_select = "2020".to_owned();
        form.year_from_input = "2015".to_owned();

        form.set_mode(InputMode::Typeahead);
        form.set_mode(InputMode::Dropdown);
        form.set_mode(InputMode::Typeahead);

        assert_eq!(form.year_from_select, "2020");
        assert_eq!(form.year_from_input, "2015");
    }

    #[test]
    fn resolution_follows_the_active_mode_and_trims() {
        let mut form = FormState::default();
        form.year_from_select = "2020".to_owned();
        form.year_from_input = "  2015  ".to_owned();

        assert_eq!(form.year_from(), "2020");
        form.set_mode(InputMode::Typeahead);
        assert_eq!(form.year_from(), "2015");
    }

    #[test]
    fn quarters_come_back_in_checkbox_order() {
        let mut form = FormState::default();
        form.quarters_checked = [false, true, false, true];
        assert_eq!(form.selected_quarters(), ["2", "4"]);
    }

    #[test]
    fn build_request_uses_resolved_values() {
        let mut form = FormState::default();
        form.apply_options(options(
            r#"{"years":["2020","2022"],"origins":["ALL","JFK","SEA"]}"#,
        ));
        form.set_mode(InputMode::Typeahead);
        form.origin_input = "sea".to_owned();
        form.quarters_checked = [true, false, true, false];

        let request = form.build_request().unwrap();
        assert_eq!(request.year_from, "2020");
        assert_eq!(request.year_to, "2022");
        assert_eq!(request.origin, "SEA");
        assert_eq!(request.quarters, "1,3");
    }

    #[test]
    fn build_request_rejects_bad_typed_years() {
        let mut form = FormState::default();
        form.set_mode(InputMode::Typeahead);
        form.year_from_input = "202".to_owned();
        form.year_to_input = "2022".to_owned();
        assert_eq!(form.build_request(), Err(FormError::InvalidYears));
    }

    #[test]
    fn begin_download_hides_link_and_clears_status() {
        let mut form = FormState::default();
        form.link = Some(DownloadLink {
            url: "/f/old.csv".to_owned(),
            label: "Download".to_owned(),
        });
        form.set_error("Error: old".to_owned());

        form.begin_download();
        assert!(form.link.is_none());
        assert!(form.status.is_empty());
        assert!(!form.status_is_error);
    }

    #[test]
    fn successful_download_sets_status_and_link() {
        let mut form = FormState::default();
        let response = DownloadResponse {
            cached: true,
            download_url: "/f/x.csv".to_owned(),
            rows: Some(42),
        };
        form.finish_download(Ok(&response));

        assert_eq!(form.status, "Ready (served from cache).");
        assert!(!form.status_is_error);
        let link = form.link.unwrap();
        assert_eq!(link.url, "/f/x.csv");
        assert_eq!(link.label, "Download (42 rows)");
    }

    #[test]
    fn failed_download_reports_the_server_message() {
        let mut form = FormState::default();
        form.finish_download(Err(&ClientError::Status("quota exceeded".to_owned())));
        assert_eq!(form.status, "Error: quota exceeded");
        assert!(form.status_is_error);
        assert!(form.link.is_none());
    }
}
