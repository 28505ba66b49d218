use serde::Deserialize;

/// Origin filter meaning "no filter" on the service side.
pub const ALL_ORIGINS: &str = "ALL";

/// Checkbox order is fixed; selection order is this order, not click order.
pub const QUARTER_VALUES: [&str; 4] = ["1", "2", "3", "4"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Please provide valid 4-digit years.")]
    InvalidYears,
}

/// A fully resolved `/api/download` request. Built from the form, sent once,
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub year_from: String,
    pub year_to: String,
    pub quarters: String,
    pub origin: String,
}

impl DownloadRequest {
    /// Validates the resolved form values and normalizes them into a request.
    ///
    /// Years must be exactly four ASCII digits. An empty origin means
    /// [`ALL_ORIGINS`]; origins are uppercased either way. An empty quarter
    /// selection means all four quarters.
    pub fn build(
        year_from: &str,
        year_to: &str,
        origin: &str,
        quarters: &[&str],
    ) -> Result<Self, FormError> {
        if !is_four_digit_year(year_from) || !is_four_digit_year(year_to) {
            return Err(FormError::InvalidYears);
        }
        let origin = if origin.is_empty() {
            ALL_ORIGINS.to_owned()
        } else {
            origin.to_uppercase()
        };
        let quarters = if quarters.is_empty() {
            QUARTER_VALUES.join(",")
        } else {
            quarters.join(",")
        };
        Ok(Self {
            year_from: year_from.to_owned(),
            year_to: year_to.to_owned(),
            quarters,
            origin,
        })
    }

    /// The GET URL for this request, query parameters URL-encoded.
    pub fn url(&self, api_base: &str) -> String {
        format!(
            "{}/download?year_from={}&year_to={}&quarters={}&origin={}",
            api_base,
            urlencoding::encode(&self.year_from),
            urlencoding::encode(&self.year_to),
            urlencoding::encode(&self.quarters),
            urlencoding::encode(&self.origin),
        )
    }
}

fn is_four_digit_year(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

/// The `/api/download` success payload.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DownloadResponse {
    #[serde(default)]
    pub cached: bool,
    pub download_url: String,
    #[serde(default)]
    pub rows: Option<u64>,
}

impl DownloadResponse {
    pub fn status_line(&self) -> &'static str {
        if self.cached {
            "Ready (served from cache)."
        } else {
            "Ready."
        }
    }

    /// Label for the download link; includes the row count when the service
    /// reports a nonzero one.
    pub fn link_label(&self) -> String {
        match self.rows {
            Some(rows) if rows > 0 => format!("Download ({} rows)", group_thousands(rows)),
            _ => "Download".to_owned(),
        }
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
