use serde::{Deserialize, Serialize};

/// The `/api/list` payload: which years, origins and quarters the export
/// service can serve. Fields the service omits fall back to the same
/// defaults it assumes on the download side.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    #[serde(default)]
    pub years: Vec<String>,
    #[serde(default = "default_origins")]
    pub origins: Vec<String>,
    #[serde(default = "default_quarters")]
    pub quarters: Vec<String>,
}

impl Default for OptionSet {
    fn default() -> Self {
        Self {
            years: Vec::new(),
            origins: default_origins(),
            quarters: default_quarters(),
        }
    }
}

fn default_origins() -> Vec<String> {
    vec!["ALL".to_owned()]
}

fn default_quarters() -> Vec<String> {
    ["1", "2", "3", "4"].map(str::to_owned).to_vec()
}
