//! Activity-monitor configuration.

use serde::{Deserialize, Serialize};

const fn default_page_size() -> u32 {
    20
}

fn default_export_dir() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivityConfig {
    /// Rows per activity page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Directory CSV exports are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            export_dir: default_export_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = ActivityConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.export_dir, ".");
    }
}
