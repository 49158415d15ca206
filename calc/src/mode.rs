//! Input mode selection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the calculation the caller's amount is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Amount before the deduction; solve for net.
    #[default]
    Gross,
    /// Amount after the deduction; solve for gross.
    Net,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Gross => f.write_str("gross"),
            InputMode::Net => f.write_str("net"),
        }
    }
}
