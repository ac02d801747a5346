//! Styles for human-mode output.

use console::Style;

/// Visual theme for `swm` human-mode output.
///
/// Centralizes styles so every command renders consistently.
#[derive(Debug, Clone)]
pub struct SwmTheme {
    pub accent: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub muted: Style,

    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub switch_id: Style,
    pub bound: Style,
    pub unbound: Style,
}

impl Default for SwmTheme {
    fn default() -> Self {
        Self {
            accent: Style::new().blue().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            muted: Style::new().dim(),
            header: Style::new().blue().bold(),
            label: Style::new().dim(),
            value: Style::new().bold(),
            switch_id: Style::new().yellow().bold(),
            bound: Style::new().green(),
            unbound: Style::new().dim(),
        }
    }
}
