//! Colours used on staging logs when attached to a terminal.

use crossterm::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    /// Step headers (`----->`)
    pub step: Color,
    /// Relayed tool output
    pub output: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            step: Color::Cyan,
            output: Color::DarkGrey,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}
