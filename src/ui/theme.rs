//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::chart::Color as ChartColor;

/// Fills fainter than this disappear on a character grid.
const MIN_VISIBLE_ALPHA: f32 = 0.3;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for warnings and failed checks.
    pub warning: Color,
    /// Color for errors.
    pub critical: Color,
    /// Color for successful checks.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Assumed terminal background, used to blend translucent chart colors.
    pub background: (u8, u8, u8),
    /// Style for SQL keywords in the editor.
    pub keyword: Style,
    pub header: Style,
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            background: (0, 0, 0),
            keyword: Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            background: (255, 255, 255),
            keyword: Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Terminal color for a chart color, blended over the background.
    pub fn chart_color(&self, color: ChartColor) -> Color {
        let alpha = color.a.clamp(MIN_VISIBLE_ALPHA, 1.0);
        let (br, bg, bb) = self.background;
        let blend = |fg: u8, bg: u8| -> u8 {
            (fg as f32 * alpha + bg as f32 * (1.0 - alpha)).round() as u8
        };
        Color::Rgb(blend(color.r, br), blend(color.g, bg), blend(color.b, bb))
    }

    /// Style for a tooltip footer line.
    pub fn footer_style(&self, footer: &str) -> Style {
        if footer.ends_with("Success") {
            Style::default().fg(self.healthy)
        } else {
            Style::default().fg(self.warning).add_modifier(Modifier::BOLD)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_colors_pass_through() {
        let theme = Theme::dark();
        assert_eq!(theme.chart_color(ChartColor::rgb(0x5c, 0x6a, 0xc4)), Color::Rgb(0x5c, 0x6a, 0xc4));
    }

    #[test]
    fn test_translucent_colors_blend_with_background() {
        let color = ChartColor::rgba(200, 100, 0, 0.5);
        assert_eq!(Theme::dark().chart_color(color), Color::Rgb(100, 50, 0));
        assert_eq!(Theme::light().chart_color(color), Color::Rgb(228, 178, 128));
    }

    #[test]
    fn test_faint_fill_stays_visible() {
        let faint = ChartColor::rgba(250, 250, 250, 0.05);
        assert_eq!(Theme::dark().chart_color(faint), Color::Rgb(75, 75, 75));
    }
}
