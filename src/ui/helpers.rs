use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};

use crate::screens::Notice;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

pub(crate) fn notice_style(notice: &Notice) -> Style {
    match notice {
        Notice::Success(_) => Style::default().fg(Color::Green),
        Notice::Warning(_) => Style::default().fg(Color::Yellow),
        Notice::Info(_) => Style::default().fg(Color::Cyan),
    }
}

/// Cell text for an optional column.
pub(crate) fn or_blank<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    use crate::error::CatalogError;

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = Err::<(), _>(CatalogError::DuplicateEmail("a@b.c".into()))
            .context("failed to insert member")
            .unwrap_err();
        assert_eq!(
            surface_error(&err),
            "A member with email a@b.c already exists."
        );
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, area);
        assert!(inner.x >= area.x && inner.right() <= area.right());
        assert!(inner.y >= area.y && inner.bottom() <= area.bottom());
    }

    #[test]
    fn blank_for_missing_values() {
        assert_eq!(or_blank(&Some(1949)), "1949");
        assert_eq!(or_blank::<i64>(&None), "");
    }
}
