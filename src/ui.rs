use crate::app::App;
use crate::map::renderer::MapLayers;
use crate::map::LabelSize;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " 대한민국 체감온도 지도 ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.renderer.render(
        app.controller.state(),
        &app.classes,
        app.hover,
        inner.width as usize,
        inner.height as usize,
    );

    let tooltip = app.hover_info().zip(app.mouse_pos).map(|((name, class), (col, row))| {
        (
            col.saturating_add(2),
            row.saturating_sub(1),
            format!(" {name} 체감온도: {} ", class.feeling_text()),
        )
    });

    let map_widget = MapWidget { layers, tooltip };
    frame.render_widget(map_widget, inner);
}

/// Custom widget painting braille layers into the buffer with text
/// labels and the tooltip overlaid
struct MapWidget {
    layers: MapLayers,
    tooltip: Option<(u16, u16, String)>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(
        &self,
        canvas: &crate::braille::BrailleCanvas,
        color: Color,
        area: Rect,
        buf: &mut Buffer,
    ) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: class fills, region outlines, province
        // boundaries, hover highlight
        self.render_layer(&self.layers.normal, Color::Green, area, buf);
        self.render_layer(&self.layers.hot, Color::Red, area, buf);
        self.render_layer(&self.layers.cold, Color::Blue, area, buf);
        self.render_layer(&self.layers.outlines, Color::DarkGray, area, buf);
        self.render_layer(&self.layers.boundaries, Color::Yellow, area, buf);
        self.render_layer(&self.layers.highlight, Color::White, area, buf);

        let label_style = match self.layers.label_size {
            LabelSize::Small => Style::default().fg(Color::DarkGray),
            LabelSize::Medium => Style::default().fg(Color::White),
            LabelSize::Large => Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        };

        for label in &self.layers.labels {
            if label.x < 0 || label.y < 0 {
                continue;
            }
            let (lx, ly) = (label.x as u16, label.y as u16);
            if lx >= area.width || ly >= area.height {
                continue;
            }
            let y = area.y + ly;
            for (i, ch) in label.text.chars().enumerate() {
                let x = area.x + lx + i as u16;
                if x < area.x + area.width {
                    buf[(x, y)].set_char(ch).set_style(label_style);
                }
            }
        }

        if let Some((col, row, text)) = &self.tooltip {
            let style = Style::default().fg(Color::Black).bg(Color::White);
            if *row >= area.y && *row < area.y + area.height {
                for (i, ch) in text.chars().enumerate() {
                    let x = *col + i as u16;
                    if x >= area.x && x < area.x + area.width {
                        buf[(x, *row)].set_char(ch).set_style(style);
                    }
                }
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let switching = app.controller.is_switching();

    let status = Line::from(vec![
        Span::styled(" 줌: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" (", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.controller.level().label(),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(") ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("매칭 {}/{} ", app.stats.matched, app.stats.total),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            if switching { "전환중 " } else { "" },
            Style::default().fg(Color::Red),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            "hjkl:이동 +/-:줌 u:날씨갱신 r:초기화 q:종료",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}
