use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::category::{category_color, cluster_color, Category, UNMAPPED_COLOR};
use crate::chart::rasterize_pie;
use crate::dashboard::{format_number, format_optional, DashboardView};
use crate::map::MapLayers;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Widget, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 30;
const PIE_WIDTH: u16 = 46;

/// Screen areas of the dashboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardLayout {
    pub header: Rect,
    pub provinces: Rect,
    pub legend: Rect,
    pub metrics: [Rect; 4],
    pub summary: Rect,
    pub pie: Rect,
    pub map: Rect,
    pub status: Rect,
}

/// Split the terminal into dashboard areas. Mouse handling uses the same
/// split to find the map.
pub fn layout(area: Rect) -> DashboardLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Min(10),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(rows[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(16)])
        .split(body[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Metric tiles
            Constraint::Length(11), // Summary table + pie
            Constraint::Min(6),     // Map
        ])
        .split(body[1]);

    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(main[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(PIE_WIDTH)])
        .split(main[1]);

    DashboardLayout {
        header: rows[0],
        provinces: sidebar[0],
        legend: sidebar[1],
        metrics: [tiles[0], tiles[1], tiles[2], tiles[3]],
        summary: middle[0],
        pie: middle[1],
        map: main[2],
        status: rows[2],
    }
}

/// Drawable area inside the map's border
pub fn map_inner(map: Rect) -> Rect {
    map.inner(Margin::new(1, 1))
}

fn bordered(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let Some(view) = app.view.as_ref() else {
        render_error(frame, app, area);
        return;
    };

    let areas = layout(area);
    render_header(frame, view, areas.header);
    render_provinces(frame, app, areas.provinces);
    render_legend(frame, areas.legend);
    render_metrics(frame, view, &areas.metrics);
    render_summary(frame, view, areas.summary);
    render_pie(frame, view, areas.pie);
    render_map(frame, app, view, areas.map);
    render_status_bar(frame, app, areas.status);

    if app.show_details {
        render_details(frame, app, view, area);
    }
}

fn render_error(frame: &mut Frame, app: &App, area: Rect) {
    let message = app
        .load_error
        .clone()
        .unwrap_or_else(|| "The boundary file contains no provinces.".to_string());

    let text = vec![
        Line::from(Span::styled(
            "Could not load the dashboard data",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled("r: retry  q: quit", Style::default().fg(Color::DarkGray))),
    ];

    let popup = centered(area, 70, 40);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(bordered(" Food Security Dashboard ".to_string())),
        popup,
    );
}

fn render_header(frame: &mut Frame, view: &DashboardView, area: Rect) {
    let header = vec![
        Line::from(vec![
            Span::styled(
                " Food Security Dashboard · Sumatera",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", view.province), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(Span::styled(
            " Clustering of district food security across Sumatera",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    frame.render_widget(Paragraph::new(header), area);
}

fn render_provinces(frame: &mut Frame, app: &App, area: Rect) {
    let provinces = app.provinces();
    let items: Vec<ListItem> = provinces.iter().map(|p| ListItem::new(p.as_str())).collect();
    let list = List::new(items)
        .block(bordered(" Province ".to_string()))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_legend(frame: &mut Frame, area: Rect) {
    let dim = Style::default().fg(Color::Gray);
    let mut lines = vec![
        Line::from(Span::styled("IKP  food security index", dim)),
        Line::from(Span::styled("Rice productivity, production", dim)),
        Line::from(Span::styled("PDRB  regional GDP", dim)),
        Line::from(Span::styled("RLS, UHH, TPAK, P0, PPK", dim)),
        Line::from(""),
    ];
    for id in 0..=5u8 {
        let label = Category::from_cluster(id).map(Category::label).unwrap_or("-");
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(cluster_color(Some(id)))),
            Span::raw(format!("{id} {label}")),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("■ ", Style::default().fg(UNMAPPED_COLOR)),
        Span::raw("unmatched"),
    ]));

    frame.render_widget(Paragraph::new(lines).block(bordered(" Indicators ".to_string())), area);
}

fn render_metrics(frame: &mut Frame, view: &DashboardView, areas: &[Rect; 4]) {
    let agg = &view.aggregates;
    let tiles = [
        ("Mean IKP", format_number(agg.mean_food_security, 2)),
        (
            "Rice productivity",
            format!("{} ku/ha", format_number(agg.mean_rice_productivity, 2)),
        ),
        (
            "Rice production",
            format!("{} ton", format_number(agg.total_rice_production, 0)),
        ),
        ("PDRB", format_number(agg.total_grdp, 0)),
    ];

    for ((title, value), area) in tiles.into_iter().zip(areas) {
        let tile = Paragraph::new(Span::styled(
            value,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(bordered(format!(" {title} ")));
        frame.render_widget(tile, *area);
    }
}

fn render_summary(frame: &mut Frame, view: &DashboardView, area: Rect) {
    let header = Row::new(["Cluster", "Districts", "IKP", "Productivity", "Rice prod.", "PDRB", "Category"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .summary
        .iter()
        .map(|s| {
            let category = Cell::from(s.category.map(Category::label).unwrap_or("-")).style(
                Style::default()
                    .fg(Color::White)
                    .bg(category_color(s.category))
                    .add_modifier(Modifier::BOLD),
            );
            Row::new(vec![
                Cell::from(s.cluster.to_string()),
                Cell::from(s.districts.to_string()),
                Cell::from(format_number(s.mean_food_security, 2)),
                Cell::from(format_number(s.mean_rice_productivity, 2)),
                Cell::from(format_number(s.mean_rice_production, 0)),
                Cell::from(format_number(s.mean_grdp, 0)),
                category,
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(7),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Min(18),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(bordered(format!(" Cluster summary · {} ", view.province)));
    frame.render_widget(table, area);
}

fn render_pie(frame: &mut Frame, view: &DashboardView, area: Rect) {
    let block = bordered(" Cluster distribution ".to_string());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille pixels are 2 wide and 4 tall per cell
    let chart_width = (inner.height * 2).min(inner.width / 2);
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(chart_width), Constraint::Min(1)])
        .split(inner);

    frame.render_widget(PieWidget { view }, parts[0]);

    let legend: Vec<Line> = view
        .pie
        .iter()
        .map(|slice| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(slice.color)),
                Span::styled(
                    format!("{:>5.1}% ", slice.share * 100.0),
                    Style::default().fg(Color::White),
                ),
                Span::raw(slice.label()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(legend), parts[1].inner(Margin::new(1, 0)));
}

struct PieWidget<'a> {
    view: &'a DashboardView,
}

impl Widget for PieWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let pie = rasterize_pie(&self.view.pie, area.width as usize, area.height as usize);
        for (color, canvas) in pie.layers() {
            render_layer(canvas, color, area, buf);
        }
    }
}

fn render_map(frame: &mut Frame, app: &App, view: &DashboardView, area: Rect) {
    let block = bordered(format!(" Map · {} ", view.province));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(dataset) = app.dataset.as_deref() else {
        return;
    };

    // Update viewport size for rendering
    let mut viewport = app.viewport.clone();
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app
        .renderer
        .render(dataset, &view.map, inner.width as usize, inner.height as usize, &viewport);

    frame.render_widget(
        MapWidget {
            layers,
            cursor_pos: app.mouse_cell_in_map(),
        },
        inner,
    );

    if let (Some(region), Some((cx, cy))) = (app.hovered_region(), app.mouse_cell_in_map()) {
        let category = region.category_text().unwrap_or("-");
        let lines = vec![
            Line::from(vec![
                Span::styled("District  ", Style::default().fg(Color::DarkGray)),
                Span::raw(region.district.clone()),
            ]),
            Line::from(vec![
                Span::styled("Cluster   ", Style::default().fg(Color::DarkGray)),
                Span::raw(region.cluster.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())),
            ]),
            Line::from(vec![
                Span::styled("Category  ", Style::default().fg(Color::DarkGray)),
                Span::styled(category, Style::default().fg(category_color(region.category))),
            ]),
        ];

        let width = lines.iter().map(|l| l.width() as u16).max().unwrap_or(0) + 2;
        let tooltip = tooltip_rect(inner, inner.x + cx, inner.y + cy, width, lines.len() as u16 + 2);
        frame.render_widget(Clear, tooltip);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Gray)),
            ),
            tooltip,
        );
    }
}

/// Place a `width` x `height` box next to the cursor, flipped to stay inside `bounds`
fn tooltip_rect(bounds: Rect, x: u16, y: u16, width: u16, height: u16) -> Rect {
    let width = width.min(bounds.width);
    let height = height.min(bounds.height);
    let right = bounds.x + bounds.width;
    let bottom = bounds.y + bounds.height;

    let x = if x + 2 + width <= right {
        x + 2
    } else {
        x.saturating_sub(width + 1).max(bounds.x)
    };
    let y = if y + 1 + height <= bottom {
        y + 1
    } else {
        y.saturating_sub(height).max(bounds.y)
    };
    Rect::new(x, y, width, height)
}

/// Draw the non-empty cells of a braille canvas in one color
fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
    for (col, row, ch) in canvas.glyphs() {
        if col >= area.width as usize || row >= area.height as usize {
            continue;
        }
        buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
    }
}

/// Braille choropleth with labels and cursor overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fills back to front, outlines on top
        for (color, canvas) in self.layers.fills.layers() {
            render_layer(canvas, color, area, buf);
        }
        render_layer(&self.layers.outlines, Color::DarkGray, area, buf);

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let max_len = (area.width - *lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(24)).enumerate() {
                buf[(area.x + *lx + i as u16, area.y + *ly)].set_char(ch).set_style(label_style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            if cx < area.width && cy < area.height {
                buf[(area.x + cx, area.y + cy)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn render_details(frame: &mut Frame, app: &App, view: &DashboardView, area: Rect) {
    let popup = centered(area, 90, 80);
    frame.render_widget(Clear, popup);

    let header = Row::new(["Province", "District", "Cluster", "Category", "IKP", "Rice production", "PDRB", "Match"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = view
        .details
        .iter()
        .skip(app.detail_scroll)
        .map(|d| {
            Row::new(vec![
                Cell::from(d.province.clone()),
                Cell::from(d.district.clone()),
                Cell::from(d.cluster.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())),
                Cell::from(d.category_text.clone().unwrap_or_else(|| "-".to_string()))
                    .style(Style::default().fg(category_color(d.category))),
                Cell::from(format_optional(d.food_security_index, 2)),
                Cell::from(format_optional(d.rice_production, 0)),
                Cell::from(format_optional(d.grdp, 0)),
                Cell::from(d.provenance.clone()).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(18),
        Constraint::Length(22),
        Constraint::Length(7),
        Constraint::Length(19),
        Constraint::Length(7),
        Constraint::Length(15),
        Constraint::Length(15),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths).header(header).column_spacing(1).block(
        bordered(format!(" Districts · {} ({}) ", view.province, view.details.len()))
            .title_bottom(Line::from(" ↑↓ scroll  d/Esc close ").right_aligned()),
    );
    frame.render_widget(table, popup);
}

/// Rect of `percent_x` x `percent_y` of `area`, centered
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];

    if let Some(dataset) = app.dataset.as_deref() {
        let report = &dataset.report;
        spans.push(Span::styled(" | ", dim));
        spans.push(Span::styled(
            format!(
                "joined {}/{} ({} fuzzy)",
                report.matched(),
                dataset.regions.len(),
                report.fuzzy.len()
            ),
            Style::default().fg(if report.unmatched.is_empty() { Color::Green } else { Color::Magenta }),
        ));
    }

    match &app.status {
        Some(message) => {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::styled(message.clone(), Style::default().fg(Color::White)));
        }
        None => spans.push(Span::styled(
            " | ↑↓:province hjkl:pan +/-:zoom f:fit d:details r:reload q:quit",
            dim,
        )),
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
