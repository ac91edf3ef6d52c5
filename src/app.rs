use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Map, MapResolution},
        Block, BorderType, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

use crate::dashboard::Dashboard;
use crate::icons::{day_name, icon_for};
use crate::units::{direction::degree_to_compass, Units};
use crate::weather::{CurrentObservation, ForecastEntry, Snapshot};

const MISSING: &str = "--";

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
struct Palette {
    background: Color,
    border: Color,
    title: Color,
    label: Color,
    value: Color,
    alert: Color,
    marker: Color,
}

const DARK: Palette = Palette {
    background: Color::Black,
    border: Color::Cyan,
    title: Color::Yellow,
    label: Color::Gray,
    value: Color::Green,
    alert: Color::LightRed,
    marker: Color::LightMagenta,
};

const LIGHT: Palette = Palette {
    background: Color::White,
    border: Color::Blue,
    title: Color::Magenta,
    label: Color::DarkGray,
    value: Color::Black,
    alert: Color::Red,
    marker: Color::Red,
};

pub struct App {
    pub dashboard: Dashboard,
    input: String,
    units: Units,
    dark: bool,
    show_map: bool,
}

impl App {
    pub fn new(dashboard: Dashboard, units: Units, dark: bool) -> Self {
        Self {
            dashboard,
            input: String::new(),
            units,
            dark,
            show_map: false,
        }
    }

    pub fn search(&mut self, city: &str) {
        self.input = city.to_string();
        self.dashboard.search(city);
    }

    fn palette(&self) -> Palette {
        if self.dark {
            DARK
        } else {
            LIGHT
        }
    }

    /// Returns `false` once the user asks to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::Esc if self.dashboard.notice().is_none() => return false,
            // The notice is modal: any other key only dismisses it.
            _ if self.dashboard.notice().is_some() => self.dashboard.dismiss_notice(),
            KeyCode::Char('t') if ctrl => self.dark = !self.dark,
            KeyCode::Tab => self.show_map = !self.show_map,
            KeyCode::Enter => {
                let city = self.input.clone();
                self.dashboard.search(&city);
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if !ctrl => self.input.push(c),
            _ => {}
        }
        true
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                    return Ok(());
                }
            }
        }

        app.dashboard.poll();
    }
}

fn panel(title: &str, palette: Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(palette.title),
        ))
        .title_alignment(Alignment::Left)
        .border_style(Style::default().fg(palette.border))
        .border_type(BorderType::Rounded)
}

fn or_missing<T>(value: Option<T>, show: impl FnOnce(T) -> String) -> String {
    value.map_or_else(|| MISSING.to_string(), show)
}

fn display_forecast(entry: &ForecastEntry, units: Units, palette: Palette) -> Vec<Line<'static>> {
    let description = entry.condition_description.clone().unwrap_or_default();
    let glyph = icon_for(&description);
    let temp = or_missing(entry.temperature_c, |t| units.temperature(t));
    let text = if description.is_empty() {
        MISSING.to_string()
    } else {
        description
    };

    vec![
        Line::from(""),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                day_name(&entry.timestamp),
                Style::default()
                    .fg(palette.title)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {}  ", glyph.symbol())),
            Span::styled(temp, Style::default().fg(palette.value)),
        ]),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(text, Style::default().fg(palette.label)),
        ]),
    ]
}

fn display_current_conditions(
    current: &CurrentObservation,
    units: Units,
    palette: Palette,
) -> Table<'static> {
    let row = |label: &str, value: String| {
        Row::new(vec![
            Cell::from(format!(" {label}")).style(Style::default().fg(palette.label)),
            Cell::from(value).style(Style::default().fg(palette.value)),
        ])
    };

    let description = current.condition_description.clone().unwrap_or_default();
    let glyph = icon_for(&description);

    let temp = or_missing(current.temperature_c, |t| {
        format!("{}  {}", units.temperature(t), glyph.symbol())
    });

    let wind = or_missing(current.wind_speed_mps, |speed| {
        match current.wind_direction_deg {
            Some(dir) => format!("{} ({})", units.speed(speed), degree_to_compass(dir)),
            None => units.speed(speed),
        }
    });

    let humid = or_missing(current.humidity_pct, |h| format!("{h:.0}%"));

    let text = if description.is_empty() {
        MISSING.to_string()
    } else {
        description
    };

    let rows = vec![
        Row::new(vec![Cell::from("")]),
        row("Temperature", temp),
        row("Conditions", text),
        row("Humidity", humid),
        row("Wind", wind),
    ];

    Table::new(rows, [Constraint::Length(13), Constraint::Min(15)])
        .block(panel("Current Conditions", palette))
}

fn display_headline(snapshot: &Snapshot, palette: Palette) -> Paragraph<'static> {
    let name = if snapshot.current.location_name.is_empty() {
        MISSING.to_string()
    } else {
        snapshot.current.location_name.clone()
    };
    let coords = or_missing(snapshot.current.coordinates, |c| {
        format!("{:.2}, {:.2}", c.lat, c.lon)
    });
    Paragraph::new(vec![
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                name,
                Style::default()
                    .fg(palette.title)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" : "),
            Span::styled(coords, Style::default().fg(palette.border)),
        ]),
        Line::from(format!(
            " Updated {}",
            snapshot.fetched_at.format("%d-%m-%Y %H:%M")
        )),
    ])
    .block(panel("Location", palette))
}

fn display_alerts(alerts: &[String], palette: Palette) -> List<'static> {
    let mut list_items = vec![];
    if alerts.is_empty() {
        list_items.push(ListItem::new(format!("\n  {MISSING}")));
    } else {
        for alert in alerts {
            list_items.push(ListItem::new(Line::from(vec![
                Span::raw("  "),
                Span::styled(alert.clone(), Style::default().fg(palette.alert)),
            ])));
        }
    }
    List::new(list_items).block(panel("Weather Alerts", palette))
}

fn display_map(
    current: &CurrentObservation,
    palette: Palette,
) -> Canvas<'static, impl Fn(&mut Context<'_>)> {
    let marker = current.coordinates;
    let color = palette.label;
    let marker_color = palette.marker;
    Canvas::default()
        .block(panel("Map", palette))
        .background_color(palette.background)
        .marker(Marker::Braille)
        .x_bounds([-180.0, 180.0])
        .y_bounds([-90.0, 90.0])
        .paint(move |ctx| {
            ctx.draw(&Map {
                color,
                resolution: MapResolution::High,
            });
            if let Some(c) = marker {
                ctx.layer();
                ctx.print(
                    c.lon,
                    c.lat,
                    Span::styled("●", Style::default().fg(marker_color)),
                );
            }
        })
}

fn display_search(app: &App, palette: Palette) -> Paragraph<'_> {
    let title = if app.dashboard.is_loading() {
        "Search city... (loading)"
    } else {
        "Search city..."
    };
    Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(app.input.as_str(), Style::default().fg(palette.value)),
        Span::styled("▏", Style::default().fg(palette.border)),
    ]))
    .block(panel(title, palette))
}

fn display_empty(palette: Palette) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Search for weather information",
            Style::default()
                .fg(palette.title)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Enter a city name to get current conditions and forecast",
            Style::default().fg(palette.label),
        )),
    ])
    .alignment(Alignment::Center)
    .block(panel("owx", palette))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn display_notice(f: &mut Frame, notice: &str, palette: Palette) {
    let area = centered(f.area(), 50, 5);
    f.render_widget(Clear, area);
    let popup = Paragraph::new(vec![
        Line::from(Span::styled(notice, Style::default().fg(palette.alert))),
        Line::from(Span::styled(
            "press any key",
            Style::default().fg(palette.label),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(panel("Notice", palette));
    f.render_widget(popup, area);
}

fn ui(f: &mut Frame, app: &App) {
    let palette = app.palette();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.background)),
        f.area(),
    );

    let vert_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    f.render_widget(display_search(app, palette), vert_layout[0]);

    let Some(snapshot) = app.dashboard.snapshot() else {
        f.render_widget(display_empty(palette), vert_layout[1]);
        if let Some(notice) = app.dashboard.notice() {
            display_notice(f, notice, palette);
        }
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(vert_layout[1]);

    let lchunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    f.render_widget(display_headline(snapshot, palette), lchunks[0]);
    f.render_widget(
        display_current_conditions(&snapshot.current, app.units, palette),
        lchunks[1],
    );
    f.render_widget(display_alerts(&snapshot.alerts, palette), lchunks[2]);

    let rchunks = if app.show_map {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(100)])
            .split(chunks[1])
    };

    let mut list_items = vec![];
    for fc in &snapshot.daily {
        list_items.push(ListItem::new(display_forecast(fc, app.units, palette)));
    }
    if list_items.is_empty() {
        list_items.push(ListItem::new(format!("\n  {MISSING}")));
    }
    let list = List::new(list_items).block(panel("5-Day Forecast", palette));
    f.render_widget(list, rchunks[0]);

    if app.show_map {
        f.render_widget(display_map(&snapshot.current, palette), rchunks[1]);
    }

    if let Some(notice) = app.dashboard.notice() {
        display_notice(f, notice, palette);
    }
}
