use std::{error::Error, io};

use crate::data::{self, HeatmapGrid};
use config::ColorTheme;
use dataset::{Dashboard, FilterOptions, MarriageTable};
use log::error;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    layout::{Constraint, Layout, Rect},
    style::{self, Color, Modifier, Style, Stylize},
    symbols,
    Frame, Terminal,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, BorderType, Cell, Chart, Dataset, GraphType,
        Paragraph, Row, Table, Wrap,
    },
};
use style::palette::tailwind;
use unicode_width::UnicodeWidthStr;

const TITLE: &str = "💍 2024년 서울시 결혼 신고 데이터 대시보드";
const INFO_TEXT: &str =
    "(Esc) quit | (→) next theme | (←) previous theme | (f) toggle filters";
const ABOUT: [&str; 4] = [
    "데이터 출처: 행정안전부 · 통계청",
    "결혼종류코드: 1=초혼, 2=재혼",
    "연령5세단위코드: 1=15~19세, 2=20~24세 …",
    "직업분류코드: 통계청 직업분류 기준",
];

fn palette(theme: ColorTheme) -> &'static tailwind::Palette {
    match theme {
        ColorTheme::Blues => &tailwind::BLUE,
        ColorTheme::Reds => &tailwind::RED,
        ColorTheme::Greens => &tailwind::GREEN,
    }
}

struct ThemeColors {
    buffer_bg: Color,
    text_fg: Color,
    accent: Color,
    border: Color,
    shades: [Color; 9],
}

impl ThemeColors {
    const fn new(color: &tailwind::Palette) -> Self {
        Self {
            buffer_bg: tailwind::SLATE.c950,
            text_fg: tailwind::SLATE.c200,
            accent: color.c400,
            border: color.c700,
            shades: [
                color.c100, color.c200, color.c300, color.c400, color.c500, color.c600,
                color.c700, color.c800, color.c900,
            ],
        }
    }

    /// Shade for `count` on a scale whose darkest step is `max`.
    fn shade(&self, count: u64, max: u64) -> Color {
        if max == 0 {
            return self.shades[0];
        }
        let last = self.shades.len() - 1;
        let step = (count.saturating_mul(last as u64) + max - 1) / max;
        self.shades[(step as usize).min(last)]
    }
}

struct App<'a> {
    table: &'a MarriageTable,
    filters: FilterOptions,
    apply_filters: bool,
    dashboard: Dashboard,
    theme: ColorTheme,
    colors: ThemeColors,
    error: Option<String>,
}

impl<'a> App<'a> {
    fn new(
        table: &'a MarriageTable,
        filters: FilterOptions,
        apply_filters: bool,
        theme: ColorTheme,
    ) -> dataset::Result<Self> {
        let dashboard = Dashboard::compute(table, &filters, apply_filters)?;
        Ok(Self {
            table,
            filters,
            apply_filters,
            dashboard,
            theme,
            colors: ThemeColors::new(palette(theme)),
            error: None,
        })
    }

    pub fn next_theme(&mut self) {
        self.theme = self.theme.next();
    }

    pub fn previous_theme(&mut self) {
        self.theme = self.theme.previous();
    }

    pub fn set_colors(&mut self) {
        self.colors = ThemeColors::new(palette(self.theme));
    }

    /// Flip filter application and run a new render cycle.
    pub fn toggle_filters(&mut self) {
        let apply = !self.apply_filters;
        match Dashboard::compute(self.table, &self.filters, apply) {
            Ok(dashboard) => {
                self.apply_filters = apply;
                self.dashboard = dashboard;
                self.error = None;
            }
            Err(err) => {
                error!("render cycle failed: {err}");
                self.error = Some(err.to_string());
            }
        }
    }
}

pub fn run(
    table: &MarriageTable,
    filters: FilterOptions,
    apply_filters: bool,
    theme: ColorTheme,
) -> Result<(), Box<dyn Error>> {
    let app = App::new(table, filters, apply_filters, theme)?;

    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, &mut app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('l') | KeyCode::Right => app.next_theme(),
                    KeyCode::Char('h') | KeyCode::Left => app.previous_theme(),
                    KeyCode::Char('f') => app.toggle_filters(),
                    _ => {}
                }
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rects = Layout::vertical([Constraint::Min(10), Constraint::Length(3)]).split(f.area());

    app.set_colors();

    let columns = Layout::horizontal([
        Constraint::Length(sidebar_width(&app.dashboard)),
        Constraint::Fill(3),
        Constraint::Fill(9),
        Constraint::Fill(4),
    ])
    .spacing(1)
    .split(rects[0]);

    render_sidebar(f, app, columns[0]);
    render_metrics(f, app, columns[1]);

    let middle = Layout::vertical([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(columns[2]);
    render_monthly(f, app, middle[0]);
    render_heatmap(f, app, middle[1]);

    let right = Layout::vertical([
        Constraint::Percentage(45),
        Constraint::Min(6),
        Constraint::Length(ABOUT.len() as u16 + 2),
    ])
    .split(columns[3]);
    render_jobs(f, app, right[0]);
    render_marriage_types(f, app, right[1]);
    render_about(f, app, right[2]);

    render_footer(f, app, rects[1]);
}

fn block<'a>(app: &App, title: &'a str) -> Block<'a> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::new().fg(app.colors.border))
        .title(title)
}

fn selection(name: &str, selected: Vec<String>, choices: usize) -> Line<'static> {
    let picked = if selected.is_empty() {
        "(전체)".to_string()
    } else {
        selected.join(", ")
    };
    Line::from(format!("{name} [{}/{choices}]: {picked}", selected.len()))
}

fn age_labels(ages: &[i64]) -> Vec<String> {
    ages.iter().map(|age| data::age_bucket_label(*age)).collect()
}

fn sidebar_lines(dashboard: &Dashboard) -> Vec<Line<'static>> {
    let filters = &dashboard.filters;
    let choices = &dashboard.choices;
    vec![
        Line::from(TITLE).bold(),
        Line::from(""),
        Line::from("추가 필터").underlined(),
        selection("남편 직업 코드", filters.husband_jobs.clone(), choices.husband_jobs.len()),
        selection("아내 직업 코드", filters.wife_jobs.clone(), choices.wife_jobs.len()),
        selection("남편 연령대", age_labels(&filters.husband_ages), choices.husband_ages.len()),
        selection("아내 연령대", age_labels(&filters.wife_ages), choices.wife_ages.len()),
        Line::from(""),
        Line::from(format!(
            "필터 적용: {}",
            if dashboard.filters_applied { "예" } else { "아니오" }
        )),
    ]
}

/// Width of the sidebar: its widest line plus borders, capped so the
/// charts keep most of the screen.
fn sidebar_width(dashboard: &Dashboard) -> u16 {
    let widest = sidebar_lines(dashboard)
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
                .sum::<usize>()
        })
        .max()
        .unwrap_or(0);

    #[allow(clippy::cast_possible_truncation)]
    let width = (widest + 2).min(48) as u16;
    width
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = sidebar_lines(&app.dashboard);
    lines.push(Line::from(vec![
        Span::raw("색상 테마: "),
        Span::styled(app.theme.as_str(), Style::new().fg(app.colors.accent).add_modifier(Modifier::BOLD)),
    ]));
    let sidebar = Paragraph::new(lines)
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .wrap(Wrap { trim: true })
        .block(block(app, "필터"));
    f.render_widget(sidebar, area);
}

fn render_metrics(f: &mut Frame, app: &App, area: Rect) {
    let cards = data::metric_cards(&app.dashboard.metrics);
    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend(cards.iter().map(|_| Constraint::Length(4)));
    constraints.push(Constraint::Min(0));
    let rects = Layout::vertical(constraints).split(area);

    f.render_widget(Paragraph::new("📌 주요 지표 요약").bold(), rects[0]);
    for (card, rect) in cards.iter().zip(rects.iter().skip(1)) {
        let metric = Paragraph::new(vec![
            Line::from(card.label).centered(),
            Line::from(card.value.clone()).bold().centered(),
        ])
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .block(block(app, ""));
        f.render_widget(metric, *rect);
    }
}

fn render_monthly(f: &mut Frame, app: &App, area: Rect) {
    let points: Vec<(f64, f64)> = app
        .dashboard
        .monthly
        .iter()
        .filter_map(|m| m.month.map(|month| (month as f64, m.count as f64)))
        .collect();
    let x_min = points.first().map_or(1.0, |p| p.0);
    let x_max = points.last().map_or(12.0, |p| p.0).max(x_min + 1.0);
    let y_max = points.iter().map(|p| p.1).fold(1.0, f64::max);

    let datasets = vec![Dataset::default()
        .name("결혼건수")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::new().fg(app.colors.accent))
        .data(&points)];
    let chart = Chart::new(datasets)
        .block(block(app, "📅 월별 결혼 건수"))
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .x_axis(
            Axis::default()
                .title("신고월")
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{x_min:.0}")),
                    Span::raw(format!("{x_max:.0}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("결혼건수")
                .bounds([0.0, y_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{y_max:.0}"))]),
        );
    f.render_widget(chart, area);
}

fn render_heatmap(f: &mut Frame, app: &App, area: Rect) {
    let grid = HeatmapGrid::new(&app.dashboard.age_heatmap);
    let label = |code: &Option<i64>| data::age_axis_label(*code);

    let header = std::iter::once(Cell::from("남\\아"))
        .chain(grid.wife_axis.iter().map(|w| Cell::from(label(w))))
        .collect::<Row>()
        .style(Style::new().add_modifier(Modifier::BOLD));
    let rows = grid.cells.iter().zip(&grid.husband_axis).map(|(cells, h)| {
        std::iter::once(Cell::from(label(h)).bold())
            .chain(cells.iter().map(|cell| match cell {
                Some(count) => {
                    let bg = app.colors.shade(*count, grid.max);
                    Cell::from(count.to_string()).style(Style::new().fg(Color::Black).bg(bg))
                }
                None => Cell::from(""),
            }))
            .collect::<Row>()
    });
    let widths = std::iter::once(Constraint::Length(8))
        .chain(grid.wife_axis.iter().map(|_| Constraint::Length(8)))
        .collect::<Vec<_>>();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(0)
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .block(block(app, "👥 남편 vs 아내 연령대별 결혼 현황"));
    f.render_widget(table, area);
}

fn render_jobs(f: &mut Frame, app: &App, area: Rect) {
    let bars: Vec<Bar> = app
        .dashboard
        .job_ranking
        .iter()
        .map(|job| {
            Bar::default()
                .value(job.count)
                .label(Line::from(data::code_label(job.job_code.clone())))
                .style(Style::new().fg(app.colors.shade(job.count, app.dashboard.job_ranking[0].count)))
                .value_style(Style::new().fg(Color::Black).bg(app.colors.accent))
        })
        .collect();
    let chart = BarChart::default()
        .block(block(app, "💼 남편 직업별 결혼 건수 TOP 10"))
        .bar_width(4)
        .bar_gap(1)
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

const SHARE_LABEL_WIDTH: usize = 12;

/// Left-aligns `text` in `width` terminal cells.
fn pad_to_width(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}

fn render_marriage_types(f: &mut Frame, app: &App, area: Rect) {
    const BAR_WIDTH: f64 = 20.0;
    let lines: Vec<Line> = data::shares(&app.dashboard.marriage_types)
        .into_iter()
        .map(|share| {
            let filled = "█".repeat((share.pct / 100.0 * BAR_WIDTH).round() as usize);
            Line::from(vec![
                Span::raw(pad_to_width(&share.label, SHARE_LABEL_WIDTH)),
                Span::styled(filled, Style::new().fg(app.colors.accent)),
                Span::raw(format!(" {}건 {:.1}%", share.count, share.pct)),
            ])
        })
        .collect();
    let distribution = Paragraph::new(lines)
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .block(block(app, "💍 남편 결혼 종류 분포"));
    f.render_widget(distribution, area);
}

fn render_about(f: &mut Frame, app: &App, area: Rect) {
    let about = Paragraph::new(ABOUT.iter().map(|l| Line::from(*l)).collect::<Vec<_>>())
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .wrap(Wrap { trim: true })
        .block(block(app, "ℹ️ About"));
    f.render_widget(about, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let status = match &app.error {
        Some(err) => Span::styled(format!(" | {err}"), Style::new().fg(tailwind::RED.c400)),
        None => Span::raw(format!(
            " | {}",
            app.dashboard.rendered_at.format("%Y-%m-%d %H:%M:%S")
        )),
    };
    let info_footer = Paragraph::new(Line::from(vec![Span::raw(INFO_TEXT), status]))
        .style(Style::new().fg(app.colors.text_fg).bg(app.colors.buffer_bg))
        .centered()
        .block(
            Block::bordered()
                .border_type(BorderType::Double)
                .border_style(Style::new().fg(app.colors.accent).add_modifier(Modifier::BOLD)),
        );
    f.render_widget(info_footer, area);
}
