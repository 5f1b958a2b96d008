//! TUI rendering for Waypoint using ratatui.

mod input;
mod theme;

pub use input::{InputPump, apply_event, handle_events, key_for_operation, operation_for_key};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use waypoint_engine::{
    AnalyticsStatus, App, BaselineStatus, DoctorStatus, GuardPhase, MenuEntry, Notification,
    Operation, ScreenId, StateModel, TimelineStatus, UiOptions, WorkflowBackend,
};

const MENU_WIDTH: u16 = 28;
const TOAST_MAX_WIDTH: u16 = 56;

/// Main draw function
pub fn draw<B: WorkflowBackend>(frame: &mut Frame, app: &App<B>) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Menu + screen
            Constraint::Length(1), // State bar
            Constraint::Length(1), // Key hints
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(MENU_WIDTH), Constraint::Min(1)])
        .split(rows[0]);

    let entries: Vec<MenuEntry> = app.menu_entries().collect();
    draw_menu(
        frame,
        columns[0],
        &entries,
        app.menu_selected(),
        app.current_screen(),
        &palette,
        &glyphs,
    );

    let view = ScreenView {
        screen: app.current_screen(),
        path: app.current_path(),
        phase: app.guard_phase(),
        actions: app.available_actions(),
        in_flight: app.in_flight(),
        spinner: spinner_frame(app.spinner_tick(), options),
    };
    draw_screen(frame, columns[1], &view, &palette, &glyphs);

    draw_state_bar(
        frame,
        rows[1],
        &app.state(),
        app.is_busy(),
        &palette,
        &glyphs,
    );
    draw_key_hints(frame, rows[2], &palette, options);

    let toasts: Vec<&Notification> = app.toasts().collect();
    draw_toasts(frame, rows[0], &toasts, &palette, &glyphs);
}

fn draw_menu(
    frame: &mut Frame,
    area: Rect,
    entries: &[MenuEntry],
    selected: usize,
    current: Option<ScreenId>,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let lines: Vec<Line> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let cursor = if index == selected {
                glyphs.selected
            } else {
                " "
            };
            let marker = if entry.reachable {
                glyphs.reachable
            } else {
                glyphs.gated
            };
            let style = if index == selected {
                styles::menu_selected(palette)
            } else if !entry.reachable {
                styles::menu_gated(palette)
            } else if Some(entry.screen) == current {
                Style::default().fg(palette.accent)
            } else {
                Style::default().fg(palette.text_secondary)
            };
            Line::from(vec![
                Span::styled(format!("{cursor} {marker} "), style),
                Span::styled(entry.screen.title(), style),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Screens ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// What the main frame needs to know about the mounted screen.
struct ScreenView<'a> {
    screen: Option<ScreenId>,
    path: &'a str,
    phase: GuardPhase,
    actions: Vec<Operation>,
    in_flight: Option<Operation>,
    spinner: &'static str,
}

fn screen_blurb(screen: ScreenId) -> &'static str {
    match screen {
        ScreenId::Upload => "Upload your CV or research plan to create a baseline.",
        ScreenId::Assessment => "Answer the wellbeing assessment.",
        ScreenId::TimelineGenerate => "Generate a draft timeline from your baseline.",
        ScreenId::TimelineDraft => "Review the draft timeline, then commit it.",
        ScreenId::TimelineCommitted => "Your committed timeline.",
        ScreenId::Progress => "Track progress against your committed timeline.",
        ScreenId::Dashboard => "Overview of your committed plan.",
        ScreenId::Analytics => "Analytics for your committed timeline.",
        ScreenId::AssessmentResults => "Results of your wellbeing assessment.",
    }
}

fn draw_screen(
    frame: &mut Frame,
    area: Rect,
    view: &ScreenView<'_>,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .padding(Padding::horizontal(1));

    // Guarded content never draws until the guard settles on Valid.
    if view.phase != GuardPhase::Valid {
        frame.render_widget(block, area);
        return;
    }

    let title = view.screen.map_or("Waypoint", ScreenId::title);
    let block = block.title(Span::styled(
        format!(" {title} "),
        styles::screen_title(palette),
    ));

    let mut lines = vec![
        Line::from(Span::styled(
            view.path.to_owned(),
            Style::default().fg(palette.text_muted),
        )),
        Line::default(),
    ];
    match view.screen {
        Some(screen) => lines.push(Line::from(Span::styled(
            screen_blurb(screen),
            Style::default().fg(palette.text_primary),
        ))),
        None => lines.push(Line::from(Span::styled(
            "Nothing here. Pick a screen from the menu.",
            Style::default().fg(palette.text_secondary),
        ))),
    }
    lines.push(Line::default());

    if let Some(operation) = view.in_flight {
        lines.push(Line::from(Span::styled(
            format!("{} {}...", view.spinner, operation.label()),
            Style::default().fg(palette.primary),
        )));
    } else if view.actions.is_empty() {
        lines.push(Line::from(Span::styled(
            "No actions available",
            Style::default().fg(palette.text_muted),
        )));
    } else {
        for operation in &view.actions {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", glyphs.bullet), styles::key_hint(palette)),
                Span::styled(
                    format!("[{}]", key_for_operation(*operation)),
                    styles::key_highlight(palette),
                ),
                Span::styled(
                    format!(" {}", operation.label()),
                    Style::default().fg(palette.text_primary),
                ),
            ]));
        }
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn draw_state_bar(
    frame: &mut Frame,
    area: Rect,
    state: &StateModel,
    busy: bool,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let baseline = state.baseline_status();
    let timeline = state.timeline_status();
    let doctor = state.doctor_status();
    let analytics = state.analytics_status();
    let flags = [
        ("baseline", baseline.as_str(), baseline != BaselineStatus::None),
        ("timeline", timeline.as_str(), timeline != TimelineStatus::None),
        ("doctor", doctor.as_str(), doctor != DoctorStatus::NotSubmitted),
        ("analytics", analytics.as_str(), analytics != AnalyticsStatus::Unavailable),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (name, value, set) in flags {
        let (glyph, color) = if set {
            (glyphs.status_set, palette.success)
        } else {
            (glyphs.status_unset, palette.text_muted)
        };
        spans.push(Span::styled(
            format!("{name} "),
            Style::default().fg(palette.text_secondary),
        ));
        spans.push(Span::styled(
            format!("{glyph} {value}  "),
            Style::default().fg(color),
        ));
    }
    if busy {
        spans.push(Span::styled(
            "syncing",
            Style::default().fg(palette.primary),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_key_hints(frame: &mut Frame, area: Rect, palette: &Palette, options: UiOptions) {
    let (updown, back) = if options.ascii_only {
        ("Up/Down", "Bksp")
    } else {
        ("↑↓", "⌫")
    };
    let hints = [
        (updown, "select"),
        ("Enter", "open"),
        (back, "back"),
        ("r", "refresh"),
        ("q", "quit"),
    ];
    let mut spans = vec![Span::raw(" ")];
    for (key, action) in hints {
        spans.push(Span::styled(key, styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {action}  "), styles::key_hint(palette)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_toasts(
    frame: &mut Frame,
    area: Rect,
    toasts: &[&Notification],
    palette: &Palette,
    glyphs: &Glyphs,
) {
    if toasts.is_empty() || area.width < 8 || area.height < 3 {
        return;
    }

    let width = TOAST_MAX_WIDTH.min(area.width.saturating_sub(2));
    let inner_width = usize::from(width.saturating_sub(4));
    let lines: Vec<Line> = toasts
        .iter()
        .map(|toast| {
            let color = palette.level(toast.level());
            let text = format!("{} {}", glyphs.level(toast.level()), toast.message());
            Line::from(Span::styled(
                truncate_to_width(&text, inner_width),
                Style::default().fg(color),
            ))
        })
        .collect();

    let height = u16::try_from(lines.len())
        .unwrap_or(u16::MAX)
        .saturating_add(2)
        .min(area.height);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height,
    };

    frame.render_widget(Clear, rect);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .style(Style::default().bg(palette.bg_panel))
        .padding(Padding::horizontal(1));
    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn truncate_to_width(raw: &str, max: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.width() <= max {
        return trimmed.to_owned();
    }
    let budget = max.saturating_sub(3);
    let mut used = 0;
    let mut head = String::new();
    for c in trimmed.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        head.push(c);
    }
    format!("{head}...")
}
