use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};
use std::time::Duration;

use crate::module_info::ModuleInfo;
use crate::players::{PlayerStatus, short_name};

/// Wide terminals get 16.3 names instead of 8.3.
const WIDE_COLUMNS: u16 = 100;

pub struct StatusScreen<'a> {
    pub info: &'a ModuleInfo,
    pub player: &'a str,
    pub status: &'a PlayerStatus,
    pub help: Option<&'a [(&'a str, &'a str)]>,
}

fn format_time(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(Color::Gray))
}

pub fn draw_status(f: &mut Frame, screen: &StatusScreen) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(6), // Module info
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Key help
        ])
        .split(f.area());

    let title = Paragraph::new(format!("opencp - {} player", screen.player))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let info = screen.info;
    let status = screen.status;
    let name = if f.area().width >= WIDE_COLUMNS {
        short_name(16, 3, &info.name)
    } else {
        short_name(8, 3, &info.name)
    };

    let mut lines = vec![
        Line::from(vec![
            label("file: "),
            Span::styled(name, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            label("  type: "),
            Span::raw(info.mod_type.to_string()),
        ]),
        Line::from(vec![label("title: "), Span::raw(info.display_title())]),
        Line::from(vec![label("composer: "), Span::raw(info.composer.as_str())]),
    ];

    if let Some((song, count)) = status.song {
        let mut spans = vec![label("song: "), Span::raw(format!("{song}/{count}"))];
        if !status.song_name.is_empty() {
            spans.push(Span::raw(format!(" {}", status.song_name)));
        }
        lines.push(Line::from(spans));
    }
    if let Some(stream) = status.stream {
        lines.push(Line::from(vec![
            label("pos: "),
            Span::raw(format!("{}/{}", stream.pos, stream.len)),
            label("  rate: "),
            Span::raw(format!("{} kbps", stream.kbps)),
        ]));
    }

    let state = if status.paused {
        Span::styled("paused", Style::default().fg(Color::Yellow))
    } else if status.fade_level < crate::players::fade::FADE_STEPS {
        Span::styled(format!("fade {}", status.fade_level), Style::default().fg(Color::Yellow))
    } else {
        Span::styled("playing", Style::default().fg(Color::Green))
    };
    let length = status.length.map(format_time).unwrap_or_else(|| "--:--".to_string());
    lines.push(Line::from(vec![
        label("time: "),
        Span::raw(format!("{} / {length}  ", format_time(status.play_time))),
        state,
    ]));
    f.render_widget(Paragraph::new(lines), chunks[1]);

    let ratio = match (status.stream, status.length) {
        (Some(stream), _) if stream.len > 0 => stream.pos as f64 / stream.len as f64,
        (_, Some(length)) if !length.is_zero() => status.play_time.as_secs_f64() / length.as_secs_f64(),
        _ => 0.0,
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{}%", (ratio.clamp(0.0, 1.0) * 100.0) as u16));
    f.render_widget(gauge, chunks[2]);

    if let Some(help) = screen.help {
        let lines: Vec<Line> = help
            .iter()
            .map(|(key, what)| {
                Line::from(vec![
                    Span::styled(format!("{key:<12}"), Style::default().fg(Color::Yellow)),
                    Span::raw(*what),
                ])
            })
            .collect();
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::TOP).title(" Keys ")),
            chunks[3],
        );
    } else {
        let hint = Paragraph::new(Line::from(vec![
            Span::styled("[Alt-K]", Style::default().fg(Color::Yellow)),
            Span::raw(" key help  "),
            Span::styled("[f]", Style::default().fg(Color::Green)),
            Span::raw(" files  "),
            Span::styled("[Esc]", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ]))
        .alignment(Alignment::Center);
        f.render_widget(hint, chunks[3]);
    }
}
