use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::browser::{Browser, ItemKind};
use super::playlist::Playlist;

pub fn draw_selector(f: &mut Frame, browser: &Browser, playlist: &Playlist, status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Current directory
            Constraint::Min(5),    // Listing and play-list
            Constraint::Length(1), // Search or status
            Constraint::Length(1), // Controls
        ])
        .split(f.area());

    let path_widget = Paragraph::new(format!("📁 {}", browser.cwd.display()))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(path_widget, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    let items: Vec<ListItem> = browser
        .visible_items()
        .into_iter()
        .map(|item| {
            let (prefix, color) = match item.kind {
                ItemKind::Parent => ("↑ ", Color::Blue),
                ItemKind::Directory => ("📁 ", Color::Blue),
                ItemKind::Playlist => ("≡ ", Color::Yellow),
                ItemKind::Module => ("♪ ", Color::White),
            };
            ListItem::new(format!("{prefix}{}", item.name)).style(Style::default().fg(color))
        })
        .collect();

    let listing = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Files "))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default();
    if !browser.filtered_indices.is_empty() {
        state.select(Some(browser.selected));
    }
    f.render_stateful_widget(listing, panes[0], &mut state);

    let queued: Vec<ListItem> = playlist
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let style = if i == playlist.position() {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {}", entry.info.mod_type, entry.info.name)).style(style)
        })
        .collect();
    let title = format!(" Play-list ({}) ", playlist.len());
    f.render_widget(
        List::new(queued).block(Block::default().borders(Borders::ALL).title(title)),
        panes[1],
    );

    let status_line = if browser.searching || !browser.search_query.is_empty() {
        Line::from(vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(browser.search_query.as_str()),
        ])
    } else {
        Line::from(Span::styled(status, Style::default().fg(Color::Gray)))
    };
    f.render_widget(Paragraph::new(status_line), chunks[2]);

    let controls = vec![
        Span::styled("[Enter]", Style::default().fg(Color::Green)),
        Span::raw(" play  "),
        Span::styled("[Ins/+]", Style::default().fg(Color::Yellow)),
        Span::raw(" enqueue  "),
        Span::styled("[/]", Style::default().fg(Color::Yellow)),
        Span::raw(" find  "),
        Span::styled("[Bksp]", Style::default().fg(Color::Yellow)),
        Span::raw(" up  "),
        Span::styled("[Esc]", Style::default().fg(Color::Red)),
        Span::raw(" leave"),
    ];
    f.render_widget(
        Paragraph::new(Line::from(controls)).alignment(Alignment::Center),
        chunks[3],
    );
}
