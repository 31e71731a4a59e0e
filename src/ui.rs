use crate::audio::AudioEngine;
use crate::core::PlayerCore;
use crate::model::MAX_RATING;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use std::time::Duration;

const APP_TITLE_WITH_VERSION: &str = "Quaver v0.1.0  ";

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    rating: Color,
    selected_bg: Color,
    popup_bg: Color,
}

const PALETTE: Palette = Palette {
    bg: Color::Rgb(12, 14, 22),
    panel_bg: Color::Rgb(20, 26, 40),
    panel_alt_bg: Color::Rgb(26, 34, 52),
    border: Color::Rgb(82, 116, 168),
    text: Color::Rgb(216, 226, 244),
    muted: Color::Rgb(140, 160, 190),
    accent: Color::Rgb(118, 208, 176),
    alert: Color::Rgb(240, 170, 94),
    rating: Color::Rgb(230, 206, 120),
    selected_bg: Color::Rgb(38, 56, 84),
    popup_bg: Color::Rgb(24, 30, 46),
};

pub fn library_rect(area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
        .split(vertical[1]);

    body[0]
}

pub fn draw(frame: &mut Frame, core: &PlayerCore, audio: &dyn AudioEngine, command: Option<&str>) {
    let colors = PALETTE;
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, core, vertical[0], &colors);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
        .split(vertical[1]);

    draw_track_table(frame, core, body[0], &colors);
    draw_now_playing(frame, core, audio, body[1], &colors);

    let timeline = Paragraph::new(Span::styled(
        timeline_line(audio, 26, 14),
        Style::default().fg(colors.text),
    ))
    .block(panel_block(
        "Timeline",
        colors.panel_bg,
        colors.text,
        colors.border,
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(timeline, vertical[2]);

    draw_footer(frame, core, command, vertical[3], &colors);

    if let Some(bad) = core.pending_bad_track() {
        draw_bad_track_popup(frame, &bad.path.display().to_string(), &bad.reason, &colors);
    }
}

fn draw_header(frame: &mut Frame, core: &PlayerCore, area: Rect, colors: &Palette) {
    frame.render_widget(
        panel_block("Status", colors.panel_bg, colors.text, colors.border),
        area,
    );

    let inner = area.inner(Margin {
        vertical: 0,
        horizontal: 1,
    });

    let modes = format!(
        "Shuffle {}  |  Repeat {}  |  Bad tracks {}",
        if core.playlist.is_shuffled() { "on" } else { "off" },
        core.playlist.repeat().label(),
        core.playlist.skip_policy().label(),
    );

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", core.playlist.len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(modes, Style::default().fg(colors.alert)),
    ]));
    frame.render_widget(header, inner);
}

fn draw_track_table(frame: &mut Frame, core: &PlayerCore, area: Rect, colors: &Palette) {
    let items: Vec<ListItem> = core
        .playlist
        .tracks()
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let marker = if core.playlist.current_index() == Some(index) {
                "  > "
            } else if core.playlist.is_corrupted(index) {
                "  x "
            } else {
                "    "
            };

            let label = match &track.artist {
                Some(artist) => format!("{} - {}", artist, track.title),
                None => track.title.clone(),
            };

            let row_style = if core.playlist.is_corrupted(index) {
                Style::default().fg(colors.muted)
            } else {
                Style::default().fg(colors.text)
            };

            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.accent)),
                Span::styled(label, row_style),
                Span::styled(
                    format!("  {}", stars(track.rating)),
                    Style::default().fg(colors.rating),
                ),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select((!core.playlist.is_empty()).then_some(core.selected));

    let list = List::new(items)
        .block(panel_block(
            "Library",
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_now_playing(
    frame: &mut Frame,
    core: &PlayerCore,
    audio: &dyn AudioEngine,
    area: Rect,
    colors: &Palette,
) {
    let current = core.current_track();
    let title = current.map(|track| track.title.as_str()).unwrap_or("-");
    let artist = current
        .and_then(|track| track.artist.as_deref())
        .unwrap_or("-");
    let album = current
        .and_then(|track| track.album.as_deref())
        .unwrap_or("-");
    let genre = current
        .and_then(|track| track.genre.as_deref())
        .unwrap_or("-");
    let year = current
        .and_then(|track| track.year)
        .map(|year| year.to_string())
        .unwrap_or_else(|| String::from("-"));
    let rating = current.map(|track| track.rating).unwrap_or(0.0);

    let position = core
        .playlist
        .current_index()
        .map(|index| format!("{}/{}", index + 1, core.playlist.len()))
        .unwrap_or_else(|| format!("-/{}", core.playlist.len()));

    let playing = if audio.current_track().is_some() && !audio.is_paused() {
        "playing"
    } else if audio.is_paused() {
        "paused"
    } else {
        "stopped"
    };

    let info = vec![
        Line::from(vec![
            Span::styled(
                "Now",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {title}"), Style::default().fg(colors.text)),
        ]),
        Line::from(Span::styled(
            format!("Artist  {artist}"),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!("Album   {album}"),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!("Genre   {genre}  ({year})"),
            Style::default().fg(colors.muted),
        )),
        Line::from(Span::styled(
            format!("Rating  {}", stars(rating)),
            Style::default().fg(colors.rating),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Track   {position}"),
            Style::default().fg(colors.alert),
        )),
        Line::from(Span::styled(
            format!("State   {playing}"),
            Style::default().fg(colors.text),
        )),
    ];

    let block = Paragraph::new(info)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(block, area);
}

fn draw_footer(
    frame: &mut Frame,
    core: &PlayerCore,
    command: Option<&str>,
    area: Rect,
    colors: &Palette,
) {
    let line = match command {
        Some(buffer) => Line::from(vec![
            Span::styled(":", Style::default().fg(colors.accent)),
            Span::styled(buffer.to_string(), Style::default().fg(colors.text)),
        ]),
        None => Line::from(vec![
            Span::styled(
                "Keys: Enter play, n next, b previous, f forward, s shuffle, e repeat, 0-5 rate, Space pause, : command, Ctrl+C quit",
                Style::default().fg(colors.muted),
            ),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(core.status.as_str(), Style::default().fg(colors.text)),
        ]),
    };

    let footer = Paragraph::new(line).block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, area);
}

fn draw_bad_track_popup(frame: &mut Frame, path: &str, reason: &str, colors: &Palette) {
    let popup = centered_rect(frame.area(), 62, 46);
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::from(Span::styled(
            format!("Track: {path}"),
            Style::default().fg(colors.text),
        )),
        Line::from(Span::styled(
            format!("Error: {reason}"),
            Style::default().fg(colors.alert),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[s] skip and continue",
            Style::default().fg(colors.text),
        )),
        Line::from(Span::styled(
            "[a] always skip bad tracks",
            Style::default().fg(colors.text),
        )),
        Line::from(Span::styled(
            "[Esc] stop playback",
            Style::default().fg(colors.text),
        )),
    ];

    let popup_block = Paragraph::new(lines)
        .block(panel_block(
            "Bad track",
            colors.popup_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(popup_block, popup);
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, MAX_RATING) as usize;
    let mut out = String::with_capacity(5);
    out.push_str(&"*".repeat(filled));
    out.push_str(&".".repeat(5 - filled));
    out
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}

fn timeline_line(audio: &dyn AudioEngine, timeline_bar_width: usize, volume_bar_width: usize) -> String {
    let elapsed = audio.position().unwrap_or(Duration::from_secs(0));
    let total = audio.duration();
    let ratio = total.and_then(|duration| {
        let total_secs = duration.as_secs_f64();
        (total_secs > 0.0).then_some((elapsed.as_secs_f64() / total_secs).clamp(0.0, 1.0))
    });

    let volume_percent = (audio.volume() * 100.0).round() as u16;
    let volume_ratio = f64::from(audio.volume().clamp(0.0, 1.0));

    format!(
        "{} / {} {}  |  Vol {} {:>3}%  +/- adjust",
        format_duration(elapsed),
        total
            .map(format_duration)
            .unwrap_or_else(|| String::from("--:--")),
        progress_bar(ratio, timeline_bar_width),
        progress_bar(Some(volume_ratio), volume_bar_width),
        volume_percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_render_rounded_rating() {
        assert_eq!(stars(0.0), ".....");
        assert_eq!(stars(2.4), "**...");
        assert_eq!(stars(2.5), "***..");
        assert_eq!(stars(5.0), "*****");
    }

    #[test]
    fn progress_bar_clamps_ratio() {
        assert_eq!(progress_bar(Some(1.5), 4), "[####]");
        assert_eq!(progress_bar(None, 4), "[----]");
    }

    #[test]
    fn duration_formats_as_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::from_secs(61)), "01:01");
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00");
    }
}
