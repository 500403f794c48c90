use std::borrow::Cow;

use super::state::{AppState, View};
use crate::api::types::{Post, UserProfile, UserSummary};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Rows each post occupies in the feed panel.
pub const POST_ROWS: usize = 4;

/// Feed data read from the coordinator for one frame.
pub struct FeedView<'a> {
    pub posts: &'a [Post],
    pub loading: bool,
    pub exhausted: bool,
}

/// Draw one frame. Returns how many posts fit in the feed panel when the
/// home view is showing.
pub fn draw(f: &mut Frame, state: &AppState, feed: &FeedView) -> Option<usize> {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0]);
    let visible = match state.view {
        View::Home => Some(draw_home(f, state, feed, chunks[1])),
        View::Profile => {
            draw_profile(f, state, chunks[1]);
            None
        }
    };
    draw_logs(f, state, chunks[2]);
    draw_footer(f, state, chunks[3]);
    visible
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let title = match state.view {
        View::Home => "Home",
        View::Profile => "Profile",
    };
    let line = Line::from(vec![
        Span::styled(
            " Facegram ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("@{}", state.username), Style::default().fg(Color::Green)),
        Span::styled(" | up ", Style::default().fg(Color::DarkGray)),
        Span::raw(state.uptime()),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_home(f: &mut Frame, state: &AppState, feed: &FeedView, area: Rect) -> usize {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let visible = draw_feed(f, state, feed, cols[0]);
    draw_people(f, &state.users, cols[1]);
    visible
}

fn draw_feed(f: &mut Frame, state: &AppState, feed: &FeedView, area: Rect) -> usize {
    let inner_rows = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let visible = (inner_rows / POST_ROWS).max(1);

    let status = if feed.loading {
        " · Loading..."
    } else if feed.exhausted {
        " · end of feed"
    } else {
        ""
    };
    let title = format!(" Feed ({} posts{}) ", feed.posts.len(), status);

    let mut lines: Vec<Line> = Vec::with_capacity(visible * POST_ROWS);
    for (i, post) in feed
        .posts
        .iter()
        .enumerate()
        .skip(state.feed_scroll)
        .take(visible)
    {
        let selected = i == state.selected_post;
        let marker = if selected { "▶ " } else { "  " };
        let name_style = if selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(post.user.full_name.clone(), name_style),
        ]));

        let handle = format!("@{} ", post.user.username);
        let caption_w = width.saturating_sub(2 + handle.chars().count());
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(handle, Style::default().fg(Color::Cyan)),
            Span::raw(truncate_with_ellipsis(&post.caption, caption_w).into_owned()),
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "  {} · {}",
                attachment_label(post.attachments.len()),
                format_created_at(&post.created_at)
            ),
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::default());
    }

    if feed.posts.is_empty() && !feed.loading {
        lines.push(Line::from(Span::styled(
            "  No posts yet.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(panel, area);
    visible
}

fn draw_people(f: &mut Frame, users: &[UserSummary], area: Rect) {
    let width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for user in users {
        lines.push(Line::from(Span::styled(
            user.full_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            truncate_with_ellipsis(&bio_preview(user), width).into_owned(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Explore People "));
    f.render_widget(panel, area);
}

fn draw_profile(f: &mut Frame, state: &AppState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Profile ");
    let Some(profile) = &state.profile else {
        f.render_widget(Paragraph::new("  Loading...").block(block), area);
        return;
    };

    let width = area.width.saturating_sub(2) as usize;
    let mut lines = profile_header_lines(profile);
    lines.push(Line::default());

    if profile.is_private {
        lines.push(Line::from(Span::styled(
            "  The account is private",
            Style::default().fg(Color::Yellow),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("  {} Posts", profile.posts_count),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (i, post) in profile.posts.iter().enumerate() {
            let selected = i == state.profile_selected;
            let marker = if selected { "▶ " } else { "  " };
            let style = if selected {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            let meta = format!(
                " ({}, {})",
                attachment_label(post.attachments.len()),
                format_created_at(&post.created_at)
            );
            let caption_w = width.saturating_sub(2 + meta.chars().count());
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(truncate_with_ellipsis(&post.caption, caption_w).into_owned(), style),
                Span::styled(meta, Style::default().fg(Color::DarkGray)),
            ]));
        }
    }

    if state.pending_delete.is_some() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "  Delete this post? This cannot be undone. [y/n]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let panel = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

fn profile_header_lines(profile: &UserProfile) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("  {}", profile.full_name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("  @{}", profile.username),
            Style::default().fg(Color::Cyan),
        )),
    ];
    if !profile.is_private {
        if let Some(bio) = profile.bio.as_deref().filter(|b| !b.is_empty()) {
            lines.push(Line::from(format!("  {}", bio)));
        }
    }
    lines
}

fn draw_logs(f: &mut Frame, state: &AppState, area: Rect) {
    let max_width = area.width.saturating_sub(2) as usize;
    let visible_lines = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible_lines)
        .map(|l| {
            let color = match l.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                "OK" => Color::Green,
                _ => Color::DarkGray,
            };
            let prefix = format!(" {} [{}] ", l.time, l.level);
            let msg_max = max_width.saturating_sub(prefix.chars().count());
            let msg = truncate_with_ellipsis(&l.message, msg_max);
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::raw(msg.into_owned()),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Log "));
    f.render_widget(panel, area);
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let line = match state.view {
        View::Home => Line::from(vec![
            key("  [q]"),
            Span::raw("uit  "),
            key("[j/k]"),
            Span::raw(" scroll  "),
            key("[Enter]"),
            Span::raw(" author  "),
            key("[i]"),
            Span::raw("mage  "),
            key("[p]"),
            Span::raw("rofile  "),
            key("[r]"),
            Span::raw("eload  "),
        ]),
        View::Profile => Line::from(vec![
            key("  [Esc]"),
            Span::raw(" back  "),
            key("[j/k]"),
            Span::raw(" select  "),
            key("[d]"),
            Span::raw("elete (own posts)  "),
        ]),
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Short description shown under a user in the explore panel.
pub fn bio_preview(user: &UserSummary) -> Cow<'_, str> {
    if user.is_private {
        return Cow::Borrowed("This account is private.");
    }
    match user.bio.as_deref() {
        None | Some("") => Cow::Borrowed("No bio available."),
        Some(bio) if bio.chars().count() > 50 => {
            let head: String = bio.chars().take(45).collect();
            Cow::Owned(format!("{}...", head))
        }
        Some(bio) => Cow::Borrowed(bio),
    }
}

/// Local-time rendering of an RFC 3339 timestamp; anything unparseable is shown as-is.
pub fn format_created_at(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%d %b %Y %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

fn attachment_label(count: usize) -> String {
    match count {
        1 => "1 photo".to_string(),
        n => format!("{} photos", n),
    }
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(bio: Option<&str>, is_private: bool) -> UserSummary {
        UserSummary {
            id: 1,
            full_name: "Ana".into(),
            username: "ana".into(),
            bio: bio.map(str::to_string),
            is_private,
        }
    }

    #[test]
    fn test_bio_preview_private() {
        assert_eq!(bio_preview(&user(Some("hello"), true)), "This account is private.");
    }

    #[test]
    fn test_bio_preview_missing() {
        assert_eq!(bio_preview(&user(None, false)), "No bio available.");
        assert_eq!(bio_preview(&user(Some(""), false)), "No bio available.");
    }

    #[test]
    fn test_bio_preview_short_bio_unchanged() {
        let bio = "x".repeat(50);
        assert_eq!(bio_preview(&user(Some(&bio), false)), bio.as_str());
    }

    #[test]
    fn test_bio_preview_long_bio_cut_at_45() {
        let bio = "y".repeat(51);
        let u = user(Some(&bio), false);
        let preview = bio_preview(&u);
        assert_eq!(preview, format!("{}...", "y".repeat(45)));
    }

    #[test]
    fn test_format_created_at_fallback() {
        assert_eq!(format_created_at("yesterday"), "yesterday");
        assert!(!format_created_at("2024-11-02T10:15:00.000000Z").contains('T'));
    }

    #[test]
    fn test_attachment_label() {
        assert_eq!(attachment_label(1), "1 photo");
        assert_eq!(attachment_label(0), "0 photos");
        assert_eq!(attachment_label(3), "3 photos");
    }

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte_chars() {
        assert_eq!(truncate_with_ellipsis("kopi ☕ pagi hari", 9), "kopi ☕...");
    }

    #[test]
    fn test_truncate_zero_width() {
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
    }
}
