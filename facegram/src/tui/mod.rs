pub mod render;
pub mod state;

use crate::api::types::Post;
use crate::api::FacegramRest;
use crate::feed::{FeedEvent, FeedHandle, Pager, Viewport};
use crate::session::Session;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use render::{FeedView, POST_ROWS};
use state::{AppState, View};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// What the TUI needs from the rest of the app.
pub struct Screen<'a> {
    pub rest: &'a FacegramRest,
    pub session: &'a Session,
    pub feed: &'a FeedHandle<Post>,
    /// Rows from the end of the feed at which the next page is requested.
    pub proximity_threshold: usize,
}

/// Run the TUI until the user quits.
pub async fn run_tui(
    screen: Screen<'_>,
    events: &mut mpsc::UnboundedReceiver<FeedEvent>,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, &screen, events).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    screen: &Screen<'_>,
    events: &mut mpsc::UnboundedReceiver<FeedEvent>,
) -> Result<()> {
    let mut state = AppState::new(screen.session.username());
    load_users(screen, &mut state).await;

    let mut cache = FeedCache::new(screen.feed.subscribe());
    let mut keys = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    let mut visible = 1usize;

    loop {
        let view = FeedView {
            posts: &cache.posts,
            loading: screen.feed.is_loading(),
            exhausted: screen.feed.is_exhausted(),
        };
        terminal.draw(|f| {
            if let Some(v) = render::draw(f, &state, &view) {
                visible = v;
            }
        })?;

        let mut recheck = false;
        tokio::select! {
            maybe_event = keys.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if handle_key(screen, &mut state, key, visible).await {
                        return Ok(());
                    }
                    recheck = true;
                }
                Some(Ok(Event::Resize(..))) => recheck = true,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            Some(event) = events.recv() => log_feed_event(&mut state, event),
            changed = cache.changed() => match changed {
                // Only new content moves the geometry; a failed fetch waits for
                // the user to scroll again.
                Some(len_changed) => recheck = len_changed,
                None => return Ok(()),
            },
            _ = tick.tick() => {}
        }

        if recheck && state.view == View::Home {
            let len = screen.feed.len();
            if state.selected_post >= len {
                state.selected_post = len.saturating_sub(1);
            }
            state.keep_selection_visible(visible);
            let viewport = feed_viewport(&state, visible, len);
            screen
                .feed
                .on_scroll_proximity(viewport.is_near_bottom(screen.proximity_threshold));
        }
    }
}

/// Local copy of the feed items, re-read only when the coordinator publishes.
struct FeedCache {
    rx: watch::Receiver<Pager<Post>>,
    posts: Vec<Post>,
}

impl FeedCache {
    fn new(rx: watch::Receiver<Pager<Post>>) -> Self {
        let posts = rx.borrow().items().to_vec();
        Self { rx, posts }
    }

    /// Wait for the next published state and reload from it. Returns whether
    /// the item count changed, or `None` once the coordinator is gone.
    async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        let before = self.posts.len();
        self.posts = self.rx.borrow_and_update().items().to_vec();
        Some(self.posts.len() != before)
    }
}

/// Feed panel geometry in rows.
fn feed_viewport(state: &AppState, visible_posts: usize, len: usize) -> Viewport {
    Viewport {
        offset: state.feed_scroll * POST_ROWS,
        height: visible_posts * POST_ROWS,
        content_height: len * POST_ROWS,
    }
}

fn log_feed_event(state: &mut AppState, event: FeedEvent) {
    match event {
        FeedEvent::PageLoaded { page, count } => {
            state.push_log("INFO", format!("Loaded page {} ({} posts)", page, count));
        }
        FeedEvent::Exhausted { .. } => {
            state.push_log("INFO", "You're all caught up".to_string());
        }
        FeedEvent::FetchFailed { page, error } => {
            state.push_log("ERROR", format!("Could not load page {}: {}", page, error));
        }
    }
}

async fn load_users(screen: &Screen<'_>, state: &mut AppState) {
    match screen.rest.list_users(screen.session).await {
        Ok(users) => state.users = users,
        Err(e) => state.push_log("ERROR", format!("Could not load users: {}", e.user_message())),
    }
}

async fn open_profile(screen: &Screen<'_>, state: &mut AppState, username: &str) {
    match screen.rest.get_profile(screen.session, username).await {
        Ok(profile) => state.open_profile(profile),
        Err(e) => state.push_log("ERROR", format!("@{}: {}", username, e.user_message())),
    }
}

/// Returns true when the user asked to quit.
async fn handle_key(screen: &Screen<'_>, state: &mut AppState, key: KeyEvent, visible: usize) -> bool {
    match state.view {
        View::Home => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => {
                state.move_selection(1, screen.feed.len());
                state.keep_selection_visible(visible);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                state.move_selection(-1, screen.feed.len());
                state.keep_selection_visible(visible);
            }
            KeyCode::Enter => {
                let author = screen.feed.with_items(|posts| {
                    posts.get(state.selected_post).map(|p| p.user.username.clone())
                });
                if let Some(author) = author {
                    open_profile(screen, state, &author).await;
                }
            }
            KeyCode::Char('p') => {
                let me = screen.session.username().to_string();
                open_profile(screen, state, &me).await;
            }
            KeyCode::Char('i') => show_image(screen, state).await,
            KeyCode::Char('r') => {
                state.selected_post = 0;
                state.feed_scroll = 0;
                screen.feed.initialize();
                load_users(screen, state).await;
                state.push_log("INFO", "Reloading feed".to_string());
            }
            _ => {}
        },
        View::Profile => {
            if state.pending_delete.is_some() {
                confirm_delete(screen, state, key.code).await;
                return false;
            }
            match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Esc | KeyCode::Backspace => state.close_profile(),
                KeyCode::Char('j') | KeyCode::Down => state.move_profile_selection(1),
                KeyCode::Char('k') | KeyCode::Up => state.move_profile_selection(-1),
                KeyCode::Char('d')
                    if state
                        .profile
                        .as_ref()
                        .is_some_and(|p| screen.session.owns(&p.username)) =>
                {
                    state.pending_delete = state
                        .profile
                        .as_ref()
                        .and_then(|p| p.posts.get(state.profile_selected))
                        .map(|p| p.id);
                }
                _ => {}
            }
        }
    }
    false
}

async fn confirm_delete(screen: &Screen<'_>, state: &mut AppState, code: KeyCode) {
    let Some(post_id) = state.pending_delete else { return };
    match code {
        KeyCode::Char('y') => {
            state.pending_delete = None;
            match screen.rest.delete_post(screen.session, post_id).await {
                Ok(()) => {
                    state.remove_profile_post(post_id);
                    state.push_log("OK", "Post deleted".to_string());
                    // The home feed may still hold the post.
                    state.selected_post = 0;
                    state.feed_scroll = 0;
                    screen.feed.initialize();
                }
                Err(e) => state.push_log("ERROR", format!("Delete failed: {}", e.user_message())),
            }
        }
        KeyCode::Char('n') | KeyCode::Esc => state.pending_delete = None,
        _ => {}
    }
}

async fn show_image(screen: &Screen<'_>, state: &mut AppState) {
    let path = screen.feed.with_items(|posts| {
        posts
            .get(state.selected_post)
            .and_then(|p| p.attachments.first())
            .map(|a| a.storage_path.clone())
    });
    let Some(path) = path else {
        state.push_log("WARN", "Selected post has no attachments".to_string());
        return;
    };
    match screen.rest.fetch_image(screen.session, &path).await {
        Ok(image) => state.push_log(
            "OK",
            format!("{} ({}, {})", path, image.mime, image.size_label()),
        ),
        Err(e) => state.push_log("ERROR", format!("Image {}: {}", path, e.user_message())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PostAuthor;
    use crate::feed::FetchError;

    fn post(id: u64) -> Post {
        Post {
            id,
            caption: format!("post {}", id),
            created_at: String::new(),
            user: PostAuthor {
                id: 1,
                full_name: "Ana".into(),
                username: "ana".into(),
            },
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_feed_cache_reloads_on_publish_only() {
        let (tx, rx) = watch::channel(Pager::<Post>::default());
        let mut cache = FeedCache::new(rx);
        assert!(cache.posts.is_empty());

        let mut request = None;
        tx.send_modify(|pager| request = pager.begin_fetch());
        assert_eq!(cache.changed().await, Some(false));

        let request = request.unwrap();
        tx.send_modify(|pager| {
            pager.complete(request, Ok(vec![post(1), post(2)]));
        });
        assert_eq!(cache.changed().await, Some(true));
        assert_eq!(cache.posts.len(), 2);
        assert_eq!(cache.posts[1].id, 2);

        drop(tx);
        assert_eq!(cache.changed().await, None);
    }

    #[test]
    fn test_viewport_at_end_of_feed_is_near() {
        let mut state = AppState::new("ana");
        state.selected_post = 9;
        state.keep_selection_visible(5);
        let vp = feed_viewport(&state, 5, 10);
        assert!(vp.is_near_bottom(2));
    }

    #[test]
    fn test_viewport_at_top_of_feed_is_not_near() {
        let state = AppState::new("ana");
        let vp = feed_viewport(&state, 5, 10);
        assert!(!vp.is_near_bottom(2));
    }

    #[test]
    fn test_failed_fetch_is_logged_as_error() {
        let mut state = AppState::new("ana");
        log_feed_event(
            &mut state,
            FeedEvent::FetchFailed {
                page: 2,
                error: FetchError::Network("timed out".into()),
            },
        );
        let entry = state.logs.back().unwrap();
        assert_eq!(entry.level, "ERROR");
        assert!(entry.message.contains("page 2"));
    }
}
