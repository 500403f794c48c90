use crate::api::types::{UserProfile, UserSummary};
use std::collections::VecDeque;
use std::time::Instant;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Profile,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

/// Everything the TUI shows apart from the feed items, which live in the
/// feed coordinator.
#[derive(Debug, Clone)]
pub struct AppState {
    pub username: String,
    pub start_time: Instant,
    pub view: View,
    /// Index of the highlighted post in the home feed.
    pub selected_post: usize,
    /// First post drawn in the feed panel.
    pub feed_scroll: usize,
    pub users: Vec<UserSummary>,
    pub profile: Option<UserProfile>,
    pub profile_selected: usize,
    /// Post id awaiting a y/n delete confirmation.
    pub pending_delete: Option<u64>,
    pub logs: VecDeque<LogEntry>,
}

impl AppState {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            start_time: Instant::now(),
            view: View::Home,
            selected_post: 0,
            feed_scroll: 0,
            users: Vec::new(),
            profile: None,
            profile_selected: 0,
            pending_delete: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
        }
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }

    /// Move the feed selection by `delta`, clamped to `len` posts.
    pub fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.selected_post = 0;
            return;
        }
        let next = self.selected_post as isize + delta;
        self.selected_post = next.clamp(0, len as isize - 1) as usize;
    }

    /// Adjust `feed_scroll` so the selection sits inside a window of `visible` posts.
    pub fn keep_selection_visible(&mut self, visible: usize) {
        let visible = visible.max(1);
        if self.selected_post < self.feed_scroll {
            self.feed_scroll = self.selected_post;
        } else if self.selected_post >= self.feed_scroll + visible {
            self.feed_scroll = self.selected_post + 1 - visible;
        }
    }

    pub fn move_profile_selection(&mut self, delta: isize) {
        let len = self.profile.as_ref().map_or(0, |p| p.posts.len());
        if len == 0 {
            self.profile_selected = 0;
            return;
        }
        let next = self.profile_selected as isize + delta;
        self.profile_selected = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn open_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
        self.profile_selected = 0;
        self.pending_delete = None;
        self.view = View::Profile;
    }

    pub fn close_profile(&mut self) {
        self.profile = None;
        self.pending_delete = None;
        self.view = View::Home;
    }

    /// Drop a deleted post from the open profile.
    pub fn remove_profile_post(&mut self, post_id: u64) {
        if let Some(profile) = self.profile.as_mut() {
            let before = profile.posts.len();
            profile.posts.retain(|p| p.id != post_id);
            if profile.posts.len() < before {
                profile.posts_count = profile.posts_count.saturating_sub(1);
            }
            if self.profile_selected >= profile.posts.len() {
                self.profile_selected = profile.posts.len().saturating_sub(1);
            }
        }
    }
}
