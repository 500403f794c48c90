/// Scroll geometry of a list region, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible row.
    pub offset: usize,
    /// Visible rows.
    pub height: usize,
    /// Total rows of loaded content.
    pub content_height: usize,
}

impl Viewport {
    /// True when the bottom edge of the viewport is within `threshold` rows of
    /// the end of the content. Content shorter than the viewport counts as near.
    pub fn is_near_bottom(&self, threshold: usize) -> bool {
        self.offset + self.height >= self.content_height.saturating_sub(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_of_long_content_is_not_near() {
        let vp = Viewport { offset: 0, height: 20, content_height: 100 };
        assert!(!vp.is_near_bottom(2));
    }

    #[test]
    fn test_within_threshold_is_near() {
        let vp = Viewport { offset: 78, height: 20, content_height: 100 };
        assert!(vp.is_near_bottom(2));
        assert!(!vp.is_near_bottom(1));
    }

    #[test]
    fn test_short_content_is_near() {
        let vp = Viewport { offset: 0, height: 20, content_height: 5 };
        assert!(vp.is_near_bottom(0));
    }

    #[test]
    fn test_empty_content_is_near() {
        assert!(Viewport::default().is_near_bottom(0));
    }
}
