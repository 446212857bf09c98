//! Transcript scroll coordination.
//!
//! Pure geometry: the TUI feeds in content/visible heights and user scroll
//! input, and reads back the line offset, follow state, and whether the
//! "new content below" affordance should be visible. Near-bottom counts as
//! bottom so a reader a couple of lines up still gets auto-follow.

use std::time::{Duration, Instant};

use crate::config::ViewportConfig;

#[derive(Debug)]
pub struct ViewportCoordinator {
    /// Lines scrolled down from the top of the transcript.
    offset: usize,
    content_height: usize,
    visible_height: usize,
    /// Distance from the bottom (in lines) still treated as "at bottom".
    threshold: usize,
    grace: Duration,
    follow: bool,
    alert: bool,
    alert_deadline: Option<Instant>,
    turn_active: bool,
}

impl ViewportCoordinator {
    pub fn new(threshold: usize, grace: Duration) -> Self {
        Self {
            offset: 0,
            content_height: 0,
            visible_height: 0,
            threshold,
            grace,
            follow: true,
            alert: false,
            alert_deadline: None,
            turn_active: false,
        }
    }

    pub fn from_config(config: &ViewportConfig) -> Self {
        Self::new(config.bottom_threshold_lines, config.affordance_grace())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn alert_visible(&self) -> bool {
        self.alert
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.visible_height)
    }

    /// True when the viewport sits within the threshold of the bottom.
    pub fn is_at_bottom(&self) -> bool {
        self.max_offset().saturating_sub(self.offset) <= self.threshold
    }

    /// Updates dimensions after layout or content changes. Keeps the offset
    /// valid and snaps to the bottom while following.
    pub fn set_geometry(&mut self, content_height: usize, visible_height: usize) {
        self.content_height = content_height;
        self.visible_height = visible_height;
        if self.follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    pub fn on_turn_started(&mut self) {
        self.turn_active = true;
    }

    pub fn on_turn_completed(&mut self, now: Instant) {
        self.turn_active = false;
        if self.alert {
            self.alert_deadline = Some(now + self.grace);
        }
    }

    /// Called when the transcript grew. Following viewports stick to the
    /// bottom; anchored ones raise the affordance while a turn is streaming.
    pub fn on_content_appended(&mut self, content_height: usize) {
        self.content_height = content_height;
        if self.follow {
            self.offset = self.max_offset();
        } else if self.turn_active {
            self.alert = true;
            self.alert_deadline = None;
        }
    }

    /// User scrolled up: stop following.
    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
        self.follow = false;
    }

    /// User scrolled down. Reaching the bottom region resumes following.
    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = (self.offset + lines).min(self.max_offset());
        if self.is_at_bottom() {
            self.follow = true;
            self.alert = false;
            self.alert_deadline = None;
        }
    }

    /// Jumps to the bottom and resumes following. Idempotent: returns false
    /// when nothing changed, so callers can skip redundant redraws.
    pub fn scroll_to_bottom(&mut self) -> bool {
        let target = self.max_offset();
        let changed = self.offset != target || !self.follow || self.alert;
        self.offset = target;
        self.follow = true;
        self.alert = false;
        self.alert_deadline = None;
        changed
    }

    /// Expires the affordance once its post-turn grace period has passed.
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.alert_deadline
            && now >= deadline
        {
            self.alert = false;
            self.alert_deadline = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> ViewportCoordinator {
        let mut v = ViewportCoordinator::new(3, Duration::from_millis(1000));
        v.set_geometry(100, 20);
        v
    }

    #[test]
    fn near_bottom_counts_as_bottom() {
        let mut v = coordinator();
        assert_eq!(v.offset(), 80);
        assert!(v.is_at_bottom());

        v.scroll_up(3);
        assert!(v.is_at_bottom());
        v.scroll_up(1);
        assert!(!v.is_at_bottom());
    }

    #[test]
    fn following_viewport_sticks_to_growing_content() {
        let mut v = coordinator();
        v.on_turn_started();
        v.on_content_appended(110);
        assert_eq!(v.offset(), 90);
        assert!(!v.alert_visible());
    }

    #[test]
    fn anchored_viewport_raises_affordance_during_turn() {
        let mut v = coordinator();
        v.on_turn_started();
        v.scroll_up(30);
        assert!(!v.is_following());

        v.on_content_appended(110);
        assert_eq!(v.offset(), 50);
        assert!(v.alert_visible());
    }

    #[test]
    fn no_affordance_when_idle() {
        let mut v = coordinator();
        v.scroll_up(30);
        v.on_content_appended(110);
        assert!(!v.alert_visible());
    }

    #[test]
    fn scroll_to_bottom_is_idempotent() {
        let mut v = coordinator();
        v.on_turn_started();
        v.scroll_up(30);
        v.on_content_appended(110);

        assert!(v.scroll_to_bottom());
        assert_eq!(v.offset(), 90);
        assert!(v.is_following());
        assert!(!v.alert_visible());

        assert!(!v.scroll_to_bottom());
    }

    #[test]
    fn scrolling_back_down_resumes_follow() {
        let mut v = coordinator();
        v.scroll_up(50);
        assert!(!v.is_following());

        v.scroll_down(49);
        assert!(v.is_following());
    }

    #[test]
    fn affordance_expires_after_grace() {
        let mut v = coordinator();
        v.on_turn_started();
        v.scroll_up(30);
        v.on_content_appended(110);
        assert!(v.alert_visible());

        let end = Instant::now();
        v.on_turn_completed(end);
        v.tick(end + Duration::from_millis(500));
        assert!(v.alert_visible());
        v.tick(end + Duration::from_millis(1000));
        assert!(!v.alert_visible());
    }

    #[test]
    fn resize_clamps_offset() {
        let mut v = coordinator();
        v.scroll_up(80);
        v.set_geometry(30, 20);
        assert_eq!(v.offset(), 0);
    }
}
