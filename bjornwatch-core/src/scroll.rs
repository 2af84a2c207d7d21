//! Scroll reconciliation for the transcript view
//!
//! Decides whether the view should jump to the newest message after a
//! transcript update. The rule mimics ordinary chat UIs: follow the bottom
//! while the reader is at the bottom, never yank the view while they are
//! scrolled up reading history. Both the flag and the decision are pure
//! functions over synthetic metrics, so the policy is tested without a
//! terminal.

/// Distance from the bottom (in the container's own length units) under
/// which the view still counts as "at bottom".
pub const AT_BOTTOM_SLACK: f64 = 40.0;

/// Scroll geometry of the transcript container at one instant.
///
/// Units are whatever the container measures in (pixels, rows); the policy
/// only compares them against [`AT_BOTTOM_SLACK`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Scroll offset from the top of the content
    pub offset: f64,
    /// Visible height of the container
    pub viewport: f64,
    /// Total height of the content
    pub content: f64,
}

impl ScrollMetrics {
    /// Distance between the viewport's bottom edge and the content's
    /// bottom. Zero when fully scrolled down or when the content fits.
    pub fn distance_to_bottom(&self) -> f64 {
        (self.content - self.offset - self.viewport).max(0.0)
    }

    /// Whether the viewport currently shows the newest message.
    pub fn is_at_bottom(&self) -> bool {
        self.distance_to_bottom() < AT_BOTTOM_SLACK
    }
}

/// What the view should do with its scroll position after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    /// Jump to the newest message
    PinToBottom,
    /// Leave the position exactly where it is
    Preserve,
}

/// Derived "at bottom" flag, reconciled against transcript updates.
///
/// The flag is computed from metrics once at mount and on every
/// user-driven scroll. Transcript growth alone never moves it: content
/// appearing below the viewport is not a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowState {
    at_bottom: bool,
}

impl FollowState {
    /// Establish the initial flag from the metrics at mount.
    pub fn mount(metrics: ScrollMetrics) -> Self {
        Self {
            at_bottom: metrics.is_at_bottom(),
        }
    }

    /// Recompute the flag after a user-driven scroll.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        self.at_bottom = metrics.is_at_bottom();
    }

    /// Reconcile one transcript update.
    ///
    /// Pins to the bottom only when a new message arrived while the view
    /// was already at the bottom; every other combination preserves the
    /// reader's position. The flag itself is unchanged: pinning keeps the
    /// view at the bottom, and preserving moves nothing.
    pub fn reconcile(&self, new_arrival: bool) -> ScrollAction {
        if new_arrival && self.at_bottom {
            ScrollAction::PinToBottom
        } else {
            ScrollAction::Preserve
        }
    }

    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(offset: f64, viewport: f64, content: f64) -> ScrollMetrics {
        ScrollMetrics {
            offset,
            viewport,
            content,
        }
    }

    #[test]
    fn test_distance_to_bottom() {
        assert_eq!(metrics(0.0, 50.0, 200.0).distance_to_bottom(), 150.0);
        assert_eq!(metrics(150.0, 50.0, 200.0).distance_to_bottom(), 0.0);
        // Content shorter than the viewport never goes negative.
        assert_eq!(metrics(0.0, 50.0, 10.0).distance_to_bottom(), 0.0);
    }

    #[test]
    fn test_at_bottom_threshold_is_strict() {
        assert!(metrics(0.0, 50.0, 89.0).is_at_bottom()); // 39 away
        assert!(!metrics(0.0, 50.0, 90.0).is_at_bottom()); // exactly 40 away
        assert!(!metrics(0.0, 50.0, 500.0).is_at_bottom());
    }

    #[test]
    fn test_mount_state_follows_metrics() {
        // An empty or short transcript mounts at the bottom.
        assert!(FollowState::mount(metrics(0.0, 50.0, 0.0)).at_bottom());
        // A long transcript mounted at the top does not.
        assert!(!FollowState::mount(metrics(0.0, 50.0, 400.0)).at_bottom());
    }

    #[test]
    fn test_scrolled_up_reader_is_never_moved() {
        let mut follow = FollowState::mount(metrics(0.0, 50.0, 50.0));
        // Reader scrolls up into history.
        follow.on_scroll(metrics(10.0, 50.0, 300.0));
        assert!(!follow.at_bottom());

        // No matter what arrives, their position is preserved.
        assert_eq!(follow.reconcile(true), ScrollAction::Preserve);
        assert_eq!(follow.reconcile(false), ScrollAction::Preserve);
    }

    #[test]
    fn test_at_bottom_reader_follows_new_messages() {
        let mut follow = FollowState::mount(metrics(0.0, 50.0, 400.0));
        follow.on_scroll(metrics(350.0, 50.0, 400.0));
        assert!(follow.at_bottom());

        assert_eq!(follow.reconcile(true), ScrollAction::PinToBottom);
    }

    #[test]
    fn test_update_without_arrival_never_pins() {
        // Unchanged last timestamp means no arrival, so even an at-bottom
        // view stays put.
        let follow = FollowState::mount(metrics(350.0, 50.0, 400.0));
        assert!(follow.at_bottom());
        assert_eq!(follow.reconcile(false), ScrollAction::Preserve);
    }

    #[test]
    fn test_returning_to_bottom_resumes_following() {
        let mut follow = FollowState::mount(metrics(0.0, 50.0, 400.0));
        assert_eq!(follow.reconcile(true), ScrollAction::Preserve);

        // Reader jumps to the end.
        follow.on_scroll(metrics(350.0, 50.0, 400.0));
        assert_eq!(follow.reconcile(true), ScrollAction::PinToBottom);
    }
}
