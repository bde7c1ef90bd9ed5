// =============================================================================
// Somoco Common - Home Page Section Navigation
// =============================================================================
// Table of Contents:
// 1. Configuration
// 2. Layout, Input & Actions
// 3. Navigator
// 4. Easing
// =============================================================================
//
// Turns wheel and swipe input into one-section-at-a-time navigation. Sections
// taller than the viewport scroll natively until their edge is reached.
// Timestamps are plain milliseconds supplied by the caller (the browser's
// `performance.now()` or a test clock).

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// 1. Configuration
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Inputs closer together than this are dropped.
    pub debounce_ms: u64,
    /// Distance from a tall section's edge that still counts as "at the edge".
    pub boundary_tolerance_px: f64,
    /// Length of the eased scroll animation.
    pub animation_ms: u64,
    /// No new transition starts until this long after the previous one began.
    /// Longer than `animation_ms` so trackpad momentum cannot chain a second
    /// jump right after the first lands.
    pub cooldown_ms: u64,
    /// Shortest vertical swipe treated as a navigation gesture.
    pub min_swipe_px: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            boundary_tolerance_px: 5.0,
            animation_ms: 800,
            cooldown_ms: 1200,
            min_swipe_px: 50.0,
        }
    }
}

// -----------------------------------------------------------------------------
// 2. Layout, Input & Actions
// -----------------------------------------------------------------------------

/// Document offset and height of one section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub top: f64,
    pub height: f64,
}

/// One wheel event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta_y: f64,
    /// Ctrl/Cmd held: the browser zooms instead of scrolling.
    pub modifier_held: bool,
    pub now_ms: u64,
}

/// Where the window is when an event arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionViewport {
    /// Current document scroll offset.
    pub scroll_y: f64,
    pub height: f64,
}

impl SectionViewport {
    pub fn new(scroll_y: f64, height: f64) -> Self {
        Self { scroll_y, height }
    }
}

/// What the caller should do with an input event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavAction {
    /// Swallow the event without moving.
    Ignore,
    /// Leave the event to the browser.
    NativeScroll,
    /// Swallow the event and animate from `start_offset` to `target_offset`.
    Transition {
        from: usize,
        to: usize,
        start_offset: f64,
        target_offset: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
struct Animation {
    started_at: u64,
    start_offset: f64,
    target_offset: f64,
}

// -----------------------------------------------------------------------------
// 3. Navigator
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SectionNavigator {
    config: NavigatorConfig,
    sections: Vec<SectionLayout>,
    active_index: usize,
    animation: Option<Animation>,
    cooldown_until: u64,
    last_input_at: Option<u64>,
    touch_start_y: Option<f64>,
}

impl SectionNavigator {
    pub fn new(sections: Vec<SectionLayout>, config: NavigatorConfig) -> Self {
        Self {
            config,
            sections,
            active_index: 0,
            animation: None,
            cooldown_until: 0,
            last_input_at: None,
            touch_start_y: None,
        }
    }

    /// Replace the layout after a resize. The active index is kept in range.
    pub fn set_layout(&mut self, sections: Vec<SectionLayout>) {
        self.sections = sections;
        self.active_index = self.active_index.min(self.last_index());
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// True while a transition is running or cooling down. The cooldown
    /// always covers the animation.
    pub fn is_animating(&self, now: u64) -> bool {
        now < self.cooldown_until
    }

    fn last_index(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }

    pub fn on_wheel(&mut self, input: WheelInput, viewport: &SectionViewport) -> NavAction {
        if input.modifier_held || input.delta_y == 0.0 || self.sections.is_empty() {
            return NavAction::NativeScroll;
        }
        let direction = if input.delta_y > 0.0 { Direction::Down } else { Direction::Up };
        self.navigate(direction, input.now_ms, viewport)
    }

    /// Start of a swipe. Touches that begin mid-transition are not tracked.
    pub fn on_touch_start(&mut self, y: f64, now: u64) {
        self.touch_start_y = (!self.is_animating(now)).then_some(y);
    }

    /// End of a swipe. Swiping up (finger moving towards the top) goes down.
    pub fn on_touch_end(&mut self, y: f64, now: u64, viewport: &SectionViewport) -> NavAction {
        let Some(start) = self.touch_start_y.take() else {
            return NavAction::NativeScroll;
        };
        let distance = start - y;
        if distance.abs() < self.config.min_swipe_px || self.sections.is_empty() {
            return NavAction::NativeScroll;
        }
        let direction = if distance > 0.0 { Direction::Down } else { Direction::Up };
        self.navigate(direction, now, viewport)
    }

    /// Jump straight to a section, e.g. from a navigation dot.
    pub fn go_to(&mut self, index: usize, now: u64, scroll_y: f64) -> NavAction {
        if self.sections.is_empty() || self.is_animating(now) {
            return NavAction::Ignore;
        }
        let target = index.min(self.last_index());
        if target == self.active_index {
            return NavAction::Ignore;
        }
        self.start_transition(target, now, scroll_y)
    }

    fn navigate(&mut self, direction: Direction, now: u64, viewport: &SectionViewport) -> NavAction {
        if self.is_animating(now) {
            return NavAction::Ignore;
        }

        let previous = self.last_input_at.replace(now);
        if let Some(previous) = previous {
            if now.saturating_sub(previous) < self.config.debounce_ms {
                return NavAction::Ignore;
            }
        }

        let current = self.sections[self.active_index];
        if current.height > viewport.height && !self.at_edge(current, direction, viewport) {
            return NavAction::NativeScroll;
        }

        let target = match direction {
            Direction::Down => (self.active_index + 1).min(self.last_index()),
            Direction::Up => self.active_index.saturating_sub(1),
        };
        if target == self.active_index {
            return NavAction::NativeScroll;
        }
        self.start_transition(target, now, viewport.scroll_y)
    }

    fn at_edge(&self, section: SectionLayout, direction: Direction, viewport: &SectionViewport) -> bool {
        let tolerance = self.config.boundary_tolerance_px;
        match direction {
            Direction::Down => {
                viewport.scroll_y + viewport.height >= section.top + section.height - tolerance
            }
            Direction::Up => viewport.scroll_y <= section.top + tolerance,
        }
    }

    fn start_transition(&mut self, target: usize, now: u64, scroll_y: f64) -> NavAction {
        let from = self.active_index;
        let target_offset = self.sections[target].top;
        self.active_index = target;
        self.animation = Some(Animation {
            started_at: now,
            start_offset: scroll_y,
            target_offset,
        });
        self.cooldown_until = now + self.config.cooldown_ms.max(self.config.animation_ms);
        tracing::trace!(from, to = target, "section transition");
        NavAction::Transition {
            from,
            to: target,
            start_offset: scroll_y,
            target_offset,
        }
    }

    /// Per-frame callback. Returns the scroll offset to apply, or `None` when
    /// no animation is running.
    pub fn tick(&mut self, now: u64) -> Option<f64> {
        let animation = self.animation?;
        let elapsed = now.saturating_sub(animation.started_at) as f64;
        let t = (elapsed / self.config.animation_ms.max(1) as f64).min(1.0);
        let offset = animation.start_offset + (animation.target_offset - animation.start_offset) * ease_in_out_cubic(t);
        if t >= 1.0 {
            self.animation = None;
        }
        Some(offset)
    }
}

// -----------------------------------------------------------------------------
// 4. Easing
// -----------------------------------------------------------------------------

pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
