//! Index arithmetic for the homepage carousel.
//!
//! [`CarouselController`] is a synchronous state machine with two phases,
//! idle and animating. Navigation only starts from idle and leaves the
//! controller animating until [`CarouselController::finish_transition`] is
//! called; timers live in [`crate::autoplay::CarouselDriver`].
//!
//! In infinite mode the rendered track is
//! `[tail clones | real items | head clones]`, each clone block being
//! `items_to_show` long, and the index is a position on that track. When an
//! animation ends on a clone block the index jumps to the matching real
//! position with transitions disabled, so the jump is not visible.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TRANSITION_DURATION: Duration = Duration::from_millis(500);
pub const SWIPE_THRESHOLD_PX: f64 = 50.0;

/// Viewports narrower than `max_width` show `items` cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub max_width: u32,
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    steps: Vec<Breakpoint>,
    default_items: usize,
}

impl Breakpoints {
    pub fn new(mut steps: Vec<Breakpoint>, default_items: usize) -> Self {
        steps.sort_by_key(|step| step.max_width);
        Self {
            steps,
            default_items: default_items.max(1),
        }
    }

    /// <768 -> 1, <1024 -> 2, <1200 -> 3, otherwise 4.
    pub fn standard() -> Self {
        Self::new(
            vec![
                Breakpoint { max_width: 768, items: 1 },
                Breakpoint { max_width: 1024, items: 2 },
                Breakpoint { max_width: 1200, items: 3 },
            ],
            4,
        )
    }

    /// Table of the older stylesheet: <=480 -> 1, <=768 -> 2, <=1200 -> 3, otherwise 4.
    pub fn legacy() -> Self {
        Self::new(
            vec![
                Breakpoint { max_width: 481, items: 1 },
                Breakpoint { max_width: 769, items: 2 },
                Breakpoint { max_width: 1201, items: 3 },
            ],
            4,
        )
    }

    pub fn named(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "legacy" => Some(Self::legacy()),
            _ => None,
        }
    }

    pub fn items_for(&self, viewport_width: u32) -> usize {
        self.steps
            .iter()
            .find(|step| viewport_width < step.max_width)
            .map_or(self.default_items, |step| step.items)
            .max(1)
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CarouselOptions {
    pub infinite: bool,
    pub breakpoints: Breakpoints,
    pub swipe_threshold: f64,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            infinite: true,
            breakpoints: Breakpoints::standard(),
            swipe_threshold: SWIPE_THRESHOLD_PX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Animating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Next,
    Prev,
}

/// Navigation requested through a link or an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Next,
    Prev,
    Slide(usize),
    Page(usize),
}

impl Navigation {
    /// `next`, `prev`, `slide-N` or `page-N`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "next" => Some(Navigation::Next),
            "prev" => Some(Navigation::Prev),
            other => {
                let (kind, number) = other.split_once('-')?;
                let number = number.parse().ok()?;
                match kind {
                    "slide" => Some(Navigation::Slide(number)),
                    "page" => Some(Navigation::Page(number)),
                    _ => None,
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CarouselController {
    item_count: usize,
    items_to_show: usize,
    index: usize,
    infinite: bool,
    breakpoints: Breakpoints,
    swipe_threshold: f64,
    phase: Phase,
    transition_enabled: bool,
    touch_origin: Option<f64>,
}

impl CarouselController {
    pub fn new(item_count: usize, viewport_width: u32, options: CarouselOptions) -> Self {
        let items_to_show = options.breakpoints.items_for(viewport_width);
        let mut controller = Self {
            item_count,
            items_to_show,
            index: 0,
            infinite: options.infinite,
            breakpoints: options.breakpoints,
            swipe_threshold: options.swipe_threshold,
            phase: Phase::Idle,
            transition_enabled: true,
            touch_origin: None,
        };
        controller.index = controller.clone_count();
        controller
    }

    /// Resume from a previously rendered track position. Positions that
    /// could not be reached from idle are normalized.
    pub fn with_index(mut self, index: usize) -> Self {
        if self.item_count == 0 {
            return self;
        }
        if self.infinite {
            self.index = index.min(self.track_len() - 1);
            if let Some(real) = self.wrapped_index() {
                self.index = real;
            }
        } else {
            self.index = index.min(self.max_index());
        }
        self
    }

    fn clone_count(&self) -> usize {
        if self.infinite && self.item_count > 0 {
            self.items_to_show
        } else {
            0
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn items_to_show(&self) -> usize {
        self.items_to_show
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        self.phase == Phase::Animating
    }

    /// `false` right after a corrective jump; the next frame must be drawn
    /// without a CSS transition.
    pub fn transition_enabled(&self) -> bool {
        self.transition_enabled
    }

    pub fn track_len(&self) -> usize {
        self.item_count + 2 * self.clone_count()
    }

    /// Real item shown in every track slot, clones included.
    pub fn track(&self) -> Vec<usize> {
        if self.item_count == 0 {
            return Vec::new();
        }
        let n = self.item_count as isize;
        let offset = self.clone_count() as isize;
        (0..self.track_len() as isize)
            .map(|slot| (slot - offset).rem_euclid(n) as usize)
            .collect()
    }

    /// Index of the first visible real item.
    pub fn real_index(&self) -> usize {
        if self.item_count == 0 {
            return 0;
        }
        let offset = self.clone_count() as isize;
        (self.index as isize - offset).rem_euclid(self.item_count as isize) as usize
    }

    /// Highest index reachable in non-infinite mode.
    fn max_index(&self) -> usize {
        self.item_count.saturating_sub(self.items_to_show)
    }

    pub fn page_count(&self) -> usize {
        self.item_count.div_ceil(self.items_to_show)
    }

    pub fn current_page(&self) -> usize {
        self.real_index() / self.items_to_show
    }

    /// Translation of the track, as a percentage of the viewport width.
    pub fn offset_percent(&self) -> f64 {
        self.index as f64 * 100.0 / self.items_to_show as f64
    }

    pub fn next(&mut self) -> bool {
        self.move_to(self.index + 1)
    }

    pub fn prev(&mut self) -> bool {
        match self.index.checked_sub(1) {
            Some(target) => self.move_to(target),
            None => false,
        }
    }

    pub fn go_to_slide(&mut self, slide: usize) -> bool {
        if slide >= self.item_count {
            return false;
        }
        self.move_to(slide + self.clone_count())
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= self.page_count() {
            return false;
        }
        self.move_to(page * self.items_to_show + self.clone_count())
    }

    pub fn navigate(&mut self, navigation: Navigation) -> bool {
        match navigation {
            Navigation::Next => self.next(),
            Navigation::Prev => self.prev(),
            Navigation::Slide(slide) => self.go_to_slide(slide),
            Navigation::Page(page) => self.go_to_page(page),
        }
    }

    fn move_to(&mut self, target: usize) -> bool {
        if self.is_animating() || self.item_count == 0 {
            return false;
        }
        let target = if self.infinite {
            target.min(self.track_len() - 1)
        } else {
            target.min(self.max_index())
        };
        if target == self.index {
            return false;
        }
        self.index = target;
        self.phase = Phase::Animating;
        self.transition_enabled = true;
        true
    }

    // Real-range position equivalent to a clone-block position, if any.
    fn wrapped_index(&self) -> Option<usize> {
        if !self.infinite || self.item_count == 0 {
            return None;
        }
        let n = self.item_count;
        let k = self.items_to_show;
        if self.index >= self.track_len() - k {
            Some(self.index - n)
        } else if self.index == 0 {
            Some(self.track_len() - 2 * k)
        } else {
            None
        }
    }

    /// End the running animation. Returns the corrected index when the
    /// animation ended on a clone block and the controller jumped back
    /// into the real range.
    pub fn finish_transition(&mut self) -> Option<usize> {
        if !self.is_animating() {
            return None;
        }
        self.phase = Phase::Idle;
        let snapped = self.wrapped_index()?;
        self.index = snapped;
        self.transition_enabled = false;
        Some(snapped)
    }

    /// Recompute items per view for a new viewport width. Returns `true`
    /// when the layout changed.
    pub fn resize(&mut self, viewport_width: u32) -> bool {
        let items_to_show = self.breakpoints.items_for(viewport_width);
        if items_to_show == self.items_to_show {
            return false;
        }
        let real = self.real_index();
        self.phase = Phase::Idle;
        self.transition_enabled = false;
        self.items_to_show = items_to_show;
        self.index = if self.infinite {
            real + self.clone_count()
        } else {
            self.index.min(self.max_index())
        };
        true
    }

    pub fn touch_start(&mut self, x: f64) {
        self.touch_origin = Some(x);
    }

    /// Finish a drag. Returns the direction only when the track moved;
    /// short drags and drags during an animation do nothing.
    pub fn touch_end(&mut self, x: f64) -> Option<SwipeDirection> {
        let origin = self.touch_origin.take()?;
        let distance = origin - x;
        if distance > self.swipe_threshold && self.next() {
            Some(SwipeDirection::Next)
        } else if distance < -self.swipe_threshold && self.prev() {
            Some(SwipeDirection::Prev)
        } else {
            None
        }
    }
}
