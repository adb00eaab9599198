// Timers around a CarouselController: the animation lock and autoplay.
//
// Both timers are tokio tasks owned by the driver and aborted on shutdown
// or drop, so nothing keeps acting on a carousel that has been torn down.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};

use crate::carousel::{CarouselController, Navigation, SwipeDirection};

pub const DEFAULT_AUTOPLAY_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselSnapshot {
    pub index: usize,
    pub real_index: usize,
    pub items_to_show: usize,
    pub animating: bool,
    pub transition_enabled: bool,
}

struct Shared {
    controller: Mutex<CarouselController>,
    hovered: AtomicBool,
    transition: Duration,
    // Pending end-of-animation task, replaced on every navigation
    settle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

async fn navigate(shared: &Arc<Shared>, step: impl FnOnce(&mut CarouselController) -> bool) -> bool {
    let moved = {
        let mut controller = shared.controller.lock().await;
        step(&mut controller)
    };
    if moved {
        schedule_settle(shared);
    }
    moved
}

fn schedule_settle(shared: &Arc<Shared>) {
    let task_shared = Arc::clone(shared);
    let task = tokio::spawn(async move {
        tokio::time::sleep(task_shared.transition).await;
        let mut controller = task_shared.controller.lock().await;
        if let Some(index) = controller.finish_transition() {
            tracing::debug!(index, "Carousel jumped back into the real item range");
        }
    });
    if let Ok(mut slot) = shared.settle.lock() {
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }
}

fn abort_settle(shared: &Shared) {
    if let Ok(mut slot) = shared.settle.lock() {
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

/// Owns a carousel controller plus the tasks that move it over time.
pub struct CarouselDriver {
    shared: Arc<Shared>,
    autoplay: Option<JoinHandle<()>>,
}

impl CarouselDriver {
    pub fn new(controller: CarouselController, transition: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                controller: Mutex::new(controller),
                hovered: AtomicBool::new(false),
                transition,
                settle: std::sync::Mutex::new(None),
            }),
            autoplay: None,
        }
    }

    /// Start advancing every `interval`. Ticks that arrive while the
    /// pointer is over the carousel are skipped.
    pub fn start_autoplay(&mut self, interval: Duration) {
        self.stop_autoplay();
        let shared = Arc::clone(&self.shared);
        self.autoplay = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if shared.hovered.load(Ordering::Relaxed) {
                    continue;
                }
                navigate(&shared, CarouselController::next).await;
            }
        }));
        tracing::debug!(?interval, "Carousel autoplay started");
    }

    pub fn stop_autoplay(&mut self) {
        if let Some(task) = self.autoplay.take() {
            task.abort();
        }
    }

    pub fn is_autoplaying(&self) -> bool {
        self.autoplay.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn pointer_enter(&self) {
        self.shared.hovered.store(true, Ordering::Relaxed);
    }

    pub fn pointer_leave(&self) {
        self.shared.hovered.store(false, Ordering::Relaxed);
    }

    pub async fn next(&self) -> bool {
        navigate(&self.shared, CarouselController::next).await
    }

    pub async fn prev(&self) -> bool {
        navigate(&self.shared, CarouselController::prev).await
    }

    pub async fn navigate(&self, navigation: Navigation) -> bool {
        navigate(&self.shared, |controller| controller.navigate(navigation)).await
    }

    pub async fn resize(&self, viewport_width: u32) -> bool {
        let changed = self.shared.controller.lock().await.resize(viewport_width);
        if changed {
            // The resize already ended any running animation
            abort_settle(&self.shared);
        }
        changed
    }

    pub async fn touch_start(&self, x: f64) {
        self.shared.controller.lock().await.touch_start(x);
    }

    pub async fn touch_end(&self, x: f64) -> Option<SwipeDirection> {
        let direction = self.shared.controller.lock().await.touch_end(x);
        if direction.is_some() {
            schedule_settle(&self.shared);
        }
        direction
    }

    pub async fn snapshot(&self) -> CarouselSnapshot {
        let controller = self.shared.controller.lock().await;
        CarouselSnapshot {
            index: controller.current_index(),
            real_index: controller.real_index(),
            items_to_show: controller.items_to_show(),
            animating: controller.is_animating(),
            transition_enabled: controller.transition_enabled(),
        }
    }

    /// Cancel every timer. The controller is left where it is.
    pub fn shutdown(&mut self) {
        self.stop_autoplay();
        abort_settle(&self.shared);
    }
}

impl Drop for CarouselDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::{CarouselOptions, TRANSITION_DURATION};

    fn driver(items: usize) -> CarouselDriver {
        let controller = CarouselController::new(items, 1400, CarouselOptions::default());
        CarouselDriver::new(controller, TRANSITION_DURATION)
    }

    #[tokio::test(start_paused = true)]
    async fn animation_lock_releases_after_transition() {
        let driver = driver(8);
        assert!(driver.next().await);
        assert!(driver.snapshot().await.animating);
        assert!(!driver.next().await);

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(driver.snapshot().await.animating);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let snapshot = driver.snapshot().await;
        assert!(!snapshot.animating);
        assert_eq!(snapshot.index, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn wrap_around_snaps_once_the_animation_ends() {
        let driver = driver(8);
        for _ in 0..8 {
            assert!(driver.next().await);
            tokio::time::sleep(Duration::from_millis(600)).await;
        }
        let snapshot = driver.snapshot().await;
        assert_eq!(snapshot.index, 4);
        assert_eq!(snapshot.real_index, 0);
        assert!(!snapshot.transition_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn autoplay_advances_and_pauses_on_hover() {
        let mut driver = driver(8);
        driver.start_autoplay(Duration::from_secs(3));
        assert!(driver.is_autoplaying());

        tokio::time::sleep(Duration::from_millis(3600)).await;
        assert_eq!(driver.snapshot().await.index, 5);

        driver.pointer_enter();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(driver.snapshot().await.index, 5);

        driver.pointer_leave();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(driver.snapshot().await.index, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_every_timer() {
        let mut driver = driver(8);
        driver.start_autoplay(Duration::from_secs(1));
        assert!(driver.next().await);

        driver.shutdown();
        assert!(!driver.is_autoplaying());

        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = driver.snapshot().await;
        // The pending settle was cancelled along with autoplay
        assert_eq!(snapshot.index, 5);
        assert!(snapshot.animating);
    }

    #[tokio::test(start_paused = true)]
    async fn swipe_schedules_the_lock_release() {
        let driver = driver(8);
        driver.touch_start(400.0).await;
        assert_eq!(driver.touch_end(300.0).await, Some(SwipeDirection::Next));
        assert!(driver.snapshot().await.animating);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!driver.snapshot().await.animating);
    }
}
