//! Progress reporting utilities using indicatif.
//!
//! [`Progress`] implements [`ProgressCallback`] and draws a single bar over
//! the duplicate groups while a cleanup runs.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for a cleanup run.
///
/// Implement this trait to receive updates as the resolver works through
/// duplicate groups. Calls arrive in order: `on_start`, then `on_group` for
/// each group attempted (followed by `on_failure` if it failed), then
/// `on_finish`.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use rowdupe::progress::ProgressCallback;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ProgressCallback for Counter {
///     fn on_start(&self, _total: usize) {}
///     fn on_group(&self, _current: usize, _key: &str) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
///     fn on_finish(&self) {}
/// }
///
/// let counter = Counter::default();
/// counter.on_group(1, "field_title");
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait ProgressCallback: Send + Sync {
    /// Called once after the scan, before the first group.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of duplicate groups to process
    fn on_start(&self, total: usize);

    /// Called before each group is deleted.
    ///
    /// # Arguments
    ///
    /// * `current` - Group number (1-based)
    /// * `key` - Natural key of the group
    fn on_group(&self, current: usize, key: &str);

    /// Called when a group's deletion fails.
    ///
    /// The default implementation does nothing.
    ///
    /// # Arguments
    ///
    /// * `key` - Natural key of the failed group
    /// * `error` - Error message from the store
    fn on_failure(&self, _key: &str, _error: &str) {}

    /// Called after the last group, or after an interrupt.
    fn on_finish(&self);
}

/// Progress reporter using indicatif.
///
/// Draws one bar over the duplicate groups on stderr. Failures are printed
/// above the bar so they stay visible after it is cleared.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    ///
    /// # Examples
    ///
    /// ```
    /// use rowdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} groups {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
    }
}

impl ProgressCallback for Progress {
    fn on_start(&self, total: usize) {
        if self.quiet || total == 0 {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::style());
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_group(&self, current: usize, key: &str) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_position(current.saturating_sub(1) as u64);
                bar.set_message(key.to_string());
            }
        }
    }

    fn on_failure(&self, key: &str, error: &str) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.println(format!("failed: {key}: {error}"));
            }
        }
    }

    fn on_finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}
