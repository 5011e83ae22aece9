//! Rolling per-target window of recent outcome codes.
//!
//! Each target owns its own lock, so a polling task appending to one target
//! never contends with another target's task. The alert sweep evaluates and
//! clears a window under that same lock, so no append can slip in between
//! the decision and the reset.

use parking_lot::Mutex;
use std::collections::VecDeque;

use super::alert;

/// Window of one target
#[derive(Debug)]
pub struct Window {
    codes: VecDeque<u16>,
    capacity: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self { codes: VecDeque::new(), capacity }
    }

    /// Append at the tail, dropping the oldest entries past capacity
    pub fn append(&mut self, status_code: u16) {
        self.codes.push_back(status_code);
        while self.codes.len() > self.capacity {
            self.codes.pop_front();
        }
    }

    pub fn reset(&mut self) {
        self.codes.clear();
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Oldest first
    pub fn codes(&self) -> Vec<u16> {
        self.codes.iter().copied().collect()
    }

    pub fn should_alert(&self, threshold: usize) -> bool {
        alert::should_alert(self.codes.iter().copied(), threshold)
    }
}

/// Windows for every configured target, in configured order
#[derive(Debug)]
pub struct HistoryTracker {
    threshold: usize,
    windows: Vec<(String, Mutex<Window>)>,
}

impl HistoryTracker {
    /// Windows hold at most `2 * threshold` entries
    pub fn new(targets: &[String], threshold: usize) -> Self {
        let capacity = threshold.saturating_mul(2);
        let windows = targets
            .iter()
            .map(|target| (target.clone(), Mutex::new(Window::new(capacity))))
            .collect();

        Self { threshold, windows }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.windows.iter().map(|(target, _)| target.as_str())
    }

    fn window(&self, target: &str) -> Option<&Mutex<Window>> {
        self.windows.iter().find(|(t, _)| t == target).map(|(_, window)| window)
    }

    /// Returns false for a target that is not tracked
    pub fn append(&self, target: &str, status_code: u16) -> bool {
        match self.window(target) {
            Some(window) => {
                window.lock().append(status_code);
                true
            }
            None => false,
        }
    }

    pub fn reset(&self, target: &str) {
        if let Some(window) = self.window(target) {
            window.lock().reset();
        }
    }

    pub fn should_alert(&self, target: &str) -> bool {
        self.window(target)
            .map(|window| window.lock().should_alert(self.threshold))
            .unwrap_or(false)
    }

    /// Evaluate and, when the alert condition holds, clear the window in one step
    pub fn take_alert(&self, target: &str) -> bool {
        let Some(window) = self.window(target) else { return false };
        let mut window = window.lock();
        if window.should_alert(self.threshold) {
            window.reset();
            true
        } else {
            false
        }
    }

    /// Snapshot of a target's window, oldest first
    pub fn snapshot(&self, target: &str) -> Option<Vec<u16>> {
        self.window(target).map(|window| window.lock().codes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://example.com";

    fn tracker(threshold: usize) -> HistoryTracker {
        HistoryTracker::new(&[SITE.to_string()], threshold)
    }

    #[test]
    fn test_append_keeps_order() {
        let history = tracker(3);
        history.append(SITE, 200);
        history.append(SITE, 500);
        history.append(SITE, 200);

        assert_eq!(history.snapshot(SITE), Some(vec![200, 500, 200]));
    }

    #[test]
    fn test_window_stabilizes_at_twice_threshold() {
        let history = tracker(3);
        for _ in 0..10 {
            history.append(SITE, 200);
        }

        let codes = history.snapshot(SITE).unwrap();
        assert_eq!(codes.len(), 6);
        assert!(codes.iter().all(|&code| code == 200));
    }

    #[test]
    fn test_trim_drops_oldest_first() {
        let history = tracker(2);
        for code in [1, 2, 3, 4, 5, 6] {
            history.append(SITE, code);
        }

        assert_eq!(history.snapshot(SITE), Some(vec![3, 4, 5, 6]));
    }

    #[test]
    fn test_length_bound_for_many_thresholds() {
        for threshold in 1..=8 {
            let history = tracker(threshold);
            for i in 0..(threshold * 5) {
                history.append(SITE, (i % 600) as u16);
                assert!(history.snapshot(SITE).unwrap().len() <= 2 * threshold);
            }
        }
    }

    #[test]
    fn test_reset_empties_window() {
        let history = tracker(3);
        history.append(SITE, 500);
        history.reset(SITE);

        assert_eq!(history.snapshot(SITE), Some(vec![]));
    }

    #[test]
    fn test_take_alert_clears_only_when_firing() {
        let history = tracker(3);
        for code in [500, 200, 500] {
            history.append(SITE, code);
        }
        assert!(!history.take_alert(SITE));
        assert_eq!(history.snapshot(SITE).unwrap().len(), 3);

        for code in [0, 502, 503] {
            history.append(SITE, code);
        }
        assert!(history.take_alert(SITE));
        assert_eq!(history.snapshot(SITE), Some(vec![]));
        assert!(!history.should_alert(SITE));
    }

    #[test]
    fn test_huge_threshold_does_not_preallocate() {
        let history = tracker(usize::MAX);
        history.append(SITE, 500);

        assert_eq!(history.snapshot(SITE), Some(vec![500]));
        assert!(!history.should_alert(SITE));
    }

    #[test]
    fn test_unknown_target() {
        let history = tracker(3);
        assert!(!history.append("https://unknown.example", 500));
        assert!(!history.should_alert("https://unknown.example"));
        assert!(history.snapshot("https://unknown.example").is_none());
    }

    #[test]
    fn test_wrapped_window_evaluates_tail() {
        // Enough appends to wrap the ring buffer
        let history = tracker(2);
        for code in [200, 200, 200, 200, 500, 500] {
            history.append(SITE, code);
        }
        assert!(history.should_alert(SITE));
    }
}
