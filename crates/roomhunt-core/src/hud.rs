//! On-screen text: target prompt, transient feedback, and the exit control.
//!
//! The HUD is plain state. Rendering reads the label text and the progress of
//! its push transition.

use std::time::Duration;

pub const CORRECT_TEXT: &str = "Correct!";
pub const RETRY_TEXT: &str = "Try Again!";
pub const COMPLETE_TEXT: &str = "You found all the items!";

/// An in-flight push transition from the previous text to the current one.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTransition {
    pub from: String,
    pub started_at: Duration,
    pub duration: Duration,
}

impl LabelTransition {
    /// Linear progress in `[0, 1]`.
    pub fn linear(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Ease-in-ease-out progress in `[0, 1]`.
    pub fn progress(&self, now: Duration) -> f32 {
        let t = self.linear(now);
        t * t * (3.0 - 2.0 * t)
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now.saturating_sub(self.started_at) >= self.duration
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Label {
    text: String,
    transition: Option<LabelTransition>,
    revision: u64,
}

impl Label {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn transition(&self) -> Option<&LabelTransition> {
        self.transition.as_ref()
    }

    /// Incremented on every text change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the text and starts a transition from the old text.
    pub fn set(&mut self, text: impl Into<String>, now: Duration, duration: Duration) {
        let from = std::mem::replace(&mut self.text, text.into());
        self.transition = Some(LabelTransition {
            from,
            started_at: now,
            duration,
        });
        self.revision += 1;
    }

    /// Transition progress, `1.0` when nothing is animating.
    pub fn progress(&self, now: Duration) -> f32 {
        self.transition.as_ref().map_or(1.0, |t| t.progress(now))
    }
}

/// Top label, middle label and exit control.
#[derive(Debug, Clone)]
pub struct Hud {
    top: Label,
    middle: Label,
    exit_visible: bool,
    transition: Duration,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl Hud {
    pub fn new(transition: Duration) -> Self {
        Self {
            top: Label::default(),
            middle: Label::default(),
            exit_visible: false,
            transition,
        }
    }

    pub fn top(&self) -> &Label {
        &self.top
    }

    pub fn middle(&self) -> &Label {
        &self.middle
    }

    pub fn exit_visible(&self) -> bool {
        self.exit_visible
    }

    pub fn show_target(&mut self, target: &str, now: Duration) {
        self.top.set(target, now, self.transition);
    }

    pub fn show_completion(&mut self, now: Duration) {
        self.top.set(COMPLETE_TEXT, now, self.transition);
    }

    /// Sets the middle label. The caller schedules the matching clear.
    pub fn flash(&mut self, text: &str, now: Duration) {
        self.middle.set(text, now, self.transition);
    }

    pub fn clear_feedback(&mut self, now: Duration) {
        self.middle.set("", now, self.transition);
    }

    pub fn reveal_exit(&mut self) {
        self.exit_visible = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_flash_then_clear() {
        let mut hud = Hud::default();
        hud.flash(CORRECT_TEXT, ms(0));
        assert_eq!(hud.middle().text(), "Correct!");

        hud.clear_feedback(ms(500));
        assert_eq!(hud.middle().text(), "");
        assert_eq!(hud.middle().transition().unwrap().from, "Correct!");
        assert_eq!(hud.middle().revision(), 2);
    }

    #[test]
    fn test_transition_progress_eases() {
        let mut hud = Hud::default();
        hud.show_target("Candles", ms(1000));
        let top = hud.top();

        assert_eq!(top.progress(ms(1000)), 0.0);
        assert!((top.progress(ms(1250)) - 0.5).abs() < 1e-6);
        assert!(top.progress(ms(1100)) < 0.2);
        assert_eq!(top.progress(ms(1500)), 1.0);
        assert!(top.transition().unwrap().is_finished(ms(1600)));
    }

    #[test]
    fn test_completion_reveals_nothing_by_itself() {
        let mut hud = Hud::default();
        hud.show_completion(ms(0));
        assert_eq!(hud.top().text(), COMPLETE_TEXT);
        assert!(!hud.exit_visible());

        hud.reveal_exit();
        assert!(hud.exit_visible());
    }

    #[test]
    fn test_zero_duration_transition_is_complete() {
        let mut hud = Hud::new(Duration::ZERO);
        hud.flash(RETRY_TEXT, ms(10));
        assert_eq!(hud.middle().progress(ms(10)), 1.0);
    }
}
