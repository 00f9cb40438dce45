use std::{fmt::Display, ops::Deref};

/// Share of the study goal that has been reached, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct GoalProgress(f64);

impl Display for GoalProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.)
    }
}

impl GoalProgress {
    /// Builds progress out of `done / goal`, saturating at 1. `goal` has to be positive.
    pub fn new_opt(done: u64, goal: u64) -> Option<GoalProgress> {
        if goal == 0 {
            None
        } else {
            Some(GoalProgress(f64::min(1., done as f64 / goal as f64)))
        }
    }

    pub fn is_complete(&self) -> bool {
        self.0 >= 1.
    }

    /// Renders the progress as a bar of `width` cells.
    pub fn bar(&self, width: usize) -> String {
        let filled = ((self.0 * width as f64).floor() as usize).min(width);
        format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
    }
}

impl Deref for GoalProgress {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::GoalProgress;

    #[test]
    fn progress_is_clamped() {
        assert_eq!(*GoalProgress::new_opt(50, 100).unwrap(), 0.5);
        assert_eq!(*GoalProgress::new_opt(500, 100).unwrap(), 1.);
        assert!(GoalProgress::new_opt(500, 100).unwrap().is_complete());
        assert!(GoalProgress::new_opt(1, 0).is_none());
    }

    #[test]
    fn progress_display() {
        let progress = GoalProgress::new_opt(1, 4).unwrap();
        assert_eq!(progress.to_string(), "25.0%");
        assert_eq!(progress.bar(8), "##------");
    }
}
