use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0.round() as i64)
    }
}

impl Percentage {
    /// Progress as used by the ui, always inside 0..=100.
    pub fn from_progress(progress: f32) -> Percentage {
        Percentage((progress.clamp(0., 1.) as f64) * 100.)
    }
}

/// Share of the goal reached by `steps`. A zero goal means no progress can be made.
pub fn goal_progress(steps: u64, goal: u64) -> f32 {
    if goal == 0 {
        return 0.;
    }
    (steps as f64 / goal as f64).clamp(0., 1.) as f32
}

#[cfg(test)]
mod tests {
    use super::{goal_progress, Percentage};

    #[test]
    fn test_goal_progress() {
        assert_eq!(goal_progress(45, 100), 0.45);
        assert_eq!(goal_progress(250, 100), 1.);
        assert_eq!(goal_progress(10, 0), 0.);
    }

    #[test]
    fn test_percentage_display() {
        assert_eq!(Percentage::from_progress(0.45).to_string(), "45%");
        assert_eq!(Percentage::from_progress(3.).to_string(), "100%");
        assert_eq!(Percentage::from_progress(-0.2).to_string(), "0%");
    }
}
