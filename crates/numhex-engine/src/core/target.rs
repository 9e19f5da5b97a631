use serde::{Deserialize, Serialize};

/// A value the player must produce with a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    value: u32,
    completed: bool,
}

impl Target {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self {
            value,
            completed: false,
        }
    }

    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }
}

/// Ordered targets of a level.
///
/// A target, once completed, stays completed until the level is replaced.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTargets {
    targets: Vec<Target>,
}

impl LevelTargets {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            targets: values.into_iter().map(Target::new).collect(),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.targets.iter().map(Target::value)
    }

    /// Returns the index of the first incomplete target equal to `value`.
    ///
    /// Completed targets never match, so the same value cannot be scored twice.
    #[must_use]
    pub fn find_incomplete(&self, value: i64) -> Option<usize> {
        self.targets
            .iter()
            .position(|t| !t.completed && i64::from(t.value) == value)
    }

    /// Marks the target at `index` as completed.
    ///
    /// Returns `false` if the index is out of range or the target was already completed.
    pub fn complete(&mut self, index: usize) -> bool {
        match self.targets.get_mut(index) {
            Some(target) if !target.completed => {
                target.completed = true;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.targets.iter().filter(|t| t.completed).count()
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.targets.is_empty() && self.targets.iter().all(|t| t.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_target_never_matches_again() {
        let mut targets = LevelTargets::new([12, 7]);
        let index = targets.find_incomplete(7).unwrap();
        assert!(targets.complete(index));
        assert_eq!(targets.find_incomplete(7), None);
        assert!(!targets.complete(index));
        assert_eq!(targets.completed_count(), 1);
    }

    #[test]
    fn test_all_completed() {
        let mut targets = LevelTargets::new([1, 2]);
        assert!(!targets.all_completed());
        targets.complete(0);
        targets.complete(1);
        assert!(targets.all_completed());
        assert!(!LevelTargets::default().all_completed());
    }

    #[test]
    fn test_negative_values_never_match() {
        let targets = LevelTargets::new([3]);
        assert_eq!(targets.find_incomplete(-3), None);
    }

    #[test]
    fn test_serialization_is_a_plain_list() {
        let mut targets = LevelTargets::new([4]);
        targets.complete(0);
        assert_eq!(
            serde_json::to_string(&targets).unwrap(),
            r#"[{"value":4,"completed":true}]"#
        );
    }
}
