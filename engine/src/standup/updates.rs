//! One participant's status lists for a single standup

use std::fmt;

/// The three status categories a participant reports in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Done,
    Blocked,
    Goals,
}

impl Category {
    /// All categories in report order
    pub const ALL: [Category; 3] = [Category::Done, Category::Blocked, Category::Goals];

    /// Row label used in published reports
    pub fn label(self) -> &'static str {
        match self {
            Category::Done => "Done",
            Category::Blocked => "Blocked",
            Category::Goals => "Goals",
        }
    }
}

/// Entry counts per category, as shown in acknowledgements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub done: usize,
    pub blocked: usize,
    pub goals: usize,
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "done:{}, blocked:{}, goals:{}",
            self.done, self.blocked, self.goals
        )
    }
}

/// Ordered free-text entries for done, blocked and goals
///
/// The lists are private so every change goes through `push`, `clear` or
/// `clear_all` on the instance owned by the standup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Updates {
    done: Vec<String>,
    blocked: Vec<String>,
    goals: Vec<String>,
}

impl Updates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to one category
    pub fn push(&mut self, category: Category, entry: impl Into<String>) {
        self.list_mut(category).push(entry.into());
    }

    /// Empty one category, leaving the other two untouched
    pub fn clear(&mut self, category: Category) {
        self.list_mut(category).clear();
    }

    /// Empty all three categories
    pub fn clear_all(&mut self) {
        for category in Category::ALL {
            self.clear(category);
        }
    }

    pub fn entries(&self, category: Category) -> &[String] {
        match category {
            Category::Done => &self.done,
            Category::Blocked => &self.blocked,
            Category::Goals => &self.goals,
        }
    }

    pub fn counts(&self) -> Counts {
        Counts {
            done: self.done.len(),
            blocked: self.blocked.len(),
            goals: self.goals.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.entries(*c).is_empty())
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Done => &mut self.done,
            Category::Blocked => &mut self.blocked,
            Category::Goals => &mut self.goals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_counts() {
        let mut updates = Updates::new();
        updates.push(Category::Done, "wrote code");
        updates.push(Category::Goals, "ship it");
        updates.push(Category::Goals, "write docs");

        assert_eq!(
            updates.counts(),
            Counts {
                done: 1,
                blocked: 0,
                goals: 2
            }
        );
        assert_eq!(updates.counts().to_string(), "done:1, blocked:0, goals:2");
    }

    #[test]
    fn test_clear_single_category() {
        let mut updates = Updates::new();
        updates.push(Category::Done, "a");
        updates.push(Category::Blocked, "b");
        updates.clear(Category::Done);

        assert!(updates.entries(Category::Done).is_empty());
        assert_eq!(updates.entries(Category::Blocked), ["b".to_string()]);
    }

    #[test]
    fn test_clear_all() {
        let mut updates = Updates::new();
        for category in Category::ALL {
            updates.push(category, "x");
        }
        assert!(!updates.is_empty());
        updates.clear_all();
        assert!(updates.is_empty());
    }
}
