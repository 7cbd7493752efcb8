use crate::model::ids::LessonId;

/// One lesson as it appears in the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    id: LessonId,
    title: String,
    subtitle: String,
    order: u32,
    completed: bool,
    difficulty: String,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        order: u32,
        completed: bool,
        difficulty: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            subtitle: subtitle.into(),
            order,
            completed,
            difficulty: difficulty.into(),
        }
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Free-form difficulty label ("beginner", "intermediate", ...).
    #[must_use]
    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }
}

/// One row of the navigation menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    entry: CatalogEntry,
    current: bool,
}

impl NavigationItem {
    #[must_use]
    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    /// Whether this row is the lesson the session is driving.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current
    }
}

/// The navigation menu model: catalog entries sorted by lesson order with
/// the current lesson highlighted. Rebuilt wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationView {
    items: Vec<NavigationItem>,
}

impl NavigationView {
    #[must_use]
    pub fn build(mut entries: Vec<CatalogEntry>, current: &LessonId) -> Self {
        entries.sort_by_key(CatalogEntry::order);
        let items = entries
            .into_iter()
            .map(|entry| {
                let is_current = entry.id() == current;
                NavigationItem {
                    entry,
                    current: is_current,
                }
            })
            .collect();
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[NavigationItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Where the "next lesson" affordance should take the user once the lesson
/// is complete. Exactly one of the three outcomes applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLessonTarget {
    /// Every lesson in the catalog is complete.
    Home,
    /// The server reported a follow-up lesson.
    Lesson(LessonId),
    /// Remaining lessons exist but none was reported as next.
    LessonList,
}

impl NextLessonTarget {
    /// Cross-reference catalog completion flags against the server-reported
    /// next lesson.
    #[must_use]
    pub fn resolve(catalog: &[CatalogEntry], reported_next: Option<LessonId>) -> Self {
        if !catalog.is_empty() && catalog.iter().all(CatalogEntry::completed) {
            return Self::Home;
        }
        match reported_next {
            Some(id) => Self::Lesson(id),
            None => Self::LessonList,
        }
    }

    /// User-facing label for the affordance.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "All Lessons Complete - Return Home",
            Self::Lesson(_) => "Next Lesson",
            Self::LessonList => "View Incomplete Lessons",
        }
    }
}
