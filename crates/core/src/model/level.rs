use crate::model::ids::{LevelId, ModuleId};
use crate::model::localized::LocalizedText;

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// A single lesson inside a level.
///
/// Content fields (title, lesson, image) always come from the curriculum
/// fixture; only `completed` is learner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    title: LocalizedText,
    lesson: LocalizedText,
    image: Option<String>,
    completed: bool,
}

impl Module {
    #[must_use]
    pub fn new(
        id: ModuleId,
        title: LocalizedText,
        lesson: LocalizedText,
        image: Option<String>,
    ) -> Self {
        Self {
            id,
            title,
            lesson,
            image: image.map(|i| i.trim().to_owned()).filter(|i| !i.is_empty()),
            completed: false,
        }
    }

    #[must_use]
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &LocalizedText {
        &self.title
    }

    #[must_use]
    pub fn lesson(&self) -> &LocalizedText {
        &self.lesson
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Key of this module's quiz in the quiz document.
    #[must_use]
    pub fn quiz_ref(&self) -> String {
        self.id.to_string()
    }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// An ordered step of a profession's learning path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    id: LevelId,
    name: LocalizedText,
    completed: bool,
    unlocked: bool,
    modules: Vec<Module>,
}

impl Level {
    #[must_use]
    pub fn new(id: LevelId, name: LocalizedText, modules: Vec<Module>) -> Self {
        Self {
            id,
            name,
            completed: false,
            unlocked: false,
            modules,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, completed: bool, unlocked: bool) -> Self {
        self.completed = completed;
        self.unlocked = unlocked;
        self
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LevelId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &LocalizedText {
        &self.name
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    #[must_use]
    pub fn completed_modules(&self) -> usize {
        self.modules.iter().filter(|m| m.is_completed()).count()
    }

    /// Whether every module is completed. Vacuously true for an empty level.
    #[must_use]
    pub fn all_modules_completed(&self) -> bool {
        self.modules.iter().all(Module::is_completed)
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id() == id)
    }

    pub(crate) fn modules_mut(&mut self) -> &mut [Module] {
        &mut self.modules
    }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    pub(crate) fn set_unlocked(&mut self, unlocked: bool) {
        self.unlocked = unlocked;
    }
}
