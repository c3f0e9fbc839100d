//! Merge, unlock derivation and module completion for a learning path.

use crate::error::ProgressError;
use crate::model::{Level, LevelId, ModuleId, ProgressSnapshot};
use crate::profession::ProfessionKey;

/// Overlay saved completion state onto the fixture's levels.
///
/// The fixture drives the result: its length, order and content are kept,
/// snapshot-only levels and modules are ignored. For a matching level the
/// saved `completed` is OR-ed with the fixture's, the saved `unlocked` wins
/// when present, and each matching module takes its saved `completed`.
#[must_use]
pub fn merge(fixture: &[Level], snapshot: Option<&ProgressSnapshot>) -> Vec<Level> {
    let Some(snapshot) = snapshot else {
        return fixture.to_vec();
    };

    fixture
        .iter()
        .map(|level| {
            let mut merged = level.clone();
            let Some(saved) = snapshot.level(level.id()) else {
                return merged;
            };

            merged.set_completed(saved.completed || level.is_completed());
            merged.set_unlocked(saved.unlocked.unwrap_or(level.is_unlocked()));
            for module in merged.modules_mut() {
                if let Some(saved_module) = saved.module(module.id()) {
                    module.set_completed(saved_module.completed);
                }
            }
            merged
        })
        .collect()
}

/// Recompute `unlocked`: the first level is always open, every other level
/// opens exactly when its predecessor is completed.
#[must_use]
pub fn derive_unlocks(mut levels: Vec<Level>) -> Vec<Level> {
    apply_unlocks(&mut levels);
    levels
}

fn apply_unlocks(levels: &mut [Level]) {
    let mut previous_completed = true;
    for level in levels.iter_mut() {
        level.set_unlocked(previous_completed);
        previous_completed = level.is_completed();
    }
}

/// Result of completing a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCompletion {
    pub levels: Vec<Level>,
    /// The target level went from incomplete to complete with this call.
    pub leveled_up: bool,
}

/// Mark `module_id` of `level_id` completed and re-derive unlocks.
///
/// Completing an already completed module changes nothing and never reports
/// a level-up.
///
/// # Errors
///
/// Returns `ProgressError` if the level or module does not exist, or the
/// level is still locked.
pub fn complete_module(
    levels: &[Level],
    level_id: LevelId,
    module_id: ModuleId,
) -> Result<ModuleCompletion, ProgressError> {
    let mut levels = levels.to_vec();
    let leveled_up = complete_in_place(&mut levels, level_id, module_id)?;
    Ok(ModuleCompletion { levels, leveled_up })
}

fn complete_in_place(
    levels: &mut [Level],
    level_id: LevelId,
    module_id: ModuleId,
) -> Result<bool, ProgressError> {
    let level = levels
        .iter_mut()
        .find(|l| l.id() == level_id)
        .ok_or(ProgressError::UnknownLevel(level_id))?;
    if !level.is_unlocked() {
        return Err(ProgressError::LevelLocked(level_id));
    }

    level
        .module_mut(module_id)
        .ok_or(ProgressError::UnknownModule {
            level: level_id,
            module: module_id,
        })?
        .set_completed(true);

    let was_completed = level.is_completed();
    let now_completed = level.all_modules_completed();
    level.set_completed(now_completed);

    apply_unlocks(levels);
    Ok(now_completed && !was_completed)
}

/// A profession's working level list: fixture merged with saved progress.
///
/// Rebuilt from scratch on every load; the snapshot is the durable part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearningPath {
    profession: ProfessionKey,
    levels: Vec<Level>,
}

impl LearningPath {
    #[must_use]
    pub fn new(
        profession: ProfessionKey,
        fixture: &[Level],
        snapshot: Option<&ProgressSnapshot>,
    ) -> Self {
        Self {
            profession,
            levels: derive_unlocks(merge(fixture, snapshot)),
        }
    }

    #[must_use]
    pub fn profession(&self) -> &ProfessionKey {
        &self.profession
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    #[must_use]
    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.iter().find(|l| l.id() == id)
    }

    /// First level that is open but not finished.
    #[must_use]
    pub fn current_level(&self) -> Option<&Level> {
        self.levels
            .iter()
            .find(|l| l.is_unlocked() && !l.is_completed())
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::from_levels(&self.levels)
    }

    /// In-place form of [`complete_module`]; returns the level-up flag.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` for unknown ids or a locked level. The path is
    /// left untouched in that case.
    pub fn complete_module(
        &mut self,
        level_id: LevelId,
        module_id: ModuleId,
    ) -> Result<bool, ProgressError> {
        complete_in_place(&mut self.levels, level_id, module_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LevelSnapshot, LocalizedText, Module, ModuleSnapshot};

    fn module(id: u32) -> Module {
        Module::new(
            ModuleId::new(id),
            LocalizedText::new(format!("মডিউল {id}"), format!("Module {id}")),
            LocalizedText::new("পাঠ", format!("Lesson {id}")),
            None,
        )
    }

    fn level(id: u32, modules: &[u32], unlocked: bool) -> Level {
        Level::new(
            LevelId::new(id),
            LocalizedText::new("", format!("Level {id}")),
            modules.iter().copied().map(module).collect(),
        )
        .with_flags(false, unlocked)
    }

    /// L1 (open, modules 1 and 2), L2 and L3 locked.
    fn three_levels() -> Vec<Level> {
        vec![level(1, &[1, 2], true), level(2, &[3], false), level(3, &[4], false)]
    }

    fn assert_linear(levels: &[Level]) {
        for (i, level) in levels.iter().enumerate() {
            let expected = i == 0 || levels[i - 1].is_completed();
            assert_eq!(level.is_unlocked(), expected, "level index {i}");
        }
    }

    #[test]
    fn derive_unlocks_is_linear() {
        let mut levels = three_levels();
        levels[0].set_completed(true);
        levels[1].set_unlocked(false);
        levels[2].set_unlocked(true);
        let levels = derive_unlocks(levels);
        assert_linear(&levels);
        assert!(levels[1].is_unlocked());
        assert!(!levels[2].is_unlocked());
    }

    #[test]
    fn derive_unlocks_opens_first_level_and_accepts_empty() {
        let levels = derive_unlocks(vec![level(1, &[1], false)]);
        assert!(levels[0].is_unlocked());
        assert!(derive_unlocks(Vec::new()).is_empty());
    }

    #[test]
    fn completing_levels_step_by_step() {
        let levels = derive_unlocks(three_levels());

        let first = complete_module(&levels, LevelId::new(1), ModuleId::new(1)).unwrap();
        assert!(!first.leveled_up);
        assert!(!first.levels[0].is_completed());
        assert!(!first.levels[1].is_unlocked());

        let second = complete_module(&first.levels, LevelId::new(1), ModuleId::new(2)).unwrap();
        assert!(second.leveled_up);
        assert!(second.levels[0].is_completed());
        assert!(second.levels[1].is_unlocked());
        assert!(!second.levels[2].is_unlocked());
        assert_linear(&second.levels);
    }

    #[test]
    fn completing_twice_is_idempotent() {
        let levels = derive_unlocks(vec![level(1, &[1], true), level(2, &[2], false)]);
        let once = complete_module(&levels, LevelId::new(1), ModuleId::new(1)).unwrap();
        assert!(once.leveled_up);
        let twice = complete_module(&once.levels, LevelId::new(1), ModuleId::new(1)).unwrap();
        assert!(!twice.leveled_up);
        assert_eq!(
            ProgressSnapshot::from_levels(&once.levels),
            ProgressSnapshot::from_levels(&twice.levels)
        );
    }

    #[test]
    fn rejects_unknown_ids_and_locked_levels() {
        let levels = derive_unlocks(three_levels());
        assert_eq!(
            complete_module(&levels, LevelId::new(9), ModuleId::new(1)).unwrap_err(),
            ProgressError::UnknownLevel(LevelId::new(9))
        );
        assert_eq!(
            complete_module(&levels, LevelId::new(1), ModuleId::new(9)).unwrap_err(),
            ProgressError::UnknownModule {
                level: LevelId::new(1),
                module: ModuleId::new(9)
            }
        );
        assert_eq!(
            complete_module(&levels, LevelId::new(2), ModuleId::new(3)).unwrap_err(),
            ProgressError::LevelLocked(LevelId::new(2))
        );
    }

    #[test]
    fn merge_keeps_fixture_structure_and_content() {
        let fixture = three_levels();
        let snapshot = ProgressSnapshot {
            levels: vec![
                LevelSnapshot {
                    id: LevelId::new(1),
                    completed: true,
                    unlocked: Some(true),
                    modules: vec![
                        ModuleSnapshot { id: ModuleId::new(1), completed: true },
                        ModuleSnapshot { id: ModuleId::new(2), completed: true },
                        ModuleSnapshot { id: ModuleId::new(99), completed: true },
                    ],
                },
                LevelSnapshot {
                    id: LevelId::new(42),
                    completed: true,
                    unlocked: None,
                    modules: Vec::new(),
                },
            ],
        };

        let merged = merge(&fixture, Some(&snapshot));
        assert_eq!(merged.len(), fixture.len());
        assert!(merged[0].is_completed());
        assert_eq!(merged[0].modules().len(), 2);
        assert!(merged[0].modules().iter().all(Module::is_completed));
        for (m, f) in merged.iter().zip(&fixture) {
            assert_eq!(m.id(), f.id());
            assert_eq!(m.name(), f.name());
            for (mm, fm) in m.modules().iter().zip(f.modules()) {
                assert_eq!(mm.title(), fm.title());
                assert_eq!(mm.lesson(), fm.lesson());
            }
        }
    }

    #[test]
    fn merge_falls_back_to_fixture_unlocked_when_absent() {
        let fixture = vec![level(1, &[1], true), level(2, &[2], true)];
        let snapshot = ProgressSnapshot {
            levels: vec![LevelSnapshot {
                id: LevelId::new(2),
                completed: false,
                unlocked: None,
                modules: Vec::new(),
            }],
        };
        let merged = merge(&fixture, Some(&snapshot));
        assert!(merged[1].is_unlocked());
    }

    #[test]
    fn merge_without_snapshot_reproduces_fixture() {
        let fixture = three_levels();
        assert_eq!(merge(&fixture, None), fixture);
    }

    #[test]
    fn learning_path_tracks_current_level_and_snapshot() {
        let mut path = LearningPath::new(ProfessionKey::normalize("Plumber"), &three_levels(), None);
        assert_eq!(path.current_level().map(Level::id), Some(LevelId::new(1)));

        path.complete_module(LevelId::new(1), ModuleId::new(1)).unwrap();
        assert!(path.complete_module(LevelId::new(1), ModuleId::new(2)).unwrap());
        assert_eq!(path.current_level().map(Level::id), Some(LevelId::new(2)));

        let restored = LearningPath::new(
            path.profession().clone(),
            &three_levels(),
            Some(&path.snapshot()),
        );
        assert_eq!(restored, path);
    }
}
