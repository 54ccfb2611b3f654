use crate::case::case_model::Step;
use crate::case::store::TestCaseStore;
use crate::error::{ReplayError, Result};

/// A test case being edited: its name, its steps and the step under edit.
///
/// Reordering is purely a draft operation; the store only ever sees the
/// final ordered list through [`CaseDraft::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseDraft {
    pub name: String,
    pub steps: Vec<Step>,
    editing: Option<usize>,
}

impl CaseDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            editing: None,
        }
    }

    /// Start a draft from a stored case.
    pub fn load(store: &TestCaseStore, name: &str) -> Result<Self> {
        let steps = store.steps(name)?.to_vec();
        Ok(Self {
            name: name.to_string(),
            steps,
            editing: None,
        })
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn insert(&mut self, at: usize, step: Step) -> Result<()> {
        if at > self.steps.len() {
            return Err(self.out_of_range(at));
        }
        self.steps.insert(at, step);
        Ok(())
    }

    /// Put the cursor on a step so the next [`save_edit`](Self::save_edit) replaces it.
    pub fn begin_edit(&mut self, index: usize) -> Result<&Step> {
        if index >= self.steps.len() {
            return Err(self.out_of_range(index));
        }
        self.editing = Some(index);
        Ok(&self.steps[index])
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Replace the step under the cursor. Without a cursor the step is appended.
    pub fn save_edit(&mut self, step: Step) -> Result<()> {
        match self.editing.take() {
            Some(index) => self.replace(index, step),
            None => {
                self.push(step);
                Ok(())
            }
        }
    }

    pub fn replace(&mut self, index: usize, step: Step) -> Result<()> {
        let len = self.steps.len();
        let slot = self
            .steps
            .get_mut(index)
            .ok_or(ReplayError::StepOutOfRange { index, len })?;
        *slot = step;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Step> {
        if index >= self.steps.len() {
            return Err(self.out_of_range(index));
        }
        // The cursor would point at a different step after the shift
        self.editing = None;
        Ok(self.steps.remove(index))
    }

    /// Swap the step with its predecessor. No-op for the first step.
    pub fn move_up(&mut self, index: usize) -> Result<()> {
        if index >= self.steps.len() {
            return Err(self.out_of_range(index));
        }
        if index > 0 {
            self.steps.swap(index, index - 1);
        }
        Ok(())
    }

    /// Swap the step with its successor. No-op for the last step.
    pub fn move_down(&mut self, index: usize) -> Result<()> {
        if index >= self.steps.len() {
            return Err(self.out_of_range(index));
        }
        if index + 1 < self.steps.len() {
            self.steps.swap(index, index + 1);
        }
        Ok(())
    }

    /// Persist the draft, creating or replacing the named case.
    pub fn commit(&self, store: &mut TestCaseStore) -> Result<()> {
        store.upsert(&self.name, self.steps.clone())
    }

    fn out_of_range(&self, index: usize) -> ReplayError {
        ReplayError::StepOutOfRange {
            index,
            len: self.steps.len(),
        }
    }
}
