use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::case::case_model::{Step, TestCase};
use crate::error::{ReplayError, Result};

/// Named test cases persisted as a single JSON document.
///
/// Every mutating call rewrites the whole document. There is no locking; the
/// collection is only read or written between runs.
#[derive(Debug, Clone)]
pub struct TestCaseStore {
    path: PathBuf,
    cases: Vec<TestCase>,
}

impl TestCaseStore {
    /// Load the collection at `path`. A missing file is an empty collection.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cases = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        debug!("Loaded {} test cases from {}", cases.len(), path.display());
        Ok(Self { path, cases })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Case names in stored order.
    pub fn names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cases.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&TestCase> {
        self.cases
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ReplayError::CaseNotFound(name.to_string()))
    }

    /// Steps of the named case.
    pub fn steps(&self, name: &str) -> Result<&[Step]> {
        self.get(name).map(|c| c.steps.as_slice())
    }

    /// Add a new case. The name must not already exist.
    pub fn create(&mut self, name: &str, steps: Vec<Step>) -> Result<()> {
        if self.contains(name) {
            return Err(ReplayError::DuplicateCase(name.to_string()));
        }
        self.cases.push(TestCase::new(name, steps));
        self.save()?;
        info!("Created test case '{}'", name);
        Ok(())
    }

    /// Replace the steps of an existing case.
    pub fn update(&mut self, name: &str, steps: Vec<Step>) -> Result<()> {
        let case = self
            .cases
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ReplayError::CaseNotFound(name.to_string()))?;
        case.steps = steps;
        self.save()?;
        info!("Updated test case '{}'", name);
        Ok(())
    }

    /// Update the case if it exists, otherwise create it.
    pub fn upsert(&mut self, name: &str, steps: Vec<Step>) -> Result<()> {
        if self.contains(name) {
            self.update(name, steps)
        } else {
            self.create(name, steps)
        }
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let before = self.cases.len();
        self.cases.retain(|c| c.name != name);
        if self.cases.len() == before {
            return Err(ReplayError::CaseNotFound(name.to_string()));
        }
        self.save()?;
        info!("Deleted test case '{}'", name);
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.cases)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
