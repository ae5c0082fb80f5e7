//! Work units and result assembly shared by both workers.

use crate::core::hasher::{group_duplicates, CompareEntry, ComparisonMap, Fingerprint, list_folder_files};
use crate::core::operation::{OperationKind, OperationKindTag, OperationRequest, OperationResult};
use crate::core::scanner::FileDescriptor;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One independently schedulable piece of an operation
#[derive(Debug, Clone)]
pub(crate) enum WorkUnit {
    Single(FileDescriptor),
    /// A source file and the same-named file in the external folder
    Pair {
        name: String,
        source: FileDescriptor,
        external: FileDescriptor,
    },
}

impl WorkUnit {
    pub fn file_count(&self) -> usize {
        match self {
            WorkUnit::Single(_) => 1,
            WorkUnit::Pair { .. } => 2,
        }
    }

    pub fn bytes(&self) -> u64 {
        match self {
            WorkUnit::Single(file) => file.size,
            WorkUnit::Pair { source, external, .. } => source.size.saturating_add(external.size),
        }
    }
}

/// What a successful unit produced
#[derive(Debug, Clone)]
pub(crate) enum UnitOutput {
    Single { path: PathBuf, hash: Fingerprint },
    Pair { name: String, entry: CompareEntry },
}

/// Why a unit produced nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskError {
    Cancelled,
    Failed(String),
}

/// Split a request into work units.
///
/// For a comparison, source files are matched by file name against the top
/// level of the external folder; files without a counterpart are left out.
/// Results are keyed by name, so when two source files share a name only
/// the first in submission order is compared.
/// Problems found while planning are returned as messages.
pub(crate) fn plan_units(request: &OperationRequest) -> (Vec<WorkUnit>, Vec<String>) {
    let OperationKind::Compare { external_folder } = &request.kind else {
        let units = request.files.iter().cloned().map(WorkUnit::Single).collect();
        return (units, Vec::new());
    };

    let external = match list_folder_files(external_folder) {
        Ok(files) => files,
        Err(e) => return (Vec::new(), vec![e.to_string()]),
    };

    let mut units = Vec::new();
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for source in &request.files {
        let name = source.display_name();
        let Some(external_path) = external.get(&name) else {
            debug!(file = %name, "No counterpart in external folder");
            continue;
        };
        if !seen.insert(name.clone()) {
            warn!(path = %source.path.display(), "Another source file with this name is already compared");
            errors.push(format!(
                "{}: another file named {name} was already submitted",
                source.path.display()
            ));
            continue;
        }
        match FileDescriptor::snapshot(external_path) {
            Ok(external) => units.push(WorkUnit::Pair {
                name,
                source: source.clone(),
                external,
            }),
            Err(e) => errors.push(e.to_string()),
        }
    }
    (units, errors)
}

/// Run one unit, hashing each of its files with `hash_one`.
///
/// Both sides of a pair are attempted even if the first fails, so every
/// file is accounted for; only cancellation stops early.
pub(crate) fn run_unit<F>(unit: &WorkUnit, mut hash_one: F) -> Result<UnitOutput, TaskError>
where
    F: FnMut(&FileDescriptor) -> Result<Fingerprint, TaskError>,
{
    match unit {
        WorkUnit::Single(file) => Ok(UnitOutput::Single {
            path: file.path.clone(),
            hash: hash_one(file)?,
        }),
        WorkUnit::Pair {
            name,
            source,
            external,
        } => {
            let hash_a = hash_one(source);
            if hash_a == Err(TaskError::Cancelled) {
                return Err(TaskError::Cancelled);
            }
            let hash_b = hash_one(external);
            Ok(UnitOutput::Pair {
                name: name.clone(),
                entry: CompareEntry::new(hash_a?, hash_b?),
            })
        }
    }
}

/// Collects unit outputs into the operation's result map
pub(crate) struct ResultBuilder {
    kind: OperationKindTag,
    hashed: Vec<(PathBuf, Fingerprint)>,
    compared: ComparisonMap,
}

impl ResultBuilder {
    pub fn new(kind: OperationKindTag) -> Self {
        Self {
            kind,
            hashed: Vec::new(),
            compared: ComparisonMap::new(),
        }
    }

    pub fn push(&mut self, output: UnitOutput) {
        match output {
            UnitOutput::Single { path, hash } => self.hashed.push((path, hash)),
            UnitOutput::Pair { name, entry } => {
                self.compared.insert(name, entry);
            }
        }
    }

    pub fn build(self) -> OperationResult {
        match self.kind {
            OperationKindTag::Duplicates => OperationResult::Duplicates(group_duplicates(self.hashed)),
            OperationKindTag::Checksum => OperationResult::Checksum(self.hashed.into_iter().collect()),
            OperationKindTag::Compare => OperationResult::Compare(self.compared),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot(dir: &TempDir, name: &str, content: &[u8]) -> FileDescriptor {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        FileDescriptor::snapshot(&path).unwrap()
    }

    #[test]
    fn compare_plan_pairs_by_name() {
        let source = TempDir::new().unwrap();
        let mirror = TempDir::new().unwrap();
        let a = snapshot(&source, "a.txt", b"one");
        let b = snapshot(&source, "b.txt", b"two");
        snapshot(&mirror, "a.txt", b"one, longer");

        let request = OperationRequest::compare(vec![a, b], mirror.path().to_path_buf());
        let (units, errors) = plan_units(&request);

        assert!(errors.is_empty());
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].file_count(), 2);
        assert_eq!(units[0].bytes(), 3 + 11);
    }

    #[test]
    fn compare_plan_keeps_first_of_same_named_sources() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let mirror = TempDir::new().unwrap();
        let a1 = snapshot(&first, "a.txt", b"same");
        let a2 = snapshot(&second, "a.txt", b"different");
        snapshot(&mirror, "a.txt", b"same");

        let request = OperationRequest::compare(vec![a1.clone(), a2], mirror.path().to_path_buf());
        let (units, errors) = plan_units(&request);

        assert_eq!(units.len(), 1);
        assert!(matches!(&units[0], WorkUnit::Pair { source, .. } if source.path == a1.path));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("a.txt"));
    }

    #[test]
    fn compare_plan_reports_missing_folder() {
        let source = TempDir::new().unwrap();
        let a = snapshot(&source, "a.txt", b"one");

        let request = OperationRequest::compare(vec![a], PathBuf::from("/no/such/mirror"));
        let (units, errors) = plan_units(&request);

        assert!(units.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn pair_attempts_both_sides() {
        let source = TempDir::new().unwrap();
        let unit = WorkUnit::Pair {
            name: "x".into(),
            source: snapshot(&source, "x1", b"1"),
            external: snapshot(&source, "x2", b"2"),
        };
        let mut attempts = 0;

        let result = run_unit(&unit, |_| {
            attempts += 1;
            Err(TaskError::Failed("boom".into()))
        });

        assert_eq!(result.unwrap_err(), TaskError::Failed("boom".into()));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn pair_stops_on_cancel() {
        let source = TempDir::new().unwrap();
        let unit = WorkUnit::Pair {
            name: "x".into(),
            source: snapshot(&source, "x1", b"1"),
            external: snapshot(&source, "x2", b"2"),
        };
        let mut attempts = 0;

        let result = run_unit(&unit, |_| {
            attempts += 1;
            Err(TaskError::Cancelled)
        });

        assert_eq!(result.unwrap_err(), TaskError::Cancelled);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn checksum_builder_keeps_every_file() {
        let mut builder = ResultBuilder::new(OperationKindTag::Checksum);
        builder.push(UnitOutput::Single {
            path: PathBuf::from("/a"),
            hash: Fingerprint::from_value(1),
        });
        builder.push(UnitOutput::Single {
            path: PathBuf::from("/b"),
            hash: Fingerprint::from_value(1),
        });

        assert_eq!(builder.build().len(), 2);
    }
}
