//! In-memory fakes of the filesystem and synchronizer for unit tests

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};

use crate::backup::rsync::{SyncInvocation, Synchronizer};
use crate::error::{HardsnapError, HardsnapResult};
use crate::models::Location;
use crate::storage::{Access, Filesystem};

fn key(location: &Location) -> String {
    match location.host() {
        Some(host) => format!("{}:{}", host, location.normalized_path()),
        None => location.normalized_path(),
    }
}

fn simulated_failure(operation: &str, target: &str) -> HardsnapError {
    HardsnapError::Command {
        command: format!("{} {}", operation, target),
        status: 1,
        output: vec![format!("{}: simulated failure", operation)],
    }
}

/// Tree of entries (directories and files alike) keyed by `[host:]path`
#[derive(Debug, Default)]
pub struct FakeFilesystem {
    entries: RefCell<BTreeSet<String>>,
    failing: RefCell<HashSet<&'static str>>,
    operations: RefCell<Vec<String>>,
}

impl FakeFilesystem {
    pub fn with_entries(entries: &[&str]) -> Self {
        let fs = Self::default();
        for entry in entries {
            fs.insert(entry);
        }
        fs
    }

    /// Add an entry and all of its ancestors
    pub fn insert(&self, spec: &str) {
        let location = Location::parse(spec);
        let mut current = location.clone();
        let mut entries = self.entries.borrow_mut();
        loop {
            let k = key(&current);
            if k == "/" || k == "." || k.ends_with(":/") || !entries.insert(k) {
                break;
            }
            current = current.parent();
        }
    }

    pub fn contains(&self, spec: &str) -> bool {
        self.entries.borrow().contains(&key(&Location::parse(spec)))
    }

    /// Make every later call of `operation` fail
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.borrow_mut().insert(operation);
    }

    /// Log of mutating operations, e.g. `remove_dir /store/x`
    pub fn operations(&self) -> Vec<String> {
        self.operations.borrow().clone()
    }

    /// All entries, sorted
    pub fn snapshot(&self) -> Vec<String> {
        self.entries.borrow().iter().cloned().collect()
    }

    /// Entries whose path contains `needle`
    pub fn entries_matching(&self, needle: &str) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.contains(needle))
            .cloned()
            .collect()
    }

    /// Paths below `location`, relative to it, excluding `location` itself
    pub fn relative_subtree(&self, location: &Location) -> Vec<String> {
        let prefix = format!("{}/", key(location));
        self.entries
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// Replace everything at and below `location` with `relatives`
    pub fn replace_subtree(&self, location: &Location, relatives: &[String]) {
        self.remove_subtree(&key(location));
        self.insert(&location.to_string());
        for relative in relatives {
            self.insert(&location.join(relative).to_string());
        }
    }

    fn remove_subtree(&self, root: &str) {
        let prefix = format!("{}/", root);
        self.entries
            .borrow_mut()
            .retain(|e| e != root && !e.starts_with(&prefix));
    }

    fn record(&self, operation: &str, target: String) -> HardsnapResult<()> {
        self.operations
            .borrow_mut()
            .push(format!("{} {}", operation, target));
        if self.failing.borrow().contains(operation) {
            return Err(simulated_failure(operation, &target));
        }
        Ok(())
    }
}

impl Filesystem for FakeFilesystem {
    fn check_dir(&self, location: &Location, _access: Access) -> HardsnapResult<bool> {
        Ok(self.entries.borrow().contains(&key(location)))
    }

    fn exists(&self, location: &Location) -> HardsnapResult<bool> {
        Ok(self.entries.borrow().contains(&key(location)))
    }

    fn list_dirs(&self, location: &Location) -> HardsnapResult<Vec<String>> {
        self.record("list_dirs", location.to_string())?;
        if !self.exists(location)? {
            return Err(simulated_failure("list_dirs", &location.to_string()));
        }
        Ok(self
            .relative_subtree(location)
            .into_iter()
            .filter(|relative| !relative.contains('/'))
            .collect())
    }

    fn remove_dir(&self, location: &Location) -> HardsnapResult<()> {
        self.record("remove_dir", location.to_string())?;
        self.remove_subtree(&key(location));
        Ok(())
    }

    fn move_dir(&self, from: &Location, to: &Location) -> HardsnapResult<()> {
        self.record("move_dir", format!("{} {}", from, to))?;
        if !self.exists(from)? {
            return Err(simulated_failure("move_dir", &from.to_string()));
        }
        let target = if self.exists(to)? {
            to.join(from.file_name())
        } else {
            to.clone()
        };
        let relatives = self.relative_subtree(from);
        self.remove_subtree(&key(from));
        self.replace_subtree(&target, &relatives);
        Ok(())
    }

    fn hardlink_clone(&self, from: &Location, to: &Location) -> HardsnapResult<()> {
        self.record("hardlink_clone", format!("{} {}", from, to))?;
        if !self.exists(from)? {
            return Err(simulated_failure("hardlink_clone", &from.to_string()));
        }
        let relatives = self.relative_subtree(from);
        self.replace_subtree(to, &relatives);
        Ok(())
    }
}

/// Synchronizer that mirrors sources into the destination of a [`FakeFilesystem`]
pub struct FakeSynchronizer<'a> {
    fs: &'a FakeFilesystem,
    invocations: RefCell<Vec<SyncInvocation>>,
    fail: Cell<bool>,
    dry_run_output: RefCell<Vec<String>>,
}

impl<'a> FakeSynchronizer<'a> {
    pub fn new(fs: &'a FakeFilesystem) -> Self {
        Self {
            fs,
            invocations: RefCell::new(Vec::new()),
            fail: Cell::new(false),
            dry_run_output: RefCell::new(Vec::new()),
        }
    }

    /// Fail every later run after writing a partial file into the destination
    pub fn fail(&self) {
        self.fail.set(true);
    }

    /// Output returned by dry runs
    pub fn set_dry_run_output(&self, lines: &[&str]) {
        *self.dry_run_output.borrow_mut() = lines.iter().map(|l| l.to_string()).collect();
    }

    pub fn invocations(&self) -> Vec<SyncInvocation> {
        self.invocations.borrow().clone()
    }
}

impl Synchronizer for FakeSynchronizer<'_> {
    fn synchronize(&self, invocation: &SyncInvocation) -> HardsnapResult<Vec<String>> {
        self.invocations.borrow_mut().push(invocation.clone());

        if self.fail.get() {
            self.fs
                .insert(&invocation.destination.join("partial-file").to_string());
            return Err(HardsnapError::Command {
                command: "rsync".into(),
                status: 23,
                output: vec!["rsync: simulated failure".into()],
            });
        }

        if invocation.options.dry_run {
            return Ok(self.dry_run_output.borrow().clone());
        }

        let mut relatives = Vec::new();
        for source in &invocation.sources {
            let subtree = self.fs.relative_subtree(&source.location);
            if source.contents_only {
                relatives.extend(subtree);
            } else {
                let name = source.location.file_name().to_string();
                relatives.push(name.clone());
                relatives.extend(subtree.into_iter().map(|r| format!("{}/{}", name, r)));
            }
        }
        self.fs.replace_subtree(&invocation.destination, &relatives);

        Ok(vec!["sent 42 bytes  received 7 bytes".to_string()])
    }
}
