use std::path::{Path, PathBuf};

use super::AllState;

/// Live status of a desired breakpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BreakStatus {
    /// Not sent to the backend yet.
    #[default]
    Pending,

    /// Installed in the backend.
    Installed,

    /// Sent to the backend, which did not install it (e.g., unreachable
    /// code).
    Unresolved,

    /// Turned off by the user.
    Disabled,
}

/// A breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Break {
    /// ID assigned by the backend, if installed.
    pub id: Option<i64>,

    /// Full path of the source file.
    pub fpath: PathBuf,

    /// Source file, relative to the project root when possible.
    pub file: String,

    /// Source line.
    pub line: u32,

    /// Function containing the breakpoint, as reported by the backend.
    pub func: Option<String>,

    /// Whether the breakpoint is enabled.
    pub on: bool,

    /// Condition expression; the breakpoint only stops when it holds.
    pub cond: String,

    /// Whether the breakpoint is a tracepoint (reports and keeps running).
    pub trace: bool,

    /// Number of times the breakpoint was hit.
    pub hits: u64,

    /// Live status (desired breakpoints only).
    pub status: BreakStatus,

    /// Whether this breakpoint was sent to the backend since it was last
    /// edited.
    pub submitted: bool,
}

impl Break {
    /// Creates an enabled breakpoint at the given location.
    pub fn new(fpath: impl Into<PathBuf>, line: u32) -> Self {
        let fpath = fpath.into();
        let file = fpath.to_string_lossy().into_owned();

        Self {
            id: None,
            fpath,
            file,
            line,
            func: None,
            on: true,
            cond: String::new(),
            trace: false,
            hits: 0,
            status: BreakStatus::Pending,
            submitted: false,
        }
    }

    /// Returns whether this breakpoint sits at the given location.
    ///
    /// Paths match when they are equal or when one is a (component-wise)
    /// suffix of the other, so `main.go` matches `/src/app/main.go`.
    pub fn is_at(&self, fpath: &Path, line: u32) -> bool {
        self.line == line && paths_match(&self.fpath, fpath)
    }

    /// Returns whether both breakpoints sit at the same location.
    pub fn same_location(&self, other: &Break) -> bool {
        self.is_at(&other.fpath, other.line)
    }

    fn forget_live_status(&mut self) {
        self.id = None;
        self.hits = 0;
        self.submitted = false;
        self.status = if self.on {
            BreakStatus::Pending
        } else {
            BreakStatus::Disabled
        };
    }
}

fn paths_match(a: &Path, b: &Path) -> bool {
    a == b || a.ends_with(b) || b.ends_with(a)
}

impl AllState {
    /// Adds a breakpoint to the desired set.
    ///
    /// Returns `false` if a breakpoint already exists at that location (in
    /// which case it is left untouched).
    pub fn add_break(&mut self, bk: Break) -> bool {
        if self.break_by_file(&bk.fpath, bk.line).is_some() {
            return false;
        }

        self.breaks.push(bk);
        true
    }

    /// Returns the desired breakpoint at the given location.
    pub fn break_by_file(&self, fpath: &Path, line: u32) -> Option<&Break> {
        self.breaks.iter().find(|bk| bk.is_at(fpath, line))
    }

    /// Returns the desired breakpoint at the given location.
    pub fn break_by_file_mut(&mut self, fpath: &Path, line: u32) -> Option<&mut Break> {
        self.breaks.iter_mut().find(|bk| bk.is_at(fpath, line))
    }

    /// Returns the desired breakpoint with the given backend ID.
    pub fn break_by_id(&self, id: i64) -> Option<&Break> {
        self.breaks.iter().find(|bk| bk.id == Some(id))
    }

    /// Deletes the desired breakpoint at the given location.
    pub fn delete_break_by_file(&mut self, fpath: &Path, line: u32) -> Option<Break> {
        let idx = self.breaks.iter().position(|bk| bk.is_at(fpath, line))?;
        Some(self.breaks.remove(idx))
    }

    /// Deletes the desired breakpoint with the given backend ID.
    pub fn delete_break_by_id(&mut self, id: i64) -> Option<Break> {
        let idx = self.breaks.iter().position(|bk| bk.id == Some(id))?;
        Some(self.breaks.remove(idx))
    }

    /// Marks the enabled desired breakpoints found in `sent` as sent to the
    /// backend.
    pub fn mark_breaks_submitted(&mut self, sent: &[Break]) {
        for bk in self.breaks.iter_mut().filter(|bk| bk.on) {
            if sent.iter().any(|sb| sb.on && sb.same_location(bk)) {
                bk.submitted = true;
            }
        }
    }

    /// Forgets the live status of every desired breakpoint, keeping the
    /// breakpoints themselves.
    pub fn reset_breaks(&mut self) {
        self.cur_breaks.clear();
        self.breaks.iter_mut().for_each(Break::forget_live_status);
    }

    /// Merges the backend breakpoints ([cur_breaks](Self::cur_breaks)) into
    /// the desired set ([breaks](Self::breaks)).
    ///
    /// Desired breakpoints matching a backend one by location get its ID,
    /// function and hit count, and keep their own condition, trace and
    /// enabled flags. Desired breakpoints that were sent but not installed
    /// stay in the set, flagged [Unresolved](BreakStatus::Unresolved).
    /// Backend breakpoints with no desired counterpart are not adopted.
    pub fn merge_breaks(&mut self) {
        for bk in self.breaks.iter_mut() {
            let live = self
                .cur_breaks
                .iter()
                .find(|cb| cb.id.is_some() && bk.same_location(cb));

            match live {
                Some(cb) => {
                    bk.id = cb.id;
                    bk.func.clone_from(&cb.func);
                    bk.hits = cb.hits;
                    bk.status = if bk.on {
                        BreakStatus::Installed
                    } else {
                        BreakStatus::Disabled
                    };
                }
                None => {
                    bk.id = None;
                    bk.status = match (bk.on, bk.submitted) {
                        (false, _) => BreakStatus::Disabled,
                        (true, true) => BreakStatus::Unresolved,
                        (true, false) => BreakStatus::Pending,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{Break, BreakStatus};
    use crate::state::AllState;

    fn live(id: i64, fpath: &str, line: u32) -> Break {
        Break {
            id: Some(id),
            func: Some("main.main".to_owned()),
            hits: 3,
            ..Break::new(fpath, line)
        }
    }

    fn submit_all(state: &mut AllState) {
        let sent = state.breaks.clone();
        state.mark_breaks_submitted(&sent);
    }

    #[test]
    fn merge_assigns_backend_id() {
        let mut state = AllState::default();
        state.add_break(Break::new("main.go", 10));
        submit_all(&mut state);

        state.cur_breaks = vec![live(7, "/src/app/main.go", 10)];
        state.merge_breaks();

        let bk = &state.breaks[0];
        assert_eq!(bk.id, Some(7));
        assert!(bk.on);
        assert_eq!(bk.status, BreakStatus::Installed);
        assert_eq!(bk.func.as_deref(), Some("main.main"));
        assert_eq!(bk.hits, 3);
    }

    #[test]
    fn merge_keeps_desired_fields() {
        let mut state = AllState::default();
        state.add_break(Break {
            cond: "i > 3".to_owned(),
            trace: true,
            ..Break::new("/src/app/main.go", 12)
        });
        submit_all(&mut state);

        state.cur_breaks = vec![live(2, "/src/app/main.go", 12)];
        state.merge_breaks();

        assert_eq!(state.breaks[0].cond, "i > 3");
        assert!(state.breaks[0].trace);
    }

    #[test]
    fn merge_flags_rejected_breaks_without_dropping_them() {
        let mut state = AllState::default();
        state.add_break(Break::new("main.go", 10));
        state.add_break(Break::new("main.go", 99));
        submit_all(&mut state);
        state.add_break(Break::new("util.go", 4));

        state.cur_breaks = vec![live(1, "main.go", 10)];
        state.merge_breaks();

        assert_eq!(state.breaks.len(), 3);
        assert_eq!(state.breaks[1].status, BreakStatus::Unresolved);
        assert_eq!(state.breaks[1].id, None);
        assert_eq!(state.breaks[2].status, BreakStatus::Pending);
    }

    #[test]
    fn merge_does_not_adopt_backend_only_breaks() {
        let mut state = AllState::default();
        state.cur_breaks = vec![live(4, "main.go", 20)];
        state.merge_breaks();

        assert!(state.breaks.is_empty());
    }

    #[test]
    fn disabled_breaks_stay_disabled() {
        let mut state = AllState::default();
        state.add_break(Break {
            on: false,
            ..Break::new("main.go", 10)
        });
        submit_all(&mut state);
        state.merge_breaks();

        assert_eq!(state.breaks[0].status, BreakStatus::Disabled);
        assert!(!state.breaks[0].submitted);
    }

    #[test]
    fn add_break_rejects_duplicate_location() {
        let mut state = AllState::default();
        assert!(state.add_break(Break::new("/src/app/main.go", 10)));
        assert!(!state.add_break(Break::new("main.go", 10)));
        assert_eq!(state.breaks.len(), 1);
    }

    #[test]
    fn path_suffix_matching_is_component_wise() {
        let bk = Break::new("/src/app/main.go", 10);

        assert!(bk.is_at(Path::new("app/main.go"), 10));
        assert!(!bk.is_at(Path::new("pp/main.go"), 10));
        assert!(!bk.is_at(Path::new("main.go"), 11));
    }

    #[test]
    fn add_delete_merge_never_loses_intent() {
        let mut state = AllState::default();
        let mut expected: Vec<(String, u32)> = Vec::new();

        // deterministic interleaving of adds, deletes and merges against a
        // backend that only accepts even lines
        for step in 0u32..60 {
            let file = format!("f{}.go", step % 4);
            let line = step % 7 + 1;

            match step % 5 {
                0 | 1 | 2 => {
                    if state.add_break(Break::new(file.as_str(), line)) {
                        expected.push((file, line));
                    }
                }
                3 => {
                    if let Some((file, line)) = expected.first().cloned() {
                        state.delete_break_by_file(Path::new(&file), line);
                        expected.remove(0);
                    }
                }
                _ => {
                    submit_all(&mut state);
                    state.cur_breaks = state
                        .breaks
                        .iter()
                        .filter(|bk| bk.line % 2 == 0)
                        .enumerate()
                        .map(|(i, bk)| live(i as i64 + 1, &bk.file, bk.line))
                        .collect();
                    state.merge_breaks();
                }
            }

            for (file, line) in &expected {
                assert!(
                    state.break_by_file(Path::new(file), *line).is_some(),
                    "lost {file}:{line} at step {step}"
                );
            }
            assert_eq!(state.breaks.len(), expected.len());
        }
    }
}
