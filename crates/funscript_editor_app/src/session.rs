// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor session.
//!
//! A session owns every open script together with its undo log. All edits
//! go through [`Session::edit`], which records undo history, and observers
//! hear about the results once per [`Session::tick`].

use crate::error::SessionError;
use crate::settings::EditorSettings;
use funscript_core::{Action, EditKind, Funscript, FunscriptEvent, UndoSystem};
use funscript_io::{load_funscript, FunscriptDocument, SaveRequest, SaveWorker};
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Unique identifier for an open script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(Uuid);

impl ScriptId {
    /// Create a new unique ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ScriptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open script with its history
#[derive(Debug)]
pub struct ScriptDocument {
    /// Document ID
    pub id: ScriptId,
    /// File the script was loaded from or last saved to
    pub path: Option<PathBuf>,
    /// The script
    pub script: Funscript,
    /// Its undo log
    pub undo: UndoSystem,
    /// Whether the script has unsaved changes
    pub dirty: bool,
}

impl ScriptDocument {
    /// Display name, the file stem when there is one
    pub fn name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_stem)
            .map_or_else(|| "Untitled".to_string(), |stem| stem.to_string_lossy().into_owned())
    }
}

/// Receives change events drained by [`Session::tick`]
pub trait SessionObserver {
    /// Called once per event per tick
    fn on_event(&mut self, id: ScriptId, event: FunscriptEvent);
}

impl<F> SessionObserver for F
where
    F: FnMut(ScriptId, FunscriptEvent),
{
    fn on_event(&mut self, id: ScriptId, event: FunscriptEvent) {
        self(id, event);
    }
}

/// The set of open scripts
pub struct Session {
    documents: IndexMap<ScriptId, ScriptDocument>,
    active: Option<ScriptId>,
    settings: EditorSettings,
    saver: SaveWorker,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl Session {
    /// Create an empty session
    pub fn new(settings: EditorSettings) -> Self {
        let saver = SaveWorker::new(settings.pretty_json);
        Self {
            documents: IndexMap::new(),
            active: None,
            settings,
            saver,
            observers: Vec::new(),
        }
    }

    /// Get the settings
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Open a funscript file and make it active
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<ScriptId> {
        let path = path.as_ref();
        let script = load_funscript(path)?;
        Ok(self.add_script(script, Some(path.to_path_buf())))
    }

    /// Open a script from JSON text and make it active
    pub fn open_from_str(&mut self, json: &str, path: Option<PathBuf>) -> Result<ScriptId> {
        let script = FunscriptDocument::from_json_str(json)?.into_funscript();
        Ok(self.add_script(script, path))
    }

    /// Add a script to the session and make it active
    pub fn add_script(&mut self, mut script: Funscript, path: Option<PathBuf>) -> ScriptId {
        script.set_spline_enabled(self.settings.use_spline_index);
        let id = ScriptId::new();
        let document = ScriptDocument {
            id,
            path,
            script,
            undo: UndoSystem::with_max_depth(self.settings.undo_history_depth),
            dirty: false,
        };
        tracing::info!("Opened '{}' with {} actions", document.name(), document.script.len());
        self.documents.insert(id, document);
        self.active = Some(id);
        id
    }

    /// Close a script. The most recently opened remaining script becomes active.
    pub fn close(&mut self, id: ScriptId) -> Result<ScriptDocument> {
        let document = self
            .documents
            .shift_remove(&id)
            .ok_or(SessionError::UnknownDocument(id))?;
        if self.active == Some(id) {
            self.active = self.documents.keys().last().copied();
        }
        if document.dirty {
            tracing::warn!("Closed '{}' with unsaved changes", document.name());
        }
        Ok(document)
    }

    /// Number of open scripts
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no script is open
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Open scripts in the order they were opened
    pub fn documents(&self) -> impl Iterator<Item = &ScriptDocument> {
        self.documents.values()
    }

    /// Get a script by ID
    pub fn document(&self, id: ScriptId) -> Option<&ScriptDocument> {
        self.documents.get(&id)
    }

    /// Get the active script's ID
    pub fn active_id(&self) -> Option<ScriptId> {
        self.active
    }

    /// Get the active script
    pub fn active(&self) -> Option<&ScriptDocument> {
        self.active.and_then(|id| self.documents.get(&id))
    }

    /// Get the active script mutably
    pub fn active_mut(&mut self) -> Option<&mut ScriptDocument> {
        self.active.and_then(|id| self.documents.get_mut(&id))
    }

    /// Make a script active
    pub fn set_active(&mut self, id: ScriptId) -> Result<()> {
        if !self.documents.contains_key(&id) {
            return Err(SessionError::UnknownDocument(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Register an observer for change events
    pub fn add_observer(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Run an edit with undo support.
    ///
    /// The state before the edit is recorded under `kind` once the edit
    /// succeeds and changed something. Consecutive mouse drags share one
    /// undo step. A failed edit leaves both the script and its history as
    /// they were, even when the closure made several changes before failing.
    pub fn edit<R>(
        &mut self,
        id: ScriptId,
        kind: EditKind,
        f: impl FnOnce(&mut Funscript) -> funscript_core::Result<R>,
    ) -> Result<R> {
        let document = self
            .documents
            .get_mut(&id)
            .ok_or(SessionError::UnknownDocument(id))?;

        let coalesce = kind == EditKind::MouseMoveAction && document.undo.match_top(kind);
        let before = document.script.data().clone();
        let result = match f(&mut document.script) {
            Ok(result) => result,
            Err(e) => {
                if document.script.data() != &before {
                    document.script.restore(before);
                }
                return Err(e.into());
            }
        };

        if document.script.data() != &before {
            if !coalesce {
                document.undo.record(kind, before);
            }
            document.dirty = true;
        }
        Ok(result)
    }

    /// Undo the last edit of a script
    pub fn undo(&mut self, id: ScriptId) -> Result<EditKind> {
        let document = self.document_mut(id)?;
        let kind = document.undo.undo(&mut document.script)?;
        document.dirty = true;
        Ok(kind)
    }

    /// Redo the last undone edit of a script
    pub fn redo(&mut self, id: ScriptId) -> Result<EditKind> {
        let document = self.document_mut(id)?;
        let kind = document.undo.redo(&mut document.script)?;
        document.dirty = true;
        Ok(kind)
    }

    /// Undo only if the last edit was of `kind`
    pub fn undo_if_top(&mut self, id: ScriptId, kind: EditKind) -> Result<bool> {
        let document = self.document_mut(id)?;
        let undone = document.undo.undo_if_top(kind, &mut document.script)?;
        if undone {
            document.dirty = true;
        }
        Ok(undone)
    }

    /// Add an action, or overwrite one within a frame of it
    pub fn add_or_edit_action(&mut self, id: ScriptId, action: Action) -> Result<()> {
        let tolerance = self.settings.frame_time_ms;
        self.edit(id, EditKind::AddEditAction, |script| {
            script.add_edit_action(action, tolerance)
        })
    }

    /// Paste actions shifted by `offset_ms`, replacing any within a frame
    pub fn paste_actions(&mut self, id: ScriptId, actions: &[Action], offset_ms: i32) -> Result<()> {
        let tolerance = self.settings.frame_time_ms;
        self.edit(id, EditKind::PasteCopiedActions, |script| {
            for action in actions {
                let shifted = action.with_at(action.at.saturating_add(offset_ms));
                script.paste_action(shifted, tolerance)?;
            }
            Ok(())
        })
    }

    /// Drag the selection in time, keeping the configured spacing
    pub fn drag_selection(&mut self, id: ScriptId, offset_ms: i32) -> Result<()> {
        let spacing = self.settings.min_spacing_ms;
        self.edit(id, EditKind::MouseMoveAction, |script| {
            script.move_selection_time(offset_ms, spacing)
        })
    }

    /// Closest action to a time within the snap tolerance
    pub fn snap_action(&self, id: ScriptId, time_ms: i32) -> Result<Option<Action>> {
        let document = self
            .documents
            .get(&id)
            .ok_or(SessionError::UnknownDocument(id))?;
        Ok(document
            .script
            .action_near(time_ms, self.settings.snap_tolerance_ms))
    }

    /// Drain every script's pending changes and notify observers.
    ///
    /// Returns the number of events delivered.
    pub fn tick(&mut self) -> usize {
        let mut delivered = 0;
        for (id, document) in &mut self.documents {
            for event in document.script.update() {
                for observer in &mut self.observers {
                    observer.on_event(*id, event);
                }
                delivered += 1;
            }
        }
        delivered
    }

    /// Hand a script off for saving.
    ///
    /// Without a destination the script is saved where it came from. A new
    /// destination becomes the script's path.
    pub fn save(&mut self, id: ScriptId, destination: Option<PathBuf>) -> Result<()> {
        let saver = self.saver.clone();
        let document = self.document_mut(id)?;
        let Some(path) = destination.or_else(|| document.path.clone()) else {
            return Err(SessionError::NoSavePath(id));
        };

        tracing::debug!("Handing off save of '{}' to {:?}", document.name(), path);
        saver.submit(SaveRequest::from_script(&document.script, path.clone()))?;
        document.path = Some(path);
        document.dirty = false;
        Ok(())
    }

    /// Block until every handed-off save has finished
    pub fn wait_for_saves(&self) {
        self.saver.wait_idle();
    }

    /// Number of saves that failed to write
    pub fn save_failures(&self) -> usize {
        self.saver.failures()
    }

    fn document_mut(&mut self, id: ScriptId) -> Result<&mut ScriptDocument> {
        self.documents
            .get_mut(&id)
            .ok_or(SessionError::UnknownDocument(id))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SCRIPT: &str = r#"{"actions":[{"at":0,"pos":0},{"at":100,"pos":100},{"at":200,"pos":0},{"at":300,"pos":100}]}"#;

    fn session_with_script() -> (Session, ScriptId) {
        let mut session = Session::default();
        let id = session.open_from_str(SCRIPT, None).unwrap();
        session.tick();
        (session, id)
    }

    fn select_time(session: &mut Session, id: ScriptId, from_ms: i32, to_ms: i32) {
        let document = session.document_mut(id).unwrap();
        document.script.select_time(from_ms, to_ms, true).unwrap();
    }

    fn times(session: &Session, id: ScriptId) -> Vec<i32> {
        session
            .document(id)
            .unwrap()
            .script
            .actions()
            .iter()
            .map(|a| a.at)
            .collect()
    }

    #[test]
    fn test_edit_records_undo() {
        let (mut session, id) = session_with_script();
        session
            .edit(id, EditKind::AddAction, |s| s.add_action(Action::new(50, 50)))
            .unwrap();
        assert_eq!(times(&session, id), vec![0, 50, 100, 200, 300]);
        assert!(session.document(id).unwrap().dirty);

        assert_eq!(session.undo(id).unwrap(), EditKind::AddAction);
        assert_eq!(times(&session, id), vec![0, 100, 200, 300]);
        assert_eq!(session.redo(id).unwrap(), EditKind::AddAction);
        assert_eq!(times(&session, id), vec![0, 50, 100, 200, 300]);
    }

    #[test]
    fn test_failed_and_noop_edits_leave_no_history() {
        let (mut session, id) = session_with_script();
        let result = session.edit(id, EditKind::AddAction, |s| s.add_action(Action::new(100, 5)));
        assert!(matches!(
            result,
            Err(SessionError::Edit(funscript_core::Error::DuplicateTimestamp { at: 100 }))
        ));

        session
            .edit(id, EditKind::InvertActions, |s| s.invert_selection())
            .unwrap();

        let document = session.document(id).unwrap();
        assert!(!document.undo.can_undo());
        assert!(!document.dirty);
    }

    #[test]
    fn test_failed_closure_rolls_back() {
        let (mut session, id) = session_with_script();
        let result = session.edit(id, EditKind::AddEditActions, |s| {
            s.add_action(Action::new(50, 50))?;
            s.add_action(Action::new(200, 50))
        });
        assert!(result.is_err());
        assert_eq!(times(&session, id), vec![0, 100, 200, 300]);
        assert!(!session.document(id).unwrap().undo.can_undo());
    }

    #[test]
    fn test_mouse_drags_coalesce() {
        let (mut session, id) = session_with_script();
        select_time(&mut session, id, 100, 100);

        for _ in 0..5 {
            session.drag_selection(id, 10).unwrap();
        }
        assert_eq!(times(&session, id), vec![0, 150, 200, 300]);
        assert_eq!(session.document(id).unwrap().undo.undo_depth(), 1);

        session.undo(id).unwrap();
        assert_eq!(times(&session, id), vec![0, 100, 200, 300]);
    }

    #[test]
    fn test_drag_respects_spacing() {
        let (mut session, id) = session_with_script();
        select_time(&mut session, id, 100, 100);
        session.drag_selection(id, 1000).unwrap();
        assert_eq!(times(&session, id), vec![0, 184, 200, 300]);
    }

    #[test]
    fn test_add_or_edit_and_paste_use_frame_tolerance() {
        let (mut session, id) = session_with_script();
        session.add_or_edit_action(id, Action::new(110, 40)).unwrap();
        assert_eq!(times(&session, id), vec![0, 110, 200, 300]);

        session
            .paste_actions(id, &[Action::new(0, 20), Action::new(100, 80)], 295)
            .unwrap();
        assert_eq!(times(&session, id), vec![0, 110, 200, 295, 395]);
        assert_eq!(
            session.document(id).unwrap().undo.undo_description(),
            Some("Paste selection")
        );
    }

    #[test]
    fn test_paste_offset_saturates() {
        let (mut session, id) = session_with_script();
        session
            .paste_actions(id, &[Action::new(100, 50)], i32::MAX)
            .unwrap();
        assert_eq!(times(&session, id), vec![0, 100, 200, 300, i32::MAX]);

        let pasted = [Action::new(300, 50), Action::new(0, 20)];
        let result = session.paste_actions(id, &pasted, i32::MIN);
        assert!(matches!(
            result,
            Err(SessionError::Edit(funscript_core::Error::NegativeTimestamp { at: i32::MIN }))
        ));
        assert_eq!(times(&session, id), vec![0, 100, 200, 300, i32::MAX]);
    }

    #[test]
    fn test_snap_action() {
        let (session, id) = session_with_script();
        assert_eq!(session.snap_action(id, 140).unwrap(), Some(Action::new(100, 100)));
        assert_eq!(session.snap_action(id, 150).unwrap(), Some(Action::new(100, 100)));
        assert!(matches!(
            session.snap_action(ScriptId::new(), 0),
            Err(SessionError::UnknownDocument(_))
        ));
    }

    #[test]
    fn test_tick_notifies_once_per_event() {
        let mut session = Session::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        session.add_observer(move |id: ScriptId, event: FunscriptEvent| {
            sink.borrow_mut().push((id, event));
        });

        let first = session.open_from_str(SCRIPT, None).unwrap();
        let second = session.open_from_str(SCRIPT, None).unwrap();
        assert_eq!(session.tick(), 2);
        seen.borrow_mut().clear();

        for at in [10, 20, 30] {
            session
                .edit(first, EditKind::AddAction, |s| s.add_action(Action::new(at, 0)))
                .unwrap();
        }
        session
            .edit(second, EditKind::RemoveSelection, |s| {
                s.select_all();
                s.remove_selected_actions();
                Ok(())
            })
            .unwrap();

        assert_eq!(session.tick(), 3);
        assert_eq!(
            *seen.borrow(),
            vec![
                (first, FunscriptEvent::ActionsChanged),
                (second, FunscriptEvent::ActionsChanged),
                (second, FunscriptEvent::SelectionChanged),
            ]
        );
        assert_eq!(session.tick(), 0);
    }

    #[test]
    fn test_close_switches_active() {
        let mut session = Session::default();
        let first = session.open_from_str(SCRIPT, None).unwrap();
        let second = session.open_from_str(SCRIPT, None).unwrap();
        assert_eq!(session.active_id(), Some(second));

        session.close(second).unwrap();
        assert_eq!(session.active_id(), Some(first));
        assert!(session.close(second).is_err());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn test_save_hand_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.funscript");
        let (mut session, id) = session_with_script();

        assert!(matches!(session.save(id, None), Err(SessionError::NoSavePath(_))));

        session
            .edit(id, EditKind::RemoveAction, |s| s.remove_action(Action::new(0, 0)))
            .unwrap();
        session.save(id, Some(path.clone())).unwrap();
        session.wait_for_saves();

        assert_eq!(session.save_failures(), 0);
        let document = session.document(id).unwrap();
        assert!(!document.dirty);
        assert_eq!(document.name(), "session");

        let loaded = load_funscript(&path).unwrap();
        assert_eq!(loaded.actions(), document.script.actions());
    }
}
