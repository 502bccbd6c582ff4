use crate::command::{Command, CommandError};
use crate::common::eref::ERef;
use crate::common::events::{EventChannel, MapEvent};
use crate::maproot::MapRoot;
use crate::model::app_state::AppState;
use crate::model::map::MapModel;

/// Where a serialized map goes when the user saves. Implementations POST the
/// MapRoot JSON somewhere; the presenter only cares whether that worked.
pub trait SaveEndpoint {
    fn save(&mut self, map_root: &MapRoot) -> Result<(), String>;
}

/// Owns the linear history log of executed commands.
///
/// `commands[..next_redo_index]` are undoable, the rest are redoable. A new
/// edit truncates the redoable tail: editing after an undo discards the
/// history that undo had made reachable. Commands whose `execute` fails are
/// rejected up front and never appear on the log.
pub struct EditPresenter {
    app_state: ERef<AppState>,
    map: ERef<MapModel>,
    commands: Vec<Box<dyn Command>>,
    next_redo_index: usize,
    events: EventChannel,
}

impl EditPresenter {
    pub fn new(app_state: ERef<AppState>, map: ERef<MapModel>, events: EventChannel) -> Self {
        Self {
            app_state,
            map,
            commands: Vec::new(),
            next_redo_index: 0,
            events,
        }
    }

    pub fn undo_possible(&self) -> bool {
        self.next_redo_index > 0
    }

    pub fn redo_possible(&self) -> bool {
        self.next_redo_index < self.commands.len()
    }

    fn announce_availability(&self) {
        self.events.emit(MapEvent::UndoRedoStateChanged {
            undo_possible: self.undo_possible(),
            redo_possible: self.redo_possible(),
        });
    }

    /// Runs one command step with the model channels held, so notifications
    /// raised mid-command are delivered only after the write guards are
    /// released and the command has fully completed. A listener reading the
    /// models through its own ERef handles therefore never contends with the
    /// guards held here.
    fn run_step(
        &mut self,
        step: impl FnOnce(&mut Vec<Box<dyn Command>>, &mut AppState, &mut MapModel) -> Result<(), CommandError>,
    ) -> Result<(), CommandError> {
        let state_hold = self.app_state.read().events().hold();
        let map_hold = self.map.read().events().hold();
        let result = {
            let mut app_state = self.app_state.write();
            let mut map = self.map.write();
            step(&mut self.commands, &mut *app_state, &mut *map)
        };
        drop(map_hold);
        drop(state_hold);
        result
    }

    /// Executes the command and, on success, records it on the log.
    pub fn do_command(&mut self, mut command: Box<dyn Command>) -> Result<(), CommandError> {
        self.run_step(|_, app_state, map| command.execute(app_state, map))?;
        self.commands.truncate(self.next_redo_index);
        self.commands.push(command);
        self.next_redo_index += 1;
        self.announce_availability();
        Ok(())
    }

    /// Reverses the most recent command. Returns Ok(false) when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<bool, CommandError> {
        if !self.undo_possible() {
            return Ok(false);
        }
        let index = self.next_redo_index - 1;
        self.run_step(|commands, app_state, map| commands[index].undo(app_state, map))?;
        self.next_redo_index -= 1;
        self.announce_availability();
        Ok(true)
    }

    /// Re-executes the most recently undone command. Returns Ok(false) when
    /// there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, CommandError> {
        if !self.redo_possible() {
            return Ok(false);
        }
        let index = self.next_redo_index;
        self.run_step(|commands, app_state, map| commands[index].execute(app_state, map))?;
        self.next_redo_index += 1;
        self.announce_availability();
        Ok(true)
    }

    /// Serializes the whole map and hands it to the endpoint, announcing
    /// the outcome either way.
    pub fn save(&self, endpoint: &mut dyn SaveEndpoint) -> Result<(), String> {
        let root = self.map.read().to_map_root();
        match endpoint.save(&root) {
            Ok(()) => {
                self.events.emit(MapEvent::SaveSucceeded);
                Ok(())
            }
            Err(reason) => {
                self.events.emit(MapEvent::SaveFailed {
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }
}
