use crate::command::{Command, CommandError};
use crate::model::app_state::AppState;
use crate::model::map::{LayerOrdering, MapModel};

/// Reorders and reparents the layer tree. Both orderings must name every
/// layer exactly once; the map refuses anything else, so a stale command
/// (e.g. after the tree changed under it) fails without mutating.
pub struct ArrangeCommand {
    old_ordering: Vec<LayerOrdering>,
    new_ordering: Vec<LayerOrdering>,
}

impl ArrangeCommand {
    pub fn new(old_ordering: Vec<LayerOrdering>, new_ordering: Vec<LayerOrdering>) -> Self {
        Self {
            old_ordering,
            new_ordering,
        }
    }

    /// Captures the map's current tree shape as the old ordering.
    pub fn from_current(map: &MapModel, new_ordering: Vec<LayerOrdering>) -> Self {
        Self::new(map.current_ordering(), new_ordering)
    }
}

impl Command for ArrangeCommand {
    fn execute(
        &mut self,
        app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        map.apply_ordering(&self.new_ordering)?;
        app_state.update_single_select_folders(map);
        Ok(())
    }

    fn undo(
        &mut self,
        app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        map.apply_ordering(&self.old_ordering)?;
        app_state.update_single_select_folders(map);
        Ok(())
    }
}
