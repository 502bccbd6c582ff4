use crate::command::{Command, CommandError};
use crate::maproot::TopicMapRoot;
use crate::model::app_state::AppState;
use crate::model::map::MapModel;
use crate::model::topic::TopicModel;

/// Appends topics built from MapRoot JSON, in order. Roots without an id get
/// one generated on the first execute; the id is written back into the
/// stored root so a redo recreates topics with the same ids. Undo pops the
/// created topics off the tail in reverse order.
pub struct CreateTopicsCommand {
    roots: Vec<TopicMapRoot>,
    executed: bool,
}

impl CreateTopicsCommand {
    pub fn new(roots: Vec<TopicMapRoot>) -> Self {
        Self {
            roots,
            executed: false,
        }
    }
}

impl Command for CreateTopicsCommand {
    fn execute(
        &mut self,
        _app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        for root in &mut self.roots {
            if root.id.as_deref().unwrap_or("").is_empty() {
                root.id = Some(uuid::Uuid::now_v7().to_string());
            }
            let topic = TopicModel::from_map_root(root, &|id| map.contains_layer(id));
            map.append_topic(topic);
        }
        self.executed = true;
        Ok(())
    }

    fn undo(
        &mut self,
        _app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        if !self.executed {
            return Err(CommandError::NotYetExecuted);
        }
        for _ in self.roots.iter().rev() {
            map.pop_topic()?;
        }
        Ok(())
    }
}
