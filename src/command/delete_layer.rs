use crate::command::{Command, CommandError};
use crate::maproot::LayerMapRoot;
use crate::model::ModelError;
use crate::model::app_state::AppState;
use crate::model::layer::LayerModel;
use crate::model::map::MapModel;

/// Everything `execute` has to remember to be able to put the layer back.
struct DeletedLayer {
    root: LayerMapRoot,
    parent_id: Option<String>,
    index: usize,
    /// Descendant ids (the deleted layer included) that were enabled at the
    /// moment of deletion. Undo restores exactly these, never the whole
    /// subtree.
    enabled_ids: Vec<String>,
    /// Ids that single-select maintenance turned on as a consequence of the
    /// deletion, e.g. the sibling that took over the selection. Undo turns
    /// them back off.
    newly_selected_ids: Vec<String>,
}

/// Removes one layer (and its whole subtree) from the map.
pub struct DeleteLayerCommand {
    layer_id: String,
    deleted: Option<DeletedLayer>,
}

impl DeleteLayerCommand {
    pub fn new(layer_id: &str) -> Self {
        Self {
            layer_id: layer_id.to_owned(),
            deleted: None,
        }
    }
}

impl Command for DeleteLayerCommand {
    fn execute(
        &mut self,
        app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        let layer = map
            .get_layer(&self.layer_id)
            .ok_or_else(|| ModelError::LayerNotFound(self.layer_id.clone()))?;
        let subtree_ids = MapModel::subtree_ids(&layer);
        let enabled_ids: Vec<String> = subtree_ids
            .iter()
            .filter(|id| app_state.is_layer_enabled(id))
            .cloned()
            .collect();
        let root = layer.read().to_map_root();

        for id in &subtree_ids {
            app_state.set_layer_enabled(id, false);
        }
        let (_, parent_id, index) = map.remove_layer(&self.layer_id)?;

        // Deleting the selected sublayer of a single-select folder hands
        // the selection to a sibling.
        let enabled_before = app_state.enabled_layer_ids().clone();
        app_state.update_single_select_folders(map);
        let newly_selected_ids: Vec<String> = app_state
            .enabled_layer_ids()
            .difference(&enabled_before)
            .cloned()
            .collect();

        self.deleted = Some(DeletedLayer {
            root,
            parent_id,
            index,
            enabled_ids,
            newly_selected_ids,
        });
        Ok(())
    }

    fn undo(
        &mut self,
        app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        let deleted = self.deleted.as_ref().ok_or(CommandError::NotYetExecuted)?;
        let layer = LayerModel::from_map_root(&deleted.root).ok_or_else(|| {
            CommandError::MalformedMapRoot(format!(
                "saved subtree for layer '{}' cannot be reconstructed",
                self.layer_id
            ))
        })?;
        map.insert_layer(deleted.parent_id.as_deref(), deleted.index, layer)?;

        for id in &deleted.newly_selected_ids {
            app_state.set_layer_enabled(id, false);
        }
        for id in &deleted.enabled_ids {
            app_state.set_layer_enabled(id, true);
        }
        app_state.update_single_select_folders(map);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::eref::ERef;
    use crate::common::events::EventChannel;
    use crate::model::layer::{FolderType, LayerSource};
    use pretty_assertions::assert_eq;

    fn layer_with_id(id: &str) -> ERef<LayerModel> {
        let mut l = LayerModel::new(LayerSource::Traffic);
        l.id = id.to_owned();
        ERef::new(l)
    }

    fn folder(id: &str, folder_type: Option<FolderType>, children: Vec<ERef<LayerModel>>) -> ERef<LayerModel> {
        let mut l = LayerModel::new(LayerSource::Folder);
        l.id = id.to_owned();
        l.folder_type = folder_type;
        l.sublayers = children;
        ERef::new(l)
    }

    #[test]
    fn test_delete_and_undo_restore_tree_and_enabled_ids() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(folder(
            "f",
            None,
            vec![layer_with_id("a"), layer_with_id("b"), layer_with_id("c")],
        ));
        let mut state = AppState::new(EventChannel::new());
        state.set_layer_enabled("f", true);
        state.set_layer_enabled("b", true);
        // "a" and "c" deliberately stay disabled.

        let mut cmd = DeleteLayerCommand::new("f");
        cmd.execute(&mut state, &mut map).unwrap();
        assert!(map.layer_ids().is_empty());
        assert!(state.enabled_layer_ids().is_empty());

        cmd.undo(&mut state, &mut map).unwrap();
        assert_eq!(map.layer_ids(), vec!["f", "a", "b", "c"]);
        assert_eq!(
            state.enabled_layer_ids().iter().collect::<Vec<_>>(),
            vec!["b", "f"]
        );
        assert_eq!(map.position_of("f"), Some((None, 0)));
    }

    #[test]
    fn test_delete_restores_sibling_index() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(layer_with_id("a"));
        map.append_layer(layer_with_id("b"));
        map.append_layer(layer_with_id("c"));
        let mut state = AppState::new(EventChannel::new());

        let mut cmd = DeleteLayerCommand::new("b");
        cmd.execute(&mut state, &mut map).unwrap();
        assert_eq!(map.layer_ids(), vec!["a", "c"]);
        cmd.undo(&mut state, &mut map).unwrap();
        assert_eq!(map.layer_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_deleting_selected_sublayer_hands_selection_to_a_sibling() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(folder(
            "f",
            Some(FolderType::SingleSelect),
            vec![layer_with_id("a"), layer_with_id("b"), layer_with_id("c")],
        ));
        let mut state = AppState::new(EventChannel::new());
        state.set_layer_enabled("b", true);

        let mut cmd = DeleteLayerCommand::new("b");
        cmd.execute(&mut state, &mut map).unwrap();
        // Exactly one sibling took over.
        assert!(state.is_layer_enabled("a"));
        assert!(!state.is_layer_enabled("c"));

        // Undo puts "b" back as the selection and drops the stand-in.
        cmd.undo(&mut state, &mut map).unwrap();
        assert!(state.is_layer_enabled("b"));
        assert!(!state.is_layer_enabled("a"));
        assert!(!state.is_layer_enabled("c"));
    }

    #[test]
    fn test_missing_layer_is_rejected_without_mutation() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(layer_with_id("a"));
        let mut state = AppState::new(EventChannel::new());

        let mut cmd = DeleteLayerCommand::new("ghost");
        assert_eq!(
            cmd.execute(&mut state, &mut map),
            Err(CommandError::Model(ModelError::LayerNotFound(
                "ghost".to_owned()
            )))
        );
        assert_eq!(map.layer_ids(), vec!["a"]);
    }
}
