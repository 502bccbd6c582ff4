use crate::command::{Command, CommandError};
use crate::maproot::LayerMapRoot;
use crate::model::app_state::AppState;
use crate::model::layer::LayerModel;
use crate::model::map::MapModel;

/// Builds layers out of MapRoot JSON and appends them at the end of the
/// map's root layer list. After the first execute the stored roots carry the
/// ids the map assigned, so redo recreates the very same layers.
pub struct CreateLayersCommand {
    roots: Vec<LayerMapRoot>,
    created_ids: Vec<Vec<String>>,
}

impl CreateLayersCommand {
    pub fn new(roots: Vec<LayerMapRoot>) -> Self {
        Self {
            roots,
            created_ids: Vec::new(),
        }
    }
}

impl Command for CreateLayersCommand {
    fn execute(
        &mut self,
        _app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        // All roots must deserialize before the first one is appended.
        let mut layers = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            let layer = LayerModel::from_map_root(root).ok_or_else(|| {
                CommandError::MalformedMapRoot(format!(
                    "layer '{}' has a missing or unrecognized type",
                    root.id.as_deref().unwrap_or("")
                ))
            })?;
            layers.push(layer);
        }
        self.created_ids.clear();
        for (root, layer) in self.roots.iter_mut().zip(layers) {
            let ids = map.append_layer(layer.clone());
            // Write the assigned ids back so the next execute is idempotent.
            *root = layer.read().to_map_root();
            self.created_ids.push(ids);
        }
        Ok(())
    }

    fn undo(
        &mut self,
        app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        if self.created_ids.is_empty() {
            return Err(CommandError::NotYetExecuted);
        }
        for ids in self.created_ids.iter().rev() {
            map.remove_layer(&ids[0])?;
            // A layer that never existed before the command must not leave
            // its id behind in the enabled set.
            for id in ids {
                app_state.set_layer_enabled(id, false);
            }
        }
        app_state.update_single_select_folders(map);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::events::EventChannel;
    use crate::model::layer::LayerSource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn roots(v: serde_json::Value) -> Vec<LayerMapRoot> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_create_undo_redo_keeps_assigned_ids() {
        let mut map = MapModel::new(EventChannel::new());
        let mut state = AppState::new(EventChannel::new());

        let mut cmd = CreateLayersCommand::new(roots(json!([
            {"title": "Traffic", "type": "TRAFFIC"},
            {"title": "Shelters", "type": "KML",
             "source": {"kml": {"url": "http://x/s.kml"}}}
        ])));
        cmd.execute(&mut state, &mut map).unwrap();
        assert_eq!(map.layer_ids(), vec!["1", "2"]);

        cmd.undo(&mut state, &mut map).unwrap();
        assert!(map.layer_ids().is_empty());

        // Redo reuses the ids assigned the first time.
        cmd.execute(&mut state, &mut map).unwrap();
        assert_eq!(map.layer_ids(), vec!["1", "2"]);
        let shelters = map.get_layer("2").unwrap();
        assert_eq!(shelters.read().title, "Shelters");
        assert_eq!(shelters.read().source.url(), Some("http://x/s.kml"));
    }

    #[test]
    fn test_undo_clears_created_ids_from_enabled_set() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer({
            let mut l = LayerModel::new(LayerSource::Traffic);
            l.id = "keep".to_owned();
            crate::common::eref::ERef::new(l)
        });
        let mut state = AppState::new(EventChannel::new());
        state.set_layer_enabled("keep", true);

        let mut cmd =
            CreateLayersCommand::new(roots(json!([{"title": "New", "type": "TRAFFIC"}])));
        cmd.execute(&mut state, &mut map).unwrap();
        let new_id = map.layer_ids()[1].clone();
        state.set_layer_enabled(&new_id, true);

        cmd.undo(&mut state, &mut map).unwrap();
        assert!(!state.is_layer_enabled(&new_id));
        assert!(state.is_layer_enabled("keep"));
    }

    #[test]
    fn test_malformed_root_is_rejected_before_any_append() {
        let mut map = MapModel::new(EventChannel::new());
        let mut state = AppState::new(EventChannel::new());

        let mut cmd = CreateLayersCommand::new(roots(json!([
            {"title": "Good", "type": "TRAFFIC"},
            {"title": "Bad", "type": "HOLOGRAM"}
        ])));
        assert!(matches!(
            cmd.execute(&mut state, &mut map),
            Err(CommandError::MalformedMapRoot(_))
        ));
        assert!(map.layer_ids().is_empty());
        assert!(matches!(
            cmd.undo(&mut state, &mut map),
            Err(CommandError::NotYetExecuted)
        ));
    }
}
