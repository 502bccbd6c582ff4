use serde_json::{Map, Value};

use crate::command::{Command, CommandError};
use crate::model::app_state::AppState;
use crate::model::map::MapModel;

/// Applies a sparse set of key-value edits to the map itself (`layer_id`
/// None) or to one layer. A key mapped to `Value::Null` resets that property
/// to its default; a key absent from the map is left untouched. `undo`
/// applies `old_values` under the same rule, so `old_values` must record,
/// for each key in `new_values`, the value the property held before.
pub struct EditCommand {
    layer_id: Option<String>,
    old_values: Map<String, Value>,
    new_values: Map<String, Value>,
}

impl EditCommand {
    pub fn new(
        layer_id: Option<String>,
        old_values: Map<String, Value>,
        new_values: Map<String, Value>,
    ) -> Self {
        Self {
            layer_id,
            old_values,
            new_values,
        }
    }

    /// Builds the command by reading the current value of every edited key
    /// from the model, which is what interactive callers almost always want.
    pub fn from_current(
        map: &MapModel,
        layer_id: Option<String>,
        new_values: Map<String, Value>,
    ) -> Result<Self, CommandError> {
        let mut old_values = Map::new();
        for key in new_values.keys() {
            let current = match &layer_id {
                Some(id) => map.get_layer_property(id, key)?,
                None => map.get_map_property(key)?,
            };
            old_values.insert(key.clone(), current);
        }
        Ok(Self::new(layer_id, old_values, new_values))
    }

    fn apply(&self, values: &Map<String, Value>, map: &mut MapModel) -> Result<(), CommandError> {
        // All keys are validated before the first write so a bad entry
        // cannot leave the edit half-applied.
        match &self.layer_id {
            Some(id) => {
                for (key, value) in values {
                    map.check_layer_property(id, key, value)?;
                }
                for (key, value) in values {
                    map.set_layer_property(id, key, value)?;
                }
            }
            None => {
                for (key, value) in values {
                    map.check_map_property(key, value)?;
                }
                for (key, value) in values {
                    map.set_map_property(key, value)?;
                }
            }
        }
        Ok(())
    }
}

impl Command for EditCommand {
    fn execute(
        &mut self,
        _app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        self.apply(&self.new_values, map)
    }

    fn undo(
        &mut self,
        _app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        self.apply(&self.old_values, map)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::eref::ERef;
    use crate::common::events::EventChannel;
    use crate::model::ModelError;
    use crate::model::layer::{LayerModel, LayerSource};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn values(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected an object"),
        }
    }

    fn map_with_layer(id: &str) -> MapModel {
        let mut map = MapModel::new(EventChannel::new());
        let mut l = LayerModel::new(LayerSource::Kml {
            url: "http://x/a.kml".to_owned(),
        });
        l.id = id.to_owned();
        l.title = "Original".to_owned();
        l.min_zoom = Some(3);
        map.append_layer(ERef::new(l));
        map
    }

    #[test]
    fn test_execute_and_undo_on_a_layer() {
        let mut map = map_with_layer("a");
        let mut state = AppState::new(EventChannel::new());

        // "min_zoom": null resets; "url" is simply absent and untouched.
        let mut cmd = EditCommand::from_current(
            &map,
            Some("a".to_owned()),
            values(json!({"title": "Edited", "min_zoom": null})),
        )
        .unwrap();

        cmd.execute(&mut state, &mut map).unwrap();
        let layer = map.get_layer("a").unwrap();
        assert_eq!(layer.read().title, "Edited");
        assert_eq!(layer.read().min_zoom, None);
        assert_eq!(layer.read().source.url(), Some("http://x/a.kml"));

        cmd.undo(&mut state, &mut map).unwrap();
        assert_eq!(layer.read().title, "Original");
        assert_eq!(layer.read().min_zoom, Some(3));
    }

    #[test]
    fn test_execute_and_undo_on_the_map() {
        let mut map = MapModel::new(EventChannel::new());
        map.title = "Before".to_owned();
        let mut state = AppState::new(EventChannel::new());

        let mut cmd = EditCommand::from_current(
            &map,
            None,
            values(json!({"title": "After", "base_map_type": "GOOGLE_TERRAIN"})),
        )
        .unwrap();

        cmd.execute(&mut state, &mut map).unwrap();
        assert_eq!(map.title, "After");
        assert_eq!(
            map.get_map_property("base_map_type").unwrap(),
            json!("GOOGLE_TERRAIN")
        );

        cmd.undo(&mut state, &mut map).unwrap();
        assert_eq!(map.title, "Before");
        assert_eq!(
            map.get_map_property("base_map_type").unwrap(),
            json!("GOOGLE_ROADMAP")
        );
    }

    #[test]
    fn test_bad_key_rejects_the_whole_edit() {
        let mut map = map_with_layer("a");
        let mut state = AppState::new(EventChannel::new());

        let mut cmd = EditCommand::new(
            Some("a".to_owned()),
            Map::new(),
            values(json!({"title": "Edited", "frobnication": 7})),
        );
        assert_eq!(
            cmd.execute(&mut state, &mut map),
            Err(CommandError::Model(ModelError::UnknownProperty(
                "frobnication".to_owned()
            )))
        );
        // Validation failed before any write.
        assert_eq!(map.get_layer("a").unwrap().read().title, "Original");
    }

    #[test]
    fn test_missing_layer_is_an_error() {
        let map = MapModel::new(EventChannel::new());
        assert_eq!(
            EditCommand::from_current(
                &map,
                Some("ghost".to_owned()),
                values(json!({"title": "x"}))
            )
            .err(),
            Some(CommandError::Model(ModelError::LayerNotFound(
                "ghost".to_owned()
            )))
        );
    }
}
