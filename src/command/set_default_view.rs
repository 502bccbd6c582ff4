use crate::command::{Command, CommandError};
use crate::model::app_state::{AppState, AppStateSnapshot};
use crate::model::layer::Visibility;
use crate::model::map::MapModel;

/// Swaps the map's stored default view (viewport, base map type, per-layer
/// default visibility and opacity) between two captured view-state
/// snapshots. The snapshots come from `AppState::snapshot()`: the old one
/// taken when editing began, the new one at the moment the user saves the
/// current view as the default.
pub struct SetDefaultViewCommand {
    old_default: AppStateSnapshot,
    new_default: AppStateSnapshot,
}

impl SetDefaultViewCommand {
    pub fn new(old_default: AppStateSnapshot, new_default: AppStateSnapshot) -> Self {
        Self {
            old_default,
            new_default,
        }
    }

    fn apply(snapshot: &AppStateSnapshot, map: &mut MapModel) {
        map.set_viewport(snapshot.viewport);
        map.set_base_map_type(snapshot.map_type);

        let mut updates = Vec::new();
        map.for_each_layer(&mut |layer| {
            let l = layer.read();
            let enabled = snapshot.enabled_layer_ids.contains(&l.id);
            // Opacity snapshots are 0-100 with 100 left implicit.
            let opacity = snapshot
                .layer_opacities
                .get(&l.id)
                .copied()
                .unwrap_or(100);
            updates.push((l.id.clone(), l.visibility, enabled, opacity));
        });
        for (id, visibility, enabled, opacity) in updates {
            if let Some(layer) = map.get_layer(&id) {
                let mut l = layer.write();
                // ALWAYS_ON layers have no default visibility to store.
                if visibility != Visibility::AlwaysOn {
                    l.visibility = if enabled {
                        Visibility::DefaultOn
                    } else {
                        Visibility::DefaultOff
                    };
                }
                l.opacity = f64::from(opacity) / 100.0;
            }
        }
        map.events().emit(crate::common::events::MapEvent::ModelChanged { layer_id: None });
    }
}

impl Command for SetDefaultViewCommand {
    fn execute(
        &mut self,
        _app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        Self::apply(&self.new_default, map);
        Ok(())
    }

    fn undo(
        &mut self,
        _app_state: &mut AppState,
        map: &mut MapModel,
    ) -> Result<(), CommandError> {
        Self::apply(&self.old_default, map);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::eref::ERef;
    use crate::common::events::EventChannel;
    use crate::maproot::LatLonBox;
    use crate::model::layer::{LayerModel, LayerSource};
    use crate::model::map::BaseMapType;
    use pretty_assertions::assert_eq;

    fn layer_with_id(id: &str) -> ERef<LayerModel> {
        let mut l = LayerModel::new(LayerSource::Traffic);
        l.id = id.to_owned();
        ERef::new(l)
    }

    #[test]
    fn test_swaps_default_view_both_ways() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(layer_with_id("a"));
        map.append_layer(layer_with_id("b"));
        let mut state = AppState::new(EventChannel::new());

        let old_default = state.snapshot();
        state.set_layer_enabled("a", true);
        state.set_layer_opacity("a", 60);
        state.set_map_type(BaseMapType::Satellite);
        state.set_viewport(Some(LatLonBox {
            north: 10.0,
            south: 0.0,
            east: 20.0,
            west: 5.0,
        }));
        let new_default = state.snapshot();

        let mut cmd = SetDefaultViewCommand::new(old_default, new_default);
        cmd.execute(&mut state, &mut map).unwrap();
        assert_eq!(map.base_map_type, BaseMapType::Satellite);
        assert!(map.viewport.is_some());
        let a = map.get_layer("a").unwrap();
        assert_eq!(a.read().visibility, Visibility::DefaultOn);
        assert!((a.read().opacity - 0.6).abs() < 1e-9);
        let b = map.get_layer("b").unwrap();
        assert_eq!(b.read().visibility, Visibility::DefaultOff);
        // Missing opacity entry means fully opaque.
        assert_eq!(b.read().opacity, 1.0);

        cmd.undo(&mut state, &mut map).unwrap();
        assert_eq!(map.base_map_type, BaseMapType::Roadmap);
        assert_eq!(map.viewport, None);
        assert_eq!(a.read().visibility, Visibility::DefaultOff);
        assert_eq!(a.read().opacity, 1.0);
    }

    #[test]
    fn test_always_on_layer_keeps_its_visibility() {
        let mut map = MapModel::new(EventChannel::new());
        let pinned = layer_with_id("pinned");
        pinned.write().visibility = Visibility::AlwaysOn;
        map.append_layer(pinned.clone());
        let mut state = AppState::new(EventChannel::new());

        let old_default = state.snapshot();
        state.set_layer_enabled("pinned", true);
        let new_default = state.snapshot();

        let mut cmd = SetDefaultViewCommand::new(old_default, new_default);
        cmd.execute(&mut state, &mut map).unwrap();
        assert_eq!(pinned.read().visibility, Visibility::AlwaysOn);
    }
}
