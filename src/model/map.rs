use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::common::eref::ERef;
use crate::common::events::{EventChannel, MapEvent};
use crate::maproot::{BaseMapStyle, Extent, LatLonBox, MapRoot};
use crate::model::ModelError;
use crate::model::layer::LayerModel;
use crate::model::topic::TopicModel;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BaseMapType {
    #[default]
    Roadmap,
    Satellite,
    Hybrid,
    Terrain,
    Custom,
}

impl BaseMapType {
    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "GOOGLE_ROADMAP" => Self::Roadmap,
            "GOOGLE_SATELLITE" => Self::Satellite,
            "GOOGLE_HYBRID" => Self::Hybrid,
            "GOOGLE_TERRAIN" => Self::Terrain,
            "CUSTOM" => Self::Custom,
            _ => return None,
        })
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Roadmap => "GOOGLE_ROADMAP",
            Self::Satellite => "GOOGLE_SATELLITE",
            Self::Hybrid => "GOOGLE_HYBRID",
            Self::Terrain => "GOOGLE_TERRAIN",
            Self::Custom => "CUSTOM",
        }
    }
}

/// Custom base-map style, used when the base map type is CUSTOM.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MapStyle {
    pub definition: String,
    pub name: String,
}

/// A desired shape for the whole layer tree, used by the arrange command.
/// Ids must cover the current tree exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerOrdering {
    pub id: String,
    pub sublayers: Vec<LayerOrdering>,
}

/// The top-level model for one editing session: the layer tree, the topics
/// and the map-level attributes. Every layer id anywhere in the tree is
/// unique within the map; the `layers_by_id` registry enforces this by
/// replacing blank or colliding ids with the smallest unused positive
/// integer before any insertion event is announced.
pub struct MapModel {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub footer: String,
    pub languages: Vec<String>,
    pub region: Option<String>,
    pub thumbnail_url: Option<String>,
    pub viewport: Option<LatLonBox>,
    pub full_extent: Option<LatLonBox>,
    pub base_map_type: BaseMapType,
    pub base_map_style: Option<MapStyle>,
    layers: Vec<ERef<LayerModel>>,
    topics: Vec<ERef<TopicModel>>,
    layers_by_id: HashMap<String, ERef<LayerModel>>,
    events: EventChannel,
}

impl MapModel {
    pub fn new(events: EventChannel) -> Self {
        Self {
            id: None,
            title: String::new(),
            description: String::new(),
            footer: String::new(),
            languages: Vec::new(),
            region: None,
            thumbnail_url: None,
            viewport: None,
            full_extent: None,
            base_map_type: BaseMapType::default(),
            base_map_style: None,
            layers: Vec::new(),
            topics: Vec::new(),
            layers_by_id: HashMap::new(),
            events,
        }
    }

    pub fn from_map_root(root: &MapRoot, events: EventChannel) -> Self {
        let mut map = Self::new(events);
        map.id = root.id.clone();
        map.title = root.title.clone().unwrap_or_default();
        map.description = root.description.clone().unwrap_or_default();
        map.footer = root.footer.clone().unwrap_or_default();
        map.languages = root.languages.clone().unwrap_or_default();
        map.region = root.region.clone();
        map.thumbnail_url = root.thumbnail_url.clone();
        map.viewport = Extent::unwrap_box(&root.viewport);
        map.full_extent = Extent::unwrap_box(&root.full_extent);
        map.base_map_type = root
            .base_map_type
            .as_deref()
            .and_then(BaseMapType::from_wire)
            .unwrap_or_default();
        map.base_map_style = root.base_map_style.as_ref().map(|s| MapStyle {
            definition: s.definition.clone().unwrap_or_default(),
            name: s.name.clone().unwrap_or_default(),
        });

        for layer_root in root.layers.as_deref().unwrap_or(&[]) {
            if let Some(layer) = LayerModel::from_map_root(layer_root) {
                map.register_subtree(&layer);
                map.layers.push(layer);
            }
        }
        for topic_root in root.topics.as_deref().unwrap_or(&[]) {
            let topic = TopicModel::from_map_root(topic_root, &|id| {
                map.layers_by_id.contains_key(id)
            });
            map.topics.push(topic);
        }
        map
    }

    pub fn to_map_root(&self) -> MapRoot {
        fn nonempty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_owned())
        }
        MapRoot {
            id: self.id.clone(),
            title: nonempty(&self.title),
            description: nonempty(&self.description),
            footer: nonempty(&self.footer),
            languages: (!self.languages.is_empty()).then(|| self.languages.clone()),
            region: self.region.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            viewport: Extent::wrap(self.viewport),
            full_extent: Extent::wrap(self.full_extent),
            base_map_type: Some(self.base_map_type.wire_name().to_owned()),
            base_map_style: self.base_map_style.as_ref().map(|s| BaseMapStyle {
                definition: nonempty(&s.definition),
                name: nonempty(&s.name),
            }),
            layers: (!self.layers.is_empty())
                .then(|| self.layers.iter().map(|e| e.read().to_map_root()).collect()),
            topics: (!self.topics.is_empty())
                .then(|| self.topics.iter().map(|e| e.read().to_map_root()).collect()),
        }
    }

    pub fn events(&self) -> EventChannel {
        self.events.clone()
    }

    pub fn layers(&self) -> &[ERef<LayerModel>] {
        &self.layers
    }

    pub fn topics(&self) -> &[ERef<TopicModel>] {
        &self.topics
    }

    pub fn get_layer(&self, id: &str) -> Option<ERef<LayerModel>> {
        self.layers_by_id.get(id).cloned()
    }

    pub fn contains_layer(&self, id: &str) -> bool {
        self.layers_by_id.contains_key(id)
    }

    /// All layer ids in tree (pre-)order.
    pub fn layer_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.for_each_layer(&mut |l| ids.push(l.read().id.clone()));
        ids
    }

    pub fn for_each_layer(&self, f: &mut impl FnMut(&ERef<LayerModel>)) {
        fn walk(node: &ERef<LayerModel>, f: &mut impl FnMut(&ERef<LayerModel>)) {
            f(node);
            let children = node.read().sublayers.clone();
            for c in &children {
                walk(c, f);
            }
        }
        for l in &self.layers {
            walk(l, f);
        }
    }

    /// Ids of the given layer and all its descendants, in tree order.
    pub fn subtree_ids(layer: &ERef<LayerModel>) -> Vec<String> {
        let mut ids = Vec::new();
        fn walk(node: &ERef<LayerModel>, ids: &mut Vec<String>) {
            let n = node.read();
            ids.push(n.id.clone());
            for c in &n.sublayers {
                walk(c, ids);
            }
        }
        walk(layer, &mut ids);
        ids
    }

    /// Locates a layer's position: parent folder id (None for a root layer)
    /// and its index among its siblings.
    pub fn position_of(&self, id: &str) -> Option<(Option<String>, usize)> {
        if let Some(idx) = self.layers.iter().position(|e| e.read().id == id) {
            return Some((None, idx));
        }
        fn walk(node: &ERef<LayerModel>, id: &str) -> Option<(String, usize)> {
            let n = node.read();
            if let Some(idx) = n.sublayers.iter().position(|e| e.read().id == id) {
                return Some((n.id.clone(), idx));
            }
            for c in &n.sublayers {
                if let Some(found) = walk(c, id) {
                    return Some(found);
                }
            }
            None
        }
        for l in &self.layers {
            if let Some((parent, idx)) = walk(l, id) {
                return Some((Some(parent), idx));
            }
        }
        None
    }

    pub fn parent_of(&self, id: &str) -> Option<ERef<LayerModel>> {
        match self.position_of(id)? {
            (Some(parent_id), _) => self.get_layer(&parent_id),
            (None, _) => None,
        }
    }

    /// Inserts a layer subtree under the given parent folder (or at the map
    /// root) at the given sibling index (clamped). The subtree's ids are
    /// registered - and deduplicated - before the insertion event fires, so
    /// observers only ever see unique ids. Returns the final subtree ids.
    pub fn insert_layer(
        &mut self,
        parent_id: Option<&str>,
        index: usize,
        layer: ERef<LayerModel>,
    ) -> Result<Vec<String>, ModelError> {
        let parent = match parent_id {
            Some(pid) => Some(
                self.get_layer(pid)
                    .ok_or_else(|| ModelError::LayerNotFound(pid.to_owned()))?,
            ),
            None => None,
        };
        let ids = self.register_subtree(&layer);
        match parent {
            Some(parent) => {
                let mut p = parent.write();
                let index = index.min(p.sublayers.len());
                p.sublayers.insert(index, layer);
            }
            None => {
                let index = index.min(self.layers.len());
                self.layers.insert(index, layer);
            }
        }
        self.events.emit(MapEvent::LayersAdded { ids: ids.clone() });
        Ok(ids)
    }

    /// Appends a layer subtree at the end of the root layer list.
    pub fn append_layer(&mut self, layer: ERef<LayerModel>) -> Vec<String> {
        let ids = self.register_subtree(&layer);
        self.layers.push(layer);
        self.events.emit(MapEvent::LayersAdded { ids: ids.clone() });
        ids
    }

    /// Detaches a layer subtree. Returns the subtree together with the
    /// parent id and sibling index it was removed from, which is exactly
    /// what a delete command needs to reinsert it on undo.
    pub fn remove_layer(
        &mut self,
        id: &str,
    ) -> Result<(ERef<LayerModel>, Option<String>, usize), ModelError> {
        let (parent_id, index) = self
            .position_of(id)
            .ok_or_else(|| ModelError::LayerNotFound(id.to_owned()))?;
        let layer = match &parent_id {
            Some(pid) => {
                let parent = self.get_layer(pid).unwrap();
                let mut p = parent.write();
                p.sublayers.remove(index)
            }
            None => self.layers.remove(index),
        };
        let ids = Self::subtree_ids(&layer);
        for removed in &ids {
            self.layers_by_id.remove(removed);
        }
        self.events.emit(MapEvent::LayersRemoved { ids });
        Ok((layer, parent_id, index))
    }

    fn register_subtree(&mut self, layer: &ERef<LayerModel>) -> Vec<String> {
        let mut ids = Vec::new();
        let id = {
            let mut l = layer.write();
            if l.id.is_empty() || self.layers_by_id.contains_key(&l.id) {
                l.id = self.next_unused_id();
            }
            l.id.clone()
        };
        self.layers_by_id.insert(id.clone(), layer.clone());
        ids.push(id);
        let children = layer.read().sublayers.clone();
        for c in &children {
            ids.extend(self.register_subtree(c));
        }
        ids
    }

    fn next_unused_id(&self) -> String {
        let mut n: u64 = 1;
        loop {
            let candidate = n.to_string();
            if !self.layers_by_id.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Reorders and reparents the whole layer tree to match the given
    /// ordering. The ordering must name every layer in the map exactly once;
    /// otherwise nothing is mutated.
    pub fn apply_ordering(&mut self, ordering: &[LayerOrdering]) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        fn collect(
            o: &LayerOrdering,
            seen: &mut HashSet<String>,
        ) -> Result<(), ModelError> {
            if !seen.insert(o.id.clone()) {
                return Err(ModelError::InvalidArrangement(format!(
                    "duplicate id '{}'",
                    o.id
                )));
            }
            for c in &o.sublayers {
                collect(c, seen)?;
            }
            Ok(())
        }
        for o in ordering {
            collect(o, &mut seen)?;
        }
        if seen.len() != self.layers_by_id.len()
            || !seen.iter().all(|id| self.layers_by_id.contains_key(id))
        {
            return Err(ModelError::InvalidArrangement(
                "ordering does not cover the layer tree".to_owned(),
            ));
        }

        fn build(map: &MapModel, o: &LayerOrdering) -> ERef<LayerModel> {
            let node = map.layers_by_id.get(&o.id).unwrap().clone();
            let children: Vec<_> = o.sublayers.iter().map(|c| build(map, c)).collect();
            node.write().sublayers = children;
            node
        }
        let rebuilt: Vec<_> = ordering.iter().map(|o| build(self, o)).collect();
        self.layers = rebuilt;
        self.events.emit(MapEvent::ModelChanged { layer_id: None });
        Ok(())
    }

    /// The current tree shape as an ordering, for arrange-command capture.
    pub fn current_ordering(&self) -> Vec<LayerOrdering> {
        fn walk(node: &ERef<LayerModel>) -> LayerOrdering {
            let n = node.read();
            LayerOrdering {
                id: n.id.clone(),
                sublayers: n.sublayers.iter().map(walk).collect(),
            }
        }
        self.layers.iter().map(walk).collect()
    }

    pub fn append_topic(&mut self, topic: ERef<TopicModel>) {
        self.topics.push(topic);
        self.events.emit(MapEvent::TopicsChanged);
    }

    pub fn pop_topic(&mut self) -> Result<ERef<TopicModel>, ModelError> {
        let topic = self.topics.pop().ok_or(ModelError::NoTopicToRemove)?;
        self.events.emit(MapEvent::TopicsChanged);
        Ok(topic)
    }

    /// Keyed property write on one layer; the change notification bubbles
    /// through the map's channel.
    pub fn set_layer_property(
        &mut self,
        id: &str,
        key: &str,
        value: &Value,
    ) -> Result<bool, ModelError> {
        let layer = self
            .get_layer(id)
            .ok_or_else(|| ModelError::LayerNotFound(id.to_owned()))?;
        let changed = layer.write().set_property(key, value)?;
        if changed {
            self.events.emit(MapEvent::ModelChanged {
                layer_id: Some(id.to_owned()),
            });
        }
        Ok(changed)
    }

    pub fn get_layer_property(&self, id: &str, key: &str) -> Result<Value, ModelError> {
        let layer = self
            .get_layer(id)
            .ok_or_else(|| ModelError::LayerNotFound(id.to_owned()))?;
        let v = layer.read().get_property(key);
        v
    }

    pub fn check_layer_property(
        &self,
        id: &str,
        key: &str,
        value: &Value,
    ) -> Result<(), ModelError> {
        let layer = self
            .get_layer(id)
            .ok_or_else(|| ModelError::LayerNotFound(id.to_owned()))?;
        let r = layer.read().check_property(key, value);
        r
    }

    pub fn get_map_property(&self, key: &str) -> Result<Value, ModelError> {
        Ok(match key {
            "title" => Value::String(self.title.clone()),
            "description" => Value::String(self.description.clone()),
            "footer" => Value::String(self.footer.clone()),
            "region" => self
                .region
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
            "thumbnail_url" => self
                .thumbnail_url
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
            "languages" => serde_json::to_value(&self.languages).unwrap_or(Value::Null),
            "viewport" => match self.viewport {
                Some(b) => serde_json::to_value(b).unwrap_or(Value::Null),
                None => Value::Null,
            },
            "full_extent" => match self.full_extent {
                Some(b) => serde_json::to_value(b).unwrap_or(Value::Null),
                None => Value::Null,
            },
            "base_map_type" => Value::String(self.base_map_type.wire_name().to_owned()),
            "base_map_style" => match &self.base_map_style {
                Some(s) => serde_json::json!({"definition": s.definition, "name": s.name}),
                None => Value::Null,
            },
            _ => return Err(ModelError::UnknownProperty(key.to_owned())),
        })
    }

    pub fn check_map_property(&self, key: &str, value: &Value) -> Result<(), ModelError> {
        let invalid = || ModelError::InvalidValue {
            key: key.to_owned(),
            value: value.clone(),
        };
        match key {
            "title" | "description" | "footer" | "region" | "thumbnail_url" => match value {
                Value::Null | Value::String(_) => Ok(()),
                _ => Err(invalid()),
            },
            "languages" => match value {
                Value::Null => Ok(()),
                v => serde_json::from_value::<Vec<String>>(v.clone())
                    .map(|_| ())
                    .map_err(|_| invalid()),
            },
            "viewport" | "full_extent" => match value {
                Value::Null => Ok(()),
                v => serde_json::from_value::<LatLonBox>(v.clone())
                    .map(|_| ())
                    .map_err(|_| invalid()),
            },
            "base_map_type" => match value.as_str().map(BaseMapType::from_wire) {
                Some(Some(_)) => Ok(()),
                _ => Err(invalid()),
            },
            "base_map_style" => match value {
                Value::Null => Ok(()),
                v if v.is_object() => Ok(()),
                _ => Err(invalid()),
            },
            _ => Err(ModelError::UnknownProperty(key.to_owned())),
        }
    }

    pub fn set_map_property(&mut self, key: &str, value: &Value) -> Result<bool, ModelError> {
        self.check_map_property(key, value)?;
        fn set_string(target: &mut String, value: &Value) -> bool {
            let new = value.as_str().unwrap_or("").to_owned();
            let changed = *target != new;
            *target = new;
            changed
        }
        fn set_opt_string(target: &mut Option<String>, value: &Value) -> bool {
            let new = value.as_str().map(|s| s.to_owned());
            let changed = *target != new;
            *target = new;
            changed
        }
        let changed = match key {
            "title" => set_string(&mut self.title, value),
            "description" => set_string(&mut self.description, value),
            "footer" => set_string(&mut self.footer, value),
            "region" => set_opt_string(&mut self.region, value),
            "thumbnail_url" => set_opt_string(&mut self.thumbnail_url, value),
            "languages" => {
                let new: Vec<String> = match value {
                    Value::Null => Vec::new(),
                    v => serde_json::from_value(v.clone()).unwrap(),
                };
                let changed = new != self.languages;
                self.languages = new;
                changed
            }
            "viewport" => {
                let new = match value {
                    Value::Null => None,
                    v => serde_json::from_value(v.clone()).ok(),
                };
                let changed = new != self.viewport;
                self.viewport = new;
                changed
            }
            "full_extent" => {
                let new = match value {
                    Value::Null => None,
                    v => serde_json::from_value(v.clone()).ok(),
                };
                let changed = new != self.full_extent;
                self.full_extent = new;
                changed
            }
            "base_map_type" => {
                let new = BaseMapType::from_wire(value.as_str().unwrap()).unwrap();
                let changed = new != self.base_map_type;
                self.base_map_type = new;
                changed
            }
            "base_map_style" => {
                let new = match value {
                    Value::Null => None,
                    v => Some(MapStyle {
                        definition: v
                            .get("definition")
                            .and_then(|e| e.as_str())
                            .unwrap_or("")
                            .to_owned(),
                        name: v.get("name").and_then(|e| e.as_str()).unwrap_or("").to_owned(),
                    }),
                };
                let changed = new != self.base_map_style;
                self.base_map_style = new;
                changed
            }
            _ => unreachable!(),
        };
        if changed {
            self.events.emit(MapEvent::ModelChanged { layer_id: None });
        }
        Ok(changed)
    }

    pub fn set_viewport(&mut self, viewport: Option<LatLonBox>) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.events.emit(MapEvent::ModelChanged { layer_id: None });
        }
    }

    pub fn set_base_map_type(&mut self, base_map_type: BaseMapType) {
        if self.base_map_type != base_map_type {
            self.base_map_type = base_map_type;
            self.events.emit(MapEvent::ModelChanged { layer_id: None });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::layer::LayerSource;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn layer_with_id(id: &str) -> ERef<LayerModel> {
        let mut l = LayerModel::new(LayerSource::Traffic);
        l.id = id.to_owned();
        ERef::new(l)
    }

    fn folder_with_children(id: &str, children: Vec<ERef<LayerModel>>) -> ERef<LayerModel> {
        let mut l = LayerModel::new(LayerSource::Folder);
        l.id = id.to_owned();
        l.sublayers = children;
        ERef::new(l)
    }

    fn assert_all_ids_unique(map: &MapModel) {
        let ids = map.layer_ids();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len(), "ids not unique: {:?}", ids);
    }

    #[test]
    fn test_blank_id_gets_smallest_unused_integer() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(layer_with_id(""));
        map.append_layer(layer_with_id(""));
        map.append_layer(layer_with_id("2"));
        assert_eq!(map.layer_ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_colliding_id_is_replaced() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(layer_with_id("dupe"));
        map.append_layer(layer_with_id("dupe"));
        assert_eq!(map.layer_ids(), vec!["dupe", "1"]);
        assert_all_ids_unique(&map);
    }

    #[test]
    fn test_nested_insertion_registers_whole_subtree() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(layer_with_id("a"));
        let subtree = folder_with_children(
            "f",
            vec![layer_with_id("a"), layer_with_id(""), layer_with_id("x")],
        );
        let ids = map.append_layer(subtree);
        // Collision "a" and blank id both resolved inside the subtree.
        assert_eq!(ids, vec!["f", "1", "2", "x"]);
        assert_all_ids_unique(&map);
        assert!(map.contains_layer("x"));
    }

    #[test]
    fn test_ids_are_final_before_added_event() {
        let events = EventChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        events.subscribe(move |e| {
            if let MapEvent::LayersAdded { ids } = e {
                seen2.lock().unwrap().extend(ids.iter().cloned());
            }
        });
        let mut map = MapModel::new(events);
        map.append_layer(layer_with_id(""));
        map.append_layer(layer_with_id("1"));
        assert_eq!(*seen.lock().unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_remove_layer_reports_position_and_unregisters() {
        let mut map = MapModel::new(EventChannel::new());
        let subtree =
            folder_with_children("f", vec![layer_with_id("a"), layer_with_id("b")]);
        map.append_layer(subtree);
        map.append_layer(layer_with_id("root2"));

        let (detached, parent_id, index) = map.remove_layer("b").unwrap();
        assert_eq!(detached.read().id, "b");
        assert_eq!(parent_id.as_deref(), Some("f"));
        assert_eq!(index, 1);
        assert!(!map.contains_layer("b"));

        let (_, parent_id, index) = map.remove_layer("f").unwrap();
        assert_eq!(parent_id, None);
        assert_eq!(index, 0);
        assert!(!map.contains_layer("a"));
        assert_eq!(map.layer_ids(), vec!["root2"]);
    }

    #[test]
    fn test_insert_at_index_under_parent() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(folder_with_children(
            "f",
            vec![layer_with_id("a"), layer_with_id("c")],
        ));
        map.insert_layer(Some("f"), 1, layer_with_id("b")).unwrap();
        assert_eq!(map.layer_ids(), vec!["f", "a", "b", "c"]);

        assert_eq!(
            map.insert_layer(Some("ghost"), 0, layer_with_id("x")),
            Err(ModelError::LayerNotFound("ghost".to_owned()))
        );
    }

    #[test]
    fn test_map_round_trip() {
        let root: MapRoot = serde_json::from_value(json!({
            "id": "map1",
            "title": "Flood response",
            "description": "Live flood data",
            "footer": "Data by NOAA",
            "languages": ["en", "fr"],
            "region": "us",
            "base_map_type": "GOOGLE_HYBRID",
            "viewport": {"lat_lon_alt_box": {"north": 40.0, "south": 30.0, "east": -70.0, "west": -80.0}},
            "layers": [
                {"id": "1", "title": "Water levels", "type": "KML",
                 "source": {"kml": {"url": "http://x/w.kml"}}},
                {"id": "folder", "type": "FOLDER", "list_item_type": "CHECK",
                 "sublayers": [{"id": "2", "type": "TRAFFIC"}]}
            ],
            "topics": [
                {"id": "t1", "title": "Shelters", "layer_ids": ["1"]}
            ]
        }))
        .unwrap();

        let map = MapModel::from_map_root(&root, EventChannel::new());
        assert_eq!(map.to_map_root(), root);
    }

    #[test]
    fn test_apply_ordering_reparents() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(folder_with_children("f", vec![layer_with_id("a")]));
        map.append_layer(layer_with_id("b"));

        // Move b into f, before a.
        map.apply_ordering(&[LayerOrdering {
            id: "f".to_owned(),
            sublayers: vec![
                LayerOrdering {
                    id: "b".to_owned(),
                    sublayers: vec![],
                },
                LayerOrdering {
                    id: "a".to_owned(),
                    sublayers: vec![],
                },
            ],
        }])
        .unwrap();
        assert_eq!(map.layer_ids(), vec!["f", "b", "a"]);
        assert_eq!(map.position_of("b"), Some((Some("f".to_owned()), 0)));
    }

    #[test]
    fn test_apply_ordering_must_cover_tree() {
        let mut map = MapModel::new(EventChannel::new());
        map.append_layer(layer_with_id("a"));
        map.append_layer(layer_with_id("b"));

        let partial = vec![LayerOrdering {
            id: "a".to_owned(),
            sublayers: vec![],
        }];
        assert!(matches!(
            map.apply_ordering(&partial),
            Err(ModelError::InvalidArrangement(_))
        ));
        // Nothing moved.
        assert_eq!(map.layer_ids(), vec!["a", "b"]);
    }

    #[test]
    fn test_layer_property_change_bubbles_to_map_channel() {
        let events = EventChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        events.subscribe(move |e| seen2.lock().unwrap().push(e.clone()));
        let mut map = MapModel::new(events);
        map.append_layer(layer_with_id("a"));

        map.set_layer_property("a", "title", &json!("Traffic")).unwrap();
        // Unchanged write stays silent.
        map.set_layer_property("a", "title", &json!("Traffic")).unwrap();

        let changes: Vec<_> = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, MapEvent::ModelChanged { .. }))
            .cloned()
            .collect();
        assert_eq!(
            changes,
            vec![MapEvent::ModelChanged {
                layer_id: Some("a".to_owned())
            }]
        );
    }
}
