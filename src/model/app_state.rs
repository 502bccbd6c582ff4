use std::collections::{BTreeMap, BTreeSet};

use crate::common::eref::ERef;
use crate::common::events::{EventChannel, MapEvent};
use crate::maproot::LatLonBox;
use crate::model::layer::LayerModel;
use crate::model::map::{BaseMapType, MapModel};

/// Per-session view state: which layers are turned on, their opacity
/// overrides, the viewport and the base map type. It is never persisted with
/// the map itself, only encoded into shareable URIs. Every mutator suppresses
/// the change notification when the written value equals the current one.
pub struct AppState {
    language: String,
    enabled_layer_ids: BTreeSet<String>,
    matched_layer_ids: BTreeSet<String>,
    layer_opacities: BTreeMap<String, u8>,
    viewport: Option<LatLonBox>,
    map_type: BaseMapType,
    filter_query: String,
    events: EventChannel,
}

/// A frozen copy of the view state that a default-view command swaps in and
/// out of the map.
#[derive(Clone, Debug, PartialEq)]
pub struct AppStateSnapshot {
    pub enabled_layer_ids: BTreeSet<String>,
    pub layer_opacities: BTreeMap<String, u8>,
    pub viewport: Option<LatLonBox>,
    pub map_type: BaseMapType,
}

impl AppState {
    pub fn new(events: EventChannel) -> Self {
        Self {
            language: String::new(),
            enabled_layer_ids: BTreeSet::new(),
            matched_layer_ids: BTreeSet::new(),
            layer_opacities: BTreeMap::new(),
            viewport: None,
            map_type: BaseMapType::default(),
            filter_query: String::new(),
            events,
        }
    }

    pub fn events(&self) -> EventChannel {
        self.events.clone()
    }

    fn changed(&self) {
        self.events.emit(MapEvent::AppStateChanged);
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: &str) {
        if self.language != language {
            self.language = language.to_owned();
            self.changed();
        }
    }

    pub fn enabled_layer_ids(&self) -> &BTreeSet<String> {
        &self.enabled_layer_ids
    }

    pub fn matched_layer_ids(&self) -> &BTreeSet<String> {
        &self.matched_layer_ids
    }

    pub fn is_layer_enabled(&self, id: &str) -> bool {
        self.enabled_layer_ids.contains(id)
    }

    /// Toggles one layer's membership in the enabled set. Returns whether
    /// anything changed; callers rely on unchanged writes staying silent.
    pub fn set_layer_enabled(&mut self, id: &str, enabled: bool) -> bool {
        let changed = if enabled {
            self.enabled_layer_ids.insert(id.to_owned())
        } else {
            self.enabled_layer_ids.remove(id)
        };
        if changed {
            self.changed();
        }
        changed
    }

    /// Opacity override 0-100; 100 (fully opaque) is the default and is not
    /// stored.
    pub fn layer_opacity(&self, id: &str) -> u8 {
        self.layer_opacities.get(id).copied().unwrap_or(100)
    }

    pub fn layer_opacities(&self) -> &BTreeMap<String, u8> {
        &self.layer_opacities
    }

    pub fn set_layer_opacity(&mut self, id: &str, opacity: u8) {
        let opacity = opacity.min(100);
        let changed = if opacity == 100 {
            self.layer_opacities.remove(id).is_some()
        } else {
            self.layer_opacities.insert(id.to_owned(), opacity) != Some(opacity)
        };
        if changed {
            self.changed();
        }
    }

    pub fn viewport(&self) -> Option<LatLonBox> {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Option<LatLonBox>) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.changed();
        }
    }

    pub fn map_type(&self) -> BaseMapType {
        self.map_type
    }

    pub fn set_map_type(&mut self, map_type: BaseMapType) {
        if self.map_type != map_type {
            self.map_type = map_type;
            self.changed();
        }
    }

    pub fn filter_query(&self) -> &str {
        &self.filter_query
    }

    pub fn set_filter_query(&mut self, query: &str) {
        if self.filter_query != query {
            self.filter_query = query.to_owned();
            self.changed();
        }
    }

    /// Marks one layer of a folder as the promoted sibling, displacing any
    /// other direct siblings from the matched set. Works on a scratch copy
    /// and commits once, so an already-promoted layer produces no
    /// notification.
    pub fn promote_layer(&mut self, layer: &ERef<LayerModel>, map: &MapModel) {
        let id = layer.read().id.clone();
        let mut matched = self.matched_layer_ids.clone();
        if let Some(parent) = map.parent_of(&id) {
            for sibling in &parent.read().sublayers {
                let sid = sibling.read().id.clone();
                if sid != id {
                    matched.remove(&sid);
                }
            }
        }
        matched.insert(id);
        if matched != self.matched_layer_ids {
            self.matched_layer_ids = matched;
            self.changed();
        }
    }

    /// Drops every descendant of the given layer from the matched set.
    pub fn demote_sublayers(&mut self, layer: &ERef<LayerModel>) {
        let mut matched = self.matched_layer_ids.clone();
        fn walk(node: &ERef<LayerModel>, matched: &mut BTreeSet<String>) {
            let n = node.read();
            for c in &n.sublayers {
                matched.remove(&c.read().id);
                walk(c, matched);
            }
        }
        walk(layer, &mut matched);
        if matched != self.matched_layer_ids {
            self.matched_layer_ids = matched;
            self.changed();
        }
    }

    /// Restores the single-select invariant across the whole layer tree:
    /// every SINGLE_SELECT folder with at least one sublayer ends up with
    /// exactly one enabled direct sublayer. The already-enabled sublayer
    /// wins; with none (or after its deletion) the first sublayer is
    /// selected. The walk mutates a scratch set and commits once, emitting
    /// at most one notification.
    pub fn update_single_select_folders(&mut self, map: &MapModel) {
        let mut enabled = self.enabled_layer_ids.clone();
        map.for_each_layer(&mut |folder| {
            let f = folder.read();
            if !f.is_single_select() || f.sublayers.is_empty() {
                return;
            }
            let child_ids: Vec<String> =
                f.sublayers.iter().map(|c| c.read().id.clone()).collect();
            let selected = child_ids
                .iter()
                .find(|id| enabled.contains(*id))
                .cloned()
                .unwrap_or_else(|| child_ids[0].clone());
            for id in child_ids {
                if id == selected {
                    enabled.insert(id);
                } else {
                    enabled.remove(&id);
                }
            }
        });
        if enabled != self.enabled_layer_ids {
            self.enabled_layer_ids = enabled;
            self.changed();
        }
    }

    pub fn snapshot(&self) -> AppStateSnapshot {
        AppStateSnapshot {
            enabled_layer_ids: self.enabled_layer_ids.clone(),
            layer_opacities: self.layer_opacities.clone(),
            viewport: self.viewport,
            map_type: self.map_type,
        }
    }

    pub fn restore(&mut self, snapshot: &AppStateSnapshot) {
        let current = self.snapshot();
        if current == *snapshot {
            return;
        }
        self.enabled_layer_ids = snapshot.enabled_layer_ids.clone();
        self.layer_opacities = snapshot.layer_opacities.clone();
        self.viewport = snapshot.viewport;
        self.map_type = snapshot.map_type;
        self.changed();
    }

    /// The canonical query-string rendering of the view state, used for
    /// share links. Parameter order is fixed: `hl`, `llbox`, `t`, `layers`,
    /// `q`; parameters for unset state are omitted. Viewport coordinates are
    /// rounded to four decimals.
    pub fn to_uri_params(&self) -> String {
        let mut params = Vec::new();
        if !self.language.is_empty() {
            params.push(format!("hl={}", encode_component(&self.language)));
        }
        if let Some(b) = self.viewport {
            let r = b.rounded();
            params.push(format!(
                "llbox={:.4},{:.4},{:.4},{:.4}",
                r.north, r.south, r.east, r.west
            ));
        }
        params.push(format!("t={}", self.map_type.wire_name()));
        if !self.enabled_layer_ids.is_empty() {
            let layers: Vec<String> = self
                .enabled_layer_ids
                .iter()
                .map(|id| match self.layer_opacities.get(id) {
                    Some(op) => format!("{id}:{op}"),
                    None => id.clone(),
                })
                .collect();
            params.push(format!("layers={}", layers.join(",")));
        }
        if !self.filter_query.is_empty() {
            params.push(format!("q={}", encode_component(&self.filter_query)));
        }
        params.join("&")
    }

    /// Reads view state back from a query string produced by
    /// `to_uri_params`. Unknown parameters are ignored; a malformed value
    /// leaves the corresponding field alone. The `layers` parameter (even
    /// when absent) replaces the whole enabled set and all opacity
    /// overrides.
    pub fn set_from_uri_params(&mut self, params: &str) {
        let mut enabled = BTreeSet::new();
        let mut opacities = BTreeMap::new();
        let mut query = String::new();
        for pair in params.split('&') {
            let (key, value) = match pair.split_once('=') {
                Some(kv) => kv,
                None => continue,
            };
            match key {
                "hl" => self.set_language(&decode_component(value)),
                "llbox" => {
                    let parts: Vec<f64> = value
                        .split(',')
                        .filter_map(|p| p.parse().ok())
                        .collect();
                    if let [north, south, east, west] = parts[..] {
                        self.set_viewport(Some(LatLonBox {
                            north,
                            south,
                            east,
                            west,
                        }));
                    }
                }
                "t" => {
                    if let Some(t) = BaseMapType::from_wire(value) {
                        self.set_map_type(t);
                    }
                }
                "layers" => {
                    for entry in value.split(',').filter(|e| !e.is_empty()) {
                        match entry.split_once(':') {
                            Some((id, op)) => {
                                enabled.insert(id.to_owned());
                                if let Ok(op) = op.parse::<u8>() {
                                    if op < 100 {
                                        opacities.insert(id.to_owned(), op);
                                    }
                                }
                            }
                            None => {
                                enabled.insert(entry.to_owned());
                            }
                        }
                    }
                }
                "q" => query = decode_component(value),
                _ => {}
            }
        }
        let changed =
            enabled != self.enabled_layer_ids || opacities != self.layer_opacities;
        self.enabled_layer_ids = enabled;
        self.layer_opacities = opacities;
        if changed {
            self.changed();
        }
        self.set_filter_query(&query);
    }
}

fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

fn decode_component(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();
    while let Some(b) = iter.next() {
        match b {
            b'%' => {
                let hi = iter.next();
                let lo = iter.next();
                let decoded = hi.zip(lo).and_then(|(h, l)| {
                    let h = (h as char).to_digit(16)?;
                    let l = (l as char).to_digit(16)?;
                    Some((h * 16 + l) as u8)
                });
                match decoded {
                    Some(d) => bytes.push(d),
                    // Malformed escape: keep the consumed bytes verbatim.
                    None => {
                        bytes.push(b'%');
                        bytes.extend(hi);
                        bytes.extend(lo);
                    }
                }
            }
            b'+' => bytes.push(b' '),
            _ => bytes.push(b),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
