use serde_json::Value;

use crate::common::eref::ERef;
use crate::maproot::{
    Extent, FusionMapRoot, LatLonBox, LayerMapRoot, MapDataMapRoot, SourceMapRoot, TileMapRoot,
    UrlMapRoot, WeatherMapRoot, WmsMapRoot,
};
use crate::model::ModelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerType {
    Folder,
    Kml,
    GeoRss,
    Tile,
    Fusion,
    MapData,
    Traffic,
    Transit,
    Weather,
    Cloud,
    Wms,
}

impl LayerType {
    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "FOLDER" => Self::Folder,
            "KML" => Self::Kml,
            "GEORSS" => Self::GeoRss,
            "TILE" => Self::Tile,
            "FUSION" => Self::Fusion,
            "MAP_DATA" => Self::MapData,
            "TRAFFIC" => Self::Traffic,
            "TRANSIT" => Self::Transit,
            "WEATHER" => Self::Weather,
            "CLOUD" => Self::Cloud,
            "WMS" => Self::Wms,
            _ => return None,
        })
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Folder => "FOLDER",
            Self::Kml => "KML",
            Self::GeoRss => "GEORSS",
            Self::Tile => "TILE",
            Self::Fusion => "FUSION",
            Self::MapData => "MAP_DATA",
            Self::Traffic => "TRAFFIC",
            Self::Transit => "TRANSIT",
            Self::Weather => "WEATHER",
            Self::Cloud => "CLOUD",
            Self::Wms => "WMS",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FolderType {
    Unlocked,
    Locked,
    SingleSelect,
}

impl FolderType {
    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "CHECK" => Self::Unlocked,
            "CHECK_HIDE_CHILDREN" => Self::Locked,
            "RADIO_FOLDER" => Self::SingleSelect,
            _ => return None,
        })
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Unlocked => "CHECK",
            Self::Locked => "CHECK_HIDE_CHILDREN",
            Self::SingleSelect => "RADIO_FOLDER",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Visibility {
    DefaultOn,
    #[default]
    DefaultOff,
    AlwaysOn,
}

impl Visibility {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "DEFAULT_ON" => Self::DefaultOn,
            "ALWAYS_ON" => Self::AlwaysOn,
            _ => Self::DefaultOff,
        }
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::DefaultOn => "DEFAULT_ON",
            Self::DefaultOff => "DEFAULT_OFF",
            Self::AlwaysOn => "ALWAYS_ON",
        }
    }

    pub fn default_on(&self) -> bool {
        !matches!(self, Self::DefaultOff)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TileCoordinateType {
    #[default]
    Google,
    Bing,
    Tms,
}

impl TileCoordinateType {
    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "GOOGLE" => Self::Google,
            "BING" => Self::Bing,
            "TMS" => Self::Tms,
            _ => return None,
        })
    }

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Google => "GOOGLE",
            Self::Bing => "BING",
            Self::Tms => "TMS",
        }
    }
}

/// Per-type source payload, only the fields valid for the layer's type.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerSource {
    Folder,
    Kml {
        url: String,
    },
    GeoRss {
        url: String,
    },
    Tile {
        url: String,
        coordinate_type: TileCoordinateType,
    },
    Fusion {
        select: String,
        from: String,
        where_clause: String,
    },
    MapData {
        table_id: String,
    },
    Traffic,
    Transit,
    Weather {
        temperature_unit: String,
        wind_speed_unit: String,
    },
    Cloud,
    Wms {
        url: String,
        layer_names: Vec<String>,
    },
}

impl LayerSource {
    pub fn layer_type(&self) -> LayerType {
        match self {
            Self::Folder => LayerType::Folder,
            Self::Kml { .. } => LayerType::Kml,
            Self::GeoRss { .. } => LayerType::GeoRss,
            Self::Tile { .. } => LayerType::Tile,
            Self::Fusion { .. } => LayerType::Fusion,
            Self::MapData { .. } => LayerType::MapData,
            Self::Traffic => LayerType::Traffic,
            Self::Transit => LayerType::Transit,
            Self::Weather { .. } => LayerType::Weather,
            Self::Cloud => LayerType::Cloud,
            Self::Wms { .. } => LayerType::Wms,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Kml { url } | Self::GeoRss { url } | Self::Tile { url, .. } | Self::Wms { url, .. } => {
                Some(url)
            }
            _ => None,
        }
    }

    /// Empty payload for the given type, carrying the url over when both the
    /// old and the new type are url-based.
    fn default_for(layer_type: LayerType, previous: &LayerSource) -> Self {
        let url = previous.url().unwrap_or("").to_owned();
        match layer_type {
            LayerType::Folder => Self::Folder,
            LayerType::Kml => Self::Kml { url },
            LayerType::GeoRss => Self::GeoRss { url },
            LayerType::Tile => Self::Tile {
                url,
                coordinate_type: TileCoordinateType::default(),
            },
            LayerType::Fusion => Self::Fusion {
                select: String::new(),
                from: String::new(),
                where_clause: String::new(),
            },
            LayerType::MapData => Self::MapData {
                table_id: String::new(),
            },
            LayerType::Traffic => Self::Traffic,
            LayerType::Transit => Self::Transit,
            LayerType::Weather => Self::Weather {
                temperature_unit: String::new(),
                wind_speed_unit: String::new(),
            },
            LayerType::Cloud => Self::Cloud,
            LayerType::Wms => Self::Wms {
                url,
                layer_names: Vec::new(),
            },
        }
    }
}

/// One node of the layer tree: a map layer or a folder of layers. Ids are
/// unique per map; uniqueness is enforced by the owning MapModel's registry,
/// not here.
#[derive(Debug)]
pub struct LayerModel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub legend: String,
    pub visibility: Visibility,
    pub viewport: Option<LatLonBox>,
    pub full_extent: Option<LatLonBox>,
    pub min_zoom: Option<u32>,
    pub max_zoom: Option<u32>,
    /// Fraction 0.0-1.0 in memory, 0-100 integer on the wire.
    pub opacity: f64,
    pub suppress_download_link: bool,
    pub suppress_info_windows: bool,
    pub clip_to_viewport: bool,
    /// Meaningful only while the type is FOLDER; None reads as UNLOCKED.
    pub folder_type: Option<FolderType>,
    pub source: LayerSource,
    /// Owned children; non-empty only for folders.
    pub sublayers: Vec<ERef<LayerModel>>,
}

impl LayerModel {
    pub fn new(source: LayerSource) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            legend: String::new(),
            visibility: Visibility::DefaultOff,
            viewport: None,
            full_extent: None,
            min_zoom: None,
            max_zoom: None,
            opacity: 1.0,
            suppress_download_link: false,
            suppress_info_windows: false,
            clip_to_viewport: false,
            folder_type: None,
            source,
            sublayers: Vec::new(),
        }
    }

    pub fn layer_type(&self) -> LayerType {
        self.source.layer_type()
    }

    pub fn is_folder(&self) -> bool {
        self.layer_type() == LayerType::Folder
    }

    pub fn is_single_select(&self) -> bool {
        self.is_folder() && self.folder_type == Some(FolderType::SingleSelect)
    }

    /// Changes the layer type, replacing the source payload. Moving away
    /// from FOLDER clears `folder_type` as a side effect.
    pub fn set_layer_type(&mut self, layer_type: LayerType) {
        if layer_type == self.layer_type() {
            return;
        }
        self.source = LayerSource::default_for(layer_type, &self.source);
        if layer_type != LayerType::Folder {
            self.folder_type = None;
        }
    }

    /// Deserializes one node and, recursively, its sublayers. Returns None
    /// for a missing or unrecognized `type`; the caller simply omits the
    /// node.
    pub fn from_map_root(root: &LayerMapRoot) -> Option<ERef<LayerModel>> {
        let layer_type = LayerType::from_wire(root.layer_type.as_deref()?)?;
        let empty = SourceMapRoot::default();
        let s = root.source.as_ref().unwrap_or(&empty);

        let source = match layer_type {
            LayerType::Folder => LayerSource::Folder,
            LayerType::Kml => LayerSource::Kml {
                url: s.kml.as_ref().and_then(|e| e.url.clone()).unwrap_or_default(),
            },
            LayerType::GeoRss => LayerSource::GeoRss {
                url: s.georss.as_ref().and_then(|e| e.url.clone()).unwrap_or_default(),
            },
            LayerType::Tile => LayerSource::Tile {
                url: s
                    .google_map_tiles
                    .as_ref()
                    .and_then(|e| e.url.clone())
                    .unwrap_or_default(),
                coordinate_type: s
                    .google_map_tiles
                    .as_ref()
                    .and_then(|e| e.tile_coordinate_type.as_deref())
                    .and_then(TileCoordinateType::from_wire)
                    .unwrap_or_default(),
            },
            LayerType::Fusion => {
                let f = s.google_fusion_tables.as_ref();
                LayerSource::Fusion {
                    select: f.and_then(|e| e.select.clone()).unwrap_or_default(),
                    from: f.and_then(|e| e.from.clone()).unwrap_or_default(),
                    where_clause: f.and_then(|e| e.where_clause.clone()).unwrap_or_default(),
                }
            }
            LayerType::MapData => LayerSource::MapData {
                table_id: s
                    .google_map_data
                    .as_ref()
                    .and_then(|e| e.table_id.clone())
                    .unwrap_or_default(),
            },
            LayerType::Traffic => LayerSource::Traffic,
            LayerType::Transit => LayerSource::Transit,
            LayerType::Weather => {
                let w = s.weather.as_ref();
                LayerSource::Weather {
                    temperature_unit: w.and_then(|e| e.temperature_unit.clone()).unwrap_or_default(),
                    wind_speed_unit: w.and_then(|e| e.wind_speed_unit.clone()).unwrap_or_default(),
                }
            }
            LayerType::Cloud => LayerSource::Cloud,
            LayerType::Wms => LayerSource::Wms {
                url: s.wms.as_ref().and_then(|e| e.url.clone()).unwrap_or_default(),
                layer_names: s
                    .wms
                    .as_ref()
                    .and_then(|e| e.layer_names.clone())
                    .unwrap_or_default(),
            },
        };

        let sublayers = if layer_type == LayerType::Folder {
            root.sublayers
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .filter_map(LayerModel::from_map_root)
                .collect()
        } else {
            Vec::new()
        };

        Some(ERef::new(Self {
            id: root.id.clone().unwrap_or_default(),
            title: root.title.clone().unwrap_or_default(),
            description: root.description.clone().unwrap_or_default(),
            legend: root.legend.clone().unwrap_or_default(),
            visibility: root
                .visibility
                .as_deref()
                .map(Visibility::from_wire)
                .unwrap_or_default(),
            viewport: Extent::unwrap_box(&root.viewport),
            full_extent: Extent::unwrap_box(&root.full_extent),
            min_zoom: root.min_zoom.map(|v| v.min(21)),
            max_zoom: root.max_zoom.map(|v| v.min(21)),
            opacity: root.opacity.map(|v| f64::from(v.min(100)) / 100.0).unwrap_or(1.0),
            suppress_download_link: root.suppress_download_link.unwrap_or(false),
            suppress_info_windows: root.suppress_info_windows.unwrap_or(false),
            clip_to_viewport: root.clip_to_viewport.unwrap_or(false),
            folder_type: if layer_type == LayerType::Folder {
                root.list_item_type
                    .as_deref()
                    .and_then(FolderType::from_wire)
            } else {
                None
            },
            source,
            sublayers,
        }))
    }

    pub fn to_map_root(&self) -> LayerMapRoot {
        let layer_type = self.layer_type();
        fn nonempty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_owned())
        }

        let source = match &self.source {
            LayerSource::Folder
            | LayerSource::Traffic
            | LayerSource::Transit
            | LayerSource::Cloud => None,
            LayerSource::Kml { url } => Some(SourceMapRoot {
                kml: Some(UrlMapRoot {
                    url: Some(url.clone()),
                }),
                ..Default::default()
            }),
            LayerSource::GeoRss { url } => Some(SourceMapRoot {
                georss: Some(UrlMapRoot {
                    url: Some(url.clone()),
                }),
                ..Default::default()
            }),
            LayerSource::Tile {
                url,
                coordinate_type,
            } => Some(SourceMapRoot {
                google_map_tiles: Some(TileMapRoot {
                    url: Some(url.clone()),
                    tile_coordinate_type: Some(coordinate_type.wire_name().to_owned()),
                }),
                ..Default::default()
            }),
            LayerSource::Fusion {
                select,
                from,
                where_clause,
            } => Some(SourceMapRoot {
                google_fusion_tables: Some(FusionMapRoot {
                    select: nonempty(select),
                    from: nonempty(from),
                    where_clause: nonempty(where_clause),
                }),
                ..Default::default()
            }),
            LayerSource::MapData { table_id } => Some(SourceMapRoot {
                google_map_data: Some(MapDataMapRoot {
                    table_id: nonempty(table_id),
                }),
                ..Default::default()
            }),
            LayerSource::Weather {
                temperature_unit,
                wind_speed_unit,
            } => Some(SourceMapRoot {
                weather: Some(WeatherMapRoot {
                    temperature_unit: nonempty(temperature_unit),
                    wind_speed_unit: nonempty(wind_speed_unit),
                }),
                ..Default::default()
            }),
            LayerSource::Wms { url, layer_names } => Some(SourceMapRoot {
                wms: Some(WmsMapRoot {
                    url: Some(url.clone()),
                    layer_names: (!layer_names.is_empty()).then(|| layer_names.clone()),
                }),
                ..Default::default()
            }),
        };

        LayerMapRoot {
            id: Some(self.id.clone()),
            title: nonempty(&self.title),
            description: nonempty(&self.description),
            legend: nonempty(&self.legend),
            visibility: (self.visibility != Visibility::DefaultOff)
                .then(|| self.visibility.wire_name().to_owned()),
            viewport: Extent::wrap(self.viewport),
            full_extent: Extent::wrap(self.full_extent),
            layer_type: Some(layer_type.wire_name().to_owned()),
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            opacity: {
                let v = (self.opacity * 100.0).round() as u32;
                (v != 100).then_some(v)
            },
            suppress_download_link: self.suppress_download_link.then_some(true),
            suppress_info_windows: self.suppress_info_windows.then_some(true),
            clip_to_viewport: self.clip_to_viewport.then_some(true),
            list_item_type: (layer_type == LayerType::Folder)
                .then(|| self.folder_type.map(|e| e.wire_name().to_owned()))
                .flatten(),
            source,
            sublayers: (layer_type == LayerType::Folder && !self.sublayers.is_empty())
                .then(|| self.sublayers.iter().map(|e| e.read().to_map_root()).collect()),
        }
    }

    /// Keyed property read for the edit command. Keys and value conventions
    /// are the MapRoot field names; unset properties read as Null.
    pub fn get_property(&self, key: &str) -> Result<Value, ModelError> {
        Ok(match key {
            "title" => Value::String(self.title.clone()),
            "description" => Value::String(self.description.clone()),
            "legend" => Value::String(self.legend.clone()),
            "type" => Value::String(self.layer_type().wire_name().to_owned()),
            "visibility" => Value::String(self.visibility.wire_name().to_owned()),
            "viewport" => match self.viewport {
                Some(b) => serde_json::to_value(b).unwrap_or(Value::Null),
                None => Value::Null,
            },
            "full_extent" => match self.full_extent {
                Some(b) => serde_json::to_value(b).unwrap_or(Value::Null),
                None => Value::Null,
            },
            "min_zoom" => self.min_zoom.map(Value::from).unwrap_or(Value::Null),
            "max_zoom" => self.max_zoom.map(Value::from).unwrap_or(Value::Null),
            "opacity" => Value::from((self.opacity * 100.0).round() as u32),
            "suppress_download_link" => Value::Bool(self.suppress_download_link),
            "suppress_info_windows" => Value::Bool(self.suppress_info_windows),
            "clip_to_viewport" => Value::Bool(self.clip_to_viewport),
            "list_item_type" => self
                .folder_type
                .map(|e| Value::String(e.wire_name().to_owned()))
                .unwrap_or(Value::Null),
            "url" => self
                .source
                .url()
                .map(|e| Value::String(e.to_owned()))
                .unwrap_or(Value::Null),
            "tile_coordinate_type" => match &self.source {
                LayerSource::Tile {
                    coordinate_type, ..
                } => Value::String(coordinate_type.wire_name().to_owned()),
                _ => Value::Null,
            },
            "select" | "from" | "where" => match &self.source {
                LayerSource::Fusion {
                    select,
                    from,
                    where_clause,
                } => Value::String(
                    match key {
                        "select" => select,
                        "from" => from,
                        _ => where_clause,
                    }
                    .clone(),
                ),
                _ => Value::Null,
            },
            "table_id" => match &self.source {
                LayerSource::MapData { table_id } => Value::String(table_id.clone()),
                _ => Value::Null,
            },
            "temperature_unit" | "wind_speed_unit" => match &self.source {
                LayerSource::Weather {
                    temperature_unit,
                    wind_speed_unit,
                } => Value::String(
                    if key == "temperature_unit" {
                        temperature_unit
                    } else {
                        wind_speed_unit
                    }
                    .clone(),
                ),
                _ => Value::Null,
            },
            "layer_names" => match &self.source {
                LayerSource::Wms { layer_names, .. } => {
                    serde_json::to_value(layer_names).unwrap_or(Value::Null)
                }
                _ => Value::Null,
            },
            _ => return Err(ModelError::UnknownProperty(key.to_owned())),
        })
    }

    /// Keyed property write. Null resets the property to its unset default.
    /// Returns whether anything actually changed.
    pub fn set_property(&mut self, key: &str, value: &Value) -> Result<bool, ModelError> {
        // Validation happens up front so a failed edit leaves the layer
        // untouched.
        self.check_property(key, value)?;

        let changed = match key {
            "title" => set_string(&mut self.title, value),
            "description" => set_string(&mut self.description, value),
            "legend" => set_string(&mut self.legend, value),
            "type" => {
                let layer_type = LayerType::from_wire(value.as_str().unwrap()).unwrap();
                let changed = layer_type != self.layer_type();
                self.set_layer_type(layer_type);
                changed
            }
            "visibility" => {
                let v = match value {
                    Value::Null => Visibility::DefaultOff,
                    v => Visibility::from_wire(v.as_str().unwrap()),
                };
                let changed = v != self.visibility;
                self.visibility = v;
                changed
            }
            "viewport" => set_box(&mut self.viewport, value),
            "full_extent" => set_box(&mut self.full_extent, value),
            "min_zoom" => set_zoom(&mut self.min_zoom, value),
            "max_zoom" => set_zoom(&mut self.max_zoom, value),
            "opacity" => {
                let v = match value {
                    Value::Null => 1.0,
                    v => f64::from(v.as_u64().unwrap().min(100) as u32) / 100.0,
                };
                let changed = v != self.opacity;
                self.opacity = v;
                changed
            }
            "suppress_download_link" => set_bool(&mut self.suppress_download_link, value),
            "suppress_info_windows" => set_bool(&mut self.suppress_info_windows, value),
            "clip_to_viewport" => set_bool(&mut self.clip_to_viewport, value),
            "list_item_type" => {
                let v = match value {
                    Value::Null => None,
                    v => FolderType::from_wire(v.as_str().unwrap()),
                };
                // Only folders carry a folder type; see the FOLDER invariant.
                let v = if self.is_folder() { v } else { None };
                let changed = v != self.folder_type;
                self.folder_type = v;
                changed
            }
            "url" => {
                let new = string_or_empty(value);
                match &mut self.source {
                    LayerSource::Kml { url }
                    | LayerSource::GeoRss { url }
                    | LayerSource::Tile { url, .. }
                    | LayerSource::Wms { url, .. } => {
                        let changed = *url != new;
                        *url = new;
                        changed
                    }
                    _ => false,
                }
            }
            "tile_coordinate_type" => match &mut self.source {
                LayerSource::Tile {
                    coordinate_type, ..
                } => {
                    let v = match value {
                        Value::Null => TileCoordinateType::default(),
                        v => TileCoordinateType::from_wire(v.as_str().unwrap()).unwrap(),
                    };
                    let changed = v != *coordinate_type;
                    *coordinate_type = v;
                    changed
                }
                _ => false,
            },
            "select" | "from" | "where" => match &mut self.source {
                LayerSource::Fusion {
                    select,
                    from,
                    where_clause,
                } => set_string(
                    match key {
                        "select" => select,
                        "from" => from,
                        _ => where_clause,
                    },
                    value,
                ),
                _ => false,
            },
            "table_id" => match &mut self.source {
                LayerSource::MapData { table_id } => set_string(table_id, value),
                _ => false,
            },
            "temperature_unit" | "wind_speed_unit" => match &mut self.source {
                LayerSource::Weather {
                    temperature_unit,
                    wind_speed_unit,
                } => set_string(
                    if key == "temperature_unit" {
                        temperature_unit
                    } else {
                        wind_speed_unit
                    },
                    value,
                ),
                _ => false,
            },
            "layer_names" => match &mut self.source {
                LayerSource::Wms { layer_names, .. } => {
                    let v: Vec<String> = match value {
                        Value::Null => Vec::new(),
                        v => serde_json::from_value(v.clone()).unwrap(),
                    };
                    let changed = v != *layer_names;
                    *layer_names = v;
                    changed
                }
                _ => false,
            },
            _ => unreachable!(),
        };
        Ok(changed)
    }

    /// Dry-run validation of a keyed write; shares the key table with
    /// `set_property`.
    pub fn check_property(&self, key: &str, value: &Value) -> Result<(), ModelError> {
        let invalid = || ModelError::InvalidValue {
            key: key.to_owned(),
            value: value.clone(),
        };
        match key {
            "title" | "description" | "legend" => match value {
                Value::Null | Value::String(_) => Ok(()),
                _ => Err(invalid()),
            },
            // Source payload keys only exist on the matching layer type.
            "url" | "select" | "from" | "where" | "table_id" | "temperature_unit"
            | "wind_speed_unit" => {
                let applies = match key {
                    "url" => self.source.url().is_some(),
                    "select" | "from" | "where" => {
                        matches!(self.source, LayerSource::Fusion { .. })
                    }
                    "table_id" => matches!(self.source, LayerSource::MapData { .. }),
                    _ => matches!(self.source, LayerSource::Weather { .. }),
                };
                if !applies {
                    return Err(ModelError::UnknownProperty(key.to_owned()));
                }
                match value {
                    Value::Null | Value::String(_) => Ok(()),
                    _ => Err(invalid()),
                }
            }
            "type" => match value.as_str().map(LayerType::from_wire) {
                Some(Some(_)) => Ok(()),
                _ => Err(invalid()),
            },
            "visibility" => match value {
                Value::Null | Value::String(_) => Ok(()),
                _ => Err(invalid()),
            },
            "viewport" | "full_extent" => match value {
                Value::Null => Ok(()),
                v => serde_json::from_value::<LatLonBox>(v.clone())
                    .map(|_| ())
                    .map_err(|_| invalid()),
            },
            "min_zoom" | "max_zoom" => match value {
                Value::Null => Ok(()),
                v => match v.as_u64() {
                    Some(z) if z <= 21 => Ok(()),
                    _ => Err(invalid()),
                },
            },
            "opacity" => match value {
                Value::Null => Ok(()),
                v if v.as_u64().is_some_and(|o| o <= 100) => Ok(()),
                _ => Err(invalid()),
            },
            "suppress_download_link" | "suppress_info_windows" | "clip_to_viewport" => {
                match value {
                    Value::Null | Value::Bool(_) => Ok(()),
                    _ => Err(invalid()),
                }
            }
            "list_item_type" => match value {
                Value::Null => Ok(()),
                v => match v.as_str().and_then(FolderType::from_wire) {
                    Some(_) => Ok(()),
                    None => Err(invalid()),
                },
            },
            "tile_coordinate_type" => {
                if !matches!(self.source, LayerSource::Tile { .. }) {
                    return Err(ModelError::UnknownProperty(key.to_owned()));
                }
                match value {
                    Value::Null => Ok(()),
                    v => match v.as_str().and_then(TileCoordinateType::from_wire) {
                        Some(_) => Ok(()),
                        None => Err(invalid()),
                    },
                }
            }
            "layer_names" => {
                if !matches!(self.source, LayerSource::Wms { .. }) {
                    return Err(ModelError::UnknownProperty(key.to_owned()));
                }
                match value {
                    Value::Null => Ok(()),
                    v => serde_json::from_value::<Vec<String>>(v.clone())
                        .map(|_| ())
                        .map_err(|_| invalid()),
                }
            }
            _ => Err(ModelError::UnknownProperty(key.to_owned())),
        }
    }
}

fn string_or_empty(value: &Value) -> String {
    value.as_str().unwrap_or("").to_owned()
}

fn set_string(target: &mut String, value: &Value) -> bool {
    let new = string_or_empty(value);
    let changed = *target != new;
    *target = new;
    changed
}

fn set_bool(target: &mut bool, value: &Value) -> bool {
    let new = value.as_bool().unwrap_or(false);
    let changed = *target != new;
    *target = new;
    changed
}

fn set_zoom(target: &mut Option<u32>, value: &Value) -> bool {
    let new = value.as_u64().map(|z| z as u32);
    let changed = *target != new;
    *target = new;
    changed
}

fn set_box(target: &mut Option<LatLonBox>, value: &Value) -> bool {
    let new = match value {
        Value::Null => None,
        v => serde_json::from_value(v.clone()).ok(),
    };
    let changed = *target != new;
    *target = new;
    changed
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn round_trip(json: serde_json::Value) -> (LayerMapRoot, LayerMapRoot) {
        let root: LayerMapRoot = serde_json::from_value(json).unwrap();
        let model = LayerModel::from_map_root(&root).unwrap();
        let out = model.read().to_map_root();
        (root, out)
    }

    #[test]
    fn test_round_trip_kml() {
        let (root, out) = round_trip(json!({
            "id": "rivers",
            "title": "Rivers",
            "description": "<b>All</b> rivers",
            "legend": "blue = water",
            "visibility": "DEFAULT_ON",
            "type": "KML",
            "min_zoom": 3,
            "max_zoom": 15,
            "opacity": 62,
            "suppress_info_windows": true,
            "viewport": {"lat_lon_alt_box": {"north": 10.0, "south": -10.0, "east": 20.0, "west": -20.0}},
            "source": {"kml": {"url": "http://example.com/rivers.kml"}}
        }));
        assert_eq!(root, out);
    }

    #[test]
    fn test_round_trip_every_type() {
        for (t, source) in [
            ("TILE", Some(json!({"google_map_tiles": {"url": "http://t/{X}/{Y}", "tile_coordinate_type": "BING"}}))),
            ("FUSION", Some(json!({"google_fusion_tables": {"select": "geo", "from": "12345", "where": "kind = 'shelter'"}}))),
            ("MAP_DATA", Some(json!({"google_map_data": {"table_id": "t99"}}))),
            ("GEORSS", Some(json!({"georss": {"url": "http://x/feed"}}))),
            ("WEATHER", Some(json!({"weather": {"temperature_unit": "CELSIUS", "wind_speed_unit": "KILOMETERS_PER_HOUR"}}))),
            ("WMS", Some(json!({"wms": {"url": "http://wms/", "layer_names": ["a", "b"]}}))),
            ("TRAFFIC", None),
            ("TRANSIT", None),
            ("CLOUD", None),
        ] {
            let mut obj = json!({"id": "x", "type": t});
            if let Some(s) = source {
                obj["source"] = s;
            }
            let (root, out) = round_trip(obj);
            assert_eq!(root, out, "type {}", t);
        }
    }

    #[test]
    fn test_round_trip_folder_tree() {
        let (root, out) = round_trip(json!({
            "id": "f",
            "type": "FOLDER",
            "list_item_type": "RADIO_FOLDER",
            "sublayers": [
                {"id": "a", "type": "KML", "source": {"kml": {"url": "http://x/a"}}},
                {"id": "b", "type": "FOLDER", "sublayers": [
                    {"id": "c", "type": "TRAFFIC"}
                ]}
            ]
        }));
        assert_eq!(root, out);
    }

    #[test]
    fn test_unrecognized_type_is_skipped() {
        let root: LayerMapRoot =
            serde_json::from_value(json!({"id": "x", "type": "HOLOGRAM"})).unwrap();
        assert!(LayerModel::from_map_root(&root).is_none());

        // A bad child disappears without dooming its folder.
        let root: LayerMapRoot = serde_json::from_value(json!({
            "id": "f",
            "type": "FOLDER",
            "sublayers": [
                {"id": "bad", "type": "HOLOGRAM"},
                {"id": "ok", "type": "TRANSIT"}
            ]
        }))
        .unwrap();
        let folder = LayerModel::from_map_root(&root).unwrap();
        let folder = folder.read();
        assert_eq!(folder.sublayers.len(), 1);
        assert_eq!(folder.sublayers[0].read().id, "ok");
    }

    #[test]
    fn test_leaving_folder_clears_folder_type() {
        let mut layer = LayerModel::new(LayerSource::Folder);
        layer.folder_type = Some(FolderType::SingleSelect);

        layer.set_layer_type(LayerType::Kml);
        assert_eq!(layer.folder_type, None);
        assert_eq!(layer.layer_type(), LayerType::Kml);
    }

    #[test]
    fn test_set_type_property_carries_url() {
        let mut layer = LayerModel::new(LayerSource::Kml {
            url: "http://x/a.kml".to_owned(),
        });
        layer
            .set_property("type", &json!("GEORSS"))
            .unwrap();
        assert_eq!(
            layer.source,
            LayerSource::GeoRss {
                url: "http://x/a.kml".to_owned()
            }
        );
    }

    #[test]
    fn test_property_null_resets() {
        let mut layer = LayerModel::new(LayerSource::Traffic);
        layer.set_property("title", &json!("Jam")).unwrap();
        layer.set_property("opacity", &json!(40)).unwrap();
        layer.set_property("min_zoom", &json!(5)).unwrap();

        assert!(layer.set_property("title", &Value::Null).unwrap());
        assert!(layer.set_property("opacity", &Value::Null).unwrap());
        assert!(layer.set_property("min_zoom", &Value::Null).unwrap());
        assert_eq!(layer.title, "");
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.min_zoom, None);
        // Resetting twice changes nothing.
        assert!(!layer.set_property("title", &Value::Null).unwrap());
    }

    #[test]
    fn test_source_keys_rejected_for_other_layer_types() {
        let mut layer = LayerModel::new(LayerSource::Traffic);
        assert_eq!(
            layer.set_property("url", &json!("http://x")),
            Err(ModelError::UnknownProperty("url".to_owned()))
        );
        assert_eq!(
            layer.set_property("table_id", &json!("t1")),
            Err(ModelError::UnknownProperty("table_id".to_owned()))
        );

        let mut tile = LayerModel::new(LayerSource::Tile {
            url: String::new(),
            coordinate_type: TileCoordinateType::default(),
        });
        assert!(tile.set_property("url", &json!("http://t/{X}")).unwrap());
        assert_eq!(
            tile.set_property("layer_names", &json!(["a"])),
            Err(ModelError::UnknownProperty("layer_names".to_owned()))
        );
        assert_eq!(
            tile.set_property("select", &json!("geo")),
            Err(ModelError::UnknownProperty("select".to_owned()))
        );
    }

    #[test]
    fn test_invalid_property_values_rejected() {
        let mut layer = LayerModel::new(LayerSource::Traffic);
        assert_eq!(
            layer.set_property("min_zoom", &json!(99)),
            Err(ModelError::InvalidValue {
                key: "min_zoom".to_owned(),
                value: json!(99)
            })
        );
        assert_eq!(
            layer.set_property("frobnication", &json!(1)),
            Err(ModelError::UnknownProperty("frobnication".to_owned()))
        );
    }
}
