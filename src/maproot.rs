//! MapRoot - the persistent JSON interchange format for a map.
//!
//! These are plain wire DTOs; the in-memory model types convert through them
//! via `to_map_root`/`from_map_root`. Absent and null keys are
//! interchangeable on the wire: every optional field is an `Option` that is
//! omitted when `None`, while `false`, `0` and `""` survive untouched.

use serde::{Deserialize, Serialize};

/// A lat/lon bounding box in degrees.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LatLonBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl LatLonBox {
    /// Rounds all four edges to 4 decimal places, the precision used by the
    /// AppState URI encoding.
    pub fn rounded(self) -> Self {
        fn r4(v: f64) -> f64 {
            (v * 10_000.0).round() / 10_000.0
        }
        Self {
            north: r4(self.north),
            south: r4(self.south),
            east: r4(self.east),
            west: r4(self.west),
        }
    }
}

/// Wire wrapper around a bounding box: `{"lat_lon_alt_box": {...}}`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Extent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_lon_alt_box: Option<LatLonBox>,
}

impl Extent {
    pub fn wrap(b: Option<LatLonBox>) -> Option<Extent> {
        b.map(|b| Extent {
            lat_lon_alt_box: Some(b),
        })
    }

    pub fn unwrap_box(e: &Option<Extent>) -> Option<LatLonBox> {
        e.as_ref().and_then(|e| e.lat_lon_alt_box)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct BaseMapStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct MapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Extent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_extent: Option<Extent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_map_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_map_style: Option<BaseMapStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<LayerMapRoot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<TopicMapRoot>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct LayerMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    /// DEFAULT_ON | DEFAULT_OFF | ALWAYS_ON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Extent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_extent: Option<Extent>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<u32>,
    /// 0-100; 100 is the default and is omitted on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_download_link: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppress_info_windows: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_to_viewport: Option<bool>,
    /// Folders only: CHECK | CHECK_HIDE_CHILDREN | RADIO_FOLDER
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_item_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMapRoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sublayers: Option<Vec<LayerMapRoot>>,
}

/// Type-specific source payloads. Exactly one sub-object is expected to be
/// populated, matching the layer's `type`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct SourceMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kml: Option<UrlMapRoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub georss: Option<UrlMapRoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_map_tiles: Option<TileMapRoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_fusion_tables: Option<FusionMapRoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_map_data: Option<MapDataMapRoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherMapRoot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wms: Option<WmsMapRoot>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct UrlMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct TileMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// GOOGLE | BING | TMS
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_coordinate_type: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct FusionMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct MapDataMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct WeatherMapRoot {
    /// CELSIUS | FAHRENHEIT
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<String>,
    /// KILOMETERS_PER_HOUR | MILES_PER_HOUR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed_unit: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct WmsMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_names: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct TopicMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Extent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crowd_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<QuestionMapRoot>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct QuestionMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    // "answers" is the legacy name for the same list; only "choices" is
    // ever written back.
    #[serde(alias = "answers", skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceMapRoot>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct ChoiceMapRoot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}
