use crate::common::eref::ERef;
use crate::maproot::{ChoiceMapRoot, Extent, LatLonBox, QuestionMapRoot, TopicMapRoot};

/// A crowd-reporting topic: a set of questions bound to some of the map's
/// layers. Topics only ever enter and leave at the tail of the map's topic
/// collection, which keeps the create command's execute/undo symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicModel {
    pub id: String,
    pub title: String,
    pub viewport: Option<LatLonBox>,
    /// Only ids that existed in the owning map at construction time.
    pub layer_ids: Vec<String>,
    pub tags: Vec<String>,
    pub crowd_enabled: bool,
    pub cluster_radius: Option<f64>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub id: String,
    pub title: String,
    pub label: String,
    pub color: String,
}

impl TopicModel {
    /// Deserializes a topic, dropping layer ids the owning map does not
    /// know about.
    pub fn from_map_root(
        root: &TopicMapRoot,
        layer_id_is_valid: &dyn Fn(&str) -> bool,
    ) -> ERef<TopicModel> {
        ERef::new(Self {
            id: root.id.clone().unwrap_or_default(),
            title: root.title.clone().unwrap_or_default(),
            viewport: Extent::unwrap_box(&root.viewport),
            layer_ids: root
                .layer_ids
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .filter(|id| layer_id_is_valid(id))
                .cloned()
                .collect(),
            tags: root.tags.clone().unwrap_or_default(),
            crowd_enabled: root.crowd_enabled.unwrap_or(false),
            cluster_radius: root.cluster_radius,
            questions: root
                .questions
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .map(|q| Question {
                    id: q.id.clone().unwrap_or_default(),
                    text: q.text.clone().unwrap_or_default(),
                    choices: q
                        .choices
                        .as_deref()
                        .unwrap_or(&[])
                        .iter()
                        .map(|c| Choice {
                            id: c.id.clone().unwrap_or_default(),
                            title: c.title.clone().unwrap_or_default(),
                            label: c.label.clone().unwrap_or_default(),
                            color: c.color.clone().unwrap_or_default(),
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    pub fn to_map_root(&self) -> TopicMapRoot {
        fn nonempty(s: &str) -> Option<String> {
            (!s.is_empty()).then(|| s.to_owned())
        }
        TopicMapRoot {
            id: Some(self.id.clone()),
            title: nonempty(&self.title),
            viewport: Extent::wrap(self.viewport),
            layer_ids: (!self.layer_ids.is_empty()).then(|| self.layer_ids.clone()),
            tags: (!self.tags.is_empty()).then(|| self.tags.clone()),
            crowd_enabled: self.crowd_enabled.then_some(true),
            cluster_radius: self.cluster_radius,
            questions: (!self.questions.is_empty()).then(|| {
                self.questions
                    .iter()
                    .map(|q| QuestionMapRoot {
                        id: nonempty(&q.id),
                        text: nonempty(&q.text),
                        choices: (!q.choices.is_empty()).then(|| {
                            q.choices
                                .iter()
                                .map(|c| ChoiceMapRoot {
                                    id: nonempty(&c.id),
                                    title: nonempty(&c.title),
                                    label: nonempty(&c.label),
                                    color: nonempty(&c.color),
                                })
                                .collect()
                        }),
                    })
                    .collect()
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let root: TopicMapRoot = serde_json::from_value(json!({
            "id": "shelter",
            "title": "Shelters",
            "layer_ids": ["1", "2"],
            "tags": ["crisis"],
            "crowd_enabled": true,
            "cluster_radius": 80.0,
            "questions": [{
                "id": "q1",
                "text": "Is this shelter open?",
                "choices": [
                    {"id": "y", "title": "Yes", "label": "open", "color": "#00c000"},
                    {"id": "n", "title": "No", "label": "closed", "color": "#c00000"}
                ]
            }]
        }))
        .unwrap();

        let topic = TopicModel::from_map_root(&root, &|_| true);
        assert_eq!(topic.read().to_map_root(), root);
    }

    #[test]
    fn test_unknown_layer_ids_are_filtered() {
        let root: TopicMapRoot = serde_json::from_value(json!({
            "id": "t",
            "layer_ids": ["1", "ghost", "2"]
        }))
        .unwrap();

        let topic = TopicModel::from_map_root(&root, &|id| id == "1" || id == "2");
        assert_eq!(topic.read().layer_ids, vec!["1".to_owned(), "2".to_owned()]);
    }
}
