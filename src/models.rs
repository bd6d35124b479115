/// Indexed post document
use crate::media::MediaKind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Geographic point, serialized in the index's `{lat, lon}` geo-point form
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One user submission as stored in the document index.
///
/// Missing fields decode to their zero value; a field of the wrong type makes
/// the whole document non-conforming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub user: String,
    pub message: String,
    pub location: Location,
    pub url: String,
    #[serde(
        rename = "type",
        serialize_with = "serialize_kind",
        deserialize_with = "deserialize_kind"
    )]
    pub media_type: Option<MediaKind>,
    pub face: f32,
}

fn serialize_kind<S>(kind: &Option<MediaKind>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(kind.map(MediaKind::as_str).unwrap_or(""))
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<Option<MediaKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    match raw.as_str() {
        "" => Ok(None),
        other => MediaKind::from_name(other)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown media type '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_wire_shape() {
        let post = Post {
            user: "alice".to_string(),
            message: "hi".to_string(),
            location: Location::new(37.0, -122.0),
            url: "https://media/abc".to_string(),
            media_type: Some(MediaKind::Image),
            face: 0.5,
        };

        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(
            value,
            json!({
                "user": "alice",
                "message": "hi",
                "location": {"lat": 37.0, "lon": -122.0},
                "url": "https://media/abc",
                "type": "image",
                "face": 0.5
            })
        );
    }

    #[test]
    fn test_post_without_media_serializes_empty_type() {
        let value = serde_json::to_value(Post::default()).unwrap();
        assert_eq!(value["type"], "");
        assert_eq!(value["url"], "");
        assert_eq!(value["face"], 0.0);
    }

    #[test]
    fn test_missing_fields_decode_to_zero_values() {
        let post: Post = serde_json::from_value(json!({"user": "bob"})).unwrap();
        assert_eq!(post.user, "bob");
        assert_eq!(post.media_type, None);
        assert_eq!(post.location, Location::default());
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let result: Result<Post, _> = serde_json::from_value(json!({"face": "high"}));
        assert!(result.is_err());

        let result: Result<Post, _> = serde_json::from_value(json!({"type": "audio"}));
        assert!(result.is_err());
    }
}
