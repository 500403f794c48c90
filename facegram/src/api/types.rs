use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub username: String,
    pub password: String,
    pub bio: String,
    /// The API expects 0 (public) or 1 (private).
    pub is_private: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutRequest<'a> {
    pub username: &'a str,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub storage_path: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostAuthor {
    #[serde(default)]
    pub id: u64,
    pub full_name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: u64,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub created_at: String,
    pub user: PostAuthor,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserSummary {
    #[serde(default)]
    pub id: u64,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "bool_from_int_or_bool")]
    pub is_private: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

/// Post as embedded in a profile; the author is the profile owner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProfilePost {
    pub id: u64,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: u64,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "bool_from_int_or_bool")]
    pub is_private: bool,
    #[serde(default)]
    pub posts_count: u64,
    #[serde(default)]
    pub posts: Vec<ProfilePost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageResponse {
    pub base64: String,
}

fn bool_from_int_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_parses_with_nested_author_and_attachments() {
        let json = r#"{
            "id": 7,
            "caption": "sunset",
            "created_at": "2024-11-02T10:15:00.000000Z",
            "user": {"id": 3, "full_name": "Ana Putri", "username": "ana"},
            "attachments": [{"id": 1, "storage_path": "posts/a.jpg"}, {"id": 2, "storage_path": "posts/b.png"}]
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.user.username, "ana");
        assert_eq!(post.attachments.len(), 2);
        assert_eq!(post.attachments[1].storage_path, "posts/b.png");
    }

    #[test]
    fn test_is_private_accepts_int_and_bool() {
        let a: UserSummary =
            serde_json::from_str(r#"{"full_name":"A","username":"a","is_private":1}"#).unwrap();
        let b: UserSummary =
            serde_json::from_str(r#"{"full_name":"B","username":"b","is_private":false}"#).unwrap();
        let c: UserSummary = serde_json::from_str(r#"{"full_name":"C","username":"c"}"#).unwrap();
        assert!(a.is_private);
        assert!(!b.is_private);
        assert!(!c.is_private);
    }

    #[test]
    fn test_profile_without_posts_defaults_empty() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"full_name":"Locked","username":"locked","bio":null,"is_private":1,"posts_count":4}"#,
        )
        .unwrap();
        assert!(profile.is_private);
        assert_eq!(profile.posts_count, 4);
        assert!(profile.posts.is_empty());
        assert!(profile.bio.is_none());
    }

    #[test]
    fn test_error_body_with_field_errors() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"Invalid field","errors":{"username":["The username has already been taken."]}}"#,
        )
        .unwrap();
        assert_eq!(body.message.as_deref(), Some("Invalid field"));
        assert_eq!(body.errors["username"].len(), 1);
    }

    #[test]
    fn test_register_request_sends_private_flag_as_int() {
        let req = RegisterRequest {
            full_name: "A".into(),
            username: "a".into(),
            password: "secret".into(),
            bio: String::new(),
            is_private: 1,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["is_private"], 1);
    }
}
