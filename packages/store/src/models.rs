//! # Domain models for reports, comments and votes
//!
//! Rows of the backend's `reports`, `comments` and `votes` resources, plus the
//! insert payloads sent when creating them. Field names match the backend
//! columns (`user_id`, `created_at`, ...) so the types (de)serialise directly
//! from the REST representation without an intermediate map.
//!
//! ## Types
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Report`] | An incident report. `id`, `verified` and `created_at` are server-assigned. |
//! | [`Comment`] | A comment attached to a report. |
//! | [`Vote`] | An `upvote` or `fake` vote attached to a report. |
//! | [`ReportInsert`], [`CommentInsert`], [`VoteInsert`] | Insertable fields only; never carry an `id`. |
//! | [`ReportFilter`] | Optional equality filter for listing reports. |
//! | [`VoteTally`] | Per-type vote counts for one report. |
//! | [`Identity`] | The signed-in user as seen by the client. |
//!
//! ## Helper functions
//!
//! - [`ext_from_mime`] maps a media MIME type to a file extension, falling back
//!   to [`DEFAULT_MEDIA_EXT`].

use serde::{Deserialize, Deserializer, Serialize};

/// Categories offered when composing a report.
pub const CATEGORIES: [&str; 6] = [
    "Municipal Complaints",
    "Theft",
    "Accident",
    "Harassment",
    "Vandalism",
    "Other",
];

/// Location text shown before a location has been detected.
pub const DEFAULT_LOCATION: &str = "Detected: (not set)";

/// Extension used when the media MIME type is missing or unrecognised.
pub const DEFAULT_MEDIA_EXT: &str = "jpg";

/// An incident report row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    /// Set by moderation on the backend, never by this client.
    #[serde(default, deserialize_with = "null_as_false")]
    pub verified: bool,
    /// ISO-8601 timestamp assigned on insert.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A comment row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub report_id: String,
    pub user_id: String,
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A vote row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub report_id: String,
    pub user_id: String,
    pub vote_type: VoteType,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Kind of vote. The backend does not constrain the column, so anything
/// outside the known pair decodes as [`VoteType::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Fake,
    #[serde(other)]
    Unknown,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Fake => "fake",
            VoteType::Unknown => "unknown",
        }
    }
}

/// Fields sent when inserting a report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportInsert {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub verified: bool,
}

/// Fields sent when inserting a comment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommentInsert {
    pub report_id: String,
    pub user_id: String,
    pub comment: String,
}

/// Fields sent when inserting a vote.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoteInsert {
    pub report_id: String,
    pub user_id: String,
    pub vote_type: VoteType,
}

/// Filter applied when listing reports.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportFilter {
    /// Only reports owned by this user.
    pub user_id: Option<String>,
}

impl ReportFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_user(uid: impl Into<String>) -> Self {
        Self {
            user_id: Some(uid.into()),
        }
    }
}

/// Vote counts for a single report. Repeat votes by the same user count
/// every time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: usize,
    pub fake: usize,
}

impl VoteTally {
    pub fn from_votes(votes: &[Vote]) -> Self {
        votes.iter().fold(Self::default(), |mut tally, vote| {
            match vote.vote_type {
                VoteType::Upvote => tally.upvotes += 1,
                VoteType::Fake => tally.fake += 1,
                VoteType::Unknown => {}
            }
            tally
        })
    }
}

/// The signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
}

impl Identity {
    /// Display name, falling back to the uid.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.uid)
    }
}

/// Get the file extension for a media MIME type.
pub fn ext_from_mime(mime: Option<&str>) -> &'static str {
    let Some(mime) = mime else {
        return DEFAULT_MEDIA_EXT;
    };
    let mime = mime.to_ascii_lowercase();
    if mime.contains("jpeg") || mime.contains("jpg") {
        "jpg"
    } else if mime.contains("png") {
        "png"
    } else if mime.contains("webp") {
        "webp"
    } else if mime.contains("gif") {
        "gif"
    } else if mime.contains("mp4") {
        "mp4"
    } else {
        DEFAULT_MEDIA_EXT
    }
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(vote_type: VoteType) -> Vote {
        Vote {
            id: "v".to_string(),
            report_id: "r1".to_string(),
            user_id: "u1".to_string(),
            vote_type,
            created_at: None,
        }
    }

    #[test]
    fn test_tally_counts_each_vote() {
        let votes = vec![
            vote(VoteType::Upvote),
            vote(VoteType::Upvote),
            vote(VoteType::Fake),
        ];
        let tally = VoteTally::from_votes(&votes);
        assert_eq!(tally.upvotes, 2);
        assert_eq!(tally.fake, 1);
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime(Some("image/png")), "png");
        assert_eq!(ext_from_mime(Some("image/jpeg")), "jpg");
        assert_eq!(ext_from_mime(Some("video/mp4")), "mp4");
        assert_eq!(ext_from_mime(Some("application/x-unknown")), "jpg");
        assert_eq!(ext_from_mime(None), "jpg");
    }

    #[test]
    fn test_report_tolerates_nulls() {
        let json = r#"{"id":"r1","user_id":null,"category":"Theft","verified":null,"created_at":"2025-01-01T00:00:00Z"}"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.id, "r1");
        assert!(report.user_id.is_none());
        assert!(!report.verified);
        assert_eq!(report.category.as_deref(), Some("Theft"));
    }

    #[test]
    fn test_unknown_vote_type() {
        let parsed: VoteType = serde_json::from_str(r#""meh""#).unwrap();
        assert_eq!(parsed, VoteType::Unknown);
        let parsed: VoteType = serde_json::from_str(r#""upvote""#).unwrap();
        assert_eq!(parsed, VoteType::Upvote);
    }

    #[test]
    fn test_insert_omits_missing_fields() {
        let insert = ReportInsert {
            user_id: "u1".to_string(),
            category: Some("Theft".to_string()),
            description: None,
            location: None,
            media_url: None,
            verified: false,
        };
        let encoded = serde_json::to_value(&insert).unwrap();
        assert_eq!(encoded["user_id"], "u1");
        assert_eq!(encoded["verified"], false);
        assert!(encoded.get("media_url").is_none());
    }
}
