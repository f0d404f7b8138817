//! Wire types for the team-analyzer backend.
//!
//! Identifiers are UUID strings; they are kept as `String` since the client
//! only echoes them back.

use serde::{Deserialize, Serialize};

/// Current user, from `GET /me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeDto {
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_leader: bool,
}

impl MeDto {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyQuestion {
    pub id: String,
    pub idx: i16,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDto {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub questions: Vec<SurveyQuestion>,
    /// Present on `/me/surveys` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
}

/// One anonymous response, scores 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResultItem {
    pub q1: i16,
    pub q2: i16,
    pub q3: i16,
    pub q4: i16,
    pub q5: i16,
}

/// Per-question averages `a1..a5` over `n` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResultsDto {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub a4: f64,
    pub a5: f64,
    pub n: u32,
    #[serde(default)]
    pub items: Vec<SurveyResultItem>,
}

impl SurveyResultsDto {
    pub fn averages(&self) -> [f64; 5] {
        [self.a1, self.a2, self.a3, self.a4, self.a5]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurveyRequest {
    pub team_id: String,
    pub title: String,
    /// Exactly five question texts.
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitSurveyRequest {
    pub token: String,
    pub q1: i16,
    pub q2: i16,
    pub q3: i16,
    pub q4: i16,
    pub q5: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyOpenToken {
    pub token_id: String,
    pub survey_id: String,
    pub survey_title: String,
    pub issued_at: String,
}

/// Answer of `PUT /surveys/{id}/my-token` and its renew variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyTokenDto {
    pub created: bool,
    #[serde(default)]
    pub invite_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsureTokensResult {
    pub created: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLite {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub user_id: String,
    pub leader: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAdminDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}
