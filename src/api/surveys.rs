//! Survey endpoints.

use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::api::types::{
    CreateSurveyRequest, DownloadLink, EnsureTokensResult, MyOpenToken, MyTokenDto, SubmitSurveyRequest,
    SurveyDto, SurveyResultsDto,
};
use crate::http::{ApiClient, ClientError, ClientResult, RequestOptions};

/// Cancel group for survey page loads.
pub const SURVEY_GROUP: &str = "survey";
pub const SURVEY_SUBMIT_GROUP: &str = "survey-submit";
pub const MY_TOKENS_GROUP: &str = "my/tokens";
pub const MY_SURVEYS_GROUP: &str = "me/surveys";

#[derive(Serialize)]
struct CountBody {
    count: u32,
}

/// Standard policy for idempotent reads.
fn read_options(group: Option<&str>) -> RequestOptions {
    let options = RequestOptions::new().retry(2).timeout_ms(8000);
    match group {
        Some(group) => options.cancel_group(group),
        None => options,
    }
}

impl ApiClient {
    /// Public survey page. Loading another survey cancels this one.
    ///
    /// `None` when the backend refuses the visitor as unauthenticated.
    pub async fn get_survey(&self, id: &str) -> ClientResult<Option<SurveyDto>> {
        let options = read_options(Some(SURVEY_GROUP)).allow_anonymous();
        let response = self.get(&format!("/surveys/{id}"), options).await?;
        if response.is_synthetic() {
            return Ok(None);
        }
        response.json().map(Some)
    }

    pub async fn submit_survey_responses(&self, id: &str, body: &SubmitSurveyRequest) -> ClientResult<()> {
        let options = RequestOptions::new()
            .allow_anonymous()
            .cancel_group(SURVEY_SUBMIT_GROUP)
            .timeout_ms(10_000);
        self.post(&format!("/surveys/{id}/responses"), Some(body), options).await?;
        Ok(())
    }

    pub async fn get_survey_results(&self, id: &str) -> ClientResult<SurveyResultsDto> {
        self.get_json(&format!("/surveys/{id}/results"), read_options(None)).await
    }

    pub async fn create_survey(&self, payload: &CreateSurveyRequest) -> ClientResult<SurveyDto> {
        self.post("/surveys", Some(payload), RequestOptions::new())
            .await?
            .json()
    }

    /// Mint `count` anonymous invite tokens.
    pub async fn issue_survey_tokens(&self, id: &str, count: u32) -> ClientResult<Vec<String>> {
        self.post(
            &format!("/surveys/{id}/tokens/batch"),
            Some(&CountBody { count }),
            RequestOptions::new(),
        )
        .await?
        .json()
    }

    /// Short-lived download URL for the results export.
    pub async fn get_results_download_link(&self, id: &str) -> ClientResult<String> {
        let options = RequestOptions::new().retry(1).timeout_ms(8000);
        let link: DownloadLink = self
            .post::<()>(&format!("/surveys/{id}/download-tokens"), None, options)
            .await?
            .json()?;
        Ok(link.url)
    }

    /// Make sure every member of the survey's team holds a token.
    pub async fn ensure_tokens_for_team(&self, survey_id: &str) -> ClientResult<EnsureTokensResult> {
        self.post::<()>(&format!("/surveys/{survey_id}/tokens/for-members"), None, RequestOptions::new())
            .await?
            .json()
    }

    pub async fn my_token_for_survey(&self, survey_id: &str) -> ClientResult<MyTokenDto> {
        let options = RequestOptions::new().retry(2).timeout_ms(8000);
        self.send_json::<()>(Method::PUT, &format!("/surveys/{survey_id}/my-token"), None, options)
            .await?
            .json()
    }

    pub async fn renew_my_token(&self, survey_id: &str) -> ClientResult<MyTokenDto> {
        self.post::<()>(&format!("/surveys/{survey_id}/my-token/renew"), None, RequestOptions::new())
            .await?
            .json()
    }

    pub async fn list_my_open_tokens(&self) -> ClientResult<Vec<MyOpenToken>> {
        self.get_json("/my/tokens", read_options(Some(MY_TOKENS_GROUP))).await
    }

    /// Surveys created by the current user, with their team name.
    pub async fn list_my_surveys(&self) -> ClientResult<Vec<SurveyDto>> {
        self.get_json("/me/surveys", read_options(Some(MY_SURVEYS_GROUP))).await
    }
}

/// Link a respondent opens to answer `survey_id` with `token`.
///
/// `origin` is the web app's origin, not the API base.
pub fn build_survey_invite_link(origin: &str, survey_id: &str, token: &str) -> ClientResult<String> {
    let mut url = Url::parse(origin).map_err(|e| ClientError::InvalidRequest(format!("bad origin '{origin}': {e}")))?;
    url.set_path(&format!("/surveys/{survey_id}"));
    url.query_pairs_mut().clear().append_pair("token", token);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_link_encodes_token() {
        let link = build_survey_invite_link("https://app.example.com", "s1", "a b&c").unwrap();
        assert_eq!(link, "https://app.example.com/surveys/s1?token=a+b%26c");
    }

    #[test]
    fn test_invite_link_ignores_origin_path() {
        let link = build_survey_invite_link("http://localhost:5173/some/page?x=1", "s1", "t").unwrap();
        assert_eq!(link, "http://localhost:5173/surveys/s1?token=t");
    }

    #[test]
    fn test_read_options() {
        let options = read_options(Some(SURVEY_GROUP));
        assert_eq!(options.retry, 2);
        assert_eq!(options.cancel_group.as_deref(), Some("survey"));
        assert_eq!(options.timeout, Some(std::time::Duration::from_millis(8000)));
    }
}
