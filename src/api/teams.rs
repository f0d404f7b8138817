//! Team endpoints: the member view and the admin console.

use serde::Serialize;

use crate::api::types::{TeamAdminDto, TeamLite};
use crate::http::{ApiClient, ClientResult, RequestOptions};

pub const MY_TEAMS_GROUP: &str = "me/teams";
pub const ADMIN_TEAMS_GROUP: &str = "admin/teams";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTeamBody<'a> {
    name: &'a str,
    leader_user_id: &'a str,
}

#[derive(Serialize)]
struct MemberBody {
    leader: bool,
}

impl ApiClient {
    /// Teams the current user belongs to; `leader_only` narrows to teams they lead.
    pub async fn my_teams(&self, leader_only: bool) -> ClientResult<Vec<TeamLite>> {
        let options = RequestOptions::new()
            .query("leaderOnly", leader_only)
            .cancel_group(MY_TEAMS_GROUP)
            .retry(2)
            .timeout_ms(8000);
        self.get_json("/me/teams", options).await
    }

    pub async fn list_teams_admin(&self) -> ClientResult<Vec<TeamAdminDto>> {
        let options = RequestOptions::new()
            .cancel_group(ADMIN_TEAMS_GROUP)
            .retry(2)
            .timeout_ms(8000);
        self.get_json("/admin/teams", options).await
    }

    pub async fn create_team_admin(&self, name: &str, leader_user_id: &str) -> ClientResult<()> {
        let body = CreateTeamBody { name, leader_user_id };
        self.post("/admin/teams", Some(&body), RequestOptions::new()).await?;
        Ok(())
    }

    pub async fn add_or_update_member_admin(&self, team_id: &str, user_id: &str, leader: bool) -> ClientResult<()> {
        self.put(
            &format!("/admin/teams/{team_id}/members/{user_id}"),
            Some(&MemberBody { leader }),
            RequestOptions::new(),
        )
        .await?;
        Ok(())
    }

    pub async fn remove_member_admin(&self, team_id: &str, user_id: &str) -> ClientResult<()> {
        self.delete(&format!("/admin/teams/{team_id}/members/{user_id}"), RequestOptions::new())
            .await?;
        Ok(())
    }

    pub async fn delete_team_admin(&self, team_id: &str) -> ClientResult<()> {
        self.delete(&format!("/admin/teams/{team_id}"), RequestOptions::new())
            .await?;
        Ok(())
    }
}
