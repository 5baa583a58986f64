//! REST gateway for the Focusboard backend.
//!
//! Talks to the `/api` endpoints of the task board service with a bearer
//! token. Collection endpoints may answer with a plain array or a paged
//! `{ "results": [...] }` envelope; both are accepted.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use focusboard_core::board::{
    Board, BoardId, BoardPatch, BoardSummary, Card, CardId, CardPatch, Comment, CommentId,
    CommentPatch, GoalId, Label, LabelId, LabelPatch, List, ListId, ListPatch, NewBoard, NewCard,
    NewComment, NewLabel, NewList, User, UserId,
};
use focusboard_core::gateway::{
    BoardGateway, FocusGateway, GoalGateway, LabelGateway, ReminderGateway, TeamGateway,
};
use focusboard_core::goals::{Goal, GoalPatch, NewGoal};
use focusboard_core::pomodoro::{FocusSession, FocusStats, NewFocusSession};
use focusboard_core::reminders::DashboardSummary;
use focusboard_core::teams::{MemberInvite, NewTeam, Team, TeamId, TeamMember, TeamPatch, TeamRole};
use focusboard_core::{ClientConfig, FocusError, FocusResult};

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    token: Option<String>,
    client: Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Page<T> {
    Paged { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Page<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Page::Paged { results } => results,
            Page::Plain(items) => items,
        }
    }
}

#[derive(Deserialize)]
struct DashboardEnvelope {
    stats: DashboardSummary,
}

#[derive(Serialize)]
struct MoveRequest {
    list_id: ListId,
    position: usize,
}

#[derive(Serialize)]
struct ReorderRequest {
    position: usize,
}

#[derive(Serialize)]
struct CardRef {
    card_id: CardId,
}

#[derive(Serialize)]
struct MemberRef {
    user_id: UserId,
}

#[derive(Serialize)]
struct MemberRole {
    user_id: UserId,
    role: TeamRole,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> FocusResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FocusError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> FocusResult<Self> {
        Ok(Self::new(&config.api_url, Duration::from_secs(config.timeout_secs))?
            .with_token(config.token.clone()))
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_raw(&self, builder: RequestBuilder) -> FocusResult<String> {
        let request = builder.build().map_err(transport_error)?;
        let method = request.method().clone();
        let url = request.url().to_string();

        let response = self.client.execute(request).await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(%method, %url, status = status.as_u16(), "Remote call");

        if !status.is_success() {
            let err = map_status(status, &body);
            warn!(%method, %url, status = status.as_u16(), error = %err, "Remote store rejected request");
            return Err(err);
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> FocusResult<T> {
        let body = self.send_raw(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> FocusResult<()> {
        self.send_raw(builder).await.map(|_| ())
    }

    async fn get_all<T: DeserializeOwned>(&self, builder: RequestBuilder) -> FocusResult<Vec<T>> {
        self.send::<Page<T>>(builder).await.map(Page::into_vec)
    }
}

fn transport_error(err: reqwest::Error) -> FocusError {
    if err.is_timeout() {
        FocusError::network("request timed out")
    } else if err.is_connect() {
        FocusError::network(format!("could not connect: {}", err))
    } else {
        FocusError::network(err.to_string())
    }
}

/// Translate a non-success status into the error taxonomy.
pub fn map_status(status: StatusCode, body: &str) -> FocusError {
    let message = error_message(status, body);
    match status {
        StatusCode::NOT_FOUND => FocusError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => FocusError::Validation(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FocusError::Unauthorized(message),
        _ => FocusError::Network(message),
    }
}

/// Prefer the backend's `detail` or `message`, then field errors, then the raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let detail = parsed.as_ref().and_then(|v| {
        ["detail", "message", "error"]
            .iter()
            .find_map(|key| v.get(key).and_then(|d| d.as_str()).map(str::to_string))
            .or_else(|| field_errors(v))
    });

    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => status.to_string(),
        None => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

fn field_errors(value: &serde_json::Value) -> Option<String> {
    let fields = value.as_object()?;
    let parts: Vec<String> = fields
        .iter()
        .map(|(field, errors)| {
            let text = match errors {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{}: {}", field, text)
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

// ============================================================
// BOARDS, LISTS, CARDS
// ============================================================

#[async_trait]
impl BoardGateway for HttpGateway {
    async fn list_boards(&self) -> FocusResult<Vec<BoardSummary>> {
        self.get_all(self.request(Method::GET, "boards/")).await
    }

    async fn get_board(&self, id: BoardId) -> FocusResult<Board> {
        self.send(self.request(Method::GET, &format!("boards/{}/", id)))
            .await
    }

    async fn create_board(&self, board: &NewBoard) -> FocusResult<Board> {
        self.send(self.request(Method::POST, "boards/").json(board))
            .await
    }

    async fn update_board(&self, id: BoardId, patch: &BoardPatch) -> FocusResult<Board> {
        self.send(self.request(Method::PATCH, &format!("boards/{}/", id)).json(patch))
            .await
    }

    async fn delete_board(&self, id: BoardId) -> FocusResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("boards/{}/", id)))
            .await
    }

    async fn create_list(&self, list: &NewList) -> FocusResult<List> {
        self.send(self.request(Method::POST, "lists/").json(list))
            .await
    }

    async fn update_list(&self, id: ListId, patch: &ListPatch) -> FocusResult<List> {
        self.send(self.request(Method::PATCH, &format!("lists/{}/", id)).json(patch))
            .await
    }

    async fn reorder_list(&self, id: ListId, position: usize) -> FocusResult<()> {
        let body = ReorderRequest { position };
        self.send_empty(
            self.request(Method::POST, &format!("lists/{}/reorder/", id))
                .json(&body),
        )
        .await
    }

    async fn delete_list(&self, id: ListId) -> FocusResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("lists/{}/", id)))
            .await
    }

    async fn create_card(&self, card: &NewCard) -> FocusResult<Card> {
        self.send(self.request(Method::POST, "cards/").json(card))
            .await
    }

    async fn update_card(&self, id: CardId, patch: &CardPatch) -> FocusResult<Card> {
        self.send(self.request(Method::PATCH, &format!("cards/{}/", id)).json(patch))
            .await
    }

    async fn delete_card(&self, id: CardId) -> FocusResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("cards/{}/", id)))
            .await
    }

    async fn move_card(&self, id: CardId, list_id: ListId, position: usize) -> FocusResult<Card> {
        let body = MoveRequest { list_id, position };
        self.send(
            self.request(Method::POST, &format!("cards/{}/move/", id))
                .json(&body),
        )
        .await
    }

    async fn create_comment(&self, comment: &NewComment) -> FocusResult<Comment> {
        self.send(self.request(Method::POST, "comments/").json(comment))
            .await
    }

    async fn update_comment(&self, id: CommentId, patch: &CommentPatch) -> FocusResult<Comment> {
        self.send(self.request(Method::PATCH, &format!("comments/{}/", id)).json(patch))
            .await
    }

    async fn delete_comment(&self, id: CommentId) -> FocusResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("comments/{}/", id)))
            .await
    }
}

// ============================================================
// LABELS
// ============================================================

#[async_trait]
impl LabelGateway for HttpGateway {
    async fn list_labels(&self) -> FocusResult<Vec<Label>> {
        self.get_all(self.request(Method::GET, "labels/")).await
    }

    async fn create_label(&self, label: &NewLabel) -> FocusResult<Label> {
        self.send(self.request(Method::POST, "labels/").json(label))
            .await
    }

    async fn update_label(&self, id: LabelId, patch: &LabelPatch) -> FocusResult<Label> {
        self.send(self.request(Method::PATCH, &format!("labels/{}/", id)).json(patch))
            .await
    }

    async fn delete_label(&self, id: LabelId) -> FocusResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("labels/{}/", id)))
            .await
    }
}

// ============================================================
// GOALS
// ============================================================

#[async_trait]
impl GoalGateway for HttpGateway {
    async fn list_goals(&self) -> FocusResult<Vec<Goal>> {
        self.get_all(self.request(Method::GET, "goals/")).await
    }

    async fn get_goal(&self, id: GoalId) -> FocusResult<Goal> {
        self.send(self.request(Method::GET, &format!("goals/{}/", id)))
            .await
    }

    async fn create_goal(&self, goal: &NewGoal) -> FocusResult<Goal> {
        self.send(self.request(Method::POST, "goals/").json(goal))
            .await
    }

    async fn update_goal(&self, id: GoalId, patch: &GoalPatch) -> FocusResult<Goal> {
        self.send(self.request(Method::PATCH, &format!("goals/{}/", id)).json(patch))
            .await
    }

    async fn complete_goal(&self, id: GoalId) -> FocusResult<Goal> {
        self.send(self.request(Method::POST, &format!("goals/{}/complete/", id)))
            .await
    }

    async fn reopen_goal(&self, id: GoalId) -> FocusResult<Goal> {
        self.send(self.request(Method::POST, &format!("goals/{}/reopen/", id)))
            .await
    }

    async fn delete_goal(&self, id: GoalId) -> FocusResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("goals/{}/", id)))
            .await
    }

    async fn link_card(&self, id: GoalId, card_id: CardId) -> FocusResult<()> {
        self.send_empty(
            self.request(Method::POST, &format!("goals/{}/link_card/", id))
                .json(&CardRef { card_id }),
        )
        .await
    }

    async fn unlink_card(&self, id: GoalId, card_id: CardId) -> FocusResult<()> {
        self.send_empty(
            self.request(Method::POST, &format!("goals/{}/unlink_card/", id))
                .json(&CardRef { card_id }),
        )
        .await
    }
}

// ============================================================
// TEAMS
// ============================================================

#[async_trait]
impl TeamGateway for HttpGateway {
    async fn current_user(&self) -> FocusResult<User> {
        self.send(self.request(Method::GET, "auth/profile/")).await
    }

    async fn list_teams(&self) -> FocusResult<Vec<Team>> {
        self.get_all(self.request(Method::GET, "teams/")).await
    }

    async fn get_team(&self, id: TeamId) -> FocusResult<Team> {
        self.send(self.request(Method::GET, &format!("teams/{}/", id)))
            .await
    }

    async fn create_team(&self, team: &NewTeam) -> FocusResult<Team> {
        self.send(self.request(Method::POST, "teams/").json(team))
            .await
    }

    async fn update_team(&self, id: TeamId, patch: &TeamPatch) -> FocusResult<Team> {
        self.send(self.request(Method::PATCH, &format!("teams/{}/", id)).json(patch))
            .await
    }

    async fn delete_team(&self, id: TeamId) -> FocusResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("teams/{}/", id)))
            .await
    }

    async fn invite_member(&self, id: TeamId, invite: &MemberInvite) -> FocusResult<TeamMember> {
        self.send(
            self.request(Method::POST, &format!("teams/{}/invite_member/", id))
                .json(invite),
        )
        .await
    }

    async fn remove_member(&self, id: TeamId, user_id: UserId) -> FocusResult<()> {
        self.send_empty(
            self.request(Method::POST, &format!("teams/{}/remove_member/", id))
                .json(&MemberRef { user_id }),
        )
        .await
    }

    async fn update_member_role(
        &self,
        id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> FocusResult<TeamMember> {
        self.send(
            self.request(Method::POST, &format!("teams/{}/update_member_role/", id))
                .json(&MemberRole { user_id, role }),
        )
        .await
    }
}

// ============================================================
// FOCUS SESSIONS AND REMINDERS
// ============================================================

#[async_trait]
impl FocusGateway for HttpGateway {
    async fn start_session(&self, session: &NewFocusSession) -> FocusResult<FocusSession> {
        self.send(self.request(Method::POST, "pomodoro/").json(session))
            .await
    }

    async fn complete_session(&self, id: i64) -> FocusResult<()> {
        self.send_empty(self.request(Method::POST, &format!("pomodoro/{}/complete_session/", id)))
            .await
    }

    async fn session_stats(&self) -> FocusResult<FocusStats> {
        self.send(self.request(Method::GET, "pomodoro/get_stats/"))
            .await
    }
}

#[async_trait]
impl ReminderGateway for HttpGateway {
    async fn due_soon_cards(&self) -> FocusResult<Vec<Card>> {
        self.get_all(
            self.request(Method::GET, "cards/")
                .query(&[("due_date", "due_soon")]),
        )
        .await
    }

    async fn dashboard_summary(&self) -> FocusResult<DashboardSummary> {
        let envelope: DashboardEnvelope = self
            .send(self.request(Method::GET, "dashboard/"))
            .await?;
        Ok(envelope.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpGateway {
        HttpGateway::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let gw = gateway();
        assert_eq!(gw.base_url(), "http://localhost:8000/api");
        assert_eq!(gw.url("boards/"), "http://localhost:8000/api/boards/");
        assert_eq!(gw.url("/cards/3/move/"), "http://localhost:8000/api/cards/3/move/");
    }

    #[test]
    fn test_request_carries_bearer_token() {
        let gw = gateway().with_token(Some("s3cret".into()));
        let request = gw.request(Method::GET, "labels/").build().unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer s3cret"
        );

        let anonymous = gateway().with_token(Some(String::new()));
        let request = anonymous.request(Method::GET, "labels/").build().unwrap();
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#),
            FocusError::NotFound(m) if m == "Not found."
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, r#"{"title": ["This field is required."]}"#),
            FocusError::Validation(m) if m == "title: This field is required."
        ));
        assert!(matches!(
            map_status(StatusCode::UNPROCESSABLE_ENTITY, ""),
            FocusError::Validation(_)
        ));
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, ""),
            FocusError::Unauthorized(_)
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, r#"{"detail": "nope"}"#),
            FocusError::Unauthorized(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "<html>upstream down</html>"),
            FocusError::Network(m) if m.contains("upstream down")
        ));
    }

    #[test]
    fn test_page_accepts_both_shapes() {
        let plain: Page<Label> =
            serde_json::from_str(r##"[{"id": 1, "name": "urgent", "color": "#EF4444"}]"##).unwrap();
        assert_eq!(plain.into_vec().len(), 1);

        let paged: Page<Label> = serde_json::from_str(
            r##"{"count": 2, "next": null, "results": [
                {"id": 1, "name": "urgent", "color": "#EF4444"},
                {"id": 2, "name": "home", "color": "#10B981"}
            ]}"##,
        )
        .unwrap();
        assert_eq!(paged.into_vec()[1].name, "home");
    }

    #[test]
    fn test_dashboard_envelope() {
        let body = r#"{"stats": {"total_cards": 12, "completed_cards": 5}, "recent_cards": []}"#;
        let envelope: DashboardEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.stats.pending(), 7);
    }

    #[test]
    fn test_move_payload_shape() {
        let body = serde_json::to_value(MoveRequest {
            list_id: 4,
            position: 2,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"list_id": 4, "position": 2}));
    }

    #[test]
    fn test_team_payload_shapes() {
        let invite = serde_json::to_value(MemberInvite {
            email: "bo@example.com".into(),
            role: TeamRole::Viewer,
        })
        .unwrap();
        assert_eq!(invite, serde_json::json!({"email": "bo@example.com", "role": "viewer"}));

        let role = serde_json::to_value(MemberRole {
            user_id: 2,
            role: TeamRole::Admin,
        })
        .unwrap();
        assert_eq!(role, serde_json::json!({"user_id": 2, "role": "admin"}));

        let request = gateway()
            .request(Method::POST, "teams/3/remove_member/")
            .json(&MemberRef { user_id: 2 })
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/teams/3/remove_member/");
    }
}
