//! Teams and their memberships.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::{User, UserId};
use crate::error::{FocusError, FocusResult};
use crate::gateway::TeamGateway;

pub type TeamId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Owner,
    Admin,
    #[default]
    Member,
    Viewer,
}

impl TeamRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "member" => Some(Self::Member),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    /// Owners and admins may invite, remove and re-role members.
    pub fn can_manage(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub user: User,
    #[serde(default)]
    pub role: TeamRole,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invited_by: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner: Option<User>,
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub member_count: usize,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Team {
    pub fn member(&self, user_id: UserId) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.user.id == user_id)
    }

    pub fn role_of(&self, user_id: UserId) -> Option<TeamRole> {
        self.member(user_id).map(|m| m.role)
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner.as_ref().is_some_and(|o| o.id == user_id)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberInvite {
    pub email: String,
    pub role: TeamRole,
}

#[derive(Default)]
struct TeamState {
    teams: Vec<Team>,
    current_team: Option<Team>,
    current_user: Option<User>,
    last_error: Option<String>,
}

/// Teams visible to the signed-in user.
///
/// Membership changes are confirmed by the remote store and then the team
/// is fetched again, so member lists and counts are always the store's.
#[derive(Clone)]
pub struct TeamStore {
    gateway: Arc<dyn TeamGateway>,
    state: Arc<RwLock<TeamState>>,
}

impl TeamStore {
    pub fn new(gateway: Arc<dyn TeamGateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(TeamState::default())),
        }
    }

    pub async fn fetch_current_user(&self) -> FocusResult<User> {
        self.clear_error();
        match self.gateway.current_user().await {
            Ok(user) => {
                self.write(|s| s.current_user = Some(user.clone()));
                Ok(user)
            }
            Err(e) => self.fail("fetch profile", e),
        }
    }

    pub async fn fetch_teams(&self) -> FocusResult<Vec<Team>> {
        self.clear_error();
        match self.gateway.list_teams().await {
            Ok(teams) => {
                self.write(|s| s.teams = teams.clone());
                Ok(teams)
            }
            Err(e) => self.fail("fetch teams", e),
        }
    }

    /// Fetch one team and make it the current team.
    pub async fn fetch_team(&self, id: TeamId) -> FocusResult<Team> {
        self.clear_error();
        match self.gateway.get_team(id).await {
            Ok(team) => {
                self.write(|s| {
                    upsert(&mut s.teams, &team);
                    s.current_team = Some(team.clone());
                });
                Ok(team)
            }
            Err(e) => self.fail("fetch team", e),
        }
    }

    pub async fn create_team(&self, team: NewTeam) -> FocusResult<Team> {
        self.clear_error();
        if team.name.trim().is_empty() {
            return self.fail("create team", FocusError::validation("team name is required"));
        }
        match self.gateway.create_team(&team).await {
            Ok(created) => {
                info!(team_id = created.id, name = %created.name, "Team created");
                self.write(|s| s.teams.push(created.clone()));
                Ok(created)
            }
            Err(e) => self.fail("create team", e),
        }
    }

    pub async fn update_team(&self, id: TeamId, patch: TeamPatch) -> FocusResult<Team> {
        self.clear_error();
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return self.fail("update team", FocusError::validation("team name is required"));
        }
        match self.gateway.update_team(id, &patch).await {
            Ok(updated) => {
                self.write(|s| {
                    if let Some(existing) = s.teams.iter_mut().find(|t| t.id == id) {
                        *existing = updated.clone();
                    }
                    if s.current_team.as_ref().is_some_and(|t| t.id == id) {
                        s.current_team = Some(updated.clone());
                    }
                });
                info!(team_id = id, "Team updated");
                Ok(updated)
            }
            Err(e) => self.fail("update team", e),
        }
    }

    pub async fn delete_team(&self, id: TeamId) -> FocusResult<()> {
        self.clear_error();
        match self.gateway.delete_team(id).await {
            Ok(()) => {
                self.write(|s| {
                    s.teams.retain(|t| t.id != id);
                    if s.current_team.as_ref().is_some_and(|t| t.id == id) {
                        s.current_team = None;
                    }
                });
                info!(team_id = id, "Team deleted");
                Ok(())
            }
            Err(e) => self.fail("delete team", e),
        }
    }

    pub async fn invite_member(
        &self,
        team_id: TeamId,
        email: &str,
        role: TeamRole,
    ) -> FocusResult<TeamMember> {
        self.clear_error();
        let email = email.trim();
        if !email.contains('@') {
            return self.fail(
                "invite member",
                FocusError::validation(format!("'{}' is not an email address", email)),
            );
        }
        let invite = MemberInvite {
            email: email.to_string(),
            role,
        };
        match self.gateway.invite_member(team_id, &invite).await {
            Ok(member) => {
                info!(team_id, user_id = member.user.id, role = role.as_str(), "Member invited");
                self.fetch_team(team_id).await?;
                Ok(member)
            }
            Err(e) => self.fail("invite member", e),
        }
    }

    pub async fn remove_member(&self, team_id: TeamId, user_id: UserId) -> FocusResult<()> {
        self.clear_error();
        match self.gateway.remove_member(team_id, user_id).await {
            Ok(()) => {
                info!(team_id, user_id, "Member removed");
                self.fetch_team(team_id).await?;
                Ok(())
            }
            Err(e) => self.fail("remove member", e),
        }
    }

    pub async fn update_member_role(
        &self,
        team_id: TeamId,
        user_id: UserId,
        role: TeamRole,
    ) -> FocusResult<TeamMember> {
        self.clear_error();
        match self.gateway.update_member_role(team_id, user_id, role).await {
            Ok(member) => {
                info!(team_id, user_id, role = role.as_str(), "Member role updated");
                self.fetch_team(team_id).await?;
                Ok(member)
            }
            Err(e) => self.fail("update member role", e),
        }
    }

    pub fn teams(&self) -> Vec<Team> {
        self.read(|s| s.teams.clone())
    }

    pub fn team_by_id(&self, id: TeamId) -> Option<Team> {
        self.read(|s| s.teams.iter().find(|t| t.id == id).cloned())
    }

    pub fn current_team(&self) -> Option<Team> {
        self.read(|s| s.current_team.clone())
    }

    pub fn current_user(&self) -> Option<User> {
        self.read(|s| s.current_user.clone())
    }

    pub fn owned_teams(&self, user_id: UserId) -> Vec<Team> {
        self.read(|s| {
            s.teams
                .iter()
                .filter(|t| t.is_owned_by(user_id))
                .cloned()
                .collect()
        })
    }

    /// Teams the user belongs to without owning them.
    pub fn joined_teams(&self, user_id: UserId) -> Vec<Team> {
        self.read(|s| {
            s.teams
                .iter()
                .filter(|t| !t.is_owned_by(user_id) && t.member(user_id).is_some())
                .cloned()
                .collect()
        })
    }

    pub fn last_error(&self) -> Option<String> {
        self.read(|s| s.last_error.clone())
    }

    fn clear_error(&self) {
        self.write(|s| s.last_error = None);
    }

    fn fail<T>(&self, action: &str, err: FocusError) -> FocusResult<T> {
        warn!(action, error = %err, "Team request failed");
        self.write(|s| s.last_error = Some(format!("Failed to {}: {}", action, err)));
        Err(err)
    }

    fn read<R>(&self, f: impl FnOnce(&TeamState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut TeamState) -> R) -> R {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

fn upsert(teams: &mut Vec<Team>, team: &Team) {
    match teams.iter_mut().find(|t| t.id == team.id) {
        Some(existing) => *existing = team.clone(),
        None => teams.push(team.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;

    fn new_team(name: &str) -> NewTeam {
        NewTeam {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_creator_owns_the_team() {
        let gateway = Arc::new(InMemoryGateway::new());
        let store = TeamStore::new(gateway);
        let me = store.fetch_current_user().await.unwrap();

        let team = store.create_team(new_team("Platform")).await.unwrap();
        assert!(team.is_owned_by(me.id));
        assert_eq!(team.member_count, 1);
        assert_eq!(team.role_of(me.id), Some(TeamRole::Owner));
        assert_eq!(store.owned_teams(me.id).len(), 1);
        assert!(store.joined_teams(me.id).is_empty());
    }

    #[tokio::test]
    async fn test_membership_changes_refresh_the_team() {
        let gateway = Arc::new(InMemoryGateway::new());
        let bo = gateway.add_user("bo", "bo@example.com");
        let store = TeamStore::new(gateway.clone());
        let team = store.create_team(new_team("Design")).await.unwrap();

        let member = store
            .invite_member(team.id, "bo@example.com", TeamRole::Viewer)
            .await
            .unwrap();
        assert_eq!(member.user.id, bo.id);
        let current = store.current_team().unwrap();
        assert_eq!(current.member_count, 2);
        assert_eq!(store.joined_teams(bo.id).len(), 1);

        store
            .update_member_role(team.id, bo.id, TeamRole::Admin)
            .await
            .unwrap();
        assert_eq!(store.team_by_id(team.id).unwrap().role_of(bo.id), Some(TeamRole::Admin));

        store.remove_member(team.id, bo.id).await.unwrap();
        assert!(store.current_team().unwrap().member(bo.id).is_none());
        assert!(store.joined_teams(bo.id).is_empty());
    }

    #[tokio::test]
    async fn test_invite_errors_are_recorded() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.add_user("bo", "bo@example.com");
        let store = TeamStore::new(gateway);
        let team = store.create_team(new_team("Ops")).await.unwrap();

        assert!(matches!(
            store.invite_member(team.id, "nobody", TeamRole::Member).await,
            Err(FocusError::Validation(_))
        ));
        assert!(matches!(
            store.invite_member(team.id, "ghost@example.com", TeamRole::Member).await,
            Err(FocusError::NotFound(_))
        ));
        store
            .invite_member(team.id, "bo@example.com", TeamRole::Member)
            .await
            .unwrap();
        assert!(matches!(
            store.invite_member(team.id, "bo@example.com", TeamRole::Member).await,
            Err(FocusError::Validation(_))
        ));
        assert!(store.last_error().unwrap().starts_with("Failed to invite member"));
    }

    #[tokio::test]
    async fn test_owner_cannot_be_removed() {
        let gateway = Arc::new(InMemoryGateway::new());
        let store = TeamStore::new(gateway);
        let me = store.fetch_current_user().await.unwrap();
        let team = store.create_team(new_team("Solo")).await.unwrap();

        assert!(matches!(
            store.remove_member(team.id, me.id).await,
            Err(FocusError::Validation(_))
        ));
        assert!(matches!(
            store.update_member_role(team.id, me.id, TeamRole::Viewer).await,
            Err(FocusError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_follow_current_team() {
        let gateway = Arc::new(InMemoryGateway::new());
        let store = TeamStore::new(gateway);
        let team = store.create_team(new_team("Growth")).await.unwrap();
        store.fetch_team(team.id).await.unwrap();

        let patch = TeamPatch {
            name: Some("Growth squad".into()),
            ..TeamPatch::default()
        };
        store.update_team(team.id, patch).await.unwrap();
        assert_eq!(store.current_team().unwrap().name, "Growth squad");

        let blank = TeamPatch {
            name: Some(" ".into()),
            ..TeamPatch::default()
        };
        assert!(store.update_team(team.id, blank).await.is_err());

        store.delete_team(team.id).await.unwrap();
        assert!(store.current_team().is_none());
        assert!(store.teams().is_empty());
    }

    #[test]
    fn test_team_payload_from_backend() {
        let json = r#"{
            "id": 4,
            "name": "Core",
            "description": "",
            "owner": {"id": 1, "username": "ana", "email": "ana@example.com"},
            "members": [
                {"id": 10, "user": {"id": 1, "username": "ana"}, "role": "owner", "joined_at": "2024-03-01T10:00:00Z", "invited_by": null},
                {"id": 11, "user": {"id": 2, "username": "bo"}, "role": "viewer", "invited_by": {"id": 1, "username": "ana"}}
            ],
            "member_count": 2,
            "is_active": true
        }"#;
        let team: Team = serde_json::from_str(json).unwrap();
        assert!(team.is_owned_by(1));
        assert_eq!(team.role_of(2), Some(TeamRole::Viewer));
        assert!(!TeamRole::Viewer.can_manage());
        assert_eq!(TeamRole::from_str("admin"), Some(TeamRole::Admin));
    }
}
