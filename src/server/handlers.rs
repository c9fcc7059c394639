//! Request routing and handlers
//!
//! Transport-independent: the tiny_http loop in the parent module turns each
//! request into an [`ApiRequest`] and writes back the [`ApiResponse`].

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use crate::Campus;
use crate::account::{AccountError, Session};
use crate::catalog::CatalogError;
use crate::domain::{MissionDraft, RewardDraft};
use crate::ledger::LedgerError;

#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub method: String,
    /// Path without the query string
    pub path: String,
    pub query: Option<String>,
    /// Value of the user header, if sent
    pub user_id: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, kind: &str, message: impl ToString) -> Self {
        Self {
            status,
            body: json!({ "error": kind, "message": message.to_string() }),
        }
    }
}

impl From<LedgerError> for ApiResponse {
    fn from(e: LedgerError) -> Self {
        let status = match &e {
            LedgerError::InvalidOrInactiveMission
            | LedgerError::RewardUnavailable
            | LedgerError::ProfileNotFound => 404,
            LedgerError::AlreadyCompleted | LedgerError::OutOfStock => 409,
            LedgerError::InsufficientPoints { .. } => 422,
            LedgerError::Forbidden => 403,
            LedgerError::StoreUnavailable(_) => {
                error!("Ledger store failure: {}", e);
                503
            }
        };
        Self::error(status, e.kind(), &e)
    }
}

impl From<CatalogError> for ApiResponse {
    fn from(e: CatalogError) -> Self {
        match &e {
            CatalogError::Forbidden => Self::error(403, "forbidden", &e),
            CatalogError::InvalidInput(_) => Self::error(422, "invalid_input", &e),
            CatalogError::NotFound(_) => Self::error(404, "not_found", &e),
            CatalogError::Store(_) => {
                error!("Catalog store failure: {:#}", e);
                Self::error(503, "store_unavailable", &e)
            }
        }
    }
}

fn store_failure(e: anyhow::Error) -> ApiResponse {
    error!("Store failure: {:#}", e);
    ApiResponse::error(503, "store_unavailable", e)
}

#[derive(Deserialize)]
struct CompleteMissionBody {
    payload: String,
}

#[derive(Deserialize)]
struct RedeemRewardBody {
    reward_id: String,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiResponse> {
    serde_json::from_str(body).map_err(|e| ApiResponse::error(400, "bad_request", e))
}

fn query_param<'a>(query: Option<&'a str>, key: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// `/admin/<kind>/<id>[/<action>]` → (id, action)
fn parse_admin_path<'a>(path: &'a str, prefix: &str) -> Option<(&'a str, Option<&'a str>)> {
    let rest = path.trim_end_matches('/').strip_prefix(prefix)?;
    let mut parts = rest.split('/');
    let id = parts.next().filter(|id| !id.is_empty())?;
    let action = parts.next();
    if parts.next().is_some() {
        return None;
    }
    Some((id, action))
}

pub struct Router {
    campus: Campus,
}

impl Router {
    pub fn new(campus: Campus) -> Self {
        Self { campus }
    }

    pub fn dispatch(&self, req: &ApiRequest) -> ApiResponse {
        match self.route(req) {
            Ok(response) | Err(response) => response,
        }
    }

    fn route(&self, req: &ApiRequest) -> Result<ApiResponse, ApiResponse> {
        match (req.method.as_str(), req.path.as_str()) {
            ("GET", "/ping") => Ok(ApiResponse::ok(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
            }))),
            ("GET", "/leaderboard") => self.handle_leaderboard(req),
            ("GET", "/missions") => {
                let session = self.session(req)?;
                let missions = self.campus.browser().missions(&session).map_err(store_failure)?;
                Ok(ApiResponse::ok(json!({ "missions": missions })))
            }
            ("GET", "/rewards") => {
                let session = self.session(req)?;
                let rewards = self.campus.browser().rewards(&session).map_err(store_failure)?;
                Ok(ApiResponse::ok(json!({ "rewards": rewards })))
            }
            ("GET", "/me") => {
                let session = self.session(req)?;
                let dashboard = self
                    .campus
                    .dashboard()
                    .for_session(&session)
                    .map_err(store_failure)?
                    .ok_or_else(|| ApiResponse::from(LedgerError::ProfileNotFound))?;
                let history = self.campus.dashboard().history(&session).map_err(store_failure)?;
                Ok(ApiResponse::ok(json!({ "dashboard": dashboard, "history": history })))
            }
            ("POST", "/missions/complete") => {
                let session = self.session(req)?;
                let body: CompleteMissionBody = parse_body(&req.body)?;
                let completed = self.campus.missions().complete_mission(&session, &body.payload)?;
                Ok(ApiResponse::ok(json!({ "completed": completed })))
            }
            ("POST", "/rewards/redeem") => {
                let session = self.session(req)?;
                let body: RedeemRewardBody = parse_body(&req.body)?;
                let redeemed = self.campus.rewards().redeem_reward(&session, &body.reward_id)?;
                Ok(ApiResponse::ok(json!({ "redeemed": redeemed })))
            }

            // Admin catalog
            ("GET", "/admin/missions") => {
                let session = self.session(req)?;
                let missions = self.campus.catalog().list_missions(&session)?;
                Ok(ApiResponse::ok(json!({ "missions": missions })))
            }
            ("POST", "/admin/missions") => {
                let session = self.session(req)?;
                let draft: MissionDraft = parse_body(&req.body)?;
                let mission = self.campus.catalog().create_mission(&session, draft)?;
                Ok(ApiResponse::ok(json!({ "mission": mission })))
            }
            ("POST", p) if p.starts_with("/admin/missions/") => self.handle_admin_mission(req),
            ("GET", "/admin/rewards") => {
                let session = self.session(req)?;
                let rewards = self.campus.catalog().list_rewards(&session)?;
                Ok(ApiResponse::ok(json!({ "rewards": rewards })))
            }
            ("POST", "/admin/rewards") => {
                let session = self.session(req)?;
                let draft: RewardDraft = parse_body(&req.body)?;
                let reward = self.campus.catalog().create_reward(&session, draft)?;
                Ok(ApiResponse::ok(json!({ "reward": reward })))
            }
            ("POST", p) if p.starts_with("/admin/rewards/") => self.handle_admin_reward(req),

            _ => Err(ApiResponse::error(404, "not_found", "no such route")),
        }
    }

    /// Session from the user header, re-validated against the store
    fn session(&self, req: &ApiRequest) -> Result<Session, ApiResponse> {
        let user_id = req
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiResponse::error(401, "missing_user", "user header is required"))?;
        match self.campus.accounts().session_for(user_id) {
            Ok(session) => Ok(session),
            Err(AccountError::UnknownAccount(_)) => {
                Err(ApiResponse::error(401, "unknown_user", "unknown user"))
            }
            Err(e) => Err(ApiResponse::error(503, "store_unavailable", e)),
        }
    }

    fn handle_leaderboard(&self, req: &ApiRequest) -> Result<ApiResponse, ApiResponse> {
        let default_limit = self.campus.config().settings.leaderboard.limit;
        let limit = match query_param(req.query.as_deref(), "limit") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| ApiResponse::error(400, "bad_request", "limit must be a number"))?,
            None => default_limit,
        };
        let entries = self.campus.leaderboard().top(limit).map_err(store_failure)?;
        Ok(ApiResponse::ok(json!({ "leaderboard": entries })))
    }

    fn handle_admin_mission(&self, req: &ApiRequest) -> Result<ApiResponse, ApiResponse> {
        let (id, action) = parse_admin_path(&req.path, "/admin/missions/")
            .ok_or_else(|| ApiResponse::error(400, "bad_path", "expected /admin/missions/{id}"))?;
        let session = self.session(req)?;
        let catalog = self.campus.catalog();
        match action {
            None => {
                let draft: MissionDraft = parse_body(&req.body)?;
                let mission = catalog.update_mission(&session, id, draft)?;
                Ok(ApiResponse::ok(json!({ "mission": mission })))
            }
            Some("delete") => {
                catalog.delete_mission(&session, id)?;
                Ok(ApiResponse::ok(json!({ "status": "ok", "deleted": id })))
            }
            Some("token") => {
                let token = catalog.mission_token(&session, id)?;
                Ok(ApiResponse::ok(json!({ "token": token })))
            }
            Some(_) => Err(ApiResponse::error(404, "not_found", "no such route")),
        }
    }

    fn handle_admin_reward(&self, req: &ApiRequest) -> Result<ApiResponse, ApiResponse> {
        let (id, action) = parse_admin_path(&req.path, "/admin/rewards/")
            .ok_or_else(|| ApiResponse::error(400, "bad_path", "expected /admin/rewards/{id}"))?;
        let session = self.session(req)?;
        let catalog = self.campus.catalog();
        match action {
            None => {
                let draft: RewardDraft = parse_body(&req.body)?;
                let reward = catalog.update_reward(&session, id, draft)?;
                Ok(ApiResponse::ok(json!({ "reward": reward })))
            }
            Some("delete") => {
                catalog.delete_reward(&session, id)?;
                Ok(ApiResponse::ok(json!({ "status": "ok", "deleted": id })))
            }
            Some(_) => Err(ApiResponse::error(404, "not_found", "no such route")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        assert_eq!(query_param(Some("limit=10&x=1"), "limit"), Some("10"));
        assert_eq!(query_param(Some("x=1"), "limit"), None);
        assert_eq!(query_param(None, "limit"), None);
    }

    #[test]
    fn test_parse_admin_path() {
        assert_eq!(
            parse_admin_path("/admin/missions/abc", "/admin/missions/"),
            Some(("abc", None))
        );
        assert_eq!(
            parse_admin_path("/admin/missions/abc/delete/", "/admin/missions/"),
            Some(("abc", Some("delete")))
        );
        assert_eq!(parse_admin_path("/admin/missions/", "/admin/missions/"), None);
        assert_eq!(
            parse_admin_path("/admin/missions/a/b/c", "/admin/missions/"),
            None
        );
    }

    #[test]
    fn test_ledger_error_status_codes() {
        let status = |e: LedgerError| ApiResponse::from(e).status;
        assert_eq!(status(LedgerError::InvalidOrInactiveMission), 404);
        assert_eq!(status(LedgerError::AlreadyCompleted), 409);
        assert_eq!(status(LedgerError::OutOfStock), 409);
        assert_eq!(
            status(LedgerError::InsufficientPoints {
                required: 10,
                available: 5
            }),
            422
        );
        assert_eq!(
            status(LedgerError::StoreUnavailable(rusqlite::Error::InvalidQuery)),
            503
        );
    }
}
