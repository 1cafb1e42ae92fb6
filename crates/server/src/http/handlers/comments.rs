use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use domain::{build_thread, Action, ActionKind, CommentFilter, Requester};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use storage::Db;
use tracing::warn;

use super::admin::authorize;
use crate::actions::{self, Outcome};
use crate::http::error::ApiError;
use crate::http::views::{CommentView, PostView, ThreadView};
use crate::state::AppState;

/// Set by the authenticating proxy in front of us.
const REMOTE_USER_HEADER: &str = "X-Remote-User";
const MAX_AVATAR_SIZE: u32 = 2048;

#[derive(Deserialize)]
pub struct ListParams {
    pub view: Option<String>,
    pub size: Option<u32>,
}

pub fn is_secure(headers: &HeaderMap, default: bool) -> bool {
    headers
        .get("X-Forwarded-Proto")
        .and_then(|h| h.to_str().ok())
        .map_or(default, |proto| proto.eq_ignore_ascii_case("https"))
}

fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|list| list.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
        .or(peer)
}

async fn requester(db: &Db, headers: &HeaderMap) -> domain::Result<Requester> {
    let Some(user_id) = headers.get(REMOTE_USER_HEADER).and_then(|h| h.to_str().ok()) else {
        return Ok(Requester::Anonymous);
    };
    match db.get_account(user_id).await? {
        Some(account) => Ok(Requester::Authenticated(account)),
        None => {
            warn!("Unknown remote user '{}', treating as anonymous", user_id);
            Ok(Requester::Anonymous)
        }
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ThreadView>, ApiError> {
    let filter: CommentFilter = params.view.as_deref().unwrap_or("public").parse()?;
    if filter != CommentFilter::all().public() {
        authorize(&headers, &state.admin_token)?;
    }

    let site_id = &state.config.site_id;
    let post = state
        .db
        .get_post(site_id, &slug)
        .await?
        .ok_or_else(|| domain::Error::not_found("post", slug.as_str()))?;
    let comments = state.db.list_comments(site_id, &slug, filter).await?;

    let size = params.size.map(|s| s.clamp(1, MAX_AVATAR_SIZE));
    let secure = is_secure(&headers, state.config.gravatar.default_secure);
    let thread = build_thread(comments);

    Ok(Json(ThreadView {
        post: post.into(),
        comments: CommentView::thread(&thread, size, secure, &state.config),
    }))
}

/// Single form endpoint; the `type` field selects handle, moderate or comment.
pub async fn post_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let requester = requester(&state.db, &headers).await?;
    let action = Action::from_fields(&fields, &requester)?;

    match action.as_ref().map(Action::kind) {
        Some(ActionKind::Handle | ActionKind::Moderate) => {
            authorize(&headers, &state.admin_token)?;
        }
        Some(ActionKind::Comment) if state.config.enable_captcha => {
            let response = fields
                .get("challenge_response")
                .map(String::as_str)
                .unwrap_or_default();
            if !state.pow.verify_response(response) {
                warn!("Rejected comment on {}: invalid PoW challenge", slug);
                return Err(ApiError::Forbidden("Invalid PoW Challenge"));
            }
        }
        _ => {}
    }

    let peer = connect_info.map(|ConnectInfo(addr)| addr.ip());
    let ip_address = client_ip(&headers, peer);
    let outcome = actions::dispatch(&state.db, &state.config, &slug, action, ip_address).await?;

    let secure = is_secure(&headers, state.config.gravatar.default_secure);
    let response = match outcome {
        Outcome::Ignored => StatusCode::NO_CONTENT.into_response(),
        Outcome::Container(post) => Json(PostView::from(post)).into_response(),
        Outcome::Moderated(comment) => {
            Json(CommentView::new(&comment, None, secure, &state.config)).into_response()
        }
        Outcome::Created(comment) => (
            StatusCode::CREATED,
            Json(CommentView::new(&comment, None, secure, &state.config)),
        )
            .into_response(),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn forwarded_proto_decides_scheme() {
        assert!(is_secure(&headers(&[("x-forwarded-proto", "https")]), false));
        assert!(is_secure(&headers(&[("x-forwarded-proto", "HTTPS")]), false));
        assert!(!is_secure(&headers(&[("x-forwarded-proto", "http")]), true));
    }

    #[test]
    fn missing_proto_uses_configured_default() {
        assert!(is_secure(&HeaderMap::new(), true));
        assert!(!is_secure(&HeaderMap::new(), false));
    }

    #[test]
    fn first_forwarded_address_wins() {
        let peer: IpAddr = "127.0.0.1".parse().unwrap();
        let forwarded = headers(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);

        assert_eq!(client_ip(&forwarded, Some(peer)), "203.0.113.9".parse().ok());
    }

    #[test]
    fn falls_back_to_peer_address() {
        let peer: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), Some(peer));
        assert_eq!(
            client_ip(&headers(&[("x-forwarded-for", "not-an-ip")]), Some(peer)),
            Some(peer)
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
