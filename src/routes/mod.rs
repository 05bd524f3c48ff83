//! API routes

mod error;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{AuthForm, AuthMode, AuthSession};
use crate::conversation::{Category, MediaAttachment, Message};
use crate::core::dashboard::{self, Overview, SecurityEvent, SecurityMetric, Severity};
use crate::core::{action_message, emergency_acknowledgment, ActionKind, Profile, Reply};
use crate::AppState;

pub use error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
    open_sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub action: ActionKind,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionOpened {
    pub id: Uuid,
    pub greeting: String,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub typing: bool,
    pub messages: Vec<Message>,
}

/// A file the client attached, described by its MIME type
#[derive(Debug, Deserialize)]
pub struct MediaUpload {
    pub mime: String,
    pub locator: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media: Option<MediaUpload>,
}

#[derive(Debug, Deserialize)]
pub struct EventFilter {
    pub severity: Option<String>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        open_sessions: state.sessions.len().await,
    })
}

async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<Reply> {
    Json(state.engine.respond(&request.message).await)
}

async fn insight(State(state): State<AppState>) -> Json<Reply> {
    Json(Reply {
        text: state.engine.insight_on_demand().to_string(),
        category: Category::Insight,
    })
}

async fn tip(State(state): State<AppState>) -> Json<Reply> {
    Json(Reply {
        text: state.engine.tip_on_demand().to_string(),
        category: Category::Tip,
    })
}

async fn emergency() -> Json<Reply> {
    tracing::warn!("emergency contact requested");
    Json(emergency_acknowledgment())
}

async fn action(Path(kind): Path<String>) -> Result<Json<ActionResponse>, ApiError> {
    let action: ActionKind = kind.parse().map_err(ApiError::NotFound)?;
    Ok(Json(ActionResponse {
        action,
        message: action_message(action).to_string(),
    }))
}

async fn open_session(State(state): State<AppState>) -> (StatusCode, Json<SessionOpened>) {
    let surface = state.sessions.open().await;
    let opening = surface.opening().await;

    (
        StatusCode::CREATED,
        Json(SessionOpened {
            id: surface.id(),
            greeting: opening.greeting,
            question: opening.question,
        }),
    )
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let surface = state.sessions.get(id).await?;
    Ok(Json(SessionView {
        id,
        typing: surface.is_typing(),
        messages: surface.messages(),
    }))
}

async fn submit_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let surface = state.sessions.get(id).await?;
    let media = request
        .media
        .map(|m| MediaAttachment::new(&m.mime, m.locator, m.name));

    let message = surface.submit(&request.text, media)?;
    Ok((StatusCode::ACCEPTED, Json(message)))
}

async fn session_insight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(state.sessions.get(id).await?.request_insight()?))
}

async fn session_tip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(state.sessions.get(id).await?.request_tip()?))
}

async fn session_emergency(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    Ok(Json(state.sessions.get(id).await?.trigger_emergency()?))
}

async fn clear_messages(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.get(id).await?.clear();
    Ok(StatusCode::NO_CONTENT)
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.close(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    state
        .profiles
        .get()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No profile stored".into()))
}

async fn put_profile(
    State(state): State<AppState>,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>, ApiError> {
    state.profiles.set(&profile).await?;
    tracing::info!("profile updated");
    Ok(Json(profile))
}

async fn delete_profile(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.profiles.remove().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn security_overview(State(state): State<AppState>) -> Result<Json<Overview>, ApiError> {
    let profile = state.profiles.get().await?;
    Ok(Json(dashboard::overview(profile.as_ref())))
}

async fn security_events(
    Query(filter): Query<EventFilter>,
) -> Result<Json<Vec<SecurityEvent>>, ApiError> {
    let severity = filter
        .severity
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Severity>())
        .transpose()
        .map_err(ApiError::BadRequest)?;
    Ok(Json(dashboard::events(severity)))
}

async fn security_metrics() -> Json<&'static [SecurityMetric]> {
    Json(dashboard::METRICS)
}

async fn register(
    State(state): State<AppState>,
    Json(form): Json<AuthForm>,
) -> Result<Json<AuthSession>, ApiError> {
    authenticate(&state, AuthMode::Register, form).await
}

async fn login(
    State(state): State<AppState>,
    Json(form): Json<AuthForm>,
) -> Result<Json<AuthSession>, ApiError> {
    authenticate(&state, AuthMode::Login, form).await
}

async fn authenticate(
    state: &AppState,
    mode: AuthMode,
    form: AuthForm,
) -> Result<Json<AuthSession>, ApiError> {
    Ok(Json(state.accounts.submit(mode, form).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/chat/insight", get(insight))
        .route("/v1/chat/tip", get(tip))
        .route("/v1/chat/emergency", post(emergency))
        .route("/v1/chat/actions/:kind", get(action))
        .route("/v1/sessions", post(open_session))
        .route("/v1/sessions/:id", get(get_session).delete(close_session))
        .route(
            "/v1/sessions/:id/messages",
            post(submit_message).delete(clear_messages),
        )
        .route("/v1/sessions/:id/insight", post(session_insight))
        .route("/v1/sessions/:id/tip", post(session_tip))
        .route("/v1/sessions/:id/emergency", post(session_emergency))
        .route(
            "/v1/profile",
            get(get_profile).put(put_profile).delete(delete_profile),
        )
        .route("/v1/security/overview", get(security_overview))
        .route("/v1/security/events", get(security_events))
        .route("/v1/security/metrics", get(security_metrics))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountStore;
    use crate::core::{
        content, db, FixedRandom, ProfileRepository, ResponseEngine, Sessions,
        SqliteProfileRepository, TypingPacing,
    };
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn make_state() -> AppState {
        let pool = db::connect_in_memory().await.unwrap();
        let profiles: Arc<dyn ProfileRepository> =
            Arc::new(SqliteProfileRepository::new(pool.clone()).await.unwrap());
        let accounts = Arc::new(
            AccountStore::with_cost(pool, profiles.clone(), 4)
                .await
                .unwrap(),
        );
        let engine = Arc::new(ResponseEngine::new(profiles.clone(), Arc::new(FixedRandom(0))));
        let pacing = TypingPacing {
            base_ms: 10,
            jitter_ms: 0,
        };

        AppState {
            sessions: Arc::new(Sessions::new(engine.clone(), pacing)),
            engine,
            profiles,
            accounts,
        }
    }

    async fn make_app() -> Router {
        router().with_state(make_state().await)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = make_app().await;
        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["open_sessions"], 0);
    }

    #[tokio::test]
    async fn test_chat_classifies_message() {
        let app = make_app().await;

        let (status, body) =
            send(&app, post_json("/v1/chat", json!({ "message": "Qual a melhor senha?" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "tip");
        assert_eq!(body["text"], content::TIPS[0]);

        let (_, body) = send(&app, post_json("/v1/chat", json!({ "message": "Oi" }))).await;
        assert_eq!(body["category"], "bot");
        assert_eq!(body["text"], content::FALLBACK);
    }

    #[tokio::test]
    async fn test_emergency_and_actions() {
        let app = make_app().await;

        let (status, body) = send(&app, post_json("/v1/chat/emergency", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "insight");
        assert_eq!(body["text"], content::EMERGENCY_ACK);

        let (status, body) = send(
            &app,
            Request::get("/v1/chat/actions/insights").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], content::actions::INSIGHTS);

        let (status, _) = send(
            &app,
            Request::get("/v1/chat/actions/party").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_flow() {
        let app = make_app().await;

        let (status, opened) = send(&app, post_json("/v1/sessions", json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = opened["id"].as_str().unwrap().to_string();
        assert_eq!(opened["question"], content::OPENING_QUESTION);

        let (status, message) = send(
            &app,
            post_json(
                &format!("/v1/sessions/{}/messages", id),
                json!({ "text": "Recebi um email de phishing" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(message["category"], "user");

        // The insight reply never reads the database, so the clock can be
        // paused across the typing delay without starving sqlx.
        tokio::time::pause();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio::time::resume();

        let (_, view) = send(
            &app,
            Request::get(format!("/v1/sessions/{}", id)).body(Body::empty()).unwrap(),
        )
        .await;
        let messages = view["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["category"], Category::Insight.as_str());
        assert_eq!(view["typing"], false);

        let (status, _) = send(
            &app,
            Request::delete(format!("/v1/sessions/{}", id)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(
            &app,
            Request::get(format!("/v1/sessions/{}", id)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_empty_submission_is_bad_request() {
        let app = make_app().await;
        let (_, opened) = send(&app, post_json("/v1/sessions", json!({}))).await;
        let id = opened["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            post_json(&format!("/v1/sessions/{}/messages", id), json!({ "text": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, message) = send(
            &app,
            post_json(
                &format!("/v1/sessions/{}/messages", id),
                json!({ "media": { "mime": "video/mp4", "locator": "blob:9", "name": "clip.mp4" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(message["media"]["kind"], "video");
    }

    #[tokio::test]
    async fn test_register_sets_profile_and_greeting() {
        let app = make_app().await;

        let (status, _) = send(&app, Request::get("/v1/profile").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let form = json!({
            "firstName": "Ana",
            "lastName": "Souza",
            "email": "ana@exemplo.com",
            "password": "segredo123",
            "country": "Brasil",
            "agreeToTerms": true
        });
        let (status, session) = send(&app, post_json("/auth/register", form.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["token_type"], "bearer");

        let (status, _) = send(&app, post_json("/auth/register", form)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, profile) =
            send(&app, Request::get("/v1/profile").body(Body::empty()).unwrap()).await;
        assert_eq!(profile["name"], "Ana Souza");

        let (_, reply) = send(&app, post_json("/v1/chat", json!({ "message": "Oi" }))).await;
        assert_eq!(reply["text"], format!("Olá Ana Souza, {}", content::FALLBACK));
    }

    #[tokio::test]
    async fn test_login_errors() {
        let app = make_app().await;

        let (status, body) = send(
            &app,
            post_json("/auth/login", json!({ "email": "x", "password": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"].as_array().unwrap().len(), 2);

        let (status, body) = send(
            &app,
            post_json(
                "/auth/login",
                json!({ "email": "ninguem@exemplo.com", "password": "segredo123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Credenciais inválidas.");
    }

    #[tokio::test]
    async fn test_put_profile() {
        let app = make_app().await;
        let request = Request::put("/v1/profile")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "Rui", "skills": ["OSINT"] }).to_string()))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["skills"][0], "OSINT");

        let (_, opened) = send(&app, post_json("/v1/sessions", json!({}))).await;
        assert!(opened["greeting"].as_str().unwrap().ends_with(", Rui"));

        let (status, _) =
            send(&app, Request::delete("/v1/profile").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, reply) = send(&app, post_json("/v1/chat", json!({ "message": "Oi" }))).await;
        assert_eq!(reply["text"], content::FALLBACK);
    }

    #[tokio::test]
    async fn test_security_events_filter() {
        let app = make_app().await;

        let (status, body) = send(
            &app,
            Request::get("/v1/security/events?severity=high").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let events = body.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e["severity"] == "high"));
        assert_eq!(events[0]["ip"], "103.56.115.89");

        let (_, body) = send(
            &app,
            Request::get("/v1/security/events").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), dashboard::EVENTS.len());

        let (status, body) = send(
            &app,
            Request::get("/v1/security/events?severity=critical").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_security_metrics_and_overview() {
        let app = make_app().await;

        let (status, body) = send(
            &app,
            Request::get("/v1/security/metrics").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["label"], "Pontuação Geral");
        assert_eq!(body[0]["value"], 78);
        assert_eq!(body.as_array().unwrap().len(), 4);

        let (_, overview) = send(
            &app,
            Request::get("/v1/security/overview").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(overview["name"], "Usuário");
        assert_eq!(overview["score"], 78);

        let request = Request::put("/v1/profile")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "name": "Rui", "role": "Analista" }).to_string()))
            .unwrap();
        send(&app, request).await;

        let (_, overview) = send(
            &app,
            Request::get("/v1/security/overview").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(overview["name"], "Rui");
        assert_eq!(overview["role"], "Analista");
    }
}
