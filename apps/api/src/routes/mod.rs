pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::library::handlers as library;
use crate::sessions::handlers as sessions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions: lesson, practice, flashcards, quiz
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_abandon_session),
        )
        .route(
            "/api/v1/sessions/:id/challenge",
            post(sessions::handle_start_challenge),
        )
        .route("/api/v1/sessions/:id/answer", post(sessions::handle_answer))
        // Learner library
        .route(
            "/api/v1/learners/:id/words",
            get(library::handle_list_words),
        )
        .route(
            "/api/v1/learners/:id/words/:word_id/unlearn",
            post(library::handle_unlearn),
        )
        .route(
            "/api/v1/learners/:id/daily-limit",
            get(library::handle_daily_limit),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::{Config, SchedulerConfig};
    use crate::models::learner_word::WordStatus;
    use crate::models::profile::LearnerProfile;
    use crate::scheduler::maintenance::test_support::RecordingMaintenance;
    use crate::scheduler::memory_store::MemoryWordStore;
    use crate::scheduler::Scheduler;
    use crate::sessions::registry::SessionRegistry;

    fn test_state(store: Arc<MemoryWordStore>) -> AppState {
        let scheduler_config = SchedulerConfig {
            lesson_size: 3,
            min_pool_words: 5,
            ..SchedulerConfig::default()
        };
        AppState {
            store: store.clone(),
            scheduler: Scheduler::new(
                store,
                Arc::new(RecordingMaintenance::default()),
                scheduler_config.clone(),
            ),
            sessions: Arc::new(SessionRegistry::new()),
            config: Config {
                database_url: "postgres://unused".to_string(),
                db_max_connections: 1,
                port: 0,
                rust_log: "debug".to_string(),
                session_idle_minutes: 120,
                scheduler: scheduler_config,
            },
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn seeded_store(n: usize) -> Arc<MemoryWordStore> {
        let store = Arc::new(MemoryWordStore::new());
        for i in 0..n {
            store.add_entry(&format!("word{i}"), i as i32, "general", Some("basic"));
        }
        store
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(Arc::new(MemoryWordStore::new())));
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "talkfix-api");
    }

    #[tokio::test]
    async fn test_lesson_runs_to_summary() {
        let store = seeded_store(10);
        let app = build_router(test_state(store.clone()));
        let learner = Uuid::new_v4();

        let (status, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({
                "learner_id": learner,
                "kind": "lesson",
                "level": "A1",
                "category": "",
                "challenge_mode": {"mode": "fixed", "type": "true-false"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["phase"], "study");
        assert_eq!(session["progress"]["target"], 3);
        assert_eq!(store.states_for(learner).len(), 5, "pool topped up to min_pool_words");
        let id = session["session_id"].as_str().unwrap().to_string();

        let mut last = Value::Null;
        for _ in 0..3 {
            let (status, challenge) =
                send(&app, Method::POST, &format!("/api/v1/sessions/{id}/challenge"), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(challenge["challenge_type"], "true-false");
            assert!(challenge.get("expected").is_none(), "answer key must stay server-side");

            // "<english> = <hebrew>" is true exactly when it shows the word's own translation.
            let prompt = challenge["prompt"].as_str().unwrap().to_string();
            let (english, hebrew) = prompt.split_once(" = ").unwrap();
            let truthful = hebrew == format!("{english}-he");

            let (status, answer) = send(
                &app,
                Method::POST,
                &format!("/api/v1/sessions/{id}/answer"),
                Some(json!({"answer": {"kind": "verdict", "value": truthful}})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(answer["correct"], true);
            last = answer;
        }

        assert_eq!(last["decision"], "graduate");
        assert_eq!(last["session"]["phase"], "summary");
        assert_eq!(last["combo"], 3);
        let learned = store
            .states_for(learner)
            .iter()
            .filter(|s| s.status == WordStatus::Learned)
            .count();
        assert_eq!(learned, 3);

        let (status, words) = send(
            &app,
            Method::GET,
            &format!("/api/v1/learners/{learner}/words?status=learned"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(words.as_array().unwrap().len(), 3);

        let (status, limit) = send(
            &app,
            Method::GET,
            &format!("/api/v1/learners/{learner}/daily-limit"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(limit["learned_today"], 3);
        assert_eq!(limit["remaining"], 2);
    }

    #[tokio::test]
    async fn test_wrong_answer_recycles_word() {
        let store = seeded_store(4);
        let app = build_router(test_state(store));
        let (_, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({
                "learner_id": Uuid::new_v4(),
                "kind": "lesson",
                "level": "",
                "category": "",
                "challenge_mode": {"mode": "fixed", "type": "multiple-choice"}
            })),
        )
        .await;
        let id = session["session_id"].as_str().unwrap().to_string();

        send(&app, Method::POST, &format!("/api/v1/sessions/{id}/challenge"), None).await;
        let (status, answer) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/answer"),
            Some(json!({"answer": {"kind": "text", "value": "definitely wrong"}})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["correct"], false);
        assert_eq!(answer["decision"], "recycle");
        assert_eq!(answer["session"]["progress"]["queue_length"], 4);
        assert_eq!(answer["session"]["progress"]["target"], 3);
        assert_eq!(answer["session"]["phase"], "study");
    }

    #[tokio::test]
    async fn test_profile_fills_missing_level_and_category() {
        let store = Arc::new(MemoryWordStore::new());
        store.add_entry("ticket", 0, "travel", Some("advanced"));
        store.add_entry("apple", 0, "food", Some("advanced"));
        let learner = Uuid::new_v4();
        store.put_profile(LearnerProfile {
            user_id: learner,
            english_level: Some("advanced".to_string()),
            interest_topics: vec!["travel".to_string()],
        });
        let app = build_router(test_state(store.clone()));

        let (status, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"learner_id": learner, "kind": "flashcards"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["current"]["english_word"], "ticket");
        assert_eq!(store.states_for(learner).len(), 1, "only the travel word matches");
        assert_eq!(store.states_for(learner)[0].view_count, 1, "study phase counts a view");
    }

    #[tokio::test]
    async fn test_empty_catalog_starts_in_summary() {
        let app = build_router(test_state(Arc::new(MemoryWordStore::new())));
        let (status, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"learner_id": Uuid::new_v4(), "kind": "quiz", "level": "", "category": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["phase"], "summary");
        assert!(session["current"].is_null());

        let id = session["session_id"].as_str().unwrap();
        let (status, body) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/challenge"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_zero_min_count_rejected() {
        let app = build_router(test_state(seeded_store(3)));
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"learner_id": Uuid::new_v4(), "kind": "lesson", "level": "", "category": "", "min_count": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_answer_without_challenge_is_conflict() {
        let app = build_router(test_state(seeded_store(3)));
        let (_, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"learner_id": Uuid::new_v4(), "kind": "practice", "level": "", "category": ""})),
        )
        .await;
        let id = session["session_id"].as_str().unwrap();
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/answer"),
            Some(json!({"answer": {"kind": "text", "value": "x"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_persist_failure_returns_500_and_can_retry() {
        let store = seeded_store(1);
        let app = build_router(test_state(store.clone()));
        let (_, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({
                "learner_id": Uuid::new_v4(),
                "kind": "lesson",
                "level": "",
                "category": "",
                "challenge_mode": {"mode": "fixed", "type": "word-assembly"}
            })),
        )
        .await;
        let id = session["session_id"].as_str().unwrap().to_string();
        let word = session["current"]["english_word"].as_str().unwrap().to_uppercase();
        send(&app, Method::POST, &format!("/api/v1/sessions/{id}/challenge"), None).await;

        store.fail_on("update_status");
        let body = json!({"answer": {"kind": "text", "value": word}});
        let (status, err) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/answer"),
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err["error"]["code"], "DATABASE_ERROR");

        store.recover("update_status");
        let (status, answer) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/answer"),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["decision"], "graduate");
    }

    #[tokio::test]
    async fn test_fixed_word_assembly_graduates_multi_word_entry() {
        let store = Arc::new(MemoryWordStore::new());
        store.add_entry("ice cream", 0, "general", Some("basic"));
        let app = build_router(test_state(store));
        let (_, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({
                "learner_id": Uuid::new_v4(),
                "kind": "lesson",
                "level": "",
                "category": "",
                "challenge_mode": {"mode": "fixed", "type": "word-assembly"}
            })),
        )
        .await;
        let id = session["session_id"].as_str().unwrap().to_string();

        let (_, challenge) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/challenge"), None).await;
        assert_eq!(challenge["letters"].as_array().unwrap().len(), 9);

        let (status, answer) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/answer"),
            Some(json!({"answer": {"kind": "text", "value": "ICE CREAM"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(answer["correct"], true);
        assert_eq!(answer["decision"], "graduate");
        assert_eq!(answer["session"]["phase"], "summary");
    }

    #[tokio::test]
    async fn test_unlearn_and_abandon() {
        let store = Arc::new(MemoryWordStore::new());
        let learner = Uuid::new_v4();
        let (_, entry) = store.add_word(learner, "done", 0, WordStatus::Learned);
        let app = build_router(test_state(store.clone()));

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/learners/{learner}/words/{}/unlearn", entry.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "new");
        assert_eq!(store.states_for(learner)[0].status, WordStatus::New);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/v1/learners/{learner}/words/{}/unlearn", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, session) = send(
            &app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({"learner_id": learner, "kind": "lesson", "level": "", "category": ""})),
        )
        .await;
        let id = session["session_id"].as_str().unwrap();
        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
