//! End-to-end tests of the HTTP API over a temporary database.

mod support;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use student_records::http::{AppState, create_router};
use student_records::manager::today;
use support::{TestDb, test_db};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    db: TestDb,
}

fn app() -> TestApp {
    let db = test_db();
    let router = create_router(AppState::new(db.manager.clone()));
    TestApp { router, db }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn create_student(&self, roll_no: &str, name: &str, course: &str, semester: i32) -> i64 {
        let (status, body) = self
            .post(
                "/api/students/",
                json!({"roll_no": roll_no, "name": name, "course": course, "semester": semester}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn test_health_reports_connected_database() {
    let app = app();

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_create_student_returns_derived_fields() {
    let app = app();

    let (status, body) = app
        .post(
            "/api/students/",
            json!({"roll_no": "1001", "name": "Aarav Patel", "semester": 3}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["roll_no"], "1001");
    assert_eq!(body["course"], "B.Tech");
    assert_eq!(body["attendance_percentage"], 0.0);
    assert_eq!(body["average_marks"], 0.0);
    assert_eq!(body["performance_remark"], "Needs Improvement");
    assert_eq!(body["attendance_warning"], "⚠ Attendance Shortage (< 75%)");
}

#[tokio::test]
async fn test_duplicate_roll_no_is_a_validation_error() {
    let app = app();
    app.create_student("1001", "Aarav Patel", "B.Tech", 3).await;

    let (status, body) = app
        .post(
            "/api/students/",
            json!({"roll_no": "1001", "name": "Copy", "semester": 1}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["fields"]["roll_no"].is_array());
    assert_eq!(app.db.manager.num_students().unwrap(), 1);
}

#[tokio::test]
async fn test_missing_fields_are_listed() {
    let app = app();

    let (status, body) = app.post("/api/students/", json!({"course": "BCA"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["roll_no", "name", "semester"] {
        assert_eq!(body["fields"][field][0], "This field is required.", "{field}");
    }
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/students/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"roll_no\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unparseable_query_gets_json_error() {
    let app = app();

    for uri in [
        "/api/students/?semester=1&semester=2",
        "/api/attendance/?student=1&student=2",
        "/api/marks/?student=1&student=2",
    ] {
        let (status, body) = app.get(uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "BAD_REQUEST", "{uri}");
    }
}

#[tokio::test]
async fn test_list_students_with_filters_and_search() {
    let app = app();
    let rahul = app.create_student("1234", "Rahul Shah", "B.Tech", 1).await;
    let priya = app.create_student("5678", "Priya Patel", "BCA", 1).await;
    app.create_student("9012", "Amit Sharma", "B.Tech", 2).await;

    let ids = |body: &Value| -> Vec<i64> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_i64().unwrap())
            .collect()
    };

    let (status, body) = app.get("/api/students/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body).len(), 3);

    let (_, body) = app.get("/api/students/?course=B.Tech&semester=1").await;
    assert_eq!(ids(&body), [rahul]);

    let (_, body) = app.get("/api/students/?search=pat").await;
    assert_eq!(ids(&body), [priya]);

    let (_, body) = app.get("/api/students/?search=rahul%2012").await;
    assert_eq!(ids(&body), [rahul]);

    let (status, body) = app.get("/api/students/?semester=first").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["semester"].is_array());
}

#[tokio::test]
async fn test_student_report_after_recording_attendance_and_marks() {
    let app = app();
    let id = app.create_student("1001", "Aarav Patel", "B.Tech", 3).await;

    for is_present in [true, true, false, true, true] {
        let (status, body) = app
            .post(
                "/api/attendance/",
                json!({"student": id, "is_present": is_present, "date": "1999-01-01"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["date"], today().to_string());
    }
    for score in [80.0, 90.0] {
        let (status, _) = app
            .post(
                "/api/marks/",
                json!({"student": id, "subject": "Maths", "score": score}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.get(&format!("/api/students/{id}/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendance_percentage"], 80.0);
    assert_eq!(body["average_marks"], 85.0);
    assert_eq!(body["attendance_warning"], "Good Attendance");
    assert_eq!(body["performance_remark"], "Good");
}

#[tokio::test]
async fn test_student_without_attendance_needs_improvement() {
    let app = app();
    let id = app.create_student("1001", "Aarav Patel", "B.Tech", 3).await;
    app.post(
        "/api/marks/",
        json!({"student": id, "subject": "Physics", "score": 40}),
    )
    .await;

    let (_, body) = app.get(&format!("/api/students/{id}/")).await;

    assert_eq!(body["attendance_percentage"], 0.0);
    assert_eq!(body["average_marks"], 40.0);
    assert_eq!(body["performance_remark"], "Needs Improvement");
}

#[tokio::test]
async fn test_update_and_patch_student() {
    let app = app();
    let id = app.create_student("1001", "Aarav Patel", "B.Tech", 3).await;
    let uri = format!("/api/students/{id}/");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(json!({"roll_no": "1001"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["name"].is_array());

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(json!({"roll_no": "2001", "name": "Aarav P.", "semester": 4})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roll_no"], "2001");
    assert_eq!(body["course"], "B.Tech");

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(json!({"course": "M.Tech"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"], "M.Tech");
    assert_eq!(body["semester"], 4);
}

#[tokio::test]
async fn test_delete_student_cascades() {
    let app = app();
    let id = app.create_student("1001", "Aarav Patel", "B.Tech", 3).await;
    app.post("/api/attendance/", json!({"student": id, "is_present": true}))
        .await;
    app.post(
        "/api/marks/",
        json!({"student": id, "subject": "Chemistry", "score": 66.5}),
    )
    .await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/students/{id}/"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, attendance) = app.get(&format!("/api/attendance/?student={id}")).await;
    let (_, marks) = app.get(&format!("/api/marks/?student={id}")).await;
    assert_eq!(attendance, json!([]));
    assert_eq!(marks, json!([]));

    let (status, body) = app.get(&format!("/api/students/{id}/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_attendance_crud() {
    let app = app();
    let id = app.create_student("1001", "Aarav Patel", "B.Tech", 3).await;

    let (status, body) = app.post("/api/attendance/", json!({"student": id})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_present"], false);
    let uri = format!("/api/attendance/{}/", body["id"]);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(json!({"is_present": true})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_present"], true);
    assert_eq!(body["student"], id);

    let (status, _) = app.send(Method::PUT, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_attendance_for_unknown_student_is_rejected() {
    let app = app();

    let (status, body) = app
        .post("/api/attendance/", json!({"student": 404, "is_present": true}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["student"].is_array());
}

#[tokio::test]
async fn test_marks_crud_accepts_any_score() {
    let app = app();
    let id = app.create_student("1001", "Aarav Patel", "B.Tech", 3).await;

    let (status, body) = app
        .post(
            "/api/marks/",
            json!({"student": id, "subject": "English", "score": 120.5}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["score"], 120.5);
    let uri = format!("/api/marks/{}/", body["id"]);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(json!({"student": id, "subject": "Maths", "score": -3})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "Maths");
    assert_eq!(body["score"], -3.0);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(json!({"subject": ""})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["subject"][0], "This field may not be blank.");

    let (status, body) = app.get("/api/marks/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app.send(Method::DELETE, "/api/marks/999/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_sample_data() {
    let app = app();

    let (status, body) = app.post("/api/generate_sample_data/", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    let created = body["created"].as_u64().unwrap() as usize;
    assert!((1..=5).contains(&created));
    assert!(body["message"].as_str().unwrap().contains(&created.to_string()));

    let (_, students) = app.get("/api/students/").await;
    assert_eq!(students.as_array().unwrap().len(), created);

    let (_, marks) = app.get("/api/marks/").await;
    assert_eq!(marks.as_array().unwrap().len(), created * 5);

    let (status, _) = app
        .send(Method::POST, "/api/generate-sample-data/", None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
