//! Router tests driven through `tower::ServiceExt::oneshot` against an
//! in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use campus_core::{
  catalog::{Branch, Course},
  profile::AdminInput,
  provision::Provisioner,
  secret::{Argon2Hasher, SecretHasher},
  store::CampusStore,
};
use campus_store_sqlite::SqliteStore;
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

const ADMIN: (&str, &str) = ("head@school.com", "hunter22");

async fn make_app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .add_course(Course {
      id:         Uuid::new_v4(),
      name:       "B.Tech".into(),
      code:       None,
      branches:   vec![Branch { name: "CSE".into(), subjects: vec![] }],
      created_at: Utc::now(),
    })
    .await
    .unwrap();

  let hasher: Arc<dyn SecretHasher> = Arc::new(Argon2Hasher::with_cost(1024, 1, 1).unwrap());
  let p = Provisioner::new(Arc::new(store), hasher);
  p.create_admin(AdminInput {
    admin_id: Some("A1".into()),
    name: Some("Head".into()),
    email: Some(ADMIN.0.into()),
    password: Some(ADMIN.1.into()),
    personal_email: Some("head@example.com".into()),
    ..Default::default()
  })
  .await
  .unwrap();

  api_router(p)
}

fn basic((user, pass): (&str, &str)) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  auth: Option<(&str, &str)>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(creds) = auth {
    builder = builder.header(header::AUTHORIZATION, basic(creds));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

fn student_body(id: &str) -> Value {
  json!({
    "studentId": id,
    "name": format!("Student {id}"),
    "personalEmail": "kid@example.com",
    "dob": "2006-05-15",
    "course": "B.Tech",
    "branch": "CSE",
    "semester": 1
  })
}

fn faculty_body(id: &str) -> Value {
  json!({
    "facultyId": id,
    "name": "Dr. Rao",
    "personalEmail": "rao@example.com",
    "dob": "1980-01-02",
    "designation": "Professor",
    "course": "B.Tech",
    "branch": "CSE"
  })
}

/// Create a student as the admin and return its profile id.
async fn seed_student(app: &Router, id: &str) -> String {
  let (status, body) = call(app, "POST", "/students", Some(ADMIN), Some(student_body(id))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["data"]["profile"]["id"].as_str().unwrap().to_owned()
}

// ─── Authentication ──────────────────────────────────────────────────────────

#[tokio::test]
async fn login_returns_identity_without_hash() {
  let app = make_app().await;
  let (status, body) = call(
    &app,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": ADMIN.0, "password": ADMIN.1 })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["data"]["identity"]["loginKey"], ADMIN.0);
  assert_eq!(body["data"]["identity"]["role"], "ADMIN");
  assert!(body["data"]["identity"].get("passwordHash").is_none());
  assert_eq!(body["data"]["profile"]["kind"], "admin");
}

#[tokio::test]
async fn wrong_password_is_401() {
  let app = make_app().await;
  let (status, body) = call(
    &app,
    "POST",
    "/auth/login",
    None,
    Some(json!({ "email": ADMIN.0, "password": "nope" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn routes_require_basic_auth() {
  let app = make_app().await;
  let req = Request::builder().uri("/students").body(Body::empty()).unwrap();
  let resp = app.oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn me_reports_the_caller() {
  let app = make_app().await;
  let (status, body) = call(&app, "GET", "/me", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["identity"]["loginKey"], ADMIN.0);
}

// ─── Students ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_student_discloses_credentials_once() {
  let app = make_app().await;
  let (status, body) =
    call(&app, "POST", "/students", Some(ADMIN), Some(student_body("S101"))).await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["credentials"]["email"], "S101@school.com");
  assert_eq!(body["data"]["credentials"]["password"], "15/05/2006");
  assert_eq!(body["data"]["profile"]["studentId"], "S101");
  assert!(body["data"]["profile"]["age"].is_u64());

  let id = body["data"]["profile"]["id"].as_str().unwrap();
  let (status, body) = call(&app, "GET", &format!("/students/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["data"].get("credentials").is_none());
}

#[tokio::test]
async fn duplicate_student_is_409() {
  let app = make_app().await;
  seed_student(&app, "S101").await;
  let (status, body) =
    call(&app, "POST", "/students", Some(ADMIN), Some(student_body("s101"))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn invalid_student_is_400() {
  let app = make_app().await;
  let mut input = student_body("S101");
  input["course"] = json!("MBA");
  let (status, _) = call(&app, "POST", "/students", Some(ADMIN), Some(input)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_students_report_rows() {
  let app = make_app().await;
  let rows = json!([student_body("S101"), student_body("S101"), student_body("S103")]);
  let (status, body) = call(&app, "POST", "/students/bulk", Some(ADMIN), Some(rows)).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["addedCount"], 2);
  assert_eq!(body["data"]["skippedCount"], 1);
  assert_eq!(body["data"]["errors"][0]["row"], 2);
  assert_eq!(body["data"]["errors"][0]["key"], "S101");
}

#[tokio::test]
async fn bulk_students_keep_going_past_badly_typed_rows() {
  let app = make_app().await;
  let mut quoted_semester = student_body("S102");
  quoted_semester["semester"] = json!("2");
  let mut numeric_key = student_body("S104");
  numeric_key["studentId"] = json!(104);
  let rows = json!([student_body("S101"), quoted_semester, numeric_key, student_body("S103")]);

  let (status, body) = call(&app, "POST", "/students/bulk", Some(ADMIN), Some(rows)).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["addedCount"], 2);
  assert_eq!(body["data"]["skippedCount"], 2);
  assert_eq!(body["data"]["errors"][0]["row"], 2);
  assert_eq!(body["data"]["errors"][0]["key"], "S102");
  assert_eq!(body["data"]["errors"][1]["row"], 3);
  assert_eq!(body["data"]["errors"][1]["key"], "104");

  let (_, listed) = call(&app, "GET", "/students", Some(ADMIN), None).await;
  assert_eq!(listed["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bad_path_ids_use_the_error_envelope() {
  let app = make_app().await;
  let (status, body) = call(&app, "GET", "/students/not-a-uuid", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
  assert!(body["message"].as_str().unwrap().starts_with("invalid path"), "{body}");
}

#[tokio::test]
async fn unreadable_bodies_use_the_error_envelope() {
  let app = make_app().await;
  let req = Request::builder()
    .method("POST")
    .uri("/students")
    .header(header::AUTHORIZATION, basic(ADMIN))
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{\"studentId\": "))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(body["success"], false);
  assert!(body["message"].as_str().unwrap().starts_with("invalid request body"), "{body}");

  let mut typed = student_body("S101");
  typed["semester"] = json!("first");
  let (status, body) = call(&app, "POST", "/students", Some(ADMIN), Some(typed)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);
}

#[tokio::test]
async fn students_only_see_themselves() {
  let app = make_app().await;
  let own = seed_student(&app, "S101").await;
  let other = seed_student(&app, "S102").await;
  let me = ("S101@school.com", "15/05/2006");

  let (status, body) = call(&app, "GET", "/students", Some(me), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 1);
  assert_eq!(body["data"][0]["id"], own.as_str());

  let (status, _) = call(&app, "GET", &format!("/students/{own}"), Some(me), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, "GET", &format!("/students/{other}"), Some(me), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(&app, "POST", "/students", Some(me), Some(student_body("S103"))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_student_over_http() {
  let app = make_app().await;
  let id = seed_student(&app, "S101").await;

  let (status, body) = call(
    &app,
    "PUT",
    &format!("/students/{id}"),
    Some(ADMIN),
    Some(json!({ "studentId": "S201", "semester": 2 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["data"]["studentId"], "S201");
  assert_eq!(body["data"]["semester"], 2);

  let (status, _) = call(&app, "GET", "/me", Some(("S201@school.com", "15/05/2006")), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_student_revokes_their_login() {
  let app = make_app().await;
  let id = seed_student(&app, "S101").await;
  let student = ("S101@school.com", "15/05/2006");

  let (status, body) = call(
    &app,
    "POST",
    "/attendance",
    Some(ADMIN),
    Some(json!({ "student": id, "date": "2024-03-01", "status": "present" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");

  let (status, body) = call(&app, "DELETE", &format!("/students/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["attendance"], 1);

  let (status, _) = call(&app, "GET", "/me", Some(student), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) = call(&app, "GET", &format!("/students/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Admins ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admins_cannot_delete_themselves() {
  let app = make_app().await;
  let (_, me) = call(&app, "GET", "/me", Some(ADMIN), None).await;
  let id = me["data"]["profile"]["id"].as_str().unwrap();

  let (status, body) = call(&app, "DELETE", &format!("/admins/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["success"], false);

  let (status, _) = call(&app, "GET", "/me", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_crud() {
  let app = make_app().await;
  let input = json!({
    "adminId": "a2",
    "name": "Dean",
    "email": "dean@school.com",
    "password": "s3cret",
    "personalEmail": "dean@example.com"
  });
  let (status, body) = call(&app, "POST", "/admins", Some(ADMIN), Some(input)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["data"]["adminId"], "A2");
  let id = body["data"]["id"].as_str().unwrap().to_owned();

  let (status, body) = call(&app, "GET", "/admins", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (status, _) = call(&app, "DELETE", &format!("/admins/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, "GET", "/me", Some(("dean@school.com", "s3cret")), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Faculty and records ─────────────────────────────────────────────────────

#[tokio::test]
async fn faculty_mark_attendance_and_students_read_it() {
  let app = make_app().await;
  let (status, _) = call(&app, "POST", "/faculty", Some(ADMIN), Some(faculty_body("F1"))).await;
  assert_eq!(status, StatusCode::CREATED);
  let lecturer = ("F1@school.com", "02/01/1980");

  let own = seed_student(&app, "S101").await;
  let other = seed_student(&app, "S102").await;
  let mark = |status: &str| json!({ "student": own, "date": "2024-03-01", "status": status });

  let (status, _) = call(&app, "POST", "/attendance", Some(lecturer), Some(mark("present"))).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, body) =
    call(&app, "POST", "/attendance", Some(lecturer), Some(mark("ABSENT"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["created"], false);
  assert_eq!(body["data"]["attendance"]["status"], "Absent");

  let student = ("S101@school.com", "15/05/2006");
  let (status, body) =
    call(&app, "GET", &format!("/students/{own}/attendance"), Some(student), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 1);

  let (status, _) =
    call(&app, "GET", &format!("/students/{other}/attendance"), Some(student), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(&app, "DELETE", &format!("/students/{other}"), Some(lecturer), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn faculty_remarks_list_what_they_wrote() {
  let app = make_app().await;
  let (status, body) = call(&app, "POST", "/faculty", Some(ADMIN), Some(faculty_body("F1"))).await;
  assert_eq!(status, StatusCode::CREATED);
  let fid = body["data"]["profile"]["id"].as_str().unwrap().to_owned();
  let lecturer = ("F1@school.com", "02/01/1980");

  let sid = seed_student(&app, "S101").await;
  let remark = json!({ "student": sid, "remark": "Good lab work" });
  let (status, _) = call(&app, "POST", "/remarks", Some(lecturer), Some(remark)).await;
  assert_eq!(status, StatusCode::CREATED);
  let remark = json!({ "student": sid, "remark": "Needs revision" });
  let (status, _) = call(&app, "POST", "/remarks", Some(ADMIN), Some(remark)).await;
  assert_eq!(status, StatusCode::CREATED);

  let uri = format!("/faculty/{fid}/remarks");
  let (status, body) = call(&app, "GET", &uri, Some(lecturer), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 1);
  assert_eq!(body["data"][0]["body"], "Good lab work");

  let (status, _) = call(&app, "GET", &uri, Some(("S101@school.com", "15/05/2006")), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let missing = format!("/faculty/{}/remarks", Uuid::new_v4());
  let (status, _) = call(&app, "GET", &missing, Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_attendance_over_http() {
  let app = make_app().await;
  let id = seed_student(&app, "S101").await;
  let rows = json!([
    { "student": id, "date": "2024-03-01", "status": "Present" },
    { "student": id, "date": "2024-03-02" },
    { "student": Uuid::new_v4(), "date": "2024-03-03", "status": "Late" }
  ]);

  let (status, body) = call(&app, "POST", "/attendance/bulk", Some(ADMIN), Some(rows)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["addedCount"], 1);
  assert_eq!(body["data"]["skippedCount"], 2);
}

#[tokio::test]
async fn remarks_and_performance() {
  let app = make_app().await;
  let id = seed_student(&app, "S101").await;

  let (status, body) = call(
    &app,
    "POST",
    "/remarks",
    Some(ADMIN),
    Some(json!({ "student": id, "remark": "Excellent project work" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");

  let (status, body) = call(
    &app,
    "POST",
    "/performance",
    Some(ADMIN),
    Some(json!({
      "student": id,
      "subject": "Maths",
      "exam": "Final",
      "marksObtained": 72.5,
      "maxMarks": 100.0,
      "semester": 1
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");

  let (_, remarks) = call(&app, "GET", &format!("/students/{id}/remarks"), Some(ADMIN), None).await;
  assert_eq!(remarks["data"][0]["body"], "Excellent project work");
  let (_, perf) =
    call(&app, "GET", &format!("/students/{id}/performance"), Some(ADMIN), None).await;
  assert_eq!(perf["data"][0]["marksObtained"], 72.5);
}

// ─── Catalog and maintenance ─────────────────────────────────────────────────

#[tokio::test]
async fn course_catalog_round_trip() {
  let app = make_app().await;
  let course = json!({
    "name": "M.Tech",
    "branches": [{ "name": "VLSI", "subjects": [{ "name": "Analog Design", "semester": 1 }] }]
  });
  let (status, body) = call(&app, "POST", "/courses", Some(ADMIN), Some(course)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  let id = body["data"]["id"].as_str().unwrap().to_owned();

  let (status, _) =
    call(&app, "POST", "/courses", Some(ADMIN), Some(json!({ "name": "m.tech" }))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let bad = json!({ "name": "PhD", "branches": [{ "name": "X", "subjects": [{ "name": "Y", "semester": 9 }] }] });
  let (status, _) = call(&app, "POST", "/courses", Some(ADMIN), Some(bad)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = call(&app, "GET", "/courses", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (status, _) = call(&app, "DELETE", &format!("/courses/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, "GET", &format!("/courses/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn padded_catalog_names_are_trimmed() {
  let app = make_app().await;
  let course = json!({
    "name": "M.Tech",
    "branches": [{ "name": " ECE ", "subjects": [{ "name": "  VLSI ", "semester": 1 }] }]
  });
  let (status, body) = call(&app, "POST", "/courses", Some(ADMIN), Some(course)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["data"]["branches"][0]["name"], "ECE");
  assert_eq!(body["data"]["branches"][0]["subjects"][0]["name"], "VLSI");

  let mut lecturer = faculty_body("F1");
  lecturer["course"] = json!("m.tech");
  lecturer["branch"] = json!("ece");
  lecturer["subject"] = json!("vlsi");
  let (status, body) = call(&app, "POST", "/faculty", Some(ADMIN), Some(lecturer)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn drift_report_after_course_edit() {
  let app = make_app().await;
  seed_student(&app, "S101").await;

  let (_, courses) = call(&app, "GET", "/courses", Some(ADMIN), None).await;
  let id = courses["data"][0]["id"].as_str().unwrap().to_owned();
  let (status, _) = call(
    &app,
    "PUT",
    &format!("/courses/{id}"),
    Some(ADMIN),
    Some(json!({ "name": "B.Tech", "branches": [{ "name": "ECE" }] })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = call(&app, "GET", "/maintenance/catalog-drift", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"][0]["naturalKey"], "S101");
  assert_eq!(body["data"][0]["kind"], "student");
}

#[tokio::test]
async fn maintenance_is_admin_only() {
  let app = make_app().await;
  call(&app, "POST", "/faculty", Some(ADMIN), Some(faculty_body("F1"))).await;
  let lecturer = ("F1@school.com", "02/01/1980");

  let (status, _) = call(&app, "POST", "/maintenance/orphans", Some(lecturer), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(&app, "POST", "/maintenance/orphans", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["data"].as_array().unwrap().is_empty());
}
