use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use configs::AppConfig;
use models::{HoldStatus, MembershipStatus};
use service::clock::FixedClock;
use service::hold::domain::{Hold, Membership};
use service::hold::repository::mock::MockHoldRepository;
use service::legacy::mock::RecordingLegacyDispatcher;
use server::auth::issue_token;
use server::startup::{build_app, build_state};

const SECRET: &str = "test-secret";

struct TestApp {
    base_url: String,
    org_id: Uuid,
    token: String,
    repo: Arc<MockHoldRepository>,
    legacy: Arc<RecordingLegacyDispatcher>,
    clock: Arc<FixedClock>,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}/orgs/{}{}", self.base_url, self.org_id, path)
    }

    fn membership(&self, start: &str, end: &str) -> Membership {
        let now = Utc::now().into();
        let m = Membership {
            id: Uuid::new_v4(),
            org_id: self.org_id,
            org_user_id: Uuid::new_v4(),
            plan_name: "Monthly".into(),
            status: MembershipStatus::Active,
            start_date_loc: d(start),
            end_date_loc: d(end),
            hold_count: 0,
            hold_days: 0,
            hold_limit_count: 0,
            hold_limit_days: 0,
            can_be_modified: true,
            is_hold_enabled: true,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_membership(m.clone());
        m
    }

    fn active_hold(&self, m: &Membership, start: &str, end: &str) -> Hold {
        let now = Utc::now().into();
        let h = Hold {
            id: Uuid::new_v4(),
            org_id: m.org_id,
            org_user_id: m.org_user_id,
            org_user_plan_id: m.id,
            start_date: d(start),
            end_date: d(end),
            status: HoldStatus::Active,
            is_canceled: false,
            group_name: None,
            notify_email: false,
            notify_push: false,
            note: None,
            ended_by: None,
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_hold(h.clone());
        h
    }
}

fn d(s: &str) -> NaiveDate {
    s.parse().expect("date literal")
}

async fn start_server(today: &str) -> anyhow::Result<TestApp> {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = SECRET.into();

    let repo = Arc::new(MockHoldRepository::default());
    let legacy = Arc::new(RecordingLegacyDispatcher::default());
    let clock = Arc::new(FixedClock::new(d(today)));
    let state = build_state(&cfg, repo.clone(), legacy.clone(), clock.clone());
    let app = build_app(state);

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    let org_id = Uuid::new_v4();
    let token = issue_token(SECRET, "front-desk", org_id, 3600)?;
    Ok(TestApp { base_url, org_id, token, repo, legacy, clock })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().build().expect("reqwest client")
}

async fn wait_for_job(app: &TestApp, job_id: &str) -> anyhow::Result<Value> {
    for _ in 0..100 {
        let job: Value = client()
            .get(app.url(&format!("/jobs/{job_id}")))
            .bearer_auth(&app.token)
            .send()
            .await?
            .json()
            .await?;
        if job["status"] == "succeeded" || job["status"] == "failed" {
            return Ok(job);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    anyhow::bail!("job {job_id} did not finish")
}

#[tokio::test]
async fn e2e_public_health_and_metrics() -> anyhow::Result<()> {
    let app = start_server("2024-06-01").await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");

    let res = client().get(format!("{}/metrics", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = client().get(format!("{}/api-docs/openapi.json", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let doc: Value = res.json().await?;
    assert!(doc["paths"]["/orgs/{org_id}/holds/bulk"].is_object());
    Ok(())
}

#[tokio::test]
async fn e2e_org_routes_require_matching_token() -> anyhow::Result<()> {
    let app = start_server("2024-06-01").await?;
    let m = app.membership("2024-01-01", "2024-12-31");
    let path = app.url(&format!("/memberships/{}/holds", m.id));

    let res = client().get(&path).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    let res = client().get(&path).bearer_auth("not-a-jwt").send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let foreign = issue_token(SECRET, "front-desk", Uuid::new_v4(), 3600)?;
    let res = client().get(&path).bearer_auth(&foreign).send().await?;
    assert_eq!(res.status(), HttpStatusCode::FORBIDDEN);

    let res = client().get(&path).bearer_auth(&app.token).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_create_overlap_and_cancel() -> anyhow::Result<()> {
    let app = start_server("2024-06-01").await?;
    let m = app.membership("2024-01-01", "2024-12-31");
    let holds_url = app.url(&format!("/memberships/{}/holds", m.id));

    let res = client()
        .post(&holds_url)
        .bearer_auth(&app.token)
        .json(&json!({"start": "2024-07-01", "end": "2024-07-10", "note": "travel"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let created: Value = res.json().await?;
    let hold_id = created["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(created["status"], "upcoming");

    let res = client()
        .get(app.url(&format!("/memberships/{}/holds/overlap", m.id)))
        .query(&[("start", "2024-07-05"), ("end", "2024-07-06")])
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let overlap: Value = res.json().await?;
    assert_eq!(overlap["overlap"]["kind"], "inside_existing");
    assert_eq!(overlap["overlap"]["hold"]["id"], hold_id.as_str());

    let res = client()
        .post(&holds_url)
        .bearer_auth(&app.token)
        .json(&json!({"start": "2024-07-05", "end": "2024-07-20"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = res.json().await?;
    assert_eq!(err["code"], 2001);
    assert_eq!(err["rejection"]["reason"], "overlap");

    let res = client()
        .post(app.url(&format!("/holds/{hold_id}/cancel")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let canceled: Value = res.json().await?;
    assert_eq!(canceled["status"], "canceled");

    let res = client()
        .post(app.url(&format!("/holds/{hold_id}/end")))
        .bearer_auth(&app.token)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = res.json().await?;
    assert_eq!(err["rejection"]["reason"], "already_canceled");

    let res = client().get(&holds_url).bearer_auth(&app.token).send().await?;
    let listed: Vec<Value> = res.json().await?;
    assert_eq!(listed.len(), 1);
    Ok(())
}

#[tokio::test]
async fn e2e_hold_settings_gate_new_holds() -> anyhow::Result<()> {
    let app = start_server("2024-06-01").await?;
    let m = app.membership("2024-01-01", "2024-12-31");
    let settings_url = app.url(&format!("/memberships/{}/hold-settings", m.id));
    let holds_url = app.url(&format!("/memberships/{}/holds", m.id));

    let res = client()
        .patch(&settings_url)
        .bearer_auth(&app.token)
        .json(&json!({"is_hold_enabled": false}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["is_hold_enabled"], false);
    assert_eq!(updated["can_be_modified"], true);

    let res = client()
        .post(&holds_url)
        .bearer_auth(&app.token)
        .json(&json!({"start": "2024-07-01", "end": "2024-07-10"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    let err: Value = res.json().await?;
    assert_eq!(err["rejection"]["reason"], "holds_disabled");

    let res = client()
        .patch(&settings_url)
        .bearer_auth(&app.token)
        .json(&json!({"is_hold_enabled": true}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = client().get(app.url(&format!("/memberships/{}", m.id))).bearer_auth(&app.token).send().await?;
    let fetched: Value = res.json().await?;
    assert_eq!(fetched["is_hold_enabled"], true);

    let res = client()
        .post(&holds_url)
        .bearer_auth(&app.token)
        .json(&json!({"start": "2024-07-01", "end": "2024-07-10"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);

    let res = client()
        .patch(app.url(&format!("/memberships/{}/hold-settings", Uuid::new_v4())))
        .bearer_auth(&app.token)
        .json(&json!({"can_be_modified": false}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_end_hold_records_staff_and_dispatches_legacy_job() -> anyhow::Result<()> {
    let app = start_server("2024-06-11").await?;
    let m = app.membership("2024-01-01", "2024-12-31");
    let hold = app.active_hold(&m, "2024-06-01", "2024-06-30");

    let res = client()
        .post(app.url(&format!("/holds/{}/end", hold.id)))
        .bearer_auth(&app.token)
        .json(&json!({"note": "back early"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let ended: Value = res.json().await?;
    assert_eq!(ended["status"], "expired");
    assert_eq!(ended["end_date"], "2024-06-11");
    assert_eq!(ended["ended_by"], "front-desk");

    let after = app.repo.membership(m.id).expect("membership");
    assert_eq!(after.end_date_loc, d("2025-01-10"));

    for _ in 0..100 {
        if !app.legacy.dispatched().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let dispatched = app.legacy.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].1["hold_id"], json!(hold.id));
    Ok(())
}

#[tokio::test]
async fn e2e_ended_by_comes_from_the_token_not_the_body() -> anyhow::Result<()> {
    let app = start_server("2024-06-11").await?;
    let first = app.membership("2024-01-01", "2024-12-31");
    let second = app.membership("2024-01-01", "2024-12-31");
    let single = app.active_hold(&first, "2024-06-01", "2024-06-30");
    let bulk = app.active_hold(&second, "2024-06-01", "2024-06-30");

    let res = client()
        .post(app.url(&format!("/holds/{}/end", single.id)))
        .bearer_auth(&app.token)
        .json(&json!({"ended_by": "someone-else"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let ended: Value = res.json().await?;
    assert_eq!(ended["ended_by"], "front-desk");

    let res = client()
        .post(app.url("/holds/bulk/end"))
        .bearer_auth(&app.token)
        .json(&json!({"hold_ids": [bulk.id], "ended_by": "someone-else"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::ACCEPTED);
    let accepted: Value = res.json().await?;
    let job_id = accepted["job_id"].as_str().unwrap_or_default().to_string();
    let job = wait_for_job(&app, &job_id).await?;
    assert_eq!(job["output"]["success"], 1);
    assert_eq!(app.repo.hold(bulk.id).expect("hold").ended_by.as_deref(), Some("front-desk"));
    Ok(())
}

#[tokio::test]
async fn e2e_bulk_end_reports_per_item_outcomes() -> anyhow::Result<()> {
    let app = start_server("2024-06-11").await?;
    let first = app.membership("2024-01-01", "2024-12-31");
    let second = app.membership("2024-01-01", "2024-12-31");
    let a = app.active_hold(&first, "2024-06-01", "2024-06-30");
    let b = app.active_hold(&second, "2024-06-05", "2024-06-25");
    let missing = Uuid::new_v4();

    let res = client()
        .post(app.url("/holds/bulk/end"))
        .bearer_auth(&app.token)
        .json(&json!({"hold_ids": [a.id, b.id, missing]}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::ACCEPTED);
    let accepted: Value = res.json().await?;
    assert_eq!(accepted["job"], "bulk_end_hold");
    let job_id = accepted["job_id"].as_str().unwrap_or_default().to_string();

    let job = wait_for_job(&app, &job_id).await?;
    assert_eq!(job["status"], "succeeded");
    assert_eq!(job["output"]["total"], 3);
    assert_eq!(job["output"]["success"], 2);
    assert_eq!(job["output"]["failed"], 1);
    assert_eq!(job["output"]["errors"][0]["id"], json!(missing));

    assert_eq!(app.repo.hold(a.id).expect("hold").status, HoldStatus::Expired);
    assert_eq!(app.repo.hold(b.id).expect("hold").status, HoldStatus::Expired);

    let other_org = Uuid::new_v4();
    let other = issue_token(SECRET, "front-desk", other_org, 3600)?;
    let res = client()
        .get(format!("{}/orgs/{other_org}/jobs/{job_id}", app.base_url))
        .bearer_auth(&other)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_bulk_rejects_empty_selection() -> anyhow::Result<()> {
    let app = start_server("2024-06-01").await?;
    let res = client()
        .post(app.url("/holds/bulk"))
        .bearer_auth(&app.token)
        .json(&json!({"membership_ids": [], "start": "2024-07-01", "end": "2024-07-10"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    let res = client()
        .post(app.url("/holds/bulk/end/group"))
        .bearer_auth(&app.token)
        .json(&json!({"group_name": "  "}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn e2e_group_create_then_sync_activates() -> anyhow::Result<()> {
    let app = start_server("2024-06-01").await?;
    let first = app.membership("2024-01-01", "2024-12-31");
    let second = app.membership("2024-01-01", "2024-12-31");

    let res = client()
        .post(app.url("/holds/bulk/group"))
        .bearer_auth(&app.token)
        .json(&json!({"group_name": "summer-closure", "start": "2024-07-01", "end": "2024-07-14"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::ACCEPTED);
    let accepted: Value = res.json().await?;
    let job = wait_for_job(&app, accepted["job_id"].as_str().unwrap_or_default()).await?;
    assert_eq!(job["output"]["success"], 2);

    for m in [&first, &second] {
        let holds = app.repo.holds_of(m.id);
        assert_eq!(holds.len(), 1);
        assert_eq!(holds[0].group_name.as_deref(), Some("summer-closure"));
    }

    app.clock.set(d("2024-07-02"));
    let res = client().post(app.url("/holds/sync")).bearer_auth(&app.token).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let report: Value = res.json().await?;
    assert_eq!(report["activated"], 2);
    assert_eq!(app.repo.membership(first.id).expect("membership").status, MembershipStatus::Hold);
    Ok(())
}
