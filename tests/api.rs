//! End-to-end API tests against an in-process server.

mod common;

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use common::test_server::{HOST_SUFFIX, KEY_SECRET, TestServer, WEBHOOK_SECRET};
use schoolhub::billing::signature;
use schoolhub::config::LifecycleConfig;

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("array")
        .iter()
        .map(|item| item["id"].as_str().expect("id").to_string())
        .collect()
}

async fn publish(server: &TestServer, token: &str) {
    let (status, body) = server
        .call(Method::POST, "/school/publish", Some(token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "publish failed: {body}");
}

#[tokio::test]
async fn test_signup_login_and_me() {
    let server = TestServer::start().await;
    let session = server.signup("greenwood").await;

    let (status, body) = server
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "school_name": "Another",
                "subdomain": "greenwood",
                "name": "Someone",
                "email": "someone@else.edu",
                "password": "long enough",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = server
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "school_name": "Reserved",
                "subdomain": "admin",
                "name": "Someone",
                "email": "someone@reserved.edu",
                "password": "long enough",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "head@greenwood.edu", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = server
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "head@greenwood.edu", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let login_token = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(login_token, session.token);

    let (status, body) = server.get("/auth/me", &login_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "SCHOOL_ADMIN");
    assert_eq!(body["data"]["school"]["plan"], "FREE");
    assert_eq!(body["data"]["features"]["notices"], true);
    assert_eq!(body["data"]["features"]["custom_domain"], false);

    let (status, _) = server
        .call(Method::POST, "/auth/logout", Some(&login_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server.get("/auth/me", &login_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_content_order_and_partial_update() {
    let server = TestServer::start().await;
    let s = server.signup("ordering").await;

    let (status, first) = server
        .post("/notices", &s.token, json!({ "title": "Sports Day", "content": "Friday" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["data"]["order"], 1);

    let (_, second) = server
        .post("/notices", &s.token, json!({ "title": "Exams", "content": "Monday" }))
        .await;
    assert_eq!(second["data"]["order"], 2);

    let a = first["data"]["id"].as_str().unwrap().to_string();
    let b = second["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .put(&format!("/notices/{a}"), &s.token, json!({ "title": "Annual Sports Day" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["title"], "Annual Sports Day");
    assert_eq!(body["data"]["content"], "Friday");
    assert_eq!(body["data"]["order"], 1);

    let (status, body) = server
        .put(
            "/notices/reorder",
            &s.token,
            json!([{ "id": a, "order": 2 }, { "id": b, "order": 1 }]),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(ids(&body), vec![b.clone(), a.clone()]);

    let (status, _) = server
        .put(
            "/notices/reorder",
            &s.token,
            json!([{ "id": a, "order": 1 }, { "id": "missing", "order": 2 }]),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = server.get("/notices", &s.token).await;
    assert_eq!(ids(&body), vec![b, a]);
}

#[tokio::test]
async fn test_records_of_other_schools_are_not_found() {
    let server = TestServer::start().await;
    let owner = server.signup("owner-school").await;
    let other = server.signup("other-school").await;

    let (_, notice) = server
        .post("/notices", &owner.token, json!({ "title": "Private", "content": "x" }))
        .await;
    let id = notice["data"]["id"].as_str().unwrap();

    let (status, _) = server.get(&format!("/notices/{id}"), &other.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.delete(&format!("/notices/{id}"), &other.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get(&format!("/notices/{id}"), &owner.token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_editors_manage_content_but_not_users() {
    let server = TestServer::start().await;
    let s = server.signup("editors").await;

    let (status, body) = server
        .post(
            "/users",
            &s.token,
            json!({
                "name": "Editor",
                "email": "editor@editors.edu",
                "password": "editor password",
                "role": "EDITOR",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, body) = server
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "editor@editors.edu", "password": "editor password" })),
        )
        .await;
    let editor = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = server
        .post("/staff", &editor, json!({ "name": "R. Iyer", "designation": "Principal" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = server.get("/users", &editor).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = server.get("/admin/diagnostics", &s.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_feature_flags_follow_plan() {
    let server = TestServer::start().await;
    let s = server.signup("flags").await;

    let (status, body) = server
        .put("/domain", &s.token, json!({ "custom_domain": "flags.edu" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "Feature 'custom_domain' is not available on your plan"
    );

    server.set_plan(&s.school_id, "BASIC").await;
    let (_, body) = server.get("/features", &s.token).await;
    assert_eq!(body["data"]["custom_domain"], false);
    assert_eq!(body["data"]["admissions"], true);

    server.set_plan(&s.school_id, "PREMIUM").await;
    let (_, body) = server.get("/features", &s.token).await;
    assert_eq!(body["data"]["custom_domain"], true);

    let (status, body) = server
        .put(
            &format!("/admin/schools/{}/features/custom_domain", s.school_id),
            &server.admin_token,
            json!({ "is_enabled": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (_, body) = server.get("/features", &s.token).await;
    assert_eq!(body["data"]["custom_domain"], false);
    assert_eq!(body["data"]["whois_privacy"], true);
}

#[tokio::test]
async fn test_dns_record_validation_and_propagation() {
    let server = TestServer::start().await;
    let s = server.signup("dns-school").await;
    server.set_plan(&s.school_id, "PREMIUM").await;

    let (status, body) = server
        .post(
            "/dns",
            &s.token,
            json!({ "record_type": "A", "name": "@", "value": "999.1.1.1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = server
        .post(
            "/dns",
            &s.token,
            json!({ "record_type": "MX", "name": "@", "value": "mail.dns-school.edu" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = server
        .post(
            "/dns",
            &s.token,
            json!({ "record_type": "A", "name": "www", "value": "10.0.0.1" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["ttl"], 3600);
    assert_eq!(
        body["data"]["domain"],
        format!("dns-school.{HOST_SUFFIX}")
    );
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let mut propagated = false;
    for _ in 0..100 {
        let (_, body) = server.get(&format!("/dns/{id}"), &s.token).await;
        if !body["data"]["propagated_at"].is_null() {
            propagated = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(propagated, "record was never propagated");
}

#[tokio::test]
async fn test_custom_domain_verification() {
    let server = TestServer::start().await;
    let s = server.signup("verify-me").await;
    server.set_plan(&s.school_id, "STANDARD").await;

    let (status, body) = server
        .put("/domain", &s.token, json!({ "custom_domain": "VerifyMe.edu." }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["custom_domain"], "verifyme.edu");
    assert_eq!(body["data"]["domain_verified"], false);
    let record = body["data"]["verification_record"].clone();
    assert_eq!(record["name"], "_schoolhub-verify");

    let (status, _) = server
        .call(Method::POST, "/domain/verify", Some(&s.token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(
            "/dns",
            &s.token,
            json!({ "record_type": "TXT", "name": record["name"], "value": record["value"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server
        .call(Method::POST, "/domain/verify", Some(&s.token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["domain_verified"], true);

    publish(&server, &s.token).await;
    let (status, body) = server
        .call(Method::GET, "/public/sites/verifyme.edu", None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["school"]["subdomain"], "verify-me");

    let taken = server.signup("taken-domain").await;
    server.set_plan(&taken.school_id, "STANDARD").await;
    let (status, _) = server
        .put("/domain", &taken.token, json!({ "custom_domain": "verifyme.edu" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_billing_rejects_bad_signature_then_activates() {
    let server = TestServer::start().await;
    let s = server.signup("billing").await;

    let (status, _) = server
        .post("/billing/orders", &s.token, json!({ "plan": "FREE" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .post("/billing/orders", &s.token, json!({ "plan": "BASIC" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["amount"], 99_900);
    assert_eq!(body["data"]["currency"], "INR");
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();

    let (status, _) = server
        .post(
            "/billing/verify",
            &s.token,
            json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": "deadbeef",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = server.get("/billing/payments", &s.token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let (_, body) = server.get("/billing/subscription", &s.token).await;
    assert!(body["data"].is_null());

    let good = signature::sign(
        KEY_SECRET,
        signature::payment_message(&order_id, "pay_1").as_bytes(),
    );
    let verify = json!({
        "razorpay_order_id": order_id,
        "razorpay_payment_id": "pay_1",
        "razorpay_signature": good,
    });
    let (status, body) = server.post("/billing/verify", &s.token, verify.clone()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["plan"], "BASIC");
    let subscription_id = body["data"]["id"].clone();

    let (status, body) = server.post("/billing/verify", &s.token, verify).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], subscription_id);

    let (_, body) = server.get("/billing/payments", &s.token).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = server.get("/school", &s.token).await;
    assert_eq!(body["data"]["plan"], "BASIC");

    let other = server.signup("other-billing").await;
    let (status, _) = server
        .post(
            "/billing/verify",
            &other.token,
            json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": "x",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_billing_webhook_activates_order() {
    let server = TestServer::start().await;
    let s = server.signup("webhook").await;

    let (_, body) = server
        .post(
            "/billing/orders",
            &s.token,
            json!({ "plan": "PREMIUM", "cycle": "YEARLY" }),
        )
        .await;
    assert_eq!(body["data"]["amount"], 4_999_000);
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();

    let payload = json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": { "id": "pay_hook", "order_id": order_id } } },
    })
    .to_string();

    let response = server
        .client
        .post(server.url("/billing/webhook"))
        .header("X-Razorpay-Signature", "bad")
        .body(payload.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = server
        .client
        .post(server.url("/billing/webhook"))
        .header(
            "X-Razorpay-Signature",
            signature::sign(WEBHOOK_SECRET, payload.as_bytes()),
        )
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (_, body) = server.get("/features", &s.token).await;
    assert_eq!(body["data"]["domain_transfer"], true);
    let (_, body) = server.get("/billing/subscription", &s.token).await;
    assert_eq!(body["data"]["cycle"], "YEARLY");
}

#[tokio::test]
async fn test_transfer_workflow() {
    let server = TestServer::start_with(LifecycleConfig {
        transfer_step_delay_secs: 1,
        ..LifecycleConfig::immediate()
    })
    .await;
    let s = server.signup("transfers").await;
    server.set_plan(&s.school_id, "PREMIUM").await;

    let (status, body) = server
        .post(
            "/transfers",
            &s.token,
            json!({ "domain": "transfers.edu", "auth_code": "EPP-123" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/transfers/{id}");

    let (status, _) = server
        .put(&path, &s.token, json!({ "action": "approve" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    server
        .wait_for(&path, &s.token, "transfer_status", "AWAITING_APPROVAL")
        .await;

    let (status, body) = server
        .put(&path, &s.token, json!({ "action": "unlock" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["lock_status"], "UNLOCKED");

    let (status, body) = server
        .put(&path, &s.token, json!({ "action": "approve" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["transfer_status"], "COMPLETED");

    let (status, _) = server
        .put(&path, &s.token, json!({ "action": "approve" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = server
        .put(&path, &s.token, json!({ "action": "cancel" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = server.get(&format!("{path}/events"), &s.token).await;
    assert_eq!(status, StatusCode::OK);
    let statuses: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["to_status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses.first(), Some(&"PENDING"));
    assert_eq!(statuses.last(), Some(&"COMPLETED"));
    assert!(statuses.contains(&"AWAITING_APPROVAL"));

    let (status, _) = server
        .post("/transfers", &s.token, json!({ "domain": "transfers.edu" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_certificates_and_privacy() {
    let server = TestServer::start().await;
    let s = server.signup("secure").await;
    server.set_plan(&s.school_id, "PREMIUM").await;

    let host = format!("secure.{HOST_SUFFIX}");
    let (status, body) = server
        .post("/ssl", &s.token, json!({ "domain": host }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let cert = server
        .wait_for(&format!("/ssl/{id}"), &s.token, "status", "ACTIVE")
        .await;
    assert_eq!(cert["issuer"], "Let's Encrypt");
    assert!(cert["expires_at"].is_string());

    let (_, body) = server
        .post("/ssl", &s.token, json!({ "domain": "someone-else.edu" }))
        .await;
    let foreign = body["data"]["id"].as_str().unwrap().to_string();
    let cert = server
        .wait_for(&format!("/ssl/{foreign}"), &s.token, "status", "ERROR")
        .await;
    assert!(cert["error_message"].is_string());

    let (status, body) = server
        .call(Method::POST, &format!("/ssl/{id}/renew"), Some(&s.token), None)
        .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    server
        .wait_for(&format!("/ssl/{id}"), &s.token, "status", "ACTIVE")
        .await;

    let (status, body) = server
        .post("/privacy", &s.token, json!({ "domain": "secure.edu" }))
        .await;
    assert!(status.is_success(), "{body}");
    let pid = body["data"]["id"].as_str().unwrap().to_string();
    server
        .wait_for(&format!("/privacy/{pid}"), &s.token, "status", "ACTIVE")
        .await;

    let (status, body) = server.delete(&format!("/privacy/{pid}"), &s.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "DISABLED");
    assert_eq!(body["data"]["is_enabled"], false);
}

#[tokio::test]
async fn test_public_site_and_enquiry_export() {
    let server = TestServer::start().await;
    let s = server.signup("public-school").await;
    server.set_plan(&s.school_id, "BASIC").await;
    let site = format!("/public/sites/public-school.{HOST_SUFFIX}");

    let (status, _) = server.call(Method::GET, &site, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    server
        .post("/notices", &s.token, json!({ "title": "Visible", "content": "yes" }))
        .await;
    server
        .post(
            "/notices",
            &s.token,
            json!({ "title": "Hidden", "content": "no", "is_visible": false }),
        )
        .await;
    let (status, body) = server
        .post("/admissions", &s.token, json!({ "session": "2025-26", "is_open": true }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    publish(&server, &s.token).await;

    let (status, body) = server.call(Method::GET, &site, None, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let notices = body["data"]["notices"].as_array().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["title"], "Visible");
    assert_eq!(body["data"]["show_branding"], true);
    assert!(body["data"]["school"].get("verification_token").is_none());

    let (status, body) = server
        .call(
            Method::POST,
            &format!("/public/sites/{}/enquiries", s.subdomain),
            None,
            Some(json!({
                "student_name": "Asha \"Ash\" Rao",
                "parent_name": "Ravi Rao",
                "email": "ravi@example.com",
                "phone": "+91 98765 43210",
                "grade": "5",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let response = server
        .client
        .get(server.url("/admissions/enquiries/export"))
        .bearer_auth(&s.token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let csv = response.text().await.unwrap();
    assert!(csv.starts_with("\"id\",\"admission_id\""));
    assert!(csv.contains("\"Asha \"\"Ash\"\" Rao\""));
}

#[tokio::test]
async fn test_catalog_templates_and_premium_gate() {
    let server = TestServer::start().await;
    let s = server.signup("template-school").await;
    server.set_plan(&s.school_id, "BASIC").await;

    let (status, body) = server
        .post(
            "/templates",
            &s.token,
            json!({ "name": "Home made", "is_premium": true }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["is_premium"], false);
    let own = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .post(
            "/admin/templates",
            &server.admin_token,
            json!({ "name": "Aurora", "is_premium": true }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let premium = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = server.get("/templates", &s.token).await;
    assert_eq!(ids(&body), [premium.clone(), own.clone()]);

    let (status, _) = server
        .put(
            &format!("/templates/{premium}"),
            &s.token,
            json!({ "name": "Mine now" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let activate = format!("/templates/{premium}/activate");
    let (status, body) = server.post(&activate, &s.token, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = server
        .post(&format!("/templates/{own}/activate"), &s.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["active_template_id"], own.as_str());

    server.set_plan(&s.school_id, "PREMIUM").await;
    let (status, body) = server.post(&activate, &s.token, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["active_template_id"], premium.as_str());
    assert_eq!(body["data"]["plan"], "PREMIUM");
}

#[tokio::test]
async fn test_suspended_school_cannot_republish() {
    let server = TestServer::start().await;
    let s = server.signup("suspended-school").await;
    publish(&server, &s.token).await;

    let (status, body) = server
        .put(
            &format!("/admin/schools/{}", s.school_id),
            &server.admin_token,
            json!({ "status": "SUSPENDED" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = server
        .call(Method::POST, "/school/publish", Some(&s.token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = server
        .put("/school", &s.token, json!({ "tagline": "Still here" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "SUSPENDED");
    assert_eq!(body["data"]["tagline"], "Still here");
}
