//! Issue API end-to-end tests
//!
//! Each test starts its own server on an ephemeral port backed by a fresh
//! in-memory store, so tests are independent and can run in parallel.

use reqwest::StatusCode;
use rstest::*;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use issue_tracker::build_server;
use issue_tracker::http::ShutdownCoordinator;
use issue_tracker::nosql::backends::InMemoryBackend;
use issue_tracker::service::{IssueService, IssueServiceOptions};

const PROJECT: &str = "apitest";

// ============================================================================
// Fixtures
// ============================================================================

/// A running server; shut down when dropped
struct TestServer {
	url: String,
	client: reqwest::Client,
	coordinator: ShutdownCoordinator,
}

impl TestServer {
	async fn start(options: IssueServiceOptions) -> Self {
		let service = IssueService::new(Arc::new(InMemoryBackend::new()), options);
		service.ensure_indexes().await.expect("Failed to create indexes");

		let listener = TcpListener::bind("127.0.0.1:0")
			.await
			.expect("Failed to bind test listener");
		let addr = listener.local_addr().expect("Listener has no address");
		let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));

		tokio::spawn(build_server(service).listen_with_shutdown(listener, coordinator.clone()));

		Self {
			url: format!("http://{}", addr),
			client: reqwest::Client::new(),
			coordinator,
		}
	}

	fn issues_url(&self, project: &str) -> String {
		format!("{}/api/issues/{}", self.url, project)
	}

	async fn send(&self, request: reqwest::RequestBuilder) -> Value {
		let response = request.send().await.expect("Failed to send request");
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			response.headers()["content-type"],
			"application/json",
			"every response is JSON"
		);
		response.json().await.expect("Failed to parse JSON response")
	}

	async fn create(&self, body: Value) -> Value {
		self.send(self.client.post(self.issues_url(PROJECT)).json(&body))
			.await
	}

	async fn list(&self, query: &[(&str, &str)]) -> Value {
		self.send(self.client.get(self.issues_url(PROJECT)).query(query))
			.await
	}

	async fn update(&self, body: Value) -> Value {
		self.send(self.client.put(self.issues_url(PROJECT)).json(&body))
			.await
	}

	async fn delete(&self, body: Value) -> Value {
		self.send(self.client.delete(self.issues_url(PROJECT)).json(&body))
			.await
	}
}

impl Drop for TestServer {
	fn drop(&mut self) {
		self.coordinator.shutdown();
	}
}

#[fixture]
async fn server() -> TestServer {
	TestServer::start(IssueServiceOptions::default()).await
}

fn every_field() -> Value {
	json!({
		"issue_title": "Title",
		"issue_text": "text",
		"created_by": "Functional Test - Every field filled in",
		"assigned_to": "Chai and Mocha",
		"status_text": "In QA",
	})
}

fn required_only(title: &str, text: &str) -> Value {
	json!({
		"issue_title": title,
		"issue_text": text,
		"created_by": "Functional Test - Required fields filled in",
	})
}

const ISSUE_KEYS: [&str; 9] = [
	"_id",
	"issue_title",
	"issue_text",
	"created_on",
	"updated_on",
	"created_by",
	"assigned_to",
	"open",
	"status_text",
];

fn assert_issue_shape(issue: &Value) {
	let object = issue.as_object().expect("issue is an object");
	let keys: Vec<&str> = object.keys().map(String::as_str).collect();
	let mut expected = ISSUE_KEYS.to_vec();
	expected.sort_unstable();
	let mut actual = keys.clone();
	actual.sort_unstable();
	assert_eq!(actual, expected);
}

// ============================================================================
// POST
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_create_issue_with_every_field(#[future] server: TestServer) {
	let server = server.await;

	let issue = server.create(every_field()).await;

	assert_issue_shape(&issue);
	assert_eq!(issue["issue_title"], "Title");
	assert_eq!(issue["issue_text"], "text");
	assert_eq!(issue["created_by"], "Functional Test - Every field filled in");
	assert_eq!(issue["assigned_to"], "Chai and Mocha");
	assert_eq!(issue["status_text"], "In QA");
	assert_eq!(issue["open"], true);
	assert_eq!(issue["_id"].as_str().unwrap().len(), 24);
	assert!(issue["created_on"].as_str().unwrap().ends_with('Z'));
	assert_eq!(issue["created_on"], issue["updated_on"]);
}

#[rstest]
#[tokio::test]
async fn test_create_issue_with_required_fields(#[future] server: TestServer) {
	let server = server.await;

	let issue = server.create(required_only("Title", "text")).await;

	assert_issue_shape(&issue);
	assert_eq!(issue["assigned_to"], "");
	assert_eq!(issue["status_text"], "");
	assert_eq!(issue["open"], true);
}

#[rstest]
#[tokio::test]
async fn test_create_issue_with_form_encoding(#[future] server: TestServer) {
	let server = server.await;

	let issue = server
		.send(server.client.post(server.issues_url(PROJECT)).form(&[
			("issue_title", "Form title"),
			("issue_text", "sent as a form"),
			("created_by", "Browser"),
		]))
		.await;

	assert_eq!(issue["issue_title"], "Form title");
	assert_eq!(issue["open"], true);
}

#[rstest]
#[tokio::test]
async fn test_create_issue_with_missing_required_fields(#[future] server: TestServer) {
	let server = server.await;

	let response = server
		.create(json!({ "issue_title": "Title", "created_by": "Functional Test" }))
		.await;
	assert_eq!(response, json!({ "error": "required field(s) missing" }));

	let listed = server.list(&[]).await;
	assert_eq!(listed, json!({ "error": "project not found", "project": PROJECT }));
}

#[rstest]
#[case(json!(false))]
#[case(json!(0))]
#[tokio::test]
async fn test_create_issue_with_falsy_required_field(
	#[future] server: TestServer,
	#[case] title: Value,
) {
	let server = server.await;

	let response = server
		.create(json!({
			"issue_title": title,
			"issue_text": "text",
			"created_by": "Functional Test",
		}))
		.await;
	assert_eq!(response, json!({ "error": "required field(s) missing" }));

	let listed = server.list(&[]).await;
	assert_eq!(listed, json!({ "error": "project not found", "project": PROJECT }));
}

// ============================================================================
// GET
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_list_all_issues(#[future] server: TestServer) {
	let server = server.await;
	server.create(every_field()).await;
	server.create(required_only("Second", "text")).await;

	let listed = server.list(&[]).await;
	let issues = listed.as_array().unwrap();

	assert_eq!(issues.len(), 2);
	for issue in issues {
		assert_issue_shape(issue);
	}
}

#[rstest]
#[tokio::test]
async fn test_list_with_one_filter(#[future] server: TestServer) {
	let server = server.await;
	server.create(required_only("Chai Test", "Testing with Chai")).await;
	server.create(required_only("chai lowercase", "Other text")).await;
	server.create(required_only("Mocha", "Testing")).await;

	let listed = server.list(&[("issue_title", "Chai")]).await;
	let titles: Vec<&str> = listed
		.as_array()
		.unwrap()
		.iter()
		.map(|issue| issue["issue_title"].as_str().unwrap())
		.collect();

	assert_eq!(titles, vec!["Chai Test", "chai lowercase"]);
}

#[rstest]
#[tokio::test]
async fn test_list_with_multiple_filters(#[future] server: TestServer) {
	let server = server.await;
	server.create(required_only("Chai Test", "Testing with Chai")).await;
	server.create(required_only("chai lowercase", "Other text")).await;
	server.create(required_only("Mocha", "Testing")).await;

	let listed = server
		.list(&[("issue_title", "Chai"), ("issue_text", "Testing")])
		.await;
	let issues = listed.as_array().unwrap();

	assert_eq!(issues.len(), 1);
	assert_eq!(issues[0]["issue_title"], "Chai Test");
}

#[rstest]
#[tokio::test]
async fn test_list_ignores_unknown_filters(#[future] server: TestServer) {
	let server = server.await;
	server.create(every_field()).await;

	let listed = server.list(&[("priority", "high"), ("created_on", "1999")]).await;
	assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_list_by_open_flag(#[future] server: TestServer) {
	let server = server.await;
	let first = server.create(required_only("First", "text")).await;
	server.create(required_only("Second", "text")).await;
	server
		.update(json!({ "_id": first["_id"], "open": false }))
		.await;

	let closed = server.list(&[("open", "false")]).await;
	let closed = closed.as_array().unwrap();
	assert_eq!(closed.len(), 1);
	assert_eq!(closed[0]["_id"], first["_id"]);
}

// ============================================================================
// PUT
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_update_one_field(#[future] server: TestServer) {
	let server = server.await;
	let issue = server.create(every_field()).await;
	tokio::time::sleep(Duration::from_millis(10)).await;

	let response = server
		.update(json!({ "_id": issue["_id"], "issue_text": "Updated text" }))
		.await;
	assert_eq!(
		response,
		json!({ "result": "successfully updated", "_id": issue["_id"] })
	);

	let listed = server.list(&[("_id", issue["_id"].as_str().unwrap())]).await;
	let updated = &listed[0];
	assert_eq!(updated["issue_text"], "Updated text");
	assert_eq!(updated["issue_title"], "Title");
	assert_eq!(updated["created_on"], issue["created_on"]);
	assert_ne!(updated["updated_on"], issue["updated_on"]);
}

#[rstest]
#[tokio::test]
async fn test_update_multiple_fields_reopens(#[future] server: TestServer) {
	let server = server.await;
	let issue = server.create(every_field()).await;
	let id = issue["_id"].as_str().unwrap();

	server.update(json!({ "_id": id, "open": "false" })).await;
	assert_eq!(server.list(&[("_id", id)]).await[0]["open"], false);

	let response = server
		.update(json!({
			"_id": id,
			"issue_title": "New title",
			"status_text": "  Resolved  ",
		}))
		.await;
	assert_eq!(response["result"], "successfully updated");

	let updated = &server.list(&[("_id", id)]).await[0];
	assert_eq!(updated["issue_title"], "New title");
	assert_eq!(updated["status_text"], "Resolved");
	assert_eq!(updated["open"], true);
}

#[rstest]
#[tokio::test]
async fn test_update_keeps_open_when_reopen_disabled() {
	let server = TestServer::start(IssueServiceOptions {
		reopen_on_update: false,
	})
	.await;
	let issue = server.create(every_field()).await;
	let id = issue["_id"].as_str().unwrap();

	server.update(json!({ "_id": id, "open": false })).await;
	server.update(json!({ "_id": id, "status_text": "Parked" })).await;

	let updated = &server.list(&[("_id", id)]).await[0];
	assert_eq!(updated["open"], false);
	assert_eq!(updated["status_text"], "Parked");
}

#[rstest]
#[tokio::test]
async fn test_update_with_missing_id(#[future] server: TestServer) {
	let server = server.await;

	let response = server.update(json!({ "issue_text": "orphan" })).await;
	assert_eq!(response, json!({ "error": "missing _id" }));
}

#[rstest]
#[tokio::test]
async fn test_update_with_no_fields(#[future] server: TestServer) {
	let server = server.await;
	let issue = server.create(every_field()).await;

	let response = server.update(json!({ "_id": issue["_id"] })).await;
	assert_eq!(
		response,
		json!({ "error": "no update field(s) sent", "_id": issue["_id"] })
	);

	let response = server
		.update(json!({ "_id": issue["_id"], "issue_title": "", "status_text": "" }))
		.await;
	assert_eq!(response["error"], "no update field(s) sent");
}

#[rstest]
#[tokio::test]
async fn test_update_with_only_unknown_field(#[future] server: TestServer) {
	let server = server.await;
	let issue = server.create(every_field()).await;

	let response = server
		.update(json!({ "_id": issue["_id"], "priority": "high" }))
		.await;
	assert_eq!(
		response,
		json!({ "result": "successfully updated", "_id": issue["_id"] })
	);

	let listed = server.list(&[("_id", issue["_id"].as_str().unwrap())]).await;
	assert_eq!(listed[0]["issue_title"], "Title");
	assert!(listed[0].get("priority").is_none());
}

#[rstest]
#[case("5f665eb46e296f6b9b6a504d")]
#[case("invalid_id")]
#[tokio::test]
async fn test_update_with_unknown_id(#[future] server: TestServer, #[case] id: &str) {
	let server = server.await;
	server.create(every_field()).await;

	let response = server
		.update(json!({ "_id": id, "issue_text": "New Issue Text" }))
		.await;
	assert_eq!(response, json!({ "error": "could not update", "_id": id }));
}

#[rstest]
#[tokio::test]
async fn test_update_issue_from_another_project(#[future] server: TestServer) {
	let server = server.await;
	let foreign = server
		.send(
			server
				.client
				.post(server.issues_url("other-project"))
				.json(&every_field()),
		)
		.await;

	let response = server
		.update(json!({ "_id": foreign["_id"], "issue_text": "hijack" }))
		.await;
	assert_eq!(response["error"], "could not update");
}

// ============================================================================
// DELETE
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_delete_issue(#[future] server: TestServer) {
	let server = server.await;
	let issue = server.create(every_field()).await;
	let id = issue["_id"].as_str().unwrap();

	let response = server.delete(json!({ "_id": id })).await;
	assert_eq!(response, json!({ "result": "successfully deleted", "_id": id }));

	let listed = server.list(&[("_id", id)]).await;
	assert_eq!(listed, json!([]));
}

#[rstest]
#[tokio::test]
async fn test_delete_twice(#[future] server: TestServer) {
	let server = server.await;
	let issue = server.create(every_field()).await;
	let id = issue["_id"].as_str().unwrap();

	server.delete(json!({ "_id": id })).await;
	let response = server.delete(json!({ "_id": id })).await;

	assert_eq!(response, json!({ "error": "could not delete", "_id": id }));
}

#[rstest]
#[tokio::test]
async fn test_delete_with_unknown_id(#[future] server: TestServer) {
	let server = server.await;
	server.create(every_field()).await;

	let response = server
		.delete(json!({ "_id": "5f665eb46e296f6b9b6a504d" }))
		.await;
	assert_eq!(
		response,
		json!({ "error": "could not delete", "_id": "5f665eb46e296f6b9b6a504d" })
	);
}

#[rstest]
#[tokio::test]
async fn test_delete_with_missing_id(#[future] server: TestServer) {
	let server = server.await;

	let response = server.delete(json!({})).await;
	assert_eq!(response, json!({ "error": "missing _id" }));
}

// ============================================================================
// Transport
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_health(#[future] server: TestServer) {
	let server = server.await;

	let response = server
		.send(server.client.get(format!("{}/health", server.url)))
		.await;
	assert_eq!(response, json!({ "status": "ok" }));
}

#[rstest]
#[tokio::test]
async fn test_unknown_route(#[future] server: TestServer) {
	let server = server.await;

	let response = server
		.client
		.get(format!("{}/api/projects", server.url))
		.send()
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	let body: Value = response.json().await.unwrap();
	assert_eq!(body, json!({ "error": "not found" }));
}

#[rstest]
#[tokio::test]
async fn test_undecodable_query(#[future] server: TestServer) {
	let server = server.await;
	server.create(every_field()).await;

	let response = server
		.client
		.get(format!("{}?issue_title=%FF", server.issues_url(PROJECT)))
		.send()
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	let body: Value = response.json().await.unwrap();
	assert_eq!(body, json!({ "error": "invalid query" }));
}

#[rstest]
#[tokio::test]
async fn test_malformed_json_body(#[future] server: TestServer) {
	let server = server.await;

	let response = server
		.client
		.post(server.issues_url(PROJECT))
		.header("content-type", "application/json")
		.body("{\"issue_title\": ")
		.send()
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	let body: Value = response.json().await.unwrap();
	assert_eq!(body, json!({ "error": "invalid request body" }));
}

#[rstest]
#[tokio::test]
async fn test_project_name_is_percent_decoded(#[future] server: TestServer) {
	let server = server.await;
	server
		.send(
			server
				.client
				.post(server.issues_url("my%20project"))
				.json(&every_field()),
		)
		.await;

	let listed = server
		.send(server.client.get(server.issues_url("my%20project")))
		.await;
	assert_eq!(listed.as_array().unwrap().len(), 1);

	let elsewhere = server.list(&[]).await;
	assert_eq!(elsewhere["error"], "project not found");
}
