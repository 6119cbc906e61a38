//! Source adapters against mocked upstream APIs.

mod support;

use chrono::Duration;
use serde_json::json;
use support::{airtable_config, google_config, http, notion_config, week_range};
use wiremock::matchers::{
    bearer_token, body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workdash_core::plugins::normalize::parse_timestamp;
use workdash_core::Plugin;
use workdash_domain::{PluginErrorCode, TaskStatus};
use workdash_infra::{AirtablePlugin, GoogleCalendarPlugin, NotionPlugin};

fn airtable(server: &MockServer) -> AirtablePlugin {
    AirtablePlugin::new(http()).unwrap().with_base_url(&server.uri()).unwrap()
}

fn notion(server: &MockServer) -> NotionPlugin {
    NotionPlugin::new(http()).unwrap().with_base_url(&server.uri()).unwrap()
}

fn google(server: &MockServer) -> GoogleCalendarPlugin {
    GoogleCalendarPlugin::new(http()).unwrap().with_base_url(&server.uri()).unwrap()
}

#[tokio::test]
async fn airtable_schedule_follows_offsets_and_applies_field_policy() {
    let server = MockServer::start().await;
    let formula = "AND({Worker} = 'w-42', NOT(IS_BEFORE({Date}, '2024-01-01')), \
                   NOT(IS_AFTER({Date}, '2024-01-08')))";

    Mock::given(method("GET"))
        .and(path("/v0/app123/Schedule"))
        .and(bearer_token("key-1"))
        .and(query_param("filterByFormula", formula))
        .and(query_param_is_missing("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{
                "id": "rec1",
                "createdTime": "2023-12-20T08:00:00.000Z",
                "fields": {"Title": "Shift", "Date": "2024-01-01", "Time": "09:00"}
            }],
            "offset": "itr1/rec1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v0/app123/Schedule"))
        .and(query_param("offset", "itr1/rec1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                {"id": "rec2", "fields": {"Title": "Undated"}},
                {"id": "rec3", "fields": {"Date": "2024-01-03"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = airtable_config(Some("key-1"), Some("app123"));
    let response = airtable(&server).get_schedule("w-42", &week_range(), &config).await;

    assert!(response.success, "unexpected errors: {:?}", response.errors);
    let ids: Vec<_> = response.data.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["rec1", "rec3"]);

    let shift = &response.data[0];
    assert_eq!(shift.title, "Shift");
    assert_eq!(shift.start_time, parse_timestamp("2024-01-01T09:00:00Z").unwrap());
    assert_eq!(shift.end_time, shift.start_time + Duration::hours(1));
    assert_eq!(response.data[1].title, "Untitled Schedule");
    assert_eq!(response.metadata.source, "airtable");
}

#[tokio::test]
async fn airtable_error_status_becomes_plugin_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/app123/Tasks"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let config = airtable_config(Some("bad-key"), Some("app123"));
    let response = airtable(&server).get_tasks("w-42", &config).await;

    assert!(!response.success);
    assert!(response.data.is_empty());
    let error = response.first_error().unwrap();
    assert_eq!(error.code, PluginErrorCode::PluginError);
    assert!(error.retryable);
    assert_eq!(error.message, "Airtable API error: Unauthorized");
}

#[tokio::test]
async fn airtable_missing_credentials_never_reach_the_network() {
    let server = MockServer::start().await;

    let config = airtable_config(None, Some("app"));
    let response = airtable(&server).get_schedule("w-42", &week_range(), &config).await;

    assert_eq!(
        response.first_error().map(|error| error.message.as_str()),
        Some("Airtable API key and base ID are required")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn airtable_validation_probes_one_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/app123/Schedule"))
        .and(query_param("maxRecords", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(1)
        .mount(&server)
        .await;

    let plugin = airtable(&server);
    let result = plugin.validate(&airtable_config(Some("key"), Some("app123"))).await.unwrap();
    assert!(result.valid, "{:?}", result.errors);

    let missing = plugin.validate(&airtable_config(None, None)).await.unwrap();
    assert_eq!(missing.errors, vec!["API key is required", "Base ID is required"]);
}

#[tokio::test]
async fn notion_missing_schedule_database_sends_nothing() {
    let server = MockServer::start().await;

    let config = notion_config(Some("secret"), None);
    let response = notion(&server).get_schedule("w-1", &week_range(), &config).await;

    assert!(!response.success);
    assert_eq!(
        response.first_error().map(|error| error.message.as_str()),
        Some("Notion integration secret and database ID are required")
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn notion_query_posts_filter_and_follows_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/databases/sched-db/query"))
        .and(bearer_token("secret"))
        .and(header("Notion-Version", "2022-06-28"))
        .and(body_partial_json(json!({
            "page_size": 100,
            "filter": {"and": [
                {"property": "Worker", "rich_text": {"equals": "w-1"}},
                {"property": "Date", "date": {"on_or_after": "2024-01-01T00:00:00Z"}},
                {"property": "Date", "date": {"on_or_before": "2024-01-08T00:00:00Z"}}
            ]}
        })))
        .and(body_partial_json(json!({"start_cursor": "cursor-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": "page-2",
                "properties": {
                    "Date": {"type": "date", "date": {"start": "2024-01-02T13:00:00.000Z"}}
                }
            }],
            "has_more": false,
            "next_cursor": null
        })))
        .expect(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/databases/sched-db/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": "page-1",
                "url": "https://www.notion.so/page-1",
                "properties": {
                    "Name": {"type": "title", "title": [{"plain_text": "Inventory"}]},
                    "Date": {"type": "date", "date": {
                        "start": "2024-01-02T09:00:00.000Z",
                        "end": "2024-01-02T12:00:00.000Z"
                    }}
                }
            }],
            "has_more": true,
            "next_cursor": "cursor-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = notion_config(Some("secret"), Some("sched-db"));
    let response = notion(&server).get_schedule("w-1", &week_range(), &config).await;

    assert!(response.success, "unexpected errors: {:?}", response.errors);
    let titles: Vec<_> = response.data.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["Inventory", "Untitled Schedule"]);
    assert_eq!(
        response.data[1].end_time,
        parse_timestamp("2024-01-02T14:00:00Z").unwrap()
    );
}

#[tokio::test]
async fn google_events_page_through_with_api_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calendars/team@example.com/events"))
        .and(query_param("key", "api-key"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .and(query_param("timeMin", "2024-01-01T00:00:00Z"))
        .and(query_param("timeMax", "2024-01-08T00:00:00Z"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "evt1",
                "summary": "Standup",
                "start": {"dateTime": "2024-01-02T09:00:00Z"},
                "end": {"dateTime": "2024-01-02T09:15:00Z"}
            }],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/team@example.com/events"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "evt2", "start": {"date": "2024-01-03"}, "end": {"date": "2024-01-04"}},
                {"id": "evt3", "summary": "No end", "start": {"dateTime": "2024-01-05T09:00:00Z"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = google_config("api-key", "team@example.com");
    let response = google(&server).get_schedule("w-1", &week_range(), &config).await;

    assert!(response.success, "unexpected errors: {:?}", response.errors);
    let ids: Vec<_> = response.data.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["evt1", "evt2"]);
    assert_eq!(response.data[1].title, "Untitled Event");
    assert_eq!(response.data[1].metadata["allDay"], true);
}

#[tokio::test]
async fn google_tasks_are_marked_events() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "a", "summary": "TODO: renew badge", "status": "confirmed",
                 "start": {"dateTime": "2030-01-02T09:00:00Z"}, "end": {"dateTime": "2030-01-02T10:00:00Z"}},
                {"id": "b", "summary": "Lunch"},
                {"id": "c", "summary": "Task review", "status": "cancelled"}
            ]
        })))
        .mount(&server)
        .await;

    let response = google(&server).get_tasks("w-1", &google_config("k", "primary")).await;

    assert!(response.success, "unexpected errors: {:?}", response.errors);
    let titles: Vec<_> = response.data.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["renew badge", "Task review"]);
    assert_eq!(response.data[1].status, TaskStatus::Cancelled);
    assert!(response.data[1].due_date.is_none());
}

#[tokio::test]
async fn google_probe_failure_is_reported_as_connectivity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendars/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = google(&server).validate(&google_config("k", "missing")).await.unwrap();
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec!["Failed to connect to Google Calendar: Google Calendar API error: Not Found"]
    );
}
