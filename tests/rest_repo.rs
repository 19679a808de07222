use chrono::{NaiveDate, NaiveTime};
use crescent::models::*;
use crescent::repo::rest::RestRepo;
use crescent::repo::{RepoError, SightingRepo};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-anon-key";

fn record() -> NewSighting {
    NewSighting {
        date_of_sighting: NaiveDate::from_ymd_opt(2025, 3, 30).unwrap(),
        time_of_sighting: NaiveTime::from_hms_opt(19, 12, 40).unwrap(),
        name: "Yusuf".into(),
        email: String::new(),
        sighting_location: SightingLocation::GordonsBay.into(),
        weather_conditions: [WeatherCondition::Cloudy, WeatherCondition::RedHorizon].into_iter().collect(),
        crescent_sighted: CrescentSighted::Yes.into(),
        num_members: 3,
        num_non_members: 1,
        additional_info: "faint".into(),
        submit_date_time: "2025-03-30_19:20:01".parse().unwrap(),
    }
}

fn row_json(id: i64, submitted: &str) -> serde_json::Value {
    json!({
        "id": id,
        "created_at": "2025-03-30T17:20:01.52+00:00",
        "date_of_sighting": "2025-03-30",
        "time_of_sighting": "19:12:40",
        "name": "Yusuf",
        "email": "",
        "sighting_location": "Gordons Bay",
        "weather_conditions": "Cloudy, Red Horizon",
        "crescent_sighted": "Yes",
        "num_members": 3,
        "num_non_members": 1,
        "additional_info": "faint",
        "submit_date_time": submitted
    })
}

#[tokio::test]
async fn insert_posts_record_and_returns_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/sightings"))
        .and(header("apikey", KEY))
        .and(header("authorization", format!("Bearer {KEY}").as_str()))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "weather_conditions": "Cloudy, Red Horizon",
            "submit_date_time": "2025-03-30_19:20:01",
            "time_of_sighting": "19:12:40"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row_json(41, "2025-03-30_19:20:01")])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = RestRepo::new(format!("{}/", server.uri()), KEY, "sightings");
    let rows = repo.insert(record()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, Some(41));
    assert_eq!(rows[0].record, record());
}

#[tokio::test]
async fn insert_with_empty_acknowledgment_returns_no_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/sightings"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let repo = RestRepo::new(server.uri(), KEY, "sightings");
    assert!(repo.insert(record()).await.unwrap().is_empty());
}

#[tokio::test]
async fn recent_query_orders_and_limits_on_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/sightings"))
        .and(query_param("select", "*"))
        .and(query_param("order", "submit_date_time.desc"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row_json(2, "2025-03-31_19:00:00"),
            row_json(1, "2025-03-30_19:20:01"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = RestRepo::new(server.uri(), KEY, "sightings");
    let rows = repo.select_recent(SortOrder::newest_first(), 10).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, [Some(2), Some(1)]);
}

#[tokio::test]
async fn select_all_reads_whole_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/moon_sightings"))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row_json(1, "2025-03-30_19:20:01")])))
        .mount(&server)
        .await;

    let repo = RestRepo::new(server.uri(), KEY, "moon_sightings");
    assert_eq!(repo.select_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn store_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/sightings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid API key",
            "hint": "Double check your Supabase `anon` or `service_role` API key."
        })))
        .mount(&server)
        .await;

    let repo = RestRepo::new(server.uri(), "wrong", "sightings");
    let err = repo.select_all().await.unwrap_err();
    assert_eq!(err, RepoError::Remote { status: 401, message: "Invalid API key".into() });
    assert_eq!(err.to_string(), "Invalid API key");
}

#[tokio::test]
async fn non_json_error_body_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let repo = RestRepo::new(server.uri(), KEY, "sightings");
    let err = repo.select_recent(SortOrder::newest_first(), 10).await.unwrap_err();
    assert_eq!(err.to_string(), "upstream unavailable");
}

#[tokio::test]
async fn malformed_rows_are_decode_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "date_of_sighting": "yesterday" }])))
        .mount(&server)
        .await;

    let repo = RestRepo::new(server.uri(), KEY, "sightings");
    assert!(matches!(repo.select_all().await, Err(RepoError::Decode(_))));
}

#[tokio::test]
async fn unreachable_store_is_a_transport_error() {
    // nothing listens on port 1 locally
    let repo = RestRepo::new("http://127.0.0.1:1", KEY, "sightings");
    assert!(matches!(repo.select_all().await, Err(RepoError::Transport(_))));
}

#[tokio::test]
async fn older_rows_with_unlisted_values_still_load() {
    let server = MockServer::start().await;
    let mut blank = row_json(2, "2024-04-09_19:01:00");
    blank["sighting_location"] = json!("");
    blank["weather_conditions"] = json!("partly cloudy, Hazy");
    blank["crescent_sighted"] = json!(null);
    blank["num_members"] = json!(null);
    Mock::given(method("GET"))
        .and(path("/rest/v1/sightings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row_json(1, "2025-03-30_19:20:01"), blank])))
        .mount(&server)
        .await;

    let repo = RestRepo::new(server.uri(), KEY, "sightings");
    let rows = repo.select_all().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].record, record());

    let old = &rows[1].record;
    assert_eq!(old.sighting_location, Recorded::<SightingLocation>::Unlisted(String::new()));
    assert!(old.weather_conditions.contains(WeatherCondition::Hazy));
    assert_eq!(old.weather_conditions.to_string(), "Hazy, partly cloudy");
    assert_eq!(old.crescent_sighted.to_string(), "");
    assert_eq!(old.num_members, 0);
}
