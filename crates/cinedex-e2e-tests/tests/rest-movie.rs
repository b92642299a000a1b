use cinedex_e2e_tests::{
    create_movie, extend_url, movie_payload, prepare_env, prepare_env_with_args, spawn_server,
};
use serde_json::{Value, json};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_movie_crud() {
    let (args, mut config_guard) = prepare_env("test_movie_crud").await.unwrap();
    let base_url = spawn_server(args, &mut config_guard).await.unwrap();
    let client = reqwest::Client::new();

    let payload = movie_payload("Casablanca", 1942, 102, &["drama", "romance", "war"]);
    let response = client
        .post(extend_url(&base_url, "v1/movies"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let location = response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body: Value = response.json().await.unwrap();
    let movie = &body["movie"];
    let id = movie["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(location, format!("/v1/movies/{id}"));
    assert_eq!(movie["title"], "Casablanca");
    assert_eq!(movie["runtime"], "102 mins");
    assert_eq!(movie["version"], 1);
    assert!(movie.get("createdAt").is_none());
    assert!(movie.get("created_at").is_none());

    let url = extend_url(&base_url, &location);
    let response = client.get(url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["movie"], *movie);

    let response = client
        .put(url.clone())
        .json(&json!({"title": "Casablanca (Remastered)", "genres": ["drama"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    info!("Updated movie: {body}");
    assert_eq!(body["movie"]["title"], "Casablanca (Remastered)");
    assert_eq!(body["movie"]["genres"], json!(["drama"]));
    assert_eq!(body["movie"]["year"], 1942);
    assert_eq!(body["movie"]["version"], 2);

    let response = client.delete(url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert!(response.bytes().await.unwrap().is_empty());

    let response = client.get(url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let response = client.delete(url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_edit_conflict() {
    let (args, mut config_guard) = prepare_env("test_edit_conflict").await.unwrap();
    let base_url = spawn_server(args, &mut config_guard).await.unwrap();
    let client = reqwest::Client::new();

    let payload = movie_payload("Black Panther", 2018, 134, &["action", "adventure"]);
    let movie = create_movie(&client, &base_url, &payload).await.unwrap();
    let url = extend_url(&base_url, format!("v1/movies/{}", movie["id"]));

    let response = client
        .patch(url.clone())
        .header("X-Expected-Version", "1")
        .json(&json!({"year": 2019}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // second client still holds version 1
    let response = client
        .patch(url.clone())
        .header("X-Expected-Version", "1")
        .json(&json!({"runtime": "135 mins"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "unable to update the record due to an edit conflict, please try again"
    );

    let response = client
        .patch(url.clone())
        .header("X-Expected-Version", "one")
        .json(&json!({"runtime": "135 mins"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let body: Value = client.get(url).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["movie"]["year"], 2019);
    assert_eq!(body["movie"]["runtime"], "134 mins");
    assert_eq!(body["movie"]["version"], 2);
}

#[tokio::test]
#[traced_test]
async fn test_invalid_ids() {
    let (args, mut config_guard) = prepare_env("test_invalid_ids").await.unwrap();
    let base_url = spawn_server(args, &mut config_guard).await.unwrap();
    let client = reqwest::Client::new();

    for id in ["abc", "0", "-5", "1.5", "999"] {
        let url = extend_url(&base_url, format!("v1/movies/{id}"));
        let response = client.get(url.clone()).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404, "GET {id}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "the requested resource could not be found");

        let response = client.delete(url).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404, "DELETE {id}");
    }
}

#[tokio::test]
#[traced_test]
async fn test_validation_failures() {
    let (args, mut config_guard) = prepare_env("test_validation").await.unwrap();
    let base_url = spawn_server(args, &mut config_guard).await.unwrap();
    let client = reqwest::Client::new();
    let url = extend_url(&base_url, "v1/movies");

    let response = client.post(url.clone()).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": {
            "title": "must be provided",
            "year": "must be provided",
            "runtime": "must be provided",
            "genres": "must be provided",
        }})
    );

    let payload = json!({
        "title": "x".repeat(501),
        "year": 1500,
        "runtime": "-1 mins",
        "genres": ["drama", "drama"],
    });
    let response = client.post(url.clone()).json(&payload).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["title"], "must not be more than 500 bytes long");
    assert_eq!(body["error"]["year"], "must be greater than 1888");
    assert_eq!(body["error"]["runtime"], "must be a positive integer");
    assert_eq!(body["error"]["genres"], "must not contain duplicate values");

    let payload = movie_payload("Too Many", 2000, 90, &["a", "b", "c", "d", "e", "f"]);
    let response = client.post(url.clone()).json(&payload).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["genres"], "must not contain more than 5 genres");

    let movie = create_movie(
        &client,
        &base_url,
        &movie_payload("Heat", 1995, 170, &["crime"]),
    )
    .await
    .unwrap();
    let movie_url = extend_url(&base_url, format!("v1/movies/{}", movie["id"]));
    let response = client
        .patch(movie_url.clone())
        .json(&json!({"genres": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["genres"], "must contain at least 1 genre");

    let body: Value = client
        .get(movie_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["movie"]["genres"], json!(["crime"]));
    assert_eq!(body["movie"]["version"], 1);
}

#[tokio::test]
#[traced_test]
async fn test_bad_bodies() {
    let (args, mut config_guard) =
        prepare_env_with_args("test_bad_bodies", &["--max-body-size", "1024"])
            .await
            .unwrap();
    let base_url = spawn_server(args, &mut config_guard).await.unwrap();
    let client = reqwest::Client::new();
    let url = extend_url(&base_url, "v1/movies");

    let cases = [
        ("", "body must not be empty"),
        (r#"{"title": "Moana""#, "body contains badly-formed JSON"),
        (
            r#"<?xml version="1.0" encoding="UTF-8"?><note><to>Alex</to></note>"#,
            "body contains badly-formed JSON (at character 1)",
        ),
        (
            r#"{"title": 123}"#,
            r#"body contains incorrect JSON type for field "title""#,
        ),
        (
            r#"{"title": "Moana", "rating": "PG"}"#,
            r#"body contains unknown key "rating""#,
        ),
        (
            r#"{"title": "Moana"}{"title": "Top Gun"}"#,
            "body must contain a single JSON value",
        ),
        (r#"{"runtime": "107 minutes"}"#, "invalid runtime format"),
        (
            r#"["Moana", 2016, "107 mins", ["animation"]]"#,
            "body contains incorrect JSON type (at character 1)",
        ),
    ];

    for (body, message) in cases {
        let response = client
            .post(url.clone())
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "body {body}");
        let json: Value = response.json().await.unwrap();
        assert_eq!(json["error"], message, "body {body}");
    }

    let title = "x".repeat(2000);
    let response = client
        .post(url)
        .json(&json!({ "title": title }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 413);
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["error"], "body must not be larger than 1024 bytes");
}
