use bytes::Bytes;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campus_feed::config::RemoteConfig;
use campus_feed::models::{Category, NewComment, NewPost, PostId};
use campus_feed::remote::{Bucket, RemoteError, RemoteStore, RestStore};

fn store_for(server: &MockServer) -> RestStore {
    RestStore::new(&RemoteConfig {
        url: server.uri(),
        anon_key: "test-key".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn query_posts_requests_nested_select_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("select", "*,comments(*),likes(*),post_images(*)"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "test-key"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 2,
                "username": "Mira",
                "problem": "Exam tips? 🔊 Voice message: https://cdn/audio/voice-1.wav",
                "category": "Study",
                "created_at": "2024-05-02T09:00:00+00:00",
                "comments": [],
                "likes": [{ "id": 1, "post_id": 2 }],
                "post_images": []
            },
            {
                "id": 1,
                "username": null,
                "problem": "First!",
                "category": "General",
                "created_at": "2024-05-01T09:00:00+00:00",
                "comments": null,
                "likes": null,
                "post_images": null
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let posts = store_for(&server).query_posts().await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, PostId::new("2"));
    assert_eq!(posts[0].like_count, 1);
    assert_eq!(posts[0].clean_text(), "Exam tips?");
    assert_eq!(posts[0].voice_references(), vec!["https://cdn/audio/voice-1.wav"]);
    assert_eq!(posts[1].author, "Anonymous");
}

#[tokio::test]
async fn insert_post_asks_for_representation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([
            { "username": "Anonymous", "problem": "Hello", "category": "General" }
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {
                "id": 10,
                "username": "Anonymous",
                "problem": "Hello",
                "category": "General",
                "created_at": "2024-05-03T09:00:00+00:00"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let post = store_for(&server)
        .insert_post(&NewPost {
            author: "Anonymous".into(),
            text: "Hello".into(),
            category: Category::General,
        })
        .await
        .unwrap();
    assert_eq!(post.id, PostId::new("10"));
    assert_eq!(post.like_count, 0);
}

#[tokio::test]
async fn insert_post_with_no_rows_back_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = store_for(&server)
        .insert_post(&NewPost {
            author: "Anonymous".into(),
            text: "Hello".into(),
            category: Category::General,
        })
        .await;
    assert!(matches!(result, Err(RemoteError::EmptyResponse)));
}

#[tokio::test]
async fn comments_and_likes_post_single_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/comments"))
        .and(body_json(json!([
            { "post_id": "7", "username": "Anonymous", "comment": "same here" }
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/likes"))
        .and(body_json(json!([{ "post_id": "7" }])))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let id = PostId::new("7");
    store
        .insert_comment(&NewComment {
            post_id: id.clone(),
            author: "Anonymous".into(),
            text: "same here".into(),
        })
        .await
        .unwrap();
    store.insert_like(&id).await.unwrap();
    store.insert_like(&id).await.unwrap();
}

#[tokio::test]
async fn link_image_posts_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/post_images"))
        .and(body_json(json!([
            { "post_id": "3", "image_url": "https://cdn/images/posts/a.png" }
        ])))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .link_image(&PostId::new("3"), "https://cdn/images/posts/a.png")
        .await
        .unwrap();
}

#[tokio::test]
async fn upload_blob_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/storage/v1/object/audio/voice-123.wav"))
        .and(header("content-type", "audio/wav"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "audio/voice-123.wav" })))
        .expect(1)
        .mount(&server)
        .await;

    let url = store_for(&server)
        .upload_blob(
            Bucket::Audio,
            "voice-123.wav",
            Bytes::from_static(b"RIFF"),
            "audio/wav",
        )
        .await
        .unwrap();
    assert_eq!(
        url,
        format!("{}/storage/v1/object/public/audio/voice-123.wav", server.uri())
    );
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    match store_for(&server).query_posts().await {
        Err(RemoteError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid API key");
        }
        other => panic!("expected status error, got {:?}", other.map(|p| p.len())),
    }
}
