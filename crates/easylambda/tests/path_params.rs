//! Path parameter binding.

use easylambda::prelude::*;
use serde_json::{Value, json};

fn read_item() -> Route {
    get("/items/{item_id}")
        .name("read_item")
        .param(Param::new("item_id"))
        .handle(|args| {
            let item_id: i64 = args.get("item_id")?;
            Ok(Json(json!({ "item_id": item_id })))
        })
        .unwrap()
}

#[test]
fn numeric_path_parameter() {
    let response = TestClient::new(read_item()).get("/items/123").send();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    assert_eq!(response.text(), r#"{"item_id":123}"#);
}

#[test]
fn non_numeric_path_parameter_is_422() {
    let response = TestClient::new(read_item()).get("/items/word").send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["detail"][0]["loc"], json!(["path", "item_id"]));
    assert_eq!(body["detail"][0]["type"], "value_error");
}

#[test]
fn explicit_path_annotation() {
    let route = get("/users/{user_id}/posts/{post_id}")
        .param(Param::new("user").annotate(Path::named("user_id")))
        .param(Param::new("post_id").annotate(Path::new()))
        .handle(|args| {
            let user: u32 = args.get("user")?;
            let post: String = args.get("post_id")?;
            Ok(Json(json!({ "user": user, "post": post })))
        })
        .unwrap();
    let response = TestClient::new(route).get("/users/7/posts/hello").send();
    assert_eq!(response.json::<Value>(), json!({"user": 7, "post": "hello"}));
}

#[test]
fn path_shape_must_match_exactly() {
    let client = TestClient::new(read_item());
    assert_eq!(client.get("/items/").send().status(), StatusCode::NOT_FOUND);
    assert_eq!(client.get("/items/1/").send().status(), StatusCode::NOT_FOUND);
    assert_eq!(client.get("/items/1/extra").send().status(), StatusCode::NOT_FOUND);
}
