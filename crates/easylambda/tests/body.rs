//! Request body binding.

use easylambda::prelude::*;
use serde_json::{Value, json};

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    name: String,
    description: Option<String>,
    price: f64,
    tax: Option<f64>,
}

fn create_item() -> Route {
    post("/items/")
        .param(Param::new("item").annotate(Metadata::provider::<Body>()))
        .handle(|args| {
            let item: Item = args.get("item")?;
            Ok(Json(item))
        })
        .unwrap()
}

#[test]
fn empty_object_is_422() {
    let response = TestClient::new(create_item())
        .post("/items/")
        .json(&json!({}))
        .send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["detail"][0]["loc"], json!(["body", "item"]));
}

#[test]
fn valid_item_round_trips() {
    let response = TestClient::new(create_item())
        .post("/items/")
        .json(&json!({"name": "item", "price": 9.99}))
        .send();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({"name": "item", "description": null, "price": 9.99, "tax": null})
    );
}

#[test]
fn numeric_name_with_string_price() {
    let response = TestClient::new(create_item())
        .post("/items/")
        .json(&json!({"name": "42", "price": "9.5"}))
        .send();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({"name": "42", "description": null, "price": 9.5, "tax": null})
    );
}

#[test]
fn malformed_json_is_422() {
    let response = TestClient::new(create_item())
        .post("/items/")
        .header("Content-Type", "application/json")
        .body("{\"name\": ")
        .send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["detail"][0]["type"], "json_invalid");
}

#[test]
fn missing_content_type_is_422() {
    let response = TestClient::new(create_item())
        .post("/items/")
        .body(r#"{"name": "item", "price": 1}"#)
        .send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn content_type_parameters_are_ignored() {
    let response = TestClient::new(create_item())
        .post("/items/")
        .header("Content-Type", "application/json; charset=utf-8")
        .body(r#"{"name": "item", "price": 1}"#)
        .send();
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn plain_text_body() {
    let route = post("/echo")
        .param(Param::new("text").annotate(Body))
        .handle(|args| Ok(Response::text(StatusCode::OK, args.get::<String>("text")?)))
        .unwrap();
    let response = TestClient::new(route)
        .post("/echo")
        .header("Content-Type", "text/plain")
        .body("hello")
        .send();
    assert_eq!(response.text(), "hello");
}

#[test]
fn list_body() {
    let route = post("/items/bulk")
        .param(Param::list("items").annotate(Body))
        .handle(|args| {
            let items: Vec<Item> = args.get("items")?;
            Ok(Json(items.len()))
        })
        .unwrap();
    let client = TestClient::new(route);

    let response = client
        .post("/items/bulk")
        .json(&json!([{"name": "a", "price": 1}, {"name": "b", "price": 2}]))
        .send();
    assert_eq!(response.json::<usize>(), 2);

    let response = client.post("/items/bulk").json(&json!({"name": "a"})).send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn form_fields() {
    let route = post("/login")
        .param(Param::new("username").annotate(Form::new()))
        .param(Param::new("remember").annotate(Form::new()).with_default(false))
        .handle(|args| {
            let username: String = args.get("username")?;
            let remember: bool = args.get("remember")?;
            Ok(Json(json!({ "username": username, "remember": remember })))
        })
        .unwrap();
    let response = TestClient::new(route)
        .post("/login")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("username=j%C3%BCrgen&remember=on")
        .send();
    assert_eq!(
        response.json::<Value>(),
        json!({"username": "jürgen", "remember": true})
    );
}
