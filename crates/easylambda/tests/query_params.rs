//! Query parameter binding.

use easylambda::prelude::*;
use serde_json::{Value, json};

fn list_items() -> Route {
    let fake_items_db = vec![
        json!({"item_name": "Foo"}),
        json!({"item_name": "Bar"}),
        json!({"item_name": "Baz"}),
    ];
    get("/items/")
        .param(Param::new("skip").annotate(Query::new()).with_default(0))
        .param(Param::new("limit").annotate(Query::new()).with_default(10))
        .handle(move |args| {
            let skip: usize = args.get("skip")?;
            let limit: usize = args.get("limit")?;
            let page: Vec<Value> = fake_items_db.iter().skip(skip).take(limit).cloned().collect();
            Ok(Json(page))
        })
        .unwrap()
}

#[test]
fn defaults_apply_without_query() {
    let response = TestClient::new(list_items()).get("/items/").send();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Vec<Value>>().len(), 3);
}

#[test]
fn skip_and_limit() {
    let response = TestClient::new(list_items())
        .get("/items/")
        .query("skip=1&limit=1")
        .send();
    assert_eq!(response.json::<Value>(), json!([{"item_name": "Bar"}]));
}

#[test]
fn invalid_integer_is_422() {
    let response = TestClient::new(list_items())
        .get("/items/")
        .query("limit=word")
        .send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["detail"][0]["loc"], json!(["query", "limit"]));
}

#[test]
fn required_query_parameter() {
    let route = get("/search")
        .param(Param::new("q").annotate(Query::new()))
        .handle(|args| Ok(Json(args.get::<String>("q")?)))
        .unwrap();
    let client = TestClient::new(route);

    assert_eq!(client.get("/search").query("q=rust").send().text(), r#""rust""#);

    let response = client.get("/search").send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json::<Value>(),
        json!({"detail": [{"loc": ["query", "q"], "msg": "Field required", "type": "missing"}]})
    );
}

#[test]
fn repeated_keys() {
    let route = get("/tags")
        .param(Param::list("tag").annotate(Query::new()))
        .param(Param::new("sort").annotate(Query::new()).optional())
        .handle(|args| {
            let tags: Vec<String> = args.get("tag")?;
            let sort: Option<String> = args.get("sort")?;
            Ok(Json(json!({ "tags": tags, "sort": sort })))
        })
        .unwrap();
    let client = TestClient::new(route);

    let response = client.get("/tags").query("tag=a&sort=x&tag=b&sort=y").send();
    assert_eq!(response.json::<Value>(), json!({"tags": ["a", "b"], "sort": "y"}));

    let response = client.get("/tags").send();
    assert_eq!(response.json::<Value>(), json!({"tags": [], "sort": null}));
}

#[test]
fn dotted_query_keys() {
    let route = get("/")
        .param(Param::new("mode").annotate(Query::named("hub.mode")))
        .handle(|args| Ok(Json(args.get::<String>("mode")?)))
        .unwrap();
    let response = TestClient::new(route).get("/").query("hub.mode=subscribe").send();
    assert_eq!(response.json::<String>(), "subscribe");
}
