//! Dispatch order, defaults, custom responses and registration checks.

use easylambda::prelude::*;
use easylambda::testing::EventBuilder;
use serde_json::{Value, json};

#[test]
fn custom_response_passes_through() {
    let route = get("/teapot")
        .handle(|_| Ok(Response::new(StatusCode::IM_A_TEAPOT).with_body("I'm a teapot")))
        .unwrap();
    let response = TestClient::new(route).get("/teapot").send();
    assert_eq!(response.status().as_u16(), 418);
    assert_eq!(response.text(), "I'm a teapot");
}

#[test]
fn unit_result_is_204() {
    let route = delete("/items/{item_id}")
        .param(Param::new("item_id"))
        .handle(|args| {
            let _: u64 = args.get("item_id")?;
            Ok(())
        })
        .unwrap();
    let response = TestClient::new(route).delete("/items/9").send();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[test]
fn path_is_checked_before_method() {
    let route = get("/items/{item_id}")
        .param(Param::new("item_id"))
        .handle(|_| Ok(()))
        .unwrap();
    let client = TestClient::new(route);
    assert_eq!(client.post("/users/1").send().status(), StatusCode::NOT_FOUND);

    let response = client.post("/items/1").send();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.header("Allow"), Some("GET"));
}

#[test]
fn method_is_checked_before_binding() {
    let route = post("/items/")
        .param(Param::new("item").annotate(Body))
        .handle(|_| Ok(()))
        .unwrap();
    // No body at all, but the method is wrong first.
    let response = TestClient::new(route).get("/items/").send();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn route_accepts_every_method_by_default() {
    let route = route("/any").handle(|_| Ok(())).unwrap();
    let client = TestClient::new(route);
    for method in ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"] {
        assert_eq!(
            client.request(method, "/any").send().status(),
            StatusCode::NO_CONTENT,
            "{method}"
        );
    }
}

#[test]
fn optional_parameter_takes_default_and_required_one_is_named() {
    let route = get("/greet")
        .param(Param::new("name").annotate(Query::new()))
        .param(Param::new("greeting").annotate(Query::new()).with_default("Hello"))
        .handle(|args| {
            let name: String = args.get("name")?;
            let greeting: String = args.get("greeting")?;
            Ok(Json(format!("{greeting}, {name}!")))
        })
        .unwrap();
    let client = TestClient::new(route);

    let response = client.get("/greet").query("name=Ada").send();
    assert_eq!(response.json::<String>(), "Hello, Ada!");

    let response = client.get("/greet").query("greeting=Hi").send();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["detail"][0]["loc"], json!(["query", "name"]));
    assert_eq!(body["detail"][0]["msg"], "Field required");
}

#[test]
fn unbound_parameter_fails_registration() {
    let err = get("/items/")
        .name("list_items")
        .param(Param::new("q"))
        .handle(|_| Ok(()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnboundParameter { .. }));
    assert!(err.to_string().contains("`q` of `list_items`"));
}

#[test]
fn duplicate_parameter_fails_registration() {
    let err = get("/")
        .param(Param::new("q").annotate(Query::new()))
        .param(Param::new("q").annotate(Query::new()))
        .handle(|_| Ok(()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateParameter { .. }));
}

#[test]
fn invalid_template_fails_registration() {
    let err = get("/items/{item id}").handle(|_| Ok(())).unwrap_err();
    assert!(matches!(err, ConfigError::Route(_)));
}

#[test]
fn runtime_entry_point_speaks_proxy_json() {
    let route = get("/items/{item_id}")
        .param(Param::new("item_id"))
        .handle(|args| Ok(Json(json!({ "item_id": args.get::<i64>("item_id")? }))))
        .unwrap();
    let event = EventBuilder::get("/items/5").build();
    let result = route.call(event, &Context::default()).unwrap();
    assert_eq!(
        result,
        json!({
            "statusCode": 200,
            "headers": {"Content-Type": "application/json"},
            "body": "{\"item_id\":5}"
        })
    );
}

#[test]
fn request_parameter_sees_the_envelope() {
    let route = post("/echo")
        .param(Param::request("event"))
        .handle(|args| {
            let request = args.request();
            Ok(Json(json!({
                "method": request.method(),
                "stage": request.event().request_context.stage,
                "body": request.body(),
            })))
        })
        .unwrap();
    let response = TestClient::new(route).post("/echo").body("raw").send();
    assert_eq!(
        response.json::<Value>(),
        json!({"method": "POST", "stage": "$default", "body": "raw"})
    );
}
