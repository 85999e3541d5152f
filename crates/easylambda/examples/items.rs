//! Items API Example - Path, Query, Body and Header Parameters
//!
//! This example wires one `MethodRouter` per template and drives them with
//! synthetic function URL events, the same way the Lambda runtime would:
//! - `GET /items/{item_id}` with a path parameter
//! - `GET /items/` with paginated query parameters and a user agent header
//! - `POST /items/` with a JSON body
//!
//! Configuration and log output are read from the `EASYLAMBDA_*` environment
//! variables.
//!
//! # Running This Example
//!
//! ```bash
//! EASYLAMBDA_LOG_LEVEL=debug cargo run --example items -p easylambda
//! ```
//!
//! # Expected Output
//!
//! ```text
//! GET /items/123 -> 200 {"item_id":123}
//! GET /items/word -> 422
//! GET /items/?skip=1&limit=1 -> 200 [{"item_name":"Bar"}]
//! POST /items/ -> 200 {"name":"Foo","description":null,"price":9.5,"tax":null}
//! POST /items/ (empty object) -> 422
//! ```

use easylambda::prelude::*;
use easylambda::testing::EventBuilder;
use serde_json::{Value, json};

#[derive(Debug, Serialize, Deserialize)]
struct Item {
    name: String,
    description: Option<String>,
    price: f64,
    tax: Option<f64>,
}

fn read_item(config: &AppConfig) -> Result<Route, ConfigError> {
    get("/items/{item_id}")
        .name("read_item")
        .config(config.clone())
        .param(Param::new("item_id"))
        .handle(|args| {
            let item_id: i64 = args.get("item_id")?;
            Ok(Json(json!({ "item_id": item_id })))
        })
}

fn items(config: &AppConfig) -> Result<MethodRouter, ConfigError> {
    let fake_items_db = vec![
        json!({"item_name": "Foo"}),
        json!({"item_name": "Bar"}),
        json!({"item_name": "Baz"}),
    ];
    MethodRouter::new("/items/")?
        .config(config.clone())
        .get(|route| {
            route
                .name("list_items")
                .param(Param::new("skip").annotate(Query::new()).with_default(0))
                .param(Param::new("limit").annotate(Query::new()).with_default(10))
                .param(Param::new("user_agent").annotate(Header::new()).optional())
                .handle(move |args| {
                    let skip: usize = args.get("skip")?;
                    let limit: usize = args.get("limit")?;
                    let page: Vec<Value> =
                        fake_items_db.iter().skip(skip).take(limit).cloned().collect();
                    Ok(Json(page))
                })
        })?
        .post(|route| {
            route
                .name("create_item")
                .param(Param::new("item").annotate(Body))
                .handle(|args| Ok(Json(args.get::<Item>("item")?)))
        })
}

fn show(label: &str, handler: &dyn Handler, event: &EventBuilder) -> anyhow::Result<()> {
    let result = handler.call(event.build(), &Context::default())?;
    let response: Response = serde_json::from_value(result)?;
    if response.status().is_success() {
        println!("{label} -> {} {}", response.status().as_u16(), response.body());
    } else {
        println!("{label} -> {}", response.status().as_u16());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?.name("items-example");
    easylambda::init_logging(&config.log)?;

    let read_item = read_item(&config)?;
    let items = items(&config)?;

    show("GET /items/123", &read_item, &EventBuilder::get("/items/123"))?;
    show("GET /items/word", &read_item, &EventBuilder::get("/items/word"))?;
    show(
        "GET /items/?skip=1&limit=1",
        &items,
        &EventBuilder::get("/items/").query("skip=1&limit=1"),
    )?;
    show(
        "POST /items/",
        &items,
        &EventBuilder::post("/items/").json(&json!({"name": "Foo", "price": 9.5})),
    )?;
    show(
        "POST /items/ (empty object)",
        &items,
        &EventBuilder::post("/items/").json(&json!({})),
    )?;
    Ok(())
}
