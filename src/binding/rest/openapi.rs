use axum::Json;
use serde_json::{json, Map, Value};

use crate::domain::SortOrder;

use super::{CustomerGet, CustomerGetList, CustomerPost, CustomerPut, EntityQuery};

const TAG: &str = "Customer";

/// OpenAPIのスキーマを持つ型
pub(super) trait ApiSchema {
    const NAME: &'static str;

    fn schema() -> Value;

    fn reference() -> Value {
        json!({ "$ref": format!("#/components/schemas/{}", Self::NAME) })
    }
}

impl ApiSchema for CustomerGet {
    const NAME: &'static str = "CustomerGet";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer", "minimum": 0 },
                "name": { "type": "string" },
            },
            "required": ["id", "name"],
        })
    }
}

impl ApiSchema for CustomerGetList {
    const NAME: &'static str = "CustomerGetList";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "data": { "type": "array", "items": CustomerGet::reference() },
            },
            "required": ["data"],
        })
    }
}

fn name_body() -> Value {
    json!({
        "type": "object",
        "properties": { "name": { "type": "string" } },
        "required": ["name"],
    })
}

impl ApiSchema for CustomerPut {
    const NAME: &'static str = "CustomerPut";

    fn schema() -> Value {
        name_body()
    }
}

impl ApiSchema for CustomerPost {
    const NAME: &'static str = "CustomerPost";

    fn schema() -> Value {
        name_body()
    }
}

impl ApiSchema for EntityQuery {
    const NAME: &'static str = "EntityQuery";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "order_by": { "type": "string", "enum": [SortOrder::Asc, SortOrder::Desc] },
            },
            "required": ["order_by"],
        })
    }
}

fn components() -> Value {
    let mut schemas = Map::new();
    schemas.insert(CustomerGet::NAME.to_owned(), CustomerGet::schema());
    schemas.insert(CustomerGetList::NAME.to_owned(), CustomerGetList::schema());
    schemas.insert(CustomerPut::NAME.to_owned(), CustomerPut::schema());
    schemas.insert(CustomerPost::NAME.to_owned(), CustomerPost::schema());
    schemas.insert(EntityQuery::NAME.to_owned(), EntityQuery::schema());
    json!({ "schemas": schemas })
}

fn operation(summary: &str, parameters: Value, body: Option<Value>, response: Value) -> Value {
    let mut operation = json!({
        "summary": summary,
        "tags": [TAG],
        "parameters": parameters,
        "responses": {
            "200": {
                "description": "OK",
                "content": { "application/json": { "schema": response } },
            },
            "404": { "description": "Not found" },
            "422": { "description": "Unprocessable Entity" },
        },
    });
    if let Some(schema) = body {
        operation["requestBody"] = json!({
            "required": true,
            "content": { "application/json": { "schema": schema } },
        });
    }
    operation
}

/// `/api/v1` 配下のルートを記述するOpenAPI 3.0ドキュメント
pub(super) fn document() -> Value {
    let id = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "description": "Entity id",
        "schema": { "type": "integer", "minimum": 0 },
    }]);
    let order_by_schema = EntityQuery::schema()["properties"]["order_by"].clone();
    let order_by = json!([{
        "name": "order_by",
        "in": "query",
        "required": true,
        "schema": order_by_schema,
    }]);
    json!({
        "openapi": "3.0.3",
        "info": { "title": "API", "version": env!("CARGO_PKG_VERSION") },
        "servers": [{ "url": "/api/v1" }],
        "tags": [{ "name": TAG }],
        "paths": {
            "/customer/{id}": {
                "get": operation("Get customer", id.clone(), None, CustomerGet::reference()),
                "put": operation(
                    "Update customer",
                    id.clone(),
                    Some(CustomerPut::reference()),
                    CustomerGet::reference(),
                ),
                "delete": operation("Delete customer", id, None, CustomerGet::reference()),
            },
            "/customers": {
                "get": operation(
                    "Get customer list",
                    order_by,
                    None,
                    CustomerGetList::reference(),
                ),
                "post": operation(
                    "Create customer",
                    json!([]),
                    Some(CustomerPost::reference()),
                    CustomerGet::reference(),
                ),
            },
        },
        "components": components(),
    })
}

pub(super) async fn describe() -> Json<Value> {
    Json(document())
}
