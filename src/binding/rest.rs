//! JSON/REST binding.
//!
//! `GET|PUT|DELETE /customer/:id`, `GET|POST /customers`.
//! Request shapes are checked by the extractors; any rejection is a
//! validation error (422) and never reaches the repository.
//! `GET /openapi.json` describes the same routes.

mod openapi;

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::{
    customer::{Customer, CustomerError, CustomerId, CustomerPatch, CustomerRepository},
    Entity, SortOrder,
};

type Repository = Arc<dyn CustomerRepository>;

pub fn router(repository: Repository) -> Router {
    Router::new()
        .route(
            "/customer/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers", get(list_customers).post(create_customer))
        .route("/openapi.json", get(openapi::describe))
        .with_state(repository)
}

/// 顧客レスポンス
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerGet {
    pub id: u32,
    pub name: String,
}

impl From<Customer> for CustomerGet {
    fn from(value: Customer) -> Self {
        Self {
            id: *value.id(),
            name: value.name().to_owned(),
        }
    }
}

/// 顧客一覧レスポンス
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerGetList {
    pub data: Vec<CustomerGet>,
}

/// 顧客更新リクエスト
#[derive(Clone, Debug, Deserialize)]
pub struct CustomerPut {
    pub name: String,
}

/// 顧客作成リクエスト
#[derive(Clone, Debug, Deserialize)]
pub struct CustomerPost {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EntityQuery {
    pub order_by: SortOrder,
}

async fn get_customer(
    State(repository): State<Repository>,
    path: Result<Path<u32>, PathRejection>,
) -> Result<Json<CustomerGet>, RestError> {
    let Path(id) = path?;
    debug!("GET /customer/{}", id);
    let customer = repository.get_by_id(id.into()).await?;
    Ok(Json(customer.into()))
}

async fn update_customer(
    State(repository): State<Repository>,
    path: Result<Path<u32>, PathRejection>,
    body: Result<Json<CustomerPut>, JsonRejection>,
) -> Result<Json<CustomerGet>, RestError> {
    let Path(id) = path?;
    let Json(body) = body?;
    debug!("PUT /customer/{}", id);
    let customer = repository
        .update(id.into(), CustomerPatch::name(body.name))
        .await?;
    Ok(Json(customer.into()))
}

/// 削除前の状態を返す。取得と削除は同じ書き込みロックの中で行う
async fn delete_customer(
    State(repository): State<Repository>,
    path: Result<Path<u32>, PathRejection>,
) -> Result<Json<CustomerGet>, RestError> {
    let Path(id) = path?;
    debug!("DELETE /customer/{}", id);
    let customer = repository.take(id.into()).await?;
    Ok(Json(customer.into()))
}

async fn list_customers(
    State(repository): State<Repository>,
    query: Result<Query<EntityQuery>, QueryRejection>,
) -> Result<Json<CustomerGetList>, RestError> {
    let Query(query) = query?;
    debug!("GET /customers?order_by={}", query.order_by);
    let customers = repository.list(query.order_by).await?;
    Ok(Json(CustomerGetList {
        data: customers.into_iter().map(CustomerGet::from).collect(),
    }))
}

async fn create_customer(
    State(repository): State<Repository>,
    body: Result<Json<CustomerPost>, JsonRejection>,
) -> Result<Json<CustomerGet>, RestError> {
    let Json(body) = body?;
    debug!("POST /customers");
    let customer = repository.create(body.name).await?;
    Ok(Json(customer.into()))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestError {
    #[error("{0}")]
    Validation(String),
    #[error("Customer {0} not found")]
    NotFound(CustomerId),
    #[error("{0}")]
    Internal(String),
}

impl RestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            RestError::Validation(_) => "validation_error",
            RestError::NotFound(_) => "not_found",
            RestError::Internal(_) => "internal_error",
        }
    }
}

impl From<CustomerError> for RestError {
    fn from(value: CustomerError) -> Self {
        match value {
            CustomerError::NotFound { id } => RestError::NotFound(id),
            CustomerError::IdExhausted => RestError::Internal(value.to_string()),
        }
    }
}

impl From<PathRejection> for RestError {
    fn from(value: PathRejection) -> Self {
        RestError::Validation(value.body_text())
    }
}

impl From<QueryRejection> for RestError {
    fn from(value: QueryRejection) -> Self {
        RestError::Validation(value.body_text())
    }
}

impl From<JsonRejection> for RestError {
    fn from(value: JsonRejection) -> Self {
        RestError::Validation(value.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let message = match &self {
            RestError::Internal(detail) => {
                error!("{}の処理に失敗: {}", Customer::ENTITY_NAME, detail);
                "Internal server error".to_owned()
            }
            e => {
                warn!("不正なリクエスト: {}", e);
                e.to_string()
            }
        };
        let body = ErrorBody {
            code: self.code(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}
