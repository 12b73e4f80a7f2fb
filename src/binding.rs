pub mod rest;
pub mod soap;

use std::sync::Arc;

use axum::Router;

use crate::domain::customer::CustomerRepository;

use self::soap::SoapService;

/// REST(`/api/v1`)とSOAP(`/soap`)を同じリポジトリで公開するルーター
pub fn router(repository: Arc<dyn CustomerRepository>, soap: &crate::Soap) -> Router {
    Router::new()
        .nest("/api/v1", rest::router(repository.clone()))
        .merge(soap::router(SoapService::new(
            repository,
            soap.namespace.clone(),
            soap.location.clone(),
        )))
}
