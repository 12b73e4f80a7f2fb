//! SOAP 1.1 / RPC binding.
//!
//! `POST /soap` takes an envelope whose body element names one of the
//! `customer_*` operations; `GET /soap?wsdl` serves the service description.
//! Unlike the REST binding, names are checked against the WSDL constraint
//! and `customer_delete` only acknowledges the deletion.

mod envelope;
mod schema;
mod wsdl;

use std::{collections::HashMap, fmt::Display, str::FromStr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::customer::{CustomerError, CustomerId, CustomerPatch, CustomerRepository};

pub use self::envelope::{parse_request, RpcRequest, SOAP_ENV_NS};
pub use self::schema::*;

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

pub fn router(service: SoapService) -> Router {
    Router::new()
        .route("/soap", get(describe).post(dispatch))
        .with_state(Arc::new(service))
}

async fn describe(
    State(service): State<Arc<SoapService>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if params.contains_key("wsdl") {
        ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], service.wsdl()).into_response()
    } else {
        SoapError::Malformed("send a SOAP envelope with POST or fetch ?wsdl".to_owned())
            .into_response()
    }
}

async fn dispatch(State(service): State<Arc<SoapService>>, body: String) -> Response {
    match service.handle(&body).await {
        Ok(xml) => ([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], xml).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 公開するRPCオペレーション
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    GetList,
    Get,
    Create,
    Edit,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::GetList,
        Operation::Get,
        Operation::Create,
        Operation::Edit,
        Operation::Delete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetList => "customer_get_list",
            Operation::Get => "customer_get",
            Operation::Create => "customer_create",
            Operation::Edit => "customer_edit",
            Operation::Delete => "customer_delete",
        }
    }
}

impl FromStr for Operation {
    type Err = SoapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| SoapError::UnknownOperation(s.to_owned()))
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// オペレーションの戻り値
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SoapResult {
    Customer(CustomerSchema),
    Customers(Vec<CustomerSchema>),
    /// 中身のない `{op}Result` 要素になる
    Acknowledged,
}

pub struct SoapService {
    repository: Arc<dyn CustomerRepository>,
    namespace: String,
    location: String,
}

impl SoapService {
    pub fn new(
        repository: Arc<dyn CustomerRepository>,
        namespace: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            namespace: namespace.into(),
            location: location.into(),
        }
    }

    /// エンベロープを解析して実行し、レスポンスのエンベロープを返す
    pub async fn handle(&self, body: &str) -> Result<String, SoapError> {
        let request = parse_request(body)?;
        let operation = request.operation.parse::<Operation>()?;
        debug!("SOAP呼び出し: {}", operation);
        let result = self.call(operation, &request).await?;
        envelope::response(&self.namespace, operation, result)
    }

    pub async fn call(
        &self,
        operation: Operation,
        request: &RpcRequest,
    ) -> Result<SoapResult, SoapError> {
        match operation {
            Operation::GetList => {
                let order = parse_order_by(request.param("order_by"))?;
                let customers = self.repository.list(order).await?;
                Ok(SoapResult::Customers(
                    customers.into_iter().map(CustomerSchema::from).collect(),
                ))
            }
            Operation::Get => {
                let id = parse_customer_id(request.required("customer_id")?)?;
                let customer = self.repository.get_by_id(id).await?;
                Ok(SoapResult::Customer(customer.into()))
            }
            Operation::Create => {
                let name = request.required("name")?;
                validate_name(name)?;
                let customer = self.repository.create(name.to_owned()).await?;
                Ok(SoapResult::Customer(customer.into()))
            }
            Operation::Edit => {
                let id = parse_customer_id(request.required("customer_id")?)?;
                let name = request.required("name")?;
                validate_name(name)?;
                let customer = self
                    .repository
                    .update(id, CustomerPatch::name(name))
                    .await?;
                Ok(SoapResult::Customer(customer.into()))
            }
            Operation::Delete => {
                let id = parse_customer_id(request.required("customer_id")?)?;
                self.repository.delete(id).await?;
                Ok(SoapResult::Acknowledged)
            }
        }
    }

    pub fn wsdl(&self) -> String {
        wsdl::describe(&self.namespace, &self.location)
    }
}

/// SOAPフォルト
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoapError {
    #[error("Malformed request: {0}")]
    Malformed(String),
    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("{0}")]
    Validation(String),
    #[error("Customer {0} not found")]
    NotFound(CustomerId),
    #[error("{0}")]
    Internal(String),
}

impl SoapError {
    pub(crate) fn malformed(error: impl Display) -> Self {
        SoapError::Malformed(error.to_string())
    }

    pub fn fault_code(&self) -> &'static str {
        match self {
            SoapError::Malformed(_) => "soap11env:Client.XmlSyntaxError",
            SoapError::UnknownOperation(_) => "soap11env:Client.MethodNotFound",
            SoapError::Validation(_) => "soap11env:Client.ValidationError",
            SoapError::NotFound(_) => "soap11env:Client.ResourceNotFound",
            SoapError::Internal(_) => "soap11env:Server",
        }
    }

    pub fn fault_string(&self) -> String {
        match self {
            SoapError::Internal(_) => "Internal server error".to_owned(),
            e => e.to_string(),
        }
    }
}

impl From<CustomerError> for SoapError {
    fn from(value: CustomerError) -> Self {
        match value {
            CustomerError::NotFound { id } => SoapError::NotFound(id),
            CustomerError::IdExhausted => SoapError::Internal(value.to_string()),
        }
    }
}

impl IntoResponse for SoapError {
    fn into_response(self) -> Response {
        match &self {
            SoapError::Internal(detail) => error!("SOAP処理エラー: {}", detail),
            e => warn!("SOAPフォルト: {}", e),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
            envelope::fault(&self),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::{domain::SortOrder, infrastructure::InMemoryCustomerRepository};

    use super::*;

    const NS: &str = "ecam.soap.customer";

    fn request(operation: &str, params: &[(&str, &str)]) -> String {
        let params = params
            .iter()
            .map(|(k, v)| format!("<tns:{k}>{v}</tns:{k}>"))
            .collect::<String>();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="{SOAP_ENV_NS}" xmlns:tns="{NS}">
  <soapenv:Header/>
  <soapenv:Body>
    <tns:{operation}>{params}</tns:{operation}>
  </soapenv:Body>
</soapenv:Envelope>"#
        )
    }

    fn service(repository: Arc<InMemoryCustomerRepository>) -> SoapService {
        SoapService::new(repository, NS, "http://localhost:8080/soap")
    }

    #[tokio::test]
    async fn test_customer_get() {
        let service = service(Arc::new(InMemoryCustomerRepository::seeded(5)));
        let xml = service
            .handle(&request("customer_get", &[("customer_id", "3")]))
            .await
            .unwrap();
        assert!(xml.contains("<tns:customer_getResponse><tns:customer_getResult>"));
        assert!(xml.contains("<tns:id>3</tns:id><tns:name>Name 3</tns:name>"));
    }

    #[tokio::test]
    async fn test_customer_get_errors() {
        let service = service(Arc::new(InMemoryCustomerRepository::seeded(5)));
        assert_eq!(
            service
                .handle(&request("customer_get", &[("customer_id", "abc")]))
                .await
                .unwrap_err()
                .fault_code(),
            "soap11env:Client.ValidationError"
        );
        assert_eq!(
            service
                .handle(&request("customer_get", &[("customer_id", "77")]))
                .await,
            Err(SoapError::NotFound(CustomerId::from(77)))
        );
        assert!(matches!(
            service.handle(&request("customer_get", &[])).await,
            Err(SoapError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_customer_get_list() {
        let service = service(Arc::new(InMemoryCustomerRepository::seeded(3)));
        let request = RpcRequest::new("customer_get_list", [("order_by", "DESC")]);
        let customers = match service.call(Operation::GetList, &request).await.unwrap() {
            SoapResult::Customers(customers) => customers,
            other => panic!("unexpected result: {:?}", other),
        };
        let ids = customers.iter().map(|c| c.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 1, 0]);

        // order_by省略時は昇順
        let xml = service
            .handle(&request_without_params("customer_get_list"))
            .await
            .unwrap();
        let first = xml.find("<tns:id>0</tns:id>").unwrap();
        let last = xml.find("<tns:id>2</tns:id>").unwrap();
        assert!(first < last);
        assert_eq!(xml.matches("<tns:CustomerSchema>").count(), 3);
    }

    fn request_without_params(operation: &str) -> String {
        format!(
            r#"<soapenv:Envelope xmlns:soapenv="{SOAP_ENV_NS}" xmlns:tns="{NS}"><soapenv:Body><tns:{operation}/></soapenv:Body></soapenv:Envelope>"#
        )
    }

    #[tokio::test]
    async fn test_customer_get_list_invalid_order() {
        let service = service(Arc::new(InMemoryCustomerRepository::seeded(3)));
        assert!(matches!(
            service
                .handle(&request("customer_get_list", &[("order_by", "XYZ")]))
                .await,
            Err(SoapError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_customer_create() {
        let repository = Arc::new(InMemoryCustomerRepository::seeded(50));
        let service = service(repository.clone());
        let xml = service
            .handle(&request("customer_create", &[("name", "new.customer")]))
            .await
            .unwrap();
        assert!(xml.contains("<tns:id>50</tns:id><tns:name>new.customer</tns:name>"));
        assert_eq!(
            repository
                .get_by_id(CustomerId::from(50))
                .await
                .unwrap()
                .name(),
            "new.customer"
        );
    }

    #[tokio::test]
    async fn test_customer_create_rejects_invalid_name() {
        let repository = Arc::new(InMemoryCustomerRepository::new());
        let service = service(repository.clone());
        for name in ["AB", "Name 5"] {
            let error = service
                .handle(&request("customer_create", &[("name", name)]))
                .await
                .unwrap_err();
            assert_eq!(error.fault_code(), "soap11env:Client.ValidationError");
        }

        // リポジトリには到達しない
        assert!(repository.list(SortOrder::Asc).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customer_edit() {
        let repository = Arc::new(InMemoryCustomerRepository::seeded(5));
        let service = service(repository.clone());
        let xml = service
            .handle(&request(
                "customer_edit",
                &[("customer_id", "1"), ("name", "renamed")],
            ))
            .await
            .unwrap();
        assert!(xml.contains("<tns:id>1</tns:id><tns:name>renamed</tns:name>"));

        assert_eq!(
            service
                .handle(&request(
                    "customer_edit",
                    &[("customer_id", "1"), ("name", "Bad Name")],
                ))
                .await
                .unwrap_err()
                .fault_code(),
            "soap11env:Client.ValidationError"
        );
        assert_eq!(
            service
                .handle(&request(
                    "customer_edit",
                    &[("customer_id", "9"), ("name", "renamed")],
                ))
                .await,
            Err(SoapError::NotFound(CustomerId::from(9)))
        );
        assert_eq!(
            repository.get_by_id(CustomerId::from(1)).await.unwrap().name(),
            "renamed"
        );
    }

    #[tokio::test]
    async fn test_customer_delete() {
        let repository = Arc::new(InMemoryCustomerRepository::seeded(5));
        let service = service(repository.clone());
        let xml = service
            .handle(&request("customer_delete", &[("customer_id", "2")]))
            .await
            .unwrap();
        assert!(xml.contains(
            "<tns:customer_deleteResponse><tns:customer_deleteResult/></tns:customer_deleteResponse>"
        ));
        assert_eq!(repository.find_by_id(CustomerId::from(2)).await, Ok(None));

        // 存在しないIDの削除もフォルトにならない
        assert!(service
            .handle(&request("customer_delete", &[("customer_id", "2")]))
            .await
            .is_ok());
        assert_eq!(repository.list(SortOrder::Asc).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let service = service(Arc::new(InMemoryCustomerRepository::new()));
        assert_eq!(
            service.handle(&request("customer_purge", &[])).await,
            Err(SoapError::UnknownOperation("customer_purge".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_router() {
        let app = router(service(Arc::new(InMemoryCustomerRepository::seeded(2))));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/soap")
                    .body(Body::from(request("customer_get", &[("customer_id", "1")])))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("<tns:name>Name 1</tns:name>"));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/soap")
                    .body(Body::from("<not-soap"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("<faultcode>soap11env:Client"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/soap?wsdl")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("wsdl:definitions"));
    }
}
