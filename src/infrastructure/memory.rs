use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::customer::{
    Customer, CustomerError, CustomerId, CustomerPatch, CustomerRepository,
};
use crate::domain::{Entity, SortOrder};

/// プロセスメモリ上の顧客リポジトリ
///
/// 参照は並行に、作成・更新・削除は書き込みロックで直列化される。
#[derive(Debug, Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<Vec<Customer>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// ID `0..count`、名前 `Name {i}` の顧客で初期化する
    pub fn seeded(count: u32) -> Self {
        let customers = (0..count)
            .map(|i| Customer::new(CustomerId::from(i), format!("Name {}", i)))
            .collect();
        Self {
            customers: RwLock::new(customers),
        }
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn list(&self, order: SortOrder) -> Result<Vec<Customer>, CustomerError> {
        let mut customers = self.customers.read().await.clone();
        customers.sort_by(|a, b| a.name().cmp(b.name()));
        if order == SortOrder::Desc {
            customers.reverse();
        }
        Ok(customers)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, CustomerError> {
        Ok(self
            .customers
            .read()
            .await
            .iter()
            .find(|c| c.id() == id)
            .cloned())
    }

    async fn create(&self, name: String) -> Result<Customer, CustomerError> {
        let mut customers = self.customers.write().await;
        let id = match customers.iter().map(Entity::id).max() {
            Some(max) => max.next().ok_or(CustomerError::IdExhausted)?,
            None => CustomerId::default(),
        };
        let customer = Customer::new(id, name);
        customers.push(customer.clone());
        debug!("{}を作成: {:?}", Customer::ENTITY_NAME, customer);
        Ok(customer)
    }

    async fn update(
        &self,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, CustomerError> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(CustomerError::NotFound { id })?;
        customer.apply(patch);
        debug!("{}を更新: {:?}", Customer::ENTITY_NAME, customer);
        Ok(customer.clone())
    }

    async fn delete(&self, id: CustomerId) -> Result<bool, CustomerError> {
        let mut customers = self.customers.write().await;
        if let Some(index) = customers.iter().position(|c| c.id() == id) {
            customers.remove(index);
            debug!("{}を削除: {}", Customer::ENTITY_NAME, id);
        }
        Ok(true)
    }

    async fn take(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        let mut customers = self.customers.write().await;
        let index = customers
            .iter()
            .position(|c| c.id() == id)
            .ok_or(CustomerError::NotFound { id })?;
        let customer = customers.remove(index);
        debug!("{}を削除: {}", Customer::ENTITY_NAME, id);
        Ok(customer)
    }
}
