use async_trait::async_trait;
use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::{Entity, Id, SortOrder};

/// 顧客リポジトリ
///
/// 顧客コレクションの唯一の所有者であり、唯一の更新者。
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// 顧客を名前順で全件取得する
    async fn list(&self, order: SortOrder) -> Result<Vec<Customer>, CustomerError>;
    /// 顧客をIDで検索する
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, CustomerError>;
    /// 顧客を作成する。IDは既存IDの最大値+1、空なら0
    async fn create(&self, name: String) -> Result<Customer, CustomerError>;
    /// 指定されたフィールドのみ更新する
    async fn update(&self, id: CustomerId, patch: CustomerPatch)
        -> Result<Customer, CustomerError>;
    /// 顧客を削除する。存在しないIDでも成功する
    async fn delete(&self, id: CustomerId) -> Result<bool, CustomerError>;
    /// 顧客を削除し、削除前の状態を返す。存在しなければNotFound
    async fn take(&self, id: CustomerId) -> Result<Customer, CustomerError>;

    /// 顧客をIDで取得する
    async fn get_by_id(&self, id: CustomerId) -> Result<Customer, CustomerError> {
        self.find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound { id })
    }
}

/// 顧客ID
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
    Default,
)]
pub struct CustomerId(u32);

impl Id for CustomerId {
    type Inner = u32;
}

impl CustomerId {
    /// 次のID。u32の範囲を超える場合はNone
    pub fn next(self) -> Option<CustomerId> {
        self.0.checked_add(1).map(CustomerId)
    }
}

/// 顧客エンティティ
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    name: String,
}

impl Customer {
    pub(crate) fn new(id: CustomerId, name: String) -> Self {
        Self { id, name }
    }

    pub(crate) fn apply(&mut self, patch: CustomerPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    const ENTITY_NAME: &'static str = "customer";

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// 顧客の部分更新
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomerPatch {
    pub name: Option<String>,
}

impl CustomerPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// 顧客エラー
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
pub enum CustomerError {
    /// 顧客が見つかりません
    #[display(fmt = "Customer {} not found", id)]
    NotFound { id: CustomerId },
    /// IDを採番できません
    #[display(fmt = "Customer id space is exhausted")]
    IdExhausted,
}
