//! Domain resource endpoints

use super::{ApiClient, ApiRequest, ClientError};
use crate::types::Page;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// CRUD collections exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Subproducts,
    CuttingOrders,
    Categories,
    Types,
    Users,
}

impl Resource {
    pub const ALL: [Self; 6] = [
        Self::Products,
        Self::Subproducts,
        Self::CuttingOrders,
        Self::Categories,
        Self::Types,
        Self::Users,
    ];

    /// Collection path
    pub fn path(self) -> &'static str {
        match self {
            Self::Products => "/products/",
            Self::Subproducts => "/subproducts/",
            Self::CuttingOrders => "/cutting-orders/",
            Self::Categories => "/categories/",
            Self::Types => "/types/",
            Self::Users => "/users/",
        }
    }

    /// Path of a single item
    pub fn item_path(self, id: &str) -> String {
        format!("{}{}/", self.path(), id.trim_matches('/'))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Subproducts => "subproducts",
            Self::CuttingOrders => "cutting-orders",
            Self::Categories => "categories",
            Self::Types => "types",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|resource| resource.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|r| r.name()).collect();
                format!("unknown resource '{s}', expected one of: {}", known.join(", "))
            })
    }
}

/// Pagination, search and filters for a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    #[must_use]
    pub fn ordering(mut self, field: impl Into<String>) -> Self {
        self.ordering = Some(field.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Query-string pairs. Blank values are dropped; filters come last, by key.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let fixed = [
            ("page", self.page.map(|p| p.to_string())),
            ("page_size", self.page_size.map(|s| s.to_string())),
            ("search", self.search.clone()),
            ("ordering", self.ordering.clone()),
        ];

        fixed
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .chain(self.filters.clone())
            .map(|(key, value)| (key, value.trim().to_string()))
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .collect()
    }
}

impl ApiClient {
    /// List one page of a resource
    pub async fn list<T: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &ListQuery,
    ) -> Result<Page<T>, ClientError> {
        self.execute(ApiRequest::get(resource.path()).query(query.to_pairs()))
            .await
    }

    pub async fn fetch<T: DeserializeOwned>(
        &self,
        resource: Resource,
        id: &str,
    ) -> Result<T, ClientError> {
        self.get(&resource.item_path(id)).await
    }

    pub async fn create<B, T>(&self, resource: Resource, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(resource.path(), body).await
    }

    pub async fn update<B, T>(&self, resource: Resource, id: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.put(&resource.item_path(id), body).await
    }

    pub async fn remove(&self, resource: Resource, id: &str) -> Result<(), ClientError> {
        self.delete(&resource.item_path(id)).await
    }
}
