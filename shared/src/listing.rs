//! 通用列表视图：搜索 / 过滤 / 排序
//!
//! 后台所有列表 (客户、订单、商品、酱料、桌台) 共用同一套逻辑：
//! 先按关键字做不区分大小写的子串匹配，再按字段做等值过滤，最后稳定排序。
//! 降序结果严格等于升序结果的反转。

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Client, DiningTable, Order, OrderDetail, Product, Sauce};

/// 可比较 / 可过滤的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
        }
    }

    /// Total order used for sorting. Text compares case-insensitively,
    /// values of different kinds are ordered Null < Bool < Number < Text.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Equality against a raw query-string value
    pub fn matches(&self, raw: &str) -> bool {
        let raw = raw.trim();
        match self {
            Self::Null => raw.is_empty() || raw.eq_ignore_ascii_case("null"),
            Self::Bool(b) => raw.parse::<bool>().is_ok_and(|v| v == *b),
            Self::Number(n) => raw.parse::<f64>().is_ok_and(|v| v == *n),
            Self::Text(t) => t.to_lowercase() == raw.to_lowercase(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// 可以出现在后台列表中的实体
pub trait Listable {
    /// Keys accepted by `field()` for sorting and filtering
    const FIELDS: &'static [&'static str];

    /// Text fields searched by the free-text query
    fn search_text(&self) -> Vec<&str>;

    /// Value of a field; `None` when the key is not one of `FIELDS`
    fn field(&self, key: &str) -> Option<FieldValue>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ascending")]
    Asc,
    #[serde(alias = "descending")]
    Desc,
}

/// 列表查询参数 (`?q=&field=&value=&sort=&dir=`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "q", default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(rename = "field", default, skip_serializing_if = "Option::is_none")]
    pub filter_field: Option<String>,
    #[serde(rename = "value", default, skip_serializing_if = "Option::is_none")]
    pub filter_value: Option<String>,
    #[serde(rename = "sort", default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(rename = "dir", default)]
    pub direction: SortDirection,
}

impl ListQuery {
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter_field = Some(field.into());
        self.filter_value = Some(value.into());
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.direction = direction;
        self
    }
}

fn check_key<T: Listable>(key: &str) -> Result<(), AppError> {
    if T::FIELDS.contains(&key) {
        Ok(())
    } else {
        Err(AppError::invalid_field(
            key,
            format!("Unknown field '{}', expected one of: {}", key, T::FIELDS.join(", ")),
        ))
    }
}

/// Apply search, filter and sort. Unknown sort/filter keys are rejected.
pub fn apply_list_query<T: Listable>(items: Vec<T>, query: &ListQuery) -> Result<Vec<T>, AppError> {
    if let Some(key) = query.filter_field.as_deref().filter(|k| !k.is_empty()) {
        check_key::<T>(key)?;
    }
    if let Some(key) = query.sort_by.as_deref().filter(|k| !k.is_empty()) {
        check_key::<T>(key)?;
    }

    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut items: Vec<T> = items
        .into_iter()
        .filter(|item| match &needle {
            Some(n) => item
                .search_text()
                .iter()
                .any(|text| text.to_lowercase().contains(n.as_str())),
            None => true,
        })
        .filter(|item| match (query.filter_field.as_deref(), query.filter_value.as_deref()) {
            (Some(key), Some(value)) if !key.is_empty() => item
                .field(key)
                .is_some_and(|field| field.matches(value)),
            _ => true,
        })
        .collect();

    if let Some(key) = query.sort_by.as_deref().filter(|k| !k.is_empty()) {
        // sort_by 是稳定排序
        items.sort_by(|a, b| {
            let va = a.field(key).unwrap_or(FieldValue::Null);
            let vb = b.field(key).unwrap_or(FieldValue::Null);
            va.compare(&vb)
        });
        if query.direction == SortDirection::Desc {
            items.reverse();
        }
    }

    Ok(items)
}

// ========== Listable impls ==========

impl Listable for Client {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "phone",
        "address",
        "email",
        "is_featured",
        "category",
        "created_at",
        "is_active",
    ];

    fn search_text(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.phone.as_str(), self.address.as_str()];
        if let Some(email) = &self.email {
            fields.push(email);
        }
        fields
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        Some(match key {
            "name" => self.name.as_str().into(),
            "phone" => self.phone.as_str().into(),
            "address" => self.address.as_str().into(),
            "email" => self.email.as_deref().into(),
            "is_featured" => self.is_featured.into(),
            "category" => self.category.map(|c| c.as_str()).into(),
            "created_at" => self.created_at.into(),
            "is_active" => self.is_active.into(),
            _ => return None,
        })
    }
}

impl Listable for Product {
    const FIELDS: &'static [&'static str] = &["name", "price", "category", "is_active"];

    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        Some(match key {
            "name" => self.name.as_str().into(),
            "price" => self.price.into(),
            "category" => self.category.as_str().into(),
            "is_active" => self.is_active.into(),
            _ => return None,
        })
    }
}

impl Listable for Sauce {
    const FIELDS: &'static [&'static str] = &["name", "heat_level"];

    fn search_text(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        Some(match key {
            "name" => self.name.as_str().into(),
            "heat_level" => self.heat_level.into(),
            _ => return None,
        })
    }
}

impl Listable for DiningTable {
    const FIELDS: &'static [&'static str] = &["number", "capacity", "status", "is_active"];

    fn search_text(&self) -> Vec<&str> {
        vec![self.status.as_str()]
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        Some(match key {
            "number" => self.number.into(),
            "capacity" => self.capacity.into(),
            "status" => self.status.as_str().into(),
            "is_active" => self.is_active.into(),
            _ => return None,
        })
    }
}

impl Listable for Order {
    const FIELDS: &'static [&'static str] = &[
        "number",
        "status",
        "payment_method",
        "service_type",
        "client_id",
        "table_id",
        "total",
        "created_at",
        "updated_at",
    ];

    fn search_text(&self) -> Vec<&str> {
        let mut fields = vec![self.status.as_str(), self.payment_method.as_str()];
        if let Some(note) = &self.note {
            fields.push(note);
        }
        fields
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        Some(match key {
            "number" => self.number.into(),
            "status" => self.status.as_str().into(),
            "payment_method" => self.payment_method.as_str().into(),
            "service_type" => self.service_type.as_str().into(),
            "client_id" => self.client_id.into(),
            "table_id" => self.table_id.into(),
            "total" => self.total.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        })
    }
}

/// 订单详情额外支持按客户名搜索 / 排序
impl Listable for OrderDetail {
    const FIELDS: &'static [&'static str] = &[
        "number",
        "status",
        "payment_method",
        "service_type",
        "client_id",
        "table_id",
        "total",
        "created_at",
        "updated_at",
        "client_name",
    ];

    fn search_text(&self) -> Vec<&str> {
        let mut fields = self.order.search_text();
        if let Some(name) = &self.client_name {
            fields.push(name);
        }
        fields.extend(self.items.iter().map(|i| i.product_name.as_str()));
        fields
    }

    fn field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "client_name" => Some(self.client_name.as_deref().into()),
            _ => self.order.field(key),
        }
    }
}
