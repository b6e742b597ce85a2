//! Product Model

use serde::{Deserialize, Serialize};

/// 商品分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// 菜品
    #[serde(alias = "platillo")]
    Dish,
    /// 饮品
    #[serde(alias = "bebida")]
    Drink,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dish => "dish",
            Self::Drink => "drink",
        }
    }
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image: Option<String>,
    pub category: ProductCategory,
    pub is_active: bool,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    pub category: ProductCategory,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub category: Option<ProductCategory>,
    pub is_active: Option<bool>,
}
