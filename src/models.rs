use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock state of a product.
///
/// Stored in PostgreSQL as the "stock_option" ENUM. `InStock` rows carry a
/// `stock_quantity`; `Preorder` rows leave it NULL.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "stock_option", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StockOption {
    Preorder,
    InStock,
}

impl Default for StockOption {
    fn default() -> Self {
        StockOption::Preorder
    }
}

/// Severity tag on a notification, used by the admin UI for styling only.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "notification_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Error,
}

/// Category row. Self-referential: `parent_id = NULL` means top-level,
/// non-null means subcategory of that parent. One level deep in practice.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Product row. Categories are referenced by id only; the storefront's old
/// free-text category columns were retired with the relational schema.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub model: String,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub stock_option: StockOption,
    pub stock_quantity: Option<i32>,
    pub price: f64,
    pub main_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct ProductColor {
    pub id: i64,
    pub product_id: i64,
    pub color_name: String,
    pub color_hex: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub path: String,
    pub is_cover: bool,
}

/// Admin activity feed entry. Append-only, free text; not linked by foreign
/// key to the entity it describes.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub duration: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_option_serde_uses_wire_names() {
        let json = serde_json::to_string(&StockOption::InStock).unwrap();
        assert_eq!(json, r#""instock""#);
        let parsed: StockOption = serde_json::from_str(r#""preorder""#).unwrap();
        assert_eq!(parsed, StockOption::Preorder);
    }

    #[test]
    fn notification_type_rejects_unknown_tag() {
        let parsed: Result<NotificationType, _> = serde_json::from_str(r#""fatal""#);
        assert!(parsed.is_err());
    }
}
