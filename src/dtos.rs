use crate::models::{Category, NotificationType, Product, ProductColor, ProductImage, StockOption};
use serde::{Deserialize, Serialize};
use validator::Validate;

// DTOs define the JSON exchanged with the storefront and the admin panel.
// They are separate from the database models so the wire contract stays
// stable independent of schema changes.

// ============================================================================
// Generic response
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
}

// ============================================================================
// Authentication DTOs
// ============================================================================

/// Admin login request.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login success response; `redirect` tells the admin SPA where to go.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponseDto {
    pub success: bool,
    pub message: String,
    pub redirect: String,
}

/// Session probe for the admin UI on page load.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusDto {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// ============================================================================
// Category DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateSubcategoryDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub parent_id: i64,
}

/// Category as shown to the storefront.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl CategoryDto {
    pub fn from_model(category: &Category) -> Self {
        CategoryDto {
            id: category.id,
            name: category.name.to_owned(),
            slug: category.slug.to_owned(),
        }
    }
}

/// Top-level category with its subcategories nested, for the storefront menu.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTreeDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub subcategories: Vec<CategoryDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryListResponseDto {
    pub success: bool,
    pub categories: Vec<CategoryTreeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubcategoryListResponseDto {
    pub success: bool,
    pub subcategories: Vec<CategoryDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryResponseDto {
    pub success: bool,
    pub message: String,
    pub category: CategoryDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubcategoryResponseDto {
    pub success: bool,
    pub message: String,
    pub subcategory: CategoryDto,
}

/// Category deletion outcome; `reassigned` is how many products were moved
/// to the fallback category before the row was removed.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteCategoryResponseDto {
    pub success: bool,
    pub message: String,
    pub reassigned: u64,
}

// ============================================================================
// Product DTOs
// ============================================================================

/// Query filters for product listing. At most one is honored, in this order:
/// id, subcategory_id, category_id.
#[derive(Debug, Deserialize)]
pub struct ProductQueryDto {
    pub id: Option<i64>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateProductDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Model is required"))]
    pub model: String,

    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub stock_option: StockOption,
    pub stock_quantity: Option<i32>,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,

    pub main_image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDetailDto {
    #[serde(flatten)]
    pub product: Product,
    pub colors: Vec<ProductColor>,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponseDto {
    pub success: bool,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductResponseDto {
    pub success: bool,
    pub message: String,
    pub product: Product,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductDetailResponseDto {
    pub success: bool,
    pub product: ProductDetailDto,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateColorDto {
    #[validate(length(min = 1, message = "Color name is required"))]
    pub color_name: String,

    #[validate(length(min = 4, max = 9, message = "Color hex is invalid"))]
    pub color_hex: String,

    pub image_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ColorResponseDto {
    pub success: bool,
    pub message: String,
    pub color: ProductColor,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponseDto {
    pub success: bool,
    pub message: String,
    pub image: ProductImage,
}

// ============================================================================
// Notification DTOs
// ============================================================================

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationDto {
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,

    #[serde(rename = "type")]
    pub kind: NotificationType,

    pub duration: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationListResponseDto {
    pub success: bool,
    pub notifications: Vec<crate::models::Notification>,
}

// ============================================================================
// Store mail DTOs
// ============================================================================

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CartItemDto {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,

    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: f64,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CartEmailDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    pub name: Option<String>,

    #[validate(length(min = 1, message = "Cart is empty"))]
    #[validate(nested)]
    pub items: Vec<CartItemDto>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ContactEmailDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct OrderEmailDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub phone: Option<String>,

    #[validate(length(min = 1, message = "Order is empty"))]
    #[validate(nested)]
    pub items: Vec<CartItemDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_dto_rejects_empty_fields() {
        let dto = LoginDto {
            username: "".to_string(),
            password: "secret".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = LoginDto {
            username: "admin".to_string(),
            password: "".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn create_product_dto_rejects_negative_price() {
        let dto = CreateProductDto {
            name: "Plate carrier".to_string(),
            model: "PC-1".to_string(),
            price: -1.0,
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn cart_email_dto_requires_items() {
        let dto = CartEmailDto {
            email: "buyer@gmail.com".to_string(),
            name: None,
            items: vec![],
        };
        assert!(dto.validate().is_err());
    }
}
