use super::DBClient;
use crate::models::{NotificationType, Product, ProductColor, ProductImage, StockOption};

/// Outcome of a product deletion: everything the handler needs for the
/// response, the notification already written inside the transaction, and
/// the files left to sweep from storage.
#[derive(Debug)]
pub struct ProductDeletion {
    pub name: String,
    pub files: Vec<String>,
}

#[derive(Debug)]
pub struct ColorDeletion {
    pub color_name: String,
    pub product_name: String,
    pub image_path: Option<String>,
}

#[derive(Debug)]
pub struct ImageDeletion {
    pub path: String,
    pub product_name: String,
}

/// Product database operations, including colors and gallery images.
pub trait ProductExt {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, sqlx::Error>;

    async fn get_product_colors(&self, product_id: i64)
    -> Result<Vec<ProductColor>, sqlx::Error>;

    async fn get_product_images(&self, product_id: i64)
    -> Result<Vec<ProductImage>, sqlx::Error>;

    async fn list_products(&self) -> Result<Vec<Product>, sqlx::Error>;

    async fn list_products_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Product>, sqlx::Error>;

    async fn list_products_by_subcategory(
        &self,
        subcategory_id: i64,
    ) -> Result<Vec<Product>, sqlx::Error>;

    #[allow(clippy::too_many_arguments)]
    async fn save_product(
        &self,
        name: &str,
        model: &str,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        stock_option: StockOption,
        stock_quantity: Option<i32>,
        price: f64,
        main_image: Option<&str>,
    ) -> Result<Product, sqlx::Error>;

    #[allow(clippy::too_many_arguments)]
    async fn update_product(
        &self,
        id: i64,
        name: &str,
        model: &str,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        stock_option: StockOption,
        stock_quantity: Option<i32>,
        price: f64,
        main_image: Option<&str>,
    ) -> Result<Option<Product>, sqlx::Error>;

    /// Delete a product with its colors and images, writing the audit
    /// notification in the same transaction. File removal is the caller's
    /// business after commit.
    async fn delete_product(&self, id: i64) -> Result<ProductDeletion, sqlx::Error>;

    async fn save_color(
        &self,
        product_id: i64,
        color_name: &str,
        color_hex: &str,
        image_path: Option<&str>,
    ) -> Result<ProductColor, sqlx::Error>;

    /// Delete one color row and write its notification transactionally.
    async fn delete_color(&self, color_id: i64) -> Result<ColorDeletion, sqlx::Error>;

    async fn save_image(
        &self,
        product_id: i64,
        path: &str,
        is_cover: bool,
    ) -> Result<ProductImage, sqlx::Error>;

    /// Delete one gallery image row and write its notification
    /// transactionally.
    async fn delete_image(&self, image_id: i64) -> Result<ImageDeletion, sqlx::Error>;
}

const PRODUCT_COLUMNS: &str = "id, name, model, category_id, subcategory_id, stock_option, \
                               stock_quantity, price, main_image, created_at, updated_at";

impl ProductExt for DBClient {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_product_colors(
        &self,
        product_id: i64,
    ) -> Result<Vec<ProductColor>, sqlx::Error> {
        sqlx::query_as::<_, ProductColor>(
            "SELECT id, product_id, color_name, color_hex, image_path \
             FROM product_colors WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_product_images(
        &self,
        product_id: i64,
    ) -> Result<Vec<ProductImage>, sqlx::Error> {
        sqlx::query_as::<_, ProductImage>(
            "SELECT id, product_id, path, is_cover \
             FROM product_images WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_products(&self) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn list_products_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE category_id = $1 ORDER BY created_at DESC"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_products_by_subcategory(
        &self,
        subcategory_id: i64,
    ) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE subcategory_id = $1 ORDER BY created_at DESC"
        ))
        .bind(subcategory_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn save_product(
        &self,
        name: &str,
        model: &str,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        stock_option: StockOption,
        stock_quantity: Option<i32>,
        price: f64,
        main_image: Option<&str>,
    ) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products \
             (name, model, category_id, subcategory_id, stock_option, stock_quantity, price, main_image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(model)
        .bind(category_id)
        .bind(subcategory_id)
        .bind(stock_option)
        .bind(stock_quantity)
        .bind(price)
        .bind(main_image)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_product(
        &self,
        id: i64,
        name: &str,
        model: &str,
        category_id: Option<i64>,
        subcategory_id: Option<i64>,
        stock_option: StockOption,
        stock_quantity: Option<i32>,
        price: f64,
        main_image: Option<&str>,
    ) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET name = $1, model = $2, category_id = $3, subcategory_id = $4, \
             stock_option = $5, stock_quantity = $6, price = $7, main_image = $8, updated_at = Now() \
             WHERE id = $9 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(model)
        .bind(category_id)
        .bind(subcategory_id)
        .bind(stock_option)
        .bind(stock_quantity)
        .bind(price)
        .bind(main_image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_product(&self, id: i64) -> Result<ProductDeletion, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        // Collect storage paths before the rows disappear.
        let mut files: Vec<String> = sqlx::query_scalar(
            "SELECT image_path FROM product_colors \
             WHERE product_id = $1 AND image_path IS NOT NULL",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let image_paths: Vec<String> =
            sqlx::query_scalar("SELECT path FROM product_images WHERE product_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        files.extend(image_paths);
        if let Some(main_image) = &product.main_image {
            files.push(main_image.clone());
        }

        sqlx::query("DELETE FROM product_colors WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_notification(
            &mut tx,
            &format!("Producto eliminado: {}", product.name),
            NotificationType::Warning,
        )
        .await?;

        tx.commit().await?;

        Ok(ProductDeletion {
            name: product.name,
            files,
        })
    }

    async fn save_color(
        &self,
        product_id: i64,
        color_name: &str,
        color_hex: &str,
        image_path: Option<&str>,
    ) -> Result<ProductColor, sqlx::Error> {
        sqlx::query_as::<_, ProductColor>(
            "INSERT INTO product_colors (product_id, color_name, color_hex, image_path) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, product_id, color_name, color_hex, image_path",
        )
        .bind(product_id)
        .bind(color_name)
        .bind(color_hex)
        .bind(image_path)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_color(&self, color_id: i64) -> Result<ColorDeletion, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, Option<String>, String)> = sqlx::query_as(
            "SELECT c.color_name, c.image_path, p.name \
             FROM product_colors c JOIN products p ON p.id = c.product_id \
             WHERE c.id = $1 FOR UPDATE OF c",
        )
        .bind(color_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (color_name, image_path, product_name) = row.ok_or(sqlx::Error::RowNotFound)?;

        sqlx::query("DELETE FROM product_colors WHERE id = $1")
            .bind(color_id)
            .execute(&mut *tx)
            .await?;

        insert_notification(
            &mut tx,
            &format!(
                "Color \"{}\" eliminado del producto {}",
                color_name, product_name
            ),
            NotificationType::Warning,
        )
        .await?;

        tx.commit().await?;

        Ok(ColorDeletion {
            color_name,
            product_name,
            image_path,
        })
    }

    async fn save_image(
        &self,
        product_id: i64,
        path: &str,
        is_cover: bool,
    ) -> Result<ProductImage, sqlx::Error> {
        sqlx::query_as::<_, ProductImage>(
            "INSERT INTO product_images (product_id, path, is_cover) \
             VALUES ($1, $2, $3) \
             RETURNING id, product_id, path, is_cover",
        )
        .bind(product_id)
        .bind(path)
        .bind(is_cover)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_image(&self, image_id: i64) -> Result<ImageDeletion, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT i.path, p.name \
             FROM product_images i JOIN products p ON p.id = i.product_id \
             WHERE i.id = $1 FOR UPDATE OF i",
        )
        .bind(image_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (path, product_name) = row.ok_or(sqlx::Error::RowNotFound)?;

        sqlx::query("DELETE FROM product_images WHERE id = $1")
            .bind(image_id)
            .execute(&mut *tx)
            .await?;

        insert_notification(
            &mut tx,
            &format!("Imagen eliminada del producto {}", product_name),
            NotificationType::Warning,
        )
        .await?;

        tx.commit().await?;

        Ok(ImageDeletion { path, product_name })
    }
}

/// Write an audit notification inside an open transaction, so the row only
/// lands if the deletion it describes commits.
async fn insert_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    message: &str,
    kind: NotificationType,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO notifications (message, type) VALUES ($1, $2)")
        .bind(message)
        .bind(kind)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
