use super::DBClient;
use crate::models::Category;

/// Name of the reserved category that absorbs products whose category was
/// deleted. Created lazily on the first deletion that needs it, then
/// permanent. Older deployments spelled it with an accent, so lookups match
/// both forms case-insensitively.
pub const FALLBACK_CATEGORY_NAME: &str = "FALTA CATEGORIA";
pub const FALLBACK_CATEGORY_SLUG: &str = "falta-categoria";

/// Outcome of a top-level category deletion, for the response and the
/// notification row.
#[derive(Debug)]
pub struct CategoryDeletion {
    pub name: String,
    pub reassigned: u64,
}

/// Category database operations.
pub trait CategoryExt {
    /// Get a top-level category (`parent_id IS NULL`) by id.
    async fn get_top_level_category(&self, id: i64) -> Result<Option<Category>, sqlx::Error>;

    /// Get a subcategory (`parent_id IS NOT NULL`) by id.
    async fn get_subcategory(&self, id: i64) -> Result<Option<Category>, sqlx::Error>;

    /// All category rows, top-level and subcategories alike.
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error>;

    /// Subcategories of one parent.
    async fn list_subcategories(&self, parent_id: i64) -> Result<Vec<Category>, sqlx::Error>;

    /// Insert a category; `parent_id` is None for top-level rows.
    async fn save_category(
        &self,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<Category, sqlx::Error>;

    /// Delete a top-level category, reassigning its products to the
    /// fallback category and removing its subcategories, in one transaction.
    async fn delete_category(&self, id: i64) -> Result<CategoryDeletion, sqlx::Error>;

    /// Delete a subcategory. No reassignment: products reference top-level
    /// categories for ownership, subcategories only as a secondary filter.
    async fn delete_subcategory(&self, id: i64) -> Result<Category, sqlx::Error>;
}

const CATEGORY_COLUMNS: &str = "id, name, slug, parent_id, created_at";

impl CategoryExt for DBClient {
    async fn get_top_level_category(&self, id: i64) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND parent_id IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_subcategory(&self, id: i64) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND parent_id IS NOT NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn list_subcategories(&self, parent_id: i64) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE parent_id = $1 ORDER BY name"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn save_category(
        &self,
        name: &str,
        slug: &str,
        parent_id: Option<i64>,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, slug, parent_id) VALUES ($1, $2, $3) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(name)
        .bind(slug)
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_category(&self, id: i64) -> Result<CategoryDeletion, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so a concurrent delete of the same category serializes
        // behind this transaction instead of double-reporting.
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE id = $1 AND parent_id IS NULL FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let mut reassigned = 0u64;
        if product_count > 0 {
            let fallback_id = resolve_fallback_category(&mut tx).await?;
            reassigned = sqlx::query(
                "UPDATE products SET category_id = $1, subcategory_id = NULL, updated_at = Now() \
                 WHERE category_id = $2",
            )
            .bind(fallback_id)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        // Products from other categories may still point at a subcategory of
        // this one; clear those references before the rows go away.
        sqlx::query(
            "UPDATE products SET subcategory_id = NULL, updated_at = Now() \
             WHERE subcategory_id IN (SELECT id FROM categories WHERE parent_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM categories WHERE parent_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            // Existence was checked under lock above; zero rows here means
            // something is badly wrong, not a missing category.
            return Err(sqlx::Error::Protocol(
                "category delete affected no rows".into(),
            ));
        }

        tx.commit().await?;

        Ok(CategoryDeletion {
            name: category.name,
            reassigned,
        })
    }

    async fn delete_subcategory(&self, id: i64) -> Result<Category, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let subcategory = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE id = $1 AND parent_id IS NOT NULL FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        sqlx::query("UPDATE products SET subcategory_id = NULL, updated_at = Now() \
                     WHERE subcategory_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(subcategory)
    }
}

/// Find the fallback category, creating it if this is the first deletion to
/// need it. Runs inside the delete transaction; the unique slug constraint
/// makes the lazy create race-safe across concurrent deletions.
async fn resolve_fallback_category(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM categories \
         WHERE LOWER(name) IN ('falta categoria', 'falta categoría') LIMIT 1",
    )
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    sqlx::query_scalar(
        "INSERT INTO categories (name, slug) VALUES ($1, $2) \
         ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug \
         RETURNING id",
    )
    .bind(FALLBACK_CATEGORY_NAME)
    .bind(FALLBACK_CATEGORY_SLUG)
    .fetch_one(&mut **tx)
    .await
}
