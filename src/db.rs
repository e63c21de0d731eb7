use sqlx::{Pool, Postgres};

pub mod scheduler;

mod category;
pub use category::{CategoryDeletion, CategoryExt, FALLBACK_CATEGORY_NAME};

mod product;
pub use product::{ColorDeletion, ImageDeletion, ProductDeletion, ProductExt};

mod notification;
pub use notification::NotificationExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}
impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}
