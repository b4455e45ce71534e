use crate::core::{DbContext, DbError};

/// Returns `false` when the `(image_url, line_item)` pair was already stored.
pub async fn insert_image(db: &DbContext, image_url: &str, line_item_row_id: Option<i64>) -> Result<bool, DbError> {
    let result = sqlx::query(
        r#"
        INSERT INTO images (image_url, line_item_id)
        VALUES (?, ?)
        ON CONFLICT (image_url, line_item_id) DO NOTHING
        "#,
    )
    .bind(image_url)
    .bind(line_item_row_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

