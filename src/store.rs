use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    pagination::Pagination,
    validation::Payload,
};

/// Single-table adapter over `movies`. Cheap to clone; every clone shares
/// the same connection.
#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<movie::Model>> {
        Ok(movie::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<movie::Model>> {
        let found =
            movie::Entity::find().filter(movie::Column::Name.eq(name)).one(&self.db).await?;
        Ok(found)
    }

    pub async fn insert(&self, payload: &Payload) -> AppResult<movie::Model> {
        movie::ActiveModel::from_payload(payload)?
            .insert(&self.db)
            .await
            .map_err(|err| name_conflict(err, payload))
    }

    /// Writes only the columns present in `payload`. `None` when the row is
    /// gone by the time the statement runs.
    pub async fn update(&self, id: i32, payload: &Payload) -> AppResult<Option<movie::Model>> {
        let mut changes = movie::ActiveModel::from_payload(payload)?;
        changes.id = Unchanged(id);

        match changes.update(&self.db).await {
            Ok(model) => Ok(Some(model)),
            Err(DbErr::RecordNotUpdated | DbErr::RecordNotFound(_)) => Ok(None),
            Err(err) => Err(name_conflict(err, payload)),
        }
    }

    /// Returns the number of rows removed.
    pub async fn delete(&self, id: i32) -> AppResult<u64> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected)
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(movie::Entity::find().count(&self.db).await?)
    }

    pub async fn page(&self, window: &Pagination) -> AppResult<Vec<movie::Model>> {
        let mut query = movie::Entity::find();
        if let Some(field) = window.sort {
            query = query.order_by(field.column(), window.order.into());
        }

        let rows = query
            .order_by_asc(movie::Column::Id)
            .limit(window.limit())
            .offset(window.offset)
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

/// The unique index on `name` catches what the request-time duplicate check
/// races past.
fn name_conflict(err: DbErr, payload: &Payload) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            let name = payload.get("name").and_then(|v| v.as_str()).unwrap_or_default();
            AppError::duplicate_name(name)
        },
        _ => err.into(),
    }
}
