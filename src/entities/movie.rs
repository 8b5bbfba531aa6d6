use sea_orm::{ActiveValue::Set, entity::prelude::*};
use serde::Serialize;

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub duration: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// Builds a change set holding only the columns present in `payload`.
    /// Keys outside the movie columns are ignored; callers validate first.
    ///
    /// Falsy values skip the update type check, so a value can still reach
    /// this point with the wrong type (`""` for a number, `false`). Those are
    /// rejected and nothing is written. Only JSON `null` stores NULL.
    pub fn from_payload(payload: &serde_json::Map<String, serde_json::Value>) -> AppResult<Self> {
        let mut model = Self::new();
        for (key, value) in payload {
            match key.as_str() {
                "name" => model.name = Set(text(key, value)?),
                "description" => model.description = Set(text(key, value)?),
                "duration" => model.duration = Set(number(key, value)?),
                "price" => model.price = Set(number(key, value)?),
                _ => {},
            }
        }
        Ok(model)
    }
}

fn text(column: &str, value: &serde_json::Value) -> AppResult<Option<String>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s.clone())),
        _ => Err(mismatch(column, "string")),
    }
}

fn number(column: &str, value: &serde_json::Value) -> AppResult<Option<f64>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| mismatch(column, "number")),
        _ => Err(mismatch(column, "number")),
    }
}

fn mismatch(column: &str, kind: &str) -> AppError {
    AppError::validation(format!(r#"Type of "{column}" must be {kind}"#))
}
