use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account allowed to sign in to the administration backend
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    /// Only ever a hash; the clear password is never persisted
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role tag, e.g. "almoxarifado" or "producao"
    #[sea_orm(column_name = "tipo_usuario")]
    pub role: String,
    #[sea_orm(column_name = "ativo")]
    pub active: bool,
    #[sea_orm(column_name = "data_criacao")]
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
