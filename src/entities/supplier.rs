use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier of products
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fornecedores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "nome")]
    pub name: String,
    #[sea_orm(column_name = "contato")]
    pub contact: Option<String>,
    #[sea_orm(column_name = "telefone")]
    pub phone: Option<String>,
    pub email: Option<String>,
    #[sea_orm(column_name = "endereco")]
    pub address: Option<String>,
    #[sea_orm(column_name = "ativo")]
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
