use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stocked product
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "produtos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "codigo")]
    pub code: String,
    #[sea_orm(column_name = "nome")]
    pub name: String,
    #[sea_orm(column_name = "descricao")]
    pub description: Option<String>,
    #[sea_orm(column_name = "categoria_id")]
    pub category_id: Option<i32>,
    #[sea_orm(column_name = "fornecedor_id")]
    pub supplier_id: Option<i32>,
    #[sea_orm(column_name = "preco")]
    pub unit_price: f64,
    #[sea_orm(column_name = "unidade_medida")]
    pub unit_of_measure: String,
    /// Reorder threshold; not checked against the stock level here
    #[sea_orm(column_name = "estoque_minimo")]
    pub minimum_stock: i32,
    #[sea_orm(column_name = "quantidade_estoque")]
    pub stock_quantity: i32,
    #[sea_orm(column_name = "local_produto")]
    pub location: Option<String>,
    #[sea_orm(column_name = "ativo")]
    pub active: bool,
    #[sea_orm(column_name = "data_cadastro")]
    pub registered_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
