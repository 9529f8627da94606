use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Stock ledger entry: product entering or leaving inventory
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "movimentacoes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "produto_id")]
    pub product_id: i32,
    #[sea_orm(column_name = "obra_id")]
    pub work_id: Option<i32>,
    #[sea_orm(column_name = "funcionario_id")]
    pub employee_id: Option<i32>,
    /// Direction tag as recorded by the legacy system (e.g. "entrada", "saida")
    #[sea_orm(column_name = "tipo_movimentacao")]
    pub movement_type: String,
    #[sea_orm(column_name = "quantidade")]
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
    #[sea_orm(column_name = "valor_unitario")]
    pub unit_value: f64,
    /// Stored as recorded; never recomputed from quantity and unit value
    #[sea_orm(column_name = "valor_total")]
    pub total_value: f64,
    #[sea_orm(column_name = "observacoes")]
    pub notes: Option<String>,
    #[sea_orm(column_name = "data_movimentacao")]
    pub moved_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::work::Entity",
        from = "Column::WorkId",
        to = "super::work::Column::Id"
    )]
    Work,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Work.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let model: Model = self.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!(
                "Validation error on movement {}: {}",
                model.id, err
            )));
        }

        Ok(self)
    }
}
