use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Construction site that stock is sent to
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "obras")]
#[validate(schema(function = "validate_work_dates"))]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "nome")]
    pub name: String,
    #[sea_orm(column_name = "endereco")]
    pub address: Option<String>,
    #[sea_orm(column_name = "responsavel")]
    pub responsible: Option<String>,
    #[sea_orm(column_name = "ativa")]
    pub active: bool,
    #[sea_orm(column_name = "data_inicio")]
    pub start_date: Option<NaiveDate>,
    #[sea_orm(column_name = "data_fim")]
    pub end_date: Option<NaiveDate>,
}

/// A work cannot end before it starts.
fn validate_work_dates(work: &Model) -> Result<(), ValidationError> {
    match (work.start_date, work.end_date) {
        (Some(start), Some(end)) if end < start => {
            let mut err = ValidationError::new("work_dates");
            err.message = Some(format!("end date {} precedes start date {}", end, start).into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movement::Entity")]
    Movements,
}

impl Related<super::movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
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
            return Err(DbErr::Custom(format!("Validation error on work {}: {}", model.id, err)));
        }

        Ok(self)
    }
}
