//! Field-by-field mapping of legacy rows onto target active models.
//!
//! Optional columns that are absent or NULL take their value from
//! [`RowDefaults`]; required ones produce a [`MappingError`].

use chrono::{NaiveDateTime, Utc};
use sea_orm::Set;

use crate::entities::{
    CategoryActiveModel, EmployeeActiveModel, MovementActiveModel, ProductActiveModel,
    SupplierActiveModel, UserActiveModel, WorkActiveModel,
};
use crate::errors::MappingError;
use crate::legacy::LegacyRow;

pub const DEFAULT_ACTIVE: bool = true;
pub const DEFAULT_UNIT_OF_MEASURE: &str = "unidade";
pub const DEFAULT_STOCK: i32 = 0;
pub const DEFAULT_AMOUNT: f64 = 0.0;

/// Values substituted for optional columns missing from a legacy row.
///
/// `now` is captured once per pass so that every defaulted timestamp of one
/// migration carries the same instant.
#[derive(Debug, Clone, Copy)]
pub struct RowDefaults {
    pub now: NaiveDateTime,
}

impl RowDefaults {
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }
}

impl Default for RowDefaults {
    fn default() -> Self {
        Self::at(Utc::now().naive_utc())
    }
}

pub fn map_user(row: &LegacyRow, defaults: &RowDefaults) -> Result<UserActiveModel, MappingError> {
    Ok(UserActiveModel {
        id: Set(row.require_int("id")?),
        username: Set(row.require_text("username")?),
        email: Set(row.require_text("email")?),
        password_hash: Set(row.require_text("password_hash")?),
        role: Set(row.require_text("tipo_usuario")?),
        active: Set(row.flag("ativo")?.unwrap_or(DEFAULT_ACTIVE)),
        created_at: Set(row.timestamp("data_criacao")?.unwrap_or(defaults.now)),
    })
}

pub fn map_category(row: &LegacyRow) -> Result<CategoryActiveModel, MappingError> {
    Ok(CategoryActiveModel {
        id: Set(row.require_int("id")?),
        name: Set(row.require_text("nome")?),
        description: Set(row.text("descricao")?),
        active: Set(row.flag("ativo")?.unwrap_or(DEFAULT_ACTIVE)),
    })
}

pub fn map_supplier(row: &LegacyRow) -> Result<SupplierActiveModel, MappingError> {
    Ok(SupplierActiveModel {
        id: Set(row.require_int("id")?),
        name: Set(row.require_text("nome")?),
        contact: Set(row.text("contato")?),
        phone: Set(row.text("telefone")?),
        email: Set(row.text("email")?),
        address: Set(row.text("endereco")?),
        active: Set(row.flag("ativo")?.unwrap_or(DEFAULT_ACTIVE)),
    })
}

pub fn map_employee(row: &LegacyRow) -> Result<EmployeeActiveModel, MappingError> {
    Ok(EmployeeActiveModel {
        id: Set(row.require_int("id")?),
        name: Set(row.require_text("nome")?),
        role: Set(row.text("cargo")?),
        active: Set(row.flag("ativo")?.unwrap_or(DEFAULT_ACTIVE)),
    })
}

pub fn map_work(row: &LegacyRow) -> Result<WorkActiveModel, MappingError> {
    Ok(WorkActiveModel {
        id: Set(row.require_int("id")?),
        name: Set(row.require_text("nome")?),
        address: Set(row.text("endereco")?),
        responsible: Set(row.text("responsavel")?),
        active: Set(row.flag("ativa")?.unwrap_or(DEFAULT_ACTIVE)),
        start_date: Set(row.date("data_inicio")?),
        end_date: Set(row.date("data_fim")?),
    })
}

pub fn map_product(
    row: &LegacyRow,
    defaults: &RowDefaults,
) -> Result<ProductActiveModel, MappingError> {
    Ok(ProductActiveModel {
        id: Set(row.require_int("id")?),
        code: Set(row.require_text("codigo")?),
        name: Set(row.require_text("nome")?),
        description: Set(row.text("descricao")?),
        category_id: Set(row.int("categoria_id")?),
        supplier_id: Set(row.int("fornecedor_id")?),
        unit_price: Set(row.real("preco")?.unwrap_or(DEFAULT_AMOUNT)),
        unit_of_measure: Set(row
            .text("unidade_medida")?
            .unwrap_or_else(|| DEFAULT_UNIT_OF_MEASURE.to_string())),
        minimum_stock: Set(row.int("estoque_minimo")?.unwrap_or(DEFAULT_STOCK)),
        stock_quantity: Set(row.int("quantidade_estoque")?.unwrap_or(DEFAULT_STOCK)),
        location: Set(row.text("local_produto")?),
        active: Set(row.flag("ativo")?.unwrap_or(DEFAULT_ACTIVE)),
        registered_at: Set(row.timestamp("data_cadastro")?.unwrap_or(defaults.now)),
    })
}

/// `valor_total` is copied as recorded, never recomputed.
pub fn map_movement(
    row: &LegacyRow,
    defaults: &RowDefaults,
) -> Result<MovementActiveModel, MappingError> {
    Ok(MovementActiveModel {
        id: Set(row.require_int("id")?),
        product_id: Set(row.require_int("produto_id")?),
        work_id: Set(row.int("obra_id")?),
        employee_id: Set(row.int("funcionario_id")?),
        movement_type: Set(row.require_text("tipo_movimentacao")?),
        quantity: Set(row.require_int("quantidade")?),
        unit_value: Set(row.real("valor_unitario")?.unwrap_or(DEFAULT_AMOUNT)),
        total_value: Set(row.real("valor_total")?.unwrap_or(DEFAULT_AMOUNT)),
        notes: Set(row.text("observacoes")?),
        moved_at: Set(row.timestamp("data_movimentacao")?.unwrap_or(defaults.now)),
    })
}
