//! Target entities of the inventory store.
//!
//! Table and column names follow the legacy store so that rows can be copied
//! across unchanged; Rust field names are English.

pub mod category;
pub mod employee;
pub mod movement;
pub mod product;
pub mod supplier;
pub mod user;
pub mod work;

pub use category::{ActiveModel as CategoryActiveModel, Entity as Category, Model as CategoryModel};
pub use employee::{ActiveModel as EmployeeActiveModel, Entity as Employee, Model as EmployeeModel};
pub use movement::{ActiveModel as MovementActiveModel, Entity as Movement, Model as MovementModel};
pub use product::{ActiveModel as ProductActiveModel, Entity as Product, Model as ProductModel};
pub use supplier::{ActiveModel as SupplierActiveModel, Entity as Supplier, Model as SupplierModel};
pub use user::{ActiveModel as UserActiveModel, Entity as User, Model as UserModel};
pub use work::{ActiveModel as WorkActiveModel, Entity as Work, Model as WorkModel};
