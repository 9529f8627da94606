// Bootstrap sequence
pub mod bootstrap;
pub mod seeder;

// Legacy store migration
pub mod legacy_mapping;
pub mod legacy_migration;

pub use bootstrap::{BootstrapGuard, BootstrapReport, BootstrapState, BootstrapStatus, MigrationStep};
pub use legacy_migration::{
    LegacyMigrationService, MigrationOutcome, MigrationReport, SkipReason, TableCopy,
};
pub use seeder::{SeedOutcome, SeederService};
