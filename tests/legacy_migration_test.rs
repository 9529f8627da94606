mod common;

use std::sync::Arc;
use std::time::Duration;

use almox_api::{
    db,
    entities::{Movement, Product, User, Work},
    errors::ServiceError,
    services::{LegacyMigrationService, MigrationOutcome, SkipReason, TableCopy},
};
use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::{count, counts, execute, scalar, LegacyFixture, FIVE_PRODUCTS, THREE_USERS};
use rstest::rstest;
use sea_orm::{EntityTrait, PaginatorTrait, TransactionTrait};

fn service(db: &Arc<db::DbPool>, legacy: &LegacyFixture) -> LegacyMigrationService {
    LegacyMigrationService::new(db.clone(), legacy.path.clone())
}

#[tokio::test]
async fn missing_legacy_store_is_skipped() {
    let (_, db) = common::target().await;
    let legacy = LegacyFixture::missing();

    let outcome = service(&db, &legacy).migrate().await.unwrap();

    assert_eq!(outcome, MigrationOutcome::Skipped(SkipReason::NoLegacySource));
    assert!(counts(&db).await.iter().all(|(_, n)| *n == 0));
}

#[tokio::test]
async fn populated_target_is_left_untouched() {
    let (_, db) = common::target().await;
    execute(
        &db,
        "INSERT INTO users (id, username, email, password_hash, tipo_usuario, ativo, data_criacao) \
         VALUES (42, 'existente', 'e@x.com', 'h', 'producao', 1, '2024-01-01 00:00:00')",
    )
    .await;
    let mut statements: Vec<&str> = THREE_USERS.to_vec();
    statements.extend_from_slice(&FIVE_PRODUCTS);
    let legacy = LegacyFixture::with_full_schema(&statements).await;
    let before = counts(&db).await;

    let migrator = service(&db, &legacy);
    let first = migrator.migrate().await.unwrap();
    let second = migrator.migrate().await.unwrap();

    assert_eq!(first, MigrationOutcome::Skipped(SkipReason::AlreadyPopulated));
    assert_eq!(second, first);
    assert_eq!(counts(&db).await, before);
}

#[tokio::test]
async fn three_users_and_five_products_are_copied_with_their_ids() {
    let (_, db) = common::target().await;
    let mut statements: Vec<&str> = THREE_USERS.to_vec();
    statements.extend_from_slice(&FIVE_PRODUCTS);
    let legacy = LegacyFixture::with_full_schema(&statements).await;

    let outcome = service(&db, &legacy).migrate().await.unwrap();

    let report = match outcome {
        MigrationOutcome::Migrated(report) => report,
        other => panic!("expected a migration, got {other:?}"),
    };
    assert_eq!(report.total(), 8);
    assert_eq!(report.table("users"), Some(TableCopy::Copied(3)));
    assert_eq!(report.table("categorias"), Some(TableCopy::Copied(0)));
    assert_eq!(report.table("produtos"), Some(TableCopy::Copied(5)));

    let carla = User::find_by_id(7).one(&*db).await.unwrap().unwrap();
    assert_eq!(carla.username, "carla");
    assert!(!carla.active);
    assert_eq!(carla.password_hash, "pbkdf2:sha256:1$e$f");

    let rebar = Product::find_by_id(4).one(&*db).await.unwrap().unwrap();
    assert_eq!(rebar.unit_price, 0.0);
    assert_eq!(rebar.unit_of_measure, "unidade");
    assert_eq!(rebar.stock_quantity, 0);
    assert!(rebar.active);

    let nails = Product::find_by_id(5).one(&*db).await.unwrap().unwrap();
    assert_eq!(nails.unit_price, 18.5);
    assert!(!nails.active);
    assert_eq!(
        nails.registered_at.date(),
        NaiveDate::from_ymd_opt(2023, 4, 2).unwrap()
    );
}

#[tokio::test]
async fn absent_tables_are_skipped_and_later_tables_still_copy() {
    let (_, db) = common::target().await;
    let mut statements: Vec<&str> = vec![common::LEGACY_SCHEMA[0], common::LEGACY_SCHEMA[5]];
    statements.extend_from_slice(&THREE_USERS);
    statements.extend_from_slice(&FIVE_PRODUCTS);
    let legacy = LegacyFixture::with_statements(&statements).await;

    let outcome = service(&db, &legacy).migrate().await.unwrap();

    let report = match outcome {
        MigrationOutcome::Migrated(report) => report,
        other => panic!("expected a migration, got {other:?}"),
    };
    for table in ["categorias", "fornecedores", "funcionarios", "obras", "movimentacoes"] {
        assert_eq!(report.table(table), Some(TableCopy::Absent), "{table}");
    }
    assert_eq!(count(&db, "produtos").await, 5);
    assert_eq!(count(&db, "users").await, 3);
}

#[tokio::test]
async fn missing_optional_columns_take_defaults() {
    let (_, db) = common::target().await;
    let legacy = LegacyFixture::with_statements(&[
        "CREATE TABLE obras (id INTEGER PRIMARY KEY, nome VARCHAR(200) NOT NULL)",
        "INSERT INTO obras VALUES (3, 'Residencial Aurora')",
    ])
    .await;

    service(&db, &legacy).migrate().await.unwrap();

    let work = Work::find_by_id(3).one(&*db).await.unwrap().unwrap();
    assert_eq!(work.name, "Residencial Aurora");
    assert!(work.active);
    assert_eq!(work.start_date, None);
    assert_eq!(work.end_date, None);
    assert_eq!(work.address, None);
}

#[tokio::test]
async fn full_dataset_keeps_every_reference_resolvable() {
    let (_, db) = common::target().await;
    let mut statements: Vec<&str> = THREE_USERS.to_vec();
    statements.extend_from_slice(&[
        "INSERT INTO categorias VALUES (1, 'Básicos', NULL, 1)",
        "INSERT INTO fornecedores VALUES (4, 'Casa do Construtor', 'Rui', '1199999', 'rui@cc.com', NULL, 1)",
        "INSERT INTO funcionarios VALUES (2, 'Pedro', 'Pedreiro', 1)",
        "INSERT INTO obras VALUES (5, 'Obra Centro', 'Rua A, 10', 'Marta', 1, '2023-01-01', '2023-12-31')",
        "INSERT INTO produtos VALUES (10, 'CIM-01', 'Cimento', NULL, 1, 4, 32.9, 'saco', 10, 40, NULL, 1, '2023-03-01 10:00:00')",
        "INSERT INTO movimentacoes VALUES (1, 10, 5, 2, 'saida', 4, 32.9, 131.6, 'entrega', '2023-05-01 14:00:00')",
        "INSERT INTO movimentacoes VALUES (2, 10, NULL, NULL, 'entrada', 20, 30.0, 999.0, NULL, NULL)",
    ]);
    let legacy = LegacyFixture::with_full_schema(&statements).await;

    let outcome = service(&db, &legacy).migrate().await.unwrap();
    assert_matches!(outcome, MigrationOutcome::Migrated(report) if report.total() == 10);

    let dangling = scalar(
        &db,
        "SELECT COUNT(*) FROM movimentacoes m \
         LEFT JOIN produtos p ON p.id = m.produto_id \
         LEFT JOIN obras o ON o.id = m.obra_id \
         LEFT JOIN funcionarios f ON f.id = m.funcionario_id \
         WHERE p.id IS NULL \
            OR (m.obra_id IS NOT NULL AND o.id IS NULL) \
            OR (m.funcionario_id IS NOT NULL AND f.id IS NULL)",
    )
    .await;
    assert_eq!(dangling, 0);

    let dangling_products = scalar(
        &db,
        "SELECT COUNT(*) FROM produtos p \
         LEFT JOIN categorias c ON c.id = p.categoria_id \
         LEFT JOIN fornecedores s ON s.id = p.fornecedor_id \
         WHERE (p.categoria_id IS NOT NULL AND c.id IS NULL) \
            OR (p.fornecedor_id IS NOT NULL AND s.id IS NULL)",
    )
    .await;
    assert_eq!(dangling_products, 0);

    // recorded totals are copied, not recomputed
    let restock = Movement::find_by_id(2).one(&*db).await.unwrap().unwrap();
    assert_eq!(restock.total_value, 999.0);
    assert_eq!(restock.work_id, None);
}

#[tokio::test]
async fn invalid_row_rolls_back_every_table() {
    let (_, db) = common::target().await;
    let mut statements: Vec<&str> = THREE_USERS.to_vec();
    statements.extend_from_slice(&FIVE_PRODUCTS);
    // quantity must be positive
    statements.push(
        "INSERT INTO movimentacoes VALUES (1, 1, NULL, NULL, 'saida', 0, 1.0, 0.0, NULL, NULL)",
    );
    let legacy = LegacyFixture::with_full_schema(&statements).await;

    let err = service(&db, &legacy).migrate().await.unwrap_err();

    assert_matches!(err, ServiceError::DatabaseError(_));
    assert!(counts(&db).await.iter().all(|(_, n)| *n == 0));
}

#[tokio::test]
async fn dangling_reference_rolls_back_every_table() {
    let (_, db) = common::target().await;
    let mut statements: Vec<&str> = THREE_USERS.to_vec();
    statements.extend_from_slice(&FIVE_PRODUCTS);
    statements.push(
        "INSERT INTO movimentacoes VALUES (1, 99, NULL, NULL, 'saida', 1, 1.0, 1.0, NULL, NULL)",
    );
    let legacy = LegacyFixture::with_full_schema(&statements).await;

    assert!(service(&db, &legacy).migrate().await.is_err());
    assert!(counts(&db).await.iter().all(|(_, n)| *n == 0));
}

#[tokio::test]
async fn unparseable_value_is_a_mapping_error() {
    let (_, db) = common::target().await;
    let legacy = LegacyFixture::with_full_schema(&[
        "INSERT INTO users VALUES (1, 'ana', 'ana@obra.com', 'h', 'almoxarifado', 1, 'ontem')",
    ])
    .await;

    let err = service(&db, &legacy).migrate().await.unwrap_err();

    assert_eq!(err.category(), "data_shape");
    assert!(err.to_string().contains("data_criacao"));
    assert_eq!(count(&db, "users").await, 0);
}

#[tokio::test]
async fn legacy_store_that_is_the_target_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");
    let pool = common::file_target(&path, Duration::from_secs(30)).await;

    let outcome = LegacyMigrationService::new(pool, path.clone())
        .with_target_path(Some(path))
        .migrate()
        .await
        .unwrap();

    assert_eq!(outcome, MigrationOutcome::Skipped(SkipReason::SourceIsTarget));
}

#[rstest]
#[case("dir with space")]
#[case("obra%20norte")]
#[case("backup#3")]
#[case("export?v=2")]
#[tokio::test]
async fn legacy_store_path_is_not_read_as_a_url(#[case] subdir: &str) {
    let (_, db) = common::target().await;
    let legacy = LegacyFixture::with_full_schema_under(subdir, &THREE_USERS).await;

    let outcome = service(&db, &legacy).migrate().await.unwrap();

    assert_matches!(outcome, MigrationOutcome::Migrated(report) if report.users_copied() == 3);
    assert_eq!(count(&db, "users").await, 3);
}

#[tokio::test]
async fn held_connection_surfaces_as_pool_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::file_target(&dir.path().join("app.db"), Duration::from_secs(1)).await;
    let legacy = LegacyFixture::with_full_schema(&THREE_USERS).await;

    let held = db.begin().await.unwrap();

    let err = ServiceError::from(User::find().count(&*db).await.unwrap_err());
    assert_matches!(err, ServiceError::PoolExhausted);
    let err = service(&db, &legacy).migrate().await.unwrap_err();
    assert_eq!(err.category(), "pool_exhausted");

    held.rollback().await.unwrap();
    assert_eq!(count(&db, "users").await, 0);
}
