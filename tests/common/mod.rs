#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use almox_api::{
    config::{AppConfig, RunEnvironment},
    db::{self, DatabaseTarget, DbConfig, DbPool},
    services::{BootstrapGuard, LegacyMigrationService, SeederService},
};
use sea_orm::{ConnectionTrait, DatabaseBackend as DbBackend, Statement};
use tempfile::TempDir;

/// Legacy schema as the old application created it.
pub const LEGACY_SCHEMA: [&str; 7] = [
    r#"CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        username VARCHAR(80) NOT NULL UNIQUE,
        email VARCHAR(120) NOT NULL,
        password_hash VARCHAR(255),
        tipo_usuario VARCHAR(50),
        ativo BOOLEAN,
        data_criacao DATETIME
    )"#,
    r#"CREATE TABLE categorias (
        id INTEGER PRIMARY KEY,
        nome VARCHAR(100) NOT NULL,
        descricao TEXT,
        ativo BOOLEAN
    )"#,
    r#"CREATE TABLE fornecedores (
        id INTEGER PRIMARY KEY,
        nome VARCHAR(200) NOT NULL,
        contato VARCHAR(100),
        telefone VARCHAR(20),
        email VARCHAR(120),
        endereco TEXT,
        ativo BOOLEAN
    )"#,
    r#"CREATE TABLE funcionarios (
        id INTEGER PRIMARY KEY,
        nome VARCHAR(100) NOT NULL,
        cargo VARCHAR(100),
        ativo BOOLEAN
    )"#,
    r#"CREATE TABLE obras (
        id INTEGER PRIMARY KEY,
        nome VARCHAR(200) NOT NULL,
        endereco TEXT,
        responsavel VARCHAR(100),
        ativa BOOLEAN,
        data_inicio DATE,
        data_fim DATE
    )"#,
    r#"CREATE TABLE produtos (
        id INTEGER PRIMARY KEY,
        codigo VARCHAR(50) NOT NULL,
        nome VARCHAR(200) NOT NULL,
        descricao TEXT,
        categoria_id INTEGER,
        fornecedor_id INTEGER,
        preco NUMERIC(10, 2),
        unidade_medida VARCHAR(20),
        estoque_minimo INTEGER,
        quantidade_estoque INTEGER,
        local_produto VARCHAR(100),
        ativo BOOLEAN,
        data_cadastro DATETIME
    )"#,
    r#"CREATE TABLE movimentacoes (
        id INTEGER PRIMARY KEY,
        produto_id INTEGER NOT NULL,
        obra_id INTEGER,
        funcionario_id INTEGER,
        tipo_movimentacao VARCHAR(20) NOT NULL,
        quantidade INTEGER NOT NULL,
        valor_unitario NUMERIC(10, 2),
        valor_total NUMERIC(10, 2),
        observacoes TEXT,
        data_movimentacao DATETIME
    )"#,
];

/// Legacy store written to a temporary directory.
pub struct LegacyFixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl LegacyFixture {
    /// Location of a legacy store that was never created.
    pub fn missing() -> Self {
        Self::missing_under("database")
    }

    /// Like [`LegacyFixture::missing`], with the store under `subdir`.
    pub fn missing_under(subdir: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(subdir).join("app.db");
        Self { _dir: dir, path }
    }

    /// Store holding the full legacy schema plus `statements`.
    pub async fn with_full_schema(statements: &[&str]) -> Self {
        Self::with_full_schema_under("database", statements).await
    }

    pub async fn with_full_schema_under(subdir: &str, statements: &[&str]) -> Self {
        let mut all: Vec<&str> = LEGACY_SCHEMA.to_vec();
        all.extend_from_slice(statements);
        Self::write(Self::missing_under(subdir), &all).await
    }

    /// Store built from raw statements only.
    pub async fn with_statements(statements: &[&str]) -> Self {
        Self::write(Self::missing(), statements).await
    }

    async fn write(fixture: Self, statements: &[&str]) -> Self {
        std::fs::create_dir_all(fixture.path.parent().expect("fixture has a parent dir"))
            .expect("create legacy dir");

        let pool = DbConfig {
            max_connections: 1,
            ..Default::default()
        };
        let conn = db::connect_sqlite(db::url::sqlite_file_options(&fixture.path), &pool)
            .await
            .expect("open legacy fixture");
        for sql in statements {
            conn.execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
                .await
                .unwrap_or_else(|e| panic!("legacy fixture statement failed: {e}\n{sql}"));
        }
        conn.close().await.expect("close legacy fixture");

        fixture
    }
}

/// Fresh in-memory target with the schema applied.
pub async fn target() -> (DatabaseTarget, Arc<DbPool>) {
    let (target, pool) = bare_target().await;
    db::run_migrations(&pool).await.expect("apply target schema");
    (target, pool)
}

/// Fresh in-memory target without any table.
pub async fn bare_target() -> (DatabaseTarget, Arc<DbPool>) {
    let cfg = AppConfig::new(RunEnvironment::Testing);
    let (target, pool) = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("connect in-memory target");
    (target, Arc::new(pool))
}

/// Single-connection target stored at `path`, schema applied.
pub async fn file_target(path: &Path, acquire_timeout: Duration) -> Arc<DbPool> {
    let pool = db::establish_connection_with_config(&DbConfig {
        sqlite_file: Some(path.to_path_buf()),
        max_connections: 1,
        acquire_timeout,
        ..Default::default()
    })
    .await
    .expect("open file target");
    db::run_migrations(&pool).await.expect("apply target schema");
    Arc::new(pool)
}

pub fn guard(db: &Arc<DbPool>, legacy: &LegacyFixture) -> BootstrapGuard {
    BootstrapGuard::new(
        LegacyMigrationService::new(db.clone(), legacy.path.clone()),
        SeederService::new(db.clone(), "almox"),
    )
}

pub async fn execute(db: &DbPool, sql: &str) {
    db.execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
        .await
        .unwrap_or_else(|e| panic!("statement failed: {e}\n{sql}"));
}

pub async fn scalar(db: &DbPool, sql: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
        .await
        .expect("query")
        .expect("one row");
    row.try_get_by_index(0).expect("integer result")
}

pub async fn count(db: &DbPool, table: &str) -> i64 {
    scalar(db, &format!("SELECT COUNT(*) FROM {table}")).await
}

/// Row counts of every target table, in copy order.
pub async fn counts(db: &DbPool) -> Vec<(String, i64)> {
    let mut out = Vec::new();
    for table in almox_api::services::legacy_migration::COPY_ORDER {
        out.push((table.to_string(), count(db, table).await));
    }
    out
}

pub const THREE_USERS: [&str; 3] = [
    "INSERT INTO users VALUES (1, 'ana', 'ana@obra.com', 'pbkdf2:sha256:1$a$b', 'almoxarifado', 1, '2023-01-10 08:00:00.000000')",
    "INSERT INTO users VALUES (2, 'bruno', 'bruno@obra.com', 'pbkdf2:sha256:1$c$d', 'producao', 1, '2023-02-11 09:30:00')",
    "INSERT INTO users VALUES (7, 'carla', 'carla@obra.com', 'pbkdf2:sha256:1$e$f', 'producao', 0, NULL)",
];

pub const FIVE_PRODUCTS: [&str; 5] = [
    "INSERT INTO produtos VALUES (1, 'CIM-01', 'Cimento CP II', NULL, NULL, NULL, 32.9, 'saco', 10, 40, 'A1', 1, '2023-03-01 10:00:00')",
    "INSERT INTO produtos VALUES (2, 'ARE-01', 'Areia média', NULL, NULL, NULL, 120, 'm3', 2, 5, NULL, 1, '2023-03-01 10:05:00')",
    "INSERT INTO produtos VALUES (3, 'TIJ-01', 'Tijolo 8 furos', NULL, NULL, NULL, 0.85, 'unidade', 500, 2000, 'B2', 1, NULL)",
    "INSERT INTO produtos VALUES (4, 'VER-10', 'Vergalhão 10mm', NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL, NULL)",
    "INSERT INTO produtos VALUES (5, 'PRE-01', 'Prego 17x21', 'caixa 1kg', NULL, NULL, 18.5, 'kg', 1, 12, 'C3', 0, '2023-04-02')",
];
