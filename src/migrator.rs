use sea_orm_migration::prelude::*;

/// Target schema of the inventory store.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_inventory_tables::Migration)]
    }
}

mod m20240101_000001_create_inventory_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Parents first so every foreign key points at an existing table
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Users::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Users::Username)
                                .string_len(80)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Email).string_len(120).not_null())
                        .col(ColumnDef::new(Users::PasswordHash).text().not_null())
                        .col(
                            ColumnDef::new(Users::TipoUsuario)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Users::DataCriacao).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Categorias::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categorias::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Categorias::Nome).string_len(100).not_null())
                        .col(ColumnDef::new(Categorias::Descricao).text().null())
                        .col(
                            ColumnDef::new(Categorias::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Fornecedores::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Fornecedores::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Fornecedores::Nome)
                                .string_len(200)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Fornecedores::Contato).string_len(100).null())
                        .col(ColumnDef::new(Fornecedores::Telefone).string_len(20).null())
                        .col(ColumnDef::new(Fornecedores::Email).string_len(120).null())
                        .col(ColumnDef::new(Fornecedores::Endereco).text().null())
                        .col(
                            ColumnDef::new(Fornecedores::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Funcionarios::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Funcionarios::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Funcionarios::Nome)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Funcionarios::Cargo).string_len(100).null())
                        .col(
                            ColumnDef::new(Funcionarios::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Obras::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Obras::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Obras::Nome).string_len(200).not_null())
                        .col(ColumnDef::new(Obras::Endereco).text().null())
                        .col(ColumnDef::new(Obras::Responsavel).string_len(100).null())
                        .col(
                            ColumnDef::new(Obras::Ativa)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Obras::DataInicio).date().null())
                        .col(ColumnDef::new(Obras::DataFim).date().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Produtos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Produtos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Produtos::Codigo).string_len(50).not_null())
                        .col(ColumnDef::new(Produtos::Nome).string_len(200).not_null())
                        .col(ColumnDef::new(Produtos::Descricao).text().null())
                        .col(ColumnDef::new(Produtos::CategoriaId).integer().null())
                        .col(ColumnDef::new(Produtos::FornecedorId).integer().null())
                        .col(
                            ColumnDef::new(Produtos::Preco)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(Produtos::UnidadeMedida)
                                .string_len(20)
                                .not_null()
                                .default("unidade"),
                        )
                        .col(
                            ColumnDef::new(Produtos::EstoqueMinimo)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Produtos::QuantidadeEstoque)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Produtos::LocalProduto).string_len(100).null())
                        .col(
                            ColumnDef::new(Produtos::Ativo)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Produtos::DataCadastro).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_produtos_categoria_id")
                                .from(Produtos::Table, Produtos::CategoriaId)
                                .to(Categorias::Table, Categorias::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_produtos_fornecedor_id")
                                .from(Produtos::Table, Produtos::FornecedorId)
                                .to(Fornecedores::Table, Fornecedores::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Movimentacoes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Movimentacoes::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Movimentacoes::ProdutoId).integer().not_null())
                        .col(ColumnDef::new(Movimentacoes::ObraId).integer().null())
                        .col(ColumnDef::new(Movimentacoes::FuncionarioId).integer().null())
                        .col(
                            ColumnDef::new(Movimentacoes::TipoMovimentacao)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Movimentacoes::Quantidade).integer().not_null())
                        .col(
                            ColumnDef::new(Movimentacoes::ValorUnitario)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(
                            ColumnDef::new(Movimentacoes::ValorTotal)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(ColumnDef::new(Movimentacoes::Observacoes).text().null())
                        .col(
                            ColumnDef::new(Movimentacoes::DataMovimentacao)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_movimentacoes_produto_id")
                                .from(Movimentacoes::Table, Movimentacoes::ProdutoId)
                                .to(Produtos::Table, Produtos::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_movimentacoes_obra_id")
                                .from(Movimentacoes::Table, Movimentacoes::ObraId)
                                .to(Obras::Table, Obras::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_movimentacoes_funcionario_id")
                                .from(Movimentacoes::Table, Movimentacoes::FuncionarioId)
                                .to(Funcionarios::Table, Funcionarios::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movimentacoes_produto_id")
                        .table(Movimentacoes::Table)
                        .col(Movimentacoes::ProdutoId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_produtos_codigo")
                        .table(Produtos::Table)
                        .col(Produtos::Codigo)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Children first
            manager
                .drop_table(Table::drop().table(Movimentacoes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Produtos::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Obras::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Funcionarios::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Fornecedores::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Categorias::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Username,
        Email,
        PasswordHash,
        TipoUsuario,
        Ativo,
        DataCriacao,
    }

    #[derive(DeriveIden)]
    enum Categorias {
        Table,
        Id,
        Nome,
        Descricao,
        Ativo,
    }

    #[derive(DeriveIden)]
    enum Fornecedores {
        Table,
        Id,
        Nome,
        Contato,
        Telefone,
        Email,
        Endereco,
        Ativo,
    }

    #[derive(DeriveIden)]
    enum Funcionarios {
        Table,
        Id,
        Nome,
        Cargo,
        Ativo,
    }

    #[derive(DeriveIden)]
    enum Obras {
        Table,
        Id,
        Nome,
        Endereco,
        Responsavel,
        Ativa,
        DataInicio,
        DataFim,
    }

    #[derive(DeriveIden)]
    enum Produtos {
        Table,
        Id,
        Codigo,
        Nome,
        Descricao,
        CategoriaId,
        FornecedorId,
        Preco,
        UnidadeMedida,
        EstoqueMinimo,
        QuantidadeEstoque,
        LocalProduto,
        Ativo,
        DataCadastro,
    }

    #[derive(DeriveIden)]
    enum Movimentacoes {
        Table,
        Id,
        ProdutoId,
        ObraId,
        FuncionarioId,
        TipoMovimentacao,
        Quantidade,
        ValorUnitario,
        ValorTotal,
        Observacoes,
        DataMovimentacao,
    }
}
