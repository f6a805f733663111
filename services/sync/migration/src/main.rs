use sea_orm_migration::prelude::*;

use roadwatch_sync_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
