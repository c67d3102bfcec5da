pub use sea_orm_migration::prelude::*;

mod m20240108_093512_create_donation_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240108_093512_create_donation_table::Migration)]
    }
}
