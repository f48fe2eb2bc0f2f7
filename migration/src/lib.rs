pub use sea_orm_migration::prelude::*;

mod m20260301_000001_initial;
mod m20260302_000001_add_classes_reviews_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_initial::Migration),
            Box::new(m20260302_000001_add_classes_reviews_messages::Migration),
        ]
    }
}
