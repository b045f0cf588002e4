use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Subject id of the identity that created the project. Never changes.
    pub owner_id: String,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(has_many)]
    pub files: HasMany<super::file::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
