use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    /// UUIDv7, assigned before the content is uploaded so the storage path can embed it.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub project_id: i32,
    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: HasOne<super::project::Entity>,

    pub file_name: String,

    /// Object key of the content blob. A row implies the blob should exist here.
    pub storage_path: String,

    /// MIME type guessed from `file_name`.
    pub content_type: Option<String>,

    /// Purposefully denormalized to avoid blob store round trips for list queries.
    pub size: i64,

    /// SHA-256 of the stored content.
    pub content_hash: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
