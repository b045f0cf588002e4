//! Relational access to project and file rows.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{file, project};
use crate::error::AppError;

pub async fn find_project<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<project::Model, AppError> {
    project::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

pub async fn find_file<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<file::Model, AppError> {
    file::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

/// Projects owned by `owner_id`, newest first.
pub async fn list_projects_for_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
) -> Result<Vec<project::Model>, DbErr> {
    project::Entity::find()
        .filter(project::Column::OwnerId.eq(owner_id))
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .all(db)
        .await
}

/// Files of a project in creation order.
pub async fn list_files_for_project<C: ConnectionTrait>(
    db: &C,
    project_id: i32,
) -> Result<Vec<file::Model>, DbErr> {
    file::Entity::find()
        .filter(file::Column::ProjectId.eq(project_id))
        .order_by_asc(file::Column::CreatedAt)
        .order_by_asc(file::Column::Id)
        .all(db)
        .await
}

/// Returns the number of rows removed (0 if the row was already gone).
pub async fn delete_file_row<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    let result = file::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected)
}

/// Remove every file row of the project and the project row in one transaction.
///
/// Either all rows are gone afterwards or none are. Returns the file rows
/// that were removed, which may include rows inserted after the caller last
/// listed the project.
pub async fn delete_project_cascade<C: TransactionTrait<Transaction = DatabaseTransaction>>(
    db: &C,
    project_id: i32,
) -> Result<Vec<file::Model>, AppError> {
    let txn = db.begin().await?;

    match cascade(&txn, project_id).await {
        Ok(Some(removed)) => {
            txn.commit().await?;
            Ok(removed)
        }
        Ok(None) => {
            rollback(txn, project_id).await;
            Err(AppError::NotFound("Project not found".into()))
        }
        Err(err) => {
            rollback(txn, project_id).await;
            Err(err.into())
        }
    }
}

async fn cascade(
    txn: &DatabaseTransaction,
    project_id: i32,
) -> Result<Option<Vec<file::Model>>, DbErr> {
    let files = file::Entity::find()
        .filter(file::Column::ProjectId.eq(project_id))
        .all(txn)
        .await?;

    file::Entity::delete_many()
        .filter(file::Column::ProjectId.eq(project_id))
        .exec(txn)
        .await?;

    let project = project::Entity::delete_by_id(project_id).exec(txn).await?;
    if project.rows_affected == 0 {
        return Ok(None);
    }
    Ok(Some(files))
}

async fn rollback(txn: DatabaseTransaction, project_id: i32) {
    if let Err(err) = txn.rollback().await {
        tracing::warn!(project_id, error = %err, "Failed to roll back project delete");
    }
}
