use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(project_routes())
        .merge(file_routes(config))
        .routes(routes!(handlers::health::health))
}

fn project_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::project::list_projects,
            handlers::project::create_project
        ))
        .routes(routes!(
            handlers::project::get_project,
            handlers::project::update_project,
            handlers::project::delete_project
        ))
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::file::list_files,
            handlers::file::create_file
        ))
        .routes(routes!(
            handlers::file::get_file,
            handlers::file::update_file,
            handlers::file::delete_file
        ))
        .layer(handlers::file::upload_body_limit(
            config.storage.max_blob_size,
        ))
}
