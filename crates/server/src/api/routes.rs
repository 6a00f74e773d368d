use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{bulk, handlers, metadata, records, refresh};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(handlers::config))
        // catalog records
        .route("/records", get(records::list).post(records::create))
        .route(
            "/records/{id}",
            get(records::get)
                .patch(records::update)
                .delete(records::delete),
        )
        .route("/records/{id}/refresh", post(records::refresh))
        .route("/records/{id}/rematch", post(records::rematch))
        .route("/records/{id}/imdb", post(records::fetch_imdb))
        .route("/records/{id}/torrents", get(records::torrents))
        .route(
            "/records/{id}/torrents/refresh",
            post(records::refresh_torrents),
        )
        .route(
            "/records/{id}/poster",
            get(records::posters).put(records::change_poster),
        )
        .route("/locations/next", get(records::next_location))
        // metadata index
        .route("/metadata/search", get(metadata::search))
        .route("/metadata/movies/{id}", get(metadata::movie_details))
        // bulk intake
        .route(
            "/bulk",
            post(bulk::intake).get(bulk::current).delete(bulk::abandon),
        )
        .route("/bulk/search", get(bulk::research))
        .route("/bulk/items/{index}/accept", post(bulk::accept))
        .route("/bulk/items/{index}/remove", post(bulk::remove))
        .route("/bulk/items/{index}/restore", post(bulk::restore))
        .route("/bulk/commit", post(bulk::commit))
        // background refresh and maintenance
        .route("/refresh", post(refresh::start))
        .route("/refresh/{task_id}", get(refresh::progress))
        .route("/refresh/{task_id}/cancel", post(refresh::cancel))
        .route(
            "/maintenance/certifications",
            post(refresh::normalize_certifications),
        )
        .route(
            "/maintenance/torrent-flags",
            post(refresh::rebuild_torrent_flags),
        )
}
