use axum::{
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use cinedex_dal::movie::{CreateMovie, MovieRepository, UpdateMovie};
use http::{header, StatusCode};
use tracing::debug;

use super::{method_not_allowed, ExpectedVersion, ResourceId};
use crate::{
    decode::StrictJson, envelope::Envelope, error::ApiResult, repository_from_request,
    state::AppState,
};

pub const BASE_PATH: &str = "/v1/movies";

repository_from_request!(MovieRepository);

pub async fn create(
    repository: MovieRepository,
    StrictJson(payload): StrictJson<CreateMovie>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    let movie = repository.insert(payload).await?;
    let location = format!("{BASE_PATH}/{}", movie.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Envelope::new("movie", movie),
    ))
}

pub async fn show(
    ResourceId(id): ResourceId,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    let movie = repository.get(id).await?;
    Ok(Envelope::new("movie", movie))
}

pub async fn update(
    ResourceId(id): ResourceId,
    ExpectedVersion(expected_version): ExpectedVersion,
    repository: MovieRepository,
    StrictJson(payload): StrictJson<UpdateMovie>,
) -> ApiResult<impl IntoResponse> {
    let mut movie = repository.get(id).await?;
    if let Some(version) = expected_version {
        debug!(
            "Update of movie {id} expects version {version}, stored is {}",
            movie.version
        );
        movie.version = version;
    }
    movie.merge(payload);
    movie.validate()?;
    let movie = repository.update(&movie).await?;

    Ok(Envelope::new("movie", movie))
}

pub async fn delete(
    ResourceId(id): ResourceId,
    repository: MovieRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route(
            "/{id}",
            get(show).put(update).patch(update).delete(delete),
        )
        .method_not_allowed_fallback(method_not_allowed)
}
