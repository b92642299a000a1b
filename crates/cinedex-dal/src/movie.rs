use cinedex_types::{
    validator::{unique, ValidationErrors, Validator},
    Runtime,
};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, Pool, Row};
use tracing::debug;

use crate::{ChosenRow, Error, error::Result};

const MAX_TITLE_BYTES: usize = 500;
const MIN_YEAR: i32 = 1888;
const MAX_GENRES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: time::PrimitiveDateTime,
    pub title: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub year: i32,
    #[serde(skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub version: i64,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl sqlx::FromRow<'_, ChosenRow> for Movie {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let genres: Json<Vec<String>> = row.try_get("genres")?;
        Ok(Movie {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            title: row.try_get("title")?,
            year: row.try_get("year")?,
            runtime: Runtime::new(row.try_get("runtime")?),
            genres: genres.0,
            version: row.try_get("version")?,
        })
    }
}

impl Movie {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_for_year(current_year())
    }

    pub fn validate_for_year(&self, current_year: i32) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        check_movie(
            &mut v,
            &self.title,
            self.year,
            self.runtime,
            Some(self.genres.as_slice()),
            current_year,
        );
        v.into_result()
    }

    /// Overwrites fields present in the payload, keeps the others
    pub fn merge(&mut self, payload: UpdateMovie) {
        if let Some(title) = payload.title {
            self.title = title;
        }
        if let Some(year) = payload.year {
            self.year = year;
        }
        if let Some(runtime) = payload.runtime {
            self.runtime = runtime;
        }
        if let Some(genres) = payload.genres {
            self.genres = genres;
        }
    }
}

/// Payload for a new movie. Missing keys take zero values and are then
/// reported by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Option<Vec<String>>,
}

impl CreateMovie {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_for_year(current_year())
    }

    pub fn validate_for_year(&self, current_year: i32) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        check_movie(
            &mut v,
            &self.title,
            self.year,
            self.runtime,
            self.genres.as_deref(),
            current_year,
        );
        v.into_result()
    }
}

/// Partial change of a movie, absent keys leave the stored value as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

fn check_movie(
    v: &mut Validator,
    title: &str,
    year: i32,
    runtime: Runtime,
    genres: Option<&[String]>,
    current_year: i32,
) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(year != 0, "year", "must be provided");
    v.check(year >= MIN_YEAR, "year", "must be greater than 1888");
    v.check(year <= current_year, "year", "must not be in the future");

    v.check(!runtime.is_zero(), "runtime", "must be provided");
    v.check(runtime.minutes() > 0, "runtime", "must be a positive integer");

    match genres {
        None => v.add_error("genres", "must be provided"),
        Some(genres) => {
            v.check(!genres.is_empty(), "genres", "must contain at least 1 genre");
            v.check(
                genres.len() <= MAX_GENRES,
                "genres",
                "must not contain more than 5 genres",
            );
            v.check(unique(genres), "genres", "must not contain duplicate values");
            v.check(
                genres.iter().all(|g| !g.is_empty()),
                "genres",
                "must not contain empty values",
            );
        }
    }
}

pub type MovieRepository = MovieRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Stores a new movie, the database assigns id, creation time and version 1
    pub async fn insert(&self, payload: CreateMovie) -> Result<Movie> {
        let genres = payload.genres.unwrap_or_default();
        let movie = sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (title, year, runtime, genres) VALUES (?, ?, ?, ?) \
            RETURNING id, created_at, title, year, runtime, genres, version",
        )
        .bind(&payload.title)
        .bind(payload.year)
        .bind(payload.runtime.minutes())
        .bind(Json(&genres))
        .fetch_one(&self.executor)
        .await?;
        debug!("Inserted movie {}", movie.id);
        Ok(movie)
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        if id < 1 {
            return Err(Error::RecordNotFound("Movie".to_string()));
        }
        sqlx::query_as::<_, Movie>(
            "SELECT id, created_at, title, year, runtime, genres, version FROM movies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.executor)
        .await?
        .ok_or_else(|| Error::RecordNotFound("Movie".to_string()))
    }

    /// Writes the movie only if the stored row still has the version the
    /// caller read, otherwise fails with [`Error::EditConflict`].
    /// On success the returned movie carries the new version.
    pub async fn update(&self, movie: &Movie) -> Result<Movie> {
        let new_version: Option<i64> = sqlx::query_scalar(
            "UPDATE movies SET title = ?, year = ?, runtime = ?, genres = ?, version = version + 1 \
            WHERE id = ? AND version = ? RETURNING version",
        )
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime.minutes())
        .bind(Json(&movie.genres))
        .bind(movie.id)
        .bind(movie.version)
        .fetch_optional(&self.executor)
        .await?;

        match new_version {
            Some(version) => Ok(Movie {
                version,
                ..movie.clone()
            }),
            None => {
                debug!(
                    "Conditional update of movie {} at version {} matched no row",
                    movie.id, movie.version
                );
                Err(Error::EditConflict {
                    id: movie.id,
                    version: movie.version,
                })
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if id < 1 {
            return Err(Error::RecordNotFound("Movie".to_string()));
        }
        let res = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Movie".to_string()))
        } else {
            Ok(())
        }
    }
}
