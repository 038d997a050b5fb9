use axum::{
    Json,
    extract::{FromRequest, Path, State},
    http::StatusCode,
};

use crate::{
    error::{AppResult, PersonError},
    models::{HealthResponse, PERSON_CREATED, Person, PersonPayload},
    state::AppState,
};

/// `Json` whose rejections are reported as validation errors.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(PersonError))]
pub struct Payload<T>(pub T);

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_persons(State(state): State<AppState>) -> AppResult<Json<Vec<Person>>> {
    let persons = state.persons.list().await?;
    Ok(Json(persons))
}

pub async fn create_person(
    State(state): State<AppState>,
    Payload(payload): Payload<PersonPayload>,
) -> AppResult<Json<&'static str>> {
    state.persons.create(payload).await?;
    Ok(Json(PERSON_CREATED))
}

pub async fn get_person(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<Person>> {
    let person = state.persons.get(&token).await?;
    Ok(Json(person))
}

pub async fn update_person(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Payload(payload): Payload<PersonPayload>,
) -> AppResult<Json<Person>> {
    let person = state.persons.update(&token, payload).await?;
    Ok(Json(person))
}

pub async fn delete_person(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<StatusCode> {
    state.persons.delete(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}
