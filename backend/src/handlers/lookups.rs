use axum::{extract::State, Json};

use crate::{
    error::AppError,
    repositories::{EmployeeRepository, EmployeeRepositoryTrait},
    state::AppState,
};

/// Distinct non-empty cities. Also served as `/api/ciudades`.
pub async fn cities(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let cities = EmployeeRepository::new().distinct_cities(&state.pool).await?;
    Ok(Json(cities))
}

pub async fn fleets(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let fleets = EmployeeRepository::new().distinct_fleets(&state.pool).await?;
    Ok(Json(fleets))
}
