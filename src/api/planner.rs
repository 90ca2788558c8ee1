use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use tracing::info;

use super::{ApiError, AppState};
use crate::models::{PlannerInputs, TripItinerary};
use crate::planner::{enrich_itineraries, generate_itineraries, validate_inputs};

pub fn router() -> Router<AppState> {
    Router::new().route("/planner/itineraries", post(plan))
}

/// Generate the three variations and overlay live prices on them
async fn plan(
    State(state): State<AppState>,
    Json(inputs): Json<PlannerInputs>,
) -> Result<Json<Vec<TripItinerary>>, ApiError> {
    validate_inputs(&inputs)?;

    // the thread-local rng must not live across an await
    let baselines = generate_itineraries(&inputs, &mut rand::rng());
    info!("Generated {} itineraries", baselines.len());

    let enriched = enrich_itineraries(&baselines, &inputs, state.flights.as_ref(), state.hotels.as_ref()).await;
    Ok(Json(enriched))
}
