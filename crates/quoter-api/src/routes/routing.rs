//! Pool Routing Routes

use axum::{routing::post, Json, Router};

use clmm::PoolGraph;
use quoter_core::Pubkey;

use crate::dto::{
    parse_pubkey, AllPathsRequest, ApiFailure, PairPathsResponse, PairsRequest, PathsRequest,
    PathsResponse,
};
use crate::AppState;

/// Create routing routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/paths", post(get_paths))
        .route("/pairs", post(get_paths_for_pairs))
        .route("/all", post(get_all_paths))
}

fn parse_intermediates(tokens: Option<&[String]>) -> Result<Option<Vec<Pubkey>>, ApiFailure> {
    tokens
        .map(|tokens| {
            tokens
                .iter()
                .map(|t| parse_pubkey("intermediate token", t))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
}

/// POST /routing/paths - Direct and two-hop paths between two mints
async fn get_paths(Json(request): Json<PathsRequest>) -> Result<Json<PathsResponse>, ApiFailure> {
    let start = parse_pubkey("start token mint", &request.start_token_mint)?;
    let end = parse_pubkey("end token mint", &request.end_token_mint)?;
    let intermediates = parse_intermediates(request.intermediate_tokens.as_deref())?;

    let graph = PoolGraph::build(&request.pools);
    let paths = graph.get_path(&start, &end, intermediates.as_deref());
    let count = paths.len();

    Ok(Json(PathsResponse { paths, count }))
}

/// POST /routing/pairs - Paths for several directed pairs, in request order
async fn get_paths_for_pairs(
    Json(request): Json<PairsRequest>,
) -> Result<Json<PairPathsResponse>, ApiFailure> {
    let pairs = request
        .pairs
        .iter()
        .map(|p| {
            Ok((
                parse_pubkey("start token mint", &p.start_token_mint)?,
                parse_pubkey("end token mint", &p.end_token_mint)?,
            ))
        })
        .collect::<Result<Vec<_>, ApiFailure>>()?;
    let intermediates = parse_intermediates(request.intermediate_tokens.as_deref())?;

    let graph = PoolGraph::build(&request.pools);
    let results = graph.get_paths_for_pairs(&pairs, intermediates.as_deref());

    Ok(Json(PairPathsResponse {
        results,
        pool_count: graph.pool_count(),
    }))
}

/// POST /routing/all - Every connected pair up to two hops
async fn get_all_paths(Json(request): Json<AllPathsRequest>) -> Json<PairPathsResponse> {
    let graph = PoolGraph::build(&request.pools);
    Json(PairPathsResponse {
        results: graph.get_all_paths(),
        pool_count: graph.pool_count(),
    })
}
