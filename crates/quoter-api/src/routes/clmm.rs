//! CLMM Quote Routes

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::State, routing::post, Json, Router};

use clmm::{
    build_swap_accounts, oracle_address, quote_two_hop_by_input, quote_two_hop_by_output,
    swap_quote, swap_tick_arrays_with_fallback, HopSnapshot, SwapQuoteParams, TwoHopQuoteParams,
};

use crate::dto::{
    quote_error, ApiFailure, QuoteRequest, QuoteResponse, TickArraysRequest, TickArraysResponse,
    TwoHopQuoteRequest, TwoHopQuoteResponse,
};
use crate::AppState;

/// Create CLMM routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(get_quote))
        .route("/quote/two-hop", post(get_two_hop_quote))
        .route("/tick-arrays", post(get_tick_arrays))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// POST /clmm/quote - Quote a swap through one pool
async fn get_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiFailure> {
    let config = state.config().await;
    let program_id = state.program_id().await;
    let pool = &request.pool;

    let params = SwapQuoteParams {
        amount: request.amount,
        a_to_b: request.a_to_b,
        amount_specified_is_input: request.amount_specified_is_input,
        sqrt_price_limit: request.sqrt_price_limit,
        slippage_tolerance_bps: request
            .slippage_tolerance_bps
            .unwrap_or(config.default_slippage_bps),
        timestamp: request.timestamp.unwrap_or_else(now_unix),
        protocol_version: request.protocol_version.unwrap_or(config.protocol_version),
        program_id,
    };

    let quote = swap_quote(pool, &request.tick_arrays, request.oracle.as_ref(), &params)
        .map_err(|e| {
            tracing::warn!("Quote failed for pool {}: {}", pool.address, e);
            quote_error(e)
        })?;

    let policy = request.fallback_policy.unwrap_or(config.fallback_policy);
    let arrays = swap_tick_arrays_with_fallback(
        &program_id,
        &pool.address,
        pool.tick_current_index,
        pool.tick_spacing,
        request.a_to_b,
        policy,
    )
    .map_err(quote_error)?;
    let accounts =
        build_swap_accounts(pool.address, &arrays, quote.oracle_address).map_err(quote_error)?;

    tracing::info!(
        "Quoted pool {}: in {} out {} fee rate {}",
        pool.address,
        quote.estimated_amount_in,
        quote.estimated_amount_out,
        quote.fee_rate
    );

    Ok(Json(QuoteResponse { quote, accounts }))
}

/// POST /clmm/quote/two-hop - Quote a swap routed through two pools
async fn get_two_hop_quote(
    State(state): State<AppState>,
    Json(request): Json<TwoHopQuoteRequest>,
) -> Result<Json<TwoHopQuoteResponse>, ApiFailure> {
    let config = state.config().await;

    let params = TwoHopQuoteParams {
        amount: request.amount,
        a_to_b_one: request.hop_one.a_to_b,
        a_to_b_two: request.hop_two.a_to_b,
        slippage_tolerance_bps: request
            .slippage_tolerance_bps
            .unwrap_or(config.default_slippage_bps),
        timestamp: request.timestamp.unwrap_or_else(now_unix),
        protocol_version: request.protocol_version.unwrap_or(config.protocol_version),
        program_id: state.program_id().await,
    };
    let hop_one = HopSnapshot {
        pool: &request.hop_one.pool,
        tick_arrays: &request.hop_one.tick_arrays,
        oracle: request.hop_one.oracle.as_ref(),
    };
    let hop_two = HopSnapshot {
        pool: &request.hop_two.pool,
        tick_arrays: &request.hop_two.tick_arrays,
        oracle: request.hop_two.oracle.as_ref(),
    };

    let quote = if request.amount_specified_is_input {
        quote_two_hop_by_input(hop_one, hop_two, &params)
    } else {
        quote_two_hop_by_output(hop_one, hop_two, &params)
    }
    .map_err(|e| {
        tracing::warn!(
            "Two-hop quote failed for pools {} -> {}: {}",
            request.hop_one.pool.address,
            request.hop_two.pool.address,
            e
        );
        quote_error(e)
    })?;

    Ok(Json(TwoHopQuoteResponse { quote }))
}

/// POST /clmm/tick-arrays - Tick array and oracle addresses for a swap
async fn get_tick_arrays(
    State(state): State<AppState>,
    Json(request): Json<TickArraysRequest>,
) -> Result<Json<TickArraysResponse>, ApiFailure> {
    let config = state.config().await;
    let program_id = state.program_id().await;
    let policy = request.fallback_policy.unwrap_or(config.fallback_policy);

    let tick_arrays = swap_tick_arrays_with_fallback(
        &program_id,
        &request.pool,
        request.tick_current_index,
        request.tick_spacing,
        request.a_to_b,
        policy,
    )
    .map_err(quote_error)?;
    let oracle = Some(oracle_address(&program_id, &request.pool));
    let accounts = build_swap_accounts(request.pool, &tick_arrays, oracle).map_err(quote_error)?;

    Ok(Json(TickArraysResponse {
        tick_arrays,
        accounts,
        oracle,
    }))
}
