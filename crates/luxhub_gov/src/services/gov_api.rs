//! HTTP surface over the orchestrator and membership resolver. Translates
//! the error taxonomy into status codes; all proposal semantics live one
//! layer down.

use {
    crate::{
        config::Config,
        error::GovernanceError,
        ledger::RpcLedger,
        services::{
            membership::MembershipResolver,
            orchestrator::{ProposalOrchestrator, VoteAction},
        },
    },
    anyhow::Context,
    axum::{
        extract::{Extension, Path, Query},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    },
    base64::{engine::general_purpose::STANDARD, Engine},
    serde::{Deserialize, Serialize},
    solana_sdk::{pubkey::Pubkey, signature::read_keypair_file},
    squads::{state::AccountMetaSpec, status::StatusFilter},
    std::{str::FromStr, sync::Arc},
};

pub struct State {
    orchestrator: ProposalOrchestrator<RpcLedger>,
    membership: MembershipResolver<RpcLedger>,
    default_vault_index: u8,
    vault_count: u8,
}

#[derive(Serialize)]
struct Error {
    msg: String,
}

#[derive(Deserialize)]
struct AccountRefBody {
    address: String,
    #[serde(default)]
    signer: bool,
    #[serde(default)]
    writable: bool,
}

#[derive(Deserialize)]
struct CreateProposalRequest {
    program_id: String,
    #[serde(default)]
    accounts: Vec<AccountRefBody>,
    /// base64-encoded opaque instruction payload
    payload: String,
    vault_index: Option<u8>,
    desired_index: Option<u64>,
}

#[derive(Serialize)]
struct CreateProposalResponse {
    transaction_index: u64,
}

#[derive(Deserialize)]
struct VoteRequest {
    action: String,
}

#[derive(Deserialize, Default)]
struct ExecuteRequest {
    vault_index: Option<u8>,
}

#[derive(Serialize)]
struct SignatureResponse {
    signature: String,
}

#[derive(Deserialize)]
struct ListQuery {
    status: Option<String>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct MembersQuery {
    vault_count: Option<u8>,
}

pub async fn serve_api(listen_url: &str, cfg: &Config) -> anyhow::Result<()> {
    let router = new_router(cfg)?;
    let listener = tokio::net::TcpListener::bind(listen_url).await?;
    axum::serve(listener, router)
        .await
        .with_context(|| "api failed")
}

pub fn new_router(cfg: &Config) -> anyhow::Result<Router> {
    let ledger = Arc::new(RpcLedger::new(&cfg.rpc_url, cfg.rpc_timeout_secs));
    let multisig = if cfg.multisig.is_empty() {
        None
    } else {
        Some(
            Pubkey::from_str(&cfg.multisig)
                .with_context(|| "invalid multisig address in config")?,
        )
    };
    let signer = Arc::new(
        read_keypair_file(&cfg.keypair_path)
            .map_err(|err| anyhow::anyhow!("failed to read keypair: {err}"))?,
    );
    let state = State {
        orchestrator: ProposalOrchestrator::new(ledger.clone(), multisig, signer),
        membership: MembershipResolver::new(ledger, multisig),
        default_vault_index: cfg.default_vault_index,
        vault_count: cfg.vault_count,
    };
    let app = Router::new()
        .route("/proposals", post(create_proposal).get(list_proposals))
        .route("/proposals/:index", get(proposal_status))
        .route("/proposals/:index/vote", post(vote))
        .route("/proposals/:index/execute", post(execute))
        .route("/proposals/:index/cancel", post(cancel))
        .route("/members", get(list_members))
        .route("/members/:wallet", get(check_member))
        .layer(Extension(Arc::new(state)));
    Ok(app)
}

fn error_response(err: GovernanceError) -> Response {
    let code = match &err {
        GovernanceError::NotFound(_) => StatusCode::NOT_FOUND,
        GovernanceError::Conflict { .. }
        | GovernanceError::InvalidState { .. }
        | GovernanceError::AlreadyExecuted(_)
        | GovernanceError::Rejected(_)
        | GovernanceError::Cancelled(_) => StatusCode::CONFLICT,
        GovernanceError::ThresholdNotMet { .. } => StatusCode::PRECONDITION_FAILED,
        GovernanceError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        GovernanceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        GovernanceError::Decode(_) | GovernanceError::Ledger(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        code,
        Json(Error {
            msg: err.to_string(),
        }),
    )
        .into_response()
}

fn bad_request(msg: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(Error { msg })).into_response()
}

async fn create_proposal(
    Extension(state): Extension<Arc<State>>,
    Json(req): Json<CreateProposalRequest>,
) -> impl IntoResponse {
    let program_id = match Pubkey::from_str(&req.program_id) {
        Ok(pk) => pk,
        Err(err) => return bad_request(format!("invalid program id: {err}")),
    };
    let mut accounts = Vec::with_capacity(req.accounts.len());
    for account in &req.accounts {
        match Pubkey::from_str(&account.address) {
            Ok(address) => accounts.push(AccountMetaSpec {
                address,
                is_signer: account.signer,
                is_writable: account.writable,
            }),
            Err(err) => {
                return bad_request(format!("invalid account {}: {err}", account.address))
            }
        }
    }
    let payload = match STANDARD.decode(&req.payload) {
        Ok(bytes) => bytes,
        Err(err) => return bad_request(format!("payload is not valid base64: {err}")),
    };
    let vault_index = req.vault_index.unwrap_or(state.default_vault_index);
    match state
        .orchestrator
        .create(program_id, accounts, payload, vault_index, req.desired_index)
        .await
    {
        Ok(transaction_index) => {
            (StatusCode::OK, Json(CreateProposalResponse { transaction_index })).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn vote(
    Path(index): Path<u64>,
    Extension(state): Extension<Arc<State>>,
    Json(req): Json<VoteRequest>,
) -> impl IntoResponse {
    let action = match VoteAction::from_str(&req.action) {
        Ok(action) => action,
        Err(msg) => return bad_request(msg),
    };
    match state.orchestrator.vote(index, action).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn execute(
    Path(index): Path<u64>,
    Extension(state): Extension<Arc<State>>,
    req: Option<Json<ExecuteRequest>>,
) -> impl IntoResponse {
    let vault_index = req
        .and_then(|Json(req)| req.vault_index)
        .unwrap_or(state.default_vault_index);
    match state.orchestrator.execute(index, vault_index).await {
        Ok(signature) => (
            StatusCode::OK,
            Json(SignatureResponse {
                signature: signature.to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn cancel(
    Path(index): Path<u64>,
    Extension(state): Extension<Arc<State>>,
) -> impl IntoResponse {
    match state.orchestrator.cancel(index).await {
        Ok(signature) => (
            StatusCode::OK,
            Json(SignatureResponse {
                signature: signature.to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

async fn proposal_status(
    Path(index): Path<u64>,
    Extension(state): Extension<Arc<State>>,
) -> impl IntoResponse {
    match state.orchestrator.status(index).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_proposals(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<Arc<State>>,
) -> impl IntoResponse {
    let filter = match query.status.as_deref() {
        Some(s) => match StatusFilter::from_str(s) {
            Ok(filter) => Some(filter),
            Err(msg) => return bad_request(msg),
        },
        None => None,
    };
    match state
        .orchestrator
        .list(filter, query.limit.unwrap_or(20))
        .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn check_member(
    Path(wallet): Path<String>,
    Extension(state): Extension<Arc<State>>,
) -> impl IntoResponse {
    let wallet = match Pubkey::from_str(&wallet) {
        Ok(pk) => pk,
        Err(err) => return bad_request(format!("invalid wallet: {err}")),
    };
    match state.membership.is_member(wallet).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn list_members(
    Query(query): Query<MembersQuery>,
    Extension(state): Extension<Arc<State>>,
) -> impl IntoResponse {
    let vault_count = query.vault_count.unwrap_or(state.vault_count);
    match state.membership.list_members(vault_count).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => error_response(err),
    }
}
