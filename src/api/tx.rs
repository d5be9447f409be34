use actix_web::{HttpResponse, Responder, post, rt, web};
use log::{debug, info, warn};
use std::time::Instant;

use super::models::{AppState, MessageResponse, NewTxRequest, NewTxResponse, check_transaction};
use crate::error::ValidationError;
use crate::network::{RelayPlan, TransactionGossip};
use crate::transaction::Transaction;

/// Submit a client transaction into the pool and relay it to every peer.
#[post("/transactions/new/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let t0 = Instant::now();
    let tx = body.into_inner().into_transaction();
    if let Err(msg) = check_transaction(&tx) {
        warn!("POST /transactions/new/ - rejected: {msg}");
        return HttpResponse::BadRequest().body(msg);
    }

    let index = {
        let mut bc = state.blockchain.lock().expect("mutex poisoned");
        match bc.submit_transaction(tx.clone()) {
            Ok(index) => index,
            Err(ValidationError::Duplicate) => {
                debug!("POST /transactions/new/ - duplicate of a pending transaction");
                return HttpResponse::Conflict().body("transaction already pending");
            }
            Err(ValidationError::AlreadySealed) => {
                debug!("POST /transactions/new/ - replay of a sealed transaction");
                return HttpResponse::Conflict().body("transaction already in the chain");
            }
            Err(e) => {
                warn!("POST /transactions/new/ - validation failed: {e}");
                return HttpResponse::BadRequest().body(format!("Invalid transaction: {e}"));
            }
        }
    };

    let plan = {
        let mut peers = state.peers.lock().expect("mutex poisoned");
        peers.relay_plan(&state.address, &[])
    };
    relay(&state, plan, tx);

    info!(
        "POST /transactions/new/ - queued for block {} ({} ms)",
        index,
        t0.elapsed().as_millis()
    );
    HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to Block {index}"),
        index,
    })
}

/// Receive a transaction gossiped by another node.
#[post("/nodes/transactions/new/")]
pub async fn receive_transaction(
    state: web::Data<AppState>,
    body: web::Json<TransactionGossip>,
) -> impl Responder {
    let TransactionGossip { nodes, transaction } = body.into_inner();
    if let Err(msg) = check_transaction(&transaction) {
        warn!("gossiped transaction rejected: {msg}");
        return HttpResponse::BadRequest().body(msg);
    }

    let index = {
        let mut bc = state.blockchain.lock().expect("mutex poisoned");
        match bc.submit_transaction(transaction.clone()) {
            Ok(index) => index,
            Err(ValidationError::Duplicate | ValidationError::AlreadySealed) => {
                return HttpResponse::Ok().json(MessageResponse::new("Already have transaction"));
            }
            Err(e) => {
                warn!("gossiped transaction rejected: {e}");
                return HttpResponse::BadRequest().body(format!("Invalid transaction: {e}"));
            }
        }
    };

    let plan = {
        let mut peers = state.peers.lock().expect("mutex poisoned");
        peers.relay_plan(&state.address, &nodes)
    };
    relay(&state, plan, transaction);

    HttpResponse::Created().json(MessageResponse::new(format!(
        "Transaction will be added to Block {index}"
    )))
}

fn relay(state: &AppState, plan: RelayPlan, transaction: Transaction) {
    if plan.targets.is_empty() {
        return;
    }
    debug!("relaying transaction to {} peers", plan.targets.len());
    let client = state.client.clone();
    let message = TransactionGossip {
        nodes: plan.notified,
        transaction,
    };
    rt::spawn(async move { client.broadcast_transaction(plan.targets, message).await });
}
