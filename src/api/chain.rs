use actix_web::{HttpResponse, Responder, get, rt, web};
use log::{debug, error, info};
use std::time::Instant;

use super::models::{AppState, ChainResponse, IdentifierResponse, MineResponse};
use crate::blockchain::{Block, Blockchain, MINING_REWARD};
use crate::error::ValidationError;
use crate::network::BlockGossip;
use crate::transaction::Transaction;

/// Get the full chain plus the pending pool.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        chain: bc.chain(),
        length: bc.len(),
        transactions: bc.pending(),
    })
}

/// Mine a new block:
/// - solve the proof against the current head, off the lock
/// - re-lock and retry if the head moved meanwhile
/// - seal the pool behind this node's coinbase
/// - relay the block to every peer
#[get("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let t0 = Instant::now();

    let block = loop {
        let (last_proof, last_hash, pow) = {
            let bc = state.blockchain.lock().expect("mutex poisoned");
            let last = bc.last_block();
            (last.proof, last.hash(), bc.pow())
        };

        let proof = match web::block(move || pow.solve(last_proof)).await {
            Ok(proof) => proof,
            Err(e) => {
                error!("MINER - proof search aborted: {e}");
                return HttpResponse::InternalServerError().body("proof search failed");
            }
        };

        let mut bc = state.blockchain.lock().expect("mutex poisoned");
        let coinbase = Transaction::coinbase(&state.identity, MINING_REWARD);
        match seal_on_head(&mut bc, &last_hash, proof, coinbase) {
            Ok(Some(block)) => break block,
            Ok(None) => debug!("MINER - head moved during proof search, retrying"),
            Err(e) => {
                error!("MINER - own coinbase rejected: {e}");
                return HttpResponse::InternalServerError().body(e.to_string());
            }
        }
    };

    let plan = {
        let mut peers = state.peers.lock().expect("mutex poisoned");
        peers.relay_plan(&state.address, &[])
    };
    if !plan.targets.is_empty() {
        let client = state.client.clone();
        let message = BlockGossip {
            nodes: plan.notified,
            block: block.clone(),
        };
        rt::spawn(async move { client.broadcast_block(plan.targets, message).await });
    }

    let hash = block.hash();
    info!(
        "MINER - sealed block #{} (proof={}, txs={}, hash={}) in {} ms",
        block.index,
        block.proof,
        block.transactions.len(),
        hash,
        t0.elapsed().as_millis()
    );
    HttpResponse::Ok().json(MineResponse {
        message: "New Block Forged",
        index: block.index,
        transactions: block.transactions,
        proof: block.proof,
        previous_hash: block.previous_hash,
        hash,
    })
}

/// Forge a block with `proof` only if the chain head is still `expected_head`.
/// `Ok(None)` means another block landed while the proof was being searched.
fn seal_on_head(
    bc: &mut Blockchain,
    expected_head: &str,
    proof: u64,
    coinbase: Transaction,
) -> Result<Option<Block>, ValidationError> {
    if bc.last_block().hash() != expected_head {
        return Ok(None);
    }
    bc.forge_block(proof, coinbase).map(|block| Some(block.clone()))
}

/// This node's public key, i.e. where its mining rewards go.
#[get("/identifier/")]
pub async fn get_identifier(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(IdentifierResponse {
        address: state.identity.public_key_hex().to_string(),
    })
}
