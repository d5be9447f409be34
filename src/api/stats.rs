use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let (height, difficulty, last_block_hash, pending_transactions, accounts) = {
        let bc = state.blockchain.lock().expect("mutex poisoned");
        (
            bc.len(),
            bc.pow().difficulty(),
            bc.last_block().hash(),
            bc.pending().len(),
            bc.ledger().accounts(),
        )
    };

    // Separate, short lock for the peer set
    let peers = {
        let peers = state.peers.lock().expect("mutex poisoned");
        peers.len()
    };

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty,
        last_block_hash,
        pending_transactions,
        accounts,
        peers,
    })
}
