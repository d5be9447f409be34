use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse};
use crate::wallet::normalize_public_key;

#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let raw = path.into_inner().0;
    let Ok(address) = normalize_public_key(&raw) else {
        return HttpResponse::BadRequest().body("address must be a hex public key");
    };

    let (balance, pending_balance) = {
        let bc = state.blockchain.lock().expect("mutex poisoned");
        (bc.balance(&address), bc.pending_balance(&address))
    };

    HttpResponse::Ok().json(BalanceResponse {
        address,
        balance,
        pending_balance,
    })
}
