use actix_web::{HttpResponse, Responder, post, web};
use log::{debug, warn};

use super::models::{NewWalletResponse, SignRequest};
use crate::wallet::NodeIdentity;

/// Generate a fresh key pair for a client. Nothing is stored on the node.
#[post("/wallet/new/")]
pub async fn create_wallet() -> impl Responder {
    let keys = NodeIdentity::generate();
    debug!("issued wallet {}", keys.public_key_hex());
    HttpResponse::Ok().json(NewWalletResponse {
        secret_key: keys.secret_key_hex(),
        public_key: keys.public_key_hex().to_string(),
    })
}

/// Build a signed transaction ready for `/transactions/new/`.
#[post("/wallet/sign/")]
pub async fn sign_transaction(body: web::Json<SignRequest>) -> impl Responder {
    match body.into_inner().into_transaction() {
        Ok(tx) => HttpResponse::Ok().json(tx),
        Err(e) => {
            warn!("POST /wallet/sign/ - {e}");
            HttpResponse::BadRequest().body(format!("Invalid secret key: {e}"))
        }
    }
}
