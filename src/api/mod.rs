mod balance;
mod chain;
mod health;
pub mod models;
mod nodes;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

use crate::network::API_PREFIX;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope(API_PREFIX)
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::mine_block)
            .service(chain::get_identifier)
            .service(tx::post_transaction)
            .service(tx::receive_transaction)
            .service(nodes::receive_block)
            .service(nodes::register_nodes)
            .service(nodes::resolve_conflicts)
            .service(balance::get_balance)
            .service(stats::get_stats)
            .service(wallet::create_wallet)
            .service(wallet::sign_transaction),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::{Value, json};

    use super::{AppState, init_routes};
    use crate::blockchain::Blockchain;
    use crate::config::NodeConfig;
    use crate::transaction::Transaction;
    use crate::wallet::NodeIdentity;

    fn state() -> web::Data<AppState> {
        let config = NodeConfig::from_lookup(|name| match name {
            "POW_DIFFICULTY" => Some("2".to_string()),
            "NODE_ADDRESS" => Some("127.0.0.1:7001".to_string()),
            _ => None,
        })
        .unwrap();
        web::Data::new(AppState::new(&config, NodeIdentity::generate()))
    }

    fn tx_body(tx: &Transaction) -> Value {
        json!({
            "sender": tx.sender,
            "recipient": tx.recipient,
            "amount": tx.amount,
            "signature": tx.signature,
        })
    }

    #[actix_web::test]
    async fn chain_starts_at_genesis() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let req = test::TestRequest::get().uri("/api/v1/chain/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["index"], 1);
        assert_eq!(body["chain"][0]["proof"], 100);
        assert_eq!(body["chain"][0]["previous_hash"], "1");
        assert_eq!(body["transactions"], json!([]));
    }

    #[actix_web::test]
    async fn submit_accepts_once_and_rejects_bad_input() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let alice = NodeIdentity::generate();
        let tx = Transaction::coinbase(&alice, 1);

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/new/")
            .set_json(tx_body(&tx))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["index"], 2);

        let again = test::TestRequest::post()
            .uri("/api/v1/transactions/new/")
            .set_json(tx_body(&tx))
            .to_request();
        assert_eq!(
            test::call_service(&app, again).await.status(),
            StatusCode::CONFLICT
        );

        let mut forged = Transaction::coinbase(&alice, 2);
        forged.amount = 3;
        let bad = test::TestRequest::post()
            .uri("/api/v1/transactions/new/")
            .set_json(tx_body(&forged))
            .to_request();
        assert_eq!(
            test::call_service(&app, bad).await.status(),
            StatusCode::BAD_REQUEST
        );

        let missing = test::TestRequest::post()
            .uri("/api/v1/transactions/new/")
            .set_json(json!({ "sender": "0" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, missing).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn mine_rewards_the_node() {
        let state = state();
        let node_key = state.identity.public_key_hex().to_string();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/mine/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["index"], 2);
        assert_eq!(body["transactions"][0]["sender"], "0");
        assert_eq!(body["transactions"][0]["recipient"], node_key.as_str());

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/balance/{node_key}/"))
            .to_request();
        let balance: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(balance["balance"], 1);

        let bc = state.blockchain.lock().unwrap();
        assert_eq!(bc.len(), 2);
        assert_eq!(bc.chain()[1].previous_hash, bc.chain()[0].hash());
    }

    #[actix_web::test]
    async fn gossiped_block_is_accepted_once() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let mut remote = Blockchain::with_difficulty(2);
        let miner = NodeIdentity::generate();
        let proof = remote.pow().solve(remote.last_block().proof);
        let block = remote
            .forge_block(proof, Transaction::coinbase(&miner, 1))
            .unwrap()
            .clone();
        let message = json!({ "nodes": ["127.0.0.1:7002"], "block": block });

        let req = test::TestRequest::post()
            .uri("/api/v1/nodes/block/new/")
            .set_json(&message)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let replay = test::TestRequest::post()
            .uri("/api/v1/nodes/block/new/")
            .set_json(&message)
            .to_request();
        assert_eq!(
            test::call_service(&app, replay).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn wallet_signs_a_submittable_transaction() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post().uri("/api/v1/wallet/new/").to_request();
        let wallet: Value = test::call_and_read_body_json(&app, req).await;
        let secret = wallet["secret_key"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/wallet/sign/")
            .set_json(json!({ "secret_key": secret, "amount": 5 }))
            .to_request();
        let tx: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tx["sender"], "0");
        assert_eq!(tx["recipient"], wallet["public_key"]);

        let submit = test::TestRequest::post()
            .uri("/api/v1/transactions/new/")
            .set_json(&tx)
            .to_request();
        assert_eq!(
            test::call_service(&app, submit).await.status(),
            StatusCode::CREATED
        );

        let bad = test::TestRequest::post()
            .uri("/api/v1/wallet/sign/")
            .set_json(json!({ "secret_key": "00", "amount": 5 }))
            .to_request();
        assert_eq!(
            test::call_service(&app, bad).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn sealed_transaction_is_not_accepted_again() {
        let state = state();
        let app =
            test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;
        let tx = Transaction::coinbase(&NodeIdentity::generate(), 6);

        let req = test::TestRequest::post()
            .uri("/api/v1/transactions/new/")
            .set_json(tx_body(&tx))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
        let req = test::TestRequest::get().uri("/api/v1/mine/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let replay = test::TestRequest::post()
            .uri("/api/v1/transactions/new/")
            .set_json(tx_body(&tx))
            .to_request();
        assert_eq!(
            test::call_service(&app, replay).await.status(),
            StatusCode::CONFLICT
        );

        let gossip = test::TestRequest::post()
            .uri("/api/v1/nodes/transactions/new/")
            .set_json(json!({ "nodes": [], "transaction": tx_body(&tx) }))
            .to_request();
        assert_eq!(
            test::call_service(&app, gossip).await.status(),
            StatusCode::OK
        );
        assert!(state.blockchain.lock().unwrap().pending().is_empty());
    }

    #[actix_web::test]
    async fn gossiped_zero_amount_is_rejected_at_the_boundary() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let tx = Transaction::coinbase(&NodeIdentity::generate(), 0);

        let req = test::TestRequest::post()
            .uri("/api/v1/nodes/transactions/new/")
            .set_json(json!({ "nodes": [], "transaction": tx_body(&tx) }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn gossiped_duplicate_transaction_is_acknowledged() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let tx = Transaction::coinbase(&NodeIdentity::generate(), 4);
        let message = json!({ "nodes": [], "transaction": tx_body(&tx) });

        let first = test::TestRequest::post()
            .uri("/api/v1/nodes/transactions/new/")
            .set_json(&message)
            .to_request();
        assert_eq!(
            test::call_service(&app, first).await.status(),
            StatusCode::CREATED
        );

        let second = test::TestRequest::post()
            .uri("/api/v1/nodes/transactions/new/")
            .set_json(&message)
            .to_request();
        let resp = test::call_service(&app, second).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Already have transaction");
    }

    #[actix_web::test]
    async fn register_normalizes_and_skips_self() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/nodes/register/")
            .set_json(json!({ "nodes": ["http://127.0.0.1:9/", "127.0.0.1:7001"] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["total_nodes"], json!(["127.0.0.1:9"]));

        let bad = test::TestRequest::post()
            .uri("/api/v1/nodes/register/")
            .set_json(json!({ "nodes": ["not an address"] }))
            .to_request();
        assert_eq!(
            test::call_service(&app, bad).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn resolve_without_peers_keeps_chain() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/nodes/resolve/")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["replaced"], false);
        assert_eq!(body["message"], "Our chain is authoritative");
        assert_eq!(body["chain"].as_array().map(Vec::len), Some(1));
    }
}
