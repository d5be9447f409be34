use actix_web::{HttpResponse, Responder, get, post, rt, web};
use log::{debug, info, warn};

use super::models::{AppState, MessageResponse, RegisterResponse, ResolveResponse};
use crate::blockchain::Block;
use crate::network::{BlockGossip, RegisterNodes, normalize_address};

/// Receive a block sealed by another node; relay it on if accepted.
#[post("/nodes/block/new/")]
pub async fn receive_block(
    state: web::Data<AppState>,
    body: web::Json<BlockGossip>,
) -> impl Responder {
    let BlockGossip { nodes, block } = body.into_inner();
    let Block {
        index,
        timestamp,
        transactions,
        proof,
        previous_hash,
    } = block;

    let accepted = {
        let mut bc = state.blockchain.lock().expect("mutex poisoned");
        match bc.accept_block(proof, index, previous_hash, timestamp, transactions) {
            Ok(block) => block.clone(),
            Err(e) => {
                warn!("gossiped block #{index} rejected: {e}");
                return HttpResponse::BadRequest().body(format!("Invalid block: {e}"));
            }
        }
    };

    let plan = {
        let mut peers = state.peers.lock().expect("mutex poisoned");
        peers.relay_plan(&state.address, &nodes)
    };
    if !plan.targets.is_empty() {
        debug!(
            "relaying block #{} to {} peers",
            accepted.index,
            plan.targets.len()
        );
        let client = state.client.clone();
        let message = BlockGossip {
            nodes: plan.notified,
            block: accepted,
        };
        rt::spawn(async move { client.broadcast_block(plan.targets, message).await });
    }

    HttpResponse::Created().json(MessageResponse::new("Block Added"))
}

/// Register peers and ask each newly added one to register us back.
#[post("/nodes/register/")]
pub async fn register_nodes(
    state: web::Data<AppState>,
    body: web::Json<RegisterNodes>,
) -> impl Responder {
    let RegisterNodes { nodes } = body.into_inner();
    if nodes.is_empty() {
        return HttpResponse::BadRequest().body("Please supply a valid list of nodes");
    }

    let mut addresses = Vec::with_capacity(nodes.len());
    for node in &nodes {
        match normalize_address(node) {
            Ok(addr) if addr == state.address => {}
            Ok(addr) => addresses.push(addr),
            Err(e) => return HttpResponse::BadRequest().body(e.to_string()),
        }
    }

    let (fresh, total_nodes) = {
        let mut peers = state.peers.lock().expect("mutex poisoned");
        let fresh: Vec<String> = addresses
            .iter()
            .filter_map(|addr| match peers.register(addr) {
                Ok((addr, true)) => Some(addr),
                _ => None,
            })
            .collect();
        (fresh, peers.snapshot())
    };

    if !fresh.is_empty() {
        info!("registered {} new peers: {:?}", fresh.len(), fresh);
        let client = state.client.clone();
        let self_address = state.address.clone();
        rt::spawn(async move {
            for peer in fresh {
                if let Err(e) = client.announce(&peer, &self_address).await {
                    warn!("could not announce ourselves: {e}");
                }
            }
        });
    }

    HttpResponse::Created().json(RegisterResponse {
        message: "New nodes have been added",
        total_nodes,
    })
}

/// Fetch every peer's chain and adopt the longest valid one.
#[get("/nodes/resolve/")]
pub async fn resolve_conflicts(state: web::Data<AppState>) -> impl Responder {
    let peers = {
        let peers = state.peers.lock().expect("mutex poisoned");
        if peers.is_empty() {
            debug!("resolve: no peers registered");
        }
        peers.snapshot()
    };

    // Network first, lock second: peer I/O never happens under the chain lock.
    let candidates = state.client.fetch_chains(&peers).await;
    debug!(
        "resolve: {} of {} peers answered",
        candidates.len(),
        peers.len()
    );

    let (replaced, chain) = {
        let mut bc = state.blockchain.lock().expect("mutex poisoned");
        let replaced = bc.resolve(candidates);
        (replaced, bc.chain().to_vec())
    };

    HttpResponse::Ok().json(ResolveResponse {
        message: if replaced {
            "Our chain was replaced"
        } else {
            "Our chain is authoritative"
        },
        replaced,
        chain,
    })
}
