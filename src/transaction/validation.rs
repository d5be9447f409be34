use log::debug;

use super::ledger::Ledger;
use super::model::{Transaction, TxKind};
use crate::error::ValidationError;
use crate::wallet::{normalize_public_key, verify_signature_hex};

/// How an accepted transaction changed the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Coinbase or creator-key issuance: recipient credited, nobody debited.
    Minted,
    Transferred,
}

/// Check `tx` and, if it is admissible, apply it to `ledger`.
///
/// On any error the ledger is left untouched. Ledger entries are keyed by the
/// canonical (lowercase, compressed) public key. `creator_key` must already be
/// in canonical form.
pub fn validate_and_apply(
    tx: &Transaction,
    ledger: &mut Ledger,
    creator_key: Option<&str>,
) -> Result<Applied, ValidationError> {
    let recipient =
        normalize_public_key(&tx.recipient).map_err(|_| ValidationError::MalformedRecipient)?;

    // Coinbase is signed by its recipient, which is already known to parse.
    let signer = normalize_public_key(tx.signer()).map_err(|_| ValidationError::MalformedSender)?;

    let verified = verify_signature_hex(&signer, &tx.signature, &tx.signing_message())
        .map_err(|_| ValidationError::MalformedSignature)?;
    if !verified {
        return Err(ValidationError::SignatureInvalid);
    }

    let is_creator = creator_key.is_some_and(|key| key == signer);
    if tx.kind() == TxKind::Coinbase || is_creator {
        ledger.apply_credit(&recipient, tx.amount)?;
        debug!(
            "minted {} to {} (creator={})",
            tx.amount,
            short(&recipient),
            is_creator
        );
        return Ok(Applied::Minted);
    }

    let sender = signer;
    let available = ledger.get(&sender);
    if !ledger.contains(&sender) || available < tx.amount {
        return Err(ValidationError::InsufficientBalance {
            available,
            requested: tx.amount,
        });
    }

    if sender == recipient {
        return Ok(Applied::Transferred);
    }

    // Both writes must succeed or neither happens.
    if ledger.get(&recipient).checked_add(tx.amount).is_none() {
        return Err(ValidationError::BalanceOverflow { amount: tx.amount });
    }
    ledger.apply_debit(&sender, tx.amount)?;
    ledger.apply_credit(&recipient, tx.amount)?;
    Ok(Applied::Transferred)
}

fn short(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::model::COINBASE_SENDER;
    use crate::wallet::NodeIdentity;

    fn funded(who: &NodeIdentity, amount: u64) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.apply_credit(who.public_key_hex(), amount).unwrap();
        ledger
    }

    #[test]
    fn coinbase_mints_to_recipient() {
        let miner = NodeIdentity::generate();
        let mut ledger = Ledger::new();
        let tx = Transaction::coinbase(&miner, 3);

        assert_eq!(
            validate_and_apply(&tx, &mut ledger, None),
            Ok(Applied::Minted)
        );
        assert_eq!(ledger.get(miner.public_key_hex()), 3);
    }

    #[test]
    fn coinbase_signed_by_someone_else_is_rejected() {
        let miner = NodeIdentity::generate();
        let thief = NodeIdentity::generate();
        let tx = Transaction::signed(&thief, COINBASE_SENDER, miner.public_key_hex(), 3);
        let mut ledger = Ledger::new();

        assert_eq!(
            validate_and_apply(&tx, &mut ledger, None),
            Err(ValidationError::SignatureInvalid)
        );
        assert_eq!(ledger.accounts(), 0);
    }

    #[test]
    fn mint_adds_to_recipients_own_balance() {
        let creator = NodeIdentity::generate();
        let bob = NodeIdentity::generate();
        let mut ledger = funded(&bob, 4);
        ledger.apply_credit(creator.public_key_hex(), 100).unwrap();

        let tx = Transaction::transfer(&creator, bob.public_key_hex(), 5);
        let applied = validate_and_apply(&tx, &mut ledger, Some(creator.public_key_hex()));

        assert_eq!(applied, Ok(Applied::Minted));
        assert_eq!(ledger.get(bob.public_key_hex()), 9);
        assert_eq!(ledger.get(creator.public_key_hex()), 100);
    }

    #[test]
    fn creator_mints_without_any_balance() {
        let creator = NodeIdentity::generate();
        let bob = NodeIdentity::generate();
        let mut ledger = Ledger::new();

        let tx = Transaction::transfer(&creator, bob.public_key_hex(), 50);
        assert_eq!(
            validate_and_apply(&tx, &mut ledger, Some(creator.public_key_hex())),
            Ok(Applied::Minted)
        );
        assert_eq!(ledger.get(bob.public_key_hex()), 50);
        assert!(!ledger.contains(creator.public_key_hex()));
    }

    #[test]
    fn transfer_moves_funds() {
        let alice = NodeIdentity::generate();
        let bob = NodeIdentity::generate();
        let mut ledger = funded(&alice, 10);

        let tx = Transaction::transfer(&alice, bob.public_key_hex(), 7);
        assert_eq!(
            validate_and_apply(&tx, &mut ledger, None),
            Ok(Applied::Transferred)
        );
        assert_eq!(ledger.get(alice.public_key_hex()), 3);
        assert_eq!(ledger.get(bob.public_key_hex()), 7);
    }

    #[test]
    fn overspend_is_rejected_and_ledger_unchanged() {
        let alice = NodeIdentity::generate();
        let bob = NodeIdentity::generate();
        let mut ledger = funded(&alice, 10);
        let before = ledger.clone();

        let tx = Transaction::transfer(&alice, bob.public_key_hex(), 11);
        assert_eq!(
            validate_and_apply(&tx, &mut ledger, None),
            Err(ValidationError::InsufficientBalance {
                available: 10,
                requested: 11
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn sender_without_entry_is_rejected() {
        let alice = NodeIdentity::generate();
        let bob = NodeIdentity::generate();
        let mut ledger = Ledger::new();

        let tx = Transaction::transfer(&alice, bob.public_key_hex(), 0);
        assert!(matches!(
            validate_and_apply(&tx, &mut ledger, None),
            Err(ValidationError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.accounts(), 0);
    }

    #[test]
    fn repeated_spend_drains_then_fails() {
        let alice = NodeIdentity::generate();
        let bob = NodeIdentity::generate();
        let mut ledger = funded(&alice, 5);
        let tx = Transaction::transfer(&alice, bob.public_key_hex(), 3);

        assert!(validate_and_apply(&tx, &mut ledger, None).is_ok());
        assert!(validate_and_apply(&tx, &mut ledger, None).is_err());
        assert_eq!(ledger.get(alice.public_key_hex()), 2);
        assert_eq!(ledger.get(bob.public_key_hex()), 3);
    }

    #[test]
    fn self_transfer_keeps_balance() {
        let alice = NodeIdentity::generate();
        let mut ledger = funded(&alice, 5);
        let tx = Transaction::transfer(&alice, alice.public_key_hex(), 5);

        assert_eq!(
            validate_and_apply(&tx, &mut ledger, None),
            Ok(Applied::Transferred)
        );
        assert_eq!(ledger.get(alice.public_key_hex()), 5);
    }

    #[test]
    fn tampered_amount_breaks_signature() {
        let alice = NodeIdentity::generate();
        let bob = NodeIdentity::generate();
        let mut ledger = funded(&alice, 10);
        let mut tx = Transaction::transfer(&alice, bob.public_key_hex(), 1);
        tx.amount = 9;

        assert_eq!(
            validate_and_apply(&tx, &mut ledger, None),
            Err(ValidationError::SignatureInvalid)
        );
        assert_eq!(ledger.get(alice.public_key_hex()), 10);
    }

    #[test]
    fn malformed_fields_are_rejected() {
        let alice = NodeIdentity::generate();
        let mut ledger = funded(&alice, 10);

        let bad_recipient = Transaction::transfer(&alice, "not-a-key", 1);
        assert_eq!(
            validate_and_apply(&bad_recipient, &mut ledger, None),
            Err(ValidationError::MalformedRecipient)
        );

        let mut bad_sig = Transaction::transfer(&alice, alice.public_key_hex(), 1);
        bad_sig.signature = "xyz".into();
        assert_eq!(
            validate_and_apply(&bad_sig, &mut ledger, None),
            Err(ValidationError::MalformedSignature)
        );

        let bad_sender = Transaction::new(
            "nope".into(),
            alice.public_key_hex().into(),
            1,
            "00".into(),
        );
        assert_eq!(
            validate_and_apply(&bad_sender, &mut ledger, None),
            Err(ValidationError::MalformedSender)
        );
        assert_eq!(ledger.get(alice.public_key_hex()), 10);
    }
}
