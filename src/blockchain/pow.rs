use sha2::{Digest, Sha256};

/// Fixed-difficulty work function: find `proof` such that
/// `sha256(decimal(last_proof) ++ decimal(proof))` starts with
/// `difficulty` zero hex digits.
///
/// There is no retargeting. Difficulty is the same for every block, so this
/// is only as strong as one CPU search per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new(difficulty: usize) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn is_valid(&self, last_proof: u64, proof: u64) -> bool {
        let guess = format!("{last_proof}{proof}");
        let digest = hex::encode(Sha256::digest(guess.as_bytes()));
        digest.len() >= self.difficulty && digest.bytes().take(self.difficulty).all(|c| c == b'0')
    }

    /// Smallest non-negative proof valid against `last_proof`.
    /// Unbounded: callers run this off the request path.
    pub fn solve(&self, last_proof: u64) -> u64 {
        let mut proof = 0u64;
        while !self.is_valid(last_proof, proof) {
            proof = proof.wrapping_add(1);
        }
        proof
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        Self::new(super::DEFAULT_DIFFICULTY)
    }
}
