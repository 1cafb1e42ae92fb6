use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

const CHALLENGE_TTL: Duration = Duration::from_secs(300);
/// Outstanding secrets kept at once; the oldest is dropped past this.
pub const DEFAULT_SECRET_LIMIT: usize = 10_000;

#[derive(Default)]
struct Secrets {
    issued: HashMap<String, (SystemTime, u64)>,
    counter: u64,
}

/// Proof-of-work captcha: the client must find a nonce so that
/// `sha256(secret + nonce)` starts with `difficulty` hex zeros. Secrets are single use.
#[derive(Clone)]
pub struct PowGuard {
    secrets: Arc<Mutex<Secrets>>,
    difficulty: usize,
    limit: usize,
}

impl PowGuard {
    pub fn new(difficulty: usize) -> Self {
        Self::with_limit(difficulty, DEFAULT_SECRET_LIMIT)
    }

    pub fn with_limit(difficulty: usize, limit: usize) -> Self {
        Self {
            secrets: Arc::new(Mutex::new(Secrets::default())),
            difficulty,
            limit: limit.max(1),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn generate_challenge(&self) -> String {
        let secret = format!("{:x}", rand::random::<u128>());
        let now = SystemTime::now();
        let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
        secrets.issued.retain(|_, (expiry, _)| *expiry > now);
        while secrets.issued.len() >= self.limit {
            let oldest = secrets
                .issued
                .iter()
                .min_by_key(|(_, (expiry, seq))| (*expiry, *seq))
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => secrets.issued.remove(&key),
                None => break,
            };
        }
        secrets.counter += 1;
        let seq = secrets.counter;
        secrets.issued.insert(secret.clone(), (now + CHALLENGE_TTL, seq));
        secret
    }

    pub fn verify(&self, secret: &str, nonce: &str) -> bool {
        {
            let mut secrets = self.secrets.lock().unwrap_or_else(PoisonError::into_inner);
            match secrets.issued.remove(secret) {
                Some((expiry, _)) if SystemTime::now() <= expiry => {}
                _ => return false,
            }
        }

        let hash = hex::encode(Sha256::digest(format!("{}{}", secret, nonce)));
        hash.starts_with(&"0".repeat(self.difficulty))
    }

    /// Checks a `secret|nonce` form value.
    pub fn verify_response(&self, response: &str) -> bool {
        match response.split_once('|') {
            Some((secret, nonce)) => self.verify(secret, nonce),
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn solve(secret: &str, difficulty: usize) -> String {
    let prefix = "0".repeat(difficulty);
    let mut nonce = 0u64;
    loop {
        let hash = hex::encode(Sha256::digest(format!("{}{}", secret, nonce)));
        if hash.starts_with(&prefix) {
            return nonce.to_string();
        }
        nonce += 1;
    }
}
