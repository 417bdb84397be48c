//! Legacy Keccak-256 with a process-wide hasher pool.
//!
//! Selector computation hashes many short signatures; the pool amortizes
//! hasher state allocation across those calls. The pool is a plain free
//! list with no ordering guarantees and no teardown; states are reset
//! before being returned to it.

use alloy_primitives::B256;
use sha3::{Digest, Keccak256};
use std::sync::Mutex;

static POOL: Mutex<Vec<Keccak256>> = Mutex::new(Vec::new());

fn acquire() -> Keccak256 {
    POOL.lock().map(|mut pool| pool.pop()).unwrap_or(None).unwrap_or_default()
}

fn release(hasher: Keccak256) {
    if let Ok(mut pool) = POOL.lock() {
        pool.push(hasher);
    }
}

/// Computes the legacy (pre-NIST padding) Keccak-256 digest of `data`.
///
/// ```
/// use contract_abi::keccak256;
///
/// let digest = keccak256(b"transfer(address,uint256)");
/// assert_eq!(&digest[..4], [0xa9, 0x05, 0x9c, 0xbb]);
/// ```
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let mut hasher = acquire();
    hasher.update(data.as_ref());
    let digest = B256::from_slice(&hasher.finalize_reset());
    release(hasher);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn known_digests() {
        // Empty input digest of legacy Keccak-256.
        assert_eq!(
            keccak256([]),
            B256::new(hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"))
        );
        assert_eq!(
            keccak256(b"Transfer(address,address,uint256)"),
            B256::new(hex!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"))
        );
    }

    #[test]
    fn pooled_state_is_clean() {
        let first = keccak256(b"hello");
        // A second call reuses the released state; the digest must not
        // depend on pool history.
        assert_eq!(keccak256(b"hello"), first);
    }

    #[test]
    fn concurrent_use() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| keccak256(b"transfer(address,uint256)")))
            .collect();
        for handle in handles {
            let digest = handle.join().unwrap();
            assert_eq!(&digest[..4], [0xa9, 0x05, 0x9c, 0xbb]);
        }
    }
}
