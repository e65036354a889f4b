// 8.0 headers.rs: external chain header lookups, consumed at the snapshot
// boundaries only. MOCKED here: the trait is the contract, the real RPC client
// lives with the caller, as does any retry policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteHeader {
    pub height: u64,
    pub data_hash: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    #[error("remote full node unavailable: {0}")]
    Unavailable(String),

    #[error("no header at height {0}")]
    NotFound(u64),

    #[error("header at height {0} carries no data hash")]
    MissingDataHash(u64),
}

pub trait HeaderProvider {
    fn get_header(&self, height: u64) -> Result<RemoteHeader, HeaderError>;
    fn get_latest_height(&self) -> Result<u64, HeaderError>;

    fn get_data_hash(&self, height: u64) -> Result<Vec<u8>, HeaderError> {
        let header = self.get_header(height)?;
        if header.data_hash.is_empty() {
            return Err(HeaderError::MissingDataHash(height));
        }
        Ok(header.data_hash)
    }
}

/// Canned headers for tests and the simulator.
#[derive(Debug, Clone, Default)]
pub struct MockHeaderProvider {
    headers: BTreeMap<u64, RemoteHeader>,
}

impl MockHeaderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: RemoteHeader) {
        self.headers.insert(header.height, header);
    }
}

impl HeaderProvider for MockHeaderProvider {
    fn get_header(&self, height: u64) -> Result<RemoteHeader, HeaderError> {
        self.headers
            .get(&height)
            .cloned()
            .ok_or(HeaderError::NotFound(height))
    }

    fn get_latest_height(&self) -> Result<u64, HeaderError> {
        self.headers
            .keys()
            .next_back()
            .copied()
            .ok_or_else(|| HeaderError::Unavailable("no headers recorded".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_provider_serves_headers() {
        let mut provider = MockHeaderProvider::new();
        provider.insert(RemoteHeader {
            height: 10,
            data_hash: vec![0xab],
        });
        provider.insert(RemoteHeader {
            height: 12,
            data_hash: vec![],
        });

        assert_eq!(provider.get_latest_height().unwrap(), 12);
        assert_eq!(provider.get_data_hash(10).unwrap(), vec![0xab]);
        assert_eq!(
            provider.get_data_hash(12).unwrap_err(),
            HeaderError::MissingDataHash(12)
        );
        assert_eq!(
            provider.get_header(11).unwrap_err(),
            HeaderError::NotFound(11)
        );
    }
}
