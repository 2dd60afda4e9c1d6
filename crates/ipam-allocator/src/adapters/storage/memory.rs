use super::record::{encode_header, encode_record, encode_reservation};
use crate::domain::config::RemovalPolicy;
use crate::domain::errors::StoreError;
use crate::domain::registry::SubnetRegistry;
use crate::domain::subnet::SubnetKey;
use crate::domain::subnetwork::Subnetwork;
use crate::ports::outbound::SubnetStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory subnet store for unit tests.
///
/// Keeps the same text records as `FileSubnetStore`, so `load_all` goes
/// through the same parser. Writes can be made to fail to exercise
/// rollback.
#[derive(Debug, Default)]
pub struct InMemorySubnetStore {
    records: Mutex<HashMap<SubnetKey, String>>,
    archived: Mutex<HashMap<SubnetKey, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemorySubnetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current record text for `key`.
    pub fn record(&self, key: &SubnetKey) -> Option<String> {
        self.records.lock().get(key).cloned()
    }

    /// Seed a raw record, as if written by an earlier process.
    pub fn insert_record(&self, key: SubnetKey, text: impl Into<String>) {
        self.records.lock().insert(key, text.into());
    }

    pub fn is_archived(&self, key: &SubnetKey) -> bool {
        self.archived.lock().contains_key(key)
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_write(&self, operation: &'static str, key: &SubnetKey) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            let source = io::Error::new(io::ErrorKind::Other, "injected write failure");
            return Err(StoreError::io(operation, PathBuf::from(key.to_string()))(source));
        }
        Ok(())
    }

    fn committed(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl SubnetStore for InMemorySubnetStore {
    fn create_subnet_file(&self, subnet: &Subnetwork) -> Result<(), StoreError> {
        let key = subnet.key();
        let mut records = self.records.lock();
        if records.contains_key(key) {
            return Err(StoreError::AlreadyExists {
                path: PathBuf::from(key.to_string()),
            });
        }
        self.check_write("create subnet file", key)?;
        records.insert(*key, encode_header(subnet.definition()));
        self.committed();
        Ok(())
    }

    fn append_reservation(&self, key: &SubnetKey, address: IpAddr) -> Result<(), StoreError> {
        self.check_write("append to subnet file", key)?;
        let mut records = self.records.lock();
        let record = records.get_mut(key).ok_or_else(|| {
            StoreError::io("open subnet file", PathBuf::from(key.to_string()))(io::Error::from(
                io::ErrorKind::NotFound,
            ))
        })?;
        record.push_str(&encode_reservation(address));
        self.committed();
        Ok(())
    }

    fn rewrite_subnet_file(&self, subnet: &Subnetwork) -> Result<(), StoreError> {
        self.check_write("rename temp file over", subnet.key())?;
        self.records
            .lock()
            .insert(*subnet.key(), encode_record(subnet));
        self.committed();
        Ok(())
    }

    fn remove_subnet_file(&self, key: &SubnetKey, policy: RemovalPolicy) -> Result<(), StoreError> {
        self.check_write("remove subnet file", key)?;
        if let Some(record) = self.records.lock().remove(key) {
            if policy == RemovalPolicy::Archive {
                self.archived.lock().insert(*key, record);
            }
            self.committed();
        }
        Ok(())
    }

    fn load_all(&self) -> Result<SubnetRegistry, StoreError> {
        let mut records: Vec<(SubnetKey, String)> = self
            .records
            .lock()
            .iter()
            .map(|(key, text)| (*key, text.clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));

        let subnets = records
            .into_iter()
            .filter_map(|(key, text)| super::restore(&text, &key.to_string()));
        Ok(SubnetRegistry::from_subnetworks(subnets))
    }
}
