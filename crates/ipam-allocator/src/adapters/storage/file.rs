use super::record::{
    encode_header, encode_record, encode_reservation, file_name_for, is_record_file_name,
    key_for_file_name, ARCHIVE_SUFFIX, TEMP_SUFFIX,
};
use crate::domain::config::{RemovalPolicy, StorageConfig};
use crate::domain::errors::StoreError;
use crate::domain::registry::SubnetRegistry;
use crate::domain::subnet::SubnetKey;
use crate::domain::subnetwork::Subnetwork;
use crate::ports::outbound::SubnetStore;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// One text file per subnet under a single data directory.
///
/// Registration links a fully written header into place exclusively,
/// allocation appends one line, release rewrites the whole file through a
/// temp file and an atomic rename.
///
/// A failed write leaves the record as it was. Once a change is visible
/// (rename, link or delete done), a failing sync is reported as
/// `StoreError::Unsynced`.
#[derive(Debug)]
pub struct FileSubnetStore {
    data_dir: PathBuf,
    sync_appends: bool,
    #[cfg(test)]
    fail_step: parking_lot::Mutex<Option<&'static str>>,
}

impl FileSubnetStore {
    /// Open the store, creating the data directory if needed.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.data_dir)
            .map_err(StoreError::io("create data directory", &config.data_dir))?;

        debug!(
            data_dir = %config.data_dir.display(),
            sync_appends = config.sync_appends,
            "[ipam] Opened subnet store"
        );

        Ok(Self {
            data_dir: config.data_dir.clone(),
            sync_appends: config.sync_appends,
            #[cfg(test)]
            fail_step: parking_lot::Mutex::new(None),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the record for `key`.
    pub fn path_for(&self, key: &SubnetKey) -> PathBuf {
        self.data_dir.join(file_name_for(key))
    }

    fn sibling(&self, key: &SubnetKey, suffix: &str) -> PathBuf {
        self.data_dir.join(format!("{}{}", file_name_for(key), suffix))
    }

    /// Make the next call that reaches `step` report an I/O error.
    #[cfg(test)]
    pub(crate) fn fail_at(&self, step: &'static str) {
        *self.fail_step.lock() = Some(step);
    }

    #[cfg(test)]
    fn checkpoint(&self, step: &'static str) -> io::Result<()> {
        let mut armed = self.fail_step.lock();
        if *armed == Some(step) {
            *armed = None;
            return Err(io::Error::new(io::ErrorKind::Other, "injected failure"));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[inline]
    fn checkpoint(&self, _step: &'static str) -> io::Result<()> {
        Ok(())
    }

    /// Make renames, links and deletions in the data directory durable.
    ///
    /// Only called after a change is visible, so failures are `Unsynced`.
    #[cfg(unix)]
    fn sync_dir(&self) -> Result<(), StoreError> {
        File::open(&self.data_dir)
            .and_then(|dir| dir.sync_all())
            .and_then(|()| self.checkpoint("sync data directory"))
            .map_err(StoreError::unsynced("sync data directory", &self.data_dir))
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<(), StoreError> {
        self.checkpoint("sync data directory")
            .map_err(StoreError::unsynced("sync data directory", &self.data_dir))
    }

    fn write_temp(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        let mut file = File::create(path).map_err(StoreError::io("create temp file", path))?;
        file.write_all(contents.as_bytes())
            .and_then(|()| self.checkpoint("write temp file"))
            .map_err(StoreError::io("write temp file", path))?;
        file.sync_all()
            .and_then(|()| self.checkpoint("sync temp file"))
            .map_err(StoreError::io("sync temp file", path))
    }

    fn replace(&self, temp: &Path, path: &Path) -> Result<(), StoreError> {
        // rename does not replace an existing file on Windows
        #[cfg(windows)]
        {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != io::ErrorKind::NotFound {
                    return Err(StoreError::io("remove old subnet file", path)(e));
                }
            }
        }

        self.checkpoint("rename temp file over")
            .and_then(|()| fs::rename(temp, path))
            .map_err(StoreError::io("rename temp file over", path))?;
        self.sync_dir()
    }

    fn sync_append(&self, file: &File, path: &Path) -> Result<(), StoreError> {
        if !self.sync_appends {
            return Ok(());
        }
        file.sync_data()
            .and_then(|()| self.checkpoint("sync subnet file"))
            .map_err(StoreError::io("sync subnet file", path))
    }
}

impl SubnetStore for FileSubnetStore {
    fn create_subnet_file(&self, subnet: &Subnetwork) -> Result<(), StoreError> {
        let path = self.path_for(subnet.key());
        if path.exists() {
            return Err(StoreError::AlreadyExists { path });
        }

        // the header is complete before the record name exists; the temp
        // file is deleted on every early return
        let mut temp = tempfile::Builder::new()
            .prefix(&format!("{}.", file_name_for(subnet.key())))
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.data_dir)
            .map_err(StoreError::io("create temp file", &self.data_dir))?;
        temp.as_file_mut()
            .write_all(encode_header(subnet.definition()).as_bytes())
            .and_then(|()| self.checkpoint("write subnet header"))
            .map_err(StoreError::io("write subnet header", temp.path()))?;
        temp.as_file()
            .sync_all()
            .and_then(|()| self.checkpoint("sync subnet file"))
            .map_err(StoreError::io("sync subnet file", temp.path()))?;

        match temp.persist_noclobber(&path) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists { path });
            }
            Err(e) => return Err(StoreError::io("link subnet file", path)(e.error)),
        }
        self.sync_dir()
    }

    fn append_reservation(&self, key: &SubnetKey, address: IpAddr) -> Result<(), StoreError> {
        let path = self.path_for(key);

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(StoreError::io("open subnet file", &path))?;
        let committed_len = file
            .metadata()
            .map_err(StoreError::io("stat subnet file", &path))?
            .len();

        let result = file
            .write_all(encode_reservation(address).as_bytes())
            .and_then(|()| self.checkpoint("append to subnet file"))
            .map_err(StoreError::io("append to subnet file", &path))
            .and_then(|()| self.sync_append(&file, &path));

        if result.is_err() {
            // cut off whatever part of the line reached the file
            match file.set_len(committed_len).and_then(|()| file.sync_data()) {
                Ok(()) => debug!(subnet = %key, "[ipam] Failed append truncated"),
                Err(e) => error!(
                    subnet = %key,
                    path = %path.display(),
                    error = %e,
                    "[ipam] Could not truncate failed append"
                ),
            }
        }
        result
    }

    fn rewrite_subnet_file(&self, subnet: &Subnetwork) -> Result<(), StoreError> {
        let path = self.path_for(subnet.key());
        let temp = self.sibling(subnet.key(), TEMP_SUFFIX);

        if let Err(e) = self.write_temp(&temp, &encode_record(subnet)) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        let result = self.replace(&temp, &path);
        if matches!(result, Err(ref e) if !e.is_unsynced()) {
            let _ = fs::remove_file(&temp);
        }
        result
    }

    fn remove_subnet_file(&self, key: &SubnetKey, policy: RemovalPolicy) -> Result<(), StoreError> {
        let path = self.path_for(key);

        let result = match policy {
            RemovalPolicy::Archive => {
                let archived = self.sibling(key, ARCHIVE_SUFFIX);
                self.checkpoint("archive subnet file")
                    .and_then(|()| fs::rename(&path, &archived))
                    .map_err(StoreError::io("archive subnet file", &path))
            }
            RemovalPolicy::Delete => self
                .checkpoint("delete subnet file")
                .and_then(|()| fs::remove_file(&path))
                .map_err(StoreError::io("delete subnet file", &path)),
        };

        match result {
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!(subnet = %key, "[ipam] No subnet file to remove");
                Ok(())
            }
            Err(e) => Err(e),
            Ok(()) => self.sync_dir(),
        }
    }

    fn load_all(&self) -> Result<SubnetRegistry, StoreError> {
        let entries = fs::read_dir(&self.data_dir)
            .map_err(StoreError::io("read data directory", &self.data_dir))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StoreError::io("read data directory", &self.data_dir))?;
            let file_type = entry
                .file_type()
                .map_err(StoreError::io("stat", entry.path()))?;
            if !file_type.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = %entry.path().display(), "[ipam] Skipping non UTF-8 file name");
                continue;
            };
            if is_record_file_name(&name) {
                files.push((name, entry.path()));
            }
        }
        files.sort();

        let registry = SubnetRegistry::new();
        for (name, path) in files {
            let bytes = fs::read(&path).map_err(StoreError::io("read subnet file", &path))?;
            let text = String::from_utf8_lossy(&bytes);

            let Some(subnet) = super::restore(&text, &name) else {
                continue;
            };
            let key = *subnet.key();

            if key_for_file_name(&name) != Some(key) {
                warn!(file = %name, subnet = %key, "[ipam] File name does not match subnet header");
            }
            if registry.has(&key) {
                warn!(file = %name, subnet = %key, "[ipam] Duplicate subnet record, later file wins");
            }

            debug!(
                subnet = %key,
                reserved = subnet.reserved_count(),
                "[ipam] Loaded subnet"
            );
            registry.set(key, subnet);
        }

        info!(
            data_dir = %self.data_dir.display(),
            subnets = registry.len(),
            "[ipam] Subnet store loaded"
        );
        Ok(registry)
    }
}
