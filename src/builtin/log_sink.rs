//! Log provider: writes each signal as one JSON line, to a file or through `tracing`.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::info;

use crate::client::ClientHandle;
use crate::error::ProviderError;
use crate::host::HostContext;
use crate::provider::TelemetryProvider;
use crate::signal::Signal;

pub struct LogProvider {
    name: String,
    path: Option<PathBuf>,
    writer: Option<Mutex<BufWriter<File>>>,
}

impl LogProvider {
    /// Emit signals as `info!` events on the `signaldeck::signals` target
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            writer: None,
        }
    }

    /// Append signals as JSON lines to `path`, created on registration
    pub fn to_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            writer: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl TelemetryProvider for LogProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(
        &mut self,
        _context: Option<&HostContext>,
        _client: ClientHandle,
    ) -> Result<(), ProviderError> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            self.writer = Some(Mutex::new(BufWriter::new(file)));
        }
        Ok(())
    }

    fn ingest(&self, signal: &Signal) -> Result<(), ProviderError> {
        let line = serde_json::to_string(signal).map_err(anyhow::Error::from)?;
        match (&self.writer, &self.path) {
            (Some(writer), _) => {
                let mut writer = writer.lock();
                writeln!(writer, "{line}")?;
                writer.flush()?;
            }
            (None, Some(path)) => {
                return Err(ProviderError::Unavailable(format!(
                    "log file {} is not open",
                    path.display()
                )));
            }
            (None, None) => {
                info!(
                    target: "signaldeck::signals",
                    provider = %self.name,
                    signal = %line,
                    "signal"
                );
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ProviderError> {
        if let Some(writer) = self.writer.take() {
            writer.into_inner().flush()?;
        }
        Ok(())
    }
}
