//! Shared engine reference with atomic reload.

use std::sync::{Arc, RwLock};

use crate::engine::SettingsEngine;
use crate::{Error, Result};

/// Process-wide holder of the current [`SettingsEngine`].
///
/// Requests take an `Arc` snapshot with [`current`](Self::current) and keep
/// using it for their whole run. A reload builds the replacement engine
/// before taking the write lock, so a request sees either the old engine or
/// the new one and never a mix.
#[derive(Debug)]
pub struct SchemaHandle {
    engine: RwLock<Arc<SettingsEngine>>,
}

impl SchemaHandle {
    pub fn new(engine: SettingsEngine) -> Self {
        Self {
            engine: RwLock::new(Arc::new(engine)),
        }
    }

    /// Snapshot of the engine in effect right now.
    pub fn current(&self) -> Result<Arc<SettingsEngine>> {
        let guard = self.engine.read().map_err(|_| Error::HandlePoisoned)?;
        Ok(Arc::clone(&guard))
    }

    /// Swap in `engine`, returning the one it replaced.
    pub fn replace(&self, engine: SettingsEngine) -> Result<Arc<SettingsEngine>> {
        let mut guard = self.engine.write().map_err(|_| Error::HandlePoisoned)?;
        Ok(std::mem::replace(&mut *guard, Arc::new(engine)))
    }

    /// Build a new engine with `build` and swap it in.
    ///
    /// When `build` fails the current engine stays in effect and the error
    /// is returned.
    pub fn reload<F>(&self, build: F) -> Result<Arc<SettingsEngine>>
    where
        F: FnOnce() -> Result<SettingsEngine>,
    {
        let engine = match build() {
            Ok(engine) => engine,
            Err(e) => {
                tracing::warn!(error = %e, "Schema reload failed; keeping current definitions");
                return Err(e);
            }
        };
        tracing::info!(
            settings = engine.table().len(),
            computed = engine.graph().node_count(),
            "Reloaded settings schema"
        );
        self.replace(engine)?;
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_expr::Value;
    use slicer_schema::{AttributeDefinition, AttributeTable, ValueType};
    use std::path::PathBuf;

    fn engine_with(key: &str) -> SettingsEngine {
        SettingsEngine::new(AttributeTable::new([AttributeDefinition::new(
            key,
            ValueType::Int,
            Value::Int(1),
        )]))
    }

    #[test]
    fn snapshots_survive_reload() {
        let handle = SchemaHandle::new(engine_with("old_key"));
        let before = handle.current().unwrap();

        let after = handle.reload(|| Ok(engine_with("new_key"))).unwrap();

        assert!(before.table().contains("old_key"));
        assert!(after.table().contains("new_key"));
        assert!(handle.current().unwrap().table().contains("new_key"));
    }

    #[test]
    fn failed_reload_keeps_current_engine() {
        let handle = SchemaHandle::new(engine_with("old_key"));
        let err = handle
            .reload(|| {
                Err(Error::ConfigNotFound {
                    path: PathBuf::from("missing.toml"),
                })
            })
            .unwrap_err();

        assert!(matches!(err, Error::ConfigNotFound { .. }));
        assert!(handle.current().unwrap().table().contains("old_key"));
    }

    #[test]
    fn handle_is_shareable_across_threads() {
        let handle = Arc::new(SchemaHandle::new(engine_with("key")));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || handle.current().unwrap().table().len())
            })
            .collect();
        for worker in workers {
            assert_eq!(worker.join().unwrap(), 1);
        }
    }
}
