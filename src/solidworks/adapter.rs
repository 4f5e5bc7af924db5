//! Connection-state tracking around a SolidWorks bridge.
//!
//! The adapter owns the single logical connection to the application.
//! Every operation lazily reconnects on entry if the state is
//! [`ConnectionState::Disconnected`]; there is no reconnection timer and
//! no liveness probing — a silently dropped connection is only discovered
//! when the next operation fails.
//!
//! Reconnection is best-effort: a failed connect attempt is logged and the
//! operation still proceeds against the bridge, whose own failure then
//! surfaces as the operation's error. Operation failures never change the
//! connection state; the state reflects the connection itself, not the
//! outcome of the last business call.

use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::BridgeError;
use crate::solidworks::bridge::SolidWorksBridge;

/// Connection state toward the SolidWorks application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection has been established (or the last attempt failed).
    Disconnected,
    /// A connect attempt succeeded; assumed live until an operation
    /// proves otherwise.
    Connected,
}

/// The process-wide adapter over the automation bridge.
///
/// The state mutex makes concurrent connect attempts (HTTP deployment
/// mode) serialise on one outcome instead of racing duplicate connects.
/// Under the stdio transport dispatch is already serialised, so the lock
/// is never contended there.
#[derive(Debug)]
pub struct SolidWorksAdapter<B> {
    bridge: B,
    state: Mutex<ConnectionState>,
}

impl<B: SolidWorksBridge> SolidWorksAdapter<B> {
    /// Creates an adapter in the `Disconnected` state.
    #[must_use]
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    /// Attempts to connect if not already connected.
    ///
    /// Returns whether the adapter is connected afterwards. A failed
    /// attempt leaves the state at `Disconnected`.
    pub async fn try_connect(&self) -> bool {
        let mut state = self.state.lock().await;
        if *state == ConnectionState::Connected {
            return true;
        }

        match self.bridge.connect().await {
            Ok(()) => {
                *state = ConnectionState::Connected;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to connect to SolidWorks");
                false
            }
        }
    }

    /// Lazy reconnect-on-use: connect if needed, proceed regardless.
    async fn ensure_connected(&self) {
        if !self.try_connect().await {
            tracing::warn!("Proceeding without a confirmed SolidWorks connection");
        }
    }

    /// Opens a document; returns whether the open succeeded.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] if the underlying automation call fails.
    pub async fn open_document(&self, file_path: &str) -> Result<bool, BridgeError> {
        self.ensure_connected().await;
        self.bridge.open_document(file_path).await
    }

    /// Extracts the property bag of a model file.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] if the underlying automation call fails.
    pub async fn get_model_properties(&self, file_path: &str) -> Result<Value, BridgeError> {
        self.ensure_connected().await;
        self.bridge.get_model_properties(file_path).await
    }

    /// Creates a new empty part and returns its file path.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] if the underlying automation call fails.
    pub async fn create_new_part(&self) -> Result<String, BridgeError> {
        self.ensure_connected().await;
        self.bridge.create_new_part().await
    }

    /// Exports a document to PDF; returns whether the export succeeded.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] if the underlying automation call fails.
    pub async fn export_to_pdf(
        &self,
        file_path: &str,
        output_path: &str,
    ) -> Result<bool, BridgeError> {
        self.ensure_connected().await;
        self.bridge.export_to_pdf(file_path, output_path).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MockBridge {
        connects: AtomicUsize,
        connect_fails: AtomicBool,
        operations: AtomicUsize,
        operation_fails: AtomicBool,
    }

    impl MockBridge {
        fn op<T>(&self, value: T) -> Result<T, BridgeError> {
            self.operations.fetch_add(1, Ordering::SeqCst);
            if self.operation_fails.load(Ordering::SeqCst) {
                return Err(BridgeError::Automation {
                    message: "automation refused".to_string(),
                });
            }
            Ok(value)
        }
    }

    #[async_trait]
    impl SolidWorksBridge for MockBridge {
        async fn connect(&self) -> Result<(), BridgeError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.connect_fails.load(Ordering::SeqCst) {
                return Err(BridgeError::ConnectFailed {
                    message: "no running instance".to_string(),
                });
            }
            Ok(())
        }

        async fn open_document(&self, _file_path: &str) -> Result<bool, BridgeError> {
            self.op(true)
        }

        async fn get_model_properties(&self, file_path: &str) -> Result<Value, BridgeError> {
            self.op(json!({"name": file_path}))
        }

        async fn create_new_part(&self) -> Result<String, BridgeError> {
            self.op("NewPart_1.SLDPRT".to_string())
        }

        async fn export_to_pdf(
            &self,
            _file_path: &str,
            _output_path: &str,
        ) -> Result<bool, BridgeError> {
            self.op(true)
        }
    }

    #[tokio::test]
    async fn starts_disconnected() {
        let adapter = SolidWorksAdapter::new(MockBridge::default());
        assert_eq!(adapter.state().await, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn operation_triggers_exactly_one_connect() {
        let adapter = SolidWorksAdapter::new(MockBridge::default());

        adapter.open_document("/x.SLDPRT").await.unwrap();

        assert_eq!(adapter.bridge.connects.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.state().await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn connected_adapter_does_not_reconnect() {
        let adapter = SolidWorksAdapter::new(MockBridge::default());

        adapter.create_new_part().await.unwrap();
        adapter.export_to_pdf("/x.SLDPRT", "/x.pdf").await.unwrap();
        adapter.get_model_properties("/x.SLDPRT").await.unwrap();

        assert_eq!(adapter.bridge.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_connect_is_best_effort() {
        let adapter = SolidWorksAdapter::new(MockBridge::default());
        adapter.bridge.connect_fails.store(true, Ordering::SeqCst);

        // Operation still reaches the bridge despite the failed connect
        let opened = adapter.open_document("/x.SLDPRT").await.unwrap();

        assert!(opened);
        assert_eq!(adapter.state().await, ConnectionState::Disconnected);
        assert_eq!(adapter.bridge.operations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_connect_retries_on_next_operation() {
        let adapter = SolidWorksAdapter::new(MockBridge::default());
        adapter.bridge.connect_fails.store(true, Ordering::SeqCst);

        adapter.open_document("/x.SLDPRT").await.unwrap();
        adapter.open_document("/x.SLDPRT").await.unwrap();

        assert_eq!(adapter.bridge.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn operation_failure_does_not_change_state() {
        let adapter = SolidWorksAdapter::new(MockBridge::default());
        adapter.try_connect().await;
        adapter.bridge.operation_fails.store(true, Ordering::SeqCst);

        let err = adapter.open_document("/x.SLDPRT").await.unwrap_err();

        assert!(err.to_string().contains("automation refused"));
        assert_eq!(adapter.state().await, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn get_model_properties_is_idempotent() {
        let adapter = SolidWorksAdapter::new(MockBridge::default());

        let first = adapter.get_model_properties("/x/y.part").await.unwrap();
        let second = adapter.get_model_properties("/x/y.part").await.unwrap();

        assert_eq!(first, second);
    }
}
