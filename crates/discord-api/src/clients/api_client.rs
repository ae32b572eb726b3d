use crate::config::ClientConfig;
use crate::error::CommandError;
use crate::transport::{ApiRequest, Transport};
use async_trait::async_trait;
use resource_marshal::{
    Allocator, Heap, JsonResource, ListElement, Owned, OwnedList, RawSpan, Resource,
};
use std::sync::Arc;
use tracing::warn;

/// What every client needs to run a command: where to send it, where resources
/// are allocated, and the limits to validate against. Cheap to clone.
#[derive(Clone)]
pub struct Connection {
    transport: Arc<dyn Transport>,
    alloc: Arc<dyn Allocator>,
    config: Arc<ClientConfig>,
}

impl Connection {
    /// A connection with the default config, allocating on the heap.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            alloc: Arc::new(Heap),
            config: Arc::new(ClientConfig::default()),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn with_allocator(mut self, alloc: Arc<dyn Allocator>) -> Self {
        self.alloc = alloc;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn allocator(&self) -> &dyn Allocator {
        self.alloc.as_ref()
    }
}

/// Trait for endpoint clients to share request dispatch.
///
/// Implementors only expose their [`Connection`]; sending the request and scanning
/// the response into a fresh resource is provided.
#[async_trait]
pub trait ApiClient: Send + Sync {
    fn connection(&self) -> &Connection;

    /// Sends `request` and scans the response into a newly allocated `R`.
    ///
    /// Response fields that fail to decode are logged and skipped; the resource is
    /// still returned.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, route = %request.route))]
    async fn dispatch<R>(&self, request: ApiRequest) -> Result<Owned<R>, CommandError>
    where
        R: JsonResource + Send + 'static,
    {
        tracing::debug!("Sending request");
        let connection = self.connection();
        let body = connection.transport().send(request).await?;

        let mut resource = R::alloc(connection.allocator())?;
        let report = resource.from_json(&body, connection.allocator())?;
        if !report.is_clean() {
            warn!(
                resource = <R as Resource>::NAME,
                failures = report.failures().len(),
                "Response fields skipped"
            );
        }
        Ok(resource)
    }

    /// Sends `request` and builds a list from the response array.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, route = %request.route))]
    async fn dispatch_list<T>(&self, request: ApiRequest) -> Result<OwnedList<T>, CommandError>
    where
        T: ListElement + Send + 'static,
    {
        tracing::debug!("Sending request");
        let connection = self.connection();
        let body = connection.transport().send(request).await?;
        Ok(OwnedList::from_json(
            RawSpan::whole(&body),
            connection.allocator(),
        )?)
    }
}

/// Logs a validation refusal and hands the error back.
pub(crate) fn refuse(error: CommandError) -> CommandError {
    warn!(%error, "Request refused");
    error
}

/// Rejects an empty path parameter.
pub(crate) fn require_id(value: &str, name: &'static str) -> Result<(), CommandError> {
    if value.is_empty() {
        return Err(refuse(CommandError::MissingId(name)));
    }
    Ok(())
}
