use std::sync::Arc;

use super::config::Config;
use super::service::AlarmService;
use crate::subscribers::Subscribe;

/// Builder for an [`AlarmService`].
pub struct AlarmServiceBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl AlarmServiceBuilder {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue once the
    /// service is launched.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the service. Nothing is spawned until [`AlarmService::launch`].
    pub fn build(self) -> Arc<AlarmService> {
        Arc::new(AlarmService::new_internal(self.cfg, self.subscribers))
    }
}
