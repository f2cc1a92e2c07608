use council::{Presentation, Presenter};
use tokio::sync::broadcast;

/// Central hub for presentation events and log lines.
#[derive(Clone)]
pub struct EventBus {
    events: broadcast::Sender<Presentation>,
    logs: broadcast::Sender<String>,
}

impl EventBus {
    /// Default broadcast capacity for presentation events.
    pub const DEFAULT_EVENT_CAPACITY: usize = 64;
    /// Default broadcast capacity for log messages.
    pub const DEFAULT_LOG_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacities(Self::DEFAULT_EVENT_CAPACITY, Self::DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacities(event_capacity: usize, log_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        let (logs, _) = broadcast::channel(log_capacity);
        Self { events, logs }
    }

    /// Send a [`Presentation`] to every connected page. Dropped if nobody listens.
    pub fn publish(&self, event: Presentation) {
        let _ = self.events.send(event);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Presentation> {
        self.events.subscribe()
    }

    /// Send a log line to listeners.
    pub fn log(&self, msg: impl Into<String>) {
        let _ = self.logs.send(msg.into());
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<String> {
        self.logs.subscribe()
    }

    /// Access the log sender for initialization.
    pub fn log_sender(&self) -> broadcast::Sender<String> {
        self.logs.clone()
    }

    /// Number of pages currently listening for events.
    pub fn listeners(&self) -> usize {
        self.events.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for EventBus {
    fn present(&self, event: Presentation) {
        self.publish(event);
    }
}
