use tokio::sync::broadcast::{self, error::RecvError};

pub struct EventBus<T> {
    tx: broadcast::Sender<T>,
}

pub struct EventListener<T> {
    rx: broadcast::Receiver<T>,
}

#[derive(Clone)]
pub struct EventEmitter<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + std::fmt::Debug> EventBus<T> {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    pub fn subscribe(&self) -> EventListener<T> {
        EventListener { rx: self.tx.subscribe() }
    }

    pub fn emitter(&self) -> EventEmitter<T> {
        EventEmitter { tx: self.tx.clone() }
    }
}

impl<T: Clone> EventListener<T> {
    /// Waits for the next event. Lagging listeners skip the lost events and keep receiving,
    /// `None` is only returned once all emitters are gone.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Closed) => {
                    tracing::debug!("Event channel of {} closed", std::any::type_name::<T>());
                    return None;
                }
                Err(RecvError::Lagged(count)) => {
                    tracing::warn!(
                        "Event listener of {} lagged by {} messages",
                        std::any::type_name::<T>(),
                        count
                    );
                }
            }
        }
    }
}

impl<T: Clone + std::fmt::Debug> EventEmitter<T> {
    /// Sends the event to all current listeners. Having no listener is not an error.
    pub fn send(&self, event: T) {
        if self.tx.receiver_count() == 0 {
            tracing::trace!("No listener for event {:?}", event);
            return;
        }

        if let Err(e) = self.tx.send(event) {
            tracing::error!("Error sending event: {}", e);
        }
    }
}
