use tokio::sync::mpsc;

/// Signals a booking sends to whoever opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalEvent {
    Closed {
        booked: bool,
        session_id: Option<String>,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<ModalEvent>,
}

impl EventBus {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ModalEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: ModalEvent) {
        let _ = self.tx.send(event).await;
    }
}
