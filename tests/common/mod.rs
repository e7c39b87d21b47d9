//! Scripted in-memory transport for driving the supervisor in tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use wsvisor::{
    Config, Connection, Event, EventKind, Frame, FrameKind, LivenessCallback, Subscribe, Transport,
    TransportError,
};

#[derive(Default)]
struct TransportState {
    fail_next: AtomicUsize,
    dial_delay: Mutex<Duration>,
    dials: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    auto_pong: AtomicBool,
    ack_close: AtomicBool,
    peers: Mutex<Vec<Arc<Peer>>>,
}

/// Transport whose dials succeed or fail on command and whose connections are [`Peer`]s.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<TransportState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` dials fail.
    pub fn fail_next(&self, n: usize) {
        self.state.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn set_dial_delay(&self, delay: Duration) {
        *self.state.dial_delay.lock().unwrap() = delay;
    }

    /// New connections answer every ping with a liveness pulse.
    pub fn set_auto_pong(&self, on: bool) {
        self.state.auto_pong.store(on, Ordering::SeqCst);
        for peer in self.state.peers.lock().unwrap().iter() {
            peer.auto_pong.store(on, Ordering::SeqCst);
        }
    }

    /// New connections echo a close frame back when one is sent.
    pub fn set_ack_close(&self, on: bool) {
        self.state.ack_close.store(on, Ordering::SeqCst);
    }

    pub fn dials(&self) -> usize {
        self.state.dials.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn peers(&self) -> Vec<Arc<Peer>> {
        self.state.peers.lock().unwrap().clone()
    }

    pub fn peer(&self, index: usize) -> Option<Arc<Peer>> {
        self.state.peers.lock().unwrap().get(index).cloned()
    }

    /// Waits (in virtual time) until the `index`-th connection exists.
    pub async fn wait_peer(&self, index: usize) -> Arc<Peer> {
        loop {
            if let Some(peer) = self.peer(index) {
                return peer;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Conn = MockConnection;

    async fn dial(&self, url: &Url) -> Result<MockConnection, TransportError> {
        let state = &self.state;
        state.dials.fetch_add(1, Ordering::SeqCst);
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *state.dial_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        state.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fail = state
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(TransportError::Dial {
                url: url.to_string(),
                error: "connection refused".into(),
            });
        }

        let peer = Arc::new(Peer::new(
            state.auto_pong.load(Ordering::SeqCst),
            state.ack_close.load(Ordering::SeqCst),
        ));
        state.peers.lock().unwrap().push(Arc::clone(&peer));
        Ok(MockConnection { peer })
    }
}

/// The remote side of one mock connection.
pub struct Peer {
    inbound_tx: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    inbound_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<Frame, TransportError>>>,
    sent: Mutex<Vec<Frame>>,
    fail_sends: AtomicBool,
    auto_pong: AtomicBool,
    ack_close: bool,
    closes: AtomicUsize,
    liveness: Mutex<Option<Arc<LivenessCallback>>>,
}

impl Peer {
    fn new(auto_pong: bool, ack_close: bool) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            auto_pong: AtomicBool::new(auto_pong),
            ack_close,
            closes: AtomicUsize::new(0),
            liveness: Mutex::new(None),
        }
    }

    pub fn push_text(&self, text: &str) {
        let _ = self.inbound_tx.send(Ok(Frame::text(text)));
    }

    pub fn push_close(&self, code: u16, reason: &str) {
        let _ = self.inbound_tx.send(Ok(Frame::close(code, reason)));
    }

    pub fn push_unknown(&self) {
        let _ = self
            .inbound_tx
            .send(Ok(Frame::new(FrameKind::Unknown, bytes::Bytes::new())));
    }

    pub fn push_error(&self, err: TransportError) {
        let _ = self.inbound_tx.send(Err(err));
    }

    /// Fires the registered liveness callback once.
    pub fn pong(&self) {
        let callback = self.liveness.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn set_fail_sends(&self, on: bool) {
        self.fail_sends.store(on, Ordering::SeqCst);
    }

    pub fn set_auto_pong(&self, on: bool) {
        self.auto_pong.store(on, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Frame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_of(&self, kind: FrameKind) -> Vec<Frame> {
        self.sent().into_iter().filter(|f| f.kind == kind).collect()
    }

    pub fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct MockConnection {
    peer: Arc<Peer>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let peer = &self.peer;
        if peer.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Send {
                error: "broken pipe".into(),
            });
        }

        let kind = frame.kind;
        peer.sent.lock().unwrap().push(frame);
        match kind {
            FrameKind::Ping if peer.auto_pong.load(Ordering::SeqCst) => peer.pong(),
            FrameKind::Close if peer.ack_close => peer.push_close(wsvisor::CLOSE_NORMAL, ""),
            _ => {}
        }
        Ok(())
    }

    async fn receive(&self) -> Result<Frame, TransportError> {
        let mut rx = self.peer.inbound_rx.lock().await;
        match rx.recv().await {
            Some(res) => res,
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_liveness(&self, callback: LivenessCallback) {
        *self.peer.liveness.lock().unwrap() = Some(Arc::new(callback));
    }
}

/// Subscriber that keeps every event it sees.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribers(self: &Arc<Self>) -> Vec<Arc<dyn Subscribe>> {
        vec![Arc::clone(self) as Arc<dyn Subscribe>]
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn of(&self, kind: EventKind) -> Vec<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Config for the mock endpoint; extra keys override the defaults.
pub fn config(pairs: &[(&str, &str)]) -> Config {
    let mut raw: HashMap<String, String> = HashMap::from([
        ("HOST".to_string(), "mock.local".to_string()),
        ("PORT".to_string(), "9000".to_string()),
        ("PATH".to_string(), "/feed".to_string()),
    ]);
    for (k, v) in pairs {
        raw.insert(k.to_string(), v.to_string());
    }
    Config::from_map(&raw).unwrap()
}

/// Interrupt future fired by dropping or sending on the returned sender.
pub fn interrupt() -> (tokio::sync::oneshot::Sender<()>, impl std::future::Future<Output = ()> + Send + 'static) {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    (tx, async move {
        let _ = rx.await;
    })
}
