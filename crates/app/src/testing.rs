//! In-memory fakes shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use owbridge_domain::address::DeviceAddress;
use owbridge_domain::attribute::Attribute;
use owbridge_domain::channel::Channel;
use owbridge_domain::error::{BusError, GatewayError};
use serde_json::Value;

use crate::context::GatewayContext;
use crate::ports::{OneWireBus, StatusSink, SystemControl};
use crate::registry::DeviceRegistry;

pub fn addr(text: &str) -> DeviceAddress {
    text.parse().unwrap()
}

pub fn ds18b20() -> DeviceAddress {
    addr("28.FF4516130100")
}

pub fn ds2438() -> DeviceAddress {
    addr("26.00000A1B2C3D")
}

pub fn ds2411() -> DeviceAddress {
    addr("01.0000ABCDEF01")
}

// ── Scripted bus ───────────────────────────────────────────────

#[derive(Default)]
pub struct ScriptedBus {
    channels: Mutex<HashMap<DeviceAddress, Channel>>,
    values: Mutex<HashMap<(DeviceAddress, Attribute), f64>>,
    failing: Mutex<HashSet<DeviceAddress>>,
    sample_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, address: DeviceAddress, channel: u8) -> Self {
        self.channels.lock().unwrap().insert(address, Channel(channel));
        self
    }

    pub fn with_value(self, address: DeviceAddress, attribute: Attribute, value: f64) -> Self {
        self.values.lock().unwrap().insert((address, attribute), value);
        self
    }

    pub fn with_sample_delay(mut self, delay: Duration) -> Self {
        self.sample_delay = delay;
        self
    }

    pub fn fail(&self, address: DeviceAddress) {
        self.failing.lock().unwrap().insert(address);
    }

    pub fn max_concurrent_samples(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl OneWireBus for ScriptedBus {
    async fn locate(&self, address: DeviceAddress) -> Result<Option<Channel>, GatewayError> {
        Ok(self.channels.lock().unwrap().get(&address).copied())
    }

    async fn sample(
        &self,
        address: DeviceAddress,
        _channel: Channel,
        attribute: Attribute,
    ) -> Result<f64, GatewayError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.sample_delay.is_zero() {
            tokio::time::sleep(self.sample_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&address) {
            return Err(BusError::Sampling { address, attribute }.into());
        }
        let value = self.values.lock().unwrap().get(&(address, attribute)).copied();
        value.ok_or_else(|| BusError::Unsupported { address, attribute }.into())
    }
}

// ── Recording sink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(Value, bool)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<Value> {
        self.sent.lock().unwrap().iter().map(|(v, _)| v.clone()).collect()
    }

    pub fn retained(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, retain)| *retain)
            .map(|(v, _)| v.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl StatusSink for RecordingSink {
    async fn send(&self, payload: String, retain: bool) -> Result<(), GatewayError> {
        let value: Value = serde_json::from_str(&payload)?;
        self.sent.lock().unwrap().push((value, retain));
        Ok(())
    }
}

// ── Recording control ──────────────────────────────────────────

/// Records how many messages the sink had seen when `restart` ran.
pub struct RecordingControl {
    sink: Arc<RecordingSink>,
    pub restarts: Mutex<Vec<usize>>,
}

impl RecordingControl {
    pub fn new(sink: Arc<RecordingSink>) -> Self {
        Self {
            sink,
            restarts: Mutex::new(Vec::new()),
        }
    }
}

impl SystemControl for RecordingControl {
    async fn restart(&self) -> Result<(), GatewayError> {
        let seen = self.sink.len();
        self.restarts.lock().unwrap().push(seen);
        Ok(())
    }
}

pub type TestContext = GatewayContext<Arc<ScriptedBus>, Arc<RecordingSink>>;

pub fn context(
    bus: Arc<ScriptedBus>,
    devices: Vec<DeviceAddress>,
) -> (Arc<TestContext>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let registry = DeviceRegistry::new(bus, devices);
    let ctx = Arc::new(GatewayContext::new(registry, Arc::clone(&sink)));
    (ctx, sink)
}
