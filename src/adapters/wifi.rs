//! Network Monitor: Wi-Fi station association lifecycle.
//!
//! Owns the radio through the [`WifiStation`] port.  The station's
//! notifications and the controller's start/stop requests share one
//! bounded queue, and a dedicated task applies them in order to an
//! [`AssociationTracker`].
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`EspStation`] wraps `esp_idf_svc::wifi::EspWifi`
//!   and the system event loop.
//! - **all other targets**: callers supply a [`WifiStation`] (tests use mocks).
//!
//! ## Retry policy
//!
//! `wifi_max_retries` bounds the association attempts of one cycle.
//! Station start triggers attempt 1; each disconnect triggers the next
//! attempt until the bound is spent, then `NotAbleToConnect` is reported
//! once and nothing more is attempted.  An acquired address reports
//! `Ready` and resets the count.

use std::sync::Arc;

use log::{info, warn};

use crate::app::ports::{StationEvent, StationNotifier, WifiStation};
use crate::config::TramConfig;
use crate::drivers::service::{CommandQueue, PeripheralService};
use crate::drivers::task_pin::NETWORK_TASK;
use crate::error::{Error, Result};

/// Network monitor queue depth.
pub const NETWORK_QUEUE_DEPTH: usize = 8;

pub type NetworkQueue = CommandQueue<NetworkInput, NETWORK_QUEUE_DEPTH>;

// ───────────────────────────────────────────────────────────────
// Reported outcome
// ───────────────────────────────────────────────────────────────

/// Terminal outcome of one association cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Ready,
    NotAbleToConnect,
}

// ───────────────────────────────────────────────────────────────
// Queue items
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkRequest {
    /// Bring the station up and associate.
    Start,
    /// Leave station mode.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkInput {
    Request(NetworkRequest),
    Station(StationEvent),
}

/// Producer handle the controller uses to drive the monitor.
#[derive(Clone)]
pub struct NetworkControl {
    queue: NetworkQueue,
}

impl NetworkControl {
    pub fn new(queue: NetworkQueue) -> Self {
        Self { queue }
    }

    /// Ask the monitor to start the station and associate.
    pub fn begin_association(&self) {
        self.queue.send(NetworkInput::Request(NetworkRequest::Start));
    }

    pub fn stop(&self) {
        self.queue.send(NetworkInput::Request(NetworkRequest::Stop));
    }

    pub fn queue(&self) -> &NetworkQueue {
        &self.queue
    }
}

// ───────────────────────────────────────────────────────────────
// Association tracker (pure)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    /// Station not started.
    Idle,
    /// Start requested, waiting for the stack to confirm.
    Starting,
    /// Attempt `attempt` of the current cycle is in flight.
    Associating { attempt: u8 },
    /// Address acquired.
    Connected,
    /// Retry bound spent; failure already reported.
    GaveUp,
}

/// What the monitor must do after feeding the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerAction {
    None,
    StartStation,
    StopStation,
    Connect,
    Report(NetworkState),
}

/// Retry bookkeeping, free of any radio or thread.
#[derive(Debug, Clone)]
pub struct AssociationTracker {
    max_attempts: u8,
    state: Association,
}

impl AssociationTracker {
    pub fn new(max_attempts: u8) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            state: Association::Idle,
        }
    }

    pub fn state(&self) -> Association {
        self.state
    }

    pub fn on_request(&mut self, request: NetworkRequest) -> TrackerAction {
        match (request, self.state) {
            (NetworkRequest::Start, Association::Idle) => {
                self.state = Association::Starting;
                TrackerAction::StartStation
            }
            (NetworkRequest::Start, Association::GaveUp) => {
                info!("WiFi: new association cycle");
                self.state = Association::Associating { attempt: 1 };
                TrackerAction::Connect
            }
            (NetworkRequest::Start, state) => {
                info!("WiFi: start ignored, already {:?}", state);
                TrackerAction::None
            }
            (NetworkRequest::Stop, Association::Idle) => TrackerAction::None,
            (NetworkRequest::Stop, _) => {
                self.state = Association::Idle;
                TrackerAction::StopStation
            }
        }
    }

    pub fn on_station_event(&mut self, event: StationEvent) -> TrackerAction {
        match (event, self.state) {
            (StationEvent::Started, Association::Starting) => {
                info!("WiFi: station started, connecting (1/{})", self.max_attempts);
                self.state = Association::Associating { attempt: 1 };
                TrackerAction::Connect
            }
            (StationEvent::Connected, Association::Associating { .. }) => {
                info!("WiFi: associated, waiting for address");
                TrackerAction::None
            }
            (StationEvent::GotIp, Association::Associating { .. }) => {
                info!("WiFi: address acquired");
                self.state = Association::Connected;
                TrackerAction::Report(NetworkState::Ready)
            }
            (StationEvent::Disconnected, Association::Associating { attempt }) => {
                if attempt < self.max_attempts {
                    let attempt = attempt + 1;
                    warn!("WiFi: disconnected, retrying ({}/{})", attempt, self.max_attempts);
                    self.state = Association::Associating { attempt };
                    TrackerAction::Connect
                } else {
                    warn!("WiFi: giving up after {} attempts", self.max_attempts);
                    self.state = Association::GaveUp;
                    TrackerAction::Report(NetworkState::NotAbleToConnect)
                }
            }
            (StationEvent::Disconnected, Association::Connected) => {
                warn!("WiFi: connection lost, reconnecting (1/{})", self.max_attempts);
                self.state = Association::Associating { attempt: 1 };
                TrackerAction::Connect
            }
            (StationEvent::Stopped, _) => {
                info!("WiFi: station stopped");
                self.state = Association::Idle;
                TrackerAction::None
            }
            (event, state) => {
                log::debug!("WiFi: {:?} ignored in {:?}", event, state);
                TrackerAction::None
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Monitor task
// ───────────────────────────────────────────────────────────────

/// Handle to the running network monitor.
pub struct NetworkMonitor {
    service: PeripheralService<NetworkInput, NETWORK_QUEUE_DEPTH>,
}

impl NetworkMonitor {
    /// Configure the station and start the monitor task.
    ///
    /// `on_state_change` runs on the monitor task once per association
    /// cycle and must only enqueue.
    pub fn init<W, F>(mut station: W, on_state_change: F, config: &TramConfig) -> Result<Self>
    where
        W: WifiStation + Send + 'static,
        F: Fn(NetworkState) + Send + 'static,
    {
        let queue = NetworkQueue::new();
        let notify: StationNotifier = {
            let queue = queue.clone();
            Arc::new(move |event| queue.send(NetworkInput::Station(event)))
        };
        station.init(config, notify).map_err(Error::Network)?;
        info!("WiFi: station configured for '{}'", config.wifi_ssid);

        let mut tracker = AssociationTracker::new(config.wifi_max_retries);
        let service = PeripheralService::spawn_with_queue(NETWORK_TASK, queue, move |input| {
            let action = match input {
                NetworkInput::Request(req) => tracker.on_request(req),
                NetworkInput::Station(event) => tracker.on_station_event(event),
            };
            let result = match action {
                TrackerAction::None => Ok(()),
                TrackerAction::StartStation => station.start(),
                TrackerAction::StopStation => station.stop(),
                TrackerAction::Connect => station.connect(),
                TrackerAction::Report(state) => {
                    on_state_change(state);
                    Ok(())
                }
            };
            if let Err(e) = result {
                warn!("WiFi: {:?} failed: {}", action, e);
            }
        })?;

        Ok(Self { service })
    }

    /// Start the station and begin associating.
    pub fn start(&self) {
        self.control().begin_association();
    }

    pub fn stop(&self) {
        self.control().stop();
    }

    /// Producer handle for the controller.
    pub fn control(&self) -> NetworkControl {
        NetworkControl::new(self.service.queue())
    }

    /// Stop the monitor task after pending inputs are handled.
    pub fn deinit(self) {
        info!("WiFi: deinit");
        self.service.shutdown();
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspStation;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
    use esp_idf_svc::netif::IpEvent;
    use esp_idf_svc::sys::ESP_ERR_INVALID_ARG;
    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent};
    use log::info;

    use crate::app::ports::{StationEvent, StationNotifier, WifiStation};
    use crate::config::TramConfig;
    use crate::error::DriverError;

    /// Station-mode radio plus its system event subscriptions.
    pub struct EspStation {
        wifi: EspWifi<'static>,
        sysloop: EspSystemEventLoop,
        subscriptions: Vec<EspSubscription<'static, System>>,
    }

    impl EspStation {
        pub fn new(wifi: EspWifi<'static>, sysloop: EspSystemEventLoop) -> Self {
            Self {
                wifi,
                sysloop,
                subscriptions: Vec::new(),
            }
        }
    }

    impl WifiStation for EspStation {
        fn init(&mut self, config: &TramConfig, notify: StationNotifier) -> Result<(), DriverError> {
            let on_wifi = notify.clone();
            let wifi_sub = self.sysloop.subscribe::<WifiEvent, _>(move |event| match event {
                WifiEvent::StaStarted => on_wifi(StationEvent::Started),
                WifiEvent::StaConnected(_) => on_wifi(StationEvent::Connected),
                WifiEvent::StaDisconnected(_) => on_wifi(StationEvent::Disconnected),
                WifiEvent::StaStopped => on_wifi(StationEvent::Stopped),
                other => info!("WiFi: unhandled event {:?}", other),
            })?;

            let on_ip = notify;
            let ip_sub = self.sysloop.subscribe::<IpEvent, _>(move |event| {
                if let IpEvent::DhcpIpAssigned(_) = event {
                    on_ip(StationEvent::GotIp);
                }
            })?;
            self.subscriptions.push(wifi_sub);
            self.subscriptions.push(ip_sub);

            let invalid = || DriverError::Radio(ESP_ERR_INVALID_ARG as i32);
            self.wifi
                .set_configuration(&Configuration::Client(ClientConfiguration {
                    ssid: config.wifi_ssid.as_str().try_into().map_err(|_| invalid())?,
                    password: config.wifi_password.as_str().try_into().map_err(|_| invalid())?,
                    auth_method: AuthMethod::WPA2Personal,
                    ..Default::default()
                }))?;
            info!("WiFi: init finished");
            Ok(())
        }

        fn start(&mut self) -> Result<(), DriverError> {
            self.wifi.start()?;
            Ok(())
        }

        fn connect(&mut self) -> Result<(), DriverError> {
            self.wifi.connect()?;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), DriverError> {
            self.wifi.stop()?;
            Ok(())
        }
    }

    impl Drop for EspStation {
        fn drop(&mut self) {
            // Unsubscribe before the driver goes away.
            self.subscriptions.clear();
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
