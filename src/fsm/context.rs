//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the configuration, the producer side of every
//! peripheral unit's command queue, and the bookkeeping the states need
//! between events.  Handlers never touch hardware; they only queue
//! commands here.

use crate::adapters::wifi::{NetworkControl, NetworkQueue};
use crate::config::TramConfig;
use crate::drivers::display::{DisplayCommand, DisplayQueue};
use crate::drivers::servo::{ActuatorCommand, ActuatorQueue};

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Configuration --
    pub config: TramConfig,

    // -- Peripheral units --
    /// Display unit command queue.
    pub display: DisplayQueue,
    /// Actuator unit command queue.
    pub actuator: ActuatorQueue,
    /// Network monitor control.
    pub network: NetworkControl,

    // -- Init state --
    /// Ticks left before `Init` hands over to network association.
    /// Goes negative on the tick that triggers the transition.
    pub init_countdown: i16,
}

impl FsmContext {
    /// Create a context bound to running peripheral units.
    pub fn new(
        config: TramConfig,
        display: DisplayQueue,
        actuator: ActuatorQueue,
        network: NetworkControl,
    ) -> Self {
        let init_countdown = i16::from(config.init_ticks);
        Self {
            config,
            display,
            actuator,
            network,
            init_countdown,
        }
    }

    /// Create a context whose queues have no unit behind them.
    /// Commands pile up until read back with `try_receive`.
    pub fn detached(config: TramConfig) -> Self {
        Self::new(
            config,
            DisplayQueue::new(),
            ActuatorQueue::new(),
            NetworkControl::new(NetworkQueue::new()),
        )
    }

    /// Replace whatever is on the panel with `text` on the status row.
    pub fn show_status(&self, text: &str) {
        self.display
            .send(DisplayCommand::draw_and_clear(text, self.config.status_row));
    }

    pub fn rotate_to(&self, angle_deg: i8) {
        self.actuator.send(ActuatorCommand::RotateTo(angle_deg));
    }

    /// Restart the `Init` countdown from the configured tick count.
    pub fn reset_init_countdown(&mut self) {
        self.init_countdown = i16::from(self.config.init_ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_starts_from_config() {
        let cfg = TramConfig {
            init_ticks: 2,
            ..TramConfig::default()
        };
        let mut ctx = FsmContext::detached(cfg);
        assert_eq!(ctx.init_countdown, 2);
        ctx.init_countdown = -1;
        ctx.reset_init_countdown();
        assert_eq!(ctx.init_countdown, 2);
    }

    #[test]
    fn status_goes_to_configured_row() {
        let cfg = TramConfig {
            status_row: 5,
            ..TramConfig::default()
        };
        let ctx = FsmContext::detached(cfg);
        ctx.show_status("Wifi");
        assert_eq!(
            ctx.display.try_receive(),
            Some(DisplayCommand::draw_and_clear("Wifi", 5))
        );
    }
}
