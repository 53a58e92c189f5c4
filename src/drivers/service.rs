//! Single-owner peripheral units.
//!
//! A peripheral unit is one thread that owns a piece of hardware and
//! executes commands from a bounded FIFO, strictly in arrival order.
//! Producers hold a cloned [`CommandQueue`]; a full queue suspends the
//! producer (backpressure) rather than dropping the command.
//!
//! ```text
//!  Controller ──send()──▶ CommandQueue<C, N> ──▶ unit thread ──▶ driver
//!             (blocks when full)        (FIFO)     (sole owner)
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use futures_lite::future::{self, block_on};
use log::{info, warn};

use super::task_pin::{self, TaskSpec};
use crate::error::Error;

struct Shared<C, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, C, N>,
    stop: Signal<CriticalSectionRawMutex, ()>,
}

/// Bounded, ordered command channel shared between producers and one unit.
pub struct CommandQueue<C, const N: usize> {
    shared: Arc<Shared<C, N>>,
}

impl<C, const N: usize> Clone for CommandQueue<C, N> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C, const N: usize> Default for CommandQueue<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, const N: usize> CommandQueue<C, N> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                channel: Channel::new(),
                stop: Signal::new(),
            }),
        }
    }

    /// Enqueue a command, suspending the caller while the queue is full.
    pub fn send(&self, cmd: C) {
        block_on(self.shared.channel.send(cmd));
    }

    /// Enqueue without blocking; hands the command back if the queue is full.
    pub fn try_send(&self, cmd: C) -> Result<(), C> {
        self.shared
            .channel
            .try_send(cmd)
            .map_err(|TrySendError::Full(cmd)| cmd)
    }

    /// Take the oldest pending command, if any.
    pub fn try_receive(&self) -> Option<C> {
        self.shared.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.shared.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.channel.is_empty()
    }

    fn request_stop(&self) {
        self.shared.stop.signal(());
    }

    /// The next command, or `None` once a stop has been requested and
    /// nothing is waiting.
    async fn next_command(&self) -> Option<C> {
        future::or(async { Some(self.shared.channel.receive().await) }, async {
            self.shared.stop.wait().await;
            None
        })
        .await
    }
}

/// A running peripheral unit: the thread plus the producer side of its queue.
pub struct PeripheralService<C, const N: usize> {
    spec: TaskSpec,
    queue: CommandQueue<C, N>,
    task: Option<JoinHandle<()>>,
}

impl<C: Send + 'static, const N: usize> PeripheralService<C, N> {
    /// Spawn the unit thread.  `handler` runs once per command, in order,
    /// and is the only code that ever touches the owned peripheral.
    pub fn spawn(spec: TaskSpec, handler: impl FnMut(C) + Send + 'static) -> Result<Self, Error> {
        Self::spawn_with_queue(spec, CommandQueue::new(), handler)
    }

    /// Like [`spawn`](Self::spawn), but serving a queue created earlier,
    /// for units whose producers must exist before the task does.
    pub fn spawn_with_queue(
        spec: TaskSpec,
        queue: CommandQueue<C, N>,
        mut handler: impl FnMut(C) + Send + 'static,
    ) -> Result<Self, Error> {
        let rx = queue.clone();
        let name = spec.display_name();

        let task = task_pin::spawn_on_core(spec, move || {
            while let Some(cmd) = block_on(rx.next_command()) {
                handler(cmd);
            }
            // Commands that raced the stop request still run.
            while let Some(cmd) = rx.try_receive() {
                handler(cmd);
            }
            info!("{}: task stopped", name);
        })?;

        Ok(Self {
            spec,
            queue,
            task: Some(task),
        })
    }

    /// Blocking enqueue (see [`CommandQueue::send`]).
    pub fn send(&self, cmd: C) {
        self.queue.send(cmd);
    }

    /// A producer handle for other units.
    pub fn queue(&self) -> CommandQueue<C, N> {
        self.queue.clone()
    }

    /// Stop the unit after it has executed every command queued so far.
    pub fn shutdown(mut self) {
        self.queue.request_stop();
        if let Some(task) = self.task.take() {
            if task.join().is_err() {
                warn!("{}: task panicked", self.spec.display_name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::task_pin::DISPLAY_TASK;
    use std::sync::Mutex;

    #[test]
    fn queue_is_fifo() {
        let q: CommandQueue<u8, 4> = CommandQueue::new();
        q.send(1);
        q.send(2);
        q.send(3);
        assert_eq!(q.len(), 3);
        assert_eq!(q.try_receive(), Some(1));
        assert_eq!(q.try_receive(), Some(2));
        assert_eq!(q.try_receive(), Some(3));
        assert_eq!(q.try_receive(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn try_send_hands_back_when_full() {
        let q: CommandQueue<u8, 2> = CommandQueue::new();
        assert!(q.try_send(1).is_ok());
        assert!(q.try_send(2).is_ok());
        assert_eq!(q.try_send(3), Err(3));
    }

    #[test]
    fn full_queue_blocks_producer_until_space() {
        let q: CommandQueue<u8, 1> = CommandQueue::new();
        q.send(1);
        let producer = {
            let q = q.clone();
            std::thread::spawn(move || q.send(2))
        };
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert!(!producer.is_finished(), "send must suspend on a full queue");
        assert_eq!(q.try_receive(), Some(1));
        producer.join().unwrap();
        assert_eq!(q.try_receive(), Some(2));
    }

    #[test]
    fn service_executes_in_order_and_drains_before_stop() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let svc: PeripheralService<u32, 4> =
            PeripheralService::spawn(DISPLAY_TASK, move |n| sink.lock().unwrap().push(n)).unwrap();
        for n in 0..10 {
            svc.send(n);
        }
        svc.shutdown();
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn shutdown_does_not_wait_for_queue_space() {
        let gate = Arc::new(Mutex::new(()));
        let held = gate.lock().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (g, sink) = (Arc::clone(&gate), Arc::clone(&seen));
        let svc: PeripheralService<u32, 2> = PeripheralService::spawn(DISPLAY_TASK, move |n| {
            let _open = g.lock().unwrap();
            sink.lock().unwrap().push(n);
        })
        .unwrap();
        // One command in the handler, two more fill the queue.
        for n in 0..3 {
            svc.send(n);
        }
        let q = svc.queue();
        assert!(q.try_send(99).is_err());

        let stopper = std::thread::spawn(move || svc.shutdown());
        std::thread::sleep(std::time::Duration::from_millis(20));
        drop(held);
        stopper.join().unwrap();
        assert_eq!(*seen.lock().unwrap(), [0, 1, 2]);
    }
}
