// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Work run once per tick. Runs on the blocking pool because vendor tools
/// are spawned synchronously.
pub type TickFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// A single repeating poll task.
///
/// The next tick is only scheduled after the previous one returned, so a
/// slow tool delays the schedule instead of overlapping ticks. At most one
/// task exists; starting again replaces it.
#[derive(Default)]
pub struct PollScheduler {
    task: Option<(watch::Sender<bool>, JoinHandle<()>)>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }

    /// Run `tick` now and then every `interval`, stopping any previous task first.
    pub async fn start(&mut self, interval: Duration, tick: TickFn) {
        self.stop().await;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            info!("Polling every {}s", interval.as_secs_f64());
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }

                let tick = tick.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || tick()).await {
                    error!("Poll tick did not complete: {e}");
                }

                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        // A dropped sender also means stop
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            info!("Polling stopped");
        });

        self.task = Some((shutdown_tx, handle));
    }

    /// Stop the task and wait for a tick in flight to finish. No tick
    /// starts after this returns.
    pub async fn stop(&mut self) {
        if let Some((shutdown_tx, handle)) = self.task.take() {
            let _ = shutdown_tx.send(true);
            if let Err(e) = handle.await {
                error!("Poll task ended abnormally: {e}");
            }
        }
    }
}
