use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::domain::entities::report::VersionStamp;
use crate::usecase::ports::backend::ReportReader;

/// Periodic background probe of the server version stamp. Each tick does
/// the smallest possible read (page 1, size 1); when the stamp differs
/// from the last one seen, `on_change` fires so the owner can reload the
/// current page. Probe failures are a missed refresh, not a command
/// failure: they are logged and swallowed.
///
/// At most one timer is active per watcher; restarting cancels the
/// previous one first.
pub struct VersionWatcher {
    task: Option<JoinHandle<()>>,
}

impl VersionWatcher {
    pub fn new() -> Self {
        Self { task: None }
    }

    pub fn restart(
        &mut self,
        reader: Arc<dyn ReportReader>,
        every: Duration,
        last_seen: VersionStamp,
        on_change: impl Fn(VersionStamp) + Send + Sync + 'static,
    ) {
        self.stop();

        self.task = Some(tokio::spawn(async move {
            let mut seen = last_seen;
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately;
            // consume it so the first probe happens one period from now.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match reader.fetch_page(1, 1).await {
                    Ok(page) => {
                        if page.version != seen {
                            seen = page.version;
                            on_change(seen);
                        }
                    }
                    Err(err) => {
                        debug!(error = %err, "version probe failed; will retry next tick");
                    }
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Default for VersionWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VersionWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
