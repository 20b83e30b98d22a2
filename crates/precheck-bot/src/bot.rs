//! Message loop: dispatch each incoming message and send its reply.

use crate::commands::{dispatch, CommandHandler};
use crate::error::{AppError, AppResult};
use onebot_client::{BotMessage, OneBotClient};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info, warn};

/// Extra time on top of the upstream timeout granted to in-flight replies at shutdown.
pub const DRAIN_MARGIN: Duration = Duration::from_secs(5);

pub struct Bot {
    handlers: Arc<Vec<Arc<dyn CommandHandler>>>,
    onebot: OneBotClient,
    fallback: &'static str,
    drain_timeout: Duration,
}

impl Bot {
    pub fn new(
        handlers: Vec<Arc<dyn CommandHandler>>,
        onebot: OneBotClient,
        fallback: &'static str,
        drain_timeout: Duration,
    ) -> Self {
        Self {
            handlers: Arc::new(handlers),
            onebot,
            fallback,
            drain_timeout,
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Consume messages until `shutdown` resolves or the stream ends.
    ///
    /// Each message is handled on its own task. Before returning, tasks still
    /// in flight get up to the drain timeout to deliver their reply. A closed
    /// stream is an error so a supervisor can restart the process.
    pub async fn run<S, F>(&self, stream: S, shutdown: F) -> AppResult<()>
    where
        S: Stream<Item = BotMessage>,
        F: Future<Output = ()>,
    {
        tokio::pin!(stream);
        tokio::pin!(shutdown);
        let mut tasks = JoinSet::new();

        let result = loop {
            tokio::select! {
                message = stream.next() => match message {
                    Some(message) => {
                        tasks.spawn(respond(
                            self.handlers.clone(),
                            self.onebot.clone(),
                            message,
                            self.fallback,
                        ));
                    }
                    None => {
                        error!("Event stream closed, no further messages will arrive");
                        break Err(AppError::StreamClosed);
                    }
                },
                Some(joined) = tasks.join_next() => {
                    if let Err(e) = joined {
                        error!("Reply task failed: {}", e);
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break Ok(());
                }
            }
        };

        self.drain(tasks).await;
        result
    }

    async fn drain(&self, mut tasks: JoinSet<()>) {
        if tasks.is_empty() {
            return;
        }

        info!("Waiting for {} in-flight replies", tasks.len());
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!("Reply task failed: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Abandoning {} replies after {:?}", tasks.len(), self.drain_timeout);
            tasks.abort_all();
        }
    }
}

async fn respond(
    handlers: Arc<Vec<Arc<dyn CommandHandler>>>,
    onebot: OneBotClient,
    message: BotMessage,
    fallback: &'static str,
) {
    if let Some(response) = dispatch(&handlers, &message, fallback).await {
        if let Err(e) = onebot.reply(&message, &response).await {
            error!("Failed to send reply: {}", e);
        }
    }
}
