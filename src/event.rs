use std::io;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::warn;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// One line typed by the user.
    Input(String),
    /// The input stream ended or failed; no further `Input` events follow.
    InputClosed,
    /// Sampling tick.
    Tick,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    /// Merges `input` lines with a sampling tick every `tick_rate`. A tick
    /// that is late is skipped rather than replayed.
    pub fn new<S>(tick_rate: Duration, input: S) -> Self
    where
        S: Stream<Item = io::Result<String>> + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();

        let task = tokio::spawn(async move {
            let mut input = input;
            let mut input_open = true;
            let mut tick_interval = tokio::time::interval(tick_rate);
            tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    maybe_line = input.next(), if input_open => {
                        let event = match maybe_line {
                            Some(Ok(line)) => Event::Input(line),
                            Some(Err(err)) => {
                                warn!(error = %err, "input stream failed");
                                input_open = false;
                                Event::InputClosed
                            }
                            None => {
                                input_open = false;
                                Event::InputClosed
                            }
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    _ = tick_interval.tick() => {
                        if tx.send(Event::Tick).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { rx, _task: task }
    }

    pub fn with_stdin(tick_rate: Duration) -> Self {
        Self::new(tick_rate, stdin_lines())
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

pub fn stdin_lines() -> impl Stream<Item = io::Result<String>> + Send + Unpin {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    Box::pin(futures::stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), lines)),
            Ok(None) => None,
            Err(err) => Some((Err(err), lines)),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn one_tick_per_interval() {
        let mut events = EventHandler::new(
            Duration::from_secs(1),
            futures::stream::pending::<io::Result<String>>(),
        );
        let mut stamps = Vec::new();
        while stamps.len() < 4 {
            match events.next().await {
                Some(Event::Tick) => stamps.push(Instant::now()),
                other => panic!("unexpected event {other:?}"),
            }
        }
        for pair in stamps.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::from_secs(1));
        }
    }

    #[tokio::test]
    async fn forwards_lines_then_closes() {
        let input = futures::stream::iter(vec![Ok("start".to_string()), Ok("cpu 10".to_string())]);
        let mut events = EventHandler::new(Duration::from_secs(3600), input);
        let mut seen = Vec::new();
        while let Some(event) = events.next().await {
            match event {
                Event::Tick => continue,
                Event::InputClosed => break,
                Event::Input(line) => seen.push(line),
            }
        }
        assert_eq!(seen, vec!["start".to_string(), "cpu 10".to_string()]);
    }
}
