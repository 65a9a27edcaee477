use anyhow::{Result, bail};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::debug;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::model::ProgressEvent;
use crate::source::DownloadStream;

const KNOWN_TEMPLATE: &str = "{msg} [{bar:20}] {percent}% ({bytes} / {total_bytes})";
const COUNTER_TEMPLATE: &str = "{msg} {spinner} {bytes}";

/// Renders one download's progress as a single stdout line.
pub struct ProgressReporter {
    bar: ProgressBar,
    last_percent: Option<u64>,
    counting: bool,
}

impl ProgressReporter {
    /// A reporter labelled `label`; nothing is drawn unless `visible`.
    pub fn new(label: impl Into<String>, visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_message(label.into());
        Self {
            bar,
            last_percent: None,
            counting: false,
        }
    }

    /// Drain `events` until the download terminates.
    ///
    /// Resolves with the path reported by `Completed`; fails on `Canceled`
    /// or when the stream ends without a terminal event.
    pub async fn consume(mut self, mut events: DownloadStream) -> Result<Option<PathBuf>> {
        while let Some(event) = events.next().await {
            match event {
                ProgressEvent::InProgress {
                    received_bytes,
                    total_bytes,
                } => self.update(received_bytes, total_bytes),
                ProgressEvent::Completed { path } => {
                    self.bar.finish_and_clear();
                    return Ok(path);
                }
                ProgressEvent::Canceled { reason } => {
                    self.bar.finish_and_clear();
                    bail!("Download canceled: {}", reason);
                }
            }
        }
        self.bar.finish_and_clear();
        bail!("Download ended without completing")
    }

    fn update(&mut self, received: u64, total: Option<u64>) {
        match total {
            Some(total) => {
                let percent = percent(received, total);
                if self.last_percent == Some(percent) {
                    return;
                }
                self.last_percent = Some(percent);
                if self.bar.length() != Some(total) {
                    self.bar.set_style(style(KNOWN_TEMPLATE).progress_chars("##-"));
                    self.bar.set_length(total);
                }
                self.bar.set_position(received.min(total));
            }
            None => {
                if !self.counting {
                    self.counting = true;
                    self.bar.set_style(style(COUNTER_TEMPLATE));
                    if !self.bar.is_hidden() {
                        self.bar.enable_steady_tick(Duration::from_millis(100));
                    }
                }
                self.bar.set_position(received);
            }
        }
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|e| {
        debug!("Invalid progress template {:?}: {}", template, e);
        ProgressStyle::default_bar()
    })
}

fn percent(received: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (received.min(total) * 100) / total
}
