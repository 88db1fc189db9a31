use std::io::{self, Stdout, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use super::{OutputSink, Renderer, SkipReason, format_elapsed};

/// Writes one block per notification, prefixed with the provider identifier.
pub struct TerminalSink<W, R> {
    out: Mutex<W>,
    renderer: R,
}

impl<R: Renderer> TerminalSink<Stdout, R> {
    pub fn stdout(renderer: R) -> Self {
        Self::new(io::stdout(), renderer)
    }
}

impl<W: Write + Send, R: Renderer> TerminalSink<W, R> {
    pub fn new(out: W, renderer: R) -> Self {
        Self {
            out: Mutex::new(out),
            renderer,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_block(&self, block: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(out, "{block}").and_then(|_| out.flush()) {
            tracing::warn!(error = %err, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send, R: Renderer> OutputSink for TerminalSink<W, R> {
    fn show_pending(&self, provider_id: &str, display_name: &str) {
        self.write_block(&format!("[{provider_id}] Querying {display_name}..."));
    }

    fn show_result(&self, provider_id: &str, text: &str, elapsed: Duration) {
        let body = match self.renderer.render(text) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::debug!(provider = provider_id, error = %err, "rendering failed, showing raw text");
                text.to_string()
            }
        };
        self.write_block(&format!(
            "[{provider_id}] ({})\n{body}\n",
            format_elapsed(elapsed)
        ));
    }

    fn show_error(&self, provider_id: &str, message: &str) {
        self.write_block(&format!("[{provider_id}] Error: {message}\n"));
    }

    fn show_skipped(&self, provider_id: &str, reason: &SkipReason) {
        match reason {
            SkipReason::MissingCredential { .. } => {
                self.write_block(&format!("[{provider_id}] {reason}\n"))
            }
            SkipReason::InvalidCredential { .. } => {
                self.write_block(&format!("[{provider_id}] Error: {reason}\n"))
            }
        }
    }
}
