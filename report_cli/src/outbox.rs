//! File-backed email transport.
//!
//! Instead of delivering, the outbox drops `email.html` (the body) and
//! `email.json` (addressing, body and file references) into the run
//! directory, next to the images and attachments they point at.

use std::io::{BufWriter, Write};
use std::path::Path;

use report_render::file::create_new;
use report_render::{Email, EmailTransport};

pub const BODY_FILE: &str = "email.html";
pub const ENVELOPE_FILE: &str = "email.json";

#[derive(Clone, Copy, Debug, Default)]
pub struct OutboxTransport;

impl EmailTransport for OutboxTransport {
    fn send(&self, email: &Email) -> report_render::Result<()> {
        write_new(&email.run_dir.join(BODY_FILE), email.payload.html.as_bytes())?;
        let envelope = serde_json::to_vec_pretty(email)?;
        write_new(&email.run_dir.join(ENVELOPE_FILE), &envelope)?;
        tracing::info!("outbox: wrote `{}` to {}", email.subject, email.run_dir.display());
        Ok(())
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> report_render::Result<()> {
    let mut out = BufWriter::new(create_new(path)?);
    out.write_all(bytes)?;
    out.flush()?;
    Ok(())
}
