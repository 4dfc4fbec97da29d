use crate::verdict::{Phase, VerdictState};
use std::io::{self, Write};

/// Text block describing the state
///
/// Loading is drawn as an overlay line above whatever was shown before, so a
/// stale verdict or error stays visible while a new request runs.
pub fn render(state: &VerdictState) -> String {
    let mut out = String::new();

    if state.phase() == Phase::Requesting {
        out.push_str("[ Checking freshness... ]\n");
    }

    if let Some(error) = &state.error {
        out.push_str(&format!("Error: {}\n", error));
    }

    if let Some(result) = &state.result {
        out.push_str(&format!("{}: {}\n", result.label.headline(), result.verdict));
        out.push_str(&format!("Confidence: {}\n", result.confidence));
    }

    if out.is_empty() {
        out.push_str("Press Enter to check your freshness, q to quit.\n");
    }

    out
}

/// Writes rendered states to a terminal-like sink
pub struct Renderer<W> {
    out: W,
}

impl Renderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> Renderer<W> {
    pub fn draw(&mut self, state: &VerdictState) -> io::Result<()> {
        writeln!(self.out, "----------------------------------------")?;
        self.out.write_all(render(state).as_bytes())?;
        self.out.flush()
    }
}
