//! Presenters turn per-tick world snapshots into output.

use std::io::Write;

use anyhow::{Context, Result};

use crate::{
    components::{Position, Resource},
    world::WorldSnapshot,
};

pub trait Presenter {
    fn present(&mut self, snapshot: &WorldSnapshot) -> Result<()>;
}

/// Discards every frame. Used for headless runs.
#[derive(Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _snapshot: &WorldSnapshot) -> Result<()> {
        Ok(())
    }
}

/// Repaints the whole grid as ASCII on every frame.
pub struct TextPresenter<W: Write> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, snapshot: &WorldSnapshot) -> Result<()> {
        let frame = render_grid(snapshot);
        writeln!(self.out, "tick {}", snapshot.tick)
            .and_then(|_| self.out.write_all(frame.as_bytes()))
            .and_then(|_| self.out.flush())
            .context("failed to write text frame")
    }
}

/// Writes one JSON document per frame, newline separated.
pub struct JsonPresenter<W: Write> {
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn present(&mut self, snapshot: &WorldSnapshot) -> Result<()> {
        serde_json::to_writer(&mut self.out, snapshot).context("failed to encode frame")?;
        writeln!(self.out)
            .and_then(|_| self.out.flush())
            .context("failed to write json frame")
    }
}

pub fn resource_glyph(resource: Option<Resource>) -> char {
    match resource {
        Some(Resource::Food) => 'f',
        Some(Resource::Wood) => 'w',
        Some(Resource::Stone) => 's',
        Some(Resource::Gold) => 'g',
        None => '.',
    }
}

/// One line per row. Agents are drawn over terrain as `M` (blue) or `F`
/// (pink); when several share a cell the last one wins.
pub fn render_grid(snapshot: &WorldSnapshot) -> String {
    let size = snapshot.size;
    let mut cells: Vec<char> = snapshot
        .tiles
        .iter()
        .map(|tile| resource_glyph(tile.resource))
        .collect();
    for agent in &snapshot.agents {
        let Position { x, y } = agent.position;
        if x < size && y < size {
            cells[y * size + x] = if agent.color == "blue" { 'M' } else { 'F' };
        }
    }

    let mut out = String::with_capacity(size * (size + 1));
    for row in cells.chunks(size.max(1)) {
        out.extend(row);
        out.push('\n');
    }
    out
}
