use plume_core::{Grid, Readings, SimulationConfig};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
pub struct Summary<'a> {
    pub n: usize,
    pub steps: usize,
    pub h: f64,
    pub stability: f64,
    pub coefficient: f64,
    pub readings: Readings,
    pub config: &'a SimulationConfig,
}

/// One line of frames.jsonl; `frame` is filled in by the writer.
#[derive(Serialize)]
pub struct FrameRow {
    pub step: usize,
    pub time: f64,
    pub source_value: f64,
    pub readings: Readings,
}

#[derive(Serialize)]
struct IndexedRow<'a> {
    frame: u64,
    #[serde(flatten)]
    row: &'a FrameRow,
}

/// frames.bin holds the layers back to back (little-endian f64, row-major);
/// frames.jsonl holds one metadata row per layer.
pub struct FrameWriter {
    grids: BufWriter<File>,
    meta: BufWriter<File>,
    count: u64,
}

impl FrameWriter {
    pub fn create(dir: &Path) -> std::io::Result<FrameWriter> {
        Ok(FrameWriter {
            grids: BufWriter::new(File::create(dir.join("frames.bin"))?),
            meta: BufWriter::new(File::create(dir.join("frames.jsonl"))?),
            count: 0,
        })
    }

    pub fn push(&mut self, grid: &Grid, row: &FrameRow) -> anyhow::Result<()> {
        write_f64_vec(&mut self.grids, grid.cells())?;

        serde_json::to_writer(&mut self.meta, &IndexedRow { frame: self.count, row })?;
        self.meta.write_all(b"\n")?;

        self.count += 1;
        Ok(())
    }

    pub fn finish(mut self) -> std::io::Result<u64> {
        self.grids.flush()?;
        self.meta.flush()?;
        Ok(self.count)
    }
}

pub fn write_f64_vec<W: Write>(w: &mut W, v: &[f64]) -> std::io::Result<()> {
    for &x in v {
        w.write_all(&x.to_le_bytes())?;
    }
    Ok(())
}
