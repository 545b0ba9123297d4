use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::{render::RenderFrame, render::RenderSurface, Result};

/// Configuration options for the frame recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Keep one frame out of every `every` presented.
    pub every: u32,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self { every: 1 }
    }
}

/// Render surface that writes frames as JSON lines.
#[derive(Debug)]
pub struct FrameRecorder<W: Write> {
    settings: RecordingSettings,
    writer: W,
    is_recording: bool,
    seen: u64,
    written: u64,
}

impl<W: Write> FrameRecorder<W> {
    pub fn new(settings: RecordingSettings, writer: W) -> Self {
        Self {
            settings,
            writer,
            is_recording: false,
            seen: 0,
            written: 0,
        }
    }

    pub fn start(&mut self) {
        self.is_recording = true;
    }

    pub fn stop(&mut self) -> Result<()> {
        self.is_recording = false;
        self.writer.flush()?;
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSurface for FrameRecorder<W> {
    fn present(&mut self, frame: &RenderFrame) -> Result<()> {
        if !self.is_recording {
            return Ok(());
        }
        let keep = self.seen % u64::from(self.settings.every.max(1)) == 0;
        self.seen += 1;
        if !keep {
            return Ok(());
        }

        serde_json::to_writer(&mut self.writer, frame)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.stop()
    }
}
