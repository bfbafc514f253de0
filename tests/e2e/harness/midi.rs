//! Tiny Standard MIDI File builder for fixtures.

/// A format-1 SMF assembled track by track.
#[derive(Default)]
pub struct MidiFile {
    tracks: Vec<Vec<u8>>,
}

impl MidiFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a track holding one note (on at delta 0, off after 96 ticks).
    pub fn note_track(self, name: Option<&str>, channel: u8, note: u8) -> Self {
        self.track(name, &[(channel, note)])
    }

    /// Adds a track playing `notes` one after another as `(channel, note)` pairs.
    pub fn track(mut self, name: Option<&str>, notes: &[(u8, u8)]) -> Self {
        let mut events = Vec::new();
        if let Some(name) = name {
            events.extend_from_slice(&[0x00, 0xFF, 0x03, name.len() as u8]);
            events.extend_from_slice(name.as_bytes());
        }
        for &(channel, note) in notes {
            events.extend_from_slice(&[0x00, 0x90 | channel, note, 100]);
            events.extend_from_slice(&[0x60, 0x80 | channel, note, 0]);
        }
        events.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        self.tracks.push(events);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = b"MThd".to_vec();
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&[0, 1]);
        data.extend_from_slice(&(self.tracks.len() as u16).to_be_bytes());
        data.extend_from_slice(&[0, 96]);
        for events in &self.tracks {
            data.extend_from_slice(b"MTrk");
            data.extend_from_slice(&(events.len() as u32).to_be_bytes());
            data.extend_from_slice(events);
        }
        data
    }
}

/// Every note-on pitch in `data`, in file order.
///
/// Assumes the layout [`MidiFile`] produces (no running status).
pub fn note_on_pitches(data: &[u8]) -> Vec<(u8, u8)> {
    let mut out = Vec::new();
    let mut i = 14;
    while i + 8 <= data.len() {
        let len = u32::from_be_bytes([data[i + 4], data[i + 5], data[i + 6], data[i + 7]]) as usize;
        let body = &data[i + 8..i + 8 + len];
        let mut j = 0;
        while j + 3 < body.len() {
            let status = body[j + 1];
            match status {
                0xFF => j += 4 + body[j + 3] as usize,
                s if s & 0xF0 == 0x90 => {
                    out.push((s & 0x0F, body[j + 2]));
                    j += 4;
                }
                _ => j += 4,
            }
        }
        i += 8 + len;
    }
    out
}
