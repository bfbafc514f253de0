//! Standard MIDI File scanning and in-place pitch shifting.
//!
//! A file is a sequence of chunks: a 4-byte tag, a 4-byte big-endian length
//! and that many payload bytes. The first chunk must be `MThd`. `MTrk`
//! payloads are event streams; any other tag is carried through untouched.
//!
//! Shifting a pitch rewrites one data byte in place, so chunk lengths never
//! change. [`transpose_notes`] checks that invariant on its output anyway.

use crate::error::{MuseError, Result};
use std::path::Path;

/// Channel (0-based) reserved for percussion; never pitch-shifted.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Highest MIDI note/data value.
pub const MAX_NOTE: u8 = 127;

const HEADER_TAG: &[u8; 4] = b"MThd";
const TRACK_TAG: &[u8; 4] = b"MTrk";
const META_TRACK_NAME: u8 = 0x03;

/// Location of one chunk inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Four-byte chunk tag.
    pub tag: [u8; 4],
    /// Offset of the first payload byte.
    pub start: usize,
    /// Payload length from the header.
    pub len: usize,
}

impl ChunkSpan {
    /// One past the last payload byte.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// True for `MTrk` chunks.
    pub fn is_track(&self) -> bool {
        &self.tag == TRACK_TAG
    }
}

/// What a track scan found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackScan {
    /// Text of the first track-name meta event.
    pub name: Option<String>,
    /// Absolute offsets of note-number bytes on melodic channels.
    pub note_offsets: Vec<usize>,
}

/// Output of [`transpose_notes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiTranspose {
    /// Rewritten file, same length as the input.
    pub data: Vec<u8>,
    /// Track chunks that passed the name filter.
    pub tracks_in_scope: usize,
    /// Note bytes whose value changed.
    pub notes_changed: usize,
}

/// True for `.mid` / `.midi` paths (any case).
pub fn is_midi_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mid") || e.eq_ignore_ascii_case("midi"))
        .unwrap_or(false)
}

/// Splits a file into chunk spans.
///
/// # Errors
///
/// Returns `MalformedMidi` if the first chunk isn't `MThd`, a header is cut
/// short, or a length runs past the end of the data.
pub fn chunks(data: &[u8]) -> Result<Vec<ChunkSpan>> {
    let mut spans = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        if data.len() - pos < 8 {
            return Err(malformed(pos, "truncated chunk header"));
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&data[pos..pos + 4]);
        let len = u32::from_be_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        let start = pos + 8;

        if spans.is_empty() && &tag != HEADER_TAG {
            return Err(malformed(pos, "file does not start with MThd"));
        }
        if len > data.len() - start {
            return Err(malformed(
                pos + 4,
                format!("chunk length {} runs past end of file", len),
            ));
        }

        spans.push(ChunkSpan { tag, start, len });
        pos = start + len;
    }

    match spans.first() {
        None => Err(malformed(0, "empty file")),
        Some(header) if header.len < 6 => Err(malformed(4, "MThd chunk shorter than 6 bytes")),
        Some(_) => Ok(spans),
    }
}

/// Walks the events of one `MTrk` payload.
///
/// Meta and sysex events cancel running status, so a data byte right after
/// one is malformed.
pub fn scan_track(data: &[u8], span: &ChunkSpan) -> Result<TrackScan> {
    let end = span.end();
    let mut pos = span.start;
    let mut running: Option<u8> = None;
    let mut scan = TrackScan::default();

    while pos < end {
        let (_, after_delta) = read_vlq(data, pos, end)?;
        pos = after_delta;
        if pos >= end {
            return Err(malformed(pos, "event missing after delta time"));
        }

        let status = if data[pos] & 0x80 != 0 {
            let s = data[pos];
            pos += 1;
            s
        } else {
            running.ok_or_else(|| malformed(pos, "data byte without running status"))?
        };

        match status {
            0xFF => {
                if pos >= end {
                    return Err(malformed(pos, "meta event missing type"));
                }
                let kind = data[pos];
                let (len, body) = read_vlq(data, pos + 1, end)?;
                let body_end = checked_end(body, len, end)?;
                if kind == META_TRACK_NAME && scan.name.is_none() {
                    scan.name = Some(String::from_utf8_lossy(&data[body..body_end]).into_owned());
                }
                running = None;
                pos = body_end;
            }
            0xF0 | 0xF7 => {
                let (len, body) = read_vlq(data, pos, end)?;
                running = None;
                pos = checked_end(body, len, end)?;
            }
            0x80..=0xEF => {
                let kind = status & 0xF0;
                let channel = status & 0x0F;
                let width = if kind == 0xC0 || kind == 0xD0 { 1 } else { 2 };
                let data_end = checked_end(pos, width, end)?;
                if let Some(i) = (pos..data_end).find(|&i| data[i] & 0x80 != 0) {
                    return Err(malformed(i, "status byte where data byte expected"));
                }
                if (kind == 0x80 || kind == 0x90) && channel != PERCUSSION_CHANNEL {
                    scan.note_offsets.push(pos);
                }
                running = Some(status);
                pos = data_end;
            }
            other => {
                return Err(malformed(
                    pos.saturating_sub(1),
                    format!("unexpected status byte {:#04x}", other),
                ));
            }
        }
    }

    Ok(scan)
}

/// Checks that every chunk and track event parses.
pub fn validate(data: &[u8]) -> Result<()> {
    for span in chunks(data)? {
        if span.is_track() {
            scan_track(data, &span)?;
        }
    }
    Ok(())
}

/// Shifts note numbers by `semitones`, clamped to `0..=127`.
///
/// With a `track_filter`, only tracks whose name contains it
/// (case-insensitively) are touched; unnamed tracks are then out of scope.
/// Percussion-channel notes and every other byte are left alone.
///
/// # Errors
///
/// Returns `MalformedMidi` if the input can't be parsed, or if the output's
/// chunk layout differs from the input's.
pub fn transpose_notes(
    data: &[u8],
    semitones: i32,
    track_filter: Option<&str>,
) -> Result<MidiTranspose> {
    let spans = chunks(data)?;
    let filter = track_filter.map(str::to_lowercase);
    let mut out = data.to_vec();
    let mut tracks_in_scope = 0;
    let mut notes_changed = 0;

    for span in spans.iter().filter(|s| s.is_track()) {
        let scan = scan_track(data, span)?;
        let in_scope = match (&filter, &scan.name) {
            (None, _) => true,
            (Some(f), Some(name)) => name.to_lowercase().contains(f.as_str()),
            (Some(_), None) => false,
        };
        if !in_scope {
            continue;
        }
        tracks_in_scope += 1;

        for offset in scan.note_offsets {
            let shifted = shift_pitch(data[offset], semitones);
            if shifted != data[offset] {
                out[offset] = shifted;
                notes_changed += 1;
            }
        }
    }

    let out_spans = chunks(&out)?;
    if out_spans != spans {
        return Err(malformed(0, "chunk layout changed during transpose"));
    }

    Ok(MidiTranspose {
        data: out,
        tracks_in_scope,
        notes_changed,
    })
}

/// Adds `semitones` to a note number, clamped to the MIDI range.
pub fn shift_pitch(note: u8, semitones: i32) -> u8 {
    (i32::from(note) + semitones).clamp(0, i32::from(MAX_NOTE)) as u8
}

/// Reads a variable-length quantity; returns `(value, next_offset)`.
fn read_vlq(data: &[u8], mut pos: usize, end: usize) -> Result<(usize, usize)> {
    let start = pos;
    let mut value = 0usize;
    for _ in 0..4 {
        if pos >= end {
            return Err(malformed(start, "truncated variable-length quantity"));
        }
        let byte = data[pos];
        pos += 1;
        value = (value << 7) | usize::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, pos));
        }
    }
    Err(malformed(start, "variable-length quantity longer than 4 bytes"))
}

fn checked_end(start: usize, len: usize, end: usize) -> Result<usize> {
    match start.checked_add(len) {
        Some(e) if e <= end => Ok(e),
        _ => Err(malformed(start, format!("{} bytes run past end of chunk", len))),
    }
}

fn malformed(offset: usize, reason: impl Into<String>) -> MuseError {
    MuseError::MalformedMidi {
        offset,
        reason: reason.into(),
    }
}
