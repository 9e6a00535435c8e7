//! Command encoding
//!
//! A [`Frame`] is the set of panel colours to display, each with a device
//! side transition. It is rendered in one of two wire forms:
//!
//! - the `animData` string of a custom animation, written to `PUT /effects`
//!   on the control plane;
//! - a compact big-endian datagram for the streaming channel.
//!
//! The transition is passed through untouched; the device itself fades from
//! its current colour to the target over that time.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::{CoreError, Result};
use crate::panel::PanelId;

/// Bytes per panel in a stream datagram.
pub const STREAM_ENTRY_LEN: usize = 8;
/// Bytes of the panel count header.
pub const STREAM_HEADER_LEN: usize = 2;

/// Device-side fade duration in tenths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Transition(pub u16);

impl Transition {
    pub const NONE: Transition = Transition(0);
    /// 0.2s fade: smooth interpolation at the 10-15 fps typical of screen mirroring.
    pub const SMOOTH: Transition = Transition(2);

    /// Rounds seconds to the nearest tenth. Negative or NaN input maps to zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        let tenths = (secs * 10.0).round();
        if tenths.is_nan() || tenths <= 0.0 {
            Self::NONE
        } else {
            Self(tenths.min(u16::MAX as f64) as u16)
        }
    }

    pub fn tenths(&self) -> u16 {
        self.0
    }
}

/// One panel's target in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEntry {
    pub panel_id: PanelId,
    pub color: Rgb,
    pub transition: Transition,
}

/// Ordered set of panel targets; each panel appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    entries: Vec<FrameEntry>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Every panel in `panel_ids` set to the same colour.
    pub fn uniform(panel_ids: &[PanelId], color: Rgb, transition: Transition) -> Self {
        let mut frame = Self::with_capacity(panel_ids.len());
        for &id in panel_ids {
            frame.set(id, color, transition);
        }
        frame
    }

    /// Sets a panel's target, replacing an earlier entry for the same panel
    /// in place so the original position is kept.
    pub fn set(&mut self, panel_id: PanelId, color: Rgb, transition: Transition) {
        let entry = FrameEntry {
            panel_id,
            color,
            transition,
        };
        match self.entries.iter_mut().find(|e| e.panel_id == panel_id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Same targets with every transition replaced.
    pub fn with_transition(mut self, transition: Transition) -> Self {
        for entry in &mut self.entries {
            entry.transition = transition;
        }
        self
    }

    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    pub fn get(&self, panel_id: PanelId) -> Option<&FrameEntry> {
        self.entries.iter().find(|e| e.panel_id == panel_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Custom animation data: `<N> (<id> 1 <r> <g> <b> 0 <tenths>)*`.
    ///
    /// Panels missing from the string are switched off by the device.
    pub fn to_anim_data(&self) -> String {
        let mut out = self.entries.len().to_string();
        for e in &self.entries {
            out.push_str(&format!(
                " {} 1 {} {} {} 0 {}",
                e.panel_id,
                e.color.r,
                e.color.g,
                e.color.b,
                e.transition.tenths()
            ));
        }
        out
    }

    /// Stream datagram.
    ///
    /// Format (all big-endian):
    /// - 2 bytes: panel count
    /// - N x 8 bytes:
    ///   - 2 bytes: panel id
    ///   - 3 bytes: R, G, B
    ///   - 1 byte:  white channel, always 0
    ///   - 2 bytes: transition in tenths of a second
    pub fn encode_stream(&self) -> Vec<u8> {
        // The count field caps a datagram at u16::MAX panels.
        let count = self.entries.len().min(u16::MAX as usize);
        let mut buffer = Vec::with_capacity(STREAM_HEADER_LEN + count * STREAM_ENTRY_LEN);

        buffer.extend_from_slice(&(count as u16).to_be_bytes());

        for e in &self.entries[..count] {
            buffer.extend_from_slice(&e.panel_id.to_be_bytes());
            buffer.push(e.color.r);
            buffer.push(e.color.g);
            buffer.push(e.color.b);
            buffer.push(0);
            buffer.extend_from_slice(&e.transition.tenths().to_be_bytes());
        }

        buffer
    }

    /// Parses a stream datagram back into a frame.
    ///
    /// The length must match the declared count exactly and every white
    /// byte must be zero.
    pub fn decode_stream(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < STREAM_HEADER_LEN {
            return Err(CoreError::MalformedFrame(format!(
                "{} bytes is shorter than the header",
                bytes.len()
            )));
        }
        let count = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let expected = STREAM_HEADER_LEN + count * STREAM_ENTRY_LEN;
        if bytes.len() != expected {
            return Err(CoreError::MalformedFrame(format!(
                "{} panels need {} bytes, got {}",
                count,
                expected,
                bytes.len()
            )));
        }

        let mut frame = Self::with_capacity(count);
        for chunk in bytes[STREAM_HEADER_LEN..].chunks_exact(STREAM_ENTRY_LEN) {
            if chunk[5] != 0 {
                return Err(CoreError::MalformedFrame(format!(
                    "non-zero white channel {} for panel {}",
                    chunk[5],
                    u16::from_be_bytes([chunk[0], chunk[1]])
                )));
            }
            frame.entries.push(FrameEntry {
                panel_id: u16::from_be_bytes([chunk[0], chunk[1]]),
                color: Rgb::new(chunk[2], chunk[3], chunk[4]),
                transition: Transition(u16::from_be_bytes([chunk[6], chunk[7]])),
            });
        }
        Ok(frame)
    }
}

/// Body of `PUT /effects`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectCommand {
    pub write: EffectWrite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectWrite {
    pub command: String,
    #[serde(flatten)]
    pub display: DisplayCommand,
}

/// Display variants understood by the effects endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "animType")]
pub enum DisplayCommand {
    /// One-shot custom animation listing every panel to light.
    #[serde(rename = "custom")]
    Custom {
        #[serde(rename = "animData")]
        anim_data: String,
        #[serde(rename = "loop")]
        looping: bool,
        palette: Vec<serde_json::Value>,
    },
    /// Switches the device into external (streaming) control.
    #[serde(rename = "extControl")]
    ExternalControl {
        #[serde(rename = "extControlVersion")]
        version: String,
    },
}

impl EffectCommand {
    /// Single-frame, non-looping custom animation for `frame`.
    pub fn custom(frame: &Frame) -> Self {
        Self::display(DisplayCommand::Custom {
            anim_data: frame.to_anim_data(),
            looping: false,
            palette: Vec::new(),
        })
    }

    /// External control, protocol v2.
    pub fn external_control() -> Self {
        Self::display(DisplayCommand::ExternalControl {
            version: "v2".to_string(),
        })
    }

    fn display(display: DisplayCommand) -> Self {
        Self {
            write: EffectWrite {
                command: "display".to_string(),
                display,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transition_from_seconds() {
        assert_eq!(Transition::from_secs_f64(0.0), Transition(0));
        assert_eq!(Transition::from_secs_f64(1.5), Transition(15));
        assert_eq!(Transition::from_secs_f64(2.3), Transition(23));
        assert_eq!(Transition::from_secs_f64(-1.0), Transition(0));
        assert_eq!(Transition::from_secs_f64(f64::NAN), Transition(0));
        assert_eq!(Transition::from_secs_f64(1e9), Transition(u16::MAX));
    }

    #[test]
    fn test_anim_data_format() {
        let mut frame = Frame::new();
        frame.set(7, Rgb::new(255, 0, 10), Transition(5));
        frame.set(12, Rgb::new(1, 2, 3), Transition(5));

        assert_eq!(frame.to_anim_data(), "2 7 1 255 0 10 0 5 12 1 1 2 3 0 5");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut frame = Frame::new();
        frame.set(1, Rgb::WHITE, Transition::NONE);
        frame.set(2, Rgb::WHITE, Transition::NONE);
        frame.set(1, Rgb::BLACK, Transition::NONE);

        assert_eq!(frame.len(), 2);
        assert_eq!(frame.entries()[0].panel_id, 1);
        assert_eq!(frame.entries()[0].color, Rgb::BLACK);
    }

    #[test]
    fn test_stream_layout_is_big_endian() {
        let frame = Frame::uniform(&[0x0102], Rgb::new(10, 20, 30), Transition(0x0304));
        assert_eq!(
            frame.encode_stream(),
            vec![0x00, 0x01, 0x01, 0x02, 10, 20, 30, 0x00, 0x03, 0x04]
        );
    }

    #[test]
    fn test_empty_frame_encodes_header_only() {
        assert_eq!(Frame::new().encode_stream(), vec![0, 0]);
        assert_eq!(Frame::new().to_anim_data(), "0");
    }

    #[test]
    fn test_decode_rejects_bad_lengths_and_white_channel() {
        assert!(Frame::decode_stream(&[0]).is_err());
        assert!(Frame::decode_stream(&[0, 1, 0, 1]).is_err());

        let mut bytes = Frame::uniform(&[5], Rgb::WHITE, Transition::NONE).encode_stream();
        bytes[7] = 9;
        assert!(matches!(
            Frame::decode_stream(&bytes),
            Err(CoreError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_custom_effect_json() {
        let frame = Frame::uniform(&[3], Rgb::new(1, 2, 3), Transition(4));
        let body = serde_json::to_value(EffectCommand::custom(&frame)).unwrap();

        assert_eq!(
            body,
            json!({
                "write": {
                    "command": "display",
                    "animType": "custom",
                    "animData": "1 3 1 1 2 3 0 4",
                    "loop": false,
                    "palette": []
                }
            })
        );
    }

    #[test]
    fn test_external_control_json() {
        let body = serde_json::to_value(EffectCommand::external_control()).unwrap();
        assert_eq!(
            body,
            json!({
                "write": {
                    "command": "display",
                    "animType": "extControl",
                    "extControlVersion": "v2"
                }
            })
        );
    }

    #[test]
    fn test_effect_command_parses_back() {
        let raw = json!({
            "write": {
                "command": "display",
                "animType": "custom",
                "animData": "0",
                "loop": false,
                "palette": []
            }
        });
        let parsed: EffectCommand = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            parsed.write.display,
            DisplayCommand::Custom { ref anim_data, .. } if anim_data == "0"
        ));
    }
}
