//! # Pen Report Decoder
//!
//! Decodes raw interrupt reports into [`TabletState`] snapshots.

use super::protocol::*;

/// Outcome of decoding one raw report.
///
/// There is no error variant. A report the decoder cannot use is a defined
/// `Ignored` outcome and the read cycle continues normally; it is never a
/// fault of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeResult {
    /// Report carries no pen state (idle/proximity report or truncated
    /// completion). Nothing is forwarded.
    Ignored,
    /// Report decoded into a pen snapshot.
    Decoded(TabletState),
}

/// Decode a raw report as delivered by the transport.
///
/// # Arguments
///
/// * `raw` - The filled portion of the read buffer, starting at byte 0 of
///   the report.
///
/// # Returns
///
/// * `DecodeResult::Decoded` with the extracted pen state, or
///   `DecodeResult::Ignored` for idle reports and completions shorter than
///   the decoded span.
///
/// # Examples
///
/// ```
/// use tablet_bridge::report::decoder::{decode, DecodeResult};
///
/// let raw = [0x08, 0x01, 0x10, 0x00, 0x20, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x05, 0xFB];
/// match decode(&raw) {
///     DecodeResult::Decoded(state) => assert!(state.pen_contact),
///     DecodeResult::Ignored => unreachable!(),
/// }
/// ```
pub fn decode(raw: &[u8]) -> DecodeResult {
    if raw.len() < REPORT_SPAN {
        return DecodeResult::Ignored;
    }

    let state = raw[PEN_STATE_OFFSET];
    if state == IDLE_DISCRIMINATOR {
        return DecodeResult::Ignored;
    }

    DecodeResult::Decoded(TabletState {
        pen_contact: state & PEN_DOWN_MASK != 0,
        button_1: state & PEN_BUTTON_1_MASK != 0,
        button_2: state & PEN_BUTTON_2_MASK != 0,
        x: FIELD_X.extract(raw),
        y: FIELD_Y.extract(raw),
        pressure: FIELD_PRESSURE.extract(raw),
        tilt_x: FIELD_TILT_X.extract(raw),
        tilt_y: FIELD_TILT_Y.extract(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Re-encode a state at the table offsets, for round-trip checks.
    fn encode(state: &TabletState) -> [u8; REPORT_SPAN] {
        let mut raw = [0u8; REPORT_SPAN];
        let mut flags = 0u8;
        if state.pen_contact {
            flags |= PEN_DOWN_MASK;
        }
        if state.button_1 {
            flags |= PEN_BUTTON_1_MASK;
        }
        if state.button_2 {
            flags |= PEN_BUTTON_2_MASK;
        }
        raw[PEN_STATE_OFFSET] = flags;
        raw[2..4].copy_from_slice(&(state.x as u16).to_le_bytes());
        raw[4..6].copy_from_slice(&(state.y as u16).to_le_bytes());
        raw[6..8].copy_from_slice(&(state.pressure as u16).to_le_bytes());
        raw[10] = state.tilt_x as i8 as u8;
        raw[11] = state.tilt_y as i8 as u8;
        raw
    }

    #[test]
    fn test_decode_pen_report() {
        let raw = [
            0x08, 0x01, 0x10, 0x00, 0x20, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x05, 0xFB,
        ];

        let state = match decode(&raw) {
            DecodeResult::Decoded(state) => state,
            DecodeResult::Ignored => panic!("pen report must decode"),
        };

        assert!(state.pen_contact);
        assert!(!state.button_1);
        assert!(!state.button_2);
        assert_eq!(state.x, 0x10);
        assert_eq!(state.y, 0x20);
        assert_eq!(state.pressure, 0xFF);
        assert_eq!(state.tilt_x, 5);
        assert_eq!(state.tilt_y, -5);
    }

    #[test]
    fn test_decode_idle_report_is_ignored() {
        let mut raw = [0u8; PACKET_MAX];
        raw[PEN_STATE_OFFSET] = IDLE_DISCRIMINATOR;
        // Plausible coordinate garbage after the discriminator must not leak.
        raw[2] = 0xAA;
        raw[3] = 0xBB;

        assert_eq!(decode(&raw), DecodeResult::Ignored);
    }

    #[test]
    fn test_decode_truncated_report_is_ignored() {
        let raw = [0x08, 0x01, 0x10, 0x00, 0x20];
        assert_eq!(decode(&raw), DecodeResult::Ignored);

        // One byte short of the decoded span.
        let raw = [0u8; REPORT_SPAN - 1];
        assert_eq!(decode(&raw), DecodeResult::Ignored);
    }

    #[test]
    fn test_decode_button_bits() {
        let mut raw = [0u8; REPORT_SPAN];

        raw[PEN_STATE_OFFSET] = PEN_BUTTON_1_MASK;
        let DecodeResult::Decoded(state) = decode(&raw) else {
            panic!("report must decode");
        };
        assert!(!state.pen_contact);
        assert!(state.button_1);
        assert!(!state.button_2);

        raw[PEN_STATE_OFFSET] = PEN_DOWN_MASK | PEN_BUTTON_2_MASK;
        let DecodeResult::Decoded(state) = decode(&raw) else {
            panic!("report must decode");
        };
        assert!(state.pen_contact);
        assert!(!state.button_1);
        assert!(state.button_2);
    }

    #[test]
    fn test_decode_full_scale_coordinates() {
        let mut raw = [0u8; REPORT_SPAN];
        raw[PEN_STATE_OFFSET] = PEN_DOWN_MASK;
        raw[2] = 0xFF;
        raw[3] = 0xFF;
        raw[4] = 0x06;
        raw[5] = 0x7C;
        raw[6] = 0xFF;
        raw[7] = 0x1F;

        let DecodeResult::Decoded(state) = decode(&raw) else {
            panic!("report must decode");
        };
        assert_eq!(state.x, 0xFFFF);
        assert_eq!(state.y, 0x7C06);
        assert_eq!(state.pressure, 0x1FFF);
    }

    #[test]
    fn test_decode_trailing_bytes_ignored() {
        // The transport always hands over the full buffer; bytes past the
        // decoded span must not influence the result.
        let mut short = [0u8; REPORT_SPAN];
        short[PEN_STATE_OFFSET] = PEN_DOWN_MASK;
        short[2] = 0x42;

        let mut long = [0u8; PACKET_MAX];
        long[..REPORT_SPAN].copy_from_slice(&short);
        long[REPORT_SPAN..].fill(0xEE);

        assert_eq!(decode(&short), decode(&long));
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            TabletState {
                pen_contact: true,
                button_1: false,
                button_2: true,
                x: 0xC670,
                y: 0x0002,
                pressure: 0x1FFF,
                tilt_x: -60,
                tilt_y: 60,
            },
            TabletState {
                pen_contact: false,
                button_1: true,
                button_2: false,
                x: 0,
                y: 0x7C06,
                pressure: 0,
                tilt_x: 0,
                tilt_y: -1,
            },
            TabletState::default(),
        ];

        for state in cases {
            let raw = encode(&state);
            assert_eq!(decode(&raw), DecodeResult::Decoded(state));
        }
    }
}
