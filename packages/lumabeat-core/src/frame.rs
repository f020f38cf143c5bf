//! Frame codec for the LED-matrix wire format.
//!
//! The display firmware accepts one UDP datagram per frame: a packed
//! monochrome bitmap, row-major, 8 pixels per byte with the
//! least-significant bit first within each byte. This module converts the
//! analyzer's column heights into that format. It must stay bit-for-bit
//! compatible with the firmware.

use bytes::{Bytes, BytesMut};
use thiserror::Error;

use crate::protocol_constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FRAME_BYTES};

/// Errors produced while interpreting an analyzer output line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The line did not carry exactly one height per display column.
    #[error("expected {DISPLAY_WIDTH} columns, got {0}")]
    ColumnCount(usize),

    /// A column height was not a non-negative integer.
    #[error("invalid column height {0:?}")]
    BadHeight(String),
}

/// Packs a pixel image into the display's wire format.
///
/// For the pixel at linear index `i`, its bit is OR'd into output byte
/// `i / 8` at bit position `i % 8`. The caller guarantees the image holds
/// exactly `DISPLAY_WIDTH * DISPLAY_HEIGHT` values in `{0, 1}`.
#[must_use]
pub fn pack(image: &[u8]) -> Bytes {
    debug_assert_eq!(image.len(), DISPLAY_WIDTH * DISPLAY_HEIGHT);
    let mut frame = BytesMut::zeroed(FRAME_BYTES);
    for (i, pixel) in image.iter().enumerate() {
        frame[i / 8] |= pixel << (i % 8);
    }
    frame.freeze()
}

/// Returns the all-zero frame used to blank the display.
#[must_use]
pub fn blank() -> Bytes {
    BytesMut::zeroed(FRAME_BYTES).freeze()
}

/// Renders column heights into a pixel image with bars growing upward.
///
/// Column `i` with height `h` lights the pixels at linear index
/// `i + DISPLAY_WIDTH * (DISPLAY_HEIGHT - 1 - j)` for `j in 0..h`, i.e. rows
/// `DISPLAY_HEIGHT - 1` down to `DISPLAY_HEIGHT - h`. Heights beyond the
/// display height are clamped to a full column.
#[must_use]
pub fn render_bars(heights: &[usize]) -> Vec<u8> {
    debug_assert_eq!(heights.len(), DISPLAY_WIDTH);
    let mut image = vec![0u8; DISPLAY_WIDTH * DISPLAY_HEIGHT];
    for (i, &height) in heights.iter().enumerate() {
        for j in 0..height.min(DISPLAY_HEIGHT) {
            image[i + DISPLAY_WIDTH * (DISPLAY_HEIGHT - 1 - j)] = 1;
        }
    }
    image
}

/// Parses one analyzer output line into column heights.
///
/// The analyzer emits `;`-separated non-negative integers, one per display
/// column, usually with a trailing `;`. A single trailing empty segment is
/// tolerated; any other arity or a non-numeric field is a protocol
/// violation on the analyzer's part.
pub fn parse_columns(line: &str) -> Result<Vec<usize>, FrameError> {
    let mut fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(';').collect();
    if fields.len() == DISPLAY_WIDTH + 1 && fields[DISPLAY_WIDTH].is_empty() {
        fields.pop();
    }
    if fields.len() != DISPLAY_WIDTH {
        return Err(FrameError::ColumnCount(fields.len()));
    }
    fields
        .iter()
        .map(|field| {
            field
                .parse::<usize>()
                .map_err(|_| FrameError::BadHeight((*field).to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads pixel `i` back out of a packed frame.
    fn unpack_bit(frame: &[u8], i: usize) -> u8 {
        (frame[i / 8] >> (i % 8)) & 1
    }

    #[test]
    fn pack_is_bit_exact() {
        let mut image = vec![0u8; DISPLAY_WIDTH * DISPLAY_HEIGHT];
        // A scattering of pixels across byte boundaries.
        for &i in &[0, 1, 7, 8, 9, 63, 64, 100, 511] {
            image[i] = 1;
        }
        let frame = pack(&image);
        assert_eq!(frame.len(), FRAME_BYTES);
        for (i, &pixel) in image.iter().enumerate() {
            assert_eq!(unpack_bit(&frame, i), pixel, "pixel {i}");
        }
    }

    #[test]
    fn all_zero_image_packs_to_all_zero_frame() {
        let image = vec![0u8; DISPLAY_WIDTH * DISPLAY_HEIGHT];
        let frame = pack(&image);
        assert_eq!(frame.len(), FRAME_BYTES);
        assert!(frame.iter().all(|&b| b == 0));
        assert_eq!(frame, blank());
    }

    #[test]
    fn bars_grow_upward_from_the_bottom_row() {
        let mut heights = vec![0usize; DISPLAY_WIDTH];
        heights[0] = DISPLAY_HEIGHT; // full column
        heights[2] = 1; // single pixel on the bottom row
        let image = render_bars(&heights);

        // Column 0 fills every row.
        for row in 0..DISPLAY_HEIGHT {
            assert_eq!(image[DISPLAY_WIDTH * row], 1, "column 0 row {row}");
        }
        // Column 1 stays empty.
        for row in 0..DISPLAY_HEIGHT {
            assert_eq!(image[1 + DISPLAY_WIDTH * row], 0, "column 1 row {row}");
        }
        // Column 2 lights only the bottom row.
        assert_eq!(image[2 + DISPLAY_WIDTH * (DISPLAY_HEIGHT - 1)], 1);
        for row in 0..DISPLAY_HEIGHT - 1 {
            assert_eq!(image[2 + DISPLAY_WIDTH * row], 0, "column 2 row {row}");
        }
    }

    #[test]
    fn bar_of_height_h_occupies_exactly_the_bottom_h_rows() {
        let mut heights = vec![0usize; DISPLAY_WIDTH];
        heights[5] = 3;
        let image = render_bars(&heights);
        for row in 0..DISPLAY_HEIGHT {
            let expected = u8::from(row >= DISPLAY_HEIGHT - 3);
            assert_eq!(image[5 + DISPLAY_WIDTH * row], expected, "row {row}");
        }
    }

    #[test]
    fn oversized_heights_are_clamped_to_a_full_column() {
        let mut heights = vec![0usize; DISPLAY_WIDTH];
        heights[0] = DISPLAY_HEIGHT + 20;
        let image = render_bars(&heights);
        assert_eq!(image.iter().filter(|&&p| p == 1).count(), DISPLAY_HEIGHT);
    }

    #[test]
    fn parse_accepts_a_trailing_separator() {
        let line: String = (0..DISPLAY_WIDTH).map(|i| format!("{};", i % 9)).collect();
        let heights = parse_columns(&line).unwrap();
        assert_eq!(heights.len(), DISPLAY_WIDTH);
        assert_eq!(heights[0], 0);
        assert_eq!(heights[10], 1);
    }

    #[test]
    fn parse_rejects_short_lines() {
        assert_eq!(parse_columns("1;2;3"), Err(FrameError::ColumnCount(3)));
    }

    #[test]
    fn parse_rejects_non_numeric_heights() {
        let mut fields = vec!["1"; DISPLAY_WIDTH];
        fields[7] = "x";
        let line = fields.join(";");
        assert_eq!(
            parse_columns(&line),
            Err(FrameError::BadHeight("x".to_string()))
        );
    }

    #[test]
    fn heights_round_trip_through_render_and_pack() {
        let line: String = (0..DISPLAY_WIDTH)
            .map(|i| format!("{};", i % (DISPLAY_HEIGHT + 1)))
            .collect();
        let heights = parse_columns(&line).unwrap();
        let frame = pack(&render_bars(&heights));
        // Column height equals the number of lit pixels in that column.
        for (i, &height) in heights.iter().enumerate() {
            let lit = (0..DISPLAY_HEIGHT)
                .filter(|row| unpack_bit(&frame, i + DISPLAY_WIDTH * row) == 1)
                .count();
            assert_eq!(lit, height, "column {i}");
        }
    }
}
