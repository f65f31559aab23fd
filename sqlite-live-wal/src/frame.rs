pub const FRAME_HEADER_SIZE: usize = 24;

/// A WAL frame header: page number, commit marker (page count if this frame finishes a
/// transaction, else 0), and the salt pair copied from the WAL header at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub page_number: u32,
    pub db_size_pages: u32,
    pub salt1: u32,
    pub salt2: u32,
}

fn parse_frame_header(buf: &[u8]) -> FrameHeader {
    FrameHeader {
        page_number: u32::from_be_bytes(buf[0..4].try_into().unwrap()),
        db_size_pages: u32::from_be_bytes(buf[4..8].try_into().unwrap()),
        salt1: u32::from_be_bytes(buf[8..12].try_into().unwrap()),
        salt2: u32::from_be_bytes(buf[12..16].try_into().unwrap()),
    }
}

/// The result of scanning a byte range for complete `⟨24-byte header, page⟩` frames.
pub struct FrameBatch<'a> {
    pub frames: Vec<(FrameHeader, &'a [u8])>,
    /// Bytes of `buf` that were consumed by complete, current-generation frames. The WAL
    /// observer advances its offset by exactly this much, never more.
    pub consumed: usize,
}

/// Scan `buf` (a byte range read from the WAL file, frame-aligned at its start) for complete
/// frames whose salt matches `expected_salt1`/`expected_salt2`. Stops, without error, at the
/// first incomplete trailing frame (the writer is still appending it) or the first frame
/// whose salt doesn't match (the WAL was recreated mid-read; the next observer pass will
/// detect the header salt change and resynchronize, §9).
pub fn decode_frames(buf: &[u8], page_size: usize, expected_salt1: u32, expected_salt2: u32) -> FrameBatch<'_> {
    let mut offset = 0;
    let mut frames = Vec::new();
    let frame_size = FRAME_HEADER_SIZE + page_size;

    while offset + frame_size <= buf.len() {
        let header = parse_frame_header(&buf[offset..offset + FRAME_HEADER_SIZE]);
        if header.salt1 != expected_salt1 || header.salt2 != expected_salt2 {
            break;
        }
        let page = &buf[offset + FRAME_HEADER_SIZE..offset + frame_size];
        frames.push((header, page));
        offset += frame_size;
    }

    FrameBatch { frames, consumed: offset }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_frame(page_number: u32, salt1: u32, salt2: u32, page_size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; FRAME_HEADER_SIZE + page_size];
        buf[0..4].copy_from_slice(&page_number.to_be_bytes());
        buf[4..8].copy_from_slice(&0u32.to_be_bytes());
        buf[8..12].copy_from_slice(&salt1.to_be_bytes());
        buf[12..16].copy_from_slice(&salt2.to_be_bytes());
        buf
    }

    #[test]
    fn decodes_multiple_complete_frames() {
        let mut buf = build_frame(2, 7, 9, 16);
        buf.extend(build_frame(3, 7, 9, 16));
        let batch = decode_frames(&buf, 16, 7, 9);
        assert_eq!(batch.frames.len(), 2);
        assert_eq!(batch.consumed, buf.len());
        assert_eq!(batch.frames[0].0.page_number, 2);
        assert_eq!(batch.frames[1].0.page_number, 3);
    }

    #[test]
    fn stops_at_incomplete_trailing_frame() {
        let mut buf = build_frame(2, 7, 9, 16);
        buf.extend_from_slice(&[0u8; 10]); // partial next frame
        let batch = decode_frames(&buf, 16, 7, 9);
        assert_eq!(batch.frames.len(), 1);
        assert_eq!(batch.consumed, FRAME_HEADER_SIZE + 16);
    }

    #[test]
    fn stops_at_salt_mismatch() {
        let mut buf = build_frame(2, 7, 9, 16);
        buf.extend(build_frame(3, 1, 1, 16)); // different generation
        let batch = decode_frames(&buf, 16, 7, 9);
        assert_eq!(batch.frames.len(), 1);
        assert_eq!(batch.consumed, FRAME_HEADER_SIZE + 16);
    }
}
