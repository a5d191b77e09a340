use asphalt_format::{ByteCursor, ChunkReader, ChunkTag, ContainerWriter, FormatError};
use proptest::prelude::*;

fn arb_tag() -> impl Strategy<Value = [u8; 4]> {
    prop::array::uniform4(b'A'..=b'Z')
}

fn arb_chunks() -> impl Strategy<Value = Vec<([u8; 4], Vec<u8>)>> {
    prop::collection::vec((arb_tag(), prop::collection::vec(any::<u8>(), 0..64)), 0..12)
}

proptest! {
    // Chunks come back in file order with their exact payloads, then the reader is at eof
    #[test]
    fn chunks_round_trip_in_order(chunks in arb_chunks(), version in any::<u16>()) {
        let mut w = ContainerWriter::new(b"GBST", version);
        for (tag, payload) in &chunks {
            w.chunk(tag, payload);
        }
        let bytes = w.finish();
        let mut reader = ChunkReader::open(&bytes, ChunkTag::new(b"GBST"), version).unwrap();
        for (tag, payload) in &chunks {
            let mut rec = reader.next().unwrap().unwrap();
            prop_assert_eq!(rec.tag, ChunkTag::new(tag));
            prop_assert_eq!(rec.size as usize, payload.len());
            prop_assert_eq!(rec.payload.read_bytes(rec.size as usize), payload.as_slice());
            prop_assert!(rec.payload.eof());
        }
        prop_assert!(reader.eof());
        prop_assert!(reader.next().is_none());
        prop_assert_eq!(reader.position(), bytes.len());
    }

    // A tag with any non-uppercase byte stops the stream with CorruptStream
    #[test]
    fn malformed_tag_is_fatal(prefix in arb_chunks(), bad in any::<[u8; 4]>()) {
        prop_assume!(!ChunkTag::new(&bad).is_well_formed());
        let mut w = ContainerWriter::new(b"GBMP", 500);
        for (tag, payload) in &prefix {
            w.chunk(tag, payload);
        }
        w.chunk(&bad, &[1, 2, 3]);
        let bytes = w.finish();
        let reader = ChunkReader::open(&bytes, ChunkTag::new(b"GBMP"), 500).unwrap();
        let results: Vec<_> = reader.collect();
        prop_assert_eq!(results.len(), prefix.len() + 1);
        let is_corrupt = matches!(results.last(), Some(Err(FormatError::CorruptStream { .. })));
        prop_assert!(is_corrupt);
    }

    // Cursor never moves past the end, whatever sequence of reads is issued
    #[test]
    fn cursor_position_is_clamped(data in prop::collection::vec(any::<u8>(), 0..32), ops in prop::collection::vec(0u8..6, 0..40)) {
        let mut c = ByteCursor::new(&data);
        for op in ops {
            match op {
                0 => { c.read_u8(); }
                1 => { c.read_u16_le(); }
                2 => { c.read_u32_be(); }
                3 => { c.read_u16_array_le(7); }
                4 => { c.read_string(3); }
                _ => { c.skip(5); }
            }
            prop_assert!(c.pos() <= data.len());
            prop_assert_eq!(c.eof(), c.pos() == data.len());
        }
    }
}

#[test]
fn leading_digit_tag_raises_corrupt_stream() {
    let bytes = ContainerWriter::new(b"GBMP", 500)
        .chunk(b"1ABC", &[0; 4])
        .finish();
    let mut reader = ChunkReader::open(&bytes, ChunkTag::new(b"GBMP"), 500).unwrap();
    match reader.next() {
        Some(Err(FormatError::CorruptStream { tag, .. })) => {
            assert_eq!(tag, ChunkTag::new(b"1ABC"));
        }
        other => panic!("expected CorruptStream, got {:?}", other),
    }
}
