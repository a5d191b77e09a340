use asphalt_runtime::{AssetSource, FetchPoll, MemoryAssetSource};
use proptest::prelude::*;

proptest! {
    #[test]
    fn memory_stream_progress_is_monotonic(
        bytes in proptest::collection::vec(any::<u8>(), 0..2048),
        chunk in 1usize..512,
    ) {
        let mut source = MemoryAssetSource::new().with_read_chunk(chunk);
        source.insert("asset", bytes.clone());
        let mut stream = source.open("asset").unwrap();
        let mut last = 0;
        let mut polls = 0;
        let out = loop {
            polls += 1;
            prop_assert!(polls <= bytes.len() / chunk + 2);
            match stream.poll().unwrap() {
                FetchPoll::Pending { loaded, total } => {
                    prop_assert!(loaded > last);
                    prop_assert_eq!(total, Some(bytes.len() as u64));
                    last = loaded;
                }
                FetchPoll::Ready(data) => break data,
            }
        };
        prop_assert_eq!(out, bytes);
    }
}
