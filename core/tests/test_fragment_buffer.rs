#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mrtd_core::fragment::{Fragment, FragmentBuffer, FragmentError, SharedFragmentBuffer};
    use proptest::prelude::*;

    #[test]
    fn overlapping_fragments_merge() {
        let mut buffer = FragmentBuffer::new(100);
        buffer.add_fragment(3, &[1u8; 20]).unwrap();
        buffer.add_fragment(10, &[2u8; 20]).unwrap();

        assert_eq!(buffer.get_fragments(), vec![Fragment::new(3, 27)]);
        assert_eq!(buffer.get_buffered_length(3), 27);
        assert_eq!(buffer.get_buffered_length(12), 18);
        assert_eq!(buffer.bytes_buffered(), 27);
        assert_eq!(buffer.position(), 30);

        // Last write wins on the overlap.
        assert_eq!(buffer.get_buffer()[9], 1);
        assert_eq!(buffer.get_buffer()[10], 2);
    }

    #[test]
    fn adjacent_fragments_merge() {
        let mut buffer = FragmentBuffer::new(50);
        buffer.add_fragment(0, &[0xAA; 5]).unwrap();
        buffer.add_fragment(5, &[0xBB; 5]).unwrap();
        assert_eq!(buffer.get_fragments(), vec![Fragment::new(0, 10)]);
    }

    #[test]
    fn touching_single_byte_extends_fragment() {
        let mut buffer = FragmentBuffer::new(30);
        buffer.add_fragment(10, &[1u8; 10]).unwrap();
        buffer.add_fragment(20, &[1u8]).unwrap();
        assert_eq!(buffer.get_fragments(), vec![Fragment::new(10, 11)]);
    }

    #[test]
    fn buffered_length_grows_with_merges() {
        let mut buffer = FragmentBuffer::new(999);
        buffer.add_fragment(3, &[0x42; 20]).unwrap();
        assert_eq!(buffer.get_buffered_length(5), 18);
        buffer.add_fragment(20, &[0x42; 20]).unwrap();
        assert_eq!(buffer.get_buffered_length(5), 35);
    }

    #[test]
    fn bridging_write_joins_neighbours() {
        let mut buffer = FragmentBuffer::new(50);
        buffer.add_fragment(0, &[1, 2]).unwrap();
        buffer.add_fragment(5, &[6, 7]).unwrap();
        buffer.add_fragment(20, &[9]).unwrap();
        assert_eq!(buffer.get_fragments().len(), 3);

        buffer.add_fragment(2, &[3, 4, 5]).unwrap();
        assert_eq!(
            buffer.get_fragments(),
            vec![Fragment::new(0, 7), Fragment::new(20, 1)]
        );
        assert_eq!(buffer.get_range(0, 7), Some(&[1u8, 2, 3, 4, 5, 6, 7][..]));
    }

    #[test]
    fn write_spanning_many_fragments() {
        let mut buffer = FragmentBuffer::new(64);
        for offset in (0..40).step_by(4) {
            buffer.add_byte(offset, 1).unwrap();
        }
        assert_eq!(buffer.get_fragments().len(), 10);
        buffer.add_fragment(2, &[0u8; 30]).unwrap();
        assert_eq!(
            buffer.get_fragments(),
            vec![Fragment::new(0, 1), Fragment::new(2, 31), Fragment::new(36, 1)]
        );
    }

    #[test]
    fn uncovered_offset_has_no_buffered_length() {
        let mut buffer = FragmentBuffer::new(40);
        buffer.add_fragment(10, &[1u8; 5]).unwrap();
        assert_eq!(buffer.get_buffered_length(0), 0);
        assert_eq!(buffer.get_buffered_length(15), 0);
        assert_eq!(buffer.get_buffered_length(14), 1);
        assert!(!buffer.is_covered_by_fragment(9));
        assert!(buffer.is_covered_by_fragment(10));
    }

    #[test]
    fn write_past_end_fails_and_leaves_buffer_untouched() {
        let mut buffer = FragmentBuffer::new(10);
        let err = buffer.add_fragment(8, &[7u8; 3]).unwrap_err();
        assert_eq!(
            err,
            FragmentError::OutOfBounds { offset: 8, length: 3, capacity: 10 }
        );
        assert!(buffer.get_fragments().is_empty());
        assert_eq!(buffer.get_buffer(), &[0u8; 10]);
    }

    #[test]
    fn empty_write_is_a_no_op() {
        let mut buffer = FragmentBuffer::new(10);
        buffer.add_fragment(10, &[]).unwrap();
        buffer.add_fragment(4, &[]).unwrap();
        assert!(buffer.get_fragments().is_empty());
        assert!(buffer.add_fragment(11, &[]).is_err());
    }

    #[test]
    fn covered_range_queries() {
        let mut buffer = FragmentBuffer::new(30);
        buffer.add_fragment(5, &[1u8; 10]).unwrap();
        assert!(buffer.is_covered_range(5, 10));
        assert!(buffer.is_covered_range(7, 3));
        assert!(!buffer.is_covered_range(4, 3));
        assert!(!buffer.is_covered_range(10, 6));
        assert!(buffer.is_covered_range(30, 0));
        assert!(!buffer.is_covered_range(31, 0));
        assert_eq!(buffer.get_range(0, 5), None);
    }

    #[test]
    fn smallest_unbuffered_fragment_trims_covered_ends() {
        let mut buffer = FragmentBuffer::new(100);
        buffer.add_fragment(0, &[0u8; 10]).unwrap();
        buffer.add_fragment(20, &[0u8; 10]).unwrap();

        assert_eq!(buffer.smallest_unbuffered_fragment(0, 40), Fragment::new(10, 30));
        assert_eq!(buffer.smallest_unbuffered_fragment(5, 20), Fragment::new(10, 10));
        assert!(buffer.smallest_unbuffered_fragment(0, 10).is_empty());
        assert!(buffer.smallest_unbuffered_fragment(22, 5).is_empty());
        // Clipped to the buffer.
        assert_eq!(buffer.smallest_unbuffered_fragment(90, 50), Fragment::new(90, 10));
    }

    #[test]
    fn display_lists_fragments() {
        let mut buffer = FragmentBuffer::new(100);
        buffer.add_fragment(3, &[0u8; 27]).unwrap();
        assert_eq!(buffer.to_string(), "FragmentBuffer [100, [[3 .. 29 (27)]]]");
    }

    #[test]
    fn default_length() {
        let buffer = FragmentBuffer::default();
        assert_eq!(buffer.len(), 1024);
        assert!(!buffer.is_empty());
    }

    #[test]
    fn shared_buffer_concurrent_writers() {
        let shared = SharedFragmentBuffer::new(128);
        crossbeam::scope(|s| {
            for i in 0..8usize {
                let shared = shared.clone();
                s.spawn(move |_| {
                    let chunk = vec![i as u8; 16];
                    shared.add_fragment(i * 16, &chunk).unwrap();
                });
            }
        })
        .unwrap();

        let snapshot = shared.snapshot().unwrap();
        assert_eq!(snapshot.get_fragments(), vec![Fragment::new(0, 128)]);
        assert_eq!(shared.copy_range(16, 2).unwrap(), Some(vec![1, 1]));
        assert_eq!(shared.bytes_buffered().unwrap(), 128);
    }

    fn writes() -> impl Strategy<Value = Vec<(usize, usize)>> {
        prop::collection::vec((0usize..200, 0usize..40), 0..20)
    }

    proptest! {
        #[test]
        fn prop_fragments_cover_exactly_written_indices(writes in writes()) {
            let mut buffer = FragmentBuffer::new(256);
            let mut written = BTreeSet::new();
            for (offset, len) in &writes {
                buffer.add_fragment(*offset, &vec![0xEE; *len]).unwrap();
                written.extend(*offset..*offset + *len);
            }

            let fragments = buffer.get_fragments();
            for pair in fragments.windows(2) {
                prop_assert!(pair[0].end() < pair[1].offset());
            }
            let covered: BTreeSet<usize> = fragments.iter().flat_map(|f| f.offset()..f.end()).collect();
            prop_assert_eq!(covered, written.clone());
            for i in 0..256 {
                prop_assert_eq!(buffer.is_covered_by_fragment(i), written.contains(&i));
            }
        }

        #[test]
        fn prop_write_order_does_not_matter(writes in writes()) {
            let mut forward = FragmentBuffer::new(256);
            let mut backward = FragmentBuffer::new(256);
            for (offset, len) in &writes {
                forward.add_fragment(*offset, &vec![1; *len]).unwrap();
            }
            for (offset, len) in writes.iter().rev() {
                backward.add_fragment(*offset, &vec![1; *len]).unwrap();
            }
            prop_assert_eq!(forward, backward);
        }
    }
}
