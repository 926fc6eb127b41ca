#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use mrtd_core::cache::{CacheError, CardFileSystem, FileCache};
    use mrtd_core::config::{ConfigError, ReadConfig};
    use mrtd_core::constants::{cvca, tags};
    use mrtd_core::io::MarkableRead;
    use mrtd_core::tlv::{encode, BerTlvReader};
    use mrtd_core::utils::read_exact_or_eof;

    const EF_COM: u16 = 0x011E;
    const EF_DG1: u16 = 0x0101;
    const EF_DG2: u16 = 0x0102;
    const EF_CVCA: u16 = 0x011C;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        Select(u16),
        Read { offset: usize, length: usize },
    }

    /// In-memory card that logs every command it receives.
    struct MockCard {
        files: HashMap<u16, Vec<u8>>,
        selected: Option<u16>,
        log: Arc<Mutex<Vec<Command>>>,
    }

    impl MockCard {
        fn new(files: &[(u16, Vec<u8>)]) -> (Self, Arc<Mutex<Vec<Command>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let card = Self {
                files: files.iter().cloned().collect(),
                selected: None,
                log: Arc::clone(&log),
            };
            (card, log)
        }
    }

    impl CardFileSystem for MockCard {
        fn select_file(&mut self, fid: u16) -> Result<(), CacheError> {
            self.log.lock().unwrap().push(Command::Select(fid));
            if !self.files.contains_key(&fid) {
                return Err(CacheError::FileNotFound { fid });
            }
            self.selected = Some(fid);
            Ok(())
        }

        fn read_binary(&mut self, offset: usize, length: usize) -> Result<Vec<u8>, CacheError> {
            self.log.lock().unwrap().push(Command::Read { offset, length });
            let fid = self.selected.ok_or(CacheError::NoFileSelected)?;
            let data = &self.files[&fid];
            let start = offset.min(data.len());
            let end = offset.saturating_add(length).min(data.len());
            Ok(data[start..end].to_vec())
        }
    }

    fn reads(log: &Arc<Mutex<Vec<Command>>>) -> Vec<(usize, usize)> {
        log.lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                Command::Read { offset, length } => Some((*offset, *length)),
                Command::Select(_) => None,
            })
            .collect()
    }

    fn dg1() -> Vec<u8> {
        encode(tags::DG1, &encode(tags::MRZ_INFO, &[b'<'; 88]))
    }

    fn dg2() -> Vec<u8> {
        let image: Vec<u8> = (0..700u32).map(|i| (i % 256) as u8).collect();
        encode(tags::DG2, &image)
    }

    fn cvca_file() -> Vec<u8> {
        let mut data = encode(cvca::CAR_TAG, b"DECVCA00001");
        data.resize(cvca::LENGTH, 0x00);
        data
    }

    #[test]
    fn length_comes_from_the_outer_header() -> Result<()> {
        let (card, log) = MockCard::new(&[(EF_DG1, dg1()), (EF_DG2, dg2())]);
        let cache = FileCache::new(card);

        assert_eq!(cache.file_length(EF_DG1)?, 93);
        assert_eq!(cache.file_length(EF_DG2)?, 704);
        // Second call is answered from the cache.
        assert_eq!(cache.file_length(EF_DG1)?, 93);

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                Command::Select(EF_DG1),
                Command::Read { offset: 0, length: 8 },
                Command::Select(EF_DG2),
                Command::Read { offset: 0, length: 8 },
            ]
        );
        Ok(())
    }

    #[test]
    fn cvca_file_has_fixed_length() -> Result<()> {
        let (card, _) = MockCard::new(&[(EF_CVCA, cvca_file())]);
        let cache = FileCache::new(card);
        assert_eq!(cache.file_length(EF_CVCA)?, cvca::LENGTH);
        Ok(())
    }

    #[test]
    fn only_missing_bytes_are_fetched() -> Result<()> {
        let file = dg2();
        let (card, log) = MockCard::new(&[(EF_DG2, file.clone())]);
        let cache = FileCache::new(card);

        assert_eq!(&cache.read(EF_DG2, 100, 50)?[..], &file[100..150]);
        assert_eq!(&cache.read(EF_DG2, 0, 200)?[..], &file[..200]);
        assert_eq!(&cache.read(EF_DG2, 50, 100)?[..], &file[50..150]);

        assert_eq!(reads(&log), vec![(0, 8), (100, 50), (8, 192)]);

        let snapshot = cache.telemetry()?;
        assert_eq!(snapshot.commands_sent, 3);
        assert_eq!(snapshot.bytes_from_source, 250);
        assert_eq!(snapshot.bytes_served_from_cache, 108);
        assert!(snapshot.sanity_check());
        Ok(())
    }

    #[test]
    fn large_gaps_are_fetched_in_blocks() -> Result<()> {
        let file = dg2();
        let (card, log) = MockCard::new(&[(EF_DG2, file.clone())]);
        let cache = FileCache::with_config(card, ReadConfig::new(100, 8)?)?;

        assert_eq!(&cache.read(EF_DG2, 0, file.len())?[..], &file[..]);
        let reads = reads(&log);
        assert!(reads.iter().all(|(_, length)| *length <= 100));
        assert_eq!(reads.iter().skip(1).map(|(_, l)| l).sum::<usize>(), file.len() - 8);
        Ok(())
    }

    #[test]
    fn reads_are_clipped_to_the_file() -> Result<()> {
        let (card, _) = MockCard::new(&[(EF_DG2, dg2())]);
        let cache = FileCache::new(card);

        assert_eq!(cache.read(EF_DG2, 690, 100)?.len(), 14);
        assert!(cache.read(EF_DG2, 704, 10)?.is_empty());
        assert!(matches!(
            cache.read(EF_DG2, 705, 1),
            Err(CacheError::OffsetOutOfRange { offset: 705, length: 704, .. })
        ));
        Ok(())
    }

    #[test]
    fn truncated_file_is_reported() {
        let mut file = encode(tags::DG2, &[0xAA; 100]);
        file.truncate(50);
        let (card, _) = MockCard::new(&[(EF_DG2, file)]);
        let cache = FileCache::new(card);

        let err = cache.read(EF_DG2, 0, 102).unwrap_err();
        assert!(matches!(err, CacheError::ShortFile { offset: 50, .. }));
    }

    #[test]
    fn unknown_file_and_bad_config() {
        let (card, _) = MockCard::new(&[]);
        let cache = FileCache::new(card);
        assert!(matches!(
            cache.file_length(EF_COM),
            Err(CacheError::FileNotFound { fid: EF_COM })
        ));

        let (card, _) = MockCard::new(&[]);
        let bad = ReadConfig { max_block_size: 0, read_ahead_length: 8 };
        assert!(matches!(
            FileCache::with_config(card, bad),
            Err(CacheError::Config(ConfigError::BlockSize { got: 0, .. }))
        ));
    }

    #[test]
    fn evicted_files_are_read_again() -> Result<()> {
        let (card, log) = MockCard::new(&[(EF_DG1, dg1())]);
        let cache = FileCache::new(card);
        cache.read(EF_DG1, 0, 93)?;
        assert!(cache.is_cached(EF_DG1)?);
        assert_eq!(cache.fragment_buffer(EF_DG1)?.unwrap().bytes_buffered()?, 93);

        assert!(cache.evict(EF_DG1)?);
        assert!(!cache.is_cached(EF_DG1)?);
        cache.read(EF_DG1, 0, 93)?;
        assert_eq!(reads(&log).len(), 4);
        Ok(())
    }

    #[test]
    fn card_reader_streams_in_blocks_and_skips_lazily() -> Result<()> {
        let file = dg2();
        let (card, log) = MockCard::new(&[(EF_DG2, file.clone())]);
        let cache = Arc::new(FileCache::with_config(card, ReadConfig::new(64, 8)?)?);

        let mut reader = cache.open(EF_DG2)?;
        assert_eq!(reader.len(), 704);
        assert_eq!(reader.skip(600)?, 600);
        reader.mark(0);
        let tail = read_exact_or_eof(&mut reader, 200)?;
        assert_eq!(&tail[..], &file[600..]);
        assert_eq!(reads(&log)[1..], [(600, 64), (664, 40)]);

        let mut again = cache.open(EF_DG2)?;
        let mut all = Vec::new();
        again.read_to_end(&mut all)?;
        assert_eq!(all, file);
        assert!(reads(&log).iter().all(|(_, length)| *length <= 64));
        assert_eq!(again.available(), 0);
        reader.reset()?;
        assert_eq!(reader.available(), 104);
        Ok(())
    }

    #[test]
    fn split_views_over_a_card_file() -> Result<()> {
        let file = dg1();
        let (card, log) = MockCard::new(&[(EF_DG1, file.clone())]);
        let cache = Arc::new(FileCache::new(card));

        let stream = cache.open_stream(EF_DG1)?;
        assert_eq!(stream.get_length(), 93);

        let mut tlv = BerTlvReader::new(stream.get_input_stream(0)?);
        tlv.skip_to_tag(tags::MRZ_INFO)?;
        assert_eq!(tlv.read_length()?, 88);
        assert_eq!(tlv.read_value()?, vec![b'<'; 88]);

        let mut view = stream.get_input_stream(5)?;
        let mut rest = Vec::new();
        view.read_to_end(&mut rest)?;
        assert_eq!(&rest[..], &file[5..]);

        // Header prefix plus a single pass over the remainder.
        assert_eq!(reads(&log), vec![(0, 8), (8, 85)]);
        Ok(())
    }

    #[test]
    fn concurrent_readers_share_one_cache() -> Result<()> {
        let file = dg2();
        let (card, _) = MockCard::new(&[(EF_DG2, file.clone()), (EF_DG1, dg1())]);
        let cache = Arc::new(FileCache::new(card));

        crossbeam::scope(|s| {
            for i in 0..8usize {
                let cache = Arc::clone(&cache);
                let file = &file;
                s.spawn(move |_| {
                    let offset = i * 88;
                    let bytes = cache.read(EF_DG2, offset, 120).unwrap();
                    let end = (offset + 120).min(file.len());
                    assert_eq!(&bytes[..], &file[offset..end]);
                    assert_eq!(cache.file_length(EF_DG1).unwrap(), 93);
                });
            }
        })
        .unwrap();

        let buffer = cache.fragment_buffer(EF_DG2)?.unwrap();
        assert_eq!(buffer.bytes_buffered()?, file.len());
        Ok(())
    }
}
