//! Property-based checks over the handler layer

use proptest::prelude::*;
use resilog::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn ring(limit: usize) -> (Arc<RingBufferHandler>, SharedHandler) {
    let ring = Arc::new(RingBufferHandler::new(limit).unwrap());
    let shared: SharedHandler = Arc::clone(&ring) as SharedHandler;
    (ring, shared)
}

fn record(n: usize) -> Record {
    Record::new(Level::Info, format!("msg {}", n))
}

proptest! {
    /// The ring never exceeds its limit and always keeps the newest
    /// records, oldest first.
    #[test]
    fn ring_buffer_keeps_newest_within_limit(
        limit in 1usize..50,
        count in 0usize..200,
    ) {
        let buffer = RingBufferHandler::new(limit).unwrap();
        for n in 0..count {
            buffer.handle(&record(n)).unwrap();
        }

        let kept = buffer.records();
        prop_assert_eq!(kept.len(), count.min(limit));

        let first_kept = count.saturating_sub(limit);
        for (i, rec) in kept.iter().enumerate() {
            prop_assert_eq!(&rec.message, &format!("msg {}", first_kept + i));
        }
    }

    /// Whatever a filter lets through is a subsequence of the input: no
    /// reordering and no duplication.
    #[test]
    fn filter_preserves_relative_order(
        keep_mask in proptest::collection::vec(any::<bool>(), 0..100),
    ) {
        let (sink, shared) = ring(256);
        let mask = keep_mask.clone();
        let filter = FilterHandler::new(shared, move |r: &Record| {
            let n: usize = r.message.trim_start_matches("msg ").parse().unwrap();
            mask[n]
        });

        for n in 0..keep_mask.len() {
            filter.handle(&record(n)).unwrap();
        }

        let expected: Vec<String> = keep_mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(n, _)| format!("msg {}", n))
            .collect();
        let delivered: Vec<String> =
            sink.records().iter().map(|r| r.message.clone()).collect();
        prop_assert_eq!(delivered, expected);
    }

    /// Buffering never reorders and never loses a record once closed,
    /// regardless of how the count relates to the flush threshold.
    #[test]
    fn buffered_close_delivers_everything_in_order(
        buffer_size in 1usize..20,
        count in 0usize..100,
    ) {
        let (sink, shared) = ring(256);
        let buffered =
            BufferedHandler::new(shared, buffer_size, Duration::from_secs(3600)).unwrap();

        for n in 0..count {
            buffered.handle(&record(n)).unwrap();
        }
        buffered.close().unwrap();

        let delivered: Vec<String> =
            sink.records().iter().map(|r| r.message.clone()).collect();
        let expected: Vec<String> = (0..count).map(|n| format!("msg {}", n)).collect();
        prop_assert_eq!(delivered, expected);
    }

    /// Distinct messages are never suppressed by deduplication.
    #[test]
    fn dedup_passes_all_distinct_messages(count in 0usize..100) {
        let (sink, shared) = ring(256);
        let handler = MiddlewareHandler::new(
            shared,
            vec![Arc::new(DedupMiddleware::new(Duration::from_secs(60)).unwrap())],
        );

        for n in 0..count {
            handler.handle(&record(n)).unwrap();
        }
        prop_assert_eq!(sink.len(), count);
    }

    /// A rate limiter delivers exactly the first `max` records of a burst.
    #[test]
    fn rate_limit_keeps_exact_prefix(
        max in 1u64..40,
        count in 0usize..100,
    ) {
        let (sink, shared) = ring(256);
        let handler = MiddlewareHandler::new(
            shared,
            vec![Arc::new(
                RateLimitMiddleware::new(max, Duration::from_secs(3600)).unwrap(),
            )],
        );

        for n in 0..count {
            handler.handle(&record(n)).unwrap();
        }

        let expected = count.min(max as usize);
        let delivered = sink.records();
        prop_assert_eq!(delivered.len(), expected);
        for (i, rec) in delivered.iter().enumerate() {
            prop_assert_eq!(&rec.message, &format!("msg {}", i));
        }
    }

    /// Level parsing accepts exactly what display produces.
    #[test]
    fn level_display_parse_roundtrip(level in prop_oneof![
        Just(Level::Debug),
        Just(Level::Info),
        Just(Level::Warn),
        Just(Level::Error),
    ]) {
        let parsed: Level = level.to_string().parse().unwrap();
        prop_assert_eq!(parsed, level);
    }

    /// Sanitization leaves no raw line breaks or tabs in any message.
    #[test]
    fn sanitized_messages_are_single_line(
        chars in proptest::collection::vec(
            prop_oneof![
                Just('\n'),
                Just('\r'),
                Just('\t'),
                proptest::char::any(),
            ],
            0..64,
        ),
    ) {
        let message: String = chars.into_iter().collect();
        let record = Record::new(Level::Info, message);
        prop_assert!(!record.message.contains('\n'));
        prop_assert!(!record.message.contains('\r'));
        prop_assert!(!record.message.contains('\t'));
    }
}
