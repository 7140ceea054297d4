//! Property tests for the chunking size and ordering contract.

use docqa_rag::{Chunker, FixedSizeChunker, RecursiveChunker};
use proptest::prelude::*;

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zé .!?\n]{1,400}".prop_filter("non-blank", |s| !s.trim().is_empty())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fixed_fragments_are_bounded_and_concatenate_to_input(
        text in arb_text(),
        max in 1usize..64,
    ) {
        let fragments = FixedSizeChunker::new(max, 0).split(&text).unwrap();
        prop_assert!(fragments.iter().all(|f| f.chars().count() <= max));
        prop_assert_eq!(fragments.concat(), text);
    }

    #[test]
    fn recursive_fragments_are_bounded_and_ordered(
        text in arb_text(),
        max in 1usize..64,
    ) {
        let fragments = RecursiveChunker::new(max).split(&text).unwrap();
        prop_assert!(!fragments.is_empty());
        prop_assert!(fragments.iter().all(|f| f.chars().count() <= max));

        // Every fragment occurs in the input after the previous one.
        let mut offset = 0;
        for fragment in &fragments {
            let found = text[offset..].find(fragment.as_str());
            prop_assert!(found.is_some(), "fragment {:?} out of order", fragment);
            offset += found.unwrap_or(0) + fragment.len();
        }
    }

    #[test]
    fn overlapping_fragments_are_bounded(
        text in arb_text(),
        max in 2usize..64,
        overlap in 0usize..32,
    ) {
        let chunker = FixedSizeChunker::new(max, overlap);
        let fragments = chunker.split(&text).unwrap();
        prop_assert!(fragments.iter().all(|f| f.chars().count() <= chunker.max_chunk_size()));
    }
}

#[test]
fn six_hundred_characters_at_256_make_three_fragments() {
    let text = "word ".repeat(120);
    assert_eq!(text.chars().count(), 600);

    let fragments = RecursiveChunker::new(256).split(&text).unwrap();
    assert_eq!(fragments.len(), 3);
    assert_eq!(FixedSizeChunker::new(256, 0).split(&text).unwrap().len(), 3);
}
