use crate::cs::compression::{Compression, Huffman, Lzw, RunLength};
use crate::cs::error::Error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn codecs() -> Vec<(&'static str, Box<dyn Compression>)> {
    vec![
        ("run-length", Box::new(RunLength::new())),
        ("lzw", Box::new(Lzw::new())),
        ("huffman", Box::new(Huffman::new())),
    ]
}

fn assert_round_trip(input: &[u8]) {
    for (name, codec) in codecs() {
        let compressed = codec.compress(input).unwrap();
        let expanded = codec.expand(&compressed).unwrap();
        assert_eq!(expanded, input, "{} failed on {} bytes", name, input.len());
    }
}

#[test]
fn test_empty_input() {
    assert_round_trip(b"");
}

#[test]
fn test_single_byte() {
    assert_round_trip(&[0x00]);
    assert_round_trip(&[0xFF]);
    assert_round_trip(b"A");
}

#[test]
fn test_repetitive_input() {
    assert_round_trip(b"ABABABABABABABABAB");
    assert_round_trip(&[0u8; 300]);
    assert_round_trip(&b"ab".repeat(5000));
}

#[test]
fn test_text() {
    let tale = "it was the best of times it was the worst of times \
                it was the age of wisdom it was the age of foolishness \
                it was the epoch of belief it was the epoch of incredulity";
    assert_round_trip(tale.as_bytes());
}

#[test]
fn test_random_inputs() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let len = rng.gen_range(0..3000);
        let input: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        assert_round_trip(&input);
    }
}

#[test]
fn test_random_skewed_inputs() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..20 {
        let len = rng.gen_range(1..5000);
        let input: Vec<u8> = (0..len)
            .map(|_| {
                if rng.gen_bool(0.8) {
                    b'e'
                } else {
                    rng.gen_range(b'a'..=b'z')
                }
            })
            .collect();
        assert_round_trip(&input);
    }
}

#[test]
fn test_golden_encodings() {
    let input = b"ABAB";
    assert_eq!(
        hex::encode(RunLength::new().compress(input).unwrap()),
        "0101050101010401020105010101040101"
    );
    // 65, 66, 257, EOF
    assert_eq!(
        hex::encode(Lzw::new().compress(input).unwrap()),
        "041042101100"
    );
}

#[test]
fn test_repetitive_input_compresses() {
    let input = b"to be or not to be, that is the question. ".repeat(100);
    let lzw = Lzw::new().compress(&input).unwrap();
    let huffman = Huffman::new().compress(&input).unwrap();
    assert!(lzw.len() < input.len() / 4);
    assert!(huffman.len() < input.len());
}

#[test]
fn test_garbage_is_rejected_or_decoded() {
    // arbitrary bytes must never panic; they either decode or error out
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..50 {
        let len = rng.gen_range(0..64);
        let garbage: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        for (_, codec) in codecs() {
            match codec.expand(&garbage) {
                Ok(_) | Err(Error::MalformedStream(_)) => {}
                Err(e) => panic!("unexpected error {}", e),
            }
        }
    }
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_batches() {
    use crate::cs::compression::{compress_all, expand_all};

    let inputs: Vec<Vec<u8>> = (0..16u8).map(|i| vec![i; 100 * i as usize]).collect();
    let codec = Lzw::new();
    let compressed = compress_all(&codec, &inputs).unwrap();
    let expanded = expand_all(&codec, &compressed).unwrap();
    assert_eq!(expanded, inputs);
}
