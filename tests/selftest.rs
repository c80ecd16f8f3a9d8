use aes_ctr_drbg::{Config, Reader};

#[test]
fn reader_with_self_tests_enabled() {
    let reader = Reader::new(Config::default().with_self_tests(true))
        .expect("Reader should construct when self-tests pass");

    assert!(reader.config().enable_self_tests);

    let mut buf = [0u8; 32];
    let n = reader.read(&mut buf).expect("Should read");
    assert_eq!(n, buf.len());
    assert!(buf.iter().any(|&b| b != 0));
}

#[test]
fn reader_with_self_tests_disabled() {
    let reader = Reader::new(Config::default().with_self_tests(false))
        .expect("Reader should construct without self-tests");
    assert!(!reader.config().enable_self_tests);
}

#[test]
fn self_tests_default_to_disabled() {
    let reader = Reader::new(Config::default()).expect("Reader should construct with defaults");
    assert!(!reader.config().enable_self_tests);
}

#[test]
fn repeated_construction_reuses_the_verdict() {
    // The KAT runs at most once per process; constructing several readers
    // with self-tests enabled must not re-run or diverge.
    for _ in 0..4 {
        Reader::new(Config::default().with_self_tests(true))
            .expect("Reader should construct when self-tests pass");
    }
}
