// tests/tail_reader.rs

use proptest::prelude::*;

use tailwatch::fs::mock::MockFileSystem;
use tailwatch::fs::FileSystem;
use tailwatch::tail::{LineSplitter, TailLimits, TailState};
use tailwatch::types::Line;

const LIMITS: TailLimits = TailLimits {
    max_window_bytes: 1024 * 1024,
    max_lines: 1024,
};

fn utf8() -> &'static encoding_rs::Encoding {
    encoding_rs::UTF_8
}

#[test]
fn lf_crlf_and_bare_cr_all_end_a_line() {
    let mut splitter = LineSplitter::new(utf8());
    let lines = splitter.push(b"unix\nwindows\r\nmac\rlast", 100);

    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["unix", "windows", "mac"]);
    assert_eq!(splitter.partial(), "last");
    assert_eq!(splitter.next_line_number(), 3);
}

#[test]
fn consecutive_line_feeds_produce_empty_lines() {
    let mut splitter = LineSplitter::new(utf8());
    let lines = splitter.push(b"a\n\n\nb\r\n\r\nc", 100);

    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "", "", "b", ""]);
    assert_eq!(splitter.partial(), "c");
}

#[test]
fn lfcr_pair_counts_once() {
    let mut splitter = LineSplitter::new(utf8());
    let lines = splitter.push(b"a\n\rb\n", 100);
    assert_eq!(lines, vec![Line::new(0, "a"), Line::new(1, "b")]);
}

#[test]
fn utf8_bom_is_not_part_of_the_first_line() {
    let mut splitter = LineSplitter::new(utf8());
    let lines = splitter.push(b"\xEF\xBB\xBFhello\n", 100);
    assert_eq!(lines, vec![Line::new(0, "hello")]);
}

#[test]
fn utf16_is_decoded_across_odd_chunk_boundaries() {
    let mut splitter = LineSplitter::new(encoding_rs::UTF_16LE);
    let bytes: Vec<u8> = "hé\n".encode_utf16().flat_map(u16::to_le_bytes).collect();

    let mut lines = Vec::new();
    for chunk in bytes.chunks(3) {
        lines.extend(splitter.push(chunk, 100));
    }
    assert_eq!(lines, vec![Line::new(0, "hé")]);
}

#[test]
fn reset_forgets_partial_line_and_numbering() {
    let mut splitter = LineSplitter::new(utf8());
    splitter.push(b"a\nb\r", 100);
    splitter.push(b"half", 100);
    splitter.reset();

    assert_eq!(splitter.partial(), "");
    assert_eq!(splitter.next_line_number(), 0);
    // A leading LF is a fresh terminator after reset, not the end of a CRLF.
    assert_eq!(splitter.push(b"\nx\n", 100), vec![Line::new(0, ""), Line::new(1, "x")]);
}

#[test]
fn tail_state_reads_only_new_bytes() {
    let fs = MockFileSystem::new();
    fs.add_file("/d/f.log", "one\n");
    let mut file = fs.open_tail("/d/f.log".as_ref()).expect("open");
    let mut tail = TailState::new(utf8());

    let read = tail.read(file.as_mut(), LIMITS).expect("read");
    assert_eq!(read.lines, vec![Line::new(0, "one")]);
    assert_eq!(read.end_offset, 4);
    assert_eq!(read.bytes_read, 4);
    assert!(!read.reset);

    let read = tail.read(file.as_mut(), LIMITS).expect("read");
    assert!(read.lines.is_empty());
    assert_eq!(read.bytes_read, 0);

    fs.append("/d/f.log", "two\n");
    let read = tail.read(file.as_mut(), LIMITS).expect("read");
    assert_eq!(read.lines, vec![Line::new(1, "two")]);
    assert_eq!(tail.offset(), 8);
}

#[test]
fn tail_state_detects_shrinking_file() {
    let fs = MockFileSystem::new();
    fs.add_file("/d/f.log", "one\ntwo\n");
    let mut file = fs.open_tail("/d/f.log".as_ref()).expect("open");
    let mut tail = TailState::new(utf8());
    tail.read(file.as_mut(), LIMITS).expect("read");

    fs.truncate("/d/f.log", 0);
    fs.append("/d/f.log", "new\n");
    let read = tail.read(file.as_mut(), LIMITS).expect("read");

    assert!(read.reset);
    assert_eq!(read.lines, vec![Line::new(0, "new")]);
    assert_eq!(read.end_offset, 4);
}

#[test]
fn tail_state_propagates_read_errors() {
    let fs = MockFileSystem::new();
    fs.add_file("/d/f.log", "one\n");
    let mut file = fs.open_tail("/d/f.log".as_ref()).expect("open");
    let mut tail = TailState::new(utf8());

    fs.fail_reads("/d/f.log", true);
    assert!(tail.read(file.as_mut(), LIMITS).is_err());
}

fn line_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9 éß€]{1,12}"
}

fn terminator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("\n"), Just("\r\n"), Just("\r")]
}

proptest! {
    #[test]
    fn chunked_input_splits_like_whole_input(
        lines in proptest::collection::vec((line_strategy(), terminator_strategy()), 0..40),
        trailing in "[a-z]{0,5}",
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut text = String::new();
        for (line, term) in &lines {
            text.push_str(line);
            text.push_str(term);
        }
        text.push_str(&trailing);
        let bytes = text.as_bytes();

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
        points.push(0);
        points.push(bytes.len());
        points.sort_unstable();
        points.dedup();

        let mut splitter = LineSplitter::new(encoding_rs::UTF_8);
        let mut got = Vec::new();
        for pair in points.windows(2) {
            got.extend(splitter.push(&bytes[pair[0]..pair[1]], usize::MAX));
        }

        let expected: Vec<Line> = lines
            .iter()
            .enumerate()
            .map(|(i, (line, _))| Line::new(i as u64, line.clone()))
            .collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(splitter.partial(), trailing.as_str());
    }

    #[test]
    fn cap_keeps_the_newest_lines_and_consumes_all_numbers(
        count in 0usize..60,
        cap in 1usize..20,
    ) {
        let text: String = (0..count).map(|i| format!("{i}\n")).collect();
        let mut splitter = LineSplitter::new(encoding_rs::UTF_8);
        let got = splitter.push(text.as_bytes(), cap);

        let kept = count.min(cap);
        prop_assert_eq!(got.len(), kept);
        for (offset, line) in got.iter().enumerate() {
            let n = (count - kept + offset) as u64;
            prop_assert_eq!(line.line_number, n);
            prop_assert_eq!(&line.text, &n.to_string());
        }
        prop_assert_eq!(splitter.next_line_number(), count as u64);
    }
}
