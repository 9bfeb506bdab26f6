use flate2::Compression;
use flate2::write::GzEncoder;
use mailing_list_ingest::{
    Decoder, MessageSegment, Payload, RawArchiveBlob, Segmenter, SourceFormat, split_text,
};
use std::io::Write;

fn gzip(raw: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).unwrap();
    encoder.finish().unwrap()
}

fn texts(segments: &[MessageSegment]) -> Vec<String> {
    segments.iter().map(|s| s.text().into_owned()).collect()
}

#[test]
fn test_mailbox_one_segment_per_sender_line() {
    let raw = "From ida@x Tue Sep  1 04:14:32 2020\nFrom: Ida <ida@x>\nSubject: one\n\nfirst\n\
               From deb@y Wed Sep  2 05:00:00 2020\nFrom: Deb <deb@y>\nSubject: two\n\nsecond\n\
               From cori@z Thu Sep  3 06:00:00 2020\nFrom: Cori <cori@z>\nSubject: three\n\nthird\n";
    let segments = split_text(SourceFormat::CompressedUnixMailbox, raw);

    assert_eq!(segments.len(), 3);
    for (segment, sender) in segments.iter().zip(["From ida@x", "From deb@y", "From cori@z"]) {
        assert!(segment.text().starts_with(sender));
    }
    assert!(segments[0].text().ends_with("first\n"));
}

#[test]
fn test_flat_text_segments_start_at_boundary_header() {
    let raw = "/nReceived: from a\nSubject: one\n\nfirst\n\
               /nX-BeenThere: list@x\nSubject: two\n\nsecond\n\
               /nDate: Sat, 7 Nov 2020 10:00:00 +0000\nSubject: three\n\nthird\n";
    let segments = split_text(SourceFormat::FlatText, raw);

    assert_eq!(
        texts(&segments)
            .iter()
            .map(|s| s.lines().next().unwrap_or_default().to_string())
            .collect::<Vec<_>>(),
        vec![
            "Received: from a",
            "X-BeenThere: list@x",
            "Date: Sat, 7 Nov 2020 10:00:00 +0000"
        ]
    );
    assert!(!segments[0].text().contains("X-BeenThere"));
    assert!(!segments[1].text().contains("Date:"));
}

#[test]
fn test_no_boundary_keeps_whole_blob() {
    let raw = "Subject: lonely\n\njust one message without any marker\n";
    let flat = split_text(SourceFormat::FlatText, raw);
    let mailbox = split_text(SourceFormat::CompressedUnixMailbox, raw);

    assert_eq!(texts(&flat), vec![raw]);
    assert_eq!(texts(&mailbox), vec![raw]);
}

#[test]
fn test_gzip_mailbox_is_inflated() {
    let decoder = Decoder::default();
    let segmenter = Segmenter::new(&decoder);
    let raw = b"From a@x Mon Jan  3 17:00:00 2000\nFrom: a@x\n\nhi\n\
                From b@y Tue Jan  4 17:00:00 2000\nFrom: b@y\n\nho\n";
    let blob = RawArchiveBlob::new(
        SourceFormat::CompressedUnixMailbox,
        Payload::Bytes(gzip(raw)),
    );

    let segments = segmenter.segment(&blob).unwrap();
    assert_eq!(segments.len(), 2);
}

#[test]
fn test_latin1_archive_decoded() {
    let decoder = Decoder::default();
    let segmenter = Segmenter::new(&decoder);
    let blob = RawArchiveBlob::new(
        SourceFormat::FlatText,
        Payload::Bytes(b"/nDate: x\nSubject: caf\xe9\n\nbody\n".to_vec()),
    );

    let segments = segmenter.segment(&blob).unwrap();
    assert_eq!(texts(&segments), vec!["Date: x\nSubject: café\n\nbody\n"]);
}

#[test]
fn test_text_payload_passes_through() {
    let decoder = Decoder::default();
    let segmenter = Segmenter::new(&decoder);
    let blob = RawArchiveBlob::new(
        SourceFormat::FlatText,
        Payload::Text("/nDate: x\n\nHello New York\n".to_string()),
    );

    let segments = segmenter.segment(&blob).unwrap();
    assert_eq!(texts(&segments), vec!["Date: x\n\nHello New York\n"]);
}

#[test]
fn test_corrupt_gzip_is_an_error() {
    let decoder = Decoder::default();
    let segmenter = Segmenter::new(&decoder);
    let blob = RawArchiveBlob::new(
        SourceFormat::CompressedUnixMailbox,
        Payload::Bytes(b"definitely not gzip".to_vec()),
    );

    let err = segmenter.segment(&blob).unwrap_err();
    assert!(err.is_file_level());
}

#[test]
fn test_mixed_codec_archive_decoded_line_by_line() {
    let decoder = Decoder::from_labels(["utf-8", "iso-8859-6"]).unwrap();
    let segmenter = Segmenter::new(&decoder);
    let blob = RawArchiveBlob::new(
        SourceFormat::FlatText,
        Payload::Bytes(b"/nDate: x\nSubject: caf\xc3\xa9\nX: \xc1\n\nbody\n".to_vec()),
    );

    let segments = segmenter.segment(&blob).unwrap();
    assert_eq!(segments.len(), 1);
    let text = segments[0].text();
    assert!(text.contains("Subject: café\n"));
    assert!(text.contains("X: ء\n"));
    assert!(!text.contains('\u{fffd}'));
}

#[test]
fn test_flat_text_preamble_kept_before_first_boundary() {
    let raw = "Archive of voting-rights, November 2000\n\
               /nReceived: from a\nSubject: one\n\nfirst\n";
    let segments = split_text(SourceFormat::FlatText, raw);

    assert_eq!(
        texts(&segments),
        vec![
            "Archive of voting-rights, November 2000\n",
            "Received: from a\nSubject: one\n\nfirst\n"
        ]
    );
}
