use std::io::Cursor;

use futures_util::TryStreamExt;
use tokio::sync::mpsc;

use crate::{
    decode_all, encode_all, CancelToken, HiveError, HiveReader, HiveReaderBuilder, HiveWriter,
};

#[derive(Debug, Default, PartialEq, Clone)]
struct Row {
    id: i64,
    name: String,
}

crate::hive_record!(Row { id: i64, name: String });

fn row(id: i64, name: &str) -> Row {
    Row {
        id,
        name: name.into(),
    }
}

#[tokio::test]
async fn writer_frames_one_record_per_line() {
    let mut writer = HiveWriter::new(Vec::new());
    writer.encode_next(&row(1, "a")).await.unwrap();
    writer.encode_next(&row(2, "b")).await.unwrap();
    writer.flush().await.unwrap();
    assert_eq!(writer.into_inner(), b"1\x01a\n2\x01b\n");
}

#[tokio::test]
async fn writer_respects_a_custom_delimiter() {
    let mut writer = HiveWriter::with_delimiter(Vec::new(), 0x00);
    writer.encode_next(&row(1, "a")).await.unwrap();
    writer.encode_next(&row(2, "b")).await.unwrap();
    assert_eq!(writer.into_inner(), b"1\x01a\x002\x01b\x00");
}

#[tokio::test]
async fn reader_yields_records_then_eof() {
    let mut reader = HiveReader::new(Cursor::new(b"1\x01a\n2\x01b\n".to_vec()));
    let mut target = Row::default();

    reader.decode_next(&mut target).await.unwrap();
    assert_eq!(target, row(1, "a"));
    reader.decode_next(&mut target).await.unwrap();
    assert_eq!(target, row(2, "b"));
    assert!(matches!(
        reader.decode_next(&mut target).await,
        Err(HiveError::Eof)
    ));
    // Eof is sticky-safe: asking again keeps reporting it.
    assert!(matches!(
        reader.decode_next(&mut target).await,
        Err(HiveError::Eof)
    ));
}

#[tokio::test]
async fn final_unterminated_line_still_counts() {
    let mut reader = HiveReader::new(Cursor::new(b"1\x01a\n2\x01b".to_vec()));
    let mut target = Row::default();

    reader.decode_next(&mut target).await.unwrap();
    reader.decode_next(&mut target).await.unwrap();
    assert_eq!(target, row(2, "b"));
    assert!(matches!(
        reader.decode_next(&mut target).await,
        Err(HiveError::Eof)
    ));
}

#[tokio::test]
async fn empty_line_decodes_the_zero_record() {
    let mut reader = HiveReader::new(Cursor::new(b"\n7\x01x\n".to_vec()));
    let mut target = row(9, "stale");

    reader.decode_next(&mut target).await.unwrap();
    assert_eq!(target, Row::default());
    reader.decode_next(&mut target).await.unwrap();
    assert_eq!(target, row(7, "x"));
}

#[tokio::test]
async fn oversized_record_is_rejected() {
    let data = vec![b'a'; 64];
    let mut reader = HiveReaderBuilder::new()
        .max_record_bytes(8)
        .build(Cursor::new(data));
    let mut target = Row::default();
    assert!(matches!(
        reader.decode_next(&mut target).await,
        Err(HiveError::TooLarge(8))
    ));
}

#[tokio::test]
async fn reader_and_writer_agree_on_custom_delimiters() {
    let rows = vec![row(1, "a"), row(2, "b"), row(3, "c")];

    let mut writer = HiveWriter::with_delimiter(Vec::new(), 0x00);
    for r in &rows {
        writer.encode_next(r).await.unwrap();
    }
    let bytes = writer.into_inner();

    let reader = HiveReader::with_delimiter(Cursor::new(bytes), 0x00);
    let got: Vec<Row> = reader.records().try_collect().await.unwrap();
    assert_eq!(got, rows);
}

#[tokio::test]
async fn bad_record_surfaces_but_reader_stays_usable() {
    let mut reader = HiveReader::new(Cursor::new(b"bogus\n2\x01b\n".to_vec()));
    let mut target = Row::default();

    assert!(matches!(
        reader.decode_next(&mut target).await,
        Err(HiveError::Parse { .. })
    ));
    reader.decode_next(&mut target).await.unwrap();
    assert_eq!(target, row(2, "b"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn drain_loops_bridge_channels() {
    let rows: Vec<Row> = (0..100).map(|i| row(i, "payload")).collect();
    let cancel = CancelToken::new();

    // Fan the rows through encode_all into one byte image.
    let (tx, mut rx) = mpsc::channel::<Row>(8);
    let feeder = {
        let rows = rows.clone();
        tokio::spawn(async move {
            for r in rows {
                tx.send(r).await.unwrap();
            }
        })
    };
    let mut writer = HiveWriter::new(Vec::new());
    encode_all(&cancel, &mut writer, &mut rx).await.unwrap();
    feeder.await.unwrap();
    let bytes = writer.into_inner();

    // And back out through decode_all.
    let (tx, mut rx) = mpsc::channel::<Row>(8);
    let mut reader = HiveReader::new(Cursor::new(bytes));
    let drain = tokio::spawn(async move {
        let mut got = Vec::new();
        while let Some(r) = rx.recv().await {
            got.push(r);
        }
        got
    });
    decode_all(&cancel, &mut reader, tx).await.unwrap();
    assert_eq!(drain.await.unwrap(), rows);
}

#[tokio::test]
async fn cancellation_beats_a_blocked_read() {
    // A duplex with no writer activity keeps the reader pending, so the
    // cancel arm is the only one that can win.
    let (_held_open, rx_side) = tokio::io::duplex(64);
    let mut reader = HiveReader::new(rx_side);

    let cancel = CancelToken::new();
    cancel.cancel();

    let (tx, _rx) = mpsc::channel::<Row>(1);
    assert!(matches!(
        decode_all(&cancel, &mut reader, tx).await,
        Err(HiveError::Cancelled)
    ));
}

#[tokio::test]
async fn cancellation_stops_encode_all() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let (_tx, mut rx) = mpsc::channel::<Row>(1);
    let mut writer = HiveWriter::new(Vec::new());
    assert!(matches!(
        encode_all(&cancel, &mut writer, &mut rx).await,
        Err(HiveError::Cancelled)
    ));
}

#[tokio::test]
async fn dropped_sink_reports_closed() {
    let cancel = CancelToken::new();
    let mut reader = HiveReader::new(Cursor::new(b"1\x01a\n".to_vec()));

    let (tx, rx) = mpsc::channel::<Row>(1);
    drop(rx);
    assert!(matches!(
        decode_all(&cancel, &mut reader, tx).await,
        Err(HiveError::Closed)
    ));
}

#[tokio::test]
async fn file_backed_streams_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.hive");
    let rows: Vec<Row> = (0..10).map(|i| row(i, "disk")).collect();

    let file = tokio::fs::File::create(&path).await.unwrap();
    let mut writer = HiveWriter::new(file);
    for r in &rows {
        writer.encode_next(r).await.unwrap();
    }
    writer.flush().await.unwrap();
    drop(writer);

    let file = tokio::fs::File::open(&path).await.unwrap();
    let got: Vec<Row> = HiveReader::new(file).records().try_collect().await.unwrap();
    assert_eq!(got, rows);
}
