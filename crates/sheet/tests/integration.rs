use sheetmap_sheet::{
    export_grid, read_grid, read_grid_from_path, BufferedDownload, ExportOptions, FileDownload,
    Grid, ReadOptions, SheetError, SpreadsheetFormat,
};
use tempfile::tempdir;

fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|row| row.iter().map(|s| (*s).to_string()).collect())
        .collect()
}

fn round_trip(grid: &Grid, format: SpreadsheetFormat) -> Grid {
    let mut sink = BufferedDownload::new();
    let options = ExportOptions::default().with_format(format);
    export_grid("round-trip", grid, &options, &mut sink).unwrap();
    read_grid(sink.bytes(), 0).unwrap()
}

// ===== Round-trip Tests =====

#[test]
fn test_text_grid_round_trip_xlsx() {
    let data = grid(&[
        &["Name", "City", "Note"],
        &["Alice", "Paris", "likes tea"],
        &["Bob", "Zürich", ""],
        &["Chen", "北京", "多语言"],
    ]);
    assert_eq!(round_trip(&data, SpreadsheetFormat::Xlsx), data);
}

#[test]
fn test_text_grid_round_trip_xls() {
    let data = grid(&[
        &["Name", "City", "Note"],
        &["Alice", "Paris", "likes tea"],
        &["Bob", "Zürich", ""],
        &["Chen", "北京", "多语言"],
    ]);
    assert_eq!(round_trip(&data, SpreadsheetFormat::Xls), data);
}

#[test]
fn test_blank_rows_are_dropped() {
    let data = grid(&[&["h1", "h2"], &["", ""], &["a", "b"]]);
    let expected = grid(&[&["h1", "h2"], &["a", "b"]]);
    assert_eq!(round_trip(&data, SpreadsheetFormat::Xlsx), expected);
    assert_eq!(round_trip(&data, SpreadsheetFormat::Xls), expected);
}

#[test]
fn test_short_rows_are_padded_to_header_width() {
    let data = grid(&[&["h1", "h2", "h3"], &["only"]]);
    let expected = grid(&[&["h1", "h2", "h3"], &["only", "", ""]]);
    assert_eq!(round_trip(&data, SpreadsheetFormat::Xls), expected);
}

// ===== File Tests =====

#[test]
fn test_file_download_and_read_from_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("people.xls");
    let data = grid(&[&["Name", "Age"], &["Alice", "30"]]);

    let mut sink = FileDownload::create(&path).unwrap();
    let options = ExportOptions::default().with_format(SpreadsheetFormat::Xls);
    let sent = export_grid("people", &data, &options, &mut sink).unwrap();
    assert_eq!(sink.content_type(), Some("application/vnd.ms-excel"));
    assert_eq!(
        sink.header("Content-Disposition"),
        Some("attachment; filename*=UTF-8''people.xls")
    );
    drop(sink);

    assert_eq!(std::fs::metadata(&path).unwrap().len(), sent);
    let read_back = read_grid_from_path(&path, &ReadOptions::default()).unwrap();
    assert_eq!(read_back, data);
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = read_grid_from_path(dir.path().join("absent.xlsx"), &ReadOptions::default());
    assert!(matches!(result, Err(SheetError::Io(_))));
}

#[test]
fn test_garbage_input_is_decode_error() {
    let result = read_grid(&[0u8, 1, 2, 3, 4, 5, 6, 7][..], 0);
    assert!(matches!(result, Err(SheetError::Decode(_))));
}

#[test]
fn test_header_row_option() {
    let data = grid(&[&["Title"], &["a", "b", "c"], &["1", "2", "3"]]);
    let mut sink = BufferedDownload::new();
    export_grid("t", &data, &ExportOptions::default(), &mut sink).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("t.xlsx");
    std::fs::write(&path, sink.bytes()).unwrap();

    let options = ReadOptions::default().with_header_row(1);
    let read_back = read_grid_from_path(&path, &options).unwrap();
    assert_eq!(
        read_back,
        grid(&[&["Title", "", ""], &["a", "b", "c"], &["1", "2", "3"]])
    );
}
