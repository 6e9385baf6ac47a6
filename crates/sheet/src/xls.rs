//! Legacy BIFF8 (.xls) encoding of a [`Workbook`].
//!
//! The workbook stream holds a globals substream (fonts, XF table, sheet
//! directory, shared strings) followed by one substream per sheet, and is
//! stored as the `Workbook` stream of a compound file. Only the records
//! needed for text, numbers, column widths, two number formats, centered
//! alignment and merged regions are written.

use crate::book::{Workbook, Worksheet};
use crate::cell::{Alignment, CellStyle, CellValue, NumberFormat};
use crate::error::{Result, SheetError};
use indexmap::IndexSet;
use std::io::{Cursor, Write};

const RECORD_BOF: u16 = 0x0809;
const RECORD_EOF: u16 = 0x000A;
const RECORD_CODEPAGE: u16 = 0x0042;
const RECORD_WINDOW1: u16 = 0x003D;
const RECORD_FONT: u16 = 0x0031;
const RECORD_XF: u16 = 0x00E0;
const RECORD_STYLE: u16 = 0x0293;
const RECORD_BOUNDSHEET: u16 = 0x0085;
const RECORD_SST: u16 = 0x00FC;
const RECORD_CONTINUE: u16 = 0x003C;
const RECORD_DEFCOLWIDTH: u16 = 0x0055;
const RECORD_COLINFO: u16 = 0x007D;
const RECORD_DIMENSIONS: u16 = 0x0200;
const RECORD_LABELSST: u16 = 0x00FD;
const RECORD_NUMBER: u16 = 0x0203;
const RECORD_BLANK: u16 = 0x0201;
const RECORD_WINDOW2: u16 = 0x023E;
const RECORD_MERGEDCELLS: u16 = 0x00E5;

const BOF_VERSION_BIFF8: u16 = 0x0600;
/// BIFF8 strings are UTF-16LE, stored compressed when every unit fits a byte
const CODEPAGE_UTF16: u16 = 1200;
const BOF_DT_WORKBOOK_GLOBALS: u16 = 0x0005;
const BOF_DT_WORKSHEET: u16 = 0x0010;

/// Largest record payload; longer data spills into CONTINUE records
const MAX_RECORD_DATA: usize = 8224;
const MAX_MERGES_PER_RECORD: usize = 1026;

/// Row, column and string limits of the format
pub const MAX_ROWS: u32 = 65_536;
pub const MAX_COLS: u16 = 256;
pub const MAX_STRING_CHARS: usize = 32_767;

/// Excel refuses workbook streams shorter than this
const MIN_STREAM_LEN: usize = 4096;

const XF_FLAG_LOCKED: u16 = 0x0001;
const XF_FLAG_STYLE: u16 = 0x0004;
const STYLE_XF_COUNT: u16 = 16;
const ALIGN_GENERAL_BOTTOM: u8 = 0x20;
const ALIGN_CENTER_CENTER: u8 = 0x12;

const WINDOW2_DEFAULT: u16 = 0x00B6;
const WINDOW2_SELECTED: u16 = 0x0200;

/// Encode a workbook as .xls bytes
pub(crate) fn encode(book: &Workbook) -> Result<Vec<u8>> {
    compound_file(build_workbook_stream(book)?)
}

/// Store a workbook stream in a version 3 compound file
fn compound_file(mut stream: Vec<u8>) -> Result<Vec<u8>> {
    if stream.len() < MIN_STREAM_LEN {
        stream.resize(MIN_STREAM_LEN, 0);
    }

    // readers of the legacy format expect 512-byte sectors
    let mut ole = cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))?;
    {
        let mut workbook_stream = ole.create_stream("Workbook")?;
        workbook_stream.write_all(&stream)?;
        workbook_stream.flush()?;
    }
    ole.flush()?;
    Ok(ole.into_inner().into_inner())
}

fn build_workbook_stream(book: &Workbook) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::default();
    let sheets = book
        .sheets()
        .enumerate()
        .map(|(idx, sheet)| build_sheet_stream(sheet, idx == 0, &mut strings))
        .collect::<Result<Vec<_>>>()?;

    let mut globals = Vec::<u8>::new();
    push_record(&mut globals, RECORD_BOF, &bof(BOF_DT_WORKBOOK_GLOBALS));
    push_record(&mut globals, RECORD_CODEPAGE, &CODEPAGE_UTF16.to_le_bytes());
    push_record(&mut globals, RECORD_WINDOW1, &window1());

    // Font index 4 is never referenced, four fonts keep the table well-formed
    for _ in 0..4 {
        push_record(&mut globals, RECORD_FONT, &font("Arial"));
    }

    for _ in 0..STYLE_XF_COUNT {
        push_record(&mut globals, RECORD_XF, &xf_record(0, 0, true, ALIGN_GENERAL_BOTTOM));
    }
    for style in CELL_STYLES {
        let align = match style.alignment {
            Alignment::General => ALIGN_GENERAL_BOTTOM,
            Alignment::Center => ALIGN_CENTER_CENTER,
        };
        push_record(
            &mut globals,
            RECORD_XF,
            &xf_record(0, style.number_format.builtin_id(), false, align),
        );
    }

    // Built-in "Normal" style bound to XF 0
    push_record(&mut globals, RECORD_STYLE, &[0x00, 0x80, 0x00, 0xFF]);

    let mut offset_slots = Vec::with_capacity(sheets.len());
    for sheet in book.sheets() {
        let mut boundsheet = Vec::<u8>::new();
        boundsheet.extend_from_slice(&0u32.to_le_bytes()); // lbPlyPos, patched below
        boundsheet.extend_from_slice(&0u16.to_le_bytes()); // visible worksheet
        write_short_unicode_string(&mut boundsheet, sheet.name())?;
        offset_slots.push(globals.len() + 4);
        push_record(&mut globals, RECORD_BOUNDSHEET, &boundsheet);
    }

    for (idx, record) in strings.into_records().iter().enumerate() {
        let id = if idx == 0 { RECORD_SST } else { RECORD_CONTINUE };
        push_record(&mut globals, id, record);
    }
    push_record(&mut globals, RECORD_EOF, &[]);

    let mut offset = globals.len();
    for (slot, sheet) in offset_slots.iter().zip(&sheets) {
        let pos = u32::try_from(offset)
            .map_err(|_| SheetError::Serialize("Workbook stream exceeds 4 GiB".to_string()))?;
        globals[*slot..*slot + 4].copy_from_slice(&pos.to_le_bytes());
        offset += sheet.len();
    }
    for sheet in sheets {
        globals.extend_from_slice(&sheet);
    }

    Ok(globals)
}

fn build_sheet_stream(sheet: &Worksheet, selected: bool, strings: &mut SharedStrings) -> Result<Vec<u8>> {
    let mut out = Vec::<u8>::new();
    push_record(&mut out, RECORD_BOF, &bof(BOF_DT_WORKSHEET));
    push_record(&mut out, RECORD_DEFCOLWIDTH, &8u16.to_le_bytes());

    for (col, width) in sheet.column_widths() {
        let col = xls_col(col)?;
        push_record(&mut out, RECORD_COLINFO, &colinfo(col, width));
    }

    push_record(&mut out, RECORD_DIMENSIONS, &dimensions(sheet)?);

    for (row, cells) in sheet.rows() {
        let row = xls_row(row)?;
        for (col, cell) in cells.cells() {
            let col = xls_col(col)?;
            let xf = xf_index(cell.style());
            match cell.value() {
                CellValue::Number(n) => {
                    push_record(&mut out, RECORD_NUMBER, &number_cell(row, col, xf, *n));
                }
                CellValue::Text(s) if !s.is_empty() => {
                    let isst = strings.intern(s)?;
                    push_record(&mut out, RECORD_LABELSST, &labelsst_cell(row, col, xf, isst));
                }
                _ if !cell.style().is_default() => {
                    push_record(&mut out, RECORD_BLANK, &blank_cell(row, col, xf));
                }
                _ => {}
            }
        }
    }

    let grbit = if selected {
        WINDOW2_DEFAULT | WINDOW2_SELECTED
    } else {
        WINDOW2_DEFAULT
    };
    push_record(&mut out, RECORD_WINDOW2, &window2(grbit));

    for chunk in sheet.merged_regions().chunks(MAX_MERGES_PER_RECORD) {
        let mut merged = Vec::<u8>::with_capacity(2 + chunk.len() * 8);
        merged.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
        for region in chunk {
            merged.extend_from_slice(&xls_row(region.first_row)?.to_le_bytes());
            merged.extend_from_slice(&xls_row(region.last_row)?.to_le_bytes());
            merged.extend_from_slice(&xls_col(region.first_col)?.to_le_bytes());
            merged.extend_from_slice(&xls_col(region.last_col)?.to_le_bytes());
        }
        push_record(&mut out, RECORD_MERGEDCELLS, &merged);
    }

    push_record(&mut out, RECORD_EOF, &[]);
    Ok(out)
}

/// Cell XFs in table order after the style XFs
const CELL_STYLES: [CellStyle; 4] = [
    CellStyle {
        number_format: NumberFormat::General,
        alignment: Alignment::General,
    },
    CellStyle {
        number_format: NumberFormat::Thousands,
        alignment: Alignment::General,
    },
    CellStyle {
        number_format: NumberFormat::General,
        alignment: Alignment::Center,
    },
    CellStyle {
        number_format: NumberFormat::Thousands,
        alignment: Alignment::Center,
    },
];

fn xf_index(style: CellStyle) -> u16 {
    let format = u16::from(style.number_format == NumberFormat::Thousands);
    let align = u16::from(style.alignment == Alignment::Center);
    STYLE_XF_COUNT + format + 2 * align
}

fn xls_row(row: u32) -> Result<u16> {
    u16::try_from(row).map_err(|_| {
        SheetError::Serialize(format!("Row {row} exceeds the .xls limit of {MAX_ROWS} rows"))
    })
}

fn xls_col(col: u16) -> Result<u16> {
    if col >= MAX_COLS {
        return Err(SheetError::Serialize(format!(
            "Column {col} exceeds the .xls limit of {MAX_COLS} columns"
        )));
    }
    Ok(col)
}

/// Shared string table, deduplicated in first-use order
#[derive(Default)]
struct SharedStrings {
    unique: IndexSet<String>,
    total: u32,
}

impl SharedStrings {
    fn intern(&mut self, s: &str) -> Result<u32> {
        if s.encode_utf16().count() > MAX_STRING_CHARS {
            return Err(SheetError::Serialize(format!(
                "Text of {} characters exceeds the .xls limit of {MAX_STRING_CHARS}",
                s.chars().count()
            )));
        }
        self.total += 1;
        let (idx, _) = self.unique.insert_full(s.to_string());
        Ok(idx as u32)
    }

    /// SST payload split into record-sized chunks; the first is the SST
    /// itself, the rest go out as CONTINUE records
    fn into_records(self) -> Vec<Vec<u8>> {
        let mut records = Vec::new();
        let mut current = Vec::with_capacity(MAX_RECORD_DATA);
        current.extend_from_slice(&self.total.to_le_bytes());
        current.extend_from_slice(&(self.unique.len() as u32).to_le_bytes());

        for s in &self.unique {
            let units: Vec<u16> = s.encode_utf16().collect();
            let compressed = units.iter().all(|&ch| ch < 0x80);
            let (flags, char_size) = if compressed { (0u8, 1) } else { (1u8, 2) };

            // The cch/flags header never straddles a record boundary
            let needed = 3 + if units.is_empty() { 0 } else { char_size };
            if current.len() + needed > MAX_RECORD_DATA {
                records.push(std::mem::take(&mut current));
            }
            current.extend_from_slice(&(units.len() as u16).to_le_bytes());
            current.push(flags);

            let mut rest = units.as_slice();
            loop {
                let room = (MAX_RECORD_DATA - current.len()) / char_size;
                let (now, later) = rest.split_at(room.min(rest.len()));
                for &ch in now {
                    if compressed {
                        current.push(ch as u8);
                    } else {
                        current.extend_from_slice(&ch.to_le_bytes());
                    }
                }
                rest = later;
                if rest.is_empty() {
                    break;
                }
                records.push(std::mem::take(&mut current));
                // a continued string restates its encoding
                current.push(flags);
            }
        }

        records.push(current);
        records
    }
}

fn push_record(out: &mut Vec<u8>, id: u16, data: &[u8]) {
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
}

fn bof(dt: u16) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..2].copy_from_slice(&BOF_VERSION_BIFF8.to_le_bytes());
    out[2..4].copy_from_slice(&dt.to_le_bytes());
    out[4..6].copy_from_slice(&0x0DBBu16.to_le_bytes()); // build
    out[6..8].copy_from_slice(&0x07CCu16.to_le_bytes()); // year
    out
}

fn window1() -> [u8; 18] {
    let mut out = [0u8; 18];
    out[14..16].copy_from_slice(&1u16.to_le_bytes()); // cTabSel
    out[16..18].copy_from_slice(&600u16.to_le_bytes()); // wTabRatio
    out
}

fn window2(grbit: u16) -> [u8; 18] {
    let mut out = [0u8; 18];
    out[0..2].copy_from_slice(&grbit.to_le_bytes());
    out
}

fn font(name: &str) -> Vec<u8> {
    let mut out = Vec::<u8>::new();
    out.extend_from_slice(&200u16.to_le_bytes()); // height, 10pt in twips
    out.extend_from_slice(&0u16.to_le_bytes()); // option flags
    out.extend_from_slice(&0x7FFFu16.to_le_bytes()); // automatic color
    out.extend_from_slice(&400u16.to_le_bytes()); // weight
    out.extend_from_slice(&0u16.to_le_bytes()); // escapement
    out.extend_from_slice(&[0, 0, 0, 0]); // underline, family, charset, reserved
    // font names are short ASCII literals
    out.push(name.len() as u8);
    out.push(0);
    out.extend_from_slice(name.as_bytes());
    out
}

fn xf_record(font_idx: u16, fmt_idx: u16, is_style_xf: bool, align: u8) -> [u8; 20] {
    let mut out = [0u8; 20];
    out[0..2].copy_from_slice(&font_idx.to_le_bytes());
    out[2..4].copy_from_slice(&fmt_idx.to_le_bytes());
    let flags: u16 = XF_FLAG_LOCKED | if is_style_xf { XF_FLAG_STYLE } else { 0 };
    out[4..6].copy_from_slice(&flags.to_le_bytes());
    out[6] = align;
    out[9] = 0x3F; // apply all attribute groups
    out
}

fn colinfo(col: u16, width: f64) -> [u8; 12] {
    let cx = (width * 256.0).round().clamp(0.0, f64::from(u16::MAX)) as u16;
    let mut out = [0u8; 12];
    out[0..2].copy_from_slice(&col.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&cx.to_le_bytes());
    out[6..8].copy_from_slice(&STYLE_XF_COUNT.to_le_bytes());
    out
}

fn dimensions(sheet: &Worksheet) -> Result<[u8; 14]> {
    let mut out = [0u8; 14];
    if let Some((last_row, last_col)) = sheet.extent() {
        let rows = u32::from(xls_row(last_row)?) + 1;
        let cols = xls_col(last_col)? + 1;
        out[4..8].copy_from_slice(&rows.to_le_bytes());
        out[10..12].copy_from_slice(&cols.to_le_bytes());
    }
    Ok(out)
}

fn number_cell(row: u16, col: u16, xf: u16, v: f64) -> [u8; 14] {
    let mut out = [0u8; 14];
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&xf.to_le_bytes());
    out[6..14].copy_from_slice(&v.to_le_bytes());
    out
}

fn labelsst_cell(row: u16, col: u16, xf: u16, isst: u32) -> [u8; 10] {
    let mut out = [0u8; 10];
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&xf.to_le_bytes());
    out[6..10].copy_from_slice(&isst.to_le_bytes());
    out
}

fn blank_cell(row: u16, col: u16, xf: u16) -> [u8; 6] {
    let mut out = [0u8; 6];
    out[0..2].copy_from_slice(&row.to_le_bytes());
    out[2..4].copy_from_slice(&col.to_le_bytes());
    out[4..6].copy_from_slice(&xf.to_le_bytes());
    out
}

fn write_short_unicode_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let utf16: Vec<u16> = s.encode_utf16().collect();
    let len = u8::try_from(utf16.len())
        .map_err(|_| SheetError::Serialize(format!("Sheet name '{s}' is too long")))?;
    out.push(len);
    if utf16.iter().all(|&ch| ch < 0x80) {
        out.push(0);
        out.extend(utf16.into_iter().map(|ch| ch as u8));
    } else {
        out.push(1);
        for ch in utf16 {
            out.extend_from_slice(&ch.to_le_bytes());
        }
    }
    Ok(())
}
