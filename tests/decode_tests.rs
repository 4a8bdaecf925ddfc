//! End-to-end decode tests: describe, row data and typed cell access

use chrono::NaiveDate;
use tns_core::buffer::WriteBuffer;
use tns_core::constants::{ccap_value, csfrm, error_code};
use tns_core::messages::write_error_info;
use tns_core::{
    Capabilities, Cursor, DecodeFailure, Error, FetchOptions, FetchStatus, LobEncoding,
    LobLocator, MessageType, OracleErrorInfo, OracleNumber, OracleType, Row, RowId, Statement,
};

fn caps() -> Capabilities {
    let mut caps = Capabilities::new();
    caps.protocol_version = 319;
    caps.ttc_field_version = ccap_value::FIELD_VERSION_19_1;
    caps
}

fn write_column(buf: &mut WriteBuffer, name: &str, oracle_type: OracleType, form: u8) {
    buf.write_u8(oracle_type as u8).unwrap();
    buf.write_u8(0).unwrap(); // flags
    buf.write_u8(0).unwrap(); // precision
    buf.write_u8(0).unwrap(); // scale
    buf.write_ub4(4000).unwrap(); // buffer size
    buf.write_ub4(0).unwrap(); // max array elements
    buf.write_ub8(0).unwrap(); // cont flags
    buf.write_ub4(0).unwrap(); // OID
    buf.write_ub2(0).unwrap(); // version
    buf.write_ub2(if form == csfrm::NCHAR { 2000 } else { 873 }).unwrap();
    buf.write_u8(form).unwrap();
    buf.write_ub4(4000).unwrap(); // max size
    buf.write_ub4(0).unwrap(); // oaccolid
    buf.write_u8(1).unwrap(); // nullable
    buf.write_u8(0).unwrap(); // v7 name length
    buf.write_ub4(name.len() as u32).unwrap();
    buf.write_string_with_length(Some(name)).unwrap();
    buf.write_ub4(0).unwrap(); // type schema
    buf.write_ub4(0).unwrap(); // type name
    buf.write_ub2(0).unwrap(); // position
    buf.write_ub4(0).unwrap(); // uds flags
}

fn write_describe(buf: &mut WriteBuffer, columns: &[(&str, OracleType, u8)]) {
    buf.write_u8(MessageType::DescribeInfo.code()).unwrap();
    buf.write_u8(0).unwrap(); // empty chunked header
    buf.write_ub4(8000).unwrap(); // max row size
    buf.write_ub4(columns.len() as u32).unwrap();
    buf.write_u8(0).unwrap();
    for &(name, oracle_type, form) in columns {
        write_column(buf, name, oracle_type, form);
    }
    for _ in 0..6 {
        buf.write_ub4(0).unwrap();
    }
}

fn write_end_of_fetch(buf: &mut WriteBuffer, rows: u64) {
    buf.write_u8(MessageType::Error.code()).unwrap();
    write_error_info(
        buf,
        &OracleErrorInfo {
            code: error_code::NO_DATA_FOUND,
            message: "ORA-01403: no data found".to_string(),
            row_count: rows,
            ..Default::default()
        },
        ccap_value::FIELD_VERSION_19_1,
    )
    .unwrap();
}

fn single_row(cursor: &mut Cursor) -> Row {
    match cursor.next_row() {
        FetchStatus::Row(row) => row,
        other => panic!("expected a row, got {other:?}"),
    }
}

fn utf16be(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

#[test]
fn test_mixed_types_row() {
    let mut buf = WriteBuffer::new();
    write_describe(
        &mut buf,
        &[
            ("ID", OracleType::Number, 0),
            ("NAME", OracleType::Varchar, csfrm::IMPLICIT),
            ("NICK", OracleType::Varchar, csfrm::NCHAR),
            ("CREATED", OracleType::Date, 0),
            ("RID", OracleType::Rowid, 0),
            ("PAYLOAD", OracleType::Raw, 0),
            ("NOTE", OracleType::Varchar, csfrm::IMPLICIT),
        ],
    );
    buf.write_u8(MessageType::RowData.code()).unwrap();
    buf.write_bytes(&[0x03, 0xc2, 0x02, 0x18]).unwrap(); // 123
    buf.write_bytes_with_length(Some("Ada".as_bytes())).unwrap();
    buf.write_bytes_with_length(Some(&utf16be("Λ"))).unwrap();
    buf.write_bytes_with_length(Some(&[120, 124, 1, 31, 24, 60, 60])).unwrap();
    buf.write_u8(10).unwrap(); // ROWID present
    buf.write_ub4(73196).unwrap();
    buf.write_ub2(4).unwrap();
    buf.write_u8(0).unwrap();
    buf.write_ub4(151).unwrap();
    buf.write_ub2(0).unwrap();
    buf.write_bytes_with_length(Some(&[0xca, 0xfe])).unwrap();
    buf.write_bytes_with_length(None).unwrap();
    write_end_of_fetch(&mut buf, 1);

    let mut cursor = Cursor::new(Statement::new("SELECT * FROM people"), &FetchOptions::default());
    cursor.process_response(buf.as_slice(), &caps()).unwrap();
    assert_eq!(cursor.num_columns(), 7);

    let row = single_row(&mut cursor);
    assert_eq!(row.get::<i64>(0).unwrap(), 123);
    assert_eq!(row.get::<OracleNumber>(0).unwrap().as_str(), "123");
    assert_eq!(row.get_by_name::<String>("name").unwrap(), "Ada");
    assert_eq!(row.get::<String>(2).unwrap(), "Λ");
    assert_eq!(
        row.get::<chrono::NaiveDateTime>(3).unwrap(),
        NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
    );
    assert_eq!(row.get::<String>(4).unwrap(), "AAAR3sAAEAAAACXAAA");
    assert_eq!(row.get::<RowId>(4).unwrap(), RowId::new(73196, 4, 151, 0));
    assert_eq!(row.get::<Vec<u8>>(5).unwrap(), vec![0xca, 0xfe]);
    assert_eq!(row.get::<Option<String>>(6).unwrap(), None);
    assert!(matches!(cursor.next_row(), FetchStatus::Exhausted));
}

#[test]
fn test_decode_failure_names_the_column() {
    let mut buf = WriteBuffer::new();
    write_describe(&mut buf, &[("STATUS", OracleType::Varchar, csfrm::IMPLICIT)]);
    buf.write_u8(MessageType::RowData.code()).unwrap();
    buf.write_bytes_with_length(Some(b"open")).unwrap();
    write_end_of_fetch(&mut buf, 1);

    let mut cursor = Cursor::new(Statement::new("SELECT status FROM t"), &FetchOptions::default());
    cursor.process_response(buf.as_slice(), &caps()).unwrap();
    let row = single_row(&mut cursor);

    let line = line!() + 1;
    let err = row.get::<i64>(0).unwrap_err();
    match err {
        Error::Decode(e) => {
            assert_eq!(e.failure, DecodeFailure::TypeMismatch);
            assert_eq!(e.column_name, "STATUS");
            assert_eq!(e.column_index, 0);
            assert_eq!(e.target_type, "i64");
            assert_eq!(e.oracle_type, OracleType::Varchar);
            assert_eq!(e.raw.as_deref(), Some(&b"open"[..]));
            assert_eq!(e.file, file!());
            assert_eq!(e.line, line);
        }
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn test_lob_locators_and_encoding() {
    let mut buf = WriteBuffer::new();
    write_describe(
        &mut buf,
        &[
            ("DOC", OracleType::Clob, csfrm::IMPLICIT),
            ("BIN", OracleType::Blob, 0),
        ],
    );
    let mut clob_locator = vec![0u8; 40];
    clob_locator[6] = 0x80; // variable-length charset
    buf.write_u8(MessageType::RowData.code()).unwrap();
    buf.write_ub4(clob_locator.len() as u32).unwrap();
    buf.write_ub8(11).unwrap(); // size
    buf.write_ub4(8132).unwrap(); // chunk size
    buf.write_bytes_with_length(Some(&clob_locator)).unwrap();
    buf.write_ub4(0).unwrap(); // NULL BLOB
    write_end_of_fetch(&mut buf, 1);

    let mut cursor = Cursor::new(Statement::new("SELECT doc, bin FROM t"), &FetchOptions::default());
    cursor.process_response(buf.as_slice(), &caps()).unwrap();
    let row = single_row(&mut cursor);

    let lob = row.get::<LobLocator>(0).unwrap();
    assert_eq!(lob.size(), 11);
    assert_eq!(lob.chunk_size(), 8132);
    assert_eq!(lob.encoding(), LobEncoding::Utf16);
    assert_eq!(row.get::<Option<LobLocator>>(1).unwrap(), None);
}

#[test]
fn test_lobs_fetched_inline() {
    let mut buf = WriteBuffer::new();
    write_describe(
        &mut buf,
        &[
            ("TXT", OracleType::Clob, csfrm::NCHAR),
            ("BIN", OracleType::Blob, 0),
        ],
    );
    buf.write_u8(MessageType::RowData.code()).unwrap();
    buf.write_bytes_with_length(Some(&utf16be("ok"))).unwrap();
    buf.write_u8(0).unwrap(); // null indicator
    buf.write_u8(0).unwrap(); // return code
    buf.write_bytes_with_length(Some(&[1, 2, 3])).unwrap();
    buf.write_u8(0).unwrap();
    buf.write_u8(0).unwrap();
    write_end_of_fetch(&mut buf, 1);

    let options = FetchOptions {
        fetch_lobs: false,
        ..Default::default()
    };
    let mut cursor = Cursor::new(Statement::new("SELECT txt, bin FROM t"), &options);
    cursor.process_response(buf.as_slice(), &caps()).unwrap();

    let vars = cursor.fetch_variables();
    assert_eq!(vars[0].oracle_type(), OracleType::Long);
    assert_eq!(vars[0].oracle_type().name(vars[0].charset_form()), "LONG NVARCHAR");
    assert_eq!(vars[1].oracle_type(), OracleType::LongRaw);

    let row = single_row(&mut cursor);
    assert_eq!(row.get::<String>(0).unwrap(), "ok");
    assert_eq!(row.get::<Vec<u8>>(1).unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_row_header_bit_vector_repeats_values() {
    let mut buf = WriteBuffer::new();
    write_describe(
        &mut buf,
        &[
            ("DEPT", OracleType::Varchar, csfrm::IMPLICIT),
            ("EMP", OracleType::Varchar, csfrm::IMPLICIT),
        ],
    );
    buf.write_u8(MessageType::RowData.code()).unwrap();
    buf.write_bytes_with_length(Some(b"R&D")).unwrap();
    buf.write_bytes_with_length(Some(b"ann")).unwrap();

    buf.write_u8(MessageType::RowHeader.code()).unwrap();
    buf.write_u8(0).unwrap(); // flags
    buf.write_ub2(0).unwrap(); // num requests
    buf.write_ub4(0).unwrap(); // iteration
    buf.write_ub4(0).unwrap(); // num iters
    buf.write_ub2(0).unwrap(); // buffer length
    buf.write_ub4(1).unwrap(); // bit vector bytes
    buf.write_u8(1).unwrap(); // repeated length
    buf.write_u8(0b10).unwrap(); // DEPT unchanged
    buf.write_ub4(0).unwrap(); // rxhrid
    buf.write_u8(MessageType::RowData.code()).unwrap();
    buf.write_bytes_with_length(Some(b"bob")).unwrap();
    write_end_of_fetch(&mut buf, 2);

    let mut cursor = Cursor::new(Statement::new("SELECT dept, emp FROM t"), &FetchOptions::default());
    cursor.process_response(buf.as_slice(), &caps()).unwrap();

    let first = single_row(&mut cursor);
    let second = single_row(&mut cursor);
    assert_eq!(first.get::<String>(0).unwrap(), "R&D");
    assert_eq!(second.get::<String>(0).unwrap(), "R&D");
    assert_eq!(second.get::<String>(1).unwrap(), "bob");
}

#[test]
fn test_unknown_column_type_aborts_response() {
    let mut buf = WriteBuffer::new();
    buf.write_u8(MessageType::DescribeInfo.code()).unwrap();
    buf.write_u8(0).unwrap();
    buf.write_ub4(10).unwrap();
    buf.write_ub4(1).unwrap();
    buf.write_u8(0).unwrap();
    buf.write_u8(250).unwrap(); // not an Oracle type number

    let mut cursor = Cursor::new(Statement::new("SELECT x FROM t"), &FetchOptions::default());
    assert!(matches!(
        cursor.process_response(buf.as_slice(), &caps()),
        Err(Error::InvalidOracleType(250))
    ));
}
