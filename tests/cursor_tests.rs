//! Cursor fetch engine tests driven by hand-built server responses

use tns_core::buffer::WriteBuffer;
use tns_core::constants::{ccap_value, csfrm, error_code};
use tns_core::messages::write_error_info;
use tns_core::{
    BatchError, Capabilities, ColumnDescribe, Cursor, CursorState, Error, FetchOptions,
    FetchStatus, MessageType, OracleErrorInfo, OracleType, RowId, Statement,
};

fn caps() -> Capabilities {
    let mut caps = Capabilities::new();
    caps.protocol_version = 319;
    caps.ttc_field_version = ccap_value::FIELD_VERSION_19_1;
    caps
}

fn query_cursor(array_size: u32) -> Cursor {
    let mut statement = Statement::new("SELECT id FROM numbers ORDER BY id");
    statement.set_cursor_id(21);
    let options = FetchOptions {
        array_size,
        ..Default::default()
    };
    let mut cursor = Cursor::new(statement, &options);
    cursor.create_fetch_variable(&ColumnDescribe::new("ID", OracleType::Number), 0);
    cursor
}

/// ROW_DATA for a single small positive NUMBER column
fn write_number_row(buf: &mut WriteBuffer, value: u8) {
    buf.write_u8(MessageType::RowData.code()).unwrap();
    buf.write_bytes(&[0x02, 0xc1, value + 1]).unwrap();
}

fn write_end_of_call(buf: &mut WriteBuffer, info: &OracleErrorInfo) {
    buf.write_u8(MessageType::Error.code()).unwrap();
    write_error_info(buf, info, ccap_value::FIELD_VERSION_19_1).unwrap();
}

fn rows_response(values: &[u8], code: u32, row_count: u64) -> Vec<u8> {
    let mut buf = WriteBuffer::new();
    for &v in values {
        write_number_row(&mut buf, v);
    }
    write_end_of_call(
        &mut buf,
        &OracleErrorInfo {
            code,
            message: if code == 0 {
                String::new()
            } else {
                "ORA-01403: no data found".to_string()
            },
            row_count,
            ..Default::default()
        },
    );
    buf.write_u8(MessageType::EndOfResponse.code()).unwrap();
    buf.as_slice().to_vec()
}

fn next_id(cursor: &mut Cursor) -> Option<i64> {
    match cursor.next_row() {
        FetchStatus::Row(row) => Some(row.get::<i64>(0).unwrap()),
        _ => None,
    }
}

#[test]
fn test_final_buffer_is_consumed_without_another_round_trip() {
    let mut cursor = query_cursor(100);
    cursor
        .process_response(&rows_response(&[1, 2, 3], error_code::NO_DATA_FOUND, 3), &caps())
        .unwrap();
    assert!(!cursor.more_rows_to_fetch());
    assert_eq!(cursor.buffer_row_count(), 3);

    for expected in 1..=3 {
        assert_eq!(next_id(&mut cursor), Some(expected));
    }
    assert!(matches!(cursor.next_row(), FetchStatus::Exhausted));
    assert!(matches!(cursor.next_row(), FetchStatus::Exhausted));
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert_eq!(cursor.last_row_index(), 3);
    assert!(cursor.fetch_message().is_err());
}

#[test]
fn test_refill_across_round_trips() {
    let mut cursor = query_cursor(2);
    cursor
        .process_response(&rows_response(&[1, 2], 0, 2), &caps())
        .unwrap();
    assert_eq!(next_id(&mut cursor), Some(1));
    assert!(cursor.fetch_message().is_err(), "buffered row not consumed yet");
    assert_eq!(next_id(&mut cursor), Some(2));
    assert!(matches!(cursor.next_row(), FetchStatus::NeedsFetch));
    assert_eq!(cursor.state(), CursorState::Fetching);

    let fetch = cursor.fetch_message().unwrap();
    assert_eq!(fetch.cursor_id(), 21);
    assert_eq!(fetch.num_rows(), 2);
    assert!(fetch.build_request(true).is_ok());

    cursor
        .process_response(&rows_response(&[3], error_code::NO_DATA_FOUND, 3), &caps())
        .unwrap();
    assert_eq!(cursor.buffer_index(), 0);
    assert_eq!(cursor.buffer_row_count(), 1);
    assert_eq!(next_id(&mut cursor), Some(3));
    assert!(matches!(cursor.next_row(), FetchStatus::Exhausted));
    assert_eq!(cursor.last_row_index(), 3);
    assert_eq!(cursor.row_count(), 3);
}

#[test]
fn test_empty_result_set() {
    let mut cursor = query_cursor(10);
    cursor
        .process_response(&rows_response(&[], error_code::NO_DATA_FOUND, 0), &caps())
        .unwrap();
    assert!(matches!(cursor.next_row(), FetchStatus::Exhausted));
    assert_eq!(cursor.state(), CursorState::Exhausted);
}

#[test]
fn test_contiguous_fetch_variables() {
    let mut cursor = Cursor::new(Statement::new("SELECT a, b, c FROM t"), &FetchOptions::default());
    for (position, name) in ["A", "B", "C"].iter().enumerate() {
        cursor.create_fetch_variable(&ColumnDescribe::new(*name, OracleType::Varchar), position);
    }
    assert_eq!(cursor.num_columns(), 3);
    assert_eq!(cursor.state(), CursorState::Describing);
}

#[test]
#[should_panic(expected = "fetch variable position 5")]
fn test_fetch_variable_gap_panics() {
    let mut cursor = Cursor::new(Statement::new("SELECT a, b FROM t"), &FetchOptions::default());
    cursor.create_fetch_variable(&ColumnDescribe::new("A", OracleType::Number), 0);
    cursor.create_fetch_variable(&ColumnDescribe::new("B", OracleType::Number), 1);
    cursor.create_fetch_variable(&ColumnDescribe::new("F", OracleType::Number), 5);
}

#[test]
fn test_batch_dml_partial_failure() {
    let mut cursor = Cursor::new(
        Statement::new("INSERT INTO t (id) VALUES (:1)"),
        &FetchOptions::default(),
    );
    cursor.statement_mut().set_cursor_id(9);
    cursor.request_dml_row_counts(true);

    let mut buf = WriteBuffer::new();
    buf.write_u8(MessageType::Parameter.code()).unwrap();
    for _ in 0..4 {
        buf.write_ub2(0).unwrap(); // al8o4l, al8txl, pairs, registration
    }
    buf.write_ub4(3).unwrap();
    for count in [1u64, 0, 1] {
        buf.write_ub8(count).unwrap();
    }
    let rowid = RowId::new(73196, 4, 151, 2);
    write_end_of_call(
        &mut buf,
        &OracleErrorInfo {
            code: error_code::ARRAY_DML_ERRORS,
            message: "ORA-24381: error(s) in array DML".to_string(),
            cursor_id: 9,
            row_count: 2,
            rowid: Some(rowid),
            batch_errors: vec![BatchError::new(
                1,
                1,
                "ORA-00001: unique constraint (APP.T_PK) violated",
            )],
            ..Default::default()
        },
    );

    cursor.process_response(buf.as_slice(), &caps()).unwrap();

    assert_eq!(cursor.dml_row_counts(), &[1, 0, 1]);
    assert_eq!(cursor.row_count(), 2);
    assert_eq!(cursor.last_rowid(), Some(rowid));
    let errors = cursor.batch_errors().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row_index, 1);
    assert_eq!(errors[0].code, 1);
}

#[test]
fn test_server_error_still_records_counts() {
    let mut cursor = Cursor::new(
        Statement::new("UPDATE t SET x = 1"),
        &FetchOptions::default(),
    );
    let mut buf = WriteBuffer::new();
    write_end_of_call(
        &mut buf,
        &OracleErrorInfo {
            code: 1,
            cursor_id: 4,
            pos: 7,
            message: "ORA-00001: unique constraint violated".to_string(),
            ..Default::default()
        },
    );
    match cursor.process_response(buf.as_slice(), &caps()) {
        Err(Error::Oracle(info)) => {
            assert_eq!(info.code, 1);
            assert_eq!(info.pos, 7);
        }
        other => panic!("expected server error, got {other:?}"),
    }
    assert_eq!(cursor.statement().cursor_id(), 4);
    assert!(cursor.batch_errors().is_none());
}

fn write_describe_column(buf: &mut WriteBuffer, name: &str, oracle_type: OracleType) {
    buf.write_u8(oracle_type as u8).unwrap();
    buf.write_u8(0).unwrap(); // flags
    buf.write_u8(0).unwrap(); // precision
    buf.write_u8(0).unwrap(); // scale
    buf.write_ub4(4000).unwrap(); // buffer size
    buf.write_ub4(0).unwrap(); // max array elements
    buf.write_ub8(0).unwrap(); // cont flags
    buf.write_ub4(0).unwrap(); // OID
    buf.write_ub2(0).unwrap(); // version
    buf.write_ub2(873).unwrap(); // charset id
    buf.write_u8(csfrm::IMPLICIT).unwrap();
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

/// LONG / LONG RAW value followed by its null indicator and return code
fn write_inline_lob(buf: &mut WriteBuffer, value: Option<&[u8]>) {
    buf.write_bytes_with_length(value).unwrap();
    buf.write_ub4(0).unwrap();
    buf.write_ub4(0).unwrap();
}

#[test]
fn test_described_lobs_fetched_inline() {
    let options = FetchOptions {
        fetch_lobs: false,
        ..Default::default()
    };
    let mut statement = Statement::new("SELECT id, doc, img FROM documents");
    statement.set_cursor_id(30);
    let mut cursor = Cursor::new(statement, &options);
    assert_eq!(cursor.state(), CursorState::Created);

    let mut buf = WriteBuffer::new();
    buf.write_u8(MessageType::DescribeInfo.code()).unwrap();
    buf.write_u8(0).unwrap(); // empty chunked prefix
    buf.write_ub4(8000).unwrap(); // max row size
    buf.write_ub4(3).unwrap();
    buf.write_u8(0).unwrap();
    write_describe_column(&mut buf, "ID", OracleType::Number);
    write_describe_column(&mut buf, "DOC", OracleType::Clob);
    write_describe_column(&mut buf, "IMG", OracleType::Blob);
    for _ in 0..6 {
        buf.write_ub4(0).unwrap();
    }
    write_number_row(&mut buf, 1);
    write_inline_lob(&mut buf, Some(&b"first draft"[..]));
    write_inline_lob(&mut buf, Some(&[0x89, 0x50][..]));
    write_number_row(&mut buf, 2);
    write_inline_lob(&mut buf, None);
    write_inline_lob(&mut buf, Some(&[0xff][..]));
    write_end_of_call(
        &mut buf,
        &OracleErrorInfo {
            code: error_code::NO_DATA_FOUND,
            message: "ORA-01403: no data found".to_string(),
            row_count: 2,
            ..Default::default()
        },
    );
    buf.write_u8(MessageType::EndOfResponse.code()).unwrap();

    cursor.process_response(buf.as_slice(), &caps()).unwrap();
    assert_eq!(cursor.state(), CursorState::Fetching);
    assert_eq!(cursor.num_columns(), 3);
    assert_eq!(cursor.buffer_row_count(), 2);

    let vars = cursor.fetch_variables();
    assert_eq!(vars[1].describe().oracle_type, OracleType::Clob);
    assert_eq!(vars[1].fetched_describe().oracle_type, OracleType::Long);
    assert_eq!(vars[2].fetched_describe().oracle_type, OracleType::LongRaw);
    assert_eq!(vars[0].num_elements(), 100);
    let columns = cursor.columns();
    assert_eq!(columns[1].oracle_type, OracleType::Long);
    assert_eq!(columns[2].name, "IMG");

    let first = match cursor.next_row() {
        FetchStatus::Row(row) => row,
        other => panic!("expected a row, got {other:?}"),
    };
    assert_eq!(first.get::<i64>(0).unwrap(), 1);
    assert_eq!(first.get_by_name::<String>("doc").unwrap(), "first draft");
    assert_eq!(first.get::<Vec<u8>>(2).unwrap(), vec![0x89, 0x50]);

    let second = match cursor.next_row() {
        FetchStatus::Row(row) => row,
        other => panic!("expected a row, got {other:?}"),
    };
    assert_eq!(second.get::<i64>(0).unwrap(), 2);
    assert_eq!(second.get::<Option<String>>(1).unwrap(), None);
    assert_eq!(second.get::<Vec<u8>>(2).unwrap(), vec![0xff]);

    assert!(matches!(cursor.next_row(), FetchStatus::Exhausted));
    assert_eq!(cursor.state(), CursorState::Exhausted);
}

#[test]
fn test_response_rejected_while_rows_unread() {
    let mut cursor = query_cursor(2);
    cursor
        .process_response(&rows_response(&[1, 2], 0, 2), &caps())
        .unwrap();
    assert_eq!(next_id(&mut cursor), Some(1));

    let early = rows_response(&[3, 4], error_code::NO_DATA_FOUND, 4);
    match cursor.process_response(&early, &caps()) {
        Err(Error::Protocol(message)) => assert!(message.contains("not been consumed")),
        other => panic!("expected protocol error, got {other:?}"),
    }
    assert_eq!(cursor.buffer_row_count(), 2);
    assert!(cursor.more_rows_to_fetch());

    assert_eq!(next_id(&mut cursor), Some(2));
    cursor.process_response(&early, &caps()).unwrap();
    assert_eq!(next_id(&mut cursor), Some(3));
    assert_eq!(next_id(&mut cursor), Some(4));
    assert!(matches!(cursor.next_row(), FetchStatus::Exhausted));
}
