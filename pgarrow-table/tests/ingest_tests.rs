use pgarrow_catalog::{MemCatalog, ResultColumn, SchemaBuilder};
use pgarrow_column::{ColumnDescriptor, Nested, StatDatum};
use pgarrow_result::Error;
use pgarrow_table::{MemEncoder, OwnedRowPage, TableBuffer, TableBufferConfig, WireFormat};
use pgarrow_test_utils::cells::{array, int4, record, text};
use pgarrow_test_utils::init_tracing_for_tests;

const INT4: u32 = 23;
const TEXT: u32 = 25;

fn table(catalog: &mut MemCatalog, columns: &[ResultColumn], segment_size: usize) -> TableBuffer {
    let schema = SchemaBuilder::new(catalog).build(columns).expect("schema");
    let config = TableBufferConfig::with_segment_size(segment_size).expect("config");
    TableBuffer::new(schema, config)
}

fn int_text_table(segment_size: usize) -> TableBuffer {
    let mut catalog = MemCatalog::with_builtin_types();
    table(
        &mut catalog,
        &[
            ResultColumn::new("id", INT4, -1),
            ResultColumn::new("name", TEXT, -1),
        ],
        segment_size,
    )
}

fn page(rows: Vec<Vec<Option<Vec<u8>>>>) -> OwnedRowPage {
    let mut page = OwnedRowPage::new(rows.first().map_or(0, Vec::len));
    for row in rows {
        page.push_row(row).expect("row width");
    }
    page
}

fn visit<'a>(column: &'a ColumnDescriptor, out: &mut Vec<&'a ColumnDescriptor>) {
    out.push(column);
    match &column.nested {
        Nested::None => {}
        Nested::Composite(fields) => fields.iter().for_each(|f| visit(f, out)),
        Nested::Array(element) => visit(element, out),
    }
}

#[test]
fn null_counts_match_nulls_without_a_breach() {
    init_tracing_for_tests();
    let mut table = int_text_table(1 << 20);
    let mut encoder = MemEncoder::new();
    let rows = (0..10)
        .map(|i| {
            vec![
                if i % 3 == 0 { None } else { int4(i) },
                if i % 4 == 0 { None } else { text("v") },
            ]
        })
        .collect();
    assert_eq!(table.append_page(&page(rows), &mut encoder).unwrap(), 10);

    assert_eq!(table.nitems(), 10);
    assert!(table.blocks().is_empty());
    assert_eq!(table.columns()[0].buffer.null_count(), 4);
    assert_eq!(table.columns()[1].buffer.null_count(), 3);
}

#[test]
fn forced_seal_yields_exactly_one_batch() {
    let mut table = int_text_table(1 << 20);
    let mut encoder = MemEncoder::new();
    let rows = (0..25).map(|i| vec![int4(i), text("abc")]).collect();
    table.append_page(&page(rows), &mut encoder).unwrap();
    table.write_out(&mut encoder).unwrap();

    assert_eq!(table.blocks().len(), 1);
    let block = &table.blocks()[0];
    assert_eq!(block.rows, 25);
    assert_eq!(block.offset, 0);
    assert_eq!(
        block.stats[0].range(),
        Some((StatDatum::Int(0), StatDatum::Int(24)))
    );
    assert!(block.stats[1].is_empty());
    assert_eq!(encoder.batches()[0].rows, 25);

    assert_eq!(table.nitems(), 0);
    assert!(table.columns().iter().all(ColumnDescriptor::is_empty));

    // nothing left to seal
    assert!(matches!(table.write_out(&mut encoder), Err(Error::Internal(_))));
    table.flush(&mut encoder).unwrap();
    assert_eq!(table.blocks().len(), 1);
}

#[test]
fn page_preconditions_are_checked() {
    let mut table = int_text_table(1 << 20);
    let mut encoder = MemEncoder::new();

    let narrow = page(vec![vec![int4(1)]]);
    assert!(matches!(
        table.append_page(&narrow, &mut encoder),
        Err(Error::ColumnCountMismatch {
            expected: 2,
            actual: 1
        })
    ));

    let mut textual = OwnedRowPage::with_formats(vec![WireFormat::Binary, WireFormat::Text]);
    textual.push_row(vec![int4(1), text("x")]).unwrap();
    let err = table.append_page(&textual, &mut encoder).unwrap_err();
    assert!(matches!(err, Error::NonBinaryFormat { column } if column == "name"));
    assert_eq!(table.nitems(), 0);
}

#[test]
fn a_row_larger_than_the_segment_fails() {
    let mut table = int_text_table(128);
    let mut encoder = MemEncoder::new();
    let big = "x".repeat(100);
    let err = table
        .append_page(&page(vec![vec![int4(1), text(&big)]]), &mut encoder)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::RowExceedsSegment {
            usage: 256,
            segment_size: 128
        }
    ));
}

#[test]
fn breach_seals_and_retries_the_same_row() {
    init_tracing_for_tests();
    // Each row is an int4 and a 40 byte text: a null int4 costs a 64 byte
    // bitmap and the fourth row pushes the payload past 128 bytes.
    let mut table = int_text_table(320);
    let mut encoder = MemEncoder::new();
    let payload = "p".repeat(40);
    let rows = vec![
        vec![int4(1), text(&payload)],
        vec![None, text(&payload)],
        vec![int4(3), text(&payload)],
        vec![None, text(&payload)],
    ];
    table.append_page(&page(rows), &mut encoder).unwrap();

    assert_eq!(table.blocks().len(), 1);
    assert_eq!(table.blocks()[0].rows, 3);
    assert_eq!(encoder.batches()[0].null_counts, vec![1, 0]);
    assert_eq!(
        table.blocks()[0].stats[0].range(),
        Some((StatDatum::Int(1), StatDatum::Int(3)))
    );

    // the retried row is the only one in the new batch
    assert_eq!(table.nitems(), 1);
    assert_eq!(table.columns()[0].buffer.null_count(), 1);
    assert_eq!(table.columns()[1].buffer.null_count(), 0);
    assert!(table.columns()[0].buffer.stats().is_empty());

    table
        .append_page(&page(vec![vec![int4(5), text(&payload)]]), &mut encoder)
        .unwrap();
    table.flush(&mut encoder).unwrap();

    let rows: Vec<usize> = table.blocks().iter().map(|b| b.rows).collect();
    assert_eq!(rows, vec![3, 2]);
    assert_eq!(table.rows_written(), 5);
    assert_eq!(encoder.batches()[1].null_counts, vec![1, 0]);
    assert_eq!(
        table.blocks()[1].stats[0].range(),
        Some((StatDatum::Int(5), StatDatum::Int(5)))
    );
    let first = &table.blocks()[0];
    assert_eq!(
        table.blocks()[1].offset,
        first.offset + (first.metadata_len + first.body_len) as u64
    );
}

#[test]
fn sealing_resets_nested_buffers_recursively() {
    let mut catalog = MemCatalog::with_builtin_types();
    let point = catalog
        .create_composite("public", "point2", &[("x", INT4), ("y", 20)])
        .unwrap();
    let points = catalog.create_array(point).unwrap();
    let shape = catalog
        .create_composite("public", "shape", &[("label", TEXT), ("points", points)])
        .unwrap();
    let mut table = table(
        &mut catalog,
        &[
            ResultColumn::new("id", INT4, -1),
            ResultColumn::new("shape", shape, -1),
        ],
        1 << 20,
    );
    let mut encoder = MemEncoder::new();

    let pt = |x: i32| record(&[(INT4, int4(x)), (20, None)]);
    let rows = vec![
        vec![
            int4(1),
            record(&[(TEXT, text("a")), (points, array(point, &[pt(1), None, pt(2)]))]),
        ],
        vec![int4(2), None],
        vec![None, record(&[(TEXT, None), (points, array(point, &[]))])],
    ];
    table.append_page(&page(rows), &mut encoder).unwrap();

    let shape_col = &table.columns()[1];
    let mut before = Vec::new();
    visit(shape_col, &mut before);
    assert_eq!(before.len(), 6);
    assert!(before.iter().any(|c| c.buffer.null_count() > 0));

    table.write_out(&mut encoder).unwrap();

    let mut after = Vec::new();
    for column in table.columns() {
        visit(column, &mut after);
    }
    assert_eq!(after.len(), 7);
    for column in after {
        assert!(column.buffer.values().is_empty(), "{}", column.name);
        assert!(column.buffer.nullmap().is_empty(), "{}", column.name);
        assert!(column.buffer.extra().is_empty(), "{}", column.name);
        assert_eq!(column.buffer.null_count(), 0, "{}", column.name);
        assert_eq!(column.buffer.stats().min, None);
        assert_eq!(column.buffer.stats().max, None);
    }
}
