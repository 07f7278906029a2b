use pgarrow_column::{
    Alignment, ArrowTypeTag, ColumnAttrs, ColumnDescriptor, Nested, StatDatum, TypeCategory,
    put_value, stat_update,
};
use pgarrow_test_utils::cells;

fn base(name: &str, type_name: &str, type_id: u32, type_len: i16) -> ColumnAttrs {
    ColumnAttrs {
        name: name.to_string(),
        type_id,
        type_mod: -1,
        type_len,
        by_value: type_len > 0,
        alignment: if type_len == 8 {
            Alignment::Double
        } else {
            Alignment::Int
        },
        category: TypeCategory::Base,
        namespace: "pg_catalog".to_string(),
        type_name: type_name.to_string(),
    }
}

fn composite(name: &str, type_id: u32, fields: Vec<ColumnDescriptor>) -> ColumnDescriptor {
    let attrs = ColumnAttrs {
        name: name.to_string(),
        type_id,
        type_mod: -1,
        type_len: -1,
        by_value: false,
        alignment: Alignment::Double,
        category: TypeCategory::Composite,
        namespace: "public".to_string(),
        type_name: name.to_string(),
    };
    ColumnDescriptor::new(attrs, Nested::Composite(fields)).expect("composite")
}

fn leaf(name: &str, type_name: &str, type_id: u32, type_len: i16) -> ColumnDescriptor {
    ColumnDescriptor::new(base(name, type_name, type_id, type_len), Nested::None).expect("leaf")
}

const POINT_OID: u32 = 90_001;
const POINTS_OID: u32 = 90_002;
const SHAPE_OID: u32 = 90_003;

/// shape(label text, points point2[]) where point2(x int4, y int8).
fn shape_column() -> ColumnDescriptor {
    let point = composite(
        "point2",
        POINT_OID,
        vec![leaf("x", "int4", 23, 4), leaf("y", "int8", 20, 8)],
    );
    let points = ColumnDescriptor::new(
        ColumnAttrs {
            name: "points".to_string(),
            type_id: POINTS_OID,
            type_mod: -1,
            type_len: -1,
            by_value: false,
            alignment: Alignment::Double,
            category: TypeCategory::Base,
            namespace: "public".to_string(),
            type_name: "_point2".to_string(),
        },
        Nested::Array(Box::new(point)),
    )
    .expect("array");
    composite("shape", SHAPE_OID, vec![leaf("label", "text", 25, -1), points])
}

fn point(x: i32, y: Option<i64>) -> Option<Vec<u8>> {
    cells::record(&[(23, cells::int4(x)), (20, y.and_then(cells::int8))])
}

#[test]
fn nested_array_of_composites_is_appended_and_cleared() {
    let mut shape = shape_column();
    assert_eq!(shape.type_tag, ArrowTypeTag::Struct);
    assert_eq!(shape.fields()[1].type_tag, ArrowTypeTag::List);
    assert_eq!(shape.subtree_field_nodes(), 6);

    let row0 = cells::record(&[
        (25, cells::text("tri")),
        (
            POINTS_OID,
            cells::array(POINT_OID, &[point(1, Some(10)), None, point(3, None)]),
        ),
    ]);
    let usage0 = put_value(&mut shape, 0, row0.as_deref()).expect("row 0");
    assert!(usage0 > 0);

    // a short record leaves trailing fields null
    let row1 = cells::record(&[(25, None)]);
    let usage1 = put_value(&mut shape, 1, row1.as_deref()).expect("row 1");
    assert!(usage1 >= usage0);

    let points = &shape.fields()[1];
    let elem = points.element().expect("element");
    assert_eq!(points.buffer.null_count(), 1);
    assert_eq!(elem.buffer.null_count(), 1);
    assert_eq!(elem.fields()[1].buffer.null_count(), 2);
    assert_eq!(shape.fields()[0].buffer.null_count(), 1);

    shape.clear();
    assert!(shape.is_empty());
    assert_eq!(shape.usage(), 0);
    let elem = shape.fields()[1].element().unwrap();
    for field in elem.fields() {
        assert_eq!(field.buffer.null_count(), 0);
        assert!(field.buffer.stats().range().is_none());
    }
}

#[test]
fn wire_type_mismatch_is_rejected() {
    let mut shape = shape_column();
    let bad = cells::record(&[(23, cells::int4(1))]);
    let err = put_value(&mut shape, 0, bad.as_deref()).unwrap_err();
    assert!(err.to_string().contains("label"), "{err}");
}

#[test]
fn undo_row_nulls_reaches_array_elements() {
    let mut shape = shape_column();
    let row = cells::record(&[
        (25, None),
        (POINTS_OID, cells::array(POINT_OID, &[None, point(7, None)])),
    ]);
    put_value(&mut shape, 0, row.as_deref()).unwrap();
    put_value(&mut shape, 1, row.as_deref()).unwrap();

    shape.undo_row_nulls(1);

    let label = &shape.fields()[0];
    let elem = shape.fields()[1].element().unwrap();
    assert_eq!(label.buffer.null_count(), 1);
    assert_eq!(elem.buffer.null_count(), 1);
    assert_eq!(elem.fields()[1].buffer.null_count(), 2);
}

#[test]
fn stats_ignore_nulls_and_track_extremes() {
    let mut col = leaf("v", "float8", 701, 8);
    for v in [Some(2.5f64), None, Some(-1.0), Some(f64::NAN), Some(9.75)] {
        let cell = v.map(f64::to_be_bytes);
        stat_update(&mut col, cell.as_ref().map(|c| &c[..])).unwrap();
    }
    assert_eq!(
        col.buffer.stats().range(),
        Some((StatDatum::Float(-1.0), StatDatum::Float(9.75)))
    );
}
