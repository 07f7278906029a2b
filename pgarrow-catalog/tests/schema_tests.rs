use pgarrow_catalog::{
    CatalogRow, MemCatalog, ResultColumn, SchemaBuilder, SchemaDump, SchemaTotals,
};
use pgarrow_column::{ArrowTypeTag, Nested};
use pgarrow_result::Error;

fn field(catalog: &MemCatalog, ordinal: i32, name: &str, type_id: u32) -> CatalogRow {
    CatalogRow {
        ordinal,
        name: name.to_string(),
        type_mod: -1,
        ..catalog.type_row(type_id).cloned().expect("known type")
    }
}

/// Registers a composite whose relation rows are supplied verbatim.
fn composite_with_rows(catalog: &mut MemCatalog, name: &str, rows: Vec<CatalogRow>) -> u32 {
    let type_id = catalog.create_composite("public", name, &[]).unwrap();
    let relation_id = catalog.type_row(type_id).unwrap().relation_id;
    catalog.insert_relation(relation_id, rows);
    type_id
}

#[test]
fn composite_fields_follow_ordinals_not_row_order() {
    let mut catalog = MemCatalog::with_builtin_types();
    let rows = vec![
        field(&catalog, 3, "c", 701),
        field(&catalog, 1, "a", 23),
        field(&catalog, 2, "b", 25),
    ];
    let triple = composite_with_rows(&mut catalog, "triple", rows);

    let schema = SchemaBuilder::new(&mut catalog)
        .build(&[ResultColumn::new("t", triple, -1)])
        .unwrap();
    let names: Vec<&str> = schema.columns[0]
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(
        schema.totals,
        SchemaTotals {
            field_nodes: 4,
            buffers: 1 + 2 + 3 + 2
        }
    );
}

#[test]
fn unsupported_categories_fail() {
    for code in ['d', 'e', 'p', 'r', 'm', 'x'] {
        let mut catalog = MemCatalog::with_builtin_types();
        let mut row = catalog.type_row(23).cloned().unwrap();
        row.type_id = 70_000;
        row.type_name = format!("weird_{code}");
        row.category = code;
        catalog.insert_type(row);

        let err = SchemaBuilder::new(&mut catalog)
            .build(&[ResultColumn::new("w", 70_000, -1)])
            .unwrap_err();
        let expected = format!("weird_{code}");
        assert!(
            matches!(&err, Error::UnsupportedType { type_name, .. } if *type_name == expected),
            "category {code}: {err}"
        );
    }

    // the builtin `record` pseudo type is rejected too
    let mut catalog = MemCatalog::with_builtin_types();
    assert!(
        SchemaBuilder::new(&mut catalog)
            .build(&[ResultColumn::new("r", 2249, -1)])
            .is_err()
    );
}

#[test]
fn unknown_alignment_fails() {
    let mut catalog = MemCatalog::with_builtin_types();
    let mut row = catalog.type_row(23).cloned().unwrap();
    row.align = 'q';
    catalog.insert_type(row);
    let err = SchemaBuilder::new(&mut catalog)
        .build(&[ResultColumn::new("x", 23, -1)])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownAlignment { code: 'q', .. }));
}

#[test]
fn bad_ordinals_fail() {
    let mut catalog = MemCatalog::with_builtin_types();
    let rows = vec![field(&catalog, 1, "a", 23), field(&catalog, 3, "b", 23)];
    let gap = composite_with_rows(&mut catalog, "gap", rows);
    let err = SchemaBuilder::new(&mut catalog)
        .build(&[ResultColumn::new("g", gap, -1)])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::OrdinalOutOfRange {
            ordinal: 3,
            field_count: 2,
            ..
        }
    ));

    let rows = vec![field(&catalog, 1, "a", 23), field(&catalog, 1, "b", 23)];
    let dup = composite_with_rows(&mut catalog, "dup", rows);
    let err = SchemaBuilder::new(&mut catalog)
        .build(&[ResultColumn::new("d", dup, -1)])
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateOrdinal { ordinal: 1, .. }));

    let rows = vec![field(&catalog, 0, "a", 23)];
    let zero = composite_with_rows(&mut catalog, "zero", rows);
    assert!(
        SchemaBuilder::new(&mut catalog)
            .build(&[ResultColumn::new("z", zero, -1)])
            .is_err()
    );
}

#[test]
fn arrays_of_composites_resolve_to_any_depth() {
    let mut catalog = MemCatalog::with_builtin_types();
    let point = catalog
        .create_composite("public", "point2", &[("x", 23), ("y", 20)])
        .unwrap();
    let points = catalog.create_array(point).unwrap();
    let shape = catalog
        .create_composite("public", "shape", &[("label", 25), ("points", points)])
        .unwrap();

    let schema = SchemaBuilder::new(&mut catalog)
        .build(&[
            ResultColumn::new("id", 23, -1),
            ResultColumn::new("shape", shape, -1),
            ResultColumn::new("tags", 1009, -1),
        ])
        .unwrap();

    let shape = &schema.columns[1];
    assert_eq!(shape.type_tag, ArrowTypeTag::Struct);
    let points = &shape.fields()[1];
    assert_eq!(points.type_tag, ArrowTypeTag::List);
    let element = points.element().expect("array element");
    assert_eq!(element.type_name, "point2");
    assert_eq!(element.fields().len(), 2);
    assert!(matches!(schema.columns[2].nested, Nested::Array(_)));

    // array elements are not folded into the totals
    assert_eq!(
        schema.totals,
        SchemaTotals {
            field_nodes: 1 + 3 + 1,
            buffers: 2 + (1 + 3 + 2) + 2
        }
    );

    let dump = SchemaDump(&schema.columns).to_string();
    assert!(dump.starts_with("columns: 3\n"));
    assert!(dump.contains("column[1] {name='shape'"));
    assert!(dump.contains("    element {name='point2'"));
    assert!(dump.contains("arrow=list"));
}
